//! Per-attribute operations and their body decoders.

use crate::client::{MetadataClient, META_DATA_PATH};
use crate::error::{DecodeError, MetadataError};
use crate::metadata::Metadata;

/// Version segment of the all-metadata and user-data namespace.
const PROVIDER_API_VERSION: &str = "v1";

impl MetadataClient {
    /// Fetch the whole metadata document in one request.
    ///
    /// Unlike the other operations this reads `/<provider>/v1/metadata`
    /// rather than a path under `/2009-04-04/meta-data`.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::Decode` if the document is not valid YAML for
    /// [`Metadata`].
    pub async fn metadata(&self) -> Result<Metadata, MetadataError> {
        let url = self.resolve(&self.provider_namespace(), "metadata");
        self.get_with(url, decode_metadata).await
    }

    /// The instance's unique identifier, assigned by the platform at creation.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::Decode` if the body is not a base-10 integer.
    pub async fn instance_id(&self) -> Result<i64, MetadataError> {
        let url = self.resolve(META_DATA_PATH, "instance-id");
        self.get_with(url, decode_instance_id).await
    }

    /// The hostname chosen at instance creation.
    pub async fn hostname(&self) -> Result<String, MetadataError> {
        let url = self.resolve(META_DATA_PATH, "hostname");
        self.get_with(url, decode_text).await
    }

    /// User data supplied at creation, typically a cloud-config or a script.
    pub async fn user_data(&self) -> Result<String, MetadataError> {
        let url = self.resolve(&self.provider_namespace(), "userdata");
        self.get_with(url, decode_text).await
    }

    /// Platform-provided data for instance-boot tooling.
    pub async fn vendor_data(&self) -> Result<String, MetadataError> {
        let url = self.resolve(META_DATA_PATH, "vendor_data");
        self.get_with(url, decode_text).await
    }

    /// SSH public keys authorized for the instance, one per line.
    pub async fn public_keys(&self) -> Result<Vec<String>, MetadataError> {
        let url = self.resolve(META_DATA_PATH, "public-keys");
        self.get_with(url, decode_lines).await
    }

    /// Tags applied to the instance.
    pub async fn tags(&self) -> Result<Vec<String>, MetadataError> {
        let url = self.resolve(META_DATA_PATH, "tags");
        self.get_with(url, decode_lines).await
    }

    fn provider_namespace(&self) -> String {
        format!("{}/{}", self.provider(), PROVIDER_API_VERSION)
    }
}

fn decode_text(body: Vec<u8>) -> Result<String, DecodeError> {
    Ok(String::from_utf8(body)?)
}

fn decode_instance_id(body: Vec<u8>) -> Result<i64, DecodeError> {
    Ok(decode_text(body)?.trim().parse()?)
}

/// One entry per line; a trailing newline does not add an empty entry.
fn decode_lines(body: Vec<u8>) -> Result<Vec<String>, DecodeError> {
    Ok(decode_text(body)?.lines().map(str::to_owned).collect())
}

fn decode_metadata(body: Vec<u8>) -> Result<Metadata, DecodeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Metadata::default());
    }
    // A null document carries no fields at all.
    let metadata: Option<Metadata> = serde_yaml::from_slice(&body)?;
    Ok(metadata.unwrap_or_default())
}
