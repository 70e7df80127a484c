//! Client for the Hetzner Cloud instance metadata service.
//!
//! The service is reachable over plain HTTP from inside a running server and
//! describes the instance: id, hostname, network configuration, user and
//! vendor data, SSH keys and tags.
//!
//! # Features
//!
//! - One async method per attribute, plus [`MetadataClient::metadata`] for the
//!   whole document at once
//! - Typed, optional-everywhere data model for the YAML metadata document
//! - Configurable base URL, timeout and transport
//!
//! # Example
//!
//! ```ignore
//! use hc_metadata::{MetadataClient, MetadataError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MetadataError> {
//!     let client = MetadataClient::new()?;
//!
//!     let all = client.metadata().await?;
//!     println!("{}", all.public_ipv4.unwrap_or_default());
//!
//!     let keys = client.public_keys().await?;
//!     println!("{} authorized keys", keys.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `instance_id` | `/2009-04-04/meta-data/instance-id` | integer |
//! | `hostname` | `/2009-04-04/meta-data/hostname` | text |
//! | `vendor_data` | `/2009-04-04/meta-data/vendor_data` | text |
//! | `public_keys` | `/2009-04-04/meta-data/public-keys` | one key per line |
//! | `tags` | `/2009-04-04/meta-data/tags` | one tag per line |
//! | `user_data` | `/hetzner/v1/userdata` | text |
//! | `metadata` | `/hetzner/v1/metadata` | YAML document |

mod attributes;
mod client;
mod error;
mod metadata;

pub use client::{
    MetadataClient, MetadataClientBuilder, DEFAULT_BASE_URL, DEFAULT_PROVIDER, DEFAULT_TIMEOUT,
    META_DATA_PATH,
};
pub use error::{DecodeError, MetadataError};
pub use metadata::{Interface, Metadata, NetworkConfig, Route, Subnet};
