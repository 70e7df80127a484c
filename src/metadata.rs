//! Data model of the all-metadata document.
//!
//! Every field is optional: a key missing from the document decodes to `None`,
//! a key present with an empty value decodes to `Some` of the empty value.
//! Sequences keep the order the service reported.

use serde::{Deserialize, Deserializer, Serialize};

/// Everything the metadata service reports about the instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    /// Public IPv4 address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ipv4: Option<String>,

    /// Private IPv4 address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_ipv4: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// SSH public keys, in the order the service lists them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_keys: Option<Vec<String>>,

    /// Identifier assigned by the platform at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<i64>,

    /// Platform-provided cloud-init payload, usually a MIME multipart document.
    #[serde(
        default,
        rename = "vendor_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub vendor_data: Option<String>,

    /// Legacy sysconfig rendering of the network configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_sysconfig: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_config: Option<NetworkConfig>,
}

/// Network configuration in cloud-init "version 1" layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Schema version. The service sends a bare number; any scalar is kept as text.
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Vec<Interface>>,
}

/// A network interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,

    /// Interface type, e.g. `physical`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnets: Option<Vec<Subnet>>,
}

/// Addressing of an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_nameservers: Option<Vec<String>>,

    /// Addressing mode, e.g. `dhcp` or `static`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<bool>,

    /// Address in CIDR notation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<Route>>,
}

/// A static route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// CIDR prefix length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

/// Accept any YAML scalar and keep its textual form.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_are_none() {
        let metadata: Metadata = serde_yaml::from_str("hostname: node\n").unwrap();
        assert_eq!(metadata.hostname.as_deref(), Some("node"));
        assert_eq!(metadata.public_ipv4, None);
        assert_eq!(metadata.network_config, None);
    }

    #[test]
    fn test_empty_value_is_present() {
        let metadata: Metadata = serde_yaml::from_str("local-ipv4: ''\n").unwrap();
        assert_eq!(metadata.local_ipv4.as_deref(), Some(""));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let metadata: Metadata =
            serde_yaml::from_str("availability-zone: fsn1-dc14\ninstance-id: 42\n").unwrap();
        assert_eq!(metadata.instance_id, Some(42));
    }

    #[test]
    fn test_version_accepts_number_or_text() {
        let numeric: NetworkConfig = serde_yaml::from_str("version: 1\n").unwrap();
        assert_eq!(numeric.version.as_deref(), Some("1"));

        let text: NetworkConfig = serde_yaml::from_str("version: '2'\n").unwrap();
        assert_eq!(text.version.as_deref(), Some("2"));

        let missing: NetworkConfig = serde_yaml::from_str("config: []\n").unwrap();
        assert_eq!(missing.version, None);
        assert_eq!(missing.config, Some(Vec::new()));
    }

    #[test]
    fn test_keys_follow_wire_names() {
        let metadata = Metadata {
            public_ipv4: Some("1.2.3.4".to_string()),
            vendor_data: Some("#cloud-config".to_string()),
            network_config: Some(NetworkConfig {
                version: Some("1".to_string()),
                config: Some(vec![Interface {
                    mac_address: Some("96:00:00:00:00:01".to_string()),
                    kind: Some("physical".to_string()),
                    ..Default::default()
                }]),
            }),
            ..Default::default()
        };

        let yaml = serde_yaml::to_string(&metadata).unwrap();
        assert!(yaml.contains("public-ipv4:"));
        assert!(yaml.contains("vendor_data:"));
        assert!(yaml.contains("network-config:"));
        assert!(yaml.contains("mac_address:"));
        assert!(yaml.contains("type: physical"));
        assert!(!yaml.contains("hostname"));
    }

    #[test]
    fn test_sequences_keep_order() {
        let subnet: Subnet = serde_yaml::from_str(
            "dns_nameservers:\n- 213.133.100.100\n- 213.133.98.98\n- 213.133.100.100\n",
        )
        .unwrap();
        assert_eq!(
            subnet.dns_nameservers.unwrap(),
            vec!["213.133.100.100", "213.133.98.98", "213.133.100.100"]
        );
    }
}
