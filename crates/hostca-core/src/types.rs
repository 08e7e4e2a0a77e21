// ABOUTME: Provider-neutral data model for compute instances and their metadata.
// ABOUTME: Instances, network interfaces, and the key/value metadata with upsert semantics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fleet-unique instance identifier. Used as the rate-limiter key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for InstanceId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// External (NAT) address attached to a network interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessConfig {
    pub external_ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInterface {
    pub internal_ip: Option<String>,
    pub access_configs: Vec<AccessConfig>,
}

/// A compute instance as returned by the instance directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: InstanceId,
    pub name: String,
    /// Short zone name (e.g. `us-central1-a`).
    pub zone: String,
    pub network_interfaces: Vec<NetworkInterface>,
    pub metadata: Metadata,
}

/// One metadata entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataItem {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Instance metadata. `fingerprint` is an opaque optimistic-locking token
/// that must be echoed back on write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub items: Vec<MetadataItem>,
}

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.key == key)
            .and_then(|item| item.value.as_deref())
    }

    /// Replace the value of `key` in place, or append it if absent.
    pub fn upsert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.items.iter_mut().find(|item| item.key == key) {
            Some(item) => item.value = Some(value),
            None => self.items.push(MetadataItem {
                key: key.to_string(),
                value: Some(value),
            }),
        }
    }
}
