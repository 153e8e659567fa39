use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod error;

pub use error::{ProvisioningError, Step};

// --- Descriptor (config.json) ---

/// Static VM descriptor, loaded once per run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProvisioningConfig {
    pub folder_id: String,
    pub username: String,
    pub resources: ResourceDescriptor,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub image: ImageSelector,
    pub name: String,
    pub resources_spec: ResourcesSpec,
    pub boot_disk_spec: BootDiskSpec,
    pub zone_id: String,
    pub platform_id: String,
    pub subnet_id: String,
    // Not part of the historical descriptor; the VM always got a public IPv4.
    #[serde(default = "default_true")]
    pub assign_public_ipv4: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageSelector {
    pub family: String,
    /// Folder (or public catalog) that owns the image family, e.g. `standard-images`.
    pub folder_family_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ResourcesSpec {
    /// Memory in bytes.
    pub memory: u64,
    pub cores: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BootDiskSpec {
    pub auto_delete: bool,
    pub disk_spec: DiskSpec,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DiskSpec {
    pub type_id: String,
    /// Disk size in bytes.
    pub size: u64,
}

fn default_true() -> bool {
    true
}

// --- Runtime inputs ---

/// Token and raw public key bytes. Never persisted, never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub public_key: Vec<u8>,
}

impl Credentials {
    pub fn new(token: impl Into<String>, public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            token: token.into(),
            public_key: public_key.into(),
        }
    }

    /// Key material as text, as it gets substituted into metadata.
    pub fn public_key_text(&self) -> String {
        String::from_utf8_lossy(&self.public_key).into_owned()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("public_key_len", &self.public_key.len())
            .finish()
    }
}

// --- Provider-facing entities ---

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Fully assembled instance-creation payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CreationRequest {
    pub folder_id: String,
    pub name: String,
    pub zone_id: String,
    pub platform_id: String,
    pub labels: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, String>,
    pub resources_spec: ResourcesSpec,
    pub boot_disk: BootDiskRequest,
    pub network_interface: NetworkInterfaceSpec,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BootDiskRequest {
    pub auto_delete: bool,
    pub type_id: String,
    pub size: u64,
    pub image_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NetworkInterfaceSpec {
    pub subnet_id: String,
    pub assign_public_ipv4: bool,
}

/// Handle to the provider-side asynchronous create operation.
/// The provider owns everything that happens after acceptance.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub instance_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_parses_historical_schema() {
        let raw = r##"{
            "folder_id": "b1g-folder",
            "username": "alice",
            "resources": {
                "image": { "family": "ubuntu-2204-lts", "folder_family_id": "standard-images" },
                "name": "vm-1",
                "resources_spec": { "memory": 2147483648, "cores": 2 },
                "boot_disk_spec": {
                    "auto_delete": true,
                    "disk_spec": { "type_id": "network-hdd", "size": 10737418240 }
                },
                "zone_id": "ru-central1-a",
                "platform_id": "standard-v3",
                "subnet_id": "e9b-subnet"
            },
            "metadata": { "user-data": "#cloud-config\nusers:\n  - name: USERNAME" },
            "labels": { "env": "dev" }
        }"##;

        let cfg: ProvisioningConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.resources.image.family, "ubuntu-2204-lts");
        assert_eq!(cfg.resources.resources_spec.memory, 2_147_483_648);
        assert_eq!(cfg.resources.boot_disk_spec.disk_spec.size, 10_737_418_240);
        assert!(cfg.resources.assign_public_ipv4);
        assert_eq!(cfg.labels.get("env").map(String::as_str), Some("dev"));
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let creds = Credentials::new("t0ken-secret", b"ssh-ed25519 AAAA".to_vec());
        let out = format!("{:?}", creds);
        assert!(!out.contains("t0ken-secret"));
        assert!(!out.contains("AAAA"));
        assert!(out.contains("public_key_len: 16"));
    }
}
