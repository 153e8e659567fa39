use std::fs;
use std::path::{Path, PathBuf};

use ycprov_common::{Credentials, ProvisioningConfig, ProvisioningError};
use ycprov_providers::DEFAULT_COMPUTE_ENDPOINT;

pub const AUTH_TOKEN_VAR: &str = "YC_AUTH_TOKEN";
pub const SSH_PUBLIC_KEY_PATH_VAR: &str = "SSH_PUBLIC_KEY_PATH";
pub const CONFIG_PATH_VAR: &str = "YC_CONFIG_PATH";
pub const COMPUTE_ENDPOINT_VAR: &str = "YC_COMPUTE_ENDPOINT";
pub const PROVIDER_VAR: &str = "YC_PROVIDER";

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Everything the binary reads from the process environment, read once at startup.
#[derive(Clone)]
pub struct Settings {
    pub auth_token: String,
    pub ssh_public_key_path: PathBuf,
    pub config_path: PathBuf,
    pub compute_endpoint: String,
    pub provider: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("auth_token", &"<redacted>")
            .field("ssh_public_key_path", &self.ssh_public_key_path)
            .field("config_path", &self.config_path)
            .field("compute_endpoint", &self.compute_endpoint)
            .field("provider", &self.provider)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ProvisioningError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProvisioningError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let auth_token = get(AUTH_TOKEN_VAR).ok_or_else(|| {
            ProvisioningError::configuration(format!("{} must be set", AUTH_TOKEN_VAR))
        })?;
        let ssh_public_key_path = get(SSH_PUBLIC_KEY_PATH_VAR).ok_or_else(|| {
            ProvisioningError::configuration(format!("{} must be set", SSH_PUBLIC_KEY_PATH_VAR))
        })?;

        Ok(Self {
            auth_token,
            ssh_public_key_path: PathBuf::from(ssh_public_key_path),
            config_path: PathBuf::from(
                get(CONFIG_PATH_VAR).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
            ),
            compute_endpoint: get(COMPUTE_ENDPOINT_VAR)
                .unwrap_or_else(|| DEFAULT_COMPUTE_ENDPOINT.to_string()),
            provider: get(PROVIDER_VAR)
                .map(|p| p.to_lowercase())
                .unwrap_or_else(|| "yandex".to_string()),
        })
    }

    pub fn credentials(&self) -> Result<Credentials, ProvisioningError> {
        let public_key = read_public_key(&self.ssh_public_key_path)?;
        Ok(Credentials::new(self.auth_token.clone(), public_key))
    }
}

/// Parse the JSON VM descriptor.
pub fn load_config(path: &Path) -> Result<ProvisioningConfig, ProvisioningError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        ProvisioningError::configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        ProvisioningError::configuration(format!("invalid descriptor {}: {}", path.display(), e))
    })
}

/// Raw bytes of the public key file, unmodified.
pub fn read_public_key(path: &Path) -> Result<Vec<u8>, ProvisioningError> {
    fs::read(path).map_err(|e| {
        ProvisioningError::configuration(format!(
            "cannot read public key {}: {}",
            path.display(),
            e
        ))
    })
}
