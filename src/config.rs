//! Run configuration
//!
//! Loaded once from a local YAML file (`site.yml` by default) and treated
//! as immutable for the rest of the process.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Supported CMS families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppKind {
    Drupal,
    Wordpress,
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppKind::Drupal => write!(f, "drupal"),
            AppKind::Wordpress => write!(f, "wordpress"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Which CMS family the remote host runs.
    pub app: AppKind,
    pub ssh: SshConfig,
}

/// SSH connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    /// Remote host address
    pub host: String,

    /// Username for authentication
    pub user: String,

    /// SSH port (default: 22)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Private key file. Unset means every identity held by the system SSH
    /// agent is offered instead.
    #[serde(default)]
    pub key_filename: Option<PathBuf>,

    /// Connection timeout in seconds. Unset keeps the transport defaults.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Optional HTTP gatekeeper login performed before any SSH work.
    #[serde(default)]
    pub webauth: Option<WebauthConfig>,
}

/// Settings for the HTTP form-login handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct WebauthConfig {
    pub login_url: String,
    pub webauth_url: String,
    pub username: String,
    pub password: String,

    /// Accept invalid certificates and pre-1.2 TLS. The gatekeeper
    /// appliances this handshake targets tend to run ancient TLS stacks.
    #[serde(default = "default_true")]
    pub legacy_tls: bool,
}

impl Config {
    /// Read and deserialize a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }
}

fn default_port() -> u16 {
    22
}

fn default_true() -> bool {
    true
}
