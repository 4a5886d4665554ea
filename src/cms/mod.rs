//! CMS clients
//!
//! Both supported CMS families expose the same contract; they differ in
//! remote layout, credential key naming, and which entries the file sync
//! skips.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::config::{AppKind, SshConfig};
use crate::error::{Error, Result};
use crate::remote::RemoteClient;

mod drupal;
mod wordpress;

pub use drupal::DrupalClient;
pub use wordpress::WordpressClient;

/// Database credentials resolved from the remote environment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbCredentials {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

#[async_trait]
pub trait CmsClient: Send + Sync {
    /// Whether the CMS root directory exists on the remote host.
    async fn exists(&self) -> Result<bool>;

    /// Installed CMS version.
    async fn version(&self) -> Result<String>;

    /// Site identifiers to process, in discovery order.
    async fn site_names(&self) -> Result<Vec<String>>;

    /// Resolve the database credentials for one site.
    async fn site_credentials(&self, site: &str) -> Result<DbCredentials>;

    /// Dump the site's database and pull it into the local data directory.
    async fn export_database(&self, site: &str, credentials: &DbCredentials) -> Result<()>;

    /// Replace the local uploads mirror for one site.
    async fn sync_files(&self, site: &str) -> Result<()>;
}

/// Build the client for the configured CMS family.
pub fn client_for(app: AppKind, ssh: SshConfig) -> Box<dyn CmsClient> {
    match app {
        AppKind::Drupal => Box::new(DrupalClient::new(ssh)),
        AppKind::Wordpress => Box::new(WordpressClient::new(ssh)),
    }
}

/// Probe a remote path with `stat`. A remote command error means the path
/// does not exist; this is the one call site where that error is expected
/// and non-fatal.
pub(crate) async fn remote_path_exists(remote: &RemoteClient, path: &str) -> Result<bool> {
    match remote.run(&format!("stat {}", path)).await {
        Ok(_) => Ok(true),
        Err(Error::RemoteCommand(_)) => Ok(false),
        Err(err) => Err(err),
    }
}

pub(crate) fn required(vars: &HashMap<String, String>, key: &str) -> Result<String> {
    vars.get(key)
        .cloned()
        .ok_or_else(|| Error::MissingKey(key.to_string()))
}

pub(crate) fn lookup_or(vars: &HashMap<String, String>, key: &str, default: &str) -> String {
    vars.get(key).cloned().unwrap_or_else(|| default.to_string())
}
