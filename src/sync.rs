//! Run orchestration
//!
//! A straight line: optional web-auth, then credential resolution, export,
//! and file sync for every detected site, strictly in discovery order. The
//! first error aborts the run and leaves whatever was already pulled in
//! place.

use tracing::info;

use crate::cms::{self, CmsClient};
use crate::config::{Config, WebauthConfig};
use crate::error::Result;
use crate::webauth;

/// Pull the database dump and uploaded files for every detected site.
pub async fn run(config: &Config) -> Result<()> {
    let client = cms::client_for(config.app, config.ssh.clone());
    run_with_client(client.as_ref(), config.ssh.webauth.as_ref()).await
}

async fn run_with_client(
    client: &dyn CmsClient,
    webauth_config: Option<&WebauthConfig>,
) -> Result<()> {
    webauth::start_session(webauth_config).await?;

    for site in client.site_names().await? {
        info!("Processing site {}", site);
        let credentials = client.site_credentials(&site).await?;
        client.export_database(&site, &credentials).await?;
        client.sync_files(&site).await?;
    }

    Ok(())
}

/// Read-only status report for the `info` subcommand. Nothing is
/// transferred or mutated.
pub async fn inspect(config: &Config) -> Result<()> {
    let client = cms::client_for(config.app, config.ssh.clone());

    if !client.exists().await? {
        println!("{}: not found on remote host", config.app);
        return Ok(());
    }

    println!("{} {}", config.app, client.version().await?);
    for site in client.site_names().await? {
        println!("  site: {}", site);
    }
    Ok(())
}
