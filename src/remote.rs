//! Remote session layer
//!
//! Wraps russh with the two primitives the rest of the crate needs:
//! running a single command and copying a remote path to a local one.
//! Every call opens its own connection, so a failed command cannot corrupt
//! state observed by the next one.

use std::net::ToSocketAddrs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use russh::client;
use russh::keys::agent::client::AgentClient;
use russh::keys::key::PrivateKeyWithHashAlg;
use russh::keys::PublicKey;
use russh::{ChannelMsg, Disconnect};
use russh_sftp::client::SftpSession;
use tracing::{debug, info};

use crate::config::SshConfig;
use crate::error::{Error, Result};

pub struct RemoteClient {
    config: SshConfig,
}

impl RemoteClient {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// Execute one command in a fresh connection and return trimmed stdout.
    ///
    /// Stdout and stderr are collected separately. Any stderr output fails
    /// the call with [`Error::RemoteCommand`] carrying that text; the exit
    /// status is deliberately not consulted.
    pub async fn run(&self, command: &str) -> Result<String> {
        let handle = self.connect().await?;
        debug!("Running remote command: {}", command);

        let mut channel = handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext: 1 }) => {
                    // ext=1 is stderr
                    stderr.extend_from_slice(&data);
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) => {
                    break;
                }
                Some(_other) => {
                    // ExitStatus and friends carry nothing we act on
                }
                None => {
                    break;
                }
            }
        }

        let _ = handle
            .disconnect(Disconnect::ByApplication, "command finished", "en")
            .await;

        let stderr = String::from_utf8_lossy(&stderr);
        if !stderr.is_empty() {
            return Err(Error::RemoteCommand(stderr.into_owned()));
        }

        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Recursively copy a remote file or directory tree to a local path.
    pub async fn copy(&self, remote_path: &str, local_path: &Path) -> Result<()> {
        let handle = self.connect().await?;
        debug!("Copying {} to {}", remote_path, local_path.display());

        let channel = handle.channel_open_session().await?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| Error::Sftp(format!("Failed to request SFTP subsystem: {}", e)))?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| Error::Sftp(e.to_string()))?;

        copy_path(&sftp, remote_path, local_path).await?;

        let _ = handle
            .disconnect(Disconnect::ByApplication, "copy finished", "en")
            .await;
        Ok(())
    }

    /// Open and authenticate a new connection.
    async fn connect(&self) -> Result<client::Handle<HostKeyAcceptor>> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        debug!("Connecting to {}", addr);

        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| Error::Connection(format!("Failed to resolve {}: {}", addr, e)))?
            .next()
            .ok_or_else(|| Error::Connection(format!("No address found for {}", addr)))?;

        let ssh_config = Arc::new(client::Config::default());
        let connecting = client::connect(ssh_config, socket_addr, HostKeyAcceptor);

        let mut handle = match self.config.connect_timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), connecting)
                .await
                .map_err(|_| {
                    Error::Connection(format!("Connection to {} timed out after {}s", addr, secs))
                })??,
            None => connecting.await?,
        };

        self.authenticate(&mut handle).await?;
        Ok(handle)
    }

    async fn authenticate(&self, handle: &mut client::Handle<HostKeyAcceptor>) -> Result<()> {
        match &self.config.key_filename {
            Some(path) => {
                let key = russh::keys::load_secret_key(path, None)?;
                let auth = handle
                    .authenticate_publickey(
                        &self.config.user,
                        PrivateKeyWithHashAlg::new(Arc::new(key), None),
                    )
                    .await
                    .map_err(|e| Error::Auth(e.to_string()))?;
                if !auth.success() {
                    return Err(Error::Auth(format!(
                        "Key {} rejected by server",
                        path.display()
                    )));
                }
            }
            None => self.authenticate_with_agent(handle).await?,
        }

        debug!("SSH authentication successful for {}", self.config.user);
        Ok(())
    }

    /// Offer every identity held by the system SSH agent, in order.
    async fn authenticate_with_agent(
        &self,
        handle: &mut client::Handle<HostKeyAcceptor>,
    ) -> Result<()> {
        let mut agent = AgentClient::connect_env()
            .await
            .map_err(|e| Error::Auth(format!("SSH agent unavailable: {}", e)))?;
        let keys = agent
            .request_identities()
            .await
            .map_err(|e| Error::Auth(format!("Failed to list agent identities: {}", e)))?;
        if keys.is_empty() {
            return Err(Error::Auth(
                "SSH agent holds no identities and no key file is configured".to_string(),
            ));
        }

        for key in &keys {
            let auth = handle
                .authenticate_publickey_with(&self.config.user, key.clone(), None, &mut agent)
                .await
                .map_err(|e| Error::Auth(e.to_string()))?;
            if auth.success() {
                info!("Authenticated with agent key {}", key.comment());
                return Ok(());
            }
            debug!("Agent key {} rejected by server", key.comment());
        }

        Err(Error::Auth(format!(
            "No agent identity was accepted by the server (tried {})",
            keys.len()
        )))
    }
}

/// Host keys are accepted without verification; the target host comes from
/// operator-owned configuration.
struct HostKeyAcceptor;

impl client::Handler for HostKeyAcceptor {
    type Error = Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> Result<bool> {
        Ok(true)
    }
}

async fn copy_path(sftp: &SftpSession, remote: &str, local: &Path) -> Result<()> {
    let metadata = sftp
        .metadata(remote)
        .await
        .map_err(|e| Error::Sftp(format!("{}: {}", remote, e)))?;
    if metadata.is_dir() {
        copy_dir(sftp, remote, local).await
    } else {
        copy_file(sftp, remote, local).await
    }
}

async fn copy_file(sftp: &SftpSession, remote: &str, local: &Path) -> Result<()> {
    let content = sftp
        .read(remote)
        .await
        .map_err(|e| Error::Sftp(format!("{}: {}", remote, e)))?;
    if let Some(parent) = local.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(local, &content).await?;
    Ok(())
}

async fn copy_dir(sftp: &SftpSession, remote: &str, local: &Path) -> Result<()> {
    tokio::fs::create_dir_all(local).await?;

    let entries = sftp
        .read_dir(remote)
        .await
        .map_err(|e| Error::Sftp(format!("{}: {}", remote, e)))?;

    for entry in entries {
        let name = entry.file_name();
        if name == "." || name == ".." {
            continue;
        }

        let remote_child = format!("{}/{}", remote.trim_end_matches('/'), name);
        let local_child = local.join(&name);

        if entry.metadata().is_dir() {
            // Boxed to keep the recursive future finite-sized
            Box::pin(copy_dir(sftp, &remote_child, &local_child)).await?;
        } else {
            copy_file(sftp, &remote_child, &local_child).await?;
        }
    }

    Ok(())
}
