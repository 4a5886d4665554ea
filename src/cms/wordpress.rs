//! WordPress client
//!
//! Single implicit site; credentials come from fixed `DB_*` keys in the
//! installation's `.env` file.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use super::{lookup_or, remote_path_exists, required, CmsClient, DbCredentials};
use crate::config::SshConfig;
use crate::envfile;
use crate::error::Result;
use crate::export;
use crate::files;
use crate::remote::RemoteClient;

const ROOT: &str = "wordpress";
const ENV_FILE: &str = "wordpress/.env";
const UPLOADS_DIR: &str = "web/app/uploads";
const VERSION_COMMAND: &str = "cd wordpress && vendor/bin/wp core version";

/// Regenerable cache content is skipped during file sync.
const IGNORED_FILES: &[&str] = &["cache"];

pub struct WordpressClient {
    remote: RemoteClient,
}

impl WordpressClient {
    pub fn new(ssh: SshConfig) -> Self {
        Self {
            remote: RemoteClient::new(ssh),
        }
    }
}

#[async_trait]
impl CmsClient for WordpressClient {
    async fn exists(&self) -> Result<bool> {
        remote_path_exists(&self.remote, ROOT).await
    }

    async fn version(&self) -> Result<String> {
        self.remote.run(VERSION_COMMAND).await
    }

    async fn site_names(&self) -> Result<Vec<String>> {
        Ok(vec!["default".to_string()])
    }

    async fn site_credentials(&self, _site: &str) -> Result<DbCredentials> {
        let dotenv = self.remote.run(&format!("cat {}", ENV_FILE)).await?;
        credentials_from_env(&envfile::parse(&dotenv))
    }

    async fn export_database(&self, _site: &str, credentials: &DbCredentials) -> Result<()> {
        let local_path = PathBuf::from(ROOT).join("data").join("wordpress.sql");
        export::export_database(&self.remote, credentials, "wordpress.sql", &local_path).await
    }

    async fn sync_files(&self, _site: &str) -> Result<()> {
        let local_dir = PathBuf::from(ROOT).join(UPLOADS_DIR);
        let remote_dir = format!("{}/{}", ROOT, UPLOADS_DIR);
        files::mirror_directory(&self.remote, &remote_dir, &local_dir, IGNORED_FILES).await
    }
}

fn credentials_from_env(vars: &HashMap<String, String>) -> Result<DbCredentials> {
    Ok(DbCredentials {
        host: lookup_or(vars, "DB_HOST", "localhost"),
        port: lookup_or(vars, "DB_PORT", "3306"),
        database: required(vars, "DB_NAME")?,
        username: required(vars, "DB_USER")?,
        password: required(vars, "DB_PASSWORD")?,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::Error;

    #[test]
    fn resolves_fixed_keys_with_defaults() {
        let mut vars = HashMap::new();
        vars.insert("DB_NAME".to_string(), "wp".to_string());
        vars.insert("DB_USER".to_string(), "wp_user".to_string());
        vars.insert("DB_PASSWORD".to_string(), "pw".to_string());

        let credentials = credentials_from_env(&vars).unwrap();
        assert_eq!(credentials.host, "localhost");
        assert_eq!(credentials.port, "3306");
        assert_eq!(credentials.database, "wp");
    }

    #[test]
    fn missing_password_is_reported_by_name() {
        let mut vars = HashMap::new();
        vars.insert("DB_NAME".to_string(), "wp".to_string());
        vars.insert("DB_USER".to_string(), "wp_user".to_string());

        let err = credentials_from_env(&vars).unwrap_err();
        assert!(matches!(err, Error::MissingKey(ref key) if key == "DB_PASSWORD"));
    }
}
