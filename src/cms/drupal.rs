//! Drupal client
//!
//! Multi-site capable: `web/sites/sites.php` maps host patterns to site
//! directories, and each site carries its own prefixed credential keys in
//! the shared `.env` file.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use super::{lookup_or, remote_path_exists, required, CmsClient, DbCredentials};
use crate::config::SshConfig;
use crate::envfile;
use crate::error::{Error, Result};
use crate::export;
use crate::files;
use crate::remote::RemoteClient;

const ROOT: &str = "drupal";
const ENV_FILE: &str = "drupal/.env";
const SITES_FILE: &str = "drupal/web/sites/sites.php";
const VERSION_COMMAND: &str = "cd drupal && vendor/bin/drupal site:status";

/// Entries under a site's files directory that are framework or build
/// artifacts rather than content.
const IGNORED_FILES: &[&str] = &["php", "css", "js", "styles", "simpletest"];

pub struct DrupalClient {
    remote: RemoteClient,
}

impl DrupalClient {
    pub fn new(ssh: SshConfig) -> Self {
        Self {
            remote: RemoteClient::new(ssh),
        }
    }

    fn files_dir(site: &str) -> String {
        format!("web/sites/{}/files", site)
    }
}

#[async_trait]
impl CmsClient for DrupalClient {
    async fn exists(&self) -> Result<bool> {
        remote_path_exists(&self.remote, ROOT).await
    }

    async fn version(&self) -> Result<String> {
        let status = self.remote.run(VERSION_COMMAND).await?;
        parse_version(&status)
    }

    async fn site_names(&self) -> Result<Vec<String>> {
        if !remote_path_exists(&self.remote, SITES_FILE).await? {
            return Ok(vec!["default".to_string()]);
        }
        let contents = self.remote.run(&format!("cat {}", SITES_FILE)).await?;
        Ok(parse_site_names(&contents))
    }

    async fn site_credentials(&self, site: &str) -> Result<DbCredentials> {
        let dotenv = self.remote.run(&format!("cat {}", ENV_FILE)).await?;
        credentials_from_env(&envfile::parse(&dotenv), site)
    }

    async fn export_database(&self, site: &str, credentials: &DbCredentials) -> Result<()> {
        let local_path = PathBuf::from(ROOT)
            .join("data")
            .join(site)
            .join("drupal.sql");
        // Namespaced per site so multi-site runs never collide in ~/tmp
        let temp_basename = format!("drupal_{}.sql", site);
        export::export_database(&self.remote, credentials, &temp_basename, &local_path).await
    }

    async fn sync_files(&self, site: &str) -> Result<()> {
        let files_dir = Self::files_dir(site);
        let local_dir = PathBuf::from(ROOT).join(&files_dir);
        let remote_dir = format!("{}/{}", ROOT, files_dir);
        files::mirror_directory(&self.remote, &remote_dir, &local_dir, IGNORED_FILES).await
    }
}

/// The version is the last field of the second status line.
fn parse_version(status: &str) -> Result<String> {
    status
        .lines()
        .nth(1)
        .and_then(|line| line.trim().split_whitespace().last())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::UnexpectedOutput(format!("no version in status output: {:?}", status))
        })
}

fn site_assignment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\$sites\[['"][^'"]+['"]\]\s?=\s?['"]([^'"]+)['"];"#)
            .expect("site assignment pattern is valid")
    })
}

/// Collect the right-hand side of every `$sites['<key>'] = '<value>';`
/// line, unique, in first-seen order. Either quote style is accepted.
fn parse_site_names(contents: &str) -> Vec<String> {
    let mut site_names: Vec<String> = Vec::new();
    for line in contents.lines() {
        if let Some(captures) = site_assignment_pattern().captures(line.trim()) {
            let site_name = &captures[1];
            if !site_names.iter().any(|known| known == site_name) {
                site_names.push(site_name.to_string());
            }
        }
    }
    site_names
}

/// Per-site credential keys are the uppercased site identifier, dots
/// replaced with underscores, prefixed onto `_DBHOST` and friends.
fn credentials_from_env(vars: &HashMap<String, String>, site: &str) -> Result<DbCredentials> {
    let prefix = site.to_uppercase().replace('.', "_");
    Ok(DbCredentials {
        host: lookup_or(vars, &format!("{}_DBHOST", prefix), "localhost"),
        port: lookup_or(vars, &format!("{}_DBPORT", prefix), "3306"),
        database: required(vars, &format!("{}_DBNAME", prefix))?,
        username: required(vars, &format!("{}_DBUSER", prefix))?,
        password: required(vars, &format!("{}_DBPASS", prefix))?,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_version_from_status_output() {
        let status = "Drupal\n  Version   8.9.13\n  Profile  standard\n";
        assert_eq!(parse_version(status).unwrap(), "8.9.13");
    }

    #[test]
    fn short_status_output_is_an_error() {
        assert!(matches!(
            parse_version("Drupal"),
            Err(Error::UnexpectedOutput(_))
        ));
    }

    #[test]
    fn extracts_site_names_in_first_seen_order() {
        let contents = "<?php\n\
            $sites['example.com'] = 'default';\n\
            $sites[\"blog.example.com\"] = \"blog\";\n\
            $sites['www.example.com'] = 'default';\n";
        assert_eq!(parse_site_names(contents), vec!["default", "blog"]);
    }

    #[test]
    fn accepts_both_quote_styles_and_loose_spacing() {
        let contents = "  $sites['a.example'] = 'alpha';\n\
            $sites[\"b.example\"]=\"beta\";\n\
            \t$sites['c.example'] = \"gamma\";\n";
        assert_eq!(parse_site_names(contents), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn ignores_lines_that_are_not_site_assignments() {
        let contents = "<?php\n\
            // $sites is documented at example.settings.php\n\
            $config['foo'] = 'bar';\n\
            $sites['real.example'] = 'real';\n";
        assert_eq!(parse_site_names(contents), vec!["real"]);
    }

    #[test]
    fn no_assignments_yields_empty_list() {
        assert_eq!(parse_site_names("<?php\n"), Vec::<String>::new());
    }

    #[test]
    fn resolves_prefixed_credentials() {
        let mut vars = HashMap::new();
        vars.insert("BLOG_EXAMPLE_COM_DBNAME".to_string(), "blog_db".to_string());
        vars.insert("BLOG_EXAMPLE_COM_DBUSER".to_string(), "blog".to_string());
        vars.insert("BLOG_EXAMPLE_COM_DBPASS".to_string(), "pw".to_string());
        vars.insert("BLOG_EXAMPLE_COM_DBHOST".to_string(), "db.internal".to_string());

        let credentials = credentials_from_env(&vars, "blog.example.com").unwrap();
        assert_eq!(credentials.database, "blog_db");
        assert_eq!(credentials.host, "db.internal");
        assert_eq!(credentials.port, "3306", "port falls back to the default");
    }

    #[test]
    fn missing_required_key_is_reported_by_name() {
        let mut vars = HashMap::new();
        vars.insert("DEFAULT_DBNAME".to_string(), "db".to_string());
        vars.insert("DEFAULT_DBUSER".to_string(), "user".to_string());

        let err = credentials_from_env(&vars, "default").unwrap_err();
        assert!(matches!(err, Error::MissingKey(ref key) if key == "DEFAULT_DBPASS"));
    }
}
