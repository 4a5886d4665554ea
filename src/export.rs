//! Database export
//!
//! Dumps the remote database to a temporary file under the remote home
//! directory, pulls it down, and removes the remote copy.

use std::path::Path;

use tracing::info;

use crate::cms::DbCredentials;
use crate::error::Result;
use crate::remote::RemoteClient;

/// Export a database to `local_path`, staging the dump in
/// `~/tmp/<temp_basename>` on the remote host.
///
/// The temporary file is removed after the copy; a failed removal fails
/// the export.
pub async fn export_database(
    remote: &RemoteClient,
    credentials: &DbCredentials,
    temp_basename: &str,
    local_path: &Path,
) -> Result<()> {
    if let Some(parent) = local_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let home = remote.run("pwd").await?;
    remote.run(&format!("mkdir -p {}/tmp", home)).await?;

    let temp_path = format!("{}/tmp/{}", home, temp_basename);
    info!("Dumping database {} to {}", credentials.database, temp_path);
    remote.run(&dump_command(credentials, &temp_path)).await?;

    remote.copy(&temp_path, local_path).await?;
    remote.run(&format!("rm {}", temp_path)).await?;

    info!("Database saved to {}", local_path.display());
    Ok(())
}

/// The password reaches mysqldump only through its environment, never as a
/// command-line argument.
fn dump_command(credentials: &DbCredentials, output_path: &str) -> String {
    format!(
        "MYSQL_PWD='{}' mysqldump --user='{}' '{}' > {}",
        credentials.password, credentials.username, credentials.database, output_path
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn dump_command_shape() {
        let credentials = DbCredentials {
            host: "localhost".to_string(),
            port: "3306".to_string(),
            database: "app_db".to_string(),
            username: "app_user".to_string(),
            password: "p@ss word".to_string(),
        };

        assert_eq!(
            dump_command(&credentials, "/home/deploy/tmp/drupal_default.sql"),
            "MYSQL_PWD='p@ss word' mysqldump --user='app_user' 'app_db' \
             > /home/deploy/tmp/drupal_default.sql"
        );
    }
}
