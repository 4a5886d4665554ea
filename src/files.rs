//! Uploads mirroring
//!
//! The local mirror is replaced wholesale: whatever was there is deleted,
//! then the remote directory listing, minus the ignore-list, is copied
//! down entry by entry.

use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::remote::RemoteClient;

pub async fn mirror_directory(
    remote: &RemoteClient,
    remote_dir: &str,
    local_dir: &Path,
    ignored: &[&str],
) -> Result<()> {
    reset_local_dir(local_dir).await?;

    let listing = remote.run(&format!("ls {}", remote_dir)).await?;
    for name in listed_entries(&listing, ignored) {
        let remote_path = format!("{}/{}", remote_dir, name);
        let local_path = local_dir.join(name);
        debug!("Copying {}", remote_path);
        remote.copy(&remote_path, &local_path).await?;
    }

    info!("Mirrored {} into {}", remote_dir, local_dir.display());
    Ok(())
}

/// Delete and recreate the mirror directory. A missing directory is fine;
/// stale content is not.
async fn reset_local_dir(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// Split an `ls` listing into entry names, dropping blanks and ignored
/// names. The ignore match is on the bare name, not a path pattern.
fn listed_entries<'a>(listing: &'a str, ignored: &[&str]) -> Vec<&'a str> {
    listing
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty() && !ignored.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn filters_ignored_and_blank_entries() {
        let listing = "2024-01\ncache\n\nlogo.png\n  \ncss\n";
        assert_eq!(
            listed_entries(listing, &["cache", "css"]),
            vec!["2024-01", "logo.png"]
        );
    }

    #[test]
    fn empty_listing_yields_no_entries() {
        assert_eq!(listed_entries("", &["cache"]), Vec::<&str>::new());
    }

    #[test]
    fn ignore_match_is_exact_name_not_pattern() {
        let listing = "cache\ncache2\nmy-cache\n";
        assert_eq!(
            listed_entries(listing, &["cache"]),
            vec!["cache2", "my-cache"]
        );
    }

    #[tokio::test]
    async fn reset_removes_stale_content() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = dir.path().join("uploads");
        std::fs::create_dir_all(mirror.join("stale")).unwrap();
        std::fs::write(mirror.join("stale.txt"), b"old").unwrap();

        reset_local_dir(&mirror).await.unwrap();

        assert!(mirror.is_dir());
        assert_eq!(std::fs::read_dir(&mirror).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn reset_tolerates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = dir.path().join("never/created/uploads");

        reset_local_dir(&mirror).await.unwrap();

        assert!(mirror.is_dir());
    }
}
