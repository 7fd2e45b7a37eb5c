//! Remote repositories: recognising git URLs and cloning them into scratch space.

use anyhow::{Context, Result};
use std::path::Path;
use tempfile::TempDir;

/// Whether `source` looks like a git remote rather than a local directory.
///
/// Accepts `http(s)://`, `ssh://` and scp-like `user@host:` forms, all ending in
/// `.git` with an optional trailing slash.
pub fn is_git_url(source: &str) -> bool {
    let trimmed = source.trim().trim_end_matches('/');
    if !trimmed.ends_with(".git") || trimmed.len() <= ".git".len() {
        return false;
    }

    let remote_prefix = ["http://", "https://", "ssh://", "git://"]
        .iter()
        .any(|prefix| trimmed.starts_with(prefix));
    let scp_like = trimmed
        .split_once(':')
        .map(|(host, _)| host.contains('@') && !host.contains('/'))
        .unwrap_or(false);

    remote_prefix || scp_like
}

/// A repository cloned into a temporary directory, removed again on drop.
#[derive(Debug)]
pub struct RemoteRepository {
    dir: TempDir,
}

impl RemoteRepository {
    pub fn fetch(url: &str) -> Result<RemoteRepository> {
        let dir = tempfile::Builder::new()
            .prefix("src-pdf-")
            .tempdir()
            .with_context(|| "Failed to create a scratch directory for cloning")?;

        log::info!("Cloning {url} into {}", dir.path().display());
        git2::Repository::clone(url, dir.path())
            .with_context(|| format!("Failed to clone {url}"))?;

        Ok(RemoteRepository { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn recognises_git_urls() {
        assert!(is_git_url("https://github.com/user/repo.git"));
        assert!(is_git_url("http://example.com/repo.git/"));
        assert!(is_git_url("git@github.com:user/repo.git"));
        assert!(is_git_url("ssh://git@host/repo.git"));
    }

    #[test]
    fn local_paths_are_not_git_urls() {
        assert!(!is_git_url("."));
        assert!(!is_git_url("./projects/repo"));
        assert!(!is_git_url("/home/me/repo.git"));
        assert!(!is_git_url("https://github.com/user/repo"));
        assert!(!is_git_url(".git"));
    }

    #[test]
    fn fetch_clones_and_cleans_up() {
        let origin = tempfile::tempdir().expect("can create temp dir");
        let repo = git2::Repository::init(origin.path()).expect("can init repo");
        crate::history::test::commit_files(&repo, &[("lib.rs", "pub fn f() {}\n")], "init", "Ada");

        let url = origin.path().display().to_string();
        let remote = RemoteRepository::fetch(&url).expect("can clone local repo");
        let clone = remote.path().to_path_buf();
        assert_eq!(
            std::fs::read_to_string(clone.join("lib.rs")).expect("file was checked out"),
            "pub fn f() {}\n"
        );

        drop(remote);
        assert!(!clone.exists());
    }
}
