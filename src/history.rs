//! Commit history for the history section and per-file commit blocks.

use anyhow::{anyhow, Context, Result};
use chrono::prelude::*;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A single commit as shown in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Full SHA-1 hash
    pub hash: String,
    pub date: DateTime<FixedOffset>,
    pub author: String,
    /// First line of the commit message
    pub message: String,
}

impl From<&git2::Commit<'_>> for CommitRecord {
    fn from(c: &git2::Commit) -> Self {
        let signature = c.author();
        let author = match (signature.name(), signature.email()) {
            (Some(name), _) if !name.is_empty() => name.to_string(),
            (_, Some(email)) => email.to_string(),
            _ => String::from("unknown"),
        };

        let message = c.summary().unwrap_or_default().to_string();

        let time = c.time();
        let timezone = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or(Utc.fix());
        let date = timezone
            .timestamp_opt(time.seconds(), 0)
            .single()
            .unwrap_or_else(|| DateTime::UNIX_EPOCH.fixed_offset());

        CommitRecord {
            hash: c.id().to_string(),
            date,
            author,
            message,
        }
    }
}

/// Source of version-history context for the document.
pub trait HistoryProvider {
    /// Every commit reachable from HEAD, newest first.
    fn log(&self) -> Result<Vec<CommitRecord>>;

    /// The most recent commit that changed `path`, if any.
    fn last_commit(&self, path: &Path) -> Result<Option<CommitRecord>>;
}

/// History read straight out of a local git repository.
///
/// The root may be any directory inside the working tree. Per-file lookups share
/// one walk of the history, made the first time one is asked for.
pub struct GitHistory {
    repo: git2::Repository,
    workdir: PathBuf,
    last_commits: OnceCell<HashMap<PathBuf, CommitRecord>>,
}

impl GitHistory {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<GitHistory> {
        let root = root.as_ref();
        let repo = git2::Repository::discover(root).with_context(|| {
            format!(
                "Failed to find a git repository containing {}!",
                root.display()
            )
        })?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| anyhow!("Repository {} has no working directory", root.display()))?
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize {}", root.display()))?;

        Ok(GitHistory {
            repo,
            workdir,
            last_commits: OnceCell::new(),
        })
    }

    fn walk_from_head(&self) -> Result<git2::Revwalk<'_>> {
        let mut walk = self
            .repo
            .revwalk()
            .with_context(|| "Failed to start walking the repository")?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)
            .with_context(|| "Failed to sort revwalk")?;
        walk.push_head()
            .with_context(|| "Failed to push HEAD to revwalk")?;
        Ok(walk)
    }

    fn relative(&self, path: &Path) -> Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.canonicalize()
                .with_context(|| format!("Failed to canonicalize {}", path.display()))?
        } else {
            self.workdir.join(path)
        };
        let relative = absolute.strip_prefix(&self.workdir).with_context(|| {
            format!(
                "{} isn't inside repository {}",
                absolute.display(),
                self.workdir.display()
            )
        })?;
        Ok(relative.to_path_buf())
    }

    /// Map every path in history to the newest commit that changed it relative to
    /// that commit's first parent.
    fn index_last_commits(&self) -> Result<HashMap<PathBuf, CommitRecord>> {
        let mut last_commits: HashMap<PathBuf, CommitRecord> = HashMap::default();
        for oid in self.walk_from_head()? {
            let oid = oid.with_context(|| "Failed to get OID while walking repository")?;
            let commit = self
                .repo
                .find_commit(oid)
                .with_context(|| format!("Failed to find commit for OID {}", oid))?;
            let tree = commit
                .tree()
                .with_context(|| format!("Failed to load tree of commit {}", oid))?;
            let parent_tree = match commit.parent(0) {
                Ok(parent) => Some(
                    parent
                        .tree()
                        .with_context(|| format!("Failed to load tree of parent of {}", oid))?,
                ),
                Err(_) => None,
            };

            let diff = self
                .repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
                .with_context(|| format!("Failed to diff commit {}", oid))?;

            let mut record: Option<CommitRecord> = None;
            for delta in diff.deltas() {
                if delta.status() == git2::Delta::Deleted {
                    continue;
                }
                let Some(path) = delta.new_file().path() else {
                    continue;
                };
                if last_commits.contains_key(path) {
                    continue;
                }
                let entry = record.get_or_insert_with(|| CommitRecord::from(&commit));
                last_commits.insert(path.to_path_buf(), entry.clone());
            }
        }
        log::debug!("Indexed last commits for {} paths", last_commits.len());
        Ok(last_commits)
    }
}

impl HistoryProvider for GitHistory {
    fn log(&self) -> Result<Vec<CommitRecord>> {
        let mut commits: Vec<CommitRecord> = Vec::default();
        for oid in self.walk_from_head()? {
            let oid = oid.with_context(|| "Failed to get OID while walking repository")?;
            let commit = self
                .repo
                .find_commit(oid)
                .with_context(|| format!("Failed to find commit for OID {}", oid))?;
            commits.push(CommitRecord::from(&commit));
        }
        Ok(commits)
    }

    fn last_commit(&self, path: &Path) -> Result<Option<CommitRecord>> {
        let relative = self.relative(path)?;

        if self.last_commits.get().is_none() {
            let index = self.index_last_commits()?;
            let _ = self.last_commits.set(index);
        }
        Ok(self
            .last_commits
            .get()
            .and_then(|index| index.get(&relative))
            .cloned())
    }
}
