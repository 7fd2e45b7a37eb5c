//! Everything about finding and reading the files that go into the document.

mod filter;
pub use filter::*;

pub mod loader;

mod remote;
pub use remote::*;

use crate::config::RenderOptions;
use crate::error::RenderError;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file that made it through the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the collection root, used for headings and the contents
    pub relative_path: PathBuf,
}

impl FileEntry {
    pub fn new<P: Into<PathBuf>>(root: &Path, path: P) -> Option<FileEntry> {
        let path: PathBuf = path.into();
        let relative_path = path.strip_prefix(root).ok()?.to_path_buf();
        Some(FileEntry {
            path,
            relative_path,
        })
    }

    /// Lowercase extension, which doubles as the language hint for highlighting.
    pub fn extension(&self) -> String {
        extension_of(&self.path).unwrap_or_default()
    }
}

/// Walk `root` and return every eligible file, sorted by relative path.
///
/// Directories matching an exclude rule are pruned during the walk, and symlinks are
/// never followed. The per-file checks (which stat and sniff the file) run in
/// parallel; the result order doesn't depend on which finishes first. An empty result
/// is not an error here; the caller decides what nothing to render means.
pub fn collect(root: &Path, options: &RenderOptions) -> Result<Vec<FileEntry>> {
    if !root.is_dir() {
        return Err(RenderError::NotADirectory(root.to_path_buf()).into());
    }
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to canonicalize {}", root.display()))?;

    let filter = Arc::new(PathFilter::new(&root, options)?);

    let mut builder = WalkBuilder::new(&root);
    builder
        .hidden(true)
        .follow_links(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .require_git(false);
    let walk_filter = Arc::clone(&filter);
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
        !(is_dir && walk_filter.prunes_directory(entry.path()))
    });

    let mut candidates: Vec<PathBuf> = Vec::default();
    for entry in builder.build() {
        match entry {
            Ok(entry) => {
                if entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                    candidates.push(entry.into_path());
                }
            }
            Err(e) => log::warn!("Skipping unreadable path: {e}"),
        }
    }
    log::debug!(
        "Walk of {} found {} candidate files",
        root.display(),
        candidates.len()
    );

    let mut files: Vec<FileEntry> = candidates
        .into_par_iter()
        .filter(|path| filter.eligible(path))
        .filter_map(|path| FileEntry::new(&root, path))
        .collect();
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    log::info!("Collected {} eligible files", files.len());
    Ok(files)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::RenderOptionsBuilder;
    use std::collections::BTreeSet;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("can create parent directory");
        }
        std::fs::write(path, contents).expect("can write file");
    }

    fn relative_paths(files: &[FileEntry]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.relative_path.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn collects_in_lexical_order() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let root = dir.path();
        write(root, "src/zeta.rs", "fn z() {}\n");
        write(root, "src/alpha.rs", "fn a() {}\n");
        write(root, "README.md", "# hi\n");
        write(root, "lib/mod.rs", "mod x;\n");

        let files = collect(root, &RenderOptions::default()).expect("can collect");
        assert_eq!(
            relative_paths(&files),
            vec!["README.md", "lib/mod.rs", "src/alpha.rs", "src/zeta.rs"]
        );
        for file in files.iter() {
            assert!(file.path.is_absolute());
            assert!(file.path.ends_with(&file.relative_path));
        }

        let again = collect(root, &RenderOptions::default()).expect("can collect again");
        assert_eq!(files, again);
    }

    #[test]
    fn gitignored_directories_are_absent() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let root = dir.path();
        write(root, ".gitignore", "build/\n");
        write(root, "build/out.js", "console.log(1);\n");
        write(root, "src/app.js", "console.log(2);\n");

        let files = collect(root, &RenderOptions::default()).expect("can collect");
        assert_eq!(relative_paths(&files), vec!["src/app.js"]);
    }

    #[test]
    fn gitignore_prunes_non_builtin_directories() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let root = dir.path();
        write(root, ".gitignore", "generated/\n/local.txt\n");
        write(root, "generated/a.rs", "fn a() {}\n");
        write(root, "local.txt", "x\n");
        write(root, "nested/local.txt", "y\n");

        let files = collect(root, &RenderOptions::default()).expect("can collect");
        assert_eq!(relative_paths(&files), vec!["nested/local.txt"]);
    }

    #[test]
    fn extension_filter_and_excludes_apply() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let root = dir.path();
        write(root, "a.py", "print(1)\n");
        write(root, "b.js", "x\n");
        write(root, "tests/c.py", "print(2)\n");

        let options = RenderOptionsBuilder::default()
            .extension_filter(BTreeSet::from(["py".to_string()]))
            .exclude_patterns(vec!["tests".to_string()])
            .build()
            .expect("can build options");
        let files = collect(root, &options).expect("can collect");
        assert_eq!(relative_paths(&files), vec!["a.py"]);
    }

    #[test]
    fn nothing_eligible_is_an_empty_list() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        write(dir.path(), "image.png", "not really\n");
        let files = collect(dir.path(), &RenderOptions::default()).expect("can collect");
        assert!(files.is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let result = collect(&dir.path().join("nope"), &RenderOptions::default());
        assert!(result.is_err());
    }
}
