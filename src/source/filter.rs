//! Per-path eligibility rules.
//!
//! A file is rendered only if it survives, in order: the root `.gitignore`,
//! the caller's exclude patterns and the built-in exclude lists; the extension
//! allow-list; the 10 MiB hard cap; and a zero-byte sniff of its first kilobyte.
//! Dotfiles and symlinks never qualify.
//!
//! Ignore patterns are compiled with `globset` rather than handed to the `ignore`
//! crate's gitignore matcher because a `*` here is allowed to cross path separators.

use crate::config::RenderOptions;
use crate::error::RenderError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

/// Files above this size are never eligible, whatever the render cap is.
pub const HARD_SIZE_LIMIT: u64 = 10 * 1024 * 1024;

/// How much of a file is inspected for zero bytes.
const SNIFF_LEN: u64 = 1024;

/// Directory names that are never descended into.
const EXCLUDED_DIRECTORIES: &[&str] = &[
    // version control
    ".git", ".svn", ".hg",
    // dependencies, build output and caches
    "node_modules", "vendor", "target", "dist", "build", "out", ".cache", ".next", ".nuxt",
    "__pycache__",
    // test and coverage output
    "coverage", ".nyc_output", ".pytest_cache",
    // editors and IDEs
    ".idea", ".vscode", ".vs", ".settings",
];

/// Exact file names (compared case-insensitively).
const EXCLUDED_FILE_NAMES: &[&str] = &[
    // lockfiles
    "package-lock.json", "yarn.lock", "pnpm-lock.yaml", "cargo.lock", "composer.lock",
    "gemfile.lock", "poetry.lock",
    // editor and OS droppings
    ".ds_store", "thumbs.db", ".project", ".classpath",
    // misc tooling
    ".env", ".dockerignore", ".gitattributes", ".eslintcache",
];

/// Extensions (lowercase, without the dot) of binary, media, log and temp files.
const EXCLUDED_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "ico", "svg", "webp", "bmp", "tiff", "avif",
    // audio and video
    "mp3", "mp4", "wav", "ogg", "mov", "avi", "wmv", "flv", "webm", "flac",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // archives and documents
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "pdf",
    // compiled artifacts
    "exe", "dll", "so", "dylib", "o", "a", "class", "jar", "pyc", "pyo", "wasm",
    // IDE project files
    "iml",
    // logs and temp files
    "log", "tmp", "temp", "swp", "tsbuildinfo",
];

/// A compiled list of ignore-file style rules.
///
/// Each glob remembers whether it came from a negated (`!`) rule and whether it only
/// applies to directories (trailing `/`). The last matching rule wins, and a path is
/// ignored if it or any of its ancestor directories is.
#[derive(Debug)]
pub struct IgnoreRules {
    set: GlobSet,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    negated: bool,
    directory_only: bool,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        IgnoreRules {
            set: GlobSet::empty(),
            rules: Vec::default(),
        }
    }
}

impl IgnoreRules {
    /// Load rules from an ignore file. A missing file yields an empty rule set, as
    /// does an unreadable one (with a warning).
    pub fn load(path: &Path) -> IgnoreRules {
        match std::fs::read_to_string(path) {
            Ok(contents) => IgnoreRules::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IgnoreRules::default(),
            Err(e) => {
                log::warn!(
                    "Failed to read {}, continuing without ignore rules: {e}",
                    path.display()
                );
                IgnoreRules::default()
            }
        }
    }

    /// Parse newline separated rules. Patterns that can't be compiled are skipped
    /// with a warning.
    pub fn parse(contents: &str) -> IgnoreRules {
        let mut builder = GlobSetBuilder::new();
        let mut rules = Vec::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (negated, pattern) = match line.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            match compile_rule(pattern) {
                Ok(Some((glob, directory_only))) => {
                    builder.add(glob);
                    rules.push(Rule {
                        negated,
                        directory_only,
                    });
                }
                Ok(None) => {}
                Err(e) => log::warn!("Skipping ignore pattern `{line}`: {e}"),
            }
        }

        IgnoreRules::finish(builder, rules)
    }

    /// Compile caller supplied exclude patterns. Unlike ignore files, a bad pattern
    /// here is a configuration error.
    pub fn from_patterns(patterns: &[String]) -> Result<IgnoreRules, RenderError> {
        let mut builder = GlobSetBuilder::new();
        let mut rules = Vec::default();

        for pattern in patterns {
            match compile_rule(pattern.trim()) {
                Ok(Some((glob, directory_only))) => {
                    builder.add(glob);
                    rules.push(Rule {
                        negated: false,
                        directory_only,
                    });
                }
                Ok(None) => {}
                Err(source) => {
                    return Err(RenderError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    })
                }
            }
        }

        Ok(IgnoreRules::finish(builder, rules))
    }

    fn finish(builder: GlobSetBuilder, rules: Vec<Rule>) -> IgnoreRules {
        match builder.build() {
            Ok(set) => IgnoreRules { set, rules },
            Err(e) => {
                log::warn!("Failed to build ignore rule set, ignoring all rules: {e}");
                IgnoreRules::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `relative` (a path relative to the root) is ignored, either directly
    /// or through one of its ancestor directories.
    pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        if self.is_empty() {
            return false;
        }

        let mut ancestors: Vec<&Path> = relative
            .ancestors()
            .skip(1)
            .filter(|a| !a.as_os_str().is_empty())
            .collect();
        ancestors.reverse();

        ancestors
            .into_iter()
            .any(|ancestor| self.matches(ancestor, true))
            || self.matches(relative, is_dir)
    }

    fn matches(&self, path: &Path, is_dir: bool) -> bool {
        self.set
            .matches(normalise(path))
            .into_iter()
            .filter(|&i| is_dir || !self.rules[i].directory_only)
            .max()
            .map(|i| !self.rules[i].negated)
            .unwrap_or(false)
    }
}

/// Turn one rule into a glob. A leading `/` anchors the rule at the root, otherwise
/// it may match at any depth; a trailing `/` restricts it to directories.
fn compile_rule(pattern: &str) -> Result<Option<(globset::Glob, bool)>, globset::Error> {
    let anchored = pattern.starts_with('/');
    let directory_only = pattern.ends_with('/');
    let body = pattern.trim_start_matches('/').trim_end_matches('/');
    if body.is_empty() {
        return Ok(None);
    }

    let glob = if anchored {
        body.to_string()
    } else {
        format!("**/{body}")
    };
    let glob = GlobBuilder::new(&glob).literal_separator(false).build()?;
    Ok(Some((glob, directory_only)))
}

/// Forward-slash form of a relative path, so patterns behave the same on every OS.
fn normalise(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Lowercase extension of a path, if it has one.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
}

fn is_dotted(part: &OsStr) -> bool {
    part.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

/// Whether a path matches the fixed built-in exclude lists.
fn is_builtin_excluded(relative: &Path, is_dir: bool) -> bool {
    let parts: Vec<&OsStr> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    let Some((last, parents)) = parts.split_last() else {
        return false;
    };

    let excluded_dir = |part: &OsStr| {
        part.to_str()
            .map(|s| EXCLUDED_DIRECTORIES.contains(&s))
            .unwrap_or(false)
    };
    if parents.iter().any(|p| excluded_dir(p)) {
        return true;
    }
    if is_dir {
        return excluded_dir(last);
    }

    let name = last.to_string_lossy().to_lowercase();
    if EXCLUDED_FILE_NAMES.contains(&name.as_str()) || name.contains(".sublime-") {
        return true;
    }
    extension_of(relative)
        .map(|ext| EXCLUDED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Decides, per candidate path, whether it is rendered into the document.
#[derive(Debug)]
pub struct PathFilter {
    root: PathBuf,
    gitignore: IgnoreRules,
    excludes: IgnoreRules,
    extensions: Option<BTreeSet<String>>,
}

impl PathFilter {
    /// Build a filter for `root`, reading `root/.gitignore` if it exists.
    pub fn new(root: &Path, options: &RenderOptions) -> Result<PathFilter, RenderError> {
        let gitignore = IgnoreRules::load(&root.join(".gitignore"));
        let excludes = IgnoreRules::from_patterns(&options.exclude_patterns)?;

        Ok(PathFilter {
            root: root.to_path_buf(),
            gitignore,
            excludes,
            extensions: options.extension_filter.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Rule 1 and the dotfile rule: name based exclusion of a root-relative path.
    pub fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        relative.components().any(|c| match c {
            Component::Normal(part) => is_dotted(part),
            _ => false,
        }) || is_builtin_excluded(relative, is_dir)
            || self.gitignore.is_ignored(relative, is_dir)
            || self.excludes.is_ignored(relative, is_dir)
    }

    /// Whether a directory met during the walk should be skipped with its subtree.
    pub fn prunes_directory(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(relative) if !relative.as_os_str().is_empty() => self.is_excluded(relative, true),
            _ => false,
        }
    }

    /// Whether `path` (absolute, or relative to the root) is an eligible file.
    ///
    /// Any filesystem error makes the path ineligible; nothing is propagated.
    pub fn eligible(&self, path: &Path) -> bool {
        let (absolute, relative) = if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(relative) => (path.to_path_buf(), relative.to_path_buf()),
                Err(_) => return false,
            }
        } else {
            (self.root.join(path), path.to_path_buf())
        };

        let metadata = match std::fs::symlink_metadata(&absolute) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Can't stat {}, skipping it: {e}", absolute.display());
                return false;
            }
        };
        if metadata.file_type().is_symlink() || !metadata.is_file() {
            return false;
        }

        if self.is_excluded(&relative, false) {
            return false;
        }

        if let Some(extensions) = &self.extensions {
            match extension_of(&relative) {
                Some(ext) if extensions.contains(&ext) => {}
                _ => return false,
            }
        }

        if metadata.len() > HARD_SIZE_LIMIT {
            return false;
        }

        match looks_binary(&absolute) {
            Ok(binary) => !binary,
            Err(e) => {
                log::warn!("Can't sniff {}, skipping it: {e}", absolute.display());
                false
            }
        }
    }
}

/// Whether the first kilobyte of a file contains a zero byte.
fn looks_binary(path: &Path) -> std::io::Result<bool> {
    let file = std::fs::File::open(path)?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(head.contains(&0))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::RenderOptionsBuilder;

    fn write(root: &Path, relative: &str, contents: &[u8]) -> PathBuf {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("can create parent directory");
        }
        std::fs::write(&path, contents).expect("can write file");
        path
    }

    #[test]
    fn trailing_slash_rules_match_whole_subtree() {
        let rules = IgnoreRules::parse("build/\n");
        assert!(rules.is_ignored(Path::new("build/out.js"), false));
        assert!(rules.is_ignored(Path::new("src/build/deep/x.rs"), false));
        assert!(rules.is_ignored(Path::new("build"), true));
        // a plain file named `build` is not a directory
        assert!(!rules.is_ignored(Path::new("build"), false));
    }

    #[test]
    fn leading_slash_rules_are_anchored() {
        let rules = IgnoreRules::parse("/secret.txt\n");
        assert!(rules.is_ignored(Path::new("secret.txt"), false));
        assert!(!rules.is_ignored(Path::new("nested/secret.txt"), false));
    }

    #[test]
    fn star_crosses_segments() {
        let rules = IgnoreRules::parse("docs*.md\n");
        assert!(rules.is_ignored(Path::new("docs/guide/intro.md"), false));
        assert!(!rules.is_ignored(Path::new("docs/guide/intro.rs"), false));
    }

    #[test]
    fn comments_blanks_and_negation() {
        let rules = IgnoreRules::parse("# comment\n\n*.gen.rs\n!keep.gen.rs\n");
        assert!(rules.is_ignored(Path::new("src/a.gen.rs"), false));
        assert!(!rules.is_ignored(Path::new("src/keep.gen.rs"), false));
        assert!(!rules.is_ignored(Path::new("src/main.rs"), false));
    }

    #[test]
    fn invalid_caller_pattern_is_an_error() {
        let result = IgnoreRules::from_patterns(&["a[".to_string()]);
        assert!(matches!(result, Err(RenderError::InvalidPattern { .. })));
    }

    #[test]
    fn builtin_excludes() {
        assert!(is_builtin_excluded(Path::new("node_modules/x/index.js"), false));
        assert!(is_builtin_excluded(Path::new("package-lock.json"), false));
        assert!(is_builtin_excluded(Path::new("assets/logo.PNG"), false));
        assert!(is_builtin_excluded(Path::new("Thumbs.db"), false));
        assert!(is_builtin_excluded(Path::new("debug.log"), false));
        assert!(is_builtin_excluded(Path::new("target"), true));
        // substrings of excluded names don't count
        assert!(!is_builtin_excluded(Path::new("src/layout.rs"), false));
        assert!(!is_builtin_excluded(Path::new("src/output/mod.rs"), false));
    }

    #[test]
    fn filter_applies_every_rule() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let root = dir.path();
        write(root, ".gitignore", b"ignored/\n");
        let good = write(root, "src/main.rs", b"fn main() {}\n");
        let ignored = write(root, "ignored/a.rs", b"fn a() {}\n");
        let excluded = write(root, "gen/b.rs", b"fn b() {}\n");
        let binary = write(root, "src/blob.rs", b"abc\0def");
        let dotfile = write(root, ".hidden.rs", b"fn c() {}\n");
        let other_ext = write(root, "notes.txt", b"hello\n");

        let options = RenderOptionsBuilder::default()
            .exclude_patterns(vec!["gen".to_string()])
            .build()
            .expect("can build options");
        let filter = PathFilter::new(root, &options).expect("can build filter");

        assert!(filter.eligible(&good));
        assert!(filter.eligible(Path::new("src/main.rs")));
        assert!(!filter.eligible(&ignored));
        assert!(!filter.eligible(&excluded));
        assert!(!filter.eligible(&binary));
        assert!(!filter.eligible(&dotfile));
        assert!(filter.eligible(&other_ext));
        assert!(!filter.eligible(&root.join("does/not/exist.rs")));

        let options = RenderOptionsBuilder::default()
            .extension_filter(BTreeSet::from(["rs".to_string()]))
            .build()
            .expect("can build options");
        let filter = PathFilter::new(root, &options).expect("can build filter");
        assert!(filter.eligible(&good));
        assert!(!filter.eligible(&other_ext));
    }

    #[test]
    fn oversized_files_are_rejected() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let big = dir.path().join("big.txt");
        let file = std::fs::File::create(&big).expect("can create file");
        file.set_len(HARD_SIZE_LIMIT + 1).expect("can extend file");
        drop(file);
        let filter =
            PathFilter::new(dir.path(), &RenderOptions::default()).expect("can build filter");
        assert!(!filter.eligible(&big));
        assert!(std::fs::metadata(&big).expect("can stat").len() > HARD_SIZE_LIMIT);
    }

    #[test]
    fn eligibility_is_idempotent() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = write(dir.path(), "lib.py", b"print('hi')\n");
        let filter =
            PathFilter::new(dir.path(), &RenderOptions::default()).expect("can build filter");
        let first = filter.eligible(&path);
        assert_eq!(first, filter.eligible(&path));
        assert!(first);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_never_eligible() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let target = write(dir.path(), "real.rs", b"fn real() {}\n");
        let link = dir.path().join("link.rs");
        std::os::unix::fs::symlink(&target, &link).expect("can create symlink");
        let filter =
            PathFilter::new(dir.path(), &RenderOptions::default()).expect("can build filter");
        assert!(filter.eligible(&target));
        assert!(!filter.eligible(&link));
    }

    #[test]
    fn failed_checks_are_warned_about() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let filter =
            PathFilter::new(dir.path(), &RenderOptions::default()).expect("can build filter");

        let records = crate::test_log::capture(|| {
            assert!(!filter.eligible(Path::new("vanished.rs")));
        });
        assert!(records
            .iter()
            .any(|(level, message)| *level == log::Level::Warn && message.contains("vanished.rs")));
    }
}
