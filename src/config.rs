//! Render configuration.
//!
//! [`RenderOptions`] is everything the pipeline needs to know about a single run. It
//! can be built in code through [`RenderOptionsBuilder`], loaded from a TOML file, or
//! assembled by the CLI (which layers its flags over an optional config file).

use crate::locale::Locale;
use anyhow::{Context, Result};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Default per-file render cap (1000 KiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1000 * 1024;

/// Colour scheme of the generated document.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// Options for a single render. Immutable once the run starts.
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub show_line_numbers: bool,
    /// Size and last-modified block under each file heading
    pub include_metadata: bool,
    /// Last commit message and author under each file heading
    pub include_commit_info: bool,
    /// Repository-wide commit log section after the table of contents
    pub include_history: bool,
    /// Files larger than this are replaced by a placeholder
    pub max_file_size_bytes: u64,
    /// Extra glob patterns to exclude, matched anywhere in the tree
    pub exclude_patterns: Vec<String>,
    /// Lowercase extensions (without the dot) to restrict the render to
    #[builder(setter(into, strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_filter: Option<BTreeSet<String>>,
    pub show_progress: bool,
    pub locale: Locale,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            theme: Theme::Light,
            show_line_numbers: false,
            include_metadata: true,
            include_commit_info: false,
            include_history: false,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE,
            exclude_patterns: Vec::default(),
            extension_filter: None,
            show_progress: false,
            locale: Locale::default(),
        }
    }
}

impl RenderOptions {
    /// Load options from a TOML file; missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RenderOptions> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to load {} contents", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML in {}", path.display()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).with_context(|| "Failed to serialize options to TOML")
    }
}

/// Split a comma separated extension list ("js, PY,.rs") into a lowercase set.
///
/// Returns `None` when the list contains no extensions at all.
pub fn parse_extensions(list: &str) -> Option<BTreeSet<String>> {
    let extensions: BTreeSet<String> = list
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();

    if extensions.is_empty() {
        None
    } else {
        Some(extensions)
    }
}

/// Split a comma separated pattern list into trimmed, non-empty patterns.
pub fn parse_patterns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .collect()
}
