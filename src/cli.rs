use crate::config::{parse_extensions, parse_patterns, RenderOptions, Theme};
use crate::locale::Locale;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Directory to render, or a git URL to clone and render
    pub source: String,

    /// Where to write the PDF
    pub output: PathBuf,

    /// TOML file with render options; flags given here take precedence
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    #[clap(long, value_enum)]
    pub theme: Option<Theme>,

    /// Only include these extensions, comma separated (e.g. "rs,toml")
    #[clap(long)]
    pub lang_filter: Option<String>,

    /// Extra patterns to exclude, comma separated
    #[clap(long)]
    pub exclude: Option<String>,

    /// Files larger than this many KiB are replaced by a placeholder
    #[clap(long)]
    pub max_size: Option<u64>,

    #[clap(long)]
    pub line_numbers: bool,

    /// Add a section with the repository's commit log
    #[clap(long)]
    pub git_history: bool,

    /// Show the last commit to touch each file
    #[clap(long)]
    pub commit_info: bool,

    /// Leave out file size and modification date
    #[clap(long)]
    pub no_metadata: bool,

    #[clap(long)]
    pub progress: bool,

    /// Language of the document's labels
    #[clap(long, value_enum)]
    pub lang: Option<Locale>,
}

impl RenderArgs {
    /// The options for this run: the config file (or defaults) with flags layered on top.
    pub fn options(&self) -> Result<RenderOptions> {
        let mut options = match &self.config {
            Some(path) => RenderOptions::load(path)?,
            None => RenderOptions::default(),
        };

        if let Some(theme) = self.theme {
            options.theme = theme;
        }
        if let Some(list) = &self.lang_filter {
            options.extension_filter = parse_extensions(list);
        }
        if let Some(list) = &self.exclude {
            options.exclude_patterns.extend(parse_patterns(list));
        }
        if let Some(kib) = self.max_size {
            options.max_file_size_bytes = kib.saturating_mul(1024);
        }
        if let Some(locale) = self.lang {
            options.locale = locale;
        }
        options.show_line_numbers |= self.line_numbers;
        options.include_history |= self.git_history;
        options.include_commit_info |= self.commit_info;
        options.show_progress |= self.progress;
        if self.no_metadata {
            options.include_metadata = false;
        }

        Ok(options)
    }
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Where to write the config file
    #[clap(default_value = "src-pdf.toml")]
    pub path: PathBuf,

    /// Overwrite the file if it already exists
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Renders a directory or git repository into a PDF
    Render(RenderArgs),
    /// Writes a config file with the default render options
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Log more; repeat for even more
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log nothing
    #[clap(short, long, global = true)]
    pub quiet: bool,
}
