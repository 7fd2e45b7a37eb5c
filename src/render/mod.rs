//! From a source tree to a finished document.

mod assembler;
mod progress;

pub use assembler::*;
pub use progress::*;

use crate::config::RenderOptions;
use crate::error::RenderError;
use crate::highlight::Tokenizer;
use crate::history::{GitHistory, HistoryProvider};
use crate::sinks::{DocumentWriter, PdfWriter};
use crate::source::{collect, is_git_url, RemoteRepository};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Render `source` (a directory or git URL) into a PDF at `destination`.
///
/// Fails before creating any output if nothing survives filtering. Missing git
/// history only costs the sections that need it.
pub fn convert(
    source: &str,
    destination: &Path,
    options: &RenderOptions,
    sink: &mut dyn ProgressSink,
) -> Result<()> {
    let remote = if is_git_url(source) {
        Some(RemoteRepository::fetch(source)?)
    } else {
        None
    };
    let root = match remote.as_ref() {
        Some(remote) => remote.path().to_path_buf(),
        None => PathBuf::from(source),
    };
    let source_name = if remote.is_some() {
        source.to_string()
    } else {
        root.canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| source.to_string())
    };

    let files = collect(&root, options)
        .with_context(|| format!("Failed to collect files from {source}"))?;
    if files.is_empty() {
        return Err(RenderError::NoEligibleFiles.into());
    }

    let history = if options.include_history || options.include_commit_info {
        match GitHistory::open(&root) {
            Ok(history) => Some(history),
            Err(e) => {
                log::warn!("Git history unavailable, continuing without it: {e:#}");
                None
            }
        }
    } else {
        None
    };
    let log = match (&history, options.include_history) {
        (Some(history), true) => match history.log() {
            Ok(log) => Some(log),
            Err(e) => {
                log::warn!("Failed to read the commit log, skipping history: {e:#}");
                None
            }
        },
        _ => None,
    };

    let tokenizer = Tokenizer::new()?;
    let mut writer = PdfWriter::create(destination, options.theme, options.locale.labels().title)?;

    let mut assembler = DocumentAssembler::new(&mut writer, options, &tokenizer, sink)
        .with_source_name(source_name);
    if let Some(history) = history.as_ref() {
        assembler = assembler.with_history(history);
    }
    if let Some(log) = log.as_deref() {
        assembler = assembler.with_log(log);
    }
    assembler.assemble(&files)?;
    drop(assembler);

    log::info!(
        "Rendered {} files into {} pages",
        files.len(),
        writer.page_count()
    );
    writer
        .finish()
        .with_context(|| format!("Failed to write {}", destination.display()))
}
