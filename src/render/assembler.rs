use super::{ProgressSink, RenderContext};
use crate::config::RenderOptions;
use crate::highlight::{Palette, Tokenizer};
use crate::history::{CommitRecord, HistoryProvider};
use crate::locale::Labels;
use crate::sinks::{Align, DocumentWriter, Span, TextStyle};
use crate::source::{loader, FileEntry};
use anyhow::{Context, Result};
use chrono::prelude::*;
use std::path::Path;

/// Files rendered between writer flushes.
pub const BATCH_SIZE: usize = 10;

/// Width of the `{:>4} ` line-number gutter.
const GUTTER_WIDTH: usize = 5;

/// Name of the destination placed at the heading of the `index`th file.
pub fn anchor_for(index: usize) -> String {
    format!("file-{index}")
}

/// Lays out the whole document: title page, contents, history, then one section per
/// file.
pub struct DocumentAssembler<'a, W: DocumentWriter> {
    writer: &'a mut W,
    options: &'a RenderOptions,
    tokenizer: &'a Tokenizer,
    loader: Box<dyn Fn(&Path) -> String + 'a>,
    history: Option<&'a dyn HistoryProvider>,
    log: Option<&'a [CommitRecord]>,
    sink: &'a mut dyn ProgressSink,
    context: RenderContext,
    source_name: String,
    palette: &'static Palette,
}

impl<'a, W: DocumentWriter> DocumentAssembler<'a, W> {
    pub fn new(
        writer: &'a mut W,
        options: &'a RenderOptions,
        tokenizer: &'a Tokenizer,
        sink: &'a mut dyn ProgressSink,
    ) -> DocumentAssembler<'a, W> {
        let max_size = options.max_file_size_bytes;
        DocumentAssembler {
            writer,
            options,
            tokenizer,
            loader: Box::new(move |path| loader::load(path, max_size)),
            history: None,
            log: None,
            sink,
            context: RenderContext::new(0, options.locale),
            source_name: String::default(),
            palette: Palette::for_theme(options.theme),
        }
    }

    /// Where per-file commit information comes from.
    pub fn with_history(mut self, history: &'a dyn HistoryProvider) -> Self {
        self.history = Some(history);
        self
    }

    /// The repository log for the history section.
    pub fn with_log(mut self, log: &'a [CommitRecord]) -> Self {
        self.log = Some(log);
        self
    }

    /// Replace how file contents are read.
    pub fn with_loader<F: Fn(&Path) -> String + 'a>(mut self, loader: F) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// The name shown on the title page, usually the directory name or URL.
    pub fn with_source_name<S: Into<String>>(mut self, source_name: S) -> Self {
        self.source_name = source_name.into();
        self
    }

    fn labels(&self) -> &'static Labels {
        self.context.locale.labels()
    }

    pub fn assemble(&mut self, files: &[FileEntry]) -> Result<()> {
        self.context = RenderContext::new(files.len(), self.options.locale);

        self.title_page()
            .with_context(|| "Failed to render title page")?;
        self.table_of_contents(files)
            .with_context(|| "Failed to render table of contents")?;
        if self.options.include_history {
            if let Some(log) = self.log {
                self.history_section(log)
                    .with_context(|| "Failed to render commit history")?;
            }
        }

        for (batch_index, batch) in files.chunks(BATCH_SIZE).enumerate() {
            for (i, file) in batch.iter().enumerate() {
                let index = batch_index * BATCH_SIZE + i;
                self.context.progress.start(&file.relative_path);
                self.sink.file_started(&self.context.progress);

                self.file_section(index, file).with_context(|| {
                    format!("Failed to render source file {}", file.relative_path.display())
                })?;

                self.context.progress.complete();
                self.sink.file_completed(&self.context.progress);
            }

            self.writer
                .flush()
                .with_context(|| "Failed to flush pages")?;
            self.sink.batch_completed(&self.context.progress);
        }

        Ok(())
    }

    fn plain(&mut self, text: String, style: TextStyle, align: Align) -> Result<()> {
        let spans = [Span::new(text, self.palette.text)];
        self.writer.write_line(&spans, style, align)
    }

    fn muted(&mut self, text: String) -> Result<()> {
        let spans = [Span::new(text, self.palette.muted)];
        self.writer.write_line(&spans, TextStyle::META, Align::Left)
    }

    fn title_page(&mut self) -> Result<()> {
        let labels = self.labels();
        let generated = self.context.locale.format_date(&Local::now());

        self.writer.new_page()?;
        self.writer.skip(12)?;
        self.plain(labels.title.to_string(), TextStyle::TITLE, Align::Center)?;
        self.writer.skip(2)?;
        self.plain(
            format!("{}: {}", labels.source, self.source_name),
            TextStyle::SUBTITLE,
            Align::Center,
        )?;
        self.writer.skip(1)?;
        self.plain(
            format!("{}: {generated}", labels.generated),
            TextStyle::SUBTITLE,
            Align::Center,
        )
    }

    fn table_of_contents(&mut self, files: &[FileEntry]) -> Result<()> {
        self.writer.new_page()?;
        self.plain(
            self.labels().table_of_contents.to_string(),
            TextStyle::HEADING,
            Align::Center,
        )?;
        self.writer.skip(1)?;

        for (index, file) in files.iter().enumerate() {
            self.writer.write_link(
                &file.relative_path.display().to_string(),
                &anchor_for(index),
                TextStyle::ENTRY,
            )?;
        }
        Ok(())
    }

    fn history_section(&mut self, log: &[CommitRecord]) -> Result<()> {
        let labels = self.labels();
        self.writer.new_page()?;
        self.plain(labels.history.to_string(), TextStyle::HEADING, Align::Center)?;
        self.writer.skip(1)?;

        for commit in log {
            let date = self.context.locale.format_date(&commit.date);
            for line in [
                format!("{}: {}", labels.commit, commit.hash),
                format!("{}: {date}", labels.date),
                format!("{}: {}", labels.author, commit.author),
                format!("{}: {}", labels.message, commit.message),
            ] {
                self.plain(line, TextStyle::ENTRY, Align::Left)?;
            }
            self.writer.skip(1)?;
        }
        Ok(())
    }

    fn file_section(&mut self, index: usize, file: &FileEntry) -> Result<()> {
        let labels = self.labels();

        self.writer.new_page()?;
        self.writer.set_anchor(&anchor_for(index))?;
        self.plain(
            file.relative_path.display().to_string(),
            TextStyle::HEADING,
            Align::Center,
        )?;
        self.writer.skip(1)?;

        if self.options.include_metadata {
            match std::fs::metadata(&file.path) {
                Ok(metadata) => {
                    self.muted(format!(
                        "{}: {}",
                        labels.size,
                        loader::format_size(metadata.len())
                    ))?;
                    match metadata.modified() {
                        Ok(modified) => {
                            let modified: DateTime<Local> = modified.into();
                            self.muted(format!(
                                "{}: {}",
                                labels.last_modified,
                                self.context.locale.format_date(&modified)
                            ))?;
                        }
                        Err(e) => log::warn!(
                            "Failed to read modification time of {}: {e}",
                            file.path.display()
                        ),
                    }
                    self.writer.skip(1)?;
                }
                Err(e) => log::warn!("Failed to read metadata of {}: {e}", file.path.display()),
            }
        }

        if self.options.include_commit_info {
            if let Some(history) = self.history {
                match history.last_commit(&file.path) {
                    Ok(Some(commit)) => {
                        self.muted(format!("{}: {}", labels.last_commit, commit.message))?;
                        self.muted(format!("{}: {}", labels.author, commit.author))?;
                        self.writer.skip(1)?;
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!(
                        "No commit info for {}: {e:#}",
                        file.relative_path.display()
                    ),
                }
            }
        }

        self.body(file)
    }

    fn body(&mut self, file: &FileEntry) -> Result<()> {
        let contents = (self.loader)(&file.path);
        let highlighted = self.tokenizer.tokenize(&contents, &file.extension());
        if highlighted.is_fallback() {
            log::debug!("{} rendered without highlighting", file.relative_path.display());
        }

        let numbered = self.options.show_line_numbers;
        let style = if numbered {
            TextStyle::CODE.with_hanging_indent(GUTTER_WIDTH)
        } else {
            TextStyle::CODE
        };

        let mut spans: Vec<Span> = Vec::default();
        for (i, line) in highlighted.lines().enumerate() {
            spans.clear();
            if numbered {
                spans.push(Span::new(format!("{:>4} ", i + 1), self.palette.muted));
            }
            spans.extend(
                line.into_iter()
                    .map(|token| Span::new(token.text, self.palette.colour(token.class))),
            );
            self.writer.write_line(&spans, style, Align::Left)?;
        }
        Ok(())
    }
}
