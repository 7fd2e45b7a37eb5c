use crate::locale::Locale;
use std::path::{Path, PathBuf};

/// How far through the file list a render is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    processed: usize,
    total: usize,
    current: Option<PathBuf>,
}

impl ProgressState {
    pub fn new(total: usize) -> ProgressState {
        ProgressState {
            processed: 0,
            total,
            current: None,
        }
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// The file being worked on, relative to the source root.
    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    pub(crate) fn start(&mut self, path: &Path) {
        self.current = Some(path.to_path_buf());
    }

    /// Count the current file as done. Never goes past the total.
    pub(crate) fn complete(&mut self) {
        self.processed = (self.processed + 1).min(self.total);
    }
}

/// Per-run state threaded through the assembler.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub progress: ProgressState,
    pub locale: Locale,
}

impl RenderContext {
    pub fn new(total: usize, locale: Locale) -> RenderContext {
        RenderContext {
            progress: ProgressState::new(total),
            locale,
        }
    }
}

/// Receives progress updates while a document is assembled.
pub trait ProgressSink {
    fn file_started(&mut self, _state: &ProgressState) {}

    fn file_completed(&mut self, state: &ProgressState);

    /// Called after each batch of files, once the writer has flushed.
    fn batch_completed(&mut self, _state: &ProgressState) {}
}

/// A sink for when nobody's watching.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn file_completed(&mut self, _state: &ProgressState) {}
}

impl ProgressSink for indicatif::ProgressBar {
    fn file_started(&mut self, state: &ProgressState) {
        self.set_length(state.total() as u64);
        if let Some(current) = state.current() {
            self.set_message(current.display().to_string());
        }
    }

    fn file_completed(&mut self, state: &ProgressState) {
        self.set_position(state.processed() as u64);
    }

    fn batch_completed(&mut self, state: &ProgressState) {
        log::debug!("Flushed after {}/{} files", state.processed(), state.total());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn processed_never_passes_total() {
        let mut state = ProgressState::new(2);
        state.complete();
        state.complete();
        state.complete();
        assert_eq!(state.processed(), 2);
        assert_eq!(state.total(), 2);
    }

    #[test]
    fn tracks_the_current_file() {
        let mut state = ProgressState::new(1);
        assert_eq!(state.current(), None);
        state.start(Path::new("src/main.rs"));
        assert_eq!(state.current(), Some(Path::new("src/main.rs")));
    }
}
