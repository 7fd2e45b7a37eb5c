//! A [`DocumentWriter`] that remembers what it was asked to do, for tests.

use super::{Align, DocumentWriter, Span, TextStyle};
use anyhow::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    NewPage,
    Line {
        spans: Vec<Span>,
        style: TextStyle,
        align: Align,
    },
    Link {
        text: String,
        anchor: String,
    },
    Anchor(String),
    Skip(usize),
    Flush,
}

impl Event {
    /// Text of a line or link, if this is one.
    pub fn text(&self) -> Option<String> {
        match self {
            Event::Line { spans, .. } => Some(spans.iter().map(|s| s.text.as_str()).collect()),
            Event::Link { text, .. } => Some(text.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub events: Vec<Event>,
}

impl RecordingWriter {
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().filter_map(Event::text).collect()
    }

    pub fn links(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Link { text, anchor } => Some((text.clone(), anchor.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn anchors(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Anchor(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

impl DocumentWriter for RecordingWriter {
    fn new_page(&mut self) -> Result<()> {
        self.events.push(Event::NewPage);
        Ok(())
    }

    fn write_line(&mut self, spans: &[Span], style: TextStyle, align: Align) -> Result<()> {
        self.events.push(Event::Line {
            spans: spans.to_vec(),
            style,
            align,
        });
        Ok(())
    }

    fn write_link(&mut self, text: &str, anchor: &str, _style: TextStyle) -> Result<()> {
        self.events.push(Event::Link {
            text: text.to_string(),
            anchor: anchor.to_string(),
        });
        Ok(())
    }

    fn set_anchor(&mut self, name: &str) -> Result<()> {
        self.events.push(Event::Anchor(name.to_string()));
        Ok(())
    }

    fn skip(&mut self, lines: usize) -> Result<()> {
        self.events.push(Event::Skip(lines));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.events.push(Event::Flush);
        Ok(())
    }

    fn finish(self) -> Result<()> {
        Ok(())
    }
}
