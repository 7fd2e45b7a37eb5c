//! Output formats. The assembler only ever talks to a [`DocumentWriter`]; the PDF
//! backend lives in [`pdf`].

use crate::highlight::Colour;
use anyhow::Result;

mod pdf;
pub use pdf::*;

#[cfg(test)]
pub mod recording;

/// A run of text in a single colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub colour: Colour,
}

impl Span {
    pub fn new<S: Into<String>>(text: S, colour: Colour) -> Span {
        Span {
            text: text.into(),
            colour,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
    Italic,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in points
    pub size: f32,
    pub face: Face,
    /// Columns to indent wrapped continuation lines by
    pub hanging_indent: usize,
}

impl TextStyle {
    pub const TITLE: TextStyle = TextStyle::new(24.0, Face::Bold);
    pub const SUBTITLE: TextStyle = TextStyle::new(16.0, Face::Regular);
    pub const HEADING: TextStyle = TextStyle::new(16.0, Face::Bold);
    pub const ENTRY: TextStyle = TextStyle::new(12.0, Face::Regular);
    pub const META: TextStyle = TextStyle::new(10.0, Face::Regular);
    pub const CODE: TextStyle = TextStyle::new(8.0, Face::Regular);

    pub const fn new(size: f32, face: Face) -> TextStyle {
        TextStyle {
            size,
            face,
            hanging_indent: 0,
        }
    }

    pub const fn with_hanging_indent(self, hanging_indent: usize) -> TextStyle {
        TextStyle {
            hanging_indent,
            ..self
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// A paginated document being written top to bottom.
///
/// Lines that don't fit on the current page continue on a new one. Lines too long
/// for the page wrap, with continuation lines indented by the style's hanging indent.
pub trait DocumentWriter {
    /// Start a fresh page. Every section starts with one.
    fn new_page(&mut self) -> Result<()>;

    fn write_line(&mut self, spans: &[Span], style: TextStyle, align: Align) -> Result<()>;

    /// A line that jumps to the place marked with [`DocumentWriter::set_anchor`]
    /// when clicked. The anchor may be set after the link is written.
    fn write_link(&mut self, text: &str, anchor: &str, style: TextStyle) -> Result<()>;

    /// Mark the current position so links can target it.
    fn set_anchor(&mut self, name: &str) -> Result<()>;

    /// Leave `lines` blank lines of vertical space.
    fn skip(&mut self, lines: usize) -> Result<()>;

    /// Hand finished pages off to the output so they no longer take up memory.
    fn flush(&mut self) -> Result<()>;

    /// Complete the document and write it out.
    fn finish(self) -> Result<()>
    where
        Self: Sized;
}
