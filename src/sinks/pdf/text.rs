//! Text encoding and wrapping for the standard 14 Courier fonts.

use crate::highlight::Colour;
use crate::sinks::Span;

/// Advance width of every Courier glyph, as a fraction of the font size.
pub const CHAR_WIDTH: f32 = 0.6;

const TAB: &[u8] = b"    ";

/// Encode `text` as WinAnsi bytes, one byte per column.
///
/// Letters WinAnsi lacks are transliterated where there's an obvious ASCII stand-in,
/// anything else becomes `?`. Tabs expand to four spaces; other control characters
/// are dropped.
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' => out.extend_from_slice(TAB),
            c if c.is_control() => {}
            ' '..='~' => out.push(c as u8),
            '\u{a0}'..='\u{ff}' => out.push(c as u32 as u8),
            c => out.push(win_ansi(c).unwrap_or(b'?')),
        }
    }
    out
}

/// The WinAnsi byte for characters outside Latin-1.
fn win_ansi(c: char) -> Option<u8> {
    Some(match c {
        'ğ' => b'g',
        'Ğ' => b'G',
        'ş' => b's',
        'Ş' => b'S',
        'ı' => b'i',
        'İ' => b'I',
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => return None,
    })
}

/// An encoded run ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub bytes: Vec<u8>,
    pub colour: Colour,
}

/// One visual row of a wrapped line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    /// Leading columns left blank
    pub indent: usize,
    pub segments: Vec<Segment>,
}

impl Row {
    pub fn columns(&self) -> usize {
        self.indent + self.segments.iter().map(|s| s.bytes.len()).sum::<usize>()
    }

    fn push(&mut self, byte: u8, colour: Colour) {
        match self.segments.last_mut() {
            Some(segment) if segment.colour == colour => segment.bytes.push(byte),
            _ => self.segments.push(Segment {
                bytes: vec![byte],
                colour,
            }),
        }
    }
}

/// Break `spans` into rows of at most `columns` columns.
///
/// Breaks fall at the column limit regardless of word boundaries; source code is
/// printed as-is. Rows after the first start `hanging_indent` columns in (capped at
/// half the row so every row makes progress). An empty line is a single empty row.
pub fn wrap(spans: &[Span], columns: usize, hanging_indent: usize) -> Vec<Row> {
    let columns = columns.max(1);
    let hanging_indent = hanging_indent.min(columns / 2);

    let mut rows: Vec<Row> = vec![Row::default()];
    for span in spans {
        for byte in encode(&span.text) {
            let full = rows.last().map(|r| r.columns() >= columns).unwrap_or(true);
            if full {
                rows.push(Row {
                    indent: hanging_indent,
                    segments: Vec::default(),
                });
            }
            if let Some(row) = rows.last_mut() {
                row.push(byte, span.colour);
            }
        }
    }
    rows
}
