//! PDF output.
//!
//! Pages are A4 with 50pt margins, set in the standard 14 Courier fonts so no font
//! files need embedding and every glyph is the same width. Content is laid out top
//! to bottom as it arrives; finished pages are serialised into the PDF buffer on
//! [`DocumentWriter::flush`] and their layout state dropped. The buffer itself is
//! only written to disk by [`DocumentWriter::finish`], so memory use still grows
//! with the size of the whole document.
//!
//! ## Links
//!
//! The table of contents is written before the sections it points to, so links
//! target named destinations rather than pages. Anchors are collected as they are
//! set and the catalog's `/Dests` dictionary is written at the very end.

mod text;

use crate::config::Theme;
use crate::highlight::{Colour, Palette};
use crate::sinks::{Align, DocumentWriter, Face, Span, TextStyle};
use anyhow::{anyhow, Context, Result};
use pdf_writer::types::{ActionType, AnnotationType};
use pdf_writer::{Content, Name, Null, Pdf, Rect, Ref, Str, TextStr};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use text::{wrap, Row, CHAR_WIDTH};

/// A4 portrait, in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 50.0;

/// Baseline-to-baseline distance as a multiple of the font size.
const LEADING: f32 = 1.2;

/// Height of a line for [`DocumentWriter::skip`].
const SKIP_LINE_HEIGHT: f32 = 12.0;

const FONT_REGULAR: Name<'static> = Name(b"F1");
const FONT_BOLD: Name<'static> = Name(b"F2");
const FONT_ITALIC: Name<'static> = Name(b"F3");

/// A link waiting for its page to be serialised.
struct PendingLink {
    rect: Rect,
    anchor: String,
}

struct PendingPage {
    id: Ref,
    content: Content,
    links: Vec<PendingLink>,
}

struct Destination {
    name: String,
    page: Ref,
    top: f32,
}

struct FontRefs {
    regular: Ref,
    bold: Ref,
    italic: Ref,
}

/// A [`DocumentWriter`] producing a PDF file.
pub struct PdfWriter {
    outfile: PathBuf,
    out: BufWriter<File>,
    palette: &'static Palette,
    pdf: Pdf,
    next_id: Ref,
    catalog_id: Ref,
    page_tree_id: Ref,
    fonts: FontRefs,
    page_ids: Vec<Ref>,
    /// Finished pages not yet serialised
    pending: Vec<PendingPage>,
    current: Option<PendingPage>,
    /// Top of the next line, measured from the bottom of the page
    cursor: f32,
    destinations: Vec<Destination>,
}

impl PdfWriter {
    /// Open `outfile` for writing; nothing is written to it until [`PdfWriter::finish`].
    pub fn create<P: AsRef<Path>>(outfile: P, theme: Theme, title: &str) -> Result<PdfWriter> {
        let outfile = outfile.as_ref().to_path_buf();
        let file = File::create(&outfile)
            .with_context(|| format!("Failed to create output file {}", outfile.display()))?;

        let mut next_id = Ref::new(1);
        let catalog_id = next_id.bump();
        let page_tree_id = next_id.bump();
        let info_id = next_id.bump();
        let fonts = FontRefs {
            regular: next_id.bump(),
            bold: next_id.bump(),
            italic: next_id.bump(),
        };

        let mut pdf = Pdf::new();
        pdf.document_info(info_id)
            .title(TextStr(title))
            .creator(TextStr(concat!("src-pdf v", env!("CARGO_PKG_VERSION"))));
        for (id, base_font) in [
            (fonts.regular, Name(b"Courier")),
            (fonts.bold, Name(b"Courier-Bold")),
            (fonts.italic, Name(b"Courier-Oblique")),
        ] {
            pdf.type1_font(id)
                .base_font(base_font)
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }

        Ok(PdfWriter {
            outfile,
            out: BufWriter::new(file),
            palette: Palette::for_theme(theme),
            pdf,
            next_id,
            catalog_id,
            page_tree_id,
            fonts,
            page_ids: Vec::default(),
            pending: Vec::default(),
            current: None,
            cursor: PAGE_HEIGHT - MARGIN,
            destinations: Vec::default(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn columns(size: f32) -> usize {
        ((PAGE_WIDTH - 2.0 * MARGIN) / (size * CHAR_WIDTH)).floor() as usize
    }

    fn open_page(&mut self) {
        if let Some(page) = self.current.take() {
            self.pending.push(page);
        }

        let id = self.next_id.bump();
        self.page_ids.push(id);

        let mut content = Content::new();
        if self.palette.background != Colour::from_hex(0xFFFFFF) {
            let [r, g, b] = self.palette.background.to_unit();
            content
                .set_fill_rgb(r, g, b)
                .rect(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT)
                .fill_nonzero();
        }

        self.current = Some(PendingPage {
            id,
            content,
            links: Vec::default(),
        });
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    /// Make sure there's a page with room for a line of `height`.
    fn reserve(&mut self, height: f32) {
        if self.current.is_none() || self.cursor - height < MARGIN {
            self.open_page();
        }
    }

    /// Lay out one logical line. Links get an annotation per wrapped row.
    fn place(
        &mut self,
        spans: &[Span],
        style: TextStyle,
        align: Align,
        link: Option<&str>,
    ) -> Result<()> {
        let font = match style.face {
            Face::Regular => FONT_REGULAR,
            Face::Bold => FONT_BOLD,
            Face::Italic => FONT_ITALIC,
        };
        let height = style.size * LEADING;
        let char_width = style.size * CHAR_WIDTH;

        for row in wrap(spans, Self::columns(style.size), style.hanging_indent) {
            self.reserve(height);
            let baseline = self.cursor - style.size;
            let x = match align {
                Align::Left => MARGIN + row.indent as f32 * char_width,
                Align::Center => {
                    let width = row.columns() as f32 * char_width;
                    MARGIN + ((PAGE_WIDTH - 2.0 * MARGIN - width) / 2.0).max(0.0)
                }
            };

            let page = self
                .current
                .as_mut()
                .ok_or_else(|| anyhow!("No page to write to"))?;
            show_row(&mut page.content, &row, font, style.size, x, baseline);

            if let Some(anchor) = link {
                let width = row.columns().saturating_sub(row.indent) as f32 * char_width;
                let [r, g, b] = self.palette.link.to_unit();
                page.content
                    .set_stroke_rgb(r, g, b)
                    .set_line_width(0.5)
                    .move_to(x, baseline - 1.5)
                    .line_to(x + width, baseline - 1.5)
                    .stroke();
                page.links.push(PendingLink {
                    rect: Rect::new(x, baseline - 0.25 * style.size, x + width, self.cursor),
                    anchor: anchor.to_string(),
                });
            }

            self.cursor -= height;
        }
        Ok(())
    }

    fn write_page(&mut self, page: PendingPage) {
        use pdf_writer::Finish;

        let content_id = self.next_id.bump();
        let link_ids: Vec<Ref> = page.links.iter().map(|_| self.next_id.bump()).collect();

        let mut writer = self.pdf.page(page.id);
        writer
            .media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
            .parent(self.page_tree_id)
            .contents(content_id);
        writer
            .resources()
            .fonts()
            .pair(FONT_REGULAR, self.fonts.regular)
            .pair(FONT_BOLD, self.fonts.bold)
            .pair(FONT_ITALIC, self.fonts.italic);
        if !link_ids.is_empty() {
            writer.annotations(link_ids.iter().copied());
        }
        writer.finish();

        self.pdf.stream(content_id, &page.content.finish());

        for (id, link) in link_ids.into_iter().zip(page.links) {
            let mut annotation = self.pdf.annotation(id);
            annotation.subtype(AnnotationType::Link).rect(link.rect);
            annotation
                .insert(Name(b"Border"))
                .array()
                .items([0.0f32, 0.0, 0.0]);
            annotation
                .action()
                .action_type(ActionType::GoTo)
                .pair(Name(b"D"), Name(link.anchor.as_bytes()));
            annotation.finish();
        }
    }
}

fn show_row(content: &mut Content, row: &Row, font: Name, size: f32, x: f32, baseline: f32) {
    if row.segments.is_empty() {
        return;
    }

    content.begin_text().set_font(font, size);
    let mut x = x;
    for segment in row.segments.iter() {
        let [r, g, b] = segment.colour.to_unit();
        content
            .set_fill_rgb(r, g, b)
            .set_text_matrix([1.0, 0.0, 0.0, 1.0, x, baseline])
            .show(Str(&segment.bytes));
        x += segment.bytes.len() as f32 * size * CHAR_WIDTH;
    }
    content.end_text();
}

impl DocumentWriter for PdfWriter {
    fn new_page(&mut self) -> Result<()> {
        self.open_page();
        Ok(())
    }

    fn write_line(&mut self, spans: &[Span], style: TextStyle, align: Align) -> Result<()> {
        self.place(spans, style, align, None)
    }

    fn write_link(&mut self, text: &str, anchor: &str, style: TextStyle) -> Result<()> {
        let spans = [Span::new(text, self.palette.link)];
        self.place(&spans, style, Align::Left, Some(anchor))
    }

    fn set_anchor(&mut self, name: &str) -> Result<()> {
        self.reserve(0.0);
        let page = self
            .current
            .as_ref()
            .ok_or_else(|| anyhow!("No page to anchor {name} to"))?;
        self.destinations.push(Destination {
            name: name.to_string(),
            page: page.id,
            top: self.cursor,
        });
        Ok(())
    }

    fn skip(&mut self, lines: usize) -> Result<()> {
        self.cursor -= lines as f32 * SKIP_LINE_HEIGHT;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        log::debug!("Serialising {} pages", pending.len());
        for page in pending {
            self.write_page(page);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        use pdf_writer::Finish;

        if self.current.is_none() {
            // a PDF needs at least one page
            self.open_page();
        }
        if let Some(page) = self.current.take() {
            self.pending.push(page);
        }
        self.flush()?;

        let dests_id = self.next_id.bump();
        let mut dests = self.pdf.indirect(dests_id).dict();
        for destination in self.destinations.iter() {
            dests
                .insert(Name(destination.name.as_bytes()))
                .array()
                .item(destination.page)
                .item(Name(b"XYZ"))
                .item(MARGIN)
                .item(destination.top)
                .item(Null);
        }
        dests.finish();

        self.pdf
            .pages(self.page_tree_id)
            .kids(self.page_ids.iter().copied())
            .count(self.page_ids.len() as i32);
        self.pdf
            .catalog(self.catalog_id)
            .pages(self.page_tree_id)
            .pair(Name(b"Dests"), dests_id);

        let bytes = self.pdf.finish();
        self.out
            .write_all(&bytes)
            .and_then(|_| self.out.flush())
            .with_context(|| format!("Failed to write PDF to {}", self.outfile.display()))?;

        log::info!(
            "Wrote {} pages to {}",
            self.page_ids.len(),
            self.outfile.display()
        );
        Ok(())
    }
}
