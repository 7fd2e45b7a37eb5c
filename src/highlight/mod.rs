//! Syntax highlighting: source text in, coloured lines out.
//!
//! Highlighting happens in two stages. A [`Highlighter`] turns the text into
//! markup (`<span class="hl-keyword">fn</span> …`), then the markup is parsed
//! back into [`Token`]s and split into [`Line`]s lazily as the document is
//! written. If the highlighter fails, the text is still rendered, one plain
//! token per line.

mod engine;
mod lines;
mod markup;
mod palette;

pub use engine::{Highlighter, SyntectHighlighter};
pub use palette::{Colour, Palette};

use anyhow::Result;
use lines::LineSplitter;
use markup::MarkupParser;

/// `syntect`'s default syntaxes, serialized by `build.rs`.
pub const SERIALIZED_SYNTAX: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/syntaxes.bin"));

/// Highlighting category of a token.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColorClass {
    Keyword,
    String,
    Comment,
    Number,
    Function,
    Class,
    Builtin,
    Literal,
    Variable,
    Operator,
    Punctuation,
    Plain,
}

impl ColorClass {
    /// Name used in the `hl-<name>` markup class.
    pub fn name(&self) -> &'static str {
        match self {
            ColorClass::Keyword => "keyword",
            ColorClass::String => "string",
            ColorClass::Comment => "comment",
            ColorClass::Number => "number",
            ColorClass::Function => "function",
            ColorClass::Class => "class",
            ColorClass::Builtin => "built_in",
            ColorClass::Literal => "literal",
            ColorClass::Variable => "variable",
            ColorClass::Operator => "operator",
            ColorClass::Punctuation => "punctuation",
            ColorClass::Plain => "plain",
        }
    }

    /// Inverse of [`ColorClass::name`]; anything unrecognised is plain text.
    pub fn from_name(name: &str) -> ColorClass {
        match name {
            "keyword" => ColorClass::Keyword,
            "string" => ColorClass::String,
            "comment" => ColorClass::Comment,
            "number" => ColorClass::Number,
            "function" | "title.function" => ColorClass::Function,
            "class" | "title.class" => ColorClass::Class,
            "built_in" | "builtin" => ColorClass::Builtin,
            "literal" => ColorClass::Literal,
            "variable" => ColorClass::Variable,
            "operator" => ColorClass::Operator,
            "punctuation" => ColorClass::Punctuation,
            _ => ColorClass::Plain,
        }
    }
}

/// The smallest unit of coloured text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub class: ColorClass,
}

impl Token {
    pub fn new<S: Into<String>>(text: S, class: ColorClass) -> Token {
        Token {
            text: text.into(),
            class,
        }
    }
}

/// One source line. An empty line has no tokens.
pub type Line = Vec<Token>;

/// Turns source text into highlighted lines.
pub struct Tokenizer {
    highlighter: Box<dyn Highlighter>,
}

impl Tokenizer {
    /// A tokenizer backed by `syntect`'s built-in syntaxes.
    pub fn new() -> Result<Tokenizer> {
        Ok(Tokenizer::with_highlighter(Box::new(
            SyntectHighlighter::load()?,
        )))
    }

    pub fn with_highlighter(highlighter: Box<dyn Highlighter>) -> Tokenizer {
        Tokenizer { highlighter }
    }

    /// Highlight `text`, using `hint` (usually the file extension) to pick a language.
    pub fn tokenize(&self, text: &str, hint: &str) -> Highlighted {
        let text = text.replace("\r\n", "\n");
        match self.highlighter.highlight(&text, hint) {
            Ok(markup) => Highlighted::Markup(markup),
            Err(e) => {
                log::warn!("Highlighting failed, rendering as plain text: {e:#}");
                Highlighted::Fallback(text)
            }
        }
    }
}

/// Output of [`Tokenizer::tokenize`]; iterate it with [`Highlighted::lines`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Highlighted {
    Markup(String),
    /// The highlighter failed; lines are rendered as plain text
    Fallback(String),
}

impl Highlighted {
    pub fn lines(&self) -> LineIter<'_> {
        match self {
            Highlighted::Markup(markup) => {
                LineIter::Markup(LineSplitter::new(MarkupParser::new(markup)))
            }
            Highlighted::Fallback(text) => LineIter::Fallback(text.lines()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Highlighted::Fallback(_))
    }
}

pub enum LineIter<'a> {
    Markup(LineSplitter<MarkupParser<'a>>),
    Fallback(std::str::Lines<'a>),
}

impl Iterator for LineIter<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        match self {
            LineIter::Markup(splitter) => splitter.next(),
            LineIter::Fallback(lines) => lines
                .next()
                .map(|line| vec![Token::new(line, ColorClass::Plain)]),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::anyhow;

    struct Broken;

    impl Highlighter for Broken {
        fn highlight(&self, _text: &str, _hint: &str) -> Result<String> {
            Err(anyhow!("no grammar today"))
        }
    }

    fn line_text(line: &Line) -> String {
        line.iter().map(|t| t.text.as_str()).collect()
    }

    fn tokenizer() -> Tokenizer {
        Tokenizer::new().expect("can load syntaxes")
    }

    #[test]
    fn python_is_classified() {
        let highlighted = tokenizer().tokenize("print(\"hi\")\n# comment\n", "py");
        assert!(!highlighted.is_fallback());

        let lines: Vec<Line> = highlighted.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "print(\"hi\")");
        assert_eq!(line_text(&lines[1]), "# comment");

        let print = lines[0]
            .iter()
            .find(|t| t.text == "print")
            .expect("print is its own token");
        assert!(matches!(
            print.class,
            ColorClass::Builtin | ColorClass::Function
        ));

        let string: String = lines[0]
            .iter()
            .filter(|t| t.class == ColorClass::String)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(string, "\"hi\"");

        assert!(lines[1].iter().all(|t| t.class == ColorClass::Comment));
    }

    #[test]
    fn line_count_matches_source() {
        let tokenizer = tokenizer();
        let sources = [
            ("", "rs"),
            ("fn main() {}", "rs"),
            ("fn main() {}\n", "rs"),
            ("a\n\n\nb\n\n", "txt"),
            ("let x = 1;\r\nlet y = 2;\r\n", "js"),
            ("<div>&amp;</div>\n  \n", "html"),
            ("no extension at all\n", ""),
        ];
        for (source, hint) in sources {
            let normalised = source.replace("\r\n", "\n");
            let lines: Vec<Line> = tokenizer.tokenize(source, hint).lines().collect();
            assert_eq!(lines.len(), normalised.lines().count(), "{source:?}");
            for (line, expected) in lines.iter().zip(normalised.lines()) {
                assert_eq!(line_text(line), expected);
            }
        }
    }

    #[test]
    fn markup_characters_survive() {
        let source = "if (a < b && c > d) { s = \"&amp;\"; }\n";
        let lines: Vec<Line> = tokenizer().tokenize(source, "js").lines().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), source.trim_end());
    }

    #[test]
    fn failures_fall_back_to_plain_lines() {
        let text = "one\n  two\n\nthree";
        let highlighted = Tokenizer::with_highlighter(Box::new(Broken)).tokenize(text, "rs");
        assert!(highlighted.is_fallback());

        let lines: Vec<Line> = highlighted.lines().collect();
        assert_eq!(lines.len(), text.lines().count());
        for (line, expected) in lines.iter().zip(text.lines()) {
            assert_eq!(line, &vec![Token::new(expected, ColorClass::Plain)]);
        }
    }

    #[test]
    fn class_names_round_trip() {
        for class in [
            ColorClass::Keyword,
            ColorClass::String,
            ColorClass::Comment,
            ColorClass::Number,
            ColorClass::Function,
            ColorClass::Class,
            ColorClass::Builtin,
            ColorClass::Literal,
            ColorClass::Variable,
            ColorClass::Operator,
            ColorClass::Punctuation,
            ColorClass::Plain,
        ] {
            assert_eq!(ColorClass::from_name(class.name()), class);
        }
        assert_eq!(ColorClass::from_name("meta"), ColorClass::Plain);
    }
}
