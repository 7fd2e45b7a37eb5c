use super::{ColorClass, Token};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Outside,
    /// Inside a tag that opened at this byte offset
    InsideTag(usize),
}

/// Streams [`Token`]s out of `hl-` span markup.
///
/// Spans may nest; text takes the class of the innermost span around it, and text
/// outside any span is plain. Tags other than `span` take up no space. A `<` that
/// never closes is kept as literal text. Entities are decoded in every token.
/// Whitespace and line breaks are passed through untouched; splitting into lines is
/// [`super::lines::LineSplitter`]'s job.
pub struct MarkupParser<'a> {
    input: &'a str,
    pos: usize,
    classes: Vec<ColorClass>,
}

impl<'a> MarkupParser<'a> {
    pub fn new(input: &'a str) -> MarkupParser<'a> {
        MarkupParser {
            input,
            pos: 0,
            classes: Vec::default(),
        }
    }

    fn token(&self, start: usize, end: usize) -> Token {
        let class = self.classes.last().copied().unwrap_or(ColorClass::Plain);
        let text = html_escape::decode_html_entities(&self.input[start..end]);
        Token::new(text, class)
    }

    fn apply_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if let Some(closing) = tag.strip_prefix('/') {
            if closing.trim().eq_ignore_ascii_case("span") {
                self.classes.pop();
            }
            return;
        }

        let name = tag
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default();
        if !name.eq_ignore_ascii_case("span") || tag.ends_with('/') {
            return;
        }

        // a span without an hl- class inherits the surrounding one
        let class = class_attribute(tag)
            .and_then(|classes| {
                classes
                    .split_whitespace()
                    .find_map(|c| c.strip_prefix("hl-"))
            })
            .map(ColorClass::from_name)
            .unwrap_or_else(|| self.classes.last().copied().unwrap_or(ColorClass::Plain));
        self.classes.push(class);
    }
}

/// Value of the `class` attribute in the body of a tag, quoted either way.
fn class_attribute(tag: &str) -> Option<&str> {
    let start = tag.find("class=")? + "class=".len();
    let rest = &tag[start..];
    let quote = rest.chars().next()?;
    if quote == '"' || quote == '\'' {
        let rest = &rest[1..];
        let end = rest.find(quote).unwrap_or(rest.len());
        Some(&rest[..end])
    } else {
        let end = rest
            .find(|c: char| c.is_whitespace())
            .unwrap_or(rest.len());
        Some(&rest[..end])
    }
}

impl Iterator for MarkupParser<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let input = self.input;
        let bytes = input.as_bytes();
        let mut state = State::Outside;
        let mut text_start = self.pos;

        while self.pos < bytes.len() {
            match (state, bytes[self.pos]) {
                (State::Outside, b'<') => {
                    if self.pos > text_start {
                        // hand out the text first; the tag is picked up next call
                        return Some(self.token(text_start, self.pos));
                    }
                    state = State::InsideTag(self.pos);
                }
                (State::InsideTag(start), b'>') => {
                    let tag = &input[start + 1..self.pos];
                    self.apply_tag(tag);
                    state = State::Outside;
                    text_start = self.pos + 1;
                }
                _ => {}
            }
            self.pos += 1;
        }

        match state {
            State::InsideTag(start) => Some(self.token(start, bytes.len())),
            State::Outside if bytes.len() > text_start => Some(self.token(text_start, bytes.len())),
            State::Outside => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(markup: &str) -> Vec<(String, ColorClass)> {
        MarkupParser::new(markup)
            .map(|t| (t.text, t.class))
            .collect()
    }

    #[test]
    fn spans_set_classes() {
        assert_eq!(
            parse("<span class=\"hl-keyword\">fn</span> main"),
            vec![
                ("fn".to_string(), ColorClass::Keyword),
                (" main".to_string(), ColorClass::Plain),
            ]
        );
    }

    #[test]
    fn nested_spans_use_innermost_class() {
        assert_eq!(
            parse("<span class=\"hl-string\">\"a<span class=\"hl-number\">1</span>b\"</span>"),
            vec![
                ("\"a".to_string(), ColorClass::String),
                ("1".to_string(), ColorClass::Number),
                ("b\"".to_string(), ColorClass::String),
            ]
        );
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(
            parse("<span class=\"hl-operator\">&lt;&amp;&gt;</span> &quot;&#39;&#x41;"),
            vec![
                ("<&>".to_string(), ColorClass::Operator),
                (" \"'A".to_string(), ColorClass::Plain),
            ]
        );
    }

    #[test]
    fn unknown_tags_take_no_space() {
        assert_eq!(
            parse("a<b>b</b><br/>c"),
            vec![
                ("a".to_string(), ColorClass::Plain),
                ("b".to_string(), ColorClass::Plain),
                ("c".to_string(), ColorClass::Plain),
            ]
        );
    }

    #[test]
    fn unknown_classes_are_plain() {
        assert_eq!(
            parse("<span class=\"hl-meta\">x</span><span class='other hl-title.class'>Y</span>"),
            vec![
                ("x".to_string(), ColorClass::Plain),
                ("Y".to_string(), ColorClass::Class),
            ]
        );
    }

    #[test]
    fn unterminated_tags_are_text() {
        assert_eq!(
            parse("<span class=\"hl-keyword\">if</span> a <b"),
            vec![
                ("if".to_string(), ColorClass::Keyword),
                (" a ".to_string(), ColorClass::Plain),
                ("<b".to_string(), ColorClass::Plain),
            ]
        );
    }

    #[test]
    fn unbalanced_closing_tags_are_ignored() {
        assert_eq!(
            parse("</span>x"),
            vec![("x".to_string(), ColorClass::Plain)]
        );
    }

    #[test]
    fn newlines_pass_through() {
        assert_eq!(
            parse("<span class=\"hl-comment\">// a\n// b</span>\n"),
            vec![
                ("// a\n// b".to_string(), ColorClass::Comment),
                ("\n".to_string(), ColorClass::Plain),
            ]
        );
    }
}
