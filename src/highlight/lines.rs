use super::{ColorClass, Line, Token};
use std::collections::VecDeque;

/// Regroups a token stream into lines.
///
/// A token's text up to its first newline extends the line in progress; every
/// newline ends a line; whatever follows the last newline starts the next one. So a
/// comment token spanning three lines contributes to three lines. Empty fragments
/// add nothing, whitespace-only fragments keep their text but are always plain.
/// The line in progress at the end is only emitted if it holds any text, so
/// `"a\nb\n"` gives two lines, not three.
pub struct LineSplitter<I> {
    tokens: I,
    current: Line,
    ready: VecDeque<Line>,
    done: bool,
}

impl<I: Iterator<Item = Token>> LineSplitter<I> {
    pub fn new(tokens: I) -> LineSplitter<I> {
        LineSplitter {
            tokens,
            current: Line::default(),
            ready: VecDeque::default(),
            done: false,
        }
    }

    fn split(&mut self, token: Token) {
        let mut fragments = token.text.split('\n');
        if let Some(first) = fragments.next() {
            self.extend(first, token.class);
        }
        for fragment in fragments {
            let line = std::mem::take(&mut self.current);
            self.ready.push_back(line);
            self.extend(fragment, token.class);
        }
    }

    fn extend(&mut self, fragment: &str, class: ColorClass) {
        if fragment.is_empty() {
            return;
        }
        let class = if fragment.trim().is_empty() {
            ColorClass::Plain
        } else {
            class
        };
        self.current.push(Token::new(fragment, class));
    }
}

impl<I: Iterator<Item = Token>> Iterator for LineSplitter<I> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Some(line);
            }
            if self.done {
                return None;
            }
            match self.tokens.next() {
                Some(token) => self.split(token),
                None => {
                    self.done = true;
                    if !self.current.is_empty() {
                        let line = std::mem::take(&mut self.current);
                        self.ready.push_back(line);
                    }
                }
            }
        }
    }
}
