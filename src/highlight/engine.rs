use super::{ColorClass, SERIALIZED_SYNTAX};
use anyhow::{anyhow, Context, Result};
use syntect::easy::ScopeRangeIterator;
use syntect::parsing::{ParseState, Scope, ScopeStack, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Anything that can turn source text into `hl-` span markup.
pub trait Highlighter {
    fn highlight(&self, text: &str, hint: &str) -> Result<String>;
}

/// Extensions whose syntax can't be found by extension alone, or is better served
/// by a specific grammar. Candidates are tried in order.
const LANGUAGES: &[(&str, &[&str])] = &[
    ("js", &["JavaScript"]),
    ("jsx", &["JavaScript"]),
    ("mjs", &["JavaScript"]),
    ("ts", &["TypeScript", "JavaScript"]),
    ("tsx", &["TypeScriptReact", "TypeScript", "JavaScript"]),
    ("py", &["Python"]),
    ("php", &["PHP"]),
    ("java", &["Java"]),
    ("rb", &["Ruby"]),
    ("go", &["Go"]),
    ("cs", &["C#"]),
    ("css", &["CSS"]),
    ("html", &["HTML"]),
    ("xml", &["XML"]),
    ("json", &["JSON", "JavaScript"]),
    ("yaml", &["YAML"]),
    ("yml", &["YAML"]),
    ("md", &["Markdown"]),
    ("sql", &["SQL"]),
];

/// Scope prefixes mapped to colour classes, checked innermost scope first.
/// Comments and strings are handled separately since they win over anything
/// nested inside them.
const SCOPE_CLASSES: &[(&str, ColorClass)] = &[
    ("constant.numeric", ColorClass::Number),
    ("constant.language", ColorClass::Literal),
    ("constant", ColorClass::Literal),
    ("keyword.operator", ColorClass::Operator),
    ("keyword", ColorClass::Keyword),
    ("storage", ColorClass::Keyword),
    ("support.function", ColorClass::Builtin),
    ("variable.language", ColorClass::Builtin),
    ("entity.name.function", ColorClass::Function),
    ("variable.function", ColorClass::Function),
    ("entity.name.class", ColorClass::Class),
    ("entity.name.type", ColorClass::Class),
    ("entity.name.struct", ColorClass::Class),
    ("entity.name.enum", ColorClass::Class),
    ("entity.other.inherited-class", ColorClass::Class),
    ("support.class", ColorClass::Class),
    ("support.type", ColorClass::Builtin),
    ("entity.name.tag", ColorClass::Keyword),
    ("entity.other.attribute-name", ColorClass::Variable),
    ("variable", ColorClass::Variable),
    ("punctuation", ColorClass::Punctuation),
];

/// Highlighting backed by `syntect`'s grammars.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
    comment: Scope,
    string: Scope,
    rules: Vec<(Scope, ColorClass)>,
}

impl SyntectHighlighter {
    /// Load the syntaxes bundled at build time.
    pub fn load() -> Result<SyntectHighlighter> {
        let (syntaxes, _): (SyntaxSet, _) =
            bincode::serde::decode_from_slice(SERIALIZED_SYNTAX, bincode::config::standard())
                .map_err(|e| anyhow!("Failed to deserialize syntaxes: {e}"))?;
        SyntectHighlighter::new(syntaxes)
    }

    pub fn new(syntaxes: SyntaxSet) -> Result<SyntectHighlighter> {
        let scope = |s: &str| -> Result<Scope> {
            Scope::new(s).map_err(|e| anyhow!("Invalid scope `{s}`: {e:?}"))
        };
        let mut rules: Vec<(Scope, ColorClass)> = Vec::with_capacity(SCOPE_CLASSES.len());
        for (prefix, class) in SCOPE_CLASSES.iter() {
            rules.push((scope(*prefix)?, *class));
        }

        Ok(SyntectHighlighter {
            syntaxes,
            comment: scope("comment")?,
            string: scope("string")?,
            rules,
        })
    }

    /// Pick a grammar: the language table first, then the hint as a raw extension,
    /// then a shebang or modeline in the first line, then plain text.
    fn syntax_for(&self, hint: &str, text: &str) -> &SyntaxReference {
        let hint = hint.trim().trim_start_matches('.').to_lowercase();

        LANGUAGES
            .iter()
            .find(|(ext, _)| *ext == hint)
            .and_then(|(_, names)| {
                names
                    .iter()
                    .find_map(|name| self.syntaxes.find_syntax_by_name(name))
            })
            .or_else(|| {
                if hint.is_empty() {
                    None
                } else {
                    self.syntaxes.find_syntax_by_token(&hint)
                }
            })
            .or_else(|| self.syntaxes.find_syntax_by_first_line(text))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }

    fn classify(&self, stack: &ScopeStack) -> ColorClass {
        let scopes = stack.as_slice();
        if scopes.iter().any(|s| self.comment.is_prefix_of(*s)) {
            return ColorClass::Comment;
        }
        if scopes.iter().any(|s| self.string.is_prefix_of(*s)) {
            return ColorClass::String;
        }

        scopes
            .iter()
            .rev()
            .find_map(|s| {
                self.rules
                    .iter()
                    .find(|(prefix, _)| prefix.is_prefix_of(*s))
                    .map(|(_, class)| *class)
            })
            .unwrap_or(ColorClass::Plain)
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, text: &str, hint: &str) -> Result<String> {
        let syntax = self.syntax_for(hint, text);
        log::trace!("Highlighting `{hint}` as {}", syntax.name);

        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut markup = Markup::with_capacity(text.len() * 2);

        for (i, line) in LinesWithEndings::from(text).enumerate() {
            let ops = state
                .parse_line(line, &self.syntaxes)
                .with_context(|| format!("Failed to parse line {} as {}", i + 1, syntax.name))?;
            for (range, op) in ScopeRangeIterator::new(&ops, line) {
                stack
                    .apply(op)
                    .with_context(|| format!("Failed to apply scope on line {}", i + 1))?;
                if range.is_empty() {
                    continue;
                }
                let fragment = &line[range];
                let class = if fragment.trim().is_empty() {
                    ColorClass::Plain
                } else {
                    self.classify(&stack)
                };
                markup.push(class, fragment);
            }
        }

        Ok(markup.finish())
    }
}

/// Builds span markup, merging neighbouring runs of the same class.
struct Markup {
    out: String,
    run: String,
    class: ColorClass,
}

impl Markup {
    fn with_capacity(capacity: usize) -> Markup {
        Markup {
            out: String::with_capacity(capacity),
            run: String::default(),
            class: ColorClass::Plain,
        }
    }

    fn push(&mut self, class: ColorClass, text: &str) {
        if class != self.class {
            self.close_run();
            self.class = class;
        }
        self.run.push_str(text);
    }

    fn close_run(&mut self) {
        if self.run.is_empty() {
            return;
        }
        let escaped = html_escape::encode_text(&self.run);
        if self.class == ColorClass::Plain {
            self.out.push_str(&escaped);
        } else {
            self.out.push_str("<span class=\"hl-");
            self.out.push_str(self.class.name());
            self.out.push_str("\">");
            self.out.push_str(&escaped);
            self.out.push_str("</span>");
        }
        self.run.clear();
    }

    fn finish(mut self) -> String {
        self.close_run();
        self.out
    }
}
