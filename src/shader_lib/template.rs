//! Placeholder Substitution
//!
//! Chunk templates are plain shader text with three kinds of placeholders:
//!
//! | Syntax | Token | Resolved from |
//! |--------|-------|---------------|
//! | `$NAME` | [`Token::Scalar`] | the substitution table; degrades to `NAME` |
//! | `{NAME}` | [`Token::Bracketed`] | the substitution table; left as is when unknown |
//! | `{i}` | [`Token::Indexed`] | the element index, during [`render_indexed`] |
//!
//! Index expansion always runs before table substitution, so a table entry can
//! be addressed per element (`{LIGHT{i}TYPE}` becomes `{LIGHT0TYPE}` first).
//! A `$` not followed by an identifier is dropped.

use rustc_hash::FxHashMap;

/// The index token expanded once per collection element.
pub const INDEX_TOKEN: &str = "i";

/// A lexical element of a chunk template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Scalar(&'a str),
    Bracketed(&'a str),
    Indexed(&'a str),
    /// A `$` with no identifier after it.
    Sigil,
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[inline]
fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Splits a template into tokens. Text between placeholders is borrowed.
#[must_use]
pub fn tokenize(template: &str) -> Vec<Token<'_>> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'$' => {
                if text_start < pos {
                    tokens.push(Token::Text(&template[text_start..pos]));
                }
                let name_start = pos + 1;
                let mut end = name_start;
                if end < bytes.len() && is_ident_start(bytes[end]) {
                    while end < bytes.len() && is_ident(bytes[end]) {
                        end += 1;
                    }
                    tokens.push(Token::Scalar(&template[name_start..end]));
                } else {
                    tokens.push(Token::Sigil);
                }
                pos = end;
                text_start = pos;
            }
            b'{' => {
                let name_start = pos + 1;
                let mut end = name_start;
                while end < bytes.len() && is_ident(bytes[end]) {
                    end += 1;
                }
                if end > name_start && end < bytes.len() && bytes[end] == b'}' {
                    if text_start < pos {
                        tokens.push(Token::Text(&template[text_start..pos]));
                    }
                    let name = &template[name_start..end];
                    if name == INDEX_TOKEN {
                        tokens.push(Token::Indexed(name));
                    } else {
                        tokens.push(Token::Bracketed(name));
                    }
                    pos = end + 1;
                    text_start = pos;
                } else {
                    pos += 1;
                }
            }
            _ => pos += 1,
        }
    }

    if text_start < bytes.len() {
        tokens.push(Token::Text(&template[text_start..]));
    }
    tokens
}

/// Values for the `$NAME` and `{NAME}` placeholders of one generation call.
///
/// Both syntaxes share a single namespace keyed by the bare name.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionTable {
    values: FxHashMap<String, String>,
}

impl SubstitutionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SubstitutionTable {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

/// Replaces every `{i}` in `template` with `index`.
#[must_use]
pub fn expand_index(template: &str, index: usize) -> String {
    template.replace("{i}", &index.to_string())
}

/// Substitutes the table into a template.
#[must_use]
pub fn render(template: &str, table: &SubstitutionTable) -> String {
    let mut out = String::with_capacity(template.len());
    for token in tokenize(template) {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Scalar(name) => out.push_str(table.get(name).unwrap_or(name)),
            Token::Bracketed(name) | Token::Indexed(name) => match table.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            },
            Token::Sigil => {}
        }
    }
    out
}

/// Renders `template` once per index, expanding `{i}` before substitution,
/// and concatenates the copies in order.
#[must_use]
pub fn render_indexed<I>(template: &str, indices: I, table: &SubstitutionTable) -> String
where
    I: IntoIterator<Item = usize>,
{
    indices
        .into_iter()
        .map(|index| render(&expand_index(template, index), table))
        .collect()
}

/// Names of `{NAME}` placeholders still present in `text`.
#[must_use]
pub fn unresolved_placeholders(text: &str) -> Vec<&str> {
    tokenize(text)
        .into_iter()
        .filter_map(|token| match token {
            Token::Bracketed(name) | Token::Indexed(name) => Some(name),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_kinds() {
        let tokens = tokenize("a $UV b {NAME} c {i} $ d");
        assert_eq!(
            tokens,
            vec![
                Token::Text("a "),
                Token::Scalar("UV"),
                Token::Text(" b "),
                Token::Bracketed("NAME"),
                Token::Text(" c "),
                Token::Indexed("i"),
                Token::Text(" "),
                Token::Sigil,
                Token::Text(" d"),
            ]
        );
    }

    #[test]
    fn test_code_braces_are_text() {
        let src = "void main() {\n    x = y;\n}\nstruct S { a: f32 };";
        assert_eq!(tokenize(src), vec![Token::Text(src)]);
        assert_eq!(render(src, &SubstitutionTable::new()), src);
    }

    #[test]
    fn test_render_scalar_and_bracketed() {
        let table = SubstitutionTable::new()
            .with("UV", "vUv0")
            .with("CH", "rgb")
            .with("lightingUv", "vUv1");
        let out = render("texture(s, $UV).$CH + {lightingUv}", &table);
        assert_eq!(out, "texture(s, vUv0).rgb + vUv1");
    }

    #[test]
    fn test_missing_scalar_degrades_to_identifier() {
        let out = render("$DECODE(x) $", &SubstitutionTable::new());
        assert_eq!(out, "DECODE(x) ");
    }

    #[test]
    fn test_missing_bracket_is_left_literal() {
        let out = render("a {unknown} b", &SubstitutionTable::new());
        assert_eq!(out, "a {unknown} b");
        assert_eq!(unresolved_placeholders(&out), vec!["unknown"]);
    }

    #[test]
    fn test_indexed_expansion_happens_before_substitution() {
        let table = SubstitutionTable::new()
            .with("LIGHT0TYPE", "DIRECTIONAL")
            .with("LIGHT1TYPE", "SPOT");
        let out = render_indexed("light{i}: {LIGHT{i}TYPE}\n", 0..2, &table);
        assert_eq!(out, "light0: DIRECTIONAL\nlight1: SPOT\n");
        assert!(unresolved_placeholders(&out).is_empty());
    }

    #[test]
    fn test_indexed_with_no_elements_is_empty() {
        let out = render_indexed("light{i}\n", 0..0, &SubstitutionTable::new());
        assert!(out.is_empty());
    }
}
