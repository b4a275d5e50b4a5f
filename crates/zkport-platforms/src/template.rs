//! Rewrite templates.
//!
//! A template is target source text with `{name}` placeholders. Only a brace
//! pair enclosing a lowercase identifier is a placeholder, so templates can
//! carry ordinary Rust blocks (`{ ... }`) verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholders the code generator knows how to fill.
pub const PLACEHOLDERS: &[&str] = &[
    "ty",        // declared type, `_` when unknown
    "args",      // argument text of the original call
    "arg_ref",   // first argument as a reference expression
    "dst",       // destination buffer of a fill-form read
    "recv",      // receiver expression of a method shape
    "entry",     // entry function name
    "params",    // entry function parameter list
    "slot",      // aggregate slot index of a bundled construct
    "input_ty",  // aggregate input tuple type
    "output_ty", // aggregate output tuple type
    "input",     // host expression holding the aggregate input
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(String);

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Placeholder names in order of appearance (duplicates kept).
    pub fn placeholders(&self) -> Vec<&str> {
        self.pieces()
            .into_iter()
            .filter_map(|p| match p {
                Piece::Placeholder(name) => Some(name),
                Piece::Text(_) => None,
            })
            .collect()
    }

    /// Placeholders not in [`PLACEHOLDERS`].
    pub fn unknown_placeholders(&self) -> Vec<&str> {
        self.placeholders()
            .into_iter()
            .filter(|p| !PLACEHOLDERS.contains(p))
            .collect()
    }

    /// Instantiate the template, asking `value` for each placeholder.
    pub fn render(&self, mut value: impl FnMut(&str) -> String) -> String {
        let mut out = String::with_capacity(self.0.len());
        for piece in self.pieces() {
            match piece {
                Piece::Text(t) => out.push_str(t),
                Piece::Placeholder(name) => out.push_str(&value(name)),
            }
        }
        out
    }

    fn pieces(&self) -> Vec<Piece<'_>> {
        let text = self.0.as_str();
        let mut pieces = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;
        while let Some(offset) = text[i..].find('{') {
            let open = i + offset;
            let name_len = text[open + 1..]
                .bytes()
                .take_while(|b| b.is_ascii_lowercase() || *b == b'_')
                .count();
            let close = open + 1 + name_len;
            if name_len > 0 && text.as_bytes().get(close) == Some(&b'}') {
                if literal_start < open {
                    pieces.push(Piece::Text(&text[literal_start..open]));
                }
                pieces.push(Piece::Placeholder(&text[open + 1..close]));
                literal_start = close + 1;
                i = close + 1;
            } else {
                i = open + 1;
            }
        }
        if literal_start < text.len() {
            pieces.push(Piece::Text(&text[literal_start..]));
        }
        pieces
    }
}

enum Piece<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_fills_placeholders() {
        let t = Template::new("sp1_zkvm::io::read::<{ty}>()");
        assert_eq!(t.render(|_| "u32".into()), "sp1_zkvm::io::read::<u32>()");
    }

    #[test]
    fn braces_that_are_not_placeholders_pass_through() {
        let t = Template::new("fn {entry}() {\n    { let x = 1; }\n}{Ty}");
        assert_eq!(t.placeholders(), vec!["entry"]);
        assert_eq!(t.render(|_| "main".into()), "fn main() {\n    { let x = 1; }\n}{Ty}");
    }

    #[test]
    fn suffix_after_placeholder() {
        let t = Template::new("{entry}_body(&__input)");
        assert_eq!(t.render(|_| "fib".into()), "fib_body(&__input)");
    }

    #[test]
    fn unknown_placeholders_reported() {
        let t = Template::new("{recv}.write({payload})");
        assert_eq!(t.unknown_placeholders(), vec!["payload"]);
    }
}
