//! A lossy lexer for Rust-shaped source text.
//!
//! The analyzer only needs identifiers, path separators, brackets and a few
//! punctuation marks; literals are kept as opaque tokens so that their
//! contents never produce false matches. Whitespace and comments are skipped.

use zkport_core::{Position, Span};

use crate::error::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// `::`
    PathSep,
    /// Any other single punctuation character.
    Punct(char),
    /// String, byte-string, raw-string or character literal.
    Literal,
    Number,
    Lifetime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        self.span.slice(src)
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    pub fn is_ident(&self, src: &str, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(src) == word
    }
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, AnalysisError> {
    Lexer { src, pos: 0 }.run()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Vec<Token>, AnalysisError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            let start = self.pos;
            let kind = match c {
                c if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                '/' if self.peek_at(1) == Some('/') => {
                    self.line_comment();
                    continue;
                }
                '/' if self.peek_at(1) == Some('*') => {
                    self.block_comment()?;
                    continue;
                }
                'r' if self.raw_string_ahead(1) => {
                    self.bump();
                    self.raw_string(start)?;
                    TokenKind::Literal
                }
                'b' if self.peek_at(1) == Some('r') && self.raw_string_ahead(2) => {
                    self.bump();
                    self.bump();
                    self.raw_string(start)?;
                    TokenKind::Literal
                }
                'b' if self.peek_at(1) == Some('"') => {
                    self.bump();
                    self.quoted('"', start)?;
                    TokenKind::Literal
                }
                'b' if self.peek_at(1) == Some('\'') => {
                    self.bump();
                    self.quoted('\'', start)?;
                    TokenKind::Literal
                }
                '"' => {
                    self.quoted('"', start)?;
                    TokenKind::Literal
                }
                '\'' => self.char_or_lifetime(start)?,
                c if is_ident_start(c) => {
                    if c == 'r' && self.peek_at(1) == Some('#') {
                        self.bump();
                        self.bump();
                    }
                    self.eat_while(is_ident_continue);
                    TokenKind::Ident
                }
                c if c.is_ascii_digit() => {
                    self.number();
                    TokenKind::Number
                }
                ':' if self.peek_at(1) == Some(':') => {
                    self.bump();
                    self.bump();
                    TokenKind::PathSep
                }
                c => {
                    self.bump();
                    TokenKind::Punct(c)
                }
            };
            tokens.push(Token {
                kind,
                span: Span::new(start, self.pos),
            });
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    fn malformed(&self, offset: usize, detail: &str) -> AnalysisError {
        AnalysisError::MalformedSource {
            offset,
            position: Position::locate(self.src, offset),
            detail: detail.to_string(),
        }
    }

    fn line_comment(&mut self) {
        self.eat_while(|c| c != '\n');
    }

    fn block_comment(&mut self) -> Result<(), AnalysisError> {
        let start = self.pos;
        self.bump();
        self.bump();
        let mut depth = 1usize;
        while depth > 0 {
            match (self.bump(), self.peek()) {
                (Some('/'), Some('*')) => {
                    self.bump();
                    depth += 1;
                }
                (Some('*'), Some('/')) => {
                    self.bump();
                    depth -= 1;
                }
                (Some(_), _) => {}
                (None, _) => return Err(self.malformed(start, "unterminated block comment")),
            }
        }
        Ok(())
    }

    /// `r"`, `r#"`, `r##"` ... starting `n` chars ahead.
    fn raw_string_ahead(&self, n: usize) -> bool {
        let mut i = n;
        while self.peek_at(i) == Some('#') {
            i += 1;
        }
        self.peek_at(i) == Some('"')
    }

    fn raw_string(&mut self, start: usize) -> Result<(), AnalysisError> {
        let mut hashes = 0;
        while self.peek() == Some('#') {
            self.bump();
            hashes += 1;
        }
        self.bump();
        let closing: String = std::iter::once('"')
            .chain(std::iter::repeat('#').take(hashes))
            .collect();
        match self.src[self.pos..].find(&closing) {
            Some(offset) => {
                self.pos += offset + closing.len();
                Ok(())
            }
            None => Err(self.malformed(start, "unterminated raw string literal")),
        }
    }

    fn quoted(&mut self, quote: char, start: usize) -> Result<(), AnalysisError> {
        self.bump();
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
                None => {
                    let what = if quote == '"' {
                        "unterminated string literal"
                    } else {
                        "unterminated character literal"
                    };
                    return Err(self.malformed(start, what));
                }
            }
        }
    }

    fn char_or_lifetime(&mut self, start: usize) -> Result<TokenKind, AnalysisError> {
        let is_char = match (self.peek_at(1), self.peek_at(2)) {
            (Some('\\'), _) => true,
            (Some(_), Some('\'')) => true,
            (Some(c), _) => !is_ident_start(c),
            (None, _) => true,
        };
        if is_char {
            self.quoted('\'', start)?;
            Ok(TokenKind::Literal)
        } else {
            self.bump();
            self.eat_while(is_ident_continue);
            Ok(TokenKind::Lifetime)
        }
    }

    fn number(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => {
                    self.bump();
                }
                Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.bump();
                }
                _ => break,
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Index of the bracket closing the one at `open`, if balanced.
pub fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let (o, c) = match tokens.get(open)?.kind {
        TokenKind::Punct('(') => ('(', ')'),
        TokenKind::Punct('[') => ('[', ']'),
        TokenKind::Punct('{') => ('{', '}'),
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        if tok.is_punct(o) {
            depth += 1;
        } else if tok.is_punct(c) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Index just past the `>` closing the `<` at `open` (turbofish generics).
pub fn matching_angle(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::Punct('<') => depth += 1,
            TokenKind::Punct('>') => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            TokenKind::Punct(';') | TokenKind::Punct('{') => return None,
            _ => {}
        }
    }
    None
}

/// Split the tokens strictly between `open` and `close` at top-level commas.
///
/// `generics` treats `<`/`>` as brackets, which is right for type lists and
/// wrong for expressions containing comparisons.
pub fn split_top_level(
    tokens: &[Token],
    open: usize,
    close: usize,
    generics: bool,
) -> Vec<(usize, usize)> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = open + 1;
    for i in open + 1..close {
        match tokens[i].kind {
            TokenKind::Punct('(' | '[' | '{') => depth += 1,
            TokenKind::Punct(')' | ']' | '}') => depth -= 1,
            TokenKind::Punct('<') if generics => depth += 1,
            TokenKind::Punct('>') if generics => depth -= 1,
            TokenKind::Punct(',') if depth == 0 => {
                if start < i {
                    parts.push((start, i));
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < close {
        parts.push((start, close));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text(src)))
            .collect()
    }

    #[test]
    fn paths_and_turbofish() {
        let toks = kinds("sp1_zkvm::io::read::<u32>()");
        assert_eq!(toks[0], (TokenKind::Ident, "sp1_zkvm"));
        assert_eq!(toks[1], (TokenKind::PathSep, "::"));
        assert_eq!(toks[5], (TokenKind::PathSep, "::"));
        assert_eq!(toks[6], (TokenKind::Punct('<'), "<"));
        assert_eq!(toks.len(), 11);
    }

    #[test]
    fn comments_and_literals_are_opaque() {
        let src = "// read()\n/* commit( /* nested */ */ let s = \"read(\"; let r = r#\"a\"b\"#;";
        let toks = kinds(src);
        assert!(toks.iter().all(|(_, t)| *t != "read" && *t != "commit"));
        assert!(toks.contains(&(TokenKind::Literal, "\"read(\"")));
        assert!(toks.contains(&(TokenKind::Literal, "r#\"a\"b\"#")));
    }

    #[test]
    fn chars_versus_lifetimes() {
        let toks = kinds("fn f<'a>(x: &'a u8) { let c = 'x'; let n = '\\n'; }");
        assert!(toks.contains(&(TokenKind::Lifetime, "'a")));
        assert!(toks.contains(&(TokenKind::Literal, "'x'")));
        assert!(toks.contains(&(TokenKind::Literal, "'\\n'")));
    }

    #[test]
    fn numbers_keep_suffix_but_not_ranges() {
        let toks = kinds("[0u32; 4] 0..10 1.5");
        assert!(toks.contains(&(TokenKind::Number, "0u32")));
        assert!(toks.contains(&(TokenKind::Number, "0")));
        assert!(toks.contains(&(TokenKind::Number, "1.5")));
    }

    #[test]
    fn unterminated_string_reports_position() {
        let err = tokenize("fn main() {\n    let s = \"oops;\n}").unwrap_err();
        match err {
            AnalysisError::MalformedSource {
                offset, position, ..
            } => {
                assert_eq!(offset, 24);
                assert_eq!(position, Position { line: 2, column: 13 });
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unterminated_block_comment() {
        let err = tokenize("fn main() { /* never closed").unwrap_err();
        assert!(err.to_string().contains("block comment"));
    }

    #[test]
    fn brackets_match() {
        let src = "f(a, (b, c), [d])";
        let toks = tokenize(src).unwrap();
        let close = matching_close(&toks, 1).unwrap();
        assert_eq!(toks[close].text(src), ")");
        assert_eq!(close, toks.len() - 1);
        let parts = split_top_level(&toks, 1, close, false);
        assert_eq!(parts.len(), 3);
    }
}
