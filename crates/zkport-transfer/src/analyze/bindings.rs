//! `let` bindings: declared types and constructor receivers.

use std::collections::BTreeMap;

use super::aliases::AliasMap;
use super::lexer::{matching_angle, Token, TokenKind};
use super::types::literal_type;

/// What a single `let` statement tells us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetBinding {
    pub name: String,
    /// Token index of the first token after `=`.
    pub init: usize,
    pub ty: Option<String>,
    /// Canonical candidates of `Ctor(...)` when the initializer starts with a
    /// path call.
    pub ctor: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Bindings {
    lets: Vec<LetBinding>,
    by_init: BTreeMap<usize, usize>,
}

impl Bindings {
    pub fn collect(src: &str, tokens: &[Token], aliases: &AliasMap) -> Self {
        let mut out = Bindings::default();
        for i in 0..tokens.len() {
            if !tokens[i].is_ident(src, "let") {
                continue;
            }
            if let Some(binding) = parse_let(src, tokens, i, aliases) {
                out.by_init.insert(binding.init, out.lets.len());
                out.lets.push(binding);
            }
        }
        out
    }

    /// The binding whose initializer starts at token `init`.
    pub fn at_init(&self, init: usize) -> Option<&LetBinding> {
        self.by_init.get(&init).map(|&i| &self.lets[i])
    }

    /// The nearest binding of `name` whose initializer precedes token `before`.
    pub fn nearest(&self, name: &str, before: usize) -> Option<&LetBinding> {
        self.lets
            .iter()
            .rev()
            .find(|b| b.name == name && b.init <= before)
    }

    /// Nearest declared type of `name` before token `before`.
    pub fn type_of(&self, name: &str, before: usize) -> Option<&str> {
        self.nearest(name, before).and_then(|b| b.ty.as_deref())
    }
}

fn parse_let(src: &str, tokens: &[Token], at: usize, aliases: &AliasMap) -> Option<LetBinding> {
    let mut i = at + 1;
    if tokens.get(i)?.is_ident(src, "mut") {
        i += 1;
    }
    let name_tok = tokens.get(i)?;
    if name_tok.kind != TokenKind::Ident {
        return None;
    }
    let name = name_tok.text(src).to_string();
    i += 1;

    let mut ty = None;
    if tokens.get(i)?.is_punct(':') {
        let ty_start = i + 1;
        let mut depth = 0i32;
        let mut j = ty_start;
        while let Some(tok) = tokens.get(j) {
            match tok.kind {
                TokenKind::Punct('<' | '(' | '[') => depth += 1,
                TokenKind::Punct('>' | ')' | ']') => depth -= 1,
                TokenKind::Punct('=') if depth <= 0 => break,
                TokenKind::Punct(';') if depth <= 0 => return None,
                _ => {}
            }
            j += 1;
        }
        if j == ty_start || j >= tokens.len() {
            return None;
        }
        ty = Some(src[tokens[ty_start].span.start..tokens[j - 1].span.end].to_string());
        i = j;
    }
    if !tokens.get(i)?.is_punct('=') || tokens.get(i + 1).is_some_and(|t| t.is_punct('=')) {
        return None;
    }
    let init = i + 1;

    let mut ctor = Vec::new();
    if ty.is_none() {
        ty = array_literal_type(src, tokens, init);
    }
    if let Some((segments, after)) = path_at(src, tokens, init) {
        let mut after = after;
        if tokens.get(after).is_some_and(|t| t.is_punct('<'))
            && tokens.get(after.wrapping_sub(1)).is_some_and(|t| t.kind == TokenKind::PathSep)
        {
            let close = matching_angle(tokens, after)?;
            if ty.is_none() {
                ty = Some(src[tokens[after + 1].span.start..tokens[close - 1].span.end].to_string());
            }
            after = close + 1;
        }
        if tokens.get(after).is_some_and(|t| t.is_punct('(')) {
            ctor = aliases.candidates(&segments);
        }
    }
    Some(LetBinding {
        name,
        init,
        ty,
        ctor,
    })
}

/// `[0u32; 4]` → `[u32; 4]`.
fn array_literal_type(src: &str, tokens: &[Token], at: usize) -> Option<String> {
    let [open, lit, semi, len, close] = tokens.get(at..at + 5)? else {
        return None;
    };
    if !(open.is_punct('[') && semi.is_punct(';') && close.is_punct(']')) {
        return None;
    }
    if lit.kind != TokenKind::Number || len.kind != TokenKind::Number {
        return None;
    }
    let elem = literal_type(lit.text(src))?;
    Some(format!("[{elem}; {}]", len.text(src)))
}

/// Parse `a::b::c` starting at `at`. Returns the segments and the index just
/// past the last segment; a trailing `::` before `<` is consumed.
pub fn path_at<'s>(src: &'s str, tokens: &[Token], at: usize) -> Option<(Vec<&'s str>, usize)> {
    let mut i = at;
    if tokens.get(i)?.kind == TokenKind::PathSep {
        i += 1;
    }
    let mut segments = Vec::new();
    loop {
        let tok = tokens.get(i)?;
        if tok.kind != TokenKind::Ident {
            return None;
        }
        segments.push(tok.text(src));
        i += 1;
        match tokens.get(i) {
            Some(t) if t.kind == TokenKind::PathSep => {
                if tokens.get(i + 1).is_some_and(|t| t.kind == TokenKind::Ident) {
                    i += 1;
                } else {
                    return Some((segments, i + 1));
                }
            }
            _ => return Some((segments, i)),
        }
    }
}
