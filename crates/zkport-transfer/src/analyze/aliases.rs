//! `use` declarations and canonical path resolution.

use std::collections::BTreeMap;

use super::lexer::{Token, TokenKind};

/// Local names introduced by `use` declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    /// Local name to the full path it stands for.
    names: BTreeMap<String, String>,
    /// Module paths imported with `::*`.
    globs: Vec<String>,
}

impl AliasMap {
    /// Collect every `use` declaration in the token stream.
    ///
    /// Returns the map and the token ranges the declarations occupy, which
    /// the scanner skips.
    pub fn collect(src: &str, tokens: &[Token]) -> (Self, Vec<(usize, usize)>) {
        let mut map = AliasMap::default();
        let mut ranges = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let starts_use = tokens[i].is_ident(src, "use")
                && (i == 0 || !matches!(tokens[i - 1].kind, TokenKind::PathSep | TokenKind::Punct('.')));
            if !starts_use {
                i += 1;
                continue;
            }
            let end = tokens[i..]
                .iter()
                .position(|t| t.is_punct(';'))
                .map(|p| i + p)
                .unwrap_or(tokens.len());
            let mut parser = TreeParser {
                src,
                tokens: &tokens[i + 1..end],
                pos: 0,
                map: &mut map,
            };
            parser.tree(&[]);
            ranges.push((i, end));
            i = end + 1;
        }
        (map, ranges)
    }

    #[cfg(test)]
    pub fn insert(&mut self, local: &str, path: &str) {
        self.names.insert(local.to_string(), path.to_string());
    }

    /// Candidate canonical paths for a path written as `segments`, most
    /// specific first. A path through a known alias has exactly one
    /// candidate; otherwise the literal path comes first, then one candidate
    /// per glob import.
    pub fn candidates(&self, segments: &[&str]) -> Vec<String> {
        let Some((first, rest)) = segments.split_first() else {
            return Vec::new();
        };
        if let Some(full) = self.names.get(*first) {
            let mut path = full.clone();
            for seg in rest {
                path.push_str("::");
                path.push_str(seg);
            }
            return vec![path];
        }
        let literal = segments.join("::");
        let mut out = Vec::with_capacity(1 + self.globs.len());
        for glob in &self.globs {
            out.push(format!("{glob}::{literal}"));
        }
        out.insert(0, literal);
        out
    }
}

struct TreeParser<'a, 'm> {
    src: &'a str,
    tokens: &'a [Token],
    pos: usize,
    map: &'m mut AliasMap,
}

impl TreeParser<'_, '_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn text(&self) -> Option<&str> {
        self.peek().map(|t| t.text(self.src))
    }

    /// Parse one use tree below `prefix`.
    fn tree(&mut self, prefix: &[String]) {
        let mut path: Vec<String> = prefix.to_vec();
        if self.peek().is_some_and(|t| t.kind == TokenKind::PathSep) {
            self.pos += 1;
        }
        loop {
            let Some(tok) = self.peek().copied() else {
                self.bind(&path, None);
                return;
            };
            match tok.kind {
                TokenKind::Ident => {
                    let word = tok.text(self.src).to_string();
                    self.pos += 1;
                    if word == "self" && !path.is_empty() && !self.at_sep() {
                        let alias = self.alias();
                        self.bind(&path, alias);
                        return;
                    }
                    path.push(word);
                    if self.at_sep() {
                        self.pos += 1;
                        continue;
                    }
                    let alias = self.alias();
                    self.bind(&path, alias);
                    return;
                }
                TokenKind::Punct('*') => {
                    self.pos += 1;
                    if !path.is_empty() {
                        self.map.globs.push(path.join("::"));
                    }
                    return;
                }
                TokenKind::Punct('{') => {
                    self.pos += 1;
                    loop {
                        match self.peek().map(|t| t.kind) {
                            None => return,
                            Some(TokenKind::Punct('}')) => {
                                self.pos += 1;
                                return;
                            }
                            Some(TokenKind::Punct(',')) => self.pos += 1,
                            Some(_) => {
                                let before = self.pos;
                                self.tree(&path);
                                if self.pos == before {
                                    self.pos += 1;
                                }
                            }
                        }
                    }
                }
                _ => {
                    self.pos += 1;
                    return;
                }
            }
        }
    }

    fn at_sep(&self) -> bool {
        self.peek().is_some_and(|t| t.kind == TokenKind::PathSep)
    }

    /// Consume `as name` if present.
    fn alias(&mut self) -> Option<String> {
        if self.text() != Some("as") {
            return None;
        }
        self.pos += 1;
        let name = self.text().map(str::to_string);
        self.pos += 1;
        name
    }

    fn bind(&mut self, path: &[String], alias: Option<String>) {
        let Some(last) = path.last() else {
            return;
        };
        let local = alias.unwrap_or_else(|| last.clone());
        if local == "_" {
            return;
        }
        self.map.names.insert(local, path.join("::"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::lexer::tokenize;

    fn collect(src: &str) -> AliasMap {
        let tokens = tokenize(src).unwrap();
        AliasMap::collect(src, &tokens).0
    }

    #[test]
    fn simple_and_renamed() {
        let map = collect("use sp1_zkvm::io; use risc0_zkvm::guest::env as zkenv;");
        assert_eq!(map.candidates(&["io", "read"]), vec!["sp1_zkvm::io::read"]);
        assert_eq!(
            map.candidates(&["zkenv", "commit"]),
            vec!["risc0_zkvm::guest::env::commit"]
        );
    }

    #[test]
    fn nested_groups_and_self() {
        let map = collect("use sp1_zkvm::{io::{self, read as r}, entrypoint};");
        assert_eq!(map.candidates(&["io", "commit"]), vec!["sp1_zkvm::io::commit"]);
        assert_eq!(map.candidates(&["r"]), vec!["sp1_zkvm::io::read"]);
        assert_eq!(map.candidates(&["entrypoint"]), vec!["sp1_zkvm::entrypoint"]);
    }

    #[test]
    fn renamed_self_import() {
        let map = collect("use risc0_zkvm::guest::{env::{self as zk}};");
        assert_eq!(map.candidates(&["zk", "read"]), vec!["risc0_zkvm::guest::env::read"]);
    }

    #[test]
    fn globs_add_candidates() {
        let map = collect("use risc0_zkvm::guest::*;");
        assert_eq!(
            map.candidates(&["env", "read"]),
            vec!["env::read", "risc0_zkvm::guest::env::read"]
        );
    }

    #[test]
    fn unknown_paths_are_literal() {
        let map = collect("use std::collections::BTreeMap;");
        assert_eq!(map.candidates(&["foo", "bar"]), vec!["foo::bar"]);
    }

    #[test]
    fn use_ranges_cover_declarations() {
        let src = "use a::b; fn main() {}";
        let tokens = tokenize(src).unwrap();
        let (_, ranges) = AliasMap::collect(src, &tokens);
        assert_eq!(ranges, vec![(0, 4)]);
    }
}
