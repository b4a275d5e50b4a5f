//! Proven-versus-hint classification of guest inputs.
//!
//! A read is proven when its value reaches a committed output, directly or
//! through later bindings and assignments (including those inside a loop or
//! branch whose header uses it), or when it is compared in a statement that
//! also mentions a committed variable. Everything else is a
//! hint. Reads without a binding stay proven. The classification is a
//! heuristic and every use of it is surfaced for confirmation.

use std::collections::{BTreeMap, BTreeSet};

use zkport_core::{CallForm, ConstructId, ConstructKind, Span};

use crate::analyze::lexer::{matching_close, tokenize, Token, TokenKind};
use crate::analyze::AnalyzedUnit;
use crate::sequence::Channel;

/// Channel of every guest input construct.
pub fn classify_inputs(unit: &AnalyzedUnit) -> BTreeMap<ConstructId, Channel> {
    let mut out = BTreeMap::new();
    let Ok(tokens) = tokenize(&unit.text) else {
        for c in unit.constructs.iter().filter(|c| c.is_input()) {
            out.insert(c.id, Channel::Proven);
        }
        return out;
    };
    let src = unit.text.as_str();
    let statements = statements(&tokens);

    let commits: Vec<(Span, BTreeSet<&str>)> = unit
        .constructs
        .iter()
        .filter(|c| c.is_output())
        .map(|c| (c.source_span, argument_idents(src, &tokens, c.source_span)))
        .collect();
    let committed: BTreeSet<&str> = commits.iter().flat_map(|(_, v)| v.iter().copied()).collect();

    for c in unit.constructs.iter().filter(|c| c.is_input()) {
        let channel = if c.kind == ConstructKind::Hint {
            Channel::Hint
        } else {
            let var = match c.call.form {
                CallForm::Fill => c.call.dst.as_deref(),
                CallForm::Value => c.call.binding.as_deref(),
            };
            match var {
                None => Channel::Proven,
                Some(var) => classify_one(src, &tokens, &statements, &commits, &committed, c.source_span, var),
            }
        };
        out.insert(c.id, channel);
    }
    out
}

fn classify_one(
    src: &str,
    tokens: &[Token],
    statements: &[(usize, usize)],
    commits: &[(Span, BTreeSet<&str>)],
    committed: &BTreeSet<&str>,
    read: Span,
    var: &str,
) -> Channel {
    let later: Vec<(usize, usize)> = statements
        .iter()
        .copied()
        .filter(|&(s, _)| tokens[s].span.start >= read.end)
        .collect();

    let mut taint: BTreeSet<&str> = BTreeSet::from([var]);
    let mut controlled: Vec<(usize, usize)> = Vec::new();
    for &(s, e) in &later {
        let mentions = |from: usize| {
            tokens[from..e]
                .iter()
                .any(|t| t.kind == TokenKind::Ident && taint.contains(t.text(src)))
        };
        let is_control = CONTROL.iter().any(|kw| tokens[s].is_ident(src, kw));
        if is_control && tokens.get(e).is_some_and(|t| t.is_punct('{')) && mentions(s) {
            if let Some(close) = matching_close(tokens, e) {
                controlled.push((e, close));
            }
            continue;
        }
        if let Some((target, rhs)) = assignment(src, tokens, s, e) {
            let inside = controlled.iter().any(|&(o, c)| s > o && s < c);
            if inside || mentions(rhs) {
                taint.insert(target);
            }
        }
    }

    let reaches_commit = commits
        .iter()
        .any(|(span, vars)| span.start >= read.end && vars.iter().any(|v| taint.contains(v)));
    if reaches_commit {
        return Channel::Proven;
    }

    let compared = later.iter().any(|&(s, e)| {
        let stmt = &tokens[s..e];
        let comparison = stmt.windows(2).any(|w| w[0].is_punct('=') && w[1].is_punct('='))
            || stmt.windows(2).any(|w| {
                (w[0].is_ident(src, "assert_eq") || w[0].is_ident(src, "assert")) && w[1].is_punct('!')
            });
        let idents: BTreeSet<&str> = stmt
            .iter()
            .filter(|t| t.kind == TokenKind::Ident)
            .map(|t| t.text(src))
            .collect();
        comparison
            && idents.iter().any(|i| taint.contains(i))
            && idents.iter().any(|i| committed.contains(i))
    });
    if compared {
        Channel::Proven
    } else {
        Channel::Hint
    }
}

/// Statements whose block runs under a condition on their header.
const CONTROL: &[&str] = &["for", "while", "if", "match"];

/// Token ranges of statements, split at `;`, `{` and `}`.
fn statements(tokens: &[Token]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, t) in tokens.iter().enumerate() {
        if t.is_punct(';') || t.is_punct('{') || t.is_punct('}') {
            if start < i {
                out.push((start, i));
            }
            start = i + 1;
        }
    }
    if start < tokens.len() {
        out.push((start, tokens.len()));
    }
    out
}

/// `let [mut] x = rhs` or `x = rhs`: the bound name and the rhs token index.
fn assignment<'s>(src: &'s str, tokens: &[Token], s: usize, e: usize) -> Option<(&'s str, usize)> {
    let mut i = s;
    if tokens[i].is_ident(src, "let") {
        i += 1;
        if tokens.get(i)?.is_ident(src, "mut") {
            i += 1;
        }
    }
    let name = tokens.get(i).filter(|t| t.kind == TokenKind::Ident)?;
    let eq = (i + 1..e).find(|&k| {
        tokens[k].is_punct('=')
            && !tokens.get(k + 1).is_some_and(|t| t.is_punct('='))
            && !tokens[k - 1].is_punct('=')
            && !tokens[k - 1].is_punct('!')
            && !tokens[k - 1].is_punct('<')
            && !tokens[k - 1].is_punct('>')
    })?;
    Some((name.text(src), eq + 1))
}

/// Identifiers inside the argument list of the call at `span`.
fn argument_idents<'s>(src: &'s str, tokens: &[Token], span: Span) -> BTreeSet<&'s str> {
    let inside: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.span.start >= span.start && t.span.end <= span.end)
        .collect();
    let Some(open) = inside.iter().position(|t| t.is_punct('(')) else {
        return BTreeSet::new();
    };
    inside[open..]
        .iter()
        .filter(|t| t.kind == TokenKind::Ident)
        .map(|t| t.text(src))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{analyze, AnalyzerConfig};
    use crate::fixtures::{self, profile};
    use zkport_core::Side;
    use zkport_platforms::PlatformId;

    fn channels(text: &str) -> Vec<Channel> {
        let unit = analyze(text, Side::Guest, &profile(PlatformId::Sp1), &AnalyzerConfig::default())
            .unwrap();
        classify_inputs(&unit).into_values().collect()
    }

    #[test]
    fn committed_and_compared_reads_are_proven() {
        assert_eq!(
            channels(fixtures::SP1_CHECK_GUEST),
            vec![Channel::Proven, Channel::Proven, Channel::Hint]
        );
    }

    #[test]
    fn derived_values_carry_the_read() {
        assert_eq!(channels(fixtures::SP1_GUEST), vec![Channel::Proven]);
    }

    #[test]
    fn unbound_reads_default_to_proven() {
        let text = "fn main() { consume(sp1_zkvm::io::read::<u8>()); }";
        assert_eq!(channels(text), vec![Channel::Proven]);
    }
}
