//! Source analyzer.
//!
//! Classifies every platform-specific call site of one source unit into a
//! [`Construct`] using the source platform's recognition table, and tiles the
//! rest of the text into [`PureSpan`]s. Nothing outside a construct span is
//! ever interpreted: a call reached through an alias or glob import counts
//! only when its canonical path matches a known shape.

pub mod aliases;
pub mod bindings;
pub mod lexer;
pub mod types;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use zkport_core::{
    CallForm, CallSite, Construct, ConstructId, ConstructKind, Direction, EntryCapture,
    EntryParam, PureSpan, Segment, Side, Span,
};
use zkport_platforms::{CallShape, PlatformProfile};

use crate::error::AnalysisError;
use aliases::AliasMap;
use bindings::{path_at, Bindings};
use lexer::{matching_angle, matching_close, split_top_level, tokenize, Token, TokenKind};

/// Analyzer limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalyzerConfig {
    /// Maximum constructs recognized in one unit.
    pub max_constructs: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_constructs: 4096,
        }
    }
}

/// A call site matched shapes of more than one construct kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub construct: ConstructId,
    pub chosen: ConstructKind,
    pub candidates: Vec<ConstructKind>,
}

/// One analyzed source unit: its constructs and the segments tiling its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedUnit {
    pub side: Side,
    pub text: String,
    pub constructs: Vec<Construct>,
    pub segments: Vec<Segment>,
    pub ambiguities: Vec<Ambiguity>,
}

impl AnalyzedUnit {
    pub fn construct(&self, id: ConstructId) -> Option<&Construct> {
        self.constructs.get(id.0)
    }

    pub fn entry(&self) -> Option<&Construct> {
        self.constructs
            .iter()
            .find(|c| c.kind == ConstructKind::EntryPoint)
    }

    pub fn pure_spans(&self) -> impl Iterator<Item = PureSpan> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Pure(p) => Some(*p),
            _ => None,
        })
    }

    /// I/O constructs of one direction, in sequence order.
    pub fn io(&self, direction: Direction) -> impl Iterator<Item = &Construct> {
        self.constructs
            .iter()
            .filter(move |c| c.direction() == Some(direction))
    }
}

/// Analyze `text` as the `side` unit of a program for `profile`.
pub fn analyze(
    text: &str,
    side: Side,
    profile: &PlatformProfile,
    config: &AnalyzerConfig,
) -> Result<AnalyzedUnit, AnalysisError> {
    let tokens = tokenize(text)?;
    let (aliases, use_ranges) = AliasMap::collect(text, &tokens);
    let bindings = Bindings::collect(text, &tokens, &aliases);

    let mut scanner = Scanner {
        src: text,
        tokens: &tokens,
        aliases: &aliases,
        bindings: &bindings,
        table: profile.recognition_table(side),
        use_ranges,
        pending: BTreeMap::new(),
    };
    let mut found = scanner.scan();

    let signatures: Vec<Span> = found.iter().filter_map(|f| f.signature).collect();
    found.retain(|f| {
        let span = f.span(&tokens);
        !signatures.iter().any(|s| s.overlaps(&span))
    });
    if found.len() > config.max_constructs {
        return Err(AnalysisError::ConstructLimit {
            limit: config.max_constructs,
            found: found.len(),
        });
    }

    // Evaluation order: arguments complete before the call that takes them,
    // so an enclosing construct always sorts after its children.
    found.sort_by_key(|f| (f.last, f.first));
    let parents: Vec<Option<ConstructId>> = found
        .iter()
        .enumerate()
        .map(|(k, inner)| {
            found[k + 1..]
                .iter()
                .enumerate()
                .filter(|(_, outer)| outer.encloses(inner))
                .max_by_key(|(_, outer)| outer.first)
                .map(|(j, _)| ConstructId(k + 1 + j))
        })
        .collect();

    let mut constructs = Vec::with_capacity(found.len());
    let mut ambiguities = Vec::new();
    let mut counters: BTreeMap<Direction, usize> = BTreeMap::new();
    for ((index, f), parent) in found.into_iter().enumerate().zip(parents) {
        let id = ConstructId(index);
        if f.candidates.len() > 1 {
            ambiguities.push(Ambiguity {
                construct: id,
                chosen: f.kind,
                candidates: f.candidates.clone(),
            });
        }
        let sequence_index = f.kind.direction().map(|d| {
            let counter = counters.entry(d).or_insert(0);
            *counter += 1;
            *counter - 1
        });
        let declared_type = declared_type(&bindings, &f);
        constructs.push(Construct {
            id,
            side,
            kind: f.kind,
            source_span: f.span(&tokens),
            signature_span: f.signature,
            declared_type,
            sequence_index,
            parent,
            call: f.call,
        });
    }

    let segments = tile(text.len(), &constructs);
    tracing::debug!(
        side = %side,
        platform = %profile.id,
        constructs = constructs.len(),
        segments = segments.len(),
        "unit analyzed"
    );
    Ok(AnalyzedUnit {
        side,
        text: text.to_string(),
        constructs,
        segments,
        ambiguities,
    })
}

/// Tile `0..len` with construct, signature and pure segments in order.
/// Nested constructs live inside their parent's segment.
fn tile(len: usize, constructs: &[Construct]) -> Vec<Segment> {
    let mut regions: Vec<Segment> = Vec::new();
    for c in constructs.iter().filter(|c| c.parent.is_none()) {
        regions.push(Segment::Construct {
            id: c.id,
            span: c.source_span,
        });
        if let Some(sig) = c.signature_span {
            regions.push(Segment::Signature { id: c.id, span: sig });
        }
    }
    regions.sort_by_key(|r| r.span().start);

    let mut segments = Vec::with_capacity(regions.len() * 2 + 1);
    let mut cursor = 0;
    for region in regions {
        let span = region.span();
        if span.start > cursor {
            segments.push(Segment::Pure(PureSpan {
                span: Span::new(cursor, span.start),
            }));
        }
        segments.push(region);
        cursor = span.end;
    }
    if cursor < len {
        segments.push(Segment::Pure(PureSpan {
            span: Span::new(cursor, len),
        }));
    }
    segments
}

fn declared_type(bindings: &Bindings, f: &Found) -> Option<String> {
    if let Some(ty) = &f.turbofish {
        return Some(ty.clone());
    }
    if let Some(ty) = bindings.at_init(f.first).and_then(|b| b.ty.clone()) {
        return Some(ty);
    }
    if f.kind.direction().is_none() {
        return None;
    }
    let var = f.call.dst.clone().or_else(|| {
        let args = f.call.args.as_deref()?;
        simple_ident(args.trim_start_matches('&').trim_start_matches("mut ").trim())
    })?;
    bindings.type_of(&var, f.first).map(str::to_string)
}

fn simple_ident(text: &str) -> Option<String> {
    let ok = !text.is_empty()
        && text.chars().all(|c| c == '_' || c.is_alphanumeric())
        && !text.starts_with(|c: char| c.is_ascii_digit());
    ok.then(|| text.to_string())
}

/// A recognized site before ids and sequence indices are assigned.
#[derive(Debug, Clone)]
struct Found {
    kind: ConstructKind,
    candidates: Vec<ConstructKind>,
    /// First and last token of the construct span.
    first: usize,
    last: usize,
    /// `(` and `)` tokens around the arguments.
    parens: Option<(usize, usize)>,
    call: CallSite,
    turbofish: Option<String>,
    signature: Option<Span>,
}

impl Found {
    fn span(&self, tokens: &[Token]) -> Span {
        Span::new(tokens[self.first].span.start, tokens[self.last].span.end)
    }

    /// Whether `other` lies strictly inside this construct's parentheses.
    fn encloses(&self, other: &Found) -> bool {
        self.parens
            .is_some_and(|(open, close)| open < other.first && other.last < close)
    }

    /// Where scanning resumes: inside the arguments, so nested calls are
    /// recognized too. Entry markers are never descended into.
    fn resume(&self) -> usize {
        match self.parens {
            Some((open, _)) if self.kind != ConstructKind::EntryPoint => open + 1,
            _ => self.last + 1,
        }
    }
}

/// Classification of one candidate: chosen kind, operation, and every kind
/// that matched.
type Classified<'a> = (ConstructKind, Option<&'a str>, Vec<ConstructKind>);

struct Scanner<'a> {
    src: &'a str,
    tokens: &'a [Token],
    aliases: &'a AliasMap,
    bindings: &'a Bindings,
    table: Vec<(&'a CallShape, ConstructKind, Option<&'a str>)>,
    use_ranges: Vec<(usize, usize)>,
    /// Method calls chained on a constructor call, keyed by the `.` token.
    pending: BTreeMap<usize, Found>,
}

impl<'a> Scanner<'a> {
    fn scan(&mut self) -> Vec<Found> {
        let mut found = Vec::new();
        let mut i = 0;
        while i < self.tokens.len() {
            if let Some(&(_, end)) = self.use_ranges.iter().find(|(s, _)| *s == i) {
                i = end + 1;
                continue;
            }
            if let Some(f) = self.pending.remove(&i) {
                i = f.resume();
                found.push(f);
                continue;
            }
            match self.site_at(i) {
                Some(f) => {
                    i = f.resume();
                    found.push(f);
                }
                None => i += 1,
            }
        }
        found
    }

    fn tok(&self, i: usize) -> Option<&'a Token> {
        self.tokens.get(i)
    }

    fn prev(&self, i: usize) -> Option<&'a Token> {
        i.checked_sub(1).and_then(|p| self.tokens.get(p))
    }

    fn text_between(&self, open: usize, close: usize) -> String {
        if close <= open + 1 {
            return String::new();
        }
        self.src[self.tokens[open + 1].span.start..self.tokens[close - 1].span.end]
            .trim()
            .to_string()
    }

    fn args_span(&self, open: usize, close: usize) -> Option<Span> {
        (close > open + 1).then(|| {
            Span::new(self.tokens[open + 1].span.start, self.tokens[close - 1].span.end)
        })
    }

    fn classify(&self, matches: impl Fn(&CallShape) -> bool) -> Option<Classified<'a>> {
        let mut best: Option<(ConstructKind, Option<&'a str>)> = None;
        let mut kinds: Vec<ConstructKind> = Vec::new();
        for &(shape, kind, op) in &self.table {
            if !matches(shape) {
                continue;
            }
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
            if best.map_or(true, |(b, _)| kind.precedence() < b.precedence()) {
                best = Some((kind, op));
            }
        }
        best.map(|(kind, op)| (kind, op, kinds))
    }

    fn site_at(&mut self, i: usize) -> Option<Found> {
        let tok = self.tok(i)?;
        match tok.kind {
            TokenKind::Punct('#') => self.attribute_at(i),
            TokenKind::Punct('.') => self.dot_site(i),
            TokenKind::Ident => {
                if self.tok(i + 1).is_some_and(|t| t.is_punct('.')) {
                    return self.receiver_site(i);
                }
                self.path_site(i)
            }
            TokenKind::PathSep => self.path_site(i),
            _ => None,
        }
    }

    /// `#[path]` or `#[path(...)]`.
    fn attribute_at(&self, i: usize) -> Option<Found> {
        if !self.tok(i + 1)?.is_punct('[') {
            return None;
        }
        let close = matching_close(self.tokens, i + 1)?;
        let (segments, after) = path_at(self.src, self.tokens, i + 2)?;
        if after != close && !self.tok(after)?.is_punct('(') {
            return None;
        }
        let candidates = self.aliases.candidates(&segments);
        let (path, (kind, op, kinds)) = candidates.iter().find_map(|c| {
            self.classify(|s| s.matches_attribute(c))
                .map(|r| (c.clone(), r))
        })?;

        let mut call = CallSite {
            path,
            operation: op.map(str::to_string),
            ..CallSite::default()
        };
        let mut signature = None;
        if kind == ConstructKind::EntryPoint {
            if let Some((span, capture)) = self.header_after(close + 1) {
                signature = Some(span);
                call.entry = Some(capture);
            }
        }
        Some(Found {
            kind,
            candidates: kinds,
            first: i,
            last: close,
            parens: None,
            call,
            turbofish: None,
            signature,
        })
    }

    /// A path call `a::b(...)`, turbofish call, or macro `a::b!(...)`.
    fn path_site(&mut self, i: usize) -> Option<Found> {
        if let Some(prev) = self.prev(i) {
            let mid_path = matches!(prev.kind, TokenKind::PathSep | TokenKind::Punct('.'))
                || (self.tokens[i].kind == TokenKind::PathSep
                    && matches!(prev.kind, TokenKind::Ident | TokenKind::Punct('>')));
            if mid_path || prev.is_ident(self.src, "fn") {
                return None;
            }
        }
        let (segments, mut after) = path_at(self.src, self.tokens, i)?;
        let candidates = self.aliases.candidates(&segments);

        if self.tok(after)?.is_punct('!') {
            return self.macro_site(i, after, &candidates);
        }

        let mut turbofish = None;
        if self.tok(after)?.is_punct('<') && self.prev(after)?.kind == TokenKind::PathSep {
            let close = matching_angle(self.tokens, after)?;
            turbofish = Some(self.text_between(after, close));
            after = close + 1;
        }
        if !self.tok(after)?.is_punct('(') {
            return None;
        }
        let close = matching_close(self.tokens, after)?;
        self.queue_chain(&candidates, close);

        let (path, (kind, op, kinds)) = candidates.iter().find_map(|c| {
            self.classify(|s| s.matches_path(c)).map(|r| (c.clone(), r))
        })?;
        let args = self.text_between(after, close);
        let mut call = CallSite {
            path,
            operation: op.map(str::to_string),
            binding: self.binding_name(i),
            ..CallSite::default()
        };
        self.fill_form(&mut call, kind, after);
        call.args = Some(args);
        call.args_span = self.args_span(after, close);
        Some(Found {
            kind,
            candidates: kinds,
            first: i,
            last: close,
            parens: Some((after, close)),
            call,
            turbofish,
            signature: None,
        })
    }

    fn macro_site(&self, i: usize, bang: usize, candidates: &[String]) -> Option<Found> {
        let open = bang + 1;
        let close = matching_close(self.tokens, open)?;
        let (path, (kind, op, kinds)) = candidates.iter().find_map(|c| {
            self.classify(|s| s.matches_macro(c)).map(|r| (c.clone(), r))
        })?;
        let args = self.text_between(open, close);
        let last = match self.tok(close + 1) {
            Some(t) if t.is_punct(';') => close + 1,
            _ => close,
        };
        let mut call = CallSite {
            path,
            operation: op.map(str::to_string),
            ..CallSite::default()
        };
        let mut signature = None;
        if kind == ConstructKind::EntryPoint {
            let name = args.trim().to_string();
            match self.fn_named(&name) {
                Some((span, capture)) => {
                    signature = Some(span);
                    call.entry = Some(capture);
                }
                None => {
                    call.entry = Some(EntryCapture {
                        name,
                        params: Vec::new(),
                        ret: None,
                    })
                }
            }
        }
        call.args = Some(args);
        call.args_span = self.args_span(open, close);
        Some(Found {
            kind,
            candidates: kinds,
            first: i,
            last,
            parens: Some((open, close)),
            call,
            turbofish: None,
            signature,
        })
    }

    /// `recv.method(...)` or `recv.field.method(...)` starting at `recv`.
    fn receiver_site(&self, i: usize) -> Option<Found> {
        let recv = self.tokens[i].text(self.src);
        let name = self.tok(i + 2).filter(|t| t.kind == TokenKind::Ident)?;

        if self.tok(i + 3).is_some_and(|t| t.is_punct('.')) {
            let method = self.tok(i + 4).filter(|t| t.kind == TokenKind::Ident)?;
            let field = name.text(self.src);
            let method = method.text(self.src);
            let (open, turbofish) = self.call_open(i + 5)?;
            let (kind, op, kinds) = self.classify(|s| s.matches_field(field, method))?;
            return Some(self.method_found(i, open, turbofish, recv, (kind, op, kinds), field, method));
        }

        let method = name.text(self.src);
        let (open, turbofish) = self.call_open(i + 3)?;
        let ctors = self
            .bindings
            .nearest(recv, i)
            .map(|b| b.ctor.clone())
            .unwrap_or_default();
        let classified = ctors
            .iter()
            .find_map(|c| self.classify(|s| s.matches_method(Some(c), method)))
            .or_else(|| self.classify(|s| s.matches_method(None, method)))?;
        Some(self.method_found(i, open, turbofish, recv, classified, "", method))
    }

    /// `.method(...)` on a receiver expression that is not a plain name.
    fn dot_site(&self, i: usize) -> Option<Found> {
        if self.prev(i).is_some_and(|t| t.kind == TokenKind::Ident) {
            return None;
        }
        let method = self.tok(i + 1).filter(|t| t.kind == TokenKind::Ident)?;
        let method = method.text(self.src);
        let (open, turbofish) = self.call_open(i + 2)?;
        let classified = self.classify(|s| s.matches_method(None, method))?;
        Some(self.method_found(i, open, turbofish, "", classified, "", method))
    }

    /// Queue method calls chained directly on a constructor call.
    fn queue_chain(&mut self, ctor_candidates: &[String], ctor_close: usize) {
        let constructors: Vec<&str> = self.table.iter().filter_map(|(s, _, _)| s.constructor()).collect();
        let Some(ctor) = ctor_candidates
            .iter()
            .find(|c| constructors.contains(&c.as_str()))
        else {
            return;
        };
        let mut i = ctor_close + 1;
        loop {
            match self.tok(i) {
                Some(t) if t.is_punct('?') => i += 1,
                Some(t) if t.is_punct('.') => {
                    let Some(method) = self.tok(i + 1).filter(|t| t.kind == TokenKind::Ident) else {
                        return;
                    };
                    let method = method.text(self.src);
                    match self.call_open(i + 2) {
                        Some((open, turbofish)) => {
                            let Some(close) = matching_close(self.tokens, open) else {
                                return;
                            };
                            if let Some(classified) =
                                self.classify(|s| s.matches_method(Some(ctor), method))
                            {
                                let f = self.method_found(i, open, turbofish, "", classified, "", method);
                                self.pending.insert(i, f);
                            }
                            i = close + 1;
                        }
                        None => i += 2,
                    }
                }
                _ => return,
            }
        }
    }

    /// Index of the `(` of a call at `i`, skipping a `::<...>` turbofish.
    fn call_open(&self, i: usize) -> Option<(usize, Option<String>)> {
        let tok = self.tok(i)?;
        if tok.is_punct('(') {
            return Some((i, None));
        }
        if tok.kind == TokenKind::PathSep && self.tok(i + 1)?.is_punct('<') {
            let close = matching_angle(self.tokens, i + 1)?;
            if self.tok(close + 1)?.is_punct('(') {
                return Some((close + 1, Some(self.text_between(i + 1, close))));
            }
        }
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn method_found(
        &self,
        first: usize,
        open: usize,
        turbofish: Option<String>,
        recv: &str,
        (kind, op, kinds): Classified<'a>,
        field: &str,
        method: &str,
    ) -> Found {
        let close = matching_close(self.tokens, open).unwrap_or(open);
        let path = if field.is_empty() {
            method.to_string()
        } else {
            format!("{field}.{method}")
        };
        let mut call = CallSite {
            path,
            receiver: Some(recv.to_string()),
            operation: op.map(str::to_string),
            binding: self.binding_name(first),
            args: Some(self.text_between(open, close)),
            args_span: self.args_span(open, close),
            ..CallSite::default()
        };
        self.fill_form(&mut call, kind, open);
        Found {
            kind,
            candidates: kinds,
            first,
            last: close,
            parens: (close > open).then_some((open, close)),
            call,
            turbofish,
            signature: None,
        }
    }

    fn binding_name(&self, first: usize) -> Option<String> {
        self.bindings.at_init(first).map(|b| b.name.clone())
    }

    /// Input calls whose first argument is `&mut name` fill a buffer.
    fn fill_form(&self, call: &mut CallSite, kind: ConstructKind, open: usize) {
        if kind.direction() != Some(Direction::Input) {
            return;
        }
        let amp = self.tok(open + 1);
        let mutable = self.tok(open + 2);
        let name = self.tok(open + 3);
        if let (Some(a), Some(m), Some(n)) = (amp, mutable, name) {
            if a.is_punct('&') && m.is_ident(self.src, "mut") && n.kind == TokenKind::Ident {
                call.form = CallForm::Fill;
                call.dst = Some(n.text(self.src).to_string());
            }
        }
    }

    /// Header of the first `fn name` item.
    fn fn_named(&self, name: &str) -> Option<(Span, EntryCapture)> {
        let at = (0..self.tokens.len().saturating_sub(1)).find(|&i| {
            self.tokens[i].is_ident(self.src, "fn") && self.tokens[i + 1].is_ident(self.src, name)
        })?;
        self.header_at(at)
    }

    /// Header of the function item starting at token `i`, skipping further
    /// attributes and qualifiers.
    fn header_after(&self, mut i: usize) -> Option<(Span, EntryCapture)> {
        loop {
            let tok = self.tok(i)?;
            if tok.is_punct('#') && self.tok(i + 1)?.is_punct('[') {
                i = matching_close(self.tokens, i + 1)? + 1;
            } else if tok.is_ident(self.src, "fn") {
                return self.header_at(i);
            } else if tok.is_ident(self.src, "pub") && self.tok(i + 1)?.is_punct('(') {
                i = matching_close(self.tokens, i + 1)? + 1;
            } else if QUALIFIERS.iter().any(|q| tok.is_ident(self.src, q)) {
                i += 1;
            } else {
                return None;
            }
        }
    }

    fn header_at(&self, fn_idx: usize) -> Option<(Span, EntryCapture)> {
        let mut start = fn_idx;
        while let Some(prev) = self.prev(start) {
            if QUALIFIERS.iter().any(|q| prev.is_ident(self.src, q)) {
                start -= 1;
            } else if prev.is_punct(')')
                && start >= 4
                && self.tokens[start - 4].is_ident(self.src, "pub")
                && self.tokens[start - 3].is_punct('(')
            {
                start -= 4;
            } else {
                break;
            }
        }

        let name = self.tok(fn_idx + 1)?.text(self.src).to_string();
        let mut open = fn_idx + 2;
        if self.tok(open)?.is_punct('<') {
            open = matching_angle(self.tokens, open)? + 1;
        }
        if !self.tok(open)?.is_punct('(') {
            return None;
        }
        let close = matching_close(self.tokens, open)?;

        let params = split_top_level(self.tokens, open, close, true)
            .into_iter()
            .filter_map(|(s, e)| {
                let colon = (s..e).find(|&k| self.tokens[k].is_punct(':'))?;
                let text = |a: usize, b: usize| {
                    self.src[self.tokens[a].span.start..self.tokens[b - 1].span.end].to_string()
                };
                (colon > s && colon + 1 < e).then(|| EntryParam {
                    name: text(s, colon),
                    ty: text(colon + 1, e),
                })
            })
            .collect();

        let mut end = close;
        let mut ret = None;
        let body = (close + 1..self.tokens.len()).find(|&k| {
            self.tokens[k].is_punct('{')
                || self.tokens[k].is_punct(';')
                || self.tokens[k].is_ident(self.src, "where")
        })?;
        if self.tok(close + 1)?.is_punct('-') && self.tok(close + 2)?.is_punct('>') && body > close + 3 {
            ret = Some(
                self.src[self.tokens[close + 3].span.start..self.tokens[body - 1].span.end].to_string(),
            );
            end = body - 1;
        }
        let span = Span::new(self.tokens[start].span.start, self.tokens[end].span.end);
        Some((span, EntryCapture { name, params, ret }))
    }
}

const QUALIFIERS: &[&str] = &["pub", "async", "unsafe", "const", "extern"];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, profile};
    use zkport_platforms::{PlatformId, PrecompileEntry, PrecompileStatus, Template};

    fn run(text: &str, side: Side, id: PlatformId) -> AnalyzedUnit {
        analyze(text, side, &profile(id), &AnalyzerConfig::default()).unwrap()
    }

    fn kinds(unit: &AnalyzedUnit) -> Vec<ConstructKind> {
        unit.constructs.iter().map(|c| c.kind).collect()
    }

    fn rebuild(unit: &AnalyzedUnit) -> String {
        unit.segments.iter().map(|s| s.span().slice(&unit.text)).collect()
    }

    #[test]
    fn sp1_guest_constructs() {
        let unit = run(fixtures::SP1_GUEST, Side::Guest, PlatformId::Sp1);
        assert_eq!(
            kinds(&unit),
            vec![
                ConstructKind::EntryPoint,
                ConstructKind::StructuredRead,
                ConstructKind::StructuredCommit
            ]
        );
        let read = &unit.constructs[1];
        assert_eq!(read.declared_type.as_deref(), Some("u32"));
        assert_eq!(read.call.binding.as_deref(), Some("n"));
        assert_eq!(read.sequence_index, Some(0));
        let commit = &unit.constructs[2];
        assert_eq!(commit.declared_type.as_deref(), Some("u64"));
        assert_eq!(commit.sequence_index, Some(0));

        let entry = &unit.constructs[0];
        assert_eq!(entry.source_span.slice(&unit.text), "sp1_zkvm::entrypoint!(main);");
        assert_eq!(entry.signature_span.unwrap().slice(&unit.text), "pub fn main()");
        assert_eq!(entry.call.entry.as_ref().unwrap().name, "main");
    }

    #[test]
    fn segments_tile_the_text() {
        for (text, side, id) in [
            (fixtures::SP1_GUEST, Side::Guest, PlatformId::Sp1),
            (fixtures::SP1_HOST, Side::Host, PlatformId::Sp1),
            (fixtures::RISC0_BYTES_HOST, Side::Host, PlatformId::Risc0),
            (fixtures::JOLT_GUEST, Side::Guest, PlatformId::Jolt),
        ] {
            let unit = run(text, side, id);
            assert_eq!(rebuild(&unit), text);
            let mut cursor = 0;
            for seg in &unit.segments {
                assert_eq!(seg.span().start, cursor);
                assert!(!seg.span().is_empty());
                cursor = seg.span().end;
            }
        }
    }

    #[test]
    fn aliases_and_renames_resolve() {
        let text = "use sp1_zkvm::io::{read, commit as publish};\n\
                    fn main() { let x: u32 = read(); publish(&x); }";
        let unit = run(text, Side::Guest, PlatformId::Sp1);
        assert_eq!(
            kinds(&unit),
            vec![ConstructKind::StructuredRead, ConstructKind::StructuredCommit]
        );
        assert_eq!(unit.constructs[1].call.path, "sp1_zkvm::io::commit");
        assert_eq!(unit.constructs[1].declared_type.as_deref(), Some("u32"));
    }

    #[test]
    fn unresolved_paths_stay_pure() {
        let text = "fn main() { let x = read::<u32>(); io::commit(&x); }";
        let unit = run(text, Side::Guest, PlatformId::Sp1);
        assert!(unit.constructs.is_empty());
        assert_eq!(unit.segments.len(), 1);
    }

    #[test]
    fn strings_and_comments_are_not_calls() {
        let text = "fn main() {\n    // sp1_zkvm::io::read::<u32>()\n    let s = \"sp1_zkvm::io::commit(&x)\";\n}";
        let unit = run(text, Side::Guest, PlatformId::Sp1);
        assert!(unit.constructs.is_empty());
    }

    #[test]
    fn reads_nested_in_commit_arguments() {
        let text = "sp1_zkvm::entrypoint!(main);\npub fn main() {\n    sp1_zkvm::io::commit(&sp1_zkvm::io::read::<u32>());\n}\n";
        let unit = run(text, Side::Guest, PlatformId::Sp1);
        assert_eq!(
            kinds(&unit),
            vec![
                ConstructKind::EntryPoint,
                ConstructKind::StructuredRead,
                ConstructKind::StructuredCommit
            ]
        );
        let (read, commit) = (&unit.constructs[1], &unit.constructs[2]);
        assert_eq!(read.source_span.slice(&unit.text), "sp1_zkvm::io::read::<u32>()");
        assert_eq!(read.parent, Some(commit.id));
        assert_eq!(read.declared_type.as_deref(), Some("u32"));
        assert_eq!(read.sequence_index, Some(0));
        assert_eq!(commit.parent, None);
        assert_eq!(
            commit.call.args_span.map(|s| s.slice(&unit.text)),
            Some("&sp1_zkvm::io::read::<u32>()")
        );

        assert!(!unit
            .segments
            .iter()
            .any(|s| matches!(s, Segment::Construct { id, .. } if *id == read.id)));
        assert_eq!(rebuild(&unit), unit.text);
    }

    #[test]
    fn nested_inputs_are_numbered_in_evaluation_order() {
        let text = "use risc0_zkvm::guest::env;\nrisc0_zkvm::guest::entry!(main);\nfn main() {\n    let a: u32 = env::read();\n    env::commit(&(env::read::<u32>(), a));\n    let b: u8 = env::read();\n}\n";
        let unit = run(text, Side::Guest, PlatformId::Risc0);
        let reads: Vec<_> = unit.io(Direction::Input).collect();
        assert_eq!(reads.len(), 3);
        assert_eq!(reads[0].call.binding.as_deref(), Some("a"));
        assert!(reads[1].parent.is_some());
        assert_eq!(reads[2].call.binding.as_deref(), Some("b"));
        let indices: Vec<_> = reads.iter().map(|r| r.sequence_index).collect();
        assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn typed_array_lets_keep_declared_types() {
        let text = "use risc0_zkvm::guest::env;\nrisc0_zkvm::guest::entry!(main);\nfn main() {\n    let mut buf: [u8; 32] = [0; 32];\n    env::read_slice(&mut buf);\n    let x: [u32; 2] = env::read();\n    env::commit(&x);\n}\n";
        let unit = run(text, Side::Guest, PlatformId::Risc0);
        let types: Vec<_> = unit.constructs[1..]
            .iter()
            .map(|c| c.declared_type.as_deref())
            .collect();
        assert_eq!(types, vec![Some("[u8; 32]"), Some("[u32; 2]"), Some("[u32; 2]")]);
    }

    #[test]
    fn fill_form_reads() {
        let unit = run(fixtures::RISC0_SLICES_GUEST, Side::Guest, PlatformId::Risc0);
        let reads: Vec<_> = unit.io(Direction::Input).collect();
        assert_eq!(reads.len(), 5);
        for (i, read) in reads.iter().enumerate() {
            assert_eq!(read.kind, ConstructKind::RawRead);
            assert_eq!(read.call.form, CallForm::Fill);
            assert_eq!(read.declared_type.as_deref(), Some("[u32; 4]"));
            assert_eq!(read.sequence_index, Some(i));
        }
        assert_eq!(reads[0].call.dst.as_deref(), Some("a"));
        assert_eq!(reads[4].call.dst.as_deref(), Some("e"));
    }

    #[test]
    fn host_method_and_field_shapes() {
        let unit = run(fixtures::SP1_HOST, Side::Host, PlatformId::Sp1);
        assert_eq!(
            kinds(&unit),
            vec![
                ConstructKind::EntryPoint,
                ConstructKind::StructuredRead,
                ConstructKind::StructuredCommit
            ]
        );
        let write = &unit.constructs[1];
        assert_eq!(write.call.receiver.as_deref(), Some("stdin"));
        assert_eq!(write.declared_type.as_deref(), Some("u32"));
        assert_eq!(write.source_span.slice(&unit.text), "stdin.write(&n)");
        let read = &unit.constructs[2];
        assert_eq!(read.call.receiver.as_deref(), Some("proof"));
        assert_eq!(read.declared_type.as_deref(), Some("u64"));
    }

    #[test]
    fn methods_chained_on_constructor() {
        let unit = run(fixtures::RISC0_BYTES_HOST, Side::Host, PlatformId::Risc0);
        assert_eq!(
            kinds(&unit),
            vec![
                ConstructKind::EntryPoint,
                ConstructKind::RawRead,
                ConstructKind::RawRead,
                ConstructKind::StructuredCommit
            ]
        );
        let first = &unit.constructs[1];
        assert_eq!(first.source_span.slice(&unit.text), ".write_slice(&tag)");
        assert_eq!(first.call.receiver.as_deref(), Some(""));
        assert_eq!(first.declared_type.as_deref(), Some("[u8; 1]"));
        assert_eq!(unit.constructs[3].declared_type.as_deref(), Some("u32"));
    }

    #[test]
    fn attribute_entry_captures_header() {
        let unit = run(fixtures::JOLT_GUEST, Side::Guest, PlatformId::Jolt);
        assert_eq!(kinds(&unit), vec![ConstructKind::EntryPoint]);
        let entry = &unit.constructs[0];
        assert_eq!(entry.source_span.slice(&unit.text), "#[jolt::provable]");
        assert_eq!(
            entry.signature_span.unwrap().slice(&unit.text),
            "fn fib(n: u32) -> u128"
        );
        let capture = entry.call.entry.as_ref().unwrap();
        assert_eq!(capture.name, "fib");
        assert_eq!(
            capture.params,
            vec![EntryParam {
                name: "n".into(),
                ty: "u32".into()
            }]
        );
        assert_eq!(capture.ret.as_deref(), Some("u128"));
    }

    #[test]
    fn nexus_hint_and_public_inputs() {
        let unit = run(fixtures::NEXUS_GUEST, Side::Guest, PlatformId::Nexus);
        assert_eq!(
            kinds(&unit),
            vec![
                ConstructKind::EntryPoint,
                ConstructKind::StructuredRead,
                ConstructKind::Hint,
                ConstructKind::StructuredCommit
            ]
        );
        assert_eq!(unit.constructs[2].sequence_index, Some(1));
        assert_eq!(
            unit.constructs[0].signature_span.unwrap().slice(&unit.text),
            "fn main()"
        );
    }

    #[test]
    fn ambiguity_prefers_io_over_precompile() {
        let mut p = profile(PlatformId::Sp1);
        p.precompiles.insert(
            "mystery".into(),
            PrecompileEntry {
                status: PrecompileStatus::Accelerated,
                shapes: vec![CallShape::Path("sp1_zkvm::io::read".into())],
                template: Some(Template::new("mystery({args})")),
                dependency: None,
            },
        );
        let unit = analyze(fixtures::SP1_GUEST, Side::Guest, &p, &AnalyzerConfig::default()).unwrap();
        assert_eq!(unit.constructs[1].kind, ConstructKind::StructuredRead);
        assert_eq!(unit.ambiguities.len(), 1);
        assert_eq!(
            unit.ambiguities[0].candidates,
            vec![ConstructKind::StructuredRead, ConstructKind::PrecompileCall]
        );
    }

    #[test]
    fn precompile_calls_carry_operation() {
        let text = "use sha2::{Digest, Sha256};\nfn main() { let h = Sha256::digest(&data); }";
        let unit = run(text, Side::Guest, PlatformId::Sp1);
        assert_eq!(kinds(&unit), vec![ConstructKind::PrecompileCall]);
        assert_eq!(unit.constructs[0].call.operation.as_deref(), Some("sha256"));
        assert_eq!(unit.constructs[0].sequence_index, None);
    }

    #[test]
    fn construct_limit_is_an_error() {
        let config = AnalyzerConfig { max_constructs: 2 };
        let err = analyze(fixtures::SP1_GUEST, Side::Guest, &profile(PlatformId::Sp1), &config)
            .unwrap_err();
        assert_eq!(err, AnalysisError::ConstructLimit { limit: 2, found: 3 });
    }

    #[test]
    fn malformed_source_is_an_error() {
        let err = analyze(
            "fn main() { let s = \"open;\n}",
            Side::Guest,
            &profile(PlatformId::Sp1),
            &AnalyzerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedSource { .. }));
    }
}
