//! Code generation: resolved units → target guest and host sources.
//!
//! The segment list of each unit is walked in order. Pure spans are copied
//! byte for byte; construct spans are replaced by the instantiated target
//! template, followed by an inline `/* zkport: ... */` note whenever the
//! construct was adapted or is unsupported. Only ordered collections drive
//! emission, so the same plan always yields the same text.

mod entry;
pub(crate) mod render;

use serde::Serialize;
use zkport_core::{CallForm, Construct, ConstructKind, Segment, Side, Span};
use zkport_platforms::{LogicalDependency, PlatformProfile, Template};

use crate::error::{Result, TransferError};
use crate::resolve::{Action, Aggregate, BundleLayout, Resolution, ResolvedUnit, Rewrite};
use entry::EntryEmitter;
use render::{annotation, in_statement_position, Values};

/// Generated target program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifacts {
    pub guest_source: String,
    pub host_source: String,
    pub changes: Vec<ChangeRecord>,
    /// Crates the target program needs, sorted by side then name.
    pub dependencies: Vec<LogicalDependency>,
}

/// One replaced construct, for the change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub side: Side,
    pub construct: usize,
    pub kind: ConstructKind,
    pub span: Span,
    pub action: String,
    pub original: String,
    pub replacement: String,
}

/// Emit both units onto `target`.
pub fn emit(
    source: &PlatformProfile,
    target: &PlatformProfile,
    guest: ResolvedUnit<'_>,
    host: ResolvedUnit<'_>,
    layout: &BundleLayout,
) -> Result<Artifacts> {
    let entry_name = guest
        .unit
        .entry()
        .and_then(|c| c.call.entry.as_ref())
        .map(|e| e.name.clone())
        .unwrap_or_else(|| "main".to_string());
    let emitter = Emitter {
        source,
        target,
        layout,
        entry_name,
    };

    let mut changes = Vec::new();
    let guest_source = emitter.unit(guest, &mut changes)?;
    let host_source = emitter.unit(host, &mut changes)?;
    let dependencies = dependencies(target, guest);

    tracing::debug!(
        target = %target.id,
        changes = changes.len(),
        dependencies = dependencies.len(),
        "sources emitted"
    );
    Ok(Artifacts {
        guest_source,
        host_source,
        changes,
        dependencies,
    })
}

/// Target dependencies plus those of every precompile the guest still calls.
fn dependencies(target: &PlatformProfile, guest: ResolvedUnit<'_>) -> Vec<LogicalDependency> {
    let mut deps: Vec<LogicalDependency> = target.dependencies.clone();
    for r in guest.resolutions {
        if r.rewrite
            != (Rewrite::Template {
                kind: ConstructKind::PrecompileCall,
            })
        {
            continue;
        }
        let dep = guest
            .unit
            .construct(r.construct)
            .and_then(|c| c.call.operation.as_deref())
            .and_then(|op| target.precompiles.get(op))
            .and_then(|p| p.dependency.clone());
        if let Some(dep) = dep {
            deps.push(dep);
        }
    }
    deps.sort_by(|a, b| (a.side, &a.name).cmp(&(b.side, &b.name)));
    deps.dedup_by(|a, b| a.side == b.side && a.name == b.name);
    deps
}

struct Emitter<'a> {
    source: &'a PlatformProfile,
    target: &'a PlatformProfile,
    layout: &'a BundleLayout,
    entry_name: String,
}

impl Emitter<'_> {
    fn unit(&self, unit: ResolvedUnit<'_>, changes: &mut Vec<ChangeRecord>) -> Result<String> {
        let text = unit.unit.text.as_str();
        let side = unit.unit.side;
        let mut out = String::with_capacity(text.len() + text.len() / 4);
        let mut pending_signature: Option<String> = None;
        let mut invocation = match side {
            Side::Host => self.invocation(unit),
            Side::Guest => None,
        };

        for segment in &unit.unit.segments {
            let span = segment.span();
            if let Some((at, _)) = &invocation {
                let inside_construct = !matches!(segment, Segment::Pure(_)) && *at < span.end;
                let before = *at <= span.start || inside_construct;
                if before {
                    if let Some((_, statement)) = invocation.take() {
                        out.push_str(&statement);
                    }
                }
            }
            match *segment {
                Segment::Pure(p) => match invocation.take() {
                    Some((at, statement)) if at < p.span.end => {
                        out.push_str(&text[p.span.start..at]);
                        out.push_str(&statement);
                        out.push_str(&text[at..p.span.end]);
                    }
                    pending => {
                        invocation = pending;
                        out.push_str(p.span.slice(text));
                    }
                },
                Segment::Construct { id, span } => {
                    let (c, r) = self.pair(unit, id.0, side)?;
                    let replacement = if c.kind == ConstructKind::EntryPoint && side == Side::Guest {
                        let emitted = self.entry_emitter().emit(c, r, text)?;
                        match (emitted.signature, c.signature_span) {
                            (Some(sig), Some(_)) => {
                                pending_signature = Some(sig);
                                emitted.marker
                            }
                            (Some(sig), None) => format!("{}\n{sig}", emitted.marker),
                            (None, _) => emitted.marker,
                        }
                    } else {
                        self.nested(unit, c, r, text, changes)?
                    };
                    changes.push(ChangeRecord {
                        side,
                        construct: c.id.0,
                        kind: c.kind,
                        span,
                        action: bucket_name(&r.action).to_string(),
                        original: span.slice(text).to_string(),
                        replacement: replacement.clone(),
                    });
                    out.push_str(&replacement);
                }
                Segment::Signature { span, .. } => match pending_signature.take() {
                    Some(sig) => out.push_str(&sig),
                    None => out.push_str(span.slice(text)),
                },
            }
        }
        if let Some((_, statement)) = invocation {
            out.push_str(&statement);
        }
        Ok(out)
    }

    /// The guest invocation a bundled host needs, with its insertion offset.
    ///
    /// The statement binding `__output` goes on its own line before the first
    /// bundled output read, or after the statement holding the last bundled
    /// write when the host reads no outputs.
    fn invocation(&self, unit: ResolvedUnit<'_>) -> Option<(usize, String)> {
        let bundle = self.target.bundle.as_ref()?;
        let text = unit.unit.text.as_str();
        let sites: Vec<(&Construct, &Rewrite)> = unit
            .unit
            .constructs
            .iter()
            .zip(unit.resolutions)
            .map(|(c, r)| (c, &r.rewrite))
            .filter(|(_, r)| matches!(r, Rewrite::BundleChannel | Rewrite::Bundle { .. }))
            .collect();
        if sites.is_empty() {
            return None;
        }

        let mut values = Values::new(&self.entry_name, self.layout);
        values.input = sites
            .iter()
            .find(|(_, r)| **r == Rewrite::BundleChannel)
            .and_then(|(c, _)| c.call.binding.clone())
            .unwrap_or_else(|| format!("<{}>::default()", self.layout.input_ty()));
        let rendered = values.render(&bundle.host_invoke);

        let first_output = sites
            .iter()
            .filter(|(_, r)| {
                matches!(
                    r,
                    Rewrite::Bundle {
                        aggregate: Aggregate::Output,
                        ..
                    }
                )
            })
            .map(|(c, _)| c.source_span.start)
            .min();
        let placed = match first_output {
            Some(start) => {
                let at = statement_start(text, start);
                let indent = line_indent(text, at);
                let body = rendered.replace('\n', &format!("\n{indent}"));
                if at == 0 || text[..at].ends_with('\n') {
                    (at, format!("{indent}{body}\n"))
                } else {
                    (at, format!(" {body}"))
                }
            }
            None => {
                let end = sites.iter().map(|(c, _)| c.source_span.end).max()?;
                let at = statement_end(text, end);
                let indent = line_indent(text, end);
                let body = rendered.replace('\n', &format!("\n{indent}"));
                (at, format!("\n{indent}{body}"))
            }
        };
        Some(placed)
    }

    /// Replacement of `c` with its nested constructs rendered first and
    /// spliced into its argument text. Children are logged before `c`.
    fn nested(
        &self,
        unit: ResolvedUnit<'_>,
        c: &Construct,
        r: &Resolution,
        text: &str,
        changes: &mut Vec<ChangeRecord>,
    ) -> Result<String> {
        let mut children = Vec::new();
        for child in unit.unit.constructs.iter().filter(|k| k.parent == Some(c.id)) {
            let (child, child_r) = self.pair(unit, child.id.0, c.side)?;
            let replacement = self.nested(unit, child, child_r, text, changes)?;
            changes.push(ChangeRecord {
                side: c.side,
                construct: child.id.0,
                kind: child.kind,
                span: child.source_span,
                action: bucket_name(&child_r.action).to_string(),
                original: child.source_span.slice(text).to_string(),
                replacement: replacement.clone(),
            });
            children.push((child.source_span, replacement));
        }

        let mut s = match (children.is_empty(), c.call.args_span) {
            (false, Some(args_span)) => {
                let mut spliced = c.clone();
                spliced.call.args = Some(splice(text, args_span, &children));
                self.construct(&spliced, r, text)?
            }
            _ => self.construct(c, r, text)?,
        };
        if !children.is_empty() && matches!(r.rewrite, Rewrite::Neutral | Rewrite::Stub { .. }) {
            let kept: Vec<&str> = children.iter().map(|(_, t)| t.as_str()).collect();
            s = keep_evaluated(&s, &kept);
        }
        if !r.is_direct() {
            s.push_str(&annotation(&r.action.describe()));
        }
        Ok(s)
    }

    fn pair<'u>(
        &self,
        unit: ResolvedUnit<'u>,
        index: usize,
        side: Side,
    ) -> Result<(&'u Construct, &'u Resolution)> {
        match (unit.unit.constructs.get(index), unit.resolutions.get(index)) {
            (Some(c), Some(r)) if r.construct == c.id => Ok((c, r)),
            _ => Err(TransferError::Incomplete {
                side,
                detail: format!("construct #{index} has no resolution"),
            }),
        }
    }

    fn entry_emitter(&self) -> EntryEmitter<'_> {
        EntryEmitter {
            source: self.source,
            target: self.target,
            layout: self.layout,
        }
    }

    fn values(&self, c: &Construct) -> Values {
        let mut values = Values::new(&self.entry_name, self.layout).with_construct(c);
        if let Some(capture) = &c.call.entry {
            values = values.with_capture(capture);
        }
        values
    }

    /// Replacement text of a non-entry construct (and of host entries).
    fn construct(&self, c: &Construct, r: &Resolution, text: &str) -> Result<String> {
        let side = c.side;
        match &r.rewrite {
            Rewrite::Template { kind } => {
                let (value, fill) = if *kind == ConstructKind::PrecompileCall {
                    let template = c
                        .call
                        .operation
                        .as_deref()
                        .and_then(|op| self.target.precompiles.get(op))
                        .and_then(|p| p.template.as_ref());
                    (template, None)
                } else {
                    let entry = self.target.vocabulary(side).get(*kind);
                    (
                        entry.and_then(|e| e.template.as_ref()),
                        entry.and_then(|e| e.fill.as_ref()),
                    )
                };
                let values = self.values(c);
                match (c.call.form, fill, value) {
                    (CallForm::Fill, Some(fill), _) => Ok(values.render(fill)),
                    (CallForm::Fill, None, Some(value)) => {
                        Ok(format!("{} = {}", values.get("dst"), values.render(value)))
                    }
                    (CallForm::Value, _, Some(value)) => Ok(values.render(value)),
                    _ => Err(self.missing(side, kind.as_str())),
                }
            }
            Rewrite::Entry => {
                let emitted = self.entry_emitter().emit(c, r, text)?;
                Ok(emitted.marker)
            }
            Rewrite::BundleChannel => {
                let bundle = self.bundle(side)?;
                Ok(self.values(c).render(&bundle.host_channel))
            }
            Rewrite::Bundle { aggregate, slot } => {
                let bundle = self.bundle(side)?;
                let template: &Template = match (side, aggregate, c.call.form) {
                    (Side::Guest, Aggregate::Input, CallForm::Fill) => &bundle.guest_fill,
                    (Side::Guest, Aggregate::Input, CallForm::Value) => &bundle.guest_read,
                    (Side::Guest, Aggregate::Output, _) => &bundle.guest_commit,
                    (Side::Host, Aggregate::Input, _) => &bundle.host_write,
                    (Side::Host, Aggregate::Output, _) => &bundle.host_output,
                };
                Ok(self.values(c).with_slot(*slot).render(template))
            }
            Rewrite::Stub { value } => Ok(value.clone()),
            Rewrite::Neutral => {
                if in_statement_position(text, c.source_span) {
                    let semi = if c.source_span.slice(text).ends_with(';') { ";" } else { "" };
                    Ok(format!("(){semi}"))
                } else {
                    Ok("::core::default::Default::default()".to_string())
                }
            }
        }
    }

    fn bundle(&self, side: Side) -> Result<&zkport_platforms::BundleTemplates> {
        self.target
            .bundle
            .as_ref()
            .ok_or_else(|| self.missing(side, "bundle"))
    }

    fn missing(&self, side: Side, kind: &str) -> TransferError {
        TransferError::MissingTemplate {
            platform: self.target.id.to_string(),
            side,
            kind: kind.to_string(),
        }
    }
}

/// Start of the statement containing `pos`, moved to its line start when the
/// statement begins a line.
fn statement_start(text: &str, pos: usize) -> usize {
    let from = text[..pos]
        .rfind(|c| matches!(c, ';' | '{' | '}'))
        .map_or(0, |i| i + 1);
    match text[from..pos].rfind('\n') {
        Some(nl) => from + nl + 1,
        None => from,
    }
}

/// Offset just past the `;` ending the statement that contains `end`.
fn statement_end(text: &str, end: usize) -> usize {
    if text[..end].ends_with(';') {
        return end;
    }
    text[end..].find(';').map_or(end, |i| end + i + 1)
}

fn line_indent(text: &str, pos: usize) -> &str {
    let start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    let line = &text[start..];
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

/// The text of `span` with each child span replaced, children in order.
fn splice(text: &str, span: Span, children: &[(Span, String)]) -> String {
    let mut sorted: Vec<&(Span, String)> = children.iter().collect();
    sorted.sort_by_key(|(s, _)| s.start);
    let mut out = String::with_capacity(span.len());
    let mut cursor = span.start;
    for (child, replacement) in sorted {
        out.push_str(&text[cursor..child.start]);
        out.push_str(replacement);
        cursor = child.end;
    }
    out.push_str(&text[cursor..span.end]);
    out
}

/// Wrap a replacement that drops its arguments so nested constructs still
/// run: `{ let _ = (a, b,); value }`.
fn keep_evaluated(value: &str, nested: &[&str]) -> String {
    let (body, semi) = match value.strip_suffix(';') {
        Some(body) => (body, ";"),
        None => (value, ""),
    };
    format!("{{ let _ = ({},); {body} }}{semi}", nested.join(", "))
}

fn bucket_name(action: &Action) -> &'static str {
    match action {
        Action::DirectMap => "direct",
        Action::Adapt(_) => "adapted",
        Action::Unsupported(_) => "unsupported",
    }
}
