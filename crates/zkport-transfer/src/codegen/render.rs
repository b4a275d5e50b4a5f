//! Placeholder values and small text helpers for template instantiation.

use zkport_core::{Construct, EntryCapture, Span};
use zkport_platforms::Template;

use crate::resolve::BundleLayout;

/// Values for every known placeholder of one instantiation.
#[derive(Debug, Clone, Default)]
pub(crate) struct Values {
    pub ty: Option<String>,
    pub args: String,
    pub arg_ref: String,
    pub dst: Option<String>,
    pub recv: String,
    pub entry: String,
    pub params: String,
    pub slot: Option<usize>,
    pub input_ty: String,
    pub output_ty: String,
    pub input: String,
}

impl Values {
    pub fn new(entry: &str, layout: &BundleLayout) -> Self {
        Self {
            entry: entry.to_string(),
            input_ty: layout.input_ty(),
            output_ty: layout.output_ty(),
            ..Self::default()
        }
    }

    pub fn with_construct(mut self, c: &Construct) -> Self {
        let args = c.call.args.clone().unwrap_or_default();
        self.ty = c.declared_type.clone();
        self.arg_ref = arg_ref(&args);
        self.args = args;
        self.dst = c.call.dst.clone();
        self.recv = c.call.receiver.clone().unwrap_or_default();
        self
    }

    pub fn with_capture(mut self, capture: &EntryCapture) -> Self {
        self.params = params(capture);
        self
    }

    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn get(&self, name: &str) -> String {
        match name {
            "ty" => self.ty.clone().unwrap_or_else(|| "_".to_string()),
            "args" => self.args.clone(),
            "arg_ref" => self.arg_ref.clone(),
            "dst" => self.dst.clone().unwrap_or_else(|| "_".to_string()),
            "recv" => self.recv.clone(),
            "entry" => self.entry.clone(),
            "params" => self.params.clone(),
            "slot" => self.slot.map(|s| s.to_string()).unwrap_or_default(),
            "input_ty" => self.input_ty.clone(),
            "output_ty" => self.output_ty.clone(),
            "input" => self.input.clone(),
            _ => String::new(),
        }
    }

    pub fn render(&self, template: &Template) -> String {
        template.render(|name| self.get(name))
    }
}

/// The first argument as a reference expression.
pub(crate) fn arg_ref(args: &str) -> String {
    let first = first_argument(args);
    if first.is_empty() || first.starts_with('&') {
        first.to_string()
    } else {
        format!("&{first}")
    }
}

fn first_argument(args: &str) -> &str {
    let mut depth = 0i32;
    for (i, c) in args.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => return args[..i].trim(),
            _ => {}
        }
    }
    args.trim()
}

/// `name: ty` pairs of an entry header, comma separated.
pub(crate) fn params(capture: &EntryCapture) -> String {
    capture
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inline note following an adapted or unsupported construct.
pub(crate) fn annotation(note: &str) -> String {
    format!(" /* zkport: {} */", note.replace("*/", "* /"))
}

/// Whether the construct at `span` is a whole expression statement.
pub(crate) fn in_statement_position(text: &str, span: Span) -> bool {
    if span.slice(text).ends_with(';') {
        return true;
    }
    let after = text[span.end..].trim_start();
    let before = text[..span.start].trim_end();
    after.starts_with(';')
        && (before.is_empty() || before.ends_with(';') || before.ends_with('{') || before.ends_with('}'))
}
