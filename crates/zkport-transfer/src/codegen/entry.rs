//! Entry point emission: markers, converted headers, and the wrapper that
//! streams a function-invocation entry's parameters.

use zkport_core::{Construct, ConstructKind, EntryCapture, Side};
use zkport_platforms::{EntryStyle, KindEntry, PlatformProfile, Template};

use super::render::{annotation, Values};
use crate::error::{Result, TransferError};
use crate::resolve::{Action, BundleLayout, Resolution};

/// Name of the synthesized streaming entry function.
const WRAPPER_NAME: &str = "main";

pub(super) struct EntryEmitter<'a> {
    pub source: &'a PlatformProfile,
    pub target: &'a PlatformProfile,
    pub layout: &'a BundleLayout,
}

/// Replacement text for the marker span and, if it changes, the header span.
pub(super) struct EntryText {
    pub marker: String,
    pub signature: Option<String>,
}

impl EntryEmitter<'_> {
    pub fn emit(&self, c: &Construct, r: &Resolution, text: &str) -> Result<EntryText> {
        let capture = c.call.entry.clone().unwrap_or_else(|| EntryCapture {
            name: WRAPPER_NAME.to_string(),
            params: Vec::new(),
            ret: None,
        });
        let header = c.signature_span.map(|s| s.slice(text).to_string());
        let entry = self.entry_kind()?;
        let marker_template = self.template(entry.marker.as_ref(), "entry-point marker")?;
        let note = match &r.action {
            Action::DirectMap => String::new(),
            other => annotation(&other.describe()),
        };
        let (from, to) = (self.source.entry_style, self.target.entry_style);

        if from == to {
            let marker = self.values(&capture.name, &capture).render(marker_template);
            return Ok(EntryText {
                marker,
                signature: None,
            });
        }

        let streaming_name = if from == EntryStyle::FunctionInvocation {
            WRAPPER_NAME
        } else {
            capture.name.as_str()
        };
        let marker = self.values(streaming_name, &capture).render(marker_template);

        let body_header = match (from, to) {
            (_, EntryStyle::FunctionInvocation) => {
                let bundle = self.target.bundle.as_ref().ok_or_else(|| self.missing("bundle signature"))?;
                self.values(&capture.name, &capture).render(&bundle.guest_signature)
            }
            (EntryStyle::FunctionInvocation, _) => {
                let wrapper = self.wrapper(&capture, entry)?;
                match &header {
                    Some(h) => format!("{wrapper}\n\n{h}"),
                    None => wrapper,
                }
            }
            _ => header.clone().unwrap_or_default(),
        };

        if to == EntryStyle::Macro {
            return Ok(EntryText {
                marker: format!("{marker}{note}"),
                signature: (from == EntryStyle::FunctionInvocation).then_some(body_header),
            });
        }
        Ok(EntryText {
            marker: note.trim_start().to_string(),
            signature: Some(format!("{marker}\n{body_header}")),
        })
    }

    /// `fn main() { let p: T = read; let __output = entry(p..); commit }`.
    fn wrapper(&self, capture: &EntryCapture, entry: &KindEntry) -> Result<String> {
        let signature = self.template(entry.signature.as_ref(), "entry-point signature")?;
        let guest = self.target.vocabulary(Side::Guest);
        let read = guest
            .get(ConstructKind::StructuredRead)
            .and_then(|e| e.template.as_ref())
            .ok_or_else(|| self.missing("structured-read"))?;

        let mut out = self.values(WRAPPER_NAME, capture).render(signature);
        out.push_str(" {\n");
        let mut names = Vec::with_capacity(capture.params.len());
        for p in &capture.params {
            let mut values = self.values(WRAPPER_NAME, capture);
            values.ty = Some(p.ty.clone());
            out.push_str(&format!("    let {}: {} = {};\n", p.name, p.ty, values.render(read)));
            names.push(p.name.trim_start_matches("mut ").trim().to_string());
        }
        let call = format!("{}({})", capture.name, names.join(", "));
        match &capture.ret {
            Some(ret) => {
                let commit = guest
                    .get(ConstructKind::StructuredCommit)
                    .and_then(|e| e.template.as_ref())
                    .ok_or_else(|| self.missing("structured-commit"))?;
                let mut values = self.values(WRAPPER_NAME, capture);
                values.ty = Some(ret.clone());
                values.arg_ref = "&__output".to_string();
                out.push_str(&format!("    let __output: {ret} = {call};\n"));
                out.push_str(&format!("    {};\n", values.render(commit)));
            }
            None => out.push_str(&format!("    {call};\n")),
        }
        out.push('}');
        Ok(out)
    }

    fn entry_kind(&self) -> Result<&KindEntry> {
        self.target
            .guest
            .get(ConstructKind::EntryPoint)
            .ok_or_else(|| self.missing("entry-point"))
    }

    fn template<'t>(&self, template: Option<&'t Template>, kind: &str) -> Result<&'t Template> {
        template.ok_or_else(|| self.missing(kind))
    }

    fn values(&self, entry: &str, capture: &EntryCapture) -> Values {
        Values::new(entry, self.layout).with_capture(capture)
    }

    fn missing(&self, kind: &str) -> TransferError {
        TransferError::MissingTemplate {
            platform: self.target.id.to_string(),
            side: Side::Guest,
            kind: kind.to_string(),
        }
    }
}
