//! Call shapes: the lexical patterns that recognize a construct.
//!
//! Shapes are written as strings in platform rows:
//!
//! | text                          | matches                                        |
//! |-------------------------------|------------------------------------------------|
//! | `sp1_zkvm::io::read`          | a call whose canonical path is exactly this    |
//! | `guest::build_prover_*`       | last segment starting with `build_prover_`     |
//! | `macro:sp1_zkvm::entrypoint`  | `entrypoint!(...)` macro invocation            |
//! | `attr:jolt::provable`         | `#[jolt::provable]` attribute                  |
//! | `method:a::Ctor::new.write`   | `.write(...)` on a value built by `a::Ctor::new` |
//! | `method:*.public_output`      | `.public_output(...)` on any receiver          |
//! | `field:public_values.read`    | `<recv>.public_values.read(...)`               |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Receiver constraint of a method shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// The receiver must be bound from (or chained on) this constructor path.
    Constructed(String),
    Any,
}

/// A recognizable call shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CallShape {
    Path(String),
    Macro(String),
    Attribute(String),
    Method { receiver: Receiver, method: String },
    Field { field: String, method: String },
}

impl CallShape {
    /// Whether a canonical call path matches a `Path` shape.
    pub fn matches_path(&self, canonical: &str) -> bool {
        match self {
            CallShape::Path(pattern) => path_matches(pattern, canonical),
            _ => false,
        }
    }

    pub fn matches_macro(&self, canonical: &str) -> bool {
        matches!(self, CallShape::Macro(p) if p == canonical)
    }

    pub fn matches_attribute(&self, canonical: &str) -> bool {
        matches!(self, CallShape::Attribute(p) if p == canonical)
    }

    /// Whether `.method(...)` on a receiver built by `ctor` (if known) matches.
    pub fn matches_method(&self, ctor: Option<&str>, method: &str) -> bool {
        match self {
            CallShape::Method {
                receiver,
                method: m,
            } if m == method => match receiver {
                Receiver::Any => true,
                Receiver::Constructed(path) => ctor == Some(path.as_str()),
            },
            _ => false,
        }
    }

    pub fn matches_field(&self, field: &str, method: &str) -> bool {
        matches!(self, CallShape::Field { field: f, method: m } if f == field && m == method)
    }

    /// Constructor path a method shape binds its receiver to.
    pub fn constructor(&self) -> Option<&str> {
        match self {
            CallShape::Method {
                receiver: Receiver::Constructed(path),
                ..
            } => Some(path),
            _ => None,
        }
    }
}

fn path_matches(pattern: &str, canonical: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => canonical
            .strip_prefix(prefix)
            .is_some_and(|rest| !rest.is_empty() && !rest.contains("::")),
        None => pattern == canonical,
    }
}

fn valid_path(path: &str) -> bool {
    !path.is_empty()
        && path.split("::").all(|seg| {
            let seg = seg.strip_suffix('*').unwrap_or(seg);
            !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
        && path.matches('*').count() <= 1
        && (!path.contains('*') || path.ends_with('*'))
}

impl TryFrom<String> for CallShape {
    type Error = PlatformError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        let invalid = |detail: &str| PlatformError::InvalidShape {
            shape: text.clone(),
            detail: detail.to_string(),
        };

        let shape = if let Some(path) = text.strip_prefix("macro:") {
            CallShape::Macro(path.to_string())
        } else if let Some(path) = text.strip_prefix("attr:") {
            CallShape::Attribute(path.to_string())
        } else if let Some(rest) = text.strip_prefix("method:") {
            let (recv, method) = rest
                .rsplit_once('.')
                .ok_or_else(|| invalid("expected `<receiver>.<method>`"))?;
            let receiver = if recv == "*" {
                Receiver::Any
            } else {
                Receiver::Constructed(recv.to_string())
            };
            CallShape::Method {
                receiver,
                method: method.to_string(),
            }
        } else if let Some(rest) = text.strip_prefix("field:") {
            let (field, method) = rest
                .split_once('.')
                .ok_or_else(|| invalid("expected `<field>.<method>`"))?;
            CallShape::Field {
                field: field.to_string(),
                method: method.to_string(),
            }
        } else {
            CallShape::Path(text.clone())
        };

        let ok = match &shape {
            CallShape::Path(p) => valid_path(p),
            CallShape::Macro(p) | CallShape::Attribute(p) => valid_path(p) && !p.contains('*'),
            CallShape::Method { receiver, method } => {
                let recv_ok = match receiver {
                    Receiver::Any => true,
                    Receiver::Constructed(p) => valid_path(p) && !p.contains('*'),
                };
                recv_ok && valid_path(method) && !method.contains("::") && !method.contains('*')
            }
            CallShape::Field { field, method } => {
                valid_path(field) && valid_path(method) && !field.contains(':') && !method.contains(':')
            }
        };
        if !ok {
            return Err(invalid("paths must be `::`-separated identifiers"));
        }
        Ok(shape)
    }
}

impl From<CallShape> for String {
    fn from(shape: CallShape) -> Self {
        shape.to_string()
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallShape::Path(p) => write!(f, "{p}"),
            CallShape::Macro(p) => write!(f, "macro:{p}"),
            CallShape::Attribute(p) => write!(f, "attr:{p}"),
            CallShape::Method { receiver, method } => match receiver {
                Receiver::Any => write!(f, "method:*.{method}"),
                Receiver::Constructed(p) => write!(f, "method:{p}.{method}"),
            },
            CallShape::Field { field, method } => write!(f, "field:{field}.{method}"),
        }
    }
}
