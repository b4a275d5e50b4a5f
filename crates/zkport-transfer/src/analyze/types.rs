//! Just enough type-text inspection to decide whether a value is statically
//! bounded and how many bytes a raw payload occupies.

const SCALARS: &[(&str, usize)] = &[
    ("u8", 1),
    ("i8", 1),
    ("bool", 1),
    ("u16", 2),
    ("i16", 2),
    ("u32", 4),
    ("i32", 4),
    ("f32", 4),
    ("char", 4),
    ("u64", 8),
    ("i64", 8),
    ("f64", 8),
    ("u128", 16),
    ("i128", 16),
];

/// Whether `ty` has a size known from its text alone: scalars, `()`,
/// tuples and arrays of such with a literal length.
pub fn is_fixed_size(ty: &str) -> bool {
    fixed_shape(ty.trim()).is_some()
}

/// Byte size of a fixed-size type, ignoring padding between tuple fields.
pub fn byte_size(ty: &str) -> Option<usize> {
    fixed_shape(ty.trim())
}

fn fixed_shape(ty: &str) -> Option<usize> {
    if let Some((_, size)) = SCALARS.iter().find(|(name, _)| *name == ty) {
        return Some(*size);
    }
    if let Some(inner) = ty.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        let (elem, len) = inner.rsplit_once(';')?;
        let len: usize = len.trim().replace('_', "").parse().ok()?;
        return fixed_shape(elem.trim()).map(|s| s * len);
    }
    if let Some(inner) = ty.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        return split_types(inner)
            .into_iter()
            .map(fixed_shape)
            .sum::<Option<usize>>();
    }
    None
}

/// Split a comma-separated type list at depth zero.
fn split_types(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' | '[' | '<' => depth += 1,
            ')' | ']' | '>' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = list[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts.retain(|p| !p.is_empty());
    parts
}

/// Element type implied by a suffixed numeric literal such as `0u32`.
pub fn literal_type(literal: &str) -> Option<&'static str> {
    SCALARS
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| !matches!(*name, "bool" | "char"))
        .find(|name| literal.ends_with(name) && literal.len() > name.len())
}

/// Render a tuple type from its element types (`(A,)` for one element).
pub fn tuple_type(elems: &[String]) -> String {
    match elems {
        [] => "()".to_string(),
        [one] => format!("({one},)"),
        many => format!("({})", many.join(", ")),
    }
}
