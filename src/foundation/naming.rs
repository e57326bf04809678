//! Identifier helpers shared by every model node.
//!
//! Output identifiers (data sources, signals, scales, marks) live in one flat namespace
//! per renderer scope, so each node qualifies its local names with its own name.

/// Sanitize `s` into a valid renderer identifier.
///
/// Every non-word character becomes `_`; a leading digit gets a `_` prefix.
pub fn var_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 1);
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        out.push('_');
    }
    out.extend(
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }),
    );
    out
}

/// Qualify `suffix` with a node name: `"<name>_<suffix>"`, or just `suffix` when the
/// name is empty.
pub fn qualify(name: &str, suffix: &str) -> String {
    if name.is_empty() {
        var_name(suffix)
    } else {
        var_name(&format!("{name}_{suffix}"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/naming.rs"]
mod tests;
