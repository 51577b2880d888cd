//! Table-name convention for gateway types.

/// Strip any `::` path qualifiers from a type name.
pub fn short_type_name(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

/// Derive a table name from a gateway type name.
///
/// The first character is lower-cased, an underscore goes before every
/// remaining ASCII capital, and the result is lower-cased. Consecutive
/// capitals are each separated: `VATRate` becomes `v_a_t_rate`.
pub fn derive_table_name(type_name: &str) -> String {
    let name = short_type_name(type_name);
    let mut out = String::with_capacity(name.len() + 4);
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        out.push(first.to_ascii_lowercase());
    }
    for c in chars {
        if c.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}
