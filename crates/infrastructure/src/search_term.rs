//! Escaping for client-supplied `ILIKE` search terms.

/// Wraps a search term in `%` wildcards, escaping any `%`, `_`, or `\`
/// the client supplied so they match literally instead of acting as
/// pattern metacharacters.
pub(crate) fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
