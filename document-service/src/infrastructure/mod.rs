pub mod attachment;
pub mod cache;
pub mod department;
pub mod document;
pub mod password;
pub mod signature;
pub mod token;
pub mod user;

/// Postgres counts are `BIGINT`; negative values never occur.
pub(crate) fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// Escapes `ILIKE` wildcards so user input matches literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
