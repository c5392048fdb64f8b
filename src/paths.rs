//! Path string rules shared by every batch script.
//!
//! Paths travel between the operator machine, job files and the host as plain
//! strings that may use either separator convention (`C:\proj\a.mp4`,
//! `C:/proj/a.mp4`, `file:///C:/proj/a.mp4`). They are therefore handled as
//! `&str` rather than `Path`, which would apply the local platform's rules.

/// UTF-8 byte-order mark as decoded text.
const BOM: char = '\u{feff}';

/// Prefix the host accepts for URI-style absolute references.
pub const FILE_URI_PREFIX: &str = "file:///";

/// Convert every backslash to a forward slash.
pub fn to_forward_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Convert every forward slash to a backslash.
pub fn to_back_slashes(path: &str) -> String {
    path.replace('/', "\\")
}

/// True when the second character is `:` (`C:`, `d:\x`, ...).
pub fn has_drive_prefix(path: &str) -> bool {
    path.chars().nth(1) == Some(':')
}

/// True when the string starts with `scheme://`.
fn has_uri_scheme(path: &str) -> bool {
    match path.find("://") {
        Some(idx) if idx >= 2 => path[..idx]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

/// Syntactic variants of `path`, in probe order.
///
/// 1. the literal string
/// 2. forward-slash form
/// 3. back-slash form
/// 4. `file:///` + forward-slash form, only for drive-letter paths
pub fn candidates_from_path(path: &str) -> Vec<String> {
    let forward = to_forward_slashes(path);
    let mut candidates = vec![path.to_string(), forward.clone(), to_back_slashes(path)];
    if has_drive_prefix(path) {
        candidates.push(format!("{}{}", FILE_URI_PREFIX, forward));
    }
    candidates
}

/// A path is absolute when it carries a URI scheme, a leading separator or a
/// drive letter.
pub fn is_absolute_path(path: &str) -> bool {
    has_uri_scheme(path)
        || path.starts_with('/')
        || path.starts_with('\\')
        || has_drive_prefix(path)
}

/// Join `base` and `leaf` with exactly one separator.
///
/// An empty base yields the leaf unchanged; a base already ending in either
/// separator is concatenated as-is, otherwise `/` is inserted.
pub fn join_paths(base: &str, leaf: &str) -> String {
    if base.is_empty() {
        return leaf.to_string();
    }
    if base.ends_with('/') || base.ends_with('\\') {
        format!("{}{}", base, leaf)
    } else {
        format!("{}/{}", base, leaf)
    }
}

/// Resolve `raw` against `base`.
///
/// Absolute inputs pass through unchanged, so the operation is idempotent on
/// its own absolute output. An empty `raw` resolves to an empty string and a
/// relative `raw` with no base is returned as-is.
pub fn resolve_path(raw: &str, base: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if is_absolute_path(raw) || base.is_empty() {
        return raw.to_string();
    }
    join_paths(base, raw)
}

/// Drop a leading byte-order mark, if any.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BOM).unwrap_or(text)
}
