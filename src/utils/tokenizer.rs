use crate::index::types::{FieldKind, FieldSpec};

/// Characters that split TEXT values into terms (whitespace also splits)
pub const TEXT_SEPARATORS: &str = ",.<>{}[]\"':;!@#$%^&*()-+=~/|?";

/// Maximum term length kept in the index.
/// Longer runs are almost always encoded blobs, not words.
const MAX_TERM_LENGTH: usize = 256;

#[inline]
fn is_text_separator(c: char) -> bool {
    c.is_whitespace() || TEXT_SEPARATORS.contains(c)
}

/// Split a TEXT value into lowercased terms.
///
/// A backslash makes the next character part of the current term even if it
/// is a separator. Output is sorted and deduplicated.
pub fn tokenize_text(value: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                current.extend(escaped.to_lowercase());
            }
            continue;
        }
        if is_text_separator(c) {
            flush(&mut current, &mut terms);
        } else {
            current.extend(c.to_lowercase());
        }
    }
    flush(&mut current, &mut terms);

    terms.sort_unstable();
    terms.dedup();
    terms
}

fn flush(current: &mut String, terms: &mut Vec<String>) {
    if !current.is_empty() && current.chars().count() <= MAX_TERM_LENGTH {
        terms.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// Split a TAG value on `separator`, trimming each tag.
///
/// Tags are lowercased unless `case_sensitive`. Output is sorted and
/// deduplicated.
pub fn tokenize_tag(value: &str, separator: char, case_sensitive: bool) -> Vec<String> {
    let mut tags: Vec<String> = value
        .split(separator)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            if case_sensitive {
                t.to_string()
            } else {
                t.to_lowercase()
            }
        })
        .collect();

    tags.sort_unstable();
    tags.dedup();
    tags
}

/// Terms a field value contributes to the index
pub fn tokenize_field(spec: &FieldSpec, value: &str) -> Vec<String> {
    match spec.kind {
        FieldKind::Text => tokenize_text(value),
        FieldKind::Tag => tokenize_tag(value, spec.separator, spec.is_case_sensitive()),
    }
}

/// Normalize a query literal the way values of `spec` were normalized
pub fn normalize_literal(spec: &FieldSpec, literal: &str) -> String {
    match spec.kind {
        FieldKind::Tag if spec.is_case_sensitive() => literal.to_string(),
        _ => literal.to_lowercase(),
    }
}
