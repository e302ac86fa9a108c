use crate::error::QueryError;
use memchr::memchr;
use std::borrow::Cow;
use std::collections::HashMap;

/// Parsed wildcard query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardQuery {
    /// `@field:` scope, `None` for all TEXT fields
    pub field: Option<String>,
    pub pattern: Pattern,
    /// Input as given, used in error messages
    pub raw: String,
}

/// What a pattern asks for, decided by its unescaped leading/trailing stars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `lit`
    Exact,
    /// `lit*`
    Prefix,
    /// `*lit`
    Suffix,
    /// `*lit*`
    Contains,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Exact => "exact",
            PatternKind::Prefix => "prefix",
            PatternKind::Suffix => "suffix",
            PatternKind::Contains => "contains",
        }
    }

    /// Whether `term` satisfies a pattern of this kind with `literal`
    pub fn matches(&self, term: &str, literal: &str) -> bool {
        match self {
            PatternKind::Exact => term == literal,
            PatternKind::Prefix => term.starts_with(literal),
            PatternKind::Suffix => term.ends_with(literal),
            PatternKind::Contains => term.contains(literal),
        }
    }
}

/// Classified pattern. `literal` has its escapes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub literal: String,
}

/// Parse a query string without parameters
pub fn parse_query(input: &str) -> Result<WildcardQuery, QueryError> {
    parse_query_with_params(input, &HashMap::new())
}

/// Parse a query string, substituting `$name` placeholders first
pub fn parse_query_with_params(
    input: &str,
    params: &HashMap<String, String>,
) -> Result<WildcardQuery, QueryError> {
    let raw = input.to_string();
    let (field, body) = split_field_scope(input.trim())?;
    let body = strip_braces(body);
    let body = substitute_params(body, params)?;
    let pattern = classify(&body)?;

    Ok(WildcardQuery {
        field: field.map(str::to_string),
        pattern,
        raw,
    })
}

/// Split `@field:rest` into its parts
fn split_field_scope(input: &str) -> Result<(Option<&str>, &str), QueryError> {
    let Some(scoped) = input.strip_prefix('@') else {
        return Ok((None, input));
    };
    match scoped.split_once(':') {
        Some((field, rest)) if !field.is_empty() => Ok((Some(field), rest.trim_start())),
        _ => Err(QueryError::InvalidPattern(input.to_string())),
    }
}

/// Tag syntax: `{pattern}`
fn strip_braces(body: &str) -> &str {
    match body.strip_prefix('{').and_then(|b| b.strip_suffix('}')) {
        Some(inner) if !inner.ends_with('\\') => inner.trim(),
        _ => body,
    }
}

#[inline]
fn is_param_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Replace `$name` placeholders. Substituted values are escaped so their
/// characters are always literal. Escaped `\$` is left alone.
pub fn substitute_params<'a>(
    body: &'a str,
    params: &HashMap<String, String>,
) -> Result<Cow<'a, str>, QueryError> {
    if memchr(b'$', body.as_bytes()).is_none() {
        return Ok(Cow::Borrowed(body));
    }

    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            }
            '$' => {
                let start = i + 1;
                let mut end = start;
                while let Some(&(j, next)) = chars.peek() {
                    if !is_param_char(next) {
                        break;
                    }
                    end = j + next.len_utf8();
                    chars.next();
                }
                if end == start {
                    out.push('$');
                    continue;
                }
                let name = &body[start..end];
                let value = params
                    .get(name)
                    .ok_or_else(|| QueryError::UnknownParameter(name.to_string()))?;
                for v in value.chars() {
                    if v == '*' || v == '\\' {
                        out.push('\\');
                    }
                    out.push(v);
                }
            }
            _ => out.push(c),
        }
    }

    Ok(Cow::Owned(out))
}

/// Classify a pattern body by its unescaped stars and strip escapes
pub fn classify(body: &str) -> Result<Pattern, QueryError> {
    // (char, escaped)
    let mut chars: Vec<(char, bool)> = Vec::with_capacity(body.len());
    let mut iter = body.chars();
    while let Some(c) = iter.next() {
        if c == '\\' {
            match iter.next() {
                Some(escaped) => chars.push((escaped, true)),
                None => chars.push(('\\', true)),
            }
        } else {
            chars.push((c, false));
        }
    }

    let is_star = |&(c, escaped): &(char, bool)| c == '*' && !escaped;
    let leading = chars.iter().take_while(|c| is_star(c)).count();
    let rest = &chars[leading..];
    let trailing = rest.iter().rev().take_while(|c| is_star(c)).count();
    let core = &rest[..rest.len() - trailing];

    if core.is_empty() {
        return Err(QueryError::EmptyPattern);
    }
    if core.iter().any(is_star) {
        return Err(QueryError::InvalidPattern(body.to_string()));
    }

    let kind = match (leading > 0, trailing > 0) {
        (false, false) => PatternKind::Exact,
        (false, true) => PatternKind::Prefix,
        (true, false) => PatternKind::Suffix,
        (true, true) => PatternKind::Contains,
    };

    Ok(Pattern {
        kind,
        literal: core.iter().map(|&(c, _)| c).collect(),
    })
}
