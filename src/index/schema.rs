//! Schema declaration
//!
//! Parses `FT.CREATE`-style field groups: `name TYPE [options...]`, repeated.
//! Options are consumed while they are known keywords for the current field
//! type. Any other token must start the next field (a name that is not an
//! all-caps keyword, followed by a type); otherwise it is an unknown option.
//!
//! `SORTABLE` must be the last modifier of a field. Only `UNF` may follow it.

use crate::error::SchemaError;
use crate::index::types::{FieldFlags, FieldKind, FieldSpec};

/// Parse a whitespace-separated schema string
pub fn parse_schema_str(schema: &str) -> Result<Vec<FieldSpec>, SchemaError> {
    let args: Vec<&str> = schema.split_whitespace().collect();
    parse_schema(&args)
}

/// Parse schema arguments into field specs
pub fn parse_schema(args: &[&str]) -> Result<Vec<FieldSpec>, SchemaError> {
    let mut parser = SchemaParser::new(args);
    parser.parse()
}

struct SchemaParser<'a> {
    args: &'a [&'a str],
    pos: usize,
}

impl<'a> SchemaParser<'a> {
    fn new(args: &'a [&'a str]) -> Self {
        Self { args, pos: 0 }
    }

    fn parse(&mut self) -> Result<Vec<FieldSpec>, SchemaError> {
        let mut fields: Vec<FieldSpec> = Vec::new();

        // Leading SCHEMA keyword is optional
        if self.peek().is_some_and(|a| a.eq_ignore_ascii_case("SCHEMA")) {
            self.advance();
        }

        while let Some(name) = self.next() {
            let field = self.parse_field(name)?;
            if fields.iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField(field.name));
            }
            fields.push(field);
        }

        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }
        Ok(fields)
    }

    fn parse_field(&mut self, name: &str) -> Result<FieldSpec, SchemaError> {
        let kind_str = self.next().ok_or_else(|| SchemaError::MissingValue {
            field: name.to_string(),
            option: "type".to_string(),
        })?;

        let kind = parse_kind(kind_str).ok_or_else(|| SchemaError::UnknownType {
            field: name.to_string(),
            kind: kind_str.to_string(),
        })?;

        let mut spec = FieldSpec::new(name, kind);
        let mut sortable_seen = false;

        while let Some(token) = self.peek() {
            let upper = token.to_ascii_uppercase();
            let option = match (kind, upper.as_str()) {
                (_, "SORTABLE") => FieldOption::Flag(FieldFlags::SORTABLE),
                (_, "UNF") => FieldOption::Flag(FieldFlags::UNF),
                (_, "WITHSUFFIXTRIE") => FieldOption::Flag(FieldFlags::WITH_SUFFIX_TRIE),
                (FieldKind::Text, "NOSTEM") => FieldOption::Flag(FieldFlags::NOSTEM),
                // Preserving case implies UNF
                (FieldKind::Tag, "CASESENSITIVE") => {
                    FieldOption::Flag(FieldFlags::CASE_SENSITIVE | FieldFlags::UNF)
                }
                (FieldKind::Text, "WEIGHT") => FieldOption::Weight,
                (FieldKind::Tag, "SEPARATOR") => FieldOption::Separator,
                _ if self.starts_field() => break,
                _ => {
                    return Err(SchemaError::UnknownOption {
                        field: name.to_string(),
                        option: token.to_string(),
                    });
                }
            };
            self.advance();

            if sortable_seen && upper != "UNF" {
                return Err(SchemaError::OrderViolation {
                    field: name.to_string(),
                    option: upper,
                });
            }

            match option {
                FieldOption::Flag(flag) => {
                    spec.flags.set(flag);
                    sortable_seen |= flag == FieldFlags::SORTABLE;
                }
                FieldOption::Weight => {
                    let value = self.option_value(name, "WEIGHT")?;
                    spec.weight = value
                        .parse::<f64>()
                        .ok()
                        .filter(|w| *w >= 0.0)
                        .ok_or_else(|| invalid(name, "WEIGHT", value))?;
                }
                FieldOption::Separator => {
                    let value = self.option_value(name, "SEPARATOR")?;
                    let mut chars = value.chars();
                    spec.separator = match (chars.next(), chars.next()) {
                        (Some(c), None) if !c.is_alphanumeric() => c,
                        _ => return Err(invalid(name, "SEPARATOR", value)),
                    };
                }
            }
        }

        Ok(spec)
    }

    /// Whether the token under the cursor opens the next field: a name that
    /// does not look like an option keyword, followed by a field type.
    fn starts_field(&self) -> bool {
        let Some(name) = self.peek() else {
            return false;
        };
        !looks_like_keyword(name)
            && self
                .args
                .get(self.pos + 1)
                .is_some_and(|kind| parse_kind(kind).is_some())
    }

    fn option_value(&mut self, field: &str, option: &str) -> Result<&'a str, SchemaError> {
        self.next().ok_or_else(|| SchemaError::MissingValue {
            field: field.to_string(),
            option: option.to_string(),
        })
    }

    fn peek(&self) -> Option<&'a str> {
        self.args.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        let arg = self.peek()?;
        self.advance();
        Some(arg)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

enum FieldOption {
    Flag(u16),
    Weight,
    Separator,
}

fn parse_kind(token: &str) -> Option<FieldKind> {
    match token.to_ascii_uppercase().as_str() {
        "TEXT" => Some(FieldKind::Text),
        "TAG" => Some(FieldKind::Tag),
        _ => None,
    }
}

/// All-caps words are reserved for options, so a misspelled option is
/// reported instead of starting a new field
fn looks_like_keyword(token: &str) -> bool {
    token.len() > 1
        && token.chars().any(|c| c.is_ascii_uppercase())
        && token.chars().all(|c| c.is_ascii_uppercase() || c == '_')
}

fn invalid(field: &str, option: &str, value: &str) -> SchemaError {
    SchemaError::InvalidValue {
        field: field.to_string(),
        option: option.to_string(),
        value: value.to_string(),
    }
}
