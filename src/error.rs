//! Error types for schema declaration, querying, introspection and configuration.
//!
//! Every failure is local to the operation that triggered it. Nothing here is
//! retried automatically and none of these errors leave the index in a
//! partially mutated state.

use thiserror::Error;

/// Errors raised while declaring a schema
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A modifier appeared after `SORTABLE` (only `UNF` may follow it)
    #[error("Field `{field}`: {option} must be declared before SORTABLE")]
    OrderViolation { field: String, option: String },

    #[error("Field `{field}`: unknown field type `{kind}`")]
    UnknownType { field: String, kind: String },

    #[error("Field `{field}`: unknown option `{option}`")]
    UnknownOption { field: String, option: String },

    #[error("Field `{field}`: option `{option}` expects a value")]
    MissingValue { field: String, option: String },

    #[error("Field `{field}`: invalid value `{value}` for `{option}`")]
    InvalidValue {
        field: String,
        option: String,
        value: String,
    },

    #[error("Duplicate field `{0}` in schema")]
    DuplicateField(String),

    #[error("Schema must declare at least one field")]
    Empty,
}

/// Errors raised while evaluating a wildcard query
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unknown field `{0}`")]
    UnknownField(String),

    #[error("Contains query on fields without WITHSUFFIXTRIE support (field `{0}`)")]
    FieldHasNoSuffixTrie(String),

    #[error("Maximum expansions of {limit} reached for pattern `{pattern}`")]
    ExpansionLimitExceeded { pattern: String, limit: usize },

    #[error("Timeout limit was reached")]
    Timeout,

    #[error("Literal `{literal}` is shorter than the minimum prefix length {min}")]
    LiteralTooShort { literal: String, min: usize },

    #[error("No such parameter `{0}`")]
    UnknownParameter(String),

    #[error("Empty query")]
    EmptyPattern,

    #[error("Invalid pattern `{0}`: `*` is only allowed at the start or end")]
    InvalidPattern(String),
}

/// Errors raised by the suffix trie dump
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DebugError {
    #[error("Could not find given field in index spec")]
    FieldNotFound(String),

    #[error("Index does not have suffix trie")]
    NoSuffixTrie,

    #[error("wrong number of arguments")]
    WrongArity,
}

/// Errors raised while loading or changing configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown configuration option `{0}`")]
    UnknownOption(String),

    #[error("Invalid value `{value}` for configuration option `{option}`")]
    InvalidValue { option: String, value: String },
}

/// Umbrella error for callers that do not care which stage failed
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Debug(#[from] DebugError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_wire_text() {
        assert!(
            QueryError::FieldHasNoSuffixTrie("t2".into())
                .to_string()
                .contains("Contains query on fields without WITHSUFFIXTRIE support")
        );
        assert_eq!(QueryError::Timeout.to_string(), "Timeout limit was reached");
        assert_eq!(
            DebugError::FieldNotFound("x".into()).to_string(),
            "Could not find given field in index spec"
        );
        assert_eq!(DebugError::WrongArity.to_string(), "wrong number of arguments");
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: Error = QueryError::Timeout.into();
        assert!(matches!(err, Error::Query(QueryError::Timeout)));
    }
}
