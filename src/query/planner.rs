use crate::error::QueryError;
use crate::index::types::{FieldKind, SearchConfig};
use crate::index::writer::SearchIndex;
use crate::query::parser::{PatternKind, WildcardQuery};
use crate::utils::normalize_literal;

/// Query execution plan: one step per field searched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub kind: PatternKind,
    pub steps: Vec<PlanStep>,
}

/// Per-field lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    /// Field position in the schema
    pub field: usize,
    /// Literal normalized for the field
    pub literal: String,
    pub source: StepSource,
}

/// Which structure answers a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSource {
    /// Term dictionary point lookup
    DictionaryExact,
    /// Term dictionary range scan
    DictionaryPrefix,
    /// Terminal set of the node spelled by the literal
    SuffixExact,
    /// Every terminal below the node spelled by the literal
    SuffixSubtree,
    /// Filter every dictionary term
    DictionaryScan,
}

impl QueryPlan {
    /// Plan `query` against `index`.
    ///
    /// Prefix and exact lookups always go to the term dictionary. Suffix and
    /// contains lookups use the field's suffix trie. Without a trie, a
    /// field-scoped one on a TEXT field is an error; tag fields and unscoped
    /// queries scan the field's dictionary instead.
    pub fn build(
        index: &SearchIndex,
        query: &WildcardQuery,
        config: &SearchConfig,
    ) -> Result<Self, QueryError> {
        let kind = query.pattern.kind;
        let literal = &query.pattern.literal;

        if kind != PatternKind::Exact && literal.chars().count() < config.min_prefix {
            return Err(QueryError::LiteralTooShort {
                literal: literal.clone(),
                min: config.min_prefix,
            });
        }

        let targets: Vec<usize> = match &query.field {
            Some(name) => vec![
                index
                    .field_position(name)
                    .ok_or_else(|| QueryError::UnknownField(name.clone()))?,
            ],
            None => index
                .fields()
                .iter()
                .enumerate()
                .filter(|(_, f)| f.spec().kind == FieldKind::Text)
                .map(|(pos, _)| pos)
                .collect(),
        };

        let mut steps = Vec::with_capacity(targets.len());
        for pos in targets {
            let spec = index.fields()[pos].spec();
            let literal = normalize_literal(spec, literal);

            let source = match kind {
                PatternKind::Exact => StepSource::DictionaryExact,
                PatternKind::Prefix => StepSource::DictionaryPrefix,
                PatternKind::Suffix | PatternKind::Contains => {
                    if !spec.has_suffix_trie() {
                        if query.field.is_some() && spec.kind == FieldKind::Text {
                            return Err(QueryError::FieldHasNoSuffixTrie(spec.name.clone()));
                        }
                        StepSource::DictionaryScan
                    } else if literal.chars().count() < spec.min_suffix_len {
                        // Shorter than anything the trie stores
                        StepSource::DictionaryScan
                    } else if kind == PatternKind::Suffix {
                        StepSource::SuffixExact
                    } else {
                        StepSource::SuffixSubtree
                    }
                }
            };

            steps.push(PlanStep {
                field: pos,
                literal,
                source,
            });
        }

        Ok(Self { kind, steps })
    }
}
