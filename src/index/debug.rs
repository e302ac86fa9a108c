use crate::error::DebugError;
use crate::index::types::FieldKind;
use crate::index::writer::SearchIndex;
use std::collections::BTreeSet;

/// List the suffixes stored in a suffix trie, sorted.
///
/// With one argument, dumps that field's trie. Without arguments, dumps the
/// union of the tries of all TEXT fields.
pub fn dump_suffix_trie(index: &SearchIndex, args: &[&str]) -> Result<Vec<String>, DebugError> {
    match args {
        [] => {
            let mut union: BTreeSet<String> = BTreeSet::new();
            let mut found = false;
            for field in index.fields() {
                if field.spec().kind != FieldKind::Text {
                    continue;
                }
                if let Some(trie) = field.read().trie.as_ref() {
                    found = true;
                    union.extend(trie.dump());
                }
            }
            if !found {
                return Err(DebugError::NoSuffixTrie);
            }
            Ok(union.into_iter().collect())
        }
        [name] => {
            let field = index
                .field(name)
                .ok_or_else(|| DebugError::FieldNotFound(name.to_string()))?;
            let state = field.read();
            let trie = state.trie.as_ref().ok_or(DebugError::NoSuffixTrie)?;
            Ok(trie.dump())
        }
        _ => Err(DebugError::WrongArity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::SearchConfig;

    #[test]
    fn test_dump_field() {
        let index =
            SearchIndex::from_schema_str("t TAG WITHSUFFIXTRIE", SearchConfig::default()).unwrap();
        index.add_document("d", &[("t", "hello")]);
        assert_eq!(
            dump_suffix_trie(&index, &["t"]).unwrap(),
            vec!["ello", "hello", "llo", "lo"]
        );
        // A TAG trie is not part of the index-wide dump
        assert_eq!(dump_suffix_trie(&index, &[]), Err(DebugError::NoSuffixTrie));
    }

    #[test]
    fn test_dump_union_of_text_fields() {
        let index = SearchIndex::from_schema_str(
            "a TEXT WITHSUFFIXTRIE b TEXT WITHSUFFIXTRIE",
            SearchConfig::default(),
        )
        .unwrap();
        index.add_document("d", &[("a", "world"), ("b", "bold")]);
        assert_eq!(
            dump_suffix_trie(&index, &[]).unwrap(),
            vec!["bold", "ld", "old", "orld", "rld", "world"]
        );
    }

    #[test]
    fn test_dump_errors() {
        let index = SearchIndex::from_schema_str("t TEXT", SearchConfig::default()).unwrap();
        assert_eq!(dump_suffix_trie(&index, &["t"]), Err(DebugError::NoSuffixTrie));
        assert_eq!(
            dump_suffix_trie(&index, &["x"]),
            Err(DebugError::FieldNotFound("x".into()))
        );
        assert_eq!(dump_suffix_trie(&index, &["t", "x"]), Err(DebugError::WrongArity));
        assert_eq!(dump_suffix_trie(&index, &[]), Err(DebugError::NoSuffixTrie));
    }
}
