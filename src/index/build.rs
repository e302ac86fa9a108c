use crate::index::writer::SearchIndex;
use crate::utils::progress::LoadProgress;
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// One line of a JSON-lines document file
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRecord {
    pub key: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Drop the document instead of indexing it
    #[serde(default)]
    pub delete: bool,
}

/// Parse JSON-lines records. Blank lines are skipped.
pub fn parse_records(content: &str) -> Result<Vec<DocumentRecord>> {
    let lines: Vec<&str> = content.lines().collect();
    lines
        .par_iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid document on line {}", i + 1))
        })
        .collect()
}

/// Apply records to the index in file order
pub fn apply_records(index: &SearchIndex, records: &[DocumentRecord], silent: bool) -> usize {
    let progress = LoadProgress::new(records.len(), silent);

    let mut applied = 0;
    for record in records {
        if record.delete {
            index.delete_document(&record.key);
        } else {
            let values: Vec<(&str, &str)> = record
                .fields
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            index.add_document(&record.key, &values);
        }
        applied += 1;
        progress.record_applied();
    }

    progress.finish(applied);
    applied
}

/// Load a JSON-lines document file into the index
pub fn load_documents(index: &SearchIndex, path: &Path, silent: bool) -> Result<usize> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read documents from {}", path.display()))?;
    let records = parse_records(&content)?;
    let applied = apply_records(index, &records, silent);

    info!(
        path = %path.display(),
        records = applied,
        docs = index.doc_count(),
        "documents loaded"
    );
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::SearchConfig;

    #[test]
    fn test_parse_and_apply() {
        let content = r#"{"key": "doc1", "fields": {"t": "hello"}}

{"key": "doc2", "fields": {"t": "world"}}
{"key": "doc1", "delete": true}
"#;
        let records = parse_records(content).unwrap();
        assert_eq!(records.len(), 3);

        let index = SearchIndex::from_schema_str("t TEXT", SearchConfig::default()).unwrap();
        assert_eq!(apply_records(&index, &records, true), 3);
        assert_eq!(index.doc_count(), 1);
        assert!(index.doc_id("doc2").is_some());
    }

    #[test]
    fn test_parse_error_names_line() {
        let err = parse_records("{\"key\": \"a\"}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
