use crate::error::{ConfigError, SchemaError};
use crate::index::field::FieldIndex;
use crate::index::gc::GarbageCollector;
use crate::index::schema::parse_schema_str;
use crate::index::types::*;
use crate::utils::tokenize_field;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// Terms a stored document contributed, per field position
#[derive(Debug, Clone)]
pub(crate) struct StoredDoc {
    pub key: String,
    pub terms: Vec<Vec<String>>,
}

/// Key <-> id mapping and the terms each live document holds
#[derive(Debug, Default)]
pub(crate) struct DocTable {
    pub ids: FxHashMap<String, DocId>,
    pub docs: FxHashMap<DocId, StoredDoc>,
    next_id: DocId,
}

impl DocTable {
    fn allocate(&mut self, key: &str) -> DocId {
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(key.to_string(), id);
        id
    }
}

/// In-memory index over a fixed schema
///
/// Writers serialize on the document table, then take each touched field's
/// lock in schema order. Readers only ever hold one field lock at a time.
#[derive(Debug)]
pub struct SearchIndex {
    pub(crate) fields: Vec<FieldIndex>,
    pub(crate) docs: RwLock<DocTable>,
    config: RwLock<SearchConfig>,
    pub(crate) gc: GarbageCollector,
}

impl SearchIndex {
    /// Create an index. Every field's minimum stored suffix length is taken
    /// from `config.min_prefix`.
    pub fn new(schema: Vec<FieldSpec>, config: SearchConfig) -> Self {
        let fields = schema
            .into_iter()
            .map(|mut spec| {
                spec.min_suffix_len = config.min_prefix.max(1);
                FieldIndex::new(spec)
            })
            .collect();

        Self {
            fields,
            docs: RwLock::new(DocTable::default()),
            config: RwLock::new(config),
            gc: GarbageCollector::new(),
        }
    }

    pub fn from_schema_str(schema: &str, config: SearchConfig) -> Result<Self, SchemaError> {
        Ok(Self::new(parse_schema_str(schema)?, config))
    }

    /// Current configuration
    pub fn config(&self) -> SearchConfig {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: SearchConfig) {
        *self.config.write() = config;
    }

    /// Change one runtime option. `MINPREFIX` only affects queries; tries
    /// keep the suffix length they were created with.
    pub fn set_option(&self, name: &str, value: &str) -> Result<(), ConfigError> {
        self.config.write().set_option(name, value)?;
        debug!(option = name, value, "configuration changed");
        Ok(())
    }

    pub(crate) fn field_position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Add or replace a document.
    ///
    /// Replacing keeps the document id and only touches terms that changed.
    /// Values for undeclared fields are ignored.
    pub fn add_document(&self, key: &str, values: &[(&str, &str)]) -> DocId {
        let mut new_terms: Vec<Vec<String>> = vec![Vec::new(); self.fields.len()];
        for (name, value) in values {
            match self.field_position(name) {
                Some(pos) => {
                    new_terms[pos].extend(tokenize_field(self.fields[pos].spec(), value))
                }
                None => trace!(key, field = name, "ignoring undeclared field"),
            }
        }
        for terms in &mut new_terms {
            terms.sort_unstable();
            terms.dedup();
        }

        let mut docs = self.docs.write();
        let existing = docs.ids.get(key).copied();
        let (doc_id, old_terms) = match existing {
            Some(id) => {
                let old = docs
                    .docs
                    .remove(&id)
                    .map(|d| d.terms)
                    .unwrap_or_else(|| vec![Vec::new(); self.fields.len()]);
                (id, old)
            }
            None => (docs.allocate(key), vec![Vec::new(); self.fields.len()]),
        };

        for (pos, field) in self.fields.iter().enumerate() {
            let (removed, added) = diff_sorted(&old_terms[pos], &new_terms[pos]);
            if !removed.is_empty() || !added.is_empty() {
                field.apply(doc_id, &removed, &added);
            }
        }

        debug!(
            key,
            doc_id,
            replaced = existing.is_some(),
            terms = new_terms.iter().map(Vec::len).sum::<usize>(),
            "indexed document"
        );

        docs.docs.insert(
            doc_id,
            StoredDoc {
                key: key.to_string(),
                terms: new_terms,
            },
        );
        doc_id
    }

    /// Delete a document, returns false if the key is unknown
    pub fn delete_document(&self, key: &str) -> bool {
        let mut docs = self.docs.write();
        let Some(doc_id) = docs.ids.remove(key) else {
            return false;
        };
        let Some(stored) = docs.docs.remove(&doc_id) else {
            return false;
        };

        for (field, terms) in self.fields.iter().zip(&stored.terms) {
            if !terms.is_empty() {
                let removed: Vec<&str> = terms.iter().map(String::as_str).collect();
                field.apply(doc_id, &removed, &[]);
            }
        }

        debug!(key, doc_id, "deleted document");
        true
    }

    /// Stale terms waiting for collection, summed over fields
    pub fn pending_stale(&self) -> usize {
        self.fields.iter().map(|f| f.read().pending_stale).sum()
    }
}

/// Walk two sorted, deduplicated lists and split them into
/// (only in `old`, only in `new`)
fn diff_sorted<'a>(old: &'a [String], new: &'a [String]) -> (Vec<&'a str>, Vec<&'a str>) {
    let mut removed = Vec::new();
    let mut added = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < old.len() && j < new.len() {
        match old[i].cmp(&new[j]) {
            std::cmp::Ordering::Less => {
                removed.push(old[i].as_str());
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                added.push(new[j].as_str());
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    removed.extend(old[i..].iter().map(String::as_str));
    added.extend(new[j..].iter().map(String::as_str));

    (removed, added)
}
