use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Internal identifier for a document in the index
pub type DocId = u32;

/// Default minimum literal length before wildcard expansion is attempted
pub const DEFAULT_MIN_PREFIX: usize = 2;

/// Default cap on distinct terms a single wildcard may expand to
pub const DEFAULT_MAX_EXPANSIONS: usize = 200;

/// Default query time budget in milliseconds (0 = unlimited)
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// Default number of stale entries before a sweep is worthwhile
pub const DEFAULT_GC_CLEAN_THRESHOLD: usize = 100;

/// Default interval between background collector runs
pub const DEFAULT_GC_INTERVAL_MS: u64 = 30_000;

/// Default number of node removals applied per exclusive merge window
pub const DEFAULT_GC_MERGE_BATCH: usize = 1024;

/// Default tag separator
pub const DEFAULT_TAG_SEPARATOR: char = ',';

/// Field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Tag,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "TEXT",
            FieldKind::Tag => "TAG",
        }
    }
}

/// Field option flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldFlags(pub u16);

impl FieldFlags {
    pub const NONE: u16 = 0;
    pub const SORTABLE: u16 = 1 << 0;
    pub const NOSTEM: u16 = 1 << 1;
    pub const CASE_SENSITIVE: u16 = 1 << 2;
    pub const UNF: u16 = 1 << 3;
    pub const WITH_SUFFIX_TRIE: u16 = 1 << 4;

    pub fn new() -> Self {
        Self(Self::NONE)
    }

    pub fn has(&self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u16) {
        self.0 |= flag;
    }

    pub fn is_sortable(&self) -> bool {
        self.has(Self::SORTABLE)
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.has(Self::CASE_SENSITIVE)
    }

    pub fn has_suffix_trie(&self) -> bool {
        self.has(Self::WITH_SUFFIX_TRIE)
    }
}

/// A declared field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub flags: FieldFlags,
    /// TEXT only
    pub weight: f64,
    /// TAG only
    pub separator: char,
    /// Suffixes shorter than this are never stored in the field's trie
    pub min_suffix_len: usize,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            flags: FieldFlags::new(),
            weight: 1.0,
            separator: DEFAULT_TAG_SEPARATOR,
            min_suffix_len: DEFAULT_MIN_PREFIX,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Tag)
    }

    /// Builder-style flag setter, mostly for tests
    pub fn with(mut self, flag: u16) -> Self {
        self.flags.set(flag);
        if self.kind == FieldKind::Tag && flag == FieldFlags::CASE_SENSITIVE {
            self.flags.set(FieldFlags::UNF);
        }
        self
    }

    pub fn has_suffix_trie(&self) -> bool {
        self.flags.has_suffix_trie()
    }

    /// Whether terms keep their original casing end-to-end
    pub fn is_case_sensitive(&self) -> bool {
        self.flags.is_case_sensitive()
    }

    /// Attribute list in index info order
    pub fn describe(&self) -> Vec<String> {
        let mut out = vec![
            "identifier".to_string(),
            self.name.clone(),
            "attribute".to_string(),
            self.name.clone(),
            "type".to_string(),
            self.kind.as_str().to_string(),
        ];
        match self.kind {
            FieldKind::Text => {
                out.push("WEIGHT".to_string());
                out.push(format_weight(self.weight));
                if self.flags.has(FieldFlags::NOSTEM) {
                    out.push("NOSTEM".to_string());
                }
            }
            FieldKind::Tag => {
                out.push("SEPARATOR".to_string());
                out.push(self.separator.to_string());
                if self.flags.is_case_sensitive() {
                    out.push("CASESENSITIVE".to_string());
                }
            }
        }
        if self.flags.is_sortable() {
            out.push("SORTABLE".to_string());
        }
        if self.flags.has(FieldFlags::UNF) {
            out.push("UNF".to_string());
        }
        if self.flags.has_suffix_trie() {
            out.push("WITHSUFFIXTRIE".to_string());
        }
        out
    }
}

fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{}", weight as i64)
    } else {
        format!("{}", weight)
    }
}

/// What a query does once its time budget is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Stop enumerating and return what was collected so far
    #[default]
    Return,
    /// Abort the query with a timeout error
    Fail,
}

impl TimeoutPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "return" => Some(TimeoutPolicy::Return),
            "fail" => Some(TimeoutPolicy::Fail),
            _ => None,
        }
    }
}

/// Garbage collector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GcConfig {
    /// Minimum stale entries accumulated before a sweep runs (0 = always)
    pub clean_threshold: usize,
    /// Interval between background runs
    pub run_interval_ms: u64,
    /// Node removals applied per exclusive merge window
    pub merge_batch_size: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            clean_threshold: DEFAULT_GC_CLEAN_THRESHOLD,
            run_interval_ms: DEFAULT_GC_INTERVAL_MS,
            merge_batch_size: DEFAULT_GC_MERGE_BATCH,
        }
    }
}

impl GcConfig {
    pub fn run_interval(&self) -> Duration {
        Duration::from_millis(self.run_interval_ms)
    }
}

/// Configuration consumed by the builder, evaluator and collector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// MINPREFIX
    pub min_prefix: usize,
    /// MAXEXPANSIONS
    pub max_expansions: usize,
    /// TIMEOUT in milliseconds, 0 disables the budget
    pub timeout_ms: u64,
    /// ON_TIMEOUT
    pub on_timeout: TimeoutPolicy,
    pub gc: GcConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_prefix: DEFAULT_MIN_PREFIX,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            on_timeout: TimeoutPolicy::default(),
            gc: GcConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Query time budget, `None` when unlimited
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Set an option by its runtime configuration name
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            option: name.to_string(),
            value: value.to_string(),
        };

        match name.to_ascii_uppercase().as_str() {
            "MINPREFIX" => {
                let v: usize = value.parse().map_err(|_| invalid())?;
                if v == 0 {
                    return Err(invalid());
                }
                self.min_prefix = v;
            }
            "MAXEXPANSIONS" => {
                let v: usize = value.parse().map_err(|_| invalid())?;
                if v == 0 {
                    return Err(invalid());
                }
                self.max_expansions = v;
            }
            "TIMEOUT" => self.timeout_ms = value.parse().map_err(|_| invalid())?,
            "ON_TIMEOUT" => self.on_timeout = TimeoutPolicy::parse(value).ok_or_else(invalid)?,
            "FORK_GC_CLEAN_THRESHOLD" => {
                self.gc.clean_threshold = value.parse().map_err(|_| invalid())?
            }
            "FORK_GC_RUN_INTERVAL" => {
                self.gc.run_interval_ms = value.parse().map_err(|_| invalid())?
            }
            _ => return Err(ConfigError::UnknownOption(name.to_string())),
        }
        Ok(())
    }

    /// Load config with priority: environment variables > config file > defaults
    pub fn load(path: Option<&Path>) -> crate::error::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let file = std::fs::File::open(path)?;
                serde_json::from_reader(std::io::BufReader::new(file))?
            }
            None => Self::default(),
        };

        for (var, option) in [
            ("SFXI_MINPREFIX", "MINPREFIX"),
            ("SFXI_MAXEXPANSIONS", "MAXEXPANSIONS"),
            ("SFXI_TIMEOUT", "TIMEOUT"),
            ("SFXI_ON_TIMEOUT", "ON_TIMEOUT"),
            ("SFXI_FORK_GC_CLEAN_THRESHOLD", "FORK_GC_CLEAN_THRESHOLD"),
        ] {
            if let Ok(val) = std::env::var(var) {
                config.set_option(option, &val)?;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.min_prefix, 2);
        assert_eq!(config.max_expansions, 200);
        assert_eq!(config.timeout(), Some(Duration::from_millis(500)));
        assert_eq!(config.on_timeout, TimeoutPolicy::Return);
        assert_eq!(config.gc.clean_threshold, 100);
    }

    #[test]
    fn test_set_option() {
        let mut config = SearchConfig::default();
        config.set_option("minprefix", "1").unwrap();
        config.set_option("MAXEXPANSIONS", "10000000").unwrap();
        config.set_option("TIMEOUT", "0").unwrap();
        config.set_option("ON_TIMEOUT", "FAIL").unwrap();
        config.set_option("FORK_GC_CLEAN_THRESHOLD", "0").unwrap();

        assert_eq!(config.min_prefix, 1);
        assert_eq!(config.max_expansions, 10_000_000);
        assert_eq!(config.timeout(), None);
        assert_eq!(config.on_timeout, TimeoutPolicy::Fail);
        assert_eq!(config.gc.clean_threshold, 0);
    }

    #[test]
    fn test_set_option_rejects_garbage() {
        let mut config = SearchConfig::default();
        assert!(matches!(
            config.set_option("NOPE", "1"),
            Err(ConfigError::UnknownOption(_))
        ));
        assert!(matches!(
            config.set_option("TIMEOUT", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(config.set_option("MINPREFIX", "0").is_err());
        assert!(config.set_option("ON_TIMEOUT", "maybe").is_err());
    }

    #[test]
    fn test_config_partial_json() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"max_expansions": 5, "gc": {"clean_threshold": 0}}"#).unwrap();
        assert_eq!(config.max_expansions, 5);
        assert_eq!(config.min_prefix, DEFAULT_MIN_PREFIX);
        assert_eq!(config.gc.clean_threshold, 0);
        assert_eq!(config.gc.merge_batch_size, DEFAULT_GC_MERGE_BATCH);
    }

    #[test]
    fn test_describe_tag_case_sensitive() {
        let spec = FieldSpec::tag("t")
            .with(FieldFlags::WITH_SUFFIX_TRIE)
            .with(FieldFlags::CASE_SENSITIVE)
            .with(FieldFlags::SORTABLE);
        assert_eq!(
            spec.describe(),
            vec![
                "identifier", "t", "attribute", "t", "type", "TAG", "SEPARATOR", ",",
                "CASESENSITIVE", "SORTABLE", "UNF", "WITHSUFFIXTRIE"
            ]
        );
    }

    #[test]
    fn test_describe_text() {
        let spec = FieldSpec::text("t").with(FieldFlags::WITH_SUFFIX_TRIE);
        assert_eq!(
            spec.describe(),
            vec!["identifier", "t", "attribute", "t", "type", "TEXT", "WEIGHT", "1", "WITHSUFFIXTRIE"]
        );
    }
}
