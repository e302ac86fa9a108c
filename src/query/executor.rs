use crate::error::QueryError;
use crate::index::field::FieldState;
use crate::index::suffix_trie::Term;
use crate::index::terms::TermDictionary;
use crate::index::types::{SearchConfig, TimeoutPolicy};
use crate::index::writer::SearchIndex;
use crate::query::parser::{PatternKind, WildcardQuery, parse_query_with_params};
use crate::query::planner::{PlanStep, QueryPlan, StepSource};
use roaring::RoaringBitmap;
use rustc_hash::FxHashSet;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::time::Instant;
use tracing::{debug, warn};

/// Deadline is checked once per this many visited candidates
const TIMEOUT_POLL_INTERVAL: u32 = 64;

/// Result of a wildcard query
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Matching document keys, sorted
    pub keys: Vec<String>,
    pub doc_ids: RoaringBitmap,
    /// Distinct (field, term) pairs the pattern expanded to
    pub matched_terms: usize,
    /// The time budget ran out and the result may be incomplete
    pub timed_out: bool,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Why enumeration stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    ExpansionLimit,
    Timeout,
}

/// Caps the number of matched terms and the time spent enumerating
#[derive(Debug)]
struct ExpansionBudget {
    max_expansions: usize,
    matched: usize,
    deadline: Option<Instant>,
    ticks: u32,
}

impl ExpansionBudget {
    fn new(max_expansions: usize, deadline: Option<Instant>) -> Self {
        Self {
            max_expansions,
            matched: 0,
            deadline,
            ticks: 0,
        }
    }

    /// Count one visited candidate, polling the deadline periodically
    #[inline]
    fn tick(&mut self) -> ControlFlow<Stop> {
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks % TIMEOUT_POLL_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return ControlFlow::Break(Stop::Timeout);
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Count one distinct matched term
    #[inline]
    fn record(&mut self) -> ControlFlow<Stop> {
        self.matched += 1;
        if self.matched > self.max_expansions {
            return ControlFlow::Break(Stop::ExpansionLimit);
        }
        ControlFlow::Continue(())
    }
}

/// Evaluates wildcard queries against a [`SearchIndex`]
pub struct QueryEvaluator<'a> {
    index: &'a SearchIndex,
    config: SearchConfig,
}

impl<'a> QueryEvaluator<'a> {
    /// Evaluator using the index's current configuration
    pub fn new(index: &'a SearchIndex) -> Self {
        Self {
            index,
            config: index.config(),
        }
    }

    pub fn with_config(index: &'a SearchIndex, config: SearchConfig) -> Self {
        Self { index, config }
    }

    pub fn search(&self, input: &str) -> Result<QueryResult, QueryError> {
        self.search_with_params(input, &HashMap::new())
    }

    pub fn search_with_params(
        &self,
        input: &str,
        params: &HashMap<String, String>,
    ) -> Result<QueryResult, QueryError> {
        let query = parse_query_with_params(input, params)?;
        self.execute(&query)
    }

    /// Plan and run a parsed query
    pub fn execute(&self, query: &WildcardQuery) -> Result<QueryResult, QueryError> {
        let started = Instant::now();
        let deadline = self.config.timeout().map(|t| started + t);
        self.execute_until(query, started, deadline)
    }

    fn execute_until(
        &self,
        query: &WildcardQuery,
        started: Instant,
        deadline: Option<Instant>,
    ) -> Result<QueryResult, QueryError> {
        let plan = QueryPlan::build(self.index, query, &self.config)?;

        debug!(
            query = %query.raw,
            kind = plan.kind.as_str(),
            fields = plan.steps.len(),
            "evaluating wildcard query"
        );

        let mut budget = ExpansionBudget::new(self.config.max_expansions, deadline);
        let mut doc_ids = RoaringBitmap::new();
        let mut timed_out = false;

        for step in &plan.steps {
            // Field lock is released before document keys are resolved
            let flow = {
                let state = self.index.fields()[step.field].read();
                run_step(&state, plan.kind, step, &mut budget, &mut doc_ids)
            };

            match flow {
                ControlFlow::Continue(()) => {}
                ControlFlow::Break(Stop::ExpansionLimit) => {
                    warn!(
                        query = %query.raw,
                        limit = self.config.max_expansions,
                        "maximum expansions reached"
                    );
                    return Err(QueryError::ExpansionLimitExceeded {
                        pattern: query.raw.clone(),
                        limit: self.config.max_expansions,
                    });
                }
                ControlFlow::Break(Stop::Timeout) => {
                    warn!(
                        query = %query.raw,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        policy = ?self.config.on_timeout,
                        "query timed out"
                    );
                    match self.config.on_timeout {
                        TimeoutPolicy::Fail => return Err(QueryError::Timeout),
                        TimeoutPolicy::Return => {
                            timed_out = true;
                            break;
                        }
                    }
                }
            }
        }

        let keys = self.index.resolve_keys(&doc_ids);
        debug!(
            matched_terms = budget.matched,
            docs = keys.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "query complete"
        );

        Ok(QueryResult {
            keys,
            doc_ids,
            matched_terms: budget.matched,
            timed_out,
        })
    }
}

/// Expand one step under the field's read lock, OR-ing postings into `docs`
fn run_step(
    state: &FieldState,
    kind: PatternKind,
    step: &PlanStep,
    budget: &mut ExpansionBudget,
    docs: &mut RoaringBitmap,
) -> ControlFlow<Stop> {
    let literal = step.literal.as_str();
    let dictionary = &state.dictionary;

    match step.source {
        StepSource::DictionaryExact => {
            budget.tick()?;
            if let Some(list) = dictionary.postings(literal) {
                budget.record()?;
                *docs |= list;
            }
        }
        StepSource::DictionaryPrefix => {
            for (_, list) in dictionary.prefix_iter(literal) {
                budget.tick()?;
                budget.record()?;
                *docs |= list;
            }
        }
        StepSource::DictionaryScan => {
            for (term, list) in dictionary.iter() {
                budget.tick()?;
                if kind.matches(term, literal) {
                    budget.record()?;
                    *docs |= list;
                }
            }
        }
        StepSource::SuffixExact => {
            let Some(trie) = state.trie.as_ref() else {
                return ControlFlow::Continue(());
            };
            let Some(node) = trie.find(literal).and_then(|id| trie.node(id)) else {
                return ControlFlow::Continue(());
            };
            for term in node.terminals() {
                budget.tick()?;
                collect(term, dictionary, budget, docs)?;
            }
        }
        StepSource::SuffixSubtree => {
            let Some(trie) = state.trie.as_ref() else {
                return ControlFlow::Continue(());
            };
            let Some(start) = trie.find(literal) else {
                return ControlFlow::Continue(());
            };
            // A term shows up under every suffix that starts with the literal
            let mut seen: FxHashSet<&Term> = FxHashSet::default();
            trie.visit_subtree(start, |node| {
                budget.tick()?;
                for term in node.terminals() {
                    if seen.insert(term) {
                        collect(term, dictionary, budget, docs)?;
                    }
                }
                ControlFlow::Continue(())
            })?;
        }
    }

    ControlFlow::Continue(())
}

/// Resolve a trie term to its postings.
///
/// Terms whose postings vanished under a concurrent delete contribute
/// nothing and are not counted.
#[inline]
fn collect(
    term: &Term,
    dictionary: &TermDictionary,
    budget: &mut ExpansionBudget,
    docs: &mut RoaringBitmap,
) -> ControlFlow<Stop> {
    if let Some(list) = dictionary.postings(term) {
        budget.record()?;
        *docs |= list;
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(schema: &str, docs: &[(&str, &str)]) -> SearchIndex {
        let index = SearchIndex::from_schema_str(schema, SearchConfig::default()).unwrap();
        for (key, value) in docs {
            index.add_document(key, &[("t", value)]);
        }
        index
    }

    fn misc_index(schema: &str) -> SearchIndex {
        index(
            schema,
            &[
                ("doc1", "world"),
                ("doc2", "keyword"),
                ("doc3", "doctorless"),
                ("doc4", "anteriorly"),
                ("doc5", "colorlessness"),
                ("doc6", "floorless"),
            ],
        )
    }

    fn keys(index: &SearchIndex, query: &str) -> Vec<String> {
        QueryEvaluator::new(index).search(query).unwrap().keys
    }

    #[test]
    fn test_contains_suffix_prefix() {
        let index = misc_index("t TEXT WITHSUFFIXTRIE SORTABLE");
        assert_eq!(keys(&index, "worl*"), vec!["doc1"]);
        assert_eq!(keys(&index, "*orld*"), vec!["doc1"]);
        assert_eq!(keys(&index, "*orl*"), vec!["doc1", "doc3", "doc4", "doc5", "doc6"]);
        assert_eq!(
            keys(&index, "*or*"),
            vec!["doc1", "doc2", "doc3", "doc4", "doc5", "doc6"]
        );
        assert_eq!(keys(&index, "*orld"), vec!["doc1"]);
        assert_eq!(keys(&index, "*ess"), vec!["doc3", "doc5", "doc6"]);
        assert_eq!(keys(&index, "*less"), vec!["doc3", "doc6"]);
    }

    #[test]
    fn test_same_results_without_trie() {
        let with = misc_index("t TEXT WITHSUFFIXTRIE");
        let without = misc_index("t TEXT");
        for query in ["worl*", "*orl*", "*or*", "*ess", "*less", "keyword", "doc*"] {
            assert_eq!(keys(&with, query), keys(&without, query), "query {query}");
        }
    }

    #[test]
    fn test_contains_counts_term_once() {
        // "l" appears twice in "hello", the term is matched once
        let index = index("t TEXT WITHSUFFIXTRIE", &[("d", "hello")]);
        let config = SearchConfig {
            min_prefix: 1,
            max_expansions: 1,
            ..Default::default()
        };
        let result = QueryEvaluator::with_config(&index, config)
            .search("*l*")
            .unwrap();
        assert_eq!(result.matched_terms, 1);
        assert_eq!(result.keys, vec!["d"]);
    }

    #[test]
    fn test_expansion_limit() {
        let index = misc_index("t TEXT WITHSUFFIXTRIE");
        let config = SearchConfig {
            max_expansions: 3,
            ..Default::default()
        };
        let evaluator = QueryEvaluator::with_config(&index, config);
        assert_eq!(
            evaluator.search("*orl*").unwrap_err(),
            QueryError::ExpansionLimitExceeded {
                pattern: "*orl*".into(),
                limit: 3
            }
        );
        // Exactly at the cap is fine
        assert_eq!(evaluator.search("*ess").unwrap().len(), 3);
    }

    #[test]
    fn test_budget_timeout_polls() {
        let mut budget = ExpansionBudget::new(usize::MAX, Some(Instant::now()));
        for _ in 0..TIMEOUT_POLL_INTERVAL - 1 {
            assert_eq!(budget.tick(), ControlFlow::Continue(()));
        }
        assert_eq!(budget.tick(), ControlFlow::Break(Stop::Timeout));

        let mut unlimited = ExpansionBudget::new(usize::MAX, None);
        for _ in 0..1000 {
            assert_eq!(unlimited.tick(), ControlFlow::Continue(()));
        }
    }

    #[test]
    fn test_budget_record() {
        let mut budget = ExpansionBudget::new(2, None);
        assert_eq!(budget.record(), ControlFlow::Continue(()));
        assert_eq!(budget.record(), ControlFlow::Continue(()));
        assert_eq!(budget.record(), ControlFlow::Break(Stop::ExpansionLimit));
    }

    fn large_index() -> SearchIndex {
        let index = SearchIndex::from_schema_str("t TEXT", SearchConfig::default()).unwrap();
        for i in 0..5_000 {
            index.add_document(&format!("doc{i}"), &[("t", &format!("foo{i:05}"))]);
        }
        index
    }

    #[test]
    fn test_step_stops_at_deadline() {
        let index = large_index();
        let query = crate::query::parser::parse_query("foo*").unwrap();
        let plan = QueryPlan::build(&index, &query, &SearchConfig::default()).unwrap();

        let mut budget = ExpansionBudget::new(usize::MAX, Some(Instant::now()));
        let mut docs = RoaringBitmap::new();
        let state = index.fields()[0].read();
        let flow = run_step(&state, plan.kind, &plan.steps[0], &mut budget, &mut docs);

        assert_eq!(flow, ControlFlow::Break(Stop::Timeout));
        assert_eq!(docs.len(), TIMEOUT_POLL_INTERVAL as u64 - 1);
    }

    #[test]
    fn test_timeout_policies() {
        let index = large_index();
        let query = crate::query::parser::parse_query("foo*").unwrap();
        let mut config = SearchConfig {
            max_expansions: usize::MAX,
            on_timeout: TimeoutPolicy::Return,
            ..Default::default()
        };
        let started = Instant::now();

        let partial = QueryEvaluator::with_config(&index, config.clone())
            .execute_until(&query, started, Some(started))
            .unwrap();
        assert!(partial.timed_out);
        assert!(partial.len() < 5_000);

        config.on_timeout = TimeoutPolicy::Fail;
        let err = QueryEvaluator::with_config(&index, config)
            .execute_until(&query, started, Some(started))
            .unwrap_err();
        assert_eq!(err, QueryError::Timeout);
    }

    #[test]
    fn test_no_timeout_when_unlimited() {
        let index = large_index();
        let config = SearchConfig {
            max_expansions: usize::MAX,
            timeout_ms: 0,
            on_timeout: TimeoutPolicy::Fail,
            ..Default::default()
        };
        let result = QueryEvaluator::with_config(&index, config)
            .search("foo*")
            .unwrap();
        assert_eq!(result.len(), 5_000);
        assert!(!result.timed_out);
    }
}
