//! Garbage collection of stale index entries
//!
//! Removing the last document holding a term leaves behind an empty posting
//! list and suffix trie nodes that no longer lead to any terminal. The
//! collector reclaims them without holding a field's write lock for the
//! duration of the scan:
//!
//! 1. **Snapshot** - under a read lock, clone the trie of every field with
//!    stale entries and note its empty dictionary terms.
//! 2. **Sweep** - with no lock held, list prunable nodes of each snapshot
//!    (fields in parallel).
//! 3. **Merge** - apply the removals under the write lock in batches,
//!    re-checking each node against the live trie.
//!
//! Writers and readers keep running between batches. Anything that became
//! live again after the snapshot survives the merge.
//!
//! The snapshot clones a field's whole trie under its read lock, so writers
//! to that field wait for a copy proportional to the trie's size. Readers are
//! not blocked. Fields are cloned one at a time.

use crate::index::field::FieldIndex;
use crate::index::suffix_trie::{MergeOutcome, Removal, SuffixTrie, Term};
use crate::index::types::GcConfig;
use crate::index::writer::SearchIndex;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Collector state, observable while a run is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum GcPhase {
    Idle = 0,
    SnapshotStarted = 1,
    Sweeping = 2,
    Merging = 3,
}

impl GcPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => GcPhase::SnapshotStarted,
            2 => GcPhase::Sweeping,
            3 => GcPhase::Merging,
            _ => GcPhase::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GcPhase::Idle => "idle",
            GcPhase::SnapshotStarted => "snapshot",
            GcPhase::Sweeping => "sweeping",
            GcPhase::Merging => "merging",
        }
    }
}

/// Cumulative collector counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct GcStats {
    pub runs: u64,
    pub skipped: u64,
    pub nodes_removed: u64,
    pub nodes_survived: u64,
    pub terms_reclaimed: u64,
    pub last_run_ms: u64,
}

/// Outcome of a single collector run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GcReport {
    /// The run stopped before the snapshot because too little was stale
    pub skipped: bool,
    /// Stale terms counted when the run started
    pub pending: usize,
    pub fields_swept: usize,
    pub nodes_removed: usize,
    pub nodes_survived: usize,
    pub terms_reclaimed: usize,
}

struct FieldSnapshot {
    pos: usize,
    trie: Option<SuffixTrie>,
    empty_terms: Vec<Term>,
    pending: usize,
}

struct FieldSweep {
    pos: usize,
    removals: Vec<Removal>,
    empty_terms: Vec<Term>,
    pending: usize,
}

#[derive(Debug)]
pub struct GarbageCollector {
    phase: AtomicU8,
    stats: Mutex<GcStats>,
    /// Held for the whole run so runs never overlap
    running: Mutex<()>,
}

impl Default for GarbageCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl GarbageCollector {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(GcPhase::Idle as u8),
            stats: Mutex::new(GcStats::default()),
            running: Mutex::new(()),
        }
    }

    pub fn phase(&self) -> GcPhase {
        GcPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn stats(&self) -> GcStats {
        self.stats.lock().clone()
    }

    fn enter(&self, phase: GcPhase, observe: &mut impl FnMut(GcPhase)) {
        self.phase.store(phase as u8, Ordering::Release);
        observe(phase);
    }

    /// Run one collection over `fields`.
    ///
    /// Unless `force` is set, the run is skipped when fewer than
    /// `config.clean_threshold` terms went stale since the last run.
    pub fn run_once(&self, fields: &[FieldIndex], config: &GcConfig, force: bool) -> GcReport {
        self.run_observed(fields, config, force, |_| {})
    }

    /// Like [`run_once`](Self::run_once), calling `observe` on every phase
    /// change. No lock is held while `observe` runs, so it may write to the
    /// index.
    pub fn run_observed(
        &self,
        fields: &[FieldIndex],
        config: &GcConfig,
        force: bool,
        mut observe: impl FnMut(GcPhase),
    ) -> GcReport {
        let _running = self.running.lock();

        let pending: usize = fields.iter().map(|f| f.read().pending_stale).sum();
        if !force && pending < config.clean_threshold {
            self.stats.lock().skipped += 1;
            debug!(pending, threshold = config.clean_threshold, "gc skipped");
            return GcReport {
                skipped: true,
                pending,
                ..Default::default()
            };
        }

        let started = Instant::now();
        let mut report = GcReport {
            pending,
            ..Default::default()
        };

        self.enter(GcPhase::SnapshotStarted, &mut observe);
        let snapshots: Vec<FieldSnapshot> = fields
            .iter()
            .enumerate()
            .filter_map(|(pos, field)| {
                let state = field.read();
                if !force && state.pending_stale == 0 {
                    return None;
                }
                Some(FieldSnapshot {
                    pos,
                    trie: state.trie.clone(),
                    empty_terms: state.dictionary.empty_terms(),
                    pending: state.pending_stale,
                })
            })
            .collect();
        report.fields_swept = snapshots.len();

        self.enter(GcPhase::Sweeping, &mut observe);
        let sweeps: Vec<FieldSweep> = snapshots
            .into_par_iter()
            .map(|snapshot| FieldSweep {
                pos: snapshot.pos,
                removals: snapshot
                    .trie
                    .map(|trie| trie.collect_prunable())
                    .unwrap_or_default(),
                empty_terms: snapshot.empty_terms,
                pending: snapshot.pending,
            })
            .collect();

        self.enter(GcPhase::Merging, &mut observe);
        let batch = config.merge_batch_size.max(1);
        let mut outcome = MergeOutcome::default();
        for sweep in &sweeps {
            let field = &fields[sweep.pos];

            for chunk in sweep.removals.chunks(batch) {
                let mut state = field.write();
                if let Some(trie) = state.trie.as_mut() {
                    outcome.absorb(trie.apply_removals(chunk));
                }
            }

            let mut state = field.write();
            report.terms_reclaimed += state.dictionary.reclaim(&sweep.empty_terms);
            state.pending_stale = state.pending_stale.saturating_sub(sweep.pending);
        }
        report.nodes_removed = outcome.removed;
        report.nodes_survived = outcome.survived;

        self.enter(GcPhase::Idle, &mut observe);

        let elapsed = started.elapsed();
        {
            let mut stats = self.stats.lock();
            stats.runs += 1;
            stats.nodes_removed += report.nodes_removed as u64;
            stats.nodes_survived += report.nodes_survived as u64;
            stats.terms_reclaimed += report.terms_reclaimed as u64;
            stats.last_run_ms = elapsed.as_millis() as u64;
        }

        info!(
            fields = report.fields_swept,
            removed = report.nodes_removed,
            survived = report.nodes_survived,
            reclaimed = report.terms_reclaimed,
            elapsed_ms = elapsed.as_millis() as u64,
            "gc run complete"
        );
        report
    }
}

impl SearchIndex {
    /// Collect if enough entries are stale
    pub fn run_gc(&self) -> GcReport {
        let config = self.config().gc;
        self.gc.run_once(&self.fields, &config, false)
    }

    /// Collect regardless of the threshold
    pub fn force_gc(&self) -> GcReport {
        let config = self.config().gc;
        self.gc.run_once(&self.fields, &config, true)
    }

    /// Collect with a phase observer
    pub fn gc_observed(&self, force: bool, observe: impl FnMut(GcPhase)) -> GcReport {
        let config = self.config().gc;
        self.gc.run_observed(&self.fields, &config, force, observe)
    }

    pub fn gc_phase(&self) -> GcPhase {
        self.gc.phase()
    }

    pub fn gc_stats(&self) -> GcStats {
        self.gc.stats()
    }
}

/// Granularity at which the background thread checks for shutdown
const GC_TICK: Duration = Duration::from_millis(20);

/// Handle to a background collector thread. Dropping it stops the thread.
pub struct GcHandle {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl GcHandle {
    /// Start collecting `index` every `FORK_GC_RUN_INTERVAL`
    pub fn spawn(index: Arc<SearchIndex>) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();

        let thread = std::thread::Builder::new()
            .name("sfxi-gc".to_string())
            .spawn(move || {
                let mut waited = Duration::ZERO;
                while !flag.load(Ordering::SeqCst) {
                    std::thread::sleep(GC_TICK);
                    waited += GC_TICK;
                    if waited >= index.config().gc.run_interval() {
                        waited = Duration::ZERO;
                        index.run_gc();
                    }
                }
                debug!("gc thread stopped");
            })?;

        Ok(Self {
            shutdown,
            thread: Some(thread),
        })
    }

    /// Signal the thread and wait for it
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("gc thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst)
            && self
                .thread
                .as_ref()
                .is_some_and(|t| !t.is_finished())
    }
}

impl Drop for GcHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
