//! Document loading progress. Compiles to nothing without the `progress` feature.

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

#[cfg(feature = "progress")]
const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Progress over a known number of document records
pub struct LoadProgress {
    #[cfg(feature = "progress")]
    bar: Option<ProgressBar>,
}

impl LoadProgress {
    /// Hidden when `silent`
    #[cfg(feature = "progress")]
    pub fn new(total: usize, silent: bool) -> Self {
        let bar = (!silent).then(|| {
            let pb = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
                pb.set_style(style.progress_chars("█▓▒░  "));
            }
            pb.set_message("Indexing documents...");
            pb
        });
        Self { bar }
    }

    #[cfg(not(feature = "progress"))]
    pub fn new(_total: usize, _silent: bool) -> Self {
        Self {}
    }

    #[inline]
    pub fn record_applied(&self) {
        #[cfg(feature = "progress")]
        if let Some(pb) = &self.bar {
            pb.inc(1);
        }
    }

    pub fn finish(self, applied: usize) {
        #[cfg(feature = "progress")]
        if let Some(pb) = self.bar {
            pb.finish_with_message(format!("Indexed {} documents", applied));
        }
        #[cfg(not(feature = "progress"))]
        let _ = applied;
    }
}
