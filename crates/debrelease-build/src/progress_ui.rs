//! Progress UI components for multi-distribution builds

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use debrelease_core::Distribution;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::context::DistributionState;

/// Trait for progress UI implementations
pub trait ProgressUI: Send + Sync {
    /// A run over `total` distributions begins
    fn run_started(&self, package: &str, total: usize);

    /// Work on a distribution begins
    fn distribution_started(&self, distribution: Distribution, version: &str);

    /// A distribution reached a new state
    fn state_changed(&self, distribution: Distribution, state: DistributionState);

    /// A distribution finished
    fn distribution_finished(&self, distribution: Distribution, success: bool, error: Option<&str>);

    /// Finish the progress display
    fn finish(&self);
}

/// Indicatif-based progress UI implementation
pub struct IndicatifProgressUI {
    multi_progress: MultiProgress,
    main_bar: ProgressBar,
    distribution_bars: Mutex<HashMap<Distribution, ProgressBar>>,
    start_time: Instant,
}

impl IndicatifProgressUI {
    /// Create a new indicatif progress UI
    pub fn new() -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = multi_progress.add(ProgressBar::new(0));
        main_bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{prefix:.bold.dim} {spinner:.green} [{elapsed_precise}] \
                     [{wide_bar:.cyan/blue}] {pos}/{len}",
                )
                .expect("Valid template")
                .progress_chars("#>-"),
        );

        Self {
            multi_progress,
            main_bar,
            distribution_bars: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    fn create_distribution_bar(&self, distribution: Distribution) -> ProgressBar {
        let pb = self.multi_progress.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{prefix:.bold.dim} {spinner:.green} {wide_msg}")
                .expect("Valid template"),
        );
        pb.set_prefix(format!("  {distribution}"));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl Default for IndicatifProgressUI {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressUI for IndicatifProgressUI {
    fn run_started(&self, package: &str, total: usize) {
        self.main_bar.set_prefix(format!("Packaging {package}"));
        self.main_bar.set_length(total as u64);
        self.main_bar.set_position(0);
    }

    fn distribution_started(&self, distribution: Distribution, version: &str) {
        let pb = self.create_distribution_bar(distribution);
        pb.set_message(version.to_string());
        if let Ok(mut bars) = self.distribution_bars.lock() {
            bars.insert(distribution, pb);
        }
    }

    fn state_changed(&self, distribution: Distribution, state: DistributionState) {
        if let Ok(bars) = self.distribution_bars.lock() {
            if let Some(pb) = bars.get(&distribution) {
                pb.set_message(state.label());
            }
        }
    }

    fn distribution_finished(&self, distribution: Distribution, success: bool, error: Option<&str>) {
        if let Ok(bars) = self.distribution_bars.lock() {
            if let Some(pb) = bars.get(&distribution) {
                if success {
                    pb.finish_with_message("✓ Complete");
                } else {
                    // Only the first line; tool stderr follows in the log
                    let first = error.and_then(|e| e.lines().next()).unwrap_or("unknown error");
                    pb.finish_with_message(format!("✗ Failed: {first}"));
                }
            }
        }
        self.main_bar.inc(1);
    }

    fn finish(&self) {
        let elapsed = self.start_time.elapsed();
        self.main_bar
            .finish_with_message(format!("Finished in {:.1}s", elapsed.as_secs_f64()));
    }
}

/// No-op progress UI for non-interactive environments
#[derive(Debug, Default)]
pub struct NoOpProgressUI;

impl ProgressUI for NoOpProgressUI {
    fn run_started(&self, package: &str, total: usize) {
        info!("Packaging {package} for {total} distribution(s)");
    }

    fn distribution_started(&self, distribution: Distribution, version: &str) {
        info!("Building {version} for {distribution}");
    }

    fn state_changed(&self, _distribution: Distribution, _state: DistributionState) {}

    fn distribution_finished(&self, distribution: Distribution, success: bool, error: Option<&str>) {
        if success {
            info!("{distribution}: complete");
        } else {
            error!("{distribution}: failed: {}", error.unwrap_or("unknown error"));
        }
    }

    fn finish(&self) {}
}

/// Pick a progress UI for the current terminal
pub fn create_progress_ui(interactive: bool) -> Arc<dyn ProgressUI> {
    if interactive {
        Arc::new(IndicatifProgressUI::new())
    } else {
        Arc::new(NoOpProgressUI)
    }
}
