//! Progress reporting for the terminal
//!
//! On a terminal the chunk loop drives indicatif bars; when stderr is
//! redirected a plain line is logged every tenth of the way instead.

use ftflash_core::progress::{render_bar, Phase, Progress};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Width of the text bar used by [`LineProgress`]
const LINE_BAR_WIDTH: usize = 40;

/// Steps reported by [`LineProgress`]
const LINE_STEPS: usize = 10;

/// Create a progress bar style with a phase label
fn create_progress_bar_style() -> Result<ProgressStyle, Box<dyn std::error::Error>> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}")?
        .progress_chars("#>-"))
}

/// Create a standard spinner style
fn create_spinner_style() -> Result<ProgressStyle, Box<dyn std::error::Error>> {
    Ok(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?)
}

/// Progress reporter using indicatif progress bars
pub struct IndicatifProgress {
    current_bar: Option<ProgressBar>,
    phase: Phase,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self {
            current_bar: None,
            phase: Phase::Reading,
        }
    }

    fn create_bar(&mut self, total: u64) {
        let pb = ProgressBar::new(total);
        pb.set_style(create_progress_bar_style().unwrap_or_else(|_| ProgressStyle::default_bar()));
        pb.set_message(self.phase.label());
        self.current_bar = Some(pb);
    }

    fn create_spinner(&mut self, message: String) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(create_spinner_style().unwrap_or_else(|_| ProgressStyle::default_spinner()));
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current_bar = Some(pb);
    }
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for IndicatifProgress {
    fn start(&mut self, phase: Phase, total: Option<usize>) {
        self.phase = phase;
        match total {
            Some(total) => self.create_bar(total as u64),
            None => self.create_spinner(format!("{} whole chip...", phase)),
        }
    }

    fn advance(&mut self, done: usize) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(done as u64);
        }
    }

    fn finish(&mut self, ok: bool) {
        if let Some(pb) = self.current_bar.take() {
            if ok {
                pb.finish_with_message(format!("{} complete", self.phase));
            } else {
                pb.abandon_with_message(format!("{} failed", self.phase));
            }
        }
    }
}

/// Progress reporter for non-interactive output
///
/// Logs the text bar at 10% steps rather than on every chunk.
pub struct LineProgress {
    phase: Phase,
    total: Option<usize>,
    next_step: usize,
}

impl LineProgress {
    pub fn new() -> Self {
        Self {
            phase: Phase::Reading,
            total: None,
            next_step: 1,
        }
    }

    /// Bytes that must be done before step `step` is reported
    fn threshold(total: usize, step: usize) -> usize {
        (total as u128 * step as u128 / LINE_STEPS as u128) as usize
    }
}

impl Default for LineProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for LineProgress {
    fn start(&mut self, phase: Phase, total: Option<usize>) {
        self.phase = phase;
        self.total = total;
        self.next_step = 1;
        match total {
            Some(total) => log::info!("{}: {} bytes", phase, total),
            None => log::info!("{} whole chip...", phase),
        }
    }

    fn advance(&mut self, done: usize) {
        let Some(total) = self.total else {
            return;
        };
        if self.next_step > LINE_STEPS || done < Self::threshold(total, self.next_step) {
            return;
        }
        log::info!("{}: {}", self.phase, render_bar(done, total, LINE_BAR_WIDTH));
        while self.next_step <= LINE_STEPS && done >= Self::threshold(total, self.next_step) {
            self.next_step += 1;
        }
    }

    fn finish(&mut self, ok: bool) {
        if ok {
            log::info!("{} complete", self.phase);
        } else {
            log::error!("{} failed", self.phase);
        }
    }
}

/// Pick the reporter for the current stderr
pub fn reporter() -> Box<dyn Progress> {
    if ProgressDrawTarget::stderr().is_hidden() {
        Box::new(LineProgress::new())
    } else {
        Box::new(IndicatifProgress::new())
    }
}
