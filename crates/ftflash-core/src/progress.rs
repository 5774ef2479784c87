//! Progress reporting
//!
//! The chunk loop calls into a [`Progress`] implementation after every
//! chunk. The CLI supplies an indicatif-backed reporter on terminals and a
//! line-based one (built on [`render_bar`]) otherwise; library callers that
//! don't care use [`NoProgress`].

use std::fmt;

/// Kind of operation being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading flash contents
    Reading,
    /// Programming data
    Writing,
    /// Erasing blocks
    Erasing,
    /// Reading back and comparing
    Verifying,
}

impl Phase {
    /// Short label for progress displays
    pub fn label(self) -> &'static str {
        match self {
            Phase::Reading => "Reading",
            Phase::Writing => "Writing",
            Phase::Erasing => "Erasing",
            Phase::Verifying => "Verifying",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Callbacks for progress reporting during a chunked operation
pub trait Progress {
    /// Called once before the first chunk
    ///
    /// `total` is `None` when the operation has no measurable progress
    /// (a single whole-chip erase command).
    fn start(&mut self, phase: Phase, total: Option<usize>);

    /// Called after each chunk with the number of bytes done so far
    fn advance(&mut self, done: usize);

    /// Called once when the operation ends; `ok` is false on failure
    fn finish(&mut self, ok: bool);
}

/// A no-op progress reporter
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&mut self, _phase: Phase, _total: Option<usize>) {}
    fn advance(&mut self, _done: usize) {}
    fn finish(&mut self, _ok: bool) {}
}

/// Percentage of `current` out of `total`; an empty total counts as done
pub fn percent(current: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        current.min(total) as f64 * 100.0 / total as f64
    }
}

/// Render a fixed-width text progress bar
///
/// ```
/// use ftflash_core::progress::render_bar;
/// assert_eq!(render_bar(1, 4, 8), "[##------]  25.0%");
/// ```
pub fn render_bar(current: usize, total: usize, width: usize) -> String {
    let filled = if total == 0 {
        width
    } else {
        // u128 keeps current * width from overflowing on huge totals
        (current.min(total) as u128 * width as u128 / total as u128) as usize
    };
    format!(
        "[{}{}] {:5.1}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent(current, total)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(0, 100, 10), "[----------]   0.0%");
        assert_eq!(render_bar(50, 100, 10), "[#####-----]  50.0%");
        assert_eq!(render_bar(100, 100, 10), "[##########] 100.0%");
        // Overshoot is clamped
        assert_eq!(render_bar(150, 100, 10), "[##########] 100.0%");
        // Empty operations render as complete
        assert_eq!(render_bar(0, 0, 4), "[####] 100.0%");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(0, 0), 100.0);
    }
}
