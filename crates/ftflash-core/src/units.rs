//! Human-readable byte counts, durations and rates for summaries

use std::time::Duration;

/// Format a byte count with two decimals in B/KB/MB/GB (powers of 1024)
///
/// ```
/// use ftflash_core::units::format_size;
/// assert_eq!(format_size(4096), "4.00 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    format_size_f64(bytes as f64)
}

fn format_size_f64(mut size: f64) -> String {
    for unit in ["B", "KB", "MB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} GB", size)
}

/// Format a duration as seconds, or minutes and seconds past one minute
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2} s", secs)
    } else {
        let minutes = (secs / 60.0).floor();
        format!("{} min {:.1} s", minutes as u64, secs - minutes * 60.0)
    }
}

/// Format the transfer rate of `bytes` moved in `elapsed`
pub fn format_rate(bytes: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return String::from("n/a");
    }
    format!("{}/s", format_size_f64(bytes as f64 / secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1023), "1023.00 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(16 * 1024 * 1024), "16.00 MB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50 s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2 min 5.0 s");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(2048, Duration::from_secs(2)), "1.00 KB/s");
        assert_eq!(format_rate(2048, Duration::ZERO), "n/a");
    }
}
