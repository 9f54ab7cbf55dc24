//! Human-readable sizes, rates and durations for progress labels.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count using the largest binary unit that keeps the value >= 1.
///
/// # Examples
///
/// ```
/// use locpatcher::format::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Format a transfer rate in bytes per second.
pub fn format_rate(bytes_per_sec: f64) -> String {
    if !bytes_per_sec.is_finite() || bytes_per_sec <= 0.0 {
        return "0 B/s".to_string();
    }
    format!("{}/s", format_size(bytes_per_sec as u64))
}

/// Format an ETA in seconds as a timer string.
///
/// Negative, NaN and infinite inputs mean "unknown" and render as `--:--`.
/// Otherwise the result is `H:MM:SS`, `MM:SS` or `:SS` depending on magnitude.
///
/// # Examples
///
/// ```
/// use locpatcher::format::format_eta;
///
/// assert_eq!(format_eta(f64::INFINITY), "--:--");
/// assert_eq!(format_eta(7.9), ":07");
/// assert_eq!(format_eta(125.0), "02:05");
/// assert_eq!(format_eta(3725.0), "1:02:05");
/// ```
pub fn format_eta(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--".to_string();
    }

    let total = seconds as u64;
    let (h, rem) = (total / 3600, total % 3600);
    let (m, s) = (rem / 60, rem % 60);

    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else if m > 0 {
        format!("{:02}:{:02}", m, s)
    } else {
        format!(":{:02}", s)
    }
}

/// Percentage of `value` over `max`, 0 when `max` is zero.
pub fn percent(value: u64, max: u64) -> f64 {
    if max == 0 {
        0.0
    } else {
        value as f64 / max as f64 * 100.0
    }
}
