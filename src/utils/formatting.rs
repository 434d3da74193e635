/// Human-readable duration for a millisecond value.
pub fn format_duration(ms: f64) -> String {
    let ms = ms.max(0.0);
    if ms < 1000.0 {
        format!("{:.0}ms", ms)
    } else if ms < 60_000.0 {
        format!("{:.1}s", ms / 1000.0)
    } else {
        let total_secs = (ms / 1000.0) as u64;
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    }
}

/// Percentage without trailing zeros: `100`, `50`, `33.33`.
pub fn format_percent(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{}%", text)
}

/// `1 failed page`, `2 failed pages`.
pub fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
