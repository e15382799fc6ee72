pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Share of `part` in `whole` as a percentage; zero when `whole` is zero
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// `m:ss`, or `h:mm:ss` past the hour
pub fn format_duration_ms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let (hours, minutes, seconds) = (total_secs / 3600, (total_secs / 60) % 60, total_secs % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Remaining time for display; overtime is shown with a leading `+`
pub fn format_remaining_ms(ms: i64) -> String {
    if ms < 0 {
        format!("+{}", format_duration_ms(ms.unsigned_abs()))
    } else {
        format_duration_ms(ms as u64)
    }
}

/// Short label for a bucket bound in seconds: `45s`, `2m`, `1m30s`
pub fn format_bound_secs(secs: u64) -> String {
    match (secs / 60, secs % 60) {
        (0, s) => format!("{s}s"),
        (m, 0) => format!("{m}m"),
        (m, s) => format!("{m}m{s}s"),
    }
}
