use qclock::analytics::TimeBucket;
use unicode_width::UnicodeWidthStr;

/// Label/value pairs for the time distribution bar chart
pub fn bucket_bars(buckets: &[TimeBucket]) -> Vec<(&str, u64)> {
    buckets
        .iter()
        .map(|b| (b.label.as_str(), b.count as u64))
        .collect()
}

/// Bars are at least as wide as their longest label so labels are not clipped
pub fn bar_width(buckets: &[TimeBucket]) -> u16 {
    buckets
        .iter()
        .map(|b| b.label.width() as u16)
        .max()
        .unwrap_or(0)
        .max(3)
}

/// Format a percentage consistently: whole numbers without decimals
pub fn format_percent(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}%", val.round())
    } else {
        format!("{val:.1}%")
    }
}
