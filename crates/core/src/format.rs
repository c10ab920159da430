/// Non-breaking space between a value and its unit, so captions never wrap
/// between the two.
const NBSP: char = '\u{a0}';

/// Format a duration in microseconds for overlay captions, e.g. `1.26 s`.
pub fn format_duration(us: f64) -> String {
    let sign = if us < 0.0 { "-" } else { "" };
    let abs = us.abs();
    if abs >= 60_000_000.0 {
        format!("{sign}{:.1}{NBSP}min", abs / 60_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{sign}{:.2}{NBSP}s", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}{:.1}{NBSP}ms", abs / 1_000.0)
    } else {
        format!("{sign}{:.0}{NBSP}μs", abs)
    }
}
