const SIZE_UNITS: [&str; 8] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"];

/// Render a byte count with binary (IEC) prefixes, e.g. `1536` -> `1.5 KiB`.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    format_scaled(bytes as f64)
}

/// Anything still at least 1024 Zi after the last division is shown in `Yi`
/// without dividing again.
fn format_scaled(mut value: f64) -> String {
    for unit in SIZE_UNITS {
        if value.abs() < 1024.0 {
            return format!("{value:.1} {unit}B");
        }
        value /= 1024.0;
    }
    format!("{value:.1} YiB")
}
