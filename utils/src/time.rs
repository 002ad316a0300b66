//! Time formatting helpers.

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Format a duration in seconds using its two most significant units,
/// e.g. `59d 23h`, `4h 0m`, `12s`.
pub fn format_duration(secs: u64) -> String {
    let Some(first) = UNITS.iter().position(|(size, _)| secs >= *size) else {
        return "0s".to_string();
    };
    let (size, unit) = UNITS[first];
    let mut out = format!("{}{}", secs / size, unit);
    if let Some((next_size, next_unit)) = UNITS.get(first + 1) {
        out.push_str(&format!(" {}{}", (secs % size) / next_size, next_unit));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_scale() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(3_660), "1h 1m");
        assert_eq!(format_duration(4 * 3_600), "4h 0m");
        assert_eq!(format_duration(60 * 86_400 + 7_200), "60d 2h");
    }
}
