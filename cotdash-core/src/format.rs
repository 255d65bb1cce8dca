//! Display formatting for report values.

/// Placeholder for missing or unavailable data.
pub const PLACEHOLDER: &str = "--";

/// Default number of decimal digits shown in report cells.
pub const DEFAULT_DECIMALS: usize = 2;

/// Round to `decimals` digits and drop trailing zeros: `10.0 -> "10"`,
/// `1.2345 -> "1.23"`, `-0.001 -> "0"`.
///
/// Non-finite values degrade to their plain string conversion.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let mut s = format!("{value:.decimals$}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_zeros() {
        assert_eq!(format_number(10.0, 2), "10");
        assert_eq!(format_number(1.5, 2), "1.5");
        assert_eq!(format_number(1.2345, 2), "1.23");
        assert_eq!(format_number(-1234.567, 2), "-1234.57");
    }

    #[test]
    fn negative_zero_after_rounding_is_zero() {
        assert_eq!(format_number(-0.001, 2), "0");
        assert_eq!(format_number(-0.0, 2), "0");
    }

    #[test]
    fn zero_decimals() {
        assert_eq!(format_number(1500.0, 0), "1500");
        assert_eq!(format_number(2.6, 0), "3");
    }

    #[test]
    fn non_finite_passes_through() {
        assert_eq!(format_number(f64::NAN, 2), "NaN");
        assert_eq!(format_number(f64::INFINITY, 2), "inf");
    }
}
