//! Salary string normalization.
//!
//! Job boards publish salaries as free text (`"💰 $120k - $150k"`, `"$87.5k"`,
//! `"$12,345"`). [`normalize`] turns such a string into one comparable number.
//! The same function runs at read time for ranking; ingestion keeps the raw
//! text untouched.

use std::sync::LazyLock;

use regex::Regex;

/// Marker every stored salary string starts with.
pub const SALARY_MARKER: &str = "💰";

/// One recognized salary format.
///
/// [`SalaryPattern::ORDERED`] lists the variants in priority order; the first
/// one that matches decides the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalaryPattern {
    /// `$<A>k - $<B>k`, valued at the upper bound.
    Range,
    /// `$<N>k`.
    Abbreviated,
    /// `$<N,NNN>`, a comma-grouped absolute figure.
    Absolute,
}

impl SalaryPattern {
    /// All patterns, highest priority first.
    pub const ORDERED: [SalaryPattern; 3] = [
        SalaryPattern::Range,
        SalaryPattern::Abbreviated,
        SalaryPattern::Absolute,
    ];

    /// Try this pattern against `text`, returning its numeric value on a match.
    pub fn apply(self, text: &str) -> Option<f64> {
        static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?i)\$\s*[\d.]+\s*k\s*-\s*\$\s*([\d.]+)\s*k").expect("valid regex")
        });
        static ABBREVIATED_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"(?i)\$\s*([\d.]+)\s*k").expect("valid regex"));
        static ABSOLUTE_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\s*(\d[\d,]*)").expect("valid regex"));

        match self {
            SalaryPattern::Range => RANGE_RE
                .captures(text)
                .and_then(|caps| parse_decimal(&caps[1]))
                .map(|upper| upper * 1000.0),
            SalaryPattern::Abbreviated => ABBREVIATED_RE
                .captures(text)
                .and_then(|caps| parse_decimal(&caps[1]))
                .map(|value| value * 1000.0),
            SalaryPattern::Absolute => ABSOLUTE_RE
                .captures(text)
                .and_then(|caps| caps[1].replace(',', "").parse::<f64>().ok()),
        }
    }
}

/// Parse a salary string into a comparable value.
///
/// Returns `0.0` for absent, empty, or unrecognized input.
pub fn normalize(salary: Option<&str>) -> f64 {
    let Some(text) = salary.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0.0;
    };

    SalaryPattern::ORDERED
        .iter()
        .find_map(|pattern| pattern.apply(text))
        .unwrap_or(0.0)
}

/// Prefix a bare salary figure with [`SALARY_MARKER`].
///
/// Empty input stays empty; already-marked input is returned unchanged.
pub fn with_marker(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with(SALARY_MARKER) {
        raw.to_string()
    } else {
        format!("{SALARY_MARKER} {raw}")
    }
}

/// Lenient decimal parsing that tolerates a stray trailing dot.
fn parse_decimal(s: &str) -> Option<f64> {
    let s = s.trim_end_matches('.');
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_uses_upper_bound() {
        assert_eq!(normalize(Some("$80k - $95k")), 95_000.0);
        assert_eq!(normalize(Some("💰 $120k - $150k")), 150_000.0);
        assert_eq!(normalize(Some("$70K-$90K")), 90_000.0);
        assert_eq!(normalize(Some("💰 $60k   -   $72.5k")), 72_500.0);
    }

    #[test]
    fn abbreviated_keeps_fraction() {
        assert_eq!(normalize(Some("$87.5k")), 87_500.0);
        assert_eq!(normalize(Some("💰 $120k")), 120_000.0);
        assert_eq!(normalize(Some("$40K")), 40_000.0);
    }

    #[test]
    fn absolute_strips_commas() {
        assert_eq!(normalize(Some("$12,345")), 12_345.0);
        assert_eq!(normalize(Some("💰 $100,000")), 100_000.0);
        assert_eq!(normalize(Some("$95000")), 95_000.0);
    }

    #[test]
    fn absent_or_unparsable_is_zero() {
        assert_eq!(normalize(None), 0.0);
        assert_eq!(normalize(Some("")), 0.0);
        assert_eq!(normalize(Some("   ")), 0.0);
        assert_eq!(normalize(Some("Competitive")), 0.0);
        assert_eq!(normalize(Some("💰 DOE")), 0.0);
    }

    #[test]
    fn range_wins_over_single_value() {
        assert_eq!(SalaryPattern::Range.apply("$50k - $60k"), Some(60_000.0));
        // The abbreviated matcher alone would pick the lower bound.
        assert_eq!(SalaryPattern::Abbreviated.apply("$50k - $60k"), Some(50_000.0));
        assert_eq!(SalaryPattern::Range.apply("$50k"), None);
    }

    #[test]
    fn abbreviated_wins_over_absolute() {
        assert_eq!(normalize(Some("$1,000 or $90k")), 90_000.0);
        assert_eq!(SalaryPattern::Absolute.apply("$90k"), Some(90.0));
    }

    #[test]
    fn marker_prefix() {
        assert_eq!(with_marker("$12,345"), "💰 $12,345");
        assert_eq!(with_marker("💰 $12,345"), "💰 $12,345");
        assert_eq!(with_marker(""), "");
    }

    #[test]
    fn oversized_absolute_figure_still_orders() {
        let huge = normalize(Some("$99999999999999999999999"));
        assert!(huge > normalize(Some("$1,000,000")));
        assert!(huge.is_finite());
    }
}
