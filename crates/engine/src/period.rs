use serde::{Deserialize, Serialize};

/// Year of a period code.
///
/// `YYYY` is annual. Five- and six-digit codes (`YYYYQ`, `YYYYMM`) keep only
/// the leading four digits. Anything else is not a period.
pub fn parse_year(period: &str) -> Option<i32> {
    if !period.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match period.len() {
        4 => period.parse().ok(),
        5 | 6 => period[..4].parse().ok(),
        _ => None,
    }
}

/// Inclusive year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub from: i32,
    pub to: i32,
}

impl YearRange {
    pub fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    /// Every representable year.
    pub fn unbounded() -> Self {
        Self {
            from: i32::MIN,
            to: i32::MAX,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.from <= year && year <= self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annual_monthly_quarterly() {
        assert_eq!(parse_year("2021"), Some(2021));
        assert_eq!(parse_year("202103"), Some(2021));
        assert_eq!(parse_year("20214"), Some(2021));
    }

    #[test]
    fn rejects_other_shapes() {
        assert_eq!(parse_year("abc"), None);
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("202"), None);
        assert_eq!(parse_year("2021M03"), None);
        assert_eq!(parse_year("2021Q1"), None);
        assert_eq!(parse_year("1234567"), None);
        assert_eq!(parse_year("-2021"), None);
        assert_eq!(parse_year(" 2021"), None);
    }

    #[test]
    fn range_is_inclusive() {
        let range = YearRange::new(2020, 2022);
        assert!(range.contains(2020));
        assert!(range.contains(2022));
        assert!(!range.contains(2019));
        assert!(!range.contains(2023));
        assert!(YearRange::unbounded().contains(1850));
    }
}
