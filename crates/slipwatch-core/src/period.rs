//! Two-digit court terms.
//!
//! The opinions listing is partitioned by term, addressed as `Term=YY`. A
//! [`PeriodRange`] is half-open: the current term is never part of the default
//! range, matching how the listing site publishes completed terms.

use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::PeriodError;

/// How far back the default range starts, in terms.
pub const DEFAULT_LOOKBACK: u8 = 3;

/// A two-digit reporting period (`00`..=`99`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Period(u8);

impl Period {
    pub fn new(yy: u8) -> Result<Self, PeriodError> {
        if yy > 99 {
            return Err(PeriodError::Invalid(yy.to_string()));
        }
        Ok(Self(yy))
    }

    /// The term for a calendar year (`2014` → `14`).
    pub fn from_year(year: i32) -> Self {
        Self(year.rem_euclid(100) as u8)
    }

    /// The term for the current year on the local wall clock.
    pub fn current() -> Self {
        Self::from_year(chrono::Local::now().year())
    }

    /// Parse `YY` (one or two digits) or a four-digit year `YYYY`.
    pub fn parse(s: &str) -> Result<Self, PeriodError> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PeriodError::Invalid(s.to_string()));
        }
        match s.len() {
            1 | 2 => s
                .parse::<u8>()
                .map(Self)
                .map_err(|_| PeriodError::Invalid(s.to_string())),
            4 => s
                .parse::<i32>()
                .map(Self::from_year)
                .map_err(|_| PeriodError::Invalid(s.to_string())),
            _ => Err(PeriodError::Invalid(s.to_string())),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// The term `n` periods earlier, clamped at `00`.
    pub fn back(self, n: u8) -> Self {
        Self(self.0.saturating_sub(n))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl TryFrom<u8> for Period {
    type Error = PeriodError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Period> for u8 {
    fn from(p: Period) -> u8 {
        p.0
    }
}

/// Terms in `[start, end)`, iterated in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub start: Period,
    pub end: Period,
}

impl PeriodRange {
    pub fn new(start: Period, end: Period) -> Self {
        Self { start, end }
    }

    /// `[current - DEFAULT_LOOKBACK, current)`.
    pub fn default_for(current: Period) -> Self {
        Self::new(current.back(DEFAULT_LOOKBACK), current)
    }

    pub fn iter(&self) -> impl Iterator<Item = Period> + use<> {
        (self.start.0..self.end.0).map(Period)
    }

    pub fn len(&self) -> usize {
        usize::from(self.end.0.saturating_sub(self.start.0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_follows_local_year() {
        let expected = Period::from_year(chrono::Local::now().year());
        assert_eq!(Period::current(), expected);
    }

    #[test]
    fn parse_two_digit() {
        assert_eq!(Period::parse("03").unwrap().value(), 3);
        assert_eq!(Period::parse("3").unwrap().value(), 3);
        assert_eq!(Period::parse(" 14 ").unwrap().value(), 14);
    }

    #[test]
    fn parse_four_digit_year() {
        assert_eq!(Period::parse("2014").unwrap().value(), 14);
        assert_eq!(Period::parse("2003").unwrap().value(), 3);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Period::parse("").is_err());
        assert!(Period::parse("abc").is_err());
        assert!(Period::parse("123").is_err());
        assert!(Period::parse("-3").is_err());
        assert!(Period::parse("20140").is_err());
    }

    #[test]
    fn new_rejects_three_digits() {
        assert!(Period::new(100).is_err());
        assert!(Period::new(99).is_ok());
    }

    #[test]
    fn display_is_zero_padded() {
        assert_eq!(Period::new(3).unwrap().to_string(), "03");
        assert_eq!(Period::new(14).unwrap().to_string(), "14");
    }

    #[test]
    fn back_clamps_at_zero() {
        assert_eq!(Period::new(1).unwrap().back(3).value(), 0);
        assert_eq!(Period::new(26).unwrap().back(3).value(), 23);
    }

    #[test]
    fn range_is_half_open() {
        let range = PeriodRange::new(Period::new(3).unwrap(), Period::new(6).unwrap());
        let terms: Vec<u8> = range.iter().map(Period::value).collect();
        assert_eq!(terms, vec![3, 4, 5]);
        assert_eq!(range.len(), 3);
    }

    #[test]
    fn inverted_range_is_empty() {
        let range = PeriodRange::new(Period::new(98).unwrap(), Period::new(26).unwrap());
        assert!(range.is_empty());
        assert_eq!(range.iter().count(), 0);
    }

    #[test]
    fn default_range_looks_back_three_terms() {
        let range = PeriodRange::default_for(Period::new(26).unwrap());
        let terms: Vec<String> = range.iter().map(|p| p.to_string()).collect();
        assert_eq!(terms, vec!["23", "24", "25"]);
    }

    #[test]
    fn from_year_wraps_century() {
        assert_eq!(Period::from_year(2099).value(), 99);
        assert_eq!(Period::from_year(2100).value(), 0);
    }
}
