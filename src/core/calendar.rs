//! The fixed 12-month billing calendar.
//!
//! Bills are labelled with one of twelve month names rather than Gregorian
//! dates. All date arithmetic in the crate (period ordering, multi-month
//! spans, "next bill" lookups) goes through [`Month`] and [`Period`].

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the twelve calendar months, in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    /// Month 1
    Baisakh,
    /// Month 2
    Jestha,
    /// Month 3
    Ashadh,
    /// Month 4
    Shrawan,
    /// Month 5
    Bhadra,
    /// Month 6
    Ashwin,
    /// Month 7
    Kartik,
    /// Month 8
    Mangsir,
    /// Month 9
    Poush,
    /// Month 10
    Magh,
    /// Month 11
    Falgun,
    /// Month 12
    Chaitra,
}

impl Month {
    /// All months in calendar order.
    pub const ALL: [Self; 12] = [
        Self::Baisakh,
        Self::Jestha,
        Self::Ashadh,
        Self::Shrawan,
        Self::Bhadra,
        Self::Ashwin,
        Self::Kartik,
        Self::Mangsir,
        Self::Poush,
        Self::Magh,
        Self::Falgun,
        Self::Chaitra,
    ];

    /// Zero-based position of the month in the calendar.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Month at a zero-based position, wrapping past twelve.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    /// The label stored in the database and shown to users.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Baisakh => "Baisakh",
            Self::Jestha => "Jestha",
            Self::Ashadh => "Ashadh",
            Self::Shrawan => "Shrawan",
            Self::Bhadra => "Bhadra",
            Self::Ashwin => "Ashwin",
            Self::Kartik => "Kartik",
            Self::Mangsir => "Mangsir",
            Self::Poush => "Poush",
            Self::Magh => "Magh",
            Self::Falgun => "Falgun",
            Self::Chaitra => "Chaitra",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::invalid(format!("Unknown month '{wanted}'")))
    }
}

/// A billing period: one month of one year.
///
/// Field order matters: the derived `Ord` compares the year first and then
/// the month index, which is the chronological order used everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Calendar year
    pub year: i32,
    /// Calendar month
    pub month: Month,
}

impl Period {
    /// Creates a period.
    #[must_use]
    pub const fn new(month: Month, year: i32) -> Self {
        Self { year, month }
    }

    /// Parses a stored `(label, year)` pair.
    pub fn parse(month: &str, year: i32) -> Result<Self> {
        Ok(Self::new(month.parse()?, year))
    }

    /// The period `months` months after this one.
    #[must_use]
    pub const fn advance(self, months: usize) -> Self {
        let offset = self.month.index() + months;
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let years = (offset / 12) as i32;
        Self {
            year: self.year + years,
            month: Month::from_index(offset),
        }
    }

    /// The period immediately following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        self.advance(1)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}

/// Inclusive range of years bills may be entered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct YearRange {
    /// First accepted year
    pub first_year: i32,
    /// Last accepted year
    pub last_year: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            first_year: 2080,
            last_year: 2089,
        }
    }
}

impl YearRange {
    /// Whether `year` falls inside the range.
    #[must_use]
    pub const fn contains(&self, year: i32) -> bool {
        year >= self.first_year && year <= self.last_year
    }

    /// Rejects years outside the range with [`Error::InvalidInput`].
    pub fn check(&self, year: i32) -> Result<()> {
        if self.contains(year) {
            Ok(())
        } else {
            Err(Error::invalid(format!(
                "Year {year} is outside the accepted range {}-{}",
                self.first_year, self.last_year
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_month_parse_is_case_insensitive() {
        assert_eq!("baisakh".parse::<Month>().unwrap(), Month::Baisakh);
        assert_eq!("  CHAITRA ".parse::<Month>().unwrap(), Month::Chaitra);
        assert!(matches!(
            "January".parse::<Month>(),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_month_index_round_trip() {
        for (i, month) in Month::ALL.into_iter().enumerate() {
            assert_eq!(month.index(), i);
            assert_eq!(Month::from_index(i), month);
        }
        assert_eq!(Month::from_index(12), Month::Baisakh);
    }

    #[test]
    fn test_period_next_wraps_year() {
        let last = Period::new(Month::Chaitra, 2080);
        assert_eq!(last.next(), Period::new(Month::Baisakh, 2081));

        let mid = Period::new(Month::Poush, 2080);
        assert_eq!(mid.next(), Period::new(Month::Magh, 2080));
    }

    #[test]
    fn test_period_advance_over_multiple_years() {
        let start = Period::new(Month::Falgun, 2080);
        assert_eq!(start.advance(0), start);
        assert_eq!(start.advance(2), Period::new(Month::Baisakh, 2081));
        assert_eq!(start.advance(26), Period::new(Month::Baisakh, 2083));
        assert_eq!(start.advance(28), Period::new(Month::Ashadh, 2083));
    }

    #[test]
    fn test_period_ordering_is_chronological() {
        let mut periods = vec![
            Period::new(Month::Baisakh, 2081),
            Period::new(Month::Chaitra, 2080),
            Period::new(Month::Jestha, 2080),
        ];
        periods.sort();
        assert_eq!(
            periods,
            vec![
                Period::new(Month::Jestha, 2080),
                Period::new(Month::Chaitra, 2080),
                Period::new(Month::Baisakh, 2081),
            ]
        );
    }

    #[test]
    fn test_year_range_check() {
        let range = YearRange::default();
        assert!(range.check(2080).is_ok());
        assert!(range.check(2089).is_ok());
        assert!(range.check(2079).is_err());
        assert!(range.check(2090).is_err());
    }

    #[test]
    fn test_period_display() {
        assert_eq!(Period::new(Month::Magh, 2081).to_string(), "Magh 2081");
    }
}
