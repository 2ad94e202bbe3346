use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A bookkeeping month. Ordering is derived from field order (year, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

// Deserialization goes through `new` so an out-of-range month can never
// reach first_day/last_day, which assume 1..=12.
impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            year: i32,
            month: u32,
        }
        let raw = Raw::deserialize(deserializer)?;
        YearMonth::new(raw.year, raw.month).ok_or_else(|| {
            serde::de::Error::custom(format!("month out of range: {}", raw.month))
        })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(YearMonth { year, month })
        } else {
            None
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap()
    }

    /// Last calendar day of the month, leap-year aware.
    pub fn last_day(self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap()
    }

    pub fn next(self) -> YearMonth {
        if self.month == 12 {
            YearMonth { year: self.year + 1, month: 1 }
        } else {
            YearMonth { year: self.year, month: self.month + 1 }
        }
    }

    /// Prior calendar month, rolling the year back at a January boundary.
    pub fn previous(self) -> YearMonth {
        if self.month == 1 {
            YearMonth { year: self.year - 1, month: 12 }
        } else {
            YearMonth { year: self.year, month: self.month - 1 }
        }
    }
}

/// A reporting period: either one month or a whole calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Month(YearMonth),
    Year(i32),
}

impl Period {
    pub fn bounds(self) -> DateRange {
        match self {
            Period::Month(ym) => DateRange::new(ym.first_day(), ym.last_day()),
            Period::Year(year) => DateRange::new(
                NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// The month the current bookkeeping regime began. Ledger data before it
/// does not exist in this system, so period lookups clamp to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch(pub YearMonth);

impl Epoch {
    pub fn clamp(self, ym: YearMonth) -> YearMonth {
        if ym < self.0 {
            self.0
        } else {
            ym
        }
    }

    /// True exactly at the cut-over month, where prior-period figures come
    /// from configured carry-over constants instead of ledger data.
    pub fn is_start(self, ym: YearMonth) -> bool {
        ym == self.0
    }
}
