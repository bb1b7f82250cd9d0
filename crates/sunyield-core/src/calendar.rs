//! Calendar arithmetic: periods, leap years and hour counts.

use std::{fmt, ops::RangeInclusive};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const HOURS_PER_DAY: u32 = 24;
pub const HOURS_IN_COMMON_YEAR: u32 = 8760;
pub const HOURS_IN_LEAP_YEAR: u32 = 8784;

/// A calendar month. Ordered by year, then month.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Period {
  pub year:  i32,
  pub month: u32,
}

impl Period {
  pub fn new(year: i32, month: u32) -> Result<Self> {
    if !(1..=12).contains(&month) {
      return Err(Error::InvalidMonth { year, month });
    }
    Ok(Self { year, month })
  }

  /// The month containing `date`.
  pub fn of(date: NaiveDate) -> Self {
    Self { year: date.year(), month: date.month() }
  }

  pub fn days(self) -> u32 { days_in_month(self.year, self.month) }

  pub fn hours(self) -> u32 { self.days() * HOURS_PER_DAY }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year, self.month)
  }
}

/// Gregorian rule: divisible by 4, and not by 100 unless also by 400.
pub fn is_leap_year(year: i32) -> bool {
  year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// True calendar length of a month (28–31 days).
///
/// `month` must be in `1..=12`; [`Period::new`] enforces this for periods.
pub fn days_in_month(year: i32, month: u32) -> u32 {
  match month {
    1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
    4 | 6 | 9 | 11 => 30,
    _ if is_leap_year(year) => 29,
    _ => 28,
  }
}

pub fn hours_in_month(year: i32, month: u32) -> u32 {
  days_in_month(year, month) * HOURS_PER_DAY
}

pub fn hours_in_year(year: i32) -> u32 {
  if is_leap_year(year) { HOURS_IN_LEAP_YEAR } else { HOURS_IN_COMMON_YEAR }
}

/// Sum of [`hours_in_year`] over an inclusive range of years.
pub fn hours_in_years(years: RangeInclusive<i32>) -> u64 {
  years.map(|y| u64::from(hours_in_year(y))).sum()
}
