//! Month arithmetic for the backward walk.
//!
//! The harvester processes exactly one calendar month at a time. A [`MonthCursor`] names that
//! month, [`MonthCursor::range`] turns it into the inclusive pair of dates used in the search
//! query, and [`MonthCursor::previous`] is the only way the walk moves.
//!
//! Stepping is done with explicit month arithmetic. Subtracting a fixed number of days (for
//! example 30) drifts across months of different lengths and eventually skips or repeats whole
//! months, so it is never used here.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use harvester::calendar::{last_day_of_month, MonthCursor};
//!
//! assert_eq!(last_day_of_month(2024, 2), 29);
//!
//! let cursor = MonthCursor::new(2025, 1)?;
//! let previous = cursor.previous().unwrap();
//! assert_eq!((previous.year(), previous.month()), (2024, 12));
//!
//! let range = MonthCursor::new(2024, 2)?.range();
//! assert_eq!(range.first(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
//! assert_eq!(range.last(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
//! # Ok::<(), harvester::error::HarvestError>(())
//! ```

use chrono::{Days, NaiveDateTime, NaiveTime};

use super::*;

/// Earliest year a cursor may point at.
pub const MIN_YEAR: i32 = 1;

/// Latest year a cursor may point at. Checkpoints store four-digit ISO-8601 years.
pub const MAX_YEAR: i32 = 9999;

/// Number of days in `month` of `year`.
///
/// Returns 30 for April, June, September and November, 29 or 28 for February depending on
/// whether `year` is a leap year, and 31 otherwise. The caller guarantees `month` is in
/// `1..=12`.
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
  match month {
    4 | 6 | 9 | 11 => 30,
    2 if is_leap_year(year) => 29,
    2 => 28,
    _ => 31,
  }
}

/// Gregorian leap year rule.
pub fn is_leap_year(year: i32) -> bool { year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) }

/// Position of the backward walk: a calendar month with no day component.
///
/// Cursors are always valid: the month is in `1..=12` and the year in
/// [`MIN_YEAR`]`..=`[`MAX_YEAR`]. They parse from and display as `YYYY-MM`, which is also how
/// they are (de)serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthCursor {
  /// First day of the month; the day is always 1
  first_day: NaiveDate,
}

/// Inclusive first and last calendar day of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
  /// First day of the month
  first: NaiveDate,
  /// Last day of the month
  last:  NaiveDate,
}

impl MonthCursor {
  /// Creates a cursor for `month` of `year`.
  ///
  /// # Errors
  ///
  /// Returns [`HarvestError::InvalidMonth`] if `month` is outside `1..=12`, and
  /// [`HarvestError::InvalidCursor`] if `year` is outside [`MIN_YEAR`]`..=`[`MAX_YEAR`].
  pub fn new(year: i32, month: u32) -> Result<Self> {
    if !(1..=12).contains(&month) {
      return Err(HarvestError::InvalidMonth(month));
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
      return Err(HarvestError::InvalidCursor(format!("{year:04}-{month:02}")));
    }
    NaiveDate::from_ymd_opt(year, month, 1)
      .map(|first_day| Self { first_day })
      .ok_or_else(|| HarvestError::InvalidCursor(format!("{year:04}-{month:02}")))
  }

  /// The month that contains `date`.
  pub fn containing(date: NaiveDate) -> Result<Self> { Self::new(date.year(), date.month()) }

  /// The current month in UTC.
  pub fn current() -> Result<Self> { Self::containing(Utc::now().date_naive()) }

  /// Calendar year.
  pub fn year(&self) -> i32 { self.first_day.year() }

  /// Calendar month, `1..=12`.
  pub fn month(&self) -> u32 { self.first_day.month() }

  /// The inclusive range of dates covered by this month.
  pub fn range(&self) -> MonthRange {
    let days = last_day_of_month(self.year(), self.month());
    MonthRange { first: self.first_day, last: self.first_day + Days::new(u64::from(days - 1)) }
  }

  /// The month before this one.
  ///
  /// January steps back to December of the previous year. Returns `None` only when that would
  /// leave the supported calendar, i.e. stepping back from January of [`MIN_YEAR`].
  pub fn previous(&self) -> Option<Self> {
    let (year, month) = match self.month() {
      1 => (self.year() - 1, 12),
      month => (self.year(), month - 1),
    };
    Self::new(year, month).ok()
  }

  /// Midnight on the first day of the month, used for checkpoint timestamps.
  pub fn start_of_month(&self) -> NaiveDateTime { self.first_day.and_time(NaiveTime::MIN) }
}

impl MonthRange {
  /// First day of the month.
  pub fn first(&self) -> NaiveDate { self.first }

  /// Last day of the month.
  pub fn last(&self) -> NaiveDate { self.last }

  /// Whether `date` falls inside the range, bounds included.
  pub fn contains(&self, date: NaiveDate) -> bool { self.first <= date && date <= self.last }
}

impl Display for MonthCursor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:04}-{:02}", self.year(), self.month())
  }
}

impl Display for MonthRange {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} to {}", self.first, self.last)
  }
}

impl FromStr for MonthCursor {
  type Err = HarvestError;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || HarvestError::InvalidCursor(s.to_owned());
    let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = month.parse::<u32>().map_err(|_| invalid())?;
    Self::new(year, month)
  }
}

impl TryFrom<String> for MonthCursor {
  type Error = HarvestError;

  fn try_from(value: String) -> Result<Self> { value.parse() }
}

impl From<MonthCursor> for String {
  fn from(cursor: MonthCursor) -> Self { cursor.to_string() }
}
