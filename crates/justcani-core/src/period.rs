//! # Report Periods
//!
//! Resolves "today", "week", "month" and explicit date spans into UTC
//! instants, using the store's fixed UTC offset for day boundaries.
//!
//! ## Day Boundaries
//! ```text
//! Store clock: UTC+07:00 (WIB)
//!
//!   local 2026-01-14 00:00  ──►  UTC 2026-01-13 17:00   (range start)
//!   local 2026-01-15 00:00  ──►  UTC 2026-01-14 17:00   (range end, exclusive)
//! ```
//!
//! Every range is half-open: `start <= t < end`.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::{validate_year, ValidationResult};

/// Western Indonesia Time, in minutes east of UTC.
pub const WIB_OFFSET_MINUTES: i32 = 7 * 60;

// =============================================================================
// Store Clock
// =============================================================================

/// The store's local time zone, as a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreClock {
    offset: FixedOffset,
}

impl StoreClock {
    /// Creates a clock `minutes` east of UTC.
    ///
    /// Returns `None` for offsets outside ±24h.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| StoreClock { offset })
    }

    /// UTC+07:00.
    pub fn wib() -> Self {
        StoreClock::from_offset_minutes(WIB_OFFSET_MINUTES).unwrap_or_else(StoreClock::utc)
    }

    /// UTC+00:00.
    pub fn utc() -> Self {
        StoreClock {
            offset: Utc.fix(),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The store-local calendar date of an instant.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// The instant at which a store-local date begins.
    ///
    /// Clamps to the representable range at chrono's date limits.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_time(NaiveTime::MIN);
        let shift = Duration::seconds(self.offset.local_minus_utc() as i64);

        match local_midnight.checked_sub_signed(shift) {
            Some(utc) => Utc.from_utc_datetime(&utc),
            None if shift > Duration::zero() => DateTime::<Utc>::MIN_UTC,
            None => DateTime::<Utc>::MAX_UTC,
        }
    }

    /// One store-local day.
    pub fn day_range(&self, date: NaiveDate) -> DateRange {
        self.date_span(date, date)
    }

    /// Every day from `first` through `last`, inclusive.
    pub fn date_span(&self, first: NaiveDate, last: NaiveDate) -> DateRange {
        let end_date = last.succ_opt().unwrap_or(NaiveDate::MAX);
        DateRange {
            start: self.start_of_day(first),
            end: self.start_of_day(end_date),
        }
    }

    /// One calendar month.
    ///
    /// ## Errors
    /// `OutOfRange` when `month` is not 1..=12 or the year is outside
    /// `MIN_YEAR..=MAX_YEAR`.
    pub fn month_range(&self, year: i32, month: u32) -> ValidationResult<DateRange> {
        let (first, next) = month_bounds(year, month)?;
        Ok(DateRange {
            start: self.start_of_day(first),
            end: self.start_of_day(next),
        })
    }
}

impl Default for StoreClock {
    fn default() -> Self {
        StoreClock::wib()
    }
}

/// First day of `month` and first day of the following month.
pub fn month_bounds(year: i32, month: u32) -> ValidationResult<(NaiveDate, NaiveDate)> {
    let out_of_range = || ValidationError::OutOfRange {
        field: "month".to_string(),
        min: 1,
        max: 12,
    };

    validate_year(year)?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(out_of_range)?;

    Ok((first, next))
}

/// Every date of a month, in order.
pub fn days_of_month(year: i32, month: u32) -> ValidationResult<Vec<NaiveDate>> {
    let (first, next) = month_bounds(year, month)?;
    Ok(first.iter_days().take_while(|d| *d < next).collect())
}

// =============================================================================
// Date Range
// =============================================================================

/// A half-open interval of instants: `start <= t < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl DateRange {
    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

// =============================================================================
// Report Period
// =============================================================================

/// Dashboard period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    /// Store-local midnight until now.
    #[default]
    Today,
    /// The last 7 days.
    Week,
    /// The last 30 days.
    Month,
}

impl ReportPeriod {
    /// Parses a period keyword. Anything unrecognized means `Today`.
    pub fn parse(keyword: &str) -> Self {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "week" => ReportPeriod::Week,
            "month" => ReportPeriod::Month,
            _ => ReportPeriod::Today,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Today => "today",
            ReportPeriod::Week => "week",
            ReportPeriod::Month => "month",
        }
    }

    /// Resolves the period ending at `now`.
    ///
    /// `now` itself falls inside the range.
    pub fn range(&self, clock: &StoreClock, now: DateTime<Utc>) -> DateRange {
        let start = match self {
            ReportPeriod::Today => clock.start_of_day(clock.local_date(now)),
            ReportPeriod::Week => now - Duration::days(7),
            ReportPeriod::Month => now - Duration::days(30),
        };

        DateRange {
            start,
            end: now + Duration::seconds(1),
        }
    }
}

/// Store-local `(year, month)` of `now`.
pub fn year_month(clock: &StoreClock, now: DateTime<Utc>) -> (i32, u32) {
    let today = clock.local_date(now);
    (today.year(), today.month())
}

// =============================================================================
// Unit Tests
// =============================================================================
