//! 24-hour accumulation periods.
//!
//! Reports are accumulated over fixed, non-overlapping 24 h windows and
//! every file and plot is labelled by the window's end time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// Length of one accumulation period in hours.
pub const ACCUMULATION_HOURS: i64 = 24;

/// A 24 h accumulation window, identified by its end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccumulationPeriod {
    end: DateTime<Utc>,
}

impl AccumulationPeriod {
    pub fn ending_at(end: DateTime<Utc>) -> Self {
        Self { end }
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            end: start + Duration::hours(ACCUMULATION_HOURS),
        }
    }

    /// Parse a period start written as `YYYYMMDDHH`.
    pub fn parse_start(s: &str) -> CommonResult<Self> {
        let naive = NaiveDateTime::parse_from_str(&format!("{}00", s.trim()), "%Y%m%d%H%M")
            .map_err(|e| CommonError::InvalidTime(format!("{}: {}", s, e)))?;
        Ok(Self::starting_at(Utc.from_utc_datetime(&naive)))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.end - Duration::hours(ACCUMULATION_HOURS)
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// The period that follows this one without overlap.
    pub fn next(&self) -> Self {
        Self::starting_at(self.end)
    }
}

/// Every period of a calendar year.
///
/// The first period starts on 1 January at 00 UTC and the last one starts on
/// 31 December at 00 UTC, so a year yields one period per calendar day.
pub fn periods_in_year(year: i32) -> CommonResult<YearPeriods> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(CommonError::InvalidYear(year))?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(CommonError::InvalidYear(year))?;

    Ok(YearPeriods {
        cursor: Utc.from_utc_datetime(&first.and_time(Default::default())),
        last_start: Utc.from_utc_datetime(&last.and_time(Default::default())),
    })
}

/// Number of calendar days in `year`.
pub fn days_in_year(year: i32) -> u32 {
    match NaiveDate::from_ymd_opt(year, 12, 31) {
        Some(date) => date.ordinal(),
        None => 0,
    }
}

/// Iterator over the accumulation periods of one year.
#[derive(Debug, Clone)]
pub struct YearPeriods {
    cursor: DateTime<Utc>,
    last_start: DateTime<Utc>,
}

impl Iterator for YearPeriods {
    type Item = AccumulationPeriod;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor > self.last_start {
            return None;
        }
        let period = AccumulationPeriod::starting_at(self.cursor);
        self.cursor += Duration::hours(ACCUMULATION_HOURS);
        Some(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_start() {
        let period = AccumulationPeriod::parse_start("2021090100").unwrap();
        assert_eq!(period.start(), Utc.with_ymd_and_hms(2021, 9, 1, 0, 0, 0).unwrap());
        assert_eq!(period.end(), Utc.with_ymd_and_hms(2021, 9, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_start_rejects_garbage() {
        assert!(AccumulationPeriod::parse_start("2021-09-01").is_err());
    }

    #[test]
    fn test_periods_cover_year_without_gaps() {
        let periods: Vec<_> = periods_in_year(2021).unwrap().collect();
        assert_eq!(periods.len(), 365);
        assert_eq!(periods[0].end(), Utc.with_ymd_and_hms(2021, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(
            periods[364].end(),
            Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()
        );
        for pair in periods.windows(2) {
            assert_eq!(pair[1].start(), pair[0].end());
            assert_eq!(pair[0].next(), pair[1]);
        }
        assert!(periods.iter().all(|p| p.end().hour() == 0));
    }

    #[test]
    fn test_leap_year_has_366_periods() {
        assert_eq!(periods_in_year(2020).unwrap().count(), 366);
        assert_eq!(days_in_year(2020), 366);
        assert_eq!(days_in_year(2100), 365);
    }
}
