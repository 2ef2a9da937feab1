//! Timestamp utilities and the reference time zone
//!
//! All "today" computations are anchored to one fixed UTC offset rather than
//! the client's local zone, so every client buckets review dates identically.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, SecondsFormat, TimeZone, Utc};

use crate::{Error, Result};

/// Default reference offset: UTC+08:00 (no daylight saving)
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

/// Largest offset accepted from configuration (±18h, chrono's own bound)
pub const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// RFC 3339 rendering used for persisted creation timestamps
///
/// Microsecond precision keeps lexical order equal to chronological order.
pub fn to_storage_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Fixed reference zone used for calendar-day bucketing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone {
    offset: FixedOffset,
}

impl ReferenceZone {
    /// Build a zone from an offset east of UTC in minutes
    pub fn from_offset_minutes(minutes: i32) -> Result<Self> {
        if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(Error::Config(format!(
                "UTC offset {} minutes is outside ±{} minutes",
                minutes, MAX_UTC_OFFSET_MINUTES
            )));
        }

        FixedOffset::east_opt(minutes * 60)
            .map(|offset| Self { offset })
            .ok_or_else(|| Error::Config(format!("Invalid UTC offset: {} minutes", minutes)))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar date of the given instant in this zone
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Current calendar date in this zone
    pub fn today(&self) -> NaiveDate {
        self.date_of(now())
    }

    /// First instant of `date` in this zone
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        self.at(date, NaiveTime::MIN)
    }

    /// Last representable millisecond of `date` in this zone
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        self.at(date, last)
    }

    fn at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<FixedOffset> {
        // A fixed offset has no gaps or folds, so the mapping is always single
        self.offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .unwrap_or_else(|| self.offset.from_utc_datetime(&date.and_time(time)))
    }
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_default_zone_is_utc_plus_eight() {
        let zone = ReferenceZone::default();
        assert_eq!(zone.offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_date_rolls_over_before_utc_midnight() {
        let zone = ReferenceZone::default();
        // 16:30 UTC is 00:30 the next day at +08:00
        let instant = utc(2024, 1, 1, 16, 30);
        assert_eq!(zone.date_of(instant), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        let before = utc(2024, 1, 1, 15, 59);
        assert_eq!(zone.date_of(before), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_negative_offset() {
        let zone = ReferenceZone::from_offset_minutes(-5 * 60).unwrap();
        let instant = utc(2024, 3, 10, 2, 0);
        assert_eq!(zone.date_of(instant), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }

    #[test]
    fn test_offset_out_of_range_rejected() {
        assert!(ReferenceZone::from_offset_minutes(19 * 60).is_err());
        assert!(ReferenceZone::from_offset_minutes(-19 * 60).is_err());
        assert!(ReferenceZone::from_offset_minutes(5 * 60 + 30).is_ok());
    }

    #[test]
    fn test_day_bounds() {
        let zone = ReferenceZone::default();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let start = zone.start_of_day(date);
        assert_eq!(start.date_naive(), date);
        assert_eq!(start.hour(), 0);
        assert_eq!(start.with_timezone(&Utc), utc(2023, 12, 31, 16, 0));

        let end = zone.end_of_day(date);
        assert_eq!(end.date_naive(), date);
        assert_eq!(end.hour(), 23);
        assert!(end > start);
    }

    #[test]
    fn test_storage_timestamp_orders_lexically() {
        let earlier = to_storage_timestamp(utc(2024, 1, 1, 9, 0));
        let later = to_storage_timestamp(utc(2024, 1, 1, 10, 0));
        assert!(earlier < later);
        assert!(earlier.ends_with('Z'));
    }
}
