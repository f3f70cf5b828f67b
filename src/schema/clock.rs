//! Time source for derived timestamps
//!
//! Calendar-day arithmetic keeps the wall-clock time and moves the date:
//! 10:00 on the day before a DST switch becomes 10:00 the next day, which is
//! 23 or 25 hours later, not 24. Only a zone-aware clock can tell the
//! difference; a fixed-offset clock has no DST and the two coincide.

use chrono::{DateTime, Days, Duration, FixedOffset, Local, SecondsFormat, TimeZone, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Same wall-clock time `days` calendar days after `from`.
    fn add_calendar_days(&self, from: DateTime<FixedOffset>, days: u32) -> DateTime<FixedOffset> {
        from.checked_add_days(Days::new(days.into()))
            .unwrap_or_else(|| from + Duration::days(days.into()))
    }
}

/// Wall clock in a time zone.
#[derive(Debug, Clone, Copy)]
pub struct ZonedClock<Tz: TimeZone> {
    zone: Tz,
}

/// Wall clock in the host's local time zone.
pub type SystemClock = ZonedClock<Local>;

impl<Tz: TimeZone> ZonedClock<Tz> {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> &Tz {
        &self.zone
    }
}

impl Default for ZonedClock<Local> {
    fn default() -> Self {
        Self::new(Local)
    }
}

impl<Tz> Clock for ZonedClock<Tz>
where
    Tz: TimeZone + Send + Sync,
{
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.zone).fixed_offset()
    }

    fn add_calendar_days(&self, from: DateTime<FixedOffset>, days: u32) -> DateTime<FixedOffset> {
        // Falls back to a fixed duration when the target local time does not
        // exist (spring-forward gap).
        from.with_timezone(&self.zone)
            .checked_add_days(Days::new(days.into()))
            .map(|t| t.fixed_offset())
            .unwrap_or_else(|| from + Duration::days(days.into()))
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self { at }
    }

    /// Parses an RFC 3339 instant.
    pub fn parse(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(rfc3339).map(Self::new)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.at
    }
}

/// Wire format for timestamps.
pub fn format_timestamp(t: DateTime<FixedOffset>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    #[test]
    fn test_fixed_clock_calendar_day() {
        let clock = FixedClock::parse("2024-03-01T10:00:00Z").unwrap();
        let next = clock.add_calendar_days(clock.now(), 1);
        assert_eq!(next, parse_timestamp("2024-03-02T10:00:00Z").unwrap());
    }

    #[test]
    fn test_calendar_day_crosses_month_and_leap_day() {
        let clock = FixedClock::parse("2024-02-28T23:30:00+02:00").unwrap();
        let next = clock.add_calendar_days(clock.now(), 1);
        assert_eq!(format_timestamp(next), "2024-02-29T23:30:00+02:00");
    }

    #[test]
    fn test_spring_forward_day_is_23_hours() {
        let clock = ZonedClock::new(New_York);
        let from = parse_timestamp("2024-03-09T10:00:00-05:00").unwrap();
        let next = clock.add_calendar_days(from, 1);
        assert_eq!(format_timestamp(next), "2024-03-10T10:00:00-04:00");
        assert_eq!(next - from, Duration::hours(23));
    }

    #[test]
    fn test_fall_back_day_is_25_hours() {
        let clock = ZonedClock::new(New_York);
        let from = parse_timestamp("2024-11-02T10:00:00-04:00").unwrap();
        let next = clock.add_calendar_days(from, 1);
        assert_eq!(format_timestamp(next), "2024-11-03T10:00:00-05:00");
        assert_eq!(next - from, Duration::hours(25));
    }

    #[test]
    fn test_zone_without_dst_is_24_hours() {
        let clock = ZonedClock::new(Utc);
        let from = parse_timestamp("2024-03-09T10:00:00Z").unwrap();
        assert_eq!(clock.add_calendar_days(from, 1) - from, Duration::hours(24));
    }

    #[test]
    fn test_missing_local_time_falls_back_to_duration() {
        // 02:30 on 2024-03-10 does not exist in New York.
        let clock = ZonedClock::new(New_York);
        let from = parse_timestamp("2024-03-09T02:30:00-05:00").unwrap();
        let next = clock.add_calendar_days(from, 1);
        assert_eq!(next - from, Duration::hours(24));
    }

    #[test]
    fn test_system_clock_keeps_wall_time() {
        let clock = SystemClock::default();
        let now = clock.now();
        let next = clock.add_calendar_days(now, 1);
        let local_now = now.with_timezone(&Local);
        let local_next = next.with_timezone(&Local);
        assert_eq!(local_next.date_naive(), local_now.date_naive().succ_opt().unwrap());
        assert_eq!(local_next.time(), local_now.time());
    }

    #[test]
    fn test_format_round_trip_keeps_subseconds() {
        let t = parse_timestamp("2024-03-01T10:00:00.123456Z").unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(t)), Some(t));
    }
}
