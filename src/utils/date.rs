//! Local civil time handling.
//!
//! Every rule and every day-boundary decision in the crate goes through
//! [`LocalClock`]: one definition of "today", one fixed facility
//! timezone. Timestamps are persisted as UTC; only the conversion to
//! civil dates/hours lives here.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    offset: FixedOffset,
}

impl LocalClock {
    /// Build a clock for a fixed UTC offset in minutes (e.g. 540 = UTC+9).
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        Self { offset }
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Local civil date of an instant.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Local civil date of "now".
    pub fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }

    pub fn local_hour(&self, at: DateTime<Utc>) -> u32 {
        use chrono::Timelike;
        at.with_timezone(&self.offset).hour()
    }

    /// Saturday or Sunday in local civil time.
    pub fn is_weekend(&self, at: DateTime<Utc>) -> bool {
        let wd = self.local_date(at).weekday();
        wd == chrono::Weekday::Sat || wd == chrono::Weekday::Sun
    }

    /// "HH:MM" in local time, for user-facing messages.
    pub fn format_hm(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format("%H:%M").to_string()
    }

    /// Local midnight of `date` as a UTC instant.
    pub fn day_start(&self, date: NaiveDate) -> DateTime<Utc> {
        self.at_time(date, NaiveTime::MIN)
    }

    /// Local `date` at `hour`:00:00 as a UTC instant.
    pub fn at_hour(&self, date: NaiveDate, hour: u32) -> DateTime<Utc> {
        let t = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
        self.at_time(date, t)
    }

    fn at_time(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        // A fixed offset maps every naive datetime to exactly one instant.
        self.offset
            .from_local_datetime(&date.and_time(time))
            .unwrap()
            .with_timezone(&Utc)
    }

    /// First instant of the local month containing `date`, as UTC.
    pub fn month_start(&self, date: NaiveDate) -> DateTime<Utc> {
        let first = date.with_day(1).unwrap_or(date);
        self.day_start(first)
    }

    /// First and last local civil day of the month before the one
    /// containing `date`.
    pub fn previous_month(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let first_of_this = date.with_day(1).unwrap_or(date);
        let last_of_prev = first_of_this - Duration::days(1);
        let first_of_prev = last_of_prev.with_day(1).unwrap_or(last_of_prev);
        (first_of_prev, last_of_prev)
    }

    /// UTC window [start, end) covering the local days `from`..=`to`.
    pub fn day_range(&self, from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.day_start(from), self.day_start(to + Duration::days(1)))
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_date_crosses_midnight() {
        // 23:30 UTC on the 1st is already the 2nd at UTC+9
        let clock = LocalClock::new(540);
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 23, 30, 0).unwrap();
        assert_eq!(clock.local_date(at), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    }

    #[test]
    fn at_hour_round_trips() {
        let clock = LocalClock::new(540);
        let d = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let at = clock.at_hour(d, 22);
        assert_eq!(clock.local_date(at), d);
        assert_eq!(clock.local_hour(at), 22);
    }

    #[test]
    fn previous_month_handles_january() {
        let clock = LocalClock::new(540);
        let d = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let (first, last) = clock.previous_month(d);
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }
}
