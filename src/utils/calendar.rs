use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc,
    Weekday,
};
use once_cell::sync::Lazy;

/// A scan strictly after this wall-clock time is late.
pub static LATE_CUTOFF: Lazy<NaiveTime> =
    Lazy::new(|| NaiveTime::from_hms_opt(8, 15, 0).expect("08:15:00 is a valid time"));

/// Converts instants to the facility's local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacilityClock {
    offset: FixedOffset,
}

impl FacilityClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::new)
    }

    pub fn local(&self, at: DateTime<Utc>) -> NaiveDateTime {
        at.with_timezone(&self.offset).naive_local()
    }

    /// Calendar day the instant falls on, in facility time.
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        self.local(at).date()
    }

    pub fn time_of(&self, at: DateTime<Utc>) -> NaiveTime {
        self.local(at).time()
    }

    pub fn is_late(&self, at: DateTime<Utc>) -> bool {
        let local = self.local(at);
        local > local.date().and_time(*LATE_CUTOFF)
    }

    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        (local - Duration::seconds(self.offset.local_minus_utc() as i64)).and_utc()
    }
}

/// Week bucket of a day: `ceil((ordinal0 + weekday(Jan 1) + 1) / 7)` with
/// weekdays counted from Sunday. Yields 1..=54; reports keep weeks 1..=52.
pub fn week_number(date: NaiveDate) -> u32 {
    let jan1_weekday = NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .map(|d| d.weekday().num_days_from_sunday())
        .unwrap_or(0);
    (date.ordinal0() + jan1_weekday + 1).div_ceil(7)
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cutoff_is_exclusive() {
        let clock = FacilityClock::utc();
        let on_time = Utc.with_ymd_and_hms(2026, 3, 2, 8, 15, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 3, 2, 8, 15, 1).unwrap();

        assert!(!clock.is_late(on_time));
        assert!(clock.is_late(late));
    }

    #[test]
    fn local_day_follows_the_offset() {
        // UTC+1: 23:30 UTC is already the next day locally
        let clock = FacilityClock::from_offset_minutes(60).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 23, 30, 0).unwrap();
        assert_eq!(clock.day_of(at), ymd(2026, 3, 3));

        // 07:30 UTC is 08:30 local, past the cutoff
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 7, 30, 0).unwrap();
        assert!(clock.is_late(at));
        assert_eq!(clock.to_utc(clock.local(at)), at);
    }

    #[test]
    fn week_numbers() {
        // 2026-01-01 is a Thursday
        assert_eq!(week_number(ymd(2026, 1, 1)), 1);
        assert_eq!(week_number(ymd(2026, 1, 3)), 1);
        assert_eq!(week_number(ymd(2026, 1, 4)), 2);
        assert_eq!(week_number(ymd(2026, 12, 26)), 52);
        assert_eq!(week_number(ymd(2026, 12, 27)), 53);
        assert_eq!(week_number(ymd(2026, 12, 31)), 53);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2026, 2), Some(28));
        assert_eq!(days_in_month(2026, 12), Some(31));
        assert_eq!(days_in_month(2026, 13), None);
    }

    #[test]
    fn weekends_are_not_business_days() {
        assert!(is_business_day(ymd(2026, 3, 6)));
        assert!(!is_business_day(ymd(2026, 3, 7)));
        assert!(!is_business_day(ymd(2026, 3, 8)));
    }
}
