use std::sync::Arc;

use actix_web::rt::{self, task::JoinHandle};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::{error, info};

use super::sweeper::AbsenteeSweeper;
use crate::utils::calendar::{FacilityClock, is_business_day};

/// Runs the absentee sweep once per business day at a fixed facility time.
pub struct SweepScheduler {
    sweeper: Arc<AbsenteeSweeper>,
    clock: FacilityClock,
    run_at: NaiveTime,
}

impl SweepScheduler {
    pub fn new(sweeper: Arc<AbsenteeSweeper>, clock: FacilityClock, run_at: NaiveTime) -> Self {
        Self {
            sweeper,
            clock,
            run_at,
        }
    }

    /// First weekday run strictly after `now`.
    pub fn next_run(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_now = self.clock.local(now);
        let mut day = local_now.date();
        if day.and_time(self.run_at) <= local_now {
            day += Duration::days(1);
        }
        while !is_business_day(day) {
            day += Duration::days(1);
        }
        self.clock.to_utc(day.and_time(self.run_at))
    }

    pub fn spawn(self) -> JoinHandle<()> {
        rt::spawn(async move {
            loop {
                let now = Utc::now();
                let next = self.next_run(now);
                info!(next_run = %next, "Absentee sweep scheduled");

                let wait = (next - now).to_std().unwrap_or_default();
                rt::time::sleep(wait).await;

                let day = self.clock.day_of(next);
                if let Err(e) = self.sweeper.sweep(day).await {
                    error!(error = %e, %day, "Scheduled absentee sweep failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryPersonDirectory;
    use crate::store::MemoryAttendanceStore;
    use chrono::TimeZone;

    fn scheduler(offset_minutes: i32) -> SweepScheduler {
        let sweeper = AbsenteeSweeper::new(
            Arc::new(MemoryAttendanceStore::new()),
            Arc::new(MemoryPersonDirectory::default()),
        );
        SweepScheduler::new(
            Arc::new(sweeper),
            FacilityClock::from_offset_minutes(offset_minutes).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        )
    }

    #[test]
    fn runs_later_the_same_weekday() {
        // Monday
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        assert_eq!(
            scheduler(0).next_run(now),
            Utc.with_ymd_and_hms(2026, 3, 2, 18, 0, 0).unwrap()
        );
    }

    #[test]
    fn friday_evening_rolls_over_to_monday() {
        let now = Utc.with_ymd_and_hms(2026, 3, 6, 18, 0, 0).unwrap();
        assert_eq!(
            scheduler(0).next_run(now),
            Utc.with_ymd_and_hms(2026, 3, 9, 18, 0, 0).unwrap()
        );
    }

    #[test]
    fn run_time_is_facility_local() {
        // 18:00 at UTC+2 is 16:00 UTC
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        assert_eq!(
            scheduler(120).next_run(now),
            Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap()
        );
    }
}
