use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::directory::PersonDirectory;
use crate::error::AttendanceError;
use crate::model::attendance::AttendanceRecord;
use crate::model::person::PersonKind;
use crate::model::stats::{
    Counts, DailyStats, DayBucket, MonthBucket, MonthlyStats, WeekBucket, WeeklyStats, YearlyStats,
};
use crate::store::AttendanceStore;
use crate::utils::calendar::{days_in_month, week_number};

const WEEKS_PER_YEAR: u32 = 52;
const MIN_YEAR: i32 = 1970;
const MAX_YEAR: i32 = 9999;

/// Present/late/absent counts over bounded date ranges. Each query reads its
/// range once and buckets the records in memory.
pub struct StatsAggregator {
    store: Arc<dyn AttendanceStore>,
    directory: Arc<dyn PersonDirectory>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn AttendanceStore>, directory: Arc<dyn PersonDirectory>) -> Self {
        Self { store, directory }
    }

    /// Without a group the total is the number of records for the day. With a
    /// group, active members who have no record yet count as absent, so the
    /// total matches the group's active enrollment.
    pub async fn daily(
        &self,
        kind: PersonKind,
        date: NaiveDate,
        group_id: Option<u64>,
    ) -> Result<DailyStats, AttendanceError> {
        let records = self.store.query_range(kind, date, date).await?;
        let mut counts = Counts::default();

        match group_id {
            None => records.iter().for_each(|r| counts.record(r.outcome())),
            Some(group) => {
                // inactive members are outside the enrollment even if they scanned
                let active: HashSet<u64> = self
                    .directory
                    .group_members(kind, group)
                    .await?
                    .iter()
                    .filter(|p| p.is_active)
                    .map(|p| p.id)
                    .collect();

                let mut seen = HashSet::new();
                for record in records.iter().filter(|r| active.contains(&r.person_id)) {
                    seen.insert(record.person_id);
                    counts.record(record.outcome());
                }
                counts.absent += active.iter().filter(|id| !seen.contains(*id)).count() as u64;
            }
        }

        Ok(DailyStats {
            date,
            group_id,
            present: counts.present,
            late: counts.late,
            absent: counts.absent,
            total: counts.total(),
        })
    }

    /// 52 week buckets. Days numbered past week 52 go to `overflow`.
    pub async fn weekly(&self, kind: PersonKind, year: i32) -> Result<WeeklyStats, AttendanceError> {
        let records = self.year_records(kind, year).await?;

        let mut weeks: Vec<WeekBucket> = (1..=WEEKS_PER_YEAR)
            .map(|week| WeekBucket {
                week,
                counts: Counts::default(),
            })
            .collect();
        let mut overflow = Counts::default();

        for record in &records {
            let week = week_number(record.date);
            match weeks.get_mut(week as usize - 1) {
                Some(bucket) => bucket.counts.record(record.outcome()),
                None => overflow.record(record.outcome()),
            }
        }

        Ok(WeeklyStats {
            year,
            weeks,
            overflow,
        })
    }

    pub async fn monthly(
        &self,
        kind: PersonKind,
        year: i32,
        month: u32,
    ) -> Result<MonthlyStats, AttendanceError> {
        check_year(year)?;
        let len = days_in_month(year, month)
            .ok_or_else(|| AttendanceError::InvalidQuery(format!("Invalid month {}", month)))?;
        let (from, to) = match (
            NaiveDate::from_ymd_opt(year, month, 1),
            NaiveDate::from_ymd_opt(year, month, len),
        ) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(AttendanceError::InvalidQuery(format!("Invalid month {}", month))),
        };

        let records = self.store.query_range(kind, from, to).await?;
        let mut days: Vec<DayBucket> = (1..=len)
            .map(|day| DayBucket {
                day,
                counts: Counts::default(),
            })
            .collect();
        for record in &records {
            if let Some(bucket) = days.get_mut(record.date.day0() as usize) {
                bucket.counts.record(record.outcome());
            }
        }

        Ok(MonthlyStats { year, month, days })
    }

    pub async fn yearly(&self, kind: PersonKind, year: i32) -> Result<YearlyStats, AttendanceError> {
        let records = self.year_records(kind, year).await?;

        let mut months: Vec<MonthBucket> = (1..=12)
            .map(|month| MonthBucket {
                month,
                counts: Counts::default(),
            })
            .collect();
        for record in &records {
            if let Some(bucket) = months.get_mut(record.date.month0() as usize) {
                bucket.counts.record(record.outcome());
            }
        }

        Ok(YearlyStats { year, months })
    }

    async fn year_records(
        &self,
        kind: PersonKind,
        year: i32,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        check_year(year)?;
        match (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) {
            (Some(from), Some(to)) => Ok(self.store.query_range(kind, from, to).await?),
            _ => Err(AttendanceError::InvalidQuery(format!("Invalid year {}", year))),
        }
    }
}

fn check_year(year: i32) -> Result<(), AttendanceError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(AttendanceError::InvalidQuery(format!(
            "Year must be between {} and {}",
            MIN_YEAR, MAX_YEAR
        )))
    }
}
