use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::attendance::Outcome;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
pub struct Counts {
    #[schema(example = 120)]
    pub present: u64,
    #[schema(example = 14)]
    pub late: u64,
    #[schema(example = 6)]
    pub absent: u64,
}

impl Counts {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Present => self.present += 1,
            Outcome::Late => self.late += 1,
            Outcome::Absent => self.absent += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.present + self.late + self.absent
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = 3, nullable = true)]
    pub group_id: Option<u64>,
    pub present: u64,
    pub late: u64,
    pub absent: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeekBucket {
    #[schema(example = 10)]
    pub week: u32,
    pub counts: Counts,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeeklyStats {
    #[schema(example = 2026)]
    pub year: i32,
    /// Always 52 buckets, week 1 first
    pub weeks: Vec<WeekBucket>,
    /// Records whose week number fell past the 52nd bucket
    pub overflow: Counts,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DayBucket {
    #[schema(example = 2)]
    pub day: u32,
    pub counts: Counts,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DayBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthBucket {
    #[schema(example = 3)]
    pub month: u32,
    pub counts: Counts,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct YearlyStats {
    pub year: i32,
    pub months: Vec<MonthBucket>,
}
