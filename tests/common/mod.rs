#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use attendance::directory::MemoryPersonDirectory;
use attendance::model::person::{Person, PersonKind};
use attendance::notify::{NotificationSink, Recipient};
use attendance::service::{AbsenteeSweeper, JustificationWorkflow, ScanProcessor, StatsAggregator};
use attendance::store::MemoryAttendanceStore;
use attendance::utils::calendar::FacilityClock;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

pub fn learner(id: u64, name: &str, group_id: u64, is_active: bool) -> Person {
    Person {
        id,
        kind: PersonKind::Learner,
        display_name: name.to_string(),
        badge_code: format!("LRN-{:04}", id),
        is_active,
        group_id: Some(group_id),
    }
}

pub fn coach(id: u64, name: &str, is_active: bool) -> Person {
    Person {
        id,
        kind: PersonKind::Coach,
        display_name: name.to_string(),
        badge_code: format!("CCH-{:04}", id),
        is_active,
        group_id: None,
    }
}

/// Keeps every notification; can be told to fail.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(Recipient, String)>>,
    pub failing: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn messages(&self) -> Vec<(Recipient, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, recipient: Recipient, message: String) -> anyhow::Result<()> {
        if self.failing {
            anyhow::bail!("smtp relay down");
        }
        self.sent.lock().unwrap().push((recipient, message));
        Ok(())
    }
}

/// A school with three learners in group 1 (one inactive), one learner in
/// group 2 and two coaches, on a UTC facility clock.
pub struct School {
    pub store: Arc<MemoryAttendanceStore>,
    pub directory: Arc<MemoryPersonDirectory>,
    pub sink: Arc<RecordingSink>,
    pub scanner: ScanProcessor,
    pub workflow: JustificationWorkflow,
    pub sweeper: AbsenteeSweeper,
    pub stats: StatsAggregator,
}

pub fn people() -> Vec<Person> {
    vec![
        learner(1, "Awa Diop", 1, true),
        learner(2, "Moussa Ba", 1, true),
        learner(3, "Fatou Sall", 1, false),
        learner(4, "Ibrahima Fall", 2, true),
        coach(1, "Coach Ndiaye", true),
        coach(2, "Coach Sarr", false),
    ]
}

impl School {
    pub fn new() -> Self {
        Self::with_sink(RecordingSink::default())
    }

    pub fn with_sink(sink: RecordingSink) -> Self {
        let store = Arc::new(MemoryAttendanceStore::new());
        let directory = Arc::new(MemoryPersonDirectory::new(people()));
        let sink = Arc::new(sink);

        School {
            scanner: ScanProcessor::new(store.clone(), directory.clone(), FacilityClock::utc()),
            workflow: JustificationWorkflow::new(store.clone(), directory.clone(), sink.clone()),
            sweeper: AbsenteeSweeper::new(store.clone(), directory.clone()),
            stats: StatsAggregator::new(store.clone(), directory.clone()),
            store,
            directory,
            sink,
        }
    }
}
