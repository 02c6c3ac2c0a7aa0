use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Activity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Time of day, in ticks, at which `activity` takes over.
    pub at: u64,
    pub activity: Activity,
}

/// Daily timeline of activities, sorted by start time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::default()
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Activity whose start time is the greatest one at or before `time`.
    /// Times before the first entry belong to the last entry of the previous day.
    pub fn activity_at(&self, time: u64) -> Option<&Activity> {
        let idx = self.entries.partition_point(|entry| entry.at <= time);
        let entry = match idx {
            0 => self.entries.last(),
            n => self.entries.get(n - 1),
        };
        entry.map(|entry| &entry.activity)
    }
}

impl FromIterator<ScheduleEntry> for Schedule {
    fn from_iter<I: IntoIterator<Item = ScheduleEntry>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Schedule::builder(), |builder, entry| {
                builder.change_activity_at(entry.at, entry.activity)
            })
            .build()
    }
}

/// Later changes at the same time replace earlier ones.
#[derive(Debug, Default)]
pub struct ScheduleBuilder {
    changes: BTreeMap<u64, Activity>,
}

impl ScheduleBuilder {
    pub fn change_activity_at(mut self, at: u64, activity: Activity) -> Self {
        self.changes.insert(at, activity);
        self
    }

    pub fn build(self) -> Schedule {
        Schedule {
            entries: self
                .changes
                .into_iter()
                .map(|(at, activity)| ScheduleEntry { at, activity })
                .collect(),
        }
    }
}
