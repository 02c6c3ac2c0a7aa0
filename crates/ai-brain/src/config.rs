//! Brain configuration loading.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{Activity, Brain, Schedule, ScheduleEntry, WorldMut};

/// Activity wiring and schedule timing for one agent type, usually loaded from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Minimum ticks between two schedule lookups
    #[serde(default = "default_schedule_check_interval")]
    pub schedule_check_interval: u64,

    /// Length of a day, in ticks
    #[serde(default = "default_day_length")]
    pub day_length: u64,

    /// Activities that stay active whatever the current activity is
    pub core_activities: Vec<Activity>,

    /// Fallback when a requested activity's conditions fail
    pub default_activity: Option<Activity>,

    pub schedule: Vec<ScheduleEntry>,

    /// Activities tried in order every tick; the first whose conditions hold becomes active
    pub activity_rotation: Vec<Activity>,
}

fn default_schedule_check_interval() -> u64 {
    20
}

fn default_day_length() -> u64 {
    24_000
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            schedule_check_interval: default_schedule_check_interval(),
            day_length: default_day_length(),
            core_activities: Vec::new(),
            default_activity: None,
            schedule: Vec::new(),
            activity_rotation: Vec::new(),
        }
    }
}

impl BrainConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read brain config from {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse brain config from {}", path.display()))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        ensure!(config.day_length > 0, "day_length must be positive");
        ensure!(
            config.schedule_check_interval > 0,
            "schedule_check_interval must be positive"
        );
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// `None` when no schedule entries are configured.
    pub fn build_schedule(&self) -> Option<Schedule> {
        if self.schedule.is_empty() {
            return None;
        }
        Some(self.schedule.iter().cloned().collect())
    }

    /// Installs timing, core and default activities, schedule and rotation on `brain`.
    ///
    /// A configured default activity also becomes the active one.
    pub fn apply<W>(&self, brain: &mut Brain<W>)
    where
        W: WorldMut + 'static,
    {
        brain.set_timing(self.schedule_check_interval, self.day_length);
        brain.set_core_activities(self.core_activities.iter().cloned());
        if let Some(default) = &self.default_activity {
            brain.set_default_activity(default.clone());
            brain.use_default_activity();
        }
        brain.set_schedule(self.build_schedule());
        brain.set_activity_rotation(self.activity_rotation.clone());
    }
}
