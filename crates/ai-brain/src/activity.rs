use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BehaviorControl, BehaviorStatus, ErasedKey, MemoryStatus, MemoryStore, WorldMut};

/// Named group of behaviors that run together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Activity(Cow<'static, str>);

impl Activity {
    pub const CORE: Activity = Activity::new("core");
    pub const IDLE: Activity = Activity::new("idle");
    pub const WORK: Activity = Activity::new("work");
    pub const PLAY: Activity = Activity::new("play");
    pub const REST: Activity = Activity::new("rest");
    pub const MEET: Activity = Activity::new("meet");
    pub const PANIC: Activity = Activity::new("panic");
    pub const FIGHT: Activity = Activity::new("fight");
    pub const AVOID: Activity = Activity::new("avoid");
    pub const HIDE: Activity = Activity::new("hide");

    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Activity {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

/// Behaviors of one activity inside a priority bucket, in insertion order.
pub struct ActivityBehaviors<W>
where
    W: WorldMut + 'static,
{
    pub activity: Activity,
    pub behaviors: Vec<Box<dyn BehaviorControl<W>>>,
}

/// Behaviors indexed by priority, plus per-activity entry conditions and erase sets.
///
/// Lower priorities are offered a start first within a tick.
pub struct ActivityRegistry<W>
where
    W: WorldMut + 'static,
{
    buckets: BTreeMap<u32, Vec<ActivityBehaviors<W>>>,
    conditions: BTreeMap<Activity, Vec<(ErasedKey, MemoryStatus)>>,
    erase_on_stop: BTreeMap<Activity, Vec<ErasedKey>>,
}

impl<W> Default for ActivityRegistry<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self {
            buckets: BTreeMap::new(),
            conditions: BTreeMap::new(),
            erase_on_stop: BTreeMap::new(),
        }
    }
}

impl<W> ActivityRegistry<W>
where
    W: WorldMut + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds behaviors under `activity`. Conditions and the erase set replace
    /// whatever an earlier registration of the same activity declared.
    pub fn insert(
        &mut self,
        activity: Activity,
        prioritized: Vec<(u32, Box<dyn BehaviorControl<W>>)>,
        conditions: Vec<(ErasedKey, MemoryStatus)>,
        erase_on_stop: Vec<ErasedKey>,
    ) {
        self.conditions.insert(activity.clone(), conditions);
        if erase_on_stop.is_empty() {
            self.erase_on_stop.remove(&activity);
        } else {
            self.erase_on_stop.insert(activity.clone(), erase_on_stop);
        }

        for (priority, behavior) in prioritized {
            let bucket = self.buckets.entry(priority).or_default();
            match bucket.iter_mut().find(|group| group.activity == activity) {
                Some(group) => group.behaviors.push(behavior),
                None => bucket.push(ActivityBehaviors {
                    activity: activity.clone(),
                    behaviors: vec![behavior],
                }),
            }
        }
    }

    pub fn is_registered(&self, activity: &Activity) -> bool {
        self.conditions.contains_key(activity)
    }

    pub fn activities(&self) -> impl Iterator<Item = &Activity> + '_ {
        self.conditions.keys()
    }

    pub fn conditions(&self, activity: &Activity) -> Option<&[(ErasedKey, MemoryStatus)]> {
        self.conditions.get(activity).map(Vec::as_slice)
    }

    /// True if `activity` was registered and all its entry conditions hold.
    pub fn conditions_hold(&self, activity: &Activity, memory: &MemoryStore) -> bool {
        self.conditions.get(activity).is_some_and(|conditions| {
            conditions
                .iter()
                .all(|(key, status)| memory.check(key, *status))
        })
    }

    pub fn erase_set(&self, activity: &Activity) -> &[ErasedKey] {
        self.erase_on_stop
            .get(activity)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn buckets(&self) -> impl Iterator<Item = (u32, &[ActivityBehaviors<W>])> + '_ {
        self.buckets
            .iter()
            .map(|(priority, groups)| (*priority, groups.as_slice()))
    }

    pub(crate) fn buckets_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut ActivityBehaviors<W>> + '_ {
        self.buckets.values_mut().flatten()
    }

    pub fn behavior_count(&self) -> usize {
        self.buckets
            .values()
            .flatten()
            .map(|group| group.behaviors.len())
            .sum()
    }

    pub fn running_behaviors(&self) -> Vec<String> {
        self.buckets
            .values()
            .flatten()
            .flat_map(|group| group.behaviors.iter())
            .filter(|behavior| behavior.status() == BehaviorStatus::Running)
            .map(|behavior| behavior.name().into_owned())
            .collect()
    }
}
