use std::collections::BTreeSet;

use crate::error::{BrainError, Result};
use crate::rng::{derive_seed, streams};
use crate::{
    Activity, ActivityRegistry, AgentId, BehaviorControl, BehaviorStatus, BrainConfig, ErasedKey,
    MemoryStatus, MemoryStore, Schedule, Sensor, SensorRunner, SplitMix64, TickContext, WorldMut,
};

/// Per-agent scheduler: memory, sensors and activity-grouped behaviors.
///
/// A tick runs, in order:
/// 1. memory aging;
/// 2. sensors;
/// 3. the schedule lookup and the activity rotation;
/// 4. start attempts for stopped behaviors of active activities, lowest priority first;
/// 5. `tick_or_stop` on every running behavior.
pub struct Brain<W>
where
    W: WorldMut + 'static,
{
    agent: W::Agent,
    memory: MemoryStore,
    sensors: Vec<SensorRunner<W>>,
    registry: ActivityRegistry<W>,
    core_activities: BTreeSet<Activity>,
    active_activities: BTreeSet<Activity>,
    default_activity: Activity,
    schedule: Option<Schedule>,
    activity_rotation: Vec<Activity>,
    last_schedule_check: Option<u64>,
    schedule_check_interval: u64,
    day_length: u64,
}

impl<W> Brain<W>
where
    W: WorldMut + 'static,
{
    /// Registers `keys` plus every key a sensor writes. Sensor phases are drawn
    /// from the agent's sensor stream of `seed`.
    pub fn new(
        agent: W::Agent,
        keys: impl IntoIterator<Item = ErasedKey>,
        sensors: Vec<Box<dyn Sensor<W>>>,
        seed: u64,
    ) -> Result<Self> {
        let mut memory = MemoryStore::with_keys(keys)?;
        let mut rng = SplitMix64::new(derive_seed(seed, agent.stable_id(), streams::SENSOR_PHASE));
        let mut runners = Vec::with_capacity(sensors.len());
        for sensor in sensors {
            for key in sensor.requires() {
                memory.register(key)?;
            }
            runners.push(SensorRunner::new(sensor, &mut rng));
        }

        let defaults = BrainConfig::default();
        Ok(Self {
            agent,
            memory,
            sensors: runners,
            registry: ActivityRegistry::new(),
            core_activities: BTreeSet::new(),
            active_activities: BTreeSet::from([Activity::IDLE]),
            default_activity: Activity::IDLE,
            schedule: None,
            activity_rotation: Vec::new(),
            last_schedule_check: None,
            schedule_check_interval: defaults.schedule_check_interval,
            day_length: defaults.day_length,
        })
    }

    pub fn agent(&self) -> W::Agent {
        self.agent
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    pub fn sensors(&self) -> &[SensorRunner<W>] {
        &self.sensors
    }

    pub fn registry(&self) -> &ActivityRegistry<W> {
        &self.registry
    }

    /// Current settings, as a config that would reproduce them.
    pub fn config(&self) -> BrainConfig {
        BrainConfig {
            schedule_check_interval: self.schedule_check_interval,
            day_length: self.day_length,
            core_activities: self.core_activities.iter().cloned().collect(),
            default_activity: Some(self.default_activity.clone()),
            schedule: self
                .schedule
                .as_ref()
                .map(|schedule| schedule.entries().to_vec())
                .unwrap_or_default(),
            activity_rotation: self.activity_rotation.clone(),
        }
    }

    pub fn set_timing(&mut self, schedule_check_interval: u64, day_length: u64) {
        self.schedule_check_interval = schedule_check_interval.max(1);
        self.day_length = day_length.max(1);
    }

    /// Replaces the core set. The new core activities become active immediately.
    pub fn set_core_activities(&mut self, core: impl IntoIterator<Item = Activity>) {
        for old in std::mem::take(&mut self.core_activities) {
            self.active_activities.remove(&old);
        }
        self.core_activities = core.into_iter().collect();
        self.active_activities
            .extend(self.core_activities.iter().cloned());
    }

    pub fn core_activities(&self) -> &BTreeSet<Activity> {
        &self.core_activities
    }

    pub fn set_default_activity(&mut self, activity: Activity) {
        self.default_activity = activity;
    }

    pub fn default_activity(&self) -> &Activity {
        &self.default_activity
    }

    pub fn set_schedule(&mut self, schedule: Option<Schedule>) {
        self.schedule = schedule;
        self.last_schedule_check = None;
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    /// Activities re-evaluated every tick with [`Brain::set_active_activity_to_first_valid`].
    pub fn set_activity_rotation(&mut self, rotation: Vec<Activity>) {
        self.activity_rotation = rotation;
    }

    pub fn active_activities(&self) -> &BTreeSet<Activity> {
        &self.active_activities
    }

    pub fn is_active(&self, activity: &Activity) -> bool {
        self.active_activities.contains(activity)
    }

    pub fn active_non_core_activity(&self) -> Option<&Activity> {
        self.active_activities
            .iter()
            .find(|activity| !self.core_activities.contains(*activity))
    }

    /// Adds `behaviors` with priorities `priority_start, priority_start + 1, ...`.
    /// Fails with [`BrainError::PriorityOverflow`] if the last priority exceeds `u32::MAX`.
    pub fn add_activity(
        &mut self,
        activity: Activity,
        priority_start: u32,
        behaviors: Vec<Box<dyn BehaviorControl<W>>>,
    ) -> Result<()> {
        let prioritized = with_priorities(&activity, priority_start, behaviors)?;
        self.add_activity_and_remove_memories_when_stopped(
            activity,
            prioritized,
            Vec::new(),
            Vec::new(),
        )
    }

    pub fn add_activity_with_conditions(
        &mut self,
        activity: Activity,
        prioritized: Vec<(u32, Box<dyn BehaviorControl<W>>)>,
        conditions: Vec<(ErasedKey, MemoryStatus)>,
    ) -> Result<()> {
        self.add_activity_and_remove_memories_when_stopped(
            activity,
            prioritized,
            conditions,
            Vec::new(),
        )
    }

    /// Registers `activity` with its conditions and the keys erased when
    /// another activity replaces it. Fails if any condition, erase key or
    /// behavior requirement names an unregistered key.
    pub fn add_activity_and_remove_memories_when_stopped(
        &mut self,
        activity: Activity,
        prioritized: Vec<(u32, Box<dyn BehaviorControl<W>>)>,
        conditions: Vec<(ErasedKey, MemoryStatus)>,
        erase_on_stop: Vec<ErasedKey>,
    ) -> Result<()> {
        let context = format!("activity `{activity}`");
        for (key, _) in &conditions {
            self.require_registered(&context, key)?;
        }
        for key in &erase_on_stop {
            self.require_registered(&context, key)?;
        }
        for (_, behavior) in &prioritized {
            let context = format!("behavior `{}` in activity `{activity}`", behavior.name());
            for (key, _) in behavior.memory_requirements() {
                self.require_registered(&context, &key)?;
            }
        }

        self.registry
            .insert(activity, prioritized, conditions, erase_on_stop);
        Ok(())
    }

    /// The activity requires `key` to hold a value and erases it when replaced.
    pub fn add_activity_and_remove_memory_when_stopped(
        &mut self,
        activity: Activity,
        priority_start: u32,
        behaviors: Vec<Box<dyn BehaviorControl<W>>>,
        key: ErasedKey,
    ) -> Result<()> {
        let prioritized = with_priorities(&activity, priority_start, behaviors)?;
        self.add_activity_and_remove_memories_when_stopped(
            activity,
            prioritized,
            vec![(key, MemoryStatus::ValuePresent)],
            vec![key],
        )
    }

    fn require_registered(&self, context: &str, key: &ErasedKey) -> Result<()> {
        if self.memory.is_registered_erased(key) {
            Ok(())
        } else {
            Err(BrainError::UnregisteredKey {
                context: context.to_string(),
                key: key.name(),
            })
        }
    }

    /// Activates `activity` if its conditions hold, the default activity otherwise.
    pub fn set_active_activity_if_possible(&mut self, activity: Activity) {
        if self.registry.conditions_hold(&activity, &self.memory) {
            self.set_active_activity(activity);
        } else {
            self.use_default_activity();
        }
    }

    /// Activates the first activity of `candidates` whose conditions hold.
    pub fn set_active_activity_to_first_valid(&mut self, candidates: &[Activity]) {
        let found = candidates
            .iter()
            .find(|activity| self.registry.conditions_hold(activity, &self.memory))
            .cloned();
        if let Some(activity) = found {
            self.set_active_activity(activity);
        }
    }

    pub fn use_default_activity(&mut self) {
        self.set_active_activity(self.default_activity.clone());
    }

    fn set_active_activity(&mut self, activity: Activity) {
        if self.is_active(&activity) {
            return;
        }
        for previous in &self.active_activities {
            if *previous == activity {
                continue;
            }
            for key in self.registry.erase_set(previous) {
                self.memory.erase_erased(key);
            }
        }
        tracing::debug!(
            agent = ?self.agent,
            from = ?self.active_non_core_activity(),
            to = %activity,
            "activity switch"
        );
        self.active_activities.clear();
        self.active_activities
            .extend(self.core_activities.iter().cloned());
        self.active_activities.insert(activity);
    }

    /// Looks up the schedule at most once every `schedule_check_interval` ticks.
    pub fn update_activity_from_schedule(&mut self, day_time: u64, game_time: u64) {
        if let Some(last) = self.last_schedule_check {
            if game_time >= last && game_time - last < self.schedule_check_interval {
                return;
            }
        }
        self.last_schedule_check = Some(game_time);

        let Some(schedule) = &self.schedule else {
            return;
        };
        let time_of_day = day_time % self.day_length;
        let scheduled = schedule
            .activity_at(time_of_day)
            .cloned()
            .unwrap_or_else(|| self.default_activity.clone());
        tracing::debug!(agent = ?self.agent, time_of_day, activity = %scheduled, "schedule lookup");
        if !self.is_active(&scheduled) {
            self.set_active_activity_if_possible(scheduled);
        }
    }

    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) {
        self.memory.age_one_tick();

        for sensor in &mut self.sensors {
            sensor.tick(ctx, self.agent, &*world, &mut self.memory);
        }

        if self.schedule.is_some() {
            self.update_activity_from_schedule(ctx.day_time, ctx.tick);
        }
        if !self.activity_rotation.is_empty() {
            let rotation = std::mem::take(&mut self.activity_rotation);
            self.set_active_activity_to_first_valid(&rotation);
            self.activity_rotation = rotation;
        }

        self.start_eligible_behaviors(ctx, world);
        self.tick_or_stop_behaviors(ctx, world);
    }

    fn start_eligible_behaviors(&mut self, ctx: &TickContext, world: &mut W) {
        for group in self.registry.buckets_mut() {
            if !self.active_activities.contains(&group.activity) {
                continue;
            }
            for behavior in &mut group.behaviors {
                if behavior.status() == BehaviorStatus::Stopped {
                    behavior.try_start(ctx, self.agent, world, &mut self.memory);
                }
            }
        }
    }

    fn tick_or_stop_behaviors(&mut self, ctx: &TickContext, world: &mut W) {
        for group in self.registry.buckets_mut() {
            for behavior in &mut group.behaviors {
                if behavior.status() == BehaviorStatus::Running {
                    behavior.tick_or_stop(ctx, self.agent, world, &mut self.memory);
                }
            }
        }
    }

    /// Stops every running behavior, whatever its activity.
    pub fn stop_all(&mut self, ctx: &TickContext, world: &mut W) {
        for group in self.registry.buckets_mut() {
            for behavior in &mut group.behaviors {
                if behavior.status() == BehaviorStatus::Running {
                    behavior.do_stop(ctx, self.agent, world, &mut self.memory);
                }
            }
        }
    }

    pub fn running_behaviors(&self) -> Vec<String> {
        self.registry.running_behaviors()
    }
}

fn with_priorities<B>(
    activity: &Activity,
    priority_start: u32,
    behaviors: Vec<B>,
) -> Result<Vec<(u32, B)>> {
    let count = behaviors.len();
    behaviors
        .into_iter()
        .enumerate()
        .map(|(offset, behavior)| {
            u32::try_from(offset)
                .ok()
                .and_then(|offset| priority_start.checked_add(offset))
                .map(|priority| (priority, behavior))
                .ok_or_else(|| BrainError::PriorityOverflow {
                    activity: activity.to_string(),
                    start: priority_start,
                    count,
                })
        })
        .collect()
}

/// Ticks `brains` in ascending agent-id order.
///
/// Sorts `brains` in place by agent id before ticking.
pub fn tick_brains<W>(ctx: &TickContext, world: &mut W, brains: &mut [Brain<W>])
where
    W: WorldMut + 'static,
{
    brains.sort_by_key(|b| b.agent.stable_id());
    for brain in brains.iter_mut() {
        brain.tick(ctx, world);
    }
}
