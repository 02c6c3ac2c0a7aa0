use std::any::type_name;
use std::borrow::Cow;

use crate::rng::{streams, DeterministicRng};
use crate::{ErasedKey, MemoryKey, MemoryStatus, MemoryStore, TickContext, WorldMut};

/// Ticks a [`Gated`] behavior may run when no duration is configured.
pub const DEFAULT_DURATION: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorStatus {
    Stopped,
    Running,
}

/// The two-state machine the brain schedules.
///
/// `try_start` is only meaningful while stopped and `tick_or_stop` only while
/// running. `do_stop` always leaves the behavior stopped and may be called on
/// a stopped behavior without effect.
pub trait BehaviorControl<W>: 'static
where
    W: WorldMut + 'static,
{
    fn status(&self) -> BehaviorStatus;

    fn try_start(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        memory: &mut MemoryStore,
    ) -> bool;

    fn tick_or_stop(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        memory: &mut MemoryStore,
    );

    fn do_stop(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        memory: &mut MemoryStore,
    );

    fn name(&self) -> Cow<'_, str>;

    /// Memory conditions this behavior reads. Every key must be registered on
    /// the brain the behavior is added to.
    fn memory_requirements(&self) -> Vec<(ErasedKey, MemoryStatus)> {
        Vec::new()
    }

    fn boxed(self) -> Box<dyn BehaviorControl<W>>
    where
        Self: Sized,
    {
        Box::new(self)
    }
}

/// Hooks for a concrete behavior, driven by [`Gated`].
///
/// The default `can_still_use` is false: a behavior that does not override it
/// runs a single tick.
pub trait Behavior<W>: 'static
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    fn check_extra_start_conditions(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &W,
        _memory: &MemoryStore,
    ) -> bool {
        true
    }

    fn start(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _memory: &mut MemoryStore,
    ) {
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _memory: &mut MemoryStore,
    ) {
    }

    fn stop(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _memory: &mut MemoryStore,
    ) {
    }

    fn can_still_use(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &W,
        _memory: &MemoryStore,
    ) -> bool {
        false
    }
}

/// A [`Behavior`] guarded by memory entry conditions and bounded by a duration window.
///
/// On start the behavior picks an end tick in `[tick + min, tick + max]`. It
/// keeps running while that tick has not passed and every continuation check
/// holds:
/// - [`Behavior::can_still_use`];
/// - the entry conditions, if [`Gated::stop_when_conditions_lost`] was set;
/// - the counter key, if [`Gated::keep_running_while`] was set, is present and positive.
pub struct Gated<B> {
    behavior: B,
    entry_conditions: Vec<(ErasedKey, MemoryStatus)>,
    min_duration: u64,
    max_duration: u64,
    stop_when_conditions_lost: bool,
    counter: Option<MemoryKey<i64>>,
    status: BehaviorStatus,
    end_tick: u64,
}

impl<B> Gated<B> {
    pub fn new(behavior: B) -> Self {
        Self {
            behavior,
            entry_conditions: Vec::new(),
            min_duration: DEFAULT_DURATION,
            max_duration: DEFAULT_DURATION,
            stop_when_conditions_lost: false,
            counter: None,
            status: BehaviorStatus::Stopped,
            end_tick: 0,
        }
    }

    pub fn requires<T: 'static>(mut self, key: MemoryKey<T>, status: MemoryStatus) -> Self {
        self.entry_conditions.push((key.erased(), status));
        self
    }

    pub fn with_duration(mut self, min: u64, max: u64) -> Self {
        self.min_duration = min;
        self.max_duration = max.max(min);
        self
    }

    pub fn stop_when_conditions_lost(mut self) -> Self {
        self.stop_when_conditions_lost = true;
        self
    }

    /// Keep running only while `key` holds a positive value. The caller owns the counter.
    pub fn keep_running_while(mut self, key: MemoryKey<i64>) -> Self {
        self.counter = Some(key);
        self
    }

    pub fn inner(&self) -> &B {
        &self.behavior
    }

    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.behavior
    }

    /// Last tick on which the current run may still tick. `None` while stopped.
    pub fn end_tick(&self) -> Option<u64> {
        (self.status == BehaviorStatus::Running).then_some(self.end_tick)
    }

    fn entry_conditions_hold(&self, memory: &MemoryStore) -> bool {
        self.entry_conditions
            .iter()
            .all(|(key, status)| memory.check(key, *status))
    }

    fn counter_positive(&self, memory: &MemoryStore) -> bool {
        match self.counter {
            Some(key) => memory.get(key).is_some_and(|left| *left > 0),
            None => true,
        }
    }
}

impl<W, B> BehaviorControl<W> for Gated<B>
where
    W: WorldMut + 'static,
    B: Behavior<W>,
{
    fn status(&self) -> BehaviorStatus {
        self.status
    }

    fn try_start(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        memory: &mut MemoryStore,
    ) -> bool {
        if self.status == BehaviorStatus::Running || !self.entry_conditions_hold(memory) {
            return false;
        }
        if !self
            .behavior
            .check_extra_start_conditions(ctx, agent, &*world, &*memory)
        {
            return false;
        }

        let duration = if self.min_duration == self.max_duration {
            self.min_duration
        } else {
            ctx.rng_for_agent(agent, streams::BEHAVIOR_DURATION)
                .range_inclusive(self.min_duration, self.max_duration)
        };
        self.status = BehaviorStatus::Running;
        self.end_tick = ctx.tick.saturating_add(duration);
        tracing::trace!(
            behavior = self.behavior.name(),
            agent = ?agent,
            end_tick = self.end_tick,
            "behavior started"
        );
        self.behavior.start(ctx, agent, world, memory);
        true
    }

    fn tick_or_stop(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        memory: &mut MemoryStore,
    ) {
        if self.status != BehaviorStatus::Running {
            return;
        }
        let keep_going = ctx.tick <= self.end_tick
            && self.behavior.can_still_use(ctx, agent, &*world, &*memory)
            && (!self.stop_when_conditions_lost || self.entry_conditions_hold(memory))
            && self.counter_positive(memory);
        if keep_going {
            self.behavior.tick(ctx, agent, world, memory);
        } else {
            self.do_stop(ctx, agent, world, memory);
        }
    }

    fn do_stop(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        memory: &mut MemoryStore,
    ) {
        if self.status != BehaviorStatus::Running {
            return;
        }
        self.status = BehaviorStatus::Stopped;
        tracing::trace!(behavior = self.behavior.name(), agent = ?agent, "behavior stopped");
        self.behavior.stop(ctx, agent, world, memory);
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.behavior.name())
    }

    fn memory_requirements(&self) -> Vec<(ErasedKey, MemoryStatus)> {
        let mut requirements = self.entry_conditions.clone();
        if let Some(key) = self.counter {
            requirements.push((key.erased(), MemoryStatus::Registered));
        }
        requirements
    }
}
