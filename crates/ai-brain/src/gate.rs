//! Composite behavior that runs a group of children behind shared entry conditions.

use std::borrow::Cow;

use crate::rng::{streams, DeterministicRng};
use crate::{
    BehaviorControl, BehaviorStatus, ErasedKey, MemoryKey, MemoryStatus, MemoryStore, TickContext,
    WorldMut,
};

/// Order in which children are offered a start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPolicy {
    /// Insertion order.
    #[default]
    Ordered,
    /// Weighted shuffle, redrawn on every start attempt from the agent's gate stream.
    Shuffled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunningPolicy {
    /// Start the first child that accepts, then stop offering.
    #[default]
    RunOne,
    /// Offer a start to every child.
    TryAll,
}

struct Child<W>
where
    W: WorldMut + 'static,
{
    behavior: Box<dyn BehaviorControl<W>>,
    weight: u32,
}

pub struct GateBehavior<W>
where
    W: WorldMut + 'static,
{
    name: Cow<'static, str>,
    entry_conditions: Vec<(ErasedKey, MemoryStatus)>,
    erase_on_stop: Vec<ErasedKey>,
    order: OrderPolicy,
    running: RunningPolicy,
    children: Vec<Child<W>>,
    status: BehaviorStatus,
}

impl<W> GateBehavior<W>
where
    W: WorldMut + 'static,
{
    pub fn new(order: OrderPolicy, running: RunningPolicy) -> Self {
        Self {
            name: Cow::Borrowed("gate"),
            entry_conditions: Vec::new(),
            erase_on_stop: Vec::new(),
            order,
            running,
            children: Vec::new(),
            status: BehaviorStatus::Stopped,
        }
    }

    /// `RunOne` over children in insertion order.
    pub fn first_of() -> Self {
        Self::new(OrderPolicy::Ordered, RunningPolicy::RunOne)
    }

    /// `RunOne` over a weighted shuffle of the children.
    pub fn random_one() -> Self {
        Self::new(OrderPolicy::Shuffled, RunningPolicy::RunOne)
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn requires<T: 'static>(mut self, key: MemoryKey<T>, status: MemoryStatus) -> Self {
        self.entry_conditions.push((key.erased(), status));
        self
    }

    pub fn erase_on_stop<T: 'static>(mut self, key: MemoryKey<T>) -> Self {
        self.erase_on_stop.push(key.erased());
        self
    }

    pub fn child(self, behavior: impl BehaviorControl<W>) -> Self {
        self.weighted_child(behavior, 1)
    }

    /// Adds a child with a shuffle weight. Weights only matter under [`OrderPolicy::Shuffled`].
    pub fn weighted_child(mut self, behavior: impl BehaviorControl<W>, weight: u32) -> Self {
        self.children.push(Child {
            behavior: Box::new(behavior),
            weight: weight.max(1),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Names of the children currently running.
    pub fn running_children(&self) -> Vec<String> {
        self.children
            .iter()
            .filter(|child| child.behavior.status() == BehaviorStatus::Running)
            .map(|child| child.behavior.name().into_owned())
            .collect()
    }

    fn start_order(&self, ctx: &TickContext, agent: W::Agent) -> Vec<usize> {
        match self.order {
            OrderPolicy::Ordered => (0..self.children.len()).collect(),
            OrderPolicy::Shuffled => {
                let mut rng = ctx.rng_for_agent(agent, streams::GATE_ORDER);
                // Efraimidis-Spirakis: sort by u^(1/w) descending.
                let mut keyed: Vec<(f64, usize)> = self
                    .children
                    .iter()
                    .enumerate()
                    .map(|(idx, child)| {
                        let u = f64::from(rng.next_f32_unit()).max(f64::MIN_POSITIVE);
                        (u.powf(1.0 / f64::from(child.weight)), idx)
                    })
                    .collect();
                keyed.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
                keyed.into_iter().map(|(_, idx)| idx).collect()
            }
        }
    }

    fn any_child_running(&self) -> bool {
        self.children
            .iter()
            .any(|child| child.behavior.status() == BehaviorStatus::Running)
    }
}

impl<W> BehaviorControl<W> for GateBehavior<W>
where
    W: WorldMut + 'static,
{
    fn status(&self) -> BehaviorStatus {
        self.status
    }

    /// Stays stopped and returns false when the entry conditions hold but no child starts.
    fn try_start(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        memory: &mut MemoryStore,
    ) -> bool {
        if self.status == BehaviorStatus::Running {
            return false;
        }
        if !self
            .entry_conditions
            .iter()
            .all(|(key, status)| memory.check(key, *status))
        {
            return false;
        }

        let mut started = false;
        for idx in self.start_order(ctx, agent) {
            let child = &mut self.children[idx].behavior;
            if child.status() == BehaviorStatus::Stopped
                && child.try_start(ctx, agent, world, memory)
            {
                started = true;
                if self.running == RunningPolicy::RunOne {
                    break;
                }
            }
        }
        if started {
            self.status = BehaviorStatus::Running;
        }
        started
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
        for child in &mut self.children {
            if child.behavior.status() == BehaviorStatus::Running {
                child.behavior.tick_or_stop(ctx, agent, world, memory);
            }
        }
        if !self.any_child_running() {
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
        for child in &mut self.children {
            child.behavior.do_stop(ctx, agent, world, memory);
        }
        for key in &self.erase_on_stop {
            memory.erase_erased(key);
        }
        tracing::trace!(behavior = %self.name, agent = ?agent, "gate stopped");
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn memory_requirements(&self) -> Vec<(ErasedKey, MemoryStatus)> {
        let mut requirements = self.entry_conditions.clone();
        requirements.extend(
            self.erase_on_stop
                .iter()
                .map(|key| (*key, MemoryStatus::Registered)),
        );
        for child in &self.children {
            requirements.extend(child.behavior.memory_requirements());
        }
        requirements
    }
}
