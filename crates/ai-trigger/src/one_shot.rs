use std::borrow::Cow;

use ai_brain::{
    BehaviorControl, BehaviorStatus, ErasedKey, MemoryStatus, MemoryStore, TickContext, WorldMut,
    WorldView,
};

use crate::Query;

type Effect<W, T> =
    Box<dyn FnMut(T, &TickContext, <W as WorldView>::Agent, &mut W, &mut MemoryStore) -> bool>;

/// Behavior that runs `effect` once when its query succeeds.
///
/// It is running for exactly the tick it started on; the following
/// `tick_or_stop` stops it.
pub struct OneShot<W, T>
where
    W: WorldMut + 'static,
{
    query: Query<T>,
    effect: Effect<W, T>,
    status: BehaviorStatus,
}

/// Builds a [`OneShot`]. The behavior starts only if `query` yields a value and
/// `effect` returns true for it.
pub fn create<W, T, F>(query: Query<T>, effect: F) -> OneShot<W, T>
where
    W: WorldMut + 'static,
    T: 'static,
    F: FnMut(T, &TickContext, W::Agent, &mut W, &mut MemoryStore) -> bool + 'static,
{
    OneShot {
        query,
        effect: Box::new(effect),
        status: BehaviorStatus::Stopped,
    }
}

impl<W, T> OneShot<W, T>
where
    W: WorldMut + 'static,
    T: 'static,
{
    pub fn query(&self) -> &Query<T> {
        &self.query
    }
}

impl<W, T> BehaviorControl<W> for OneShot<W, T>
where
    W: WorldMut + 'static,
    T: 'static,
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
        if self.status == BehaviorStatus::Running {
            return false;
        }
        let Some(value) = self.query.eval(memory) else {
            return false;
        };
        if !(self.effect)(value, ctx, agent, world, memory) {
            return false;
        }
        self.status = BehaviorStatus::Running;
        tracing::trace!(trigger = self.query.label(), agent = ?agent, "trigger fired");
        true
    }

    fn tick_or_stop(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        memory: &mut MemoryStore,
    ) {
        self.do_stop(ctx, agent, world, memory);
    }

    fn do_stop(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _memory: &mut MemoryStore,
    ) {
        self.status = BehaviorStatus::Stopped;
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.query.label())
    }

    fn memory_requirements(&self) -> Vec<(ErasedKey, MemoryStatus)> {
        self.query.keys().to_vec()
    }
}
