use std::borrow::Cow;
use std::collections::BTreeSet;

use ai_brain::{
    BehaviorControl, BehaviorStatus, ErasedKey, GateBehavior, MemoryKey, MemoryStatus,
    MemoryStore, OrderPolicy, RunningPolicy, TickContext, WorldMut, WorldView,
};

#[derive(Default)]
struct TestWorld {
    started: Vec<&'static str>,
    stopped: Vec<&'static str>,
}

impl WorldView for TestWorld {
    type Agent = u64;
}

impl WorldMut for TestWorld {}

const WALK_TARGET: MemoryKey<(i32, i32)> = MemoryKey::new(1, "walk_target");
const BORED: MemoryKey<bool> = MemoryKey::new(2, "bored");

/// Starts if `accepts`, then runs for `ticks` ticks.
struct Step {
    name: &'static str,
    accepts: bool,
    ticks: u32,
    left: u32,
    status: BehaviorStatus,
}

fn step(name: &'static str, accepts: bool, ticks: u32) -> Step {
    Step {
        name,
        accepts,
        ticks,
        left: 0,
        status: BehaviorStatus::Stopped,
    }
}

impl BehaviorControl<TestWorld> for Step {
    fn status(&self) -> BehaviorStatus {
        self.status
    }

    fn try_start(
        &mut self,
        _ctx: &TickContext,
        _agent: u64,
        world: &mut TestWorld,
        _memory: &mut MemoryStore,
    ) -> bool {
        if !self.accepts {
            return false;
        }
        self.status = BehaviorStatus::Running;
        self.left = self.ticks;
        world.started.push(self.name);
        true
    }

    fn tick_or_stop(
        &mut self,
        ctx: &TickContext,
        agent: u64,
        world: &mut TestWorld,
        memory: &mut MemoryStore,
    ) {
        if self.left == 0 {
            self.do_stop(ctx, agent, world, memory);
        } else {
            self.left -= 1;
        }
    }

    fn do_stop(
        &mut self,
        _ctx: &TickContext,
        _agent: u64,
        world: &mut TestWorld,
        _memory: &mut MemoryStore,
    ) {
        if self.status == BehaviorStatus::Running {
            self.status = BehaviorStatus::Stopped;
            world.stopped.push(self.name);
        }
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.name)
    }

    fn memory_requirements(&self) -> Vec<(ErasedKey, MemoryStatus)> {
        vec![(BORED.erased(), MemoryStatus::Registered)]
    }
}

fn memory() -> MemoryStore {
    MemoryStore::with_keys([WALK_TARGET.erased(), BORED.erased()]).unwrap()
}

fn ctx(tick: u64) -> TickContext {
    TickContext::new(tick, 1)
}

#[test]
fn run_one_starts_first_accepting_child() {
    let mut world = TestWorld::default();
    let mut memory = memory();
    let mut gate = GateBehavior::<TestWorld>::first_of()
        .child(step("refuses", false, 1))
        .child(step("walk", true, 1))
        .child(step("look", true, 1));

    assert!(gate.try_start(&ctx(0), 1, &mut world, &mut memory));
    assert_eq!(world.started, ["walk"]);
    assert_eq!(gate.running_children(), ["walk"]);
}

#[test]
fn try_all_starts_every_accepting_child() {
    let mut world = TestWorld::default();
    let mut memory = memory();
    let mut gate = GateBehavior::<TestWorld>::new(OrderPolicy::Ordered, RunningPolicy::TryAll)
        .child(step("walk", true, 1))
        .child(step("refuses", false, 1))
        .child(step("look", true, 1));

    assert!(gate.try_start(&ctx(0), 1, &mut world, &mut memory));
    assert_eq!(world.started, ["walk", "look"]);
}

#[test]
fn no_child_started_means_gate_not_started() {
    let mut world = TestWorld::default();
    let mut memory = memory();
    let mut gate = GateBehavior::<TestWorld>::first_of().child(step("refuses", false, 1));

    assert!(!gate.try_start(&ctx(0), 1, &mut world, &mut memory));
    assert_eq!(gate.status(), BehaviorStatus::Stopped);
}

#[test]
fn entry_conditions_checked_before_children() {
    let mut world = TestWorld::default();
    let mut memory = memory();
    let mut gate = GateBehavior::<TestWorld>::first_of()
        .requires(WALK_TARGET, MemoryStatus::ValueAbsent)
        .child(step("walk", true, 1));

    memory.set(WALK_TARGET, (1, 1));
    assert!(!gate.try_start(&ctx(0), 1, &mut world, &mut memory));
    assert!(world.started.is_empty());

    memory.erase(WALK_TARGET);
    assert!(gate.try_start(&ctx(1), 1, &mut world, &mut memory));
}

#[test]
fn stops_when_last_child_stops_and_erases_memories() {
    let mut world = TestWorld::default();
    let mut memory = memory();
    memory.set(BORED, true);
    let mut gate = GateBehavior::<TestWorld>::new(OrderPolicy::Ordered, RunningPolicy::TryAll)
        .erase_on_stop(BORED)
        .child(step("short", true, 0))
        .child(step("long", true, 2));

    assert!(gate.try_start(&ctx(0), 1, &mut world, &mut memory));
    gate.tick_or_stop(&ctx(0), 1, &mut world, &mut memory);
    assert_eq!(world.stopped, ["short"]);
    assert_eq!(gate.status(), BehaviorStatus::Running);
    assert!(memory.has_value(BORED));

    gate.tick_or_stop(&ctx(1), 1, &mut world, &mut memory);
    gate.tick_or_stop(&ctx(2), 1, &mut world, &mut memory);
    assert_eq!(gate.status(), BehaviorStatus::Stopped);
    assert_eq!(world.stopped, ["short", "long"]);
    assert!(!memory.has_value(BORED));
}

#[test]
fn do_stop_stops_running_children() {
    let mut world = TestWorld::default();
    let mut memory = memory();
    let mut gate = GateBehavior::<TestWorld>::first_of().child(step("walk", true, 100));

    assert!(gate.try_start(&ctx(0), 1, &mut world, &mut memory));
    gate.do_stop(&ctx(1), 1, &mut world, &mut memory);
    gate.do_stop(&ctx(2), 1, &mut world, &mut memory);
    assert_eq!(world.stopped, ["walk"]);
    assert!(gate.running_children().is_empty());
}

#[test]
fn shuffled_order_is_deterministic_and_varies() {
    let first_started = |tick: u64| {
        let mut world = TestWorld::default();
        let mut memory = memory();
        let mut gate = GateBehavior::<TestWorld>::random_one()
            .child(step("a", true, 1))
            .child(step("b", true, 1))
            .child(step("c", true, 1));
        assert!(gate.try_start(&ctx(tick), 1, &mut world, &mut memory));
        world.started[0]
    };

    let picks: BTreeSet<&str> = (0..64).map(&first_started).collect();
    assert!(picks.len() > 1, "shuffle always picked {picks:?}");
    for tick in 0..8 {
        assert_eq!(first_started(tick), first_started(tick));
    }
}

#[test]
fn heavier_weight_wins_more_often() {
    let mut heavy_wins = 0;
    for tick in 0..400 {
        let mut world = TestWorld::default();
        let mut memory = memory();
        let mut gate = GateBehavior::<TestWorld>::random_one()
            .weighted_child(step("light", true, 1), 1)
            .weighted_child(step("heavy", true, 1), 9);
        gate.try_start(&ctx(tick), 1, &mut world, &mut memory);
        if world.started == ["heavy"] {
            heavy_wins += 1;
        }
    }
    assert!(heavy_wins > 300, "heavy won {heavy_wins}/400");
}

#[test]
fn collects_requirements_from_children() {
    let gate = GateBehavior::<TestWorld>::first_of()
        .named("wander")
        .requires(WALK_TARGET, MemoryStatus::ValueAbsent)
        .erase_on_stop(BORED)
        .child(step("walk", true, 1));

    assert_eq!(gate.name(), "wander");
    assert_eq!(gate.len(), 1);
    assert_eq!(
        gate.memory_requirements(),
        vec![
            (WALK_TARGET.erased(), MemoryStatus::ValueAbsent),
            (BORED.erased(), MemoryStatus::Registered),
            (BORED.erased(), MemoryStatus::Registered),
        ]
    );
}
