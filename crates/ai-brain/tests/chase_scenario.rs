use std::collections::BTreeMap;

use ai_brain::{
    Activity, Behavior, BehaviorControl, BrainConfig, BrainProvider, ErasedKey, Gated, MemoryKey,
    MemoryStatus, MemoryStore, Sensor, TickContext, WorldMut, WorldView,
};

const CHASE: Activity = Activity::new("chase");
const NEAREST_TARGET: MemoryKey<u64> = MemoryKey::new(1, "nearest_target");
const SIGHT_RANGE: i32 = 16;

#[derive(Default)]
struct Field {
    positions: BTreeMap<u64, i32>,
    targets: BTreeMap<u64, i32>,
}

impl WorldView for Field {
    type Agent = u64;
}

impl WorldMut for Field {}

struct NearestTargetSensor;

impl Sensor<Field> for NearestTargetSensor {
    fn requires(&self) -> Vec<ErasedKey> {
        vec![NEAREST_TARGET.erased()]
    }

    fn sense(&mut self, _ctx: &TickContext, agent: u64, world: &Field, memory: &mut MemoryStore) {
        let here = world.positions.get(&agent).copied().unwrap_or(0);
        let nearest = world
            .targets
            .iter()
            .map(|(id, pos)| (*id, (pos - here).abs()))
            .filter(|(_, dist)| *dist <= SIGHT_RANGE)
            .min_by_key(|(_, dist)| *dist)
            .map(|(id, _)| id);
        memory.set_optional(NEAREST_TARGET, nearest);
    }
}

struct Chase;

impl Behavior<Field> for Chase {
    fn name(&self) -> &str {
        "chase"
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        agent: u64,
        world: &mut Field,
        memory: &mut MemoryStore,
    ) {
        let Some(goal) = memory
            .get(NEAREST_TARGET)
            .and_then(|id| world.targets.get(id))
            .copied()
        else {
            return;
        };
        let pos = world.positions.entry(agent).or_insert(0);
        *pos += (goal - *pos).signum();
    }

    fn can_still_use(
        &mut self,
        _ctx: &TickContext,
        _agent: u64,
        _world: &Field,
        memory: &MemoryStore,
    ) -> bool {
        memory.has_value(NEAREST_TARGET)
    }
}

fn provider() -> BrainProvider<Field> {
    let config = BrainConfig {
        default_activity: Some(Activity::IDLE),
        activity_rotation: vec![CHASE, Activity::IDLE],
        ..BrainConfig::default()
    };
    BrainProvider::<Field>::new([NEAREST_TARGET.erased()], Vec::new())
        .with_sensor(|| NearestTargetSensor)
        .with_config(config)
        .with_activities(|brain| {
            brain.add_activity_and_remove_memory_when_stopped(
                CHASE,
                0,
                vec![Gated::new(Chase)
                    .requires(NEAREST_TARGET, MemoryStatus::ValuePresent)
                    .stop_when_conditions_lost()
                    .with_duration(200, 200)
                    .boxed()],
                NEAREST_TARGET.erased(),
            )?;
            brain.add_activity(Activity::IDLE, 0, Vec::new())
        })
}

#[test]
fn chases_visible_target_then_falls_back_to_idle() {
    let mut field = Field::default();
    field.positions.insert(1, 0);
    field.targets.insert(7, 10);

    let mut brain = provider().make_brain(1, 1234).unwrap();
    let mut ctx = TickContext::new(0, 1234);
    for _ in 0..20 {
        brain.tick(&ctx, &mut field);
        ctx = ctx.next();
    }

    assert!(brain.is_active(&CHASE));
    assert_eq!(brain.running_behaviors(), ["chase"]);
    assert!(field.positions[&1] > 0, "agent never moved toward the target");

    field.targets.clear();
    for _ in 0..21 {
        brain.tick(&ctx, &mut field);
        ctx = ctx.next();
    }

    assert!(brain.running_behaviors().is_empty());
    assert!(brain.is_active(&Activity::IDLE));
    assert!(!brain.is_active(&CHASE));
    assert!(!brain.memory().has_value(NEAREST_TARGET));
}

#[test]
fn out_of_range_target_is_ignored() {
    let mut field = Field::default();
    field.positions.insert(1, 0);
    field.targets.insert(7, SIGHT_RANGE + 1);

    let mut brain = provider().make_brain(1, 5).unwrap();
    let mut ctx = TickContext::new(0, 5);
    for _ in 0..40 {
        brain.tick(&ctx, &mut field);
        ctx = ctx.next();
    }

    assert!(brain.is_active(&Activity::IDLE));
    assert!(brain.running_behaviors().is_empty());
    assert_eq!(field.positions[&1], 0);
}
