//! One villager living through a day on a schedule.
//!
//! Run with `RUST_LOG=ai_brain=debug cargo run -p ai-brain --example village_day`
//! to watch activity switches.

use ai_brain::{
    Activity, Behavior, BehaviorControl, BrainConfig, BrainProvider, ErasedKey, Gated, MemoryKey,
    MemoryStatus, MemoryStore, Sensor, TickContext, WorldMut, WorldView,
};
use tracing_subscriber::{fmt, EnvFilter};

const SCHEDULE: &str = r#"
schedule_check_interval: 20
core_activities: [core]
default_activity: idle
schedule:
  - { at: 10, activity: idle }
  - { at: 2000, activity: work }
  - { at: 9000, activity: meet }
  - { at: 11000, activity: idle }
  - { at: 12000, activity: rest }
"#;

const WORKSTATION: MemoryKey<(i32, i32)> = MemoryKey::persistent(1, "workstation");
const MEETING_POINT: MemoryKey<(i32, i32)> = MemoryKey::persistent(2, "meeting_point");
const HEARD_BELL: MemoryKey<bool> = MemoryKey::new(3, "heard_bell");

#[derive(Default)]
struct Village {
    bell_ringing: bool,
    crafted: u32,
    chats: u32,
    naps: u32,
}

impl WorldView for Village {
    type Agent = u32;
}

impl WorldMut for Village {}

struct BellSensor;

impl Sensor<Village> for BellSensor {
    fn requires(&self) -> Vec<ErasedKey> {
        vec![HEARD_BELL.erased()]
    }

    fn sense(
        &mut self,
        _ctx: &TickContext,
        _agent: u32,
        world: &Village,
        memory: &mut MemoryStore,
    ) {
        if world.bell_ringing {
            memory.set_with_expiry(HEARD_BELL, true, 200);
        }
    }
}

struct Craft;

impl Behavior<Village> for Craft {
    fn name(&self) -> &str {
        "craft"
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: u32,
        world: &mut Village,
        _memory: &mut MemoryStore,
    ) {
        world.crafted += 1;
    }

    fn can_still_use(
        &mut self,
        _ctx: &TickContext,
        _agent: u32,
        _world: &Village,
        _memory: &MemoryStore,
    ) -> bool {
        true
    }
}

struct Chat;

impl Behavior<Village> for Chat {
    fn name(&self) -> &str {
        "chat"
    }

    fn start(
        &mut self,
        _ctx: &TickContext,
        _agent: u32,
        world: &mut Village,
        _memory: &mut MemoryStore,
    ) {
        world.chats += 1;
    }
}

struct Nap;

impl Behavior<Village> for Nap {
    fn name(&self) -> &str {
        "nap"
    }

    fn start(
        &mut self,
        _ctx: &TickContext,
        _agent: u32,
        world: &mut Village,
        _memory: &mut MemoryStore,
    ) {
        world.naps += 1;
    }

    fn can_still_use(
        &mut self,
        _ctx: &TickContext,
        _agent: u32,
        _world: &Village,
        _memory: &MemoryStore,
    ) -> bool {
        true
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let config = BrainConfig::from_yaml_str(SCHEDULE)?;
    let provider = BrainProvider::<Village>::new(
        [WORKSTATION.erased(), MEETING_POINT.erased()],
        Vec::new(),
    )
    .with_sensor(|| BellSensor)
    .with_config(config)
    .with_activities(|brain| {
        brain.add_activity(Activity::CORE, 0, Vec::new())?;
        brain.add_activity(Activity::IDLE, 10, Vec::new())?;
        brain.add_activity_and_remove_memory_when_stopped(
            Activity::WORK,
            10,
            vec![Gated::new(Craft)
                .requires(WORKSTATION, MemoryStatus::ValuePresent)
                .with_duration(300, 600)
                .boxed()],
            WORKSTATION.erased(),
        )?;
        brain.add_activity_with_conditions(
            Activity::MEET,
            vec![(
                10,
                Gated::new(Chat)
                    .requires(HEARD_BELL, MemoryStatus::ValuePresent)
                    .boxed(),
            )],
            vec![(MEETING_POINT.erased(), MemoryStatus::ValuePresent)],
        )?;
        brain.add_activity(
            Activity::REST,
            10,
            vec![Gated::new(Nap).with_duration(1000, 2000).boxed()],
        )
    });

    let mut village = Village::default();
    let mut brain = provider.make_brain(1, 2024)?;
    brain.memory_mut().set(WORKSTATION, (4, 9));
    brain.memory_mut().set(MEETING_POINT, (0, 0));

    let mut ctx = TickContext::new(0, 2024);
    let mut last = None;
    for _ in 0..24_000 {
        village.bell_ringing = (9000..9400).contains(&ctx.day_time);
        brain.tick(&ctx, &mut village);

        let current = brain.active_non_core_activity().cloned();
        if current != last {
            tracing::info!(tick = ctx.tick, activity = ?current, "villager changed activity");
            last = current;
        }
        ctx = ctx.next();
    }

    let saved = provider.persist(&brain);
    tracing::info!(
        crafted = village.crafted,
        chats = village.chats,
        naps = village.naps,
        persisted = %saved.to_json_string()?,
        "day over"
    );
    Ok(())
}
