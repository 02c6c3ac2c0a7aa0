//! Per-agent behavior scheduling: expiring memory, periodic sensors and
//! priority-ordered behaviors grouped into activities.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod activity;
pub mod behavior;
pub mod brain;
pub mod config;
pub mod error;
pub mod gate;
pub mod memory;
pub mod persist;
pub mod provider;
pub mod rng;
pub mod schedule;
pub mod sensor;
pub mod tick;
pub mod world;

pub use activity::{Activity, ActivityBehaviors, ActivityRegistry};
pub use behavior::{Behavior, BehaviorControl, BehaviorStatus, Gated, DEFAULT_DURATION};
pub use brain::{tick_brains, Brain};
pub use config::BrainConfig;
pub use error::{BrainError, MemoryError, PersistError, Result};
pub use gate::{GateBehavior, OrderPolicy, RunningPolicy};
pub use memory::{ErasedKey, Expiry, MemoryKey, MemoryStatus, MemoryStore, MemoryValue};
pub use persist::{DecodeReport, MemoryCodecs, PersistedEntry, PersistedMemory};
pub use provider::{BrainProvider, SensorFactory};
pub use rng::{DeterministicRng, SplitMix64};
pub use schedule::{Schedule, ScheduleBuilder, ScheduleEntry};
pub use sensor::{Sensor, SensorRunner, DEFAULT_SENSOR_PERIOD};
pub use tick::TickContext;
pub use world::{AgentId, WorldMut, WorldView};
