use std::any::type_name;

use crate::rng::DeterministicRng;
use crate::{ErasedKey, MemoryStore, TickContext, WorldView};

/// Ticks between runs for sensors that do not override [`Sensor::period`].
pub const DEFAULT_SENSOR_PERIOD: u64 = 20;

/// Periodic perception that writes its findings into memory.
///
/// `sense` must do bounded work and must not touch anything but `memory`.
pub trait Sensor<W>: 'static
where
    W: WorldView + 'static,
{
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Memory keys this sensor writes. They are registered on the brain at construction.
    fn requires(&self) -> Vec<ErasedKey>;

    fn period(&self) -> u64 {
        DEFAULT_SENSOR_PERIOD
    }

    fn sense(&mut self, ctx: &TickContext, agent: W::Agent, world: &W, memory: &mut MemoryStore);
}

/// Owns a sensor instance and its countdown.
///
/// The first countdown is drawn from `[0, period)` so many agents sharing a
/// sensor type spread their scans over the whole period.
pub struct SensorRunner<W>
where
    W: WorldView + 'static,
{
    sensor: Box<dyn Sensor<W>>,
    period: u64,
    countdown: u64,
}

impl<W> SensorRunner<W>
where
    W: WorldView + 'static,
{
    pub fn new(sensor: Box<dyn Sensor<W>>, rng: &mut impl DeterministicRng) -> Self {
        let period = sensor.period().max(1);
        let countdown = rng.next_below(period);
        Self {
            sensor,
            period,
            countdown,
        }
    }

    pub fn name(&self) -> &str {
        self.sensor.name()
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// Ticks until the next scan; the scan happens on the tick that brings this to zero.
    pub fn countdown(&self) -> u64 {
        self.countdown
    }

    pub fn requires(&self) -> Vec<ErasedKey> {
        self.sensor.requires()
    }

    /// Returns true if the sensor scanned on this tick.
    pub fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &W,
        memory: &mut MemoryStore,
    ) -> bool {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return false;
        }
        self.countdown = self.period;
        self.sensor.sense(ctx, agent, world, memory);
        true
    }
}
