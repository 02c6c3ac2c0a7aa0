use crate::{rng, AgentId, SplitMix64};

/// Per-step input to [`Brain::tick`](crate::Brain::tick).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Monotonic game time, in ticks.
    pub tick: u64,
    /// Time of day, in ticks. Wrapped by the brain's configured day length.
    pub day_time: u64,
    pub dt_seconds: f32,
    pub seed: u64,
}

impl TickContext {
    pub fn new(tick: u64, seed: u64) -> Self {
        Self {
            tick,
            day_time: tick,
            dt_seconds: 0.05,
            seed,
        }
    }

    pub fn with_day_time(mut self, day_time: u64) -> Self {
        self.day_time = day_time;
        self
    }

    /// The context for the following simulation step. Day time advances with it.
    pub fn next(self) -> Self {
        Self {
            tick: self.tick + 1,
            day_time: self.day_time + 1,
            ..self
        }
    }

    /// Random stream unique to `(seed, tick, agent, stream)`.
    pub fn rng_for_agent<A: AgentId>(&self, agent: A, stream: u64) -> SplitMix64 {
        let seed = rng::derive_seed(self.seed ^ rng::mix64(self.tick), agent.stable_id(), stream);
        SplitMix64::new(seed)
    }
}
