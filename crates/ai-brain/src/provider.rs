use crate::error::Result;
use crate::{
    Brain, BrainConfig, DecodeReport, ErasedKey, MemoryCodecs, PersistedMemory, Sensor, WorldMut,
};

pub type SensorFactory<W> = Box<dyn Fn() -> Box<dyn Sensor<W>>>;

type Wiring<W> = Box<dyn Fn(&mut Brain<W>) -> Result<()>>;

/// Builds identically wired brains for one agent type.
///
/// Holds the memory keys, sensor factories, codec table, config and the
/// activity wiring. Each `make_brain*` call gets fresh sensor and behavior
/// instances.
pub struct BrainProvider<W>
where
    W: WorldMut + 'static,
{
    keys: Vec<ErasedKey>,
    sensors: Vec<SensorFactory<W>>,
    codecs: MemoryCodecs,
    config: BrainConfig,
    wiring: Option<Wiring<W>>,
}

impl<W> BrainProvider<W>
where
    W: WorldMut + 'static,
{
    pub fn new(keys: impl IntoIterator<Item = ErasedKey>, sensors: Vec<SensorFactory<W>>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            sensors,
            codecs: MemoryCodecs::new(),
            config: BrainConfig::default(),
            wiring: None,
        }
    }

    pub fn with_sensor<S, F>(mut self, factory: F) -> Self
    where
        S: Sensor<W>,
        F: Fn() -> S + 'static,
    {
        self.sensors
            .push(Box::new(move || Box::new(factory()) as Box<dyn Sensor<W>>));
        self
    }

    pub fn with_codecs(mut self, codecs: MemoryCodecs) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn with_config(mut self, config: BrainConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers the activities of every brain this provider makes.
    pub fn with_activities(
        mut self,
        wiring: impl Fn(&mut Brain<W>) -> Result<()> + 'static,
    ) -> Self {
        self.wiring = Some(Box::new(wiring));
        self
    }

    pub fn codecs(&self) -> &MemoryCodecs {
        &self.codecs
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    pub fn make_brain(&self, agent: W::Agent, seed: u64) -> Result<Brain<W>> {
        let sensors = self.sensors.iter().map(|factory| factory()).collect();
        let mut brain = Brain::new(agent, self.keys.iter().copied(), sensors, seed)?;
        if let Some(wiring) = &self.wiring {
            wiring(&mut brain)?;
        }
        self.config.apply(&mut brain);
        Ok(brain)
    }

    /// A fresh brain with memory restored from `persisted`.
    pub fn make_brain_from(
        &self,
        agent: W::Agent,
        seed: u64,
        persisted: &PersistedMemory,
    ) -> Result<(Brain<W>, DecodeReport)> {
        let mut brain = self.make_brain(agent, seed)?;
        let report = self.codecs.decode(persisted, brain.memory_mut());
        tracing::debug!(
            agent = ?agent,
            restored = report.restored,
            skipped = report.skipped.len(),
            "brain memory restored"
        );
        Ok((brain, report))
    }

    pub fn persist(&self, brain: &Brain<W>) -> PersistedMemory {
        self.codecs.encode(brain.memory())
    }
}
