use core::fmt::Debug;

/// Identifier of the agent that owns a [`Brain`](crate::Brain).
///
/// `stable_id` seeds every per-agent random stream (sensor phase, behavior
/// durations, gate shuffling), so two runs with the same seed replay exactly.
pub trait AgentId: Copy + Ord + Eq + Debug + 'static {
    fn stable_id(self) -> u64;
}

macro_rules! impl_agent_id {
    ($($ty:ty),*) => {
        $(
            impl AgentId for $ty {
                fn stable_id(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_agent_id!(u16, u32, u64, usize);

/// Read-only world access, handed to sensors.
///
/// Spatial and entity queries are not prescribed here; species crates define
/// extension traits or work against the concrete world type.
pub trait WorldView {
    type Agent: AgentId;
}

/// Effect sink handed to behaviors (movement targets, animation flags, ...).
pub trait WorldMut: WorldView {}
