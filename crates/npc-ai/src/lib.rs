//! Umbrella crate that re-exports the agent brain building blocks.
//!
//! `brain` carries memory, sensors, gated behaviors and the activity
//! scheduler; `trigger` adds declarative one-shot behaviors on top.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "brain")]
#[cfg_attr(docsrs, doc(cfg(feature = "brain")))]
pub use ai_brain as brain;

#[cfg(feature = "trigger")]
#[cfg_attr(docsrs, doc(cfg(feature = "trigger")))]
pub use ai_trigger as trigger;
