//! Declarative one-shot behaviors built from memory queries.
//!
//! ```
//! use ai_brain::{MemoryKey, MemoryStore};
//! use ai_trigger::{ap2, present};
//!
//! const HUNGER: MemoryKey<u32> = MemoryKey::new(1, "hunger");
//! const FOOD: MemoryKey<u64> = MemoryKey::new(2, "nearest_food");
//!
//! let mut memory = MemoryStore::with_keys([HUNGER.erased(), FOOD.erased()]).unwrap();
//! let eat = ap2(present(HUNGER), present(FOOD), |hunger, food| (*hunger.get(), *food.get()));
//!
//! memory.set(FOOD, 9);
//! assert!(eat.eval(&memory).is_none());
//! memory.set(HUNGER, 3);
//! assert_eq!(eat.eval(&memory), Some((3, 9)));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod accessor;
pub mod one_shot;
pub mod query;

pub use accessor::{Absent, Present, Registered};
pub use one_shot::{create, OneShot};
pub use query::{absent, ap2, ap3, ap4, point, present, registered, Query};
