//! JSON snapshots of persistent memory.
//!
//! The codec table is built explicitly by the agent type and handed to the
//! [`BrainProvider`](crate::BrainProvider); there is no global registry. The
//! snapshot layout is not a stable format.

use std::any::Any;
use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PersistError;
use crate::{ErasedKey, Expiry, MemoryKey, MemoryStore, MemoryValue};

type EncodeFn = fn(&dyn Any) -> serde_json::Result<Value>;
type DecodeFn = fn(Value) -> serde_json::Result<Option<Box<dyn Any>>>;

fn encode_value<T: Serialize + 'static>(value: &dyn Any) -> serde_json::Result<Value> {
    match value.downcast_ref::<T>() {
        Some(value) => serde_json::to_value(value),
        None => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
            "stored value is not a `{}`",
            std::any::type_name::<T>()
        ))),
    }
}

/// `None` for values that normalize to an empty slot.
fn decode_value<T: MemoryValue + DeserializeOwned>(
    value: Value,
) -> serde_json::Result<Option<Box<dyn Any>>> {
    let value: T = serde_json::from_value(value)?;
    Ok((!value.is_empty_value()).then(|| Box::new(value) as Box<dyn Any>))
}

#[derive(Clone, Copy)]
struct Codec {
    key: ErasedKey,
    encode: EncodeFn,
    decode: DecodeFn,
}

/// Key name to serde codec.
#[derive(Clone, Default)]
pub struct MemoryCodecs {
    codecs: BTreeMap<&'static str, Codec>,
}

impl std::fmt::Debug for MemoryCodecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.codecs.keys()).finish()
    }
}

impl MemoryCodecs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T>(mut self, key: MemoryKey<T>) -> Self
    where
        T: MemoryValue + Serialize + DeserializeOwned,
    {
        self.insert(key);
        self
    }

    pub fn insert<T>(&mut self, key: MemoryKey<T>)
    where
        T: MemoryValue + Serialize + DeserializeOwned,
    {
        self.codecs.insert(
            key.name(),
            Codec {
                key: key.erased(),
                encode: encode_value::<T>,
                decode: decode_value::<T>,
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.codecs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Snapshot of every present entry whose key is persistent and has a codec.
    pub fn encode(&self, memory: &MemoryStore) -> PersistedMemory {
        let mut entries = Vec::new();
        for (key, value, expiry) in memory.entries() {
            if !key.is_persistent() {
                continue;
            }
            let Some(codec) = self.codecs.get(key.name()).filter(|codec| codec.key == key) else {
                tracing::warn!(key = key.name(), "persistent memory key has no codec, not saved");
                continue;
            };
            match (codec.encode)(value) {
                Ok(value) => entries.push(PersistedEntry {
                    key: key.name().to_string(),
                    value,
                    ttl: expiry.remaining(),
                }),
                Err(err) => {
                    tracing::warn!(key = key.name(), error = %err, "failed to encode memory entry");
                }
            }
        }
        PersistedMemory { entries }
    }

    /// Restores `persisted` into `memory`. Entries that cannot be restored are
    /// skipped and reported; the rest of the snapshot still loads.
    pub fn decode(&self, persisted: &PersistedMemory, memory: &mut MemoryStore) -> DecodeReport {
        let mut report = DecodeReport::default();
        for entry in &persisted.entries {
            match self.decode_entry(entry, memory) {
                Ok(()) => report.restored += 1,
                Err(err) => {
                    tracing::warn!(
                        key = %entry.key,
                        error = %err,
                        "skipping persisted memory entry"
                    );
                    report.skipped.push(err);
                }
            }
        }
        report
    }

    fn decode_entry(
        &self,
        entry: &PersistedEntry,
        memory: &mut MemoryStore,
    ) -> Result<(), PersistError> {
        let codec = self
            .codecs
            .get(entry.key.as_str())
            .ok_or_else(|| PersistError::UnknownKey {
                key: entry.key.clone(),
            })?;
        if memory.registered_key(codec.key.id()) != Some(codec.key) {
            return Err(PersistError::NotRegistered {
                key: entry.key.clone(),
            });
        }
        let decoded = (codec.decode)(entry.value.clone()).map_err(|source| PersistError::Corrupt {
            key: entry.key.clone(),
            source,
        })?;
        match decoded {
            Some(value) => {
                let expiry = entry.ttl.map_or(Expiry::Never, Expiry::Ticks);
                memory.insert_erased(&codec.key, value, expiry);
            }
            None => memory.erase_erased(&codec.key),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub key: String,
    pub value: Value,
    /// Remaining ticks; `None` never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedMemory {
    pub entries: Vec<PersistedEntry>,
}

impl PersistedMemory {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&PersistedEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_string_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Default)]
pub struct DecodeReport {
    pub restored: usize,
    pub skipped: Vec<PersistError>,
}

impl DecodeReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
