//! Per-agent blackboard with time-based expiry.
//!
//! A [`MemoryStore`] only accepts keys registered on it. Each registered key
//! owns one slot that is either empty or holds a value plus its [`Expiry`].
//! Values are type-erased internally; the registration records the value type
//! and every typed access is checked against it.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::{BrainError, MemoryError};

/// Identity of a memory slot and the type of value it holds.
pub struct MemoryKey<T: 'static> {
    id: u64,
    name: &'static str,
    persistent: bool,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for MemoryKey<T> {}

impl<T: 'static> Clone for MemoryKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> PartialEq for MemoryKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: 'static> Eq for MemoryKey<T> {}

impl<T: 'static> fmt::Debug for MemoryKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryKey")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &type_name::<T>())
            .finish()
    }
}

impl<T: 'static> MemoryKey<T> {
    /// A key whose values are never written by
    /// [`MemoryCodecs::encode`](crate::MemoryCodecs::encode).
    pub const fn new(id: u64, name: &'static str) -> Self {
        Self {
            id,
            name,
            persistent: false,
            _phantom: PhantomData,
        }
    }

    /// A key that declares itself serializable.
    pub const fn persistent(id: u64, name: &'static str) -> Self {
        Self {
            id,
            name,
            persistent: true,
            _phantom: PhantomData,
        }
    }

    pub fn id(self) -> u64 {
        self.id
    }

    pub fn name(self) -> &'static str {
        self.name
    }

    pub fn is_persistent(self) -> bool {
        self.persistent
    }

    pub fn erased(self) -> ErasedKey {
        ErasedKey {
            id: self.id,
            name: self.name,
            persistent: self.persistent,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

/// A [`MemoryKey`] with its value type recorded at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ErasedKey {
    id: u64,
    name: &'static str,
    persistent: bool,
    type_id: TypeId,
    type_name: &'static str,
}

impl ErasedKey {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl<T: 'static> From<MemoryKey<T>> for ErasedKey {
    fn from(key: MemoryKey<T>) -> Self {
        key.erased()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryStatus {
    /// The key is registered; the slot may or may not hold a value.
    Registered,
    ValuePresent,
    ValueAbsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiry {
    Never,
    Ticks(u64),
}

impl Expiry {
    /// Remaining ticks, `None` for values that never expire.
    pub fn remaining(self) -> Option<u64> {
        match self {
            Expiry::Never => None,
            Expiry::Ticks(n) => Some(n),
        }
    }
}

/// A type that can be stored in memory.
///
/// Writing a value whose `is_empty_value` is true erases the slot instead,
/// so an empty collection is never observed as present.
pub trait MemoryValue: Any {
    fn is_empty_value(&self) -> bool {
        false
    }
}

macro_rules! scalar_memory_values {
    ($($ty:ty),*) => {
        $(impl MemoryValue for $ty {})*
    };
}

scalar_memory_values!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
    String, &'static str
);

impl<A: 'static, B: 'static> MemoryValue for (A, B) {}

impl<A: 'static, B: 'static, C: 'static> MemoryValue for (A, B, C) {}

impl<T: 'static> MemoryValue for Option<T> {
    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl<T: 'static> MemoryValue for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: 'static> MemoryValue for VecDeque<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: 'static> MemoryValue for BTreeSet<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K: 'static, V: 'static> MemoryValue for BTreeMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: 'static, S: 'static> MemoryValue for HashSet<T, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K: 'static, V: 'static, S: 'static> MemoryValue for HashMap<K, V, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

struct Entry {
    value: Box<dyn Any>,
    expiry: Expiry,
}

struct Slot {
    key: ErasedKey,
    entry: Option<Entry>,
}

/// The blackboard owned by one brain.
#[derive(Default)]
pub struct MemoryStore {
    slots: BTreeMap<u64, Slot>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for slot in self.slots.values() {
            let state = match &slot.entry {
                None => "absent".to_string(),
                Some(Entry {
                    expiry: Expiry::Never,
                    ..
                }) => "present".to_string(),
                Some(Entry {
                    expiry: Expiry::Ticks(n),
                    ..
                }) => format!("present ({n} ticks left)"),
            };
            map.entry(&slot.key.name, &state);
        }
        map.finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(keys: impl IntoIterator<Item = ErasedKey>) -> Result<Self, BrainError> {
        let mut store = Self::new();
        for key in keys {
            store.register(key)?;
        }
        Ok(store)
    }

    /// Registers a slot. Registering the same key again is a no-op; reusing an
    /// id for a different value type is an error.
    pub fn register(&mut self, key: ErasedKey) -> Result<(), BrainError> {
        if let Some(existing) = self.slots.get(&key.id) {
            if existing.key.type_id != key.type_id {
                return Err(BrainError::ConflictingKey {
                    id: key.id,
                    first: format!("{}: {}", existing.key.name, existing.key.type_name),
                    second: format!("{}: {}", key.name, key.type_name),
                });
            }
            return Ok(());
        }
        self.slots.insert(key.id, Slot { key, entry: None });
        Ok(())
    }

    pub fn is_registered<T: 'static>(&self, key: MemoryKey<T>) -> bool {
        self.slots.contains_key(&key.id)
    }

    pub fn is_registered_erased(&self, key: &ErasedKey) -> bool {
        self.slots.contains_key(&key.id)
    }

    pub fn registered_key(&self, id: u64) -> Option<ErasedKey> {
        self.slots.get(&id).map(|slot| slot.key)
    }

    pub fn registered_keys(&self) -> impl Iterator<Item = ErasedKey> + '_ {
        self.slots.values().map(|slot| slot.key)
    }

    pub fn present_keys(&self) -> impl Iterator<Item = ErasedKey> + '_ {
        self.slots
            .values()
            .filter(|slot| slot.entry.is_some())
            .map(|slot| slot.key)
    }

    fn slot<T: 'static>(&self, key: MemoryKey<T>) -> Result<&Slot, MemoryError> {
        let slot = self
            .slots
            .get(&key.id)
            .ok_or(MemoryError::Unregistered { key: key.name })?;
        check_type::<T>(&slot.key)?;
        Ok(slot)
    }

    fn slot_mut<T: 'static>(&mut self, key: MemoryKey<T>) -> Result<&mut Slot, MemoryError> {
        let slot = self
            .slots
            .get_mut(&key.id)
            .ok_or(MemoryError::Unregistered { key: key.name })?;
        check_type::<T>(&slot.key)?;
        Ok(slot)
    }

    pub fn try_get<T: 'static>(&self, key: MemoryKey<T>) -> Result<Option<&T>, MemoryError> {
        let slot = self.slot(key)?;
        Ok(slot
            .entry
            .as_ref()
            .and_then(|entry| entry.value.downcast_ref::<T>()))
    }

    /// Current value of `key`.
    ///
    /// # Panics
    /// If `key` is not registered or was registered with another value type.
    pub fn get<T: 'static>(&self, key: MemoryKey<T>) -> Option<&T> {
        self.try_get(key).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_set<T: MemoryValue>(
        &mut self,
        key: MemoryKey<T>,
        value: T,
    ) -> Result<(), MemoryError> {
        self.insert(key, value, Expiry::Never)
    }

    pub fn try_set_with_expiry<T: MemoryValue>(
        &mut self,
        key: MemoryKey<T>,
        value: T,
        ttl_ticks: u64,
    ) -> Result<(), MemoryError> {
        self.insert(key, value, Expiry::Ticks(ttl_ticks))
    }

    /// Stores `value` with no expiry. Empty collections erase the slot.
    ///
    /// # Panics
    /// If `key` is not registered or was registered with another value type.
    pub fn set<T: MemoryValue>(&mut self, key: MemoryKey<T>, value: T) {
        self.try_set(key, value).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Stores `value` for `ttl_ticks` aging passes. A TTL of 0 erases the slot.
    ///
    /// # Panics
    /// If `key` is not registered or was registered with another value type.
    pub fn set_with_expiry<T: MemoryValue>(&mut self, key: MemoryKey<T>, value: T, ttl_ticks: u64) {
        self.try_set_with_expiry(key, value, ttl_ticks)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// `Some` stores, `None` erases.
    pub fn set_optional<T: MemoryValue>(&mut self, key: MemoryKey<T>, value: Option<T>) {
        match value {
            Some(value) => self.set(key, value),
            None => self.erase(key),
        }
    }

    fn insert<T: MemoryValue>(
        &mut self,
        key: MemoryKey<T>,
        value: T,
        expiry: Expiry,
    ) -> Result<(), MemoryError> {
        let slot = self.slot_mut(key)?;
        slot.entry = if value.is_empty_value() || expiry == Expiry::Ticks(0) {
            None
        } else {
            Some(Entry {
                value: Box::new(value),
                expiry,
            })
        };
        Ok(())
    }

    pub fn try_erase<T: 'static>(&mut self, key: MemoryKey<T>) -> Result<(), MemoryError> {
        self.slot_mut(key)?.entry = None;
        Ok(())
    }

    /// # Panics
    /// If `key` is not registered or was registered with another value type.
    pub fn erase<T: 'static>(&mut self, key: MemoryKey<T>) {
        self.try_erase(key).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Type-agnostic erase used for activity cleanup. Unregistered keys are ignored.
    pub fn erase_erased(&mut self, key: &ErasedKey) {
        if let Some(slot) = self.slots.get_mut(&key.id) {
            slot.entry = None;
        }
    }

    pub fn has<T: 'static>(&self, key: MemoryKey<T>, status: MemoryStatus) -> bool {
        self.check(&key.erased(), status)
    }

    pub fn has_value<T: 'static>(&self, key: MemoryKey<T>) -> bool {
        self.has(key, MemoryStatus::ValuePresent)
    }

    /// Evaluates `status` for `key`.
    ///
    /// `Registered` answers whether the key is registered at all.
    ///
    /// # Panics
    /// If `status` is `ValuePresent`/`ValueAbsent` and `key` is not registered.
    pub fn check(&self, key: &ErasedKey, status: MemoryStatus) -> bool {
        let Some(slot) = self.slots.get(&key.id) else {
            if status == MemoryStatus::Registered {
                return false;
            }
            panic!("{}", MemoryError::Unregistered { key: key.name });
        };
        match status {
            MemoryStatus::Registered => true,
            MemoryStatus::ValuePresent => slot.entry.is_some(),
            MemoryStatus::ValueAbsent => slot.entry.is_none(),
        }
    }

    pub fn is_value<T: PartialEq + 'static>(&self, key: MemoryKey<T>, value: &T) -> bool {
        self.get(key).is_some_and(|stored| stored == value)
    }

    /// Ticks left before `key` expires; 0 when absent or never expiring.
    pub fn time_until_expiry<T: 'static>(&self, key: MemoryKey<T>) -> u64 {
        self.expiry_of(&key.erased())
            .and_then(Expiry::remaining)
            .unwrap_or(0)
    }

    pub fn expiry_of(&self, key: &ErasedKey) -> Option<Expiry> {
        self.slots
            .get(&key.id)
            .and_then(|slot| slot.entry.as_ref())
            .map(|entry| entry.expiry)
    }

    /// Counts down every finite TTL and erases entries that reach zero.
    /// Returns the number of entries erased.
    pub fn age_one_tick(&mut self) -> usize {
        let mut expired = 0;
        for slot in self.slots.values_mut() {
            let Some(entry) = slot.entry.as_mut() else {
                continue;
            };
            if let Expiry::Ticks(remaining) = &mut entry.expiry {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    slot.entry = None;
                    expired += 1;
                }
            }
        }
        expired
    }

    /// Erases every value, keeping registrations.
    pub fn clear(&mut self) {
        for slot in self.slots.values_mut() {
            slot.entry = None;
        }
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (ErasedKey, &dyn Any, Expiry)> + '_ {
        self.slots.values().filter_map(|slot| {
            let entry = slot.entry.as_ref()?;
            Some((slot.key, entry.value.as_ref(), entry.expiry))
        })
    }

    /// Stores an already type-checked value. The caller guarantees `value`
    /// has the type recorded for `key`.
    pub(crate) fn insert_erased(&mut self, key: &ErasedKey, value: Box<dyn Any>, expiry: Expiry) {
        debug_assert_eq!((*value).type_id(), key.type_id);
        if let Some(slot) = self.slots.get_mut(&key.id) {
            slot.entry = (expiry != Expiry::Ticks(0)).then_some(Entry { value, expiry });
        }
    }
}

fn check_type<T: 'static>(key: &ErasedKey) -> Result<(), MemoryError> {
    if key.type_id == TypeId::of::<T>() {
        Ok(())
    } else {
        Err(MemoryError::TypeMismatch {
            key: key.name,
            stored: key.type_name,
            requested: type_name::<T>(),
        })
    }
}
