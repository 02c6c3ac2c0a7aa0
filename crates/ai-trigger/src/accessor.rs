//! Handles yielded by memory queries.
//!
//! Each handle carries its key so an effect can write back to the slot it
//! read. Values are snapshots taken at query time; writes go through the
//! `&mut MemoryStore` the effect receives.

use ai_brain::{MemoryKey, MemoryStore, MemoryValue};

/// A slot that held a value when the query ran.
#[derive(Debug, Clone)]
pub struct Present<V: 'static> {
    key: MemoryKey<V>,
    value: V,
}

impl<V: 'static> Present<V> {
    pub(crate) fn new(key: MemoryKey<V>, value: V) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> MemoryKey<V> {
        self.key
    }

    pub fn get(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn erase(&self, memory: &mut MemoryStore) {
        memory.erase(self.key);
    }
}

impl<V: MemoryValue> Present<V> {
    pub fn set(&self, memory: &mut MemoryStore, value: V) {
        memory.set(self.key, value);
    }

    pub fn set_with_expiry(&self, memory: &mut MemoryStore, value: V, ttl_ticks: u64) {
        memory.set_with_expiry(self.key, value, ttl_ticks);
    }
}

/// A slot that was empty when the query ran.
#[derive(Debug, Clone, Copy)]
pub struct Absent<V: 'static> {
    key: MemoryKey<V>,
}

impl<V: 'static> Absent<V> {
    pub(crate) fn new(key: MemoryKey<V>) -> Self {
        Self { key }
    }

    pub fn key(&self) -> MemoryKey<V> {
        self.key
    }

    pub fn erase(&self, memory: &mut MemoryStore) {
        memory.erase(self.key);
    }
}

impl<V: MemoryValue> Absent<V> {
    pub fn set(&self, memory: &mut MemoryStore, value: V) {
        memory.set(self.key, value);
    }

    pub fn set_with_expiry(&self, memory: &mut MemoryStore, value: V, ttl_ticks: u64) {
        memory.set_with_expiry(self.key, value, ttl_ticks);
    }
}

/// A registered slot, with whatever it held when the query ran.
#[derive(Debug, Clone)]
pub struct Registered<V: 'static> {
    key: MemoryKey<V>,
    value: Option<V>,
}

impl<V: 'static> Registered<V> {
    pub(crate) fn new(key: MemoryKey<V>, value: Option<V>) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> MemoryKey<V> {
        self.key
    }

    pub fn get(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<V> {
        self.value
    }

    pub fn erase(&self, memory: &mut MemoryStore) {
        memory.erase(self.key);
    }
}

impl<V: MemoryValue> Registered<V> {
    pub fn set(&self, memory: &mut MemoryStore, value: V) {
        memory.set(self.key, value);
    }

    pub fn set_with_expiry(&self, memory: &mut MemoryStore, value: V, ttl_ticks: u64) {
        memory.set_with_expiry(self.key, value, ttl_ticks);
    }

    pub fn set_optional(&self, memory: &mut MemoryStore, value: Option<V>) {
        memory.set_optional(self.key, value);
    }
}
