//! Where discovered lights are recorded.

use std::collections::BTreeMap;

use crate::types::{DeviceRecord, LightAddress};

/// Bridge light table as seen by discovery.
pub trait LightRegistry: Send {
    /// Whether any light already points at `address`.
    fn is_registered(&self, address: &LightAddress) -> bool;

    /// Lowest light id not in use.
    fn next_free_id(&self) -> String;

    fn insert(&mut self, id: String, record: DeviceRecord, address: LightAddress);
}

/// In-memory registry with numeric string ids starting at `"1"`.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    lights: BTreeMap<String, DeviceRecord>,
    addresses: BTreeMap<String, LightAddress>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&DeviceRecord> {
        self.lights.get(id)
    }

    pub fn address(&self, id: &str) -> Option<&LightAddress> {
        self.addresses.get(id)
    }

    /// Ids bound to `address`; more than one means a duplicate.
    pub fn ids_for(&self, address: &LightAddress) -> Vec<&str> {
        self.addresses
            .iter()
            .filter(|(_, a)| *a == address)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Every registered light id with its address, ordered by id.
    pub fn addresses(&self) -> impl Iterator<Item = (&str, &LightAddress)> {
        self.addresses.iter().map(|(id, a)| (id.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}

impl LightRegistry for MemoryRegistry {
    fn is_registered(&self, address: &LightAddress) -> bool {
        self.addresses.values().any(|a| a == address)
    }

    fn next_free_id(&self) -> String {
        let mut id: u64 = 1;
        while self.lights.contains_key(&id.to_string()) {
            id += 1;
        }
        id.to_string()
    }

    fn insert(&mut self, id: String, record: DeviceRecord, address: LightAddress) {
        self.addresses.insert(id.clone(), address);
        self.lights.insert(id, record);
    }
}
