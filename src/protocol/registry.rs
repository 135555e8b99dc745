//! Function registry keyed by name.
//!
//! Names are unique. Registering an existing name swaps the descriptor in
//! place, so `list` keeps the position of the first registration.

use std::collections::HashMap;
use std::sync::Arc;

use super::{FunctionDescriptor, FunctionInfo};

/// Registry mapping function names to descriptors.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    /// Descriptors in registration order.
    entries: Vec<Arc<FunctionDescriptor>>,
    /// Name to index in `entries`.
    index: HashMap<String, usize>,
}

impl FunctionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor, replacing any previous one with the same name.
    ///
    /// Returns `true` if an existing entry was replaced.
    pub fn register(&mut self, descriptor: FunctionDescriptor) -> bool {
        let descriptor = Arc::new(descriptor);
        match self.index.get(descriptor.name()) {
            Some(&slot) => {
                self.entries[slot] = descriptor;
                true
            }
            None => {
                self.index
                    .insert(descriptor.name().to_string(), self.entries.len());
                self.entries.push(descriptor);
                false
            }
        }
    }

    /// Get a descriptor by name.
    pub fn get(&self, name: &str) -> Option<Arc<FunctionDescriptor>> {
        self.index.get(name).map(|&slot| self.entries[slot].clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Snapshot of public metadata in registration order.
    pub fn list(&self) -> Vec<FunctionInfo> {
        self.entries.iter().map(|d| d.info()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every descriptor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}
