//! Input lookup table derived from the binding list

use std::collections::HashMap;

use crate::binding::{Binding, InputKey};

/// Bindings grouped by input key, each group in binding-list order.
///
/// Always rebuilt from the list as a whole; never edited in place.
#[derive(Debug, Default, Clone)]
pub struct BindingTable {
    groups: HashMap<InputKey, Vec<Binding>>,
}

impl BindingTable {
    pub fn rebuild(bindings: &[Binding]) -> Self {
        let mut groups: HashMap<InputKey, Vec<Binding>> = HashMap::new();
        for binding in bindings {
            groups
                .entry(binding.input_key())
                .or_default()
                .push(binding.clone());
        }
        Self { groups }
    }

    pub fn get(&self, key: &InputKey) -> &[Binding] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &InputKey> {
        self.groups.keys()
    }

    /// Number of distinct inputs
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
