//! Action registry
//!
//! The fixed, ordered set of named actions a binding may point to. Each
//! action advertises the modes it supports (the first is its default) and
//! carries the handler invoked as `(target, value, is_delta)`.
//!
//! Registration happens once, through [`RegistryBuilder`], before any
//! binding is parsed; the built registry is immutable and shared behind an
//! `Arc`.

pub mod catalog;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::binding::Mode;

/// Handler of one action: `(target, value, is_delta)`
pub type ActionFn = Arc<dyn Fn(u32, i32, bool) -> anyhow::Result<()> + Send + Sync>;

/// Handler that ignores every invocation
pub fn noop() -> ActionFn {
    Arc::new(|_, _, _| Ok(()))
}

/// Registration errors. These are programming errors in the host, not
/// conditions to recover from at runtime.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("action {0:?} registered twice")]
    Duplicate(String),

    #[error("action name {0:?} is not a valid identifier")]
    InvalidName(String),

    #[error("action {0:?} declares no modes")]
    NoModes(String),

    #[error("unknown action {0:?}")]
    UnknownMethod(String),
}

/// Metadata of one registered action
#[derive(Debug, Clone, Serialize)]
pub struct ActionSpec {
    pub name: String,
    pub modes: Vec<Mode>,
    pub description: String,
}

impl ActionSpec {
    pub fn new(name: impl Into<String>, modes: &[Mode], description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modes: modes.to_vec(),
            description: description.into(),
        }
    }

    pub fn default_mode(&self) -> Mode {
        self.modes[0]
    }

    pub fn supports(&self, mode: Mode) -> bool {
        self.modes.contains(&mode)
    }

    /// Leading character, used to group methods by what they act on
    pub fn group(&self) -> char {
        self.name.chars().next().unwrap_or_default()
    }
}

struct Entry {
    spec: ActionSpec,
    handler: ActionFn,
}

/// Frozen set of actions
pub struct ActionRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    groups: Vec<char>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("methods", &self.methods().collect::<Vec<_>>())
            .field("groups", &self.groups)
            .finish()
    }
}

impl ActionRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Register the whole standard catalog, wiring each action to the
    /// handler `factory` returns for it.
    pub fn standard(mut factory: impl FnMut(&ActionSpec) -> ActionFn) -> Self {
        let mut builder = Self::builder();
        for entry in catalog::STANDARD_ACTIONS {
            let spec = ActionSpec::new(entry.name, entry.modes, entry.description);
            let handler = factory(&spec);
            // The catalog is checked for duplicates and empty modes by its tests
            if let Err(e) = builder.register(spec, handler) {
                unreachable!("standard catalog is inconsistent: {e}");
            }
        }
        builder.build()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.index.contains_key(method)
    }

    pub fn spec(&self, method: &str) -> Option<&ActionSpec> {
        self.index.get(method).map(|&i| &self.entries[i].spec)
    }

    /// Registration position of a method, used for stable sorting
    pub fn position(&self, method: &str) -> Option<usize> {
        self.index.get(method).copied()
    }

    /// Method names in registration order
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.spec.name.as_str())
    }

    pub fn specs(&self) -> impl Iterator<Item = &ActionSpec> {
        self.entries.iter().map(|e| &e.spec)
    }

    /// Distinct method groups in order of first registration
    pub fn groups(&self) -> &[char] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Call the handler of `method`. Handler errors are returned to the
    /// caller unchanged apart from added context.
    pub fn invoke(&self, method: &str, target: u32, value: i32, is_delta: bool) -> anyhow::Result<()> {
        let entry = self
            .index
            .get(method)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| RegistryError::UnknownMethod(method.to_string()))?;

        debug!(method, target, value, is_delta, "invoking action");
        (entry.handler)(target, value, is_delta)
            .with_context(|| format!("action {} failed (target {})", method, target))
    }
}

/// Collects registrations in order, then freezes them
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    groups: Vec<char>,
}

impl RegistryBuilder {
    pub fn register(&mut self, spec: ActionSpec, handler: ActionFn) -> Result<&mut Self, RegistryError> {
        let valid_name = !spec.name.is_empty()
            && spec
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name {
            return Err(RegistryError::InvalidName(spec.name));
        }
        if spec.modes.is_empty() {
            return Err(RegistryError::NoModes(spec.name));
        }
        if self.index.contains_key(&spec.name) {
            return Err(RegistryError::Duplicate(spec.name));
        }

        let group = spec.group();
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
        self.index.insert(spec.name.clone(), self.entries.len());
        self.entries.push(Entry { spec, handler });
        Ok(self)
    }

    pub fn build(self) -> ActionRegistry {
        ActionRegistry {
            entries: self.entries,
            index: self.index,
            groups: self.groups,
        }
    }
}
