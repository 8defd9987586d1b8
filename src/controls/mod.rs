//! Controls engine - binding list, lookup table and dispatch
//!
//! The engine owns everything that changes while the mixer runs:
//! - the ordered binding list (persisted, edited by the user)
//! - the lookup table derived from it
//! - the repeat cache that turns held keys into single pulses
//! - highlight marks for bindings that just fired
//! - an optional learn-mode listener
//!
//! Hosts share one engine through [`SharedControls`], a single mutex held for
//! the whole of each dispatch and each mutation. Action callables run while
//! that lock is held and must never call back into the engine.

pub mod highlight;
pub mod repeat;
pub mod table;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::binding::{Binding, BindingError, InputKey, Mode};
use crate::input::NormalizedInput;
use crate::registry::ActionRegistry;

pub use highlight::Highlights;
pub use repeat::RepeatCache;
pub use table::BindingTable;

/// Threshold between "low" and "high" intensity
pub const THRESHOLD: i32 = 0x40;

/// Learn-mode listener, receives the input key instead of the dispatcher
pub type Learner = Box<dyn FnMut(&InputKey) + Send>;

/// Outcome of feeding one input to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A learn-mode listener took the input; nothing was dispatched
    Learned,
    /// Dispatched; `invoked` actions were called
    Handled { invoked: usize },
}

/// Arguments for one action call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub target: u32,
    pub value: i32,
    pub is_delta: bool,
}

/// Engine state
pub struct Controls {
    registry: Arc<ActionRegistry>,
    bindings: Vec<Binding>,
    table: BindingTable,
    repeats: RepeatCache,
    highlights: Highlights,
    learner: Option<Learner>,
}

impl Controls {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self {
            registry,
            bindings: Vec::new(),
            table: BindingTable::default(),
            repeats: RepeatCache::default(),
            highlights: Highlights::default(),
            learner: None,
        }
    }

    pub fn with_bindings(registry: Arc<ActionRegistry>, bindings: Vec<Binding>) -> Self {
        let mut controls = Self::new(registry);
        controls.set_bindings(bindings);
        controls
    }

    pub fn set_repeat_ttl(&mut self, ttl: Duration) {
        self.repeats.set_ttl(ttl);
    }

    pub fn set_highlight_ticks(&mut self, ticks: u32) {
        self.highlights.set_ticks(ticks);
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Parse a binding against this engine's registry
    pub fn parse(&self, s: &str) -> Result<Binding, BindingError> {
        Binding::parse(s, &self.registry)
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    /// Bindings attached to `key`, in list order
    pub fn bindings_for(&self, key: &InputKey) -> &[Binding] {
        self.table.get(key)
    }

    // ===== Binding list mutations (each rebuilds the table) =====

    pub fn push(&mut self, binding: Binding) {
        self.bindings.push(binding);
        self.rebuild();
    }

    /// Insert at `index`, clamped to the end of the list
    pub fn insert(&mut self, index: usize, binding: Binding) {
        let index = index.min(self.bindings.len());
        self.bindings.insert(index, binding);
        self.rebuild();
    }

    pub fn remove(&mut self, index: usize) -> Option<Binding> {
        if index >= self.bindings.len() {
            return None;
        }
        let removed = self.bindings.remove(index);
        self.repeats.discard(&removed);
        self.rebuild();
        Some(removed)
    }

    /// Replace the binding at `index`, returning the old one
    pub fn replace(&mut self, index: usize, binding: Binding) -> Option<Binding> {
        let slot = self.bindings.get_mut(index)?;
        let old = std::mem::replace(slot, binding);
        self.repeats.discard(&old);
        self.rebuild();
        Some(old)
    }

    /// Swap in a whole new list (load, reload)
    pub fn set_bindings(&mut self, bindings: Vec<Binding>) {
        self.bindings = bindings;
        self.repeats.clear();
        self.rebuild();
        info!(
            "Loaded {} binding(s) on {} input(s)",
            self.bindings.len(),
            self.table.len()
        );
    }

    fn rebuild(&mut self) {
        self.table = BindingTable::rebuild(&self.bindings);
    }

    // ===== Learn mode =====

    pub fn set_learner(&mut self, learner: Learner) {
        self.learner = Some(learner);
    }

    pub fn clear_learner(&mut self) {
        self.learner = None;
    }

    pub fn is_learning(&self) -> bool {
        self.learner.is_some()
    }

    // ===== Highlights =====

    pub fn is_highlighted(&self, binding: &Binding) -> bool {
        self.highlights.is_highlighted(binding)
    }

    /// Advance highlight decay one tick; returns bindings to repaint
    pub fn tick_highlights(&mut self) -> Vec<Binding> {
        self.highlights.tick()
    }

    // ===== Dispatch =====

    pub fn input_normalized(&mut self, input: NormalizedInput) -> Result<Dispatch> {
        self.input(&input.key, input.value)
    }

    /// Feed one normalized input. Stops at the first failing action; bindings
    /// after it on the same input are not invoked.
    pub fn input(&mut self, key: &InputKey, value: u8) -> Result<Dispatch> {
        self.input_at(key, value, Instant::now())
    }

    /// Values above 127 are clamped to 127.
    pub fn input_at(&mut self, key: &InputKey, value: u8, now: Instant) -> Result<Dispatch> {
        let value = value.min(0x7F);
        if let Some(learner) = self.learner.as_mut() {
            debug!("Learn mode: captured {}", key);
            learner(key);
            return Ok(Dispatch::Learned);
        }

        let Self {
            registry,
            table,
            repeats,
            highlights,
            ..
        } = self;

        let matching = table.get(key);
        if matching.is_empty() {
            debug!("No binding for {} (value {})", key, value);
            return Ok(Dispatch::Handled { invoked: 0 });
        }

        let mut invoked = 0;
        for binding in matching {
            let Some(call) = resolve(binding, i32::from(value), repeats, now) else {
                continue;
            };
            debug!(
                "{} -> {}({}, {}, {})",
                key, binding.method, call.target, call.value, call.is_delta
            );
            // Marked even when the action fails
            highlights.mark(binding);
            invoked += 1;
            registry.invoke(&binding.method, call.target, call.value, call.is_delta)?;
        }
        Ok(Dispatch::Handled { invoked })
    }
}

/// Decide whether `binding` fires for intensity `v`, and with what arguments.
///
/// Pulse bindings update `repeats` as a side effect.
pub fn resolve(binding: &Binding, v: i32, repeats: &mut RepeatCache, now: Instant) -> Option<Invocation> {
    let target = binding.target;
    match binding.mode {
        Mode::Direct => {
            let value = if binding.value < 0 { 127 - v } else { v };
            Some(Invocation {
                target,
                value,
                is_delta: false,
            })
        }
        Mode::Pulse => {
            // Repeat gate sees the raw intensity, before act-on-release inversion
            let mut v = v;
            if v >= THRESHOLD {
                if repeats.contains_at(binding, now) {
                    return None;
                }
                repeats.add_at(binding, now);
            } else {
                repeats.discard(binding);
            }
            if binding.value <= THRESHOLD {
                v = 127 - v;
            }
            (v >= THRESHOLD).then_some(Invocation {
                target,
                value: binding.value,
                is_delta: true,
            })
        }
        Mode::Set => (v >= THRESHOLD).then_some(Invocation {
            target,
            value: binding.value,
            is_delta: false,
        }),
        Mode::Alter => (v >= THRESHOLD).then_some(Invocation {
            target,
            value: binding.value,
            is_delta: true,
        }),
    }
}

/// Engine handle shared between the MIDI callback thread, the backend
/// reader, the REPL and the file watcher.
#[derive(Clone)]
pub struct SharedControls {
    inner: Arc<Mutex<Controls>>,
}

impl SharedControls {
    pub fn new(controls: Controls) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controls)),
        }
    }

    /// Lock the engine. Do not hold the guard across an action callable that
    /// could itself lock the engine.
    pub fn lock(&self) -> MutexGuard<'_, Controls> {
        self.inner.lock()
    }

    pub fn input(&self, key: &InputKey, value: u8) -> Result<Dispatch> {
        self.inner.lock().input(key, value)
    }

    pub fn input_normalized(&self, input: NormalizedInput) -> Result<Dispatch> {
        self.inner.lock().input_normalized(input)
    }

    pub fn set_bindings(&self, bindings: Vec<Binding>) {
        self.inner.lock().set_bindings(bindings);
    }

    pub fn bindings(&self) -> Vec<Binding> {
        self.inner.lock().bindings().to_vec()
    }

    pub fn tick_highlights(&self) -> Vec<Binding> {
        self.inner.lock().tick_highlights()
    }
}
