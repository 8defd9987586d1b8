//! Short-lived highlighting of bindings that just fired
//!
//! Purely observational: a binding list view shows which bindings reacted
//! to the last inputs. Each mark lasts a fixed number of display ticks.

use std::collections::HashMap;

use tracing::trace;

use crate::binding::Binding;

pub const DEFAULT_TICKS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mark {
    remaining: u32,
    fresh: bool,
}

#[derive(Debug, Clone)]
pub struct Highlights {
    ticks: u32,
    marks: HashMap<Binding, Mark>,
}

impl Default for Highlights {
    fn default() -> Self {
        Self::new(DEFAULT_TICKS)
    }
}

impl Highlights {
    pub fn new(ticks: u32) -> Self {
        Self {
            ticks,
            marks: HashMap::new(),
        }
    }

    pub fn set_ticks(&mut self, ticks: u32) {
        self.ticks = ticks;
    }

    pub fn mark(&mut self, binding: &Binding) {
        self.marks.insert(
            binding.clone(),
            Mark {
                remaining: self.ticks,
                fresh: true,
            },
        );
    }

    pub fn is_highlighted(&self, binding: &Binding) -> bool {
        self.marks.contains_key(binding)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Advance one display tick.
    ///
    /// Returns the bindings whose visible state changed: newly marked ones
    /// and ones whose highlight just ended.
    pub fn tick(&mut self) -> Vec<Binding> {
        let mut changed = Vec::new();
        self.marks.retain(|binding, mark| {
            let keep = mark.remaining >= 1;
            if mark.fresh || !keep {
                changed.push(binding.clone());
            }
            mark.remaining = mark.remaining.saturating_sub(1);
            mark.fresh = false;
            keep
        });
        if !changed.is_empty() {
            trace!("{} binding highlight(s) changed", changed.len());
        }
        changed
    }
}
