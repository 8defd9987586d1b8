//! Action relay to the audio backend
//!
//! The standalone host has no mixer widgets of its own; every action
//! invocation becomes a `key=value` command line on the backend pipe,
//! e.g. `action=p_pp target=0 value=127 delta=1`.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::registry::{ActionFn, ActionRegistry};

/// One relayed invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCommand {
    pub method: String,
    pub target: u32,
    pub value: i32,
    pub is_delta: bool,
}

impl fmt::Display for ActionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "action={} target={} value={} delta={}",
            self.method,
            self.target,
            self.value,
            u8::from(self.is_delta)
        )
    }
}

impl ActionCommand {
    /// Parse a command line back; fields may come in any order
    pub fn parse(line: &str) -> Option<Self> {
        let mut method = None;
        let mut target = None;
        let mut value = None;
        let mut is_delta = None;
        for field in line.split_whitespace() {
            match field.split_once('=')? {
                ("action", v) => method = Some(v.to_string()),
                ("target", v) => target = v.parse().ok(),
                ("value", v) => value = v.parse().ok(),
                ("delta", "1") => is_delta = Some(true),
                ("delta", "0") => is_delta = Some(false),
                _ => return None,
            }
        }
        Some(Self {
            method: method?,
            target: target?,
            value: value?,
            is_delta: is_delta?,
        })
    }
}

/// Handler that forwards invocations of `method` into `tx`.
///
/// Sending never blocks, so the handler is safe on the MIDI callback thread.
pub fn relay_handler(method: &str, tx: mpsc::UnboundedSender<ActionCommand>) -> ActionFn {
    let method = method.to_string();
    Arc::new(move |target, value, is_delta| {
        tx.send(ActionCommand {
            method: method.clone(),
            target,
            value,
            is_delta,
        })
        .map_err(|_| anyhow::anyhow!("action relay closed"))
    })
}

/// Standard registry with every action relayed to `tx`
pub fn relay_registry(tx: mpsc::UnboundedSender<ActionCommand>) -> ActionRegistry {
    ActionRegistry::standard(|spec| relay_handler(&spec.name, tx.clone()))
}
