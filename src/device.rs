//! MIDI input device
//!
//! Opens a `midir` input port chosen by case-insensitive name match and
//! forwards every normalized event to a callback on midir's own thread.

use anyhow::{Context, Result};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use tracing::{debug, info, trace, warn};

use crate::controls::{Dispatch, SharedControls};
use crate::input::{normalize_midi_bytes, NormalizedInput};
use crate::midi::format_hex;

/// Information about a discovered MIDI port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub index: usize,
    pub name: String,
    pub is_virtual: bool,
}

/// Loopback drivers rather than hardware
pub fn is_virtual_port_name(name: &str) -> bool {
    name.contains("Virtual") || name.contains("loopMIDI") || name.contains("IAC") || name.contains("Midi Through")
}

/// Case-insensitive substring match used to pick ports
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    name.to_lowercase().contains(&pattern.to_lowercase())
}

pub fn discover_input_ports(client_name: &str) -> Result<Vec<PortInfo>> {
    let midi_in = MidiInput::new(&format!("{}-discovery", client_name))
        .context("Failed to create MIDI input")?;

    let mut port_infos = Vec::new();
    for (index, port) in midi_in.ports().iter().enumerate() {
        if let Ok(name) = midi_in.port_name(port) {
            port_infos.push(PortInfo {
                index,
                is_virtual: is_virtual_port_name(&name),
                name,
            });
        }
    }
    Ok(port_infos)
}

/// Find an input port by numeric index or name pattern
fn find_input_port(midi_in: &MidiInput, pattern: &str) -> Option<(MidiInputPort, String)> {
    let ports = midi_in.ports();
    if let Ok(index) = pattern.parse::<usize>() {
        let port = ports.into_iter().nth(index)?;
        let name = midi_in.port_name(&port).ok()?;
        return Some((port, name));
    }
    for port in ports {
        if let Ok(name) = midi_in.port_name(&port) {
            if matches_pattern(&name, pattern) {
                debug!("Found port '{}' matching pattern '{}'", name, pattern);
                return Some((port, name));
            }
        }
    }
    None
}

/// Open connection to one input port
pub struct MidiInputDevice {
    _conn: MidiInputConnection<()>,
    port_name: String,
}

impl MidiInputDevice {
    /// Connect to the first port matching `pattern` and call `on_input` for
    /// every event that normalizes to a binding input.
    pub fn connect_with<F>(client_name: &str, pattern: &str, mut on_input: F) -> Result<Self>
    where
        F: FnMut(NormalizedInput, &[u8]) + Send + 'static,
    {
        let mut midi_in = MidiInput::new(client_name).context("Failed to create MIDI input")?;
        midi_in.ignore(Ignore::All);

        let (port, port_name) = find_input_port(&midi_in, pattern)
            .ok_or_else(|| anyhow::anyhow!("Input port '{}' not found", pattern))?;

        info!("Connecting to input port: {}", port_name);

        let conn = midi_in
            .connect(
                &port,
                client_name,
                move |_timestamp, data, _| match normalize_midi_bytes(data) {
                    Some(input) => on_input(input, data),
                    None => trace!("Ignoring MIDI: {}", format_hex(data)),
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("Failed to connect to input port: {}", e))?;

        Ok(Self {
            _conn: conn,
            port_name,
        })
    }

    /// Connect and dispatch straight into the engine from the MIDI thread
    pub fn connect(client_name: &str, pattern: &str, controls: SharedControls) -> Result<Self> {
        Self::connect_with(client_name, pattern, move |input, data| {
            match controls.input_normalized(input) {
                Ok(Dispatch::Learned) => debug!("Learned {} from {}", input.key, format_hex(data)),
                Ok(Dispatch::Handled { .. }) => {}
                Err(e) => warn!("Dispatch of {} failed: {:#}", input.key, e),
            }
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}
