//! MIDI sniffer for building bindings
//!
//! Prints every incoming MIDI event with its decoded message, canonical
//! input key and intensity, so a user can see what to type into a
//! controls file.

use anyhow::Result;
use colored::*;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::device::{self, MidiInputDevice};
use crate::input::NormalizedInput;
use crate::midi::{format_hex, MidiMessage};

/// One captured event
#[derive(Debug, Clone)]
pub struct SnifferEvent {
    pub timestamp_ms: u64,
    pub port_name: String,
    pub data: Vec<u8>,
    pub input: NormalizedInput,
}

/// Run the sniffer until Ctrl+C.
///
/// With no pattern, every physical input port is monitored.
pub async fn run_cli_sniffer(client_name: &str, pattern: Option<&str>) -> Result<()> {
    println!("{}", "=== MIDI Sniffer ===".bold().cyan());
    println!("Press Ctrl+C to exit\n");

    let (event_tx, mut event_rx) = mpsc::channel::<SnifferEvent>(1000);
    let start_time = Instant::now();
    let mut devices = Vec::new();

    // (pattern, label) per port to open
    let targets: Vec<(String, String)> = match pattern {
        Some(p) => vec![(p.to_string(), p.to_string())],
        None => device::discover_input_ports(client_name)?
            .into_iter()
            .filter(|port| !port.is_virtual)
            .map(|port| (port.index.to_string(), port.name))
            .collect(),
    };

    for (n, (pattern, label)) in targets.into_iter().enumerate() {
        let tx = event_tx.clone();
        let port_label = label;
        let device = MidiInputDevice::connect_with(
            &format!("{}-sniffer-{}", client_name, n),
            &pattern,
            move |input, data| {
                let event = SnifferEvent {
                    timestamp_ms: start_time.elapsed().as_millis() as u64,
                    port_name: port_label.clone(),
                    data: data.to_vec(),
                    input,
                };
                let _ = tx.try_send(event);
            },
        )?;
        println!("Monitoring {}", device.port_name().white());
        devices.push(device);
    }
    drop(event_tx);

    if devices.is_empty() {
        anyhow::bail!("No physical MIDI input ports found");
    }

    println!("{}", "Format: [timestamp] PORT | HEX => MESSAGE => INPUT VALUE".dimmed());
    println!("{}\n", "─".repeat(80).dimmed());

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => println!("{}", format_event(&event)),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!("\n{}", "Sniffer stopped".yellow());
    Ok(())
}

fn format_event(event: &SnifferEvent) -> String {
    let port = if event.port_name.chars().count() > 20 {
        let short: String = event.port_name.chars().take(17).collect();
        format!("{}...", short)
    } else {
        event.port_name.clone()
    };

    let hex = format_hex(&event.data);
    let message = MidiMessage::parse(&event.data);
    let hex_colored = match message {
        Some(MidiMessage::NoteOn { .. }) => hex.bright_green(),
        Some(MidiMessage::NoteOff { .. }) => hex.bright_red(),
        Some(MidiMessage::ControlChange { .. }) => hex.bright_yellow(),
        Some(MidiMessage::PitchBend { .. }) => hex.bright_cyan(),
        _ => hex.normal(),
    };
    let parsed = message
        .map(|m| format!(" => {}", m.to_string().bright_blue()))
        .unwrap_or_default();

    format!(
        "[{}ms] {:20} | {}{} => {} {:02x}",
        format!("{:08}", event.timestamp_ms).dimmed(),
        port.white(),
        hex_colored,
        parsed,
        event.input.key.to_string().bold(),
        event.input.value
    )
}

/// List MIDI input ports in a formatted way
pub fn list_ports_formatted(client_name: &str) -> Result<()> {
    let inputs = device::discover_input_ports(client_name)?;

    println!("\n{}", "=== Available MIDI Input Ports ===".bold().cyan());
    if inputs.is_empty() {
        println!("  {}", "No input ports found".dimmed());
    }
    for port in inputs {
        let marker = if port.is_virtual {
            "[VIRTUAL]".yellow()
        } else {
            "[PHYSICAL]".green()
        };
        println!("  {:>2} {} {}", port.index, marker, port.name);
    }
    println!();
    Ok(())
}
