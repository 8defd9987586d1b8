//! Parsing of the audio backend's key=value reply lines
//!
//! The backend reports MIDI input it received as
//! `midi=<input>:<hex-value>[,<input>:<hex-value>...]`, e.g.
//! `midi=c0.7:7f,n0.3c:0`.

use tracing::warn;

use super::NormalizedInput;
use crate::binding::InputKey;

/// Split one reply line into key and value
pub fn parse_reply_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.trim_end_matches(['\r', '\n']).split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parse one `<input>:<hex-value>` entry
pub fn parse_midi_entry(entry: &str) -> Option<NormalizedInput> {
    let (input, value) = entry.trim().split_once(':')?;
    let key: InputKey = input.parse().ok()?;
    let value = u8::from_str_radix(value, 16).ok()?;
    Some(NormalizedInput::new(key, value))
}

/// Parse the payload of a `midi=` reply. Malformed entries are skipped.
pub fn parse_midi_report(payload: &str) -> Vec<NormalizedInput> {
    payload
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| {
            let parsed = parse_midi_entry(entry);
            if parsed.is_none() {
                warn!("Ignoring malformed MIDI report entry: {:?}", entry);
            }
            parsed
        })
        .collect()
}

/// Inputs carried by a reply line, empty unless it is a `midi=` line
pub fn inputs_from_line(line: &str) -> Vec<NormalizedInput> {
    match parse_reply_line(line) {
        Some(("midi", payload)) => parse_midi_report(payload),
        _ => Vec::new(),
    }
}
