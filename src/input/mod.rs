//! Input event normalization
//!
//! Turns raw keyboard and MIDI occurrences into a canonical [`InputKey`]
//! plus a 0-127 intensity, the only form the dispatcher understands.

pub mod backend;

use crate::binding::{InputKey, Source};
use crate::midi::{convert, MidiMessage};

/// Full intensity, reported for key-down and note-on
pub const HIGH: u8 = 0x7F;

/// A raw input occurrence as delivered by a keyboard or MIDI source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    Key {
        /// Modifier state bits at the time of the event
        state: u32,
        keyval: u32,
        pressed: bool,
    },
    Midi(MidiMessage),
}

/// A normalized input ready for dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedInput {
    pub key: InputKey,
    pub value: u8,
}

impl NormalizedInput {
    pub fn new(key: InputKey, value: u8) -> Self {
        Self {
            key,
            value: value & 0x7F,
        }
    }
}

/// Standalone modifier keys (Shift_L .. Hyper_R, and the ISO lock/level keys)
pub fn is_modifier_key(keyval: u32) -> bool {
    (0xFFE1..0xFFEF).contains(&keyval) || (0xFE01..0xFE35).contains(&keyval)
}

/// Normalize a raw input.
///
/// Returns `None` for inputs that never drive bindings: bare modifier keys
/// and MIDI messages other than control change, notes and pitch bend.
pub fn normalize(raw: &RawInput) -> Option<NormalizedInput> {
    match *raw {
        RawInput::Key {
            state,
            keyval,
            pressed,
        } => {
            if is_modifier_key(keyval) {
                return None;
            }
            let value = if pressed { HIGH } else { 0 };
            Some(NormalizedInput::new(
                InputKey::new(Source::Keyboard, state, keyval),
                value,
            ))
        }
        RawInput::Midi(message) => normalize_midi(&message),
    }
}

pub fn normalize_midi(message: &MidiMessage) -> Option<NormalizedInput> {
    match *message {
        MidiMessage::ControlChange { channel, cc, value } => Some(NormalizedInput::new(
            InputKey::new(Source::Control, channel as u32, cc as u32),
            value,
        )),
        MidiMessage::NoteOn { channel, note, .. } => Some(NormalizedInput::new(
            InputKey::new(Source::Note, channel as u32, note as u32),
            HIGH,
        )),
        MidiMessage::NoteOff { channel, note, .. } => Some(NormalizedInput::new(
            InputKey::new(Source::Note, channel as u32, note as u32),
            0,
        )),
        MidiMessage::PitchBend { channel, value } => Some(NormalizedInput::new(
            InputKey::new(Source::PitchWheel, channel as u32, 0),
            convert::to_7bit(value),
        )),
        _ => None,
    }
}

/// Decode and normalize raw MIDI bytes
pub fn normalize_midi_bytes(data: &[u8]) -> Option<NormalizedInput> {
    MidiMessage::parse(data).as_ref().and_then(normalize_midi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_and_up() {
        let down = normalize(&RawInput::Key {
            state: 0x100,
            keyval: 0xffbe,
            pressed: true,
        })
        .unwrap();
        assert_eq!(down.key.to_string(), "k100.ffbe");
        assert_eq!(down.value, 127);

        let up = normalize(&RawInput::Key {
            state: 0x100,
            keyval: 0xffbe,
            pressed: false,
        })
        .unwrap();
        assert_eq!(up.key, down.key);
        assert_eq!(up.value, 0);
    }

    #[test]
    fn test_bare_modifiers_ignored() {
        for keyval in [0xffe1, 0xffe3, 0xffe9, 0xffee, 0xfe03] {
            assert_eq!(
                normalize(&RawInput::Key {
                    state: 0,
                    keyval,
                    pressed: true
                }),
                None,
                "keyval {:x}",
                keyval
            );
        }
        // Just past the ranges
        assert!(normalize(&RawInput::Key {
            state: 0,
            keyval: 0xffef,
            pressed: true
        })
        .is_some());
    }

    #[test]
    fn test_control_change() {
        let n = normalize_midi_bytes(&[0xB1, 0x07, 0x55]).unwrap();
        assert_eq!(n.key.to_string(), "c1.7");
        assert_eq!(n.value, 0x55);
    }

    #[test]
    fn test_notes_ignore_velocity() {
        let on = normalize_midi_bytes(&[0x92, 0x3C, 0x10]).unwrap();
        assert_eq!(on.key.to_string(), "n2.3c");
        assert_eq!(on.value, 127);

        let off = normalize_midi_bytes(&[0x82, 0x3C, 0x40]).unwrap();
        assert_eq!(off.value, 0);

        let zero_velocity = normalize_midi_bytes(&[0x92, 0x3C, 0x00]).unwrap();
        assert_eq!(zero_velocity.value, 0);
    }

    #[test]
    fn test_pitch_wheel_compressed() {
        let n = normalize_midi_bytes(&[0xE3, 0x7F, 0x7F]).unwrap();
        assert_eq!(n.key.to_string(), "p3.0");
        assert_eq!(n.value, 127);

        let centre = normalize_midi_bytes(&[0xE3, 0x00, 0x40]).unwrap();
        assert_eq!(centre.value, 64);
    }

    #[test]
    fn test_other_messages_ignored() {
        assert_eq!(normalize_midi_bytes(&[0xC0, 0x05]), None);
        assert_eq!(normalize_midi_bytes(&[0xF8]), None);
    }
}
