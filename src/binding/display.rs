//! Human-readable rendering of bindings for listings and editors

use super::{Binding, Mode, Source};
use crate::registry::{catalog, ActionRegistry};

/// Note names, sharps written with the music sharp sign
const NOTES: [&str; 12] = [
    "C", "C\u{266F}", "D", "D\u{266F}", "E", "F", "F\u{266F}", "G", "G\u{266F}", "A", "A\u{266F}",
    "B",
];

/// Modifier masks (shift, control, alt, altgr) and their short symbols
const MODIFIERS: [(u32, char); 4] = [
    (1 << 0, '\u{21D1}'),
    (1 << 2, '^'),
    (1 << 3, '\u{2020}'),
    (1 << 7, '\u{2021}'),
];

/// Named key codes. Printable ASCII is rendered as itself.
const KEY_NAMES: &[(u32, &str)] = &[
    (0x20, "space"),
    (0xff08, "BackSpace"),
    (0xff09, "Tab"),
    (0xff0d, "Return"),
    (0xff1b, "Escape"),
    (0xff50, "Home"),
    (0xff51, "Left"),
    (0xff52, "Up"),
    (0xff53, "Right"),
    (0xff54, "Down"),
    (0xff55, "Page_Up"),
    (0xff56, "Page_Down"),
    (0xff57, "End"),
    (0xff63, "Insert"),
    (0xffff, "Delete"),
    (0xffbe, "F1"),
    (0xffbf, "F2"),
    (0xffc0, "F3"),
    (0xffc1, "F4"),
    (0xffc2, "F5"),
    (0xffc3, "F6"),
    (0xffc4, "F7"),
    (0xffc5, "F8"),
    (0xffc6, "F9"),
    (0xffc7, "F10"),
    (0xffc8, "F11"),
    (0xffc9, "F12"),
];

/// `60` -> `C4`
pub fn note_to_str(note: u32) -> String {
    format!("{}{}", NOTES[(note % 12) as usize], (note / 12) as i64 - 1)
}

/// `C4` / `c#4` / `C♯-1` -> MIDI note number
pub fn str_to_note(s: &str) -> Option<u32> {
    let s: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '#' { '\u{266F}' } else { c })
        .collect::<String>()
        .to_uppercase();

    let split = s
        .char_indices()
        .find(|(_, c)| *c == '-' || c.is_ascii_digit())
        .map(|(i, _)| i)?;
    let (name, octave) = s.split_at(split);

    let index = NOTES.iter().position(|n| *n == name)? as i64;
    let octave: i64 = match octave {
        "-1" => -1,
        o if o.len() == 1 => o.parse().ok()?,
        _ => return None,
    };

    let note = index + octave * 12 + 12;
    (0..128).contains(&note).then_some(note as u32)
}

pub fn modifier_to_str(state: u32) -> String {
    MODIFIERS
        .iter()
        .filter(|(mask, _)| state & mask != 0)
        .map(|(_, c)| *c)
        .collect()
}

pub fn str_to_modifier(s: &str) -> u32 {
    MODIFIERS
        .iter()
        .filter(|(_, c)| s.contains(*c))
        .map(|(mask, _)| mask)
        .sum()
}

/// Pack the known modifier bits into a dense 0..16 ordinal
pub fn modifier_to_ord(state: u32) -> u32 {
    MODIFIERS
        .iter()
        .enumerate()
        .filter(|(_, (mask, _))| state & mask != 0)
        .map(|(i, _)| 1u32 << i)
        .sum()
}

pub fn ord_to_modifier(ord: u32) -> u32 {
    MODIFIERS
        .iter()
        .enumerate()
        .filter(|(i, _)| ord & (1u32 << i) != 0)
        .map(|(_, (mask, _))| mask)
        .sum()
}

pub fn key_to_str(key: u32) -> String {
    if let Some((_, name)) = KEY_NAMES.iter().find(|(code, _)| *code == key) {
        return name.to_string();
    }
    match char::from_u32(key) {
        Some(c) if (0x21..0x7f).contains(&key) => c.to_string(),
        _ => format!("<{:04X}>", key),
    }
}

pub fn str_to_key(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.len() == 6 && s.starts_with('<') && s.ends_with('>') {
        return u32::from_str_radix(&s[1..5], 16).ok();
    }
    if let Some((code, _)) = KEY_NAMES.iter().find(|(_, n)| n.eq_ignore_ascii_case(s)) {
        return Some(*code);
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_graphic() => Some(c as u32),
        _ => None,
    }
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Binding {
    /// User-facing channel: modifier symbols for keys, channel number otherwise
    pub fn channel_str(&self) -> String {
        match self.source {
            Source::Keyboard => modifier_to_str(self.channel),
            _ => self.channel.to_string(),
        }
    }

    /// User-facing control: key name, note name or controller number
    pub fn control_str(&self) -> String {
        match self.source {
            Source::Keyboard => key_to_str(self.control),
            Source::Note => note_to_str(self.control),
            Source::Control => self.control.to_string(),
            Source::PitchWheel => String::new(),
        }
    }

    pub fn input_str(&self) -> String {
        match self.source {
            Source::Keyboard => format!("{}{}", self.channel_str(), title_case(&self.control_str())),
            Source::PitchWheel => self.channel_str(),
            _ => format!("{}: {}", self.channel_str(), self.control_str()),
        }
    }

    /// Description of the bound method, or its raw name if undescribed
    pub fn action_str(&self, registry: &ActionRegistry) -> String {
        registry
            .spec(&self.method)
            .map(|spec| spec.description.clone())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.method.clone())
    }

    /// Suffix describing the interaction: inversion, set-point, delta or
    /// act-on-release.
    pub fn modifier_str(&self, registry: &ActionRegistry) -> String {
        match self.mode {
            Mode::Direct if self.value < 0 => " (-)".to_string(),
            Mode::Direct => {
                let default_mode = registry.spec(&self.method).map(|s| s.default_mode());
                if default_mode.is_some_and(|m| m != Mode::Direct) {
                    " (+)".to_string()
                } else {
                    String::new()
                }
            }
            Mode::Set => format!(" ({})", self.value),
            Mode::Alter if self.value >= 0 => format!(" (+{})", self.value),
            Mode::Alter => format!(" ({})", self.value),
            Mode::Pulse if self.value < 0x40 => " (1-)".to_string(),
            Mode::Pulse => String::new(),
        }
    }

    /// Name of the player/channel/effect the binding is aimed at
    pub fn target_str(&self) -> String {
        let group = self.method.chars().next().unwrap_or_default();
        let target = self.target as usize;
        match group {
            'p' => catalog::PLAYER_TARGETS
                .get(target)
                .map(|s| s.to_string())
                .unwrap_or_default(),
            'b' => catalog::EFFECTS_BANK_TARGETS
                .get(target)
                .map(|s| s.to_string())
                .unwrap_or_default(),
            g => catalog::target_group_name(g)
                .map(|name| format!("{} {}", name, self.target + 1))
                .unwrap_or_default(),
        }
    }
}
