//! Binding value type
//!
//! A binding maps one physical input (a MIDI control, note, pitch wheel or
//! key chord) to one parameterized action. The persisted form is
//! `<input>:<action>`, e.g. `c0.f:pp_stop.0.127`:
//!
//! - input: `<source><channel-hex>.<control-hex>` with source one of `c n p k`
//! - action: `<mode><method>.<target-hex>.<value-decimal>` with mode one of `d p s a`
//!
//! For keyboard inputs the channel holds the modifier state bits and the
//! control holds the key code.

pub mod display;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::ActionRegistry;

/// Errors produced while parsing binding strings
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("unknown binding source {0:?}")]
    UnknownSource(String),

    #[error("unknown mode {0:?}")]
    UnknownMode(String),

    #[error("malformed action {0:?} (expected method.target.value)")]
    MalformedAction(String),

    #[error("unknown method {0:?}")]
    UnknownMethod(String),

    #[error("invalid hex number {0:?}")]
    InvalidHex(String),

    #[error("invalid value {0:?}")]
    InvalidValue(String),

    #[error("missing ':' between input and action in {0:?}")]
    MissingSeparator(String),
}

/// Physical input class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Control,
    Note,
    PitchWheel,
    Keyboard,
}

impl Source {
    /// All sources, in the order they are listed to users
    pub const ALL: [Source; 4] = [
        Source::Control,
        Source::Note,
        Source::PitchWheel,
        Source::Keyboard,
    ];

    pub fn as_char(self) -> char {
        match self {
            Source::Control => 'c',
            Source::Note => 'n',
            Source::PitchWheel => 'p',
            Source::Keyboard => 'k',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'c' => Some(Source::Control),
            'n' => Some(Source::Note),
            'p' => Some(Source::PitchWheel),
            'k' => Some(Source::Keyboard),
            _ => None,
        }
    }

    pub fn is_midi(self) -> bool {
        !matches!(self, Source::Keyboard)
    }
}

/// How an incoming intensity becomes an action invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Mirror every level change (faders, held buttons)
    Direct,
    /// Fire once on press, or on release for low values
    Pulse,
    /// On press, set the bound absolute value
    Set,
    /// On press, add the bound signed delta
    Alter,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Direct, Mode::Pulse, Mode::Set, Mode::Alter];

    pub fn as_char(self) -> char {
        match self {
            Mode::Direct => 'd',
            Mode::Pulse => 'p',
            Mode::Set => 's',
            Mode::Alter => 'a',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'd' => Some(Mode::Direct),
            'p' => Some(Mode::Pulse),
            's' => Some(Mode::Set),
            'a' => Some(Mode::Alter),
            _ => None,
        }
    }
}

/// Source, channel and control of a physical input.
///
/// Its `Display` form is the canonical lookup key used by the binding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputKey {
    pub source: Source,
    pub channel: u32,
    pub control: u32,
}

impl InputKey {
    pub fn new(source: Source, channel: u32, control: u32) -> Self {
        Self {
            source,
            channel,
            control,
        }
    }
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:x}.{:x}",
            self.source.as_char(),
            self.channel,
            self.control
        )
    }
}

impl FromStr for InputKey {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let source = chars
            .next()
            .and_then(Source::from_char)
            .ok_or_else(|| BindingError::UnknownSource(s.chars().take(1).collect()))?;
        let rest = chars.as_str();

        let (channel, control) = match rest.split_once('.') {
            Some((channel, control)) => (parse_hex(channel)?, parse_hex(control)?),
            // The backend reports pitch wheels without a control part
            None if source == Source::PitchWheel => (parse_hex(rest)?, 0),
            None => return Err(BindingError::InvalidHex(String::new())),
        };

        Ok(Self::new(source, channel, control))
    }
}

fn parse_hex(s: &str) -> Result<u32, BindingError> {
    u32::from_str_radix(s, 16).map_err(|_| BindingError::InvalidHex(s.to_string()))
}

/// One input bound to one action
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    pub source: Source,
    pub channel: u32,
    pub control: u32,
    pub mode: Mode,
    pub method: String,
    pub target: u32,
    pub value: i32,
}

impl Default for Binding {
    /// The binding offered when creating one from scratch: plain `1` key
    /// toggling play/pause on the left player.
    fn default() -> Self {
        Self {
            source: Source::Keyboard,
            channel: 0,
            control: 0x31,
            mode: Mode::Pulse,
            method: "p_pp".to_string(),
            target: 0,
            value: 127,
        }
    }
}

impl Binding {
    /// Parse a binding from its persisted `<input>:<action>` form.
    ///
    /// The method must be registered in `registry`; whether the mode is one
    /// the method advertises is not checked here.
    pub fn parse(s: &str, registry: &ActionRegistry) -> Result<Self, BindingError> {
        let (input_part, action_part) = s
            .split_once(':')
            .ok_or_else(|| BindingError::MissingSeparator(s.to_string()))?;

        let input: InputKey = input_part.parse()?;

        let mut chars = action_part.chars();
        let mode = chars
            .next()
            .and_then(Mode::from_char)
            .ok_or_else(|| BindingError::UnknownMode(action_part.chars().take(1).collect()))?;

        let parts: Vec<&str> = chars.as_str().split('.').collect();
        let [method, target, value] = parts.as_slice() else {
            return Err(BindingError::MalformedAction(action_part.to_string()));
        };

        if !registry.contains(method) {
            return Err(BindingError::UnknownMethod(method.to_string()));
        }

        let target = parse_hex(target)?;
        let value = value
            .parse::<i32>()
            .map_err(|_| BindingError::InvalidValue(value.to_string()))?;

        Ok(Self {
            source: input.source,
            channel: input.channel,
            control: input.control,
            mode,
            method: method.to_string(),
            target,
            value,
        })
    }

    pub fn input_key(&self) -> InputKey {
        InputKey::new(self.source, self.channel, self.control)
    }

    /// Canonical action key, `<mode><method>.<target-hex>.<value>`
    pub fn action_key(&self) -> String {
        format!(
            "{}{}.{:x}.{}",
            self.mode.as_char(),
            self.method,
            self.target,
            self.value
        )
    }

    /// Copy of this binding listening to a different input
    pub fn with_input(mut self, input: InputKey) -> Self {
        self.source = input.source;
        self.channel = input.channel;
        self.control = input.control;
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    pub fn with_channel(mut self, channel: u32) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_control(mut self, control: u32) -> Self {
        self.control = control;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_target(mut self, target: u32) -> Self {
        self.target = target;
        self
    }

    pub fn with_value(mut self, value: i32) -> Self {
        self.value = value;
        self
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.input_key(), self.action_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ActionRegistry;
    use proptest::prelude::*;

    fn registry() -> ActionRegistry {
        ActionRegistry::standard(|_| crate::registry::noop())
    }

    #[test]
    fn test_parse_keyboard_binding() {
        let b = Binding::parse("k100.ffbe:pk_fire.0.127", &registry()).unwrap();
        assert_eq!(b.source, Source::Keyboard);
        assert_eq!(b.channel, 0x100);
        assert_eq!(b.control, 0xffbe);
        assert_eq!(b.mode, Mode::Pulse);
        assert_eq!(b.method, "k_fire");
        assert_eq!(b.target, 0);
        assert_eq!(b.value, 127);
        assert_eq!(b.input_key().to_string(), "k100.ffbe");
        assert_eq!(b.action_key(), "pk_fire.0.127");
    }

    #[test]
    fn test_parse_negative_value_and_hex_target() {
        let b = Binding::parse("c1.7:dp_vol.a.-127", &registry()).unwrap();
        assert_eq!(b.mode, Mode::Direct);
        assert_eq!(b.target, 10);
        assert_eq!(b.value, -127);
        assert_eq!(b.to_string(), "c1.7:dp_vol.a.-127");
    }

    #[test]
    fn test_parse_normalizes_hex_case() {
        let b = Binding::parse("C0.0F:Pp_stop.0.7F", &registry());
        // Upper-case source characters are not accepted
        assert!(matches!(b, Err(BindingError::UnknownSource(_))));

        let b = Binding::parse("c0.0F:pp_stop.0.127", &registry()).unwrap();
        assert_eq!(b.to_string(), "c0.f:pp_stop.0.127");
    }

    #[test]
    fn test_rejects_unknown_source() {
        let err = Binding::parse("x0.1:pp_pp.0.127", &registry()).unwrap_err();
        assert_eq!(err, BindingError::UnknownSource("x".into()));
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let err = Binding::parse("c0.1:qp_pp.0.127", &registry()).unwrap_err();
        assert_eq!(err, BindingError::UnknownMode("q".into()));
    }

    #[test]
    fn test_rejects_malformed_action() {
        let reg = registry();
        assert!(matches!(
            Binding::parse("c0.1:pp_pp.0", &reg),
            Err(BindingError::MalformedAction(_))
        ));
        assert!(matches!(
            Binding::parse("c0.1:pp_pp.0.1.2", &reg),
            Err(BindingError::MalformedAction(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_method() {
        let err = Binding::parse("c0.1:pnope.0.127", &registry()).unwrap_err();
        assert_eq!(err, BindingError::UnknownMethod("nope".into()));
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let reg = registry();
        assert!(matches!(
            Binding::parse("cz.1:pp_pp.0.127", &reg),
            Err(BindingError::InvalidHex(_))
        ));
        assert!(matches!(
            Binding::parse("c0.g:pp_pp.0.127", &reg),
            Err(BindingError::InvalidHex(_))
        ));
        assert!(matches!(
            Binding::parse("c0.1:pp_pp.x.127", &reg),
            Err(BindingError::InvalidHex(_))
        ));
        assert!(matches!(
            Binding::parse("c0.1:pp_pp.0.7f", &reg),
            Err(BindingError::InvalidValue(_))
        ));
        assert!(matches!(
            Binding::parse("c0.1", &reg),
            Err(BindingError::MissingSeparator(_))
        ));
    }

    #[test]
    fn test_default_binding() {
        let b = Binding::default();
        assert_eq!(b.to_string(), "k0.31:pp_pp.0.127");
        let learned = b.with_input(InputKey::new(Source::Note, 2, 0x3c));
        assert_eq!(learned.to_string(), "n2.3c:pp_pp.0.127");

        let edited = Binding::default()
            .with_source(Source::Control)
            .with_channel(1)
            .with_control(0x07)
            .with_mode(Mode::Direct)
            .with_method("p_vol")
            .with_target(1)
            .with_value(-127);
        assert_eq!(edited.to_string(), "c1.7:dp_vol.1.-127");
    }

    #[test]
    fn test_pitch_wheel_key_without_control() {
        let key: InputKey = "p3".parse().unwrap();
        assert_eq!(key, InputKey::new(Source::PitchWheel, 3, 0));
        assert_eq!(key.to_string(), "p3.0");
        assert!("c3".parse::<InputKey>().is_err());
    }

    fn arb_binding() -> impl Strategy<Value = Binding> {
        let methods: Vec<String> = registry().methods().map(str::to_string).collect();
        (
            prop::sample::select(Source::ALL.to_vec()),
            any::<u32>(),
            any::<u32>(),
            prop::sample::select(Mode::ALL.to_vec()),
            prop::sample::select(methods),
            any::<u32>(),
            any::<i32>(),
        )
            .prop_map(|(source, channel, control, mode, method, target, value)| Binding {
                source,
                channel,
                control,
                mode,
                method,
                target,
                value,
            })
    }

    proptest! {
        #[test]
        fn prop_format_parse_round_trip(b in arb_binding()) {
            let reg = registry();
            let parsed = Binding::parse(&b.to_string(), &reg).unwrap();
            prop_assert_eq!(parsed, b);
        }
    }
}
