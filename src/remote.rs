//! Remote control commands
//!
//! Named operations another process (or the REPL) can trigger without a
//! physical input. Each one maps onto exactly one action invocation with
//! synthesized `(target, value, is_delta)` arguments, so remote control and
//! bindings drive the mixer through the same handlers.
//!
//! Text form is the command name followed by whitespace-separated
//! arguments: `player_stop 0`, `player_set_volume 1 -5 true`.

use std::str::FromStr;

use anyhow::Result;
use thiserror::Error;
use tracing::debug;

use crate::controls::Invocation;
use crate::registry::ActionRegistry;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("unknown remote command: {0}")]
    UnknownCommand(String),

    #[error("{command}: missing argument <{name}>")]
    MissingArgument { command: String, name: &'static str },

    #[error("{command}: invalid {name} {value:?}")]
    InvalidArgument {
        command: String,
        name: &'static str,
        value: String,
    },

    #[error("{0}: too many arguments")]
    TooManyArguments(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    SetEnableTooltips(bool),
    SetListenDjMix,
    SetListenStreamMix,
    PanningPresetsLoad(u32),

    PlayerPlayPause { index: u32, play: bool, toggle: bool },
    PlayerStop(u32),
    PlayerAdvance(u32),
    PlayerPrevious(u32),
    PlayerNext(u32),
    PlayerSelectPrevious(u32),
    PlayerSelectNext(u32),
    PlayerPlaySelected(u32),
    PlayerSetStreamMix { index: u32, value: bool, toggle: bool },
    PlayerSetDjMix { index: u32, value: bool, toggle: bool },
    PlayerSetVolume { index: u32, value: i32, delta: bool },
    PlayerSetPitch { index: u32, value: i32, delta: bool },

    PlaylistInsertStopControl(u32),
    PlaylistInsertStopControl2(u32),
    PlaylistInsertTransferControl(u32),
    PlaylistInsertCrossfadeControl(u32),
    PlaylistInsertNormalSpeedControl(u32),
    PlaylistInsertJumpToTopControl(u32),

    CrossfadeSet { value: i32, delta: bool },
    PlaylistAdvance,
    CrossfadePass,
    PitchEnable { value: bool, toggle: bool },
    /// Index 0 focuses the left player, anything else the right one
    MainPlayerFocus { index: u32, toggle: bool },

    ChannelOpen { index: u32, value: bool, toggle: bool },
    ChannelGain { index: u32, value: i32, delta: bool },
    ChannelPan { index: u32, value: i32, delta: bool },

    VoipModePublic { value: bool, toggle: bool },
    VoipModePrivate { value: bool, toggle: bool },
    VoipSetGain { value: i32, delta: bool },
    VoipSetMixbackLevel { value: i32, delta: bool },

    EffectTrigger(u32),
    EffectBankStop { first: bool, second: bool },
    EffectBankGain { index: u32, value: i32, delta: bool },
    EffectBankHeadroom { index: u32, value: i32, delta: bool },

    StreamSetConnected { index: u32, value: bool, toggle: bool },
    RecorderSetRecording { index: u32, value: bool, toggle: bool },
}

/// Command names with their argument synopsis, for help output
pub const COMMANDS: &[(&str, &str)] = &[
    ("set_enable_tooltips", "<enabled>"),
    ("set_listen_dj_mix", ""),
    ("set_listen_stream_mix", ""),
    ("panning_presets_load", "<preset>"),
    ("player_playpause", "<player> <play> <toggle>"),
    ("player_stop", "<player>"),
    ("player_advance", "<player>"),
    ("player_previous", "<player>"),
    ("player_next", "<player>"),
    ("player_select_previous", "<player>"),
    ("player_select_next", "<player>"),
    ("player_play_selected", "<player>"),
    ("player_set_streammix", "<player> <on> <toggle>"),
    ("player_set_djmix", "<player> <on> <toggle>"),
    ("player_set_volume", "<player> <value> <delta>"),
    ("player_set_pitch", "<player> <value> <delta>"),
    ("playlist_insert_stop_control", "<player>"),
    ("playlist_insert_stop_control_2", "<player>"),
    ("playlist_insert_transfer_control", "<player>"),
    ("playlist_insert_crossfade_control", "<player>"),
    ("playlist_insert_normal_speed_control", "<player>"),
    ("playlist_insert_jump_to_top_control", "<player>"),
    ("crossfade_set", "<value> <delta>"),
    ("playlist_advance", ""),
    ("crossfade_pass", ""),
    ("pitch_enable", "<on> <toggle>"),
    ("main_player_focus", "<player> <toggle>"),
    ("channel_open", "<channel> <on> <toggle>"),
    ("channel_gain", "<channel> <value> <delta>"),
    ("channel_pan", "<channel> <value> <delta>"),
    ("voip_mode_public", "<on> <toggle>"),
    ("voip_mode_private", "<on> <toggle>"),
    ("voip_set_gain", "<value> <delta>"),
    ("voip_set_mixback_level", "<value> <delta>"),
    ("effect_trigger", "<effect>"),
    ("effect_bank_stop", "<first> <second>"),
    ("effect_bank_gain", "<bank> <value> <delta>"),
    ("effect_bank_headroom", "<bank> <value> <delta>"),
    ("stream_set_connected", "<stream> <on> <toggle>"),
    ("recorder_set_recording", "<recorder> <on> <toggle>"),
];

fn level(on: bool) -> i32 {
    if on {
        127
    } else {
        0
    }
}

fn call(method: &'static str, target: u32, value: i32, is_delta: bool) -> Option<(&'static str, Invocation)> {
    Some((
        method,
        Invocation {
            target,
            value,
            is_delta,
        },
    ))
}

impl RemoteCommand {
    /// The action this command invokes and its arguments. `None` when the
    /// command is a no-op (an effect bank stop naming no bank).
    pub fn invocation(&self) -> Option<(&'static str, Invocation)> {
        use RemoteCommand::*;
        match *self {
            SetEnableTooltips(on) => call("c_tips", 0, level(on), false),
            SetListenDjMix => call("c_sdjmix", 0, 127, false),
            SetListenStreamMix => call("c_sdjmix", 0, 0, false),
            PanningPresetsLoad(n) => call("l_panpre", n, 0, false),

            PlayerPlayPause { index, play, toggle } => call("p_pp", index, level(play), toggle),
            PlayerStop(n) => call("p_stop", n, 0, false),
            PlayerAdvance(n) => call("p_advance", n, 0, false),
            PlayerPrevious(n) => call("p_prev", n, 0, false),
            PlayerNext(n) => call("p_next", n, 0, false),
            PlayerSelectPrevious(n) => call("p_sprev", n, 0, false),
            PlayerSelectNext(n) => call("p_snext", n, 0, false),
            PlayerPlaySelected(n) => call("p_sfire", n, 0, false),
            PlayerSetStreamMix { index, value, toggle } => call("p_stream", index, level(value), toggle),
            PlayerSetDjMix { index, value, toggle } => call("p_listen", index, level(value), toggle),
            PlayerSetVolume { index, value, delta } => call("p_vol", index, value, delta),
            PlayerSetPitch { index, value, delta } => call("p_pitch", index, value, delta),

            PlaylistInsertStopControl(n) => call("p_istop", n, 0, false),
            PlaylistInsertStopControl2(n) => call("p_istop2", n, 0, false),
            PlaylistInsertTransferControl(n) => call("p_itrans", n, 0, false),
            PlaylistInsertCrossfadeControl(n) => call("p_ifade", n, 0, false),
            PlaylistInsertNormalSpeedControl(n) => call("p_ipitch", n, 0, false),
            PlaylistInsertJumpToTopControl(n) => call("p_igotop", n, 0, false),

            CrossfadeSet { value, delta } => call("x_fade", 0, value, delta),
            PlaylistAdvance => call("x_advance", 0, 0, false),
            CrossfadePass => call("x_pass", 0, 0, false),
            PitchEnable { value, toggle } => call("x_pitch", 0, level(value), toggle),
            MainPlayerFocus { index, toggle } => call("x_focus", 0, level(index != 0), toggle),

            ChannelOpen { index, value, toggle } => call("m_on", index, level(value), toggle),
            ChannelGain { index, value, delta } => call("m_vol", index, value, delta),
            ChannelPan { index, value, delta } => call("m_pan", index, value, delta),

            VoipModePublic { value, toggle } => call("v_on", 0, level(value), toggle),
            VoipModePrivate { value, toggle } => call("v_prep", 0, level(value), toggle),
            VoipSetGain { value, delta } => call("v_vol", 0, value, delta),
            VoipSetMixbackLevel { value, delta } => call("v_mixback", 0, value, delta),

            EffectTrigger(n) => call("k_fire", n, 0, false),
            EffectBankStop { first, second } => match (first, second) {
                (false, false) => None,
                (true, true) => call("b_stop", 2, 0, false),
                (true, false) => call("b_stop", 0, 0, false),
                (false, true) => call("b_stop", 1, 0, false),
            },
            EffectBankGain { index, value, delta } => call("b_vol1", index, value, delta),
            EffectBankHeadroom { index, value, delta } => call("b_vol2", index, value, delta),

            StreamSetConnected { index, value, toggle } => call("s_on", index, level(value), toggle),
            RecorderSetRecording { index, value, toggle } => call("r_on", index, level(value), toggle),
        }
    }

    /// Run the command against `registry`
    pub fn execute(&self, registry: &ActionRegistry) -> Result<()> {
        match self.invocation() {
            Some((method, call)) => {
                debug!("Remote {:?} -> {}", self, method);
                registry.invoke(method, call.target, call.value, call.is_delta)
            }
            None => Ok(()),
        }
    }
}

/// Argument cursor for one command line
struct Args<'a> {
    command: &'a str,
    words: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn next(&mut self, name: &'static str) -> Result<&'a str, RemoteError> {
        self.words.next().ok_or_else(|| RemoteError::MissingArgument {
            command: self.command.to_string(),
            name,
        })
    }

    fn invalid(&self, name: &'static str, value: &str) -> RemoteError {
        RemoteError::InvalidArgument {
            command: self.command.to_string(),
            name,
            value: value.to_string(),
        }
    }

    fn index(&mut self, name: &'static str) -> Result<u32, RemoteError> {
        let word = self.next(name)?;
        word.parse().map_err(|_| self.invalid(name, word))
    }

    fn value(&mut self) -> Result<i32, RemoteError> {
        let word = self.next("value")?;
        word.parse().map_err(|_| self.invalid("value", word))
    }

    fn flag(&mut self, name: &'static str) -> Result<bool, RemoteError> {
        let word = self.next(name)?;
        match word.to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Ok(true),
            "0" | "false" | "off" | "no" => Ok(false),
            _ => Err(self.invalid(name, word)),
        }
    }

    fn finish(mut self) -> Result<(), RemoteError> {
        match self.words.next() {
            Some(_) => Err(RemoteError::TooManyArguments(self.command.to_string())),
            None => Ok(()),
        }
    }
}

impl FromStr for RemoteCommand {
    type Err = RemoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use RemoteCommand::*;

        let mut words = s.split_whitespace();
        let command = words.next().unwrap_or("");
        let mut a = Args { command, words };

        let parsed = match command {
            "set_enable_tooltips" => SetEnableTooltips(a.flag("enabled")?),
            "set_listen_dj_mix" => SetListenDjMix,
            "set_listen_stream_mix" => SetListenStreamMix,
            "panning_presets_load" => PanningPresetsLoad(a.index("preset")?),

            "player_playpause" => PlayerPlayPause {
                index: a.index("player")?,
                play: a.flag("play")?,
                toggle: a.flag("toggle")?,
            },
            "player_stop" => PlayerStop(a.index("player")?),
            "player_advance" => PlayerAdvance(a.index("player")?),
            "player_previous" => PlayerPrevious(a.index("player")?),
            "player_next" => PlayerNext(a.index("player")?),
            "player_select_previous" => PlayerSelectPrevious(a.index("player")?),
            "player_select_next" => PlayerSelectNext(a.index("player")?),
            "player_play_selected" => PlayerPlaySelected(a.index("player")?),
            "player_set_streammix" => PlayerSetStreamMix {
                index: a.index("player")?,
                value: a.flag("on")?,
                toggle: a.flag("toggle")?,
            },
            "player_set_djmix" => PlayerSetDjMix {
                index: a.index("player")?,
                value: a.flag("on")?,
                toggle: a.flag("toggle")?,
            },
            "player_set_volume" => PlayerSetVolume {
                index: a.index("player")?,
                value: a.value()?,
                delta: a.flag("delta")?,
            },
            "player_set_pitch" => PlayerSetPitch {
                index: a.index("player")?,
                value: a.value()?,
                delta: a.flag("delta")?,
            },

            "playlist_insert_stop_control" => PlaylistInsertStopControl(a.index("player")?),
            "playlist_insert_stop_control_2" => PlaylistInsertStopControl2(a.index("player")?),
            "playlist_insert_transfer_control" => PlaylistInsertTransferControl(a.index("player")?),
            "playlist_insert_crossfade_control" => PlaylistInsertCrossfadeControl(a.index("player")?),
            "playlist_insert_normal_speed_control" => PlaylistInsertNormalSpeedControl(a.index("player")?),
            "playlist_insert_jump_to_top_control" => PlaylistInsertJumpToTopControl(a.index("player")?),

            "crossfade_set" => CrossfadeSet {
                value: a.value()?,
                delta: a.flag("delta")?,
            },
            "playlist_advance" => PlaylistAdvance,
            "crossfade_pass" => CrossfadePass,
            "pitch_enable" => PitchEnable {
                value: a.flag("on")?,
                toggle: a.flag("toggle")?,
            },
            "main_player_focus" => MainPlayerFocus {
                index: a.index("player")?,
                toggle: a.flag("toggle")?,
            },

            "channel_open" => ChannelOpen {
                index: a.index("channel")?,
                value: a.flag("on")?,
                toggle: a.flag("toggle")?,
            },
            "channel_gain" => ChannelGain {
                index: a.index("channel")?,
                value: a.value()?,
                delta: a.flag("delta")?,
            },
            "channel_pan" => ChannelPan {
                index: a.index("channel")?,
                value: a.value()?,
                delta: a.flag("delta")?,
            },

            "voip_mode_public" => VoipModePublic {
                value: a.flag("on")?,
                toggle: a.flag("toggle")?,
            },
            "voip_mode_private" => VoipModePrivate {
                value: a.flag("on")?,
                toggle: a.flag("toggle")?,
            },
            "voip_set_gain" => VoipSetGain {
                value: a.value()?,
                delta: a.flag("delta")?,
            },
            "voip_set_mixback_level" => VoipSetMixbackLevel {
                value: a.value()?,
                delta: a.flag("delta")?,
            },

            "effect_trigger" => EffectTrigger(a.index("effect")?),
            "effect_bank_stop" => EffectBankStop {
                first: a.flag("first")?,
                second: a.flag("second")?,
            },
            "effect_bank_gain" => EffectBankGain {
                index: a.index("bank")?,
                value: a.value()?,
                delta: a.flag("delta")?,
            },
            "effect_bank_headroom" => EffectBankHeadroom {
                index: a.index("bank")?,
                value: a.value()?,
                delta: a.flag("delta")?,
            },

            "stream_set_connected" => StreamSetConnected {
                index: a.index("stream")?,
                value: a.flag("on")?,
                toggle: a.flag("toggle")?,
            },
            "recorder_set_recording" => RecorderSetRecording {
                index: a.index("recorder")?,
                value: a.flag("on")?,
                toggle: a.flag("toggle")?,
            },

            other => return Err(RemoteError::UnknownCommand(other.to_string())),
        };

        a.finish()?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::catalog::STANDARD_ACTIONS;
    use crate::registry::noop;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_parse_commands() {
        assert_eq!("player_stop 2".parse::<RemoteCommand>(), Ok(RemoteCommand::PlayerStop(2)));
        assert_eq!(
            "player_set_volume 1 -5 true".parse::<RemoteCommand>(),
            Ok(RemoteCommand::PlayerSetVolume {
                index: 1,
                value: -5,
                delta: true
            })
        );
        assert_eq!("  crossfade_pass  ".parse::<RemoteCommand>(), Ok(RemoteCommand::CrossfadePass));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "player_jump 1".parse::<RemoteCommand>(),
            Err(RemoteError::UnknownCommand("player_jump".to_string()))
        );
        assert!(matches!(
            "player_stop".parse::<RemoteCommand>(),
            Err(RemoteError::MissingArgument { name: "player", .. })
        ));
        assert!(matches!(
            "channel_open 0 maybe false".parse::<RemoteCommand>(),
            Err(RemoteError::InvalidArgument { name: "on", .. })
        ));
        assert_eq!(
            "playlist_advance now".parse::<RemoteCommand>(),
            Err(RemoteError::TooManyArguments("playlist_advance".to_string()))
        );
    }

    #[test]
    fn test_every_listed_command_parses_and_maps_to_catalog() {
        for (name, synopsis) in COMMANDS {
            // Synthesize arguments from the synopsis
            let args: Vec<&str> = synopsis
                .split_whitespace()
                .map(|arg| match arg {
                    "<value>" => "-3",
                    "<player>" | "<channel>" | "<preset>" | "<effect>" | "<bank>" | "<stream>"
                    | "<recorder>" => "1",
                    _ => "true",
                })
                .collect();
            let line = format!("{} {}", name, args.join(" "));
            let command: RemoteCommand = line.parse().unwrap_or_else(|e| panic!("{}: {}", line, e));

            let (method, _) = command.invocation().unwrap();
            assert!(
                STANDARD_ACTIONS.iter().any(|entry| entry.name == method),
                "{} maps to unknown action {}",
                name,
                method
            );
        }
    }

    #[test]
    fn test_synthesized_arguments() {
        let (method, call) = RemoteCommand::PlayerPlayPause {
            index: 1,
            play: true,
            toggle: false,
        }
        .invocation()
        .unwrap();
        assert_eq!(method, "p_pp");
        assert_eq!(
            call,
            Invocation {
                target: 1,
                value: 127,
                is_delta: false
            }
        );

        let (_, focus) = RemoteCommand::MainPlayerFocus { index: 0, toggle: false }
            .invocation()
            .unwrap();
        assert_eq!(focus.value, 0);

        assert_eq!(
            RemoteCommand::EffectBankStop { first: false, second: true }
                .invocation()
                .map(|(m, c)| (m, c.target)),
            Some(("b_stop", 1))
        );
        assert_eq!(
            RemoteCommand::EffectBankStop { first: false, second: false }.invocation(),
            None
        );
    }

    #[test]
    fn test_execute_invokes_registry() {
        let seen: Arc<Mutex<Vec<(String, u32, i32, bool)>>> = Arc::default();
        let registry = ActionRegistry::standard(|spec| {
            if spec.name != "m_vol" {
                return noop();
            }
            let seen = seen.clone();
            let name = spec.name.clone();
            Arc::new(move |t, v, d| {
                seen.lock().push((name.clone(), t, v, d));
                Ok(())
            })
        });

        let command: RemoteCommand = "channel_gain 3 10 on".parse().unwrap();
        command.execute(&registry).unwrap();

        assert_eq!(*seen.lock(), vec![("m_vol".to_string(), 3, 10, true)]);
    }
}
