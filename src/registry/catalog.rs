//! Standard action catalog
//!
//! The order of [`STANDARD_ACTIONS`] is the order methods are listed to
//! users and the order groups are discovered in; keep new entries next to
//! their group.

use crate::binding::Mode::{self, Alter, Direct, Pulse, Set};

/// Static description of one standard action
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub modes: &'static [Mode],
    pub description: &'static str,
}

const fn entry(
    name: &'static str,
    modes: &'static [Mode],
    description: &'static str,
) -> CatalogEntry {
    CatalogEntry {
        name,
        modes,
        description,
    }
}

const TOGGLE: &[Mode] = &[Pulse, Direct, Set];
const LEVEL: &[Mode] = &[Direct, Set, Alter];
const ONE_SHOT: &[Mode] = &[Pulse];

pub const STANDARD_ACTIONS: &[CatalogEntry] = &[
    // Miscellaneous
    entry("c_tips", &[Pulse, Set], "Tooltips enable"),
    entry("c_sdjmix", &[Pulse, Direct], "DJ-mix monitor"),
    // Panning presets
    entry("l_panpre", ONE_SHOT, "Panning load from presets"),
    // Player
    entry("p_pp", &[Pulse, Direct], "Player play/pause"),
    entry("p_stop", ONE_SHOT, "Player stop"),
    entry("p_advance", ONE_SHOT, "Player advance"),
    entry("p_prev", ONE_SHOT, "Player play previous"),
    entry("p_next", ONE_SHOT, "Player play next"),
    entry("p_sprev", ONE_SHOT, "Player select previous"),
    entry("p_snext", ONE_SHOT, "Player select next"),
    entry("p_sfire", ONE_SHOT, "Player play selected from start"),
    entry("p_stream", TOGGLE, "Player stream output enable"),
    entry("p_listen", TOGGLE, "Player DJ output enable"),
    entry("p_prep", TOGGLE, "Player DJ-only switch"),
    entry("p_vol", LEVEL, "Player set volume"),
    entry("p_pitch", LEVEL, "Player set pitchbend"),
    // Playlist
    entry("p_tag", ONE_SHOT, "Playlist edit tags"),
    entry("p_istop", ONE_SHOT, "Playlist insert stop"),
    entry("p_istop2", ONE_SHOT, "Playlist insert stop 2"),
    entry("p_ianno", ONE_SHOT, "Playlist insert announce"),
    entry("p_itrans", ONE_SHOT, "Playlist insert transfer"),
    entry("p_ifade", ONE_SHOT, "Playlist insert crossfade"),
    entry("p_ipitch", ONE_SHOT, "Playlist insert pitchunbend"),
    entry("p_igotop", ONE_SHOT, "Playlist insert jump to top"),
    // Both players
    entry("x_fade", LEVEL, "Players set crossfade"),
    entry("x_advance", ONE_SHOT, "Players advance"),
    entry("x_pass", ONE_SHOT, "Players pass crossfade"),
    entry("x_pitch", TOGGLE, "Players show pitchbend"),
    entry("x_focus", TOGGLE, "Players set focus"),
    // Channel
    entry("m_on", TOGGLE, "Channel output enable"),
    entry("m_vol", LEVEL, "Channel set volume"),
    entry("m_pan", LEVEL, "Channel set balance"),
    // VoIP
    entry("v_on", TOGGLE, "VoIP output enable"),
    entry("v_prep", TOGGLE, "VoIP DJ-only switch"),
    entry("v_vol", LEVEL, "VoIP set volume"),
    entry("v_mixback", LEVEL, "VoIP set mixback"),
    // Effects
    entry("k_fire", ONE_SHOT, "Effect play from start"),
    entry("b_stop", ONE_SHOT, "Effects stop many"),
    entry("b_vol1", LEVEL, "Effects set volume"),
    entry("b_vol2", LEVEL, "Effects set headroom"),
    // Streams and recorders
    entry("s_on", TOGGLE, "Stream set connected"),
    entry("r_on", TOGGLE, "Recorder set recording"),
];

/// Targets of `p_` methods. 3 follows keyboard focus, 4 follows the crossfader.
pub const PLAYER_TARGETS: &[&str] = &[
    "Left player",
    "Right player",
    "Background player",
    "Focused player",
    "Fadered player",
];

/// Targets of `b_` methods
pub const EFFECTS_BANK_TARGETS: &[&str] = &["Effects bank 1", "Effects bank 2", "All effects"];

/// Name of the numbered resource a method group is aimed at
pub fn target_group_name(group: char) -> Option<&'static str> {
    match group {
        'p' => Some("Player"),
        'm' => Some("Channel"),
        'k' => Some("Effect"),
        's' => Some("Stream"),
        'r' => Some("Recorder"),
        'l' => Some("Setting"),
        _ => None,
    }
}

/// Bindings installed when no controls file exists: F-keys fire effects,
/// Esc stops them, and the playlist editing shortcuts.
pub const DEFAULT_BINDINGS: &[&str] = &[
    "k100.ffbe:pk_fire.0.127",
    "k100.ffbf:pk_fire.1.127",
    "k100.ffc0:pk_fire.2.127",
    "k100.ffc1:pk_fire.3.127",
    "k100.ffc2:pk_fire.4.127",
    "k100.ffc3:pk_fire.5.127",
    "k100.ffc4:pk_fire.6.127",
    "k100.ffc5:pk_fire.7.127",
    "k100.ffc6:pk_fire.8.127",
    "k100.ffc7:pk_fire.9.127",
    "k100.ffc8:pk_fire.a.127",
    "k100.ffc9:pk_fire.b.127",
    "k100.ff1b:pb_stop.2.127",
    "k100.31:sx_fade.b.0",
    "k100.32:sx_fade.b.127",
    "k100.63:px_pass.0.127",
    "k100.6d:pm_on.0.127",
    "k100.76:pv_on.0.127",
    "k100.70:pv_prep.0.127",
    "k100.ff08:pp_stop.3.127",
    "k100.2f:pp_advance.4.127",
    "k100.74:pp_tag.3.127",
    "k100.73:pp_istop.3.127",
    "k100.75:pp_ianno.3.127",
    "k100.61:pp_itrans.3.127",
    "k100.66:pp_ifade.3.127",
    "k100.6e:pp_ipitch.3.127",
    "k104.72:pr_on.0.127",
    "k104.73:ps_on.0.127",
    "k100.69:pc_tips.0.127",
];
