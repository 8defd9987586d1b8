//! djctl - control-binding engine for a DJ / broadcast mixer
//!
//! Maps keyboard and MIDI inputs onto named mixer actions through a
//! user-editable list of bindings.

pub mod binding;
pub mod cli;
pub mod config;
pub mod controls;
pub mod device;
pub mod input;
pub mod midi;
pub mod paths;
pub mod prefs;
pub mod registry;
pub mod relay;
pub mod remote;
pub mod sniffer;

pub use binding::{Binding, BindingError, InputKey, Mode, Source};
pub use controls::{Controls, Dispatch, SharedControls};
pub use registry::{ActionFn, ActionRegistry, ActionSpec};
