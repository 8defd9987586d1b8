//! Command-line interface and REPL
//!
//! Lets a user poke the engine by hand: feed synthetic inputs, run remote
//! commands, edit and save the binding list, and learn input keys.

use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::binding::{Binding, InputKey};
use crate::controls::{Dispatch, SharedControls};
use crate::input::{normalize, normalize_midi_bytes, NormalizedInput, RawInput};
use crate::prefs;
use crate::registry::ActionRegistry;
use crate::remote::{RemoteCommand, COMMANDS};

/// How long `learn` waits for an input
const LEARN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Synthetic keyboard event: modifier state, key code, press or release
    Key { state: u32, keyval: u32, pressed: bool },
    /// Raw MIDI bytes
    Midi(Vec<u8>),
    /// Already-normalized input
    Input(NormalizedInput),
    Call(RemoteCommand),
    List,
    Add(String),
    Remove(usize),
    Save,
    Learn,
    Help,
    Exit,
}

fn parse_hex_u32(word: &str, what: &str) -> Result<u32> {
    u32::from_str_radix(word, 16).with_context(|| format!("invalid {} {:?} (hex expected)", what, word))
}

impl ReplCommand {
    /// Parse one REPL line; `None` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word {
            "" => return Ok(None),
            "key" => {
                let (state, keyval, pressed) = match args.as_slice() {
                    [state, keyval] => (state, keyval, true),
                    [state, keyval, "down"] => (state, keyval, true),
                    [state, keyval, "up"] => (state, keyval, false),
                    _ => bail!("usage: key <state-hex> <keyval-hex> [down|up]"),
                };
                ReplCommand::Key {
                    state: parse_hex_u32(state, "modifier state")?,
                    keyval: parse_hex_u32(keyval, "key code")?,
                    pressed,
                }
            }
            "midi" => {
                if args.is_empty() {
                    bail!("usage: midi <hex-byte>...");
                }
                let bytes = args
                    .iter()
                    .map(|b| u8::from_str_radix(b, 16).with_context(|| format!("invalid MIDI byte {:?}", b)))
                    .collect::<Result<Vec<u8>>>()?;
                ReplCommand::Midi(bytes)
            }
            "input" => match args.as_slice() {
                [key, value] => {
                    let key: InputKey = key.parse().with_context(|| format!("invalid input key {:?}", key))?;
                    let value = u8::from_str_radix(value, 16)
                        .with_context(|| format!("invalid value {:?} (hex expected)", value))?;
                    ReplCommand::Input(NormalizedInput::new(key, value))
                }
                _ => bail!("usage: input <input-key> <value-hex>"),
            },
            "call" => ReplCommand::Call(rest.parse()?),
            "list" | "ls" => ReplCommand::List,
            "add" => {
                if rest.is_empty() {
                    bail!("usage: add <binding>");
                }
                ReplCommand::Add(rest.to_string())
            }
            "rm" => match args.as_slice() {
                [index] => ReplCommand::Remove(
                    index
                        .parse()
                        .with_context(|| format!("invalid index {:?}", index))?,
                ),
                _ => bail!("usage: rm <index>"),
            },
            "save" => ReplCommand::Save,
            "learn" => ReplCommand::Learn,
            "help" | "?" => ReplCommand::Help,
            "exit" | "quit" => ReplCommand::Exit,
            other => bail!("unknown command {:?} (try 'help')", other),
        };
        Ok(Some(command))
    }
}

/// One row of the `list` output
pub fn format_binding_row(index: usize, binding: &Binding, registry: &ActionRegistry, highlighted: bool) -> String {
    let marker = if highlighted { "*" } else { " " };
    format!(
        "{:>3}{} {:<24} {:<10} {:<28} {:<22} {}",
        index,
        marker,
        binding.to_string(),
        binding.input_str(),
        binding.action_str(registry),
        binding.target_str(),
        binding.modifier_str(registry)
    )
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  key <state> <keyval> [down|up]   synthetic key event (hex)");
    println!("  midi <byte>...                   raw MIDI message (hex)");
    println!("  input <key> <value>              normalized input, e.g. input c0.7 7f");
    println!("  call <command> [args]            remote command");
    println!("  list                             show bindings");
    println!("  add <binding>                    append a binding");
    println!("  rm <index>                       remove a binding");
    println!("  save                             write the controls file");
    println!("  learn                            capture the next input key");
    println!("  help | exit");
    println!("{}", "Remote commands:".bold());
    for (name, synopsis) in COMMANDS {
        println!("  {} {}", name, synopsis.dimmed());
    }
}

/// Interactive shell over a shared engine
pub struct Repl {
    controls: SharedControls,
    controls_path: PathBuf,
}

impl Repl {
    pub fn new(controls: SharedControls, controls_path: PathBuf) -> Self {
        Self {
            controls,
            controls_path,
        }
    }

    /// Run until `exit`, Ctrl-D or Ctrl-C. Line editing blocks, so the loop
    /// runs on a blocking thread.
    pub async fn run(self) -> Result<()> {
        let handle = tokio::runtime::Handle::current();
        tokio::task::spawn_blocking(move || self.run_blocking(&handle))
            .await
            .context("REPL task panicked")?
    }

    fn run_blocking(&self, handle: &tokio::runtime::Handle) -> Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            let line = match rl.readline("djctl> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };
            let _ = rl.add_history_entry(line.as_str());

            let command = match ReplCommand::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    println!("{} {:#}", "error:".red(), e);
                    continue;
                }
            };
            if command == ReplCommand::Exit {
                break;
            }
            if let Err(e) = self.execute(command, handle) {
                println!("{} {:#}", "error:".red(), e);
            }
        }

        Ok(())
    }

    fn dispatch(&self, input: Option<NormalizedInput>) -> Result<()> {
        let Some(input) = input else {
            println!("{}", "(ignored: not a binding input)".dimmed());
            return Ok(());
        };
        match self.controls.input_normalized(input)? {
            Dispatch::Learned => println!("{} {}", "learned".cyan(), input.key),
            Dispatch::Handled { invoked } => {
                println!("{} {:02x} -> {} action(s)", input.key, input.value, invoked)
            }
        }
        Ok(())
    }

    pub fn execute(&self, command: ReplCommand, handle: &tokio::runtime::Handle) -> Result<()> {
        debug!("REPL: {:?}", command);
        match command {
            ReplCommand::Key {
                state,
                keyval,
                pressed,
            } => self.dispatch(normalize(&RawInput::Key {
                state,
                keyval,
                pressed,
            })),
            ReplCommand::Midi(bytes) => self.dispatch(normalize_midi_bytes(&bytes)),
            ReplCommand::Input(input) => self.dispatch(Some(input)),
            ReplCommand::Call(remote) => {
                let registry = self.controls.lock().registry().clone();
                remote.execute(&registry)
            }
            ReplCommand::List => {
                let controls = self.controls.lock();
                let registry = controls.registry().clone();
                for (index, binding) in controls.bindings().iter().enumerate() {
                    let highlighted = controls.is_highlighted(binding);
                    println!("{}", format_binding_row(index, binding, &registry, highlighted));
                }
                Ok(())
            }
            ReplCommand::Add(text) => {
                let mut controls = self.controls.lock();
                let binding = controls.parse(&text)?;
                println!("added {}", binding);
                controls.push(binding);
                Ok(())
            }
            ReplCommand::Remove(index) => match self.controls.lock().remove(index) {
                Some(binding) => {
                    println!("removed {}", binding);
                    Ok(())
                }
                None => bail!("no binding at index {}", index),
            },
            ReplCommand::Save => {
                let bindings = self.controls.bindings();
                handle.block_on(prefs::save_controls(&self.controls_path, &bindings))
            }
            ReplCommand::Learn => {
                let (tx, rx) = std_mpsc::channel();
                self.controls.lock().set_learner(Box::new(move |key: &InputKey| {
                    let _ = tx.send(*key);
                }));
                println!("Waiting for an input ({}s)...", LEARN_TIMEOUT.as_secs());
                let learned = rx.recv_timeout(LEARN_TIMEOUT);
                self.controls.lock().clear_learner();
                match learned {
                    Ok(key) => println!("{} {}", "input:".cyan(), key),
                    Err(_) => println!("{}", "nothing received".yellow()),
                }
                Ok(())
            }
            ReplCommand::Help => {
                print_help();
                Ok(())
            }
            ReplCommand::Exit => Ok(()),
        }
    }
}
