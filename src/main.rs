//! djctl - binding engine host
//!
//! Reads MIDI from a controller and the backend's reply stream, dispatches
//! through the binding list and relays actions to the backend on stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use djctl::cli::Repl;
use djctl::config::{AppConfig, ControlsWatcher};
use djctl::controls::{Controls, SharedControls};
use djctl::device::MidiInputDevice;
use djctl::input::backend;
use djctl::paths::AppPaths;
use djctl::registry::{noop, ActionRegistry};
use djctl::relay::{self, ActionCommand};
use djctl::{prefs, sniffer};

/// Highlight decay tick
const HIGHLIGHT_TICK: Duration = Duration::from_millis(100);

/// djctl - drive a DJ mixer from MIDI controllers and hotkeys
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "DJCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides the config
    #[arg(short, long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// MIDI input port (name substring or index); overrides the config
    #[arg(short, long)]
    port: Option<String>,

    /// List available MIDI input ports
    #[arg(long)]
    list_ports: bool,

    /// List the standard actions
    #[arg(long)]
    list_actions: bool,

    /// Print --list-actions as JSON
    #[arg(long, requires = "list_actions")]
    json: bool,

    /// Check a controls file and report every bad line
    #[arg(long, value_name = "FILE")]
    check: Option<PathBuf>,

    /// Print canonical input keys of incoming MIDI events
    #[arg(long)]
    sniffer: bool,

    /// Interactive shell instead of reading backend replies from stdin
    #[arg(long)]
    repl: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let paths = AppPaths::detect();
    let config_path = args.config.clone().unwrap_or_else(|| paths.config.clone());
    let config = if config_path.exists() {
        AppConfig::load(&config_path.to_string_lossy()).await?
    } else {
        AppConfig::default()
    };

    let level = args.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    let log_dir = if config.logging.file {
        paths.ensure_directories()?;
        Some(paths.logs_dir.as_path())
    } else {
        None
    };
    let _log_guard = init_logging(&level, log_dir)?;

    info!("Starting djctl v{}...", env!("CARGO_PKG_VERSION"));
    info!("Base directory: {}", paths.base_dir().display());
    if config_path.exists() {
        info!("Configuration file: {}", config_path.display());
    } else {
        info!("No configuration at {}, using defaults", config_path.display());
    }

    if args.list_ports {
        return sniffer::list_ports_formatted(&config.midi.client_name);
    }

    if args.list_actions {
        return list_actions(args.json);
    }

    if let Some(file) = &args.check {
        return check_controls_file(file).await;
    }

    let port = args.port.clone().or_else(|| config.midi.input_port.clone());

    if args.sniffer {
        return sniffer::run_cli_sniffer(&config.midi.client_name, port.as_deref()).await;
    }

    let controls_path = paths.controls_file(&config);
    run_app(config, controls_path, port, args.repl, shutdown_signal()).await?;

    info!("djctl shutdown complete");
    Ok(())
}

async fn run_app(
    config: AppConfig,
    controls_path: PathBuf,
    port: Option<String>,
    repl: bool,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    // Every action becomes a command line for the backend
    let (relay_tx, mut relay_rx) = mpsc::unbounded_channel::<ActionCommand>();
    let registry = Arc::new(relay::relay_registry(relay_tx));
    info!("Registered {} actions", registry.len());

    let bindings = prefs::load_or_default(&controls_path, &registry).await?;
    let mut engine = Controls::new(registry.clone());
    engine.set_repeat_ttl(config.controls.repeat_ttl());
    engine.set_highlight_ticks(config.controls.highlight_ticks);
    engine.set_bindings(bindings);
    let controls = SharedControls::new(engine);

    // Keep the connection alive for the whole run
    let _device = match &port {
        Some(pattern) => match MidiInputDevice::connect(&config.midi.client_name, pattern, controls.clone()) {
            Ok(device) => {
                info!("MIDI input connected: {}", device.port_name());
                Some(device)
            }
            Err(e) => {
                warn!("MIDI input unavailable: {:#}", e);
                None
            }
        },
        None => {
            info!("No MIDI input port configured");
            None
        }
    };

    let mut watcher = if config.controls.watch {
        match ControlsWatcher::new(&controls_path, registry.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Controls hot reload disabled: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let mut backend_lines = if repl {
        None
    } else {
        Some(BufReader::new(tokio::io::stdin()).lines())
    };

    let mut repl_task = if repl {
        Some(tokio::spawn(Repl::new(controls.clone(), controls_path.clone()).run()))
    } else {
        None
    };

    let mut highlight_tick = tokio::time::interval(HIGHLIGHT_TICK);

    info!("Ready to process input!");

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Relay actions to the backend
            Some(command) = relay_rx.recv() => {
                println!("{}", command);
            }

            // Backend reply stream: dispatch MIDI reports
            line = next_line(&mut backend_lines) => {
                match line {
                    Ok(Some(line)) => {
                        for input in backend::inputs_from_line(&line) {
                            if let Err(e) = controls.input_normalized(input) {
                                warn!("Dispatch of {} failed: {:#}", input.key, e);
                            }
                        }
                    }
                    Ok(None) => {
                        info!("Backend closed its reply stream");
                        break;
                    }
                    Err(e) => {
                        warn!("Failed to read backend reply: {}", e);
                        backend_lines = None;
                    }
                }
            }

            // Highlight decay
            _ = highlight_tick.tick() => {
                let changed = controls.tick_highlights();
                if !changed.is_empty() {
                    trace!("{} highlight(s) changed", changed.len());
                }
            }

            // Controls file reload
            Some(bindings) = next_reload(&mut watcher) => {
                info!("Controls file changed, replacing {} binding(s)", bindings.len());
                controls.set_bindings(bindings);
            }

            // REPL finished
            result = wait_repl(&mut repl_task) => {
                if let Err(e) = result {
                    warn!("REPL ended with error: {:#}", e);
                }
                break;
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}

async fn next_line(
    lines: &mut Option<tokio::io::Lines<BufReader<tokio::io::Stdin>>>,
) -> std::io::Result<Option<String>> {
    match lines {
        Some(lines) => lines.next_line().await,
        None => std::future::pending().await,
    }
}

async fn next_reload(watcher: &mut Option<ControlsWatcher>) -> Option<Vec<djctl::Binding>> {
    match watcher {
        Some(watcher) => watcher.next_bindings().await,
        None => std::future::pending().await,
    }
}

async fn wait_repl(task: &mut Option<tokio::task::JoinHandle<Result<()>>>) -> Result<()> {
    match task {
        Some(handle) => {
            let result = handle.await.context("REPL task failed")?;
            *task = None;
            result
        }
        None => std::future::pending().await,
    }
}

fn list_actions(json: bool) -> Result<()> {
    let registry = ActionRegistry::standard(|_| noop());

    if json {
        let specs: Vec<_> = registry.specs().collect();
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    println!("\n{}", "=== Standard Actions ===".bold().cyan());
    for spec in registry.specs() {
        let modes: String = spec.modes.iter().map(|m| m.as_char()).collect();
        println!("  {:<12} {:<4} {}", spec.name.yellow(), modes.green(), spec.description);
    }
    println!();
    Ok(())
}

async fn check_controls_file(path: &Path) -> Result<()> {
    let registry = ActionRegistry::standard(|_| noop());
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read controls file: {}", path.display()))?;

    let errors = prefs::check_controls(&text, &registry);
    let good = prefs::parse_controls(&text, &registry).len();

    for (line, error) in &errors {
        println!("{}:{}: {}", path.display(), line, error.to_string().red());
    }
    println!("{} binding(s) OK, {} bad line(s)", good, errors.len());

    if !errors.is_empty() {
        anyhow::bail!("{} has {} bad line(s)", path.display(), errors.len());
    }
    debug!("{} checked", path.display());
    Ok(())
}

/// Console logging on stderr (stdout carries the backend commands), plus a
/// daily-rolling file when `log_dir` is given.
fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "djctl.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
