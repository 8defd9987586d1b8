//! Controls file persistence
//!
//! Plain text, one binding per line in canonical form. Blank lines and
//! lines starting with `#` are ignored on load; lines that fail to parse are
//! skipped with a warning so one bad entry never loses the rest of the file.
//! Save writes the list back in order with no comments.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::binding::{Binding, BindingError};
use crate::registry::catalog::DEFAULT_BINDINGS;
use crate::registry::ActionRegistry;

/// Parse controls file contents, skipping comments and bad lines
pub fn parse_controls(text: &str, registry: &ActionRegistry) -> Vec<Binding> {
    let mut bindings = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Binding::parse(line, registry) {
            Ok(binding) => bindings.push(binding),
            Err(e) => warn!("Skipping controls line {}: {}", number + 1, e),
        }
    }
    bindings
}

/// Every unparsable line as `(line number, error)`, for `--check`
pub fn check_controls(text: &str, registry: &ActionRegistry) -> Vec<(usize, BindingError)> {
    text.lines()
        .enumerate()
        .map(|(number, line)| (number + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|(number, line)| Binding::parse(line, registry).err().map(|e| (number, e)))
        .collect()
}

pub fn format_controls(bindings: &[Binding]) -> String {
    let mut out = String::new();
    for binding in bindings {
        out.push_str(&binding.to_string());
        out.push('\n');
    }
    out
}

/// Built-in binding set used when no controls file exists yet
pub fn default_bindings(registry: &ActionRegistry) -> Vec<Binding> {
    DEFAULT_BINDINGS
        .iter()
        .filter_map(|line| match Binding::parse(line, registry) {
            Ok(binding) => Some(binding),
            Err(e) => {
                warn!("Default binding {:?} unavailable: {}", line, e);
                None
            }
        })
        .collect()
}

pub async fn load_controls(path: impl AsRef<Path>, registry: &ActionRegistry) -> Result<Vec<Binding>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read controls file: {}", path.display()))?;

    let bindings = parse_controls(&text, registry);
    debug!("Read {} binding(s) from {}", bindings.len(), path.display());
    Ok(bindings)
}

/// Load the controls file, falling back to the default set when it does not
/// exist. Other read errors are returned.
pub async fn load_or_default(path: impl AsRef<Path>, registry: &ActionRegistry) -> Result<Vec<Binding>> {
    let path = path.as_ref();
    if !fs::try_exists(path).await.unwrap_or(false) {
        info!("No controls file at {}, using default bindings", path.display());
        return Ok(default_bindings(registry));
    }
    load_controls(path, registry).await
}

pub async fn save_controls(path: impl AsRef<Path>, bindings: &[Binding]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, format_controls(bindings))
        .await
        .with_context(|| format!("Failed to write controls file: {}", path.display()))?;

    info!("Saved {} binding(s) to {}", bindings.len(), path.display());
    Ok(())
}
