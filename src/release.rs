//! Release preparation for plugin bundles.
//!
//! A plugin's `dist/config.json` carries `development.env`; bundles built
//! with `"dev"` must be switched to `"prod"` before they ship. Both CLIs
//! (`focusany release-prepare` and `focusany-release-check`) run through
//! [`prepare_release`].

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "dist/config.json";

const ENV_POINTER: &str = "/development/env";
const DEV_ENV: &str = "dev";
const PROD_ENV: &str = "prod";

/// Raised when the config file does not exist. Callers downcast to it to
/// print path hints.
#[derive(Debug, Error)]
#[error("Configuration file not found {}", path.display())]
pub struct ConfigNotFound {
    pub path: PathBuf,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReleaseMode {
    /// Switch a `dev` environment to `prod` in place.
    Rewrite,
    /// Report only; never write.
    CheckOnly,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReleaseOutcome {
    /// `development.env` was `dev` and the file now says `prod`.
    Rewritten,
    /// Nothing to change; the file was not touched.
    AlreadyProduction,
    /// `development.env` is `dev` and the mode forbade writing.
    NeedsRewrite,
}

/// `custom` (or `dist/config.json` when it is unset or empty) resolved
/// against `cwd`.
pub fn resolve_config_path(cwd: &Path, custom: Option<&str>) -> PathBuf {
    let relative = custom.filter(|path| !path.is_empty()).unwrap_or(DEFAULT_CONFIG_PATH);
    cwd.join(relative)
}

pub fn prepare_release(path: &Path, mode: ReleaseMode) -> Result<ReleaseOutcome> {
    if !path.is_file() {
        return Err(ConfigNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Error reading configuration file {}", path.display()))?;
    let mut config: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Error parsing configuration file {}", path.display()))?;

    if config.pointer(ENV_POINTER).and_then(Value::as_str) != Some(DEV_ENV) {
        return Ok(ReleaseOutcome::AlreadyProduction);
    }
    if mode == ReleaseMode::CheckOnly {
        return Ok(ReleaseOutcome::NeedsRewrite);
    }
    if let Some(env) = config.pointer_mut(ENV_POINTER) {
        *env = Value::String(PROD_ENV.to_string());
    }
    fs::write(path, to_pretty_json(&config)?)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "development.env switched to prod");
    Ok(ReleaseOutcome::Rewritten)
}

/// Four-space indented JSON, keys in their original order.
fn to_pretty_json(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .context("serializing configuration")?;
    Ok(out)
}

/// Follow-up suggestions printed when the config file is missing.
pub fn missing_config_hints(custom_path: bool, command: &str) -> Vec<String> {
    if custom_path {
        return vec!["Please check if the provided configuration file path is correct".to_string()];
    }
    vec![
        format!(
            "Please make sure to run this command in the project root directory that contains {DEFAULT_CONFIG_PATH}"
        ),
        format!("Or specify a custom configuration file path: {command} path/to/config.json"),
    ]
}
