//! Shim configuration.
//!
//! Embedding pages pick the unsupported-capability policy and toast timings
//! either from a JSON document or from `FOCUSANY_SHIM_*` environment flags.
//! Every field has a default so an empty object is a valid config.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_TOAST_DURATION_MS: u64 = 3000;
pub const DEFAULT_NOTIFICATION_DURATION_MS: u64 = 5000;

/// What invoking an unimplemented capability does.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedPolicy {
    /// Report on the console and return `undefined` (or the stub's mock value).
    #[default]
    Lenient,
    /// Report on the console and fail with [`crate::ShimError::Unsupported`].
    Strict,
}

impl UnsupportedPolicy {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "lenient" | "log" => Ok(Self::Lenient),
            "strict" | "error" | "throw" => Ok(Self::Strict),
            other => bail!("unknown unsupported policy '{other}' (expected lenient|strict)"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShimConfig {
    pub unsupported: UnsupportedPolicy,
    pub toast_duration_ms: u64,
    pub notification_duration_ms: u64,
    /// Replacement host API catalog; the embedded catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            unsupported: UnsupportedPolicy::Lenient,
            toast_duration_ms: DEFAULT_TOAST_DURATION_MS,
            notification_duration_ms: DEFAULT_NOTIFICATION_DURATION_MS,
            catalog_path: None,
        }
    }
}

impl ShimConfig {
    pub fn strict() -> Self {
        Self {
            unsupported: UnsupportedPolicy::Strict,
            ..Self::default()
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Invalid shim config JSON")
    }

    /// Build a config from `FOCUSANY_SHIM_UNSUPPORTED`, `FOCUSANY_SHIM_TOAST_MS`
    /// and `FOCUSANY_SHIM_CATALOG`. Unset or empty variables keep defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup("FOCUSANY_SHIM_UNSUPPORTED") {
            config.unsupported = UnsupportedPolicy::parse(&raw)?;
        }
        if let Some(raw) = lookup("FOCUSANY_SHIM_TOAST_MS").filter(|v| !v.trim().is_empty()) {
            config.toast_duration_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("FOCUSANY_SHIM_TOAST_MS must be an integer, got {raw}"))?;
        }
        if let Some(raw) = lookup("FOCUSANY_SHIM_CATALOG").filter(|v| !v.trim().is_empty()) {
            config.catalog_path = Some(PathBuf::from(raw));
        }
        Ok(config)
    }
}
