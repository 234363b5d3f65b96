//! Deserializable representation of `schema/host_api.json`.
//!
//! The catalog lists every capability reachable from `window.focusany`, the
//! category it belongs to, and how the web shim provides it. The embedded copy
//! is compiled into the crate; embedders may point [`crate::ShimConfig`] at a
//! replacement file, which goes through the same schema validation.

use crate::catalog::identity::{CapabilityCategory, CatalogKey, Policy};
use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const EMBEDDED_CATALOG: &str = include_str!("../../schema/host_api.json");
const CATALOG_SCHEMA: &str = include_str!("../../schema/host_api.schema.json");

#[derive(Clone, Debug, Deserialize)]
/// Full host API catalog.
pub struct HostApiCatalog {
    pub schema_version: CatalogKey,
    #[serde(default)]
    pub description: Option<String>,
    pub categories: BTreeMap<String, String>,
    pub capabilities: Vec<CatalogEntry>,
}

#[derive(Clone, Debug, Deserialize)]
/// One capability path and how it is served.
pub struct CatalogEntry {
    pub path: String,
    pub category: CapabilityCategory,
    pub policy: Policy,
    #[serde(default, rename = "async")]
    pub is_async: bool,
    /// Mock value for stubs. `None` means the call yields `undefined`;
    /// an explicit JSON `null` is kept as `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present_value")]
    pub returns: Option<Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl HostApiCatalog {
    /// The catalog shipped with the crate.
    pub fn embedded() -> Result<Self> {
        Self::from_json_str(EMBEDDED_CATALOG).context("embedded host API catalog")
    }

    /// Parse and schema-validate a catalog document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).context("parsing host API catalog")?;
        validate_against_schema(&value)?;
        serde_json::from_value(value).context("decoding host API catalog")
    }
}

/// Read, parse and schema-validate a catalog from disk.
pub fn load_catalog_from_path(path: &Path) -> Result<HostApiCatalog> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    HostApiCatalog::from_json_str(&data).with_context(|| format!("loading {}", path.display()))
}

fn validate_against_schema(instance: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(CATALOG_SCHEMA).context("parsing host API catalog schema")?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| anyhow!("compiling host API catalog schema: {err}"))?;
    if let Err(errors) = compiled.validate(instance) {
        let details = errors
            .map(|err| format!("{} at {}", err, err.instance_path))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("host API catalog failed schema validation:\n{details}");
    }
    Ok(())
}
