//! Host API catalog wiring.
//!
//! This module wraps the JSON catalog under `schema/host_api.json` so the
//! dispatch layer can load a validated snapshot of the whole host surface.
//! Types here mirror the schema fields; callers use `CapabilityTable` to
//! resolve dotted paths once handlers have been bound.

pub mod identity;
pub mod model;
pub mod path;
pub mod table;

pub use identity::{CapabilityCategory, CatalogKey, Policy};
pub use model::{CatalogEntry, HostApiCatalog};
pub use path::CapabilityPath;
pub use table::{Bindings, CapabilityTable, Handler, Implemented, Namespace, Resolution, Stub};

pub use model::load_catalog_from_path;
