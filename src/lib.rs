//! Browser compatibility shim for the FocusAny plugin API.
//!
//! Plugins written against the FocusAny desktop host call `focusany.<path>()`
//! for windows, clipboard, storage, simulated input and more. This crate lets
//! the same calls run inside a plain web page: [`install`] puts a [`FocusAny`]
//! entry point on a [`Page`], every path in the embedded host API catalog is
//! served by a page-backed handler or a documented stub, and anything else is
//! reported as unsupported instead of crashing the plugin.
//!
//! The [`release`] module backs the `focusany` and `focusany-release-check`
//! binaries that switch a plugin config from `dev` to `prod` before packaging.

pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod encoding;
pub mod error;
pub mod page;
pub mod release;
pub mod storage;
pub mod value;

pub use catalog::{
    CapabilityCategory, CapabilityPath, CapabilityTable, CatalogKey, HostApiCatalog, Policy,
    Resolution, load_catalog_from_path,
};
pub use config::{ShimConfig, UnsupportedPolicy};
pub use dispatch::{Accessor, CallRecord, ENTRY_POINT_NAME, FocusAny, RESOLVED_SUFFIX, install};
pub use error::{ShimError, StorageError};
pub use page::Page;
pub use storage::{DbDoc, DbReturn, KeyValueStorage, MemoryStorage};
pub use value::{Arg, Deferred, Reply};
