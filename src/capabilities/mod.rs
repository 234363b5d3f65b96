//! Page-backed capability handlers.
//!
//! Each submodule registers its handlers under their dotted catalog path.
//! [`bindings`] collects them for [`crate::catalog::CapabilityTable::build`],
//! which rejects any mismatch with the catalog.

pub mod database;
pub mod environment;
pub mod toast;
pub mod util;

use crate::catalog::Bindings;
use crate::page::Page;
use crate::value::{CallArgs, Reply, js_string};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

pub(crate) const LOG_PREFIX: &str = "FocusAny Shim";

/// Every page-backed handler keyed by catalog path.
pub fn bindings() -> Bindings {
    let mut bindings = Bindings::new();
    environment::register(&mut bindings);
    toast::register(&mut bindings);
    database::register(&mut bindings);
    util::register(&mut bindings);
    bindings
}

/// `String(arg)` for text parameters, except that missing or `null` reads as
/// empty.
pub(crate) fn text_arg(args: CallArgs<'_>, index: usize) -> String {
    match args.json(index) {
        None | Some(Value::Null) => String::new(),
        Some(other) => js_string(other),
    }
}

/// Console line for a caught failure, e.g. `FocusAny Shim: db.put() failed: ...`.
pub(crate) fn report_failure(page: &mut Page, capability: &str, err: impl Display) {
    page.console
        .error(format!("{LOG_PREFIX}: {capability}() failed: {err}"));
}

pub(crate) fn json_reply<T: Serialize>(value: &T) -> Reply {
    match serde_json::to_value(value) {
        Ok(value) => Reply::Json(value),
        Err(err) => {
            tracing::error!(error = %err, "reply is not serializable");
            Reply::Json(Value::Null)
        }
    }
}
