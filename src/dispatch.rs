//! The `focusany` entry point.
//!
//! [`FocusAny`] answers property reads of any depth with an [`Accessor`] and
//! routes invocations through the [`CapabilityTable`]: implemented paths run
//! their page handler, stubs answer with their catalog value, and everything
//! else is reported as unsupported. Table-backed calls are mirrored to an
//! optional log hook.

use crate::capabilities;
use crate::catalog::{
    CapabilityPath, CapabilityTable, HostApiCatalog, Resolution, load_catalog_from_path,
};
use crate::config::{ShimConfig, UnsupportedPolicy};
use crate::error::ShimError;
use crate::page::Page;
use crate::value::{Arg, CallArgs, Deferred, Reply};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Name of the global the shim installs under.
pub const ENTRY_POINT_NAME: &str = "focusany";
/// Appended to the mirrored name when a deferred reply settles.
pub const RESOLVED_SUFFIX: &str = ".resolved";

const LOG_PREFIX: &str = "FocusAny Shim";

/// One mirrored call, as handed to the log hook.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CallRecord {
    pub name: String,
    pub payload: Value,
}

pub type LogHook = Rc<dyn Fn(&CallRecord)>;

type HookSlot = Rc<RefCell<Option<LogHook>>>;

pub struct FocusAny {
    table: CapabilityTable,
    config: ShimConfig,
    log_hook: HookSlot,
    reported: RefCell<BTreeSet<String>>,
}

impl FocusAny {
    /// Build the table from the configured catalog (embedded by default).
    pub fn new(config: ShimConfig) -> Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => load_catalog_from_path(path)?,
            None => HostApiCatalog::embedded()?,
        };
        let table = CapabilityTable::build(&catalog, &capabilities::bindings())
            .context("building capability table")?;
        tracing::debug!(
            catalog = %table.key(),
            capabilities = table.paths().len(),
            "focusany shim ready"
        );
        Ok(Self {
            table,
            config,
            log_hook: Rc::new(RefCell::new(None)),
            reported: RefCell::new(BTreeSet::new()),
        })
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    pub fn table(&self) -> &CapabilityTable {
        &self.table
    }

    /// Replace the call-log hook. The latest registration wins.
    pub fn set_log_hook(&self, hook: impl Fn(&CallRecord) + 'static) {
        *self.log_hook.borrow_mut() = Some(Rc::new(hook));
    }

    pub fn clear_log_hook(&self) {
        self.log_hook.borrow_mut().take();
    }

    /// `focusany.<segment>`
    pub fn get(&self, segment: &str) -> Accessor<'_> {
        Accessor {
            shim: self,
            path: CapabilityPath::root().child(segment),
        }
    }

    /// Chain of property reads, e.g. `path("simulate.keyboardTap")`.
    pub fn path(&self, dotted: &str) -> Accessor<'_> {
        Accessor {
            shim: self,
            path: CapabilityPath::from_dotted(dotted),
        }
    }

    pub fn resolve(&self, path: &CapabilityPath) -> Resolution<'_> {
        self.table.resolve(path)
    }

    /// Invoke `path` with `args`.
    ///
    /// Lenient mode never returns `Err`. Strict mode fails unsupported and
    /// stub paths with [`ShimError::Unsupported`]; async stubs reject their
    /// deferred instead.
    pub fn invoke(
        &self,
        page: &mut Page,
        path: &CapabilityPath,
        args: &[Arg],
    ) -> Result<Reply, ShimError> {
        let args = CallArgs::new(args);
        match self.table.resolve(path) {
            Resolution::Implemented(capability) => {
                tracing::debug!(path = %path, "dispatching to page handler");
                self.mirror(path, args.snapshot());
                let reply = (capability.handler)(page, args, &self.config);
                if capability.is_async && reply.as_deferred().is_none() {
                    return Ok(Reply::Deferred(self.defer(page, path, Ok(reply.snapshot()))));
                }
                Ok(reply)
            }
            Resolution::Stub(stub) => {
                self.mirror(path, args.snapshot());
                if self.reported.borrow_mut().insert(path.to_string()) {
                    self.report_unsupported(page, path);
                }
                let outcome = match self.config.unsupported {
                    UnsupportedPolicy::Lenient => Ok(stub.returns.clone()),
                    UnsupportedPolicy::Strict => Err(ShimError::unsupported(qualified(path))),
                };
                if stub.is_async {
                    let settled = outcome.map(|value| value.unwrap_or(Value::Null));
                    return Ok(Reply::Deferred(self.defer(page, path, settled)));
                }
                outcome.map(|value| value.map_or(Reply::Undefined, Reply::Json))
            }
            Resolution::Namespace(_) | Resolution::Unsupported => {
                self.report_unsupported(page, path);
                match self.config.unsupported {
                    UnsupportedPolicy::Lenient => Ok(Reply::Undefined),
                    UnsupportedPolicy::Strict => Err(ShimError::unsupported(qualified(path))),
                }
            }
        }
    }

    fn report_unsupported(&self, page: &mut Page, path: &CapabilityPath) {
        page.console.error(format!(
            "{LOG_PREFIX}: {}() is not supported in web environment",
            qualified(path)
        ));
    }

    fn mirror(&self, path: &CapabilityPath, payload: Value) {
        let name = path.terminal().unwrap_or(ENTRY_POINT_NAME).to_string();
        emit(&self.log_hook, CallRecord { name, payload });
    }

    /// Settle `outcome` on the next event-loop turn, mirroring the resolved
    /// value under `<name>.resolved`.
    fn defer(
        &self,
        page: &mut Page,
        path: &CapabilityPath,
        outcome: Result<Value, ShimError>,
    ) -> Deferred {
        let deferred = Deferred::pending();
        let handle = deferred.clone();
        let hook = Rc::clone(&self.log_hook);
        let name = format!(
            "{}{RESOLVED_SUFFIX}",
            path.terminal().unwrap_or(ENTRY_POINT_NAME)
        );
        page.timers.set_timeout(
            0,
            Box::new(move |_page: &mut Page| {
                if let Ok(value) = &outcome {
                    emit(
                        &hook,
                        CallRecord {
                            name,
                            payload: value.clone(),
                        },
                    );
                }
                handle.settle(outcome);
            }),
        );
        deferred
    }
}

fn emit(slot: &HookSlot, record: CallRecord) {
    // Clone out of the slot so a hook may replace itself.
    let hook = slot.borrow().clone();
    if let Some(hook) = hook {
        hook(&record);
    }
}

fn qualified(path: &CapabilityPath) -> String {
    if path.is_root() {
        ENTRY_POINT_NAME.to_string()
    } else {
        format!("{ENTRY_POINT_NAME}.{path}")
    }
}

/// Result of a property read: a path that can be read further or invoked.
#[derive(Clone)]
pub struct Accessor<'a> {
    shim: &'a FocusAny,
    path: CapabilityPath,
}

impl<'a> Accessor<'a> {
    pub fn get(&self, segment: &str) -> Accessor<'a> {
        Accessor {
            shim: self.shim,
            path: self.path.child(segment),
        }
    }

    pub fn path(&self) -> &CapabilityPath {
        &self.path
    }

    pub fn resolve(&self) -> Resolution<'a> {
        self.shim.table.resolve(&self.path)
    }

    pub fn call(&self, page: &mut Page, args: &[Arg]) -> Result<Reply, ShimError> {
        self.shim.invoke(page, &self.path, args)
    }
}

/// Install the entry point on `page` unless one is already present.
///
/// A second install returns the existing entry point untouched, whatever
/// config it is given.
pub fn install(page: &mut Page, config: ShimConfig) -> Result<Rc<FocusAny>> {
    if let Some(existing) = page.global(ENTRY_POINT_NAME) {
        tracing::debug!("focusany already installed");
        return Ok(existing);
    }
    let shim = Rc::new(FocusAny::new(config)?);
    page.set_global(ENTRY_POINT_NAME, Rc::clone(&shim));
    Ok(shim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder(shim: &FocusAny) -> Rc<RefCell<Vec<CallRecord>>> {
        let records = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&records);
        shim.set_log_hook(move |record| sink.borrow_mut().push(record.clone()));
        records
    }

    #[test]
    fn unknown_paths_are_reported_with_full_path() {
        let mut page = Page::default();
        let shim = FocusAny::new(ShimConfig::default()).unwrap();
        let reply = shim
            .path("fs.readFile.sync")
            .call(&mut page, &[Arg::from("/etc/hosts")])
            .unwrap();
        assert!(reply.is_undefined());
        assert_eq!(
            page.console.errors().collect::<Vec<_>>(),
            ["FocusAny Shim: focusany.fs.readFile.sync() is not supported in web environment"]
        );
    }

    #[test]
    fn calling_a_namespace_is_unsupported() {
        let mut page = Page::default();
        let shim = FocusAny::new(ShimConfig::strict()).unwrap();
        let err = shim.get("db").call(&mut page, &[]).unwrap_err();
        assert_eq!(err, ShimError::unsupported("focusany.db"));
        assert_eq!(page.console.errors().count(), 1);
    }

    #[test]
    fn reading_through_a_capability_stays_unsupported() {
        let shim = FocusAny::new(ShimConfig::default()).unwrap();
        assert!(shim.get("db").get("put").resolve().is_callable());
        assert!(matches!(
            shim.get("db").get("put").get("then").resolve(),
            Resolution::Unsupported
        ));
    }

    #[test]
    fn stubs_report_once_and_return_mock_values() {
        let mut page = Page::default();
        let shim = FocusAny::new(ShimConfig::default()).unwrap();
        let md5 = shim.path("util.md5");
        assert_eq!(md5.call(&mut page, &[Arg::from("x")]).unwrap().as_json(), Some(&json!("")));
        assert_eq!(md5.call(&mut page, &[Arg::from("y")]).unwrap().as_json(), Some(&json!("")));
        assert_eq!(page.console.errors().count(), 1);

        let shown = shim.get("isMainWindowShown").call(&mut page, &[]).unwrap();
        assert_eq!(shown.as_json(), Some(&json!(true)));
        assert!(shim.get("hideMainWindow").call(&mut page, &[]).unwrap().is_undefined());
    }

    #[test]
    fn strict_sync_stub_fails() {
        let mut page = Page::default();
        let shim = FocusAny::new(ShimConfig::strict()).unwrap();
        let err = shim.path("util.md5").call(&mut page, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "focusany.util.md5() is not supported in web environment"
        );
    }

    #[test]
    fn async_stub_settles_on_next_tick() {
        let mut page = Page::default();
        let lenient = FocusAny::new(ShimConfig::default()).unwrap();
        let strict = FocusAny::new(ShimConfig::strict()).unwrap();

        let resolved = lenient.path("simulate.keyboardTap").call(&mut page, &[]).unwrap();
        let rejected = strict.path("simulate.keyboardTap").call(&mut page, &[]).unwrap();
        let resolved = resolved.as_deferred().unwrap().clone();
        let rejected = rejected.as_deferred().unwrap().clone();
        assert!(!resolved.is_settled());

        page.tick();
        assert!(resolved.take().unwrap().is_ok());
        assert!(matches!(
            rejected.take(),
            Some(Err(ShimError::Unsupported { .. }))
        ));
    }

    #[test]
    fn table_backed_calls_are_mirrored() {
        let mut page = Page::default();
        let shim = FocusAny::new(ShimConfig::default()).unwrap();
        let records = recorder(&shim);

        shim.get("onPluginReady")
            .call(&mut page, &[Arg::function(|_, _| {})])
            .unwrap();
        shim.path("view.getHeight").call(&mut page, &[]).unwrap();
        shim.path("nope").call(&mut page, &[]).unwrap();
        page.tick();

        let records = records.borrow();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["onPluginReady", "getHeight", "getHeight.resolved"]);
        assert_eq!(records[0].payload, json!(["[Function]"]));
        assert_eq!(records[2].payload, json!(600));
    }

    #[test]
    fn latest_log_hook_wins() {
        let mut page = Page::default();
        let shim = FocusAny::new(ShimConfig::default()).unwrap();
        let first = recorder(&shim);
        let second = recorder(&shim);
        shim.get("isLinux").call(&mut page, &[]).unwrap();
        assert!(first.borrow().is_empty());
        assert_eq!(second.borrow().len(), 1);

        shim.clear_log_hook();
        shim.get("isLinux").call(&mut page, &[]).unwrap();
        assert_eq!(second.borrow().len(), 1);
    }

    #[test]
    fn install_is_idempotent() {
        let mut page = Page::default();
        let first = install(&mut page, ShimConfig::default()).unwrap();
        let nodes = page.document.node_count();
        let second = install(&mut page, ShimConfig::strict()).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.config().unsupported, UnsupportedPolicy::Lenient);
        assert_eq!(page.document.node_count(), nodes);
        assert!(page.console.entries().is_empty());
    }
}
