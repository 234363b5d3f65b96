//! Namespace tree built from a validated catalog.
//!
//! Every catalog path becomes a leaf: an [`Implemented`] handler bound by the
//! capability modules, or a [`Stub`] answering with the catalog's mock value.
//! Intermediate segments become [`Namespace`] nodes. The build is strict about
//! duplicates, shape conflicts, undeclared categories and handler/catalog
//! mismatches so a broken catalog cannot reach a page.

use crate::catalog::identity::{CapabilityCategory, CatalogKey, Policy};
use crate::catalog::model::{CatalogEntry, HostApiCatalog};
use crate::catalog::path::CapabilityPath;
use crate::config::ShimConfig;
use crate::page::Page;
use crate::value::{CallArgs, Reply};
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Schema versions this crate knows how to serve.
const ALLOWED_SCHEMA_VERSIONS: &[&str] = &["focusany_host_api_v1"];

/// Page-backed implementation of one capability.
pub type Handler = fn(&mut Page, CallArgs<'_>, &ShimConfig) -> Reply;

/// Handlers keyed by dotted catalog path.
pub type Bindings = BTreeMap<&'static str, Handler>;

pub struct Implemented {
    pub path: CapabilityPath,
    pub category: CapabilityCategory,
    pub handler: Handler,
    pub is_async: bool,
}

impl fmt::Debug for Implemented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implemented")
            .field("path", &self.path)
            .field("category", &self.category)
            .field("is_async", &self.is_async)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stub {
    pub path: CapabilityPath,
    pub category: CapabilityCategory,
    /// `None` answers `undefined`.
    pub returns: Option<Value>,
    pub is_async: bool,
}

#[derive(Debug)]
enum Entry {
    Implemented(Implemented),
    Stub(Stub),
    Namespace(Namespace),
}

impl Entry {
    fn kind(&self) -> &'static str {
        match self {
            Entry::Implemented(_) | Entry::Stub(_) => "capability",
            Entry::Namespace(_) => "namespace",
        }
    }
}

/// Interior node of the capability tree (`db`, `util`, the root).
#[derive(Debug, Default)]
pub struct Namespace {
    entries: BTreeMap<String, Entry>,
}

impl Namespace {
    /// Member names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, segment: &str) -> Resolution<'_> {
        match self.entries.get(segment) {
            Some(Entry::Implemented(implemented)) => Resolution::Implemented(implemented),
            Some(Entry::Stub(stub)) => Resolution::Stub(stub),
            Some(Entry::Namespace(namespace)) => Resolution::Namespace(namespace),
            None => Resolution::Unsupported,
        }
    }
}

/// Outcome of resolving a path against the table.
#[derive(Debug)]
pub enum Resolution<'a> {
    Implemented(&'a Implemented),
    Stub(&'a Stub),
    Namespace(&'a Namespace),
    Unsupported,
}

impl Resolution<'_> {
    /// True when invoking the path runs a handler or a stub.
    pub fn is_callable(&self) -> bool {
        matches!(self, Resolution::Implemented(_) | Resolution::Stub(_))
    }
}

#[derive(Debug)]
pub struct CapabilityTable {
    key: CatalogKey,
    root: Namespace,
    paths: Vec<CapabilityPath>,
}

impl CapabilityTable {
    /// Build the tree and check the catalog against the handler bindings.
    pub fn build(catalog: &HostApiCatalog, bindings: &Bindings) -> Result<Self> {
        validate_schema_version(&catalog.schema_version)?;

        let mut root = Namespace::default();
        let mut paths = Vec::with_capacity(catalog.capabilities.len());
        let mut bound = BTreeSet::new();
        for entry in &catalog.capabilities {
            validate_category(catalog, entry)?;
            let path = CapabilityPath::parse(&entry.path)?;
            let leaf = leaf_for(entry, &path, bindings)?;
            if matches!(leaf, Entry::Implemented(_)) {
                bound.insert(entry.path.as_str());
            }
            insert(&mut root, &path, leaf)
                .with_context(|| format!("adding '{}' to the capability table", entry.path))?;
            paths.push(path);
        }

        let orphans: Vec<&str> = bindings
            .keys()
            .copied()
            .filter(|path| !bound.contains(path))
            .collect();
        if !orphans.is_empty() {
            bail!(
                "handlers bound for paths the catalog does not serve from the page: {}",
                orphans.join(", ")
            );
        }

        paths.sort();
        Ok(Self {
            key: catalog.schema_version.clone(),
            root,
            paths,
        })
    }

    pub fn key(&self) -> &CatalogKey {
        &self.key
    }

    /// Walk the path left to right. Reading through a capability yields
    /// `Unsupported`; the empty path is the root namespace.
    pub fn resolve(&self, path: &CapabilityPath) -> Resolution<'_> {
        let mut current = Resolution::Namespace(&self.root);
        for segment in path.segments() {
            current = match current {
                Resolution::Namespace(namespace) => namespace.lookup(segment),
                _ => return Resolution::Unsupported,
            };
        }
        current
    }

    /// Every callable path, sorted.
    pub fn paths(&self) -> &[CapabilityPath] {
        &self.paths
    }

    pub fn root(&self) -> &Namespace {
        &self.root
    }
}

fn validate_schema_version(version: &CatalogKey) -> Result<()> {
    if !ALLOWED_SCHEMA_VERSIONS.contains(&version.0.as_str()) {
        bail!(
            "schema_version '{}' not in allowed set {:?}",
            version,
            ALLOWED_SCHEMA_VERSIONS
        );
    }
    Ok(())
}

fn validate_category(catalog: &HostApiCatalog, entry: &CatalogEntry) -> Result<()> {
    if !catalog.categories.contains_key(entry.category.as_str()) {
        bail!(
            "capability '{}' uses undeclared category '{}'",
            entry.path,
            entry.category.as_str()
        );
    }
    Ok(())
}

fn leaf_for(entry: &CatalogEntry, path: &CapabilityPath, bindings: &Bindings) -> Result<Entry> {
    let handler = bindings.get(entry.path.as_str()).copied();
    match (entry.policy, handler) {
        (Policy::Stub, None) => Ok(Entry::Stub(Stub {
            path: path.clone(),
            category: entry.category.clone(),
            returns: entry.returns.clone(),
            is_async: entry.is_async,
        })),
        (Policy::Stub, Some(_)) => bail!(
            "capability '{}' is catalogued as a stub but has a page handler",
            entry.path
        ),
        (_, Some(handler)) => Ok(Entry::Implemented(Implemented {
            path: path.clone(),
            category: entry.category.clone(),
            handler,
            is_async: entry.is_async,
        })),
        (policy, None) => bail!(
            "capability '{}' has policy '{}' but no handler is bound",
            entry.path,
            policy.as_str()
        ),
    }
}

fn insert(root: &mut Namespace, path: &CapabilityPath, leaf: Entry) -> Result<()> {
    let Some((last, parents)) = path.segments().split_last() else {
        bail!("capability path must not be empty");
    };
    let mut namespace = root;
    for segment in parents {
        let entry = namespace
            .entries
            .entry(segment.clone())
            .or_insert_with(|| Entry::Namespace(Namespace::default()));
        namespace = match entry {
            Entry::Namespace(inner) => inner,
            other => bail!("'{segment}' is already a {}", other.kind()),
        };
    }
    if let Some(existing) = namespace.entries.get(last) {
        bail!("'{path}' is already declared as a {}", existing.kind());
    }
    namespace.entries.insert(last.clone(), leaf);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Reply;

    fn noop(_: &mut Page, _: CallArgs<'_>, _: &ShimConfig) -> Reply {
        Reply::Undefined
    }

    fn catalog(capabilities: &str) -> HostApiCatalog {
        let raw = format!(
            r#"{{"schema_version": "focusany_host_api_v1",
                "categories": {{"storage": "db", "util": "helpers"}},
                "capabilities": {capabilities}}}"#
        );
        HostApiCatalog::from_json_str(&raw).unwrap()
    }

    fn bindings(paths: &[&'static str]) -> Bindings {
        paths.iter().map(|path| (*path, noop as Handler)).collect()
    }

    #[test]
    fn resolves_leaves_namespaces_and_misses() {
        let catalog = catalog(
            r#"[{"path": "db.put", "category": "storage", "policy": "storage"},
                {"path": "util.md5", "category": "util", "policy": "stub", "returns": ""}]"#,
        );
        let table = CapabilityTable::build(&catalog, &bindings(&["db.put"])).unwrap();

        let resolve = |dotted: &str| table.resolve(&CapabilityPath::from_dotted(dotted));
        assert!(matches!(resolve("db.put"), Resolution::Implemented(_)));
        match resolve("util.md5") {
            Resolution::Stub(stub) => assert_eq!(stub.returns, Some(Value::from(""))),
            other => panic!("expected stub, got {other:?}"),
        }
        assert!(matches!(resolve("db"), Resolution::Namespace(ns) if ns.len() == 1));
        assert!(matches!(resolve(""), Resolution::Namespace(_)));
        assert!(matches!(resolve("db.put.then"), Resolution::Unsupported));
        assert!(matches!(resolve("fs.readFile"), Resolution::Unsupported));
        assert!(!resolve("db").is_callable());
        assert_eq!(table.paths().len(), 2);
    }

    #[test]
    fn rejects_missing_and_orphan_handlers() {
        let catalog = catalog(r#"[{"path": "db.put", "category": "storage", "policy": "storage"}]"#);
        let err = CapabilityTable::build(&catalog, &Bindings::new()).unwrap_err();
        assert!(err.to_string().contains("no handler is bound"));

        let err = CapabilityTable::build(&catalog, &bindings(&["db.put", "db.get"])).unwrap_err();
        assert!(err.to_string().contains("db.get"));
    }

    #[test]
    fn rejects_handlers_for_stubs() {
        let catalog = catalog(r#"[{"path": "util.md5", "category": "util", "policy": "stub"}]"#);
        let err = CapabilityTable::build(&catalog, &bindings(&["util.md5"])).unwrap_err();
        assert!(err.to_string().contains("stub"));
    }

    #[test]
    fn rejects_duplicates_and_shape_conflicts() {
        for capabilities in [
            r#"[{"path": "util.md5", "category": "util", "policy": "stub"},
                {"path": "util.md5", "category": "util", "policy": "stub"}]"#,
            r#"[{"path": "util", "category": "util", "policy": "stub"},
                {"path": "util.md5", "category": "util", "policy": "stub"}]"#,
            r#"[{"path": "util.md5", "category": "util", "policy": "stub"},
                {"path": "util", "category": "util", "policy": "stub"}]"#,
        ] {
            let err = CapabilityTable::build(&catalog(capabilities), &Bindings::new()).unwrap_err();
            assert!(format!("{err:#}").contains("already"), "{capabilities}");
        }
    }

    #[test]
    fn rejects_undeclared_categories_and_unknown_versions() {
        let catalog_with_llm =
            catalog(r#"[{"path": "llmChat", "category": "llm", "policy": "stub"}]"#);
        let err = CapabilityTable::build(&catalog_with_llm, &Bindings::new()).unwrap_err();
        assert!(err.to_string().contains("undeclared category 'llm'"));

        let mut other_version =
            catalog(r#"[{"path": "util.md5", "category": "util", "policy": "stub"}]"#);
        other_version.schema_version = CatalogKey("focusany_host_api_v9".into());
        let err = CapabilityTable::build(&other_version, &Bindings::new()).unwrap_err();
        assert!(err.to_string().contains("not in allowed set"));
    }
}
