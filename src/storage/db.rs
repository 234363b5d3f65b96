//! Document and attachment store (`focusany.db`).

use super::{ATTACHMENT_PREFIX, DOC_PREFIX, KeyValueStorage};
use crate::encoding::{base64_to_bytes, bytes_to_base64, random_string};
use crate::error::StorageError;
use crate::value::{js_string, js_truthy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const GENERATED_REV_LEN: usize = 16;

/// A stored document, kept exactly as the plugin handed it over. `_id` names
/// the storage key through `String()`; `_rev` and every other field are opaque.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DbDoc(Map<String, Value>);

impl DbDoc {
    pub fn new(id: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("_id".into(), Value::String(id.into()));
        Self(body)
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Any JSON object with a non-null `_id`.
    pub fn from_value(value: Value) -> Result<Self, StorageError> {
        match value {
            Value::Object(body) if body.get("_id").is_some_and(|id| !id.is_null()) => Ok(Self(body)),
            Value::Object(_) => Err(StorageError::Serialization("document has no _id".into())),
            other => Err(StorageError::Serialization(format!(
                "document must be an object, got {other}"
            ))),
        }
    }

    pub fn id(&self) -> String {
        self.0.get("_id").map(js_string).unwrap_or_default()
    }

    pub fn rev(&self) -> Option<&Value> {
        self.0.get("_rev")
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Outcome of a write. Failures keep the target id and set `error`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbReturn {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DbReturn {
    pub fn success(id: &str, rev: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            rev: Some(rev.into()),
            ok: Some(true),
            ..Self::default()
        }
    }

    pub fn failed(id: &str, err: &StorageError) -> Self {
        Self {
            id: id.to_string(),
            rev: Some(String::new()),
            ok: Some(false),
            error: Some(true),
            name: Some(err.name().to_string()),
            message: Some(err.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok == Some(true) && self.error != Some(true)
    }
}

/// `remove` accepts either form.
#[derive(Clone, Copy, Debug)]
pub enum DocRef<'a> {
    Id(&'a str),
    Doc(&'a DbDoc),
}

impl DocRef<'_> {
    pub fn id(&self) -> String {
        match self {
            DocRef::Id(id) => id.to_string(),
            DocRef::Doc(doc) => doc.id(),
        }
    }
}

impl<'a> From<&'a str> for DocRef<'a> {
    fn from(id: &'a str) -> Self {
        DocRef::Id(id)
    }
}

impl<'a> From<&'a DbDoc> for DocRef<'a> {
    fn from(doc: &'a DbDoc) -> Self {
        DocRef::Doc(doc)
    }
}

pub struct LocalDb<'a> {
    storage: &'a mut dyn KeyValueStorage,
}

impl<'a> LocalDb<'a> {
    pub fn new(storage: &'a mut dyn KeyValueStorage) -> Self {
        Self { storage }
    }

    /// Store `doc` as-is. Last write wins; a truthy `_rev` is echoed as text,
    /// otherwise a fresh one is generated.
    pub fn put(&mut self, doc: &DbDoc) -> DbReturn {
        let id = doc.id();
        match self.write_doc(&id, doc) {
            Ok(()) => {
                let rev = match doc.rev() {
                    Some(rev) if js_truthy(rev) => js_string(rev),
                    _ => random_string(GENERATED_REV_LEN),
                };
                DbReturn::success(&id, rev)
            }
            Err(err) => {
                tracing::error!(%id, error = %err, "db.put failed");
                DbReturn::failed(&id, &err)
            }
        }
    }

    fn write_doc(&mut self, id: &str, doc: &DbDoc) -> Result<(), StorageError> {
        let text = serde_json::to_string(doc)?;
        self.storage.set_item(&doc_key(id), &text)
    }

    pub fn get(&self, id: &str) -> Option<DbDoc> {
        let raw = self.storage.get_item(&doc_key(id))?;
        match serde_json::from_str(&raw) {
            Ok(doc) => Some(doc),
            Err(err) => {
                tracing::error!(id, error = %err, "db.get found an unparsable document");
                None
            }
        }
    }

    /// Idempotent: removing a missing id still succeeds.
    pub fn remove<'d>(&mut self, doc: impl Into<DocRef<'d>>) -> DbReturn {
        let doc: DocRef<'_> = doc.into();
        let id = doc.id();
        match self.storage.remove_item(&doc_key(&id)) {
            Ok(()) => DbReturn::success(&id, ""),
            Err(err) => {
                tracing::error!(%id, error = %err, "db.remove failed");
                DbReturn::failed(&id, &err)
            }
        }
    }

    /// One `put` per document in order. Earlier writes stay when a later one
    /// fails.
    pub fn bulk_docs(&mut self, docs: &[DbDoc]) -> Vec<DbReturn> {
        docs.iter().map(|doc| self.put(doc)).collect()
    }

    /// Every parsable document whose id starts with `key` (all documents when
    /// `key` is `None`).
    pub fn all_docs(&self, key: Option<&str>) -> Vec<DbDoc> {
        let prefix = doc_key(key.unwrap_or(""));
        self.storage
            .keys()
            .into_iter()
            .filter(|item| item.starts_with(&prefix))
            .filter_map(|item| {
                let raw = self.storage.get_item(&item)?;
                match serde_json::from_str(&raw) {
                    Ok(doc) => Some(doc),
                    Err(err) => {
                        tracing::error!(key = %item, error = %err, "db.allDocs skipped an unparsable document");
                        None
                    }
                }
            })
            .collect()
    }

    pub fn post_attachment(&mut self, doc_id: &str, attachment: &[u8], type_tag: &str) -> DbReturn {
        match self.write_attachment(doc_id, attachment, type_tag) {
            Ok(()) => DbReturn::success(doc_id, ""),
            Err(err) => {
                tracing::error!(id = doc_id, error = %err, "db.postAttachment failed");
                DbReturn::failed(doc_id, &err)
            }
        }
    }

    fn write_attachment(
        &mut self,
        doc_id: &str,
        attachment: &[u8],
        type_tag: &str,
    ) -> Result<(), StorageError> {
        let key = attachment_key(doc_id);
        let mut attachments = match self.storage.get_item(&key) {
            Some(raw) => parse_attachment_map(&key, &raw)?,
            None => Map::new(),
        };
        attachments.insert(
            type_tag.to_string(),
            Value::String(bytes_to_base64(attachment)),
        );
        let text = serde_json::to_string(&attachments)?;
        self.storage.set_item(&key, &text)
    }

    /// The payload stored under `type_tag`, or under the first stored type
    /// when `type_tag` is `None`.
    pub fn get_attachment(&self, doc_id: &str, type_tag: Option<&str>) -> Option<Vec<u8>> {
        let attachments = self.attachments(doc_id)?;
        let encoded = match type_tag {
            Some(tag) => attachments.get(tag)?,
            None => attachments.values().next()?,
        };
        let Some(encoded) = encoded.as_str() else {
            tracing::error!(id = doc_id, "db.getAttachment found a non-string payload");
            return None;
        };
        match base64_to_bytes(encoded) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::error!(id = doc_id, error = %err, "db.getAttachment failed");
                None
            }
        }
    }

    pub fn get_attachment_type(&self, doc_id: &str) -> Option<String> {
        self.attachments(doc_id)?.keys().next().cloned()
    }

    fn attachments(&self, doc_id: &str) -> Option<Map<String, Value>> {
        let key = attachment_key(doc_id);
        let raw = self.storage.get_item(&key)?;
        match parse_attachment_map(&key, &raw) {
            Ok(map) => Some(map),
            Err(err) => {
                tracing::error!(id = doc_id, error = %err, "attachment map unreadable");
                None
            }
        }
    }
}

fn doc_key(id: &str) -> String {
    format!("{DOC_PREFIX}{id}")
}

fn attachment_key(doc_id: &str) -> String {
    format!("{ATTACHMENT_PREFIX}{doc_id}")
}

fn parse_attachment_map(key: &str, raw: &str) -> Result<Map<String, Value>, StorageError> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StorageError::Corrupt {
            key: key.to_string(),
            reason: "expected a JSON object".into(),
        }),
        Err(err) => Err(StorageError::Corrupt {
            key: key.to_string(),
            reason: err.to_string(),
        }),
    }
}
