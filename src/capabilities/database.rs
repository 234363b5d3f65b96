//! `focusany.db.*` and `focusany.dbStorage.*` on top of the page's storage.

use super::{json_reply, report_failure, text_arg};
use crate::catalog::Bindings;
use crate::config::ShimConfig;
use crate::error::StorageError;
use crate::page::Page;
use crate::storage::{DbDoc, DbReturn, DbStorage, LocalDb};
use crate::value::{CallArgs, Reply, js_string};
use serde_json::Value;

pub(crate) fn register(bindings: &mut Bindings) {
    bindings.insert("db.put", put);
    bindings.insert("db.get", get);
    bindings.insert("db.remove", remove);
    bindings.insert("db.bulkDocs", bulk_docs);
    bindings.insert("db.allDocs", all_docs);
    bindings.insert("db.postAttachment", post_attachment);
    bindings.insert("db.getAttachment", get_attachment);
    bindings.insert("db.getAttachmentType", get_attachment_type);
    bindings.insert("dbStorage.setItem", storage_set_item);
    bindings.insert("dbStorage.getItem", storage_get_item);
    bindings.insert("dbStorage.removeItem", storage_remove_item);
}

/// Best-effort id of a malformed document argument.
fn loose_id(value: Option<&Value>) -> String {
    value
        .and_then(|v| v.get("_id"))
        .map(js_string)
        .unwrap_or_default()
}

fn put_value(page: &mut Page, value: Option<&Value>) -> DbReturn {
    let parsed = value
        .cloned()
        .ok_or_else(|| StorageError::Serialization("missing document".into()))
        .and_then(DbDoc::from_value);
    let result = match parsed {
        Ok(doc) => LocalDb::new(page.storage.as_mut()).put(&doc),
        Err(err) => DbReturn::failed(&loose_id(value), &err),
    };
    if !result.is_ok() {
        report_failure(page, "db.put", result.message.as_deref().unwrap_or_default());
    }
    result
}

fn put(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    json_reply(&put_value(page, args.json(0)))
}

fn get(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let id = text_arg(args, 0);
    let doc = LocalDb::new(page.storage.as_mut()).get(&id);
    match doc {
        Some(doc) => json_reply(&doc),
        None => Reply::Json(Value::Null),
    }
}

fn remove(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let id = match args.json(0) {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Object(_)) => loose_id(args.json(0)),
        other => other.map(Value::to_string).unwrap_or_default(),
    };
    let result = LocalDb::new(page.storage.as_mut()).remove(id.as_str());
    if !result.is_ok() {
        report_failure(page, "db.remove", result.message.as_deref().unwrap_or_default());
    }
    json_reply(&result)
}

/// One put per element in order; a malformed element fails on its own.
fn bulk_docs(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let Some(Value::Array(docs)) = args.json(0) else {
        report_failure(page, "db.bulkDocs", "expected an array of documents");
        return Reply::Json(Value::Array(Vec::new()));
    };
    let results: Vec<DbReturn> = docs.iter().map(|doc| put_value(page, Some(doc))).collect();
    json_reply(&results)
}

fn all_docs(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let key = args.str(0).filter(|key| !key.is_empty());
    json_reply(&LocalDb::new(page.storage.as_mut()).all_docs(key))
}

fn post_attachment(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let doc_id = text_arg(args, 0);
    let type_tag = text_arg(args, 2);
    let result = match args.bytes(1) {
        Some(bytes) => LocalDb::new(page.storage.as_mut()).post_attachment(&doc_id, &bytes, &type_tag),
        None => DbReturn::failed(
            &doc_id,
            &StorageError::Serialization("attachment must be a Uint8Array".into()),
        ),
    };
    if !result.is_ok() {
        report_failure(
            page,
            "db.postAttachment",
            result.message.as_deref().unwrap_or_default(),
        );
    }
    json_reply(&result)
}

fn get_attachment(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let doc_id = text_arg(args, 0);
    let type_tag = args.str(1);
    match LocalDb::new(page.storage.as_mut()).get_attachment(&doc_id, type_tag) {
        Some(bytes) => Reply::Bytes(bytes),
        None => Reply::Json(Value::Null),
    }
}

fn get_attachment_type(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let doc_id = text_arg(args, 0);
    LocalDb::new(page.storage.as_mut())
        .get_attachment_type(&doc_id)
        .into()
}

fn storage_set_item(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let key = text_arg(args, 0);
    let value = args.json(1).cloned().unwrap_or(Value::Null);
    if let Err(err) = DbStorage::new(page.storage.as_mut()).set_item(&key, &value) {
        report_failure(page, "dbStorage.setItem", err);
    }
    Reply::Undefined
}

fn storage_get_item(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let key = text_arg(args, 0);
    Reply::Json(DbStorage::new(page.storage.as_mut()).get_item(&key))
}

fn storage_remove_item(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let key = text_arg(args, 0);
    if let Err(err) = DbStorage::new(page.storage.as_mut()).remove_item(&key) {
        report_failure(page, "dbStorage.removeItem", err);
    }
    Reply::Undefined
}
