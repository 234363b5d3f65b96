//! `focusany.util.*` helpers.

use super::{report_failure, text_arg};
use crate::catalog::Bindings;
use crate::config::ShimConfig;
use crate::encoding::{
    base64_to_bytes, base64_to_json, bytes_to_base64, datetime_string, json_to_base64,
    random_string,
};
use crate::page::{Blob, Page};
use crate::value::{Arg, CallArgs, Reply};
use anyhow::{Result, bail};
use serde_json::Value;

const SAVE_MIME: &str = "application/octet-stream";

pub(crate) fn register(bindings: &mut Bindings) {
    bindings.insert("util.randomString", random_string_handler);
    bindings.insert("util.bufferToBase64", buffer_to_base64);
    bindings.insert("util.base64ToBuffer", base64_to_buffer);
    bindings.insert("util.datetimeString", datetime_string_handler);
    bindings.insert("util.base64Encode", base64_encode);
    bindings.insert("util.base64Decode", base64_decode);
    bindings.insert("util.save", save);
}

fn random_string_handler(_: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let length = args
        .u64(0)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    random_string(length).into()
}

fn buffer_to_base64(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    match args.bytes(0) {
        Some(bytes) => bytes_to_base64(&bytes).into(),
        None => {
            report_failure(page, "util.bufferToBase64", "expected a Uint8Array");
            String::new().into()
        }
    }
}

fn base64_to_buffer(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    match base64_to_bytes(&text_arg(args, 0)) {
        Ok(bytes) => Reply::Bytes(bytes),
        Err(err) => {
            report_failure(page, "util.base64ToBuffer", format!("{err:#}"));
            Reply::Bytes(Vec::new())
        }
    }
}

fn datetime_string_handler(_: &mut Page, _: CallArgs<'_>, _: &ShimConfig) -> Reply {
    datetime_string().into()
}

fn base64_encode(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let data = args.get(0).map(Arg::snapshot).unwrap_or(Value::Null);
    match json_to_base64(&data) {
        Ok(encoded) => encoded.into(),
        Err(err) => {
            report_failure(page, "util.base64Encode", format!("{err:#}"));
            String::new().into()
        }
    }
}

fn base64_decode(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    match base64_to_json(&text_arg(args, 0)) {
        Ok(value) => Reply::Json(value),
        Err(err) => {
            report_failure(page, "util.base64Decode", format!("{err:#}"));
            Reply::Undefined
        }
    }
}

/// Bytes to save: a `Uint8Array` as-is, or a string (base64-decoded when
/// `option.isBase64` is set).
fn save_payload(args: CallArgs<'_>) -> Result<Vec<u8>> {
    let is_base64 = args
        .json(2)
        .and_then(|option| option.get("isBase64"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    match args.get(1) {
        Some(Arg::Bytes(bytes)) => Ok(bytes.clone()),
        Some(Arg::Json(Value::String(text))) if is_base64 => base64_to_bytes(text),
        Some(Arg::Json(Value::String(text))) => Ok(text.clone().into_bytes()),
        _ => match args.bytes(1) {
            Some(bytes) => Ok(bytes),
            None => bail!("data must be a string or Uint8Array"),
        },
    }
}

/// Trigger a browser download through a temporary anchor and object URL.
pub fn save_download(page: &mut Page, filename: &str, bytes: Vec<u8>) -> bool {
    if filename.is_empty() {
        report_failure(page, "util.save", "filename must not be empty");
        return false;
    }
    let url = page.blobs.create_object_url(Blob {
        bytes,
        mime: SAVE_MIME.to_string(),
    });
    let anchor = page.document.create_element("a");
    page.document.set_attribute(anchor, "href", &url);
    page.document.set_attribute(anchor, "download", filename);
    let body = page.document.body();
    page.document.append_child(body, anchor);
    page.click(anchor);
    page.document.remove(anchor);
    page.blobs.revoke_object_url(&url);
    true
}

fn save(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let filename = text_arg(args, 0);
    match save_payload(args) {
        Ok(bytes) => save_download(page, &filename, bytes).into(),
        Err(err) => {
            report_failure(page, "util.save", format!("{err:#}"));
            false.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(
        handler: fn(&mut Page, CallArgs<'_>, &ShimConfig) -> Reply,
        page: &mut Page,
        args: &[Arg],
    ) -> Reply {
        handler(page, CallArgs::new(args), &ShimConfig::default())
    }

    #[test]
    fn random_string_honours_length() {
        let mut page = Page::default();
        let value = call(random_string_handler, &mut page, &[Arg::from(json!(24))])
            .into_json()
            .unwrap();
        let text = value.as_str().unwrap();
        assert_eq!(text.len(), 24);
        assert!(text.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(
            call(random_string_handler, &mut page, &[]).as_json(),
            Some(&json!(""))
        );
    }

    #[test]
    fn buffer_helpers_round_trip() {
        let mut page = Page::default();
        let encoded = call(buffer_to_base64, &mut page, &[Arg::from(b"FocusAny".to_vec())]);
        assert_eq!(encoded.as_json(), Some(&json!("Rm9jdXNBbnk=")));
        match call(base64_to_buffer, &mut page, &[Arg::from("Rm9jdXNBbnk=")]) {
            Reply::Bytes(bytes) => assert_eq!(bytes, b"FocusAny"),
            other => panic!("expected bytes, got {other:?}"),
        }

        match call(base64_to_buffer, &mut page, &[Arg::from("***")]) {
            Reply::Bytes(bytes) => assert!(bytes.is_empty()),
            other => panic!("expected bytes, got {other:?}"),
        }
        assert_eq!(page.console.errors().count(), 1);
    }

    #[test]
    fn json_base64_helpers_round_trip() {
        let mut page = Page::default();
        let encoded = call(base64_encode, &mut page, &[Arg::from(json!({"a": 1, "b": ["x"]}))]);
        assert_eq!(encoded.as_json(), Some(&json!("eyJhIjoxLCJiIjpbIngiXX0=")));
        let decoded = call(base64_decode, &mut page, &[Arg::from("eyJhIjoxLCJiIjpbIngiXX0=")]);
        assert_eq!(decoded.as_json(), Some(&json!({"a": 1, "b": ["x"]})));

        assert!(call(base64_decode, &mut page, &[Arg::from("bm90IGpzb24=")]).is_undefined());
    }

    #[test]
    fn datetime_string_is_iso_utc_millis() {
        let mut page = Page::default();
        let value = call(datetime_string_handler, &mut page, &[]).into_json().unwrap();
        let text = value.as_str().unwrap();
        assert!(text.ends_with('Z'));
        assert_eq!(text.len(), "2024-01-01T00:00:00.000Z".len());
    }

    #[test]
    fn save_triggers_download_and_cleans_up() {
        let mut page = Page::default();
        let nodes_before = page.document.children(page.document.body()).len();
        let ok = call(save, &mut page, &[Arg::from("notes.txt"), Arg::from("hello")]);
        assert_eq!(ok.as_json(), Some(&json!(true)));

        let download = &page.downloads()[0];
        assert_eq!(download.filename, "notes.txt");
        assert_eq!(download.mime, SAVE_MIME);
        assert_eq!(download.bytes, b"hello");
        assert_eq!(page.blobs.live_count(), 0);
        assert_eq!(page.document.children(page.document.body()).len(), nodes_before);
    }

    #[test]
    fn save_decodes_base64_on_request() {
        let mut page = Page::default();
        let args = [
            Arg::from("logo.bin"),
            Arg::from("Rm9jdXNBbnk="),
            Arg::from(json!({"isBase64": true})),
        ];
        call(save, &mut page, &args);
        assert_eq!(page.downloads()[0].bytes, b"FocusAny");

        let bad = call(save, &mut page, &[Arg::from("x.bin"), Arg::from(json!(42))]);
        assert_eq!(bad.as_json(), Some(&json!(false)));
        let unnamed = call(save, &mut page, &[Arg::from(""), Arg::from("data")]);
        assert_eq!(unnamed.as_json(), Some(&json!(false)));
        assert_eq!(page.downloads().len(), 1);
    }
}
