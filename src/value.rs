//! Values crossing the plugin/shim boundary.
//!
//! Arguments are JSON, raw bytes (`Uint8Array`) or callbacks. Replies mirror
//! what the host returns: nothing (`undefined`), JSON, bytes, or a deferred
//! result that settles on a later event-loop turn.

use crate::error::ShimError;
use crate::page::Page;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Stands in for function arguments in call snapshots.
pub const FUNCTION_PLACEHOLDER: &str = "[Function]";

pub type Callback = Rc<dyn Fn(&mut Page, Value)>;

#[derive(Clone)]
pub enum Arg {
    Json(Value),
    Bytes(Vec<u8>),
    Function(Callback),
}

impl Arg {
    pub fn function(f: impl Fn(&mut Page, Value) + 'static) -> Self {
        Arg::Function(Rc::new(f))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Arg::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    /// Serializable view used for call mirroring.
    pub fn snapshot(&self) -> Value {
        match self {
            Arg::Json(value) => value.clone(),
            Arg::Bytes(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
            Arg::Function(_) => Value::String(FUNCTION_PLACEHOLDER.to_string()),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Arg::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Arg::Function(_) => f.write_str("Function"),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Json(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Json(Value::String(value.to_string()))
    }
}

impl From<Vec<u8>> for Arg {
    fn from(bytes: Vec<u8>) -> Self {
        Arg::Bytes(bytes)
    }
}

/// `String(value)` for the JSON subset of JavaScript values.
pub fn js_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => match number.as_f64() {
            Some(n) if number.is_f64() && n.fract() == 0.0 && n.abs() < 1e21 => format!("{n:.0}"),
            _ => number.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
        other => other.to_string(),
    }
}

/// JavaScript truthiness for JSON values.
pub fn js_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Positional argument access with JavaScript-style leniency: missing or
/// mistyped arguments read as `None`.
#[derive(Clone, Copy, Debug)]
pub struct CallArgs<'a>(&'a [Arg]);

impl<'a> CallArgs<'a> {
    pub fn new(args: &'a [Arg]) -> Self {
        Self(args)
    }

    pub fn get(&self, index: usize) -> Option<&'a Arg> {
        self.0.get(index)
    }

    pub fn json(&self, index: usize) -> Option<&'a Value> {
        self.get(index).and_then(Arg::as_json)
    }

    pub fn str(&self, index: usize) -> Option<&'a str> {
        self.get(index).and_then(Arg::as_str)
    }

    pub fn u64(&self, index: usize) -> Option<u64> {
        self.json(index).and_then(Value::as_u64)
    }

    pub fn function(&self, index: usize) -> Option<Callback> {
        match self.get(index) {
            Some(Arg::Function(f)) => Some(Rc::clone(f)),
            _ => None,
        }
    }

    /// Bytes from a `Uint8Array`, or from a JSON array of byte values.
    pub fn bytes(&self, index: usize) -> Option<Vec<u8>> {
        match self.get(index)? {
            Arg::Bytes(bytes) => Some(bytes.clone()),
            Arg::Json(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect(),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Value {
        Value::Array(self.0.iter().map(Arg::snapshot).collect())
    }
}

enum DeferredState {
    Pending,
    Settled(Result<Value, ShimError>),
    Taken,
}

/// Handle to an asynchronous reply. Settles on a later `Page::tick`.
#[derive(Clone)]
pub struct Deferred(Rc<RefCell<DeferredState>>);

impl Deferred {
    pub(crate) fn pending() -> Self {
        Deferred(Rc::new(RefCell::new(DeferredState::Pending)))
    }

    pub(crate) fn settle(&self, result: Result<Value, ShimError>) {
        let mut state = self.0.borrow_mut();
        if matches!(*state, DeferredState::Pending) {
            *state = DeferredState::Settled(result);
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(*self.0.borrow(), DeferredState::Pending)
    }

    /// Take the settled outcome. `None` while pending or once taken.
    pub fn take(&self) -> Option<Result<Value, ShimError>> {
        let mut state = self.0.borrow_mut();
        match std::mem::replace(&mut *state, DeferredState::Taken) {
            DeferredState::Settled(result) => Some(result),
            DeferredState::Pending => {
                *state = DeferredState::Pending;
                None
            }
            DeferredState::Taken => None,
        }
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match *self.0.borrow() {
            DeferredState::Pending => "pending",
            DeferredState::Settled(Ok(_)) => "resolved",
            DeferredState::Settled(Err(_)) => "rejected",
            DeferredState::Taken => "taken",
        };
        f.debug_tuple("Deferred").field(&label).finish()
    }
}

#[derive(Clone, Debug)]
pub enum Reply {
    Undefined,
    Json(Value),
    Bytes(Vec<u8>),
    Deferred(Deferred),
}

impl Reply {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Reply::Undefined)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Reply::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Reply::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_deferred(&self) -> Option<&Deferred> {
        match self {
            Reply::Deferred(deferred) => Some(deferred),
            _ => None,
        }
    }

    /// Serializable view; `undefined` reads as `null`.
    pub fn snapshot(&self) -> Value {
        match self {
            Reply::Undefined => Value::Null,
            Reply::Json(value) => value.clone(),
            Reply::Bytes(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
            Reply::Deferred(_) => Value::Null,
        }
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Json(value)
    }
}

impl From<bool> for Reply {
    fn from(value: bool) -> Self {
        Reply::Json(Value::Bool(value))
    }
}

impl From<String> for Reply {
    fn from(value: String) -> Self {
        Reply::Json(Value::String(value))
    }
}

impl<T: Into<Reply>> From<Option<T>> for Reply {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Reply::Json(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn js_string_matches_javascript_conversions() {
        assert_eq!(js_string(&json!("id")), "id");
        assert_eq!(js_string(&json!(7)), "7");
        assert_eq!(js_string(&json!(7.0)), "7");
        assert_eq!(js_string(&json!(2.5)), "2.5");
        assert_eq!(js_string(&json!(null)), "null");
        assert_eq!(js_string(&json!(true)), "true");
        assert_eq!(js_string(&json!([1, null, "a"])), "1,,a");
        assert_eq!(js_string(&json!({"a": 1})), "[object Object]");
    }

    #[test]
    fn truthiness_follows_javascript() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!js_truthy(&falsy), "{falsy}");
        }
        for truthy in [json!(3), json!("r1"), json!([]), json!({})] {
            assert!(js_truthy(&truthy), "{truthy}");
        }
    }

    #[test]
    fn snapshot_replaces_functions_with_placeholder() {
        let args = vec![
            Arg::from("label"),
            Arg::function(|_, _| {}),
            Arg::from(vec![1u8, 2]),
            Arg::from(json!({"k": true})),
        ];
        assert_eq!(
            CallArgs::new(&args).snapshot(),
            json!(["label", "[Function]", [1, 2], {"k": true}])
        );
    }

    #[test]
    fn bytes_accept_json_byte_arrays_only() {
        let args = vec![
            Arg::from(json!([104, 105])),
            Arg::from(json!([300])),
            Arg::from("hi"),
        ];
        let args = CallArgs::new(&args);
        assert_eq!(args.bytes(0), Some(b"hi".to_vec()));
        assert_eq!(args.bytes(1), None);
        assert_eq!(args.bytes(2), None);
        assert_eq!(args.bytes(9), None);
    }

    #[test]
    fn deferred_settles_once_and_is_taken_once() {
        let deferred = Deferred::pending();
        assert!(!deferred.is_settled());
        assert!(deferred.take().is_none());
        assert!(!deferred.is_settled());

        deferred.settle(Ok(json!(1)));
        deferred.settle(Ok(json!(2)));
        assert!(deferred.is_settled());
        assert_eq!(format!("{deferred:?}"), "Deferred(\"resolved\")");
        assert_eq!(deferred.take(), Some(Ok(json!(1))));
        assert_eq!(deferred.take(), None);
    }
}
