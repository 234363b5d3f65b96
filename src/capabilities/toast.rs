//! Toast overlay for `showToast` and `showNotification`.
//!
//! Toasts stack inside a fixed top-right container that is created on first
//! use and removed again when its last toast leaves. Each toast slides in
//! after [`ENTER_DELAY_MS`], auto-dismisses after its duration (unless the
//! duration is zero) and can be closed early with its `×` button.

use crate::catalog::Bindings;
use crate::config::ShimConfig;
use crate::page::{Listener, NodeId, Page};
use crate::value::{CallArgs, Reply};
use serde_json::Value;
use std::rc::Rc;

use super::text_arg;

pub const CONTAINER_ID: &str = "focusany-shim-toast-container";
pub const ENTER_DELAY_MS: u64 = 10;
pub const EXIT_DELAY_MS: u64 = 300;

const HIDDEN_TRANSFORM: &str = "translateX(350px)";
const SHOWN_TRANSFORM: &str = "translateX(0)";

const CONTAINER_CSS: &str = r#"
    position: fixed !important;
    top: 20px !important;
    right: 20px !important;
    z-index: 999999 !important;
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif !important;
    pointer-events: none !important;
    max-width: 350px !important;
    width: auto !important;
"#;

const CONTENT_CSS: &str = "display: flex !important; align-items: center !important; gap: 8px !important;";

const ICON_CSS: &str = r#"
    font-size: 16px !important;
    line-height: 1 !important;
    flex-shrink: 0 !important;
    padding: 4px 6px !important;
    border-radius: 4px !important;
    display: inline-flex !important;
    align-items: center !important;
    justify-content: center !important;
"#;

const CLOSE_CSS: &str = r#"
    position: absolute !important;
    top: 50% !important;
    right: 8px !important;
    transform: translateY(-50%) !important;
    font-size: 16px !important;
    font-weight: bold !important;
    cursor: pointer !important;
    color: rgba(255, 255, 255, 0.8) !important;
    width: 20px !important;
    height: 20px !important;
    border-radius: 50% !important;
    background-color: rgba(255, 255, 255, 0.1) !important;
    transition: all 0.2s ease !important;
"#;

const SVG_ATTRS: &str = r#"xmlns="http://www.w3.org/2000/svg" width="16" height="16" viewBox="0 0 16 16" fill="currentColor""#;
const SVG_RING: &str = r#"<circle cx="8" cy="8" r="7" fill="rgba(255,255,255,0.15)" stroke="currentColor" stroke-width="1"/>"#;

pub(crate) fn register(bindings: &mut Bindings) {
    bindings.insert("showToast", show_toast_handler);
    bindings.insert("showNotification", show_notification_handler);
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ToastStatus {
    #[default]
    Info,
    Success,
    Error,
}

impl ToastStatus {
    /// Unknown or missing statuses fall back to `Info`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("success") => ToastStatus::Success,
            Some("error") => ToastStatus::Error,
            _ => ToastStatus::Info,
        }
    }

    pub fn background(self) -> &'static str {
        match self {
            ToastStatus::Info => "#1890ff",
            ToastStatus::Success => "#52c41a",
            ToastStatus::Error => "#ff4d4f",
        }
    }

    fn icon_svg(self) -> String {
        let glyph = match self {
            ToastStatus::Info => {
                r#"<path d="M8 4a.5.5 0 0 1 .5.5v3a.5.5 0 0 1-1 0v-3A.5.5 0 0 1 8 4zM8 11a.75.75 0 1 1 0-1.5.75.75 0 0 1 0 1.5z"/>"#
            }
            ToastStatus::Success => {
                r#"<path d="M10.854 5.146a.5.5 0 0 1 0 .708l-3 3a.5.5 0 0 1-.708 0l-1.5-1.5a.5.5 0 1 1 .708-.708L7.5 7.793l2.646-2.647a.5.5 0 0 1 .708 0z"/>"#
            }
            ToastStatus::Error => {
                r#"<path d="M5.354 4.646a.5.5 0 1 0-.708.708L7.293 8l-2.647 2.646a.5.5 0 0 0 .708.708L8 8.707l2.646 2.647a.5.5 0 0 0 .708-.708L8.707 8l2.647-2.646a.5.5 0 0 0-.708-.708L8 7.293 5.354 4.646z"/>"#
            }
        };
        format!("<svg {SVG_ATTRS}>{SVG_RING}{glyph}</svg>")
    }
}

fn toast_css(status: ToastStatus) -> String {
    format!(
        r#"
        background: {} !important;
        color: #ffffff !important;
        padding: 12px 30px 12px 16px !important;
        margin-bottom: 10px !important;
        border-radius: 6px !important;
        box-shadow: 0 4px 12px rgba(0, 0, 0, 0.3) !important;
        font-size: 14px !important;
        line-height: 1.4 !important;
        max-width: 320px !important;
        word-wrap: break-word !important;
        opacity: 0 !important;
        transform: {HIDDEN_TRANSFORM} !important;
        transition: all 0.3s ease !important;
        pointer-events: auto !important;
        position: relative !important;
        box-sizing: border-box !important;
        "#,
        status.background()
    )
}

/// Show a toast and return its node. A zero duration never auto-dismisses.
pub fn show_toast(page: &mut Page, body: &str, duration_ms: u64, status: ToastStatus) -> NodeId {
    let container = toast_container(page);
    let doc = &mut page.document;

    let toast = doc.create_element("div");
    doc.set_css_text(toast, &toast_css(status));

    let content = doc.create_element("div");
    doc.set_css_text(content, CONTENT_CSS);
    let icon = doc.create_element("span");
    doc.set_inner_html(icon, &status.icon_svg());
    doc.set_css_text(icon, ICON_CSS);
    let text = doc.create_element("span");
    doc.set_text_content(text, body);
    doc.set_css_text(text, "flex: 1 !important;");
    doc.append_child(content, icon);
    doc.append_child(content, text);
    doc.append_child(toast, content);

    let close = doc.create_element("span");
    doc.set_text_content(close, "×");
    doc.set_css_text(close, CLOSE_CSS);
    add_listener(page, close, "mouseenter", move |page| {
        if let Some(style) = page.document.style_mut(close) {
            style.set_property("color", "#ffffff", true);
            style.set_property("background-color", "rgba(255, 255, 255, 0.2)", true);
            style.set_property("transform", "translateY(-50%) scale(1.1)", true);
        }
    });
    add_listener(page, close, "mouseleave", move |page| {
        if let Some(style) = page.document.style_mut(close) {
            style.set_property("color", "rgba(255, 255, 255, 0.8)", true);
            style.set_property("background-color", "rgba(255, 255, 255, 0.1)", true);
            style.set_property("transform", "translateY(-50%) scale(1)", true);
        }
    });
    add_listener(page, close, "click", move |page| {
        dismiss_toast(page, toast);
    });
    page.document.append_child(toast, close);
    page.document.append_child(container, toast);

    page.timers.set_timeout(
        ENTER_DELAY_MS,
        Box::new(move |page: &mut Page| {
            if let Some(style) = page.document.style_mut(toast) {
                style.set_property("opacity", "1", true);
                style.set_property("transform", SHOWN_TRANSFORM, true);
            }
        }),
    );
    if duration_ms > 0 {
        page.timers.set_timeout(
            duration_ms,
            Box::new(move |page: &mut Page| {
                dismiss_toast(page, toast);
            }),
        );
    }
    tracing::debug!(?status, duration_ms, "toast shown");
    toast
}

/// Start the exit animation and remove the toast after [`EXIT_DELAY_MS`].
/// Returns false when the toast is already gone.
pub fn dismiss_toast(page: &mut Page, toast: NodeId) -> bool {
    if page.document.parent(toast).is_none() {
        return false;
    }
    if let Some(style) = page.document.style_mut(toast) {
        style.set_property("opacity", "0", true);
        style.set_property("transform", HIDDEN_TRANSFORM, true);
    }
    page.timers.set_timeout(
        EXIT_DELAY_MS,
        Box::new(move |page: &mut Page| {
            let container = page.document.parent(toast);
            page.document.remove(toast);
            if let Some(container) = container {
                if page.document.children(container).is_empty() {
                    page.document.remove(container);
                }
            }
        }),
    );
    true
}

fn toast_container(page: &mut Page) -> NodeId {
    if let Some(existing) = page.document.get_element_by_id(CONTAINER_ID) {
        return existing;
    }
    let doc = &mut page.document;
    let container = doc.create_element("div");
    doc.set_id(container, CONTAINER_ID);
    doc.set_css_text(container, CONTAINER_CSS);
    let body = doc.body();
    doc.append_child(body, container);
    container
}

fn add_listener(page: &mut Page, node: NodeId, event: &str, f: impl Fn(&mut Page) + 'static) {
    let listener: Listener = Rc::new(f);
    page.document.add_event_listener(node, event, listener);
}

/// `options.duration` when it is a non-negative number.
fn duration_option(options: Option<&Value>) -> Option<u64> {
    let duration = options?.get("duration")?.as_f64()?;
    (duration >= 0.0 && duration.is_finite()).then_some(duration as u64)
}

fn show_toast_handler(page: &mut Page, args: CallArgs<'_>, config: &ShimConfig) -> Reply {
    let options = args.json(1);
    let duration = duration_option(options).unwrap_or(config.toast_duration_ms);
    let status = ToastStatus::parse(options.and_then(|o| o.get("status")).and_then(Value::as_str));
    show_toast(page, &text_arg(args, 0), duration, status);
    Reply::Undefined
}

fn show_notification_handler(page: &mut Page, args: CallArgs<'_>, config: &ShimConfig) -> Reply {
    show_toast(
        page,
        &text_arg(args, 0),
        config.notification_duration_ms,
        ToastStatus::Info,
    );
    Reply::Undefined
}
