//! Environment queries, lifecycle, clipboard, shell, window and logging
//! capabilities answered from the page.

use super::{LOG_PREFIX, text_arg};
use crate::catalog::Bindings;
use crate::config::ShimConfig;
use crate::page::Page;
use crate::value::{Arg, CallArgs, Reply};
use serde_json::{Value, json};

pub(crate) fn register(bindings: &mut Bindings) {
    bindings.insert("onPluginReady", on_plugin_ready);
    bindings.insert("isDarkColors", is_dark_colors);
    bindings.insert("isMacOs", is_mac_os);
    bindings.insert("isWindows", is_windows);
    bindings.insert("isLinux", is_linux);
    bindings.insert("copyText", copy_text);
    bindings.insert("getClipboardText", get_clipboard_text);
    bindings.insert("shellOpenExternal", shell_open_external);
    bindings.insert("logInfo", log_info);
    bindings.insert("logError", log_error);
    bindings.insert("view.getHeight", view_get_height);
    bindings.insert("detach.setTitle", detach_set_title);
}

/// What a plugin launched outside the host receives: no action, no match.
pub fn empty_launch_payload() -> Value {
    json!({
        "actionName": "",
        "actionMatch": null,
        "actionMatchFiles": [],
        "requestId": "",
        "reenter": false,
        "isView": false,
    })
}

fn on_plugin_ready(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let Some(callback) = args.function(0) else {
        tracing::warn!("onPluginReady called without a callback");
        return Reply::Undefined;
    };
    page.on_dom_content_loaded(Box::new(move |page| callback(page, empty_launch_payload())));
    Reply::Undefined
}

/// `navigator.platform`, or the user agent when the platform is blank.
fn platform_contains(page: &Page, needle: &str) -> bool {
    let navigator = &page.navigator;
    let source = if navigator.platform.trim().is_empty() {
        &navigator.user_agent
    } else {
        &navigator.platform
    };
    source.to_ascii_lowercase().contains(needle)
}

fn is_mac_os(page: &mut Page, _: CallArgs<'_>, _: &ShimConfig) -> Reply {
    platform_contains(page, "mac").into()
}

fn is_windows(page: &mut Page, _: CallArgs<'_>, _: &ShimConfig) -> Reply {
    platform_contains(page, "win").into()
}

fn is_linux(page: &mut Page, _: CallArgs<'_>, _: &ShimConfig) -> Reply {
    platform_contains(page, "linux").into()
}

fn is_dark_colors(page: &mut Page, _: CallArgs<'_>, _: &ShimConfig) -> Reply {
    page.navigator.prefers_dark.into()
}

fn copy_text(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let text = text_arg(args, 0);
    match page.clipboard.write_text(&text) {
        Ok(()) => true.into(),
        Err(err) => {
            page.console.error(format!("{LOG_PREFIX}: {err}"));
            false.into()
        }
    }
}

fn get_clipboard_text(page: &mut Page, _: CallArgs<'_>, _: &ShimConfig) -> Reply {
    match page.clipboard.read_text() {
        Ok(text) => text.to_string().into(),
        Err(err) => {
            page.console.error(format!("{LOG_PREFIX}: {err}"));
            String::new().into()
        }
    }
}

fn shell_open_external(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let url = text_arg(args, 0);
    if url.is_empty() {
        tracing::warn!("shellOpenExternal called without a url");
        return Reply::Undefined;
    }
    page.open_window(&url);
    Reply::Undefined
}

/// Space-joined console rendering of every argument.
fn log_line(args: CallArgs<'_>) -> String {
    let mut parts = Vec::new();
    let mut index = 0;
    while let Some(arg) = args.get(index) {
        parts.push(match arg {
            Arg::Json(Value::String(text)) => text.clone(),
            other => other.snapshot().to_string(),
        });
        index += 1;
    }
    parts.join(" ")
}

fn log_info(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    page.console.info(log_line(args));
    Reply::Undefined
}

fn log_error(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    page.console.error(log_line(args));
    Reply::Undefined
}

fn view_get_height(page: &mut Page, _: CallArgs<'_>, _: &ShimConfig) -> Reply {
    Value::from(page.viewport_height).into()
}

fn detach_set_title(page: &mut Page, args: CallArgs<'_>, _: &ShimConfig) -> Reply {
    let title = text_arg(args, 0);
    page.document.set_title(&title);
    Reply::Undefined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Clipboard, ConsoleLevel, Navigator};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn call(
        handler: fn(&mut Page, CallArgs<'_>, &ShimConfig) -> Reply,
        page: &mut Page,
        args: &[Arg],
    ) -> Reply {
        handler(page, CallArgs::new(args), &ShimConfig::default())
    }

    #[test]
    fn platform_checks_read_navigator() {
        let mut page = Page::default();
        page.navigator = Navigator::mac();
        assert_eq!(call(is_mac_os, &mut page, &[]).as_json(), Some(&json!(true)));
        assert_eq!(call(is_windows, &mut page, &[]).as_json(), Some(&json!(false)));

        page.navigator = Navigator::windows();
        assert_eq!(call(is_windows, &mut page, &[]).as_json(), Some(&json!(true)));

        page.navigator.platform.clear();
        page.navigator.user_agent = "Mozilla/5.0 (X11; Linux x86_64)".into();
        assert_eq!(call(is_linux, &mut page, &[]).as_json(), Some(&json!(true)));

        page.navigator.prefers_dark = true;
        assert_eq!(call(is_dark_colors, &mut page, &[]).as_json(), Some(&json!(true)));
    }

    #[test]
    fn plugin_ready_waits_for_dom_content_loaded() {
        let mut page = Page::loading();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let args = [Arg::function(move |_, payload| sink.borrow_mut().push(payload))];
        assert!(call(on_plugin_ready, &mut page, &args).is_undefined());
        assert!(seen.borrow().is_empty());

        page.finish_loading();
        assert_eq!(seen.borrow().as_slice(), [empty_launch_payload()]);
    }

    #[test]
    fn clipboard_denial_is_logged_and_falsy() {
        let mut page = Page::default();
        assert_eq!(
            call(copy_text, &mut page, &[Arg::from("hello")]).as_json(),
            Some(&json!(true))
        );
        assert_eq!(
            call(get_clipboard_text, &mut page, &[]).as_json(),
            Some(&json!("hello"))
        );

        page.clipboard = Clipboard::denied();
        assert_eq!(
            call(copy_text, &mut page, &[Arg::from("x")]).as_json(),
            Some(&json!(false))
        );
        assert_eq!(call(get_clipboard_text, &mut page, &[]).as_json(), Some(&json!("")));
        assert_eq!(
            page.console.errors().next(),
            Some("FocusAny Shim: copyText() requires clipboard permission in web environment")
        );
    }

    #[test]
    fn shell_log_and_window_helpers_touch_the_page() {
        let mut page = Page::default();
        call(shell_open_external, &mut page, &[Arg::from("https://focusany.com")]);
        call(shell_open_external, &mut page, &[]);
        assert_eq!(page.opened_windows(), ["https://focusany.com".to_string()]);

        call(log_info, &mut page, &[Arg::from("saved"), Arg::from(json!({"n": 1}))]);
        let entry = page.console.entries().last().unwrap();
        assert_eq!(entry.level, ConsoleLevel::Info);
        assert_eq!(entry.message, r#"saved {"n":1}"#);

        call(detach_set_title, &mut page, &[Arg::from("Detached")]);
        assert_eq!(page.document.title(), "Detached");

        page.viewport_height = 720;
        assert_eq!(call(view_get_height, &mut page, &[]).as_json(), Some(&json!(720)));
    }
}
