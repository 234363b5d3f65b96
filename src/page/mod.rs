//! The embedding web page, modelled as plain data.
//!
//! `Page` bundles everything the shim may touch in a browser: the document,
//! local storage, the clipboard, navigator strings, the console, the timer
//! loop, blob URLs, opened windows and the global scope. Capability handlers
//! receive `&mut Page` and nothing else.

pub mod clipboard;
pub mod console;
pub mod dom;
pub mod timers;

pub use clipboard::{Clipboard, Permission};
pub use console::{Console, ConsoleEntry, ConsoleLevel};
pub use dom::{Document, Listener, NodeId, ReadyState, Style};
pub use timers::{Task, TimerId, Timers};

use crate::dispatch::FocusAny;
use crate::storage::{KeyValueStorage, MemoryStorage};
use std::collections::BTreeMap;
use std::rc::Rc;

const BLOB_URL_PREFIX: &str = "blob:focusany-shim/";

/// `navigator` fields the environment queries read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Navigator {
    pub platform: String,
    pub user_agent: String,
    /// Result of `matchMedia("(prefers-color-scheme: dark)")`.
    pub prefers_dark: bool,
}

impl Navigator {
    pub fn mac() -> Self {
        Self {
            platform: "MacIntel".into(),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36".into(),
            prefers_dark: false,
        }
    }

    pub fn windows() -> Self {
        Self {
            platform: "Win32".into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36".into(),
            prefers_dark: false,
        }
    }

    pub fn linux() -> Self {
        Self {
            platform: "Linux x86_64".into(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36".into(),
            prefers_dark: false,
        }
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::linux()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Object URLs created with `URL.createObjectURL`.
#[derive(Debug, Default)]
pub struct BlobStore {
    next: u64,
    live: BTreeMap<String, Blob>,
}

impl BlobStore {
    pub fn create_object_url(&mut self, blob: Blob) -> String {
        self.next += 1;
        let url = format!("{BLOB_URL_PREFIX}{}", self.next);
        self.live.insert(url.clone(), blob);
        url
    }

    pub fn revoke_object_url(&mut self, url: &str) -> bool {
        self.live.remove(url).is_some()
    }

    pub fn get(&self, url: &str) -> Option<&Blob> {
        self.live.get(url)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

/// A file the browser handed to the user through a download anchor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Download {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

pub struct Page {
    pub document: Document,
    pub storage: Box<dyn KeyValueStorage>,
    pub clipboard: Clipboard,
    pub navigator: Navigator,
    pub console: Console,
    pub timers: Timers,
    pub blobs: BlobStore,
    /// `window.innerHeight`.
    pub viewport_height: u32,
    opened_windows: Vec<String>,
    downloads: Vec<Download>,
    ready_tasks: Vec<Task>,
    globals: BTreeMap<String, Rc<FocusAny>>,
}

impl Default for Page {
    fn default() -> Self {
        Self::with_storage(Box::new(MemoryStorage::default()))
    }
}

impl Page {
    pub fn with_storage(storage: Box<dyn KeyValueStorage>) -> Self {
        Self {
            document: Document::default(),
            storage,
            clipboard: Clipboard::default(),
            navigator: Navigator::default(),
            console: Console::default(),
            timers: Timers::default(),
            blobs: BlobStore::default(),
            viewport_height: 600,
            opened_windows: Vec::new(),
            downloads: Vec::new(),
            ready_tasks: Vec::new(),
            globals: BTreeMap::new(),
        }
    }

    /// A page whose document is still parsing; `DOMContentLoaded` fires on
    /// [`Page::finish_loading`].
    pub fn loading() -> Self {
        Self {
            document: Document::loading(),
            ..Self::default()
        }
    }

    pub fn global(&self, name: &str) -> Option<Rc<FocusAny>> {
        self.globals.get(name).cloned()
    }

    pub(crate) fn set_global(&mut self, name: &str, value: Rc<FocusAny>) {
        self.globals.insert(name.to_string(), value);
    }

    /// Run every timer due within the next `ms` milliseconds.
    pub fn advance(&mut self, ms: u64) {
        let until = self.timers.now_ms().saturating_add(ms);
        while let Some(task) = self.timers.pop_due(until) {
            task(self);
        }
        self.timers.settle_clock(until);
    }

    /// One event-loop turn: run everything already due.
    pub fn tick(&mut self) {
        self.advance(0);
    }

    pub fn on_dom_content_loaded(&mut self, task: Task) {
        match self.document.ready_state() {
            ReadyState::Loading => self.ready_tasks.push(task),
            ReadyState::Complete => task(self),
        }
    }

    pub fn finish_loading(&mut self) {
        if self.document.ready_state() == ReadyState::Complete {
            return;
        }
        self.document.set_ready_state(ReadyState::Complete);
        for task in std::mem::take(&mut self.ready_tasks) {
            task(self);
        }
    }

    /// Fire `event` on `node`, then run the default action for clicks on
    /// download anchors.
    pub fn dispatch_event(&mut self, node: NodeId, event: &str) {
        for listener in self.document.listeners(node, event) {
            listener(self);
        }
        if event == "click" && self.document.tag(node) == "a" {
            self.follow_anchor(node);
        }
    }

    pub fn click(&mut self, node: NodeId) {
        self.dispatch_event(node, "click");
    }

    /// `window.open(url, "_blank")`.
    pub fn open_window(&mut self, url: &str) {
        tracing::debug!(url, "window.open");
        self.opened_windows.push(url.to_string());
    }

    pub fn opened_windows(&self) -> &[String] {
        &self.opened_windows
    }

    pub fn downloads(&self) -> &[Download] {
        &self.downloads
    }

    fn follow_anchor(&mut self, anchor: NodeId) {
        let Some(href) = self.document.attribute(anchor, "href").map(str::to_string) else {
            return;
        };
        let Some(filename) = self.document.attribute(anchor, "download").map(str::to_string)
        else {
            self.open_window(&href);
            return;
        };
        match self.blobs.get(&href) {
            Some(blob) => {
                let download = Download {
                    filename,
                    mime: blob.mime.clone(),
                    bytes: blob.bytes.clone(),
                };
                self.downloads.push(download);
            }
            None => self
                .console
                .warn(format!("download of {filename} failed: {href} is not a live object URL")),
        }
    }
}
