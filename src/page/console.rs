//! Page console: the side channel embedding applications inspect.
//!
//! Every entry is kept for later inspection and forwarded to `tracing`.

use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ConsoleEntry {
    pub level: ConsoleLevel,
    pub message: String,
}

#[derive(Default, Debug)]
pub struct Console {
    entries: Vec<ConsoleEntry>,
}

impl Console {
    pub fn log(&mut self, message: impl Into<String>) {
        self.push(ConsoleLevel::Log, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ConsoleLevel::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(ConsoleLevel::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ConsoleLevel::Error, message.into());
    }

    pub fn entries(&self) -> &[ConsoleEntry] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| entry.level == ConsoleLevel::Error)
            .map(|entry| entry.message.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn push(&mut self, level: ConsoleLevel, message: String) {
        match level {
            ConsoleLevel::Log | ConsoleLevel::Info => {
                tracing::info!(target: "focusany_shim::console", "{message}")
            }
            ConsoleLevel::Warn => tracing::warn!(target: "focusany_shim::console", "{message}"),
            ConsoleLevel::Error => tracing::error!(target: "focusany_shim::console", "{message}"),
        }
        self.entries.push(ConsoleEntry { level, message });
    }
}
