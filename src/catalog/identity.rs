use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Versioned key for a host API catalog (e.g., `focusany_host_api_v1`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogKey(pub String);

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host feature area a capability belongs to.
///
/// Known variants keep serialization consistent; `Other` preserves forward
/// compatibility with catalogs that introduce new categories.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CapabilityCategory {
    Lifecycle,
    Hotkey,
    Window,
    Plugin,
    Action,
    Environment,
    Account,
    Payment,
    Network,
    Notification,
    Dialog,
    System,
    Clipboard,
    Shell,
    Simulate,
    Llm,
    Logging,
    Launch,
    File,
    Storage,
    Util,
    Other(String),
}

/// How the web shim provides a capability.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Approximated with a browser primitive (DOM, clipboard, navigator...).
    Page,
    /// Backed by the local persistence adapter.
    Storage,
    /// No browser equivalent; answers with a fixed mock value.
    Stub,
}

impl Policy {
    pub fn as_str(self) -> &'static str {
        match self {
            Policy::Page => "page",
            Policy::Storage => "storage",
            Policy::Stub => "stub",
        }
    }

    pub fn is_implemented(self) -> bool {
        matches!(self, Policy::Page | Policy::Storage)
    }
}

impl Serialize for CapabilityCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CapabilityCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_str(&value))
    }
}

impl CapabilityCategory {
    pub fn as_str(&self) -> &str {
        match self {
            CapabilityCategory::Lifecycle => "lifecycle",
            CapabilityCategory::Hotkey => "hotkey",
            CapabilityCategory::Window => "window",
            CapabilityCategory::Plugin => "plugin",
            CapabilityCategory::Action => "action",
            CapabilityCategory::Environment => "environment",
            CapabilityCategory::Account => "account",
            CapabilityCategory::Payment => "payment",
            CapabilityCategory::Network => "network",
            CapabilityCategory::Notification => "notification",
            CapabilityCategory::Dialog => "dialog",
            CapabilityCategory::System => "system",
            CapabilityCategory::Clipboard => "clipboard",
            CapabilityCategory::Shell => "shell",
            CapabilityCategory::Simulate => "simulate",
            CapabilityCategory::Llm => "llm",
            CapabilityCategory::Logging => "logging",
            CapabilityCategory::Launch => "launch",
            CapabilityCategory::File => "file",
            CapabilityCategory::Storage => "storage",
            CapabilityCategory::Util => "util",
            CapabilityCategory::Other(value) => value.as_str(),
        }
    }

    fn from_str(value: &str) -> Self {
        match value {
            "lifecycle" => CapabilityCategory::Lifecycle,
            "hotkey" => CapabilityCategory::Hotkey,
            "window" => CapabilityCategory::Window,
            "plugin" => CapabilityCategory::Plugin,
            "action" => CapabilityCategory::Action,
            "environment" => CapabilityCategory::Environment,
            "account" => CapabilityCategory::Account,
            "payment" => CapabilityCategory::Payment,
            "network" => CapabilityCategory::Network,
            "notification" => CapabilityCategory::Notification,
            "dialog" => CapabilityCategory::Dialog,
            "system" => CapabilityCategory::System,
            "clipboard" => CapabilityCategory::Clipboard,
            "shell" => CapabilityCategory::Shell,
            "simulate" => CapabilityCategory::Simulate,
            "llm" => CapabilityCategory::Llm,
            "logging" => CapabilityCategory::Logging,
            "launch" => CapabilityCategory::Launch,
            "file" => CapabilityCategory::File,
            "storage" => CapabilityCategory::Storage,
            "util" => CapabilityCategory::Util,
            other => CapabilityCategory::Other(other.to_string()),
        }
    }
}
