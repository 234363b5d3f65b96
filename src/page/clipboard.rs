//! Async Clipboard API as seen from the page: text only, permission gated.

use crate::error::ShimError;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Permission {
    #[default]
    Granted,
    Denied,
}

#[derive(Debug, Default)]
pub struct Clipboard {
    permission: Permission,
    text: String,
}

impl Clipboard {
    pub fn denied() -> Self {
        Self {
            permission: Permission::Denied,
            text: String::new(),
        }
    }

    pub fn write_text(&mut self, text: &str) -> Result<(), ShimError> {
        self.check("copyText")?;
        self.text = text.to_string();
        Ok(())
    }

    pub fn read_text(&self) -> Result<&str, ShimError> {
        self.check("getClipboardText")?;
        Ok(&self.text)
    }

    fn check(&self, capability: &str) -> Result<(), ShimError> {
        match self.permission {
            Permission::Granted => Ok(()),
            Permission::Denied => Err(ShimError::PermissionDenied {
                capability: capability.to_string(),
            }),
        }
    }
}
