//! Clipboard seam.

use std::sync::Mutex;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Somewhere copied text can go. The terminal front-end backs this with
/// the system clipboard.
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Keeps the last copied text in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last copied text.
    pub fn contents(&self) -> Option<String> {
        self.text.lock().ok().and_then(|text| text.clone())
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut slot = self
            .text
            .lock()
            .map_err(|e| ClipboardError(e.to_string()))?;
        *slot = Some(text.to_string());
        Ok(())
    }
}
