//! Error types for the brochure editor core.

use thiserror::Error;

/// Result type alias for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur during editor operations.
#[derive(Error, Debug)]
pub enum EditorError {
    /// HTTP transport error talking to the backend.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-2xx response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Session id unknown to every load source.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Backend rejected an AI edit because the session's edit budget is spent.
    #[error("AI edit limit reached for this session")]
    EditLimitReached,

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Page id not present in the document.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Element id not present on the page.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Element is locked; delete/drag refused.
    #[error("Element is locked: {0}")]
    ElementLocked(String),

    /// Paste attempted with an empty clipboard.
    #[error("Clipboard is empty")]
    EmptyClipboard,

    /// Operation needs an active page and none is selected.
    #[error("No active page")]
    NoActivePage,

    /// Undo attempted at the bottom of the history stack.
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Redo attempted at the head of the history stack.
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Requested layout is not legal for the page's type.
    #[error("Layout {layout} is not available for {page_type} pages")]
    IllegalLayout { page_type: String, layout: String },
}

impl EditorError {
    /// Creates an Api error from a status code and body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a SessionNotFound error.
    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound(id.into())
    }

    /// Creates a PageNotFound error.
    pub fn page_not_found(id: impl Into<String>) -> Self {
        Self::PageNotFound(id.into())
    }

    /// Creates an ElementNotFound error.
    pub fn element_not_found(id: impl Into<String>) -> Self {
        Self::ElementNotFound(id.into())
    }

    /// Creates an ElementLocked error.
    pub fn element_locked(id: impl Into<String>) -> Self {
        Self::ElementLocked(id.into())
    }

    /// Creates an IllegalLayout error.
    pub fn illegal_layout(page_type: impl Into<String>, layout: impl Into<String>) -> Self {
        Self::IllegalLayout {
            page_type: page_type.into(),
            layout: layout.into(),
        }
    }

    /// True for the user-conflict family: refused with a transient notice,
    /// no mutation and no history entry.
    pub fn is_user_conflict(&self) -> bool {
        matches!(
            self,
            Self::ElementLocked(_)
                | Self::EmptyClipboard
                | Self::NoActivePage
                | Self::NothingToUndo
                | Self::NothingToRedo
                | Self::IllegalLayout { .. }
        )
    }
}
