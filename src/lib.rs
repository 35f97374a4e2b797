//! Prospekt - Client-side editing engine for property brochures.
//!
//! This crate is the state core behind a browser brochure editor. It owns
//! the document model, a bounded snapshot history, free-floating design
//! elements, snap-to-guide alignment, deterministic page rendering, and
//! the session lifecycle against the brochure backend:
//!
//! - **Single source of truth**: every mutation flows through an owned
//!   [`Editor`] session, so there is no ambient global state
//! - **Atomic undo**: each user action records exactly one full snapshot,
//!   tagged structural or content so restore knows how much DOM to rebuild
//! - **Degrade, never block**: session loads and AI generation run under
//!   hard deadlines and fall back to defaults instead of spinners
//!
//! # Example
//!
//! ```rust
//! use prospekt::{Document, Editor, Page, PageType, Preferences};
//!
//! let mut document = Document::new();
//! document.pages.push(Page::new("cover", PageType::Cover).with_title("The Old Rectory"));
//!
//! let mut editor = Editor::new(document, Preferences::default());
//! editor.initialize();
//!
//! // Edits reconcile into the model and are individually undoable.
//! editor.edit_region("cover", "title", "The New Rectory").unwrap();
//! assert!(editor.is_dirty() && editor.can_undo());
//! ```

pub mod document;
pub mod editor;
pub mod element;
pub mod error;
pub mod history;
pub mod render;
pub mod session;
pub mod snap;

// Re-exports for convenience
pub use document::{
    available_layouts, arrange_photos, AgentDetails, Document, Page, PageLayout, PageType, Photo,
    Preferences, PropertyDetails, Stacking,
};
pub use editor::{Editor, EditorSnapshot};
pub use element::{DesignElement, ElementKind, ElementManager, ElementStyle, Point, Size};
pub use error::{EditorError, EditorResult};
pub use history::{ChangeClass, History, HistoryEntry, HISTORY_LIMIT};
pub use render::{render_document, render_page, DomNode, PhotoHandlers, RenderedPage};
pub use session::{AutoSave, LoadOptions, LoadSource, SessionCache, SessionClient};
pub use snap::{compute_snap, Guide, SnapConfig, SnapResult, SNAP_THRESHOLD};
