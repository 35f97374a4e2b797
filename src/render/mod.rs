//! Render/sync engine.
//!
//! Rendering projects a [`crate::document::Page`] into a [`DomNode`] tree;
//! extraction is the inverse, reading editable regions back into the page's
//! content map. Rendering is a pure function of the page's type, layout,
//! photos, content and the photo URL map: identical inputs always produce
//! an identical tree, which is what undo-restore fidelity depends on.

mod dom;
mod engine;

pub use dom::{DomNode, FIELD_ATTR};
pub use engine::{
    effective_layout, extract_into_document, render_document, render_page, NoopHandlers,
    PhotoHandlers, RenderedPage,
};
