//! Free-floating design elements layered on a page canvas.
//!
//! Elements (shapes, icons, QR codes) are independent of page content
//! fields: they live in a per-page map owned by [`ElementManager`] together
//! with the paint order, the current selection and the single-slot
//! clipboard.

mod manager;
mod model;

pub use manager::{ClipboardEntry, ElementManager};
pub use model::{DesignElement, ElementId, ElementKind, ElementStyle, Point, Size};
