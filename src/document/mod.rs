//! Document model: the in-memory representation of one brochure.
//!
//! A [`Document`] owns property/agent metadata, the ordered photo
//! collection and the ordered page list. Page type and layout are closed
//! enums; which layouts a page may use is a function of its type and photo
//! count, and photo placement inside a layout is a deterministic function
//! of photo count plus the per-page stacking preference.

mod model;

pub use model::{
    arrange_photos, available_layouts, new_id, AgentDetails, Document, Page, PageId, PageLayout,
    PageType, Photo, PhotoId, Preferences, PropertyDetails, Stacking,
};
