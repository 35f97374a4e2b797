//! Data models for the brochure document.
//!
//! These structs mirror the JSON shape the backend session store persists
//! (`data: {property, agent, photos, pages}`); every field round-trips
//! through serde unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Page identifier. Ids are strings everywhere; no numeric ids cross any
/// boundary.
pub type PageId = String;

/// Photo identifier.
pub type PhotoId = String;

/// Generates a fresh unique id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// PAGE TYPE / LAYOUT ENUMS
// =============================================================================

/// The kind of brochure page. Closed set; rendering dispatches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageType {
    Cover,
    Overview,
    Details,
    Gallery,
    Location,
    Floorplan,
    Content,
}

impl PageType {
    /// Human-readable label for the page type.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cover => "Cover",
            Self::Overview => "Overview",
            Self::Details => "Details",
            Self::Gallery => "Gallery",
            Self::Location => "Location",
            Self::Floorplan => "Floor Plan",
            Self::Content => "Content",
        }
    }

    /// All variants in definition order.
    pub fn all() -> [Self; 7] {
        [
            Self::Cover,
            Self::Overview,
            Self::Details,
            Self::Gallery,
            Self::Location,
            Self::Floorplan,
            Self::Content,
        ]
    }

    /// Whether pages of this type carry an AI-generated description.
    pub fn wants_description(&self) -> bool {
        matches!(
            self,
            Self::Overview | Self::Details | Self::Location | Self::Content
        )
    }

    /// Canned description used when generation fails, times out or is
    /// skipped. A page must never end up permanently blank.
    pub fn default_description(&self) -> &'static str {
        match self {
            Self::Cover => "",
            Self::Overview => {
                "A well-presented property offering generous accommodation \
                 throughout, viewable by appointment."
            }
            Self::Details => {
                "The accommodation is arranged over well-proportioned rooms \
                 with natural light and practical storage."
            }
            Self::Gallery => "",
            Self::Location => {
                "Conveniently situated for local amenities, schools and \
                 transport links."
            }
            Self::Floorplan => "",
            Self::Content => {
                "This room offers flexible space to suit a range of uses."
            }
        }
    }
}

/// A named arrangement strategy for text and photos within a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageLayout {
    /// Fixed arrangement chosen by the renderer for the page type.
    Auto,
    PhotoLeft,
    PhotoRight,
    TextTop,
    TextBottom,
    PhotosOnly,
    Magazine,
    Hero,
    Mosaic,
}

impl PageLayout {
    /// Human-readable label for the layout.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::PhotoLeft => "Photo Left",
            Self::PhotoRight => "Photo Right",
            Self::TextTop => "Text Top",
            Self::TextBottom => "Text Bottom",
            Self::PhotosOnly => "Photos Only",
            Self::Magazine => "Magazine",
            Self::Hero => "Hero",
            Self::Mosaic => "Mosaic",
        }
    }

    /// All variants in definition order.
    pub fn all() -> [Self; 9] {
        [
            Self::Auto,
            Self::PhotoLeft,
            Self::PhotoRight,
            Self::TextTop,
            Self::TextBottom,
            Self::PhotosOnly,
            Self::Magazine,
            Self::Hero,
            Self::Mosaic,
        ]
    }
}

const AUTO_ONLY: &[PageLayout] = &[PageLayout::Auto];

const STANDARD_LAYOUTS: &[PageLayout] = &[
    PageLayout::Auto,
    PageLayout::PhotoLeft,
    PageLayout::PhotoRight,
    PageLayout::TextTop,
    PageLayout::TextBottom,
    PageLayout::PhotosOnly,
];

const CONTENT_LAYOUTS: &[PageLayout] = &[
    PageLayout::Auto,
    PageLayout::PhotoLeft,
    PageLayout::PhotoRight,
    PageLayout::TextTop,
    PageLayout::TextBottom,
    PageLayout::PhotosOnly,
    PageLayout::Magazine,
    PageLayout::Hero,
    PageLayout::Mosaic,
];

/// Returns the layouts a page of this type may use.
///
/// Cover and floor-plan pages are fixed-layout; a page with no photos only
/// offers `Auto` regardless of type; generic content pages additionally get
/// the magazine/hero/mosaic extras.
pub fn available_layouts(page_type: PageType, photo_count: usize) -> &'static [PageLayout] {
    if photo_count == 0 {
        return AUTO_ONLY;
    }
    match page_type {
        PageType::Cover | PageType::Floorplan => AUTO_ONLY,
        PageType::Content => CONTENT_LAYOUTS,
        _ => STANDARD_LAYOUTS,
    }
}

// =============================================================================
// STACKING
// =============================================================================

/// Per-page choice of photo sub-layout for a given photo count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stacking {
    /// Two photos on top, one below. Default for three photos.
    #[serde(rename = "2-1")]
    TwoOne,
    /// All three photos in a single row.
    #[serde(rename = "3-row")]
    Row,
    /// One photo on top, two below.
    #[serde(rename = "1-2")]
    OneTwo,
}

/// Splits `count` photos into rows, honouring the stacking preference where
/// it applies. Pure and total: every count yields the same rows for the
/// same inputs.
pub fn arrange_photos(count: usize, stacking: Option<Stacking>) -> Vec<usize> {
    match count {
        0 => Vec::new(),
        1 => vec![1],
        2 => vec![2],
        3 => match stacking.unwrap_or(Stacking::TwoOne) {
            Stacking::TwoOne => vec![2, 1],
            Stacking::Row => vec![3],
            Stacking::OneTwo => vec![1, 2],
        },
        4 => vec![2, 2],
        5 => vec![3, 2],
        6 => vec![3, 3],
        n => {
            let mut rows = Vec::with_capacity(n / 3 + 1);
            let mut left = n;
            while left > 0 {
                let row = left.min(3);
                rows.push(row);
                left -= row;
            }
            rows
        }
    }
}

// =============================================================================
// PROPERTY / AGENT
// =============================================================================

/// The property being marketed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PropertyDetails {
    pub address: String,
    pub price: String,
    pub property_type: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
}

/// The listing agent shown on the brochure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub branch: String,
}

// =============================================================================
// PHOTO
// =============================================================================

/// One uploaded property photo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Photo {
    pub id: PhotoId,
    pub name: String,
    /// Serving URL, filled in from the session's photo_urls map.
    pub url: Option<String>,
    /// Room categorization from backend photo analysis (e.g. "kitchen").
    pub room_type: Option<String>,
    /// Impact score assigned by the backend photo scorer (0..100).
    pub impact_score: Option<f64>,
}

impl Photo {
    /// Creates a new Photo with the given id and name.
    pub fn new(id: impl Into<PhotoId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: set the serving URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder: set the room categorization.
    pub fn with_room_type(mut self, room_type: impl Into<String>) -> Self {
        self.room_type = Some(room_type.into());
        self
    }

    /// Builder: set the impact score.
    pub fn with_impact_score(mut self, score: f64) -> Self {
        self.impact_score = Some(score);
        self
    }
}

// =============================================================================
// PAGE
// =============================================================================

/// One brochure sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Page {
    pub id: PageId,
    #[serde(rename = "type")]
    pub page_type: PageType,
    pub title: String,
    pub layout: PageLayout,
    /// Ordered subset of the document's photos, referenced by id.
    pub photos: Vec<PhotoId>,
    /// Editable-region text keyed by field name ("description", "features", ...).
    pub content: HashMap<String, String>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            id: String::new(),
            page_type: PageType::Content,
            title: String::new(),
            layout: PageLayout::Auto,
            photos: Vec::new(),
            content: HashMap::new(),
        }
    }
}

impl Page {
    /// Creates a new page with the given id and type.
    pub fn new(id: impl Into<PageId>, page_type: PageType) -> Self {
        Self {
            id: id.into(),
            page_type,
            title: page_type.label().to_string(),
            ..Default::default()
        }
    }

    /// Builder: set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder: set the layout.
    pub fn with_layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Builder: append a photo reference.
    pub fn with_photo(mut self, photo_id: impl Into<PhotoId>) -> Self {
        self.photos.push(photo_id.into());
        self
    }

    /// Builder: set a content field.
    pub fn with_content(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.content.insert(field.into(), text.into());
        self
    }
}

// =============================================================================
// PREFERENCES
// =============================================================================

/// Per-page presentation preferences, persisted alongside the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    /// Layout overrides keyed by page id.
    pub layouts: HashMap<PageId, PageLayout>,
    /// Photo stacking choices keyed by page id.
    pub stacking: HashMap<PageId, Stacking>,
    /// Photo gap in pixels keyed by page id.
    pub gaps: HashMap<PageId, u32>,
}

// =============================================================================
// DOCUMENT ROOT
// =============================================================================

/// Root document structure for one brochure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Document {
    pub property: PropertyDetails,
    pub agent: AgentDetails,
    /// Ordered photo collection; ids are unique for the document lifetime.
    pub photos: Vec<Photo>,
    /// Ordered page sequence; ids are unique and stable across re-renders.
    pub pages: Vec<Page>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a page by id.
    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    /// Looks up a page by id, mutably.
    pub fn page_mut(&mut self, id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    /// Position of a page in the sequence.
    pub fn page_index(&self, id: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    /// Looks up a photo by id.
    pub fn photo(&self, id: &str) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == id)
    }

    /// Serving URL for a photo id, if known.
    pub fn photo_url(&self, id: &str) -> Option<&str> {
        self.photo(id).and_then(|p| p.url.as_deref())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_builder() {
        let page = Page::new("page-1", PageType::Gallery)
            .with_title("Photo Gallery")
            .with_photo("ph-1")
            .with_content("description", "Bright and airy");

        assert_eq!(page.id, "page-1");
        assert_eq!(page.page_type, PageType::Gallery);
        assert_eq!(page.title, "Photo Gallery");
        assert_eq!(page.photos, vec!["ph-1".to_string()]);
        assert_eq!(page.content["description"], "Bright and airy");
    }

    #[test]
    fn test_document_lookup() {
        let mut doc = Document::new();
        doc.photos.push(Photo::new("ph-1", "front.jpg").with_url("http://x/ph-1"));
        doc.pages.push(Page::new("page-1", PageType::Cover));
        doc.pages.push(Page::new("page-2", PageType::Overview));

        assert_eq!(doc.page_index("page-2"), Some(1));
        assert_eq!(doc.photo_url("ph-1"), Some("http://x/ph-1"));
        assert!(doc.page("missing").is_none());
    }

    #[test]
    fn test_zero_photos_offers_auto_only() {
        assert_eq!(available_layouts(PageType::Content, 0), &[PageLayout::Auto]);
        assert_eq!(available_layouts(PageType::Gallery, 0), &[PageLayout::Auto]);
    }

    #[test]
    fn test_content_pages_get_full_layout_set() {
        let layouts = available_layouts(PageType::Content, 3);
        assert_eq!(layouts.len(), 9);
        assert!(layouts.contains(&PageLayout::Magazine));
        assert!(layouts.contains(&PageLayout::Hero));
        assert!(layouts.contains(&PageLayout::Mosaic));
    }

    #[test]
    fn test_fixed_layout_page_types() {
        assert_eq!(available_layouts(PageType::Cover, 5), &[PageLayout::Auto]);
        assert_eq!(available_layouts(PageType::Floorplan, 2), &[PageLayout::Auto]);
    }

    #[test]
    fn test_arrange_three_photos_by_stacking() {
        assert_eq!(arrange_photos(3, None), vec![2, 1]);
        assert_eq!(arrange_photos(3, Some(Stacking::Row)), vec![3]);
        assert_eq!(arrange_photos(3, Some(Stacking::OneTwo)), vec![1, 2]);
    }

    #[test]
    fn test_arrange_is_total() {
        for count in 0..12 {
            let rows = arrange_photos(count, None);
            assert_eq!(rows.iter().sum::<usize>(), count);
        }
    }

    #[test]
    fn test_enum_wire_format() {
        let json = serde_json::to_string(&PageType::Floorplan).unwrap();
        assert_eq!(json, "\"floorplan\"");
        let json = serde_json::to_string(&PageLayout::PhotoRight).unwrap();
        assert_eq!(json, "\"photo-right\"");
        let json = serde_json::to_string(&Stacking::Row).unwrap();
        assert_eq!(json, "\"3-row\"");
    }

    #[test]
    fn test_default_description_never_blank_for_description_pages() {
        for page_type in PageType::all() {
            if page_type.wants_description() {
                assert!(!page_type.default_description().is_empty());
            }
        }
    }
}
