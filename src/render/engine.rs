//! Page rendering and DOM extraction.
//!
//! Markup strategy selection is a data table from `(PageType, PageLayout)`
//! to a renderer function: adding a layout means adding a table row, not a
//! branch scattered across functions.

use tracing::{debug, warn};

use crate::document::{
    arrange_photos, available_layouts, Document, Page, PageLayout, PageType, Photo, Preferences,
    Stacking,
};
use crate::render::dom::DomNode;

/// Re-attachment hook for photo hover and click-to-swap interactions.
///
/// The bindings themselves are owned by an external collaborator; the
/// render engine's obligation is to invoke this after every (re-)render so
/// no rendered page is ever left without its handlers.
pub trait PhotoHandlers {
    fn attach(&self, page_id: &str, photo_ids: &[String]);
}

/// Default no-op hook for headless use and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandlers;

impl PhotoHandlers for NoopHandlers {
    fn attach(&self, _page_id: &str, _photo_ids: &[String]) {}
}

/// One page's rendered DOM.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub page_id: String,
    pub root: DomNode,
}

impl RenderedPage {
    /// Full HTML of the page, used for snapshots and export previews.
    pub fn to_html(&self) -> String {
        self.root.to_html()
    }
}

/// Everything a renderer function may read. Photos are pre-resolved in
/// page order; missing references have already been dropped.
struct RenderContext<'a> {
    page: &'a Page,
    photos: Vec<&'a Photo>,
    gap: u32,
    stacking: Option<Stacking>,
}

type RenderFn = for<'a> fn(&RenderContext<'a>) -> DomNode;

/// The markup-strategy table.
fn renderer_for(page_type: PageType, layout: PageLayout) -> RenderFn {
    match (page_type, layout) {
        (PageType::Cover, _) => render_cover,
        (PageType::Floorplan, _) => render_floorplan,
        (_, PageLayout::PhotoLeft) => render_photo_left,
        (_, PageLayout::PhotoRight) => render_photo_right,
        (_, PageLayout::TextTop) => render_text_top,
        (_, PageLayout::TextBottom) => render_text_bottom,
        (_, PageLayout::PhotosOnly) => render_photos_only,
        (_, PageLayout::Magazine) => render_magazine,
        (_, PageLayout::Hero) => render_hero,
        (_, PageLayout::Mosaic) => render_mosaic,
        (PageType::Gallery, PageLayout::Auto) => render_photos_only,
        (_, PageLayout::Auto) => render_text_top,
    }
}

/// Resolves the layout actually used for a page: the per-page preference
/// wins over the page's own field, and anything illegal for the page's
/// type and photo count falls back to `Auto`.
pub fn effective_layout(page: &Page, preferences: &Preferences) -> PageLayout {
    let requested = preferences
        .layouts
        .get(&page.id)
        .copied()
        .unwrap_or(page.layout);
    if available_layouts(page.page_type, page.photos.len()).contains(&requested) {
        requested
    } else {
        PageLayout::Auto
    }
}

/// Renders one page from scratch and re-attaches photo handlers.
pub fn render_page(
    page: &Page,
    document: &Document,
    preferences: &Preferences,
    handlers: &dyn PhotoHandlers,
) -> RenderedPage {
    let photos: Vec<&Photo> = page
        .photos
        .iter()
        .filter_map(|id| document.photo(id))
        .collect();
    let ctx = RenderContext {
        page,
        photos,
        gap: preferences.gaps.get(&page.id).copied().unwrap_or(12),
        stacking: preferences.stacking.get(&page.id).copied(),
    };
    let layout = effective_layout(page, preferences);
    let root = DomNode::el("section")
        .class(format!("page page-{}", serde_variant(page.page_type)))
        .attr("data-page-id", page.id.clone())
        .attr("data-layout", serde_variant_layout(layout))
        .child(renderer_for(page.page_type, layout)(&ctx));

    debug!(page = %page.id, layout = layout.label(), "render page");
    handlers.attach(&page.id, &page.photos);
    RenderedPage {
        page_id: page.id.clone(),
        root,
    }
}

/// Renders the full page list from scratch.
pub fn render_document(
    document: &Document,
    preferences: &Preferences,
    handlers: &dyn PhotoHandlers,
) -> Vec<RenderedPage> {
    document
        .pages
        .iter()
        .map(|page| render_page(page, document, preferences, handlers))
        .collect()
}

/// Walks every editable region of the rendered pages back into the
/// document: the `title` field updates `page.title`, everything else lands
/// in `page.content`. This is the only path by which live DOM edits become
/// part of the persisted document.
///
/// A rendered page whose id no longer exists in the document is logged and
/// skipped; session data arrives from untrusted sources and a stale region
/// must not throw.
pub fn extract_into_document(rendered: &[RenderedPage], document: &mut Document) {
    for page_dom in rendered {
        let Some(page) = document.page_mut(&page_dom.page_id) else {
            warn!(page = %page_dom.page_id, "extract: rendered page missing from document");
            continue;
        };
        for (field, text) in page_dom.root.editable_regions() {
            if field == "title" {
                page.title = text;
            } else {
                page.content.insert(field, text);
            }
        }
    }
}

// =============================================================================
// RENDERER FUNCTIONS
// =============================================================================

fn title_block(ctx: &RenderContext) -> DomNode {
    DomNode::el("h2")
        .class("page-title")
        .editable("title")
        .child(DomNode::text(ctx.page.title.clone()))
}

/// Editable content regions in stable field order. The description field
/// is always present on description-bearing pages even when still empty.
fn content_blocks(ctx: &RenderContext) -> Vec<DomNode> {
    let mut fields: Vec<&str> = ctx.page.content.keys().map(String::as_str).collect();
    if ctx.page.page_type.wants_description() && !ctx.page.content.contains_key("description") {
        fields.push("description");
    }
    fields.sort_unstable();
    fields
        .into_iter()
        .map(|field| {
            let text = ctx.page.content.get(field).cloned().unwrap_or_default();
            DomNode::el("div")
                .class(format!("page-field field-{field}"))
                .editable(field)
                .child(DomNode::text(text))
        })
        .collect()
}

/// Photo grid: rows determined by photo count and stacking preference.
fn photo_grid(ctx: &RenderContext) -> DomNode {
    let rows = arrange_photos(ctx.photos.len(), ctx.stacking);
    let mut grid = DomNode::el("div")
        .class("photo-grid")
        .attr("style", format!("gap:{}px", ctx.gap));
    let mut next = 0usize;
    for row_len in rows {
        let mut row = DomNode::el("div").class("photo-row");
        for photo in &ctx.photos[next..next + row_len] {
            row = row.child(
                DomNode::el("img")
                    .class("page-photo")
                    .attr("data-photo-id", photo.id.clone())
                    .attr("src", photo.url.clone().unwrap_or_default())
                    .attr("alt", photo.name.clone()),
            );
        }
        grid = grid.child(row);
        next += row_len;
    }
    grid
}

fn text_column(ctx: &RenderContext) -> DomNode {
    DomNode::el("div")
        .class("text-column")
        .child(title_block(ctx))
        .children(content_blocks(ctx))
}

fn render_cover(ctx: &RenderContext) -> DomNode {
    let mut node = DomNode::el("div").class("cover");
    if let Some(hero) = ctx.photos.first() {
        node = node.child(
            DomNode::el("img")
                .class("cover-photo")
                .attr("data-photo-id", hero.id.clone())
                .attr("src", hero.url.clone().unwrap_or_default()),
        );
    }
    node.child(title_block(ctx))
}

fn render_floorplan(ctx: &RenderContext) -> DomNode {
    DomNode::el("div")
        .class("floorplan")
        .child(title_block(ctx))
        .child(photo_grid(ctx))
}

fn render_photo_left(ctx: &RenderContext) -> DomNode {
    DomNode::el("div")
        .class("split photo-left")
        .child(photo_grid(ctx))
        .child(text_column(ctx))
}

fn render_photo_right(ctx: &RenderContext) -> DomNode {
    DomNode::el("div")
        .class("split photo-right")
        .child(text_column(ctx))
        .child(photo_grid(ctx))
}

fn render_text_top(ctx: &RenderContext) -> DomNode {
    DomNode::el("div")
        .class("stacked text-top")
        .child(text_column(ctx))
        .child(photo_grid(ctx))
}

fn render_text_bottom(ctx: &RenderContext) -> DomNode {
    DomNode::el("div")
        .class("stacked text-bottom")
        .child(photo_grid(ctx))
        .child(text_column(ctx))
}

fn render_photos_only(ctx: &RenderContext) -> DomNode {
    DomNode::el("div")
        .class("photos-only")
        .child(title_block(ctx))
        .child(photo_grid(ctx))
}

fn render_magazine(ctx: &RenderContext) -> DomNode {
    let mut node = DomNode::el("div").class("magazine");
    if let Some(lead) = ctx.photos.first() {
        node = node.child(
            DomNode::el("img")
                .class("magazine-lead")
                .attr("data-photo-id", lead.id.clone())
                .attr("src", lead.url.clone().unwrap_or_default()),
        );
    }
    node.child(text_column(ctx)).child(secondary_grid(ctx))
}

fn render_hero(ctx: &RenderContext) -> DomNode {
    let mut node = DomNode::el("div").class("hero");
    if let Some(hero) = ctx.photos.first() {
        node = node.child(
            DomNode::el("img")
                .class("hero-photo")
                .attr("data-photo-id", hero.id.clone())
                .attr("src", hero.url.clone().unwrap_or_default()),
        );
    }
    node.child(text_column(ctx))
}

fn render_mosaic(ctx: &RenderContext) -> DomNode {
    DomNode::el("div")
        .class("mosaic")
        .child(photo_grid(ctx))
        .child(text_column(ctx))
}

/// Grid of every photo after the first, used by layouts with a lead image.
fn secondary_grid(ctx: &RenderContext) -> DomNode {
    let rest = RenderContext {
        page: ctx.page,
        photos: ctx.photos.iter().skip(1).copied().collect(),
        gap: ctx.gap,
        stacking: ctx.stacking,
    };
    photo_grid(&rest)
}

fn serde_variant(page_type: PageType) -> String {
    serde_json::to_value(page_type)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

fn serde_variant_layout(layout: PageLayout) -> String {
    serde_json::to_value(layout)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Photo;

    fn doc_with_photos(n: usize) -> Document {
        let mut doc = Document::new();
        for i in 0..n {
            doc.photos.push(
                Photo::new(format!("ph-{i}"), format!("photo-{i}.jpg"))
                    .with_url(format!("http://x/ph-{i}")),
            );
        }
        doc
    }

    fn page_with_photos(page_type: PageType, n: usize) -> Page {
        let mut page = Page::new("page-1", page_type);
        for i in 0..n {
            page = page.with_photo(format!("ph-{i}"));
        }
        page
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut doc = doc_with_photos(3);
        let page = page_with_photos(PageType::Content, 3)
            .with_content("description", "Spacious")
            .with_content("features", "Garden");
        doc.pages.push(page.clone());
        let prefs = Preferences::default();

        let a = render_page(&page, &doc, &prefs, &NoopHandlers);
        let b = render_page(&page, &doc, &prefs, &NoopHandlers);
        assert_eq!(a, b);
    }

    #[test]
    fn test_photo_right_with_row_stacking_is_single_row() {
        let mut doc = doc_with_photos(3);
        let page = page_with_photos(PageType::Content, 3).with_layout(PageLayout::PhotoRight);
        doc.pages.push(page.clone());
        let mut prefs = Preferences::default();
        prefs.stacking.insert("page-1".to_string(), Stacking::Row);

        let rendered = render_page(&page, &doc, &prefs, &NoopHandlers);
        let html = rendered.to_html();
        // One row carrying all three photos.
        assert_eq!(html.matches("photo-row").count(), 1);
        assert_eq!(html.matches("data-photo-id").count(), 3);
        assert!(html.contains("data-layout=\"photo-right\""));
    }

    #[test]
    fn test_illegal_layout_falls_back_to_auto() {
        let doc = doc_with_photos(0);
        // Magazine is not legal with zero photos.
        let page = Page::new("page-1", PageType::Content).with_layout(PageLayout::Magazine);
        let prefs = Preferences::default();
        assert_eq!(effective_layout(&page, &prefs), PageLayout::Auto);

        let rendered = render_page(&page, &doc, &prefs, &NoopHandlers);
        assert!(rendered.to_html().contains("data-layout=\"auto\""));
    }

    #[test]
    fn test_preference_overrides_page_layout() {
        let page = page_with_photos(PageType::Content, 3).with_layout(PageLayout::PhotoLeft);
        let mut prefs = Preferences::default();
        prefs
            .layouts
            .insert("page-1".to_string(), PageLayout::Hero);
        assert_eq!(effective_layout(&page, &prefs), PageLayout::Hero);
    }

    #[test]
    fn test_extract_round_trip() {
        let mut doc = doc_with_photos(1);
        let page = page_with_photos(PageType::Overview, 1).with_content("description", "old");
        doc.pages.push(page.clone());
        let prefs = Preferences::default();

        let mut rendered = render_document(&doc, &prefs, &NoopHandlers);
        rendered[0]
            .root
            .find_editable_mut("description")
            .unwrap()
            .set_text("edited in place");
        rendered[0]
            .root
            .find_editable_mut("title")
            .unwrap()
            .set_text("New Title");

        extract_into_document(&rendered, &mut doc);
        let page = doc.page("page-1").unwrap();
        assert_eq!(page.content["description"], "edited in place");
        assert_eq!(page.title, "New Title");
    }

    #[test]
    fn test_extract_skips_unknown_page() {
        let mut doc = doc_with_photos(0);
        let rendered = vec![RenderedPage {
            page_id: "ghost".to_string(),
            root: DomNode::el("div").editable("description"),
        }];
        // Must not panic and must not mutate anything.
        extract_into_document(&rendered, &mut doc);
        assert!(doc.pages.is_empty());
    }

    #[test]
    fn test_description_region_present_even_when_empty() {
        let doc = doc_with_photos(1);
        let page = page_with_photos(PageType::Location, 1);
        let rendered = render_page(&page, &doc, &Preferences::default(), &NoopHandlers);
        let regions = rendered.root.editable_regions();
        assert!(regions.iter().any(|(f, _)| f == "description"));
    }

    #[test]
    fn test_handlers_reattached_on_render() {
        use std::cell::RefCell;

        struct Recorder(RefCell<Vec<(String, usize)>>);
        impl PhotoHandlers for Recorder {
            fn attach(&self, page_id: &str, photo_ids: &[String]) {
                self.0
                    .borrow_mut()
                    .push((page_id.to_string(), photo_ids.len()));
            }
        }

        let mut doc = doc_with_photos(2);
        doc.pages.push(page_with_photos(PageType::Gallery, 2));
        let recorder = Recorder(RefCell::new(Vec::new()));
        render_document(&doc, &Preferences::default(), &recorder);
        assert_eq!(recorder.0.borrow().as_slice(), &[("page-1".to_string(), 2)]);
    }
}
