//! The owning editor session context.
//!
//! [`Editor`] owns the document, the rendered pages, the element manager,
//! the history stack and the per-page preferences; there is no ambient
//! global state, so multiple independent editor instances can coexist and
//! tests need no DOM globals. Every user-visible mutating operation runs
//! through a wrapper here that reconciles DOM edits into the model,
//! records exactly one history snapshot and sets the dirty flag, making
//! each action atomically undoable.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info};

use crate::document::{
    available_layouts, new_id, Document, Page, PageId, PageLayout, PageType, Preferences, Stacking,
};
use crate::element::{DesignElement, ElementId, ElementKind, ElementManager, Point, Size};
use crate::error::{EditorError, EditorResult};
use crate::history::{ChangeClass, History, INITIAL_LOAD_ACTION};
use crate::render::{
    extract_into_document, render_document, render_page, NoopHandlers, PhotoHandlers, RenderedPage,
};
use crate::snap::{compute_snap, Rect, SnapConfig, SnapResult};

/// Page canvas size in CSS pixels (A4 portrait at 96 dpi).
pub const CANVAS_WIDTH: f64 = 794.0;
pub const CANVAS_HEIGHT: f64 = 1123.0;

/// Delay after structural DOM rewrites, letting layout settle before the
/// previously-active page is re-selected and handlers re-attached.
const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Full editor state captured per history entry. Every field is a deep
/// copy: later mutation of live structures never alters a stored snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSnapshot {
    pages: Vec<Page>,
    rendered: Vec<RenderedPage>,
    preferences: Preferences,
    current_page: Option<PageId>,
    description_cache: HashMap<PageId, String>,
    elements: HashMap<PageId, Vec<DesignElement>>,
    layer_order: HashMap<PageId, Vec<ElementId>>,
}

/// One editor session over one brochure document.
pub struct Editor {
    document: Document,
    preferences: Preferences,
    rendered: Vec<RenderedPage>,
    elements: ElementManager,
    history: History<EditorSnapshot>,
    snap: SnapConfig,
    current_page: Option<PageId>,
    /// AI-generated descriptions keyed by page id, restored on undo.
    description_cache: HashMap<PageId, String>,
    dirty: bool,
    /// Set for handoff sessions: the document is tracked in memory only
    /// and backend saves stay disabled for the session's lifetime.
    saves_disabled: bool,
    handlers: Box<dyn PhotoHandlers + Send + Sync>,
}

impl Editor {
    /// Creates an editor over a document. Call [`Editor::initialize`] to
    /// render and record the baseline snapshot.
    pub fn new(document: Document, preferences: Preferences) -> Self {
        Self {
            document,
            preferences,
            rendered: Vec::new(),
            elements: ElementManager::new(),
            history: History::new(),
            snap: SnapConfig::default(),
            current_page: None,
            description_cache: HashMap::new(),
            dirty: false,
            saves_disabled: false,
            handlers: Box::new(NoopHandlers),
        }
    }

    /// Builder: install the photo interaction hook.
    pub fn with_handlers(mut self, handlers: Box<dyn PhotoHandlers + Send + Sync>) -> Self {
        self.handlers = handlers;
        self
    }

    /// Renders every page and records the baseline snapshot, so undo
    /// always has a defined state to return to. Leaves the editor clean.
    pub fn initialize(&mut self) {
        self.rendered = render_document(&self.document, &self.preferences, self.handlers.as_ref());
        self.current_page = self.document.pages.first().map(|p| p.id.clone());
        self.history
            .push(INITIAL_LOAD_ACTION, ChangeClass::Structural, self.capture());
        self.dirty = false;
        info!(pages = self.document.pages.len(), "editor initialized");
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn rendered(&self) -> &[RenderedPage] {
        &self.rendered
    }

    pub fn elements(&self) -> &ElementManager {
        &self.elements
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn current_page(&self) -> Option<&str> {
        self.current_page.as_deref()
    }

    pub fn saves_disabled(&self) -> bool {
        self.saves_disabled
    }

    /// Marks this session as handoff-loaded: tracked in memory only.
    pub fn disable_saves(&mut self) {
        self.saves_disabled = true;
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn snap_config(&self) -> &SnapConfig {
        &self.snap
    }

    pub fn set_snap_config(&mut self, config: SnapConfig) {
        self.snap = config;
    }

    /// Clears the dirty flag after a successful persist.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Generated description for a page, if any.
    pub fn description(&self, page_id: &str) -> Option<&str> {
        self.description_cache.get(page_id).map(String::as_str)
    }

    // =========================================================================
    // PAGE NAVIGATION / PRESENTATION
    // =========================================================================

    /// Selects the active page.
    pub fn select_page(&mut self, page_id: &str) -> EditorResult<()> {
        if self.document.page(page_id).is_none() {
            return Err(EditorError::page_not_found(page_id));
        }
        self.current_page = Some(page_id.to_string());
        Ok(())
    }

    /// Changes a page's layout. Refused when the layout is not legal for
    /// the page's type and photo count.
    pub fn set_layout(&mut self, page_id: &str, layout: PageLayout) -> EditorResult<()> {
        let page = self
            .document
            .page(page_id)
            .ok_or_else(|| EditorError::page_not_found(page_id))?;
        if !available_layouts(page.page_type, page.photos.len()).contains(&layout) {
            return Err(EditorError::illegal_layout(
                page.page_type.label(),
                layout.label(),
            ));
        }
        self.preferences
            .layouts
            .insert(page_id.to_string(), layout);
        self.rerender_page(page_id);
        self.commit("change layout", ChangeClass::Content);
        Ok(())
    }

    /// Changes a page's photo stacking preference.
    pub fn set_stacking(&mut self, page_id: &str, stacking: Stacking) -> EditorResult<()> {
        if self.document.page(page_id).is_none() {
            return Err(EditorError::page_not_found(page_id));
        }
        self.preferences
            .stacking
            .insert(page_id.to_string(), stacking);
        self.rerender_page(page_id);
        self.commit("change stacking", ChangeClass::Content);
        Ok(())
    }

    /// Changes a page's photo gap.
    pub fn set_gap(&mut self, page_id: &str, gap: u32) -> EditorResult<()> {
        if self.document.page(page_id).is_none() {
            return Err(EditorError::page_not_found(page_id));
        }
        self.preferences.gaps.insert(page_id.to_string(), gap);
        self.rerender_page(page_id);
        self.commit("change gap", ChangeClass::Content);
        Ok(())
    }

    // =========================================================================
    // PAGE STRUCTURE
    // =========================================================================

    /// Appends a new page and selects it.
    pub fn add_page(&mut self, page_type: PageType) -> PageId {
        let page = Page::new(new_id(), page_type);
        let id = page.id.clone();
        self.document.pages.push(page);
        self.render_all();
        self.current_page = Some(id.clone());
        self.commit("add page", ChangeClass::Structural);
        id
    }

    /// Deletes a page and everything on it.
    pub fn delete_page(&mut self, page_id: &str) -> EditorResult<()> {
        let idx = self
            .document
            .page_index(page_id)
            .ok_or_else(|| EditorError::page_not_found(page_id))?;
        self.document.pages.remove(idx);
        // Elements belong to exactly one page; they go down with it.
        self.elements.remove_page(page_id);
        self.render_all();
        if self.current_page.as_deref() == Some(page_id) {
            self.current_page = self.document.pages.first().map(|p| p.id.clone());
        }
        self.commit("delete page", ChangeClass::Structural);
        Ok(())
    }

    /// Reorders pages. Structural by action tag even though the page
    /// count is unchanged.
    pub fn reorder_pages(&mut self, order: &[PageId]) -> EditorResult<()> {
        let mut reordered = Vec::with_capacity(self.document.pages.len());
        for id in order {
            let idx = self
                .document
                .page_index(id)
                .ok_or_else(|| EditorError::page_not_found(id))?;
            reordered.push(self.document.pages[idx].clone());
        }
        if reordered.len() != self.document.pages.len() {
            return Err(EditorError::page_not_found("missing from new order"));
        }
        self.document.pages = reordered;
        self.render_all();
        self.commit("reorder pages", ChangeClass::Structural);
        Ok(())
    }

    // =========================================================================
    // CONTENT EDITING
    // =========================================================================

    /// Commits an edit to an editable region: updates the rendered DOM,
    /// reconciles into the model, and records one content snapshot.
    pub fn edit_region(&mut self, page_id: &str, field: &str, text: &str) -> EditorResult<()> {
        let page_dom = self
            .rendered
            .iter_mut()
            .find(|r| r.page_id == page_id)
            .ok_or_else(|| EditorError::page_not_found(page_id))?;
        let region = page_dom
            .root
            .find_editable_mut(field)
            .ok_or_else(|| EditorError::page_not_found(format!("{page_id}:{field}")))?;
        region.set_text(text);
        self.commit(format!("edit {field}"), ChangeClass::Content);
        Ok(())
    }

    /// Stores a generated description for a page and writes it into the
    /// page's description region.
    pub fn apply_description(&mut self, page_id: &str, text: String) -> EditorResult<()> {
        if self.document.page(page_id).is_none() {
            return Err(EditorError::page_not_found(page_id));
        }
        self.description_cache
            .insert(page_id.to_string(), text.clone());
        if let Some(page) = self.document.page_mut(page_id) {
            page.content.insert("description".to_string(), text);
        }
        self.rerender_page(page_id);
        Ok(())
    }

    // =========================================================================
    // ELEMENT OPERATIONS
    // =========================================================================

    /// Creates an element on the current page.
    pub fn add_element(
        &mut self,
        kind: ElementKind,
        position: Point,
        size: Size,
    ) -> EditorResult<ElementId> {
        let page_id = self.require_current_page()?;
        let id = self.elements.create(&page_id, kind, position, size);
        self.commit("add element", ChangeClass::Content);
        Ok(id)
    }

    /// Copies an element into the clipboard. Not a mutation: records no
    /// snapshot and leaves the dirty flag alone.
    pub fn copy_element(&mut self, element_id: &str) -> EditorResult<()> {
        let page_id = self.require_current_page()?;
        self.elements.copy(&page_id, element_id)
    }

    /// Pastes from the clipboard onto the current page.
    pub fn paste_element(&mut self, offset: Option<(f64, f64)>) -> EditorResult<ElementId> {
        let page_id = self.require_current_page()?;
        let id = self.elements.paste(&page_id, offset)?;
        self.commit("paste element", ChangeClass::Content);
        Ok(id)
    }

    /// Duplicates an element as one user-visible action.
    pub fn duplicate_element(&mut self, element_id: &str) -> EditorResult<ElementId> {
        let page_id = self.require_current_page()?;
        let id = self.elements.duplicate(&page_id, element_id)?;
        self.commit("duplicate element", ChangeClass::Content);
        Ok(id)
    }

    /// Deletes an element. Locked elements are refused with no mutation
    /// and no history entry.
    pub fn delete_element(&mut self, element_id: &str) -> EditorResult<()> {
        let page_id = self.require_current_page()?;
        self.elements.delete(&page_id, element_id)?;
        self.commit("delete element", ChangeClass::Content);
        Ok(())
    }

    /// Toggles an element's lock flag; the toggle itself is undoable.
    pub fn toggle_element_lock(&mut self, element_id: &str) -> EditorResult<bool> {
        let page_id = self.require_current_page()?;
        let locked = self.elements.toggle_lock(&page_id, element_id)?;
        self.commit("toggle lock", ChangeClass::Content);
        Ok(locked)
    }

    /// Selects an element (or clears the selection with `None`).
    pub fn select_element(&mut self, element_id: Option<ElementId>) {
        self.elements.select(element_id);
    }

    /// Moves a dragged element to a snapped position and returns the
    /// active guides. No snapshot: call [`Editor::finish_drag`] once per
    /// completed gesture.
    pub fn drag_element(&mut self, element_id: &str, candidate: Point) -> EditorResult<SnapResult> {
        let page_id = self.require_current_page()?;
        let element = self
            .elements
            .element(&page_id, element_id)
            .ok_or_else(|| EditorError::element_not_found(element_id))?;
        if element.locked {
            return Err(EditorError::element_locked(element_id));
        }
        let size = element.size;
        let siblings: Vec<Rect> = self
            .elements
            .elements(&page_id)
            .iter()
            .filter(|e| e.id != element_id && e.visible)
            .map(Rect::from)
            .collect();
        let canvas = Rect::new(0.0, 0.0, CANVAS_WIDTH, CANVAS_HEIGHT);
        let result = compute_snap(candidate, size, &siblings, canvas, &self.snap);
        self.elements.move_to(&page_id, element_id, result.position)?;
        Ok(result)
    }

    /// Records the single snapshot for a completed drag gesture.
    pub fn finish_drag(&mut self) {
        self.commit("move element", ChangeClass::Content);
    }

    // =========================================================================
    // UNDO / REDO
    // =========================================================================

    /// Steps back one history entry and restores it.
    pub async fn undo(&mut self) -> EditorResult<()> {
        let entry = self.history.undo()?.clone();
        debug!(action = %entry.action, "undo");
        self.restore(entry.change_class, entry.state).await;
        Ok(())
    }

    /// Steps forward one history entry and restores it.
    pub async fn redo(&mut self) -> EditorResult<()> {
        let entry = self.history.redo()?.clone();
        debug!(action = %entry.action, "redo");
        self.restore(entry.change_class, entry.state).await;
        Ok(())
    }

    /// Applies a snapshot. The restore guard stays set until every piece
    /// of restoration work, including the post-rewrite settle delay, has
    /// completed, so a second undo/redo can never observe a half-restored
    /// tree and re-render side effects can never record snapshots.
    async fn restore(&mut self, change_class: ChangeClass, state: EditorSnapshot) {
        self.history.begin_restore();

        self.document.pages = state.pages;
        // Restored before any re-render so an undone layout/stacking/gap
        // change cannot be resurrected from live preference maps.
        self.preferences = state.preferences;
        self.description_cache = state.description_cache;

        match change_class {
            ChangeClass::Structural => {
                // Page set changed: rebuild everything from the model.
                self.render_all();
                tokio::time::sleep(SETTLE_DELAY).await;
                // Re-select the previously-active page once the DOM settled.
                let target = state
                    .current_page
                    .filter(|id| self.document.page(id).is_some())
                    .or_else(|| self.document.pages.first().map(|p| p.id.clone()));
                self.current_page = target;
            }
            ChangeClass::Content => {
                // Same page set: swap rendered content in place,
                // index-aligned, and re-attach interaction handlers.
                self.rendered = state.rendered;
                for page in &self.rendered {
                    if let Some(doc_page) = self.document.page(&page.page_id) {
                        self.handlers.attach(&page.page_id, &doc_page.photos);
                    }
                }
                self.current_page = state.current_page;
            }
        }

        self.elements.restore(state.elements, state.layer_order);
        self.dirty = true;
        self.history.end_restore();
    }

    // =========================================================================
    // SNAPSHOT / SYNC
    // =========================================================================

    /// Reconciles every editable region back into the model. Runs before
    /// every snapshot and every save.
    pub fn extract(&mut self) {
        extract_into_document(&self.rendered, &mut self.document);
    }

    /// Reconcile, capture and push one history entry, marking the
    /// document dirty. No-ops while a restore is in flight.
    fn commit(&mut self, action: impl Into<String>, change_class: ChangeClass) {
        if self.history.is_restoring() {
            return;
        }
        self.extract();
        let snapshot = self.capture();
        self.history.push(action, change_class, snapshot);
        self.dirty = true;
    }

    fn capture(&self) -> EditorSnapshot {
        EditorSnapshot {
            pages: self.document.pages.clone(),
            rendered: self.rendered.clone(),
            preferences: self.preferences.clone(),
            current_page: self.current_page.clone(),
            description_cache: self.description_cache.clone(),
            elements: self.elements.snapshot_elements(),
            layer_order: self.elements.snapshot_layer_order(),
        }
    }

    fn render_all(&mut self) {
        self.rendered = render_document(&self.document, &self.preferences, self.handlers.as_ref());
    }

    fn rerender_page(&mut self, page_id: &str) {
        let Some(page) = self.document.page(page_id) else {
            return;
        };
        let fresh = render_page(page, &self.document, &self.preferences, self.handlers.as_ref());
        if let Some(slot) = self.rendered.iter_mut().find(|r| r.page_id == page_id) {
            *slot = fresh;
        } else {
            self.rendered.push(fresh);
        }
    }

    fn require_current_page(&self) -> EditorResult<PageId> {
        self.current_page.clone().ok_or(EditorError::NoActivePage)
    }
}

// =============================================================================
// TESTS
// =============================================================================
