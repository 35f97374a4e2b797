//! ElementManager: per-page element collections, selection and clipboard.
//!
//! The manager owns the `page id -> elements` map and the parallel paint
//! order, plus the current selection (primary + set, ready for
//! multi-select) and the single global clipboard slot. It performs no
//! history recording and no dirty tracking itself; the owning editor wraps
//! each mutation so every user action is exactly one undoable step.

use std::collections::HashMap;

use tracing::debug;

use crate::document::PageId;
use crate::error::{EditorError, EditorResult};
use crate::element::model::{DesignElement, ElementId, ElementKind, Point, Size};

/// Default paste offset in pixels.
const PASTE_OFFSET: (f64, f64) = (20.0, 20.0);

/// Duplicate uses a larger offset so the copy is visibly distinct.
const DUPLICATE_OFFSET: (f64, f64) = (30.0, 30.0);

/// Clipboard buffer contents. Single global slot, last copy wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    /// Full element template the next paste is cloned from.
    pub element: DesignElement,
    /// Serialized markup captured at copy time.
    pub markup: String,
}

/// Manages design elements across all pages of one editor session.
#[derive(Debug, Default)]
pub struct ElementManager {
    /// Elements keyed by page id, in insertion order.
    elements: HashMap<PageId, Vec<DesignElement>>,
    /// Paint order keyed by page id (back to front).
    layer_order: HashMap<PageId, Vec<ElementId>>,
    /// Primary selection.
    selected: Option<ElementId>,
    /// Selection set; mirrors `selected` until multi-select lands.
    selected_set: Vec<ElementId>,
    clipboard: Option<ClipboardEntry>,
}

impl ElementManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Elements on a page, in insertion order.
    pub fn elements(&self, page_id: &str) -> &[DesignElement] {
        self.elements.get(page_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Looks up one element on a page.
    pub fn element(&self, page_id: &str, element_id: &str) -> Option<&DesignElement> {
        self.elements(page_id).iter().find(|e| e.id == element_id)
    }

    /// Paint order for a page, back to front.
    pub fn layer_order(&self, page_id: &str) -> &[ElementId] {
        self.layer_order
            .get(page_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The primary selected element id, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The full selection set.
    pub fn selected_set(&self) -> &[ElementId] {
        &self.selected_set
    }

    /// Whether the clipboard holds an entry.
    pub fn clipboard_is_empty(&self) -> bool {
        self.clipboard.is_none()
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Single-select: replaces the prior selection. `None` clears both the
    /// primary reference and the selection set.
    pub fn select(&mut self, element_id: Option<ElementId>) {
        self.selected_set.clear();
        if let Some(ref id) = element_id {
            self.selected_set.push(id.clone());
        }
        self.selected = element_id;
    }

    // =========================================================================
    // CREATE / DELETE
    // =========================================================================

    /// Creates a new element on a page and selects it. The element paints
    /// above everything already on the page.
    pub fn create(
        &mut self,
        page_id: &str,
        kind: ElementKind,
        position: Point,
        size: Size,
    ) -> ElementId {
        let mut element = DesignElement::new(kind, position, size);
        element.z_index = self.next_z(page_id);
        let id = element.id.clone();
        debug!(page = page_id, element = %id, kind = element.kind.label(), "create element");
        self.insert(page_id, element);
        self.select(Some(id.clone()));
        id
    }

    /// Inserts an already-built element (paste/undo restore path).
    pub fn insert(&mut self, page_id: &str, element: DesignElement) {
        self.layer_order
            .entry(page_id.to_string())
            .or_default()
            .push(element.id.clone());
        self.elements
            .entry(page_id.to_string())
            .or_default()
            .push(element);
    }

    /// Deletes an element. Refused when the lock flag is set; a locked
    /// element leaves the page untouched.
    pub fn delete(&mut self, page_id: &str, element_id: &str) -> EditorResult<DesignElement> {
        let list = self
            .elements
            .get_mut(page_id)
            .ok_or_else(|| EditorError::page_not_found(page_id))?;
        let idx = list
            .iter()
            .position(|e| e.id == element_id)
            .ok_or_else(|| EditorError::element_not_found(element_id))?;
        if list[idx].locked {
            return Err(EditorError::element_locked(element_id));
        }
        let removed = list.remove(idx);
        if let Some(order) = self.layer_order.get_mut(page_id) {
            order.retain(|id| id != element_id);
        }
        debug!(page = page_id, element = element_id, "delete element");
        self.select(None);
        Ok(removed)
    }

    /// Drops every element and the paint order for a page, clearing the
    /// selection if it pointed into the page. Called when the page itself
    /// is deleted so elements never outlive their owner.
    pub fn remove_page(&mut self, page_id: &str) {
        let removed = self.elements.remove(page_id).unwrap_or_default();
        self.layer_order.remove(page_id);
        let selection_gone = match &self.selected {
            Some(selected) => removed.iter().any(|e| &e.id == selected),
            None => false,
        };
        if selection_gone {
            self.select(None);
        }
        debug!(page = page_id, count = removed.len(), "remove page elements");
    }

    // =========================================================================
    // CLIPBOARD
    // =========================================================================

    /// Copies an element into the clipboard buffer (last copy wins).
    pub fn copy(&mut self, page_id: &str, element_id: &str) -> EditorResult<()> {
        let element = self
            .element(page_id, element_id)
            .ok_or_else(|| EditorError::element_not_found(element_id))?
            .clone();
        let markup = element.markup();
        self.clipboard = Some(ClipboardEntry { element, markup });
        Ok(())
    }

    /// Materializes a clone from the clipboard onto a page, offset from the
    /// clone's own position, and selects it. Fails without mutation when
    /// the clipboard is empty.
    ///
    /// Repeated pastes cascade: the buffer keeps the last pasted position.
    pub fn paste(&mut self, page_id: &str, offset: Option<(f64, f64)>) -> EditorResult<ElementId> {
        let entry = self.clipboard.as_mut().ok_or(EditorError::EmptyClipboard)?;
        let (dx, dy) = offset.unwrap_or(PASTE_OFFSET);

        let mut clone = entry.element.clone();
        clone.id = crate::document::new_id();
        clone.position = Point::new(clone.position.x + dx, clone.position.y + dy);
        entry.element.position = clone.position;

        clone.z_index = self.next_z(page_id);
        let id = clone.id.clone();
        debug!(page = page_id, element = %id, "paste element");
        self.insert(page_id, clone);
        self.select(Some(id.clone()));
        Ok(id)
    }

    /// Duplicate = copy immediately followed by paste with a larger offset,
    /// as one user-visible action.
    pub fn duplicate(&mut self, page_id: &str, element_id: &str) -> EditorResult<ElementId> {
        self.copy(page_id, element_id)?;
        self.paste(page_id, Some(DUPLICATE_OFFSET))
    }

    // =========================================================================
    // LOCK / VISIBILITY / POSITION
    // =========================================================================

    /// Flips the lock flag and returns the new state.
    pub fn toggle_lock(&mut self, page_id: &str, element_id: &str) -> EditorResult<bool> {
        let element = self.element_mut(page_id, element_id)?;
        element.locked = !element.locked;
        debug!(page = page_id, element = element_id, locked = element.locked, "toggle lock");
        Ok(element.locked)
    }

    /// Sets the visibility flag.
    pub fn set_visible(&mut self, page_id: &str, element_id: &str, visible: bool) -> EditorResult<()> {
        self.element_mut(page_id, element_id)?.visible = visible;
        Ok(())
    }

    /// Repositions an element. Refused while the element is locked.
    pub fn move_to(&mut self, page_id: &str, element_id: &str, position: Point) -> EditorResult<()> {
        let element = self.element_mut(page_id, element_id)?;
        if element.locked {
            return Err(EditorError::element_locked(element_id));
        }
        element.position = position;
        Ok(())
    }

    // =========================================================================
    // LAYERING
    // =========================================================================

    /// Paints an element above everything else on its page.
    pub fn bring_to_front(&mut self, page_id: &str, element_id: &str) -> EditorResult<()> {
        let top = self.next_z(page_id);
        self.element_mut(page_id, element_id)?.z_index = top;
        if let Some(order) = self.layer_order.get_mut(page_id) {
            order.retain(|id| id != element_id);
            order.push(element_id.to_string());
        }
        Ok(())
    }

    /// Paints an element below everything else on its page.
    pub fn send_to_back(&mut self, page_id: &str, element_id: &str) -> EditorResult<()> {
        let bottom = self
            .elements(page_id)
            .iter()
            .map(|e| e.z_index)
            .min()
            .unwrap_or(0);
        self.element_mut(page_id, element_id)?.z_index = bottom - 1;
        if let Some(order) = self.layer_order.get_mut(page_id) {
            order.retain(|id| id != element_id);
            order.insert(0, element_id.to_string());
        }
        Ok(())
    }

    // =========================================================================
    // SNAPSHOT SUPPORT
    // =========================================================================

    /// Deep copy of the per-page element map for history capture.
    pub fn snapshot_elements(&self) -> HashMap<PageId, Vec<DesignElement>> {
        self.elements.clone()
    }

    /// Deep copy of the paint-order map for history capture.
    pub fn snapshot_layer_order(&self) -> HashMap<PageId, Vec<ElementId>> {
        self.layer_order.clone()
    }

    /// Replaces all element state from a restored snapshot. Clears the
    /// selection: the restored ids may no longer include it.
    pub fn restore(
        &mut self,
        elements: HashMap<PageId, Vec<DesignElement>>,
        layer_order: HashMap<PageId, Vec<ElementId>>,
    ) {
        self.elements = elements;
        self.layer_order = layer_order;
        self.select(None);
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    fn element_mut(&mut self, page_id: &str, element_id: &str) -> EditorResult<&mut DesignElement> {
        self.elements
            .get_mut(page_id)
            .and_then(|list| list.iter_mut().find(|e| e.id == element_id))
            .ok_or_else(|| EditorError::element_not_found(element_id))
    }

    fn next_z(&self, page_id: &str) -> i32 {
        self.elements(page_id)
            .iter()
            .map(|e| e.z_index)
            .max()
            .map(|z| z + 1)
            .unwrap_or(1)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> ElementKind {
        ElementKind::Shape {
            shape: "rect".into(),
        }
    }

    #[test]
    fn test_create_selects_and_stacks() {
        let mut mgr = ElementManager::new();
        let a = mgr.create("page-1", shape(), Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let b = mgr.create("page-1", shape(), Point::new(5.0, 5.0), Size::new(10.0, 10.0));

        assert_eq!(mgr.selected(), Some(b.as_str()));
        assert_eq!(mgr.selected_set(), &[b.clone()]);
        let za = mgr.element("page-1", &a).unwrap().z_index;
        let zb = mgr.element("page-1", &b).unwrap().z_index;
        assert!(zb > za);
        assert_eq!(mgr.layer_order("page-1"), &[a, b]);
    }

    #[test]
    fn test_copy_paste_default_offset() {
        let mut mgr = ElementManager::new();
        let id = mgr.create(
            "page-1",
            shape(),
            Point::new(100.0, 100.0),
            Size::new(40.0, 40.0),
        );

        mgr.copy("page-1", &id).unwrap();
        let pasted = mgr.paste("page-1", None).unwrap();

        assert_ne!(pasted, id);
        let el = mgr.element("page-1", &pasted).unwrap();
        assert_eq!(el.position, Point::new(120.0, 120.0));
        assert_eq!(mgr.elements("page-1").len(), 2);
        assert_eq!(mgr.selected(), Some(pasted.as_str()));
    }

    #[test]
    fn test_repeated_paste_cascades() {
        let mut mgr = ElementManager::new();
        let id = mgr.create(
            "page-1",
            shape(),
            Point::new(100.0, 100.0),
            Size::new(40.0, 40.0),
        );
        mgr.copy("page-1", &id).unwrap();
        let first = mgr.paste("page-1", None).unwrap();
        let second = mgr.paste("page-1", None).unwrap();

        assert_eq!(
            mgr.element("page-1", &first).unwrap().position,
            Point::new(120.0, 120.0)
        );
        assert_eq!(
            mgr.element("page-1", &second).unwrap().position,
            Point::new(140.0, 140.0)
        );
    }

    #[test]
    fn test_paste_empty_clipboard_fails_without_mutation() {
        let mut mgr = ElementManager::new();
        let err = mgr.paste("page-1", None).unwrap_err();
        assert!(matches!(err, EditorError::EmptyClipboard));
        assert!(mgr.elements("page-1").is_empty());
    }

    #[test]
    fn test_duplicate_uses_larger_offset() {
        let mut mgr = ElementManager::new();
        let id = mgr.create(
            "page-1",
            shape(),
            Point::new(10.0, 20.0),
            Size::new(40.0, 40.0),
        );
        let dup = mgr.duplicate("page-1", &id).unwrap();
        let el = mgr.element("page-1", &dup).unwrap();
        assert_eq!(el.position, Point::new(40.0, 50.0));
    }

    #[test]
    fn test_delete_locked_refused() {
        let mut mgr = ElementManager::new();
        let id = mgr.create("page-1", shape(), Point::default(), Size::new(10.0, 10.0));
        mgr.toggle_lock("page-1", &id).unwrap();

        let before: Vec<_> = mgr.elements("page-1").to_vec();
        let err = mgr.delete("page-1", &id).unwrap_err();
        assert!(matches!(err, EditorError::ElementLocked(_)));
        assert_eq!(mgr.elements("page-1"), before.as_slice());
    }

    #[test]
    fn test_move_locked_refused() {
        let mut mgr = ElementManager::new();
        let id = mgr.create("page-1", shape(), Point::default(), Size::new(10.0, 10.0));
        mgr.toggle_lock("page-1", &id).unwrap();

        let err = mgr.move_to("page-1", &id, Point::new(50.0, 50.0)).unwrap_err();
        assert!(matches!(err, EditorError::ElementLocked(_)));
        assert_eq!(mgr.element("page-1", &id).unwrap().position, Point::default());
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut mgr = ElementManager::new();
        let id = mgr.create("page-1", shape(), Point::default(), Size::new(10.0, 10.0));
        assert_eq!(mgr.selected(), Some(id.as_str()));
        mgr.delete("page-1", &id).unwrap();
        assert_eq!(mgr.selected(), None);
        assert!(mgr.layer_order("page-1").is_empty());
    }

    #[test]
    fn test_ids_stay_unique_across_paste_and_duplicate() {
        let mut mgr = ElementManager::new();
        let id = mgr.create(
            "page-1",
            shape(),
            Point::new(0.0, 0.0),
            Size::new(10.0, 10.0),
        );
        mgr.copy("page-1", &id).unwrap();
        for _ in 0..5 {
            mgr.paste("page-1", None).unwrap();
        }
        mgr.duplicate("page-1", &id).unwrap();

        let mut ids: Vec<_> = mgr.elements("page-1").iter().map(|e| e.id.clone()).collect();
        let len = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), len);
        assert_eq!(len, 7);
    }

    #[test]
    fn test_layering() {
        let mut mgr = ElementManager::new();
        let a = mgr.create("page-1", shape(), Point::default(), Size::new(10.0, 10.0));
        let b = mgr.create("page-1", shape(), Point::default(), Size::new(10.0, 10.0));

        mgr.bring_to_front("page-1", &a).unwrap();
        assert!(
            mgr.element("page-1", &a).unwrap().z_index
                > mgr.element("page-1", &b).unwrap().z_index
        );
        assert_eq!(mgr.layer_order("page-1").last().unwrap(), &a);

        mgr.send_to_back("page-1", &a).unwrap();
        assert!(
            mgr.element("page-1", &a).unwrap().z_index
                < mgr.element("page-1", &b).unwrap().z_index
        );
        assert_eq!(mgr.layer_order("page-1").first().unwrap(), &a);
    }

    #[test]
    fn test_remove_page_purges_elements_and_selection() {
        let mut mgr = ElementManager::new();
        let kept = mgr.create("page-1", shape(), Point::default(), Size::new(10.0, 10.0));
        let doomed = mgr.create("page-2", shape(), Point::default(), Size::new(10.0, 10.0));
        assert_eq!(mgr.selected(), Some(doomed.as_str()));

        mgr.remove_page("page-2");
        assert!(mgr.elements("page-2").is_empty());
        assert!(mgr.layer_order("page-2").is_empty());
        assert_eq!(mgr.selected(), None);
        // Other pages are untouched.
        assert_eq!(mgr.elements("page-1")[0].id, kept);
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut mgr = ElementManager::new();
        let id = mgr.create("page-1", shape(), Point::default(), Size::new(10.0, 10.0));
        let elements = mgr.snapshot_elements();
        let order = mgr.snapshot_layer_order();

        mgr.delete("page-1", &id).unwrap();
        assert!(mgr.elements("page-1").is_empty());

        mgr.restore(elements, order);
        assert_eq!(mgr.elements("page-1").len(), 1);
        assert_eq!(mgr.selected(), None);
    }
}
