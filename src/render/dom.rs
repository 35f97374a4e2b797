//! Minimal DOM tree the render engine projects pages into.
//!
//! This is document structure as data, not a live browser DOM: nodes are
//! cheap to clone, compare and serialize, which is what undo snapshots and
//! round-trip extraction need. Editable regions are element nodes tagged
//! with a `data-field` attribute.

use serde::{Deserialize, Serialize};

/// Attribute name marking an editable region and naming its content field.
pub const FIELD_ATTR: &str = "data-field";

/// One node in the rendered page tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomNode {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<DomNode>,
    },
    Text(String),
}

impl DomNode {
    /// Creates an element node.
    pub fn el(tag: impl Into<String>) -> Self {
        Self::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a text node.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Builder: add an attribute. No-op on text nodes.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element { ref mut attrs, .. } = self {
            attrs.push((name.into(), value.into()));
        }
        self
    }

    /// Builder: add a class attribute.
    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    /// Builder: append a child. No-op on text nodes.
    pub fn child(mut self, node: DomNode) -> Self {
        if let Self::Element {
            ref mut children, ..
        } = self
        {
            children.push(node);
        }
        self
    }

    /// Builder: append children.
    pub fn children(mut self, nodes: impl IntoIterator<Item = DomNode>) -> Self {
        if let Self::Element {
            ref mut children, ..
        } = self
        {
            children.extend(nodes);
        }
        self
    }

    /// Builder: mark this element as the editable region for a field.
    pub fn editable(self, field: impl Into<String>) -> Self {
        self.attr(FIELD_ATTR, field).attr("contenteditable", "true")
    }

    /// Value of an attribute, if present.
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        match self {
            Self::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            Self::Text(_) => None,
        }
    }

    /// Concatenated text content of this subtree.
    pub fn text_content(&self) -> String {
        match self {
            Self::Text(content) => content.clone(),
            Self::Element { children, .. } => {
                children.iter().map(|c| c.text_content()).collect()
            }
        }
    }

    /// Replaces this subtree's children with a single text node. Used to
    /// simulate a contenteditable edit.
    pub fn set_text(&mut self, content: impl Into<String>) {
        if let Self::Element {
            ref mut children, ..
        } = self
        {
            children.clear();
            children.push(Self::Text(content.into()));
        }
    }

    /// Collects `(field name, text content)` for every editable region in
    /// this subtree, in document order.
    pub fn editable_regions(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.collect_editable(&mut out);
        out
    }

    fn collect_editable(&self, out: &mut Vec<(String, String)>) {
        if let Some(field) = self.attr_value(FIELD_ATTR) {
            out.push((field.to_string(), self.text_content()));
        }
        if let Self::Element { children, .. } = self {
            for child in children {
                child.collect_editable(out);
            }
        }
    }

    /// Finds the editable region for a field, mutably.
    pub fn find_editable_mut(&mut self, field: &str) -> Option<&mut DomNode> {
        if self.attr_value(FIELD_ATTR) == Some(field) {
            return Some(self);
        }
        if let Self::Element {
            ref mut children, ..
        } = self
        {
            for child in children {
                if let Some(found) = child.find_editable_mut(field) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Serializes the subtree to an HTML string.
    pub fn to_html(&self) -> String {
        match self {
            Self::Text(content) => escape(content),
            Self::Element {
                tag,
                attrs,
                children,
            } => {
                let mut html = format!("<{tag}");
                for (name, value) in attrs {
                    html.push_str(&format!(" {name}=\"{}\"", escape(value)));
                }
                html.push('>');
                for child in children {
                    html.push_str(&child.to_html());
                }
                html.push_str(&format!("</{tag}>"));
                html
            }
        }
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_html() {
        let node = DomNode::el("div")
            .class("page")
            .child(DomNode::el("h2").editable("title").child(DomNode::text("The Old Rectory")));
        let html = node.to_html();
        assert!(html.starts_with("<div class=\"page\">"));
        assert!(html.contains("data-field=\"title\""));
        assert!(html.contains("contenteditable=\"true\""));
        assert!(html.contains("The Old Rectory"));
    }

    #[test]
    fn test_editable_regions_in_document_order() {
        let node = DomNode::el("div")
            .child(DomNode::el("h2").editable("title").child(DomNode::text("Kitchen")))
            .child(
                DomNode::el("p")
                    .editable("description")
                    .child(DomNode::text("Fitted units")),
            );
        assert_eq!(
            node.editable_regions(),
            vec![
                ("title".to_string(), "Kitchen".to_string()),
                ("description".to_string(), "Fitted units".to_string()),
            ]
        );
    }

    #[test]
    fn test_set_text_round_trips_through_extraction() {
        let mut node = DomNode::el("div")
            .child(DomNode::el("p").editable("description").child(DomNode::text("old")));
        node.find_editable_mut("description").unwrap().set_text("new text");
        assert_eq!(
            node.editable_regions(),
            vec![("description".to_string(), "new text".to_string())]
        );
    }

    #[test]
    fn test_html_escaping() {
        let node = DomNode::el("p").child(DomNode::text("2 <beds> & \"bath\""));
        assert_eq!(node.to_html(), "<p>2 &lt;beds&gt; &amp; &quot;bath&quot;</p>");
    }
}
