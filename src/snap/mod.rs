//! Snap/alignment engine for element dragging.
//!
//! Given a dragged element's box and a candidate top-left position,
//! [`compute_snap`] returns an adjusted position plus the alignment guides
//! that should be shown while the drag is live. The function is pure: it
//! never mutates the element, and identical inputs always yield identical
//! output. Guides are transient overlay descriptors; persisting them is the
//! caller's mistake, clearing them on drag-end is the caller's job.

use serde::{Deserialize, Serialize};

use crate::element::{DesignElement, Point, Size};

/// Default snap threshold in pixels.
pub const SNAP_THRESHOLD: f64 = 8.0;

/// An axis-aligned box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

impl From<&DesignElement> for Rect {
    fn from(el: &DesignElement) -> Self {
        Self::new(el.position.x, el.position.y, el.size.width, el.size.height)
    }
}

/// Snap engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapConfig {
    pub enabled: bool,
    /// Max distance in pixels at which an alignment attracts.
    pub threshold: f64,
    /// Optional grid pitch; an axis that found no alignment rounds to it.
    pub grid: Option<f64>,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: SNAP_THRESHOLD,
            grid: None,
        }
    }
}

/// Guide line orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuideOrientation {
    /// Vertical line marking an X alignment.
    Vertical,
    /// Horizontal line marking a Y alignment.
    Horizontal,
}

/// A transient alignment guide spanning the union of the two aligned boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub orientation: GuideOrientation,
    /// The aligned coordinate (x for vertical, y for horizontal).
    pub at: f64,
    pub start: f64,
    pub end: f64,
}

/// Result of one snap evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    pub position: Point,
    pub guides: Vec<Guide>,
}

/// One candidate alignment on a single axis.
struct AxisMatch {
    /// Corrected top-left coordinate on this axis.
    corrected: f64,
    /// The aligned coordinate for the guide line.
    at: f64,
    target: Rect,
}

/// Computes the snapped position for a dragged box.
///
/// Targets are the canvas bounding box (always a candidate) plus every
/// sibling rect the caller passes (visible, non-active elements on the
/// same canvas). Per axis, alignments are tried in fixed precedence:
/// same-edge, opposite-edge, then center-to-center, stopping at the first
/// match within the threshold. The X decision is made against the original
/// candidate; Y is then evaluated on the X-adjusted box and never re-opens
/// X.
pub fn compute_snap(
    candidate: Point,
    size: Size,
    siblings: &[Rect],
    canvas: Rect,
    config: &SnapConfig,
) -> SnapResult {
    if !config.enabled {
        return SnapResult {
            position: candidate,
            guides: Vec::new(),
        };
    }

    let mut targets = Vec::with_capacity(siblings.len() + 1);
    targets.push(canvas);
    targets.extend_from_slice(siblings);

    let mut guides = Vec::new();

    let moving = Rect::new(candidate.x, candidate.y, size.width, size.height);
    let x = match snap_axis_x(&moving, &targets, config.threshold) {
        Some(m) => {
            let snapped = Rect::new(m.corrected, candidate.y, size.width, size.height);
            guides.push(vertical_guide(m.at, &snapped, &m.target));
            m.corrected
        }
        None => grid_round(candidate.x, config.grid),
    };

    // Y sees the X-adjusted box so its guides span the final geometry.
    let moving = Rect::new(x, candidate.y, size.width, size.height);
    let y = match snap_axis_y(&moving, &targets, config.threshold) {
        Some(m) => {
            let snapped = Rect::new(x, m.corrected, size.width, size.height);
            guides.push(horizontal_guide(m.at, &snapped, &m.target));
            m.corrected
        }
        None => grid_round(candidate.y, config.grid),
    };

    SnapResult {
        position: Point::new(x, y),
        guides,
    }
}

fn grid_round(value: f64, grid: Option<f64>) -> f64 {
    match grid {
        Some(pitch) if pitch > 0.0 => (value / pitch).round() * pitch,
        _ => value,
    }
}

fn snap_axis_x(moving: &Rect, targets: &[Rect], threshold: f64) -> Option<AxisMatch> {
    // Each entry: (moving edge value, target edge extractor, correction base).
    // Precedence: left-left, right-right, left-right, right-left, center.
    let attempts: [(f64, fn(&Rect) -> f64, f64); 5] = [
        (moving.left(), Rect::left, 0.0),
        (moving.right(), Rect::right, moving.width),
        (moving.left(), Rect::right, 0.0),
        (moving.right(), Rect::left, moving.width),
        (moving.center_x(), Rect::center_x, moving.width / 2.0),
    ];
    for (edge, target_edge, offset) in attempts {
        for target in targets {
            let aligned = target_edge(target);
            if (edge - aligned).abs() <= threshold {
                return Some(AxisMatch {
                    corrected: aligned - offset,
                    at: aligned,
                    target: *target,
                });
            }
        }
    }
    None
}

fn snap_axis_y(moving: &Rect, targets: &[Rect], threshold: f64) -> Option<AxisMatch> {
    let attempts: [(f64, fn(&Rect) -> f64, f64); 5] = [
        (moving.top(), Rect::top, 0.0),
        (moving.bottom(), Rect::bottom, moving.height),
        (moving.top(), Rect::bottom, 0.0),
        (moving.bottom(), Rect::top, moving.height),
        (moving.center_y(), Rect::center_y, moving.height / 2.0),
    ];
    for (edge, target_edge, offset) in attempts {
        for target in targets {
            let aligned = target_edge(target);
            if (edge - aligned).abs() <= threshold {
                return Some(AxisMatch {
                    corrected: aligned - offset,
                    at: aligned,
                    target: *target,
                });
            }
        }
    }
    None
}

fn vertical_guide(at: f64, a: &Rect, b: &Rect) -> Guide {
    Guide {
        orientation: GuideOrientation::Vertical,
        at,
        start: a.top().min(b.top()),
        end: a.bottom().max(b.bottom()),
    }
}

fn horizontal_guide(at: f64, a: &Rect, b: &Rect) -> Guide {
    Guide {
        orientation: GuideOrientation::Horizontal,
        at,
        start: a.left().min(b.left()),
        end: a.right().max(b.right()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
