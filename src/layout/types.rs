use std::collections::BTreeMap;

use serde::Serialize;

use crate::geometry::Rect;
use crate::ir::PanelId;

/// Natural (unshifted) geometry of one visible category panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelGeometry {
    pub id: PanelId,
    pub center_x: f32,
    pub center_y: f32,
    pub rect_top: f32,
    pub rect_bottom: f32,
}

impl PanelGeometry {
    /// `applied_dx` is the horizontal offset currently rendered on the panel;
    /// it is removed so the geometry reflects the natural position.
    pub fn from_measured(id: PanelId, rect: Rect, applied_dx: f32) -> Self {
        Self {
            id,
            center_x: rect.center_x() - applied_dx,
            center_y: rect.center_y(),
            rect_top: rect.top,
            rect_bottom: rect.bottom(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spine {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorLine {
    pub id: PanelId,
    pub group: Group,
    pub x: f32,
    pub y1: f32,
    pub y2: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOffset {
    pub id: PanelId,
    pub dx: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLink {
    pub join_x: f32,
    pub spine_y: f32,
    pub target_y: f32,
    pub end_x: f32,
}

impl SourceLink {
    /// Whether the link needs a vertical segment at `join_x`. Renderers skip
    /// the zero-length jog; the coordinates stay in the data either way.
    pub fn has_jog(&self) -> bool {
        self.spine_y != self.target_y
    }
}

/// Snapshot handed to the rendering layer. Safe to re-read between passes.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FishboneLayout {
    pub spine: Option<Spine>,
    pub connectors: Vec<ConnectorLine>,
    pub source_link: Option<SourceLink>,
    pub category_offsets: BTreeMap<PanelId, f32>,
    pub source_offset: f32,
    /// Bumped every time a pass changes the snapshot.
    pub revision: u64,
}

impl FishboneLayout {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.spine.is_none() && self.connectors.is_empty() && self.source_link.is_none()
    }

    pub fn category_offset(&self, id: &PanelId) -> f32 {
        self.category_offsets.get(id).copied().unwrap_or(0.0)
    }

    pub fn connector(&self, id: &PanelId) -> Option<&ConnectorLine> {
        self.connectors.iter().find(|line| &line.id == id)
    }

    /// Same drawing and offsets, ignoring the revision counter.
    pub fn same_content(&self, other: &Self) -> bool {
        self.spine == other.spine
            && self.connectors == other.connectors
            && self.source_link == other.source_link
            && self.category_offsets == other.category_offsets
            && self.source_offset == other.source_offset
    }
}

/// `value` when it reaches the tolerance, otherwise exactly zero.
pub fn snap_to_tolerance(value: f32, tolerance: f32) -> f32 {
    if value.abs() < tolerance { 0.0 } else { value }
}

/// Whether a committed value should be rewritten. A change of exactly the
/// tolerance is kept as jitter.
pub fn exceeds_tolerance(delta: f32, tolerance: f32) -> bool {
    delta.abs() > tolerance
}
