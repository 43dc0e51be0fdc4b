use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ir::PanelId;
use crate::layout::FishboneLayout;

/// Axis-aligned rectangle in the layout container's local space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.top + self.height / 2.0
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }
}

/// Something the engine can ask the host to measure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MeasureTarget {
    Category(PanelId),
    Source,
    Container,
}

/// Something the engine wants change notifications for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObservedTarget {
    Container,
    ContainerScroll,
    Window,
    Source,
    Category(PanelId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleCategory {
    pub id: PanelId,
    pub content_rows: usize,
}

/// Measuring boundary between the host and the engine. Nothing is cached
/// across passes; `None` from [`GeometrySource::measure`] means the element is
/// not mounted and is dropped for that pass.
pub trait GeometrySource {
    /// Category panels that currently have content, in display order.
    fn visible_categories(&self) -> Vec<VisibleCategory>;

    /// Current bounding box, including any visual offset the host applied.
    fn measure(&self, target: &MeasureTarget) -> Option<Rect>;

    /// Registers interest in resize/scroll changes of `target`. The host is
    /// expected to forward those changes to the scheduler as triggers.
    fn observe(&mut self, target: ObservedTarget) -> ObserverId;

    fn unobserve(&mut self, id: ObserverId);
}

/// In-memory geometry: natural rectangles plus whatever offsets were applied
/// to them, the way a browser reports transformed boxes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotGeometry {
    pub container: Option<Rect>,
    pub source: Option<Rect>,
    /// Natural (unshifted) category rects, in display order.
    #[serde(default)]
    pub categories: Vec<CategoryRect>,
    #[serde(default)]
    pub applied_offsets: BTreeMap<PanelId, f32>,
    #[serde(default)]
    pub applied_source_offset: f32,
    /// Panels that are listed but no longer attached to the render tree.
    #[serde(default)]
    pub detached: BTreeSet<PanelId>,
    #[serde(skip)]
    observers: BTreeMap<ObserverId, ObservedTarget>,
    #[serde(skip)]
    next_observer: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRect {
    pub id: PanelId,
    pub rect: Rect,
    #[serde(default = "default_rows")]
    pub content_rows: usize,
}

fn default_rows() -> usize {
    1
}

impl SnapshotGeometry {
    pub fn new(container: Rect, source: Rect) -> Self {
        Self {
            container: Some(container),
            source: Some(source),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, id: impl Into<PanelId>, rect: Rect) -> Self {
        self.set_category(id.into(), rect);
        self
    }

    pub fn set_category(&mut self, id: PanelId, rect: Rect) {
        if let Some(existing) = self.categories.iter_mut().find(|entry| entry.id == id) {
            existing.rect = rect;
            return;
        }
        self.categories.push(CategoryRect {
            id,
            rect,
            content_rows: 1,
        });
    }

    pub fn remove_category(&mut self, id: &PanelId) {
        self.categories.retain(|entry| &entry.id != id);
        self.applied_offsets.remove(id);
        self.detached.remove(id);
    }

    pub fn natural_rect(&self, id: &PanelId) -> Option<Rect> {
        self.categories
            .iter()
            .find(|entry| &entry.id == id)
            .map(|entry| entry.rect)
    }

    /// Mirrors what the rendering layer does with a layout snapshot: panels
    /// are translated horizontally, the source panel vertically.
    pub fn apply_layout(&mut self, layout: &FishboneLayout) {
        self.applied_offsets = layout.category_offsets.clone();
        self.applied_source_offset = layout.source_offset;
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn is_observed(&self, target: &ObservedTarget) -> bool {
        self.observers.values().any(|observed| observed == target)
    }
}

impl GeometrySource for SnapshotGeometry {
    fn visible_categories(&self) -> Vec<VisibleCategory> {
        self.categories
            .iter()
            .filter(|entry| entry.content_rows > 0)
            .map(|entry| VisibleCategory {
                id: entry.id.clone(),
                content_rows: entry.content_rows,
            })
            .collect()
    }

    fn measure(&self, target: &MeasureTarget) -> Option<Rect> {
        match target {
            MeasureTarget::Container => self.container,
            MeasureTarget::Source => self
                .source
                .map(|rect| rect.translated(0.0, self.applied_source_offset)),
            MeasureTarget::Category(id) => {
                if self.detached.contains(id) {
                    return None;
                }
                let rect = self.natural_rect(id)?;
                let dx = self.applied_offsets.get(id).copied().unwrap_or(0.0);
                Some(rect.translated(dx, 0.0))
            }
        }
    }

    fn observe(&mut self, target: ObservedTarget) -> ObserverId {
        self.next_observer += 1;
        let id = ObserverId(self.next_observer);
        self.observers.insert(id, target);
        id
    }

    fn unobserve(&mut self, id: ObserverId) {
        self.observers.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_derived_edges() {
        let rect = Rect::new(10.0, 20.0, 100.0, 40.0);
        assert_eq!(rect.right(), 110.0);
        assert_eq!(rect.bottom(), 60.0);
        assert_eq!(rect.center_x(), 60.0);
        assert_eq!(rect.center_y(), 40.0);
    }

    #[test]
    fn measure_reflects_applied_offsets() {
        let mut geometry = SnapshotGeometry::new(
            Rect::new(0.0, 0.0, 800.0, 400.0),
            Rect::new(600.0, 150.0, 120.0, 60.0),
        )
        .with_category("A", Rect::new(50.0, 20.0, 100.0, 80.0));
        geometry.applied_offsets.insert("A".into(), 15.0);
        geometry.applied_source_offset = -5.0;

        let panel = geometry
            .measure(&MeasureTarget::Category("A".into()))
            .expect("panel");
        assert_eq!(panel.left, 65.0);
        let source = geometry.measure(&MeasureTarget::Source).expect("source");
        assert_eq!(source.top, 145.0);
    }

    #[test]
    fn detached_panels_measure_as_none() {
        let mut geometry = SnapshotGeometry::new(
            Rect::new(0.0, 0.0, 800.0, 400.0),
            Rect::new(600.0, 150.0, 120.0, 60.0),
        )
        .with_category("A", Rect::new(50.0, 20.0, 100.0, 80.0));
        geometry.detached.insert("A".into());
        assert!(geometry.measure(&MeasureTarget::Category("A".into())).is_none());
        assert_eq!(geometry.visible_categories().len(), 1);
    }

    #[test]
    fn observers_are_tracked_until_released() {
        let mut geometry = SnapshotGeometry::default();
        let first = geometry.observe(ObservedTarget::Container);
        let second = geometry.observe(ObservedTarget::Source);
        assert_ne!(first, second);
        assert_eq!(geometry.observer_count(), 2);
        geometry.unobserve(first);
        assert!(!geometry.is_observed(&ObservedTarget::Container));
        assert!(geometry.is_observed(&ObservedTarget::Source));
    }

    #[test]
    fn deserializes_camel_case_snapshot() {
        let json = r#"{
            "container": {"left":0,"top":0,"width":800,"height":400},
            "source": {"left":600,"top":150,"width":120,"height":60},
            "categories": [{"id":"MAN","rect":{"left":10,"top":10,"width":100,"height":60}}]
        }"#;
        let geometry: SnapshotGeometry = serde_json::from_str(json).expect("snapshot");
        assert_eq!(geometry.categories[0].content_rows, 1);
        assert_eq!(geometry.visible_categories()[0].id.as_str(), "MAN");
    }
}
