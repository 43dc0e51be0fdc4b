mod grouping;
mod routing;
mod source_link;
mod spine;
pub(crate) mod types;
pub use types::*;
use grouping::*;
use routing::*;
use source_link::*;
use spine::*;

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::geometry::{GeometrySource, MeasureTarget, Rect};
use crate::ir::PanelId;

/// Everything one recompute pass reads from the geometry source.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutInput {
    pub container: Rect,
    /// Measured source rect, including any vertical offset already applied.
    pub source: Rect,
    pub panels: Vec<PanelGeometry>,
}

/// Result of one pass before offsets are committed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutPass {
    pub spine: Option<Spine>,
    pub connectors: Vec<ConnectorLine>,
    pub source_link: Option<SourceLink>,
    pub category_offsets: Vec<CategoryOffset>,
    pub source_offset_delta: f32,
}

impl LayoutPass {
    pub fn is_empty(&self) -> bool {
        self.spine.is_none()
    }
}

/// Measures the container, the source panel and every visible category.
///
/// Returns `None` when the container or source is not mounted. Panels that
/// no longer measure (detached mid-pass) are left out. `applied_offsets` is
/// subtracted so panel geometry reflects natural positions.
pub fn collect_input<G>(geometry: &G, applied_offsets: &BTreeMap<PanelId, f32>) -> Option<LayoutInput>
where
    G: GeometrySource + ?Sized,
{
    let container = geometry.measure(&MeasureTarget::Container)?;
    let source = geometry.measure(&MeasureTarget::Source)?;

    let mut panels = Vec::new();
    for category in geometry.visible_categories() {
        let Some(rect) = geometry.measure(&MeasureTarget::Category(category.id.clone())) else {
            tracing::trace!(panel = %category.id, "panel detached, skipped for this pass");
            continue;
        };
        let applied = applied_offsets.get(&category.id).copied().unwrap_or(0.0);
        panels.push(PanelGeometry::from_measured(category.id, rect, applied));
    }

    Some(LayoutInput {
        container,
        source,
        panels,
    })
}

/// Runs grouping, spine solving, connector routing and source linking.
pub fn compute_pass(input: &LayoutInput, config: &EngineConfig) -> LayoutPass {
    let (top, bottom) = group_panels(&input.panels);
    let Some(spine_y) = solve_spine_y(&top, &bottom, input.container.height, config) else {
        return LayoutPass::default();
    };

    let anchor_x = input.source.left - config.line_gap;
    let routed = route_connectors(&top, &bottom, spine_y, anchor_x, config);
    let linked = link_source(spine_y, input.source, anchor_x, config);

    let (x1, x2) = routed
        .connectors
        .iter()
        .map(|line| line.x)
        .fold((anchor_x, anchor_x), |(lo, hi), x| (lo.min(x), hi.max(x)));

    LayoutPass {
        spine: Some(Spine { x1, x2, y: spine_y }),
        connectors: routed.connectors,
        source_link: Some(linked.link),
        category_offsets: routed.offsets,
        source_offset_delta: linked.offset_delta,
    }
}

/// One-shot layout for a geometry source with no offsets applied yet.
///
/// Hosts that re-measure after applying offsets should drive a
/// [`crate::scheduler::RecomputeScheduler`] instead, which owns the offset
/// accumulators across passes.
pub fn compute_layout<G>(geometry: &G, config: &EngineConfig) -> FishboneLayout
where
    G: GeometrySource + ?Sized,
{
    let Some(input) = collect_input(geometry, &BTreeMap::new()) else {
        return FishboneLayout::empty();
    };
    let pass = compute_pass(&input, config);
    if pass.is_empty() {
        return FishboneLayout::empty();
    }
    FishboneLayout {
        spine: pass.spine,
        connectors: pass.connectors,
        source_link: pass.source_link,
        category_offsets: pass
            .category_offsets
            .into_iter()
            .map(|offset| (offset.id, offset.dx))
            .collect(),
        source_offset: pass.source_offset_delta,
        revision: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SnapshotGeometry;

    fn box_at(center_x: f32, top: f32, height: f32) -> Rect {
        Rect::new(center_x - 50.0, top, 100.0, height)
    }

    /// Three panels on top, two below, source anchor at x = 600.
    fn scenario() -> SnapshotGeometry {
        SnapshotGeometry::new(
            Rect::new(0.0, 0.0, 800.0, 400.0),
            Rect::new(612.0, 170.0, 150.0, 60.0),
        )
        .with_category("T1", box_at(100.0, 20.0, 100.0))
        .with_category("B1", box_at(150.0, 220.0, 100.0))
        .with_category("T2", box_at(300.0, 30.0, 100.0))
        .with_category("B2", box_at(450.0, 240.0, 100.0))
        .with_category("T3", box_at(500.0, 10.0, 110.0))
    }

    #[test]
    fn routes_reference_scenario() {
        let layout = compute_layout(&scenario(), &EngineConfig::default());
        let spine = layout.spine.expect("spine");
        // max top bottom = 130, min bottom top = 220
        assert_eq!(spine.y, 175.0);
        assert_eq!(spine.x1, 100.0);
        assert_eq!(spine.x2, 600.0);

        let x = |id: &str| layout.connector(&id.into()).expect("connector").x;
        assert_eq!([x("T1"), x("T2"), x("T3")], [100.0, 300.0, 500.0]);
        assert_eq!([x("B1"), x("B2")], [200.0, 400.0]);
        assert_eq!(layout.category_offset(&"B1".into()), 50.0);
        assert_eq!(layout.category_offset(&"B2".into()), -50.0);
        assert_eq!(layout.category_offset(&"T2".into()), 0.0);

        let link = layout.source_link.expect("link");
        assert_eq!(link.join_x, 600.0);
        assert_eq!(link.end_x, 612.0);
        assert_eq!(layout.source_offset, -25.0);
    }

    #[test]
    fn top_only_scenario_uses_gap() {
        let geometry = SnapshotGeometry::new(
            Rect::new(0.0, 0.0, 800.0, 400.0),
            Rect::new(600.0, 100.0, 120.0, 60.0),
        )
        .with_category("A", box_at(100.0, 20.0, 100.0))
        .with_category("B", box_at(300.0, 0.0, 140.0));
        let layout = compute_layout(&geometry, &EngineConfig::default());
        assert_eq!(layout.spine.map(|s| s.y), Some(152.0));
    }

    #[test]
    fn missing_source_produces_empty_layout() {
        let mut geometry = scenario();
        geometry.source = None;
        assert_eq!(compute_layout(&geometry, &EngineConfig::default()), FishboneLayout::empty());
    }

    #[test]
    fn no_visible_panels_produces_empty_layout() {
        let geometry = SnapshotGeometry::new(
            Rect::new(0.0, 0.0, 800.0, 400.0),
            Rect::new(600.0, 100.0, 120.0, 60.0),
        );
        let layout = compute_layout(&geometry, &EngineConfig::default());
        assert!(layout.is_empty());
        assert!(layout.category_offsets.is_empty());
        assert_eq!(layout.source_offset, 0.0);
    }

    #[test]
    fn detached_panels_are_dropped() {
        let mut geometry = scenario();
        geometry.detached.insert("T3".into());
        let input = collect_input(&geometry, &BTreeMap::new()).expect("input");
        assert_eq!(input.panels.len(), 4);
        let pass = compute_pass(&input, &EngineConfig::default());
        assert!(pass.connectors.iter().all(|line| line.id.as_str() != "T3"));
    }

    #[test]
    fn collect_input_removes_applied_offsets() {
        let mut geometry = scenario();
        geometry.applied_offsets.insert("B1".into(), 50.0);
        let mut applied = BTreeMap::new();
        applied.insert(PanelId::from("B1"), 50.0);
        let input = collect_input(&geometry, &applied).expect("input");
        let b1 = input.panels.iter().find(|p| p.id.as_str() == "B1").unwrap();
        assert_eq!(b1.center_x, 150.0);
    }
}
