use std::cmp::Ordering;

use crate::config::EngineConfig;

use super::types::snap_to_tolerance;
use super::{CategoryOffset, ConnectorLine, Group, PanelGeometry};

#[derive(Debug, Clone, PartialEq)]
pub(super) struct RoutedConnectors {
    pub connectors: Vec<ConnectorLine>,
    /// Target horizontal offset per panel, already snapped to the tolerance.
    pub offsets: Vec<CategoryOffset>,
}

/// Routes one vertical connector per panel down (or up) to the spine.
///
/// Top connectors drop straight from their panel centers. Bottom connectors
/// are assigned, in left-to-right order, to the midpoints between consecutive
/// top centers and the source anchor column, so they never share an X with a
/// top connector or with the jog into the source panel. When there are more
/// bottom panels than gaps the extra panels share the outermost gap.
pub(super) fn route_connectors(
    top: &[PanelGeometry],
    bottom: &[PanelGeometry],
    spine_y: f32,
    anchor_x: f32,
    config: &EngineConfig,
) -> RoutedConnectors {
    let top = sorted_by_center_x(top);
    let bottom = sorted_by_center_x(bottom);

    let mut columns: Vec<f32> = top.iter().map(|panel| panel.center_x).collect();
    columns.push(anchor_x);
    columns.sort_by(f32::total_cmp);
    let slots: Vec<f32> = columns
        .windows(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .collect();

    let mut routed = RoutedConnectors {
        connectors: Vec::with_capacity(top.len() + bottom.len()),
        offsets: Vec::with_capacity(top.len() + bottom.len()),
    };

    for panel in top {
        push_connector(&mut routed, panel, Group::Top, panel.center_x, spine_y, config);
    }
    for (idx, panel) in bottom.into_iter().enumerate() {
        // No top row means no gaps to choose from; keep the natural column.
        let line_x = match slots.last() {
            Some(last) => slots.get(idx).copied().unwrap_or(*last),
            None => panel.center_x,
        };
        push_connector(&mut routed, panel, Group::Bottom, line_x, spine_y, config);
    }
    routed
}

fn sorted_by_center_x(panels: &[PanelGeometry]) -> Vec<&PanelGeometry> {
    let mut sorted: Vec<&PanelGeometry> = panels.iter().collect();
    sorted.sort_by(|a, b| {
        a.center_x
            .total_cmp(&b.center_x)
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted
}

fn push_connector(
    routed: &mut RoutedConnectors,
    panel: &PanelGeometry,
    group: Group,
    line_x: f32,
    spine_y: f32,
    config: &EngineConfig,
) {
    let dx = snap_to_tolerance(line_x - panel.center_x, config.jitter_tolerance);
    routed.offsets.push(CategoryOffset {
        id: panel.id.clone(),
        dx,
    });
    routed.connectors.push(ConnectorLine {
        id: panel.id.clone(),
        group,
        x: line_x,
        y1: connector_start(panel, spine_y, config),
        y2: spine_y,
    });
}

/// Start of the connector on the panel edge facing the spine, never closer
/// to the spine than `min_stub`.
fn connector_start(panel: &PanelGeometry, spine_y: f32, config: &EngineConfig) -> f32 {
    match panel.center_y.partial_cmp(&spine_y) {
        Some(Ordering::Greater) => {
            (panel.rect_top - config.category_line_gap).max(spine_y + config.min_stub)
        }
        _ => (panel.rect_bottom + config.category_line_gap).min(spine_y - config.min_stub),
    }
}
