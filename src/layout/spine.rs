use crate::config::EngineConfig;

use super::PanelGeometry;

/// Spine Y between the two groups, clamped into the container. `None` when
/// neither group has a panel.
pub(super) fn solve_spine_y(
    top: &[PanelGeometry],
    bottom: &[PanelGeometry],
    container_height: f32,
    config: &EngineConfig,
) -> Option<f32> {
    let top_edge = top
        .iter()
        .map(|panel| panel.rect_bottom)
        .reduce(f32::max);
    let bottom_edge = bottom
        .iter()
        .map(|panel| panel.rect_top)
        .reduce(f32::min);

    let raw = match (top_edge, bottom_edge) {
        (Some(above), Some(below)) => (above + below) / 2.0,
        (Some(above), None) => above + config.spine_gap,
        (None, Some(below)) => below - config.spine_gap,
        (None, None) => return None,
    };
    Some(clamp_to_container(raw, container_height, config.spine_margin))
}

// Lower bound wins when the container is shorter than twice the margin.
fn clamp_to_container(y: f32, container_height: f32, margin: f32) -> f32 {
    y.min(container_height - margin).max(margin)
}
