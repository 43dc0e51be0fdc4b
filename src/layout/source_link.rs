use crate::config::EngineConfig;
use crate::geometry::Rect;

use super::SourceLink;
use super::types::snap_to_tolerance;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct LinkedSource {
    pub link: SourceLink,
    /// Increment for the accumulated source offset; zero under the tolerance.
    pub offset_delta: f32,
}

/// Joins the spine to the source panel: an optional vertical jog at the
/// anchor column, then a horizontal run into the panel's near edge.
///
/// `source` is the measured rect, i.e. it already carries the offset applied
/// in earlier passes, so the delta shrinks to zero once the panel sits on
/// the spine.
pub(super) fn link_source(
    spine_y: f32,
    source: Rect,
    anchor_x: f32,
    config: &EngineConfig,
) -> LinkedSource {
    let measured_y = source.center_y();
    let offset_delta = snap_to_tolerance(spine_y - measured_y, config.jitter_tolerance);
    LinkedSource {
        link: SourceLink {
            join_x: anchor_x,
            spine_y,
            target_y: measured_y + offset_delta,
            end_x: source.left - config.source_gap,
        },
        offset_delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_pulls_source_onto_spine() {
        let config = EngineConfig::default();
        let source = Rect::new(600.0, 170.0, 120.0, 60.0);
        let linked = link_source(152.0, source, 588.0, &config);
        assert_eq!(linked.offset_delta, -48.0);
        assert_eq!(linked.link.join_x, 588.0);
        assert_eq!(linked.link.end_x, 600.0);
        assert_eq!(linked.link.target_y, 152.0);
        assert!(!linked.link.has_jog());
    }

    #[test]
    fn sub_tolerance_delta_keeps_small_jog() {
        let config = EngineConfig::default();
        let source = Rect::new(600.0, 122.2, 120.0, 60.0);
        let linked = link_source(152.0, source, 588.0, &config);
        assert_eq!(linked.offset_delta, 0.0);
        assert!(linked.link.has_jog());
        assert!((linked.link.target_y - 152.2).abs() < 1e-4);
    }

    #[test]
    fn source_gap_pulls_run_back_from_edge() {
        let mut config = EngineConfig::default();
        config.source_gap = 3.0;
        let linked = link_source(100.0, Rect::new(400.0, 70.0, 80.0, 60.0), 388.0, &config);
        assert_eq!(linked.link.end_x, 397.0);
        assert_eq!(linked.offset_delta, 0.0);
    }
}
