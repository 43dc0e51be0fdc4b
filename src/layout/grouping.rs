use super::PanelGeometry;

/// Splits panels into the rows above and below the vertical midpoint of
/// their centers. Only `center_y` decides membership.
pub(super) fn group_panels(panels: &[PanelGeometry]) -> (Vec<PanelGeometry>, Vec<PanelGeometry>) {
    let Some(first) = panels.first() else {
        return (Vec::new(), Vec::new());
    };
    let (min_y, max_y) = panels
        .iter()
        .fold((first.center_y, first.center_y), |(lo, hi), panel| {
            (lo.min(panel.center_y), hi.max(panel.center_y))
        });
    let mid = (min_y + max_y) / 2.0;

    panels
        .iter()
        .cloned()
        .partition(|panel| panel.center_y <= mid)
}
