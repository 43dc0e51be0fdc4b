pub mod arrange;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod pan;
pub mod parser;
pub mod render;
pub mod scheduler;
pub mod text;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, EngineConfig, PanelConfig};
pub use error::FishboneError;
pub use geometry::{GeometrySource, Rect, SnapshotGeometry};
pub use ir::{Diagram, PanelId};
pub use layout::{FishboneLayout, compute_layout};
pub use pan::{PanController, PointerEvent, Viewport};
pub use parser::parse_diagram;
pub use render::{Scene, render_svg};
pub use scheduler::{ManualClock, RecomputeScheduler, Trigger};
pub use theme::Theme;

/// Drives a scheduler over in-memory geometry the way a page would: mount,
/// run the frame, apply the offsets, re-measure, until nothing changes or
/// `max_passes` frames have run. Returns the settled geometry (with offsets
/// applied) and the final layout.
pub fn settle_layout(
    geometry: SnapshotGeometry,
    config: &EngineConfig,
    max_passes: usize,
) -> (SnapshotGeometry, FishboneLayout) {
    let mut scheduler = RecomputeScheduler::new(geometry, ManualClock::new(), config.clone());
    scheduler.mount();
    for pass in 0..max_passes.max(1) {
        let changed = scheduler.flush();
        let layout = scheduler.layout().clone();
        scheduler.geometry_mut().apply_layout(&layout);
        if !changed {
            tracing::debug!(passes = pass + 1, "fishbone layout settled");
            break;
        }
        scheduler.notify(Trigger::WindowResize);
    }
    scheduler.teardown();
    let layout = scheduler.layout().clone();
    let geometry = scheduler.geometry().clone();
    (geometry, layout)
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub theme: Theme,
    pub engine: EngineConfig,
    pub panels: PanelConfig,
    pub max_passes: usize,
}

impl RenderOptions {
    pub fn modern() -> Self {
        Self {
            theme: Theme::modern(),
            engine: EngineConfig::default(),
            panels: PanelConfig::default(),
            max_passes: 8,
        }
    }

    pub fn classic() -> Self {
        Self {
            theme: Theme::classic(),
            ..Self::modern()
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::modern()
    }
}

/// Parses, arranges, lays out and renders a diagram description to SVG.
pub fn render_with_options(input: &str, options: RenderOptions) -> Result<String, FishboneError> {
    let diagram = parse_diagram(input)?;
    let arrangement = arrange::arrange_diagram(&diagram, &options.theme, &options.panels);
    let (geometry, layout) = settle_layout(arrangement.geometry(), &options.engine, options.max_passes);
    let scene = Scene {
        geometry: &geometry,
        arrangement: Some(&arrangement),
        title: diagram.title.as_deref(),
    };
    Ok(render_svg(&scene, &layout, &options.theme, &options.panels))
}
