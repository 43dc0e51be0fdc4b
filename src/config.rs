use crate::error::{FishboneError, Result};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Constants of the layout engine. Defaults match the fishbone page layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Distance between a one-sided group and the spine.
    pub spine_gap: f32,
    /// The spine stays at least this far from the container's top and bottom.
    pub spine_margin: f32,
    /// Horizontal gap between the source anchor column and the source panel.
    pub line_gap: f32,
    /// Gap between a category panel edge and the start of its connector.
    pub category_line_gap: f32,
    /// Gap between the end of the source run and the source panel edge.
    pub source_gap: f32,
    /// Shortest connector stub kept when a panel nearly touches the spine.
    pub min_stub: f32,
    /// Deltas smaller than this snap to zero; offsets move only by at least this.
    pub jitter_tolerance: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            spine_gap: 12.0,
            spine_margin: 12.0,
            line_gap: 12.0,
            category_line_gap: 0.0,
            source_gap: 0.0,
            min_stub: 4.0,
            jitter_tolerance: 0.5,
        }
    }
}

/// Natural panel arrangement used when the crate plays the host itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelConfig {
    pub min_width: f32,
    pub max_text_width_chars: usize,
    pub padding_x: f32,
    pub padding_y: f32,
    pub header_height: f32,
    pub row_gap: f32,
    pub line_height: f32,
    pub column_gap: f32,
    /// Vertical band between the two rows where the spine runs.
    pub band_height: f32,
    pub source_gap: f32,
    pub source_width: f32,
    pub margin: f32,
    /// Shift the bottom row by half a column so connectors interleave.
    pub stagger_bottom_row: bool,
    /// Measure text from the per-character table instead of system fonts.
    pub fast_text_metrics: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            min_width: 160.0,
            max_text_width_chars: 28,
            padding_x: 10.0,
            padding_y: 8.0,
            header_height: 28.0,
            row_gap: 6.0,
            line_height: 1.4,
            column_gap: 36.0,
            band_height: 96.0,
            source_gap: 48.0,
            source_width: 180.0,
            margin: 24.0,
            stagger_bottom_row: true,
            fast_text_metrics: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub engine: EngineConfig,
    pub panels: PanelConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::modern();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            engine: EngineConfig::default(),
            panels: PanelConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    panel_fill: Option<String>,
    panel_border: Option<String>,
    panel_header_fill: Option<String>,
    panel_header_text_color: Option<String>,
    problem_text_color: Option<String>,
    solution_text_color: Option<String>,
    row_divider_color: Option<String>,
    source_fill: Option<String>,
    source_border: Option<String>,
    source_text_color: Option<String>,
    line_color: Option<String>,
    spine_width: Option<f32>,
    connector_width: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct EngineConfigFile {
    spine_gap: Option<f32>,
    spine_margin: Option<f32>,
    line_gap: Option<f32>,
    category_line_gap: Option<f32>,
    source_gap: Option<f32>,
    min_stub: Option<f32>,
    jitter_tolerance: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PanelConfigFile {
    min_width: Option<f32>,
    max_text_width_chars: Option<usize>,
    padding_x: Option<f32>,
    padding_y: Option<f32>,
    header_height: Option<f32>,
    row_gap: Option<f32>,
    line_height: Option<f32>,
    column_gap: Option<f32>,
    band_height: Option<f32>,
    source_gap: Option<f32>,
    source_width: Option<f32>,
    margin: Option<f32>,
    stagger_bottom_row: Option<bool>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    engine: Option<EngineConfigFile>,
    panels: Option<PanelConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path).map_err(|source| FishboneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents).map_err(|message| FishboneError::Config {
        path: path.to_path_buf(),
        message,
    })
}

/// Parses a JSON5 config document on top of the defaults.
pub fn parse_config(contents: &str) -> std::result::Result<Config, String> {
    let parsed: ConfigFile = json5::from_str(contents).map_err(|err| err.to_string())?;
    let mut config = Config::default();

    if let Some(name) = parsed.theme.as_deref() {
        config.theme = Theme::from_name(name).ok_or_else(|| format!("unknown theme `{name}`"))?;
    }
    if let Some(vars) = parsed.theme_variables {
        apply_theme_variables(&mut config.theme, vars);
    }
    if let Some(engine) = parsed.engine {
        apply_engine(&mut config.engine, engine);
    }
    if let Some(panels) = parsed.panels {
        apply_panels(&mut config.panels, panels);
    }
    validate(&config)?;

    config.render.background = config.theme.background.clone();
    Ok(config)
}

fn apply_theme_variables(theme: &mut Theme, vars: ThemeVariables) {
    if let Some(v) = vars.font_family {
        theme.font_family = v;
    }
    if let Some(v) = vars.font_size {
        theme.font_size = v;
    }
    if let Some(v) = vars.background {
        theme.background = v;
    }
    if let Some(v) = vars.panel_fill {
        theme.panel_fill = v;
    }
    if let Some(v) = vars.panel_border {
        theme.panel_border = v;
    }
    if let Some(v) = vars.panel_header_fill {
        theme.panel_header_fill = v;
    }
    if let Some(v) = vars.panel_header_text_color {
        theme.panel_header_text_color = v;
    }
    if let Some(v) = vars.problem_text_color {
        theme.problem_text_color = v;
    }
    if let Some(v) = vars.solution_text_color {
        theme.solution_text_color = v;
    }
    if let Some(v) = vars.row_divider_color {
        theme.row_divider_color = v;
    }
    if let Some(v) = vars.source_fill {
        theme.source_fill = v;
    }
    if let Some(v) = vars.source_border {
        theme.source_border = v;
    }
    if let Some(v) = vars.source_text_color {
        theme.source_text_color = v;
    }
    if let Some(v) = vars.line_color {
        theme.line_color = v;
    }
    if let Some(v) = vars.spine_width {
        theme.spine_width = v;
    }
    if let Some(v) = vars.connector_width {
        theme.connector_width = v;
    }
}

fn apply_engine(engine: &mut EngineConfig, file: EngineConfigFile) {
    if let Some(v) = file.spine_gap {
        engine.spine_gap = v;
    }
    if let Some(v) = file.spine_margin {
        engine.spine_margin = v;
    }
    if let Some(v) = file.line_gap {
        engine.line_gap = v;
    }
    if let Some(v) = file.category_line_gap {
        engine.category_line_gap = v;
    }
    if let Some(v) = file.source_gap {
        engine.source_gap = v;
    }
    if let Some(v) = file.min_stub {
        engine.min_stub = v;
    }
    if let Some(v) = file.jitter_tolerance {
        engine.jitter_tolerance = v;
    }
}

fn apply_panels(panels: &mut PanelConfig, file: PanelConfigFile) {
    if let Some(v) = file.min_width {
        panels.min_width = v;
    }
    if let Some(v) = file.max_text_width_chars {
        panels.max_text_width_chars = v;
    }
    if let Some(v) = file.padding_x {
        panels.padding_x = v;
    }
    if let Some(v) = file.padding_y {
        panels.padding_y = v;
    }
    if let Some(v) = file.header_height {
        panels.header_height = v;
    }
    if let Some(v) = file.row_gap {
        panels.row_gap = v;
    }
    if let Some(v) = file.line_height {
        panels.line_height = v;
    }
    if let Some(v) = file.column_gap {
        panels.column_gap = v;
    }
    if let Some(v) = file.band_height {
        panels.band_height = v;
    }
    if let Some(v) = file.source_gap {
        panels.source_gap = v;
    }
    if let Some(v) = file.source_width {
        panels.source_width = v;
    }
    if let Some(v) = file.margin {
        panels.margin = v;
    }
    if let Some(v) = file.stagger_bottom_row {
        panels.stagger_bottom_row = v;
    }
    if let Some(v) = file.fast_text_metrics {
        panels.fast_text_metrics = v;
    }
}

fn validate(config: &Config) -> std::result::Result<(), String> {
    let engine = &config.engine;
    let non_negative = [
        ("engine.spineGap", engine.spine_gap),
        ("engine.spineMargin", engine.spine_margin),
        ("engine.lineGap", engine.line_gap),
        ("engine.minStub", engine.min_stub),
        ("engine.jitterTolerance", engine.jitter_tolerance),
        ("themeVariables.fontSize", config.theme.font_size),
    ];
    for (name, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be a non-negative number, got {value}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let engine = EngineConfig::default();
        assert_eq!(engine.spine_gap, 12.0);
        assert_eq!(engine.spine_margin, 12.0);
        assert_eq!(engine.line_gap, 12.0);
        assert_eq!(engine.category_line_gap, 0.0);
        assert_eq!(engine.source_gap, 0.0);
        assert_eq!(engine.min_stub, 4.0);
        assert_eq!(engine.jitter_tolerance, 0.5);
    }

    #[test]
    fn parse_config_overrides_fields() {
        let config = parse_config(
            r##"{
                theme: "classic",
                themeVariables: { lineColor: "#000", spineWidth: 4 },
                engine: { spineGap: 20, jitterTolerance: 1 },
                panels: { fastTextMetrics: true },
            }"##,
        )
        .expect("config");
        assert_eq!(config.theme.line_color, "#000");
        assert_eq!(config.theme.spine_width, 4.0);
        assert_eq!(config.theme.font_size, 14.0);
        assert_eq!(config.engine.spine_gap, 20.0);
        assert_eq!(config.engine.jitter_tolerance, 1.0);
        assert_eq!(config.engine.line_gap, 12.0);
        assert!(config.panels.fast_text_metrics);
    }

    #[test]
    fn parse_config_rejects_negative_tolerance() {
        let err = parse_config(r#"{ engine: { jitterTolerance: -1 } }"#).unwrap_err();
        assert!(err.contains("jitterTolerance"));
    }

    #[test]
    fn parse_config_rejects_unknown_theme() {
        assert!(parse_config(r#"{ theme: "neon" }"#).is_err());
    }

    #[test]
    fn load_config_without_path_uses_defaults() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config.engine, EngineConfig::default());
    }
}
