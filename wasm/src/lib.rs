use fishbone_layout::{RenderOptions, Theme, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FishboneRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    fast_text: Option<bool>,
    jitter_tolerance: Option<f32>,
    max_passes: Option<usize>,
}

fn build_render_options(options: FishboneRenderOptions) -> RenderOptions {
    let mut render_options = RenderOptions::modern();
    if let Some(theme) = options.theme.as_deref().and_then(Theme::from_name) {
        render_options.theme = theme;
    }

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    if let Some(fast_text) = options.fast_text {
        render_options.panels.fast_text_metrics = fast_text;
    }
    if let Some(tolerance) = options.jitter_tolerance {
        render_options.engine.jitter_tolerance = tolerance.max(0.0);
    }
    if let Some(max_passes) = options.max_passes {
        render_options.max_passes = max_passes;
    }

    render_options
}

#[wasm_bindgen]
pub fn render_fishbone_svg(diagram_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<FishboneRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        FishboneRenderOptions::default()
    };

    let render_options = build_render_options(options);
    render_with_options(diagram_json, render_options)
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use fishbone_layout::render_with_options;

    use crate::{FishboneRenderOptions, build_render_options};

    #[test]
    fn renders_categories_on_both_sides_of_the_spine() {
        let diagram = r#"{
            "title": "Late deliveries",
            "source": { "label": "Orders ship late" },
            "categories": [
                { "code": "MAN", "label": "People", "placement": "top",
                  "rows": [{ "problem": "new staff", "solution": "pairing" }] },
                { "code": "MACHINE", "label": "Machines", "placement": "top",
                  "rows": [{ "problem": "printer jams" }] },
                { "code": "METHOD", "label": "Process", "placement": "bottom",
                  "rows": [{ "problem": "manual picking" }] }
            ]
        }"#;

        let svg = render_with_options(diagram, build_render_options(FishboneRenderOptions::default()))
            .expect("diagram should render");

        assert!(svg.contains("<svg"));
        assert!(svg.contains("People"));
        assert!(svg.contains("Orders ship late"));
    }

    #[test]
    fn options_override_theme_and_tolerance() {
        let options: FishboneRenderOptions =
            serde_json::from_str(r#"{"theme":"classic","fontSize":18,"jitterTolerance":2.0}"#)
                .expect("options");
        let built = build_render_options(options);
        assert_eq!(built.theme.font_size, 18.0);
        assert_eq!(built.engine.jitter_tolerance, 2.0);
    }
}
