use crate::arrange::{Arrangement, PanelBox};
use crate::config::{PanelConfig, RenderConfig};
use crate::geometry::{Rect, SnapshotGeometry};
use crate::layout::FishboneLayout;
use crate::text::TextBlock;
use crate::theme::Theme;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

/// What the renderer draws besides the computed lines.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    /// Natural rects; offsets from the layout are applied on top.
    pub geometry: &'a SnapshotGeometry,
    /// Panel contents. Without it panels are drawn as labelled boxes.
    pub arrangement: Option<&'a Arrangement>,
    pub title: Option<&'a str>,
}

pub fn render_svg(
    scene: &Scene<'_>,
    layout: &FishboneLayout,
    theme: &Theme,
    config: &PanelConfig,
) -> String {
    let container = scene.geometry.container.unwrap_or_default();
    let width = container.width.max(200.0);
    let height = container.height.max(120.0);
    let mut svg = String::new();

    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    );
    if let Some(title) = scene.title {
        let _ = write!(svg, "<title>{}</title>", escape_xml(title));
    }
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    );

    push_lines(&mut svg, layout, theme);

    for entry in &scene.geometry.categories {
        if entry.content_rows == 0 || scene.geometry.detached.contains(&entry.id) {
            continue;
        }
        let dx = layout.category_offset(&entry.id);
        let content = scene.arrangement.and_then(|arrangement| arrangement.panel(&entry.id));
        let _ = write!(svg, "<g class=\"category\" transform=\"translate({dx:.2},0)\">");
        push_panel(&mut svg, entry.rect, entry.id.as_str(), content, theme, config);
        svg.push_str("</g>");
    }

    if let Some(source) = scene.geometry.source {
        let _ = write!(
            svg,
            "<g class=\"source\" transform=\"translate(0,{:.2})\">",
            layout.source_offset
        );
        push_source(&mut svg, source, scene.arrangement, theme, config);
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

fn push_lines(svg: &mut String, layout: &FishboneLayout, theme: &Theme) {
    let Some(spine) = layout.spine else {
        return;
    };
    svg.push_str("<g class=\"lines\" fill=\"none\" stroke-linecap=\"round\">");
    let _ = write!(
        svg,
        "<line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        spine.x1,
        spine.x2,
        theme.line_color,
        theme.spine_width,
        y = spine.y,
    );
    for line in &layout.connectors {
        if line.y1 == line.y2 {
            continue;
        }
        let _ = write!(
            svg,
            "<line x1=\"{x:.2}\" y1=\"{:.2}\" x2=\"{x:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{}\"/>",
            line.y1,
            line.y2,
            theme.line_color,
            theme.connector_width,
            x = line.x,
        );
    }
    if let Some(link) = layout.source_link {
        let mut d = format!("M {:.2} {:.2}", link.join_x, link.spine_y);
        if link.has_jog() {
            let _ = write!(d, " L {:.2} {:.2}", link.join_x, link.target_y);
        }
        let _ = write!(d, " L {:.2} {:.2}", link.end_x, link.target_y);
        let _ = write!(
            svg,
            "<path d=\"{d}\" stroke=\"{}\" stroke-width=\"{}\"/>",
            theme.line_color, theme.spine_width
        );
    }
    svg.push_str("</g>");
}

fn push_panel(
    svg: &mut String,
    rect: Rect,
    fallback_label: &str,
    content: Option<&PanelBox>,
    theme: &Theme,
    config: &PanelConfig,
) {
    let _ = write!(
        svg,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"6\" ry=\"6\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.2\"/>",
        rect.left, rect.top, rect.width, rect.height, theme.panel_fill, theme.panel_border
    );
    let header_height = config.header_height.min(rect.height);
    let _ = write!(
        svg,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"6\" ry=\"6\" fill=\"{}\"/>",
        rect.left, rect.top, rect.width, header_height, theme.panel_header_fill
    );

    let Some(panel) = content else {
        push_text_lines(
            svg,
            rect.center_x(),
            rect.top + header_height / 2.0,
            &[fallback_label.to_string()],
            "middle",
            &theme.panel_header_text_color,
            theme,
            config.line_height,
        );
        return;
    };

    push_block(
        svg,
        rect.center_x(),
        rect.top + header_height / 2.0,
        &panel.header,
        "middle",
        &theme.panel_header_text_color,
        theme,
        config.line_height,
    );
    let text_x = rect.left + config.padding_x;
    for (idx, row) in panel.rows.iter().enumerate() {
        let row_top = rect.top + row.top;
        if idx > 0 {
            let divider_y = row_top - config.row_gap / 2.0;
            let _ = write!(
                svg,
                "<line x1=\"{:.2}\" y1=\"{divider_y:.2}\" x2=\"{:.2}\" y2=\"{divider_y:.2}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
                rect.left + config.padding_x,
                rect.right() - config.padding_x,
                theme.row_divider_color
            );
        }
        push_block(
            svg,
            text_x,
            row_top + row.problem.height / 2.0,
            &row.problem,
            "start",
            &theme.problem_text_color,
            theme,
            config.line_height,
        );
        if let Some(solution) = &row.solution {
            push_block(
                svg,
                text_x,
                row_top + row.problem.height + solution.height / 2.0,
                solution,
                "start",
                &theme.solution_text_color,
                theme,
                config.line_height,
            );
        }
    }
}

fn push_source(
    svg: &mut String,
    rect: Rect,
    arrangement: Option<&Arrangement>,
    theme: &Theme,
    config: &PanelConfig,
) {
    let _ = write!(
        svg,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"8\" ry=\"8\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.6\"/>",
        rect.left, rect.top, rect.width, rect.height, theme.source_fill, theme.source_border
    );
    let Some(source) = arrangement.map(|arrangement| &arrangement.source) else {
        return;
    };
    let detail_height = source.detail.as_ref().map_or(0.0, |block| block.height);
    let label_center = rect.center_y() - detail_height / 2.0;
    push_block(
        svg,
        rect.center_x(),
        label_center,
        &source.label,
        "middle",
        &theme.source_text_color,
        theme,
        config.line_height,
    );
    if let Some(detail) = &source.detail {
        push_block(
            svg,
            rect.center_x(),
            label_center + source.label.height / 2.0 + detail.height / 2.0,
            detail,
            "middle",
            &theme.source_text_color,
            theme,
            config.line_height,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn push_block(
    svg: &mut String,
    x: f32,
    center_y: f32,
    block: &TextBlock,
    anchor: &str,
    fill: &str,
    theme: &Theme,
    line_height: f32,
) {
    push_text_lines(svg, x, center_y, &block.lines, anchor, fill, theme, line_height);
}

#[allow(clippy::too_many_arguments)]
fn push_text_lines(
    svg: &mut String,
    x: f32,
    center_y: f32,
    lines: &[String],
    anchor: &str,
    fill: &str,
    theme: &Theme,
    line_height: f32,
) {
    let step = theme.font_size * line_height;
    let total = lines.len() as f32 * step;
    // First baseline: top of the block plus one font size, centered in its step.
    let start_y = center_y - total / 2.0 + (step + theme.font_size) / 2.0 - theme.font_size * 0.15;
    let _ = write!(
        svg,
        "<text x=\"{x:.2}\" y=\"{start_y:.2}\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{}\" fill=\"{fill}\">",
        escape_xml(&theme.font_family),
        theme.font_size,
    );
    for (idx, line) in lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { step };
        let _ = write!(svg, "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>", escape_xml(line));
    }
    svg.push_str("</text>");
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options {
        font_family: "Inter".to_string(),
        ..Default::default()
    };
    opt.fontdb_mut().load_system_fonts();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;
    if let Some(color) = parse_hex_color(&render_cfg.background) {
        pixmap.fill(color);
    }

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

#[cfg(feature = "png")]
fn parse_hex_color(value: &str) -> Option<resvg::tiny_skia::Color> {
    let hex = value.trim().strip_prefix('#')?;
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    match hex.len() {
        6 => Some(resvg::tiny_skia::Color::from_rgba8(
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            255,
        )),
        _ => None,
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrange::arrange_diagram;
    use crate::config::EngineConfig;
    use crate::layout::compute_layout;
    use crate::parser::parse_diagram;

    fn panel_config() -> PanelConfig {
        PanelConfig {
            fast_text_metrics: true,
            ..PanelConfig::default()
        }
    }

    #[test]
    fn render_svg_draws_lines_and_content() {
        let diagram = parse_diagram(
            r#"{
                title: "Late <shipments>",
                source: { label: "Late shipments" },
                categories: [
                    { code: "MAN", label: "Man", placement: "top",
                      rows: [{ problem: "short staffed", solution: "hire" }] },
                    { code: "METHOD", label: "Method", placement: "bottom",
                      rows: [{ problem: "no checklist" }] },
                ],
            }"#,
        )
        .expect("diagram");
        let theme = Theme::modern();
        let config = panel_config();
        let arrangement = arrange_diagram(&diagram, &theme, &config);
        let geometry = arrangement.geometry();
        let layout = compute_layout(&geometry, &EngineConfig::default());
        let scene = Scene {
            geometry: &geometry,
            arrangement: Some(&arrangement),
            title: diagram.title.as_deref(),
        };
        let svg = render_svg(&scene, &layout, &theme, &config);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Late &lt;shipments&gt;"));
        assert!(svg.contains("short staffed"));
        assert!(svg.contains("hire"));
        assert_eq!(svg.matches("class=\"category\"").count(), 2);
        // spine plus two connectors
        assert_eq!(svg.matches("<line x1").count(), 3);
        assert!(svg.contains("<path d=\"M "));
    }

    #[test]
    fn empty_layout_draws_no_lines() {
        let geometry = SnapshotGeometry::new(
            Rect::new(0.0, 0.0, 400.0, 200.0),
            Rect::new(250.0, 70.0, 100.0, 60.0),
        );
        let scene = Scene {
            geometry: &geometry,
            arrangement: None,
            title: None,
        };
        let svg = render_svg(&scene, &FishboneLayout::empty(), &Theme::classic(), &panel_config());
        assert!(!svg.contains("class=\"lines\""));
        assert!(svg.contains("class=\"source\""));
    }

    #[test]
    fn offsets_become_transforms() {
        let geometry = SnapshotGeometry::new(
            Rect::new(0.0, 0.0, 800.0, 400.0),
            Rect::new(612.0, 170.0, 150.0, 60.0),
        )
        .with_category("T1", Rect::new(50.0, 20.0, 100.0, 100.0))
        .with_category("B1", Rect::new(100.0, 220.0, 100.0, 100.0));
        let layout = compute_layout(&geometry, &EngineConfig::default());
        let scene = Scene {
            geometry: &geometry,
            arrangement: None,
            title: None,
        };
        let svg = render_svg(&scene, &layout, &Theme::modern(), &panel_config());
        // B1 moves from 150 to the slot between 100 and 600.
        assert!(svg.contains("translate(200.00,0)"));
        assert!(svg.contains(&format!("translate(0,{:.2})", layout.source_offset)));
        assert!(svg.contains(">B1<"));
    }
}
