use crate::config::PanelConfig;
use crate::geometry::{CategoryRect, Rect, SnapshotGeometry};
use crate::ir::{Category, Diagram, PanelId, Placement};
use crate::text::{TextBlock, TextStyle, average_char_width, measure_text};
use crate::theme::Theme;

#[derive(Debug, Clone)]
pub struct RowBox {
    pub problem: TextBlock,
    pub solution: Option<TextBlock>,
    /// Offset of the row's top from the panel's top.
    pub top: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct PanelBox {
    pub id: PanelId,
    pub rect: Rect,
    pub header: TextBlock,
    pub rows: Vec<RowBox>,
}

#[derive(Debug, Clone)]
pub struct SourceBox {
    pub rect: Rect,
    pub label: TextBlock,
    pub detail: Option<TextBlock>,
}

#[derive(Debug, Clone)]
pub struct Arrangement {
    pub container: Rect,
    pub source: SourceBox,
    /// Visible panels in display order.
    pub panels: Vec<PanelBox>,
}

impl Arrangement {
    /// Geometry as the engine would measure it before any offset is applied.
    pub fn geometry(&self) -> SnapshotGeometry {
        let mut geometry = SnapshotGeometry::new(self.container, self.source.rect);
        geometry.categories = self
            .panels
            .iter()
            .map(|panel| CategoryRect {
                id: panel.id.clone(),
                rect: panel.rect,
                content_rows: panel.rows.len(),
            })
            .collect();
        geometry
    }

    pub fn panel(&self, id: &PanelId) -> Option<&PanelBox> {
        self.panels.iter().find(|panel| &panel.id == id)
    }
}

/// Sizes panels from their content and places them in two rows around a band
/// for the spine, with the source panel to the right.
pub fn arrange_diagram(diagram: &Diagram, theme: &Theme, config: &PanelConfig) -> Arrangement {
    let style = TextStyle {
        font_family: &theme.font_family,
        font_size: theme.font_size,
        line_height: config.line_height,
        fast_metrics: config.fast_text_metrics,
    };
    let max_text_width = config.max_text_width_chars.max(1) as f32 * average_char_width(style);

    let mut upper: Vec<PanelBox> = Vec::new();
    let mut lower: Vec<PanelBox> = Vec::new();
    let mut order: Vec<PanelId> = Vec::new();
    for category in diagram.visible_categories() {
        let panel = size_panel(category, style, max_text_width, config);
        order.push(panel.id.clone());
        let goes_up = match category.placement {
            Placement::Top => true,
            Placement::Bottom => false,
            Placement::Other => upper.len() <= lower.len(),
        };
        if goes_up {
            upper.push(panel);
        } else {
            lower.push(panel);
        }
    }

    let column_width = upper
        .iter()
        .chain(lower.iter())
        .map(|panel| panel.rect.width)
        .fold(config.min_width, f32::max);
    let pitch = column_width + config.column_gap;
    let upper_height = row_height(&upper);
    let lower_height = row_height(&lower);

    let band_top = config.margin + upper_height;
    let band_bottom = band_top + config.band_height;
    let stagger = if config.stagger_bottom_row && !upper.is_empty() {
        pitch / 2.0
    } else {
        0.0
    };

    for (idx, panel) in upper.iter_mut().enumerate() {
        panel.rect.left = config.margin + idx as f32 * pitch + (column_width - panel.rect.width) / 2.0;
        panel.rect.top = band_top - panel.rect.height;
    }
    for (idx, panel) in lower.iter_mut().enumerate() {
        panel.rect.left =
            config.margin + stagger + idx as f32 * pitch + (column_width - panel.rect.width) / 2.0;
        panel.rect.top = band_bottom;
    }

    let rows_right = upper
        .iter()
        .chain(lower.iter())
        .map(|panel| panel.rect.right())
        .fold(config.margin, f32::max);
    let mut source = size_source(diagram, style, max_text_width, config);
    source.rect.left = rows_right + config.source_gap;
    source.rect.top = band_top + config.band_height / 2.0 - source.rect.height / 2.0;

    let content_bottom = (band_bottom + lower_height).max(source.rect.bottom());
    let container = Rect::new(
        0.0,
        0.0,
        source.rect.right() + config.margin,
        content_bottom + config.margin,
    );

    let mut panels: Vec<PanelBox> = upper.into_iter().chain(lower).collect();
    panels.sort_by_key(|panel| order.iter().position(|id| id == &panel.id));
    tracing::debug!(
        panels = panels.len(),
        width = container.width,
        height = container.height,
        "arranged fishbone panels"
    );

    Arrangement {
        container,
        source,
        panels,
    }
}

fn size_panel(
    category: &Category,
    style: TextStyle<'_>,
    max_text_width: f32,
    config: &PanelConfig,
) -> PanelBox {
    let header = measure_text(category.display_label(), max_text_width, style);
    let header_height = config.header_height.max(header.height + config.padding_y);

    let mut rows = Vec::with_capacity(category.rows.len());
    let mut cursor = header_height + config.padding_y;
    let mut text_width = header.width;
    for row in &category.rows {
        let problem = measure_text(&row.problem, max_text_width, style);
        let solution = row
            .solution
            .as_deref()
            .map(|solution| measure_text(solution, max_text_width, style));
        let height = problem.height + solution.as_ref().map_or(0.0, |block| block.height);
        text_width = solution
            .as_ref()
            .map_or(problem.width, |block| block.width.max(problem.width))
            .max(text_width);
        rows.push(RowBox {
            problem,
            solution,
            top: cursor,
            height,
        });
        cursor += height + config.row_gap;
    }
    if !rows.is_empty() {
        cursor -= config.row_gap;
    }

    PanelBox {
        id: category.code.clone(),
        rect: Rect::new(
            0.0,
            0.0,
            (text_width + 2.0 * config.padding_x).max(config.min_width),
            cursor + config.padding_y,
        ),
        header,
        rows,
    }
}

fn size_source(
    diagram: &Diagram,
    style: TextStyle<'_>,
    max_text_width: f32,
    config: &PanelConfig,
) -> SourceBox {
    let label = measure_text(&diagram.source.label, max_text_width, style);
    let detail = diagram
        .source
        .detail
        .as_deref()
        .map(|detail| measure_text(detail, max_text_width, style));
    let text_width = detail
        .as_ref()
        .map_or(label.width, |block| block.width.max(label.width));
    let text_height = label.height + detail.as_ref().map_or(0.0, |block| block.height);
    SourceBox {
        rect: Rect::new(
            0.0,
            0.0,
            (text_width + 2.0 * config.padding_x).max(config.source_width),
            text_height + 2.0 * config.padding_y,
        ),
        label,
        detail,
    }
}

fn row_height(panels: &[PanelBox]) -> f32 {
    panels
        .iter()
        .map(|panel| panel.rect.height)
        .fold(0.0, f32::max)
}
