use crate::geometry::{Rect, SnapshotGeometry};
use crate::layout::{ConnectorLine, FishboneLayout, SourceLink, Spine};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub revision: u64,
    pub spine: Option<Spine>,
    pub connectors: Vec<ConnectorLine>,
    pub source_link: Option<SourceLink>,
    pub source: Option<SourceDump>,
    pub panels: Vec<PanelDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelDump {
    pub id: String,
    pub natural: Rect,
    pub dx: f32,
    pub rendered: Rect,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDump {
    pub natural: Rect,
    pub dy: f32,
    pub rendered: Rect,
}

impl LayoutDump {
    pub fn from_layout(layout: &FishboneLayout, geometry: &SnapshotGeometry) -> Self {
        let container = geometry.container.unwrap_or_default();
        let panels = geometry
            .categories
            .iter()
            .filter(|entry| entry.content_rows > 0 && !geometry.detached.contains(&entry.id))
            .map(|entry| {
                let dx = layout.category_offset(&entry.id);
                PanelDump {
                    id: entry.id.to_string(),
                    natural: entry.rect,
                    dx,
                    rendered: entry.rect.translated(dx, 0.0),
                }
            })
            .collect();
        let source = geometry.source.map(|rect| SourceDump {
            natural: rect,
            dy: layout.source_offset,
            rendered: rect.translated(0.0, layout.source_offset),
        });

        LayoutDump {
            width: container.width,
            height: container.height,
            revision: layout.revision,
            spine: layout.spine,
            connectors: layout.connectors.clone(),
            source_link: layout.source_link,
            source,
            panels,
        }
    }
}

pub fn layout_dump_json(layout: &FishboneLayout, geometry: &SnapshotGeometry) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&LayoutDump::from_layout(layout, geometry))
}

pub fn write_layout_dump(path: &Path, layout: &FishboneLayout, geometry: &SnapshotGeometry) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, geometry);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
