use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::layout::Layout;

/// Flat JSON mirror of a computed layout, for golden tests and for
/// eyeballing a drawing without wiring up a renderer.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: i32,
    pub height: i32,
    pub vertices: Vec<VertexDump>,
    pub edges: Vec<EdgeDump>,
    pub dummies: Vec<DummyDump>,
}

#[derive(Debug, Serialize)]
pub struct VertexDump {
    pub id: u32,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: u32,
    pub to: u32,
    pub points: Vec<[i32; 2]>,
}

#[derive(Debug, Serialize)]
pub struct DummyDump {
    pub id: u32,
    pub kind: String,
    pub x: i32,
    pub y: i32,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let vertices = layout
            .positions
            .iter()
            .map(|(&id, point)| VertexDump {
                id,
                x: point.x,
                y: point.y,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from,
                to: edge.to,
                points: edge.points.iter().map(|p| [p.x, p.y]).collect(),
            })
            .collect();

        let dummies = layout
            .dummy_vertices
            .iter()
            .map(|dummy| DummyDump {
                id: dummy.id,
                kind: format!("{:?}", dummy.kind),
                x: dummy.position.x,
                y: dummy.position.y,
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            vertices,
            edges,
            dummies,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
