//! Standalone plotly `mesh3d` documents

use serde::Serialize;
use serde_json::json;

use super::colormap::{to_hex, ColdHot, UNASSIGNED};
use super::surface::SurfaceMesh;
use crate::error::VizResult;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

/// Plotly trace and layout for one hemisphere
#[derive(Clone, Debug, Serialize)]
pub struct SurfaceScene {
    /// Document title
    pub title: String,
    /// Saturation bound used for the colors
    pub vmax: f64,
    /// Vertex x coordinates
    pub x: Vec<f32>,
    /// Vertex y coordinates
    pub y: Vec<f32>,
    /// Vertex z coordinates
    pub z: Vec<f32>,
    /// First vertex of each face
    pub i: Vec<u32>,
    /// Second vertex of each face
    pub j: Vec<u32>,
    /// Third vertex of each face
    pub k: Vec<u32>,
    /// `#rrggbb` per vertex
    pub vertex_colors: Vec<String>,
}

impl SurfaceScene {
    /// Color a mesh with per-vertex values (`None` is unassigned)
    #[must_use]
    pub fn new(title: impl Into<String>, mesh: &SurfaceMesh, vertex_values: &[Option<f64>], colormap: ColdHot) -> Self {
        let vertices = mesh.vertices();
        let faces = mesh.faces();
        let vertex_colors = (0..vertices.len())
            .map(|v| {
                let color = vertex_values
                    .get(v)
                    .copied()
                    .flatten()
                    .map_or(UNASSIGNED, |value| colormap.sample(value));
                to_hex(color)
            })
            .collect();

        Self {
            title: title.into(),
            vmax: colormap.vmax(),
            x: vertices.iter().map(|v| v[0]).collect(),
            y: vertices.iter().map(|v| v[1]).collect(),
            z: vertices.iter().map(|v| v[2]).collect(),
            i: faces.iter().map(|f| f[0]).collect(),
            j: faces.iter().map(|f| f[1]).collect(),
            k: faces.iter().map(|f| f[2]).collect(),
            vertex_colors,
        }
    }

    /// Render as a self-contained HTML page
    ///
    /// # Errors
    ///
    /// Fails only if the scene cannot be serialized.
    pub fn to_html(&self) -> VizResult<String> {
        let trace = json!([{
            "type": "mesh3d",
            "x": self.x,
            "y": self.y,
            "z": self.z,
            "i": self.i,
            "j": self.j,
            "k": self.k,
            "vertexcolor": self.vertex_colors,
            "flatshading": false,
            "hoverinfo": "skip",
        }]);
        let layout = json!({
            "title": { "text": format!("{} (vmax = {:.3})", self.title, self.vmax) },
            "paper_bgcolor": "white",
            "margin": { "l": 0, "r": 0, "t": 40, "b": 0 },
            "scene": {
                "xaxis": { "visible": false },
                "yaxis": { "visible": false },
                "zaxis": { "visible": false },
                "aspectmode": "data",
            },
        });

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body style="margin:0">
<div id="surface" style="width:100vw;height:100vh"></div>
<script>
Plotly.newPlot("surface", {trace}, {layout});
</script>
</body>
</html>
"#,
            title = escape_html(&self.title),
            trace = serde_json::to_string(&trace)?,
            layout = serde_json::to_string(&layout)?,
        ))
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> SurfaceMesh {
        SurfaceMesh::from_parts(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![[0, 1, 2]]).unwrap()
    }

    #[test]
    fn test_scene_colors() {
        let scene = SurfaceScene::new("t", &triangle(), &[Some(1.0), None, Some(-1.0)], ColdHot::new(1.0));
        assert_eq!(scene.vertex_colors, vec!["#ffff00", "#808080", "#00ffff"]);
        assert_eq!(scene.i, vec![0]);
        assert_eq!(scene.k, vec![2]);
    }

    #[test]
    fn test_short_values_are_unassigned() {
        let scene = SurfaceScene::new("t", &triangle(), &[Some(0.0)], ColdHot::new(1.0));
        assert_eq!(scene.vertex_colors[2], "#808080");
    }

    #[test]
    fn test_html_embeds_trace() {
        let scene = SurfaceScene::new("a <b>", &triangle(), &[Some(0.5); 3], ColdHot::new(1.0));
        let html = scene.to_html().unwrap();
        assert!(html.contains("\"type\":\"mesh3d\""));
        assert!(html.contains("\"vertexcolor\""));
        assert!(html.contains("<title>a &lt;b&gt;</title>"));
        assert!(html.contains(PLOTLY_CDN));
    }
}
