//! Surface rendering of region vectors
//!
//! Region values are spread onto each hemisphere's vertices through the
//! atlas lookup, colored with a cold-hot map, and written as one standalone
//! HTML view per hemisphere.

pub mod colormap;
pub mod html;
pub mod surface;

use std::fs;
use std::path::{Path, PathBuf};

use hcp_wm_core::types::Hemisphere;
use tracing::debug;

pub use colormap::{ColdHot, Rgb};
pub use html::SurfaceScene;
pub use surface::{project_to_vertices, SurfaceMesh};

use crate::dataset::SurfaceAtlas;
use crate::error::{VizError, VizResult};
use crate::ml::trainer::DecodingRun;

/// Renders region vectors onto both hemispheres
#[derive(Clone, Debug)]
pub struct SurfaceRenderer {
    left: SurfaceMesh,
    right: SurfaceMesh,
    atlas: SurfaceAtlas,
}

impl SurfaceRenderer {
    /// Pair meshes with the atlas
    ///
    /// # Errors
    ///
    /// Returns [`VizError::LabelCount`] if a hemisphere's label count differs
    /// from its vertex count.
    pub fn new(left: SurfaceMesh, right: SurfaceMesh, atlas: SurfaceAtlas) -> VizResult<Self> {
        for (mesh, labels) in [(&left, &atlas.left), (&right, &atlas.right)] {
            if mesh.n_vertices() != labels.len() {
                return Err(VizError::LabelCount {
                    labels: labels.len(),
                    vertices: mesh.n_vertices(),
                });
            }
        }
        Ok(Self { left, right, atlas })
    }

    /// Load FreeSurfer meshes and pair them with the atlas
    ///
    /// # Errors
    ///
    /// Fails if a mesh cannot be read or does not match the atlas.
    pub fn from_files(left: &Path, right: &Path, atlas: SurfaceAtlas) -> VizResult<Self> {
        Self::new(SurfaceMesh::from_freesurfer(left)?, SurfaceMesh::from_freesurfer(right)?, atlas)
    }

    /// Mesh for one hemisphere
    #[must_use]
    pub fn mesh(&self, hemisphere: Hemisphere) -> &SurfaceMesh {
        match hemisphere {
            Hemisphere::Left => &self.left,
            Hemisphere::Right => &self.right,
        }
    }

    /// Scene for one hemisphere
    #[must_use]
    pub fn scene(&self, hemisphere: Hemisphere, values: &[f64], colormap: ColdHot, title: &str) -> SurfaceScene {
        let vertex_values = project_to_vertices(self.atlas.labels(hemisphere), values);
        SurfaceScene::new(format!("{title} ({hemisphere})"), self.mesh(hemisphere), &vertex_values, colormap)
    }

    /// Write `<stem>_left.html` and `<stem>_right.html` under `out_dir`
    ///
    /// `vmax` defaults to the largest magnitude in `values`. Returns the
    /// written paths, left first.
    ///
    /// # Errors
    ///
    /// Fails if the directory or a file cannot be written.
    pub fn render_pair(
        &self,
        values: &[f64],
        vmax: Option<f64>,
        title: &str,
        out_dir: &Path,
        stem: &str,
    ) -> VizResult<[PathBuf; 2]> {
        fs::create_dir_all(out_dir).map_err(|source| VizError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;
        let colormap = vmax.map_or_else(|| ColdHot::fitted(values), ColdHot::new);

        let mut written = [PathBuf::new(), PathBuf::new()];
        for (slot, hemisphere) in written.iter_mut().zip([Hemisphere::Left, Hemisphere::Right]) {
            let html = self.scene(hemisphere, values, colormap, title).to_html()?;
            let path = out_dir.join(format!("{stem}_{}.html", hemisphere.suffix()));
            fs::write(&path, html).map_err(|source| VizError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "Wrote surface view");
            *slot = path;
        }
        Ok(written)
    }

    /// Views for every repetition and for the mean, under `out_dir`
    ///
    /// Stems are `rep_<r>` and `mean`; models with several coefficient rows
    /// get the class name appended (`rep_0_faces`). Returns every path
    /// written.
    ///
    /// # Errors
    ///
    /// Fails on the first file that cannot be written.
    pub fn render_run(&self, run: &DecodingRun, vmax: Option<f64>, out_dir: &Path) -> VizResult<Vec<PathBuf>> {
        let row_names = run.coef_row_names();
        let per_class = row_names.len() > 1;
        let stem_for = |base: &str, row: usize| {
            if per_class {
                format!("{base}_{}", row_names[row])
            } else {
                base.to_string()
            }
        };
        let task = run.scheme.slug();

        let mut written = Vec::new();
        for rep in &run.repetitions {
            for (row, coef) in rep.model.coef().outer_iter().enumerate() {
                let base = format!("rep_{}", rep.index);
                let title = format!("{task} {} ({})", base, row_names[row]);
                written.extend(self.render_pair(&coef.to_vec(), vmax, &title, out_dir, &stem_for(&base, row))?);
            }
        }
        for (row, coef) in run.summary.coef_mean.outer_iter().enumerate() {
            let title = format!("{task} mean ({})", row_names[row]);
            written.extend(self.render_pair(&coef.to_vec(), vmax, &title, out_dir, &stem_for("mean", row))?);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> SurfaceMesh {
        SurfaceMesh::from_parts(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![[0, 1, 2]]).unwrap()
    }

    fn atlas() -> SurfaceAtlas {
        SurfaceAtlas {
            left: vec![2, 3, -1],
            right: vec![0, 1, 1],
        }
    }

    #[test]
    fn test_label_count_checked() {
        let short = SurfaceAtlas {
            left: vec![0, 1],
            right: vec![0, 1, 1],
        };
        assert!(matches!(
            SurfaceRenderer::new(triangle(), triangle(), short),
            Err(VizError::LabelCount { labels: 2, vertices: 3 })
        ));
    }

    #[test]
    fn test_scene_uses_hemisphere_labels() {
        let renderer = SurfaceRenderer::new(triangle(), triangle(), atlas()).unwrap();
        let values = [1.0, -1.0, 1.0, 0.0];
        let left = renderer.scene(Hemisphere::Left, &values, ColdHot::new(1.0), "x");
        assert_eq!(left.vertex_colors, vec!["#ffff00", "#000000", "#808080"]);
        let right = renderer.scene(Hemisphere::Right, &values, ColdHot::new(1.0), "x");
        assert_eq!(right.vertex_colors[1], "#00ffff");
    }

    #[test]
    fn test_render_pair_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SurfaceRenderer::new(triangle(), triangle(), atlas()).unwrap();
        let [left, right] = renderer
            .render_pair(&[0.1, 0.2, 0.3, 0.4], None, "mean", &dir.path().join("surface"), "mean")
            .unwrap();

        assert!(left.ends_with("mean_left.html"));
        assert!(right.ends_with("mean_right.html"));
        assert!(fs::read_to_string(left).unwrap().contains("mesh3d"));
    }
}
