//! Cortical surface meshes and region-to-vertex projection

use std::path::Path;

use crate::error::{VizError, VizResult};

/// Triangle mesh of one hemisphere
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceMesh {
    vertices: Vec<[f32; 3]>,
    faces: Vec<[u32; 3]>,
}

impl SurfaceMesh {
    /// Read a FreeSurfer binary surface (e.g. `lh.inflated`)
    ///
    /// # Errors
    ///
    /// Returns [`VizError::Mesh`] if the file cannot be parsed.
    pub fn from_freesurfer(path: &Path) -> VizResult<Self> {
        let surface = neuroformats::read_surf(path).map_err(|err| VizError::Mesh {
            path: path.to_path_buf(),
            reason: format!("{err:?}"),
        })?;

        let vertices = surface
            .mesh
            .vertices
            .chunks_exact(3)
            .map(|v| [v[0], v[1], v[2]])
            .collect();
        let faces = surface
            .mesh
            .faces
            .chunks_exact(3)
            .map(|f| {
                let index = |i: i32| {
                    u32::try_from(i).map_err(|_| VizError::Mesh {
                        path: path.to_path_buf(),
                        reason: format!("negative vertex index {i}"),
                    })
                };
                Ok([index(f[0])?, index(f[1])?, index(f[2])?])
            })
            .collect::<VizResult<Vec<_>>>()?;

        Self::from_parts(vertices, faces).map_err(|err| match err {
            VizError::Mesh { reason, .. } => VizError::Mesh {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Build from vertex positions and triangles
    ///
    /// # Errors
    ///
    /// Returns [`VizError::Mesh`] if a face points past the vertex list.
    pub fn from_parts(vertices: Vec<[f32; 3]>, faces: Vec<[u32; 3]>) -> VizResult<Self> {
        let n = vertices.len();
        if let Some(face) = faces.iter().find(|f| f.iter().any(|&i| i as usize >= n)) {
            return Err(VizError::Mesh {
                path: Path::new("<memory>").to_path_buf(),
                reason: format!("face {face:?} references a vertex past {n}"),
            });
        }
        Ok(Self { vertices, faces })
    }

    /// Vertex positions
    #[must_use]
    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    /// Triangles as vertex indices
    #[must_use]
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Number of vertices
    #[must_use]
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }
}

/// Per-vertex values from per-region values via atlas labels
///
/// Labels index the full region vector. Negative or out-of-range labels
/// give `None`.
#[must_use]
pub fn project_to_vertices(labels: &[i64], values: &[f64]) -> Vec<Option<f64>> {
    labels
        .iter()
        .map(|&label| usize::try_from(label).ok().and_then(|i| values.get(i)).copied())
        .collect()
}
