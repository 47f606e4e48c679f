//! HCP dataset accessor
//!
//! Resolves subject and run identifiers to files under the data root and
//! loads them. Nothing is cached; each call opens and closes its own files.
//!
//! ```text
//! <root>/regions.npy
//! <root>/atlas.npz
//! <root>/subjects/<subject>/timeseries/bold<ID>_Atlas_MSMAll_Glasser360Cortical.npy
//! <root>/subjects/<subject>/EVs/<BOLD_NAME>/<condition>.txt
//! ```

pub mod evs;
pub mod npy;

use std::fs;
use std::path::{Path, PathBuf};

use hcp_wm_core::error::{LayoutError, LayoutResult};
use hcp_wm_core::layout::{bold_name, timeseries_file_name, Experiment, RunSelection};
use hcp_wm_core::types::{Hemisphere, Region, RunEvents, SubjectId};
use ndarray::{Array2, Axis};
use tracing::debug;

use crate::error::{DatasetError, DatasetResult};

pub use evs::{parse_ev_text, read_ev_file};
pub use npy::{read_f64_matrix, read_unicode_npy, write_unicode_npy, UnicodeArray};

/// Vertex-to-parcel lookup for both hemispheres
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceAtlas {
    /// Parcel index per left-hemisphere vertex
    pub left: Vec<i64>,
    /// Parcel index per right-hemisphere vertex
    pub right: Vec<i64>,
}

impl SurfaceAtlas {
    /// Labels for one hemisphere
    #[must_use]
    pub fn labels(&self, hemisphere: Hemisphere) -> &[i64] {
        match hemisphere {
            Hemisphere::Left => &self.left,
            Hemisphere::Right => &self.right,
        }
    }
}

/// Parcellated HCP data on disk
#[derive(Clone, Debug)]
pub struct HcpDataset {
    root: PathBuf,
    n_parcels: usize,
}

impl HcpDataset {
    /// Dataset rooted at `root` with `n_parcels` regions per series
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, n_parcels: usize) -> Self {
        Self {
            root: root.into(),
            n_parcels,
        }
    }

    /// Data root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Expected region count
    #[must_use]
    pub fn n_parcels(&self) -> usize {
        self.n_parcels
    }

    /// Directory of one subject
    #[must_use]
    pub fn subject_dir(&self, subject: SubjectId) -> PathBuf {
        self.root.join("subjects").join(subject.to_string())
    }

    /// Time-series file for a 1-based BOLD run id
    #[must_use]
    pub fn timeseries_path(&self, subject: SubjectId, run_id: usize) -> PathBuf {
        self.subject_dir(subject)
            .join("timeseries")
            .join(timeseries_file_name(run_id))
    }

    /// EV file for a 1-based BOLD run id and condition
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownRun`] if the run id is not in the BOLD
    /// table.
    pub fn ev_path(&self, subject: SubjectId, run_id: usize, condition: &str) -> LayoutResult<PathBuf> {
        let name = bold_name(run_id).ok_or(LayoutError::UnknownRun { run_id })?;
        Ok(self
            .subject_dir(subject)
            .join("EVs")
            .join(name)
            .join(format!("{condition}.txt")))
    }

    /// Subjects present under `subjects/`, sorted numerically
    ///
    /// # Errors
    ///
    /// Fails if the subjects directory cannot be listed.
    pub fn available_subjects(&self) -> DatasetResult<Vec<SubjectId>> {
        let dir = self.root.join("subjects");
        let entries = fs::read_dir(&dir).map_err(|source| DatasetError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut subjects: Vec<SubjectId> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().and_then(|s| s.parse().ok()))
            .collect();
        subjects.sort_unstable();
        Ok(subjects)
    }

    /// Load region metadata from `regions.npy` (rows: name, network, myelin)
    ///
    /// # Errors
    ///
    /// Fails if the table is missing, not `n_parcels × 3`, or a myelin
    /// value is not numeric.
    pub fn load_regions(&self) -> DatasetResult<Vec<Region>> {
        let path = self.root.join("regions.npy");
        let table = read_unicode_npy(&path)?;
        if table.shape != [self.n_parcels, 3] {
            return Err(DatasetError::Shape {
                what: "regions.npy",
                expected: format!("({}, 3)", self.n_parcels),
                got: table.shape,
            });
        }

        (0..self.n_parcels)
            .map(|index| {
                let row = table.row(index).ok_or_else(|| DatasetError::MalformedNpy {
                    path: path.clone(),
                    reason: format!("region {index} has no row"),
                })?;
                let myelin = row[2].trim().parse::<f64>().map_err(|_| DatasetError::MalformedNpy {
                    path: path.clone(),
                    reason: format!("myelin value '{}' of region {index} is not numeric", row[2]),
                })?;
                Ok(Region {
                    index,
                    name: row[0].clone(),
                    network: row[1].clone(),
                    myelin,
                    hemisphere: Hemisphere::for_parcel(index, self.n_parcels),
                })
            })
            .collect()
    }

    /// Load the vertex-to-parcel atlas from `atlas.npz`
    ///
    /// # Errors
    ///
    /// Fails if the archive or either label array is missing.
    pub fn load_atlas(&self) -> DatasetResult<SurfaceAtlas> {
        let path = self.root.join("atlas.npz");
        let mut npz = npy::open_npz(&path)?;
        let left = npy::read_npz_labels(&mut npz, &path, "labels_L")?.to_vec();
        let right = npy::read_npz_labels(&mut npz, &path, "labels_R")?.to_vec();
        debug!(left = left.len(), right = right.len(), "Loaded surface atlas");
        Ok(SurfaceAtlas { left, right })
    }

    /// Load one run's time series (regions × frames)
    ///
    /// With `remove_mean`, each region's mean over time is subtracted.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or does not have `n_parcels` rows.
    pub fn load_single_timeseries(
        &self,
        subject: SubjectId,
        run_id: usize,
        remove_mean: bool,
    ) -> DatasetResult<Array2<f64>> {
        let path = self.timeseries_path(subject, run_id);
        let mut series = read_f64_matrix(&path)?;
        if series.nrows() != self.n_parcels {
            return Err(DatasetError::Shape {
                what: "time series",
                expected: format!("({}, frames)", self.n_parcels),
                got: series.shape().to_vec(),
            });
        }
        if remove_mean {
            center_rows(&mut series);
        }
        Ok(series)
    }

    /// Load the selected runs of an experiment, one array per run
    ///
    /// # Errors
    ///
    /// Fails on a run index outside the experiment or any load failure.
    pub fn load_timeseries(
        &self,
        subject: SubjectId,
        experiment: Experiment,
        runs: &RunSelection,
        remove_mean: bool,
    ) -> DatasetResult<Vec<Array2<f64>>> {
        experiment
            .select_runs(runs)?
            .into_iter()
            .map(|run_id| self.load_single_timeseries(subject, run_id, remove_mean))
            .collect()
    }

    /// Load one condition's events for every run of an experiment
    ///
    /// # Errors
    ///
    /// Returns a layout error for an unknown condition, otherwise any
    /// I/O or parse failure.
    pub fn load_evs(
        &self,
        subject: SubjectId,
        experiment: Experiment,
        condition: &str,
    ) -> DatasetResult<Vec<RunEvents>> {
        experiment.validate_condition(condition)?;
        experiment
            .run_ids()
            .into_iter()
            .map(|run_id| {
                let path = self.ev_path(subject, run_id, condition)?;
                read_ev_file(&path)
            })
            .collect()
    }
}

/// Subtract each row's mean in place
pub fn center_rows(series: &mut Array2<f64>) {
    if let Some(means) = series.mean_axis(Axis(1)) {
        *series -= &means.insert_axis(Axis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_paths() {
        let ds = HcpDataset::new("/data/hcp", 360);
        assert_eq!(
            ds.timeseries_path(12, 7),
            PathBuf::from("/data/hcp/subjects/12/timeseries/bold7_Atlas_MSMAll_Glasser360Cortical.npy")
        );
        assert_eq!(
            ds.ev_path(12, 8, "2bk_tools"),
            Ok(PathBuf::from("/data/hcp/subjects/12/EVs/tfMRI_WM_LR/2bk_tools.txt"))
        );
        assert_eq!(ds.ev_path(12, 42, "2bk_tools"), Err(LayoutError::UnknownRun { run_id: 42 }));
    }

    #[test]
    fn test_empty_region_table_is_malformed() {
        // `<U0` items decode to empty strings, so the myelin column cannot parse
        let dir = tempfile::tempdir().unwrap();
        let header = "{'descr': '<U0', 'fortran_order': False, 'shape': (2, 3), }";
        let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
        bytes.extend_from_slice(&u16::try_from(header.len()).unwrap().to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        fs::write(dir.path().join("regions.npy"), bytes).unwrap();

        let err = HcpDataset::new(dir.path(), 2).load_regions().unwrap_err();
        assert!(matches!(err, DatasetError::MalformedNpy { .. }));
    }

    #[test]
    fn test_center_rows() {
        let mut series = array![[1.0, 2.0, 3.0], [10.0, 10.0, 13.0]];
        center_rows(&mut series);
        assert_eq!(series, array![[-1.0, 0.0, 1.0], [-1.0, -1.0, 2.0]]);
    }

    #[test]
    fn test_unknown_condition_rejected_before_io() {
        let ds = HcpDataset::new("/nonexistent", 360);
        let err = ds.load_evs(0, Experiment::WorkingMemory, "3bk_body").unwrap_err();
        assert!(matches!(err, DatasetError::Layout(_)));
    }

    #[test]
    fn test_run_selection_out_of_range() {
        let ds = HcpDataset::new("/nonexistent", 360);
        let err = ds
            .load_timeseries(0, Experiment::WorkingMemory, &RunSelection::single(5), true)
            .unwrap_err();
        assert!(matches!(err, DatasetError::Layout(_)));
    }
}
