//! Persistence of decoding runs
//!
//! Layout under `<out>/<task>/`:
//!
//! | File | Contents |
//! |------|----------|
//! | `accuracies.npy` | `f64[R]` |
//! | `coefs.npy` | `f64[R, regions]` (binary) or `f64[R, classes, regions]` |
//! | `best_c.npy` | `f64[R]` |
//! | `summary.json` | statistics, class names, configuration |
//! | `networks.json` | network summary of the mean coefficients per class |

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use hcp_wm_core::config::AnalysisConfig;
use hcp_wm_core::math::MeanStd;
use hcp_wm_core::types::Region;
use ndarray::{Array1, Axis};
use ndarray_npy::WritableElement;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ResultsError, ResultsResult};
use crate::ml::trainer::DecodingRun;
use crate::processing::networks::{summarize_networks, NetworkEntry};

/// Statistics written to `summary.json`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Output directory name of the task
    pub task: String,
    /// Class names indexed by label
    pub class_names: Vec<String>,
    /// Class named by each coefficient row (positive class for binary)
    pub coef_rows: Vec<String>,
    /// Number of repetitions
    pub repetitions: usize,
    /// Test accuracy mean and population std
    pub accuracy: MeanStd,
    /// Test accuracy per repetition
    pub accuracies: Vec<f64>,
    /// Chosen C per repetition
    pub best_c: Vec<f64>,
    /// Split seed per repetition
    pub seeds: Vec<u64>,
    /// Element-wise coefficient mean, one row per coefficient row
    pub coef_mean: Vec<Vec<f64>>,
    /// Element-wise coefficient population std
    pub coef_std: Vec<Vec<f64>>,
    /// Configuration the run used
    pub config: AnalysisConfig,
}

/// Network summary of one coefficient row, written to `networks.json`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassNetworks {
    /// Class the row belongs to
    pub class: String,
    /// Per network and hemisphere aggregates
    pub networks: Vec<NetworkEntry>,
}

/// Writes decoding runs under an output root
#[derive(Clone, Debug)]
pub struct ResultsWriter {
    root: PathBuf,
}

impl ResultsWriter {
    /// Writer rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory for a task
    #[must_use]
    pub fn task_dir(&self, run: &DecodingRun) -> PathBuf {
        self.root.join(run.scheme.slug())
    }

    /// Write arrays and JSON summaries for one run; returns the task directory
    ///
    /// # Errors
    ///
    /// Fails on I/O or serialization errors, or inconsistent coefficient
    /// shapes.
    pub fn write_run(&self, run: &DecodingRun, config: &AnalysisConfig, regions: &[Region]) -> ResultsResult<PathBuf> {
        let dir = self.task_dir(run);
        fs::create_dir_all(&dir).map_err(|source| ResultsError::Io {
            path: dir.clone(),
            source,
        })?;

        write_array(&dir.join("accuracies.npy"), &Array1::from(run.accuracies()))?;
        write_array(&dir.join("best_c.npy"), &Array1::from(run.best_cs()))?;

        let coefs = run.stacked_coefs()?;
        if coefs.len_of(Axis(1)) == 1 {
            write_array(&dir.join("coefs.npy"), &coefs.index_axis(Axis(1), 0))?;
        } else {
            write_array(&dir.join("coefs.npy"), &coefs)?;
        }

        let coef_rows = run.coef_row_names();
        let summary = TaskSummary {
            task: run.scheme.slug().to_string(),
            class_names: run.class_names.clone(),
            coef_rows: coef_rows.clone(),
            repetitions: run.repetitions.len(),
            accuracy: run.summary.accuracy,
            accuracies: run.accuracies(),
            best_c: run.best_cs(),
            seeds: run.repetitions.iter().map(|r| r.seed).collect(),
            coef_mean: run.summary.coef_mean.outer_iter().map(|r| r.to_vec()).collect(),
            coef_std: run.summary.coef_std.outer_iter().map(|r| r.to_vec()).collect(),
            config: config.clone(),
        };
        write_json(&dir.join("summary.json"), &summary)?;

        let networks: Vec<ClassNetworks> = coef_rows
            .into_iter()
            .zip(run.summary.coef_mean.outer_iter())
            .map(|(class, row)| ClassNetworks {
                class,
                networks: summarize_networks(regions, &row.to_vec()),
            })
            .collect();
        write_json(&dir.join("networks.json"), &networks)?;

        info!(dir = %dir.display(), "Wrote results");
        Ok(dir)
    }
}

fn write_array<A, S, D>(path: &Path, array: &ndarray::ArrayBase<S, D>) -> ResultsResult<()>
where
    A: WritableElement,
    S: ndarray::Data<Elem = A>,
    D: ndarray::Dimension,
{
    ndarray_npy::write_npy(path, array).map_err(|err| ResultsError::Npy {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> ResultsResult<()> {
    let file = File::create(path).map_err(|source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}
