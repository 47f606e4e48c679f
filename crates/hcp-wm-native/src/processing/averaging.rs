//! Selective averaging
//!
//! Averages each region's signal over the frames covered by a condition's
//! events, pooled across runs. Frames past the end of a run are discarded
//! (timing files can reference acquisitions that were trimmed).

use hcp_wm_core::timing::condition_frames;
use hcp_wm_core::types::RunEvents;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ProcessingError, ProcessingResult};

/// Averager configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectiveAverager {
    /// Repetition time (seconds)
    pub tr_s: f64,
    /// Frames skipped at each event start
    pub skip: usize,
}

impl SelectiveAverager {
    /// Create an averager
    #[must_use]
    pub const fn new(tr_s: f64, skip: usize) -> Self {
        Self { tr_s, skip }
    }

    /// Per-region mean over all selected frames of all runs
    ///
    /// `series[i]` and `evs[i]` must describe the same run.
    ///
    /// # Errors
    ///
    /// - [`ProcessingError::LengthMismatch`] if the run counts differ
    /// - [`ProcessingError::RegionMismatch`] if runs disagree on regions
    /// - [`ProcessingError::EmptySelection`] if no frame survives clipping
    pub fn average(&self, series: &[Array2<f64>], evs: &[RunEvents]) -> ProcessingResult<Array1<f64>> {
        if series.len() != evs.len() {
            return Err(ProcessingError::LengthMismatch {
                series: series.len(),
                evs: evs.len(),
            });
        }

        let n_regions = series.first().map_or(0, Array2::nrows);
        let mut sum = Array1::<f64>::zeros(n_regions);
        let mut count = 0usize;

        for (run, (data, frames)) in series.iter().zip(condition_frames(evs, self.skip, self.tr_s)).enumerate() {
            if data.nrows() != n_regions {
                return Err(ProcessingError::RegionMismatch {
                    run,
                    expected: n_regions,
                    got: data.nrows(),
                });
            }

            let n_frames = data.ncols();
            let requested = frames.len();
            let mut kept = 0usize;
            for frame in frames.into_iter().filter(|&f| f < n_frames) {
                sum += &data.column(frame);
                kept += 1;
            }

            if kept < requested {
                warn!(
                    run,
                    requested,
                    kept,
                    n_frames,
                    "Event frames beyond end of run were discarded"
                );
            }
            count += kept;
        }

        if count == 0 {
            return Err(ProcessingError::EmptySelection { runs: series.len() });
        }

        debug!(frames = count, runs = series.len(), "Selective average");
        #[allow(clippy::cast_precision_loss)]
        let n = count as f64;
        Ok(sum / n)
    }
}

/// Per-region mean over the frames of each run's events
///
/// Convenience wrapper over [`SelectiveAverager::average`].
///
/// # Errors
///
/// See [`SelectiveAverager::average`].
pub fn selective_average(
    series: &[Array2<f64>],
    evs: &[RunEvents],
    skip: usize,
    tr_s: f64,
) -> ProcessingResult<Array1<f64>> {
    SelectiveAverager::new(tr_s, skip).average(series, evs)
}
