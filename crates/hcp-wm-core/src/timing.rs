//! Event window to frame-index extraction
//!
//! An event starting at `onset` seconds and lasting `duration` seconds covers
//! frames `floor(onset/TR) .. floor(onset/TR) + ceil(duration/TR)`. The first
//! `skip` frames of every event are dropped to let the hemodynamic response
//! build up.
//!
//! Overlapping events are not merged: a frame covered by two events appears
//! twice and is counted twice by the averager.

use crate::types::{Event, RunEvents};

/// Frame span covered by one event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameWindow {
    /// First frame (may be negative for a negative onset)
    pub start: i64,
    /// Number of frames covered
    pub len: usize,
}

impl FrameWindow {
    /// Compute the window of an event for a sampling interval `tr_s`
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_event(event: &Event, tr_s: f64) -> Self {
        let start = (event.onset_s / tr_s).floor() as i64;
        let len = (event.duration_s / tr_s).ceil().max(0.0) as usize;
        Self { start, len }
    }

    /// Absolute frame indices after skipping the first `skip` frames
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn frames(self, skip: usize) -> impl Iterator<Item = usize> {
        (skip..self.len)
            .map(move |k| self.start + k as i64)
            .filter(|&f| f >= 0)
            .map(|f| f as usize)
    }
}

/// Frame indices for every event of one run, concatenated in event order
#[must_use]
pub fn run_frames(run: &RunEvents, skip: usize, tr_s: f64) -> Vec<usize> {
    run.into_iter()
        .flat_map(|event| FrameWindow::from_event(event, tr_s).frames(skip))
        .collect()
}

/// Frame indices per run for a condition
///
/// The result has one entry per input run, possibly empty.
#[must_use]
pub fn condition_frames(runs: &[RunEvents], skip: usize, tr_s: f64) -> Vec<Vec<usize>> {
    runs.iter().map(|run| run_frames(run, skip, tr_s)).collect()
}
