//! Core data types for parcellated HCP data
//!
//! # Parcel ordering
//!
//! The HCP-MMP1 parcellation lists 180 right-hemisphere parcels followed by
//! 180 left-hemisphere parcels. [`Hemisphere::for_parcel`] relies on that
//! ordering.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Subject identifier (directory name under `subjects/`)
pub type SubjectId = u32;

/// Cortical hemisphere
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    /// Right hemisphere
    Right,
    /// Left hemisphere
    Left,
}

impl Hemisphere {
    /// Hemisphere of a parcel given its index in a list of `n_parcels`
    #[must_use]
    pub const fn for_parcel(index: usize, n_parcels: usize) -> Self {
        if index < n_parcels / 2 {
            Self::Right
        } else {
            Self::Left
        }
    }

    /// Short suffix used in output file names
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Left => "left",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Right => write!(f, "Right"),
            Self::Left => write!(f, "Left"),
        }
    }
}

/// One cortical parcel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Position in the parcel list (column index in time series)
    pub index: usize,
    /// Parcel name (e.g. `R_V1`)
    pub name: String,
    /// Network membership
    pub network: String,
    /// Average myelin value
    pub myelin: f64,
    /// Hemisphere, derived from index
    pub hemisphere: Hemisphere,
}

/// One occurrence of a task condition within a run
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Onset (seconds from run start)
    pub onset_s: f64,
    /// Duration (seconds)
    pub duration_s: f64,
    /// Amplitude (EV weight; unused for averaging)
    pub amplitude: f64,
}

impl Event {
    /// Create a new event
    #[must_use]
    pub const fn new(onset_s: f64, duration_s: f64, amplitude: f64) -> Self {
        Self {
            onset_s,
            duration_s,
            amplitude,
        }
    }
}

/// All events of one condition in one run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunEvents {
    events: Vec<Event>,
}

impl RunEvents {
    /// Create an empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a list of events
    #[must_use]
    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Append an event
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Number of events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if the run has no events for this condition
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in file order
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Onset column (seconds)
    #[must_use]
    pub fn onsets(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.onset_s).collect()
    }

    /// Duration column (seconds)
    #[must_use]
    pub fn durations(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.duration_s).collect()
    }

    /// Total event time in seconds
    #[must_use]
    pub fn total_duration_s(&self) -> f64 {
        self.events.iter().map(|e| e.duration_s).sum()
    }
}

impl<'a> IntoIterator for &'a RunEvents {
    type Item = &'a Event;
    type IntoIter = core::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
