//! HCP dataset layout tables
//!
//! The BOLD run table is fixed: run ids are 1-based positions in
//! [`BOLD_NAMES`], and file names on disk are derived from them.
//!
//! ```text
//! <root>/subjects/<subject>/timeseries/bold<ID>_Atlas_MSMAll_Glasser360Cortical.npy
//! <root>/subjects/<subject>/EVs/<BOLD_NAME>/<condition>.txt
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};

/// BOLD acquisitions in id order (id = position + 1)
pub const BOLD_NAMES: [&str; 18] = [
    "rfMRI_REST1_LR",
    "rfMRI_REST1_RL",
    "rfMRI_REST2_LR",
    "rfMRI_REST2_RL",
    "tfMRI_MOTOR_RL",
    "tfMRI_MOTOR_LR",
    "tfMRI_WM_RL",
    "tfMRI_WM_LR",
    "tfMRI_EMOTION_RL",
    "tfMRI_EMOTION_LR",
    "tfMRI_GAMBLING_RL",
    "tfMRI_GAMBLING_LR",
    "tfMRI_LANGUAGE_RL",
    "tfMRI_LANGUAGE_LR",
    "tfMRI_RELATIONAL_RL",
    "tfMRI_RELATIONAL_LR",
    "tfMRI_SOCIAL_RL",
    "tfMRI_SOCIAL_LR",
];

/// BOLD name for a 1-based run id
#[must_use]
pub fn bold_name(run_id: usize) -> Option<&'static str> {
    run_id.checked_sub(1).and_then(|i| BOLD_NAMES.get(i).copied())
}

/// Time-series file name for a 1-based run id
#[must_use]
pub fn timeseries_file_name(run_id: usize) -> String {
    format!("bold{run_id}_Atlas_MSMAll_Glasser360Cortical.npy")
}

/// HCP acquisition protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Experiment {
    /// Resting state
    Rest,
    /// Motor task
    Motor,
    /// Working memory (N-back)
    WorkingMemory,
    /// Emotion processing
    Emotion,
    /// Gambling / incentive processing
    Gambling,
    /// Language processing
    Language,
    /// Relational processing
    Relational,
    /// Social cognition
    Social,
}

impl Experiment {
    /// All experiments in table order
    pub const ALL: [Self; 8] = [
        Self::Rest,
        Self::Motor,
        Self::WorkingMemory,
        Self::Emotion,
        Self::Gambling,
        Self::Language,
        Self::Relational,
        Self::Social,
    ];

    /// Code as it appears in BOLD names
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Rest => "REST",
            Self::Motor => "MOTOR",
            Self::WorkingMemory => "WM",
            Self::Emotion => "EMOTION",
            Self::Gambling => "GAMBLING",
            Self::Language => "LANGUAGE",
            Self::Relational => "RELATIONAL",
            Self::Social => "SOCIAL",
        }
    }

    /// Resolve an experiment from its code (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownExperiment`] if no experiment matches.
    pub fn from_name(name: &str) -> LayoutResult<Self> {
        let upper = name.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|e| e.code() == upper)
            .ok_or_else(|| LayoutError::UnknownExperiment {
                name: name.to_string(),
            })
    }

    /// 1-based BOLD run ids for this experiment, in table order
    #[must_use]
    pub fn run_ids(self) -> Vec<usize> {
        BOLD_NAMES
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                name.split('_')
                    .nth(1)
                    .is_some_and(|seg| seg.trim_end_matches(|c: char| c.is_ascii_digit()) == self.code())
            })
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// EV condition names available for this experiment
    #[must_use]
    pub const fn conditions(self) -> &'static [&'static str] {
        match self {
            Self::Rest => &[],
            Self::Motor => &["cue", "lf", "lh", "rf", "rh", "t"],
            Self::WorkingMemory => &[
                "0bk_body",
                "0bk_faces",
                "0bk_places",
                "0bk_tools",
                "2bk_body",
                "2bk_faces",
                "2bk_places",
                "2bk_tools",
                "0bk_cor",
                "0bk_err",
                "0bk_nlr",
                "2bk_cor",
                "2bk_err",
                "2bk_nlr",
            ],
            Self::Emotion => &["fear", "neut"],
            Self::Gambling => &["loss", "loss_event", "win", "win_event", "neut_event"],
            Self::Language => &["math", "story"],
            Self::Relational => &["match", "relation"],
            Self::Social => &["mental", "rnd"],
        }
    }

    /// Check that a condition name belongs to this experiment
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownCondition`] for names outside the table.
    pub fn validate_condition(self, condition: &str) -> LayoutResult<()> {
        if self.conditions().contains(&condition) {
            Ok(())
        } else {
            Err(LayoutError::UnknownCondition {
                experiment: self.code(),
                condition: condition.to_string(),
            })
        }
    }

    /// Resolve a run selection to 1-based run ids
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::RunOutOfRange`] if an index exceeds the run count.
    pub fn select_runs(self, selection: &RunSelection) -> LayoutResult<Vec<usize>> {
        let ids = self.run_ids();
        match selection {
            RunSelection::All => Ok(ids),
            RunSelection::Indices(indices) => indices
                .iter()
                .map(|&run| {
                    ids.get(run).copied().ok_or(LayoutError::RunOutOfRange {
                        run,
                        available: ids.len(),
                    })
                })
                .collect(),
        }
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which runs of an experiment to load
///
/// Indices are 0-based positions within the experiment's runs, so for WM
/// `0` is `tfMRI_WM_RL` and `1` is `tfMRI_WM_LR`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunSelection {
    /// Every run of the experiment
    #[default]
    All,
    /// Explicit run indices, in load order
    Indices(Vec<usize>),
}

impl RunSelection {
    /// Select a single run
    #[must_use]
    pub fn single(run: usize) -> Self {
        Self::Indices(vec![run])
    }
}

impl From<Vec<usize>> for RunSelection {
    fn from(indices: Vec<usize>) -> Self {
        Self::Indices(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids() {
        assert_eq!(Experiment::WorkingMemory.run_ids(), vec![7, 8]);
        assert_eq!(Experiment::Rest.run_ids(), vec![1, 2, 3, 4]);
        assert_eq!(Experiment::Social.run_ids(), vec![17, 18]);
        for exp in Experiment::ALL {
            assert!(!exp.run_ids().is_empty(), "{exp} has no runs");
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Experiment::from_name("wm"), Ok(Experiment::WorkingMemory));
        assert_eq!(Experiment::from_name("Motor"), Ok(Experiment::Motor));
        assert_eq!(
            Experiment::from_name("nback"),
            Err(LayoutError::UnknownExperiment {
                name: "nback".to_string()
            })
        );
    }

    #[test]
    fn test_validate_condition() {
        assert!(Experiment::WorkingMemory.validate_condition("2bk_faces").is_ok());
        assert!(matches!(
            Experiment::WorkingMemory.validate_condition("3bk_faces"),
            Err(LayoutError::UnknownCondition { experiment: "WM", .. })
        ));
        assert!(Experiment::Rest.validate_condition("anything").is_err());
    }

    #[test]
    fn test_select_runs() {
        let wm = Experiment::WorkingMemory;
        assert_eq!(wm.select_runs(&RunSelection::All), Ok(vec![7, 8]));
        assert_eq!(wm.select_runs(&RunSelection::single(1)), Ok(vec![8]));
        assert_eq!(wm.select_runs(&RunSelection::from(vec![1, 0])), Ok(vec![8, 7]));
        assert_eq!(
            wm.select_runs(&RunSelection::single(2)),
            Err(LayoutError::RunOutOfRange { run: 2, available: 2 })
        );
    }

    #[test]
    fn test_bold_names() {
        assert_eq!(bold_name(7), Some("tfMRI_WM_RL"));
        assert_eq!(bold_name(0), None);
        assert_eq!(bold_name(19), None);
        assert_eq!(timeseries_file_name(8), "bold8_Atlas_MSMAll_Glasser360Cortical.npy");
    }
}
