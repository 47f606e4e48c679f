//! Design matrix construction
//!
//! Rows are (subject, condition) samples in subject-major order; columns are
//! regions. The condition list is laid out in memory-load blocks of equal
//! length, one entry per stimulus category:
//!
//! ```text
//! index:     0        1         2          3         4        5  ...
//! cond:   0bk_body 0bk_faces 0bk_places 0bk_tools 2bk_body 2bk_faces ...
//! load:      0        0         0          0         1        1  ...
//! category:  0        1         2          3         0        1  ...
//! ```

use hcp_wm_core::types::SubjectId;
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, ProcessingResult};

/// How condition positions map to class labels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelScheme {
    /// Binary 0-back vs 2-back (block index)
    MemoryLoad,
    /// Stimulus category within a block
    StimulusCategory,
}

impl LabelScheme {
    /// Both schemes in reporting order
    pub const ALL: [Self; 2] = [Self::MemoryLoad, Self::StimulusCategory];

    /// Label for the condition at `condition_index`
    #[must_use]
    pub const fn label(self, condition_index: usize, block_len: usize) -> usize {
        match self {
            Self::MemoryLoad => condition_index / block_len,
            Self::StimulusCategory => condition_index % block_len,
        }
    }

    /// Class names, indexed by label
    #[must_use]
    pub fn class_names(self, conditions: &[String], categories: &[String]) -> Vec<String> {
        match self {
            Self::MemoryLoad => conditions
                .chunks(categories.len().max(1))
                .map(|block| {
                    block
                        .first()
                        .and_then(|c| c.split('_').next())
                        .unwrap_or_default()
                        .to_string()
                })
                .collect(),
            Self::StimulusCategory => categories.to_vec(),
        }
    }

    /// Directory / file stem for outputs
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::MemoryLoad => "memory_load",
            Self::StimulusCategory => "category",
        }
    }
}

/// Identity of one design row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleKey {
    /// Subject id
    pub subject: SubjectId,
    /// Position in the condition list
    pub condition: usize,
}

/// Samples × regions matrix with one label per row
#[derive(Clone, Debug)]
pub struct DesignMatrix {
    x: Array2<f64>,
    labels: Vec<usize>,
    keys: Vec<SampleKey>,
    class_names: Vec<String>,
}

impl DesignMatrix {
    /// Assemble a design matrix
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::LabelMismatch`] unless labels and keys
    /// both have one entry per row.
    pub fn new(
        x: Array2<f64>,
        labels: Vec<usize>,
        keys: Vec<SampleKey>,
        class_names: Vec<String>,
    ) -> ProcessingResult<Self> {
        if labels.len() != x.nrows() || keys.len() != x.nrows() {
            return Err(ProcessingError::LabelMismatch {
                labels: labels.len(),
                rows: x.nrows(),
            });
        }
        Ok(Self {
            x,
            labels,
            keys,
            class_names,
        })
    }

    /// Feature matrix
    #[must_use]
    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    /// Labels in row order
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Row identities
    #[must_use]
    pub fn keys(&self) -> &[SampleKey] {
        &self.keys
    }

    /// Class names indexed by label
    #[must_use]
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Sorted distinct labels
    #[must_use]
    pub fn classes(&self) -> Vec<usize> {
        let mut classes = self.labels.clone();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    /// Number of samples
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    /// Number of regions
    #[must_use]
    pub fn n_regions(&self) -> usize {
        self.x.ncols()
    }
}

/// Accumulates per-subject condition averages
#[derive(Clone, Debug)]
pub struct DesignMatrixBuilder {
    n_regions: usize,
    conditions: Vec<String>,
    categories: Vec<String>,
    values: Vec<f64>,
    keys: Vec<SampleKey>,
}

impl DesignMatrixBuilder {
    /// Builder for `n_regions` columns over the given condition blocks
    #[must_use]
    pub fn new(n_regions: usize, conditions: Vec<String>, categories: Vec<String>) -> Self {
        Self {
            n_regions,
            conditions,
            categories,
            values: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Add one subject's condition averages, in condition-list order
    ///
    /// # Errors
    ///
    /// Rejects a wrong number of averages or a wrong vector length.
    pub fn push_subject(&mut self, subject: SubjectId, averages: &[Array1<f64>]) -> ProcessingResult<()> {
        if averages.len() != self.conditions.len() {
            return Err(ProcessingError::ConditionCount {
                subject,
                expected: self.conditions.len(),
                got: averages.len(),
            });
        }
        if let Some((run, avg)) = averages
            .iter()
            .enumerate()
            .find(|(_, a)| a.len() != self.n_regions)
        {
            return Err(ProcessingError::RegionMismatch {
                run,
                expected: self.n_regions,
                got: avg.len(),
            });
        }

        for (condition, avg) in averages.iter().enumerate() {
            self.values.extend(avg.iter().copied());
            self.keys.push(SampleKey { subject, condition });
        }
        Ok(())
    }

    /// Number of subjects added so far
    #[must_use]
    pub fn n_subjects(&self) -> usize {
        self.keys.len() / self.conditions.len().max(1)
    }

    /// Build the design matrix under a label scheme
    ///
    /// # Errors
    ///
    /// Fails only if internal row bookkeeping is inconsistent.
    pub fn build(&self, scheme: LabelScheme) -> ProcessingResult<DesignMatrix> {
        let rows = self.keys.len();
        let x = Array2::from_shape_vec((rows, self.n_regions), self.values.clone()).map_err(|_| {
            ProcessingError::LabelMismatch {
                labels: rows,
                rows: self.values.len() / self.n_regions.max(1),
            }
        })?;

        let block_len = self.categories.len().max(1);
        let labels = self
            .keys
            .iter()
            .map(|k| scheme.label(k.condition, block_len))
            .collect();

        DesignMatrix::new(
            x,
            labels,
            self.keys.clone(),
            scheme.class_names(&self.conditions, &self.categories),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcp_wm_core::config::{WM_CATEGORIES, WM_CONDITIONS};

    fn builder(n_regions: usize) -> DesignMatrixBuilder {
        DesignMatrixBuilder::new(
            n_regions,
            WM_CONDITIONS.iter().map(ToString::to_string).collect(),
            WM_CATEGORIES.iter().map(ToString::to_string).collect(),
        )
    }

    fn averages(subject: u32, n_regions: usize) -> Vec<Array1<f64>> {
        (0..8)
            .map(|c| Array1::from_elem(n_regions, f64::from(subject) * 10.0 + f64::from(c)))
            .collect()
    }

    #[test]
    fn test_label_patterns() {
        let load: Vec<_> = (0..8).map(|i| LabelScheme::MemoryLoad.label(i, 4)).collect();
        let cat: Vec<_> = (0..8).map(|i| LabelScheme::StimulusCategory.label(i, 4)).collect();
        assert_eq!(load, vec![0, 0, 0, 0, 1, 1, 1, 1]);
        assert_eq!(cat, vec![0, 1, 2, 3, 0, 1, 2, 3]);
    }

    #[test]
    fn test_rows_are_subjects_times_conditions() {
        let mut b = builder(6);
        for s in 0..3 {
            b.push_subject(s, &averages(s, 6)).unwrap();
        }
        assert_eq!(b.n_subjects(), 3);

        for scheme in LabelScheme::ALL {
            let design = b.build(scheme).unwrap();
            assert_eq!(design.n_samples(), 3 * 8);
            assert_eq!(design.labels().len(), design.n_samples());
            assert_eq!(design.n_regions(), 6);
        }
    }

    #[test]
    fn test_subject_major_order() {
        let mut b = builder(2);
        b.push_subject(4, &averages(4, 2)).unwrap();
        b.push_subject(7, &averages(7, 2)).unwrap();
        let design = b.build(LabelScheme::StimulusCategory).unwrap();

        assert_eq!(design.keys()[9], SampleKey { subject: 7, condition: 1 });
        assert_eq!(design.x()[[9, 0]], 71.0);
        assert_eq!(design.labels()[9], 1);
        assert_eq!(design.classes(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_class_names() {
        let b = builder(1);
        assert_eq!(b.build(LabelScheme::MemoryLoad).unwrap().class_names(), ["0bk", "2bk"]);
        assert_eq!(
            b.build(LabelScheme::StimulusCategory).unwrap().class_names(),
            ["body", "faces", "places", "tools"]
        );
    }

    #[test]
    fn test_rejects_wrong_condition_count() {
        let mut b = builder(2);
        let err = b.push_subject(0, &averages(0, 2)[..5]).unwrap_err();
        assert_eq!(
            err,
            ProcessingError::ConditionCount {
                subject: 0,
                expected: 8,
                got: 5
            }
        );
    }

    #[test]
    fn test_rejects_label_length_mismatch() {
        let err = DesignMatrix::new(Array2::zeros((3, 2)), vec![0, 1], Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err, ProcessingError::LabelMismatch { labels: 2, rows: 3 });
    }
}
