//! End-to-end decoding over a dataset
//!
//! ```text
//! subjects ──► load runs + EVs ──► selective average per condition
//!                                          │
//!                     DesignMatrixBuilder ◄┘
//!                              │
//!              build(scheme) ──► DecodingTrainer ──► DecodingRun
//! ```

use hcp_wm_core::config::AnalysisConfig;
use hcp_wm_core::layout::{Experiment, RunSelection};
use hcp_wm_core::types::SubjectId;
use ndarray::Array1;
use tracing::{debug, info};

use crate::dataset::HcpDataset;
use crate::error::{PipelineError, PipelineResult};
use crate::ml::trainer::{DecodingRun, DecodingTrainer};
use crate::processing::averaging::SelectiveAverager;
use crate::processing::design::{DesignMatrixBuilder, LabelScheme};

/// Decoding pipeline bound to a dataset and configuration
#[derive(Clone, Debug)]
pub struct DecodingPipeline {
    dataset: HcpDataset,
    config: AnalysisConfig,
    experiment: Experiment,
}

impl DecodingPipeline {
    /// Validate the configuration and bind it to a dataset
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] for an invalid configuration.
    pub fn new(dataset: HcpDataset, config: AnalysisConfig) -> PipelineResult<Self> {
        config.validate()?;
        let experiment = config.experiment()?;
        Ok(Self {
            dataset,
            config,
            experiment,
        })
    }

    /// Dataset in use
    #[must_use]
    pub fn dataset(&self) -> &HcpDataset {
        &self.dataset
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// One subject's condition averages, in configured condition order
    ///
    /// # Errors
    ///
    /// Fails on any load error, or if a condition selects no frames.
    pub fn subject_averages(&self, subject: SubjectId) -> PipelineResult<Vec<Array1<f64>>> {
        let series =
            self.dataset
                .load_timeseries(subject, self.experiment, &RunSelection::All, self.config.remove_mean)?;
        let averager = SelectiveAverager::new(self.config.tr_s, self.config.skip_frames);

        self.config
            .conditions
            .iter()
            .map(|condition| {
                let evs = self.dataset.load_evs(subject, self.experiment, condition)?;
                averager
                    .average(&series, &evs)
                    .map_err(|source| PipelineError::Subject {
                        subject,
                        condition: condition.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// Averages for every subject, stacked into a builder
    ///
    /// # Errors
    ///
    /// Propagates the first failing subject.
    pub fn collect_design(&self, subjects: &[SubjectId]) -> PipelineResult<DesignMatrixBuilder> {
        info!(subjects = subjects.len(), conditions = self.config.conditions.len(), "Averaging subjects");
        let mut builder = DesignMatrixBuilder::new(
            self.config.n_parcels,
            self.config.conditions.clone(),
            self.config.categories.clone(),
        );
        for &subject in subjects {
            let averages = self.subject_averages(subject)?;
            builder.push_subject(subject, &averages)?;
            debug!(subject, "Subject averaged");
        }
        Ok(builder)
    }

    /// Trainer with the configured split, model, repetitions and seed
    #[must_use]
    pub fn trainer(&self) -> DecodingTrainer {
        DecodingTrainer::new(
            self.config.split.clone(),
            self.config.model.clone(),
            self.config.repetitions,
            self.config.seed,
        )
    }

    /// Decode one label scheme from a filled builder
    ///
    /// # Errors
    ///
    /// Fails if the design cannot be built or training fails.
    pub fn decode(&self, builder: &DesignMatrixBuilder, scheme: LabelScheme) -> PipelineResult<DecodingRun> {
        let design = builder.build(scheme)?;
        Ok(self.trainer().run(&design, scheme)?)
    }
}
