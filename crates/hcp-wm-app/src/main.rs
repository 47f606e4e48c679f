//! HCP WM Application
//!
//! Command-line entry point for working-memory decoding on parcellated HCP
//! data.
//!
//! # Usage
//!
//! ```bash
//! # Decode both tasks with the default constants
//! hcp-wm decode --data-dir /data/hcp --out-dir results
//!
//! # Binary task only, 5 repetitions, first 100 subjects, with surface views
//! hcp-wm decode --data-dir /data/hcp --out-dir results --task memory-load \
//!     --repetitions 5 --subjects 100 \
//!     --left-mesh fsaverage/lh.inflated --right-mesh fsaverage/rh.inflated
//!
//! # Look at one subject's files
//! hcp-wm inspect --data-dir /data/hcp --subject 3
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use hcp_wm_core::config::AnalysisConfig;
use hcp_wm_core::layout::RunSelection;
use hcp_wm_core::types::{Hemisphere, SubjectId};
use hcp_wm_native::dataset::HcpDataset;
use hcp_wm_native::pipeline::DecodingPipeline;
use hcp_wm_native::processing::LabelScheme;
use hcp_wm_native::results::ResultsWriter;
use hcp_wm_native::viz::SurfaceRenderer;

/// HCP working-memory decoding
#[derive(Parser, Debug)]
#[command(name = "hcp-wm")]
#[command(author, version, about = "Decode working-memory conditions from parcellated HCP fMRI", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// JSON file overriding analysis defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Average, decode, persist and render
    Decode {
        /// Dataset root (regions.npy, atlas.npz, subjects/)
        #[arg(long)]
        data_dir: PathBuf,

        /// Output root
        #[arg(long)]
        out_dir: PathBuf,

        /// Which decoding task to run
        #[arg(long, value_enum, default_value = "all")]
        task: Task,

        /// Number of split/fit/score repetitions
        #[arg(long)]
        repetitions: Option<usize>,

        /// Base seed for repetition seeds
        #[arg(long)]
        seed: Option<u64>,

        /// Use only the first N subjects
        #[arg(long)]
        subjects: Option<u32>,

        /// FreeSurfer left-hemisphere surface (e.g. lh.inflated)
        #[arg(long, requires = "right_mesh")]
        left_mesh: Option<PathBuf>,

        /// FreeSurfer right-hemisphere surface (e.g. rh.inflated)
        #[arg(long, requires = "left_mesh")]
        right_mesh: Option<PathBuf>,

        /// Colormap saturation bound (default: max |coefficient|)
        #[arg(long)]
        vmax: Option<f64>,
    },

    /// Summarize the region table, atlas and one subject's events
    Inspect {
        /// Dataset root
        #[arg(long)]
        data_dir: PathBuf,

        /// Subject to inspect
        #[arg(long, default_value = "0")]
        subject: SubjectId,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Task {
    /// 0-back vs 2-back
    MemoryLoad,
    /// Body / faces / places / tools
    Category,
    /// Both tasks
    All,
}

impl Task {
    fn schemes(self) -> Vec<LabelScheme> {
        match self {
            Self::MemoryLoad => vec![LabelScheme::MemoryLoad],
            Self::Category => vec![LabelScheme::StimulusCategory],
            Self::All => LabelScheme::ALL.to_vec(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("HCP WM v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Decode {
            data_dir,
            out_dir,
            task,
            repetitions,
            seed,
            subjects,
            left_mesh,
            right_mesh,
            vmax,
        } => {
            let mut config = config;
            if let Some(repetitions) = repetitions {
                config.repetitions = repetitions;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if let Some(subjects) = subjects {
                config.n_subjects = subjects;
            }
            if vmax.is_some() {
                config.surface.vmax = vmax;
            }
            let meshes = left_mesh.zip(right_mesh);
            run_decode(config, &data_dir, &out_dir, task, meshes.as_ref())?;
        }
        Commands::Inspect { data_dir, subject } => {
            run_inspect(&config, &data_dir, subject)?;
        }
    }

    Ok(())
}

/// Defaults, overridden by the JSON file when given
fn load_config(path: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let config: AnalysisConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Full pipeline for the selected tasks
fn run_decode(
    config: AnalysisConfig,
    data_dir: &Path,
    out_dir: &Path,
    task: Task,
    meshes: Option<&(PathBuf, PathBuf)>,
) -> anyhow::Result<()> {
    let dataset = HcpDataset::new(data_dir, config.n_parcels);
    let regions = dataset.load_regions().context("loading region table")?;

    let renderer = match meshes {
        Some((left, right)) => {
            let atlas = dataset.load_atlas().context("loading surface atlas")?;
            Some(SurfaceRenderer::from_files(left, right, atlas).context("loading surface meshes")?)
        }
        None => {
            info!("No meshes given, skipping surface views");
            None
        }
    };

    let subjects: Vec<SubjectId> = (0..config.n_subjects).collect();
    let pipeline = DecodingPipeline::new(dataset, config)?;
    let builder = pipeline.collect_design(&subjects)?;
    if builder.n_subjects() == 0 {
        bail!("no subjects selected");
    }

    let writer = ResultsWriter::new(out_dir);
    for scheme in task.schemes() {
        let run = pipeline.decode(&builder, scheme)?;
        let task_dir = writer.write_run(&run, pipeline.config(), &regions)?;
        info!(
            task = scheme.slug(),
            accuracy_mean = run.summary.accuracy.mean,
            accuracy_std = run.summary.accuracy.std,
            dir = %task_dir.display(),
            "Task complete"
        );

        if let Some(renderer) = &renderer {
            let written = renderer.render_run(&run, pipeline.config().surface.vmax, &task_dir.join("surface"))?;
            info!(files = written.len(), "Rendered surface views");
        }
    }

    Ok(())
}

/// Region table, atlas sizes and per-run event counts for one subject
fn run_inspect(config: &AnalysisConfig, data_dir: &Path, subject: SubjectId) -> anyhow::Result<()> {
    config.validate()?;
    let dataset = HcpDataset::new(data_dir, config.n_parcels);

    let regions = dataset.load_regions().context("loading region table")?;
    let mut networks: BTreeMap<&str, usize> = BTreeMap::new();
    for region in &regions {
        *networks.entry(region.network.as_str()).or_default() += 1;
    }
    let right = regions.iter().filter(|r| r.hemisphere == Hemisphere::Right).count();
    info!("Regions: {} ({} right, {} left)", regions.len(), right, regions.len() - right);
    for (network, count) in &networks {
        info!("  {network}: {count}");
    }

    match dataset.load_atlas() {
        Ok(atlas) => info!(
            "Atlas: {} left vertices, {} right vertices",
            atlas.left.len(),
            atlas.right.len()
        ),
        Err(e) => warn!("Atlas unavailable: {e}"),
    }

    let experiment = config.experiment()?;
    let series = dataset.load_timeseries(subject, experiment, &RunSelection::All, false)?;
    info!("Subject {subject}, {experiment:?}:");
    for (run_id, run) in experiment.run_ids().into_iter().zip(&series) {
        info!("  run {run_id}: {} regions x {} frames", run.nrows(), run.ncols());
    }
    for condition in &config.conditions {
        let evs = dataset.load_evs(subject, experiment, condition)?;
        let counts: Vec<usize> = evs.iter().map(|run| run.len()).collect();
        info!("  {condition}: events per run {counts:?}");
    }

    Ok(())
}
