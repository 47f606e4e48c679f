//! End-to-end test over a synthetic on-disk dataset

use std::fs::{self, File};
use std::path::Path;

use hcp_wm_core::config::{AnalysisConfig, ModelConfig, WM_CONDITIONS};
use hcp_wm_core::layout::bold_name;
use ndarray::{Array1, Array2, Array3};
use ndarray_npy::{read_npy, write_npy, NpzWriter};

use hcp_wm_native::dataset::{write_unicode_npy, HcpDataset};
use hcp_wm_native::pipeline::DecodingPipeline;
use hcp_wm_native::processing::LabelScheme;
use hcp_wm_native::results::{ClassNetworks, ResultsWriter, TaskSummary};
use hcp_wm_native::viz::{SurfaceMesh, SurfaceRenderer};
use hcp_wm_native::SurfaceAtlas;

const N_PARCELS: usize = 6;
const N_SUBJECTS: u32 = 16;
const BLOCK_FRAMES: usize = 10;
const WM_RUNS: [usize; 2] = [7, 8];

/// Deterministic pseudo-noise in [-0.5, 0.5)
fn noise(subject: u32, run: usize, region: usize, frame: usize) -> f64 {
    let h = (subject as usize * 7919 + run * 104_729 + region * 1_299_709 + frame * 15_485_863) % 1000;
    h as f64 / 1000.0 - 0.5
}

/// Region 0 tracks memory load, region 1 + category tracks the category
fn write_subject(root: &Path, subject: u32) {
    let subject_dir = root.join("subjects").join(subject.to_string());
    let n_frames = WM_CONDITIONS.len() * BLOCK_FRAMES;

    for run in WM_RUNS {
        let series = Array2::from_shape_fn((N_PARCELS, n_frames), |(region, frame)| {
            let condition = frame / BLOCK_FRAMES;
            let load = condition / 4;
            let category = condition % 4;
            let signal = match region {
                0 => 2.0 * load as f64,
                r if r == 1 + category => 2.0,
                _ => 0.0,
            };
            signal + noise(subject, run, region, frame)
        });
        let ts_dir = subject_dir.join("timeseries");
        fs::create_dir_all(&ts_dir).unwrap();
        write_npy(
            ts_dir.join(format!("bold{run}_Atlas_MSMAll_Glasser360Cortical.npy")),
            &series,
        )
        .unwrap();

        let ev_dir = subject_dir.join("EVs").join(bold_name(run).unwrap());
        fs::create_dir_all(&ev_dir).unwrap();
        for (c, condition) in WM_CONDITIONS.iter().enumerate() {
            let onset = (c * BLOCK_FRAMES) as f64;
            fs::write(ev_dir.join(format!("{condition}.txt")), format!("{onset}\t{BLOCK_FRAMES}\t1\n")).unwrap();
        }
    }
}

fn write_dataset(root: &Path) {
    let networks = ["Visual1", "Frontopariet", "Default"];
    let table: Vec<String> = (0..N_PARCELS)
        .flat_map(|i| {
            let side = if i < N_PARCELS / 2 { "R" } else { "L" };
            [format!("{side}_P{i}"), networks[i % 3].to_string(), format!("{}.5", i + 1)]
        })
        .collect();
    write_unicode_npy(&root.join("regions.npy"), (N_PARCELS, 3), &table).unwrap();

    let mut npz = NpzWriter::new(File::create(root.join("atlas.npz")).unwrap());
    npz.add_array("labels_L", &Array1::from(vec![3i64, 4, 5, -1])).unwrap();
    npz.add_array("labels_R", &Array1::from(vec![0i64, 1, 2, 2])).unwrap();
    npz.finish().unwrap();

    for subject in 0..N_SUBJECTS {
        write_subject(root, subject);
    }
}

fn config() -> AnalysisConfig {
    AnalysisConfig {
        n_subjects: N_SUBJECTS,
        n_parcels: N_PARCELS,
        tr_s: 1.0,
        repetitions: 2,
        model: ModelConfig {
            cs: vec![0.01, 1.0, 100.0],
            cv_folds: 4,
            ..ModelConfig::default()
        },
        ..AnalysisConfig::default()
    }
}

fn tetrahedron() -> SurfaceMesh {
    SurfaceMesh::from_parts(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]],
    )
    .unwrap()
}

#[test]
fn test_dataset_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let dataset = HcpDataset::new(dir.path(), N_PARCELS);

    let regions = dataset.load_regions().unwrap();
    assert_eq!(regions.len(), N_PARCELS);
    assert_eq!(regions[4].name, "L_P4");
    assert!((regions[0].myelin - 1.5).abs() < 1e-12);

    let atlas = dataset.load_atlas().unwrap();
    assert_eq!(atlas.left, vec![3, 4, 5, -1]);
    assert_eq!(dataset.available_subjects().unwrap().len(), N_SUBJECTS as usize);
}

#[test]
fn test_design_shapes() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let pipeline = DecodingPipeline::new(HcpDataset::new(dir.path(), N_PARCELS), config()).unwrap();

    let subjects: Vec<u32> = (0..N_SUBJECTS).collect();
    let builder = pipeline.collect_design(&subjects).unwrap();
    for scheme in LabelScheme::ALL {
        let design = builder.build(scheme).unwrap();
        assert_eq!(design.n_samples(), N_SUBJECTS as usize * WM_CONDITIONS.len());
        assert_eq!(design.labels().len(), design.n_samples());
        assert_eq!(design.n_regions(), N_PARCELS);
    }

    // Region 0 averages separate the load blocks
    let averages = pipeline.subject_averages(0).unwrap();
    assert!(averages[4][0] - averages[0][0] > 1.5);
}

#[test]
fn test_decode_persist_render() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let config = config();
    let pipeline = DecodingPipeline::new(HcpDataset::new(dir.path(), N_PARCELS), config.clone()).unwrap();
    let regions = pipeline.dataset().load_regions().unwrap();
    let builder = pipeline.collect_design(&(0..N_SUBJECTS).collect::<Vec<_>>()).unwrap();

    let out = dir.path().join("out");
    let writer = ResultsWriter::new(&out);
    let renderer = SurfaceRenderer::new(
        tetrahedron(),
        tetrahedron(),
        SurfaceAtlas {
            left: vec![3, 4, 5, -1],
            right: vec![0, 1, 2, 2],
        },
    )
    .unwrap();

    // Memory load: binary, coefs (R, regions)
    let load = pipeline.decode(&builder, LabelScheme::MemoryLoad).unwrap();
    assert!(load.accuracies().iter().all(|&a| a > 0.9));
    let task_dir = writer.write_run(&load, &config, &regions).unwrap();
    assert!(task_dir.ends_with("memory_load"));

    let accuracies: Array1<f64> = read_npy(task_dir.join("accuracies.npy")).unwrap();
    assert_eq!(accuracies.to_vec(), load.accuracies());
    let coefs: Array2<f64> = read_npy(task_dir.join("coefs.npy")).unwrap();
    assert_eq!(coefs.dim(), (2, N_PARCELS));
    let best_c: Array1<f64> = read_npy(task_dir.join("best_c.npy")).unwrap();
    assert_eq!(best_c.len(), 2);

    let summary: TaskSummary =
        serde_json::from_str(&fs::read_to_string(task_dir.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary.class_names, vec!["0bk", "2bk"]);
    assert_eq!(summary.coef_rows, vec!["2bk"]);
    assert!((summary.accuracy.mean - load.summary.accuracy.mean).abs() < 1e-12);

    let rendered = renderer.render_run(&load, None, &task_dir.join("surface")).unwrap();
    assert_eq!(rendered.len(), 2 * 2 + 2);
    assert!(task_dir.join("surface").join("mean_left.html").exists());
    assert!(task_dir.join("surface").join("rep_1_right.html").exists());

    // Category: 4-way, coefs (R, classes, regions)
    let category = pipeline.decode(&builder, LabelScheme::StimulusCategory).unwrap();
    let task_dir = writer.write_run(&category, &config, &regions).unwrap();
    let coefs: Array3<f64> = read_npy(task_dir.join("coefs.npy")).unwrap();
    assert_eq!(coefs.dim(), (2, 4, N_PARCELS));

    let networks: Vec<ClassNetworks> =
        serde_json::from_str(&fs::read_to_string(task_dir.join("networks.json")).unwrap()).unwrap();
    assert_eq!(networks.len(), 4);
    assert_eq!(networks[1].class, "faces");

    let rendered = renderer.render_run(&category, Some(1.0), &task_dir.join("surface")).unwrap();
    assert_eq!(rendered.len(), (2 * 4 + 4) * 2);
    assert!(task_dir.join("surface").join("mean_tools_left.html").exists());
}

#[test]
fn test_reproducible_with_fixed_seed() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let pipeline = DecodingPipeline::new(HcpDataset::new(dir.path(), N_PARCELS), config()).unwrap();
    let builder = pipeline.collect_design(&(0..8).collect::<Vec<_>>()).unwrap();

    let a = pipeline.decode(&builder, LabelScheme::MemoryLoad).unwrap();
    let b = pipeline.decode(&builder, LabelScheme::MemoryLoad).unwrap();
    assert_eq!(a.accuracies(), b.accuracies());
    assert_eq!(a.stacked_coefs().unwrap(), b.stacked_coefs().unwrap());
}

#[test]
fn test_missing_subject_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let pipeline = DecodingPipeline::new(HcpDataset::new(dir.path(), N_PARCELS), config()).unwrap();
    let err = pipeline.subject_averages(99).unwrap_err();
    assert!(err.to_string().contains("bold7"));
}
