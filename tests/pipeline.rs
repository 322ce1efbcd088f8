use std::fs;
use std::path::Path;

use tempfile::tempdir;

use hyperbatch::example_apps::run_dataset_report;

use hyperbatch::{
    CandidateMode, DatasetError, ExampleDataset, HypergraphDataset, LoaderConfig, SplitLabel,
};

fn write_splits(dir: &Path, train: &str, valid: &str, test: &str) {
    fs::write(dir.join("train.txt"), train).unwrap();
    fs::write(dir.join("valid.txt"), valid).unwrap();
    fs::write(dir.join("test.txt"), test).unwrap();
}

fn build_config(dir: &Path) -> LoaderConfig {
    LoaderConfig {
        data_dir: dir.to_path_buf(),
        batch_size: 2,
        eval_batch_size: 1,
        negative_ratio: 2,
        seed: Some(17),
        ..LoaderConfig::default()
    }
}

#[test]
fn two_line_scenario_builds_expected_vocabularies() {
    let dir = tempdir().unwrap();
    write_splits(dir.path(), "r1\tA\tB\nr2\tA\tB\tC\n", "", "");
    let dataset = HypergraphDataset::load(build_config(dir.path())).unwrap();

    let vocab = dataset.vocab();
    let entities: Vec<(u32, &str)> = vocab.entities.iter().collect();
    assert_eq!(entities, vec![(1, "A"), (2, "B"), (3, "C")]);
    let relations: Vec<(u32, &str)> = vocab.relations.iter().collect();
    assert_eq!(relations, vec![(1, "r1"), (2, "r2")]);
    assert_eq!(vocab.entity_count(), 4);
    assert_eq!(vocab.relation_count(), 3);
    assert_eq!(vocab.max_arity, 3);

    let train = dataset.facts().get(SplitLabel::Train);
    assert_eq!(train[0].to_tuple(), vec![1, 1, 2]);
    assert_eq!(train[1].to_tuple(), vec![2, 1, 2, 3]);

    let rows = dataset
        .train_sampler()
        .example(0, &mut hyperbatch::DeterministicRng::new(3))
        .unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].as_slice(), &[1, 1, 2, 0, 1, 2]);
}

#[test]
fn ids_follow_train_valid_test_order() {
    let dir = tempdir().unwrap();
    write_splits(dir.path(), "r1\tB\tA\n", "r2\tC\n", "r3\tD\tA\n");
    let dataset = HypergraphDataset::load(build_config(dir.path())).unwrap();
    let vocab = dataset.vocab();
    assert_eq!(vocab.entities.id("B"), Some(1));
    assert_eq!(vocab.entities.id("A"), Some(2));
    assert_eq!(vocab.entities.id("C"), Some(3));
    assert_eq!(vocab.entities.id("D"), Some(4));
    assert_eq!(vocab.relations.id("r3"), Some(3));
    assert_eq!(dataset.known().len(), 3);
    assert_eq!(dataset.incidence().len(), 2);
}

#[test]
fn arity_bound_holds_for_every_split() {
    let dir = tempdir().unwrap();
    write_splits(
        dir.path(),
        "r1\tA\tB\nr2\tA\tB\tC\tD\n",
        "r1\tC\n",
        "r3\tD\tA\tB\n",
    );
    let dataset = HypergraphDataset::load(build_config(dir.path())).unwrap();
    let max_arity = dataset.vocab().max_arity;
    assert_eq!(max_arity, 4);
    for split in [SplitLabel::Train, SplitLabel::Validation, SplitLabel::Test] {
        for fact in dataset.facts().get(split) {
            let item = fact.encode(max_arity).unwrap();
            assert!(item.arity() >= 1 && item.arity() <= max_arity);
            assert!(item.entities()[item.arity()..].iter().all(|id| *id == 0));
            assert!(item.entities()[..item.arity()].iter().all(|id| *id != 0));
        }
    }
}

#[test]
fn repeated_loads_are_identical() {
    let dir = tempdir().unwrap();
    write_splits(
        dir.path(),
        "r1\tA\tB\nr2\tA\tB\tC\nr1\tE\tF\n",
        "r2\tF\tE\tA\n",
        "r3\tC\n",
    );
    let first = HypergraphDataset::load(build_config(dir.path())).unwrap();
    let second = HypergraphDataset::load(build_config(dir.path())).unwrap();
    assert_eq!(first.vocab().as_ref(), second.vocab().as_ref());
    assert_eq!(first.facts().as_ref(), second.facts().as_ref());
    assert_eq!(first.known().len(), second.known().len());
    assert!(first.known().iter().all(|item| second.known().contains(item)));
}

#[test]
fn missing_split_file_aborts_loading() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("train.txt"), "r1\tA\tB\n").unwrap();
    fs::write(dir.path().join("valid.txt"), "").unwrap();
    let err = HypergraphDataset::load(build_config(dir.path()))
        .err()
        .expect("missing test.txt must fail");
    assert!(matches!(
        err,
        DatasetError::Io { ref path, .. } if path.ends_with("test.txt")
    ));
}

#[test]
fn malformed_line_is_rejected_with_location() {
    let dir = tempdir().unwrap();
    write_splits(dir.path(), "r1\tA\tB\n", "r1\tA\nlonely\n", "");
    let err = HypergraphDataset::load(build_config(dir.path()))
        .err()
        .expect("line without entities must fail");
    assert!(matches!(
        err,
        DatasetError::MalformedLine {
            split: SplitLabel::Validation,
            line: 2,
            ..
        }
    ));
}

#[test]
fn blank_lines_are_skipped() {
    let dir = tempdir().unwrap();
    write_splits(dir.path(), "r1\tA\tB\n\n\r\nr1\tB\tA\n", "\n", "");
    let dataset = HypergraphDataset::load(build_config(dir.path())).unwrap();
    assert_eq!(dataset.facts().len(SplitLabel::Train), 2);
    assert_eq!(dataset.facts().len(SplitLabel::Validation), 0);
}

#[test]
fn invalid_config_is_rejected_before_reading() {
    let dir = tempdir().unwrap();
    let config = LoaderConfig {
        batch_size: 0,
        ..build_config(dir.path())
    };
    let err = HypergraphDataset::load(config).err().unwrap();
    assert!(matches!(err, DatasetError::Configuration(_)));
}

#[test]
fn summary_reports_counts_and_histograms() {
    let dir = tempdir().unwrap();
    write_splits(
        dir.path(),
        "r1\tA\tB\nr2\tA\tB\tC\nr1\tA\tB\n",
        "r1\tC\tA\n",
        "r2\tC\tB\tA\n",
    );
    let dataset = HypergraphDataset::load(build_config(dir.path())).unwrap();
    let summary = dataset.summary();
    assert_eq!(summary.entities, 3);
    assert_eq!(summary.relations, 2);
    assert_eq!(summary.max_arity, 3);
    assert_eq!(summary.known_facts, 4);
    let train = summary.split(SplitLabel::Train).unwrap();
    assert_eq!(train.facts, 3);
    assert_eq!(train.arity_histogram.get(&2), Some(&2));
    assert_eq!(train.arity_histogram.get(&3), Some(&1));
    assert_eq!(dataset.incidence().degree(1), 3);
}

#[test]
fn eval_generators_respect_mode() {
    let dir = tempdir().unwrap();
    write_splits(dir.path(), "r1\tA\tB\nr1\tC\tB\n", "", "r1\tA\tC\n");
    let dataset = HypergraphDataset::load(build_config(dir.path())).unwrap();
    let raw = dataset
        .eval_generator(SplitLabel::Test, CandidateMode::Raw)
        .candidates(0)
        .unwrap();
    let fil = dataset
        .eval_generator(SplitLabel::Test, CandidateMode::Filtered)
        .candidates(0)
        .unwrap();
    assert_eq!(raw.group_lens, vec![4, 4]);
    // Slot 0 of (r1, A, C): only A completes a known fact.
    // Slot 1 of (r1, A, C): B and C complete known facts.
    assert_eq!(fil.group_lens, vec![3, 2]);
}

fn report_args(dir: &Path, negative_ratio: usize) -> impl Iterator<Item = String> {
    vec![
        "--data-dir".to_string(),
        dir.to_string_lossy().into_owned(),
        "--negative-ratio".to_string(),
        negative_ratio.to_string(),
        "--seed".to_string(),
        "3".to_string(),
        "--json".to_string(),
    ]
    .into_iter()
}

#[test]
fn dataset_report_prints_first_batches() {
    let dir = tempdir().unwrap();
    write_splits(dir.path(), "r1\tA\tB\nr2\tA\tB\tC\n", "r1\tB\tC\n", "");
    assert!(run_dataset_report(report_args(dir.path(), 2)).is_ok());
}

#[test]
fn dataset_report_surfaces_row_count_overflow() {
    let dir = tempdir().unwrap();
    write_splits(dir.path(), "r1\tA\tB\n", "", "");
    let err = run_dataset_report(report_args(dir.path(), usize::MAX / 2 + 1)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DatasetError>(),
        Some(DatasetError::Capacity { .. })
    ));
}
