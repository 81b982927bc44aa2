mod common;

use std::fs;

use common::{read_csv, Campaign};
use fiber_dataset::pipeline::survey_files;
use fiber_dataset::{FiberType, PathKind, WorkUnitKey};

#[test]
fn counts_outputs_of_every_n_sim() {
    let campaign = Campaign::new();
    campaign.write_complete_unit(WorkUnitKey::new(10, 0), &[0.5, 1.0]);
    let key = WorkUnitKey::new(10, 10);
    campaign.write_threshold(key, FiberType::Myelinated, 0, 1.0);
    campaign.write(
        &campaign
            .layout
            .resolve(&key, PathKind::OutputDir(FiberType::Myelinated))
            .join("notes.txt"),
        "",
    );
    fs::create_dir_all(campaign.layout.resolve(&WorkUnitKey::new(10, 2), PathKind::NSimDir(FiberType::Myelinated)))
        .unwrap();

    let config = campaign.config(&[10], 1, "");
    let path = survey_files(&config, 10, 7, None).unwrap();
    assert_eq!(path, campaign.out_dir().join("file_counts.csv"));

    let (header, rows) = read_csv(&path);
    assert_eq!(
        header,
        vec!["n_sim", "inputs", "outputs", "activation_files", "response_files", "threshold_files"]
    );
    assert_eq!(
        rows,
        vec![
            vec!["0", "1", "12", "6", "6", "0"],
            vec!["2", "0", "0", "0", "0", "0"],
            vec!["10", "0", "2", "0", "0", "1"],
        ]
    );
}

#[test]
fn missing_n_sims_directory_is_an_error() {
    let campaign = Campaign::new();
    fs::create_dir_all(&campaign.layout.root).unwrap();
    let config = campaign.config(&[10], 1, "");
    assert!(survey_files(&config, 10, 7, None).is_err());
}
