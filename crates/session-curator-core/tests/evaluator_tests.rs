use chrono::{DateTime, TimeZone, Utc};
use session_curator_core::completeness::{AcquisitionRecord, TemplateRow};
use session_curator_core::{evaluate, Error};

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 14, 10, minute, 0).unwrap()
}

fn template() -> Vec<TemplateRow> {
    vec![
        TemplateRow::new("ses-01", "anat-T1w").with_expected_length(176.0),
        TemplateRow::new("ses-01", "func-bold_task-rest_dir-AP")
            .with_expected_length(420.0)
            .with_expected_pe_dir("j-"),
        TemplateRow::new("ses-01", "func-bold_task-nback")
            .with_expected_length(300.0)
            .with_expected_pe_dir("j-"),
        TemplateRow::new("ses-01", "dwi_run-1").with_expected_length(60.0),
        TemplateRow::new("ses-02", "anat-T1w").with_expected_length(176.0),
    ]
}

/// A session that matches the ses-01 template exactly.
fn clean_session() -> Vec<AcquisitionRecord> {
    vec![
        AcquisitionRecord::new("anat-T1w")
            .with_timestamp(at(0))
            .with_zip_member_count(176)
            .with_series_description("T1w_MPR"),
        AcquisitionRecord::new("func-bold_task-rest_dir-AP")
            .with_timestamp(at(10))
            .with_zip_member_count(420)
            .with_series_description("rest_AP")
            .with_phase_encoding_direction("j-"),
        AcquisitionRecord::new("func-bold_task-nback")
            .with_timestamp(at(20))
            .with_zip_member_count(300)
            .with_series_description("nback")
            .with_phase_encoding_direction("j-")
            .with_file("sub-01_task-nback_stim.tsv"),
        AcquisitionRecord::new("dwi_run-1")
            .with_timestamp(at(30))
            .with_zip_member_count(60)
            .with_series_description("dwi"),
    ]
}

#[test]
fn test_clean_session_runs_downstream() {
    let report = evaluate("ses-01", &template(), &clean_session()).unwrap();

    assert!(report.missing_scans.is_empty());
    assert!(report.extra_scans.is_empty());
    assert!(!report.duplicates_detected);
    assert!(!report.any_phase_encoding_discrepancy);
    assert!(!report.incomplete_acqs);
    assert!(report.stimulus_complete);
    assert!(!report.human_eyes);
    assert!(report.session_complete);
    assert!(report.run_downstream_analyses);
    assert_eq!(report.modality_counts.t1_count, 1);
    assert_eq!(report.modality_counts.resting_state_count, 1);
    assert_eq!(report.modality_counts.task_count, 1);
    assert_eq!(report.modality_counts.dwi_count, 1);
}

#[test]
fn test_missing_template_for_session_is_fatal() {
    let err = evaluate("ses-99", &template(), &clean_session()).unwrap_err();
    match err {
        Error::MissingTemplate { session_label } => assert_eq!(session_label, "ses-99"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_scenario_a_full_t1() {
    let template = vec![TemplateRow::new("s", "T1w").with_expected_length(176.0)];
    let acqs = vec![AcquisitionRecord::new("T1w").with_zip_member_count(176)];
    let report = evaluate("s", &template, &acqs).unwrap();

    assert_eq!(report.image_counts[0].percent_complete, 100.0);
    assert!(!report.incomplete_acqs_list.contains(&"T1w".to_string()));
}

#[test]
fn test_scenario_b_dwi_without_raw_file() {
    let template = vec![TemplateRow::new("s", "dwi_run-1").with_expected_length(60.0)];
    let acqs = vec![AcquisitionRecord::new("dwi_run-1")];
    let report = evaluate("s", &template, &acqs).unwrap();

    assert_eq!(report.image_counts[0].percent_complete, 0.0);
    assert_eq!(report.incomplete_acqs_list, vec!["dwi_run-1"]);
    assert!(report.incomplete_acqs);
    assert!(!report.session_complete);
    assert!(!report.run_downstream_analyses);
}

#[test]
fn test_scenario_c_duplicate_series_description() {
    let mut acqs = clean_session();
    acqs.push(
        AcquisitionRecord::new("anat-T1w_localizer")
            .with_timestamp(at(1))
            .with_series_description("localizer"),
    );
    acqs.push(
        AcquisitionRecord::new("anat-T1w_localizer_rerun")
            .with_timestamp(at(2))
            .with_series_description("localizer"),
    );
    let report = evaluate("ses-01", &template(), &acqs).unwrap();

    assert!(report.duplicates_detected);
    assert_eq!(report.duplicates_list, vec!["anat-T1w_localizer_rerun"]);
    assert_eq!(report.duplicate_counts.structural_duplicates, 1);
    assert!(report.human_eyes);
    assert!(!report.run_downstream_analyses);
}

#[test]
fn test_scenario_d_missing_fieldmap() {
    let mut template = template();
    template.push(TemplateRow::new("ses-01", "fmap_run-2"));
    let report = evaluate("ses-01", &template, &clean_session()).unwrap();

    assert_eq!(report.missing_scans, vec!["fmap_run-2"]);
    assert!(!report.session_complete);
    assert!(report.human_eyes);
}

#[test]
fn test_scenario_e_spectroscopy_extras_need_no_review() {
    let mut acqs = clean_session();
    acqs.push(AcquisitionRecord::new("mrs_press_acc").with_timestamp(at(40)));
    acqs.push(AcquisitionRecord::new("mrs_press_pcc").with_timestamp(at(45)));
    let report = evaluate("ses-01", &template(), &acqs).unwrap();

    assert_eq!(report.extra_scans, vec!["mrs_press_acc", "mrs_press_pcc"]);
    assert_eq!(report.modality_counts.spectroscopy_count, 2);
    assert!(!report.human_eyes);
    assert!(report.run_downstream_analyses);
}

#[test]
fn test_phase_encoding_discrepancy_blocks_downstream() {
    let mut acqs = clean_session();
    acqs[1].phase_encoding_direction = Some("j".to_string());
    let report = evaluate("ses-01", &template(), &acqs).unwrap();

    assert_eq!(report.phase_encoding_error_list, vec!["func-bold_task-rest_dir-AP"]);
    assert!(report.session_complete);
    assert!(!report.run_downstream_analyses);
    assert!(report.human_eyes);
}

#[test]
fn test_missing_stimulus_does_not_block_downstream() {
    let mut acqs = clean_session();
    acqs[2].file_names.clear();
    let report = evaluate("ses-01", &template(), &acqs).unwrap();

    assert!(!report.stimulus_complete);
    assert!(report.run_downstream_analyses);
}

#[test]
fn test_every_template_row_accounted_for_once() {
    let cases: Vec<Vec<AcquisitionRecord>> = vec![
        clean_session(),
        clean_session().into_iter().skip(2).collect(),
        Vec::new(),
        {
            let mut acqs = clean_session();
            acqs.push(AcquisitionRecord::new("anat-T1w").with_timestamp(at(50)));
            acqs
        },
    ];
    let session_rows = template()
        .into_iter()
        .filter(|row| row.session_label == "ses-01")
        .count();

    for acqs in cases {
        let report = evaluate("ses-01", &template(), &acqs).unwrap();
        assert_eq!(report.missing_scans.len() + report.matched_scans.len(), session_rows);
        if report.session_complete {
            assert!(report.missing_scans.is_empty());
        }
        if report.run_downstream_analyses {
            assert!(report.session_complete);
        }
    }
}

#[test]
fn test_acquisition_order_follows_timestamps() {
    let mut acqs = clean_session();
    acqs.reverse();
    acqs.push(
        AcquisitionRecord::new("anat-T1w_rerun")
            .with_timestamp(at(5))
            .with_series_description("T1w_MPR"),
    );
    let report = evaluate("ses-01", &template(), &acqs).unwrap();

    // The later acquisition is the duplicate, regardless of input order.
    assert_eq!(report.duplicates_list, vec!["anat-T1w_rerun"]);
    let labels: Vec<&str> = report
        .image_counts
        .iter()
        .map(|count| count.label.as_str())
        .collect();
    assert_eq!(labels[0], "anat-T1w");
    assert_eq!(labels[1], "anat-T1w_rerun");
}

#[test]
fn test_evaluation_is_repeatable() {
    let first = evaluate("ses-01", &template(), &clean_session())
        .unwrap()
        .with_analysis_id("a-1");
    let second = evaluate("ses-01", &template(), &clean_session())
        .unwrap()
        .with_analysis_id("a-1");

    assert_eq!(
        first.to_long_json_string().unwrap(),
        second.to_long_json_string().unwrap()
    );
    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
}

#[test]
fn test_observer_sees_every_check_with_session_label() {
    use session_curator_core::completeness::evaluate_observed;
    use session_curator_core::{Check, CurationObserver};
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<(String, Check)>>);

    impl CurationObserver for Recorder {
        fn on_check_start(&self, session_label: &str, check: Check) {
            self.0.lock().unwrap().push((session_label.to_string(), check));
        }
    }

    let recorder = Recorder(Mutex::new(Vec::new()));
    evaluate_observed("ses-01", &template(), &clean_session(), &recorder).unwrap();

    let seen = recorder.0.into_inner().unwrap();
    assert_eq!(seen.len(), 9);
    assert!(seen.iter().all(|(label, _)| label == "ses-01"));
    assert_eq!(seen[0].1, Check::ImageCount);
    assert_eq!(seen[8].1, Check::DownstreamAnalyses);
}
