//! Individual completeness checks. Each reads the session-local template
//! rows and the timestamp-ordered acquisitions, and writes its own fields
//! into the report. The three verdicts at the bottom read earlier fields only.

use super::acquisition::AcquisitionRecord;
use super::report::{CompletenessReport, ImageCount};
use super::template::TemplateRow;
use ahash::AHashSet;

const STRUCTURAL_MARKERS: &[&str] = &["anat", "T1w", "T2w"];
const FUNCTIONAL_MARKERS: &[&str] = &["func"];
const FIELDMAP_MARKERS: &[&str] = &["fmaps"];
const DIFFUSION_MARKERS: &[&str] = &["dwi"];

const IGNORE_MARKER: &str = "ignore-BIDS";
const SPECTROSCOPY_MARKER: &str = "press";

/// Task acquisitions: `task` in the label, excluding resting state and
/// single-band reference images.
pub fn is_task_label(label: &str) -> bool {
    label.contains("task") && !label.contains("rest") && !label.contains("SBRef")
}

pub fn is_spectroscopy_label(label: &str) -> bool {
    label.contains(SPECTROSCOPY_MARKER)
}

fn matches_any(label: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| label.contains(marker))
}

fn find_row<'a>(template: &[&'a TemplateRow], label: &str) -> Option<&'a TemplateRow> {
    template
        .iter()
        .find(|row| row.acquisition_label == label)
        .copied()
}

/// Percent of expected images present.
///
/// | actual | expected | result              |
/// |--------|----------|---------------------|
/// | yes    | yes      | actual / expected   |
/// | yes    | no       | 100                 |
/// | no     | yes      | 0                   |
/// | no     | no       | 100 (single file)   |
pub fn percent_complete(actual: Option<u64>, expected: Option<f64>) -> f64 {
    match (actual, expected) {
        (Some(actual), Some(expected)) => actual as f64 / expected * 100.0,
        (Some(_), None) => 100.0,
        (None, Some(_)) => 0.0,
        (None, None) => 100.0,
    }
}

pub fn image_counts(
    template: &[&TemplateRow],
    acquisitions: &[&AcquisitionRecord],
    report: &mut CompletenessReport,
) {
    for acq in acquisitions {
        let expected = find_row(template, &acq.label).and_then(|row| row.expected_count());
        let actual = acq.actual_count();
        let percent = percent_complete(actual, expected);

        if percent < 100.0 {
            report.incomplete_acqs_list.push(acq.label.clone());
        }
        report.image_counts.push(ImageCount {
            label: acq.label.clone(),
            expected,
            actual,
            percent_complete: percent,
        });
    }
    report.incomplete_acqs = !report.incomplete_acqs_list.is_empty();
}

pub fn modality_counts(acquisitions: &[&AcquisitionRecord], report: &mut CompletenessReport) {
    let counts = &mut report.modality_counts;
    for acq in acquisitions {
        let label = acq.label.as_str();
        if label.contains(IGNORE_MARKER) {
            continue;
        }
        if label.contains("T1w") {
            counts.t1_count += 1;
        }
        if label.contains("T2w") {
            counts.t2_count += 1;
        }
        if label.contains("task-rest") {
            counts.resting_state_count += 1;
        }
        if is_task_label(label) {
            counts.task_count += 1;
        }
        if label.contains("dwi") {
            counts.dwi_count += 1;
        }
        if is_spectroscopy_label(label) {
            counts.spectroscopy_count += 1;
        }
        if label.contains("fmap") {
            counts.fieldmap_count += 1;
        }
    }
}

/// Repeated series descriptions mark the later acquisition as a duplicate.
/// Acquisitions without a series description (e.g. spectroscopy) are skipped.
pub fn detect_duplicates(acquisitions: &[&AcquisitionRecord], report: &mut CompletenessReport) {
    let mut seen: AHashSet<&str> = AHashSet::new();
    for acq in acquisitions {
        let Some(description) = acq.series_description.as_deref() else {
            continue;
        };
        if seen.insert(description) {
            continue;
        }

        report.duplicates_detected = true;
        report.duplicates_list.push(acq.label.clone());

        let label = acq.label.as_str();
        let counts = &mut report.duplicate_counts;
        if matches_any(label, STRUCTURAL_MARKERS) {
            counts.structural_duplicates += 1;
        }
        if matches_any(label, FUNCTIONAL_MARKERS) {
            counts.functional_duplicates += 1;
        }
        if matches_any(label, FIELDMAP_MARKERS) {
            counts.fieldmap_duplicates += 1;
        }
        if matches_any(label, DIFFUSION_MARKERS) {
            counts.dwi_duplicates += 1;
        }
    }
}

/// Absent actual or expected directions count as a match.
pub fn check_phase_encoding(
    template: &[&TemplateRow],
    acquisitions: &[&AcquisitionRecord],
    report: &mut CompletenessReport,
) {
    for acq in acquisitions {
        let expected = find_row(template, &acq.label).and_then(|row| row.expected_direction());
        if let (Some(actual), Some(expected)) = (acq.actual_direction(), expected) {
            if actual != expected {
                report.phase_encoding_error_list.push(acq.label.clone());
            }
        }
    }
    report.any_phase_encoding_discrepancy = !report.phase_encoding_error_list.is_empty();
}

/// Each template row can be consumed by one acquisition only. Acquisitions
/// left without a row are extra; rows never consumed are missing.
pub fn missing_and_extra_scans(
    template: &[&TemplateRow],
    acquisitions: &[&AcquisitionRecord],
    report: &mut CompletenessReport,
) {
    let template_labels: AHashSet<&str> = template
        .iter()
        .map(|row| row.acquisition_label.as_str())
        .collect();
    let mut matched: AHashSet<&str> = AHashSet::new();

    for acq in acquisitions {
        let label = acq.label.as_str();
        if template_labels.contains(label) && matched.insert(label) {
            continue;
        }
        report.extra_scans.push(acq.label.clone());
    }

    for row in template {
        let label = row.acquisition_label.as_str();
        if matched.contains(label) {
            report.matched_scans.push(row.acquisition_label.clone());
        } else {
            report.missing_scans.push(row.acquisition_label.clone());
        }
    }
}

/// Every task acquisition needs an uploaded `_stim` file.
pub fn stimulus_complete(acquisitions: &[&AcquisitionRecord], report: &mut CompletenessReport) {
    report.stimulus_complete = acquisitions
        .iter()
        .filter(|acq| is_task_label(&acq.label))
        .all(|acq| acq.has_stimulus_file());
}

/// Review is needed unless the session is clean. Spectroscopy never appears
/// in templates, so extras that are all spectroscopy do not count.
pub fn human_eyes(report: &mut CompletenessReport) {
    let disqualifying_extras = report
        .extra_scans
        .iter()
        .any(|label| !is_spectroscopy_label(label));

    report.human_eyes = !report.missing_scans.is_empty()
        || disqualifying_extras
        || report.duplicates_detected
        || report.any_phase_encoding_discrepancy;
}

/// No missing scans and every acquisition at (at least) 100 percent, comparing
/// the truncated percentage.
pub fn session_complete(report: &mut CompletenessReport) {
    let all_complete = report
        .image_counts
        .iter()
        .all(|count| count.percent_complete.trunc() >= 100.0);
    report.session_complete = report.missing_scans.is_empty() && all_complete;
}

pub fn run_downstream_analyses(report: &mut CompletenessReport) {
    report.run_downstream_analyses = report.session_complete
        && !report.duplicates_detected
        && !report.any_phase_encoding_discrepancy;
}
