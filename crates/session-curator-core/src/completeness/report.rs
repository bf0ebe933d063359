use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::hash::Hasher as _;
use twox_hash::XxHash64;

/// Image count result for a single acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCount {
    pub label: String,
    pub expected: Option<f64>,
    pub actual: Option<u64>,
    pub percent_complete: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalityCounts {
    pub t1_count: u32,
    pub t2_count: u32,
    pub resting_state_count: u32,
    pub task_count: u32,
    pub dwi_count: u32,
    pub spectroscopy_count: u32,
    pub fieldmap_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCounts {
    pub structural_duplicates: u32,
    pub functional_duplicates: u32,
    pub fieldmap_duplicates: u32,
    pub dwi_duplicates: u32,
}

/// Completeness result for one session. Each check writes its own fields;
/// nothing is cleared once written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    pub analysis_id: String,
    #[serde(skip)]
    pub image_counts: Vec<ImageCount>,
    pub incomplete_acqs: bool,
    pub incomplete_acqs_list: Vec<String>,
    #[serde(flatten)]
    pub modality_counts: ModalityCounts,
    pub duplicates_detected: bool,
    pub duplicates_list: Vec<String>,
    #[serde(flatten)]
    pub duplicate_counts: DuplicateCounts,
    pub any_phase_encoding_discrepancy: bool,
    pub phase_encoding_error_list: Vec<String>,
    pub missing_scans: Vec<String>,
    pub extra_scans: Vec<String>,
    /// Template labels consumed by an observed acquisition, one per template row.
    #[serde(skip)]
    pub matched_scans: Vec<String>,
    pub stimulus_complete: bool,
    pub human_eyes: bool,
    pub session_complete: bool,
    pub run_downstream_analyses: bool,
}

impl CompletenessReport {
    pub fn with_analysis_id(mut self, analysis_id: &str) -> Self {
        self.analysis_id = analysis_id.to_string();
        self
    }

    /// Full report as a JSON object, including the per-acquisition
    /// `"<label> expected count"` style entries. Keys are sorted.
    pub fn to_long_json(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            insert_image_counts(map, &self.image_counts);
        }
        Ok(value)
    }

    pub fn to_long_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_long_json()?)
    }

    pub fn to_short(&self) -> ShortReport {
        ShortReport::from(self)
    }

    /// Hash of the long report with `analysisId` removed. Identical inputs
    /// evaluated at different times produce the same fingerprint.
    pub fn fingerprint(&self) -> Result<u64, serde_json::Error> {
        let mut value = self.to_long_json()?;
        if let Value::Object(map) = &mut value {
            map.remove("analysisId");
        }
        let bytes = serde_json::to_vec(&value)?;
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&bytes);
        Ok(hasher.finish())
    }
}

fn insert_image_counts(map: &mut Map<String, Value>, counts: &[ImageCount]) {
    for count in counts {
        map.insert(
            format!("{} expected count", count.label),
            count.expected.map(Value::from).unwrap_or(Value::Null),
        );
        map.insert(
            format!("{} actual count", count.label),
            count.actual.map(Value::from).unwrap_or(Value::Null),
        );
        map.insert(
            format!("{} percent complete", count.label),
            Value::from(count.percent_complete),
        );
    }
}

/// The subset of the report written to searchable session metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortReport {
    pub analysis_id: String,
    pub any_phase_encoding_discrepancy: bool,
    pub duplicates_detected: bool,
    pub duplicates_list: Vec<String>,
    pub dwi_count: u32,
    pub extra_scans: Vec<String>,
    pub fieldmap_count: u32,
    pub human_eyes: bool,
    pub missing_scans: Vec<String>,
    pub phase_encoding_error_list: Vec<String>,
    pub resting_state_count: u32,
    pub session_complete: bool,
    pub run_downstream_analyses: bool,
    pub spectroscopy_count: u32,
    pub t1_count: u32,
    pub t2_count: u32,
    pub task_count: u32,
    pub incomplete_acqs: bool,
    pub incomplete_acqs_list: Vec<String>,
    pub stimulus_complete: bool,
}

impl From<&CompletenessReport> for ShortReport {
    fn from(report: &CompletenessReport) -> Self {
        let counts = &report.modality_counts;
        Self {
            analysis_id: report.analysis_id.clone(),
            any_phase_encoding_discrepancy: report.any_phase_encoding_discrepancy,
            duplicates_detected: report.duplicates_detected,
            duplicates_list: report.duplicates_list.clone(),
            dwi_count: counts.dwi_count,
            extra_scans: report.extra_scans.clone(),
            fieldmap_count: counts.fieldmap_count,
            human_eyes: report.human_eyes,
            missing_scans: report.missing_scans.clone(),
            phase_encoding_error_list: report.phase_encoding_error_list.clone(),
            resting_state_count: counts.resting_state_count,
            session_complete: report.session_complete,
            run_downstream_analyses: report.run_downstream_analyses,
            spectroscopy_count: counts.spectroscopy_count,
            t1_count: counts.t1_count,
            t2_count: counts.t2_count,
            task_count: counts.task_count,
            incomplete_acqs: report.incomplete_acqs,
            incomplete_acqs_list: report.incomplete_acqs_list.clone(),
            stimulus_complete: report.stimulus_complete,
        }
    }
}
