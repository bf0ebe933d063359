use crate::completeness::AcquisitionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SubjectRef {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Note {
    pub text: String,
}

/// A session container as the record store describes it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub label: String,
    pub project: String,
    #[serde(default)]
    pub subject: SubjectRef,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    /// Free-form session metadata, keyed by namespace.
    #[serde(default)]
    pub info: Map<String, Value>,
}

impl SessionRecord {
    pub fn notes_text(&self) -> String {
        self.notes
            .iter()
            .map(|note| note.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Acquisition as listed under a session, without file metadata.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AcquisitionSummary {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A file attached to an acquisition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawFile {
    pub name: String,
    #[serde(rename = "type", default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub zip_member_count: Option<u64>,
    #[serde(default)]
    pub info: Map<String, Value>,
}

impl RawFile {
    fn is_type(&self, file_type: &str) -> bool {
        self.file_type.as_deref() == Some(file_type)
    }

    fn info_str(&self, key: &str) -> Option<String> {
        self.info.get(key).and_then(Value::as_str).map(str::to_string)
    }
}

/// Reduce an acquisition's files to the fields the checks read. Raw counts
/// and series descriptions come from the dicom file, phase encoding from the
/// nifti file.
pub fn build_acquisition_record(
    summary: &AcquisitionSummary,
    files: &[RawFile],
) -> AcquisitionRecord {
    let dicom = files.iter().find(|file| file.is_type("dicom"));
    let nifti = files.iter().find(|file| file.is_type("nifti"));

    AcquisitionRecord {
        label: summary.label.clone(),
        timestamp: summary.timestamp,
        zip_member_count: dicom.and_then(|file| file.zip_member_count),
        series_description: dicom.and_then(|file| file.info_str("SeriesDescription")),
        phase_encoding_direction: nifti.and_then(|file| file.info_str("PhaseEncodingDirection")),
        file_names: files.iter().map(|file| file.name.clone()).collect(),
    }
}

/// One row of the `session_metadata` table.
#[derive(Debug, Clone)]
pub struct SessionMetadata {
    pub session_id: String,
    pub namespace: String,
    pub payload: String,
    pub report_hash: Option<i64>,
    pub updated_at: String,
}

/// One row of the `attachment` table.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub session_id: String,
    pub file_name: String,
    pub content: Vec<u8>,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file(value: Value) -> RawFile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_build_record_from_dicom_and_nifti() {
        let summary = AcquisitionSummary {
            id: "acq-1".to_string(),
            label: "fmap-epi_dir-AP".to_string(),
            timestamp: None,
        };
        let files = vec![
            file(json!({
                "name": "fmap.dicom.zip",
                "type": "dicom",
                "zip_member_count": 72,
                "info": {"SeriesDescription": "fmap_AP"}
            })),
            file(json!({
                "name": "fmap.nii.gz",
                "type": "nifti",
                "info": {"PhaseEncodingDirection": "j-"}
            })),
            file(json!({"name": "fmap_stim.tsv"})),
        ];

        let record = build_acquisition_record(&summary, &files);
        assert_eq!(record.label, "fmap-epi_dir-AP");
        assert_eq!(record.zip_member_count, Some(72));
        assert_eq!(record.series_description.as_deref(), Some("fmap_AP"));
        assert_eq!(record.phase_encoding_direction.as_deref(), Some("j-"));
        assert_eq!(record.file_names.len(), 3);
        assert!(record.has_stimulus_file());
    }

    #[test]
    fn test_build_record_without_raw_files() {
        let summary = AcquisitionSummary {
            id: "acq-2".to_string(),
            label: "mrs_press".to_string(),
            timestamp: None,
        };
        let record = build_acquisition_record(&summary, &[]);
        assert_eq!(record.zip_member_count, None);
        assert_eq!(record.series_description, None);
        assert_eq!(record.phase_encoding_direction, None);
    }

    #[test]
    fn test_notes_text_joins_with_spaces() {
        let session = SessionRecord {
            notes: vec![
                Note { text: "motion".to_string() },
                Note { text: "rescan".to_string() },
            ],
            ..Default::default()
        };
        assert_eq!(session.notes_text(), "motion rescan");
    }
}
