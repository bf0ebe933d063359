use chrono::{DateTime, Utc};

/// Snapshot of one scan collected in a session, reduced to the fields the
/// completeness checks read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcquisitionRecord {
    pub label: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// Member count of the zipped raw (dicom) file. Absent for single-file raw data.
    pub zip_member_count: Option<u64>,
    pub series_description: Option<String>,
    pub phase_encoding_direction: Option<String>,
    pub file_names: Vec<String>,
}

impl AcquisitionRecord {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_zip_member_count(mut self, count: u64) -> Self {
        self.zip_member_count = Some(count);
        self
    }

    pub fn with_series_description(mut self, description: &str) -> Self {
        self.series_description = Some(description.to_string());
        self
    }

    pub fn with_phase_encoding_direction(mut self, direction: &str) -> Self {
        self.phase_encoding_direction = Some(direction.to_string());
        self
    }

    pub fn with_file(mut self, name: &str) -> Self {
        self.file_names.push(name.to_string());
        self
    }

    /// Zip member count, with an empty zip counted as no zip at all.
    pub fn actual_count(&self) -> Option<u64> {
        self.zip_member_count.filter(|count| *count > 0)
    }

    pub fn actual_direction(&self) -> Option<&str> {
        self.phase_encoding_direction
            .as_deref()
            .filter(|dir| !dir.is_empty())
    }

    pub fn has_stimulus_file(&self) -> bool {
        self.file_names.iter().any(|name| name.contains("_stim"))
    }
}

/// Sort by acquisition time, oldest first. Stable, so ties keep input order
/// and records without a timestamp come first.
pub fn sort_by_timestamp(acquisitions: &[AcquisitionRecord]) -> Vec<&AcquisitionRecord> {
    let mut sorted: Vec<&AcquisitionRecord> = acquisitions.iter().collect();
    sorted.sort_by_key(|acq| acq.timestamp);
    sorted
}
