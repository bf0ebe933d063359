use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One expected acquisition for a session label, as authored by the site.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TemplateRow {
    #[serde(rename = "Session")]
    pub session_label: String,
    #[serde(rename = "Modality", default)]
    pub modality: Option<String>,
    #[serde(rename = "SeriesDescription", default)]
    pub series_description: Option<String>,
    #[serde(rename = "AcquisitionLabel")]
    pub acquisition_label: String,
    #[serde(rename = "ExpectedLength", default)]
    pub expected_length: Option<f64>,
    #[serde(rename = "ExpectedPEDir", default)]
    pub expected_pe_dir: Option<String>,
}

impl TemplateRow {
    pub fn new(session_label: &str, acquisition_label: &str) -> Self {
        Self {
            session_label: session_label.to_string(),
            modality: None,
            series_description: None,
            acquisition_label: acquisition_label.to_string(),
            expected_length: None,
            expected_pe_dir: None,
        }
    }

    pub fn with_expected_length(mut self, length: f64) -> Self {
        self.expected_length = Some(length);
        self
    }

    pub fn with_expected_pe_dir(mut self, direction: &str) -> Self {
        self.expected_pe_dir = Some(direction.to_string());
        self
    }

    /// Expected image count, if the template gives a usable one.
    /// NaN and non-positive lengths carry no reference to judge against.
    pub fn expected_count(&self) -> Option<f64> {
        self.expected_length.filter(|len| len.is_finite() && *len > 0.0)
    }

    pub fn expected_direction(&self) -> Option<&str> {
        self.expected_pe_dir
            .as_deref()
            .filter(|dir| !dir.is_empty() && !dir.eq_ignore_ascii_case("nan"))
    }
}

/// The full expected-acquisition table for a project.
#[derive(Debug, Clone, Default)]
pub struct Template {
    rows: Vec<TemplateRow>,
}

impl Template {
    pub fn new(rows: Vec<TemplateRow>) -> Self {
        Self { rows }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let rows = csv_reader
            .deserialize::<TemplateRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn rows(&self) -> &[TemplateRow] {
        &self.rows
    }
}

/// Rows whose session label matches exactly.
pub fn session_rows<'a>(rows: &'a [TemplateRow], session_label: &str) -> Vec<&'a TemplateRow> {
    rows.iter()
        .filter(|row| row.session_label == session_label)
        .collect()
}
