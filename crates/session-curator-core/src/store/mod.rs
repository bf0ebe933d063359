pub mod models;
pub mod queries;
pub mod snapshot;
pub mod sqlite;

pub use models::{AcquisitionSummary, RawFile, SessionRecord};
pub use snapshot::SnapshotStore;
pub use sqlite::Database;

use crate::completeness::{CompletenessReport, ShortReport, Template};
use crate::error::Error;

/// Namespace under which the short report is indexed in session metadata.
pub const COMPLETENESS_NAMESPACE: &str = "COMPLETENESS";

/// Read access to the research-data hierarchy.
pub trait RecordStore: Send + Sync {
    fn list_sessions(&self) -> Result<Vec<String>, Error>;

    fn fetch_session(&self, session_id: &str) -> Result<SessionRecord, Error>;

    /// Acquisitions of a session, oldest first.
    fn fetch_acquisitions(&self, session_id: &str) -> Result<Vec<AcquisitionSummary>, Error>;

    /// Files of one acquisition. Returns [`Error::Lookup`] when the acquisition is unknown.
    fn fetch_raw_file_metadata(&self, acquisition_id: &str) -> Result<Vec<RawFile>, Error>;

    /// The named project file parsed as a template, or `None` if the project has no such file.
    fn fetch_template(&self, project_id: &str, file_name: &str) -> Result<Option<Template>, Error>;
}

/// Write access for curation results.
pub trait ReportSink {
    fn write_indexed_metadata(&self, session_id: &str, report: &ShortReport) -> Result<(), Error>;

    fn write_attachment(&self, session_id: &str, file_name: &str, content: &[u8])
        -> Result<(), Error>;

    /// Fingerprint of the last report written for the session, if the sink keeps one.
    fn previous_fingerprint(&self, _session_id: &str) -> Result<Option<u64>, Error> {
        Ok(None)
    }

    /// Persist the short report as metadata and the long report as an attachment.
    /// Sinks that support it write both or neither.
    fn write_report(
        &self,
        session_id: &str,
        report: &CompletenessReport,
        file_name: &str,
    ) -> Result<(), Error> {
        let content = report.to_long_json_string()?;
        self.write_indexed_metadata(session_id, &report.to_short())?;
        self.write_attachment(session_id, file_name, content.as_bytes())
    }
}
