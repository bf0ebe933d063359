use crate::config::AppConfig;
use crate::error::Error;
use crate::store::{Database, RecordStore, SessionRecord, COMPLETENESS_NAMESPACE};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use tracing::{debug, info};

/// One line of the session status table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "subject.label")]
    pub subject_label: String,
    #[serde(rename = "session.label")]
    pub session_label: String,
    #[serde(rename = "session.id")]
    pub session_id: String,
    #[serde(rename = "project")]
    pub project: String,
    #[serde(rename = "Run Downstream Analyses")]
    pub run_downstream_analyses: Option<bool>,
    #[serde(rename = "Notes")]
    pub notes: String,
}

/// Build the status table over every non-skipped session, oldest first.
///
/// The downstream verdict is read from the database when the session has been
/// curated there, otherwise from the session's own `COMPLETENESS` metadata.
pub fn build_summary(
    store: &dyn RecordStore,
    db: Option<&Database>,
    config: &AppConfig,
) -> Result<Vec<SummaryRow>, Error> {
    let mut rows = Vec::new();
    for session_id in store.list_sessions()? {
        let session = store.fetch_session(&session_id)?;
        if config.is_skipped(&session.tags) {
            debug!("Leaving session {} out of the summary", session.label);
            continue;
        }

        let from_db = match db {
            Some(db) => db
                .get_completeness(&session.id)?
                .map(|report| report.run_downstream_analyses),
            None => None,
        };
        let run_downstream_analyses = from_db.or_else(|| downstream_from_info(&session));

        rows.push(SummaryRow {
            timestamp: session.timestamp,
            subject_label: session.subject.label.clone(),
            session_label: session.label.clone(),
            session_id: session.id.clone(),
            project: session.project.clone(),
            run_downstream_analyses,
            notes: session.notes_text(),
        });
    }

    rows.sort_by_key(|row| row.timestamp);
    info!("Summary holds {} sessions", rows.len());
    Ok(rows)
}

fn downstream_from_info(session: &SessionRecord) -> Option<bool> {
    let completeness = session.info.get(COMPLETENESS_NAMESPACE)?;
    completeness
        .get("runDownstreamAnalyses")
        .or_else(|| completeness.get("Run Downstream Analyses"))
        .and_then(Value::as_bool)
}

pub fn write_summary_csv<W: Write>(rows: &[SummaryRow], writer: W) -> Result<(), Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
