use super::models::*;
use super::sqlite::Database;
use super::{ReportSink, COMPLETENESS_NAMESPACE};
use crate::completeness::{CompletenessReport, ShortReport};
use crate::error::Error;
use rusqlite::{params, Result};
use tracing::debug;

impl Database {
    // ── Session Metadata ─────────────────────────────────────────

    /// Insert or replace one namespace of a session's metadata. Other
    /// namespaces of the same session are left untouched.
    pub fn upsert_session_metadata(
        &self,
        session_id: &str,
        namespace: &str,
        payload: &str,
        report_hash: Option<i64>,
    ) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.connection().execute(
            "INSERT INTO session_metadata (session_id, namespace, payload, report_hash, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (session_id, namespace) DO UPDATE SET \
             payload = excluded.payload, report_hash = excluded.report_hash, \
             updated_at = excluded.updated_at",
            params![session_id, namespace, payload, report_hash, now],
        )?;
        Ok(())
    }

    pub fn get_session_metadata(
        &self,
        session_id: &str,
        namespace: &str,
    ) -> Result<Option<SessionMetadata>> {
        match self.connection().query_row(
            "SELECT session_id, namespace, payload, report_hash, updated_at \
             FROM session_metadata WHERE session_id = ?1 AND namespace = ?2",
            params![session_id, namespace],
            |row| {
                Ok(SessionMetadata {
                    session_id: row.get(0)?,
                    namespace: row.get(1)?,
                    payload: row.get(2)?,
                    report_hash: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            },
        ) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The indexed completeness summary of a session, if it was ever curated.
    pub fn get_completeness(&self, session_id: &str) -> Result<Option<ShortReport>, Error> {
        match self.get_session_metadata(session_id, COMPLETENESS_NAMESPACE)? {
            Some(metadata) => Ok(Some(serde_json::from_str(&metadata.payload)?)),
            None => Ok(None),
        }
    }

    /// Session ids carrying metadata in the given namespace, sorted.
    pub fn list_curated_sessions(&self, namespace: &str) -> Result<Vec<String>> {
        let mut stmt = self.connection().prepare(
            "SELECT session_id FROM session_metadata WHERE namespace = ?1 ORDER BY session_id",
        )?;
        let ids = stmt
            .query_map(params![namespace], |row| row.get(0))?
            .collect::<Result<Vec<String>>>()?;
        Ok(ids)
    }

    // ── Attachments ──────────────────────────────────────────────

    pub fn upsert_attachment(&self, session_id: &str, file_name: &str, content: &[u8]) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.connection().execute(
            "INSERT INTO attachment (session_id, file_name, content, updated_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (session_id, file_name) DO UPDATE SET \
             content = excluded.content, updated_at = excluded.updated_at",
            params![session_id, file_name, content, now],
        )?;
        Ok(())
    }

    pub fn get_attachment(&self, session_id: &str, file_name: &str) -> Result<Option<Attachment>> {
        match self.connection().query_row(
            "SELECT session_id, file_name, content, updated_at \
             FROM attachment WHERE session_id = ?1 AND file_name = ?2",
            params![session_id, file_name],
            |row| {
                Ok(Attachment {
                    session_id: row.get(0)?,
                    file_name: row.get(1)?,
                    content: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            },
        ) {
            Ok(attachment) => Ok(Some(attachment)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl ReportSink for Database {
    fn write_indexed_metadata(&self, session_id: &str, report: &ShortReport) -> Result<(), Error> {
        let payload = serde_json::to_string(report)?;
        self.upsert_session_metadata(session_id, COMPLETENESS_NAMESPACE, &payload, None)?;
        Ok(())
    }

    fn write_attachment(
        &self,
        session_id: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<(), Error> {
        self.upsert_attachment(session_id, file_name, content)?;
        Ok(())
    }

    fn previous_fingerprint(&self, session_id: &str) -> Result<Option<u64>, Error> {
        let metadata = self.get_session_metadata(session_id, COMPLETENESS_NAMESPACE)?;
        Ok(metadata.and_then(|m| m.report_hash).map(|hash| hash as u64))
    }

    fn write_report(
        &self,
        session_id: &str,
        report: &CompletenessReport,
        file_name: &str,
    ) -> Result<(), Error> {
        let payload = serde_json::to_string(&report.to_short())?;
        let content = report.to_long_json_string()?;
        let fingerprint = report.fingerprint()? as i64;

        let tx = self.connection().unchecked_transaction()?;
        self.upsert_session_metadata(
            session_id,
            COMPLETENESS_NAMESPACE,
            &payload,
            Some(fingerprint),
        )?;
        self.upsert_attachment(session_id, file_name, content.as_bytes())?;
        tx.commit()?;

        debug!(
            "Stored completeness report for session {} ({} bytes)",
            session_id,
            content.len()
        );
        Ok(())
    }
}
