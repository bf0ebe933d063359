use super::models::{AcquisitionSummary, RawFile, SessionRecord};
use super::RecordStore;
use crate::completeness::Template;
use crate::error::Error;
use ahash::AHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
struct AcquisitionSnapshot {
    #[serde(flatten)]
    summary: AcquisitionSummary,
    #[serde(default)]
    files: Vec<RawFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct SessionSnapshot {
    #[serde(flatten)]
    session: SessionRecord,
    #[serde(default)]
    acquisitions: Vec<AcquisitionSnapshot>,
}

/// Record store backed by an exported snapshot of the hierarchy:
///
/// ```text
/// <root>/sessions/<any>.json               one session with its acquisitions and files
/// <root>/projects/<project_id>/files/<f>   project attachments (templates)
/// ```
///
/// Session files are read once when the store is opened.
pub struct SnapshotStore {
    root: PathBuf,
    sessions: BTreeMap<String, SessionSnapshot>,
    /// acquisition id → (session id, index into that session's acquisitions)
    acquisition_index: AHashMap<String, (String, usize)>,
}

impl SnapshotStore {
    pub fn open(root: &Path) -> Result<Self, Error> {
        let pattern = root.join("sessions").join("*.json");
        let pattern = pattern.to_string_lossy();
        let paths = glob::glob(&pattern)
            .map_err(|e| Error::Other(format!("Invalid snapshot pattern '{}': {}", pattern, e)))?;

        let mut sessions = BTreeMap::new();
        let mut acquisition_index = AHashMap::new();

        for entry in paths {
            let path = entry.map_err(|e| Error::Io(e.into_error()))?;
            let content = fs::read_to_string(&path)?;
            let snapshot: SessionSnapshot = serde_json::from_str(&content).map_err(|e| {
                Error::Backend(format!("Unreadable session snapshot {}: {}", path.display(), e))
            })?;
            let session_id = snapshot.session.id.clone();

            for (idx, acq) in snapshot.acquisitions.iter().enumerate() {
                acquisition_index.insert(acq.summary.id.clone(), (session_id.clone(), idx));
            }
            if sessions.insert(session_id.clone(), snapshot).is_some() {
                warn!("Session {} appears in more than one snapshot file", session_id);
            }
        }

        debug!(
            "Snapshot store at {} holds {} sessions, {} acquisitions",
            root.display(),
            sessions.len(),
            acquisition_index.len()
        );

        Ok(Self {
            root: root.to_path_buf(),
            sessions,
            acquisition_index,
        })
    }

    fn snapshot(&self, session_id: &str) -> Result<&SessionSnapshot, Error> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| Error::Lookup(format!("Session {} not found", session_id)))
    }
}

impl RecordStore for SnapshotStore {
    fn list_sessions(&self) -> Result<Vec<String>, Error> {
        Ok(self.sessions.keys().cloned().collect())
    }

    fn fetch_session(&self, session_id: &str) -> Result<SessionRecord, Error> {
        Ok(self.snapshot(session_id)?.session.clone())
    }

    fn fetch_acquisitions(&self, session_id: &str) -> Result<Vec<AcquisitionSummary>, Error> {
        let mut acquisitions: Vec<AcquisitionSummary> = self
            .snapshot(session_id)?
            .acquisitions
            .iter()
            .map(|acq| acq.summary.clone())
            .collect();
        acquisitions.sort_by_key(|acq| acq.timestamp);
        Ok(acquisitions)
    }

    fn fetch_raw_file_metadata(&self, acquisition_id: &str) -> Result<Vec<RawFile>, Error> {
        let (session_id, idx) = self
            .acquisition_index
            .get(acquisition_id)
            .ok_or_else(|| Error::Lookup(format!("Acquisition {} not found", acquisition_id)))?;
        Ok(self.snapshot(session_id)?.acquisitions[*idx].files.clone())
    }

    fn fetch_template(&self, project_id: &str, file_name: &str) -> Result<Option<Template>, Error> {
        let path = self
            .root
            .join("projects")
            .join(project_id)
            .join("files")
            .join(file_name);
        if !path.is_file() {
            return Ok(None);
        }
        debug!("Loading template {}", path.display());
        Template::from_path(&path).map(Some)
    }
}
