use crate::completeness::{self, CompletenessReport};
use crate::config::AppConfig;
use crate::error::Error;
use crate::progress::CurationObserver;
use crate::reporter::{ErrorLog, ErrorRecord};
use crate::store::models::build_acquisition_record;
use crate::store::{RecordStore, ReportSink, SessionRecord};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// File name of the long report attached to each session.
pub const ATTACHMENT_NAME: &str = "completeness_ignore-BIDS.json";

pub struct CurationEngine<'a> {
    config: AppConfig,
    store: &'a dyn RecordStore,
    sink: &'a dyn ReportSink,
    error_log: ErrorLog,
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub session_id: String,
    /// 0 on success, 1 when the session could not be curated.
    pub return_code: i32,
    pub report: Option<CompletenessReport>,
    pub error: Option<String>,
    /// False when the stored report already matched this evaluation.
    pub changed: bool,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        self.return_code == 0
    }
}

#[derive(Debug)]
pub struct BatchResult {
    pub outcomes: Vec<SessionOutcome>,
    pub skipped: usize,
    pub duration: Duration,
}

impl BatchResult {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.len() - self.failed()
    }
}

/// Result of the read-only half of curation, before anything is persisted.
struct Evaluation {
    session_id: String,
    session: Option<SessionRecord>,
    result: Result<CompletenessReport, Error>,
}

/// Analysis id used when the caller does not supply one.
pub fn default_analysis_id() -> String {
    format!(
        "completeness-{}",
        chrono::Utc::now().format("%Y%m%dT%H%M%SZ")
    )
}

impl<'a> CurationEngine<'a> {
    pub fn new(config: AppConfig, store: &'a dyn RecordStore, sink: &'a dyn ReportSink) -> Self {
        let error_log = ErrorLog::new(Path::new(&config.error_log_path));
        Self {
            config,
            store,
            sink,
            error_log,
        }
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    /// Curate one session: fetch, evaluate, persist. Any failure is logged,
    /// recorded in the error log, and leaves the session's stored report as it was.
    pub fn curate_session(
        &self,
        session_id: &str,
        analysis_id: &str,
        observer: &dyn CurationObserver,
    ) -> SessionOutcome {
        observer.on_session_start(session_id);
        let evaluation = evaluate_session(
            self.store,
            &self.config.template_file_name,
            session_id,
            observer,
        );
        let outcome = self.persist(evaluation, analysis_id);
        observer.on_session_complete(session_id, outcome.return_code);
        outcome
    }

    /// Curate several sessions. Evaluation runs in parallel; results are
    /// persisted one at a time, in input order.
    pub fn curate_sessions(
        &self,
        session_ids: &[String],
        analysis_id: &str,
        observer: &dyn CurationObserver,
    ) -> BatchResult {
        let start = Instant::now();
        observer.on_batch_start(session_ids.len());

        let store = self.store;
        let template_file_name = self.config.template_file_name.as_str();
        let evaluations: Vec<Evaluation> = session_ids
            .par_iter()
            .map(|session_id| {
                observer.on_session_start(session_id);
                evaluate_session(store, template_file_name, session_id, observer)
            })
            .collect();

        let outcomes: Vec<SessionOutcome> = evaluations
            .into_iter()
            .map(|evaluation| {
                let outcome = self.persist(evaluation, analysis_id);
                observer.on_session_complete(&outcome.session_id, outcome.return_code);
                outcome
            })
            .collect();

        let result = BatchResult {
            outcomes,
            skipped: 0,
            duration: start.elapsed(),
        };
        observer.on_batch_complete(result.failed(), result.duration.as_secs_f64());
        result
    }

    /// Curate every session in the store that does not carry a skip tag.
    pub fn curate_project(
        &self,
        analysis_id: &str,
        observer: &dyn CurationObserver,
    ) -> Result<BatchResult, Error> {
        let all_sessions = self.store.list_sessions()?;
        let total = all_sessions.len();
        let mut selected = Vec::with_capacity(all_sessions.len());
        for session_id in all_sessions {
            match self.store.fetch_session(&session_id) {
                Ok(session) if self.config.is_skipped(&session.tags) => {
                    debug!("Skipping session {} (tags {:?})", session_id, session.tags);
                }
                _ => selected.push(session_id),
            }
        }
        info!("Curating {} of {} sessions", selected.len(), total);

        let mut result = self.curate_sessions(&selected, analysis_id, observer);
        result.skipped = total - selected.len();
        Ok(result)
    }

    fn persist(&self, evaluation: Evaluation, analysis_id: &str) -> SessionOutcome {
        let Evaluation {
            session_id,
            session,
            result,
        } = evaluation;

        let stored = result.and_then(|report| {
            let report = report.with_analysis_id(analysis_id);
            let changed = self.store_report(&session_id, &report)?;
            Ok((report, changed))
        });

        match stored {
            Ok((report, changed)) => {
                info!("Return code: 0");
                SessionOutcome {
                    session_id,
                    return_code: 0,
                    report: Some(report),
                    error: None,
                    changed,
                }
            }
            Err(err) => {
                error!("Curation failed for session {}: {}", session_id, err);
                self.record_failure(&session_id, session.as_ref(), &err);
                info!("Return code: 1");
                SessionOutcome {
                    session_id,
                    return_code: 1,
                    report: None,
                    error: Some(err.to_string()),
                    changed: false,
                }
            }
        }
    }

    fn store_report(&self, session_id: &str, report: &CompletenessReport) -> Result<bool, Error> {
        let fingerprint = report.fingerprint()?;
        let changed = self.sink.previous_fingerprint(session_id)? != Some(fingerprint);
        if !changed {
            info!("Completeness of session {} is unchanged", session_id);
        }

        // The output copy is staged before the sink commits and discarded if the commit fails.
        let output_dir = Path::new(&self.config.output_dir).join(session_id);
        fs::create_dir_all(&output_dir)?;
        let staged = output_dir.join(format!("{}.tmp", ATTACHMENT_NAME));
        fs::write(&staged, report.to_long_json_string()?)?;

        info!("Uploading completeness report to session {}", session_id);
        if let Err(err) = self.sink.write_report(session_id, report, ATTACHMENT_NAME) {
            if let Err(rm_err) = fs::remove_file(&staged) {
                warn!("Could not remove {}: {}", staged.display(), rm_err);
            }
            // Only succeeds when the directory is empty.
            let _ = fs::remove_dir(&output_dir);
            return Err(err);
        }

        fs::rename(&staged, output_dir.join(ATTACHMENT_NAME))?;
        Ok(changed)
    }

    fn record_failure(&self, session_id: &str, session: Option<&SessionRecord>, err: &Error) {
        let record = ErrorRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            err: err.to_string(),
            subject_label: session.map(|s| s.subject.label.clone()).unwrap_or_default(),
            subject_id: session.map(|s| s.subject.id.clone()).unwrap_or_default(),
            session_label: session.map(|s| s.label.clone()).unwrap_or_default(),
            session_id: session_id.to_string(),
            resolved: false,
        };
        if let Err(log_err) = self.error_log.append(&record) {
            error!(
                "Could not write error log {}: {}",
                self.error_log.path().display(),
                log_err
            );
        }
    }
}

fn evaluate_session(
    store: &dyn RecordStore,
    template_file_name: &str,
    session_id: &str,
    observer: &dyn CurationObserver,
) -> Evaluation {
    info!("Curating session {}", session_id);
    let session = match store.fetch_session(session_id) {
        Ok(session) => session,
        Err(err) => {
            return Evaluation {
                session_id: session_id.to_string(),
                session: None,
                result: Err(err),
            }
        }
    };
    debug!("Session label {}", session.label);

    let result = evaluate_fetched(store, template_file_name, &session, observer);
    Evaluation {
        session_id: session_id.to_string(),
        session: Some(session),
        result,
    }
}

fn evaluate_fetched(
    store: &dyn RecordStore,
    template_file_name: &str,
    session: &SessionRecord,
    observer: &dyn CurationObserver,
) -> Result<CompletenessReport, Error> {
    let template = store
        .fetch_template(&session.project, template_file_name)?
        .ok_or_else(|| Error::TemplateNotFound {
            project_id: session.project.clone(),
            file_name: template_file_name.to_string(),
        })?;

    let mut acquisitions = Vec::new();
    for summary in store.fetch_acquisitions(&session.id)? {
        let files = match store.fetch_raw_file_metadata(&summary.id) {
            Ok(files) => files,
            Err(Error::Lookup(msg)) => {
                warn!("{}; treating acquisition {} as having no files", msg, summary.label);
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        acquisitions.push(build_acquisition_record(&summary, &files));
    }

    completeness::evaluate_observed(&session.label, template.rows(), &acquisitions, observer)
}
