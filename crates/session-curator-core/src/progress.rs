use std::fmt;

/// The completeness checks, in the order the evaluator runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    ImageCount,
    Modality,
    Duplicates,
    PhaseEncoding,
    MissingAndExtra,
    Stimulus,
    HumanEyes,
    SessionComplete,
    DownstreamAnalyses,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::ImageCount => "image count",
            Check::Modality => "modality",
            Check::Duplicates => "duplicate",
            Check::PhaseEncoding => "phase encoding",
            Check::MissingAndExtra => "missing and extra scan",
            Check::Stimulus => "events upload",
            Check::HumanEyes => "human eyes",
            Check::SessionComplete => "completeness",
            Check::DownstreamAnalyses => "downstream analyses",
        };
        f.write_str(name)
    }
}

/// Trait for observing curation progress.
///
/// CLI implements with indicatif; tests and library callers use `SilentObserver`.
/// All methods have default no-op implementations.
pub trait CurationObserver: Send + Sync {
    fn on_batch_start(&self, _total_sessions: usize) {}
    fn on_session_start(&self, _session_id: &str) {}
    fn on_check_start(&self, _session_label: &str, _check: Check) {}
    fn on_session_complete(&self, _session_id: &str, _return_code: i32) {}
    fn on_batch_complete(&self, _failed: usize, _duration_secs: f64) {}
}

/// No-op observer for silent operation.
pub struct SilentObserver;

impl CurationObserver for SilentObserver {}
