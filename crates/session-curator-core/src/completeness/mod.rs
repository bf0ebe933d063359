pub mod acquisition;
pub mod checks;
pub mod report;
pub mod template;

pub use acquisition::AcquisitionRecord;
pub use report::{CompletenessReport, DuplicateCounts, ImageCount, ModalityCounts, ShortReport};
pub use template::{Template, TemplateRow};

use crate::error::Error;
use crate::progress::{Check, CurationObserver, SilentObserver};
use tracing::{debug, info};

/// Evaluate one session against its expected-acquisition template.
///
/// `template` may hold rows for any number of sessions; only rows whose
/// session label equals `session_label` are used. Fails with
/// [`Error::MissingTemplate`] when there are none.
pub fn evaluate(
    session_label: &str,
    template: &[TemplateRow],
    acquisitions: &[AcquisitionRecord],
) -> Result<CompletenessReport, Error> {
    evaluate_observed(session_label, template, acquisitions, &SilentObserver)
}

pub fn evaluate_observed(
    session_label: &str,
    template: &[TemplateRow],
    acquisitions: &[AcquisitionRecord],
    observer: &dyn CurationObserver,
) -> Result<CompletenessReport, Error> {
    let session_rows = template::session_rows(template, session_label);
    if session_rows.is_empty() {
        return Err(Error::MissingTemplate {
            session_label: session_label.to_string(),
        });
    }
    debug!(
        "Template has {} rows for session {}",
        session_rows.len(),
        session_label
    );

    let acquisitions = acquisition::sort_by_timestamp(acquisitions);
    let mut report = CompletenessReport::default();

    let start = |check: Check| {
        info!("Running {} check", check);
        observer.on_check_start(session_label, check);
    };

    start(Check::ImageCount);
    checks::image_counts(&session_rows, &acquisitions, &mut report);
    start(Check::Modality);
    checks::modality_counts(&acquisitions, &mut report);
    start(Check::Duplicates);
    checks::detect_duplicates(&acquisitions, &mut report);
    start(Check::PhaseEncoding);
    checks::check_phase_encoding(&session_rows, &acquisitions, &mut report);
    start(Check::MissingAndExtra);
    checks::missing_and_extra_scans(&session_rows, &acquisitions, &mut report);
    start(Check::Stimulus);
    checks::stimulus_complete(&acquisitions, &mut report);

    start(Check::HumanEyes);
    checks::human_eyes(&mut report);
    start(Check::SessionComplete);
    checks::session_complete(&mut report);
    start(Check::DownstreamAnalyses);
    checks::run_downstream_analyses(&mut report);

    Ok(report)
}
