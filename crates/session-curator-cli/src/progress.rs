use indicatif::{ProgressBar, ProgressStyle};
use session_curator_core::{Check, CurationObserver};
use std::sync::Mutex;

/// CLI progress observer using indicatif.
///
/// - Single session: spinner showing the running check
/// - Batch: progress bar over sessions (total known upfront)
pub struct CliObserver {
    bar: Mutex<Option<ProgressBar>>,
    batch: Mutex<bool>,
}

impl CliObserver {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            batch: Mutex::new(false),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn in_batch(&self) -> bool {
        *self.batch.lock().unwrap()
    }
}

impl CurationObserver for CliObserver {
    fn on_batch_start(&self, total_sessions: usize) {
        *self.batch.lock().unwrap() = true;
        let pb = ProgressBar::new(total_sessions as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Curating [{bar:30.cyan/dim}] {pos}/{len} sessions ({eta} remaining)",
            )
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_session_start(&self, session_id: &str) {
        if self.in_batch() {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(format!("Curating session {}...", session_id));
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_check_start(&self, session_label: &str, check: Check) {
        if self.in_batch() {
            return;
        }
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(format!("{}: running {} check", session_label, check));
        }
    }

    fn on_session_complete(&self, session_id: &str, return_code: i32) {
        if self.in_batch() {
            let guard = self.bar.lock().unwrap();
            if let Some(pb) = guard.as_ref() {
                pb.inc(1);
            }
            return;
        }
        self.finish_bar();
        if return_code == 0 {
            eprintln!("  \x1b[32m✓\x1b[0m Session {} curated", session_id);
        } else {
            eprintln!("  \x1b[31m✗\x1b[0m Session {} failed", session_id);
        }
    }

    fn on_batch_complete(&self, failed: usize, duration_secs: f64) {
        self.finish_bar();
        *self.batch.lock().unwrap() = false;
        eprintln!(
            "  \x1b[32m✓\x1b[0m Batch complete: {} failed in {:.2}s",
            failed, duration_secs
        );
    }
}
