pub mod completeness;
pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod reporter;
pub mod store;
pub mod summary;

pub use completeness::{evaluate, CompletenessReport, ShortReport};
pub use config::AppConfig;
pub use engine::{BatchResult, CurationEngine, SessionOutcome};
pub use error::Error;
pub use progress::{Check, CurationObserver, SilentObserver};
