use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The template has no rows for the session being evaluated. Fatal.
    #[error("No template exists for session '{session_label}'")]
    MissingTemplate { session_label: String },

    #[error("Template file '{file_name}' not found in project {project_id}")]
    TemplateNotFound {
        project_id: String,
        file_name: String,
    },

    /// A record or metadata field could not be found. Callers substitute a
    /// sentinel value instead of failing the session.
    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("{0}")]
    Other(String),
}
