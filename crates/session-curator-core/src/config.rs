use crate::error::Error;
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Root of the snapshot store (`sessions/` and `projects/` live here).
    #[serde(default = "default_store_root")]
    pub store_root: String,
    /// Name of the expected-acquisition template attached to each project.
    #[serde(default = "default_template_file_name")]
    pub template_file_name: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Directory receiving a copy of every long report.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_error_log_path")]
    pub error_log_path: String,
    /// Sessions carrying any of these tags are skipped by batch runs and the summary.
    #[serde(default = "default_skip_tags")]
    pub skip_tags: Vec<String>,
}

fn default_store_root() -> String {
    "./store".to_string()
}

fn default_template_file_name() -> String {
    "completeness_template.csv".to_string()
}

fn default_database_path() -> String {
    "session_curator.db".to_string()
}

fn default_output_dir() -> String {
    "./output".to_string()
}

fn default_error_log_path() -> String {
    "./output/curation_errors.csv".to_string()
}

fn default_skip_tags() -> Vec<String> {
    vec!["pilot".to_string()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_root: default_store_root(),
            template_file_name: default_template_file_name(),
            database_path: default_database_path(),
            output_dir: default_output_dir(),
            error_log_path: default_error_log_path(),
            skip_tags: default_skip_tags(),
        }
    }
}

impl AppConfig {
    pub fn is_skipped(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.skip_tags.contains(tag))
    }
}

/// Load settings from an optional `Config.toml`, then `CURATOR_*` environment overrides.
pub fn load_configuration() -> Result<AppConfig, Error> {
    load_configuration_from("Config")
}

pub fn load_configuration_from(name: &str) -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(name).required(false))
        .add_source(
            Environment::with_prefix("CURATOR")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("skip_tags"),
        )
        .build()?;
    Ok(builder.try_deserialize::<AppConfig>()?)
}
