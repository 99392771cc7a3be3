//! Shared configuration and domain vocabulary for the leadbot workspace.

pub mod app_config;
pub mod config;
pub mod domain;
pub mod fingerprint;
pub mod knowledge;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use domain::{ContactStatus, InquiryCategory, PriorityTier};
pub use fingerprint::fingerprint;
pub use knowledge::{load_knowledge, KnowledgeBase};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read knowledge file {path}: {source}")]
    KnowledgeFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse knowledge file: {0}")]
    KnowledgeFileParse(#[source] serde_yaml::Error),

    #[error("knowledge validation failed: {0}")]
    Validation(String),
}
