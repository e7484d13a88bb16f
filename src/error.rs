use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("data directory does not exist and could not be created: {0}")]
    DataDir(PathBuf),

    #[error(
        "SAP directory not found at {0}. Please create it and add documents."
    )]
    CorpusMissing(PathBuf),

    #[error(
        "No search index found. Please run index_sap_documents first to build the search index."
    )]
    MissingIndex,

    #[error("Study ID '{study_id}' not found. Available study IDs: {available:?}")]
    UnknownStudyId {
        study_id: String,
        available: Vec<String>,
    },

    #[error("Could not extract text from {0}")]
    UnreadableDocument(PathBuf),
}
