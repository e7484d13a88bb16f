use std::path::{Path, PathBuf};

pub const DEFAULT_INDEX_DIR: &str = "_index";
pub const DEFAULT_INDEX_FILE: &str = "studies_index.json";
pub const DEFAULT_EXTENSIONS: &[&str] = &["pdf", "docx", "doc"];

/// Where the corpus lives and which files in it count as documents.
///
/// Every engine entry point takes this explicitly.
///
/// # Examples
///
/// ```
/// use saplens::config::EngineConfig;
///
/// let config = EngineConfig::new("/data/sap");
/// assert!(config.is_supported(std::path::Path::new("plan.PDF")));
/// assert!(!config.is_supported(std::path::Path::new("notes.md")));
/// assert!(config.index_file().ends_with("_index/studies_index.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub corpus_root: PathBuf,
    /// Subdirectory of `corpus_root` holding the index; never walked.
    pub index_dir_name: String,
    pub index_file_name: String,
    /// Lower-case extensions without the leading dot.
    pub supported_extensions: Vec<String>,
}

impl EngineConfig {
    pub fn new(corpus_root: impl Into<PathBuf>) -> Self {
        Self {
            corpus_root: corpus_root.into(),
            index_dir_name: DEFAULT_INDEX_DIR.to_string(),
            index_file_name: DEFAULT_INDEX_FILE.to_string(),
            supported_extensions: DEFAULT_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }

    /// Replace the extension allow-list. Leading dots and case are ignored.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.supported_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn index_dir(&self) -> PathBuf {
        self.corpus_root.join(&self.index_dir_name)
    }

    pub fn index_file(&self) -> PathBuf {
        self.index_dir().join(&self.index_file_name)
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| self.supported_extensions.contains(&ext))
    }
}
