use std::path::{Path, PathBuf};

use crate::{config::EngineConfig, error::Result};

/// A discovered corpus document.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path relative to the corpus root.
    pub relative_path: PathBuf,
    /// The corpus root joined with `relative_path`.
    pub path: PathBuf,
}

/// Recursively walk the corpus and discover supported documents.
///
/// The index subdirectory directly under the root is skipped. Results are
/// sorted by relative path so repeated walks over an unchanged corpus
/// produce the same order.
pub fn discover_files(config: &EngineConfig) -> Result<Vec<DiscoveredFile>> {
    let root = config.corpus_root.as_path();
    let index_dir = config.index_dir();
    let mut results = Vec::new();
    walk_dir(config, root, &index_dir, root, &mut results)?;
    results.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(results)
}

fn walk_dir(
    config: &EngineConfig,
    root: &Path,
    index_dir: &Path,
    current: &Path,
    results: &mut Vec<DiscoveredFile>,
) -> Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();

        if path == index_dir {
            continue;
        }

        // Follows symlinks; broken links are skipped.
        let Ok(metadata) = std::fs::metadata(&path) else {
            tracing::debug!(path = %path.display(), "skipping unreadable entry");
            continue;
        };

        if metadata.is_dir() {
            if entry.file_type()?.is_symlink() {
                continue;
            }
            walk_dir(config, root, index_dir, &path, results)?;
        } else if metadata.is_file() && config.is_supported(&path) {
            let relative_path =
                path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            tracing::debug!(path = %relative_path.display(), "discovered");
            results.push(DiscoveredFile {
                relative_path,
                path,
            });
        }
    }

    Ok(())
}
