use std::{fmt, path::PathBuf};

use rayon::prelude::*;

use crate::{
    analysis::summarize,
    config::EngineConfig,
    error::{Error, Result},
    study_id::StudyId,
    study_index::{StudyIndex, StudyIndexRecord},
    text_source::TextProvider,
    walker::{DiscoveredFile, discover_files},
};

/// Outcome of a full index rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    pub indexed: usize,
    pub errors: usize,
    pub index_file: PathBuf,
}

impl fmt::Display for RebuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Indexing complete: {} documents indexed, {} errors. Index saved to {}",
            self.indexed,
            self.errors,
            self.index_file.display()
        )
    }
}

/// Text extraction plus summary for one file. Pure per-file work.
fn index_record<P>(
    provider: &P,
    file: &DiscoveredFile,
) -> Result<StudyIndexRecord>
where
    P: TextProvider + ?Sized,
{
    let text = provider.text(&file.path);
    if text.is_empty() {
        return Err(Error::UnreadableDocument(file.path.clone()));
    }
    let study_id = StudyId::from_path(&file.path);
    Ok(StudyIndexRecord::from_summary(
        study_id.into_string(),
        summarize(&text, &file.path),
    ))
}

/// Rebuild the study index from every supported document in the corpus.
///
/// Documents are analysed in parallel and merged in walk order, so an
/// unchanged corpus always produces the same index. A document that
/// yields no text is counted as an error and left out; it never aborts
/// the rebuild. The previous index file is replaced, not merged.
pub fn rebuild_index<P>(
    config: &EngineConfig,
    provider: &P,
) -> Result<RebuildReport>
where
    P: TextProvider + ?Sized,
{
    if !config.corpus_root.is_dir() {
        return Err(Error::CorpusMissing(config.corpus_root.clone()));
    }

    let files = discover_files(config)?;
    tracing::debug!(count = files.len(), "analysing corpus documents");

    let outcomes: Vec<_> = files
        .par_iter()
        .map(|file| index_record(provider, file))
        .collect();

    let mut index = StudyIndex::new();
    let mut indexed = 0;
    let mut errors = 0;
    for (file, outcome) in files.iter().zip(outcomes) {
        match outcome {
            Ok(record) => {
                index.insert(record);
                indexed += 1;
            }
            Err(e) => {
                tracing::warn!(
                    path = %file.relative_path.display(),
                    "error indexing document: {e}"
                );
                errors += 1;
            }
        }
    }

    let index_file = index.save(config)?;
    tracing::info!(
        indexed,
        errors,
        studies = index.len(),
        path = %index_file.display(),
        "index rebuilt"
    );

    Ok(RebuildReport {
        indexed,
        errors,
        index_file,
    })
}
