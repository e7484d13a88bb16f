//! Tool-level operations shared by the CLI and the MCP server.

use std::path::Path;

use serde::Serialize;

use crate::{
    analysis::{ComprehensiveAnalysis, StudySummary, analyze, summarize},
    config::EngineConfig,
    error::{Error, Result},
    study_index::{FindCriteria, StudyIndex, StudyIndexRecord},
    text_source::TextProvider,
};

/// Shown in place of a criterion that was not given.
const ANY: &str = "Any";

fn read_text<P>(provider: &P, path: &Path) -> Result<String>
where
    P: TextProvider + ?Sized,
{
    let text = provider.text(path);
    if text.is_empty() {
        return Err(Error::UnreadableDocument(path.to_path_buf()));
    }
    Ok(text)
}

/// Summarize a single document outside of any index.
pub fn parse_for_index<P>(provider: &P, path: &Path) -> Result<StudySummary>
where
    P: TextProvider + ?Sized,
{
    if !path.exists() {
        return Err(Error::NotFound {
            kind: "file",
            name: path.display().to_string(),
        });
    }
    let text = read_text(provider, path)?;
    Ok(summarize(&text, path))
}

/// Full analysis of an indexed study, re-read from its source document.
pub fn analyze_study<P>(
    config: &EngineConfig,
    provider: &P,
    study_id: &str,
) -> Result<ComprehensiveAnalysis>
where
    P: TextProvider + ?Sized,
{
    let index = StudyIndex::load(config)?;
    let record = index.lookup(study_id)?;
    let path = Path::new(&record.source_file);
    let text = read_text(provider, path)?;
    Ok(analyze(&text, path, study_id))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCriteria {
    pub phase: String,
    pub therapeutic: String,
    pub indication: String,
}

impl From<&FindCriteria> for SearchCriteria {
    fn from(criteria: &FindCriteria) -> Self {
        let shown = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or(ANY)
                .to_string()
        };
        Self {
            phase: shown(&criteria.phase),
            therapeutic: shown(&criteria.therapeutic),
            indication: shown(&criteria.indication),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyMatch {
    pub study_id: String,
    pub detected_phase: String,
    pub detected_therapeutic: String,
    pub detected_indication: String,
}

impl From<&StudyIndexRecord> for StudyMatch {
    fn from(record: &StudyIndexRecord) -> Self {
        Self {
            study_id: record.study_id.clone(),
            detected_phase: record.detected_phase.clone(),
            detected_therapeutic: record.detected_therapeutic.clone(),
            detected_indication: record.detected_indication.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindStudiesResponse {
    pub search_criteria: SearchCriteria,
    pub total_matches: usize,
    pub matching_studies: Vec<StudyMatch>,
}

/// Filter the index by detected labels.
pub fn find_studies(
    config: &EngineConfig,
    criteria: &FindCriteria,
) -> Result<FindStudiesResponse> {
    let index = StudyIndex::load(config)?;
    let matching_studies: Vec<StudyMatch> = index
        .find(criteria)
        .into_iter()
        .map(StudyMatch::from)
        .collect();

    Ok(FindStudiesResponse {
        search_criteria: SearchCriteria::from(criteria),
        total_matches: matching_studies.len(),
        matching_studies,
    })
}
