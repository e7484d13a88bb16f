//! The persisted study index: study id to detected labels and source path.
//!
//! Stored as one pretty-printed JSON object whose key order is the order
//! studies were inserted during the last rebuild.

use std::{collections::HashMap, fmt, path::PathBuf};

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::{
    analysis::StudySummary,
    classify::UNKNOWN,
    config::EngineConfig,
    error::{Error, Result},
};

/// One indexed study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyIndexRecord {
    pub study_id: String,
    pub detected_phase: String,
    pub detected_therapeutic: String,
    pub detected_indication: String,
    pub source_file: String,
}

impl StudyIndexRecord {
    pub fn from_summary(
        study_id: impl Into<String>,
        summary: StudySummary,
    ) -> Self {
        let labels = summary.classification;
        Self {
            study_id: study_id.into(),
            detected_phase: labels.detected_phase,
            detected_therapeutic: labels.detected_therapeutic,
            detected_indication: labels.detected_indication,
            source_file: summary.source_file,
        }
    }
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// A record as it appears under its key in the index file.
#[derive(Serialize)]
struct EntryRef<'a> {
    detected_phase: &'a str,
    detected_therapeutic: &'a str,
    detected_indication: &'a str,
    source_file: &'a str,
}

#[derive(Deserialize)]
struct Entry {
    #[serde(default = "unknown")]
    detected_phase: String,
    #[serde(default = "unknown")]
    detected_therapeutic: String,
    #[serde(default = "unknown")]
    detected_indication: String,
    source_file: String,
}

/// Optional filters for [`StudyIndex::find`]. Empty values match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindCriteria {
    pub phase: Option<String>,
    pub therapeutic: Option<String>,
    pub indication: Option<String>,
}

/// Case-insensitive substring match in either direction.
fn cross_matches(criterion: Option<&str>, stored: &str) -> bool {
    let Some(criterion) = criterion.filter(|c| !c.is_empty()) else {
        return true;
    };
    let criterion = criterion.to_lowercase();
    let stored = stored.to_lowercase();
    stored.contains(&criterion) || criterion.contains(&stored)
}

impl FindCriteria {
    pub fn matches(&self, record: &StudyIndexRecord) -> bool {
        cross_matches(self.phase.as_deref(), &record.detected_phase)
            && cross_matches(
                self.therapeutic.as_deref(),
                &record.detected_therapeutic,
            )
            && cross_matches(
                self.indication.as_deref(),
                &record.detected_indication,
            )
    }
}

/// Insertion-ordered map from study id to [`StudyIndexRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyIndex {
    records: Vec<StudyIndexRecord>,
    positions: HashMap<String, usize>,
}

impl StudyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. A record with an existing id replaces the old one in
    /// its original position.
    pub fn insert(&mut self, record: StudyIndexRecord) {
        match self.positions.get(&record.study_id) {
            Some(&pos) => self.records[pos] = record,
            None => {
                self.positions
                    .insert(record.study_id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, study_id: &str) -> Option<&StudyIndexRecord> {
        self.positions.get(study_id).map(|&pos| &self.records[pos])
    }

    /// Like [`get`](Self::get), but an absent id is an error listing the
    /// ids that do exist.
    pub fn lookup(&self, study_id: &str) -> Result<&StudyIndexRecord> {
        self.get(study_id).ok_or_else(|| Error::UnknownStudyId {
            study_id: study_id.to_string(),
            available: self.study_ids().map(str::to_string).collect(),
        })
    }

    pub fn find(&self, criteria: &FindCriteria) -> Vec<&StudyIndexRecord> {
        self.records.iter().filter(|r| criteria.matches(r)).collect()
    }

    pub fn study_ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.study_id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StudyIndexRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read the index file of `config`.
    ///
    /// A missing file is [`Error::MissingIndex`]. So is a file that does
    /// not parse; a rebuild replaces it.
    pub fn load(config: &EngineConfig) -> Result<Self> {
        let path = config.index_file();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingIndex);
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(
                path = %path.display(),
                "ignoring malformed index file: {e}"
            );
            Error::MissingIndex
        })
    }

    /// Replace the index file of `config` with this index.
    ///
    /// The JSON is written next to the target and renamed over it, so a
    /// reader never sees a partial file.
    pub fn save(&self, config: &EngineConfig) -> Result<PathBuf> {
        let path = config.index_file();
        std::fs::create_dir_all(config.index_dir())?;

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(path)
    }
}

impl Serialize for StudyIndex {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(
                &record.study_id,
                &EntryRef {
                    detected_phase: record.detected_phase.as_str(),
                    detected_therapeutic: record.detected_therapeutic.as_str(),
                    detected_indication: record.detected_indication.as_str(),
                    source_file: record.source_file.as_str(),
                },
            )?;
        }
        map.end()
    }
}

struct StudyIndexVisitor;

impl<'de> Visitor<'de> for StudyIndexVisitor {
    type Value = StudyIndex;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of study ids to index entries")
    }

    fn visit_map<A: MapAccess<'de>>(
        self,
        mut access: A,
    ) -> std::result::Result<StudyIndex, A::Error> {
        let mut index = StudyIndex::new();
        while let Some((study_id, entry)) =
            access.next_entry::<String, Entry>()?
        {
            index.insert(StudyIndexRecord {
                study_id,
                detected_phase: entry.detected_phase,
                detected_therapeutic: entry.detected_therapeutic,
                detected_indication: entry.detected_indication,
                source_file: entry.source_file,
            });
        }
        Ok(index)
    }
}

impl<'de> Deserialize<'de> for StudyIndex {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(StudyIndexVisitor)
    }
}
