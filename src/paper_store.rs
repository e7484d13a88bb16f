//! Topic-keyed paper collections stored as `papers_info.json` files.
//!
//! Each topic gets its own directory under the store root, named by
//! lower-casing the topic and replacing spaces with underscores.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    text_util::{title_case, truncate_chars},
};

const PAPERS_FILE: &str = "papers_info.json";

/// Maximum characters shown for a paper summary in topic listings.
pub const SUMMARY_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperInfo {
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub pdf_url: String,
    pub published: String,
}

/// Papers of one topic, keyed by paper id.
pub type PaperCollection = BTreeMap<String, PaperInfo>;

#[derive(Debug, Clone)]
pub struct PaperStore {
    root: PathBuf,
}

impl PaperStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn topic_dir_name(topic: &str) -> String {
        topic.to_lowercase().replace(' ', "_")
    }

    pub fn papers_file(&self, topic: &str) -> PathBuf {
        self.root.join(Self::topic_dir_name(topic)).join(PAPERS_FILE)
    }

    /// Papers stored for `topic`, or `None` if the topic has no file.
    pub fn load_topic(&self, topic: &str) -> Result<Option<PaperCollection>> {
        read_collection(&self.papers_file(topic))
    }

    /// Merge `papers` into the topic's collection and write it back.
    ///
    /// A missing or unreadable collection starts out empty. Returns the
    /// path of the written file.
    pub fn save<I>(&self, topic: &str, papers: I) -> Result<PathBuf>
    where
        I: IntoIterator<Item = (String, PaperInfo)>,
    {
        let path = self.papers_file(topic);
        let mut collection = match read_collection(&path) {
            Ok(existing) => existing.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "replacing unreadable paper collection: {e}"
                );
                PaperCollection::new()
            }
        };
        collection.extend(papers);

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, serde_json::to_vec_pretty(&collection)?)?;
        tracing::debug!(path = %path.display(), "saved paper collection");
        Ok(path)
    }

    /// Topic directory names that hold a collection file, sorted.
    pub fn topics(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut topics = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() && path.join(PAPERS_FILE).is_file() {
                topics.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        topics.sort();
        Ok(topics)
    }

    /// First topic, in sorted order, holding `paper_id`.
    pub fn find(&self, paper_id: &str) -> Result<Option<PaperInfo>> {
        for topic in self.topics()? {
            let path = self.root.join(&topic).join(PAPERS_FILE);
            match read_collection(&path) {
                Ok(Some(mut papers)) => {
                    if let Some(info) = papers.remove(paper_id) {
                        return Ok(Some(info));
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping: {e}");
                }
            }
        }
        Ok(None)
    }

    /// Markdown list of available topics.
    pub fn render_folders(&self) -> Result<String> {
        let topics = self.topics()?;
        let mut out = String::from("# Available Topics\n\n");
        match topics.last() {
            Some(last) => {
                for topic in &topics {
                    out.push_str(&format!("- {topic}\n"));
                }
                out.push_str(&format!(
                    "\nUse @{last} to access papers in that topic.\n"
                ));
            }
            None => out.push_str("No topics found.\n"),
        }
        Ok(out)
    }

    /// Markdown listing of one topic's papers.
    pub fn render_topic(&self, topic: &str) -> String {
        let papers = match self.load_topic(topic) {
            Ok(Some(papers)) => papers,
            Ok(None) => {
                return format!(
                    "# No papers found for topic: {topic}\n\n\
                     Try searching for papers on this topic first."
                );
            }
            Err(e) => {
                tracing::warn!(topic, "unreadable paper collection: {e}");
                return format!(
                    "# Error reading papers data for {topic}\n\n\
                     The papers data file is corrupted."
                );
            }
        };

        let mut out = format!(
            "# Papers on {}\n\nTotal papers: {}\n\n",
            title_case(&topic.replace('_', " ")),
            papers.len()
        );
        for (id, paper) in &papers {
            out.push_str(&format!(
                "## {title}\n\
                 - **Paper ID**: {id}\n\
                 - **Authors**: {authors}\n\
                 - **Published**: {published}\n\
                 - **PDF URL**: [{url}]({url})\n\n\
                 ### Summary\n{summary}...\n\n\
                 ---\n\n",
                title = paper.title,
                authors = paper.authors.join(", "),
                published = paper.published,
                url = paper.pdf_url,
                summary = truncate_chars(&paper.summary, SUMMARY_PREVIEW_CHARS),
            ));
        }
        out
    }
}

fn read_collection(path: &Path) -> Result<Option<PaperCollection>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(title: &str, summary: &str) -> PaperInfo {
        PaperInfo {
            title: title.to_string(),
            authors: vec!["A. Author".to_string(), "B. Author".to_string()],
            summary: summary.to_string(),
            pdf_url: "http://arxiv.org/pdf/2401.00001v1".to_string(),
            published: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn topic_directory_name() {
        assert_eq!(
            PaperStore::topic_dir_name("Machine Learning"),
            "machine_learning"
        );
    }

    #[test]
    fn save_merges_with_existing_collection() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());

        store
            .save("Clinical Trials", [("1".to_string(), paper("One", "s"))])
            .unwrap();
        let path = store
            .save("clinical trials", [("2".to_string(), paper("Two", "s"))])
            .unwrap();
        assert_eq!(path, tmp.path().join("clinical_trials/papers_info.json"));

        let papers = store.load_topic("Clinical Trials").unwrap().unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers["1"].title, "One");
    }

    #[test]
    fn save_over_corrupt_file_starts_fresh() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        let path = store.papers_file("oncology");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ broken").unwrap();

        store
            .save("oncology", [("9".to_string(), paper("Nine", "s"))])
            .unwrap();
        assert_eq!(store.load_topic("oncology").unwrap().unwrap().len(), 1);
    }

    #[test]
    fn find_searches_every_topic_and_skips_corrupt_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        store
            .save("zeta", [("42".to_string(), paper("Answer", "s"))])
            .unwrap();
        let broken = store.papers_file("alpha");
        std::fs::create_dir_all(broken.parent().unwrap()).unwrap();
        std::fs::write(&broken, "not json").unwrap();

        assert_eq!(store.find("42").unwrap().unwrap().title, "Answer");
        assert!(store.find("missing").unwrap().is_none());
    }

    #[test]
    fn topics_only_lists_folders_with_collections() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        assert!(store.topics().unwrap().is_empty());

        store.save("b topic", [("1".to_string(), paper("t", "s"))]).unwrap();
        store.save("a topic", [("2".to_string(), paper("t", "s"))]).unwrap();
        std::fs::create_dir_all(tmp.path().join("empty")).unwrap();

        assert_eq!(store.topics().unwrap(), vec!["a_topic", "b_topic"]);
    }

    #[test]
    fn missing_root_has_no_topics() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path().join("papers"));
        assert!(store.topics().unwrap().is_empty());
        assert_eq!(
            store.render_folders().unwrap(),
            "# Available Topics\n\nNo topics found.\n"
        );
    }

    #[test]
    fn folders_listing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        store.save("x", [("1".to_string(), paper("t", "s"))]).unwrap();
        store.save("y", [("2".to_string(), paper("t", "s"))]).unwrap();
        assert_eq!(
            store.render_folders().unwrap(),
            "# Available Topics\n\n- x\n- y\n\nUse @y to access papers in that topic.\n"
        );
    }

    #[test]
    fn topic_listing_previews_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        let long = "x".repeat(600);
        store
            .save("deep learning", [("2401.1".to_string(), paper("Nets", &long))])
            .unwrap();

        let md = store.render_topic("deep_learning");
        assert!(md.starts_with("# Papers on Deep Learning\n\nTotal papers: 1\n\n"));
        assert!(md.contains("## Nets\n- **Paper ID**: 2401.1\n"));
        assert!(md.contains("- **Authors**: A. Author, B. Author\n"));
        let preview = "x".repeat(SUMMARY_PREVIEW_CHARS);
        assert!(md.contains(&format!("### Summary\n{preview}...\n\n---\n\n")));
        assert!(!md.contains(&"x".repeat(SUMMARY_PREVIEW_CHARS + 1)));
    }

    #[test]
    fn topic_listing_for_missing_and_corrupt_topics() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        assert!(
            store
                .render_topic("nothing")
                .starts_with("# No papers found for topic: nothing")
        );

        let path = store.papers_file("bad");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[").unwrap();
        assert!(
            store
                .render_topic("bad")
                .starts_with("# Error reading papers data for bad")
        );
    }
}
