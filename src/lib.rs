//! saplens - metadata extraction and study indexing for clinical
//! statistical analysis plans (SAPs).
//!
//! saplens reads a corpus of SAP documents (PDF and Word), extracts study
//! metadata with ordered regex rules, classifies each study by phase,
//! therapeutic area and indication, and keeps a JSON study index that can
//! be filtered and drilled into. The same operations are exposed on the
//! command line and as MCP tools.
//!
//! # Quick start
//!
//! ```no_run
//! use saplens::{DataDir, EngineConfig, ingestion, query};
//! use saplens::study_index::FindCriteria;
//! use saplens::text_source::DocumentText;
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let config = EngineConfig::new(data_dir.corpus_dir());
//!
//! let report = ingestion::rebuild_index(&config, &DocumentText).unwrap();
//! println!("{report}");
//!
//! let criteria = FindCriteria {
//!     phase: Some("Phase III".to_string()),
//!     ..Default::default()
//! };
//! let found = query::find_studies(&config, &criteria).unwrap();
//! for study in &found.matching_studies {
//!     println!("{} ({})", study.study_id, study.detected_indication);
//! }
//! ```

pub mod analysis;
pub mod classify;
pub mod cli;
pub mod confidence;
pub mod config;
pub mod data_dir;
pub mod error;
pub mod extract;
pub mod ingestion;
pub mod mcp;
pub mod paper_store;
pub mod patterns;
pub mod query;
pub mod section;
pub mod study_id;
pub mod study_index;
pub mod text_source;
pub mod text_util;
pub mod walker;

pub use config::EngineConfig;
pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use paper_store::PaperStore;
pub use study_id::StudyId;
pub use study_index::StudyIndex;
