use std::fmt;

use serde::Serialize;

use crate::extract::ExtractedFields;

/// Fields whose presence says most about how well a document parsed.
pub const KEY_FIELDS: &[&str] =
    &["title", "primary_endpoint", "statistical_method", "study_design"];

/// Coarse self-assessment of how complete an extraction is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Rating for the index summary, from the number of non-empty matched
    /// fields: more than five is high, more than two medium.
    pub fn from_coverage(matched: usize) -> Self {
        match matched {
            n if n > 5 => Self::High,
            n if n > 2 => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rating for the comprehensive analysis.
///
/// High needs three of the [`KEY_FIELDS`] and a sample-size section;
/// two key fields are enough for medium regardless of sample size.
pub fn assess(fields: &ExtractedFields, sample_size_found: bool) -> Confidence {
    let filled = KEY_FIELDS
        .iter()
        .filter(|f| fields.matched(f).is_some())
        .count();

    if filled >= 3 && sample_size_found {
        Confidence::High
    } else if filled >= 2 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}
