//! Header-anchored prose sections.
//!
//! A section starts at the first occurrence of any header alias and runs
//! until the next header-looking line, a blank line, or the end of text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::patterns::{
    MISSING_DATA_HEADERS,
    PRIMARY_ANALYSIS_HEADERS,
    SAMPLE_SIZE_HEADERS,
};

/// Rendering of a section that is not in the document.
pub const NOT_FOUND: &str = "Not found";

/// Lines of up to this many characters after a leading capital end a section.
const MAX_HEADER_TAIL: usize = 60;

static SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\s*[:\-]*\s*").expect("valid regex"));

static TERMINATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\n[A-Z][^\n]{{0,{MAX_HEADER_TAIL}}}\n|\n{{2,}}|\z"))
        .expect("valid regex")
});

/// A located section: the header as written in the document and its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBlock {
    pub header: String,
    pub body: String,
}

impl fmt::Display for SectionBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.header, self.body)
    }
}

/// Compiled alias set for one kind of section.
#[derive(Debug, Clone)]
pub struct SectionPattern {
    header: Regex,
}

impl SectionPattern {
    /// Aliases are literal text, matched case-insensitively. When several
    /// aliases match at the same position the earlier one in the slice wins.
    pub fn new(aliases: &[&str]) -> Result<Self, regex::Error> {
        let alternatives = aliases
            .iter()
            .map(|alias| regex::escape(alias))
            .collect::<Vec<_>>()
            .join("|");
        Ok(Self {
            header: Regex::new(&format!("(?i)(?:{alternatives})"))?,
        })
    }

    /// The section at the first header occurrence. A header with nothing
    /// after it is not a section.
    pub fn find(&self, text: &str) -> Option<SectionBlock> {
        let header = self.header.find(text)?;
        Some(block_at(text, header)).filter(|block| !block.body.is_empty())
    }
}

fn block_at(text: &str, header: regex::Match<'_>) -> SectionBlock {
    let rest = &text[header.end()..];
    let separator_len = SEPARATOR.find(rest).map_or(0, |m| m.end());
    let body_start = header.end() + separator_len;

    // The body is at least one character long when any text remains.
    let search_from = text[body_start..]
        .chars()
        .next()
        .map_or(body_start, |c| body_start + c.len_utf8());
    let body_end = TERMINATOR
        .find_at(text, search_from)
        .map_or(text.len(), |m| m.start());

    SectionBlock {
        header: header.as_str().trim().to_string(),
        body: text[body_start..body_end].trim().to_string(),
    }
}

/// Locate the first section headed by any of `aliases`.
pub fn extract_section(
    text: &str,
    aliases: &[&str],
) -> Result<Option<SectionBlock>, regex::Error> {
    Ok(SectionPattern::new(aliases)?.find(text))
}

pub static SAMPLE_SIZE_SECTION: Lazy<SectionPattern> = Lazy::new(|| {
    SectionPattern::new(SAMPLE_SIZE_HEADERS).expect("literal aliases")
});

pub static PRIMARY_ANALYSIS_SECTION: Lazy<SectionPattern> = Lazy::new(|| {
    SectionPattern::new(PRIMARY_ANALYSIS_HEADERS).expect("literal aliases")
});

pub static MISSING_DATA_SECTION: Lazy<SectionPattern> = Lazy::new(|| {
    SectionPattern::new(MISSING_DATA_HEADERS).expect("literal aliases")
});

/// Serialize a possibly-missing section as its rendering or [`NOT_FOUND`].
pub fn serialize_section<S: Serializer>(
    section: &Option<SectionBlock>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match section {
        Some(block) => serializer.collect_str(block),
        None => NOT_FOUND.serialize(serializer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_size_block_keeps_body_verbatim() {
        let text = "Sample Size Determination\n\
                    Total N=240 subjects, 2:1 randomization";
        let block = SAMPLE_SIZE_SECTION.find(text).unwrap();
        assert_eq!(block.header, "Sample Size Determination");
        assert_eq!(block.body, "Total N=240 subjects, 2:1 randomization");
        assert_eq!(
            block.to_string(),
            "Sample Size Determination\nTotal N=240 subjects, 2:1 randomization"
        );
    }

    #[test]
    fn longer_alias_wins_at_same_position() {
        let block = SAMPLE_SIZE_SECTION
            .find("SAMPLE SIZE DETERMINATION: 120 per arm")
            .unwrap();
        assert_eq!(block.header, "SAMPLE SIZE DETERMINATION");
        assert_eq!(block.body, "120 per arm");
    }

    #[test]
    fn stops_at_next_header_line() {
        let text = "Missing Data Handling - multiple imputation\n\
                    under MAR assumptions\n\
                    Sensitivity Analyses\n\
                    tipping point";
        let block = MISSING_DATA_SECTION.find(text).unwrap();
        assert_eq!(block.header, "Missing Data Handling");
        assert_eq!(
            block.body,
            "multiple imputation\nunder MAR assumptions"
        );
    }

    #[test]
    fn stops_at_blank_line() {
        let text = "Primary Analysis: MMRM with baseline as covariate\n\n\
                    unrelated trailing text";
        let block = PRIMARY_ANALYSIS_SECTION.find(text).unwrap();
        assert_eq!(block.header, "Primary Analysis");
        assert_eq!(block.body, "MMRM with baseline as covariate");
    }

    #[test]
    fn lowercase_line_does_not_end_section() {
        let text = "statistical analysis\nuses ANCOVA\nadjusted for region";
        let block = PRIMARY_ANALYSIS_SECTION.find(text).unwrap();
        assert_eq!(block.body, "uses ANCOVA\nadjusted for region");
    }

    #[test]
    fn first_occurrence_in_text_wins() {
        let text = "see missing data below\n\nImputation Methods: LOCF";
        let block = MISSING_DATA_SECTION.find(text).unwrap();
        assert_eq!(block.header, "missing data");
        assert_eq!(block.body, "below");
    }

    #[test]
    fn header_without_body_is_not_found() {
        assert!(SAMPLE_SIZE_SECTION.find("Sample Size:").is_none());
        assert!(SAMPLE_SIZE_SECTION.find("Sample size -  \n").is_none());
    }

    #[test]
    fn absent_section() {
        assert!(SAMPLE_SIZE_SECTION.find("no such heading").is_none());
        assert!(
            extract_section("nothing here", &["power calculation"])
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn aliases_are_literal() {
        let block = extract_section("Power (1-beta): 90%", &["power (1-beta)"])
            .unwrap()
            .unwrap();
        assert_eq!(block.header, "Power (1-beta)");
        assert_eq!(block.body, "90%");
    }

    #[test]
    fn missing_section_serializes_as_not_found() {
        #[derive(Serialize)]
        struct Wrapper {
            #[serde(serialize_with = "serialize_section")]
            section: Option<SectionBlock>,
        }

        let json = serde_json::to_string(&Wrapper { section: None }).unwrap();
        assert_eq!(json, r#"{"section":"Not found"}"#);

        let block = SectionBlock {
            header: "Sample Size".to_string(),
            body: "N=10".to_string(),
        };
        let json = serde_json::to_string(&Wrapper {
            section: Some(block),
        })
        .unwrap();
        assert_eq!(json, r#"{"section":"Sample Size\nN=10"}"#);
    }
}
