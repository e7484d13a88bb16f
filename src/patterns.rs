//! Ordered pattern cascades, kept as plain data.
//!
//! A [`FieldSchema`] lists, per logical field, the rules to try from most to
//! least specific phrasing. The extractor in [`crate::extract`] walks them;
//! nothing here knows about control flow.

use once_cell::sync::Lazy;
use regex::Regex;

/// Which part of a match becomes the field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Whole,
    Group(usize),
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    capture: Capture,
}

impl PatternRule {
    /// Compile a rule that captures group 1 when the pattern has a group and
    /// the whole match otherwise.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        let capture = if regex.captures_len() > 1 {
            Capture::Group(1)
        } else {
            Capture::Whole
        };
        Ok(Self { regex, capture })
    }

    pub fn with_capture(
        pattern: &str,
        capture: Capture,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            capture,
        })
    }

    pub fn capture(&self) -> Capture {
        self.capture
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Value of the first match, trimmed.
    pub fn apply<'t>(&self, text: &'t str) -> Option<&'t str> {
        let caps = self.regex.captures(text)?;
        Some(self.select(&caps).trim())
    }

    /// Values of every non-overlapping match, trimmed, in text order.
    pub fn apply_all<'r, 't>(
        &'r self,
        text: &'t str,
    ) -> impl Iterator<Item = &'t str> + 'r
    where
        't: 'r,
    {
        self.regex
            .captures_iter(text)
            .map(|caps| self.select(&caps).trim())
    }

    fn select<'t>(&self, caps: &regex::Captures<'t>) -> &'t str {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        match self.capture {
            Capture::Whole => whole,
            Capture::Group(n) => caps.get(n).map_or(whole, |m| m.as_str()),
        }
    }
}

/// The rules for one field, tried in order.
#[derive(Debug, Clone)]
pub struct FieldPatterns {
    pub name: &'static str,
    pub rules: Vec<PatternRule>,
}

/// Field names with their rule cascades, in output order.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: Vec<FieldPatterns>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(
        mut self,
        name: &'static str,
        patterns: &[&str],
    ) -> Result<Self, regex::Error> {
        let rules = patterns
            .iter()
            .map(|p| PatternRule::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        self.fields.push(FieldPatterns { name, rules });
        Ok(self)
    }

    pub fn fields(&self) -> &[FieldPatterns] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

type SchemaTable = &'static [(&'static str, &'static [&'static str])];

fn compile(table: SchemaTable) -> FieldSchema {
    table.iter()
        .try_fold(FieldSchema::new(), |schema, &(name, patterns)| {
            schema.field(name, patterns)
        })
        .expect("built-in patterns compile")
}

/// Single-line rules used when building the study index.
const SUMMARY_TABLE: SchemaTable = &[
    (
        "title",
        &[
            r"(?i)(?:title|study title):\s*(.+?)(?:\n|$)",
            r"(?i)^(.+?)\s*(?:protocol|study)",
            r"(?i)study:\s*(.+?)(?:\n|$)",
        ],
    ),
    (
        "pharma",
        &[
            r"(?i)(?:sponsor|pharmaceutical company|company):\s*(.+?)(?:\n|$)",
            r"(?i)(?:pharma|sponsor):\s*(.+?)(?:\n|$)",
        ],
    ),
    (
        "study_design",
        &[
            r"(?i)(?:study design|design):\s*(.+?)(?:\n|$)",
            r"(?i)(?:randomized|double.?blind|placebo.?controlled|crossover)[\w\s,-]+",
        ],
    ),
    (
        "study_treatment",
        &[
            r"(?i)(?:treatment|intervention):\s*(.+?)(?:\n|$)",
            r"(?i)(?:drug|compound|therapeutic):\s*(.+?)(?:\n|$)",
        ],
    ),
    (
        "study_visit",
        &[
            r"(?i)(?:visit schedule|visits):\s*(.+?)(?:\n|$)",
            r"(?i)(?:baseline|week\s+\d+|day\s+\d+|follow.?up)[\w\s,.-]+",
        ],
    ),
    (
        "primary_analysis_endpoint",
        &[
            r"(?i)(?:primary endpoint|primary outcome|primary analysis endpoint):\s*(.+?)(?:\n|$)",
            r"(?i)primary.{0,50}endpoint[:\s]*(.+?)(?:\n|$)",
        ],
    ),
    (
        "primary_analysis_approach",
        &[
            r"(?i)(?:primary analysis|statistical method|analysis approach|statistical approach):\s*(.+?)(?:\n|$)",
            r"(?i)(?:MMRM|mixed model|ANCOVA|t-test|chi-square)[\w\s()-]+",
        ],
    ),
    (
        "sample_size",
        &[
            r"(?i)(?:sample size|number of subjects|n\s*=):\s*(\d+)",
            r"(?i)(\d+)\s*(?:subjects|patients|participants)",
        ],
    ),
];

pub static SUMMARY_SCHEMA: Lazy<FieldSchema> =
    Lazy::new(|| compile(SUMMARY_TABLE));

/// Rules for the comprehensive analysis. `.` spans lines here.
const ANALYSIS_TABLE: SchemaTable = &[
    (
        "title",
        &[
            r"(?is)(?:title|study title):\s*(.+?)(?:\n|$)",
            r"(?is)^(.+?)\s*(?:protocol|study)",
            r"(?is)study:\s*(.+?)(?:\n|$)",
            r"(?is)(?:protocol|study)\s+title[:\s]*(.+?)(?:\n|$)",
        ],
    ),
    (
        "pharma",
        &[
            r"(?is)(?:sponsor|pharmaceutical company|company|pharma):\s*(.+?)(?:\n|$)",
            r"(?is)(?:sponsored by|developed by):\s*(.+?)(?:\n|$)",
        ],
    ),
    (
        "study_design",
        &[
            r"(?is)(?:study design|design|study type):\s*(.+?)(?:\n|$)",
            r"(?is)(randomized.{0,100}controlled.{0,50}study)",
            r"(?is)(double.?blind.{0,50}placebo.?controlled)",
            r"(?is)(multicenter.{0,50}study)",
            r"(?is)(phase\s+[i1v]+.{0,100}study)",
        ],
    ),
    (
        "primary_endpoint",
        &[
            r"(?is)(?:primary endpoint|primary outcome|primary objective):\s*(.+?)(?:\n|\.|;)",
            r"(?is)primary.{0,30}endpoint[:\s]*(.+?)(?:\n|\.|;)",
            r"(?is)(?:primary efficacy endpoint):\s*(.+?)(?:\n|\.|;)",
        ],
    ),
    (
        "secondary_endpoints",
        &[
            r"(?is)(?:secondary endpoints?|secondary outcomes?):\s*(.+?)(?:\n\n|\. Primary|\. Secondary)",
            r"(?is)secondary.{0,30}endpoints?[:\s]*(.+?)(?:\n\n|\. )",
        ],
    ),
    (
        "statistical_method",
        &[
            r"(?is)(?:statistical method|primary analysis|statistical approach|analysis method):\s*(.+?)(?:\n|$)",
            r"(?is)(MMRM|mixed.?model|ANCOVA|t.?test|chi.?square|logistic regression|cox regression|kaplan.?meier).{0,100}",
            r"(?is)(?:analysis.{0,30}performed.{0,30}using):\s*(.+?)(?:\n|$)",
        ],
    ),
    (
        "randomization",
        &[
            r"(?is)(?:randomization|randomisation|randomized):\s*(.+?)(?:\n|$)",
            r"(?is)(?:subjects.{0,50}randomized.{0,50}to)(.+?)(?:\n|$)",
            r"(?is)(?:patients.{0,50}randomized.{0,50}in.{0,20}ratio)(.+?)(?:\n|$)",
        ],
    ),
];

pub static ANALYSIS_SCHEMA: Lazy<FieldSchema> =
    Lazy::new(|| compile(ANALYSIS_TABLE));

/// Visit timing: a free-text excerpt and a frequency phrase.
const VISIT_TABLE: SchemaTable = &[
    (
        "schedule_details",
        &[
            r"(?is)visit schedule(.{0,300})",
            r"(?is)(?:baseline|screening).{0,100}(?:week|day|month)(.{0,200})",
            r"(?is)(?:follow.?up|assessment).{0,50}(?:visit|schedule)(.{0,200})",
            r"(?is)(?:week|day|month)\s*\d+(.{0,100}visit)",
        ],
    ),
    (
        "visit_frequency",
        &[
            r"(?i)(?:every|each)\s*(\d+\s*(?:week|day|month)s?)",
            r"(?i)(\d+\s*(?:week|day|month)ly)",
            r"(?i)(daily|weekly|monthly|quarterly)",
        ],
    ),
];

pub static VISIT_SCHEMA: Lazy<FieldSchema> =
    Lazy::new(|| compile(VISIT_TABLE));

const CRITERIA_TABLE: SchemaTable = &[
    (
        "inclusion",
        &[
            r"(?is)inclusion criteria(.{0,500}?)(?:exclusion criteria|exclusion|$)",
            r"(?is)patients.{0,50}eligible(.{0,300}?)(?:exclusion|$)",
            r"(?is)subjects.{0,50}included(.{0,300}?)(?:exclusion|$)",
        ],
    ),
    (
        "exclusion",
        &[
            r"(?is)exclusion criteria(.{0,500}?)(?:\n\n|$)",
            r"(?is)patients.{0,50}excluded(.{0,300}?)(?:\n\n|$)",
            r"(?is)subjects.{0,50}excluded(.{0,300}?)(?:\n\n|$)",
        ],
    ),
];

pub static CRITERIA_SCHEMA: Lazy<FieldSchema> =
    Lazy::new(|| compile(CRITERIA_TABLE));

/// Every match of every rule contributes a candidate arm description.
pub static TREATMENT_ARM_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    [
        r"(?i)(?:arm|group)\s*[a-z]?[:\s]*(.{0,100})",
        r"(?i)(?:treatment|intervention)\s*[a-z]?[:\s]*(.{0,100})",
        r"(?i)(?:experimental|control|placebo)\s*(?:arm|group)[:\s]*(.{0,100})",
    ]
    .iter()
    .map(|p| PatternRule::new(p).expect("built-in patterns compile"))
    .collect()
});

pub const SAMPLE_SIZE_HEADERS: &[&str] =
    &["sample size determination", "sample size"];

pub const PRIMARY_ANALYSIS_HEADERS: &[&str] = &[
    "analysis methods for efficacy endpoints",
    "primary analysis approach",
    "primary analysis",
    "statistical methods for efficacy endpoints",
    "statistical analysis",
];

pub const MISSING_DATA_HEADERS: &[&str] = &[
    "missing data handling",
    "missing data",
    "imputation methods",
    "handling of missing data",
    "imputation strategy",
];
