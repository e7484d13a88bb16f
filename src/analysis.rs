//! Record assembly: runs extraction, sections, classification and
//! confidence over one document's text.
//!
//! Everything here is pure. Reading the document and deciding what an empty
//! text means is the caller's job.

use std::path::Path;

use serde::Serialize;

use crate::{
    classify::{Classification, default_title, detect_phase},
    confidence::{Confidence, assess},
    extract::{ExtractedFields, NOT_SPECIFIED, extract},
    patterns::{
        ANALYSIS_SCHEMA,
        CRITERIA_SCHEMA,
        SUMMARY_SCHEMA,
        TREATMENT_ARM_RULES,
        VISIT_SCHEMA,
    },
    section::{
        MISSING_DATA_SECTION,
        PRIMARY_ANALYSIS_SECTION,
        SAMPLE_SIZE_SECTION,
        SectionBlock,
        serialize_section,
    },
    text_util::truncate_chars,
};

const MAX_TREATMENT_ARMS: usize = 5;
const MIN_ARM_CHARS: usize = 10;
const MAX_ARM_CHARS: usize = 200;
const MAX_SCHEDULE_CHARS: usize = 400;
const MAX_CRITERIA_CHARS: usize = 500;

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compact per-document record, the basis of an index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudySummary {
    pub title: String,
    pub pharma: String,
    pub study_design: String,
    pub study_treatment: String,
    pub study_visit: String,
    pub primary_analysis_endpoint: String,
    pub primary_analysis_approach: String,
    pub sample_size: String,
    pub imputation_method: String,
    #[serde(flatten)]
    pub classification: Classification,
    pub source_file: String,
    pub document_length: usize,
    pub extraction_confidence: Confidence,
}

/// Summarize a document whose text has already been extracted.
pub fn summarize(text: &str, path: &Path) -> StudySummary {
    let fields = extract(text, &SUMMARY_SCHEMA);
    let name = file_name(path);
    let title = fields.matched("title");

    let classification = Classification::detect(
        title,
        &name,
        fields.matched("study_design"),
        text,
    );

    let filled = fields
        .iter()
        .filter(|&(field, value)| {
            fields.matched(field).is_some() && !value.is_empty()
        })
        .count();

    StudySummary {
        title: title.map_or_else(|| default_title(&name), str::to_string),
        pharma: fields.get("pharma").to_string(),
        study_design: fields.get("study_design").to_string(),
        study_treatment: fields.get("study_treatment").to_string(),
        study_visit: fields.get("study_visit").to_string(),
        primary_analysis_endpoint: fields
            .get("primary_analysis_endpoint")
            .to_string(),
        primary_analysis_approach: fields
            .get("primary_analysis_approach")
            .to_string(),
        sample_size: fields.get("sample_size").to_string(),
        imputation_method: NOT_SPECIFIED.to_string(),
        classification,
        source_file: path.display().to_string(),
        document_length: text.chars().count(),
        extraction_confidence: Confidence::from_coverage(filled),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyIdentification {
    pub study_id: String,
    pub title: String,
    pub sponsor: String,
    pub detected_phase: String,
    pub source_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyDesign {
    pub design_type: String,
    pub randomization: String,
    pub treatment_arms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleSizeAnalysis {
    #[serde(serialize_with = "serialize_section")]
    pub sample_size_section: Option<SectionBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointsAndObjectives {
    pub primary_endpoint: String,
    pub secondary_endpoints: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedMethods {
    #[serde(serialize_with = "serialize_section")]
    pub primary_analysis_section: Option<SectionBlock>,
    #[serde(serialize_with = "serialize_section")]
    pub missing_data_section: Option<SectionBlock>,
    pub secondary_analysis: String,
    pub significance_level: String,
    pub power: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticalAnalysisPlan {
    pub primary_analysis_method: String,
    pub detailed_methods: DetailedMethods,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitSchedule {
    pub schedule_details: String,
    pub visit_frequency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyConduct {
    pub visit_schedule: VisitSchedule,
    pub inclusion_criteria: String,
    pub exclusion_criteria: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub source_file: String,
    pub document_length: usize,
    pub extraction_confidence: Confidence,
}

/// Full structured view of one study, built fresh on every lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComprehensiveAnalysis {
    pub study_identification: StudyIdentification,
    pub study_design: StudyDesign,
    pub sample_size_analysis: SampleSizeAnalysis,
    pub endpoints_and_objectives: EndpointsAndObjectives,
    pub statistical_analysis_plan: StatisticalAnalysisPlan,
    pub study_conduct: StudyConduct,
    pub document_metadata: DocumentMetadata,
}

pub fn analyze(
    text: &str,
    path: &Path,
    study_id: &str,
) -> ComprehensiveAnalysis {
    let fields = extract(text, &ANALYSIS_SCHEMA);
    let name = file_name(path);
    let source_file = path.display().to_string();

    let sample_size_section = SAMPLE_SIZE_SECTION.find(text);
    let confidence = assess(&fields, sample_size_section.is_some());
    let criteria = extract(text, &CRITERIA_SCHEMA);

    ComprehensiveAnalysis {
        study_identification: StudyIdentification {
            study_id: study_id.to_string(),
            title: fields
                .matched("title")
                .map_or_else(|| default_title(&name), str::to_string),
            sponsor: fields.get("pharma").to_string(),
            detected_phase: detect_phase(
                fields.matched("title"),
                &name,
                fields.matched("study_design"),
            )
            .to_string(),
            source_file: source_file.clone(),
        },
        study_design: StudyDesign {
            design_type: fields.get("study_design").to_string(),
            randomization: fields.get("randomization").to_string(),
            treatment_arms: treatment_arms(text),
        },
        sample_size_analysis: SampleSizeAnalysis {
            sample_size_section,
        },
        endpoints_and_objectives: EndpointsAndObjectives {
            primary_endpoint: fields.get("primary_endpoint").to_string(),
            secondary_endpoints: fields
                .get("secondary_endpoints")
                .to_string(),
        },
        statistical_analysis_plan: StatisticalAnalysisPlan {
            primary_analysis_method: fields
                .get("statistical_method")
                .to_string(),
            detailed_methods: DetailedMethods {
                primary_analysis_section: PRIMARY_ANALYSIS_SECTION.find(text),
                missing_data_section: MISSING_DATA_SECTION.find(text),
                secondary_analysis: NOT_SPECIFIED.to_string(),
                significance_level: NOT_SPECIFIED.to_string(),
                power: NOT_SPECIFIED.to_string(),
            },
        },
        study_conduct: StudyConduct {
            visit_schedule: visit_schedule(text),
            inclusion_criteria: capped(
                &criteria,
                "inclusion",
                MAX_CRITERIA_CHARS,
            ),
            exclusion_criteria: capped(
                &criteria,
                "exclusion",
                MAX_CRITERIA_CHARS,
            ),
        },
        document_metadata: DocumentMetadata {
            source_file,
            document_length: text.chars().count(),
            extraction_confidence: confidence,
        },
    }
}

fn capped(fields: &ExtractedFields, field: &str, max: usize) -> String {
    truncate_chars(fields.get(field), max).to_string()
}

pub fn visit_schedule(text: &str) -> VisitSchedule {
    let fields = extract(text, &VISIT_SCHEMA);
    VisitSchedule {
        schedule_details: capped(
            &fields,
            "schedule_details",
            MAX_SCHEDULE_CHARS,
        ),
        visit_frequency: fields.get("visit_frequency").to_string(),
    }
}

/// Distinct arm descriptions from every arm pattern, at most five.
pub fn treatment_arms(text: &str) -> Vec<String> {
    let mut arms: Vec<String> = Vec::new();

    let candidates = TREATMENT_ARM_RULES
        .iter()
        .flat_map(|rule| rule.apply_all(text))
        .filter(|desc| desc.chars().count() > MIN_ARM_CHARS);

    for desc in candidates {
        let desc = truncate_chars(desc, MAX_ARM_CHARS);
        if !arms.iter().any(|arm| arm == desc) {
            arms.push(desc.to_string());
            if arms.len() >= MAX_TREATMENT_ARMS {
                break;
            }
        }
    }

    if arms.is_empty() {
        arms.push(NOT_SPECIFIED.to_string());
    }
    arms
}
