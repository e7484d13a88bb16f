//! Keyword classification along three axes: phase, therapeutic area and
//! indication.
//!
//! Area and indication are scored across weighted zones. Phase is decided
//! by a priority cascade over individual fields instead.

use serde::Serialize;

use crate::text_util::{
    contains_term,
    contains_term_where,
    contains_word_prefix,
};

/// Label reported when nothing matched.
pub const UNKNOWN: &str = "Unknown";

/// Category labels with their keywords, in tie-breaking order.
pub type CategoryMap = &'static [(&'static str, &'static [&'static str])];

pub const PHASES: CategoryMap = &[
    (
        "Phase I",
        &[
            "phase i",
            "phase 1",
            "phase one",
            "first-in-human",
            "dose escalation",
        ],
    ),
    (
        "Phase II",
        &[
            "phase ii",
            "phase 2",
            "phase two",
            "proof of concept",
            "dose finding",
        ],
    ),
    (
        "Phase III",
        &["phase iii", "phase 3", "phase three", "pivotal", "registration"],
    ),
    (
        "Phase IV",
        &[
            "phase iv",
            "phase 4",
            "phase four",
            "post-marketing",
            "surveillance",
        ],
    ),
];

pub const THERAPEUTIC_AREAS: CategoryMap = &[
    (
        "Oncology",
        &[
            "cancer",
            "tumor",
            "tumour",
            "oncology",
            "carcinoma",
            "melanoma",
            "lymphoma",
            "leukemia",
            "sarcoma",
            "chemotherapy",
            "radiation",
        ],
    ),
    (
        "Cardiology",
        &[
            "cardiac",
            "heart",
            "cardiovascular",
            "cardiology",
            "coronary",
            "myocardial",
            "hypertension",
        ],
    ),
    (
        "Neurology",
        &[
            "neurological",
            "brain",
            "neurology",
            "alzheimer",
            "parkinson",
            "stroke",
            "epilepsy",
            "dementia",
        ],
    ),
    (
        "Immunology",
        &[
            "immune",
            "immunology",
            "autoimmune",
            "immunotherapy",
            "rheumatoid",
            "lupus",
        ],
    ),
    (
        "Dermatology",
        &[
            "skin",
            "dermatology",
            "melanoma",
            "dermatitis",
            "psoriasis",
            "eczema",
        ],
    ),
    (
        "Endocrinology",
        &[
            "diabetes",
            "diabetic",
            "glucose",
            "insulin",
            "thyroid",
            "hormone",
        ],
    ),
    (
        "Respiratory",
        &[
            "lung",
            "pulmonary",
            "asthma",
            "copd",
            "respiratory",
            "pneumonia",
        ],
    ),
];

pub const INDICATIONS: CategoryMap = &[
    (
        "Breast Cancer",
        &["breast cancer", "breast carcinoma", "mammary carcinoma"],
    ),
    (
        "Melanoma",
        &["melanoma", "skin cancer", "cutaneous melanoma"],
    ),
    (
        "Lung Cancer",
        &[
            "lung cancer",
            "pulmonary carcinoma",
            "nsclc",
            "sclc",
            "non-small cell",
            "small cell",
        ],
    ),
    (
        "Heart Disease",
        &[
            "heart disease",
            "cardiac disease",
            "myocardial infarction",
            "coronary artery",
        ],
    ),
    (
        "Type 2 Diabetes",
        &["type 2 diabetes", "diabetes mellitus", "t2dm", "diabetic"],
    ),
    (
        "Hypertension",
        &[
            "hypertension",
            "high blood pressure",
            "elevated blood pressure",
        ],
    ),
    (
        "Alzheimer Disease",
        &["alzheimer", "dementia", "cognitive impairment"],
    ),
    (
        "Rheumatoid Arthritis",
        &["rheumatoid arthritis", "ra", "joint inflammation"],
    ),
];

/// Keywords this short are abbreviations and must stand alone.
const MAX_ABBREVIATION_CHARS: usize = 2;

/// Whether `keyword` occurs in a lower-cased `zone`.
///
/// Keywords match at the start of a word with any ending, so plurals
/// count. Abbreviations must be whole words.
fn keyword_in(zone: &str, keyword: &str) -> bool {
    if keyword.len() <= MAX_ABBREVIATION_CHARS {
        contains_term(zone, keyword)
    } else {
        contains_word_prefix(zone, keyword)
    }
}

/// A phase numeral carries on when followed by another roman letter or a
/// digit. Trailing sub-phase letters (`2b`, `iib`) do not count.
fn continues_numeral(c: char) -> bool {
    matches!(c, 'i' | 'v' | 'x') || c.is_ascii_digit()
}

const DESIGN_WEIGHT: u32 = 3;
const TITLE_WEIGHT: u32 = 2;
const FULL_TEXT_WEIGHT: u32 = 1;

/// The lower-cased text regions a document is scored over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zones {
    pub design: String,
    pub title: String,
    pub full_text: String,
}

impl Zones {
    /// Missing fields become empty zones that never match.
    pub fn new(
        design: Option<&str>,
        title: Option<&str>,
        full_text: &str,
    ) -> Self {
        Self {
            design: design.unwrap_or_default().to_lowercase(),
            title: title.unwrap_or_default().to_lowercase(),
            full_text: full_text.to_lowercase(),
        }
    }

    /// Weight of the most specific zone containing `keyword`, or 0.
    fn weight(&self, keyword: &str) -> u32 {
        if keyword_in(&self.design, keyword) {
            DESIGN_WEIGHT
        } else if keyword_in(&self.title, keyword) {
            TITLE_WEIGHT
        } else if keyword_in(&self.full_text, keyword) {
            FULL_TEXT_WEIGHT
        } else {
            0
        }
    }

    pub fn score(&self, keywords: &[&str]) -> u32 {
        keywords.iter().map(|k| self.weight(k)).sum()
    }
}

/// Non-zero category scores, in map order.
pub fn scores(zones: &Zones, map: CategoryMap) -> Vec<(&'static str, u32)> {
    map.iter()
        .map(|&(label, keywords)| (label, zones.score(keywords)))
        .filter(|&(_, score)| score > 0)
        .collect()
}

/// Highest-scoring label. Ties go to the category listed first.
pub fn classify(zones: &Zones, map: CategoryMap) -> &'static str {
    let mut best: Option<(&'static str, u32)> = None;
    for (label, score) in scores(zones, map) {
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((label, score));
        }
    }
    best.map_or(UNKNOWN, |(label, _)| label)
}

fn first_phase_in(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    PHASES
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|k| contains_term_where(&text, k, continues_numeral))
        })
        .map(|&(label, _)| label)
}

/// Title the summary falls back to when none was extracted.
pub fn default_title(file_name: &str) -> String {
    format!("Document: {file_name}")
}

/// Phase from the first field that names one: title, then file name, then
/// study design.
///
/// A title equal to the [`default_title`] placeholder is not consulted.
pub fn detect_phase(
    title: Option<&str>,
    file_name: &str,
    design: Option<&str>,
) -> &'static str {
    let title = title.filter(|t| {
        !t.eq_ignore_ascii_case(&default_title(file_name))
    });

    title
        .and_then(first_phase_in)
        .or_else(|| first_phase_in(file_name))
        .or_else(|| design.and_then(first_phase_in))
        .unwrap_or(UNKNOWN)
}

/// The three detected labels for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub detected_phase: String,
    pub detected_therapeutic: String,
    pub detected_indication: String,
}

impl Classification {
    pub fn detect(
        title: Option<&str>,
        file_name: &str,
        design: Option<&str>,
        full_text: &str,
    ) -> Self {
        let zones = Zones::new(design, title, full_text);
        Self {
            detected_phase: detect_phase(title, file_name, design).to_string(),
            detected_therapeutic: classify(&zones, THERAPEUTIC_AREAS)
                .to_string(),
            detected_indication: classify(&zones, INDICATIONS).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_zone_outweighs_full_text() {
        let zones = Zones::new(
            Some("randomized cardiac outcomes trial"),
            None,
            "patients with mild asthma were enrolled",
        );
        assert_eq!(zones.score(&["cardiac"]), 3);
        assert_eq!(zones.score(&["asthma"]), 1);
        assert_eq!(classify(&zones, THERAPEUTIC_AREAS), "Cardiology");
    }

    #[test]
    fn keyword_counts_once_at_highest_weight() {
        let zones = Zones::new(
            Some("insulin titration"),
            Some("insulin study"),
            "insulin insulin insulin",
        );
        assert_eq!(zones.score(&["insulin"]), 3);
        assert_eq!(zones.score(&["insulin", "glucose"]), 3);
    }

    #[test]
    fn title_outweighs_full_text() {
        let zones = Zones::new(
            None,
            Some("Pulmonary function in COPD"),
            "secondary analysis of hormone levels",
        );
        assert_eq!(classify(&zones, THERAPEUTIC_AREAS), "Respiratory");
    }

    #[test]
    fn ties_go_to_first_listed_category() {
        let zones = Zones::new(None, None, "metastatic melanoma");
        let scored = scores(&zones, THERAPEUTIC_AREAS);
        assert_eq!(scored, vec![("Oncology", 1), ("Dermatology", 1)]);
        assert_eq!(classify(&zones, THERAPEUTIC_AREAS), "Oncology");
    }

    #[test]
    fn nothing_matches_is_unknown() {
        let zones = Zones::new(None, None, "an unrelated document");
        assert!(scores(&zones, INDICATIONS).is_empty());
        assert_eq!(classify(&zones, INDICATIONS), UNKNOWN);
        assert_eq!(classify(&Zones::default(), PHASES), UNKNOWN);
    }

    #[test]
    fn indication_abbreviation_needs_whole_word() {
        let zones = Zones::new(None, None, "a randomized trial in ra patients");
        assert_eq!(classify(&zones, INDICATIONS), "Rheumatoid Arthritis");

        let zones = Zones::new(None, None, "a randomized narrative review");
        assert_eq!(classify(&zones, INDICATIONS), UNKNOWN);
    }

    #[test]
    fn plural_keywords_score() {
        let zones = Zones::new(
            None,
            Some("a phase 2b study in patients with solid tumors"),
            "",
        );
        assert_eq!(classify(&zones, THERAPEUTIC_AREAS), "Oncology");

        let zones = Zones::new(None, None, "cancers of the breast");
        assert_eq!(zones.score(&["cancer"]), 1);

        let zones = Zones::new(None, None, "thyroid hormones and lymphomas");
        assert_eq!(zones.score(&["hormone", "lymphoma"]), 2);
    }

    #[test]
    fn sub_phase_suffixes_resolve_to_their_phase() {
        let phase = |title: &str| detect_phase(Some(title), "plan.pdf", None);
        assert_eq!(phase("A Phase 2b Study"), "Phase II");
        assert_eq!(phase("Phase IIb/III trial of Drug X"), "Phase II");
        assert_eq!(phase("Phase Ib expansion cohort"), "Phase I");
        assert_eq!(phase("Phase IIIa confirmatory study"), "Phase III");
        assert_eq!(phase("a phase iv registry"), "Phase IV");
        assert_eq!(phase("Phase 10 of 12"), UNKNOWN);
    }

    #[test]
    fn suffixed_phase_and_plural_area_together() {
        let title = "A Phase IIb/III trial of Drug X in cancers of the breast";
        let c = Classification::detect(Some(title), "plan.pdf", None, title);
        assert_eq!(c.detected_phase, "Phase II");
        assert_eq!(c.detected_therapeutic, "Oncology");
    }

    #[test]
    fn phase_title_beats_design() {
        let phase = detect_phase(
            Some("A Phase II Study of Drug X"),
            "plan.pdf",
            Some("Phase III randomized study"),
        );
        assert_eq!(phase, "Phase II");
    }

    #[test]
    fn phase_file_name_beats_design() {
        let phase =
            detect_phase(None, "phase 3 sap.pdf", Some("phase ii dose finding"));
        assert_eq!(phase, "Phase III");
    }

    #[test]
    fn phase_falls_back_to_design() {
        let phase = detect_phase(
            Some("Efficacy of Drug X"),
            "sap.docx",
            Some("first-in-human dose escalation"),
        );
        assert_eq!(phase, "Phase I");
    }

    #[test]
    fn phase_ignores_lower_priority_zones_once_decided() {
        let phase =
            detect_phase(Some("pivotal trial"), "phase 1.pdf", Some("phase iv"));
        assert_eq!(phase, "Phase III");
    }

    #[test]
    fn phase_unknown_when_no_field_names_one() {
        assert_eq!(detect_phase(None, "sap.pdf", None), UNKNOWN);
    }

    #[test]
    fn classification_bundles_all_axes() {
        let text = "Study Title: Phase III trial in non-small cell lung cancer";
        let c = Classification::detect(
            Some("Phase III trial in non-small cell lung cancer"),
            "onc.pdf",
            None,
            text,
        );
        assert_eq!(c.detected_phase, "Phase III");
        assert_eq!(c.detected_therapeutic, "Oncology");
        assert_eq!(c.detected_indication, "Lung Cancer");
    }
}
