use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::patterns::FieldSchema;

/// Value reported for any field no rule matched.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Per-field extraction results, one entry for every field in the schema.
///
/// Lookups never fail: unmatched or unknown fields read as
/// [`NOT_SPECIFIED`].
///
/// # Examples
///
/// ```
/// use saplens::extract::{extract, NOT_SPECIFIED};
/// use saplens::patterns::SUMMARY_SCHEMA;
///
/// let fields = extract("Sponsor: Acme Pharma\n", &SUMMARY_SCHEMA);
/// assert_eq!(fields.get("pharma"), "Acme Pharma");
/// assert_eq!(fields.get("sample_size"), NOT_SPECIFIED);
/// assert_eq!(fields.get("no_such_field"), NOT_SPECIFIED);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFields {
    values: Vec<(&'static str, Option<String>)>,
}

impl ExtractedFields {
    /// Every field of `schema`, all unmatched.
    pub fn unmatched(schema: &FieldSchema) -> Self {
        Self {
            values: schema.names().map(|name| (name, None)).collect(),
        }
    }

    pub fn get(&self, field: &str) -> &str {
        self.matched(field).unwrap_or(NOT_SPECIFIED)
    }

    /// The matched value, or `None` when the field defaulted.
    pub fn matched(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn matched_count(&self) -> usize {
        self.values.iter().filter(|(_, v)| v.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(field, value)` pairs in schema order, defaults filled in.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.values.iter().map(|(name, value)| {
            (*name, value.as_deref().unwrap_or(NOT_SPECIFIED))
        })
    }
}

impl Serialize for ExtractedFields {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Run every field's rule cascade over `text`.
///
/// For each field the rules are tried in order and the first one that
/// matches decides the value; later rules for that field are not tried.
/// Blank text matches nothing.
pub fn extract(text: &str, schema: &FieldSchema) -> ExtractedFields {
    let mut fields = ExtractedFields::unmatched(schema);
    if text.trim().is_empty() {
        return fields;
    }

    for (slot, field) in fields.values.iter_mut().zip(schema.fields()) {
        slot.1 = field
            .rules
            .iter()
            .find_map(|rule| rule.apply(text))
            .map(str::to_string);
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{ANALYSIS_SCHEMA, SUMMARY_SCHEMA};

    fn schema() -> FieldSchema {
        FieldSchema::new()
            .field(
                "endpoint",
                &[r"(?i)primary endpoint:\s*(.+?)(?:\n|$)", r"(?i)endpoint"],
            )
            .unwrap()
            .field("sponsor", &[r"(?i)sponsor:\s*(.+?)(?:\n|$)"])
            .unwrap()
    }

    #[test]
    fn first_matching_rule_wins() {
        let fields = extract("Primary Endpoint: OS at 12 months\n", &schema());
        assert_eq!(fields.get("endpoint"), "OS at 12 months");
    }

    #[test]
    fn falls_back_to_looser_rule() {
        let fields = extract("the endpoint is overall survival", &schema());
        assert_eq!(fields.get("endpoint"), "endpoint");
    }

    #[test]
    fn every_schema_field_present() {
        let fields = extract("nothing relevant here", &schema());
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.matched_count(), 0);
        let pairs: Vec<_> = fields.iter().collect();
        assert_eq!(
            pairs,
            vec![("endpoint", NOT_SPECIFIED), ("sponsor", NOT_SPECIFIED)]
        );
    }

    #[test]
    fn empty_text_matches_nothing() {
        let fields = extract("   \n", &SUMMARY_SCHEMA);
        assert_eq!(fields.len(), SUMMARY_SCHEMA.fields().len());
        assert_eq!(fields.matched_count(), 0);
    }

    #[test]
    fn values_are_substrings_or_sentinel() {
        let text = "Study Title: A Phase III Study of Drug X\n\
                    Sponsor: Acme\n\
                    Study Design: randomized, double-blind\n\
                    Primary Endpoint: change in HbA1c. More text\n";
        let fields = extract(text, &ANALYSIS_SCHEMA);
        for (_, value) in fields.iter() {
            assert!(value == NOT_SPECIFIED || text.contains(value), "{value}");
        }
        assert_eq!(fields.get("title"), "A Phase III Study of Drug X");
        assert_eq!(fields.get("primary_endpoint"), "change in HbA1c");
    }

    #[test]
    fn serializes_in_schema_order() {
        let fields = extract("Sponsor: Acme\n", &schema());
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"endpoint":"Not specified","sponsor":"Acme"}"#);
    }
}
