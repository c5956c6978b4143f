//! Details step: title, keywords, abstract

use super::null_as_default;
use serde::{Deserialize, Serialize};

/// Details sub-record of a submission draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDetails {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(rename = "abstract", default, deserialize_with = "null_as_default")]
    pub abstract_text: String,
}

impl SubmissionDetails {
    pub fn new(title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            keywords: Vec::new(),
            abstract_text: abstract_text.into(),
        }
    }

    pub fn with_keywords(mut self, raw: &str) -> Self {
        self.keywords = parse_keywords(raw);
        self
    }
}

/// Split a comma separated keyword field, dropping blank entries
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords_trims_and_drops_blanks() {
        assert_eq!(
            parse_keywords(" soil, geotechnics ,, stabilization ,"),
            vec!["soil", "geotechnics", "stabilization"]
        );
        assert!(parse_keywords("").is_empty());
        assert!(parse_keywords(" , ").is_empty());
    }

    #[test]
    fn test_abstract_wire_name() {
        let details = SubmissionDetails::new("Soil Stabilization", "Lime treated clays");
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["abstract"], "Lime treated clays");
        assert!(json.get("abstract_text").is_none());
    }

    #[test]
    fn test_null_fields_load_as_empty() {
        let details: SubmissionDetails =
            serde_json::from_str(r#"{"title":null,"keywords":null}"#).unwrap();
        assert_eq!(details, SubmissionDetails::default());
    }
}
