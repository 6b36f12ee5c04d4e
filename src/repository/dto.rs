//! Pattern wire records.

use crate::error::{MatcherError, Result};
use crate::models::Language;
use crate::pattern::{DataFormat, PatternNode, PatternRoot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// Turns a source snippet into a pattern tree.
///
/// Implemented by whatever front-end can parse pattern snippets for a language.
pub trait SnippetParser: Send + Sync {
    fn parse(&self, snippet: &str, languages: &BTreeSet<Language>) -> Result<PatternNode>;
}

/// Authoring and persistence form of a pattern.
///
/// Reading is tolerant: unknown language tags are dropped one by one, missing
/// or empty `Languages` means every pattern language, and an unrecognized
/// `DataFormat` reads as `Json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", from = "RawPatternDto")]
pub struct PatternDto {
    pub key: String,
    pub name: String,
    pub languages: BTreeSet<Language>,
    pub filename_wildcard: String,
    pub value: String,
    pub cwe_id: String,
    pub description: String,
    pub data_format: DataFormat,
}

/// Every field is read as loose JSON so one odd field never costs the record.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPatternDto {
    #[serde(default)]
    key: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    languages: Option<Value>,
    #[serde(default)]
    filename_wildcard: Option<Value>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    cwe_id: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    data_format: Option<Value>,
}

/// Strings as is, numbers and booleans in their JSON spelling, anything else empty.
fn lenient_string(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => String::new(),
    }
}

/// A tag list, a single comma-separated string, or nothing.
fn language_tags(value: Option<Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(tags)) => tags,
        Some(Value::String(list)) => list
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(|tag| Value::String(tag.to_string()))
            .collect(),
        Some(other) => vec![other],
    }
}

impl From<RawPatternDto> for PatternDto {
    fn from(raw: RawPatternDto) -> Self {
        let key = lenient_string(raw.key);
        let tags = language_tags(raw.languages);
        let languages = if tags.is_empty() {
            Language::all_pattern_languages().into_iter().collect()
        } else {
            tags.iter()
                .filter_map(|tag| {
                    let parsed = tag.as_str().and_then(|s| s.parse::<Language>().ok());
                    if parsed.is_none() {
                        debug!("Pattern {}: dropping language tag {}", key, tag);
                    }
                    parsed
                })
                .collect()
        };

        PatternDto {
            key,
            name: lenient_string(raw.name),
            languages,
            filename_wildcard: lenient_string(raw.filename_wildcard),
            value: lenient_string(raw.value),
            cwe_id: lenient_string(raw.cwe_id),
            description: lenient_string(raw.description),
            data_format: DataFormat::parse_lenient(&lenient_string(raw.data_format)),
        }
    }
}

impl PatternDto {
    /// Read one record out of a loosely typed JSON value. Only a value that
    /// is not an object is rejected.
    pub fn from_value(value: Value) -> std::result::Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom(format!(
                "expected a pattern object, found {}",
                value
            )));
        }
        serde_json::from_value(value)
    }

    /// Record carrying `root` in the format it was read from.
    pub fn from_root(root: &PatternRoot) -> Self {
        Self {
            key: root.key.clone(),
            name: root.name.clone(),
            languages: root.languages.iter().copied().collect(),
            filename_wildcard: root
                .filename_wildcard
                .as_ref()
                .map(|w| w.as_str().to_string())
                .unwrap_or_default(),
            value: root.value.clone(),
            cwe_id: root.cwe_id.clone().unwrap_or_default(),
            description: root.description.clone(),
            data_format: root.data_format,
        }
    }

    /// Build the pattern this record describes.
    ///
    /// `Code` records need a snippet parser; without one they fail with
    /// [`MatcherError::PatternLoad`].
    pub fn to_root(&self, parser: Option<&dyn SnippetParser>) -> Result<PatternRoot> {
        let load_error = |reason: String| MatcherError::PatternLoad {
            key: self.key.clone(),
            reason,
        };

        if self.key.trim().is_empty() {
            return Err(load_error("missing Key".to_string()));
        }
        if self.languages.is_empty() {
            return Err(load_error("no known language in Languages".to_string()));
        }

        let node = match self.data_format {
            DataFormat::Json => serde_json::from_str::<PatternNode>(&self.value)
                .map_err(|e| load_error(format!("invalid pattern JSON: {}", e)))?,
            DataFormat::Code => match parser {
                Some(parser) => parser
                    .parse(&self.value, &self.languages)
                    .map_err(|e| load_error(e.to_string()))?,
                None => {
                    let unsupported = MatcherError::UnsupportedDataFormat(format!(
                        "{} (no snippet parser registered)",
                        self.data_format
                    ));
                    return Err(load_error(unsupported.to_string()));
                }
            },
        };

        let mut builder = PatternRoot::builder(self.key.clone())
            .name(self.name.clone())
            .languages(self.languages.iter().copied())
            .filename_wildcard(self.filename_wildcard.clone())
            .description(self.description.clone())
            .value(self.value.clone(), self.data_format)
            .pattern(node);
        if !self.cwe_id.is_empty() {
            builder = builder.cwe(self.cwe_id.clone());
        }
        builder.build().map_err(|e| load_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct IdentifierSnippets;

    impl SnippetParser for IdentifierSnippets {
        fn parse(&self, snippet: &str, _languages: &BTreeSet<Language>) -> Result<PatternNode> {
            Ok(PatternNode::id(snippet.trim()))
        }
    }

    #[test]
    fn test_tolerant_languages() {
        let json = r#"{
            "Key": "1",
            "Languages": ["JavaScript", "Klingon", 42, "mysql"],
            "Value": "{\"kind\": \"Any\"}"
        }"#;
        let dto: PatternDto = serde_json::from_str(json).unwrap();
        assert_eq!(
            dto.languages,
            [Language::JavaScript, Language::MySql].into_iter().collect()
        );
        assert_eq!(dto.data_format, DataFormat::Json);
    }

    #[test]
    fn test_missing_languages_means_all() {
        let dto: PatternDto = serde_json::from_str(r#"{"Key": "2", "Value": ""}"#).unwrap();
        assert_eq!(dto.languages.len(), Language::all_pattern_languages().len());
        assert!(!dto.languages.contains(&Language::Html));
    }

    #[test]
    fn test_unknown_data_format() {
        let dto: PatternDto = serde_json::from_str(r#"{"Key": "3", "DataFormat": "Yaml"}"#).unwrap();
        assert_eq!(dto.data_format, DataFormat::Json);
        let dto: PatternDto = serde_json::from_str(r#"{"Key": "3", "DataFormat": "Code"}"#).unwrap();
        assert_eq!(dto.data_format, DataFormat::Code);
    }

    #[test]
    fn test_round_trip() {
        let root = PatternRoot::builder("rand")
            .name("Insecure Randomness")
            .language(Language::MySql)
            .cwe("CWE-330")
            .pattern(PatternNode::invocation(PatternNode::id("RAND"), vec![]))
            .build()
            .unwrap();
        let dto = PatternDto::from_root(&root);
        let back: PatternDto = serde_json::from_str(&serde_json::to_string(&dto).unwrap()).unwrap();
        assert_eq!(back, dto);

        let rebuilt = back.to_root(None).unwrap();
        assert_eq!(rebuilt.node, root.node);
        assert_eq!(rebuilt.cwe_id.as_deref(), Some("CWE-330"));
    }

    #[test]
    fn test_code_needs_parser() {
        let dto: PatternDto =
            serde_json::from_str(r#"{"Key": "4", "Value": "eval", "DataFormat": "Code"}"#).unwrap();
        let err = dto.to_root(None).unwrap_err();
        assert!(matches!(err, MatcherError::PatternLoad { .. }));

        let root = dto.to_root(Some(&IdentifierSnippets)).unwrap();
        assert_eq!(root.node, PatternNode::id("eval"));
        assert_eq!(root.value, "eval");
    }

    #[test]
    fn test_code_record_keeps_format() {
        let dto: PatternDto =
            serde_json::from_str(r#"{"Key": "eval", "Value": "eval", "DataFormat": "Code"}"#).unwrap();
        let root = dto.to_root(Some(&IdentifierSnippets)).unwrap();

        let written = PatternDto::from_root(&root);
        assert_eq!(written.data_format, DataFormat::Code);
        assert_eq!(written.value, "eval");
        assert!(written.name.is_empty());

        let json = serde_json::to_string(&written).unwrap();
        let reread: PatternDto = serde_json::from_str(&json).unwrap();
        assert_eq!(reread, written);
        assert_eq!(reread.to_root(Some(&IdentifierSnippets)).unwrap().node, root.node);
    }

    #[test]
    fn test_scalar_fields_read_leniently() {
        let json = r#"{"Key": 42, "Name": true, "CweId": 79, "Languages": "php, Klingon", "Value": "{\"kind\": \"Any\"}"}"#;
        let dto = PatternDto::from_value(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(dto.key, "42");
        assert_eq!(dto.name, "true");
        assert_eq!(dto.cwe_id, "79");
        assert_eq!(dto.languages, [Language::Php].into_iter().collect());
        assert!(dto.to_root(None).is_ok());
    }

    #[test]
    fn test_non_object_record_rejected() {
        assert!(PatternDto::from_value(serde_json::json!("eval")).is_err());
        assert!(PatternDto::from_value(serde_json::json!(["k", "n"])).is_err());
    }

    #[test]
    fn test_bad_regex_is_load_error() {
        let json = r#"{"Key": "5", "Value": "{\"kind\": \"IdRegex\", \"regex\": \"(\"}"}"#;
        let dto: PatternDto = serde_json::from_str(json).unwrap();
        assert!(matches!(dto.to_root(None), Err(MatcherError::PatternLoad { .. })));
    }
}
