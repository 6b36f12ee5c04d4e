//! Pattern roots: a pattern tree bound to its identity and applicability.

use super::PatternNode;
use crate::error::Result;
use crate::models::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// How a pattern's `value` is to be read back into a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataFormat {
    /// A JSON pattern tree.
    #[default]
    Json,
    /// A source snippet in one of the record's languages.
    Code,
}

impl DataFormat {
    /// Unknown names fall back to [`DataFormat::Json`].
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "code" => DataFormat::Code,
            _ => DataFormat::Json,
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Json => write!(f, "Json"),
            DataFormat::Code => write!(f, "Code"),
        }
    }
}

/// Entry point of a pattern. Matching is only attempted against trees whose
/// language is in `languages` and whose path passes `filename_wildcard`.
#[derive(Debug, Clone)]
pub struct PatternRoot {
    /// Stable identity used for reporting and suppression.
    pub key: String,
    /// Authored name, possibly empty.
    pub name: String,
    /// Human label: the name, or the rendered pattern when unnamed.
    pub debug_info: String,
    pub languages: HashSet<Language>,
    pub filename_wildcard: Option<glob::Pattern>,
    pub node: PatternNode,
    /// The pattern's own serialized form.
    pub value: String,
    pub data_format: DataFormat,
    pub cwe_id: Option<String>,
    pub description: String,
}

impl PatternRoot {
    pub fn builder(key: impl Into<String>) -> PatternRootBuilder {
        PatternRootBuilder::new(key)
    }

    pub fn applies_to(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }

    pub fn applies_to_file(&self, path: &Path) -> bool {
        match &self.filename_wildcard {
            Some(wildcard) => wildcard.matches_path(path),
            None => true,
        }
    }
}

/// Builder for pattern roots.
pub struct PatternRootBuilder {
    root: PatternRoot,
    wildcard: Option<String>,
}

impl PatternRootBuilder {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            root: PatternRoot {
                key: key.into(),
                name: String::new(),
                debug_info: String::new(),
                languages: HashSet::new(),
                filename_wildcard: None,
                node: PatternNode::Any,
                value: String::new(),
                data_format: DataFormat::Json,
                cwe_id: None,
                description: String::new(),
            },
            wildcard: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.root.name = name.into();
        self
    }

    pub fn debug_info(mut self, debug_info: impl Into<String>) -> Self {
        self.root.debug_info = debug_info.into();
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.root.languages.insert(language);
        self
    }

    pub fn languages(mut self, languages: impl IntoIterator<Item = Language>) -> Self {
        self.root.languages.extend(languages);
        self
    }

    pub fn filename_wildcard(mut self, wildcard: impl Into<String>) -> Self {
        self.wildcard = Some(wildcard.into());
        self
    }

    pub fn cwe(mut self, cwe: impl Into<String>) -> Self {
        self.root.cwe_id = Some(cwe.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.root.description = description.into();
        self
    }

    pub fn pattern(mut self, node: PatternNode) -> Self {
        self.root.node = node;
        self
    }

    /// Keep the serialized form the pattern was read from, e.g. the source
    /// snippet of a [`DataFormat::Code`] record.
    pub fn value(mut self, value: impl Into<String>, format: DataFormat) -> Self {
        self.root.value = value.into();
        self.root.data_format = format;
        self
    }

    /// Fails only on a malformed filename wildcard.
    pub fn build(self) -> Result<PatternRoot> {
        let mut root = self.root;
        if root.languages.is_empty() {
            root.languages = Language::all_pattern_languages();
        }
        if let Some(wildcard) = self.wildcard.filter(|w| !w.is_empty()) {
            root.filename_wildcard = Some(glob::Pattern::new(&wildcard)?);
        }
        if root.value.is_empty() {
            root.value = serde_json::to_string(&root.node)?;
            root.data_format = DataFormat::Json;
        }
        if root.debug_info.is_empty() {
            root.debug_info = if root.name.is_empty() {
                root.node.to_string()
            } else {
                root.name.clone()
            };
        }
        Ok(root)
    }
}
