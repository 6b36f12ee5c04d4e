//! Source language table.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Languages a front-end can turn into a UST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    CSharp,
    Java,
    Php,
    JavaScript,
    Html,
    Aspx,
    PlSql,
    TSql,
    MySql,
    C,
    Cpp,
    ObjectiveC,
    Swift,
    Python,
    Go,
}

/// Static properties of a [`Language`].
#[derive(Debug, Clone, Copy)]
pub struct LanguageInfo {
    pub key: Language,
    pub title: &'static str,
    pub extensions: &'static [&'static str],
    /// Identifiers and keywords compare without regard to case.
    pub case_insensitive: bool,
    /// Languages embedded in this one (script blocks, inline SQL, ...).
    pub sublanguages: &'static [Language],
    /// Patterns may be written for this language.
    pub is_pattern: bool,
}

const ALL: [Language; 15] = [
    Language::CSharp,
    Language::Java,
    Language::Php,
    Language::JavaScript,
    Language::Html,
    Language::Aspx,
    Language::PlSql,
    Language::TSql,
    Language::MySql,
    Language::C,
    Language::Cpp,
    Language::ObjectiveC,
    Language::Swift,
    Language::Python,
    Language::Go,
];

impl Language {
    /// Every known language, in declaration order.
    pub fn all() -> &'static [Language] {
        &ALL
    }

    /// Languages that patterns can target. An empty language set in a pattern
    /// record expands to this set.
    pub fn all_pattern_languages() -> HashSet<Language> {
        ALL.iter().copied().filter(|l| l.info().is_pattern).collect()
    }

    pub fn info(&self) -> LanguageInfo {
        use Language::*;
        match self {
            CSharp => entry(CSharp, "C#", &["cs"], false, &[], true),
            Java => entry(Java, "Java", &["java"], false, &[], true),
            Php => entry(Php, "PHP", &["php"], true, &[JavaScript, Html], true),
            JavaScript => entry(JavaScript, "JavaScript", &["js", "mjs", "cjs"], false, &[], true),
            Html => entry(Html, "HTML", &["html", "htm"], true, &[JavaScript], false),
            Aspx => entry(Aspx, "Aspx", &["aspx", "ascx"], false, &[CSharp, JavaScript], false),
            PlSql => entry(PlSql, "PL/SQL", &["sql", "pks", "pkb"], true, &[], true),
            TSql => entry(TSql, "T-SQL", &["sql"], true, &[], true),
            MySql => entry(MySql, "MySQL", &["sql"], true, &[], true),
            C => entry(C, "C", &["c", "h"], false, &[], true),
            Cpp => entry(Cpp, "C++", &["cpp", "cc", "cxx", "hpp", "hh"], false, &[], true),
            ObjectiveC => entry(ObjectiveC, "Objective-C", &["m", "mm"], false, &[], true),
            Swift => entry(Swift, "Swift", &["swift"], false, &[], true),
            Python => entry(Python, "Python", &["py"], false, &[], true),
            Go => entry(Go, "Go", &["go"], false, &[], true),
        }
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.info().case_insensitive
    }

    /// Detect language from file extension. Ambiguous extensions resolve to the
    /// first language declaring them.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        ALL.iter()
            .copied()
            .find(|l| l.info().extensions.contains(&ext.as_str()))
    }
}

const fn entry(
    key: Language,
    title: &'static str,
    extensions: &'static [&'static str],
    case_insensitive: bool,
    sublanguages: &'static [Language],
    is_pattern: bool,
) -> LanguageInfo {
    LanguageInfo {
        key,
        title,
        extensions,
        case_insensitive,
        sublanguages,
        is_pattern,
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let language = match normalized.as_str() {
            "csharp" | "c#" | "cs" => Language::CSharp,
            "java" => Language::Java,
            "php" => Language::Php,
            "javascript" | "js" => Language::JavaScript,
            "html" => Language::Html,
            "aspx" => Language::Aspx,
            "plsql" | "pl/sql" => Language::PlSql,
            "tsql" | "t-sql" => Language::TSql,
            "mysql" => Language::MySql,
            "c" => Language::C,
            "cpp" | "c++" => Language::Cpp,
            "objectivec" | "objective-c" | "objc" => Language::ObjectiveC,
            "swift" => Language::Swift,
            "python" | "py" => Language::Python,
            "go" | "golang" => Language::Go,
            _ => return Err(format!("unknown language: {}", s)),
        };
        Ok(language)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.info().title)
    }
}
