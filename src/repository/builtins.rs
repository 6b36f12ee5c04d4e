//! Built-in pattern set.

use super::{MemoryPatternRepository, PatternRepository};
use crate::error::Result;
use crate::models::Language;
use crate::pattern::{PatternArgs, PatternNode, PatternRegex, PatternRoot};
use std::sync::Arc;

/// Repository holding the patterns shipped with the matcher.
#[derive(Debug, Clone)]
pub struct DefaultPatternRepository {
    inner: MemoryPatternRepository,
}

impl DefaultPatternRepository {
    pub fn new() -> Result<Self> {
        let mut inner = MemoryPatternRepository::new();
        inner.extend(javascript_patterns()?);
        inner.extend(mysql_patterns()?);
        inner.extend(common_patterns()?);
        Ok(Self { inner })
    }

    /// The built-ins as a mutable repository, to add more patterns to.
    pub fn into_inner(self) -> MemoryPatternRepository {
        self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl PatternRepository for DefaultPatternRepository {
    fn all(&self) -> Vec<Arc<PatternRoot>> {
        self.inner.all()
    }
}

fn id_regex(source: &str) -> Result<PatternNode> {
    Ok(PatternNode::id_regex(PatternRegex::new(source)?))
}

fn any_identifier() -> PatternNode {
    PatternNode::id_regex(PatternRegex::any_identifier())
}

/// JavaScript patterns.
pub fn javascript_patterns() -> Result<Vec<PatternRoot>> {
    // DOM values an attacker controls through the URL, the referrer, cookies
    // or the window name.
    let dom_sources = PatternNode::or(vec![
        PatternNode::member(PatternNode::id("document"), id_regex("^(URL|referrer|cookie)$")?),
        PatternNode::member(
            PatternNode::member(PatternNode::id("document"), PatternNode::id("location")),
            id_regex("^(pathname|href|search|hash)$")?,
        ),
        PatternNode::member(PatternNode::id("window"), PatternNode::id("name")),
        PatternNode::member(
            PatternNode::member(
                PatternNode::member(
                    PatternNode::member(PatternNode::id("window"), id_regex("^(top|frames)$")?),
                    PatternNode::id("document"),
                ),
                any_identifier(),
            ),
            any_identifier(),
        ),
    ]);

    let event_handler = PatternRoot::builder("js-event-handler-dom-data")
        .name("AttributesCodeInsideElementEvent")
        .description("DOM-controlled data assigned to an element event handler attribute")
        .cwe("CWE-79")
        .language(Language::JavaScript)
        .pattern(PatternNode::assignment(
            PatternNode::member(PatternNode::AnyExpression, id_regex("^on")?),
            Some(dom_sources.anywhere()),
        ))
        .build()?;

    Ok(vec![event_handler])
}

/// MySQL patterns.
pub fn mysql_patterns() -> Result<Vec<PatternRoot>> {
    let weak_hash = PatternRoot::builder("mysql-weak-hash")
        .name("Weak Cryptographic Hash (MD2, MD4, MD5, RIPEMD-160, and SHA-1)")
        .cwe("CWE-328")
        .language(Language::MySql)
        .pattern(PatternNode::invocation(id_regex("sha1")?, vec![PatternNode::Any]))
        .build()?;

    let insecure_random = PatternRoot::builder("mysql-insecure-random")
        .name("Insecure Randomness")
        .cwe("CWE-330")
        .language(Language::MySql)
        .pattern(PatternNode::Invocation {
            target: Box::new(id_regex("RAND")?),
            arguments: PatternArgs::empty(),
        })
        .build()?;

    Ok(vec![weak_hash, insecure_random])
}

/// Patterns shared by several languages.
pub fn common_patterns() -> Result<Vec<PatternRoot>> {
    let swallowed_exception = PatternRoot::builder("empty-catch-block")
        .name("Poor Error Handling: Empty Catch Block")
        .description("An exception is caught and silently discarded")
        .cwe("CWE-390")
        .languages([
            Language::CSharp,
            Language::Java,
            Language::Php,
            Language::JavaScript,
        ])
        .pattern(PatternNode::try_catch(vec![], true))
        .build()?;

    // Spellings are listed rather than case-folded; folding follows the language.
    let hash_name = id_regex("^(md2|md4|md5|sha1|ripemd160|MD2|MD4|MD5|SHA1|RIPEMD160)$")?;
    let weak_hash = PatternRoot::builder("weak-hash-invocation")
        .name("Weak Cryptographic Hash")
        .cwe("CWE-328")
        .languages([Language::Php, Language::Python, Language::JavaScript])
        .pattern(PatternNode::invocation(
            PatternNode::or(vec![
                hash_name.clone(),
                PatternNode::member(PatternNode::AnyExpression, hash_name),
            ]),
            vec![PatternNode::AnyExpression],
        ))
        .build()?;

    let password_name = id_regex("^\\w*([Pp]assword|PASSWORD|[Pp]asswd|PASSWD|[Pp]wd|PWD)$")?;
    let non_empty_string = PatternNode::StringRegex {
        regex: PatternRegex::new(".")?,
    };
    let hardcoded_password = PatternRoot::builder("hardcoded-password")
        .name("Password Management: Hardcoded Password")
        .cwe("CWE-259")
        .pattern(PatternNode::or(vec![
            PatternNode::assignment(
                PatternNode::or(vec![
                    password_name.clone(),
                    PatternNode::member(PatternNode::AnyExpression, password_name.clone()),
                ]),
                Some(non_empty_string.clone()),
            ),
            PatternNode::VarOrFieldDeclaration {
                var_type: None,
                name: Box::new(password_name),
                initializer: Some(Box::new(non_empty_string)),
            },
        ]))
        .build()?;

    Ok(vec![swallowed_exception, weak_hash, hardcoded_password])
}
