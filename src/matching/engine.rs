//! Tree walk applying a pattern set to one file.

use super::context::{MatchingContext, MatchingOptions};
use super::matcher::Matcher;
use crate::concurrency::{Interrupt, Quarantine};
use crate::error::Result;
use crate::models::{MatchingResult, TextSpan};
use crate::pattern::PatternRoot;
use crate::ust::{NodeId, RootUst};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

enum Visit {
    Enter(NodeId),
    Leave(NodeId),
}

/// Outcome of one guarded pattern attempt.
#[derive(Debug, PartialEq)]
enum Attempt {
    Matched(Vec<TextSpan>),
    Missed,
    Faulted,
}

/// Applies patterns to trees, one file at a time.
///
/// The engine holds no per-file state and may be shared by every worker of a
/// run. Patterns that fault during a match are quarantined in the shared
/// [`Quarantine`] and skipped for the rest of the run.
pub struct MatchingEngine {
    options: MatchingOptions,
    quarantine: Arc<Quarantine>,
}

impl MatchingEngine {
    pub fn new(options: MatchingOptions) -> Self {
        Self {
            options,
            quarantine: Arc::new(Quarantine::new()),
        }
    }

    /// Share a quarantine set with other engines of the same run.
    pub fn with_quarantine(mut self, quarantine: Arc<Quarantine>) -> Self {
        self.quarantine = quarantine;
        self
    }

    pub fn options(&self) -> MatchingOptions {
        self.options
    }

    pub fn quarantine(&self) -> &Arc<Quarantine> {
        &self.quarantine
    }

    /// Match every applicable pattern against every node of `tree`, then
    /// against its comments.
    ///
    /// Nodes are visited depth-first in pre-order and patterns in the given
    /// order, which fixes the order of the results. Unless
    /// `find_all_alternatives` is set, a pattern that matched a node is not
    /// tried again inside that node's subtree. `interrupt` is polled before
    /// each node; when it fires nothing gathered so far is returned.
    pub fn match_tree(
        &self,
        tree: &RootUst,
        patterns: &[Arc<PatternRoot>],
        interrupt: &Interrupt,
    ) -> Result<Vec<MatchingResult>> {
        let file = tree.file();
        let file_name = file.path.display().to_string();
        let language = tree.language();

        let active: Vec<&Arc<PatternRoot>> = patterns
            .iter()
            .filter(|p| p.applies_to(language) && p.applies_to_file(&file.path))
            .filter(|p| !self.quarantine.contains(&p.key))
            .collect();

        debug!(
            "Matching {} ({}) against {} patterns",
            file_name,
            language,
            active.len()
        );
        if active.is_empty() {
            return Ok(Vec::new());
        }

        let matcher = Matcher::new(tree);
        let case_insensitive = language.is_case_insensitive();
        let mut results = Vec::new();
        let mut disabled = vec![false; active.len()];
        let mut suppressed_by: Vec<Option<NodeId>> = vec![None; active.len()];

        let mut stack = vec![Visit::Enter(tree.root())];
        while let Some(visit) = stack.pop() {
            let id = match visit {
                Visit::Enter(id) => id,
                Visit::Leave(id) => {
                    for slot in suppressed_by.iter_mut().filter(|s| **s == Some(id)) {
                        *slot = None;
                    }
                    continue;
                }
            };

            interrupt.check(&file_name)?;

            for (index, pattern) in active.iter().enumerate() {
                if disabled[index] || suppressed_by[index].is_some() {
                    continue;
                }
                match self.attempt(&matcher, pattern, id, case_insensitive) {
                    Attempt::Matched(spans) => {
                        results.push(MatchingResult::new(pattern.key.clone(), Arc::clone(file), spans));
                        if !self.options.find_all_alternatives {
                            suppressed_by[index] = Some(id);
                        }
                    }
                    Attempt::Missed => {}
                    Attempt::Faulted => disabled[index] = true,
                }
            }

            stack.push(Visit::Leave(id));
            stack.extend(tree.children(id).into_iter().rev().map(Visit::Enter));
        }

        for &comment in tree.comments() {
            interrupt.check(&file_name)?;
            for (index, pattern) in active.iter().enumerate() {
                if disabled[index] {
                    continue;
                }
                match self.attempt(&matcher, pattern, comment, case_insensitive) {
                    Attempt::Matched(spans) => {
                        results.push(MatchingResult::new(pattern.key.clone(), Arc::clone(file), spans))
                    }
                    Attempt::Missed => {}
                    Attempt::Faulted => disabled[index] = true,
                }
            }
        }

        debug!("{}: {} results", file_name, results.len());
        Ok(results)
    }

    fn attempt(&self, matcher: &Matcher<'_>, pattern: &PatternRoot, id: NodeId, case_insensitive: bool) -> Attempt {
        let outcome = self.guarded(&pattern.key, || {
            let ctx = MatchingContext::new(self.options, case_insensitive);
            matcher.matches(&pattern.node, id, ctx)
        });
        match outcome {
            Attempt::Matched(spans) if spans.is_empty() => {
                Attempt::Matched(vec![matcher.tree().span(id)])
            }
            other => other,
        }
    }

    /// Run one match attempt, quarantining `key` if it panics.
    fn guarded<F>(&self, key: &str, attempt: F) -> Attempt
    where
        F: FnOnce() -> MatchingContext,
    {
        match panic::catch_unwind(AssertUnwindSafe(attempt)) {
            Ok(ctx) if ctx.is_success() => Attempt::Matched(ctx.into_locations()),
            Ok(_) => Attempt::Missed,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                if self.quarantine.insert(key) {
                    warn!("Pattern {} faulted and is disabled for this run: {}", key, message);
                }
                Attempt::Faulted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::Shutdown;
    use crate::error::MatcherError;
    use crate::models::{Language, SourceFile};
    use crate::pattern::{PatternNode, PatternRegex};
    use crate::ust::UstBuilder;

    /// `f(f(x)); // TODO fix`
    fn nested_calls() -> RootUst {
        let code = "f(f(x)); // TODO fix";
        let mut b = UstBuilder::new(Language::JavaScript, SourceFile::new("n.js", code));
        let outer_f = b.identifier("f", TextSpan::new(0, 1));
        let inner_f = b.identifier("f", TextSpan::new(2, 1));
        let x = b.identifier("x", TextSpan::new(4, 1));
        let inner = b.invocation(inner_f, vec![x], TextSpan::new(2, 4));
        let outer = b.invocation(outer_f, vec![inner], TextSpan::new(0, 7));
        let stmt = b.expression_statement(outer);
        let root = b.statements(vec![stmt]);
        b.comment("// TODO fix", TextSpan::new(9, 11));
        b.build(root)
    }

    fn call_f() -> Arc<PatternRoot> {
        let root = PatternRoot::builder("call-f")
            .language(Language::JavaScript)
            .pattern(PatternNode::invocation(PatternNode::id("f"), vec![PatternNode::Any]))
            .build()
            .unwrap();
        Arc::new(root)
    }

    #[test]
    fn test_report_once_per_match_root() {
        let ust = nested_calls();
        let engine = MatchingEngine::new(MatchingOptions::default());
        let results = engine.match_tree(&ust, &[call_f()], &Interrupt::none()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].span(), TextSpan::new(0, 6));
    }

    #[test]
    fn test_find_all_alternatives() {
        let ust = nested_calls();
        let options = MatchingOptions {
            find_all_alternatives: true,
            ..Default::default()
        };
        let engine = MatchingEngine::new(options);
        let results = engine.match_tree(&ust, &[call_f()], &Interrupt::none()).unwrap();
        assert_eq!(results.len(), 2);
        // Outer call first: pre-order.
        assert_eq!(results[0].text_spans[0], TextSpan::new(0, 1));
        assert_eq!(results[1].text_spans[0], TextSpan::new(2, 1));
    }

    #[test]
    fn test_comments_matched_after_tree() {
        let ust = nested_calls();
        let todo = PatternRoot::builder("todo")
            .pattern(PatternNode::CommentRegex {
                regex: PatternRegex::new("TODO").unwrap(),
            })
            .build()
            .unwrap();
        let engine = MatchingEngine::new(MatchingOptions::default());
        let results = engine
            .match_tree(&ust, &[Arc::new(todo), call_f()], &Interrupt::none())
            .unwrap();

        let keys: Vec<&str> = results.iter().map(|r| r.pattern_key.as_str()).collect();
        assert_eq!(keys, vec!["call-f", "todo"]);
        assert_eq!(results[1].text_spans, vec![TextSpan::new(9, 11)]);
    }

    #[test]
    fn test_language_and_file_filters() {
        let ust = nested_calls();
        let php_only = PatternRoot::builder("php")
            .language(Language::Php)
            .pattern(PatternNode::Any)
            .build()
            .unwrap();
        let other_files = PatternRoot::builder("elsewhere")
            .language(Language::JavaScript)
            .filename_wildcard("*.min.js")
            .pattern(PatternNode::Any)
            .build()
            .unwrap();
        let engine = MatchingEngine::new(MatchingOptions::default());
        let results = engine
            .match_tree(&ust, &[Arc::new(php_only), Arc::new(other_files)], &Interrupt::none())
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_root_fallback_span() {
        let ust = nested_calls();
        let not_null = PatternRoot::builder("not-null")
            .language(Language::JavaScript)
            .pattern(PatternNode::NullLiteral.not())
            .build()
            .unwrap();
        let engine = MatchingEngine::new(MatchingOptions::default());
        let results = engine
            .match_tree(&ust, &[Arc::new(not_null)], &Interrupt::none())
            .unwrap();
        // The root matches and hides its subtree; the comment is walked separately.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text_spans, vec![TextSpan::new(0, 7)]);
        assert_eq!(results[1].text_spans, vec![TextSpan::new(9, 11)]);
    }

    #[test]
    fn test_interrupted_pass_discards_results() {
        let ust = nested_calls();
        let shutdown = Shutdown::new();
        shutdown.request();
        let engine = MatchingEngine::new(MatchingOptions::default());
        let err = engine
            .match_tree(&ust, &[call_f()], &shutdown.interrupt(None))
            .unwrap_err();
        assert!(matches!(err, MatcherError::Interrupted { .. }));
    }

    #[test]
    fn test_fault_quarantines_pattern() {
        let engine = MatchingEngine::new(MatchingOptions::default());
        let outcome = engine.guarded("broken", || panic!("malformed pattern"));
        assert_eq!(outcome, Attempt::Faulted);
        assert!(engine.quarantine().contains("broken"));

        let ust = nested_calls();
        let broken = PatternRoot::builder("broken")
            .pattern(PatternNode::Any)
            .build()
            .unwrap();
        let results = engine
            .match_tree(&ust, &[Arc::new(broken), call_f()], &Interrupt::none())
            .unwrap();
        assert!(results.iter().all(|r| r.pattern_key == "call-f"));
    }
}
