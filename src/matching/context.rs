//! Threaded state of one match attempt.

use crate::models::TextSpan;
use serde::{Deserialize, Serialize};

/// Run-wide switches that shape what a match reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingOptions {
    /// Keep walking into subtrees that already matched a pattern.
    pub find_all_alternatives: bool,
    /// Record spans of structural (non-leaf) pattern nodes too.
    pub include_nonterminal_text_spans: bool,
}

/// Locations gathered so far plus the success flag.
///
/// Every operation consumes the context and returns the next one, so an
/// alternative that fails cannot leak locations into a sibling attempt made
/// from a clone of the same starting context.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingContext {
    locations: Vec<TextSpan>,
    success: bool,
    options: MatchingOptions,
    case_insensitive: bool,
}

impl MatchingContext {
    /// A fresh, successful context with no locations.
    pub fn new(options: MatchingOptions, case_insensitive: bool) -> Self {
        Self {
            locations: Vec::new(),
            success: true,
            options,
            case_insensitive,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn locations(&self) -> &[TextSpan] {
        &self.locations
    }

    pub fn into_locations(self) -> Vec<TextSpan> {
        self.locations
    }

    pub fn options(&self) -> MatchingOptions {
        self.options
    }

    /// Whether textual leaves compare ignoring case.
    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn fail(mut self) -> Self {
        self.success = false;
        self
    }

    /// Append a location. Empty spans carry no source text and are skipped.
    pub fn add_location(mut self, span: TextSpan) -> Self {
        if !span.is_empty() {
            self.locations.push(span);
        }
        self
    }

    /// Append the span of a structural pattern node when enabled.
    pub fn add_nonterminal_location(self, span: TextSpan) -> Self {
        if self.options.include_nonterminal_text_spans {
            self.add_location(span)
        } else {
            self
        }
    }

    /// Succeed with a location when `matched`, fail otherwise.
    pub fn check(self, matched: bool, span: TextSpan) -> Self {
        if matched {
            self.add_location(span)
        } else {
            self.fail()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context() {
        let ctx = MatchingContext::new(MatchingOptions::default(), false);
        assert!(ctx.is_success());
        assert!(ctx.locations().is_empty());
    }

    #[test]
    fn test_empty_span_skipped() {
        let ctx = MatchingContext::new(MatchingOptions::default(), false)
            .add_location(TextSpan::EMPTY)
            .add_location(TextSpan::new(3, 2));
        assert_eq!(ctx.locations(), &[TextSpan::new(3, 2)]);
        assert!(ctx.is_success());
    }

    #[test]
    fn test_clone_isolates_locations() {
        let base = MatchingContext::new(MatchingOptions::default(), false);
        let branch = base.clone().add_location(TextSpan::new(0, 1)).fail();
        assert!(!branch.is_success());
        assert!(base.locations().is_empty());
    }

    #[test]
    fn test_nonterminal_spans_opt_in() {
        let span = TextSpan::new(1, 4);
        let off = MatchingContext::new(MatchingOptions::default(), false).add_nonterminal_location(span);
        assert!(off.locations().is_empty());

        let options = MatchingOptions {
            include_nonterminal_text_spans: true,
            ..Default::default()
        };
        let on = MatchingContext::new(options, false).add_nonterminal_location(span);
        assert_eq!(on.locations(), &[span]);
    }
}
