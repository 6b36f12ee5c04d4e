//! Per-variant match rules.
//!
//! [`Matcher::matches`] dispatches exhaustively over [`PatternNode`]. Every
//! structural arm checks the candidate's kind before touching its children and
//! returns a failed context on mismatch.

use super::context::MatchingContext;
use crate::pattern::{PatternArgs, PatternNode, PatternRegex};
use crate::ust::{NodeId, NodeKind, RootUst};

/// Matches pattern trees against nodes of one [`RootUst`].
pub struct Matcher<'a> {
    tree: &'a RootUst,
}

impl<'a> Matcher<'a> {
    pub fn new(tree: &'a RootUst) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'a RootUst {
        self.tree
    }

    /// Match `pattern` against node `id`, threading `ctx`.
    pub fn matches(&self, pattern: &PatternNode, id: NodeId, ctx: MatchingContext) -> MatchingContext {
        let tree = self.tree;
        let kind = tree.kind(id);
        let span = tree.span(id);

        match pattern {
            PatternNode::Any => ctx.add_location(span),
            PatternNode::AnyExpression => ctx.check(kind.is_expression(), span),

            PatternNode::And { patterns } => {
                let mut ctx = ctx;
                for p in patterns {
                    ctx = self.matches(p, id, ctx);
                    if !ctx.is_success() {
                        break;
                    }
                }
                ctx
            }
            PatternNode::Or { patterns } => {
                for p in patterns {
                    let attempt = self.matches(p, id, ctx.clone());
                    if attempt.is_success() {
                        return attempt;
                    }
                }
                ctx.fail()
            }
            PatternNode::Not { pattern } => {
                if self.matches(pattern, id, ctx.clone()).is_success() {
                    ctx.fail()
                } else {
                    ctx
                }
            }
            PatternNode::ArbitraryDepth { pattern } => {
                let attempt = self.matches(pattern, id, ctx.clone());
                if attempt.is_success() {
                    return attempt;
                }
                for descendant in tree.descendants(id) {
                    let attempt = self.matches(pattern, descendant, ctx.clone());
                    if attempt.is_success() {
                        return attempt;
                    }
                }
                ctx.fail()
            }

            PatternNode::IdToken { name } => match kind {
                NodeKind::Identifier { name: actual } | NodeKind::TypeToken { name: actual } => {
                    let equal = if ctx.case_insensitive() {
                        actual.to_lowercase() == name.to_lowercase()
                    } else {
                        actual == name
                    };
                    ctx.check(equal, span)
                }
                _ => ctx.fail(),
            },
            PatternNode::IdRegex { regex } => match kind {
                NodeKind::Identifier { name } | NodeKind::TypeToken { name } => {
                    regex_leaf(regex, name, span, ctx)
                }
                _ => ctx.fail(),
            },
            PatternNode::StringLiteral { text } => match kind {
                NodeKind::StringLiteral { text: actual } => ctx.check(actual == text, span),
                _ => ctx.fail(),
            },
            PatternNode::StringRegex { regex } => match kind {
                NodeKind::StringLiteral { text } => regex_leaf(regex, text, span, ctx),
                _ => ctx.fail(),
            },
            PatternNode::CommentRegex { regex } => match kind {
                NodeKind::Comment { text } => regex_leaf(regex, text, span, ctx),
                _ => ctx.fail(),
            },
            PatternNode::IntLiteral { value } => match kind {
                NodeKind::IntLiteral { value: actual } => ctx.check(actual == value, span),
                _ => ctx.fail(),
            },
            PatternNode::IntRange { min, max } => match kind {
                NodeKind::IntLiteral { value } => ctx.check(min <= value && value <= max, span),
                _ => ctx.fail(),
            },
            PatternNode::FloatLiteral { value } => match kind {
                NodeKind::FloatLiteral { value: actual } => ctx.check(actual == value, span),
                _ => ctx.fail(),
            },
            PatternNode::BooleanLiteral { value } => match kind {
                NodeKind::BooleanLiteral { value: actual } => {
                    ctx.check(value.map_or(true, |v| v == *actual), span)
                }
                _ => ctx.fail(),
            },
            PatternNode::NullLiteral => ctx.check(matches!(kind, NodeKind::NullLiteral), span),
            PatternNode::BaseReference => {
                ctx.check(matches!(kind, NodeKind::BaseReference), span)
            }

            PatternNode::BinaryOperator {
                left,
                operator,
                right,
            } => match kind {
                NodeKind::BinaryOperator {
                    left: l,
                    operator: op,
                    right: r,
                } => {
                    if operator.map_or(false, |expected| expected != *op) {
                        return ctx.fail();
                    }
                    let ctx = self.matches(left, *l, ctx);
                    if !ctx.is_success() {
                        return ctx;
                    }
                    self.structural(self.matches(right, *r, ctx), id)
                }
                _ => ctx.fail(),
            },
            PatternNode::UnaryOperator { operator, operand } => match kind {
                NodeKind::UnaryOperator {
                    operator: op,
                    operand: o,
                } => {
                    if operator.map_or(false, |expected| expected != *op) {
                        return ctx.fail();
                    }
                    self.structural(self.matches(operand, *o, ctx), id)
                }
                _ => ctx.fail(),
            },
            PatternNode::Assignment { left, right } => match kind {
                NodeKind::Assignment { left: l, right: r } => {
                    let ctx = self.matches(left, *l, ctx);
                    if !ctx.is_success() {
                        return ctx;
                    }
                    let ctx = self.optional(right.as_deref(), *r, ctx);
                    self.structural(ctx, id)
                }
                _ => ctx.fail(),
            },
            PatternNode::MemberReference { target, name } => match kind {
                NodeKind::MemberReference { target: t, name: n } => {
                    let ctx = self.member_target(target, *t, ctx);
                    if !ctx.is_success() {
                        return ctx;
                    }
                    self.structural(self.matches(name, *n, ctx), id)
                }
                _ => ctx.fail(),
            },
            PatternNode::Indexer { target, arguments } => match kind {
                NodeKind::Indexer {
                    target: t,
                    arguments: a,
                } => self.call_like(target, arguments, *t, *a, id, ctx),
                _ => ctx.fail(),
            },
            PatternNode::Invocation { target, arguments } => match kind {
                NodeKind::Invocation {
                    target: t,
                    arguments: a,
                } => self.call_like(target, arguments, *t, *a, id, ctx),
                _ => ctx.fail(),
            },
            PatternNode::ObjectCreate {
                type_name,
                arguments,
            } => match kind {
                NodeKind::ObjectCreate {
                    type_name: t,
                    arguments: a,
                } => self.call_like(type_name, arguments, *t, *a, id, ctx),
                _ => ctx.fail(),
            },
            PatternNode::MultipleExpressions { expressions } => match kind {
                NodeKind::MultipleExpressions { expressions: actual } => {
                    self.structural(self.positional(expressions, actual, ctx), id)
                }
                _ => ctx.fail(),
            },
            PatternNode::Args { arguments } => self.args(arguments, id, ctx),

            PatternNode::Statements { statements } => match kind {
                NodeKind::Block { statements: actual } | NodeKind::Statements { statements: actual } => {
                    self.structural(self.subsequence(statements, actual, ctx), id)
                }
                _ => ctx.fail(),
            },
            PatternNode::TryCatch {
                exception_types,
                is_catch_body_empty,
            } => match kind {
                NodeKind::TryCatch { catch_clauses, .. } => {
                    let found = catch_clauses.iter().any(|clause| {
                        self.catch_clause_matches(exception_types, *is_catch_body_empty, *clause, &ctx)
                    });
                    ctx.check(found, span)
                }
                _ => ctx.fail(),
            },
            PatternNode::With {
                expression,
                statement,
            } => match kind {
                NodeKind::With {
                    expression: e,
                    statement: s,
                } => {
                    let ctx = self.matches(expression, *e, ctx);
                    if !ctx.is_success() {
                        return ctx;
                    }
                    self.structural(self.matches(statement, *s, ctx), id)
                }
                _ => ctx.fail(),
            },

            PatternNode::ClassDeclaration {
                name,
                base_types,
                body,
            } => match kind {
                NodeKind::Class {
                    name: n,
                    base_types: bases,
                    members,
                } => {
                    let mut ctx = self.optional(name.as_deref(), Some(*n), ctx);
                    for base in base_types {
                        if !ctx.is_success() {
                            return ctx;
                        }
                        ctx = self.any_of(base, bases, ctx);
                    }
                    if !ctx.is_success() {
                        return ctx;
                    }
                    if let Some(body) = body {
                        ctx = self.any_of(body, members, ctx);
                    }
                    self.structural(ctx, id)
                }
                _ => ctx.fail(),
            },
            PatternNode::MethodDeclaration { name, body } => match kind {
                NodeKind::Method { name: n, body: b, .. }
                | NodeKind::Constructor { name: n, body: b, .. } => {
                    let ctx = self.optional(name.as_deref(), Some(*n), ctx);
                    if !ctx.is_success() {
                        return ctx;
                    }
                    let ctx = self.optional(body.as_deref(), *b, ctx);
                    self.structural(ctx, id)
                }
                _ => ctx.fail(),
            },
            PatternNode::ParameterDeclaration { param_type, name } => match kind {
                NodeKind::Parameter {
                    param_type: t,
                    name: n,
                    ..
                } => {
                    let ctx = self.optional(param_type.as_deref(), *t, ctx);
                    if !ctx.is_success() {
                        return ctx;
                    }
                    self.structural(self.matches(name, *n, ctx), id)
                }
                _ => ctx.fail(),
            },
            PatternNode::VarOrFieldDeclaration {
                var_type,
                name,
                initializer,
            } => match kind {
                NodeKind::Variable {
                    name: n,
                    initializer: init,
                } => {
                    let declared_type = self.declared_type(id);
                    let ctx = self.optional(var_type.as_deref(), declared_type, ctx);
                    if !ctx.is_success() {
                        return ctx;
                    }
                    let ctx = self.matches(name, *n, ctx);
                    if !ctx.is_success() {
                        return ctx;
                    }
                    let ctx = self.optional(initializer.as_deref(), *init, ctx);
                    self.structural(ctx, id)
                }
                NodeKind::Field { variables, .. } => {
                    let ctx = self.any_of(pattern, variables, ctx);
                    self.structural(ctx, id)
                }
                _ => ctx.fail(),
            },
        }
    }

    fn structural(&self, ctx: MatchingContext, id: NodeId) -> MatchingContext {
        if ctx.is_success() {
            ctx.add_nonterminal_location(self.tree.span(id))
        } else {
            ctx
        }
    }

    /// A member target also matches the last segment of a qualified target,
    /// so `window.name` is found in `a.b.window.name`.
    fn member_target(&self, pattern: &PatternNode, id: NodeId, ctx: MatchingContext) -> MatchingContext {
        let attempt = self.matches(pattern, id, ctx.clone());
        if attempt.is_success() {
            return attempt;
        }
        match self.tree.kind(id) {
            NodeKind::MemberReference { name, .. } => self.matches(pattern, *name, ctx),
            _ => attempt,
        }
    }

    /// An absent pattern accepts anything, a present one needs a node to match.
    fn optional(
        &self,
        pattern: Option<&PatternNode>,
        id: Option<NodeId>,
        ctx: MatchingContext,
    ) -> MatchingContext {
        match (pattern, id) {
            (None, _) => ctx,
            (Some(p), Some(id)) => self.matches(p, id, ctx),
            (Some(_), None) => ctx.fail(),
        }
    }

    /// First candidate matching `pattern`, in order.
    fn any_of(&self, pattern: &PatternNode, candidates: &[NodeId], ctx: MatchingContext) -> MatchingContext {
        for candidate in candidates {
            let attempt = self.matches(pattern, *candidate, ctx.clone());
            if attempt.is_success() {
                return attempt;
            }
        }
        ctx.fail()
    }

    fn call_like(
        &self,
        target: &PatternNode,
        arguments: &PatternArgs,
        target_id: NodeId,
        args_id: NodeId,
        id: NodeId,
        ctx: MatchingContext,
    ) -> MatchingContext {
        let ctx = self.matches(target, target_id, ctx);
        if !ctx.is_success() {
            return ctx;
        }
        self.structural(self.args(arguments, args_id, ctx), id)
    }

    fn args(&self, arguments: &PatternArgs, id: NodeId, ctx: MatchingContext) -> MatchingContext {
        match self.tree.kind(id) {
            NodeKind::Args { arguments: actual } => {
                self.structural(self.positional(&arguments.args, actual, ctx), id)
            }
            _ => ctx.fail(),
        }
    }

    /// Exact arity, position by position, failing at the first mismatch.
    fn positional(&self, patterns: &[PatternNode], nodes: &[NodeId], ctx: MatchingContext) -> MatchingContext {
        if patterns.len() != nodes.len() {
            return ctx.fail();
        }
        let mut ctx = ctx;
        for (pattern, node) in patterns.iter().zip(nodes) {
            ctx = self.matches(pattern, *node, ctx);
            if !ctx.is_success() {
                break;
            }
        }
        ctx
    }

    /// Pattern statements must appear in order but need not be adjacent. Each
    /// one takes the earliest statement after the previous match.
    fn subsequence(&self, patterns: &[PatternNode], nodes: &[NodeId], ctx: MatchingContext) -> MatchingContext {
        let mut ctx = ctx;
        let mut cursor = 0;
        for pattern in patterns {
            let mut found = None;
            for (offset, node) in nodes[cursor..].iter().enumerate() {
                let attempt = self.statement(pattern, *node, ctx.clone());
                if attempt.is_success() {
                    found = Some((cursor + offset, attempt));
                    break;
                }
            }
            match found {
                Some((index, next)) => {
                    ctx = next;
                    cursor = index + 1;
                }
                None => return ctx.fail(),
            }
        }
        ctx
    }

    /// An expression pattern also matches the expression inside a statement.
    fn statement(&self, pattern: &PatternNode, id: NodeId, ctx: MatchingContext) -> MatchingContext {
        let attempt = self.matches(pattern, id, ctx.clone());
        if attempt.is_success() {
            return attempt;
        }
        match self.tree.kind(id) {
            NodeKind::ExpressionStatement { expression } => self.matches(pattern, *expression, ctx),
            _ => attempt,
        }
    }

    fn catch_clause_matches(
        &self,
        exception_types: &[PatternNode],
        body_must_be_empty: bool,
        clause: NodeId,
        ctx: &MatchingContext,
    ) -> bool {
        let NodeKind::CatchClause {
            exception_type,
            body,
            ..
        } = self.tree.kind(clause)
        else {
            return false;
        };

        let type_matches = exception_types.is_empty()
            || exception_type.map_or(false, |declared| {
                exception_types
                    .iter()
                    .any(|p| self.matches(p, declared, ctx.clone()).is_success())
            });

        type_matches && (!body_must_be_empty || self.is_empty_body(*body))
    }

    fn is_empty_body(&self, id: NodeId) -> bool {
        match self.tree.kind(id) {
            NodeKind::Block { statements } | NodeKind::Statements { statements } => statements.is_empty(),
            _ => false,
        }
    }

    /// Type of a variable, taken from its enclosing field or parameter list.
    fn declared_type(&self, variable: NodeId) -> Option<NodeId> {
        let parent = self.tree.parent(variable)?;
        match self.tree.kind(parent) {
            NodeKind::Field { field_type, .. } => *field_type,
            _ => None,
        }
    }
}

fn regex_leaf(
    regex: &PatternRegex,
    text: &str,
    span: crate::models::TextSpan,
    ctx: MatchingContext,
) -> MatchingContext {
    let matched = regex.is_match(text, ctx.case_insensitive());
    ctx.check(matched, span)
}
