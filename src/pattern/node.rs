//! Pattern node taxonomy.

use super::text_regex::PatternRegex;
use crate::ust::{BinaryOperator, UnaryOperator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A matchable shape. Most variants mirror one UST node kind; the rest are
/// wildcards, logical combinators, regex leaves, depth search and ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PatternNode {
    /// Any node at all.
    Any,
    /// Any token or expression.
    AnyExpression,

    And { patterns: Vec<PatternNode> },
    Or { patterns: Vec<PatternNode> },
    Not { pattern: Box<PatternNode> },
    /// The inner pattern matches the node itself or any node beneath it.
    ArbitraryDepth { pattern: Box<PatternNode> },

    IdToken { name: String },
    IdRegex { regex: PatternRegex },
    StringLiteral { text: String },
    StringRegex { regex: PatternRegex },
    CommentRegex { regex: PatternRegex },
    IntLiteral { value: i64 },
    /// Inclusive on both ends.
    IntRange { min: i64, max: i64 },
    FloatLiteral { value: f64 },
    BooleanLiteral {
        #[serde(default)]
        value: Option<bool>,
    },
    NullLiteral,
    BaseReference,

    BinaryOperator {
        left: Box<PatternNode>,
        #[serde(default)]
        operator: Option<BinaryOperator>,
        right: Box<PatternNode>,
    },
    UnaryOperator {
        #[serde(default)]
        operator: Option<UnaryOperator>,
        operand: Box<PatternNode>,
    },
    Assignment {
        left: Box<PatternNode>,
        #[serde(default)]
        right: Option<Box<PatternNode>>,
    },
    MemberReference {
        target: Box<PatternNode>,
        name: Box<PatternNode>,
    },
    Indexer {
        target: Box<PatternNode>,
        arguments: PatternArgs,
    },
    Invocation {
        target: Box<PatternNode>,
        arguments: PatternArgs,
    },
    ObjectCreate {
        #[serde(rename = "type")]
        type_name: Box<PatternNode>,
        arguments: PatternArgs,
    },
    MultipleExpressions { expressions: Vec<PatternNode> },
    Args { arguments: PatternArgs },

    /// Ordered statements of a block, not necessarily adjacent.
    Statements { statements: Vec<PatternNode> },
    TryCatch {
        /// Empty means any exception type.
        #[serde(default)]
        exception_types: Vec<PatternNode>,
        #[serde(default = "default_true")]
        is_catch_body_empty: bool,
    },
    With {
        expression: Box<PatternNode>,
        statement: Box<PatternNode>,
    },

    ClassDeclaration {
        #[serde(default)]
        name: Option<Box<PatternNode>>,
        #[serde(default)]
        base_types: Vec<PatternNode>,
        /// Must match at least one member.
        #[serde(default)]
        body: Option<Box<PatternNode>>,
    },
    /// Methods and constructors.
    MethodDeclaration {
        #[serde(default)]
        name: Option<Box<PatternNode>>,
        #[serde(default)]
        body: Option<Box<PatternNode>>,
    },
    ParameterDeclaration {
        #[serde(default)]
        param_type: Option<Box<PatternNode>>,
        name: Box<PatternNode>,
    },
    VarOrFieldDeclaration {
        #[serde(default)]
        var_type: Option<Box<PatternNode>>,
        name: Box<PatternNode>,
        #[serde(default)]
        initializer: Option<Box<PatternNode>>,
    },
}

fn default_true() -> bool {
    true
}

/// Call arguments matched position by position with exact arity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternArgs {
    pub args: Vec<PatternNode>,
}

impl PatternArgs {
    pub fn new(args: Vec<PatternNode>) -> Self {
        Self { args }
    }

    /// Zero arguments.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl PatternNode {
    pub fn id(name: impl Into<String>) -> Self {
        PatternNode::IdToken { name: name.into() }
    }

    pub fn id_regex(regex: PatternRegex) -> Self {
        PatternNode::IdRegex { regex }
    }

    pub fn string(text: impl Into<String>) -> Self {
        PatternNode::StringLiteral { text: text.into() }
    }

    pub fn and(patterns: Vec<PatternNode>) -> Self {
        PatternNode::And { patterns }
    }

    pub fn or(patterns: Vec<PatternNode>) -> Self {
        PatternNode::Or { patterns }
    }

    /// Negate this pattern.
    pub fn not(self) -> Self {
        PatternNode::Not {
            pattern: Box::new(self),
        }
    }

    /// Match this pattern here or anywhere beneath.
    pub fn anywhere(self) -> Self {
        PatternNode::ArbitraryDepth {
            pattern: Box::new(self),
        }
    }

    pub fn member(target: PatternNode, name: PatternNode) -> Self {
        PatternNode::MemberReference {
            target: Box::new(target),
            name: Box::new(name),
        }
    }

    pub fn invocation(target: PatternNode, args: Vec<PatternNode>) -> Self {
        PatternNode::Invocation {
            target: Box::new(target),
            arguments: PatternArgs::new(args),
        }
    }

    pub fn assignment(left: PatternNode, right: Option<PatternNode>) -> Self {
        PatternNode::Assignment {
            left: Box::new(left),
            right: right.map(Box::new),
        }
    }

    pub fn try_catch(exception_types: Vec<PatternNode>, is_catch_body_empty: bool) -> Self {
        PatternNode::TryCatch {
            exception_types,
            is_catch_body_empty,
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, items: &[PatternNode], separator: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for PatternArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join(f, &self.args, ", ")
    }
}

impl fmt::Display for PatternNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PatternNode::*;
        match self {
            Any => f.write_str("_"),
            AnyExpression => f.write_str("#"),
            And { patterns } => {
                f.write_str("(")?;
                join(f, patterns, " <&> ")?;
                f.write_str(")")
            }
            Or { patterns } => {
                f.write_str("(")?;
                join(f, patterns, " <|> ")?;
                f.write_str(")")
            }
            Not { pattern } => write!(f, "<~>{}", pattern),
            ArbitraryDepth { pattern } => write!(f, "#({})", pattern),
            IdToken { name } => f.write_str(name),
            IdRegex { regex } => write!(f, "<[{}]>", regex),
            StringLiteral { text } => write!(f, "{:?}", text),
            StringRegex { regex } => write!(f, "<\"{}\">", regex),
            CommentRegex { regex } => write!(f, "</*{}*/>", regex),
            IntLiteral { value } => write!(f, "{}", value),
            IntRange { min, max } => write!(f, "<[{}..{}]>", min, max),
            FloatLiteral { value } => write!(f, "{:?}", value),
            BooleanLiteral { value: Some(v) } => write!(f, "{}", v),
            BooleanLiteral { value: None } => f.write_str("<bool>"),
            NullLiteral => f.write_str("null"),
            BaseReference => f.write_str("base"),
            BinaryOperator {
                left,
                operator,
                right,
            } => match operator {
                Some(op) => write!(f, "{} {} {}", left, op.text(), right),
                None => write!(f, "{} <op> {}", left, right),
            },
            UnaryOperator { operator, operand } => match operator {
                Some(op) if op.is_postfix() => write!(f, "{}{}", operand, op.text()),
                Some(op) if op.is_keyword() => write!(f, "{} {}", op.text(), operand),
                Some(op) => write!(f, "{}{}", op.text(), operand),
                None => write!(f, "<op>{}", operand),
            },
            Assignment { left, right } => match right {
                Some(right) => write!(f, "{} = {}", left, right),
                None => write!(f, "{} =", left),
            },
            MemberReference { target, name } => write!(f, "{}.{}", target, name),
            Indexer { target, arguments } => write!(f, "{}[{}]", target, arguments),
            Invocation { target, arguments } => write!(f, "{}({})", target, arguments),
            ObjectCreate {
                type_name,
                arguments,
            } => write!(f, "new {}({})", type_name, arguments),
            MultipleExpressions { expressions } => join(f, expressions, ", "),
            Args { arguments } => write!(f, "{}", arguments),
            Statements { statements } => {
                f.write_str("{ ")?;
                join(f, statements, "; ")?;
                f.write_str(" }")
            }
            TryCatch {
                exception_types,
                is_catch_body_empty,
            } => {
                f.write_str("try { } catch (")?;
                if exception_types.is_empty() {
                    f.write_str("_")?;
                } else {
                    join(f, exception_types, " | ")?;
                }
                if *is_catch_body_empty {
                    f.write_str(") { }")
                } else {
                    f.write_str(") { ... }")
                }
            }
            With {
                expression,
                statement,
            } => write!(f, "with ({}) {}", expression, statement),
            ClassDeclaration {
                name,
                base_types,
                body,
            } => {
                f.write_str("class ")?;
                match name {
                    Some(name) => write!(f, "{}", name)?,
                    None => f.write_str("_")?,
                }
                if !base_types.is_empty() {
                    f.write_str(" : ")?;
                    join(f, base_types, ", ")?;
                }
                match body {
                    Some(body) => write!(f, " {{ {} }}", body),
                    None => f.write_str(" { ... }"),
                }
            }
            MethodDeclaration { name, body } => {
                match name {
                    Some(name) => write!(f, "{}(...)", name)?,
                    None => f.write_str("_(...)")?,
                }
                match body {
                    Some(body) => write!(f, " {{ {} }}", body),
                    None => f.write_str(" { ... }"),
                }
            }
            ParameterDeclaration { param_type, name } => match param_type {
                Some(ty) => write!(f, "{} {}", ty, name),
                None => write!(f, "{}", name),
            },
            VarOrFieldDeclaration {
                var_type,
                name,
                initializer,
            } => {
                if let Some(ty) = var_type {
                    write!(f, "{} ", ty)?;
                }
                write!(f, "{}", name)?;
                if let Some(init) = initializer {
                    write!(f, " = {}", init)?;
                }
                Ok(())
            }
        }
    }
}
