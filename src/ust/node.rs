//! UST node kinds.

use crate::models::TextSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside its [`RootUst`](super::RootUst) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Broad grouping of node kinds, used by wildcard patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    Token,
    Expression,
    Statement,
    Collection,
    Declaration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Mod,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LogicalAnd,
    LogicalOr,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    ShiftLeft,
    ShiftRight,
    Is,
    As,
    NullCoalescing,
}

impl BinaryOperator {
    pub fn text(&self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Plus => "+",
            Minus => "-",
            Multiply => "*",
            Divide => "/",
            Mod => "%",
            BitwiseAnd => "&",
            BitwiseOr => "|",
            BitwiseXor => "^",
            LogicalAnd => "&&",
            LogicalOr => "||",
            Equal => "==",
            NotEqual => "!=",
            StrictEqual => "===",
            StrictNotEqual => "!==",
            Less => "<",
            LessOrEqual => "<=",
            Greater => ">",
            GreaterOrEqual => ">=",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            Is => "is",
            As => "as",
            NullCoalescing => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
    BitwiseNot,
    Increment,
    Decrement,
    PostIncrement,
    PostDecrement,
    TypeOf,
    Delete,
    Await,
    Void,
}

impl UnaryOperator {
    pub fn text(&self) -> &'static str {
        use UnaryOperator::*;
        match self {
            Plus => "+",
            Minus => "-",
            Not => "!",
            BitwiseNot => "~",
            Increment | PostIncrement => "++",
            Decrement | PostDecrement => "--",
            TypeOf => "typeof",
            Delete => "delete",
            Await => "await",
            Void => "void",
        }
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOperator::PostIncrement | UnaryOperator::PostDecrement)
    }

    /// Keyword operators are separated from their operand by a space.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            UnaryOperator::TypeOf | UnaryOperator::Delete | UnaryOperator::Await | UnaryOperator::Void
        )
    }
}

/// Kind-specific payload of a UST node. Children are arena indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NodeKind {
    // Tokens
    Identifier { name: String },
    TypeToken { name: String },
    StringLiteral { text: String },
    IntLiteral { value: i64 },
    FloatLiteral { value: f64 },
    BooleanLiteral { value: bool },
    NullLiteral,
    Comment { text: String },

    // Expressions
    BinaryOperator {
        left: NodeId,
        operator: BinaryOperator,
        right: NodeId,
    },
    UnaryOperator {
        operator: UnaryOperator,
        operand: NodeId,
    },
    Assignment {
        left: NodeId,
        #[serde(default)]
        right: Option<NodeId>,
    },
    MemberReference {
        target: NodeId,
        name: NodeId,
    },
    Indexer {
        target: NodeId,
        arguments: NodeId,
    },
    Invocation {
        target: NodeId,
        arguments: NodeId,
    },
    ObjectCreate {
        #[serde(rename = "type")]
        type_name: NodeId,
        arguments: NodeId,
    },
    BaseReference,
    MultipleExpressions { expressions: Vec<NodeId> },

    // Statements
    Block { statements: Vec<NodeId> },
    ExpressionStatement { expression: NodeId },
    TryCatch {
        try_block: NodeId,
        #[serde(default)]
        catch_clauses: Vec<NodeId>,
        #[serde(default)]
        finally_block: Option<NodeId>,
    },
    CatchClause {
        #[serde(default)]
        exception_type: Option<NodeId>,
        #[serde(default)]
        variable: Option<NodeId>,
        body: NodeId,
    },
    With {
        expression: NodeId,
        statement: NodeId,
    },

    // Collections
    Args { arguments: Vec<NodeId> },
    Statements { statements: Vec<NodeId> },

    // Declarations
    Class {
        name: NodeId,
        #[serde(default)]
        base_types: Vec<NodeId>,
        #[serde(default)]
        members: Vec<NodeId>,
    },
    Method {
        name: NodeId,
        #[serde(default)]
        parameters: Vec<NodeId>,
        #[serde(default)]
        body: Option<NodeId>,
    },
    Constructor {
        name: NodeId,
        #[serde(default)]
        parameters: Vec<NodeId>,
        #[serde(default)]
        body: Option<NodeId>,
    },
    Field {
        #[serde(default)]
        field_type: Option<NodeId>,
        variables: Vec<NodeId>,
    },
    Parameter {
        #[serde(default)]
        param_type: Option<NodeId>,
        name: NodeId,
        #[serde(default)]
        initializer: Option<NodeId>,
    },
    Variable {
        name: NodeId,
        #[serde(default)]
        initializer: Option<NodeId>,
    },
}

impl NodeKind {
    pub fn category(&self) -> NodeCategory {
        use NodeKind::*;
        match self {
            Identifier { .. }
            | TypeToken { .. }
            | StringLiteral { .. }
            | IntLiteral { .. }
            | FloatLiteral { .. }
            | BooleanLiteral { .. }
            | NullLiteral
            | Comment { .. } => NodeCategory::Token,
            BinaryOperator { .. }
            | UnaryOperator { .. }
            | Assignment { .. }
            | MemberReference { .. }
            | Indexer { .. }
            | Invocation { .. }
            | ObjectCreate { .. }
            | BaseReference
            | MultipleExpressions { .. } => NodeCategory::Expression,
            Block { .. }
            | ExpressionStatement { .. }
            | TryCatch { .. }
            | CatchClause { .. }
            | With { .. } => NodeCategory::Statement,
            Args { .. } | Statements { .. } => NodeCategory::Collection,
            Class { .. }
            | Method { .. }
            | Constructor { .. }
            | Field { .. }
            | Parameter { .. }
            | Variable { .. } => NodeCategory::Declaration,
        }
    }

    /// Tokens and expressions may stand wherever an expression is expected.
    pub fn is_expression(&self) -> bool {
        matches!(
            self.category(),
            NodeCategory::Token | NodeCategory::Expression
        ) && !matches!(self, NodeKind::Comment { .. })
    }

    pub fn name(&self) -> &'static str {
        use NodeKind::*;
        match self {
            Identifier { .. } => "Identifier",
            TypeToken { .. } => "TypeToken",
            StringLiteral { .. } => "StringLiteral",
            IntLiteral { .. } => "IntLiteral",
            FloatLiteral { .. } => "FloatLiteral",
            BooleanLiteral { .. } => "BooleanLiteral",
            NullLiteral => "NullLiteral",
            Comment { .. } => "Comment",
            BinaryOperator { .. } => "BinaryOperator",
            UnaryOperator { .. } => "UnaryOperator",
            Assignment { .. } => "Assignment",
            MemberReference { .. } => "MemberReference",
            Indexer { .. } => "Indexer",
            Invocation { .. } => "Invocation",
            ObjectCreate { .. } => "ObjectCreate",
            BaseReference => "BaseReference",
            MultipleExpressions { .. } => "MultipleExpressions",
            Block { .. } => "Block",
            ExpressionStatement { .. } => "ExpressionStatement",
            TryCatch { .. } => "TryCatch",
            CatchClause { .. } => "CatchClause",
            With { .. } => "With",
            Args { .. } => "Args",
            Statements { .. } => "Statements",
            Class { .. } => "Class",
            Method { .. } => "Method",
            Constructor { .. } => "Constructor",
            Field { .. } => "Field",
            Parameter { .. } => "Parameter",
            Variable { .. } => "Variable",
        }
    }

    /// Structurally meaningful children, in source order.
    pub fn children(&self) -> Vec<NodeId> {
        use NodeKind::*;
        match self {
            Identifier { .. }
            | TypeToken { .. }
            | StringLiteral { .. }
            | IntLiteral { .. }
            | FloatLiteral { .. }
            | BooleanLiteral { .. }
            | NullLiteral
            | Comment { .. }
            | BaseReference => Vec::new(),
            BinaryOperator { left, right, .. } => vec![*left, *right],
            UnaryOperator { operand, .. } => vec![*operand],
            Assignment { left, right } => std::iter::once(*left).chain(*right).collect(),
            MemberReference { target, name } => vec![*target, *name],
            Indexer { target, arguments } | Invocation { target, arguments } => {
                vec![*target, *arguments]
            }
            ObjectCreate {
                type_name,
                arguments,
            } => vec![*type_name, *arguments],
            MultipleExpressions { expressions } => expressions.clone(),
            Block { statements } | Statements { statements } => statements.clone(),
            ExpressionStatement { expression } => vec![*expression],
            TryCatch {
                try_block,
                catch_clauses,
                finally_block,
            } => std::iter::once(*try_block)
                .chain(catch_clauses.iter().copied())
                .chain(*finally_block)
                .collect(),
            CatchClause {
                exception_type,
                variable,
                body,
            } => exception_type
                .iter()
                .chain(variable.iter())
                .copied()
                .chain(std::iter::once(*body))
                .collect(),
            With {
                expression,
                statement,
            } => vec![*expression, *statement],
            Args { arguments } => arguments.clone(),
            Class {
                name,
                base_types,
                members,
            } => std::iter::once(*name)
                .chain(base_types.iter().copied())
                .chain(members.iter().copied())
                .collect(),
            Method {
                name,
                parameters,
                body,
            }
            | Constructor {
                name,
                parameters,
                body,
            } => std::iter::once(*name)
                .chain(parameters.iter().copied())
                .chain(*body)
                .collect(),
            Field {
                field_type,
                variables,
            } => field_type
                .iter()
                .copied()
                .chain(variables.iter().copied())
                .collect(),
            Parameter {
                param_type,
                name,
                initializer,
            } => param_type
                .iter()
                .copied()
                .chain(std::iter::once(*name))
                .chain(*initializer)
                .collect(),
            Variable { name, initializer } => {
                std::iter::once(*name).chain(*initializer).collect()
            }
        }
    }

    /// Literal text carried by identifier, type, string and comment tokens.
    pub fn token_text(&self) -> Option<&str> {
        match self {
            NodeKind::Identifier { name } | NodeKind::TypeToken { name } => Some(name),
            NodeKind::StringLiteral { text } | NodeKind::Comment { text } => Some(text),
            _ => None,
        }
    }
}

/// One arena slot: kind payload plus its source span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub span: TextSpan,
}

impl Node {
    pub fn new(kind: NodeKind, span: TextSpan) -> Self {
        Self { kind, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_in_source_order() {
        let kind = NodeKind::TryCatch {
            try_block: NodeId(1),
            catch_clauses: vec![NodeId(2), NodeId(3)],
            finally_block: Some(NodeId(4)),
        };
        assert_eq!(
            kind.children(),
            vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4)]
        );

        let assign = NodeKind::Assignment {
            left: NodeId(7),
            right: None,
        };
        assert_eq!(assign.children(), vec![NodeId(7)]);
    }

    #[test]
    fn test_categories() {
        assert_eq!(NodeKind::NullLiteral.category(), NodeCategory::Token);
        assert!(NodeKind::BaseReference.is_expression());
        assert!(!NodeKind::Comment { text: "x".into() }.is_expression());
        assert!(!NodeKind::Block { statements: vec![] }.is_expression());
    }

    #[test]
    fn test_node_json_shape() {
        let node: Node = serde_json::from_str(
            r#"{"kind":"MemberReference","target":1,"name":2,"span":{"start":0,"length":11}}"#,
        )
        .unwrap();
        assert_eq!(node.kind.name(), "MemberReference");
        assert_eq!(node.span, TextSpan::new(0, 11));
        assert_eq!(node.kind.children(), vec![NodeId(1), NodeId(2)]);
    }
}
