//! Arena-backed syntax tree for one source file.

use super::node::{BinaryOperator, Node, NodeId, NodeKind, UnaryOperator};
use crate::error::{MatcherError, Result};
use crate::models::{Language, SourceFile, TextSpan};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Serialized form of a [`RootUst`], as produced by language front-ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UstDocument {
    pub language: Language,
    pub file: SourceFile,
    pub nodes: Vec<Node>,
    pub root: NodeId,
    #[serde(default)]
    pub comments: Vec<NodeId>,
}

/// One file's tree, its comments and its language.
///
/// Nodes live in a flat arena and refer to each other by [`NodeId`]. Parent
/// links are computed once, after the whole tree exists, by
/// [`fill_ascendants`](RootUst::fill_ascendants). Every constructor in this
/// module runs that pass, so a `RootUst` handed out is always complete and is
/// not mutated afterwards.
#[derive(Debug, Clone)]
pub struct RootUst {
    language: Language,
    file: Arc<SourceFile>,
    nodes: Vec<Node>,
    root: NodeId,
    comments: Vec<NodeId>,
    parents: Option<Vec<Option<NodeId>>>,
}

impl RootUst {
    /// Build from a front-end document, rejecting dangling or shared child ids.
    pub fn from_document(document: UstDocument) -> Result<Self> {
        let UstDocument {
            language,
            mut file,
            nodes,
            root,
            comments,
        } = document;
        file.reindex();
        let file_name = file.path.display().to_string();
        let conversion = |reason: String| MatcherError::Conversion {
            file: file_name.clone(),
            reason,
        };

        let count = nodes.len();
        let in_range = |id: NodeId| id.index() < count;
        if !in_range(root) {
            return Err(conversion(format!("root {} out of range ({} nodes)", root, count)));
        }
        if let Some(bad) = comments.iter().find(|id| !in_range(**id)) {
            return Err(conversion(format!("comment {} out of range", bad)));
        }

        let mut seen_parent = vec![false; count];
        for (index, node) in nodes.iter().enumerate() {
            for child in node.kind.children() {
                if !in_range(child) {
                    return Err(conversion(format!(
                        "{} node #{} refers to missing child {}",
                        node.kind.name(),
                        index,
                        child
                    )));
                }
                if child == root || std::mem::replace(&mut seen_parent[child.index()], true) {
                    return Err(conversion(format!("node {} has more than one parent", child)));
                }
            }
        }

        let mut ust = Self {
            language,
            file: Arc::new(file),
            nodes,
            root,
            comments,
            parents: None,
        };
        ust.fill_ascendants();
        Ok(ust)
    }

    /// Parse a JSON [`UstDocument`].
    pub fn from_json(json: &str) -> Result<Self> {
        let document: UstDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn to_document(&self) -> UstDocument {
        UstDocument {
            language: self.language,
            file: (*self.file).clone(),
            nodes: self.nodes.clone(),
            root: self.root,
            comments: self.comments.clone(),
        }
    }

    /// Assign every node its parent.
    ///
    /// # Panics
    ///
    /// Panics if called a second time on the same tree.
    pub fn fill_ascendants(&mut self) {
        assert!(
            self.parents.is_none(),
            "ascendants of {} are already filled",
            self.file
        );
        let mut parents = vec![None; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            for child in node.kind.children() {
                parents[child.index()] = Some(NodeId(index as u32));
            }
        }
        self.parents = Some(parents);
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn file(&self) -> &Arc<SourceFile> {
        &self.file
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Comment tokens. They are not attached to the tree and have no parent.
    pub fn comments(&self) -> &[NodeId] {
        &self.comments
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> TextSpan {
        self.nodes[id.index()].span
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    /// Parent of `id`, `None` for the root and for comments.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents
            .as_ref()
            .and_then(|parents| parents[id.index()])
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Strict descendants of `id` in depth-first pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack = self.children(id);
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// Whether `ancestor` lies on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }
}

pub struct Ancestors<'a> {
    tree: &'a RootUst,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    tree: &'a RootUst,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(current).into_iter().rev());
        Some(current)
    }
}

/// Incremental construction of a [`RootUst`].
///
/// Compound helpers derive their span from their children; leaves take an
/// explicit span.
pub struct UstBuilder {
    language: Language,
    file: SourceFile,
    nodes: Vec<Node>,
    comments: Vec<NodeId>,
}

impl UstBuilder {
    pub fn new(language: Language, file: SourceFile) -> Self {
        Self {
            language,
            file,
            nodes: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn add(&mut self, kind: NodeKind, span: TextSpan) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind, span));
        id
    }

    pub fn span(&self, id: NodeId) -> TextSpan {
        self.nodes[id.index()].span
    }

    fn covering(&self, ids: &[NodeId]) -> TextSpan {
        ids.iter()
            .fold(TextSpan::EMPTY, |acc, id| acc.union(&self.span(*id)))
    }

    fn add_covering(&mut self, kind: NodeKind) -> NodeId {
        let span = self.covering(&kind.children());
        self.add(kind, span)
    }

    pub fn identifier(&mut self, name: &str, span: TextSpan) -> NodeId {
        self.add(NodeKind::Identifier { name: name.to_string() }, span)
    }

    pub fn type_token(&mut self, name: &str, span: TextSpan) -> NodeId {
        self.add(NodeKind::TypeToken { name: name.to_string() }, span)
    }

    pub fn string(&mut self, text: &str, span: TextSpan) -> NodeId {
        self.add(NodeKind::StringLiteral { text: text.to_string() }, span)
    }

    pub fn int(&mut self, value: i64, span: TextSpan) -> NodeId {
        self.add(NodeKind::IntLiteral { value }, span)
    }

    pub fn boolean(&mut self, value: bool, span: TextSpan) -> NodeId {
        self.add(NodeKind::BooleanLiteral { value }, span)
    }

    pub fn null(&mut self, span: TextSpan) -> NodeId {
        self.add(NodeKind::NullLiteral, span)
    }

    /// Add a comment token to the file's comment list.
    pub fn comment(&mut self, text: &str, span: TextSpan) -> NodeId {
        let id = self.add(NodeKind::Comment { text: text.to_string() }, span);
        self.comments.push(id);
        id
    }

    pub fn member_ref(&mut self, target: NodeId, name: NodeId) -> NodeId {
        self.add_covering(NodeKind::MemberReference { target, name })
    }

    pub fn args(&mut self, arguments: Vec<NodeId>) -> NodeId {
        self.add_covering(NodeKind::Args { arguments })
    }

    pub fn invocation(&mut self, target: NodeId, arguments: Vec<NodeId>, span: TextSpan) -> NodeId {
        let arguments = self.args(arguments);
        self.add(NodeKind::Invocation { target, arguments }, span)
    }

    pub fn binary(&mut self, left: NodeId, operator: BinaryOperator, right: NodeId) -> NodeId {
        self.add_covering(NodeKind::BinaryOperator {
            left,
            operator,
            right,
        })
    }

    pub fn unary(&mut self, operator: UnaryOperator, operand: NodeId, span: TextSpan) -> NodeId {
        self.add(NodeKind::UnaryOperator { operator, operand }, span)
    }

    pub fn assign(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.add_covering(NodeKind::Assignment {
            left,
            right: Some(right),
        })
    }

    pub fn expression_statement(&mut self, expression: NodeId) -> NodeId {
        self.add_covering(NodeKind::ExpressionStatement { expression })
    }

    pub fn block(&mut self, statements: Vec<NodeId>, span: TextSpan) -> NodeId {
        self.add(NodeKind::Block { statements }, span)
    }

    pub fn catch_clause(&mut self, exception_type: Option<NodeId>, body: NodeId, span: TextSpan) -> NodeId {
        self.add(
            NodeKind::CatchClause {
                exception_type,
                variable: None,
                body,
            },
            span,
        )
    }

    pub fn try_catch(&mut self, try_block: NodeId, catch_clauses: Vec<NodeId>) -> NodeId {
        self.add_covering(NodeKind::TryCatch {
            try_block,
            catch_clauses,
            finally_block: None,
        })
    }

    pub fn statements(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.add_covering(NodeKind::Statements { statements })
    }

    /// Finish the tree rooted at `root` and fill its ascendants.
    ///
    /// # Panics
    ///
    /// Panics if the arena is not a tree (a dangling or shared child id).
    pub fn build(self, root: NodeId) -> RootUst {
        let document = UstDocument {
            language: self.language,
            file: self.file,
            nodes: self.nodes,
            root,
            comments: self.comments,
        };
        match RootUst::from_document(document) {
            Ok(ust) => ust,
            Err(e) => panic!("builder produced an invalid tree: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (RootUst, NodeId, NodeId, NodeId) {
        let mut b = UstBuilder::new(Language::JavaScript, SourceFile::new("a.js", "window.name;"));
        let window = b.identifier("window", TextSpan::new(0, 6));
        let name = b.identifier("name", TextSpan::new(7, 4));
        let member = b.member_ref(window, name);
        let stmt = b.expression_statement(member);
        let root = b.statements(vec![stmt]);
        (b.build(root), window, member, root)
    }

    #[test]
    fn test_parents_filled_by_builder() {
        let (ust, window, member, root) = sample();
        assert_eq!(ust.parent(window), Some(member));
        assert_eq!(ust.parent(root), None);
        assert!(ust.is_ancestor(root, window));
        assert!(!ust.is_ancestor(window, root));
        assert_eq!(ust.span(member), TextSpan::new(0, 11));
    }

    #[test]
    fn test_descendants_pre_order() {
        let (ust, window, member, root) = sample();
        let order: Vec<NodeId> = ust.descendants(root).collect();
        assert_eq!(order.len(), 4);
        assert_eq!(order[1], member);
        assert_eq!(order[2], window);
        assert!(!order.contains(&root));
    }

    #[test]
    #[should_panic(expected = "already filled")]
    fn test_second_ascendant_pass_panics() {
        let (mut ust, ..) = sample();
        ust.fill_ascendants();
    }

    #[test]
    fn test_document_rejects_dangling_child() {
        let json = r#"{
            "language": "javascript",
            "file": {"path": "x.js"},
            "nodes": [{"kind": "Statements", "statements": [5]}],
            "root": 0
        }"#;
        let err = RootUst::from_json(json).unwrap_err();
        assert!(matches!(err, MatcherError::Conversion { .. }));
    }

    #[test]
    fn test_document_rejects_shared_child() {
        let json = r#"{
            "language": "javascript",
            "file": {"path": "x.js"},
            "nodes": [
                {"kind": "Statements", "statements": [1, 1]},
                {"kind": "NullLiteral"}
            ],
            "root": 0
        }"#;
        assert!(RootUst::from_json(json).is_err());
    }

    #[test]
    fn test_document_round_trip_keeps_structure() {
        let (ust, window, ..) = sample();
        let json = serde_json::to_string(&ust.to_document()).unwrap();
        let back = RootUst::from_json(&json).unwrap();
        assert_eq!(back.len(), ust.len());
        assert_eq!(back.kind(window).token_text(), Some("window"));
        assert_eq!(back.file().line_column(7), (1, 8));
    }
}
