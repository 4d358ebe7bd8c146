//! Cursor-to-node resolution.
//!
//! Walks the tree and records the innermost node whose name range
//! (preferred) or full range (fallback) contains the cursor, the ancestor
//! path to it, the node with the largest end location at-or-before the
//! cursor (for cursors past the last token, e.g. after `Foo.`), and the
//! enclosing definition context. The traversal never prunes, so `When`
//! branches are descended and inner expressions can match even when the
//! branch range itself would not.

use cryls_ast::node::{Node, NodeKind};
use cryls_ast::visitor::{VisitControl, Visitor, walk};
use cryls_common::position::Position;
use cryls_index::qualify;

/// Everything the query providers need to know about a cursor position.
#[derive(Debug, Default)]
pub struct NodeContext<'a> {
    /// Innermost node under the cursor
    pub node: Option<&'a Node>,
    /// Ancestors of `node`, outermost first (excluding `node` itself)
    pub node_path: Vec<&'a Node>,
    /// Node with the largest end location `<=` cursor
    pub previous_node: Option<&'a Node>,
    pub previous_node_path: Vec<&'a Node>,
    /// Innermost `Def` whose range contains the cursor
    pub enclosing_def: Option<&'a Node>,
    /// Innermost `ClassDef` whose range contains the cursor
    pub enclosing_class: Option<&'a Node>,
    /// Qualified name of the innermost enclosing Module/Class/Enum chain
    pub context_path: Option<String>,
}

impl<'a> NodeContext<'a> {
    /// The context path as a `&str`, empty at file level.
    #[must_use]
    pub fn context(&self) -> &str {
        self.context_path.as_deref().unwrap_or("")
    }

    /// `node` and its ancestors, outermost first.
    #[must_use]
    pub fn full_path(&self) -> Vec<&'a Node> {
        let mut path = self.node_path.clone();
        if let Some(node) = self.node {
            path.push(node);
        }
        path
    }
}

/// Locate the cursor inside `root`.
#[must_use]
pub fn find_node_at<'a>(root: &'a Node, position: Position) -> NodeContext<'a> {
    let mut finder = Finder {
        position,
        ctx: NodeContext::default(),
        previous_end: None,
        stack: Vec::new(),
        context_names: Vec::new(),
    };
    walk(root, &mut finder);
    finder.ctx
}

struct Finder<'a> {
    position: Position,
    ctx: NodeContext<'a>,
    previous_end: Option<Position>,
    stack: Vec<&'a Node>,
    context_names: Vec<String>,
}

impl<'a> Finder<'a> {
    /// Whether `node` opens a context scope containing the cursor.
    fn opens_context(&self, node: &Node) -> bool {
        node.range().is_some_and(|range| range.contains(self.position))
            && node.is_type_definition()
            && node
                .type_definition_name()
                .and_then(Node::path_full)
                .is_some()
    }
}

impl<'a> Visitor<'a> for Finder<'a> {
    fn visit(&mut self, node: &'a Node) -> VisitControl {
        // Track the closest node ending at or before the cursor; with equal
        // ends the deeper node wins because children are visited later.
        if let Some(end) = node.end_location {
            if end <= self.position && self.previous_end.is_none_or(|prev| end >= prev) {
                self.previous_end = Some(end);
                self.ctx.previous_node = Some(node);
                self.ctx.previous_node_path = self.stack.clone();
            }
        }

        let name_hit = node.name_range().is_some_and(|range| range.contains(self.position));
        let full_hit = node.range().is_some_and(|range| range.contains(self.position));

        if name_hit || full_hit {
            self.ctx.node = Some(node);
            self.ctx.node_path = self.stack.clone();
        }

        if full_hit {
            match &node.kind {
                NodeKind::Def { .. } => self.ctx.enclosing_def = Some(node),
                NodeKind::ClassDef { .. } => {
                    self.ctx.enclosing_class = Some(node);
                }
                _ => {}
            }
        }
        if self.opens_context(node) {
            if let Some(spelled) = node.type_definition_name().and_then(Node::path_full) {
                let owner = self.context_names.last().map(String::as_str);
                self.context_names.push(qualify(owner, &spelled));
                self.ctx.context_path = self.context_names.last().cloned();
            }
        }

        self.stack.push(node);
        VisitControl::Descend
    }

    fn leave(&mut self, node: &'a Node) {
        self.stack.pop();
        if self.opens_context(node) {
            self.context_names.pop();
        }
    }
}
