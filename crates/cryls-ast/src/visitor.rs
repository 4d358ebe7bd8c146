//! Tree traversal.
//!
//! A single `visit` entry point pattern-matches on the node kind and
//! returns a recursion-control decision instead of a per-kind overload
//! set. The indexing passes and the cursor-side collectors all run through
//! `walk`; the `'tree` parameter lets collectors keep references into the
//! tree they are walking.

use crate::node::Node;

/// Whether traversal continues into a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    Descend,
    Skip,
}

pub trait Visitor<'tree> {
    /// Called on every node, pre-order. Return `Skip` to prune the subtree.
    fn visit(&mut self, node: &'tree Node) -> VisitControl;

    /// Called after a node's subtree has been traversed (also when the
    /// subtree was skipped).
    fn leave(&mut self, _node: &'tree Node) {}
}

/// Walk `node` and its subtree.
pub fn walk<'tree, V: Visitor<'tree> + ?Sized>(node: &'tree Node, visitor: &mut V) {
    if visitor.visit(node) == VisitControl::Descend {
        for child in node.children() {
            walk(child, visitor);
        }
    }
    visitor.leave(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make;
    use crate::node::NodeKind;

    struct NameCollector {
        names: Vec<String>,
        skip_defs: bool,
    }

    impl<'tree> Visitor<'tree> for NameCollector {
        fn visit(&mut self, node: &'tree Node) -> VisitControl {
            if let Some(name) = node.name_str() {
                self.names.push(name.to_string());
            }
            if self.skip_defs && matches!(node.kind, NodeKind::Def { .. }) {
                return VisitControl::Skip;
            }
            VisitControl::Descend
        }
    }

    #[test]
    fn walk_visits_nested_nodes() {
        let tree = make::class_def(
            make::path(&["Foo"]),
            None,
            &[],
            vec![make::def_node(
                "bar",
                vec![],
                vec![make::call(None, "puts", vec![])],
            )],
        );
        let mut collector = NameCollector {
            names: Vec::new(),
            skip_defs: false,
        };
        walk(&tree, &mut collector);
        assert_eq!(collector.names, vec!["bar", "puts"]);
    }

    #[test]
    fn skip_prunes_subtrees() {
        let tree = make::class_def(
            make::path(&["Foo"]),
            None,
            &[],
            vec![make::def_node(
                "bar",
                vec![],
                vec![make::call(None, "puts", vec![])],
            )],
        );
        let mut collector = NameCollector {
            names: Vec::new(),
            skip_defs: true,
        };
        walk(&tree, &mut collector);
        assert_eq!(collector.names, vec!["bar"]);
    }
}
