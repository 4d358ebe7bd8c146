//! Document highlights.
//!
//! Same-name occurrence collection: locals within the enclosing method,
//! instance/class variables within the enclosing type body, paths across
//! the whole document. Nested definitions are never entered and ranges are
//! deduplicated.

use cryls_ast::node::{Node, NodeKind};
use cryls_ast::visitor::{VisitControl, Visitor, walk};
use cryls_common::position::Range;

use crate::analysis::Analysis;

/// Ranges of every occurrence of the symbol under the cursor.
#[must_use]
pub fn document_highlights(analysis: &Analysis<'_>) -> Vec<Range> {
    let Some(node) = analysis.ctx.node else {
        return Vec::new();
    };

    let mut ranges = match &node.kind {
        NodeKind::Var { name } | NodeKind::Arg { name, .. } => {
            let Some(def) = analysis.ctx.enclosing_def else {
                return Vec::new();
            };
            let mut collector = LocalOccurrences {
                name,
                entered_root: false,
                out: Vec::new(),
            };
            walk(def, &mut collector);
            collector.out
        }
        NodeKind::InstanceVar { name } | NodeKind::ClassVar { name } => {
            let scope = analysis
                .ctx
                .enclosing_class
                .or_else(|| {
                    analysis
                        .ctx
                        .full_path()
                        .into_iter()
                        .rev()
                        .find(|node| node.is_type_definition())
                })
                .unwrap_or(analysis.root);
            // When the scope is the file itself, nested type bodies stay
            // out of range.
            let mut collector = VariableOccurrences {
                name,
                entered_root: !scope.is_type_definition(),
                out: Vec::new(),
            };
            walk(scope, &mut collector);
            collector.out
        }
        NodeKind::Path { .. } => {
            let Some(wanted) = node.path_full() else {
                return Vec::new();
            };
            let mut collector = PathOccurrences {
                wanted,
                out: Vec::new(),
            };
            walk(analysis.root, &mut collector);
            collector.out
        }
        _ => Vec::new(),
    };

    ranges.sort_by_key(|range| (range.start, range.end));
    ranges.dedup();
    ranges
}

fn push_range(node: &Node, out: &mut Vec<Range>) {
    if let Some(range) = node.name_range().or_else(|| node.range()) {
        out.push(range);
    }
}

/// Var/Arg occurrences inside one method, nested definitions excluded.
struct LocalOccurrences<'n> {
    name: &'n str,
    entered_root: bool,
    out: Vec<Range>,
}

impl<'tree> Visitor<'tree> for LocalOccurrences<'_> {
    fn visit(&mut self, node: &'tree Node) -> VisitControl {
        match &node.kind {
            NodeKind::Def { .. } if !self.entered_root => {
                self.entered_root = true;
                VisitControl::Descend
            }
            NodeKind::Def { .. }
            | NodeKind::ClassDef { .. }
            | NodeKind::ModuleDef { .. }
            | NodeKind::EnumDef { .. }
            | NodeKind::MacroDef { .. } => VisitControl::Skip,
            NodeKind::Var { name } if name == self.name => {
                push_range(node, &mut self.out);
                VisitControl::Skip
            }
            NodeKind::Arg { name, .. } if name == self.name => {
                push_range(node, &mut self.out);
                VisitControl::Skip
            }
            _ => VisitControl::Descend,
        }
    }
}

/// Instance/class-variable occurrences inside a type body.
struct VariableOccurrences<'n> {
    name: &'n str,
    entered_root: bool,
    out: Vec<Range>,
}

impl<'tree> Visitor<'tree> for VariableOccurrences<'_> {
    fn visit(&mut self, node: &'tree Node) -> VisitControl {
        match &node.kind {
            NodeKind::ClassDef { .. } | NodeKind::ModuleDef { .. } | NodeKind::EnumDef { .. }
                if !self.entered_root =>
            {
                self.entered_root = true;
                VisitControl::Descend
            }
            NodeKind::ClassDef { .. }
            | NodeKind::ModuleDef { .. }
            | NodeKind::EnumDef { .. }
            | NodeKind::MacroDef { .. } => VisitControl::Skip,
            NodeKind::InstanceVar { name } | NodeKind::ClassVar { name }
                if name == self.name =>
            {
                push_range(node, &mut self.out);
                VisitControl::Skip
            }
            _ => VisitControl::Descend,
        }
    }
}

/// Same-qualified, same-globality path occurrences across the program.
struct PathOccurrences {
    wanted: String,
    out: Vec<Range>,
}

impl<'tree> Visitor<'tree> for PathOccurrences {
    fn visit(&mut self, node: &'tree Node) -> VisitControl {
        if let NodeKind::Path { .. } = &node.kind {
            if node.path_full().as_deref() == Some(self.wanted.as_str()) {
                push_range(node, &mut self.out);
            }
        }
        VisitControl::Descend
    }
}
