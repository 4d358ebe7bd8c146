//! Pass 1: type skeletons.
//!
//! Materializes shell elements for every module, class and enum so that
//! later passes (macro expansion in particular) can attach members to types
//! that appear further down the file or in other files. Superclass nodes
//! are recorded unresolved. Method and macro bodies are not entered.

use cryls_ast::node::{Node, NodeKind};
use cryls_ast::visitor::{VisitControl, Visitor, walk};

use crate::index::{SemanticIndex, TypeKind};
use crate::pipeline::qualify;
use crate::typeref::TypeRef;

pub(crate) fn run(index: &mut SemanticIndex, tree: &Node, root_owner: Option<&str>) {
    let mut pass = SkeletonPass {
        index,
        owners: root_owner
            .filter(|owner| !owner.is_empty())
            .map(|owner| vec![owner.to_string()])
            .unwrap_or_default(),
    };
    walk(tree, &mut pass);
}

struct SkeletonPass<'a> {
    index: &'a mut SemanticIndex,
    owners: Vec<String>,
}

impl<'tree> Visitor<'tree> for SkeletonPass<'_> {
    fn visit(&mut self, node: &'tree Node) -> VisitControl {
        match &node.kind {
            NodeKind::ModuleDef { name, .. } => {
                let qualified = self.add_type(node, name, TypeKind::Module, Vec::new());
                self.owners.push(qualified);
                VisitControl::Descend
            }
            NodeKind::ClassDef {
                name,
                superclass,
                type_vars,
                ..
            } => {
                let qualified = self.add_type(node, name, TypeKind::Class, type_vars.clone());
                if let Some(superclass) = superclass {
                    if let Some(reference) = TypeRef::from_node(superclass) {
                        self.record_superclass(&qualified, reference);
                    }
                }
                self.owners.push(qualified);
                VisitControl::Descend
            }
            NodeKind::EnumDef { name, .. } => {
                // Enum bodies hold members and methods only; nothing for
                // this pass.
                self.add_type(node, name, TypeKind::Enum, Vec::new());
                VisitControl::Skip
            }
            NodeKind::Def { .. } | NodeKind::MacroDef { .. } => VisitControl::Skip,
            _ => VisitControl::Descend,
        }
    }

    fn leave(&mut self, node: &'tree Node) {
        if matches!(
            node.kind,
            NodeKind::ModuleDef { .. } | NodeKind::ClassDef { .. }
        ) {
            self.owners.pop();
        }
    }
}

impl SkeletonPass<'_> {
    fn add_type(
        &mut self,
        node: &Node,
        name: &Node,
        kind: TypeKind,
        type_vars: Vec<String>,
    ) -> String {
        let spelled = name.path_full().unwrap_or_default();
        let owner = self.owners.last().cloned();
        let qualified = qualify(owner.as_deref(), &spelled);
        let location = name.range().or_else(|| node.range());
        self.index.add_type_definition(
            &qualified,
            kind,
            owner.as_deref(),
            location,
            type_vars,
            node.doc.clone(),
        );
        qualified
    }

    fn record_superclass(&mut self, class_name: &str, reference: TypeRef) {
        // The dependency edge uses the resolved name when the target is
        // already known, otherwise the syntactically plausible spelling.
        if let Some(base) = reference.base_name() {
            let target = self
                .index
                .resolve_type_name(base, Some(class_name))
                .unwrap_or_else(|| base.trim_start_matches("::").to_string());
            self.index.add_dependency(class_name, &target);
        }
        self.index.set_superclass(class_name, reference);
    }
}
