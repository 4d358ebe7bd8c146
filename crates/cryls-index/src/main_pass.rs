//! Pass 3: members and edges.
//!
//! Attaches methods (with computed arity and class-method flag), enum
//! members, include edges, alias definitions and instance/class variable
//! declarations to the type shells, and records the dependency edges that
//! method signatures introduce. Macro calls are not re-expanded here - the
//! macro pass already created the generated members.

use cryls_ast::node::{Node, NodeKind};
use cryls_ast::visitor::{VisitControl, Visitor, walk};
use cryls_common::position::Range;

use crate::element::{
    AliasElement, ClassVarElement, ElementCommon, EnumMemberElement, InstanceVarElement,
    MethodElement, PsiElement,
};
use crate::index::{SemanticIndex, TypeKind};
use crate::macro_registry::arity_of;
use crate::pipeline::qualify;
use crate::typeref::TypeRef;

pub(crate) fn run(index: &mut SemanticIndex, tree: &Node, root_owner: Option<&str>) {
    let mut owners = Vec::new();
    if let Some(owner) = root_owner.filter(|owner| !owner.is_empty()) {
        let kind = owner_kind(index, owner);
        owners.push((owner.to_string(), kind));
    }
    let mut pass = MainPass { index, owners };
    walk(tree, &mut pass);
}

fn owner_kind(index: &SemanticIndex, name: &str) -> TypeKind {
    match index.find_type(name) {
        Some((_, PsiElement::Module(_))) => TypeKind::Module,
        Some((_, PsiElement::Enum(_))) => TypeKind::Enum,
        _ => TypeKind::Class,
    }
}

struct MainPass<'a> {
    index: &'a mut SemanticIndex,
    owners: Vec<(String, TypeKind)>,
}

impl<'tree> Visitor<'tree> for MainPass<'_> {
    fn visit(&mut self, node: &'tree Node) -> VisitControl {
        match &node.kind {
            NodeKind::ModuleDef { name, .. } => self.enter_type(name, TypeKind::Module),
            NodeKind::ClassDef { name, .. } => self.enter_type(name, TypeKind::Class),
            NodeKind::EnumDef { name, .. } => self.enter_type(name, TypeKind::Enum),
            NodeKind::Def { .. } => {
                self.attach_method(node);
                VisitControl::Skip
            }
            NodeKind::Include { name } => {
                self.attach_include(name);
                VisitControl::Skip
            }
            NodeKind::AliasDef { name, value } => {
                self.attach_alias(node, name, value);
                VisitControl::Skip
            }
            NodeKind::TypeDeclaration {
                var, declared_type, ..
            } => {
                self.attach_var_declaration(node, var, declared_type);
                VisitControl::Skip
            }
            NodeKind::Arg { name, .. } => {
                // Enum member (Arg nodes only surface here inside enum
                // bodies; parameters live behind Def which is not entered).
                if let Some((owner, TypeKind::Enum)) = self.owners.last().cloned() {
                    self.attach_enum_member(node, &owner, name);
                }
                VisitControl::Skip
            }
            NodeKind::Call { .. } | NodeKind::MacroDef { .. } => VisitControl::Skip,
            _ => VisitControl::Descend,
        }
    }

    fn leave(&mut self, node: &'tree Node) {
        if node.is_type_definition() {
            self.owners.pop();
        }
    }
}

impl MainPass<'_> {
    fn current_owner(&self) -> Option<&str> {
        self.owners.last().map(|(name, _)| name.as_str())
    }

    fn enter_type(&mut self, name: &Node, kind: TypeKind) -> VisitControl {
        let spelled = name.path_full().unwrap_or_default();
        let qualified = qualify(self.current_owner(), &spelled);
        self.owners.push((qualified, kind));
        VisitControl::Descend
    }

    fn attach_method(&mut self, node: &Node) {
        let NodeKind::Def {
            name,
            receiver,
            args,
            splat_index,
            return_type,
            ..
        } = &node.kind
        else {
            return;
        };
        let owner = self.current_owner().unwrap_or("").to_string();
        let class_method = receiver.is_some();

        let params: Vec<String> = args
            .iter()
            .filter_map(|arg| match &arg.kind {
                NodeKind::Arg { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect();

        let return_ref = return_type.as_deref().and_then(TypeRef::from_node);
        let return_str = return_ref.as_ref().map(TypeRef::display);

        // Signature references feed the dependency graph.
        if let Some(reference) = &return_ref {
            self.record_signature_dependency(&owner, reference);
        }
        for arg in args {
            if let NodeKind::Arg {
                restriction: Some(restriction),
                ..
            } = &arg.kind
            {
                if let Some(reference) = TypeRef::from_node(restriction) {
                    self.record_signature_dependency(&owner, &reference);
                }
            }
        }

        let element = PsiElement::Method(MethodElement {
            common: self.common_for(node, name),
            owner,
            arity: arity_of(args, *splat_index),
            class_method,
            params,
            return_type: return_ref,
            return_type_str: return_str,
        });
        self.index.add_element(element);
    }

    fn attach_include(&mut self, name: &Node) {
        let Some((owner, kind)) = self.owners.last().cloned() else {
            return;
        };
        let Some(reference) = TypeRef::from_node(name) else {
            return;
        };
        if let Some(base) = reference.base_name() {
            let target = self
                .index
                .resolve_type_name(base, Some(&owner))
                .unwrap_or_else(|| base.trim_start_matches("::").to_string());
            self.index.add_dependency(&owner, &target);
        }
        self.index.add_include(&owner, kind, reference);
    }

    fn attach_alias(&mut self, node: &Node, name: &Node, value: &Node) {
        let spelled = name.path_full().unwrap_or_default();
        let qualified = qualify(self.current_owner(), &spelled);
        let target = TypeRef::from_node(value);
        if let Some(reference) = &target {
            let owner = self.current_owner().unwrap_or("").to_string();
            self.record_signature_dependency(&owner, reference);
        }
        let element = PsiElement::Alias(AliasElement {
            common: ElementCommon {
                file: Some(self.index.current_file_or_empty()),
                name: qualified,
                location: name.range().or_else(|| node.range()),
                doc: node.doc.clone(),
            },
            owner: self.current_owner().map(str::to_string),
            target,
        });
        self.index.add_element(element);
    }

    fn attach_var_declaration(&mut self, node: &Node, var: &Node, declared_type: &Node) {
        let Some(owner) = self.current_owner().map(str::to_string) else {
            return;
        };
        let type_string = TypeRef::from_node(declared_type).map(|reference| reference.display());
        let element = match &var.kind {
            NodeKind::InstanceVar { name } => PsiElement::InstanceVar(InstanceVarElement {
                common: self.common_for(node, name),
                owner,
                type_string,
            }),
            NodeKind::ClassVar { name } => PsiElement::ClassVar(ClassVarElement {
                common: self.common_for(node, name),
                owner,
                type_string,
            }),
            _ => return,
        };
        self.index.add_element(element);
    }

    fn attach_enum_member(&mut self, node: &Node, owner: &str, name: &str) {
        let element = PsiElement::EnumMember(EnumMemberElement {
            common: self.common_for(node, name),
            owner: owner.to_string(),
        });
        self.index.add_element(element);
    }

    fn common_for(&self, node: &Node, name: &str) -> ElementCommon {
        let location: Option<Range> = node.name_range().or_else(|| node.range());
        ElementCommon {
            file: Some(self.index.current_file_or_empty()),
            name: name.to_string(),
            location,
            doc: node.doc.clone(),
        }
    }

    fn record_signature_dependency(&mut self, owner: &str, reference: &TypeRef) {
        let mut names = Vec::new();
        collect_type_names(reference, &mut names);
        for base in names {
            if base == "self" {
                continue;
            }
            let context = (!owner.is_empty()).then_some(owner);
            let target = self
                .index
                .resolve_type_name(&base, context)
                .unwrap_or_else(|| base.trim_start_matches("::").to_string());
            self.index.add_dependency(owner, &target);
        }
    }
}

fn collect_type_names(reference: &TypeRef, out: &mut Vec<String>) {
    match reference {
        TypeRef::Named { name, args } => {
            out.push(name.clone());
            for arg in args {
                collect_type_names(arg, out);
            }
        }
        TypeRef::Union(members) => {
            for member in members {
                collect_type_names(member, out);
            }
        }
    }
}
