//! The definition resolver.
//!
//! Maps the node under the cursor to PSI elements. Dispatch is on the node
//! kind; method lookup is ancestor-aware and alias-following, and arity is
//! applied loosely at the end - when nothing matches, all same-named
//! candidates come back, because the user may be mid-edit.

use cryls_ast::node::{Node, NodeKind};
use cryls_ast::visitor::{VisitControl, Visitor, walk};
use cryls_common::position::{Position, Range};
use cryls_index::{
    ElementCommon, ElementId, InstanceVarElement, LocalVarElement, PsiElement, TypeRef,
};

use crate::analysis::Analysis;
use crate::infer::infer_type;

/// Resolve the definition(s) for the cursor in `analysis`.
#[must_use]
pub fn resolve_definition(analysis: &Analysis<'_>) -> Vec<PsiElement> {
    let Some(node) = analysis.ctx.node else {
        return Vec::new();
    };

    match &node.kind {
        NodeKind::Def { name, .. } => {
            let context = analysis.ctx.context();
            ids_to_elements(
                analysis,
                analysis.index.methods_on(context, Some(name), None),
            )
        }
        NodeKind::Var { name } => resolve_local_var(analysis, name),
        NodeKind::InstanceVar { name } => resolve_instance_var(analysis, name),
        NodeKind::Call { .. } => ids_to_elements(analysis, call_candidates(analysis, node)),
        NodeKind::Path { .. } => resolve_path(analysis, node),
        NodeKind::Generic { name, .. } => resolve_path(analysis, name),
        _ => Vec::new(),
    }
}

fn ids_to_elements(analysis: &Analysis<'_>, ids: Vec<ElementId>) -> Vec<PsiElement> {
    ids.into_iter()
        .filter_map(|id| analysis.index.element(id).cloned())
        .collect()
}

// ===== Calls =====

/// Candidate methods for a call node, following the receiver dispatch rules
/// and ending with a loose arity filter.
#[must_use]
pub fn call_candidates(analysis: &Analysis<'_>, call: &Node) -> Vec<ElementId> {
    let NodeKind::Call {
        args, named_args, ..
    } = &call.kind
    else {
        return Vec::new();
    };
    let arg_count = u32::try_from(args.len() + named_args.len()).unwrap_or(u32::MAX);
    loose_arity_filter(analysis, call_candidates_unfiltered(analysis, call), arg_count)
}

/// The same dispatch without the final arity filter; signature help lists
/// every same-named overload and only uses arity to pick the active one.
#[must_use]
pub fn call_candidates_unfiltered(analysis: &Analysis<'_>, call: &Node) -> Vec<ElementId> {
    let NodeKind::Call {
        obj,
        name,
        args,
        named_args,
        ..
    } = &call.kind
    else {
        return Vec::new();
    };
    let arg_count = u32::try_from(args.len() + named_args.len()).unwrap_or(u32::MAX);
    let index = analysis.index;

    match obj.as_deref() {
        Some(receiver) if matches!(receiver.kind, NodeKind::SelfLiteral) => {
            let context = analysis.ctx.context();
            index.methods_on(context, Some(name), Some(analysis.in_class_method()))
        }
        Some(receiver)
            if matches!(
                receiver.kind,
                NodeKind::Path { .. } | NodeKind::Generic { .. } | NodeKind::Metaclass { .. }
            ) =>
        {
            let Some(owner) = TypeRef::from_node(receiver)
                .and_then(|reference| index.resolve_typeref(&reference, analysis.context()))
            else {
                return Vec::new();
            };
            if name == "new" {
                return constructor_candidates(analysis, &owner, arg_count);
            }
            index.methods_on(&owner, Some(name), Some(true))
        }
        Some(receiver)
            if matches!(
                receiver.kind,
                NodeKind::Var { .. } | NodeKind::InstanceVar { .. } | NodeKind::ClassVar { .. }
            ) =>
        {
            let Some(owner) = analysis
                .env
                .lookup(receiver)
                .and_then(|reference| index.resolve_typeref(reference, analysis.context()))
            else {
                return Vec::new();
            };
            index.methods_on(&owner, Some(name), Some(false))
        }
        Some(receiver) => {
            let Some(owner) = infer_type(analysis, receiver, 0)
                .and_then(|reference| index.resolve_typeref(&reference, analysis.context()))
            else {
                return Vec::new();
            };
            index.methods_on(&owner, Some(name), Some(false))
        }
        None => {
            let context = analysis.ctx.context();
            index.methods_on(context, Some(name), Some(analysis.in_class_method()))
        }
    }
}

/// `Type.new(...)`: strict-arity class-method `new` first, then instance
/// `initialize` with matching arity, then every `initialize`.
fn constructor_candidates(
    analysis: &Analysis<'_>,
    owner: &str,
    arg_count: u32,
) -> Vec<ElementId> {
    let index = analysis.index;
    let strict_new: Vec<ElementId> = index
        .methods_on(owner, Some("new"), Some(true))
        .into_iter()
        .filter(|&id| admits(analysis, id, arg_count))
        .collect();
    if !strict_new.is_empty() {
        return strict_new;
    }

    let initialize = index.methods_on(owner, Some("initialize"), Some(false));
    let strict_init: Vec<ElementId> = initialize
        .iter()
        .copied()
        .filter(|&id| admits(analysis, id, arg_count))
        .collect();
    if !strict_init.is_empty() {
        return strict_init;
    }
    initialize
}

fn admits(analysis: &Analysis<'_>, id: ElementId, arg_count: u32) -> bool {
    match analysis.index.element(id) {
        Some(PsiElement::Method(method)) => method.arity.admits(arg_count),
        _ => false,
    }
}

fn loose_arity_filter(
    analysis: &Analysis<'_>,
    candidates: Vec<ElementId>,
    arg_count: u32,
) -> Vec<ElementId> {
    let matching: Vec<ElementId> = candidates
        .iter()
        .copied()
        .filter(|&id| admits(analysis, id, arg_count))
        .collect();
    if matching.is_empty() { candidates } else { matching }
}

// ===== Paths =====

/// Alias, enum member, then type resolution, in that order.
fn resolve_path(analysis: &Analysis<'_>, path: &Node) -> Vec<PsiElement> {
    let Some(full) = path.path_full() else {
        return Vec::new();
    };
    let index = analysis.index;
    let context = analysis.context();

    // The cursor may sit on the name of a type definition itself; then the
    // context path already is the qualified name.
    let is_definition_name = analysis
        .ctx
        .node_path
        .last()
        .and_then(|parent| parent.type_definition_name())
        .is_some_and(|name| std::ptr::eq(name, path));
    if is_definition_name {
        return type_definition_sites(analysis, analysis.ctx.context());
    }

    if let Some(resolved) = index.resolve_type_name(&full, context) {
        let aliases = index.alias_elements(&resolved);
        if !aliases.is_empty() {
            return ids_to_elements(analysis, aliases.to_vec());
        }
    }

    if let Some(member) = resolve_enum_member(analysis, &full) {
        return ids_to_elements(analysis, vec![member]);
    }

    match index.resolve_type_name(&full, context) {
        Some(resolved) => type_definition_sites(analysis, &resolved),
        None => Vec::new(),
    }
}

/// `E::M` anywhere, or a bare `M` inside the enum `E`.
fn resolve_enum_member(analysis: &Analysis<'_>, full: &str) -> Option<ElementId> {
    let index = analysis.index;
    if let Some((head, member)) = full.rsplit_once("::") {
        let enum_name = index.resolve_type_name(head, analysis.context())?;
        return index.enum_member(&enum_name, member);
    }
    // Bare member: only inside an enum body.
    let context = analysis.context()?;
    matches!(
        index.find_type(context),
        Some((_, PsiElement::Enum(_)))
    )
    .then(|| index.enum_member(context, full))
    .flatten()
}

/// One element per file that (re)opens the type, each with that file's
/// definition site.
fn type_definition_sites(analysis: &Analysis<'_>, name: &str) -> Vec<PsiElement> {
    let index = analysis.index;
    let Some((_, element)) = index.find_type(name) else {
        return Vec::new();
    };
    let Some(definitions) = index.type_definitions(name) else {
        return Vec::new();
    };
    definitions
        .iter()
        .map(|(file, definition)| {
            let mut clone = element.clone();
            let common = clone.common_mut();
            common.file = Some(file.clone());
            common.location = definition.location;
            clone
        })
        .collect()
}

// ===== Variables =====

/// The latest assignment or parameter binding of a local before the cursor.
fn resolve_local_var(analysis: &Analysis<'_>, name: &str) -> Vec<PsiElement> {
    let Some(def) = analysis.ctx.enclosing_def else {
        return Vec::new();
    };
    let NodeKind::Def { args, body, .. } = &def.kind else {
        return Vec::new();
    };

    let mut collector = VarBindingCollector {
        name,
        cursor: analysis.position,
        best: None,
    };
    for arg in args {
        if let NodeKind::Arg { name: arg_name, .. } = &arg.kind {
            if arg_name == name {
                collector.consider(arg.location, arg.range());
            }
        }
    }
    walk(body, &mut collector);

    let Some((_, range)) = collector.best else {
        return Vec::new();
    };
    vec![PsiElement::LocalVar(LocalVarElement {
        common: ElementCommon {
            file: Some(analysis.uri.to_string()),
            name: name.to_string(),
            location: range,
            doc: None,
        },
        type_string: analysis.env.local(name).map(TypeRef::display),
    })]
}

/// Tracks the latest binding of one local name before the cursor, staying
/// out of nested definitions.
struct VarBindingCollector<'n> {
    name: &'n str,
    cursor: Position,
    best: Option<(Option<Position>, Option<Range>)>,
}

impl VarBindingCollector<'_> {
    fn consider(&mut self, location: Option<Position>, range: Option<Range>) {
        let after_best = match (&self.best, location) {
            (Some((Some(best_loc), _)), Some(location)) => location >= *best_loc,
            (Some((None, _)), _) => true,
            (None, _) => true,
            (Some((Some(_), _)), None) => false,
        };
        if after_best {
            self.best = Some((location, range));
        }
    }

    fn binding(&mut self, node: &Node, target: &Node) {
        if target_is_var(target, self.name) && node.location.is_none_or(|loc| loc <= self.cursor) {
            self.consider(target.location, target.range());
        }
    }
}

impl<'tree> Visitor<'tree> for VarBindingCollector<'_> {
    fn visit(&mut self, node: &'tree Node) -> VisitControl {
        match &node.kind {
            NodeKind::Def { .. }
            | NodeKind::ClassDef { .. }
            | NodeKind::ModuleDef { .. }
            | NodeKind::EnumDef { .. }
            | NodeKind::MacroDef { .. } => VisitControl::Skip,
            NodeKind::Assign { target, .. } | NodeKind::OpAssign { target, .. } => {
                self.binding(node, target);
                // Nested assignments inside the value still bind.
                VisitControl::Descend
            }
            NodeKind::MultiAssign { targets, .. } => {
                for target in targets {
                    self.binding(node, target);
                }
                VisitControl::Skip
            }
            NodeKind::TypeDeclaration { var, .. } => {
                self.binding(node, var);
                VisitControl::Skip
            }
            _ => VisitControl::Descend,
        }
    }
}

fn target_is_var(node: &Node, name: &str) -> bool {
    matches!(&node.kind, NodeKind::Var { name: var_name } if var_name == name)
}

/// First assignment in the enclosing method, else in `initialize`, else the
/// class-body declaration.
fn resolve_instance_var(analysis: &Analysis<'_>, name: &str) -> Vec<PsiElement> {
    let class_node = analysis.ctx.enclosing_class.or_else(|| {
        analysis
            .ctx
            .full_path()
            .into_iter()
            .rev()
            .find(|node| node.is_type_definition())
    });

    let mut site: Option<Range> = None;
    if let Some(def) = analysis.ctx.enclosing_def {
        site = first_ivar_site(def, name);
    }
    if site.is_none() {
        if let Some(class_node) = class_node {
            if let Some(body) = type_body(class_node) {
                // `initialize` next, then the body's own declarations.
                if let NodeKind::Expressions(nodes) = &body.kind {
                    for child in nodes {
                        if child.name_str() == Some("initialize") {
                            site = first_ivar_site(child, name);
                            if site.is_some() {
                                break;
                            }
                        }
                    }
                    if site.is_none() {
                        for child in nodes {
                            match &child.kind {
                                NodeKind::TypeDeclaration { var, .. }
                                    if ivar_named(var, name) =>
                                {
                                    site = var.range().or_else(|| child.range());
                                }
                                NodeKind::Assign { target, .. } if ivar_named(target, name) => {
                                    site = target.range().or_else(|| child.range());
                                }
                                _ => {}
                            }
                            if site.is_some() {
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    let Some(range) = site else {
        return Vec::new();
    };
    let owner = analysis.ctx.context().to_string();
    vec![PsiElement::InstanceVar(InstanceVarElement {
        common: ElementCommon {
            file: Some(analysis.uri.to_string()),
            name: name.to_string(),
            location: Some(range),
            doc: None,
        },
        owner,
        type_string: analysis.env.ivar(name).map(TypeRef::display),
    })]
}

fn first_ivar_site(def: &Node, name: &str) -> Option<Range> {
    let NodeKind::Def { body, .. } = &def.kind else {
        return None;
    };
    let mut finder = FirstIvarFinder { name, found: None };
    walk(body, &mut finder);
    finder.found
}

/// Finds the first assignment or declaration of one instance/class
/// variable inside a body, nested definitions excluded.
struct FirstIvarFinder<'n> {
    name: &'n str,
    found: Option<Range>,
}

impl<'tree> Visitor<'tree> for FirstIvarFinder<'_> {
    fn visit(&mut self, node: &'tree Node) -> VisitControl {
        if self.found.is_some() {
            return VisitControl::Skip;
        }
        match &node.kind {
            NodeKind::Def { .. }
            | NodeKind::ClassDef { .. }
            | NodeKind::ModuleDef { .. }
            | NodeKind::EnumDef { .. }
            | NodeKind::MacroDef { .. } => VisitControl::Skip,
            NodeKind::Assign { target, .. } if ivar_named(target, self.name) => {
                self.found = target.range().or_else(|| node.range());
                VisitControl::Skip
            }
            NodeKind::TypeDeclaration { var, .. } if ivar_named(var, self.name) => {
                self.found = var.range().or_else(|| node.range());
                VisitControl::Skip
            }
            _ => VisitControl::Descend,
        }
    }
}

fn ivar_named(node: &Node, name: &str) -> bool {
    matches!(&node.kind, NodeKind::InstanceVar { name: var_name } if var_name == name)
}

fn type_body(node: &Node) -> Option<&Node> {
    match &node.kind {
        NodeKind::ClassDef { body, .. }
        | NodeKind::ModuleDef { body, .. }
        | NodeKind::EnumDef { body, .. } => Some(body),
        _ => None,
    }
}
