//! The cursor-scoped type environment.
//!
//! A lexical scan over the enclosing class and method collects best-effort
//! type hints for locals, instance variables and class variables. Sources,
//! in order:
//!
//! 1. class-body type declarations and assignments
//! 2. assignments inside `initialize`
//! 3. assignments in every other method body (never overwriting known hints)
//! 4. the current method's parameter restrictions
//! 5. assignments in the current method body textually before the cursor
//!
//! Collectors never descend into nested `Def`/`ClassDef`/`ModuleDef`/
//! `Macro` definitions.

use cryls_ast::node::{Node, NodeKind};
use cryls_ast::visitor::{VisitControl, Visitor, walk};
use cryls_common::position::Position;
use cryls_index::TypeRef;
use rustc_hash::FxHashMap;

/// Variable-name to type-reference hints at a cursor.
#[derive(Debug, Default, Clone)]
pub struct TypeEnv {
    locals: FxHashMap<String, TypeRef>,
    ivars: FxHashMap<String, TypeRef>,
    cvars: FxHashMap<String, TypeRef>,
}

impl TypeEnv {
    #[must_use]
    pub fn local(&self, name: &str) -> Option<&TypeRef> {
        self.locals.get(name)
    }

    #[must_use]
    pub fn ivar(&self, name: &str) -> Option<&TypeRef> {
        self.ivars.get(name)
    }

    #[must_use]
    pub fn cvar(&self, name: &str) -> Option<&TypeRef> {
        self.cvars.get(name)
    }

    /// The hint for a variable-read node, if any.
    #[must_use]
    pub fn lookup(&self, node: &Node) -> Option<&TypeRef> {
        match &node.kind {
            NodeKind::Var { name } => self.local(name),
            NodeKind::InstanceVar { name } => self.ivar(name),
            NodeKind::ClassVar { name } => self.cvar(name),
            _ => None,
        }
    }

    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.locals.keys().map(String::as_str)
    }

    pub fn ivar_names(&self) -> impl Iterator<Item = &str> {
        self.ivars.keys().map(String::as_str)
    }

    pub fn cvar_names(&self) -> impl Iterator<Item = &str> {
        self.cvars.keys().map(String::as_str)
    }
}

/// Build the environment for a cursor inside `def_node` within `class_node`
/// (either may be absent at file level).
#[must_use]
pub fn build_type_env(
    class_node: Option<&Node>,
    def_node: Option<&Node>,
    cursor: Position,
) -> TypeEnv {
    let mut env = TypeEnv::default();

    if let Some(class_node) = class_node {
        if let Some(body) = class_body(class_node) {
            collect_class_body(body, &mut env);

            // `initialize` first, then the remaining methods; both fill in
            // ivar hints without clobbering declarations.
            for def in body_defs(body) {
                if def.name_str() == Some("initialize") {
                    collect_method_ivars(def, &mut env);
                }
            }
            for def in body_defs(body) {
                if def.name_str() != Some("initialize") {
                    collect_method_ivars(def, &mut env);
                }
            }
        }
    }

    if let Some(def_node) = def_node {
        collect_current_method(def_node, cursor, &mut env);
    }
    env
}

fn class_body(node: &Node) -> Option<&Node> {
    match &node.kind {
        NodeKind::ClassDef { body, .. }
        | NodeKind::ModuleDef { body, .. }
        | NodeKind::EnumDef { body, .. } => Some(body),
        _ => None,
    }
}

fn body_defs(body: &Node) -> impl Iterator<Item = &Node> {
    let nodes: &[Node] = match &body.kind {
        NodeKind::Expressions(nodes) => nodes,
        _ => &[],
    };
    nodes
        .iter()
        .filter(|node| matches!(node.kind, NodeKind::Def { .. }))
}

/// Top-level declarations and assignments of a type body.
fn collect_class_body(body: &Node, env: &mut TypeEnv) {
    let NodeKind::Expressions(nodes) = &body.kind else {
        return;
    };
    for node in nodes {
        match &node.kind {
            NodeKind::TypeDeclaration {
                var, declared_type, ..
            } => {
                if let Some(reference) = TypeRef::from_node(declared_type) {
                    insert_var(env, var, reference, true);
                }
            }
            NodeKind::Assign { target, value } => {
                if let Some(reference) = typeref_from_value(value, env) {
                    insert_var(env, target, reference, true);
                }
            }
            _ => {}
        }
    }
}

/// Instance/class-variable assignments inside one method body.
fn collect_method_ivars(def: &Node, env: &mut TypeEnv) {
    let NodeKind::Def { args, body, .. } = &def.kind else {
        return;
    };

    // Parameter restrictions seed a method-local view so `@x = x` picks up
    // the parameter's declared type.
    let mut scoped = env.clone();
    for arg in args {
        if let NodeKind::Arg {
            name,
            restriction: Some(restriction),
            ..
        } = &arg.kind
        {
            if let Some(reference) = TypeRef::from_node(restriction) {
                scoped.locals.insert(name.clone(), reference);
            }
        }
    }

    for (target, value) in collect_assignments(body, None) {
        if matches!(
            target.kind,
            NodeKind::InstanceVar { .. } | NodeKind::ClassVar { .. }
        ) {
            if let Some(reference) = typeref_from_value(value, &scoped) {
                insert_var(env, target, reference, false);
            }
        }
    }
}

/// Parameters and prior assignments of the method the cursor is in.
fn collect_current_method(def: &Node, cursor: Position, env: &mut TypeEnv) {
    let NodeKind::Def { args, body, .. } = &def.kind else {
        return;
    };
    for arg in args {
        if let NodeKind::Arg {
            name,
            restriction: Some(restriction),
            ..
        } = &arg.kind
        {
            if let Some(reference) = TypeRef::from_node(restriction) {
                env.locals.insert(name.clone(), reference);
            }
        }
    }

    for (target, value) in collect_assignments(body, Some(cursor)) {
        if let Some(reference) = typeref_from_value(value, env) {
            insert_var(env, target, reference, true);
        }
    }
}

/// Gather `(target, value)` pairs from assignments and typed declarations,
/// optionally only those starting at or before `cursor`.
fn collect_assignments(body: &Node, cursor: Option<Position>) -> Vec<(&Node, &Node)> {
    let mut collector = AssignmentCollector {
        cursor,
        out: Vec::new(),
    };
    walk(body, &mut collector);
    collector.out
}

/// Assignment collector that stays out of nested definitions.
struct AssignmentCollector<'tree> {
    cursor: Option<Position>,
    out: Vec<(&'tree Node, &'tree Node)>,
}

impl AssignmentCollector<'_> {
    fn before_cursor(&self, node: &Node) -> bool {
        match self.cursor {
            Some(cursor) => node.location.is_none_or(|location| location <= cursor),
            None => true,
        }
    }
}

impl<'tree> Visitor<'tree> for AssignmentCollector<'tree> {
    fn visit(&mut self, node: &'tree Node) -> VisitControl {
        match &node.kind {
            NodeKind::Def { .. }
            | NodeKind::ClassDef { .. }
            | NodeKind::ModuleDef { .. }
            | NodeKind::EnumDef { .. }
            | NodeKind::MacroDef { .. } => VisitControl::Skip,
            NodeKind::Assign { target, value } => {
                if self.before_cursor(node) {
                    self.out.push((target, value));
                }
                // Nested assignments inside the value still collect.
                VisitControl::Descend
            }
            NodeKind::TypeDeclaration {
                var,
                declared_type,
                ..
            } => {
                if self.before_cursor(node) {
                    self.out.push((var, declared_type));
                }
                VisitControl::Skip
            }
            NodeKind::MultiAssign { targets, values } => {
                if self.before_cursor(node) && targets.len() == values.len() {
                    for (target, value) in targets.iter().zip(values.iter()) {
                        self.out.push((target, value));
                    }
                }
                VisitControl::Skip
            }
            _ => VisitControl::Descend,
        }
    }
}

fn insert_var(env: &mut TypeEnv, target: &Node, reference: TypeRef, overwrite: bool) {
    let bucket = match &target.kind {
        NodeKind::Var { name } => (&mut env.locals, name),
        NodeKind::InstanceVar { name } => (&mut env.ivars, name),
        NodeKind::ClassVar { name } => (&mut env.cvars, name),
        _ => return,
    };
    let (map, name) = bucket;
    if overwrite || !map.contains_key(name) {
        map.insert(name.clone(), reference);
    }
}

/// Best-effort reading of a value expression as a type reference.
pub(crate) fn typeref_from_value(value: &Node, env: &TypeEnv) -> Option<TypeRef> {
    match &value.kind {
        // Type.new(...) and Generic(...).new
        NodeKind::Call {
            obj: Some(obj),
            name,
            ..
        } if name == "new" => TypeRef::from_node(obj),
        NodeKind::Cast { to, .. } | NodeKind::NilableCast { to, .. } => TypeRef::from_node(to),
        NodeKind::ArrayLiteral { of: Some(of), .. } => {
            Some(TypeRef::generic("Array", vec![TypeRef::from_node(of)?]))
        }
        NodeKind::HashLiteral { of: Some((key, value)), .. } => Some(TypeRef::generic(
            "Hash",
            vec![TypeRef::from_node(key)?, TypeRef::from_node(value)?],
        )),
        NodeKind::Var { .. } | NodeKind::InstanceVar { .. } | NodeKind::ClassVar { .. } => {
            env.lookup(value).cloned()
        }
        // A declared type used as a value source (TypeDeclaration pairs)
        NodeKind::Path { .. } | NodeKind::Generic { .. } | NodeKind::Union { .. } => {
            TypeRef::from_node(value)
        }
        _ => None,
    }
}
