//! Compact structural type references.
//!
//! A `TypeRef` is the lightweight currency of inference and resolution: a
//! possibly-generic qualified name, or a union of further references. It is
//! not a PSI element; resolving one to an owner type goes through the
//! semantic index.

use cryls_ast::node::{Node, NodeKind};

/// A structural reference to a type.
///
/// Names are fully-qualified `::`-separated strings; a leading `::` marks
/// global scope. The pseudo-name `self` is permitted and resolved relative
/// to the context it is used in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named { name: String, args: Vec<TypeRef> },
    Union(Vec<TypeRef>),
}

impl TypeRef {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args,
        }
    }

    /// The head name, for named references.
    #[must_use]
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => Some(name),
            TypeRef::Union(_) => None,
        }
    }

    /// Generic arguments, empty for plain names and unions.
    #[must_use]
    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            TypeRef::Union(_) => &[],
        }
    }

    #[must_use]
    pub fn is_self(&self) -> bool {
        matches!(self, TypeRef::Named { name, .. } if name == "self")
    }

    /// Render as source-like text: `Name(A, B)` or `A | B`.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            TypeRef::Named { name, args } => {
                if args.is_empty() {
                    name.clone()
                } else {
                    let rendered: Vec<String> = args.iter().map(TypeRef::display).collect();
                    format!("{}({})", name, rendered.join(", "))
                }
            }
            TypeRef::Union(members) => {
                let rendered: Vec<String> = members.iter().map(TypeRef::display).collect();
                rendered.join(" | ")
            }
        }
    }

    /// Interpret a syntax node in type position as a reference.
    ///
    /// Handles paths, generic instantiations, unions and `self`; anything
    /// else is not a type expression and yields `None`.
    #[must_use]
    pub fn from_node(node: &Node) -> Option<TypeRef> {
        match &node.kind {
            NodeKind::Path { .. } => Some(TypeRef::named(node.path_full()?)),
            NodeKind::Generic { name, args } => {
                let head = name.path_full()?;
                let args = args.iter().map(TypeRef::from_node).collect::<Option<Vec<_>>>()?;
                Some(TypeRef::Named { name: head, args })
            }
            NodeKind::Union { types } => {
                let members = types
                    .iter()
                    .map(TypeRef::from_node)
                    .collect::<Option<Vec<_>>>()?;
                if members.is_empty() {
                    None
                } else {
                    Some(TypeRef::Union(members))
                }
            }
            NodeKind::SelfLiteral => Some(TypeRef::named("self")),
            NodeKind::Metaclass { name } => TypeRef::from_node(name),
            NodeKind::NilableCast { to, .. } | NodeKind::Cast { to, .. } => TypeRef::from_node(to),
            _ => None,
        }
    }

    /// Substitute type-variable names for concrete references, and `self`
    /// for `receiver`. Used when instantiating a generic method return type.
    #[must_use]
    pub fn substitute(
        &self,
        bindings: &rustc_hash::FxHashMap<String, TypeRef>,
        receiver: &TypeRef,
    ) -> TypeRef {
        match self {
            TypeRef::Named { name, args } => {
                if name == "self" {
                    return receiver.clone();
                }
                if args.is_empty() {
                    if let Some(bound) = bindings.get(name) {
                        return bound.clone();
                    }
                }
                TypeRef::Named {
                    name: name.clone(),
                    args: args
                        .iter()
                        .map(|arg| arg.substitute(bindings, receiver))
                        .collect(),
                }
            }
            TypeRef::Union(members) => TypeRef::Union(
                members
                    .iter()
                    .map(|member| member.substitute(bindings, receiver))
                    .collect(),
            ),
        }
    }
}
