//! Semantic index for the cryls language server core.
//!
//! This crate provides:
//! - `TypeRef` - compact structural type references
//! - `PsiElement` and friends - the owned symbol model
//! - `SemanticIndex` - multi-file state, dependency graph, removal
//! - the three-pass indexing pipeline with macro collection/expansion

pub mod typeref;
pub use typeref::TypeRef;

pub mod element;
pub use element::{
    AliasElement, Arity, ClassElement, ClassVarElement, ElementArena, ElementCommon, ElementId,
    EnumElement, EnumMemberElement, InstanceVarElement, LocalVarElement, MethodElement,
    ModuleElement, PsiElement,
};

pub mod index;
pub use index::{IndexStats, SemanticIndex, TypeDefinition, TypeKind};

pub mod macro_registry;
pub use macro_registry::{MacroDefinition, MacroRegistry, arity_of};

pub mod macro_interpreter;
pub use macro_interpreter::MacroError;

pub mod builtin_macros;
pub use builtin_macros::{expand_builtin, is_builtin_macro};

mod macro_expander;
mod main_pass;
mod skeleton;

pub mod pipeline;
pub use pipeline::{index_tree, qualify};
