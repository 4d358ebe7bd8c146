//! Built-in accessor-generator macros.
//!
//! The accessor family (`getter`, `setter`, `property` and friends) is
//! expanded from a fixed table instead of user macro bodies. Each entry
//! emits `def name; end` / `def name=(value); end` stubs - just enough
//! surface for call resolution, never the real implementations.

use cryls_ast::node::{Node, NodeKind};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

type StubEmitter = fn(&str, Option<&str>) -> String;

fn getter_stub(name: &str, type_text: Option<&str>) -> String {
    match type_text {
        Some(ty) => format!("def {name} : {ty}; end\n"),
        None => format!("def {name}; end\n"),
    }
}

fn predicate_getter_stub(name: &str, type_text: Option<&str>) -> String {
    match type_text {
        Some(ty) => format!("def {name}? : {ty}; end\n"),
        None => format!("def {name}?; end\n"),
    }
}

fn setter_stub(name: &str, type_text: Option<&str>) -> String {
    match type_text {
        Some(ty) => format!("def {name}=(value : {ty}); end\n"),
        None => format!("def {name}=(value); end\n"),
    }
}

fn property_stub(name: &str, type_text: Option<&str>) -> String {
    format!("{}{}", getter_stub(name, type_text), setter_stub(name, type_text))
}

fn predicate_property_stub(name: &str, type_text: Option<&str>) -> String {
    format!(
        "{}{}",
        predicate_getter_stub(name, type_text),
        setter_stub(name, type_text)
    )
}

fn class_getter_stub(name: &str, type_text: Option<&str>) -> String {
    match type_text {
        Some(ty) => format!("def self.{name} : {ty}; end\n"),
        None => format!("def self.{name}; end\n"),
    }
}

fn class_setter_stub(name: &str, type_text: Option<&str>) -> String {
    match type_text {
        Some(ty) => format!("def self.{name}=(value : {ty}); end\n"),
        None => format!("def self.{name}=(value); end\n"),
    }
}

fn class_property_stub(name: &str, type_text: Option<&str>) -> String {
    format!(
        "{}{}",
        class_getter_stub(name, type_text),
        class_setter_stub(name, type_text)
    )
}

static BUILTIN_MACROS: Lazy<FxHashMap<&'static str, StubEmitter>> = Lazy::new(|| {
    let mut table: FxHashMap<&'static str, StubEmitter> = FxHashMap::default();
    table.insert("getter", getter_stub);
    table.insert("getter?", predicate_getter_stub);
    table.insert("getter!", getter_stub);
    table.insert("setter", setter_stub);
    table.insert("property", property_stub);
    table.insert("property?", predicate_property_stub);
    table.insert("property!", property_stub);
    table.insert("class_getter", class_getter_stub);
    table.insert("class_setter", class_setter_stub);
    table.insert("class_property", class_property_stub);
    table
});

/// Whether `name` is one of the built-in accessor generators.
#[must_use]
pub fn is_builtin_macro(name: &str) -> bool {
    BUILTIN_MACROS.contains_key(name)
}

/// Expand a built-in macro call to stub source, or `None` when the call is
/// not a built-in or no accessor name could be read from its arguments.
#[must_use]
pub fn expand_builtin(name: &str, args: &[Node]) -> Option<String> {
    let emitter = BUILTIN_MACROS.get(name)?;
    let mut out = String::new();
    for arg in args {
        if let Some((accessor, type_text)) = accessor_spec(arg) {
            out.push_str(&emitter(&accessor, type_text.as_deref()));
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Read the accessor name (and declared type, when present) out of one
/// macro argument: `getter name`, `getter name : String`,
/// `getter name = default`, `getter :name`, `getter "name"`.
fn accessor_spec(arg: &Node) -> Option<(String, Option<String>)> {
    match &arg.kind {
        NodeKind::Call {
            obj: None,
            name,
            args,
            ..
        } if args.is_empty() => Some((name.clone(), None)),
        NodeKind::Var { name } => Some((name.clone(), None)),
        NodeKind::SymbolLiteral(name) | NodeKind::StringLiteral(name) => {
            Some((name.clone(), None))
        }
        NodeKind::InstanceVar { name } => Some((name.trim_start_matches('@').to_string(), None)),
        NodeKind::TypeDeclaration {
            var, declared_type, ..
        } => {
            let (name, _) = accessor_spec(var)?;
            Some((name, type_text(declared_type)))
        }
        NodeKind::Assign { target, .. } => accessor_spec(target),
        _ => None,
    }
}

/// Source-like rendering of a type node, for stub return restrictions.
fn type_text(node: &Node) -> Option<String> {
    crate::typeref::TypeRef::from_node(node).map(|typeref| typeref.display())
}
