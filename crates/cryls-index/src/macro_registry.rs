//! Macro definitions and scope-aware selection.
//!
//! Definitions are registered under the qualified name of their lexically
//! enclosing type (empty scope = file level). A call site selects a macro
//! by walking its context outward and matching arity the same way method
//! calls do.

use cryls_common::position::Range;
use cryls_ast::node::{Node, NodeKind};
use rustc_hash::FxHashMap;

use crate::element::Arity;

/// A user macro definition collected during the macro pass.
#[derive(Debug, Clone)]
pub struct MacroDefinition {
    /// Qualified name of the enclosing type; empty for file level
    pub scope: String,
    pub name: String,
    /// Parameter nodes (`Arg` kinds), kept for default substitution
    pub params: Vec<Node>,
    pub splat_index: Option<usize>,
    pub arity: Arity,
    pub body: Node,
    pub file: String,
    pub location: Option<Range>,
}

/// Arity of a parameter list: required count, and unbounded when a splat is
/// present.
#[must_use]
pub fn arity_of(params: &[Node], splat_index: Option<usize>) -> Arity {
    let mut min = 0u32;
    for (idx, param) in params.iter().enumerate() {
        if splat_index == Some(idx) {
            continue;
        }
        if let NodeKind::Arg { default_value, .. } = &param.kind {
            if default_value.is_none() {
                min += 1;
            }
        }
    }
    if splat_index.is_some() {
        Arity::unbounded(min)
    } else {
        Arity::fixed(min, u32::try_from(params.len()).unwrap_or(u32::MAX))
    }
}

/// All registered macros, keyed by scope then name.
#[derive(Debug, Default)]
pub struct MacroRegistry {
    by_scope: FxHashMap<String, FxHashMap<String, Vec<MacroDefinition>>>,
    /// File -> (scope, name) entries for removal
    by_file: FxHashMap<String, Vec<(String, String)>>,
}

impl MacroRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: MacroDefinition) {
        self.by_file
            .entry(definition.file.clone())
            .or_default()
            .push((definition.scope.clone(), definition.name.clone()));
        self.by_scope
            .entry(definition.scope.clone())
            .or_default()
            .entry(definition.name.clone())
            .or_default()
            .push(definition);
    }

    #[must_use]
    pub fn has_file(&self, file: &str) -> bool {
        self.by_file.contains_key(file)
    }

    pub fn remove_file(&mut self, file: &str) {
        let Some(entries) = self.by_file.remove(file) else {
            return;
        };
        for (scope, name) in entries {
            if let Some(names) = self.by_scope.get_mut(&scope) {
                if let Some(defs) = names.get_mut(&name) {
                    defs.retain(|def| def.file != file);
                    if defs.is_empty() {
                        names.remove(&name);
                    }
                }
                if names.is_empty() {
                    self.by_scope.remove(&scope);
                }
            }
        }
    }

    /// Select the macro for a call of `name` with `arg_count` arguments in
    /// `context`. Scope lookup walks outward: for `A::B::C`, tries
    /// `A::B::C`, `A::B`, `A`, then file level.
    #[must_use]
    pub fn resolve(&self, context: &str, name: &str, arg_count: u32) -> Option<&MacroDefinition> {
        for scope in ScopeWalk::new(context) {
            if let Some(defs) = self.by_scope.get(scope).and_then(|names| names.get(name)) {
                if let Some(found) = defs.iter().find(|def| def.arity.admits(arg_count)) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Total number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_file.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }
}

/// Iterator over a context path and its enclosing scopes, ending with the
/// file-level scope `""`.
struct ScopeWalk<'a> {
    context: &'a str,
    done: bool,
}

impl<'a> ScopeWalk<'a> {
    fn new(context: &'a str) -> Self {
        Self {
            context,
            done: false,
        }
    }
}

impl<'a> Iterator for ScopeWalk<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        let current = self.context;
        if current.is_empty() {
            self.done = true;
            return Some("");
        }
        self.context = match current.rfind("::") {
            Some(pos) => &current[..pos],
            None => "",
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryls_ast::make;

    fn definition(scope: &str, name: &str, params: Vec<Node>, file: &str) -> MacroDefinition {
        let arity = arity_of(&params, None);
        MacroDefinition {
            scope: scope.to_string(),
            name: name.to_string(),
            params,
            splat_index: None,
            arity,
            body: make::expressions(vec![]),
            file: file.to_string(),
            location: None,
        }
    }

    #[test]
    fn scope_walk_tries_enclosing_scopes_outward() {
        let walk: Vec<&str> = ScopeWalk::new("A::B::C").collect();
        assert_eq!(walk, vec!["A::B::C", "A::B", "A", ""]);
        let walk: Vec<&str> = ScopeWalk::new("").collect();
        assert_eq!(walk, vec![""]);
    }

    #[test]
    fn resolve_prefers_innermost_scope() {
        let mut registry = MacroRegistry::new();
        registry.register(definition("", "deco", vec![make::arg("x")], "a.cr"));
        registry.register(definition("A::B", "deco", vec![make::arg("x")], "b.cr"));

        let found = registry.resolve("A::B::C", "deco", 1).expect("macro");
        assert_eq!(found.scope, "A::B");

        let found = registry.resolve("Other", "deco", 1).expect("macro");
        assert_eq!(found.scope, "");
    }

    #[test]
    fn resolve_filters_by_arity() {
        let mut registry = MacroRegistry::new();
        registry.register(definition("", "deco", vec![make::arg("x")], "a.cr"));
        assert!(registry.resolve("", "deco", 0).is_none());
        assert!(registry.resolve("", "deco", 1).is_some());
        assert!(registry.resolve("", "deco", 2).is_none());
    }

    #[test]
    fn remove_file_unregisters_definitions() {
        let mut registry = MacroRegistry::new();
        registry.register(definition("", "deco", vec![], "a.cr"));
        registry.register(definition("", "deco", vec![], "b.cr"));
        registry.remove_file("a.cr");
        let found = registry.resolve("", "deco", 0).expect("macro");
        assert_eq!(found.file, "b.cr");
        registry.remove_file("b.cr");
        assert!(registry.resolve("", "deco", 0).is_none());
        assert!(registry.is_empty());
    }
}
