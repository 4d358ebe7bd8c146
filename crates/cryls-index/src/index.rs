//! The semantic index.
//!
//! One owning structure holds every PSI element plus the cross-file maps
//! that make incremental teardown possible. All mutation goes through the
//! indexing pipeline or `remove_file`; queries only ever take `&self`.
//!
//! A type is identified by its qualified name across the whole index, but a
//! name does not identify a file: reopening means several files can
//! contribute definitions to the same type. `type_defs_by_name` therefore
//! maps name -> file -> definition, insertion-ordered, and the first
//! remaining file wins whenever a file is removed.

use cryls_common::limits::{MAX_ALIAS_FOLLOW, MAX_ANCESTOR_WALK};
use cryls_common::position::Range;
use cryls_common::uri::macro_expansion_origin;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::debug;

use crate::element::{
    ClassElement, ElementArena, ElementId, EnumElement, ModuleElement, PsiElement,
};
use crate::macro_registry::MacroRegistry;
use crate::typeref::TypeRef;

/// Kind tag of a type shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Module,
    Class,
    Enum,
}

/// One file's contribution to a type: where it was declared and which type
/// variables the declaration carried.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub kind: TypeKind,
    pub location: Option<Range>,
    pub type_vars: Vec<String>,
}

/// Snapshot counters, used by debug dumps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files: usize,
    pub types: usize,
    pub elements: usize,
}

/// The process-wide semantic model.
#[derive(Debug, Default)]
pub struct SemanticIndex {
    /// Element storage
    arena: ElementArena,
    /// Qualified type name -> its single shell element
    type_elements: FxHashMap<String, ElementId>,
    /// Qualified type name -> file -> definition (insertion-ordered)
    type_defs_by_name: FxHashMap<String, IndexMap<String, TypeDefinition>>,
    /// File -> qualified type names it introduces
    types_by_file: FxHashMap<String, Vec<String>>,
    /// Class name -> file -> unresolved superclass reference
    superclass_defs: FxHashMap<String, IndexMap<String, TypeRef>>,
    /// Class name -> unresolved include references
    class_includes: FxHashMap<String, Vec<TypeRef>>,
    /// Module name -> unresolved include references
    module_includes: FxHashMap<String, Vec<TypeRef>>,
    /// File -> (owner, include) pairs, for reversal on removal
    includes_by_file: FxHashMap<String, Vec<(String, TypeRef)>>,
    /// Owner type -> referenced type -> files supporting the edge
    dependency_sources: FxHashMap<String, FxHashMap<String, IndexSet<String>>>,
    /// Referenced type -> owners depending on it (derived from the above)
    reverse_dependencies: FxHashMap<String, IndexSet<String>>,
    /// File -> (owner, target) edges it contributed
    dependencies_by_file: FxHashMap<String, Vec<(String, String)>>,
    /// File -> file-scoped elements (methods, members, vars, aliases)
    elements_by_file: FxHashMap<String, Vec<ElementId>>,
    /// Alias qualified name -> alias elements (one per defining file; a
    /// single definition is by far the common case)
    aliases_by_name: FxHashMap<String, SmallVec<[ElementId; 1]>>,
    /// Origin file -> virtual expansion files spawned while indexing it
    virtual_files_by_origin: FxHashMap<String, Vec<String>>,
    /// Macro definitions, keyed by lexical scope
    pub(crate) macros: MacroRegistry,
    /// File currently being indexed
    current_file: Option<String>,
    /// Recursion depth of macro expansion
    pub(crate) macro_depth: usize,
    /// Search roots this index was built from
    roots: Vec<String>,
}

impl SemanticIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Lifecycle =====

    /// Set the file subsequent definitions are attributed to.
    pub fn enter(&mut self, file: &str) {
        self.current_file = Some(file.to_string());
    }

    #[must_use]
    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub(crate) fn current_file_or_empty(&self) -> String {
        self.current_file.clone().unwrap_or_default()
    }

    /// Scoped switch of the current file; restores the prior file on drop.
    pub fn with_current_file(&mut self, file: &str) -> CurrentFileGuard<'_> {
        let previous = self.current_file.replace(file.to_string());
        CurrentFileGuard {
            index: self,
            previous,
        }
    }

    #[must_use]
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn set_roots(&mut self, roots: Vec<String>) {
        self.roots = roots;
    }

    /// Whether `file` currently contributes anything to the index.
    #[must_use]
    pub fn has_file(&self, file: &str) -> bool {
        self.types_by_file.contains_key(file)
            || self.elements_by_file.contains_key(file)
            || self.macros.has_file(file)
    }

    /// All files known to the index, real and virtual.
    #[must_use]
    pub fn files(&self) -> Vec<&str> {
        let mut files: FxHashSet<&str> = FxHashSet::default();
        files.extend(self.types_by_file.keys().map(String::as_str));
        files.extend(self.elements_by_file.keys().map(String::as_str));
        let mut out: Vec<&str> = files.into_iter().collect();
        out.sort_unstable();
        out
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            files: self.files().len(),
            types: self.type_defs_by_name.len(),
            elements: self.arena.live_count(),
        }
    }

    // ===== Writes (pipeline only) =====

    /// Record one file's definition of a type, creating the shell element on
    /// first sight. Returns the shell id.
    pub(crate) fn add_type_definition(
        &mut self,
        name: &str,
        kind: TypeKind,
        owner: Option<&str>,
        location: Option<Range>,
        type_vars: Vec<String>,
        doc: Option<String>,
    ) -> ElementId {
        let file = self.current_file_or_empty();

        let id = match self.type_elements.get(name) {
            Some(&id) => id,
            None => {
                let common = crate::element::ElementCommon {
                    file: Some(file.clone()),
                    name: name.to_string(),
                    location,
                    doc: doc.clone(),
                };
                let owner = owner.map(str::to_string);
                let element = match kind {
                    TypeKind::Module => PsiElement::Module(ModuleElement {
                        common,
                        parent: owner,
                        children: Vec::new(),
                    }),
                    TypeKind::Class => PsiElement::Class(ClassElement {
                        common,
                        owner,
                        children: Vec::new(),
                    }),
                    TypeKind::Enum => PsiElement::Enum(EnumElement {
                        common,
                        owner,
                        children: Vec::new(),
                    }),
                };
                let id = self.arena.alloc(element);
                self.type_elements.insert(name.to_string(), id);
                id
            }
        };

        if doc.is_some() {
            if let Some(element) = self.arena.get_mut(id) {
                if element.common().doc.is_none() {
                    element.common_mut().doc = doc;
                }
            }
        }

        self.type_defs_by_name.entry(name.to_string()).or_default().insert(
            file.clone(),
            TypeDefinition {
                kind,
                location,
                type_vars,
            },
        );

        let names = self.types_by_file.entry(file).or_default();
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
        id
    }

    /// Record the (unresolved) superclass of `class_name` in the current file.
    pub(crate) fn set_superclass(&mut self, class_name: &str, superclass: TypeRef) {
        let file = self.current_file_or_empty();
        self.superclass_defs
            .entry(class_name.to_string())
            .or_default()
            .insert(file, superclass);
    }

    /// Record an include edge on a class or module.
    pub(crate) fn add_include(&mut self, owner: &str, owner_kind: TypeKind, included: TypeRef) {
        let file = self.current_file_or_empty();
        let bucket = match owner_kind {
            TypeKind::Module => self.module_includes.entry(owner.to_string()).or_default(),
            _ => self.class_includes.entry(owner.to_string()).or_default(),
        };
        bucket.push(included.clone());
        self.includes_by_file
            .entry(file)
            .or_default()
            .push((owner.to_string(), included));
    }

    /// Record a type-graph dependency edge `owner -> target`, supported by
    /// the current file.
    pub(crate) fn add_dependency(&mut self, owner: &str, target: &str) {
        let file = self.current_file_or_empty();
        let inserted = self
            .dependency_sources
            .entry(owner.to_string())
            .or_default()
            .entry(target.to_string())
            .or_default()
            .insert(file);
        if inserted {
            self.reverse_dependencies
                .entry(target.to_string())
                .or_default()
                .insert(owner.to_string());
            self.dependencies_by_file
                .entry(self.current_file_or_empty())
                .or_default()
                .push((owner.to_string(), target.to_string()));
        }
    }

    /// Store a file-scoped element and attach it to its owner's children.
    pub(crate) fn add_element(&mut self, element: PsiElement) -> ElementId {
        let file = self.current_file_or_empty();
        let owner = element.owner_name().map(str::to_string);
        let alias_name = match &element {
            PsiElement::Alias(alias) => Some(alias.common.name.clone()),
            _ => None,
        };
        let id = self.arena.alloc(element);
        self.elements_by_file.entry(file).or_default().push(id);

        if let Some(owner) = owner.filter(|owner| !owner.is_empty()) {
            if let Some(&owner_id) = self.type_elements.get(&owner) {
                if let Some(children) = self.arena.get_mut(owner_id).and_then(PsiElement::children_mut)
                {
                    children.push(id);
                }
            }
        }
        if let Some(name) = alias_name {
            self.aliases_by_name.entry(name).or_default().push(id);
        }
        id
    }

    /// Record that indexing `origin` spawned the virtual file `virtual_uri`.
    pub(crate) fn add_virtual_file(&mut self, origin: &str, virtual_uri: &str) {
        self.virtual_files_by_origin
            .entry(origin.to_string())
            .or_default()
            .push(virtual_uri.to_string());
    }

    // ===== Reads =====

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&PsiElement> {
        self.arena.get(id)
    }

    #[must_use]
    pub fn arena(&self) -> &ElementArena {
        &self.arena
    }

    /// The shell element of a type, if the type exists. Never creates.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<(ElementId, &PsiElement)> {
        let id = *self.type_elements.get(name)?;
        Some((id, self.arena.get(id)?))
    }

    /// Per-file definitions of a type, in file-insertion order.
    #[must_use]
    pub fn type_definitions(&self, name: &str) -> Option<&IndexMap<String, TypeDefinition>> {
        self.type_defs_by_name.get(name)
    }

    /// Declared type variables of a type (first defining file wins).
    #[must_use]
    pub fn type_vars(&self, name: &str) -> &[String] {
        self.type_defs_by_name
            .get(name)
            .and_then(|defs| defs.values().find(|def| !def.type_vars.is_empty()))
            .map_or(&[], |def| def.type_vars.as_slice())
    }

    /// Qualified names of the types introduced by `file`.
    #[must_use]
    pub fn types_in_file(&self, file: &str) -> &[String] {
        self.types_by_file.get(file).map_or(&[], Vec::as_slice)
    }

    /// File-scoped elements of `file`, in index order.
    #[must_use]
    pub fn elements_in_file(&self, file: &str) -> &[ElementId] {
        self.elements_by_file.get(file).map_or(&[], Vec::as_slice)
    }

    /// All known qualified type names.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.type_defs_by_name.keys().map(String::as_str)
    }

    /// All known qualified alias names.
    pub fn alias_names(&self) -> impl Iterator<Item = &str> {
        self.aliases_by_name.keys().map(String::as_str)
    }

    /// The effective superclass of a class: the first remaining file's record.
    #[must_use]
    pub fn effective_superclass(&self, class_name: &str) -> Option<&TypeRef> {
        self.superclass_defs.get(class_name)?.values().next()
    }

    /// Include edges recorded on a type (class or module).
    #[must_use]
    pub fn includes_of(&self, type_name: &str) -> Vec<&TypeRef> {
        let mut out = Vec::new();
        if let Some(includes) = self.class_includes.get(type_name) {
            out.extend(includes.iter());
        }
        if let Some(includes) = self.module_includes.get(type_name) {
            out.extend(includes.iter());
        }
        out
    }

    /// Alias elements registered under `name`, first-defined first.
    #[must_use]
    pub fn alias_elements(&self, name: &str) -> &[ElementId] {
        self.aliases_by_name.get(name).map_or(&[], |ids| ids.as_slice())
    }

    /// The target of the winning alias definition for `name`.
    #[must_use]
    pub fn alias_target(&self, name: &str) -> Option<&TypeRef> {
        let &id = self.aliases_by_name.get(name)?.first()?;
        match self.arena.get(id)? {
            PsiElement::Alias(alias) => alias.target.as_ref(),
            _ => None,
        }
    }

    /// Resolve a spelled name against a context path.
    ///
    /// For context `A::B::C` and name `N`, tries `A::B::C::N`, `A::B::N`,
    /// `A::N`, `N`, first hit wins; a leading `::` skips the context
    /// entirely. Alias names participate (they shadow types at the same
    /// name, which falls out of both living under the same qualified name).
    #[must_use]
    pub fn resolve_type_name(&self, name: &str, context: Option<&str>) -> Option<String> {
        let known = |candidate: &str| {
            self.type_defs_by_name.contains_key(candidate)
                || self.aliases_by_name.contains_key(candidate)
        };

        if let Some(stripped) = name.strip_prefix("::") {
            return known(stripped).then(|| stripped.to_string());
        }

        if let Some(context) = context.filter(|ctx| !ctx.is_empty()) {
            let segments: Vec<&str> = context.split("::").collect();
            for depth in (1..=segments.len()).rev() {
                let candidate = format!("{}::{}", segments[..depth].join("::"), name);
                if known(&candidate) {
                    return Some(candidate);
                }
            }
        }
        known(name).then(|| name.to_string())
    }

    /// Resolve a `TypeRef` to the qualified name of its owner type,
    /// following alias indirections (bounded) and trying union members in
    /// order, skipping `Nil`.
    #[must_use]
    pub fn resolve_typeref(&self, typeref: &TypeRef, context: Option<&str>) -> Option<String> {
        self.resolve_typeref_inner(typeref, context, 0)
    }

    fn resolve_typeref_inner(
        &self,
        typeref: &TypeRef,
        context: Option<&str>,
        depth: usize,
    ) -> Option<String> {
        if depth > MAX_ALIAS_FOLLOW {
            return None;
        }
        match typeref {
            TypeRef::Named { name, .. } => {
                if name == "self" {
                    let context = context?;
                    return self
                        .type_defs_by_name
                        .contains_key(context)
                        .then(|| context.to_string());
                }
                let resolved = self.resolve_type_name(name, context)?;
                if let Some(target) = self.alias_target(&resolved) {
                    let target = target.clone();
                    return self.resolve_typeref_inner(&target, context, depth + 1);
                }
                // A nil-target alias resolves to nothing rather than the
                // alias's own name.
                if !self.alias_elements(&resolved).is_empty()
                    && !self.type_defs_by_name.contains_key(&resolved)
                {
                    return None;
                }
                Some(resolved)
            }
            TypeRef::Union(members) => members
                .iter()
                .filter(|member| member.base_name() != Some("Nil"))
                .find_map(|member| self.resolve_typeref_inner(member, context, depth + 1)),
        }
    }

    /// The ancestor chain of a type: the type itself, then its includes and
    /// superclass transitively, depth-first with cycle protection.
    #[must_use]
    pub fn ancestors(&self, type_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_ancestors(type_name, &mut out, &mut seen);
        out
    }

    fn collect_ancestors(
        &self,
        type_name: &str,
        out: &mut Vec<String>,
        seen: &mut FxHashSet<String>,
    ) {
        if out.len() >= MAX_ANCESTOR_WALK || !seen.insert(type_name.to_string()) {
            return;
        }
        out.push(type_name.to_string());

        let context = Some(type_name);
        for include in self.includes_of(type_name) {
            if let Some(resolved) = self.resolve_typeref_inner(include, context, 0) {
                self.collect_ancestors(&resolved, out, seen);
            }
        }
        if let Some(superclass) = self.effective_superclass(type_name) {
            if let Some(resolved) = self.resolve_typeref_inner(superclass, context, 0) {
                self.collect_ancestors(&resolved, out, seen);
            }
        }
    }

    /// Methods visible on `type_name` through its ancestor chain.
    ///
    /// `name` filters by method name; `class_method` filters by discipline
    /// (`None` lists both). The empty type name addresses file-level
    /// methods.
    #[must_use]
    pub fn methods_on(
        &self,
        type_name: &str,
        name: Option<&str>,
        class_method: Option<bool>,
    ) -> Vec<ElementId> {
        let mut out = Vec::new();
        if type_name.is_empty() {
            self.collect_methods_of("", name, class_method, &mut out);
            return out;
        }
        for ancestor in self.ancestors(type_name) {
            self.collect_methods_of(&ancestor, name, class_method, &mut out);
        }
        out
    }

    fn collect_methods_of(
        &self,
        type_name: &str,
        name: Option<&str>,
        class_method: Option<bool>,
        out: &mut Vec<ElementId>,
    ) {
        let ids: Vec<ElementId> = if type_name.is_empty() {
            // File-level methods are owned by the empty owner; scan files.
            self.elements_by_file
                .values()
                .flatten()
                .copied()
                .collect()
        } else {
            match self.find_type(type_name) {
                Some((_, element)) => element.children().to_vec(),
                None => return,
            }
        };
        for id in ids {
            let Some(PsiElement::Method(method)) = self.arena.get(id) else {
                continue;
            };
            if !type_name.is_empty() && method.owner != type_name {
                continue;
            }
            if type_name.is_empty() && !method.owner.is_empty() {
                continue;
            }
            if name.is_some_and(|wanted| method.common.name != wanted) {
                continue;
            }
            if class_method.is_some_and(|wanted| method.class_method != wanted) {
                continue;
            }
            out.push(id);
        }
    }

    /// Enum members of `enum_name`, in declaration order (additive across
    /// reopening files).
    #[must_use]
    pub fn enum_members(&self, enum_name: &str) -> Vec<ElementId> {
        match self.find_type(enum_name) {
            Some((_, PsiElement::Enum(el))) => el
                .children
                .iter()
                .copied()
                .filter(|&id| matches!(self.arena.get(id), Some(PsiElement::EnumMember(_))))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Look up one enum member by name.
    #[must_use]
    pub fn enum_member(&self, enum_name: &str, member: &str) -> Option<ElementId> {
        self.enum_members(enum_name)
            .into_iter()
            .find(|&id| self.arena.get(id).is_some_and(|el| el.name() == member))
    }

    // ===== Removal =====

    /// Tear down everything `file` contributed, restoring surviving types'
    /// winning definition to the first remaining file.
    pub fn remove_file(&mut self, file: &str) {
        debug!(file, "removing file from index");

        // Virtual expansions spawned by this file go first; they are files
        // in their own right.
        if let Some(virtuals) = self.virtual_files_by_origin.remove(file) {
            for virtual_uri in virtuals {
                self.remove_file(&virtual_uri);
            }
        }
        // A virtual file being removed directly must also disappear from its
        // origin's spawn list.
        if let Some(origin) = macro_expansion_origin(file) {
            if let Some(list) = self.virtual_files_by_origin.get_mut(origin) {
                list.retain(|uri| uri != file);
                if list.is_empty() {
                    self.virtual_files_by_origin.remove(origin);
                }
            }
        }

        if let Some(names) = self.types_by_file.remove(file) {
            for name in names {
                self.remove_type_contribution(&name, file);
            }
        }

        if let Some(includes) = self.includes_by_file.remove(file) {
            for (owner, included) in includes {
                for bucket in [&mut self.class_includes, &mut self.module_includes] {
                    if let Some(list) = bucket.get_mut(&owner) {
                        if let Some(pos) = list.iter().position(|tr| *tr == included) {
                            list.remove(pos);
                        }
                        if list.is_empty() {
                            bucket.remove(&owner);
                        }
                    }
                }
            }
        }

        if let Some(edges) = self.dependencies_by_file.remove(file) {
            for (owner, target) in edges {
                let mut drop_edge = false;
                if let Some(targets) = self.dependency_sources.get_mut(&owner) {
                    if let Some(files) = targets.get_mut(&target) {
                        files.shift_remove(file);
                        if files.is_empty() {
                            targets.remove(&target);
                            drop_edge = true;
                        }
                    }
                    if targets.is_empty() {
                        self.dependency_sources.remove(&owner);
                    }
                }
                if drop_edge {
                    if let Some(owners) = self.reverse_dependencies.get_mut(&target) {
                        owners.shift_remove(&owner);
                        if owners.is_empty() {
                            self.reverse_dependencies.remove(&target);
                        }
                    }
                }
            }
        }

        if let Some(ids) = self.elements_by_file.remove(file) {
            for id in ids {
                self.detach_element(id);
            }
        }

        self.macros.remove_file(file);
    }

    fn remove_type_contribution(&mut self, name: &str, file: &str) {
        if let Some(defs) = self.superclass_defs.get_mut(name) {
            defs.shift_remove(file);
            if defs.is_empty() {
                self.superclass_defs.remove(name);
            }
        }

        let Some(defs) = self.type_defs_by_name.get_mut(name) else {
            return;
        };
        defs.shift_remove(file);

        if defs.is_empty() {
            self.type_defs_by_name.remove(name);
            if let Some(id) = self.type_elements.remove(name) {
                self.arena.free(id);
            }
            return;
        }

        // Survivors: the first remaining file's definition wins.
        let (winner_file, winner_def) = match defs.first() {
            Some((file, def)) => (file.clone(), def.clone()),
            None => return,
        };
        if let Some(&id) = self.type_elements.get(name) {
            if let Some(element) = self.arena.get_mut(id) {
                let common = element.common_mut();
                common.file = Some(winner_file);
                common.location = winner_def.location;
            }
        }
    }

    fn detach_element(&mut self, id: ElementId) {
        let Some(element) = self.arena.free(id) else {
            return;
        };
        if let Some(owner) = element.owner_name().filter(|owner| !owner.is_empty()) {
            if let Some(&owner_id) = self.type_elements.get(owner) {
                if let Some(children) =
                    self.arena.get_mut(owner_id).and_then(PsiElement::children_mut)
                {
                    children.retain(|&child| child != id);
                }
            }
        }
        if let PsiElement::Alias(alias) = &element {
            if let Some(ids) = self.aliases_by_name.get_mut(&alias.common.name) {
                ids.retain(|existing| *existing != id);
                if ids.is_empty() {
                    self.aliases_by_name.remove(&alias.common.name);
                }
            }
        }
    }

    // ===== Incremental dependency closure =====

    /// Files that must be reindexed after `file` changes: the closure of
    /// reverse type-dependency edges starting from the file's type names,
    /// mapped back to the files defining (or referencing) those types.
    #[must_use]
    pub fn affected_files(&self, file: &str) -> Vec<String> {
        let mut affected_types: Vec<String> = Vec::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut queue: Vec<String> = self.types_in_file(file).to_vec();
        for name in &queue {
            seen.insert(name.clone());
        }

        while let Some(name) = queue.pop() {
            if let Some(owners) = self.reverse_dependencies.get(&name) {
                for owner in owners {
                    if seen.insert(owner.clone()) {
                        affected_types.push(owner.clone());
                        queue.push(owner.clone());
                    }
                }
            }
        }

        let mut out: Vec<String> = Vec::new();
        let mut out_seen: FxHashSet<String> = FxHashSet::default();
        let mut push = |uri: &str| {
            if uri != file && out_seen.insert(uri.to_string()) {
                out.push(uri.to_string());
            }
        };

        for type_name in &affected_types {
            if let Some(defs) = self.type_defs_by_name.get(type_name) {
                for uri in defs.keys() {
                    push(uri);
                }
            }
        }
        // File-level references (owner "") to the changed types.
        for changed in self.types_in_file(file) {
            if let Some(files) = self
                .dependency_sources
                .get("")
                .and_then(|targets| targets.get(changed))
            {
                for uri in files {
                    push(uri);
                }
            }
        }
        out
    }
}

impl SemanticIndex {
    /// Scoped entry into a macro-expansion virtual file: switches the
    /// current file and bumps the expansion depth, restoring both on drop.
    pub(crate) fn enter_expansion(&mut self, uri: &str) -> ExpansionGuard<'_> {
        let previous = self.current_file.replace(uri.to_string());
        self.macro_depth += 1;
        ExpansionGuard {
            index: self,
            previous,
        }
    }
}

/// Restores the prior current file and expansion depth when dropped.
pub struct ExpansionGuard<'a> {
    index: &'a mut SemanticIndex,
    previous: Option<String>,
}

impl Drop for ExpansionGuard<'_> {
    fn drop(&mut self) {
        self.index.current_file = self.previous.take();
        self.index.macro_depth = self.index.macro_depth.saturating_sub(1);
    }
}

impl std::ops::Deref for ExpansionGuard<'_> {
    type Target = SemanticIndex;

    fn deref(&self) -> &SemanticIndex {
        self.index
    }
}

impl std::ops::DerefMut for ExpansionGuard<'_> {
    fn deref_mut(&mut self) -> &mut SemanticIndex {
        self.index
    }
}

/// Restores the previously current file when dropped.
pub struct CurrentFileGuard<'a> {
    index: &'a mut SemanticIndex,
    previous: Option<String>,
}

impl Drop for CurrentFileGuard<'_> {
    fn drop(&mut self) {
        self.index.current_file = self.previous.take();
    }
}

impl std::ops::Deref for CurrentFileGuard<'_> {
    type Target = SemanticIndex;

    fn deref(&self) -> &SemanticIndex {
        self.index
    }
}

impl std::ops::DerefMut for CurrentFileGuard<'_> {
    fn deref_mut(&mut self) -> &mut SemanticIndex {
        self.index
    }
}
