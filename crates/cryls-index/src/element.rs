//! PSI elements - the entries of the semantic index.
//!
//! Each element represents one source-level symbol. Heterogeneous
//! collections are a tagged sum; elements live in a slot arena and refer to
//! each other by `ElementId` (children) or by qualified name (owners), so
//! there are no ownership cycles and file removal stays cheap.

use cryls_common::position::Range;

use crate::typeref::TypeRef;

/// Handle to an element in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u32);

/// Method arity: `min` counts the required positional parameters, `max` is
/// `None` when a splat parameter makes the method variadic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: u32,
    pub max: Option<u32>,
}

impl Arity {
    #[must_use]
    pub const fn fixed(min: u32, max: u32) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    #[must_use]
    pub const fn unbounded(min: u32) -> Self {
        Self { min, max: None }
    }

    /// Whether a call with `count` positional-plus-named arguments matches.
    #[must_use]
    pub fn admits(&self, count: u32) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

/// Fields shared by every element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementCommon {
    /// URI of the file this element (or its winning definition) came from
    pub file: Option<String>,
    /// Qualified name for types/aliases, bare name otherwise
    pub name: String,
    pub location: Option<Range>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleElement {
    pub common: ElementCommon,
    /// Qualified name of the enclosing module, if nested
    pub parent: Option<String>,
    pub children: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassElement {
    pub common: ElementCommon,
    /// Qualified name of the enclosing class/module
    pub owner: Option<String>,
    pub children: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumElement {
    pub common: ElementCommon,
    pub owner: Option<String>,
    /// Members first (in declaration order), then methods
    pub children: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasElement {
    pub common: ElementCommon,
    pub owner: Option<String>,
    /// `None` when the right-hand side could not be read as a type
    pub target: Option<TypeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodElement {
    pub common: ElementCommon,
    /// Qualified name of the owning type; empty for top-level methods
    pub owner: String,
    pub arity: Arity,
    /// True for `def self.x` - the method applies on the type itself
    pub class_method: bool,
    pub params: Vec<String>,
    pub return_type: Option<TypeRef>,
    /// Raw return-type spelling, kept for display
    pub return_type_str: Option<String>,
}

impl MethodElement {
    /// Signature line used by hover and signature help:
    /// `def Owner#name(a, b) : Ret` (class methods use `Owner.name`).
    #[must_use]
    pub fn signature(&self) -> String {
        let mut out = String::from("def ");
        if !self.owner.is_empty() {
            out.push_str(&self.owner);
            out.push(if self.class_method { '.' } else { '#' });
        }
        out.push_str(&self.common.name);
        out.push('(');
        out.push_str(&self.params.join(", "));
        out.push(')');
        if let Some(ret) = &self.return_type_str {
            out.push_str(" : ");
            out.push_str(ret);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMemberElement {
    pub common: ElementCommon,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceVarElement {
    pub common: ElementCommon,
    pub owner: String,
    pub type_string: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassVarElement {
    pub common: ElementCommon,
    pub owner: String,
    pub type_string: Option<String>,
}

/// Synthesized by the resolver for local bindings; never stored in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVarElement {
    pub common: ElementCommon,
    pub type_string: Option<String>,
}

/// An entry in the semantic index.
#[derive(Debug, Clone, PartialEq)]
pub enum PsiElement {
    Module(ModuleElement),
    Class(ClassElement),
    Enum(EnumElement),
    Alias(AliasElement),
    Method(MethodElement),
    EnumMember(EnumMemberElement),
    InstanceVar(InstanceVarElement),
    ClassVar(ClassVarElement),
    LocalVar(LocalVarElement),
}

impl PsiElement {
    #[must_use]
    pub fn common(&self) -> &ElementCommon {
        match self {
            PsiElement::Module(el) => &el.common,
            PsiElement::Class(el) => &el.common,
            PsiElement::Enum(el) => &el.common,
            PsiElement::Alias(el) => &el.common,
            PsiElement::Method(el) => &el.common,
            PsiElement::EnumMember(el) => &el.common,
            PsiElement::InstanceVar(el) => &el.common,
            PsiElement::ClassVar(el) => &el.common,
            PsiElement::LocalVar(el) => &el.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut ElementCommon {
        match self {
            PsiElement::Module(el) => &mut el.common,
            PsiElement::Class(el) => &mut el.common,
            PsiElement::Enum(el) => &mut el.common,
            PsiElement::Alias(el) => &mut el.common,
            PsiElement::Method(el) => &mut el.common,
            PsiElement::EnumMember(el) => &mut el.common,
            PsiElement::InstanceVar(el) => &mut el.common,
            PsiElement::ClassVar(el) => &mut el.common,
            PsiElement::LocalVar(el) => &mut el.common,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.common().name
    }

    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.common().file.as_deref()
    }

    #[must_use]
    pub fn location(&self) -> Option<Range> {
        self.common().location
    }

    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.common().doc.as_deref()
    }

    /// Children list for the container kinds.
    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        match self {
            PsiElement::Module(el) => &el.children,
            PsiElement::Class(el) => &el.children,
            PsiElement::Enum(el) => &el.children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<ElementId>> {
        match self {
            PsiElement::Module(el) => Some(&mut el.children),
            PsiElement::Class(el) => Some(&mut el.children),
            PsiElement::Enum(el) => Some(&mut el.children),
            _ => None,
        }
    }

    /// Qualified name of the owning container, where the kind has one.
    #[must_use]
    pub fn owner_name(&self) -> Option<&str> {
        match self {
            PsiElement::Module(el) => el.parent.as_deref(),
            PsiElement::Class(el) => el.owner.as_deref(),
            PsiElement::Enum(el) => el.owner.as_deref(),
            PsiElement::Alias(el) => el.owner.as_deref(),
            PsiElement::Method(el) => Some(&el.owner),
            PsiElement::EnumMember(el) => Some(&el.owner),
            PsiElement::InstanceVar(el) => Some(&el.owner),
            PsiElement::ClassVar(el) => Some(&el.owner),
            PsiElement::LocalVar(_) => None,
        }
    }

    /// Human-readable kind tag, used by outlines and debug dumps.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            PsiElement::Module(_) => "module",
            PsiElement::Class(_) => "class",
            PsiElement::Enum(_) => "enum",
            PsiElement::Alias(_) => "alias",
            PsiElement::Method(_) => "def",
            PsiElement::EnumMember(_) => "member",
            PsiElement::InstanceVar(_) => "ivar",
            PsiElement::ClassVar(_) => "cvar",
            PsiElement::LocalVar(_) => "local",
        }
    }
}

/// Slot arena for elements. Freed slots stay as tombstones; ids are never
/// reused within one index lifetime.
#[derive(Debug, Default)]
pub struct ElementArena {
    slots: Vec<Option<PsiElement>>,
}

impl ElementArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, element: PsiElement) -> ElementId {
        let id = ElementId(u32::try_from(self.slots.len()).unwrap_or(u32::MAX));
        self.slots.push(Some(element));
        id
    }

    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&PsiElement> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut PsiElement> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    pub fn free(&mut self, id: ElementId) -> Option<PsiElement> {
        self.slots.get_mut(id.0 as usize)?.take()
    }

    /// Live elements, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &PsiElement)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.as_ref()
                .map(|el| (ElementId(u32::try_from(idx).unwrap_or(u32::MAX)), el))
        })
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_matching() {
        let exact = Arity::fixed(2, 2);
        assert!(!exact.admits(1));
        assert!(exact.admits(2));
        assert!(!exact.admits(3));

        let optional = Arity::fixed(1, 3);
        assert!(optional.admits(1));
        assert!(optional.admits(3));

        let splat = Arity::unbounded(1);
        assert!(!splat.admits(0));
        assert!(splat.admits(17));
    }

    #[test]
    fn method_signature_rendering() {
        let method = MethodElement {
            common: ElementCommon {
                name: "fetch".to_string(),
                ..ElementCommon::default()
            },
            owner: "Store".to_string(),
            arity: Arity::fixed(1, 2),
            class_method: false,
            params: vec!["key".to_string(), "default".to_string()],
            return_type: Some(TypeRef::named("Int32")),
            return_type_str: Some("Int32".to_string()),
        };
        assert_eq!(method.signature(), "def Store#fetch(key, default) : Int32");

        let ctor = MethodElement {
            common: ElementCommon {
                name: "new".to_string(),
                ..ElementCommon::default()
            },
            owner: "Store".to_string(),
            arity: Arity::fixed(0, 0),
            class_method: true,
            params: vec![],
            return_type: None,
            return_type_str: None,
        };
        assert_eq!(ctor.signature(), "def Store.new()");
    }

    #[test]
    fn arena_alloc_free_iter() {
        let mut arena = ElementArena::new();
        let id = arena.alloc(PsiElement::LocalVar(LocalVarElement {
            common: ElementCommon {
                name: "x".to_string(),
                ..ElementCommon::default()
            },
            type_string: None,
        }));
        assert_eq!(arena.live_count(), 1);
        assert!(arena.get(id).is_some());
        assert!(arena.free(id).is_some());
        assert!(arena.get(id).is_none());
        assert_eq!(arena.live_count(), 0);
    }
}
