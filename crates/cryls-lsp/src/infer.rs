//! Best-effort type inference.
//!
//! Bounded, silent, and good enough for member completion on chained
//! calls: failures return `None` and the caller simply offers nothing.

use cryls_ast::node::{Node, NodeKind};
use cryls_common::limits::MAX_INFERENCE_DEPTH;
use cryls_index::{PsiElement, TypeRef};
use rustc_hash::FxHashMap;

use crate::analysis::Analysis;

/// Infer the type of an expression node at the cursor's scope.
#[must_use]
pub fn infer_type(analysis: &Analysis<'_>, node: &Node, depth: usize) -> Option<TypeRef> {
    if depth > MAX_INFERENCE_DEPTH {
        return None;
    }
    match &node.kind {
        // Type expressions evaluate to themselves.
        NodeKind::Path { .. }
        | NodeKind::Generic { .. }
        | NodeKind::Union { .. }
        | NodeKind::Metaclass { .. }
        | NodeKind::SelfLiteral => TypeRef::from_node(node),

        NodeKind::Var { .. } | NodeKind::InstanceVar { .. } | NodeKind::ClassVar { .. } => {
            analysis.env.lookup(node).cloned()
        }

        NodeKind::Cast { to, .. } | NodeKind::NilableCast { to, .. } => TypeRef::from_node(to),

        NodeKind::StringLiteral(_) => Some(TypeRef::named("String")),
        NodeKind::SymbolLiteral(_) => Some(TypeRef::named("Symbol")),
        NodeKind::NumberLiteral(text) => Some(TypeRef::named(if text.contains('.') {
            "Float64"
        } else {
            "Int32"
        })),
        NodeKind::BoolLiteral(_) => Some(TypeRef::named("Bool")),
        NodeKind::NilLiteral => Some(TypeRef::named("Nil")),
        NodeKind::RangeLiteral { .. } => Some(TypeRef::named("Range")),
        NodeKind::ArrayLiteral { of: Some(of), .. } => {
            Some(TypeRef::generic("Array", vec![TypeRef::from_node(of)?]))
        }
        NodeKind::HashLiteral { of: Some((key, value)), .. } => Some(TypeRef::generic(
            "Hash",
            vec![TypeRef::from_node(key)?, TypeRef::from_node(value)?],
        )),

        NodeKind::Call {
            obj,
            name,
            args,
            named_args,
            ..
        } => infer_call(analysis, obj.as_deref(), name, args, named_args.len(), depth),

        _ => None,
    }
}

fn infer_call(
    analysis: &Analysis<'_>,
    obj: Option<&Node>,
    name: &str,
    args: &[Node],
    named_count: usize,
    depth: usize,
) -> Option<TypeRef> {
    let arg_count = u32::try_from(args.len() + named_count).unwrap_or(u32::MAX);

    match obj {
        Some(receiver) => {
            // `Type.new` evaluates to the type itself.
            if name == "new" {
                if let Some(reference) = TypeRef::from_node(receiver) {
                    return Some(reference);
                }
            }

            let receiver_ref = infer_type(analysis, receiver, depth + 1)?;

            if name == "[]" {
                return index_access(&receiver_ref, args);
            }

            let class_method = matches!(
                receiver.kind,
                NodeKind::Path { .. } | NodeKind::Generic { .. } | NodeKind::Metaclass { .. }
            );
            method_return(analysis, &receiver_ref, class_method, name, arg_count)
        }
        None => {
            // Receiverless call: a method on the context type, following the
            // enclosing method's discipline.
            let context = analysis.context()?;
            let receiver_ref = TypeRef::named(context);
            method_return(
                analysis,
                &receiver_ref,
                analysis.in_class_method(),
                name,
                arg_count,
            )
        }
    }
}

/// Return-type lookup for `receiver.name(...)`, with generic substitution.
fn method_return(
    analysis: &Analysis<'_>,
    receiver: &TypeRef,
    class_method: bool,
    name: &str,
    arg_count: u32,
) -> Option<TypeRef> {
    let index = analysis.index;
    let owner = index.resolve_typeref(receiver, analysis.context())?;

    let candidates = index.methods_on(&owner, Some(name), Some(class_method));
    if candidates.is_empty() {
        return None;
    }

    let methods: Vec<&cryls_index::MethodElement> = candidates
        .iter()
        .filter_map(|&id| match index.element(id) {
            Some(PsiElement::Method(method)) => Some(method),
            _ => None,
        })
        .collect();

    // Narrow by strict arity when any candidate admits the call, then
    // prefer one that declares a return type.
    let narrowed: Vec<&cryls_index::MethodElement> = {
        let strict: Vec<&cryls_index::MethodElement> = methods
            .iter()
            .copied()
            .filter(|method| method.arity.admits(arg_count))
            .collect();
        if strict.is_empty() { methods } else { strict }
    };
    let method = narrowed
        .iter()
        .find(|method| method.return_type.is_some())
        .or_else(|| narrowed.first())?;
    let declared = method.return_type.clone()?;

    // Substitute the receiver's generic arguments for the owner's declared
    // type variables; `self` becomes the receiver.
    let mut bindings: FxHashMap<String, TypeRef> = FxHashMap::default();
    for (var, arg) in index.type_vars(&owner).iter().zip(receiver.args().iter()) {
        bindings.insert(var.clone(), arg.clone());
    }
    Some(declared.substitute(&bindings, receiver))
}

/// `receiver[index]` specialization.
fn index_access(receiver: &TypeRef, args: &[Node]) -> Option<TypeRef> {
    match receiver {
        TypeRef::Union(members) => {
            let specialized: Vec<TypeRef> = members
                .iter()
                .filter_map(|member| index_access(member, args))
                .collect();
            match specialized.len() {
                0 => None,
                1 => specialized.into_iter().next(),
                _ => Some(TypeRef::Union(specialized)),
            }
        }
        TypeRef::Named { name, args: type_args } => {
            let base = name.rsplit("::").next().unwrap_or(name);
            let ranged = args.len() != 1
                || matches!(args[0].kind, NodeKind::RangeLiteral { .. });
            match base {
                "Array" | "Slice" | "StaticArray" | "Deque" => {
                    if ranged {
                        Some(receiver.clone())
                    } else {
                        type_args.first().cloned()
                    }
                }
                "Hash" => type_args.get(1).cloned(),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryls_ast::make;
    use cryls_common::position::Position;
    use cryls_index::SemanticIndex;

    fn container_index() -> SemanticIndex {
        let mut index = SemanticIndex::new();
        // class Container(T); def value : T; end; def itself : self; end; end
        let tree = make::expressions(vec![make::class_def(
            make::path(&["Container"]),
            None,
            &["T"],
            vec![
                make::def_returning(
                    make::def_node("value", vec![], vec![]),
                    make::path(&["T"]),
                ),
                make::def_returning(make::def_node("itself", vec![], vec![]), make::self_literal()),
            ],
        )]);
        index.index_tree("file:///container.cr", &tree);
        index.index_tree(
            "file:///item.cr",
            &make::expressions(vec![make::class_def(
                make::path(&["Item"]),
                None,
                &[],
                vec![make::def_node("ping", vec![], vec![])],
            )]),
        );
        index
    }

    #[test]
    fn new_call_on_generic_yields_instantiated_type() {
        let index = container_index();
        let root = make::expressions(vec![]);
        let analysis = Analysis::new(&index, &root, Position::new(0, 0));
        let call = make::call(
            Some(make::generic(
                make::path(&["Container"]),
                vec![make::path(&["Item"])],
            )),
            "new",
            vec![],
        );
        let inferred = infer_type(&analysis, &call, 0).expect("type");
        assert_eq!(inferred.display(), "Container(Item)");
    }

    #[test]
    fn generic_return_substitution_through_chain() {
        let index = container_index();
        let root = make::expressions(vec![]);
        let analysis = Analysis::new(&index, &root, Position::new(0, 0));
        // Container(Item).new.value -> Item
        let chain = make::call(
            Some(make::call(
                Some(make::generic(
                    make::path(&["Container"]),
                    vec![make::path(&["Item"])],
                )),
                "new",
                vec![],
            )),
            "value",
            vec![],
        );
        let inferred = infer_type(&analysis, &chain, 0).expect("type");
        assert_eq!(inferred.display(), "Item");
    }

    #[test]
    fn self_return_becomes_the_receiver() {
        let index = container_index();
        let root = make::expressions(vec![]);
        let analysis = Analysis::new(&index, &root, Position::new(0, 0));
        let chain = make::call(
            Some(make::call(
                Some(make::generic(
                    make::path(&["Container"]),
                    vec![make::path(&["Item"])],
                )),
                "new",
                vec![],
            )),
            "itself",
            vec![],
        );
        let inferred = infer_type(&analysis, &chain, 0).expect("type");
        assert_eq!(inferred.display(), "Container(Item)");
    }

    #[test]
    fn index_access_specializes_containers() {
        let index = SemanticIndex::new();
        let root = make::expressions(vec![]);
        let analysis = Analysis::new(&index, &root, Position::new(0, 0));

        let array = TypeRef::generic("Array", vec![TypeRef::named("Item")]);
        let single = make::call(
            Some(make::cast(make::var("xs"), make::generic(
                make::path(&["Array"]),
                vec![make::path(&["Item"])],
            ))),
            "[]",
            vec![make::number_literal("0")],
        );
        assert_eq!(
            infer_type(&analysis, &single, 0).map(|t| t.display()),
            Some("Item".into())
        );

        // Range access keeps the container type.
        let ranged = make::call(
            Some(make::cast(make::var("xs"), make::generic(
                make::path(&["Array"]),
                vec![make::path(&["Item"])],
            ))),
            "[]",
            vec![make::range_literal(
                make::number_literal("0"),
                make::number_literal("2"),
                false,
            )],
        );
        assert_eq!(
            infer_type(&analysis, &ranged, 0).map(|t| t.display()),
            Some(array.display())
        );

        // Hash access yields the value type.
        let hash_access = make::call(
            Some(make::cast(make::var("h"), make::generic(
                make::path(&["Hash"]),
                vec![make::path(&["String"]), make::path(&["Int32"])],
            ))),
            "[]",
            vec![make::string_literal("k")],
        );
        assert_eq!(
            infer_type(&analysis, &hash_access, 0).map(|t| t.display()),
            Some("Int32".into())
        );
    }

    #[test]
    fn literals_have_builtin_types() {
        let index = SemanticIndex::new();
        let root = make::expressions(vec![]);
        let analysis = Analysis::new(&index, &root, Position::new(0, 0));
        let cases = [
            (make::string_literal("s"), "String"),
            (make::number_literal("1"), "Int32"),
            (make::number_literal("1.5"), "Float64"),
            (make::bool_literal(true), "Bool"),
            (make::nil_literal(), "Nil"),
        ];
        for (node, expected) in cases {
            assert_eq!(
                infer_type(&analysis, &node, 0).map(|t| t.display()),
                Some(expected.to_string())
            );
        }
        assert!(infer_type(&analysis, &make::tuple_literal(vec![]), 0).is_none());
    }

    #[test]
    fn union_receiver_uses_first_resolving_member() {
        let index = container_index();
        let root = make::expressions(vec![]);
        let analysis = Analysis::new(&index, &root, Position::new(0, 0));
        // (Nil | Item) receiver: method lookup skips Nil.
        let cast = make::cast(
            make::var("x"),
            make::union(vec![make::path(&["Nil"]), make::path(&["Item"])]),
        );
        let call = make::call(Some(cast), "ping", vec![]);
        // ping has no declared return type, so inference yields nothing,
        // but the owner resolution path must not bail on the union.
        assert!(infer_type(&analysis, &call, 0).is_none());
        let union = TypeRef::Union(vec![TypeRef::named("Nil"), TypeRef::named("Item")]);
        assert_eq!(index.resolve_typeref(&union, None).as_deref(), Some("Item"));
    }
}
