//! The macro interpreter.
//!
//! Interprets a user macro body against a call's arguments and produces
//! textual source. The dialect is deliberately tiny: literals evaluate to
//! themselves, identifiers read the substitution environment, a handful of
//! methods work on values (`id`, `is_a?`, `stringify`, string `+`, and
//! `TypeDeclaration.{var,type,value}`), and `{% if %}` / `{% for %}` are the
//! only control forms. Unknown forms render as empty text; genuine failures
//! surface as `MacroError` and the caller discards the expansion.

use cryls_ast::node::{NamedArgument, Node, NodeKind};
use rustc_hash::FxHashMap;

use crate::macro_registry::MacroDefinition;

/// Interpretation failure; logged by the expander, never propagated further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroError {
    pub message: String,
}

impl MacroError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for MacroError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "macro interpretation failed: {}", self.message)
    }
}

impl std::error::Error for MacroError {}

/// A value inside the interpreter.
#[derive(Debug, Clone, PartialEq)]
enum MacroValue {
    /// A syntax node from the call site
    Node(Node),
    /// A string literal (content without quotes)
    Str(String),
    /// An identifier produced by `id` (renders without quotes)
    Id(String),
    Bool(bool),
    Nil,
}

impl MacroValue {
    /// Macro truthiness: everything except `nil`, `false` and `Nop`.
    fn truthy(&self) -> bool {
        match self {
            MacroValue::Nil => false,
            MacroValue::Bool(value) => *value,
            MacroValue::Node(node) => !node.is_nop(),
            MacroValue::Str(_) | MacroValue::Id(_) => true,
        }
    }

    /// Render into the expansion output.
    fn render(&self) -> String {
        match self {
            MacroValue::Node(node) => node_to_source(node),
            MacroValue::Str(content) => format!("\"{content}\""),
            MacroValue::Id(content) => content.clone(),
            MacroValue::Bool(value) => value.to_string(),
            MacroValue::Nil => "nil".to_string(),
        }
    }

    /// The identifier reading of a value (`id` semantics): string and
    /// symbol quoting is stripped, nodes render as source.
    fn id_text(&self) -> String {
        match self {
            MacroValue::Node(node) => match &node.kind {
                NodeKind::StringLiteral(content) | NodeKind::SymbolLiteral(content) => {
                    content.clone()
                }
                _ => node_to_source(node),
            },
            MacroValue::Str(content) | MacroValue::Id(content) => content.clone(),
            MacroValue::Bool(value) => value.to_string(),
            MacroValue::Nil => "nil".to_string(),
        }
    }
}

/// Interpret `definition` for a call with the given arguments, producing
/// expansion source text.
pub fn interpret(
    definition: &MacroDefinition,
    args: &[Node],
    named_args: &[NamedArgument],
) -> Result<String, MacroError> {
    let env = bind_parameters(definition, args, named_args)?;
    let mut out = String::new();
    render_body(&definition.body, &env, &mut out)?;
    Ok(out)
}

/// Bind call arguments to macro parameter names.
fn bind_parameters(
    definition: &MacroDefinition,
    args: &[Node],
    named_args: &[NamedArgument],
) -> Result<FxHashMap<String, MacroValue>, MacroError> {
    let mut env: FxHashMap<String, MacroValue> = FxHashMap::default();
    let mut positional = args.iter();

    for (idx, param) in definition.params.iter().enumerate() {
        let NodeKind::Arg {
            name,
            default_value,
            ..
        } = &param.kind
        else {
            return Err(MacroError::new("malformed macro parameter"));
        };

        if definition.splat_index == Some(idx) {
            let rest: Vec<Node> = positional.by_ref().cloned().collect();
            env.insert(
                name.clone(),
                MacroValue::Node(cryls_ast::make::tuple_literal(rest)),
            );
            continue;
        }

        if let Some(named) = named_args.iter().find(|named| named.name == *name) {
            env.insert(name.clone(), MacroValue::Node(named.value.clone()));
            continue;
        }
        match positional.next() {
            Some(arg) => {
                env.insert(name.clone(), MacroValue::Node(arg.clone()));
            }
            None => match default_value {
                Some(default) => {
                    env.insert(name.clone(), MacroValue::Node((**default).clone()));
                }
                None => {
                    return Err(MacroError::new(format!(
                        "missing argument for macro parameter '{name}'"
                    )));
                }
            },
        }
    }
    Ok(env)
}

fn render_body(
    node: &Node,
    env: &FxHashMap<String, MacroValue>,
    out: &mut String,
) -> Result<(), MacroError> {
    match &node.kind {
        NodeKind::Expressions(nodes) => {
            for child in nodes {
                render_body(child, env, out)?;
            }
            Ok(())
        }
        NodeKind::MacroLiteral(text) => {
            out.push_str(text);
            Ok(())
        }
        NodeKind::MacroExpression { exp } => {
            out.push_str(&eval(exp, env)?.render());
            Ok(())
        }
        NodeKind::MacroIf { cond, then, els } => {
            if eval(cond, env)?.truthy() {
                render_body(then, env, out)
            } else if let Some(els) = els {
                render_body(els, env, out)
            } else {
                Ok(())
            }
        }
        NodeKind::MacroFor { var, exp, body } => {
            let value = eval(exp, env)?;
            let elements = match &value {
                MacroValue::Node(node) => match &node.kind {
                    NodeKind::ArrayLiteral { elements, .. }
                    | NodeKind::TupleLiteral { elements } => elements.clone(),
                    _ => {
                        return Err(MacroError::new("for-loop source is not a collection"));
                    }
                },
                _ => return Err(MacroError::new("for-loop source is not a collection")),
            };
            for element in elements {
                let mut scoped = env.clone();
                scoped.insert(var.clone(), MacroValue::Node(element));
                render_body(body, &scoped, out)?;
            }
            Ok(())
        }
        // Unknown forms render as empty text.
        _ => Ok(()),
    }
}

fn eval(node: &Node, env: &FxHashMap<String, MacroValue>) -> Result<MacroValue, MacroError> {
    match &node.kind {
        NodeKind::StringLiteral(content) => Ok(MacroValue::Str(content.clone())),
        NodeKind::BoolLiteral(value) => Ok(MacroValue::Bool(*value)),
        NodeKind::NilLiteral => Ok(MacroValue::Nil),
        NodeKind::NumberLiteral(_)
        | NodeKind::SymbolLiteral(_)
        | NodeKind::Path { .. }
        | NodeKind::ArrayLiteral { .. }
        | NodeKind::TupleLiteral { .. }
        | NodeKind::TypeDeclaration { .. }
        | NodeKind::Nop => Ok(MacroValue::Node(node.clone())),
        NodeKind::Var { name } => Ok(env.get(name).cloned().unwrap_or(MacroValue::Nil)),
        NodeKind::Call {
            obj: None,
            name,
            args,
            ..
        } if args.is_empty() => Ok(env.get(name).cloned().unwrap_or(MacroValue::Nil)),
        NodeKind::Call {
            obj: Some(obj),
            name,
            args,
            ..
        } => {
            let receiver = eval(obj, env)?;
            eval_method(&receiver, name, args, env)
        }
        _ => Ok(MacroValue::Nil),
    }
}

fn eval_method(
    receiver: &MacroValue,
    name: &str,
    args: &[Node],
    env: &FxHashMap<String, MacroValue>,
) -> Result<MacroValue, MacroError> {
    match name {
        "id" => Ok(MacroValue::Id(receiver.id_text())),
        "stringify" => Ok(MacroValue::Str(receiver.render())),
        "+" => {
            let rhs = args
                .first()
                .map(|arg| eval(arg, env))
                .transpose()?
                .ok_or_else(|| MacroError::new("string '+' needs a right-hand side"))?;
            let (lhs_text, lhs_id) = match receiver {
                MacroValue::Str(content) => (content.clone(), false),
                MacroValue::Id(content) => (content.clone(), true),
                MacroValue::Node(node) => match &node.kind {
                    NodeKind::StringLiteral(content) => (content.clone(), false),
                    _ => return Err(MacroError::new("'+' receiver is not a string")),
                },
                _ => return Err(MacroError::new("'+' receiver is not a string")),
            };
            let rhs_text = rhs.id_text();
            let combined = format!("{lhs_text}{rhs_text}");
            Ok(if lhs_id {
                MacroValue::Id(combined)
            } else {
                MacroValue::Str(combined)
            })
        }
        "is_a?" => {
            let wanted = args
                .first()
                .and_then(Node::path_full)
                .unwrap_or_default();
            let actual = match receiver {
                MacroValue::Node(node) => node_kind_name(node),
                MacroValue::Str(_) => "StringLiteral",
                MacroValue::Id(_) => "MacroId",
                MacroValue::Bool(_) => "BoolLiteral",
                MacroValue::Nil => "NilLiteral",
            };
            Ok(MacroValue::Bool(actual == wanted))
        }
        "var" | "type" | "value" => match receiver {
            MacroValue::Node(node) => match &node.kind {
                NodeKind::TypeDeclaration {
                    var,
                    declared_type,
                    value,
                } => Ok(match name {
                    "var" => MacroValue::Node((**var).clone()),
                    "type" => MacroValue::Node((**declared_type).clone()),
                    _ => value
                        .as_ref()
                        .map_or(MacroValue::Nil, |value| MacroValue::Node((**value).clone())),
                }),
                _ => Ok(MacroValue::Nil),
            },
            _ => Ok(MacroValue::Nil),
        },
        _ => Ok(MacroValue::Nil),
    }
}

/// The node-kind name `is_a?` compares against.
fn node_kind_name(node: &Node) -> &'static str {
    match &node.kind {
        NodeKind::TypeDeclaration { .. } => "TypeDeclaration",
        NodeKind::StringLiteral(_) => "StringLiteral",
        NodeKind::SymbolLiteral(_) => "SymbolLiteral",
        NodeKind::NumberLiteral(_) => "NumberLiteral",
        NodeKind::BoolLiteral(_) => "BoolLiteral",
        NodeKind::NilLiteral => "NilLiteral",
        NodeKind::ArrayLiteral { .. } => "ArrayLiteral",
        NodeKind::TupleLiteral { .. } => "TupleLiteral",
        NodeKind::HashLiteral { .. } => "HashLiteral",
        NodeKind::RangeLiteral { .. } => "RangeLiteral",
        NodeKind::Path { .. } => "Path",
        NodeKind::Var { .. } => "Var",
        NodeKind::InstanceVar { .. } => "InstanceVar",
        NodeKind::Call { .. } => "Call",
        NodeKind::Assign { .. } => "Assign",
        NodeKind::Generic { .. } => "Generic",
        NodeKind::Nop => "Nop",
        _ => "ASTNode",
    }
}

/// Best-effort source rendering of a call-site node, used when a node value
/// is spliced into the expansion.
fn node_to_source(node: &Node) -> String {
    match &node.kind {
        NodeKind::StringLiteral(content) => format!("\"{content}\""),
        NodeKind::SymbolLiteral(content) => format!(":{content}"),
        NodeKind::NumberLiteral(text) => text.clone(),
        NodeKind::BoolLiteral(value) => value.to_string(),
        NodeKind::NilLiteral => "nil".to_string(),
        NodeKind::Var { name } | NodeKind::InstanceVar { name } | NodeKind::ClassVar { name } => {
            name.clone()
        }
        NodeKind::Call {
            obj: None,
            name,
            args,
            ..
        } if args.is_empty() => name.clone(),
        NodeKind::Path { .. } => node.path_full().unwrap_or_default(),
        NodeKind::Generic { .. } | NodeKind::Union { .. } => crate::typeref::TypeRef::from_node(node)
            .map(|typeref| typeref.display())
            .unwrap_or_default(),
        NodeKind::TypeDeclaration {
            var,
            declared_type,
            value,
        } => {
            let mut out = format!(
                "{} : {}",
                node_to_source(var),
                node_to_source(declared_type)
            );
            if let Some(value) = value {
                out.push_str(" = ");
                out.push_str(&node_to_source(value));
            }
            out
        }
        NodeKind::Assign { target, value } => {
            format!("{} = {}", node_to_source(target), node_to_source(value))
        }
        NodeKind::ArrayLiteral { elements, .. } | NodeKind::TupleLiteral { elements } => {
            let rendered: Vec<String> = elements.iter().map(node_to_source).collect();
            format!("[{}]", rendered.join(", "))
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryls_ast::make;
    use crate::element::Arity;
    use crate::macro_registry::arity_of;

    fn definition(params: Vec<Node>, splat_index: Option<usize>, body: Vec<Node>) -> MacroDefinition {
        let arity = if splat_index.is_some() {
            Arity::unbounded(0)
        } else {
            arity_of(&params, None)
        };
        MacroDefinition {
            scope: String::new(),
            name: "m".to_string(),
            params,
            splat_index,
            arity,
            body: make::expressions(body),
            file: "a.cr".to_string(),
            location: None,
        }
    }

    #[test]
    fn substitutes_arguments_into_literals() {
        // macro m(name) -> "def {{name.id}}; end"
        let def = definition(
            vec![make::arg("name")],
            None,
            vec![
                make::macro_literal("def "),
                make::macro_expression(make::call(
                    Some(make::var("name")),
                    "id",
                    vec![],
                )),
                make::macro_literal("; end\n"),
            ],
        );
        let out = interpret(&def, &[make::symbol_literal("status")], &[]).expect("expansion");
        assert_eq!(out, "def status; end\n");
    }

    #[test]
    fn if_selects_branch_by_truthiness() {
        let def = definition(
            vec![make::arg("flag")],
            None,
            vec![make::macro_if(
                make::var("flag"),
                vec![make::macro_literal("yes")],
                Some(vec![make::macro_literal("no")]),
            )],
        );
        assert_eq!(
            interpret(&def, &[make::bool_literal(true)], &[]).expect("expansion"),
            "yes"
        );
        assert_eq!(
            interpret(&def, &[make::nil_literal()], &[]).expect("expansion"),
            "no"
        );
        assert_eq!(
            interpret(&def, &[make::nop()], &[]).expect("expansion"),
            "no"
        );
    }

    #[test]
    fn for_iterates_array_elements() {
        let def = definition(
            vec![make::arg("names")],
            None,
            vec![make::macro_for(
                "n",
                make::var("names"),
                vec![
                    make::macro_literal("def "),
                    make::macro_expression(make::call(Some(make::var("n")), "id", vec![])),
                    make::macro_literal("; end\n"),
                ],
            )],
        );
        let arg = make::array_literal(
            vec![make::symbol_literal("a"), make::symbol_literal("b")],
            None,
        );
        assert_eq!(
            interpret(&def, &[arg], &[]).expect("expansion"),
            "def a; end\ndef b; end\n"
        );
    }

    #[test]
    fn type_declaration_accessors() {
        // macro m(decl) -> "def {{decl.var.id}} : {{decl.type}}; end"
        let def = definition(
            vec![make::arg("decl")],
            None,
            vec![
                make::macro_literal("def "),
                make::macro_expression(make::call(
                    Some(make::call(Some(make::var("decl")), "var", vec![])),
                    "id",
                    vec![],
                )),
                make::macro_literal(" : "),
                make::macro_expression(make::call(Some(make::var("decl")), "type", vec![])),
                make::macro_literal("; end\n"),
            ],
        );
        let decl = make::type_declaration(
            make::call(None, "size", vec![]),
            make::path(&["Int32"]),
            None,
        );
        assert_eq!(
            interpret(&def, &[decl], &[]).expect("expansion"),
            "def size : Int32; end\n"
        );
    }

    #[test]
    fn string_concat_and_stringify() {
        let def = definition(
            vec![make::arg("name")],
            None,
            vec![make::macro_expression(make::call(
                Some(make::call(
                    Some(make::var("name")),
                    "stringify",
                    vec![],
                )),
                "id",
                vec![],
            ))],
        );
        let out = interpret(&def, &[make::call(None, "level", vec![])], &[]).expect("expansion");
        assert_eq!(out, "level");

        let def = definition(
            vec![make::arg("a")],
            None,
            vec![make::macro_expression(make::call(
                Some(make::string_literal("get_")),
                "+",
                vec![make::var("a")],
            ))],
        );
        let out = interpret(&def, &[make::string_literal("x")], &[]).expect("expansion");
        assert_eq!(out, "\"get_x\"");
    }

    #[test]
    fn missing_required_argument_is_an_error() {
        let def = definition(vec![make::arg("name")], None, vec![]);
        let err = interpret(&def, &[], &[]).expect_err("should fail");
        assert!(err.message.contains("name"));
    }

    #[test]
    fn is_a_checks_node_kind() {
        let def = definition(
            vec![make::arg("x")],
            None,
            vec![make::macro_if(
                make::call(
                    Some(make::var("x")),
                    "is_a?",
                    vec![make::path(&["TypeDeclaration"])],
                ),
                vec![make::macro_literal("typed")],
                Some(vec![make::macro_literal("untyped")]),
            )],
        );
        let typed = make::type_declaration(
            make::call(None, "x", vec![]),
            make::path(&["Int32"]),
            None,
        );
        assert_eq!(interpret(&def, &[typed], &[]).expect("ok"), "typed");
        assert_eq!(
            interpret(&def, &[make::symbol_literal("x")], &[]).expect("ok"),
            "untyped"
        );
    }
}
