//! Parsing hooks.
//!
//! The real parser is an external collaborator; the semantic core only
//! depends on the `SourceParser` trait. `StubParser` implements exactly the
//! dialect macro expansion emits (method stubs and instance-variable
//! declarations), so generated members can be re-indexed without the full
//! parser being wired in.

use cryls_common::position::Position;
use tracing::debug;

use crate::make;
use crate::node::{Node, NodeKind};

/// Turns source text into a syntax tree. Returning `None` means a parse
/// failure; the caller logs and skips.
pub trait SourceParser {
    fn parse(&self, path: &str, source: &str) -> Option<Node>;
}

impl<F> SourceParser for F
where
    F: Fn(&str, &str) -> Option<Node>,
{
    fn parse(&self, path: &str, source: &str) -> Option<Node> {
        self(path, source)
    }
}

/// Line-oriented parser for macro-generated source.
///
/// Understands `def name[=]?([params]) [: Type] ... end` (including the
/// one-line `def name; end` shape and `def self.name`), `@ivar : Type`
/// declarations, and blank lines. Anything else is skipped with a debug
/// log. A whole-file parse failure is only reported when nothing at all
/// could be recognized in a non-empty input.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubParser;

impl StubParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for StubParser {
    fn parse(&self, path: &str, source: &str) -> Option<Node> {
        let lines: Vec<&str> = source.lines().collect();
        let mut nodes: Vec<Node> = Vec::new();
        let mut saw_content = false;
        let mut recognized = 0usize;
        let mut line_idx = 0usize;

        while line_idx < lines.len() {
            let raw = lines[line_idx];
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                line_idx += 1;
                continue;
            }
            saw_content = true;

            if let Some(rest) = trimmed.strip_prefix("def ") {
                let consumed = parse_def(&lines, line_idx, raw, rest, &mut nodes);
                if consumed == 0 {
                    debug!(path, line = line_idx, "unparseable def in generated source");
                    line_idx += 1;
                } else {
                    recognized += 1;
                    line_idx += consumed;
                }
                continue;
            }

            if trimmed.starts_with('@') {
                if let Some(decl) = parse_ivar_declaration(raw, line_idx) {
                    nodes.push(decl);
                    recognized += 1;
                    line_idx += 1;
                    continue;
                }
            }

            debug!(path, line = line_idx, text = trimmed, "skipping unrecognized generated line");
            line_idx += 1;
        }

        if saw_content && recognized == 0 {
            return None;
        }
        Some(make::expressions(nodes))
    }
}

/// Parse one `def`; returns the number of lines consumed (0 on failure).
fn parse_def(lines: &[&str], line_idx: usize, raw: &str, rest: &str, out: &mut Vec<Node>) -> usize {
    let indent = indent_of(raw);
    let line = u32::try_from(line_idx).unwrap_or(u32::MAX);

    let (rest, is_class_method) = match rest.trim_start().strip_prefix("self.") {
        Some(stripped) => (stripped, true),
        None => (rest.trim_start(), false),
    };

    let name_len = rest
        .char_indices()
        .take_while(|(idx, ch)| {
            ch.is_alphanumeric()
                || *ch == '_'
                || *ch == '?'
                || *ch == '!'
                // A '=' is part of a setter name only right before '(' or EOL
                || (*ch == '=' && matches!(rest[idx + 1..].chars().next(), Some('(') | None))
        })
        .count();
    if name_len == 0 {
        return 0;
    }
    let name: String = rest.chars().take(name_len).collect();
    let mut signature = rest[rest
        .char_indices()
        .nth(name_len)
        .map_or(rest.len(), |(idx, _)| idx)..]
        .trim_start()
        .to_string();

    // One-line form: `def name(...); end`.
    let one_line = raw.contains(';');

    let mut args = Vec::new();
    let mut splat_index = None;
    if signature.starts_with('(') {
        let Some(close) = signature.find(')') else {
            return 0;
        };
        let params = signature[1..close].to_string();
        signature = signature[close + 1..].trim_start().to_string();
        for (param_idx, piece) in params
            .split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .enumerate()
        {
            let (piece, is_splat) = match piece.strip_prefix('*') {
                Some(stripped) => (stripped, true),
                None => (piece, false),
            };
            if is_splat {
                splat_index = Some(param_idx);
            }
            let (head, default) = match piece.split_once('=') {
                Some((head, default)) => (head.trim(), Some(default.trim())),
                None => (piece, None),
            };
            let (param_name, restriction) = match head.split_once(':') {
                Some((param_name, ty)) => (param_name.trim(), parse_type_text(ty.trim())),
                None => (head.trim(), None),
            };
            let mut arg = make::arg(param_name);
            if let NodeKind::Arg {
                default_value,
                restriction: slot,
                ..
            } = &mut arg.kind
            {
                *default_value = default.map(|text| Box::new(parse_literal_text(text)));
                *slot = restriction.map(Box::new);
            }
            out_arg_position(&mut arg, line);
            args.push(arg);
        }
    }

    // Return-type restriction.
    let mut return_type = None;
    if let Some(ty_text) = signature.strip_prefix(':') {
        let ty_text = ty_text.split(';').next().unwrap_or("").trim();
        return_type = parse_type_text(ty_text);
    }

    let (end_line, end_col, consumed) = if one_line {
        let end_col = u32::try_from(raw.trim_end().len()).unwrap_or(u32::MAX);
        (line, end_col, 1)
    } else {
        // Scan forward for the closing `end`.
        let mut offset = 1;
        loop {
            let Some(body_line) = lines.get(line_idx + offset) else {
                return 0;
            };
            if body_line.trim() == "end" {
                break;
            }
            offset += 1;
        }
        let end_line = u32::try_from(line_idx + offset).unwrap_or(u32::MAX);
        (end_line, indent + 3, offset + 1)
    };

    let mut def = make::def_node(&name, args, vec![]);
    if let NodeKind::Def {
        receiver,
        splat_index: slot,
        return_type: ret,
        ..
    } = &mut def.kind
    {
        if is_class_method {
            *receiver = Some(Box::new(make::self_literal()));
        }
        *slot = splat_index;
        *ret = return_type.map(Box::new);
    }
    let name_col = indent + 4 + if is_class_method { 5 } else { 0 };
    let def = def
        .at(line, indent, end_line, end_col)
        .named_at(line, name_col, u32::try_from(name.chars().count()).unwrap_or(0));
    out.push(def);
    consumed
}

fn out_arg_position(arg: &mut Node, line: u32) {
    arg.location = Some(Position::new(line, 0));
    arg.end_location = Some(Position::new(line, 0));
}

fn parse_ivar_declaration(raw: &str, line_idx: usize) -> Option<Node> {
    let trimmed = raw.trim();
    let (var_part, ty_part) = trimmed.split_once(':')?;
    let var_name = var_part.trim();
    if !var_name.starts_with('@') {
        return None;
    }
    let (ty_part, value) = match ty_part.split_once('=') {
        Some((ty, value)) => (ty.trim(), Some(parse_literal_text(value.trim()))),
        None => (ty_part.trim(), None),
    };
    let declared = parse_type_text(ty_part)?;
    let line = u32::try_from(line_idx).unwrap_or(u32::MAX);
    let indent = indent_of(raw);
    let var_node = if var_name.starts_with("@@") {
        make::cvar(var_name)
    } else {
        make::ivar(var_name)
    };
    Some(
        make::type_declaration(var_node, declared, value).at(
            line,
            indent,
            line,
            u32::try_from(raw.trim_end().len()).unwrap_or(u32::MAX),
        ),
    )
}

/// Parse a type expression of the shape `A::B`, `A(B, C)`, `A | B`.
fn parse_type_text(text: &str) -> Option<Node> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let union_parts: Vec<&str> = split_top_level(text, '|');
    if union_parts.len() > 1 {
        let members: Vec<Node> = union_parts
            .iter()
            .filter_map(|part| parse_type_text(part))
            .collect();
        if members.len() != union_parts.len() {
            return None;
        }
        return Some(make::union(members));
    }

    let (head, args) = match text.find('(') {
        Some(open) if text.ends_with(')') => {
            let inner = &text[open + 1..text.len() - 1];
            let args: Vec<Node> = split_top_level(inner, ',')
                .iter()
                .filter_map(|part| parse_type_text(part))
                .collect();
            (&text[..open], args)
        }
        _ => (text, Vec::new()),
    };

    let head = head.trim();
    let (head, global) = match head.strip_prefix("::") {
        Some(stripped) => (stripped, true),
        None => (head, false),
    };
    let names: Vec<&str> = head.split("::").collect();
    if names
        .iter()
        .any(|part| part.is_empty() || !part.chars().all(|ch| ch.is_alphanumeric() || ch == '_'))
    {
        return None;
    }
    let path = if global {
        make::global_path(&names)
    } else {
        make::path(&names)
    };
    if args.is_empty() {
        Some(path)
    } else {
        Some(make::generic(path, args))
    }
}

fn parse_literal_text(text: &str) -> Node {
    let text = text.trim();
    if text == "nil" {
        make::nil_literal()
    } else if text == "true" {
        make::bool_literal(true)
    } else if text == "false" {
        make::bool_literal(false)
    } else if text.starts_with('"') && text.ends_with('"') && text.len() >= 2 {
        make::string_literal(&text[1..text.len() - 1])
    } else if text.starts_with(':') {
        make::symbol_literal(&text[1..])
    } else if text.chars().next().is_some_and(|ch| ch.is_ascii_digit()) {
        make::number_literal(text)
    } else {
        make::nop()
    }
}

/// Split on `sep` at paren depth zero.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if ch == sep && depth == 0 => {
                parts.push(text[start..idx].trim());
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}

fn indent_of(raw: &str) -> u32 {
    u32::try_from(raw.len() - raw.trim_start().len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Node {
        StubParser::new()
            .parse("generated.cr", source)
            .expect("stub source should parse")
    }

    fn defs(node: &Node) -> Vec<&Node> {
        match &node.kind {
            NodeKind::Expressions(nodes) => nodes
                .iter()
                .filter(|n| matches!(n.kind, NodeKind::Def { .. }))
                .collect(),
            _ => panic!("expected Expressions root"),
        }
    }

    #[test]
    fn parses_one_line_def_stub() {
        let tree = parse("def name; end\ndef name=(value); end\n");
        let defs = defs(&tree);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name_str(), Some("name"));
        assert_eq!(defs[1].name_str(), Some("name="));
        if let NodeKind::Def { args, .. } = &defs[1].kind {
            assert_eq!(args.len(), 1);
        }
    }

    #[test]
    fn parses_multiline_def_with_types() {
        let tree = parse("def fetch(key : String, default = nil) : Int32 | Nil\n  body\nend\n");
        let defs = defs(&tree);
        assert_eq!(defs.len(), 1);
        let NodeKind::Def {
            args,
            return_type,
            splat_index,
            ..
        } = &defs[0].kind
        else {
            panic!("expected def");
        };
        assert_eq!(args.len(), 2);
        assert!(splat_index.is_none());
        let ret = return_type.as_ref().expect("return type");
        assert!(matches!(ret.kind, NodeKind::Union { .. }));
        assert_eq!(defs[0].location.map(|p| p.line), Some(0));
        assert_eq!(defs[0].end_location.map(|p| p.line), Some(2));
    }

    #[test]
    fn parses_class_method_and_splat() {
        let tree = parse("def self.build(*parts); end");
        let defs = defs(&tree);
        let NodeKind::Def {
            receiver,
            splat_index,
            ..
        } = &defs[0].kind
        else {
            panic!("expected def");
        };
        assert!(receiver.is_some());
        assert_eq!(*splat_index, Some(0));
    }

    #[test]
    fn parses_ivar_declaration() {
        let tree = parse("@name : String\n");
        let NodeKind::Expressions(nodes) = &tree.kind else {
            panic!();
        };
        assert!(matches!(nodes[0].kind, NodeKind::TypeDeclaration { .. }));
    }

    #[test]
    fn rejects_fully_unrecognized_source() {
        assert!(StubParser::new().parse("x.cr", "class What\nend\n").is_none());
    }
}
