//! Signature help.
//!
//! Candidates follow the same dispatch as definition resolution (including
//! the constructor preference for `new` over `initialize`). The active
//! signature is the first whose arity admits the call, the active
//! parameter tracks the argument under the cursor, and both are clamped.

use cryls_ast::node::{Node, NodeKind};
use cryls_common::position::Position;
use cryls_index::PsiElement;
use serde::Serialize;

use crate::analysis::Analysis;
use crate::hover::method_documentation;
use crate::resolver::call_candidates_unfiltered;

#[derive(Debug, Clone, Serialize)]
pub struct ParameterInformation {
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureInformation {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub parameters: Vec<ParameterInformation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureHelp {
    pub signatures: Vec<SignatureInformation>,
    pub active_signature: u32,
    pub active_parameter: u32,
}

/// Signature help for the innermost active call at the cursor.
#[must_use]
pub fn signature_help(analysis: &Analysis<'_>) -> Option<SignatureHelp> {
    let call = active_call(analysis)?;
    let NodeKind::Call {
        args, named_args, ..
    } = &call.kind
    else {
        return None;
    };

    let candidates = call_candidates_unfiltered(analysis, call);
    if candidates.is_empty() {
        return None;
    }

    let mut signatures = Vec::new();
    let mut arities = Vec::new();
    for id in &candidates {
        let Some(PsiElement::Method(method)) = analysis.index.element(*id) else {
            continue;
        };
        let label = method.signature();
        signatures.push(SignatureInformation {
            documentation: Some(method_documentation(&label, method.common.doc.as_deref())),
            parameters: method
                .params
                .iter()
                .map(|param| ParameterInformation {
                    label: param.clone(),
                })
                .collect(),
            label,
        });
        arities.push(method.arity);
    }
    if signatures.is_empty() {
        return None;
    }

    let call_arity = u32::try_from(args.len() + named_args.len()).unwrap_or(u32::MAX);
    let active_signature = arities
        .iter()
        .position(|arity| arity.admits(call_arity))
        .unwrap_or(0);

    let active_parameter = active_parameter_index(
        analysis.position,
        args,
        named_args,
        &signatures[active_signature],
    );

    Some(SignatureHelp {
        signatures,
        active_signature: u32::try_from(active_signature).unwrap_or(0),
        active_parameter,
    })
}

/// The innermost enclosing call the cursor is "inside of": between the end
/// of the name and the end of the call, with parentheses or arguments.
fn active_call<'a>(analysis: &'a Analysis<'_>) -> Option<&'a Node> {
    let position = analysis.position;
    let mut path = analysis.ctx.full_path();
    if path.is_empty() {
        if let Some(previous) = analysis.ctx.previous_node {
            path.push(previous);
        }
    }
    path.into_iter().rev().find(|node| {
        let NodeKind::Call {
            args,
            named_args,
            has_parentheses,
            ..
        } = &node.kind
        else {
            return false;
        };
        if !has_parentheses && args.is_empty() && named_args.is_empty() {
            return false;
        }
        let after_name = node
            .name_range()
            .map_or(true, |range| position >= range.end);
        let before_end = node
            .end_location
            .is_none_or(|end| position <= end);
        after_name && before_end
    })
}

/// Positional index of the argument containing the cursor; named arguments
/// resolve to the parameter with that name when the signature has one.
fn active_parameter_index(
    position: Position,
    args: &[Node],
    named_args: &[cryls_ast::node::NamedArgument],
    signature: &SignatureInformation,
) -> u32 {
    let param_count = signature.parameters.len();
    let clamp = |idx: usize| -> u32 {
        let max = param_count.saturating_sub(1);
        u32::try_from(idx.min(max)).unwrap_or(0)
    };

    for (idx, named) in named_args.iter().enumerate() {
        let inside = named
            .value
            .range()
            .is_some_and(|range| range.contains(position));
        if inside {
            if let Some(param_idx) = signature
                .parameters
                .iter()
                .position(|param| param.label == named.name)
            {
                return clamp(param_idx);
            }
            return clamp(args.len() + idx);
        }
    }

    for (idx, arg) in args.iter().enumerate() {
        if arg.range().is_some_and(|range| range.contains(position)) {
            return clamp(idx);
        }
    }

    // Past the last argument: the next parameter slot.
    let past = args
        .iter()
        .filter(|arg| arg.end_location.is_some_and(|end| end < position))
        .count();
    clamp(past)
}
