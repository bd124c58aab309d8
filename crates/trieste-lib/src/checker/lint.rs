//! The lint rules, expressed as rewrite passes over reified patterns.

use std::rc::Rc;

use trieste_core::wf::Wellformed;
use trieste_core::{Error, ErrorAst, ErrorMsg, Group, NoChange, Node, TokenSet, flag};

use crate::pass::{Pass, PassDef, dir};
use crate::rewrite::{Match, any, inside, t};

use super::prefix::{Multiplicity, can_be_zero, multiplicity};
use super::reify::pattern_to_string;
use super::{TokenRegistry, pattern_wf, reified};

fn err(ast: Node, message: impl Into<String>) -> Node {
    Error << (ErrorAst << ast) << (ErrorMsg ^ message.into())
}

/// The fixed lint set over a reified pattern tree.
pub(crate) fn check_pattern(registry: TokenRegistry) -> Pass {
    use reified::*;

    Rc::new(PassDef::new(
        "check_pattern",
        pattern_wf(),
        dir::topdown | dir::once,
        vec![
            inside([Pred, NegPred]).rep() * t(Cap).cap(Cap) >> |m: &mut Match| {
                err(
                    m.node(Cap),
                    "Cannot have capture patterns inside predicates",
                )
            },

            inside(Not).rep() * t(Cap).cap(Cap) >> |m: &mut Match| {
                err(
                    m.node(Cap),
                    "Cannot have capture patterns inside a negation",
                )
            },

            inside(Rep).rep() * t(Cap).cap(Cap) >> |m: &mut Match| {
                err(
                    m.node(Cap),
                    "Cannot have capture patterns inside a repetition",
                )
            },

            // A repetition body that can match zero nodes never terminates.
            (t(Rep) << t(Group).cap(Group)) >> |m: &mut Match| {
                let body = m.node(Group);
                if can_be_zero(&body) {
                    err(
                        body.clone(),
                        format!(
                            "Pattern '{}' would be infinitely repeated",
                            pattern_to_string(&body)
                        ),
                    )
                } else {
                    NoChange.into()
                }
            },

            t(Last).cap(Last) * any() >> |m: &mut Match| {
                err(m.node(Last), "Cannot have pattern after 'end()'")
            },

            (t(Cap) << t(Group).cap(Group)) >> |m: &mut Match| {
                let captured = m.node(Group);
                if multiplicity(&captured) == Multiplicity::Zero {
                    err(
                        captured.clone(),
                        format!(
                            "Capture group '{}' is always empty",
                            pattern_to_string(&captured)
                        ),
                    )
                } else {
                    NoChange.into()
                }
            },

            (t(Children) << (t(Group).cap(Group) * t(Group).cap(Children))) >> |m: &mut Match| {
                let outer = m.node(Group);
                if multiplicity(&outer) != Multiplicity::One {
                    err(
                        outer.clone(),
                        format!(
                            "Parent pattern '{}' should match exactly one node",
                            pattern_to_string(&outer)
                        ),
                    )
                } else {
                    NoChange.into()
                }
            },

            (t(Not) << t(Group).cap(Group)) >> |m: &mut Match| {
                let negated = m.node(Group);
                if multiplicity(&negated) != Multiplicity::One {
                    err(
                        negated.clone(),
                        format!(
                            "Negated pattern '{}' should match exactly one node. \
                             Consider using negative lookahead instead.",
                            pattern_to_string(&negated)
                        ),
                    )
                } else {
                    NoChange.into()
                }
            },

            // Matching on internal tokens is not allowed.
            inside([TokenMatch, RegexMatch]) * t(TokenName).cap(TokenName)
                >> move |m: &mut Match| {
                    let name_node = m.node(TokenName);
                    let location = name_node.location();
                    match registry.get(location.view()) {
                        Some(token) if token.has(flag::internal) => {
                            err(name_node.clone(), "Cannot match on internal tokens")
                        }
                        _ => NoChange.into(),
                    }
                },
        ],
    ))
}

/// Optional lint: every token a pattern mentions must appear in the pass's
/// input or output WF, unless explicitly ignored.
pub(crate) fn check_tokens_exist(
    registry: TokenRegistry,
    prev_wf: Wellformed,
    result_wf: Wellformed,
    ignored: TokenSet,
) -> Pass {
    use reified::*;

    Rc::new(PassDef::new(
        "check_well_formedness",
        pattern_wf(),
        dir::topdown | dir::once,
        vec![
            inside([TokenMatch, RegexMatch, Inside, InsideStar]) * t(TokenName).cap(TokenName)
                >> move |m: &mut Match| {
                    let name_node = m.node(TokenName);
                    let location = name_node.location();
                    let name = location.view();

                    let Some(&token) = registry.get(name) else {
                        return NoChange.into();
                    };

                    if ignored.contains(&token)
                        || prev_wf.mentions(token)
                        || result_wf.mentions(token)
                    {
                        return NoChange.into();
                    }

                    Error
                        << (ErrorMsg
                            ^ format!(
                                "Token '{name}' is not defined in well-formedness rules"
                            ))
                },
        ],
    ))
}
