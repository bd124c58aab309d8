//! Reifying patterns into node trees.
//!
//! The combinator chain of a rule's pattern becomes a `Top << Group` tree
//! of reified op nodes, with token names and regex sources as printed
//! leaves. While reifying, every mentioned token is recorded in a registry
//! so the lints can resolve names back to kinds (and their flags).

use std::collections::HashMap;

use trieste_core::{Group, Node, Token, Top};

use crate::rewrite::{PatternDef, PatternOp, Rule};

use super::reified;

/// Reifies one rule's pattern; mentioned tokens land in `names`.
pub(crate) fn reify_rule(rule: &Rule, names: &mut HashMap<String, Token>) -> Node {
    Top << reify_group(rule.pattern.def(), names)
}

fn reify_group(def: &PatternDef, names: &mut HashMap<String, Token>) -> Node {
    let group = Node::new(Group);
    reify_chain(def, &group, names);
    group
}

fn reify_chain(def: &PatternDef, group: &Node, names: &mut HashMap<String, Token>) {
    group.push_back(reify_op(&def.op, names));
    if let Some(next) = &def.next {
        reify_chain(next, group, names);
    }
}

fn token_name(token: Token, names: &mut HashMap<String, Token>) -> Node {
    names.insert(token.name().to_string(), token);
    reified::TokenName ^ token.name()
}

fn reify_op(op: &PatternOp, names: &mut HashMap<String, Token>) -> Node {
    match op {
        PatternOp::Anything => reified::Any.into(),
        PatternOp::First => reified::First.into(),
        PatternOp::Last => reified::Last.into(),

        PatternOp::TokenMatch(types) => {
            let node = Node::new(reified::TokenMatch);
            for &t in types {
                node.push_back(token_name(t, names));
            }
            node
        }

        PatternOp::RegexMatch(token, _, source) => {
            (reified::RegexMatch << token_name(*token, names)) << (reified::Regex ^ source.as_str())
        }

        PatternOp::Inside(types) => {
            let node = Node::new(reified::Inside);
            for &t in types {
                node.push_back(token_name(t, names));
            }
            node
        }

        PatternOp::InsideStar(types) => {
            let node = Node::new(reified::InsideStar);
            for &t in types {
                node.push_back(token_name(t, names));
            }
            node
        }

        PatternOp::Opt(p) => reified::Opt << reify_group(p, names),
        PatternOp::Rep(p) => reified::Rep << reify_group(p, names),
        PatternOp::Not(p) => reified::Not << reify_group(p, names),
        PatternOp::Pred(p) => reified::Pred << reify_group(p, names),
        PatternOp::NegPred(p) => reified::NegPred << reify_group(p, names),
        PatternOp::Action(_, p) => reified::Action << reify_group(p, names),

        PatternOp::Choice(first, second) => {
            (reified::Choice << reify_group(first, names)) << reify_group(second, names)
        }

        PatternOp::Children(outer, inner) => {
            (reified::Children << reify_group(outer, names)) << reify_group(inner, names)
        }

        PatternOp::Cap(name, p) => {
            (reified::Cap << reify_group(p, names)) << token_name(*name, names)
        }
    }
}

/// Renders a reified pattern back into rule-DSL notation for messages.
pub(crate) fn pattern_to_string(pattern: &Node) -> String {
    use reified::*;

    let token = pattern.token();

    let comma_names = |node: &Node| {
        node.children()
            .map(|c| c.location().view().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    if token == First {
        "start()".to_string()
    } else if token == Last {
        "end()".to_string()
    } else if token == Any {
        "any()".to_string()
    } else if token == TokenMatch {
        format!("t({})", comma_names(pattern))
    } else if token == RegexMatch {
        let name = pattern.child(0).map(|c| c.location().view().to_string());
        let regex = pattern.child(1).map(|c| c.location().view().to_string());
        format!(
            "re({}, \"{}\")",
            name.unwrap_or_default(),
            regex.unwrap_or_default()
        )
    } else if token == Cap {
        let inner = pattern.child(0).map(|c| pattern_to_string(&c));
        let name = pattern.child(1).map(|c| c.location().view().to_string());
        format!(
            "({}).cap({})",
            inner.unwrap_or_default(),
            name.unwrap_or_default()
        )
    } else if token == Opt {
        format!("({}).opt()", inner_string(pattern, 0))
    } else if token == Rep {
        format!("({}).rep()", inner_string(pattern, 0))
    } else if token == Not {
        format!("!({})", inner_string(pattern, 0))
    } else if token == Pred {
        format!("({}).pred()", inner_string(pattern, 0))
    } else if token == NegPred {
        format!("({}).neg_pred()", inner_string(pattern, 0))
    } else if token == Action {
        format!("({}).action(..)", inner_string(pattern, 0))
    } else if token == Choice {
        format!(
            "({}) / ({})",
            inner_string(pattern, 0),
            inner_string(pattern, 1)
        )
    } else if token == Children {
        format!(
            "({}) << ({})",
            inner_string(pattern, 0),
            inner_string(pattern, 1)
        )
    } else if token == Inside {
        format!("inside({})", comma_names(pattern))
    } else if token == InsideStar {
        format!("inside({}).rep()", comma_names(pattern))
    } else {
        // A Group: its ops in sequence.
        pattern
            .children()
            .map(|c| pattern_to_string(&c))
            .collect::<Vec<_>>()
            .join(" * ")
    }
}

fn inner_string(pattern: &Node, index: usize) -> String {
    pattern
        .child(index)
        .map(|c| pattern_to_string(&c))
        .unwrap_or_default()
}
