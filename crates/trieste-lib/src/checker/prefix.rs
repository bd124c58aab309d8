//! Multiplicity analysis and the prefix-shadowing relation.

use trieste_core::{Group, Node};

use super::reified;

/// The expected number of nodes a reified pattern consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Multiplicity {
    Zero,
    One,
    Unknown,
}

pub(crate) fn multiplicity(pattern: &Node) -> Multiplicity {
    use reified::*;

    let token = pattern.token();

    if token.in_list(&[First, Last, Inside, InsideStar, Pred, NegPred]) {
        return Multiplicity::Zero;
    }

    if token.in_list(&[Any, RegexMatch, TokenMatch, Not]) {
        return Multiplicity::One;
    }

    if token.in_list(&[Opt, Rep]) {
        return Multiplicity::Unknown;
    }

    if token.in_list(&[Children, Cap, Action]) {
        return match pattern.front() {
            Some(inner) => multiplicity(&inner),
            None => Multiplicity::Unknown,
        };
    }

    if token == Choice {
        let left = pattern.child(0).map(|n| multiplicity(&n));
        let right = pattern.child(1).map(|n| multiplicity(&n));
        return match (left, right) {
            (Some(l), Some(r)) if l == r => l,
            _ => Multiplicity::Unknown,
        };
    }

    if token == Group {
        let mut sum = Multiplicity::Zero;
        for child in pattern.children() {
            let m = multiplicity(&child);
            sum = match (sum, m) {
                (Multiplicity::Zero, m) => m,
                (sum, Multiplicity::Zero) => sum,
                _ => Multiplicity::Unknown,
            };
        }
        return sum;
    }

    Multiplicity::Unknown
}

/// True when the pattern can succeed while consuming no nodes. Repeating
/// such a pattern never terminates.
pub(crate) fn can_be_zero(pattern: &Node) -> bool {
    use reified::*;

    let token = pattern.token();

    if token.in_list(&[First, Last, Inside, InsideStar, Pred, NegPred, Opt, Rep]) {
        return true;
    }

    if token.in_list(&[Any, RegexMatch, TokenMatch, Not]) {
        return false;
    }

    if token.in_list(&[Children, Cap, Action]) {
        return pattern.front().is_none_or(|inner| can_be_zero(&inner));
    }

    if token == Choice {
        return pattern.children().any(|arm| can_be_zero(&arm));
    }

    if token == Group {
        return pattern.children().all(|child| can_be_zero(&child));
    }

    true
}

/// The token names matched by a multiplicity-one pattern; empty when the
/// pattern matches zero or several nodes.
pub(crate) fn only_tokens(pattern: &Node) -> Vec<String> {
    use reified::*;

    let mut pattern = pattern.clone();
    if pattern.token() == Cap || pattern.token() == Children {
        match pattern.front() {
            Some(inner) => pattern = inner,
            None => return Vec::new(),
        }
    }

    if pattern.token() == TokenMatch {
        return pattern
            .children()
            .map(|c| c.location().view().to_string())
            .collect();
    }

    if pattern.token() == RegexMatch {
        return pattern
            .front()
            .map(|c| vec![c.location().view().to_string()])
            .unwrap_or_default();
    }

    if pattern.token() == Group {
        let mut tokens = Vec::new();
        for child in pattern.children() {
            match multiplicity(&child) {
                Multiplicity::Zero => {}
                Multiplicity::One if tokens.is_empty() => {
                    tokens = only_tokens(&child);
                }
                _ => {
                    tokens.clear();
                    break;
                }
            }
        }
        return tokens;
    }

    Vec::new()
}

fn names_of(pattern: &Node) -> Vec<String> {
    pattern
        .children()
        .map(|c| c.location().view().to_string())
        .collect()
}

fn subset_of(subset: &[String], superset: &[String]) -> bool {
    subset.iter().all(|name| superset.contains(name))
}

/// Depth-first traversal over reified pattern trees, descending into groups
/// pushed explicitly.
struct StackedIterator {
    stack: Vec<(Node, usize)>,
}

impl StackedIterator {
    fn new(root: &Node) -> Self {
        let mut it = StackedIterator {
            stack: vec![(root.clone(), 0)],
        };
        it.settle();
        it
    }

    fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    fn current(&self) -> Option<Node> {
        let (node, index) = self.stack.last()?;
        node.child(*index)
    }

    fn push(&mut self, node: Node) {
        self.stack.push((node, 0));
        self.settle();
    }

    fn advance(&mut self) {
        if let Some(last) = self.stack.last_mut() {
            last.1 += 1;
        }
        self.settle();
    }

    /// Pops exhausted levels, advancing the level below each pop.
    fn settle(&mut self) {
        while let Some((node, index)) = self.stack.last() {
            if *index < node.len() {
                break;
            }
            self.stack.pop();
            if let Some(last) = self.stack.last_mut() {
                last.1 += 1;
            }
        }
    }
}

/// True when `prefix` matches whenever the longer `pattern` matches, making
/// a rule with `pattern` unreachable behind one with `prefix`. Heuristic:
/// false negatives allowed, false positives not.
pub(crate) fn includes_prefix(prefix: &Node, pattern: &Node) -> bool {
    use reified::*;

    if prefix.token() != Group || pattern.token() != Group {
        return false;
    }

    let mut prefix_it = StackedIterator::new(prefix);
    let mut pattern_it = StackedIterator::new(pattern);

    while !prefix_it.is_empty() && !pattern_it.is_empty() {
        let Some(prefix_node) = prefix_it.current() else {
            break;
        };
        let Some(pattern_node) = pattern_it.current() else {
            break;
        };

        // Captures are transparent on both sides.
        if prefix_node.token() == Cap {
            match prefix_node.front() {
                Some(inner) => {
                    prefix_it.push(inner);
                    continue;
                }
                None => return false,
            }
        }

        if pattern_node.token() == Cap {
            match pattern_node.front() {
                Some(inner) => {
                    pattern_it.push(inner);
                    continue;
                }
                None => return false,
            }
        }

        if prefix_node.token() == Inside || prefix_node.token() == InsideStar {
            // Assume parent filters appear in the same position.
            if pattern_node.token() != prefix_node.token() {
                return false;
            }
            if !subset_of(&names_of(&pattern_node), &names_of(&prefix_node)) {
                return false;
            }
        } else if prefix_node.token() == First || prefix_node.token() == Last {
            if pattern_node.token() != prefix_node.token() {
                return false;
            }
        } else if pattern_node
            .token()
            .in_list(&[Inside, InsideStar, First, Last])
        {
            // The prefix is more general than the zero-width constraint.
            pattern_it.advance();
            continue;
        } else if prefix_node.token() == TokenMatch {
            let tokens = only_tokens(&pattern_node);
            if tokens.is_empty() || !subset_of(&tokens, &names_of(&prefix_node)) {
                return false;
            }
        } else if prefix_node.token() == Children {
            if pattern_node.token() != Children {
                return false;
            }

            let arms = |node: &Node| (node.child(0), node.child(1));
            let (p_outer, p_inner) = arms(&prefix_node);
            let (n_outer, n_inner) = arms(&pattern_node);

            match (p_outer, p_inner, n_outer, n_inner) {
                (Some(po), Some(pi), Some(no), Some(ni)) => {
                    if !includes_prefix(&po, &no) || !includes_prefix(&pi, &ni) {
                        return false;
                    }
                }
                _ => return false,
            }
        } else if prefix_node.token() == Any {
            // Any covers exactly one consumed node; skip zero-width noise.
            let mut target = pattern_node;
            let mut exhausted = false;
            while multiplicity(&target) == Multiplicity::Zero {
                pattern_it.advance();
                match pattern_it.current() {
                    Some(next) => target = next,
                    None => {
                        exhausted = true;
                        break;
                    }
                }
            }
            if exhausted {
                continue;
            }
            if multiplicity(&target) != Multiplicity::One {
                return false;
            }
        } else if prefix_node.token() == Rep || prefix_node.token() == Opt {
            // Repetitions and options must be structurally equivalent.
            if pattern_node.token() != prefix_node.token() {
                return false;
            }

            match (prefix_node.front(), pattern_node.front()) {
                (Some(p), Some(n)) => {
                    if !includes_prefix(&p, &n) || !includes_prefix(&n, &p) {
                        return false;
                    }
                }
                _ => return false,
            }
        } else {
            // Unhandled combinator in the prefix: assume no shadowing.
            return false;
        }

        prefix_it.advance();
        pattern_it.advance();
    }

    prefix_it.is_empty()
}
