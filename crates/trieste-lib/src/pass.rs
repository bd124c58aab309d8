//! The pass driver.
//!
//! A [`PassDef`] is a named rule list with a traversal direction and the
//! well-formedness declaration its output must satisfy. [`PassDef::run`]
//! applies the rules to a tree until a fixed point (or once, under
//! [`dir::once`]), splicing `Seq` results in place and transporting `Lift`
//! results up to their target ancestor.
//!
//! The driver never descends into `Error` or `Lift` nodes: an error, once
//! wrapped, is opaque to further rewriting.

use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error as ThisError;

use trieste_core::wf::Wellformed;
use trieste_core::{Error, Lift, Location, NoChange, Node, Seq, Token};

use crate::rewrite::{Match, Rule};

/// Traversal direction and modifier flags.
#[allow(non_upper_case_globals)]
pub mod dir {
    pub type Flag = u32;

    /// Rewrite children before their parent.
    pub const bottomup: Flag = 1 << 0;
    /// Rewrite parents before their children.
    pub const topdown: Flag = 1 << 1;
    /// Run a single iteration instead of reaching a fixed point.
    pub const once: Flag = 1 << 2;
}

/// Failures the driver itself can produce, as opposed to user errors that
/// travel through the tree as `Error` nodes.
#[derive(Debug, Clone, ThisError)]
pub enum RewriteError {
    /// A `Lift` node reached the root without finding its target ancestor.
    #[error("pass {pass}: lifted nodes with no destination")]
    DanglingLift { pass: String },
}

type CallbackFn = Rc<dyn Fn(&Node) -> usize>;

pub type Pass = Rc<PassDef>;

pub struct PassDef {
    name: String,
    wf: Wellformed,
    direction: dir::Flag,
    rules: Vec<Rule>,
    pre: HashMap<Token, CallbackFn>,
    post: HashMap<Token, CallbackFn>,
}

impl PassDef {
    pub fn new(
        name: impl Into<String>,
        wf: Wellformed,
        direction: dir::Flag,
        rules: Vec<Rule>,
    ) -> Self {
        PassDef {
            name: name.into(),
            wf,
            direction,
            rules,
            pre: HashMap::new(),
            post: HashMap::new(),
        }
    }

    /// Registers a callback invoked before rewriting the children of every
    /// node of the given kind. Its return value is counted as changes.
    pub fn pre(mut self, token: Token, f: impl Fn(&Node) -> usize + 'static) -> Self {
        self.pre.insert(token, Rc::new(f));
        self
    }

    /// Registers a callback invoked after rewriting the children of every
    /// node of the given kind.
    pub fn post(mut self, token: Token, f: impl Fn(&Node) -> usize + 'static) -> Self {
        self.post.insert(token, Rc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wf(&self) -> &Wellformed {
        &self.wf
    }

    pub(crate) fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn flag(&self, f: dir::Flag) -> bool {
        (self.direction & f) != 0
    }

    /// Applies the pass to `node`, returning `(iterations, total changes)`.
    /// The node is rewritten in place; the top node itself is never matched,
    /// only its descendants.
    pub fn run(&self, node: &Node) -> Result<(usize, usize), RewriteError> {
        let mut m = Match::new(node);
        let mut count = 0;
        let mut changes_sum = 0;

        loop {
            let changes = self.apply(node, &mut m);

            let lifted = self.lift(node);
            if !lifted.is_empty() {
                return Err(RewriteError::DanglingLift {
                    pass: self.name.clone(),
                });
            }

            changes_sum += changes;
            count += 1;

            if self.flag(dir::once) || changes == 0 {
                break;
            }
        }

        Ok((count, changes_sum))
    }

    fn apply(&self, node: &Node, m: &mut Match) -> usize {
        if node.token() == Error || node.token() == Lift {
            return 0;
        }

        let mut changes = 0;

        if let Some(f) = self.pre.get(&node.token()) {
            changes += f(node);
        }

        let mut it = 0;

        while it < node.len() {
            let child = node.child(it).expect("cursor in bounds");

            if child.token() == Error || child.token() == Lift {
                it += 1;
                continue;
            }

            if self.flag(dir::bottomup) {
                changes += self.apply(&child, m);
            }

            // -1: no rule fired; otherwise the number of inserted nodes.
            let mut replaced: isize = -1;

            for rule in &self.rules {
                let fast = rule.pattern.fast();
                if !fast.can_start(child.token()) || !fast.can_parent(node.token()) {
                    continue;
                }

                m.reset();
                let begin = it;

                if rule.pattern.matches(&mut it, node, m) {
                    let replace = (rule.effect)(m);

                    if replace.as_ref().is_some_and(|r| r.token() == NoChange) {
                        it = begin;
                        continue;
                    }

                    let loc = matched_location(node, begin, it);
                    node.erase(begin..it);
                    it = begin;

                    match replace {
                        None => replaced = 0,
                        Some(replace) if replace.token() == Seq => {
                            // Unpack the sequence in place.
                            let spliced = replace.children_vec();
                            for n in &spliced {
                                n.set_location(&loc);
                            }
                            replaced = spliced.len() as isize;
                            node.insert_all(it, spliced);
                        }
                        Some(replace) => {
                            replaced = 1;
                            replace.set_location(&loc);
                            node.insert(it, replace);
                        }
                    }

                    changes += replaced as usize;
                    break;
                }

                it = begin;
            }

            if self.flag(dir::once) {
                if self.flag(dir::topdown) && replaced != 0 {
                    // Move down into whatever now occupies the position.
                    let to = replaced.max(1) as usize;
                    for i in 0..to {
                        if let Some(c) = node.child(it + i) {
                            changes += self.apply(&c, m);
                        }
                    }
                }

                // Skip over everything examined or inserted.
                if replaced >= 0 {
                    it += replaced as usize;
                } else {
                    it += 1;
                }
            } else if replaced >= 0 {
                // Something happened: re-examine this node from the start.
                it = 0;
            } else {
                if self.flag(dir::topdown) {
                    changes += self.apply(&child, m);
                }
                it += 1;
            }
        }

        if let Some(f) = self.post.get(&node.token()) {
            changes += f(node);
        }

        changes
    }

    /// Extracts Lift children whose target matches `node`, splicing their
    /// contents in place; everything else bubbles up to the caller.
    fn lift(&self, node: &Node) -> Vec<Node> {
        let mut uplift = Vec::new();
        let mut it = 0;

        while it < node.len() {
            let child = node.child(it).expect("cursor in bounds");
            let mut advance = true;
            let mut lifted = self.lift(&child);

            if child.token() == Lift {
                lifted.insert(0, child);
                node.erase(it..it + 1);
                advance = false;
            }

            for lnode in lifted {
                let target = lnode.front().map(|f| f.token());
                if target == Some(node.token()) {
                    let contents = lnode.children_range(1..lnode.len());
                    it += contents.len();
                    node.insert_all(it - contents.len(), contents);
                    advance = false;
                } else {
                    uplift.push(lnode);
                }
            }

            if advance {
                it += 1;
            }
        }

        uplift
    }
}

fn matched_location(node: &Node, begin: usize, end: usize) -> Location {
    if end <= begin {
        return Location::default();
    }

    let first = node.child(begin).expect("matched range in bounds");
    let last = node.child(end - 1).expect("matched range in bounds");
    first.location().union(&last.location())
}
