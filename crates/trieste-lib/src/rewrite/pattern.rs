//! Pattern combinators.
//!
//! A [`Pattern`] wraps a combinator chain plus its precomputed
//! [`FastPattern`]. Sequencing is continuation-based: each combinator
//! carries an optional next-in-sequence pointer, and `p * q` appends `q` to
//! a copy of `p`'s chain. A pattern with no continuation accepts at the
//! current position.
//!
//! ```
//! use trieste_lib::rewrite::{inside, t};
//! use trieste_core::tokens;
//!
//! tokens! {
//!     Calculation = "calculation";
//!     Equals = "equals";
//!     Group = "grp";
//!     Ident = "ident" [print];
//!     Id = "id";
//! }
//!
//! let pattern = inside(Calculation)
//!     * (t(Equals) << ((t(Group) << t(Ident).cap(Id)) * t(Group)));
//! assert!(pattern.fast().can_parent(Calculation));
//! ```
//!
//! Misuse is rejected at construction time with a panic: captures are not
//! allowed inside `rep`, `pred`, `neg_pred` or `!`, and zero-width
//! combinators cannot be repeated.

use std::ops::{Div, Mul, Not, Shl, Shr};
use std::rc::Rc;

use regex_automata::meta::Regex;
use regex_automata::{Anchored, Input};

use trieste_core::{Node, Token};

use super::capture::Match;
use super::fast::FastPattern;

pub(crate) type PatternPtr = Rc<PatternDef>;
pub(crate) type ActionFn = Rc<dyn Fn(&[Node]) -> bool>;

pub(crate) enum PatternOp {
    Anything,
    TokenMatch(Vec<Token>),
    RegexMatch(Token, Regex, String),
    Inside(Vec<Token>),
    InsideStar(Vec<Token>),
    First,
    Last,
    Opt(PatternPtr),
    Rep(PatternPtr),
    Not(PatternPtr),
    Choice(PatternPtr, PatternPtr),
    Children(PatternPtr, PatternPtr),
    Pred(PatternPtr),
    NegPred(PatternPtr),
    Cap(Token, PatternPtr),
    Action(ActionFn, PatternPtr),
}

impl Clone for PatternOp {
    fn clone(&self) -> Self {
        use PatternOp::*;
        match self {
            Anything => Anything,
            TokenMatch(types) => TokenMatch(types.clone()),
            RegexMatch(t, re, src) => RegexMatch(*t, re.clone(), src.clone()),
            Inside(types) => Inside(types.clone()),
            InsideStar(types) => InsideStar(types.clone()),
            First => First,
            Last => Last,
            Opt(p) => Opt(p.clone()),
            Rep(p) => Rep(p.clone()),
            Not(p) => Not(p.clone()),
            Choice(a, b) => Choice(a.clone(), b.clone()),
            Children(a, b) => Children(a.clone(), b.clone()),
            Pred(p) => Pred(p.clone()),
            NegPred(p) => NegPred(p.clone()),
            Cap(t, p) => Cap(*t, p.clone()),
            Action(f, p) => Action(f.clone(), p.clone()),
        }
    }
}

pub(crate) struct PatternDef {
    pub(crate) op: PatternOp,
    pub(crate) next: Option<PatternPtr>,
    captures: bool,
}

impl PatternDef {
    pub(crate) fn leaf(op: PatternOp) -> PatternPtr {
        let captures = op_captures(&op);
        Rc::new(PatternDef {
            op,
            next: None,
            captures,
        })
    }

    pub(crate) fn has_captures(&self) -> bool {
        self.captures
    }

    /// If this chain is a single bare token match, its tokens.
    fn only_tokens(&self) -> Option<&[Token]> {
        match (&self.op, &self.next) {
            (PatternOp::TokenMatch(types), None) => Some(types),
            _ => None,
        }
    }

    /// Matches at child position `it` under `parent`, advancing `it` past
    /// the consumed children on success.
    pub(crate) fn matches(&self, it: &mut usize, parent: &Node, m: &mut Match) -> bool {
        use PatternOp::*;

        let matched = match &self.op {
            Anything => {
                if *it >= parent.len() {
                    return false;
                }
                *it += 1;
                true
            }

            TokenMatch(types) => match parent.child(*it) {
                Some(child) if types.contains(&child.token()) => {
                    *it += 1;
                    true
                }
                _ => return false,
            },

            RegexMatch(token, regex, _) => match parent.child(*it) {
                Some(child) if child.token() == *token => {
                    let location = child.location();
                    let text = location.view();
                    let input = Input::new(text).anchored(Anchored::Yes);
                    match regex.find(input) {
                        Some(found) if found.end() == text.len() => {
                            *it += 1;
                            true
                        }
                        _ => return false,
                    }
                }
                _ => return false,
            },

            Inside(types) => types.contains(&parent.token()),

            InsideStar(types) => {
                let mut node = Some(parent.clone());
                loop {
                    match node {
                        Some(n) if types.contains(&n.token()) => break true,
                        Some(n) => node = n.parent(),
                        None => return false,
                    }
                }
            }

            First => *it == 0,

            Last => *it == parent.len(),

            Opt(pattern) => {
                let backtrack_it = *it;
                let backtrack_frame = m.add_frame();
                if !pattern.matches(it, parent, m) {
                    *it = backtrack_it;
                    m.return_to_frame(backtrack_frame);
                }
                true
            }

            Rep(pattern) => {
                // Greedy; a partial advance on the failing iteration is
                // rolled back to the last full match. An iteration that
                // consumes nothing stops the loop.
                let mut curr = *it;
                while *it < parent.len() && pattern.matches(it, parent, m) {
                    if *it == curr {
                        break;
                    }
                    curr = *it;
                }
                *it = curr;
                true
            }

            Not(pattern) => {
                if *it >= parent.len() {
                    return false;
                }
                let mut probe = *it;
                *it += 1;
                !pattern.matches(&mut probe, parent, m)
            }

            Choice(first, second) => {
                let backtrack_it = *it;
                let backtrack_frame = first.has_captures().then(|| m.add_frame());

                if first.matches(it, parent, m) {
                    true
                } else {
                    *it = backtrack_it;
                    if let Some(frame) = backtrack_frame {
                        m.return_to_frame(frame);
                    }
                    second.matches(it, parent, m)
                }
            }

            Children(outer, inner) => {
                let begin = *it;
                if !outer.matches(it, parent, m) {
                    return false;
                }

                let Some(first) = parent.child(begin) else {
                    return false;
                };
                let mut inner_it = 0;
                inner.matches(&mut inner_it, &first, m)
            }

            Pred(pattern) => {
                let mut probe = *it;
                pattern.matches(&mut probe, parent, m)
            }

            NegPred(pattern) => {
                let mut probe = *it;
                !pattern.matches(&mut probe, parent, m)
            }

            Cap(name, pattern) => {
                let begin = *it;
                if !pattern.matches(it, parent, m) {
                    return false;
                }
                m.set(*name, parent.children_range(begin..*it));
                true
            }

            Action(action, pattern) => {
                let begin = *it;
                if !pattern.matches(it, parent, m) {
                    return false;
                }
                action(&parent.children_range(begin..*it))
            }
        };

        matched && self.match_continuation(it, parent, m)
    }

    fn match_continuation(&self, it: &mut usize, parent: &Node, m: &mut Match) -> bool {
        match &self.next {
            Some(next) => next.matches(it, parent, m),
            None => true,
        }
    }
}

fn op_captures(op: &PatternOp) -> bool {
    use PatternOp::*;
    match op {
        Cap(..) => true,
        Opt(p) | Action(_, p) => p.has_captures(),
        Choice(a, b) | Children(a, b) => a.has_captures() || b.has_captures(),
        _ => false,
    }
}

/// Copies a chain, appending `next` at its end.
fn with_continuation(def: &PatternDef, next: PatternPtr) -> PatternPtr {
    let appended = match &def.next {
        Some(curr) => with_continuation(curr, next),
        None => next,
    };
    let captures = op_captures(&def.op) || appended.has_captures();
    Rc::new(PatternDef {
        op: def.op.clone(),
        next: Some(appended),
        captures,
    })
}

/// A combinator chain with its precomputed dispatch filter.
#[derive(Clone)]
pub struct Pattern {
    def: PatternPtr,
    fast: FastPattern,
}

impl Pattern {
    pub(crate) fn new(def: PatternPtr, fast: FastPattern) -> Self {
        Pattern { def, fast }
    }

    pub(crate) fn def(&self) -> &PatternPtr {
        &self.def
    }

    pub fn fast(&self) -> &FastPattern {
        &self.fast
    }

    pub(crate) fn matches(&self, it: &mut usize, parent: &Node, m: &mut Match) -> bool {
        self.def.matches(it, parent, m)
    }

    /// Zero-or-one occurrence.
    pub fn opt(self) -> Pattern {
        let fast = FastPattern::match_opt(&self.fast);
        Pattern::new(PatternDef::leaf(PatternOp::Opt(self.def)), fast)
    }

    /// Greedy zero-or-more repetition. Captures are not allowed inside.
    ///
    /// Repeating collapses where it can: `p.rep().rep()` is `p.rep()` and
    /// `inside(tokens).rep()` matches any ancestor. Repeating a zero-width
    /// combinator is a construction error.
    pub fn rep(self) -> Pattern {
        use PatternOp::*;

        if self.def.next.is_none() {
            match &self.def.op {
                Rep(_) => return self,
                Inside(types) => {
                    return Pattern::new(
                        PatternDef::leaf(InsideStar(types.clone())),
                        FastPattern::match_any(),
                    );
                }
                InsideStar(_) => panic!("rep(inside(..).rep()) not allowed!"),
                First => panic!("rep(start()) not allowed!"),
                Last => panic!("rep(end()) not allowed!"),
                Pred(_) => panic!("rep(pred()) not allowed!"),
                NegPred(_) => panic!("rep(neg_pred()) not allowed!"),
                _ => {}
            }
        }

        if self.def.has_captures() {
            panic!("captures not allowed inside a repetition (rep)!");
        }

        let fast = FastPattern::match_opt(&self.fast);
        Pattern::new(PatternDef::leaf(Rep(self.def)), fast)
    }

    /// Positive zero-width lookahead. Captures are not allowed inside.
    pub fn pred(self) -> Pattern {
        if self.def.has_captures() {
            panic!("captures not allowed inside a predicate (pred)!");
        }
        Pattern::new(
            PatternDef::leaf(PatternOp::Pred(self.def)),
            FastPattern::match_pred(),
        )
    }

    /// Negative zero-width lookahead. Captures are not allowed inside.
    pub fn neg_pred(self) -> Pattern {
        if self.def.has_captures() {
            panic!("captures not allowed inside a predicate (neg_pred)!");
        }
        Pattern::new(
            PatternDef::leaf(PatternOp::NegPred(self.def)),
            FastPattern::match_pred(),
        )
    }

    /// Records the matched range under `name` in the rule's [`Match`].
    pub fn cap(self, name: Token) -> Pattern {
        let fast = self.fast.clone();
        Pattern::new(PatternDef::leaf(PatternOp::Cap(name, self.def)), fast)
    }

    /// Runs `f` over the matched range; the match fails when `f` does.
    pub fn action(self, f: impl Fn(&[Node]) -> bool + 'static) -> Pattern {
        let fast = self.fast.clone();
        Pattern::new(
            PatternDef::leaf(PatternOp::Action(Rc::new(f), self.def)),
            fast,
        )
    }
}

/// `p * q`: match `q` after `p` at the following position.
impl Mul for Pattern {
    type Output = Pattern;

    fn mul(self, rhs: Pattern) -> Pattern {
        let fast = FastPattern::match_seq(&self.fast, &rhs.fast);
        Pattern::new(with_continuation(&self.def, rhs.def), fast)
    }
}

/// `p / q`: try `p`, then `q` from the same position.
impl Div for Pattern {
    type Output = Pattern;

    fn div(self, rhs: Pattern) -> Pattern {
        let fast = FastPattern::match_choice(&self.fast, &rhs.fast);

        // Two bare token matches fuse into one.
        if let (Some(lhs_tokens), Some(rhs_tokens)) =
            (self.def.only_tokens(), rhs.def.only_tokens())
        {
            let mut types = lhs_tokens.to_vec();
            types.extend_from_slice(rhs_tokens);
            return Pattern::new(PatternDef::leaf(PatternOp::TokenMatch(types)), fast);
        }

        Pattern::new(
            PatternDef::leaf(PatternOp::Choice(self.def, rhs.def)),
            fast,
        )
    }
}

/// `!p`: succeed on a child where `p` does not match, consuming it.
/// Captures are not allowed inside.
impl Not for Pattern {
    type Output = Pattern;

    fn not(self) -> Pattern {
        if self.def.has_captures() {
            panic!("captures not allowed inside a negation (!)!");
        }
        Pattern::new(
            PatternDef::leaf(PatternOp::Not(self.def)),
            FastPattern::match_pred(),
        )
    }
}

/// `p << q`: match `q` against the children of the first node `p` matched.
impl Shl for Pattern {
    type Output = Pattern;

    fn shl(self, rhs: Pattern) -> Pattern {
        let fast = self.fast.clone();
        Pattern::new(
            PatternDef::leaf(PatternOp::Children(self.def, rhs.def)),
            fast,
        )
    }
}

/// Token arguments for [`t`] and [`inside`]: a single token or a list.
pub trait IntoTokens {
    fn into_tokens(self) -> Vec<Token>;
}

impl IntoTokens for Token {
    fn into_tokens(self) -> Vec<Token> {
        vec![self]
    }
}

impl<const N: usize> IntoTokens for [Token; N] {
    fn into_tokens(self) -> Vec<Token> {
        self.to_vec()
    }
}

impl IntoTokens for &[Token] {
    fn into_tokens(self) -> Vec<Token> {
        self.to_vec()
    }
}

/// Consume one child whose kind is in `tokens`.
pub fn t(tokens: impl IntoTokens) -> Pattern {
    let types = tokens.into_tokens();
    let starts = types.iter().copied().collect();
    Pattern::new(
        PatternDef::leaf(PatternOp::TokenMatch(types)),
        FastPattern::match_token(starts),
    )
}

/// Consume one child of kind `token` whose location text fully matches the
/// regex, anchored at both ends.
///
/// # Panics
///
/// Panics when the regex does not compile; pattern construction errors are
/// programmer errors.
pub fn re(token: Token, pattern: &str) -> Pattern {
    let regex = Regex::new(pattern)
        .unwrap_or_else(|e| panic!("invalid regex {pattern:?} in pattern: {e}"));
    Pattern::new(
        PatternDef::leaf(PatternOp::RegexMatch(token, regex, pattern.to_string())),
        FastPattern::match_token([token].into_iter().collect()),
    )
}

/// Zero-width: succeed iff the parent's kind is in `tokens`.
pub fn inside(tokens: impl IntoTokens) -> Pattern {
    let types = tokens.into_tokens();
    let parents = types.iter().copied().collect();
    Pattern::new(
        PatternDef::leaf(PatternOp::Inside(types)),
        FastPattern::match_parent(parents),
    )
}

/// Consume any one child.
pub fn any() -> Pattern {
    Pattern::new(
        PatternDef::leaf(PatternOp::Anything),
        FastPattern::match_any(),
    )
}

/// Zero-width: succeed iff at the first child position.
pub fn start() -> Pattern {
    Pattern::new(PatternDef::leaf(PatternOp::First), FastPattern::match_pred())
}

/// Zero-width: succeed iff past the last child.
pub fn end() -> Pattern {
    Pattern::new(PatternDef::leaf(PatternOp::Last), FastPattern::match_pred())
}

/// A rule effect: the replacement subtree, `None` to delete the matched
/// range, or a `NoChange` node to leave it untouched.
pub trait IntoEffect {
    fn into_effect(self) -> Option<Node>;
}

impl IntoEffect for Node {
    fn into_effect(self) -> Option<Node> {
        Some(self)
    }
}

impl IntoEffect for Option<Node> {
    fn into_effect(self) -> Option<Node> {
        self
    }
}

pub(crate) type EffectFn = Rc<dyn Fn(&mut Match) -> Option<Node>>;

/// A rewrite rule: a pattern and the effect that builds its replacement.
#[derive(Clone)]
pub struct Rule {
    pub(crate) pattern: Pattern,
    pub(crate) effect: EffectFn,
}

/// `pattern >> effect` builds a [`Rule`].
impl<F, R> Shr<F> for Pattern
where
    F: Fn(&mut Match) -> R + 'static,
    R: IntoEffect,
{
    type Output = Rule;

    fn shr(self, effect: F) -> Rule {
        Rule {
            pattern: self,
            effect: Rc::new(move |m| effect(m).into_effect()),
        }
    }
}
