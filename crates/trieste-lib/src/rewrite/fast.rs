//! Precomputed dispatch filters.
//!
//! A [`FastPattern`] summarizes, for a whole rule pattern, which token kinds
//! its first consumed child can be (`starts`) and which parent kinds it can
//! fire under (`parents`). The pass driver uses both to skip rules that
//! provably cannot match at the current position. An empty set means "any";
//! `pass_through` marks patterns that can consume nothing, so their
//! continuation also constrains the first token.
//!
//! Examples of the algebra:
//! - `t(Foo)` → starts {Foo}, parents any
//! - `t(Foo).opt()` → starts {Foo} but pass-through, so `t(Foo).opt() *
//!   t(Bar)` starts {Foo, Bar}
//! - `inside(Foo)` → starts any (zero-width), parents {Foo}
//! - `inside(Foo) / inside(Bar)` → parents {Foo, Bar}; sequencing
//!   intersects parents instead.

use trieste_core::{Token, TokenSet};

#[derive(Clone, Debug)]
pub struct FastPattern {
    /// Empty means any first token, unless `pass_through` treats this
    /// pattern as consuming nothing.
    starts: TokenSet,
    /// Empty means any parent.
    parents: TokenSet,
    /// True when the pattern can consume nothing, letting the continuation
    /// consume the first token.
    pass_through: bool,
}

impl FastPattern {
    fn new(starts: TokenSet, parents: TokenSet, pass_through: bool) -> Self {
        FastPattern {
            starts,
            parents,
            pass_through,
        }
    }

    /// True when any first token can be consumed outright.
    fn any_first(&self) -> bool {
        self.starts.is_empty() && !self.pass_through
    }

    pub fn match_any() -> Self {
        FastPattern::new(TokenSet::new(), TokenSet::new(), false)
    }

    /// Zero-width patterns (predicates, Start/End).
    pub fn match_pred() -> Self {
        FastPattern::new(TokenSet::new(), TokenSet::new(), true)
    }

    pub fn match_token(starts: TokenSet) -> Self {
        FastPattern::new(starts, TokenSet::new(), false)
    }

    pub fn match_parent(parents: TokenSet) -> Self {
        FastPattern::new(TokenSet::new(), parents, true)
    }

    pub fn match_opt(pattern: &FastPattern) -> Self {
        if pattern.any_first() {
            return pattern.clone();
        }
        FastPattern::new(pattern.starts.clone(), TokenSet::new(), true)
    }

    pub fn match_choice(lhs: &FastPattern, rhs: &FastPattern) -> Self {
        let mut pass_through = lhs.pass_through || rhs.pass_through;
        let mut starts = TokenSet::new();

        // An any-first disjunct annihilates the starts filter.
        if !lhs.any_first() && !rhs.any_first() {
            starts.extend(lhs.starts.iter().copied());
            starts.extend(rhs.starts.iter().copied());
        } else {
            pass_through = false;
        }

        // Empty is the universal parent set and absorbs the union.
        let parents = if !lhs.parents.is_empty() && !rhs.parents.is_empty() {
            lhs.parents.union(&rhs.parents).copied().collect()
        } else {
            TokenSet::new()
        };

        FastPattern::new(starts, parents, pass_through)
    }

    pub fn match_seq(lhs: &FastPattern, rhs: &FastPattern) -> Self {
        let mut starts = TokenSet::new();
        let mut pass_through = false;

        if lhs.pass_through {
            if rhs.any_first() {
                // Pass-through into an annihilator accepts any first token.
            } else {
                starts.extend(lhs.starts.iter().copied());
                starts.extend(rhs.starts.iter().copied());
                pass_through = lhs.pass_through && rhs.pass_through;
            }
        } else {
            starts = lhs.starts.clone();
        }

        // Parents intersect; empty is universal.
        let parents = if lhs.parents.is_empty() {
            rhs.parents.clone()
        } else if rhs.parents.is_empty() {
            lhs.parents.clone()
        } else {
            lhs.parents.intersection(&rhs.parents).copied().collect()
        };

        FastPattern::new(starts, parents, pass_through)
    }

    pub fn starts(&self) -> &TokenSet {
        &self.starts
    }

    pub fn parents(&self) -> &TokenSet {
        &self.parents
    }

    /// Dispatch test: can a match begin on a child of this kind?
    pub fn can_start(&self, token: Token) -> bool {
        self.starts.is_empty() || self.starts.contains(&token)
    }

    /// Dispatch test: can a match fire under a parent of this kind?
    pub fn can_parent(&self, token: Token) -> bool {
        self.parents.is_empty() || self.parents.contains(&token)
    }
}
