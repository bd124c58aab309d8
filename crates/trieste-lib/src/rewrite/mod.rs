//! The rewrite engine: patterns, capture state, and dispatch filters.
//!
//! Rules are written with the combinator DSL and combined into passes:
//!
//! - [`t`], [`re`], [`inside`], [`any`], [`start`], [`end`] build primitive
//!   patterns;
//! - `*` sequences, `/` chooses, `!` negates, `<<` descends into children;
//! - [`Pattern::opt`], [`Pattern::rep`], [`Pattern::pred`],
//!   [`Pattern::neg_pred`], [`Pattern::cap`], [`Pattern::action`] wrap;
//! - `pattern >> effect` builds a [`Rule`] whose effect reads captures from
//!   the [`Match`].

mod capture;
mod fast;
mod pattern;

pub use capture::Match;
pub use fast::FastPattern;
pub use pattern::{
    IntoEffect, IntoTokens, Pattern, Rule, any, end, inside, re, start, t,
};

pub(crate) use pattern::{PatternDef, PatternOp};
