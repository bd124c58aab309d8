//! Trieste: a term-rewriting toolkit for compiler-like pipelines.
//!
//! Source text parses into a tagged tree, then transforms through a
//! sequence of passes. Each pass is a set of declarative pattern-to-action
//! rules plus a machine-checked shape declaration for its output.
//!
//! # Architecture
//!
//! - [`rewrite`]: pattern combinators, capture state, dispatch filters
//! - [`pass`]: a rule list applied to a fixed point with Seq/Lift handling
//! - [`process`]: sequencing passes with validation and statistics
//! - [`reader`] / [`writer`] / [`rewriter`]: pipeline adapters front-ends
//!   hang their languages on
//! - [`parse`]: the Group-tree builder front-end tokenizers drive
//! - [`checker`]: static lint over reified rule patterns
//! - [`fuzzer`]: randomized differential testing against the declared shapes
//! - [`trace`] / [`diagnostics`]: run instrumentation and error rendering
//!
//! The data model (sources, tokens, nodes, symbol tables, well-formedness)
//! lives in `trieste-core` and is re-exported here.

pub mod checker;
pub mod diagnostics;
pub mod fuzzer;
pub mod parse;
pub mod pass;
pub mod process;
pub mod reader;
pub mod rewrite;
pub mod rewriter;
pub mod trace;
pub mod writer;

pub use trieste_core::*;
pub use trieste_core::tokens;

pub use checker::{Checker, CheckerReport};
pub use diagnostics::ErrorPrinter;
pub use fuzzer::{FuzzReport, Fuzzer, SequenceFuzzReport};
pub use parse::TreeBuilder;
pub use pass::{Pass, PassDef, RewriteError, dir};
pub use process::{PassRange, PassStatistics, Process, ProcessResult};
pub use reader::Reader;
pub use rewrite::{Match, Pattern, Rule, any, end, inside, re, start, t};
pub use rewriter::Rewriter;
pub use trace::{Colors, NoopTracer, PrintTracer, Tracer};
pub use writer::{Destination, Writer};

#[cfg(test)]
mod fuzzer_tests;
#[cfg(test)]
mod pass_tests;
#[cfg(test)]
mod pattern_tests;
