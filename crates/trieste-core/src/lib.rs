//! Core data structures for Trieste: the tagged tree and its shape language.
//!
//! Layers, leaves first:
//! - [`source`]: immutable buffers and byte-span [`Location`]s
//! - [`token`]: static token descriptors with behavioral flags
//! - [`node`]: the refcounted tree with symbol tables and a construction DSL
//! - [`wf`]: well-formedness shapes — check, generate, build symbol tables,
//!   parse printed ASTs, and resolve typed field accessors
//!
//! The rewrite engine, pass pipeline, checker and fuzzer live in
//! `trieste-lib`.

pub mod node;
mod print;
pub mod source;
pub mod symtab;
pub mod token;
pub mod wf;

pub use node::{Children, Index, Node, NodeDef};
pub use source::{Location, Source, SourceDef};
pub use symtab::{Definition, Symtab};
pub use token::{Token, TokenDef, TokenSet, flag};

pub use token::{
    Directory, Error, ErrorAst, ErrorMsg, File, Group, Include, Invalid, Lift, NoChange, Seq,
    Top, Unclosed,
};

#[cfg(test)]
mod print_tests;
#[cfg(test)]
mod source_tests;
#[cfg(test)]
mod wf_tests;
