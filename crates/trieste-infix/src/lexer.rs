//! Tokenizer for the calculator.
//!
//! A logos lexer drives the core's [`TreeBuilder`]: leaves accumulate into
//! groups, `=` folds its group under an `Equals` node, `;` terminates the
//! statement, and parentheses nest. Unrecognized input coalesces into
//! `Invalid` leaves.

use logos::Logos;

use trieste_lib::{Location, Node, Source, TreeBuilder};

use trieste_lib::File;

use crate::{
    Add, Divide, Equals, Float, Ident, Int, Multiply, Paren, Print, String, Subtract,
};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
enum Tok {
    #[token("=")]
    Equals,

    /// Statement terminator; swallows following newlines.
    #[regex(r";\n*")]
    Term,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[regex(r"[0-9]+\.[0-9]+(e[+-]?[0-9]+)?")]
    Float,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r#""[^"]*""#)]
    String,

    #[token("print")]
    Print,

    #[regex(r"[_a-zA-Z][_a-zA-Z0-9]*")]
    Ident,

    #[token("+")]
    Add,

    #[token("-")]
    Subtract,

    #[token("*")]
    Multiply,

    #[token("/")]
    Divide,
}

/// Parses one source into a `File` tree of groups.
pub fn parse(source: &Source) -> Node {
    let mut builder = TreeBuilder::new(
        File,
        Location::new(source.clone(), 0, source.view().len()),
    );

    let mut lexer = Tok::lexer(source.view());

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let loc = Location::new(source.clone(), span.start, span.end - span.start);

        match result {
            Ok(Tok::Equals) => builder.seq(Equals, loc, &[]),
            Ok(Tok::Term) => builder.term(&[Equals]),
            Ok(Tok::ParenOpen) => builder.push(Paren, loc),
            Ok(Tok::ParenClose) => {
                builder.term(&[Equals]);
                builder.pop(Paren, loc);
            }
            Ok(Tok::Float) => builder.add(Float, loc),
            Ok(Tok::Int) => builder.add(Int, loc),
            Ok(Tok::String) => builder.add(String, loc),
            Ok(Tok::Print) => builder.add(Print, loc),
            Ok(Tok::Ident) => builder.add(Ident, loc),
            Ok(Tok::Add) => builder.add(Add, loc),
            Ok(Tok::Subtract) => builder.add(Subtract, loc),
            Ok(Tok::Multiply) => builder.add(Multiply, loc),
            Ok(Tok::Divide) => builder.add(Divide, loc),
            Err(()) => builder.invalid(loc),
        }
    }

    builder.done()
}
