//! Tokenizer for JSON documents.
//!
//! A logos lexer drives the core's [`TreeBuilder`]; a bracket stack pairs
//! braces with brackets so mismatches surface as Error leaves instead of
//! crossed nestings.

use logos::Logos;

use trieste_lib::{File, Group, Location, Node, Source, TreeBuilder};

use crate::{Array, Colon, Comma, False, Null, Number, Object, String, True};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \r\n\t]+")]
enum Tok {
    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,

    #[regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\\x00-\x1f]+|\\["\\/bfnrt]|\\u[0-9a-fA-F]{4})*""#)]
    String,
}

/// Parses one source into a `File` tree of bracket groups.
pub fn parse(source: &Source) -> Node {
    let mut builder = TreeBuilder::new(
        File,
        Location::new(source.clone(), 0, source.view().len()),
    );

    let mut stack: Vec<u8> = Vec::new();
    let mut lexer = Tok::lexer(source.view());

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let loc = Location::new(source.clone(), span.start, span.end - span.start);

        match result {
            Ok(Tok::Colon) => builder.add(Colon, loc),
            Ok(Tok::Comma) => builder.add(Comma, loc),

            Ok(Tok::BraceOpen) => {
                builder.push(Object, loc.clone());
                builder.push(Group, loc);
                stack.push(b'{');
            }
            Ok(Tok::BraceClose) => {
                if stack.last() != Some(&b'{') {
                    builder.error("Mismatched braces", loc);
                    continue;
                }
                stack.pop();
                builder.term(&[]);
                builder.pop(Object, loc);
            }

            Ok(Tok::BracketOpen) => {
                builder.push(Array, loc.clone());
                builder.push(Group, loc);
                stack.push(b'[');
            }
            Ok(Tok::BracketClose) => {
                if stack.last() != Some(&b'[') {
                    builder.error("Mismatched brackets", loc);
                    continue;
                }
                stack.pop();
                builder.term(&[]);
                builder.pop(Array, loc);
            }

            Ok(Tok::True) => builder.add(True, loc),
            Ok(Tok::False) => builder.add(False, loc),
            Ok(Tok::Null) => builder.add(Null, loc),
            Ok(Tok::Number) => builder.add(Number, loc),
            Ok(Tok::String) => builder.add(String, loc),

            Err(()) => builder.error("Invalid character", loc),
        }
    }

    if !stack.is_empty() {
        let end = source.view().len();
        builder.error(
            "Mismatched braces or brackets",
            Location::new(source.clone(), end.saturating_sub(1), 1),
        );
    }

    builder.done()
}
