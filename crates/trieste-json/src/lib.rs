//! The JSON front-end for Trieste.
//!
//! Reading happens in two passes over the token groups: `groups` rewrites
//! the bracket-level Group nodes into object and array groups, and
//! `structure` arranges their contents into members and values. Writing
//! walks the finished tree back out as JSON text.

use std::path::PathBuf;

use trieste_lib::wf::{Wellformed, field, seq};
use trieste_lib::{Error, ErrorAst, ErrorMsg, File, Group, Reader, Top, Writer, tokens};

mod emit;
mod lexer;
mod passes;


pub use emit::to_string;
pub use lexer::parse;
pub use passes::{groups, structure};

tokens! {
    pub Value = "json-value";
    /// Objects own a symbol table; members resolve by key via lookdown.
    pub Object = "json-object" [symtab];
    pub Array = "json-array";
    pub String = "json-string" [print];
    pub Number = "json-number" [print];
    pub True = "json-true";
    pub False = "json-false";
    pub Null = "json-null";
    pub Member = "json-member" [lookdown];
    pub Key = "json-key" [print];
    pub ErrorSeq = "json-errorseq";

    pub Colon = "json-colon";
    pub Comma = "json-comma";

    // Group stages.
    pub ArrayGroup = "json-array-group";
    pub ObjectGroup = "json-object-group";

    // Capture names.
    pub Lhs = "json-lhs";
    pub Rhs = "json-rhs";
}

pub fn value_tokens() -> trieste_lib::wf::Choice {
    Object | Array | String | Number | True | False | Null
}

fn parse_tokens() -> trieste_lib::wf::Choice {
    value_tokens() | Comma | Colon
}

pub fn wf_parse() -> Wellformed {
    Wellformed::new()
        .shape(Top, File)
        .shape(File, seq(Group))
        .shape(Value, Group)
        .shape(Array, Group)
        .shape(Object, Group)
        .shape(Member, Group)
        .shape(Group, seq(parse_tokens()))
}

pub fn wf_groups() -> Wellformed {
    Wellformed::new()
        .shape(Top, value_tokens())
        .shape(Object, ObjectGroup)
        .shape(Array, ArrayGroup)
        .shape(ObjectGroup, seq(parse_tokens()))
        .shape(ArrayGroup, seq(value_tokens() | Comma))
}

/// The finished JSON tree shape.
pub fn wf() -> Wellformed {
    Wellformed::new()
        .shape(Top, seq(value_tokens()).minlen(1))
        .shape(Object, seq(Member))
        .shape(Member, (field(Key, Key) * field(Value, value_tokens())).binding(Key))
        .shape(Array, seq(value_tokens()))
        .shape(Error, ErrorMsg * ErrorAst)
        .shape(ErrorSeq, seq(Error))
}

pub fn passes() -> Vec<trieste_lib::Pass> {
    vec![groups(), structure()]
}

pub fn reader() -> Reader {
    Reader::new("json", passes(), wf_parse(), |source| parse(source))
}

/// A writer emitting one JSON document at `path`.
pub fn writer(path: impl Into<PathBuf>, prettyprint: bool, indent: &str) -> Writer {
    let indent = indent.to_string();
    Writer::new(
        "json",
        vec![passes::to_file(path.into())],
        wf(),
        move |out: &mut dyn std::fmt::Write, contents: &trieste_lib::Node| {
            for value in contents.children() {
                emit::emit_value(out, prettyprint, &indent, "", &value)?;
                out.write_char('\n')?;
            }
            Ok(())
        },
    )
}

pub(crate) fn err(ast: Vec<trieste_lib::Node>, msg: &str) -> trieste_lib::Node {
    Error << (ErrorMsg ^ msg) << (ErrorAst << ast)
}
