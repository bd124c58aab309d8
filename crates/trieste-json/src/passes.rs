//! The JSON reader and writer passes.

use std::path::PathBuf;
use std::rc::Rc;

use trieste_lib::pass::{PassDef, dir};
use trieste_lib::wf::{Wellformed, field, seq};
use trieste_lib::{
    File, Group, Match, Node, Pass, Pattern, Seq, Top, end, inside, start, t,
};

use crate::{
    Array, ArrayGroup, Colon, Comma, Key, Lhs, Member, Object, ObjectGroup, Rhs, String, Value,
    err, value_tokens, wf, wf_groups,
};

fn value_pattern() -> Pattern {
    t([
        Object,
        Array,
        String,
        crate::Number,
        crate::True,
        crate::False,
        crate::Null,
    ])
}

/// Rewrites bracket-level Groups into object and array groups; a File that
/// is not exactly one value is invalid JSON.
pub fn groups() -> Pass {
    Rc::new(PassDef::new(
        "groups",
        wf_groups(),
        dir::bottomup,
        vec![
            inside(Array) * t(Group).cap(Group) >> |m: &mut Match| {
                ArrayGroup << m.contents(Group)
            },

            inside(Object) * t(Group).cap(Group) >> |m: &mut Match| {
                ObjectGroup << m.contents(Group)
            },

            inside(Top)
                * (t(File) << ((t(Group) << (value_pattern().cap(Value) * end())) * end()))
                >> |m: &mut Match| m.node(Value),

            // errors

            inside(Top) * t(File).cap(File) >> |m: &mut Match| {
                err(m.range(File), "Invalid JSON")
            },

            inside(ArrayGroup) * t(Colon).cap(Colon) >> |m: &mut Match| {
                err(m.range(Colon), "Invalid colon in array")
            },
        ],
    ))
}

/// Arranges group contents into members and array elements. Leftover
/// groups after the fixed point are malformed documents.
pub fn structure() -> Pass {
    let pass = PassDef::new(
        "structure",
        wf(),
        dir::bottomup,
        vec![
            inside(ArrayGroup) * (start() * value_pattern().cap(Value)) >> |m: &mut Match| {
                Value << m.node(Value)
            },

            inside(ArrayGroup)
                * (t(Value).cap(Lhs) * t(Comma) * value_pattern().cap(Rhs))
                >> |m: &mut Match| Seq << m.node(Lhs) << (Value << m.node(Rhs)),

            inside(Array)
                * (t(ArrayGroup) << (t(Value).rep().cap(Array) * end()))
                >> |m: &mut Match| Seq << m.range(Array),

            inside(Array) * t(Value).cap(Value) >> |m: &mut Match| {
                m.node(Value).front()
            },

            inside(ObjectGroup)
                * (start() * t(String).cap(Lhs) * t(Colon) * value_pattern().cap(Rhs))
                >> |m: &mut Match| {
                    Member << (Key ^ &m.node(Lhs)) << m.node(Rhs)
                },

            inside(ObjectGroup)
                * (t(Member).cap(Member)
                    * t(Comma)
                    * t(String).cap(Lhs)
                    * t(Colon)
                    * value_pattern().cap(Rhs))
                >> |m: &mut Match| {
                    Seq << m.node(Member) << (Member << (Key ^ &m.node(Lhs)) << m.node(Rhs))
                },

            inside(Object)
                * (t(ObjectGroup) << (t(Member).rep().cap(Object) * end()))
                >> |m: &mut Match| Seq << m.range(Object),
        ],
    )
    .post(Top, |n| {
        invalid_tokens(n, ObjectGroup, "Invalid object")
            + invalid_tokens(n, ArrayGroup, "Invalid array")
    });

    Rc::new(pass)
}

/// Replaces every node of the given kind under `n` with an Error, returning
/// the number of replacements. Error subtrees stay opaque; descending into
/// one would re-wrap the copy of the offending node it carries forever.
fn invalid_tokens(n: &Node, token: trieste_lib::Token, message: &str) -> usize {
    let mut changes = 0;

    for child in n.children() {
        if child.token() == trieste_lib::Error {
            continue;
        }

        if child.token() == token {
            n.replace(&child, Some(err(vec![child.deep_clone()], message)));
            changes += 1;
        } else {
            changes += invalid_tokens(&child, token, message);
        }
    }

    changes
}

/// Packs the finished values into a File node for the writer.
pub fn to_file(path: PathBuf) -> Pass {
    use trieste_lib::writer::{Contents, Path as PathTok};

    let to_file_wf = wf()
        | Wellformed::new()
            .shape(Top, File)
            .shape(File, field(PathTok, PathTok) * field(Contents, Contents))
            .shape(Contents, seq(value_tokens()).minlen(1));

    Rc::new(PassDef::new(
        "to_file",
        to_file_wf,
        dir::bottomup | dir::once,
        vec![
            inside(Top) * value_pattern().rep().cap(Value) >> move |m: &mut Match| {
                File << (PathTok ^ path.to_string_lossy().to_string())
                    << (Contents << m.range(Value))
            },
        ],
    ))
}
