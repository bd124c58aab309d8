//! Emitting JSON text from a finished tree.

use std::fmt::{self, Write};

use trieste_lib::{Node, Top, wf};

use crate::{Array, False, Key, Null, Number, Object, String as JsonString, True, Value};

/// Returns the JSON text for a tree (a Top, or any value node).
pub fn to_string(json: &Node, prettyprint: bool, indent: &str) -> std::string::String {
    let json_wf = crate::wf();
    let _ctx = wf::WfContext::new(&[&json_wf]);

    let mut out = std::string::String::new();
    let result = if json.token() == Top {
        json.children().try_for_each(|value| {
            emit_value(&mut out, prettyprint, indent, "", &value)
        })
    } else {
        emit_value(&mut out, prettyprint, indent, "", json)
    };
    result.expect("tree holds only JSON value nodes");
    out
}

pub(crate) fn emit_value(
    out: &mut dyn Write,
    prettyprint: bool,
    indent: &str,
    current: &str,
    value: &Node,
) -> fmt::Result {
    let token = value.token();

    if token == Object {
        emit_object(out, prettyprint, indent, current, value)
    } else if token == Array {
        emit_array(out, prettyprint, indent, current, value)
    } else if token.in_list(&[Number, JsonString, Key, True, False, Null]) {
        out.write_str(value.location().view())
    } else {
        // Not a value node; the writer reports this as a serialization
        // failure rather than crashing mid-emit.
        Err(fmt::Error)
    }
}

fn emit_object(
    out: &mut dyn Write,
    prettyprint: bool,
    indent: &str,
    current: &str,
    object: &Node,
) -> fmt::Result {
    if object.is_empty() {
        return out.write_str("{}");
    }

    let inner = format!("{current}{indent}");
    out.write_str("{")?;
    if prettyprint {
        out.write_char('\n')?;
    }

    let len = object.len();
    for (i, member) in object.children().enumerate() {
        if prettyprint {
            out.write_str(&inner)?;
        }

        let key = wf::field_of(&member, Key).unwrap_or_else(|| member.front().expect("key"));
        let value = wf::field_of(&member, Value).unwrap_or_else(|| member.back().expect("value"));

        emit_value(out, prettyprint, indent, &inner, &key)?;
        out.write_char(':')?;
        if prettyprint {
            out.write_char(' ')?;
        }
        emit_value(out, prettyprint, indent, &inner, &value)?;

        if i + 1 < len {
            out.write_char(',')?;
        }
        if prettyprint {
            out.write_char('\n')?;
        }
    }

    if prettyprint {
        out.write_str(current)?;
    }
    out.write_str("}")
}

fn emit_array(
    out: &mut dyn Write,
    prettyprint: bool,
    indent: &str,
    current: &str,
    array: &Node,
) -> fmt::Result {
    if array.is_empty() {
        return out.write_str("[]");
    }

    let inner = format!("{current}{indent}");
    out.write_str("[")?;
    if prettyprint {
        out.write_char('\n')?;
    }

    let len = array.len();
    for (i, element) in array.children().enumerate() {
        if prettyprint {
            out.write_str(&inner)?;
        }
        emit_value(out, prettyprint, indent, &inner, &element)?;

        if i + 1 < len {
            out.write_char(',')?;
        }
        if prettyprint {
            out.write_char('\n')?;
        }
    }

    if prettyprint {
        out.write_str(current)?;
    }
    out.write_str("]")
}
