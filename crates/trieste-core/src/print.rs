//! The printed AST format.
//!
//! ```text
//! (<token-name>[ <len>:<literal-bytes>][ {<symtab>}][ <child>]*)
//! ```
//!
//! The location is printed iff the token has the `print` flag, as a
//! netstring without terminator (`3:foo`). Children are indented two spaces
//! per level. Symbol tables render as a `{…}` block, which is human-readable
//! only: [`crate::wf::Wellformed::build_ast`] skips it when parsing a dump
//! back into a tree.

use std::fmt;

use crate::{Location, Node, Symtab, flag};

struct Indent(usize);

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            f.write_str("  ")?;
        }
        Ok(())
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, level: usize) -> fmt::Result {
    write!(f, "{}({}", Indent(level), node.token())?;

    if node.token().has(flag::print) {
        let location = node.location();
        let view = location.view();
        write!(f, " {}:{}", view.len(), view)?;
    }

    if node.has_symtab() {
        writeln!(f)?;
        node.with_symtab(|st| write_symtab(f, st, level + 1))
            .transpose()?;
    }

    for child in node.children() {
        writeln!(f)?;
        write_node(f, &child, level + 1)?;
    }

    f.write_str(")")
}

fn write_symtab(f: &mut fmt::Formatter<'_>, st: &Symtab, level: usize) -> fmt::Result {
    write!(f, "{}{{", Indent(level))?;

    for (loc, defs) in st.iter() {
        write!(f, "\n{}{} =", Indent(level + 1), loc.view())?;

        if let [def] = defs {
            write!(f, " {}", def.node.token())?;
        } else {
            for def in defs {
                write!(f, "\n{}{}", Indent(level + 2), def.node.token())?;
            }
        }
    }

    for node in st.includes() {
        write!(
            f,
            "\n{}include {}",
            Indent(level + 1),
            node.location().view()
        )?;
    }

    f.write_str("}")
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0)
    }
}

impl fmt::Display for Location {
    /// `origin:line:col` followed by the underlined line span.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.origin_linecol())?;
        f.write_str(&self.str())
    }
}
