//! Checking a tree against a well-formedness declaration.

use std::fmt;

use super::{Choice, Fields, Sequence, Shape, Wellformed};
use crate::{Error, Include, Invalid, Location, Node};

/// One well-formedness violation, with source coordinates.
#[derive(Debug, Clone)]
pub struct WfError {
    pub message: String,
    pub location: Location,
}

impl WfError {
    fn new(message: impl Into<String>, location: Location) -> Self {
        WfError {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for WfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}{}", self.location.origin_linecol(), self.message)?;
        f.write_str(&self.location.str())
    }
}

impl std::error::Error for WfError {}

impl Wellformed {
    /// Recursively verifies every node against its registered shape. Error
    /// subtrees are exempt. Collects all violations.
    pub fn check(&self, node: &Node) -> Result<(), Vec<WfError>> {
        let mut errors = Vec::new();
        self.check_node(node, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_node(&self, node: &Node, out: &mut Vec<WfError>) {
        if node.token() == Error {
            return;
        }

        match self.get(node.token()) {
            Some(Shape::Fields(fields)) => check_fields(fields, node, out),
            Some(Shape::Sequence(sequence)) => check_sequence(sequence, node, out),
            None => {
                // No shape registered: the node must be a leaf.
                if !node.is_empty() {
                    out.push(WfError::new(
                        format!("too many child nodes in {}", node.token()),
                        node.location(),
                    ));
                }
            }
        }

        for child in node.children() {
            self.check_node(&child, out);
        }
    }
}

fn check_choice(choice: &Choice, node: &Node, out: &mut Vec<WfError>) -> bool {
    if node.token() == Error || choice.contains(node.token()) {
        return true;
    }

    let mut expected = String::new();
    for (i, t) in choice.types.iter().enumerate() {
        if i > 0 {
            expected.push_str(", ");
        }
        if i + 1 == choice.types.len() && choice.types.len() > 1 {
            expected.push_str("or ");
        }
        expected.push_str(t.name());
    }

    out.push(WfError::new(
        format!("unexpected {}, expected a {expected}", node.token()),
        node.location(),
    ));
    false
}

fn check_fields(fields: &Fields, node: &Node, out: &mut Vec<WfError>) {
    let len = node.len();

    if len < fields.fields.len() {
        out.push(WfError::new(
            format!("too few child nodes in {}", node.token()),
            node.location(),
        ));
    }

    for (i, child) in node.children().enumerate() {
        let Some(field) = fields.fields.get(i) else {
            out.push(WfError::new(
                format!("too many child nodes in {}", node.token()),
                child.location(),
            ));
            break;
        };

        check_choice(&field.choice, &child, out);

        // The bound child's location must resolve in the enclosing scope
        // back to this node, through whichever direction the node's flags
        // participate in.
        if fields.binding != Invalid && field.name == fields.binding {
            let location = child.location();
            let up = child
                .lookup_at(&location, None)
                .iter()
                .any(|def| def.ptr_eq(node));
            let down = || {
                child.scope().is_some_and(|scope| {
                    scope.lookdown(&location).iter().any(|def| def.ptr_eq(node))
                })
            };

            if !up && !down() {
                out.push(WfError::new(
                    format!("missing symbol table binding for {}", node.token()),
                    child.location(),
                ));
            }
        }
    }
}

fn check_sequence(sequence: &Sequence, node: &Node, out: &mut Vec<WfError>) {
    for child in node.children() {
        check_choice(&sequence.choice, &child, out);
    }

    if node.len() < sequence.minlen {
        out.push(WfError::new(
            format!(
                "expected at least {} children, found {}",
                sequence.minlen,
                node.len()
            ),
            node.location(),
        ));
    }

    if sequence.binding != Invalid && sequence.binding != Include {
        out.push(WfError::new(
            format!(
                "can't bind a {} sequence in the symbol table",
                node.token()
            ),
            node.location(),
        ));
    }
}
