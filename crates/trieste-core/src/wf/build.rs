//! Symbol-table building and printed-AST parsing.

use thiserror::Error;

use super::{Shape, Wellformed};
use crate::{Error as ErrorTok, Include, Invalid, Location, Node, Source};

/// Failure to parse a printed AST back into a tree.
#[derive(Debug, Clone, Error)]
pub enum BuildAstError {
    #[error("expected node")]
    ExpectedNode { location: Location },
    #[error("unknown type")]
    UnknownType { location: Location },
    #[error("expected ':'")]
    ExpectedColon { location: Location },
    #[error("incomplete AST")]
    Incomplete { location: Location },
}

impl BuildAstError {
    pub fn location(&self) -> &Location {
        match self {
            BuildAstError::ExpectedNode { location }
            | BuildAstError::UnknownType { location }
            | BuildAstError::ExpectedColon { location }
            | BuildAstError::Incomplete { location } => location,
        }
    }
}

impl Wellformed {
    /// Recursively clears and repopulates symbol tables according to the
    /// binding annotations. Idempotent. Error subtrees are skipped.
    ///
    /// Bind conflicts (a shadowing definition becoming multiply defined)
    /// are not failures here: redefinition with latest-definition-wins
    /// lookup is an ordinary pattern, and [`Node::bind`] reports the
    /// conflict to callers that care.
    pub fn build_symtab(&self, node: &Node) {
        if node.token() == ErrorTok {
            return;
        }

        node.clear_symbols();

        match self.get(node.token()) {
            Some(Shape::Fields(fields)) => {
                if fields.binding == Include {
                    node.include();
                } else if fields.binding != Invalid {
                    if let Some(child) = fields
                        .index_of(fields.binding)
                        .and_then(|i| node.child(i))
                    {
                        node.bind(&child.location());
                    }
                }
            }
            Some(Shape::Sequence(sequence)) => {
                if sequence.binding == Include {
                    node.include();
                }
            }
            None => {}
        }

        for child in node.children() {
            self.build_symtab(&child);
        }
    }

    /// Parses a printed AST (the format produced by the Node printer) back
    /// into a tree, resolving token names through this declaration and
    /// decoding netstring locations. `{…}` symbol-table blocks are skipped.
    pub fn build_ast(&self, source: &Source, pos: usize) -> Result<Node, BuildAstError> {
        let text = source.view().as_bytes();
        let mut it = pos;
        let mut ast: Option<Node> = None;

        let at = |pos: usize| Location::new(source.clone(), pos, 1);

        while it < text.len() {
            // Node head: optional whitespace then `(name`.
            let mut cursor = it;
            while cursor < text.len() && text[cursor].is_ascii_whitespace() {
                cursor += 1;
            }

            if cursor >= text.len() || text[cursor] != b'(' {
                return Err(BuildAstError::ExpectedNode {
                    location: at(cursor),
                });
            }
            cursor += 1;

            let name_start = cursor;
            while cursor < text.len()
                && !text[cursor].is_ascii_whitespace()
                && text[cursor] != b'('
                && text[cursor] != b')'
            {
                cursor += 1;
            }

            let type_loc = Location::new(source.clone(), name_start, cursor - name_start);
            let token = self
                .find_type(ast.as_ref().map(Node::token), type_loc.view())
                .ok_or(BuildAstError::UnknownType {
                    location: type_loc.clone(),
                })?;
            it = cursor;

            // A single space introduces a netstring location. Children are
            // separated by newlines, so this is unambiguous.
            let mut ident_loc = type_loc;
            if it < text.len() && text[it] == b' ' {
                it += 1;
                let mut len = 0usize;
                while it < text.len() && text[it].is_ascii_digit() {
                    len = len * 10 + (text[it] - b'0') as usize;
                    it += 1;
                }

                if it >= text.len() || text[it] != b':' {
                    return Err(BuildAstError::ExpectedColon { location: at(it) });
                }

                it += 1;
                ident_loc = Location::new(source.clone(), it, len);
                it += len;
            }

            let node = Node::with_location(token, ident_loc);
            match &ast {
                Some(parent) => parent.push_back(node.clone()),
                None => {}
            }
            ast = Some(node);

            // Skip a symbol table block.
            let mut cursor = it;
            while cursor < text.len() && text[cursor].is_ascii_whitespace() {
                cursor += 1;
            }
            if cursor < text.len() && text[cursor] == b'{' {
                while cursor < text.len() && text[cursor] != b'}' {
                    cursor += 1;
                }
                it = cursor + 1;
            }

            // `)` closes the current node; anything else starts a child.
            loop {
                let mut cursor = it;
                while cursor < text.len() && text[cursor].is_ascii_whitespace() {
                    cursor += 1;
                }

                if cursor >= text.len() || text[cursor] != b')' {
                    break;
                }

                it = cursor + 1;
                let current = ast.take().expect("closing an open node");
                match current.parent() {
                    Some(parent) => ast = Some(parent),
                    None => return Ok(current),
                }
            }
        }

        Err(BuildAstError::Incomplete { location: at(it) })
    }
}
