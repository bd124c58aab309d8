//! Per-scope symbol tables.
//!
//! A symbol table is owned by a node whose token has the `symtab` flag. It
//! maps a [`Location`] (keyed by textual view) to an ordered list of
//! definitions, keeps a separate ordered list of includes, and owns a
//! monotone counter for minting fresh names. The counter survives
//! [`Symtab::clear`] so identifiers are never reused within a tree.
//!
//! Each definition records the location it was bound under; `defbeforeuse`
//! filtering and ordering compare that bound location, not the definition
//! node's own span.

use indexmap::IndexMap;

use crate::{Location, Node};

/// One definition: the location it was bound under, and the defining node.
#[derive(Clone)]
pub struct Definition {
    pub bound_at: Location,
    pub node: Node,
}

#[derive(Default)]
pub struct Symtab {
    symbols: IndexMap<Location, Vec<Definition>>,
    includes: Vec<Node>,
    next_id: usize,
}

impl Symtab {
    /// Mints a fresh, collision-free location name: `$0`, `$1`, … or
    /// `prefix$N` when a prefix is given.
    pub fn fresh(&mut self, prefix: &str) -> Location {
        let id = self.next_id;
        self.next_id += 1;
        Location::synthetic(format!("{prefix}${id}"))
    }

    /// Drops all symbols and includes. The fresh counter is kept.
    pub fn clear(&mut self) {
        self.symbols.clear();
        self.includes.clear();
    }

    pub fn get(&self, loc: &Location) -> &[Definition] {
        self.symbols.get(loc).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entry(&mut self, loc: Location) -> &mut Vec<Definition> {
        self.symbols.entry(loc).or_default()
    }

    pub fn includes(&self) -> &[Node] {
        &self.includes
    }

    pub fn add_include(&mut self, node: Node) {
        self.includes.push(node);
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.includes.is_empty()
    }

    /// Iterates `(location, definitions)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Location, &[Definition])> {
        self.symbols
            .iter()
            .map(|(loc, defs)| (loc, defs.as_slice()))
    }
}
