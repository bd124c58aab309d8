//! The tagged tree.
//!
//! A [`Node`] is a shared handle (`Rc`) to a tree node carrying a token, a
//! location, an ordered child vector, a non-owning parent back-pointer, and
//! a symbol table when its token has the `symtab` flag.
//!
//! Ownership: a parent owns its children through the child vector; the
//! parent pointer is a `Weak` that never owns. A node may be inserted under
//! two parents at once (the driver's Seq/Lift machinery relies on this); the
//! back-pointer then reflects the most recent insertion. Any node reachable
//! from `Top` is reachable through at most one parent chain.
//!
//! Construction in rule effects uses operators:
//!
//! ```
//! use trieste_core::{Error, ErrorAst, ErrorMsg, Node};
//!
//! let ast: Node = ErrorAst.into();
//! let err = Error << (ErrorMsg ^ "undefined") << ast;
//! assert_eq!(err.len(), 2);
//! ```

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitXor, Range, Shl};
use std::rc::{Rc, Weak};

use crate::symtab::Symtab;
use crate::{Error, Location, Token, Top, flag};

pub struct NodeDef {
    token: Token,
    location: RefCell<Location>,
    parent: RefCell<Weak<NodeDef>>,
    children: RefCell<Vec<Node>>,
    symtab: Option<RefCell<Symtab>>,
}

/// Shared handle to a tree node.
#[derive(Clone)]
pub struct Node(Rc<NodeDef>);

/// A `(token, child index)` pair produced by WF field indexing; see
/// [`crate::wf::Wellformed::index`].
#[derive(Clone, Copy, Debug)]
pub struct Index {
    pub token: Token,
    pub index: usize,
}

impl Node {
    pub fn new(token: Token) -> Node {
        Node::with_location(token, Location::default())
    }

    pub fn with_location(token: Token, location: Location) -> Node {
        let symtab = token
            .has(flag::symtab)
            .then(|| RefCell::new(Symtab::default()));
        Node(Rc::new(NodeDef {
            token,
            location: RefCell::new(location),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            symtab,
        }))
    }

    /// Creates a node whose location is the union of the first and last
    /// element's locations.
    pub fn from_range(token: Token, range: &[Node]) -> Node {
        match (range.first(), range.last()) {
            (Some(first), Some(last)) => {
                Node::with_location(token, first.location().union(&last.location()))
            }
            _ => Node::new(token),
        }
    }

    pub fn token(&self) -> Token {
        self.0.token
    }

    pub fn location(&self) -> Location {
        self.0.location.borrow().clone()
    }

    /// Sets the location if unset, then recursively fills unset children.
    pub fn set_location(&self, loc: &Location) {
        if self.0.location.borrow().source.is_none() {
            *self.0.location.borrow_mut() = loc.clone();
        }

        for child in self.children() {
            child.set_location(loc);
        }
    }

    /// Extends the location to cover `loc`.
    pub fn extend_location(&self, loc: &Location) {
        let extended = self.0.location.borrow().union(loc);
        *self.0.location.borrow_mut() = extended;
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    /// Walks up the parent chain to the nearest node of the given kind.
    pub fn parent_of(&self, token: Token) -> Option<Node> {
        let mut p = self.parent();
        while let Some(node) = p {
            if node.token() == token {
                return Some(node);
            }
            p = node.parent();
        }
        None
    }

    pub fn len(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.children.borrow().is_empty()
    }

    pub fn child(&self, index: usize) -> Option<Node> {
        self.0.children.borrow().get(index).cloned()
    }

    pub fn front(&self) -> Option<Node> {
        self.child(0)
    }

    pub fn back(&self) -> Option<Node> {
        self.0.children.borrow().last().cloned()
    }

    /// Forward iteration over children. Index-based, so concurrent splicing
    /// does not invalidate the iterator (it sees the vector as it advances).
    pub fn children(&self) -> Children {
        Children {
            node: self.clone(),
            index: 0,
        }
    }

    /// Reverse iteration over children.
    pub fn children_rev(&self) -> impl Iterator<Item = Node> {
        let mut children = self.children_vec();
        children.reverse();
        children.into_iter()
    }

    pub fn children_vec(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn children_range(&self, range: Range<usize>) -> Vec<Node> {
        self.0.children.borrow()[range].to_vec()
    }

    /// Selects a child by the first [`Index`] whose token matches this node.
    ///
    /// # Panics
    ///
    /// Panics when no index matches or the index is out of range; both are
    /// programmer errors in typed accessors.
    pub fn at(&self, indices: &[Index]) -> Node {
        for index in indices {
            if index.token == self.token() {
                return self
                    .child(index.index)
                    .unwrap_or_else(|| panic!("index {} out of range in {}", index.index, self));
            }
        }
        panic!("no index matches a {} node", self.token());
    }

    pub fn index_of(&self, child: &Node) -> Option<usize> {
        self.0
            .children
            .borrow()
            .iter()
            .position(|c| Rc::ptr_eq(&c.0, &child.0))
    }

    pub fn push_front(&self, node: Node) {
        self.insert(0, node);
    }

    pub fn push_back(&self, node: Node) {
        node.set_parent(self);
        self.0.children.borrow_mut().push(node);
    }

    pub fn push_all(&self, nodes: impl IntoIterator<Item = Node>) {
        for node in nodes {
            self.push_back(node);
        }
    }

    pub fn pop_back(&self) -> Option<Node> {
        let node = self.0.children.borrow_mut().pop()?;
        *node.0.parent.borrow_mut() = Weak::new();
        Some(node)
    }

    pub fn insert(&self, index: usize, node: Node) {
        node.set_parent(self);
        self.0.children.borrow_mut().insert(index, node);
    }

    pub fn insert_all(&self, index: usize, nodes: Vec<Node>) {
        for node in &nodes {
            node.set_parent(self);
        }
        self.0.children.borrow_mut().splice(index..index, nodes);
    }

    /// Removes `[range]` from the child vector. Only clears a child's parent
    /// pointer when this node is still its parent (a shared child may have
    /// been re-claimed by another insertion).
    pub fn erase(&self, range: Range<usize>) {
        let removed: Vec<Node> = self.0.children.borrow_mut().drain(range).collect();
        for node in removed {
            if node
                .parent()
                .is_some_and(|p| Rc::ptr_eq(&p.0, &self.0))
            {
                *node.0.parent.borrow_mut() = Weak::new();
            }
        }
    }

    /// Replaces `old` with `new`, or erases it when `new` is `None`.
    ///
    /// # Panics
    ///
    /// Panics when `old` is not a child of this node.
    pub fn replace(&self, old: &Node, new: Option<Node>) {
        let index = self
            .index_of(old)
            .unwrap_or_else(|| panic!("node not found in {}", self.token()));

        match new {
            Some(new) => {
                *old.0.parent.borrow_mut() = Weak::new();
                new.set_parent(self);
                self.0.children.borrow_mut()[index] = new;
            }
            None => self.erase(index..index + 1),
        }
    }

    fn set_parent(&self, parent: &Node) {
        *self.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
    }

    /// Nearest ancestor (strictly above) whose token has the `symtab` flag.
    pub fn scope(&self) -> Option<Node> {
        let mut p = self.parent();
        while let Some(node) = p {
            if node.0.symtab.is_some() {
                return Some(node);
            }
            p = node.parent();
        }
        None
    }

    pub fn has_symtab(&self) -> bool {
        self.0.symtab.is_some()
    }

    pub fn with_symtab<R>(&self, f: impl FnOnce(&Symtab) -> R) -> Option<R> {
        self.0.symtab.as_ref().map(|st| f(&st.borrow()))
    }

    pub fn with_symtab_mut<R>(&self, f: impl FnOnce(&mut Symtab) -> R) -> Option<R> {
        self.0.symtab.as_ref().map(|st| f(&mut st.borrow_mut()))
    }

    pub fn clear_symbols(&self) {
        self.with_symtab_mut(|st| st.clear());
    }

    /// Upward name resolution from this node's own location.
    pub fn lookup(&self) -> Vec<Node> {
        self.lookup_at(&self.location(), None)
    }

    /// Upward name resolution per the symbol-table contract:
    /// `lookup`-flagged entries (filtered by `defbeforeuse` ordering where
    /// the scope requires it), then the scope's includes, recursing outward
    /// unless a shadowing entry is present or `until` is reached.
    ///
    /// The `defbeforeuse` filter compares the location a definition was
    /// bound under with the query location; a definition at the query site
    /// itself resolves.
    pub fn lookup_at(&self, loc: &Location, until: Option<&Node>) -> Vec<Node> {
        let Some(scope) = self.scope() else {
            return Vec::new();
        };

        let defbeforeuse = scope.token().has(flag::defbeforeuse);

        let mut result = scope
            .with_symtab(|st| {
                let mut entries: Vec<crate::symtab::Definition> = st
                    .get(loc)
                    .iter()
                    .filter(|def| {
                        def.node.token().has(flag::lookup)
                            && (!defbeforeuse || def.bound_at.before(loc))
                    })
                    .cloned()
                    .collect();

                // Latest definition in the source first.
                if defbeforeuse {
                    entries.sort_by(|a, b| {
                        if a.bound_at.same_source(&b.bound_at) {
                            b.bound_at.pos.cmp(&a.bound_at.pos)
                        } else {
                            std::cmp::Ordering::Equal
                        }
                    });
                }

                let mut nodes: Vec<Node> =
                    entries.into_iter().map(|def| def.node).collect();

                // Includes are always returned, regardless of the query.
                nodes.extend(st.includes().iter().cloned());
                nodes
            })
            .unwrap_or_default();

        let at_limit = until.is_some_and(|n| Rc::ptr_eq(&n.0, &scope.0));
        let shadowed = result.iter().any(|n| n.token().has(flag::shadowing));

        if !at_limit && !shadowed {
            result.extend(scope.lookup_at(loc, until));
        }

        result
    }

    /// Downward resolution in this node's own symbol table: `lookdown`-flagged
    /// entries only, ignoring includes.
    pub fn lookdown(&self, loc: &Location) -> Vec<Node> {
        self.with_symtab(|st| {
            st.get(loc)
                .iter()
                .filter(|def| def.node.token().has(flag::lookdown))
                .map(|def| def.node.clone())
                .collect()
        })
        .unwrap_or_default()
    }

    /// Immediate resolution in this node's own symbol table, ignoring flags.
    pub fn look(&self, loc: &Location) -> Vec<Node> {
        self.with_symtab(|st| st.get(loc).iter().map(|def| def.node.clone()).collect())
            .unwrap_or_default()
    }

    /// Binds this node under `loc` in the enclosing scope's symbol table.
    /// Returns false when the entry becomes multiply defined and any of the
    /// definitions is shadowing.
    ///
    /// # Panics
    ///
    /// Panics when there is no enclosing scope.
    pub fn bind(&self, loc: &Location) -> bool {
        let scope = self.scope().expect("no symbol table");
        let def = crate::symtab::Definition {
            bound_at: loc.clone(),
            node: self.clone(),
        };
        scope
            .with_symtab_mut(|st| {
                let entry = st.entry(loc.clone());
                entry.push(def);
                entry.len() == 1
                    || !entry.iter().any(|d| d.node.token().has(flag::shadowing))
            })
            .expect("no symbol table")
    }

    /// Records this node as an include on the enclosing scope.
    ///
    /// # Panics
    ///
    /// Panics when there is no enclosing scope.
    pub fn include(&self) {
        let scope = self.scope().expect("no symbol table");
        let this = self.clone();
        scope
            .with_symtab_mut(|st| st.add_include(this))
            .expect("no symbol table");
    }

    /// Mints a unique location name from the root Top's counter.
    ///
    /// # Panics
    ///
    /// Panics when the tree's root is not a Top node.
    pub fn fresh(&self) -> Location {
        self.fresh_with("")
    }

    pub fn fresh_with(&self, prefix: &str) -> Location {
        let mut root = self.clone();
        while let Some(p) = root.parent() {
            root = p;
        }

        if root.token() != Top {
            panic!("no Top node");
        }

        root.with_symtab_mut(|st| st.fresh(prefix))
            .expect("no symbol table")
    }

    /// Deep structural copy. Symbol tables are recreated empty, not
    /// repopulated.
    pub fn deep_clone(&self) -> Node {
        let node = Node::with_location(self.token(), self.location());
        for child in self.children() {
            node.push_back(child.deep_clone());
        }
        node
    }

    /// Collects every Error subtree reachable from this node. Does not
    /// descend into an Error (its wrapped AST may hold earlier errors that
    /// would double-report).
    pub fn get_errors(&self, out: &mut Vec<Node>) {
        if self.token() == Error {
            out.push(self.clone());
            return;
        }

        for child in self.children() {
            child.get_errors(out);
        }
    }

    pub fn tree_size(&self) -> usize {
        1 + self.children().map(|c| c.tree_size()).sum::<usize>()
    }

    pub fn tree_height(&self) -> usize {
        1 + self
            .children()
            .map(|c| c.tree_height())
            .max()
            .unwrap_or(0)
    }

    /// Structural hash over tokens, printed locations, and child order.
    pub fn hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash_into(&mut hasher);
        hasher.finish()
    }

    fn hash_into(&self, hasher: &mut DefaultHasher) {
        self.token().name().hash(hasher);
        if self.token().has(flag::print) {
            self.location().view().hash(hasher);
        }
        self.len().hash(hasher);
        for child in self.children() {
            child.hash_into(hasher);
        }
    }

    /// Structural equality: same token sequence in depth-first order, with
    /// locations compared by view only on `print`-flagged tokens.
    pub fn structurally_eq(&self, other: &Node) -> bool {
        if self.token() != other.token() || self.len() != other.len() {
            return false;
        }

        if self.token().has(flag::print) && self.location().view() != other.location().view() {
            return false;
        }

        self.children()
            .zip(other.children())
            .all(|(a, b)| a.structurally_eq(&b))
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.token())
    }
}

/// Index-based forward iterator over a node's children.
pub struct Children {
    node: Node,
    index: usize,
}

impl Iterator for Children {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let child = self.node.child(self.index)?;
        self.index += 1;
        Some(child)
    }
}

impl From<Token> for Node {
    fn from(token: Token) -> Node {
        Node::new(token)
    }
}

// Construction DSL: `parent << child` appends and returns the parent;
// `Token ^ text` creates a leaf at a synthetic location.

impl Shl<Node> for Node {
    type Output = Node;

    fn shl(self, rhs: Node) -> Node {
        self.push_back(rhs);
        self
    }
}

impl Shl<Token> for Node {
    type Output = Node;

    fn shl(self, rhs: Token) -> Node {
        self << Node::new(rhs)
    }
}

impl Shl<Vec<Node>> for Node {
    type Output = Node;

    fn shl(self, rhs: Vec<Node>) -> Node {
        self.push_all(rhs);
        self
    }
}

impl Shl<Node> for Token {
    type Output = Node;

    fn shl(self, rhs: Node) -> Node {
        Node::new(self) << rhs
    }
}

impl Shl<Token> for Token {
    type Output = Node;

    fn shl(self, rhs: Token) -> Node {
        Node::new(self) << rhs
    }
}

impl Shl<Vec<Node>> for Token {
    type Output = Node;

    fn shl(self, rhs: Vec<Node>) -> Node {
        Node::new(self) << rhs
    }
}

impl BitXor<&str> for Token {
    type Output = Node;

    fn bitxor(self, rhs: &str) -> Node {
        Node::with_location(self, Location::synthetic(rhs))
    }
}

impl BitXor<String> for Token {
    type Output = Node;

    fn bitxor(self, rhs: String) -> Node {
        Node::with_location(self, Location::synthetic(rhs))
    }
}

impl BitXor<Location> for Token {
    type Output = Node;

    fn bitxor(self, rhs: Location) -> Node {
        Node::with_location(self, rhs)
    }
}

impl BitXor<&Node> for Token {
    type Output = Node;

    fn bitxor(self, rhs: &Node) -> Node {
        Node::with_location(self, rhs.location())
    }
}
