//! Group-tree construction for front-end tokenizers.
//!
//! The core does not own lexing; a front-end (typically a logos lexer)
//! walks its token stream and drives a [`TreeBuilder`], which maintains the
//! current insertion point and the Group discipline: leaves land in an
//! implicit `Group`, [`TreeBuilder::seq`] folds the group into an n-ary
//! separator node, and [`TreeBuilder::push`]/[`TreeBuilder::pop`] nest
//! bracketed constructs. [`TreeBuilder::done`] closes anything left open
//! with an `unclosed` Error.

use trieste_core::{Error, ErrorAst, ErrorMsg, Group, Invalid, Location, Node, Token};

pub struct TreeBuilder {
    top: Node,
    node: Node,
}

impl TreeBuilder {
    /// Starts a tree rooted at a node of `token` (usually `File`) covering
    /// `location`.
    pub fn new(token: Token, location: Location) -> Self {
        let node = Node::with_location(token, location);
        TreeBuilder {
            top: node.clone(),
            node,
        }
    }

    /// True when the insertion point is a node of the given kind.
    pub fn in_node(&self, token: Token) -> bool {
        self.node.token() == token
    }

    /// True when the last token added to the current group has this kind.
    pub fn previous_is(&self, token: Token) -> bool {
        self.in_node(Group)
            && self
                .node
                .back()
                .is_some_and(|back| back.token() == token)
    }

    /// Appends a leaf, opening a Group first when not already in one.
    pub fn add(&mut self, token: Token, location: Location) {
        if token != Group && !self.in_node(Group) {
            self.push(Group, location.clone());
        }

        self.node.push_back(Node::with_location(token, location));
    }

    /// Appends a node and makes it the insertion point.
    pub fn push(&mut self, token: Token, location: Location) {
        self.add(token, location);
        self.node = self.node.back().expect("just pushed");
    }

    /// Closes the current node of the given kind; marks the input invalid
    /// when the kinds do not line up.
    pub fn pop(&mut self, token: Token, location: Location) {
        if !self.try_pop(token) {
            self.invalid(location);
        }
    }

    /// Folds the current group under an n-ary separator node of `token`:
    /// `a = b = c` becomes one `Equals` with three groups. Parents listed in
    /// `skip` are climbed out of first.
    pub fn seq(&mut self, token: Token, location: Location, skip: &[Token]) {
        if !self.in_node(Group) {
            self.push(Group, location.clone());
        }

        loop {
            let parent = self.node.parent().expect("group below the root");
            if skip.contains(&parent.token()) {
                self.node = parent;
            } else {
                break;
            }
        }

        let parent = self.node.parent().expect("group below the root");

        if parent.token() == token {
            self.node = parent;
        } else {
            let seq = Node::with_location(token, location);
            let group = parent.pop_back().expect("current group is the back child");
            parent.push_back(seq.clone());
            seq.push_back(group);
            self.node = seq;
        }
    }

    /// Terminates the current group, then closes any of the given
    /// terminator kinds.
    pub fn term(&mut self, terminators: &[Token]) {
        self.try_pop(Group);

        for &token in terminators {
            self.try_pop(token);
        }
    }

    /// Extends the last node when it has this kind; appends one otherwise.
    pub fn extend(&mut self, token: Token, location: Location) {
        match self.node.back() {
            Some(back) if back.token() == token => back.extend_location(&location),
            _ => self.add(token, location),
        }
    }

    /// Extends the first child's location backwards to a zero-length span.
    pub fn extend_before(&mut self, token: Token, location: Location) {
        if let Some(front) = self.node.front() {
            if front.token() == token {
                let mut start = location;
                start.len = 0;
                front.extend_location(&start);
            }
        }
    }

    /// Marks unrecognized input, coalescing runs into one `Invalid` node.
    pub fn invalid(&mut self, location: Location) {
        self.extend(Invalid, location);
    }

    /// Appends an Error leaf in the current group.
    pub fn error(&mut self, message: &str, location: Location) {
        if !self.in_node(Group) {
            self.push(Group, location.clone());
        }
        self.node.push_back(make_error(&location, message));
    }

    /// Finishes the tree. Nodes still open receive an `unclosed` Error.
    pub fn done(mut self) -> Node {
        self.term(&[]);

        while let Some(parent) = self.node.parent() {
            self.node
                .push_back(make_error(&self.node.location(), "this is unclosed"));
            self.term(&[]);
            self.node = parent;
            self.term(&[]);
        }

        assert!(self.node == self.top, "malformed parse tree");
        self.top
    }

    fn try_pop(&mut self, token: Token) -> bool {
        if !self.in_node(token) {
            return false;
        }

        if let Some(back) = self.node.back() {
            self.node.extend_location(&back.location());
        }

        match self.node.parent() {
            Some(parent) => {
                self.node = parent;
                true
            }
            None => false,
        }
    }
}

fn make_error(location: &Location, message: &str) -> Node {
    (Error ^ location.clone())
        << (ErrorMsg ^ message)
        << (ErrorAst ^ location.clone())
}
