//! Per-rule capture state.
//!
//! A [`Match`] holds a stack of frames mapping capture-name tokens to node
//! ranges. The backing vector is reused across rule attempts: speculative
//! sub-matches push a frame and rewind the cursor index on failure, so no
//! allocation happens on the fast path.

use std::collections::HashMap;

use trieste_core::{Location, Node, Token};

struct Frame {
    valid: bool,
    captures: HashMap<Token, Vec<Node>>,
}

impl Frame {
    fn new() -> Self {
        Frame {
            valid: false,
            captures: HashMap::new(),
        }
    }
}

pub struct Match {
    root: Node,
    frames: Vec<Frame>,
    index: usize,
}

impl Match {
    pub(crate) fn new(root: &Node) -> Self {
        Match {
            root: root.clone(),
            frames: std::iter::repeat_with(Frame::new).take(16).collect(),
            index: 0,
        }
    }

    /// The node a pattern match captured under `name`; the first node of the
    /// range when several matched.
    ///
    /// # Panics
    ///
    /// Panics when nothing was captured under `name`; an effect asking for a
    /// capture its pattern does not guarantee is a rule bug.
    pub fn node(&self, name: Token) -> Node {
        self.try_node(name)
            .unwrap_or_else(|| panic!("no capture named {name}"))
    }

    pub fn try_node(&self, name: Token) -> Option<Node> {
        // Unlike `range`, an empty capture keeps scanning outer frames.
        for frame in self.frames[..=self.index].iter().rev() {
            if frame.valid {
                if let Some(node) = frame.captures.get(&name).and_then(|r| r.first()) {
                    return Some(node.clone());
                }
            }
        }
        None
    }

    /// The full captured range under `name`; empty when nothing matched.
    pub fn range(&self, name: Token) -> Vec<Node> {
        self.find(name).map(<[Node]>::to_vec).unwrap_or_default()
    }

    /// The concatenated children of every node captured under `name`. This
    /// is the splice form: `Calculation << m.contents(File)` moves the
    /// File's children rather than the File itself.
    pub fn contents(&self, name: Token) -> Vec<Node> {
        self.range(name)
            .iter()
            .flat_map(Node::children)
            .collect()
    }

    /// Mints a unique name from the matched tree's root counter.
    pub fn fresh(&self) -> Location {
        self.root.fresh()
    }

    pub fn fresh_with(&self, prefix: &str) -> Location {
        self.root.fresh_with(prefix)
    }

    fn find(&self, name: Token) -> Option<&[Node]> {
        // Scan from the cursor frame downward so inner frames win.
        for frame in self.frames[..=self.index].iter().rev() {
            if frame.valid {
                if let Some(range) = frame.captures.get(&name) {
                    return Some(range);
                }
            }
        }
        None
    }

    pub(crate) fn set(&mut self, name: Token, range: Vec<Node>) {
        let frame = &mut self.frames[self.index];
        if !frame.valid {
            frame.captures.clear();
            frame.valid = true;
        }
        frame.captures.insert(name, range);
    }

    pub(crate) fn add_frame(&mut self) -> usize {
        self.index += 1;
        if self.frames.len() == self.index {
            self.frames
                .extend(std::iter::repeat_with(Frame::new).take(self.index));
        } else {
            self.frames[self.index].valid = false;
        }
        self.index - 1
    }

    pub(crate) fn return_to_frame(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn reset(&mut self) {
        self.index = 0;
        self.frames[0].valid = false;
    }
}
