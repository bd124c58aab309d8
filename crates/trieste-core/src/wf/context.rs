//! The thread-local well-formedness context.
//!
//! Printers and parsers that resolve token identity by name, and the typed
//! field accessor, look the relevant declaration up on a process-wide stack.
//! Pushes and pops must nest strictly; the [`WfContext`] guard restores the
//! stack on drop.

use std::cell::RefCell;

use super::Wellformed;
use crate::{Index, Node, Token};

thread_local! {
    static STACK: RefCell<Vec<Wellformed>> = const { RefCell::new(Vec::new()) };
}

pub fn push(wf: &Wellformed) {
    STACK.with(|stack| stack.borrow_mut().push(wf.clone()));
}

pub fn pop() {
    STACK.with(|stack| {
        stack
            .borrow_mut()
            .pop()
            .expect("well-formedness context underflow")
    });
}

/// RAII guard: pushes declarations on construction, pops them on drop.
pub struct WfContext {
    count: usize,
}

impl WfContext {
    pub fn new(wfs: &[&Wellformed]) -> Self {
        for wf in wfs {
            push(wf);
        }
        WfContext { count: wfs.len() }
    }
}

impl Drop for WfContext {
    fn drop(&mut self) {
        for _ in 0..self.count {
            pop();
        }
    }
}

/// Field index for `(token, name)` against the context stack, most recently
/// pushed declaration first.
pub fn field_index(token: Token, name: Token) -> Option<Index> {
    STACK.with(|stack| {
        stack
            .borrow()
            .iter()
            .rev()
            .find_map(|wf| wf.index(token, name))
    })
}

/// Typed child accessor: the child of `node` at the field called `name` in
/// the context's shape for the node's kind.
pub fn field_of(node: &Node, name: Token) -> Option<Node> {
    let index = field_index(node.token(), name)?;
    node.child(index.index)
}
