//! Random generation of conforming trees.

use std::collections::HashMap;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use super::{Choice, Fields, Sequence, Shape, Wellformed};
use crate::{Invalid, Location, Node, Token, TokenSet, Top};

/// Produces the text of a generated leaf of one token kind.
pub type GenLocation = Rc<dyn Fn(&mut SmallRng) -> String>;

/// Per-token leaf text generators supplied by a front-end. Tokens without a
/// generator receive fresh `$n` names from the tree's counter.
#[derive(Clone, Default)]
pub struct Generators {
    map: HashMap<Token, GenLocation>,
}

impl Generators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        token: Token,
        f: impl Fn(&mut SmallRng) -> String + 'static,
    ) -> Self {
        self.map.insert(token, Rc::new(f));
        self
    }

    fn location(&self, rng: &mut SmallRng, node: &Node) -> Location {
        match self.map.get(&node.token()) {
            Some(f) => Location::synthetic(f(rng)),
            None => node.fresh(),
        }
    }
}

struct Gen<'g> {
    rng: SmallRng,
    max_depth: usize,
    bound_vars: bool,
    nonterminals: TokenSet,
    generators: &'g Generators,
}

impl Gen<'_> {
    fn next(&mut self) -> u32 {
        self.rng.next_u32()
    }
}

impl Wellformed {
    /// Produces a random tree conforming to this declaration, rooted at Top.
    ///
    /// Choices pick uniformly; past `max_depth` they restrict to terminal
    /// kinds when any exist. Sequences emit their minimum length and then
    /// continue on coin flips. Fields with a binding bind immediately after
    /// the bound child unless `bound_vars` is false.
    pub fn r#gen(
        &self,
        generators: &Generators,
        seed: u64,
        max_depth: usize,
        bound_vars: bool,
    ) -> Node {
        let mut g = Gen {
            rng: SmallRng::seed_from_u64(seed),
            max_depth,
            bound_vars,
            nonterminals: self.nonterminals(),
            generators,
        };

        let top = Node::new(Top);
        self.gen_node(&mut g, 0, &top);
        top
    }

    fn gen_node(&self, g: &mut Gen, depth: usize, node: &Node) {
        match self.get(node.token()) {
            Some(Shape::Fields(fields)) => gen_fields(fields, g, depth, node),
            Some(Shape::Sequence(sequence)) => gen_sequence(sequence, g, depth, node),
            None => return,
        }

        for child in node.children() {
            self.gen_node(g, depth + 1, &child);
        }
    }
}

fn gen_child(choice: &Choice, g: &mut Gen, depth: usize, node: &Node) {
    let types = &choice.types;
    let token = if depth < g.max_depth {
        types[g.next() as usize % types.len()]
    } else {
        let terminal: Vec<Token> = types
            .iter()
            .copied()
            .filter(|t| !g.nonterminals.contains(t))
            .collect();
        if terminal.is_empty() {
            types[g.next() as usize % types.len()]
        } else {
            terminal[g.next() as usize % terminal.len()]
        }
    };

    let child = Node::new(token);
    node.push_back(child.clone());

    // Attach before asking for text: the fresh-name fallback walks to Top.
    let loc = g.generators.location(&mut g.rng, &child);
    child.set_location(&loc);
}

fn gen_fields(fields: &Fields, g: &mut Gen, depth: usize, node: &Node) {
    for field in &fields.fields {
        gen_child(&field.choice, g, depth, node);

        if g.bound_vars && fields.binding != Invalid && fields.binding == field.name {
            if let Some(back) = node.back() {
                node.bind(&back.location());
            }
        }
    }
}

fn gen_sequence(sequence: &Sequence, g: &mut Gen, depth: usize, node: &Node) {
    for _ in 0..sequence.minlen {
        gen_child(&sequence.choice, g, depth, node);
    }

    while g.next() % 2 == 1 {
        gen_child(&sequence.choice, g, depth, node);
    }
}
