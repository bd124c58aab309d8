//! The well-formedness language.
//!
//! A [`Wellformed`] maps token kinds to [`Shape`]s. A shape is either an
//! ordered list of named fields or a homogeneous sequence with a minimum
//! length; a token with no shape is required to be a leaf. Shapes compose
//! right-biased: `a | b` keeps `b`'s shape for any token both declare.
//!
//! Shape declarations read close to the grammar they describe:
//!
//! ```
//! use trieste_core::wf::{Wellformed, seq};
//! use trieste_core::{tokens, Top};
//!
//! tokens! {
//!     Calculation = "calculation" [symtab | defbeforeuse];
//!     Assign = "assign" [lookup];
//!     Output = "output";
//!     Ident = "ident" [print];
//!     Expression = "expression";
//! }
//!
//! let wf = Wellformed::new()
//!     .shape(Top, Calculation)
//!     .shape(Calculation, seq(Assign | Output))
//!     .shape(Assign, (Ident * Expression).binding(Ident));
//! assert!(wf.index(Assign, Expression).is_some());
//! ```

mod build;
mod check;
mod context;
mod r#gen;

pub use build::BuildAstError;
pub use check::WfError;
pub use context::{WfContext, field_index, field_of, pop, push};
pub use r#gen::{GenLocation, Generators};

use std::ops::{BitOr, Mul, Sub};

use indexmap::IndexMap;

use crate::{Index, Invalid, Token, TokenSet};

/// A nonempty set of allowed child token kinds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Choice {
    pub types: Vec<Token>,
}

impl Choice {
    pub fn contains(&self, token: Token) -> bool {
        self.types.contains(&token)
    }

    fn add(&mut self, token: Token) {
        if !self.contains(token) {
            self.types.push(token);
        }
    }
}

impl From<Token> for Choice {
    fn from(token: Token) -> Choice {
        Choice {
            types: vec![token],
        }
    }
}

/// A homogeneous child sequence: every child in `choice`, at least `minlen`
/// of them. Its binding may only be `Invalid` (none) or `Include`.
#[derive(Clone, Debug)]
pub struct Sequence {
    pub choice: Choice,
    pub minlen: usize,
    pub binding: Token,
}

/// One named field with its allowed kinds.
#[derive(Clone, Debug)]
pub struct Field {
    pub name: Token,
    pub choice: Choice,
}

/// An ordered list of named fields, optionally binding one field's value
/// into the enclosing symbol table.
#[derive(Clone, Debug)]
pub struct Fields {
    pub fields: Vec<Field>,
    pub binding: Token,
}

#[derive(Clone, Debug)]
pub enum Shape {
    Fields(Fields),
    Sequence(Sequence),
}

impl Shape {
    /// A terminal shape generates no children.
    pub fn terminal(&self) -> bool {
        match self {
            Shape::Fields(fields) => fields.fields.is_empty(),
            Shape::Sequence(_) => false,
        }
    }
}

/// Starts a sequence shape with minimum length zero.
pub fn seq(choice: impl Into<Choice>) -> Sequence {
    Sequence {
        choice: choice.into(),
        minlen: 0,
        binding: Invalid,
    }
}

impl Sequence {
    pub fn minlen(mut self, minlen: usize) -> Self {
        self.minlen = minlen;
        self
    }

    pub fn binding(mut self, binding: Token) -> Self {
        self.binding = binding;
        self
    }
}

/// A single named field; `field(Value, Object | Array)` declares a field
/// called `Value` accepting either kind.
pub fn field(name: Token, choice: impl Into<Choice>) -> Fields {
    Fields {
        fields: vec![Field {
            name,
            choice: choice.into(),
        }],
        binding: Invalid,
    }
}

impl Fields {
    pub fn binding(mut self, binding: Token) -> Self {
        self.binding = binding;
        self
    }

    pub fn index_of(&self, name: Token) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Converts shape arguments in declaration position: a bare token is a
/// single self-named field, a choice is one field named after the owning
/// token.
pub trait IntoShape {
    fn into_shape(self, owner: Token) -> Shape;
}

impl IntoShape for Shape {
    fn into_shape(self, _owner: Token) -> Shape {
        self
    }
}

impl IntoShape for Fields {
    fn into_shape(self, _owner: Token) -> Shape {
        Shape::Fields(self)
    }
}

impl IntoShape for Sequence {
    fn into_shape(self, _owner: Token) -> Shape {
        Shape::Sequence(self)
    }
}

impl IntoShape for Token {
    fn into_shape(self, _owner: Token) -> Shape {
        Shape::Fields(field(self, self))
    }
}

impl IntoShape for Choice {
    fn into_shape(self, owner: Token) -> Shape {
        Shape::Fields(field(owner, self))
    }
}

/// A set of shape declarations; the requirements document for one pass's
/// output.
#[derive(Clone, Debug, Default)]
pub struct Wellformed {
    pub shapes: IndexMap<Token, Shape>,
}

impl Wellformed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares (or overrides) the shape for a token.
    pub fn shape(mut self, token: Token, shape: impl IntoShape) -> Self {
        self.shapes.insert(token, shape.into_shape(token));
        self
    }

    pub fn get(&self, token: Token) -> Option<&Shape> {
        self.shapes.get(&token)
    }

    /// Static index of a named field within a Fields shape, usable as a
    /// typed child accessor.
    pub fn index(&self, token: Token, name: Token) -> Option<Index> {
        match self.get(token)? {
            Shape::Fields(fields) => fields.index_of(name).map(|index| Index { token, index }),
            Shape::Sequence(_) => None,
        }
    }

    /// Tokens whose shape can generate children.
    pub fn nonterminals(&self) -> TokenSet {
        self.shapes
            .iter()
            .filter(|(_, shape)| !shape.terminal())
            .map(|(&token, _)| token)
            .collect()
    }

    /// Resolves a token name against the shape keys, and against the choice
    /// types of `context`'s shape when a context node kind is given. Used by
    /// the printed-AST parser.
    pub fn find_type(&self, context: Option<Token>, name: &str) -> Option<Token> {
        // Composition is right-biased, so search later shapes first.
        for (&token, shape) in self.shapes.iter().rev() {
            if token.name() == name {
                return Some(token);
            }

            if context == Some(token) {
                let found = match shape {
                    Shape::Fields(fields) => fields
                        .fields
                        .iter()
                        .flat_map(|f| f.choice.types.iter())
                        .find(|t| t.name() == name),
                    Shape::Sequence(sequence) => {
                        sequence.choice.types.iter().find(|t| t.name() == name)
                    }
                };
                if let Some(&token) = found {
                    return Some(token);
                }
            }
        }

        None
    }

    /// True when the token appears in any shape's choices or fields.
    pub fn mentions(&self, token: Token) -> bool {
        self.shapes.values().any(|shape| match shape {
            Shape::Fields(fields) => fields.fields.iter().any(|f| f.choice.contains(token)),
            Shape::Sequence(sequence) => sequence.choice.contains(token),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

// Choice algebra: `A | B` union, `A - B` difference.

impl BitOr<Token> for Token {
    type Output = Choice;

    fn bitor(self, rhs: Token) -> Choice {
        let mut choice = Choice::from(self);
        choice.add(rhs);
        choice
    }
}

impl BitOr<Token> for Choice {
    type Output = Choice;

    fn bitor(mut self, rhs: Token) -> Choice {
        self.add(rhs);
        self
    }
}

impl BitOr<Choice> for Token {
    type Output = Choice;

    fn bitor(self, rhs: Choice) -> Choice {
        let mut choice = Choice::from(self);
        for t in rhs.types {
            choice.add(t);
        }
        choice
    }
}

impl BitOr<Choice> for Choice {
    type Output = Choice;

    fn bitor(mut self, rhs: Choice) -> Choice {
        for t in rhs.types {
            self.add(t);
        }
        self
    }
}

impl Sub<Choice> for Choice {
    type Output = Choice;

    fn sub(mut self, rhs: Choice) -> Choice {
        self.types.retain(|t| !rhs.contains(*t));
        self
    }
}

impl Sub<Token> for Choice {
    type Output = Choice;

    fn sub(mut self, rhs: Token) -> Choice {
        self.types.retain(|t| *t != rhs);
        self
    }
}

// Field algebra: `A * B` runs fields together; a bare token is a field
// named after itself.

impl Mul<Token> for Token {
    type Output = Fields;

    fn mul(self, rhs: Token) -> Fields {
        field(self, self) * field(rhs, rhs)
    }
}

impl Mul<Fields> for Token {
    type Output = Fields;

    fn mul(self, rhs: Fields) -> Fields {
        field(self, self) * rhs
    }
}

impl Mul<Token> for Fields {
    type Output = Fields;

    fn mul(self, rhs: Token) -> Fields {
        self * field(rhs, rhs)
    }
}

impl Mul<Fields> for Fields {
    type Output = Fields;

    fn mul(mut self, rhs: Fields) -> Fields {
        self.fields.extend(rhs.fields);
        self
    }
}

// Composition: right-biased merge.

impl BitOr<Wellformed> for Wellformed {
    type Output = Wellformed;

    fn bitor(mut self, rhs: Wellformed) -> Wellformed {
        for (token, shape) in rhs.shapes {
            self.shapes.insert(token, shape);
        }
        self
    }
}
