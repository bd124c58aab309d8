//! The infix calculator: the tutorial front-end for Trieste.
//!
//! A calculation is a sequence of assignments and print statements:
//!
//! ```text
//! x = 1 + 2 * 3;
//! print "result" x;
//! ```
//!
//! The pipeline parses the source into groups, structures them into
//! assignments and outputs, resolves operator precedence in two passes,
//! checks references against the symbol table, folds the arithmetic, and
//! finally drops everything but the outputs.

use rand::Rng;
use rand::RngCore;

use trieste_lib::wf::Generators;
use trieste_lib::{Reader, tokens};

mod lexer;
mod passes;
pub mod wf;

#[cfg(test)]
mod lang_tests;

pub use lexer::parse;
pub use passes::{
    add_subtract, check_refs, cleanup, expressions, maths, multiply_divide, trim,
};

tokens! {
    pub Paren = "paren";
    pub Equals = "equals";

    pub Int = "int" [print];
    pub Float = "float" [print];
    pub String = "string" [print];
    pub Ident = "ident" [print];

    pub Print = "print";

    /// The whole program; definitions are only visible after their
    /// assignment.
    pub Calculation = "calculation" [symtab | defbeforeuse];
    pub Expression = "expression";
    pub Assign = "assign" [lookup | shadowing];
    pub Output = "output";
    pub Ref = "ref";

    pub Add = "+";
    pub Subtract = "-";
    pub Multiply = "*";
    pub Divide = "/";
    pub Literal = "literal";

    // Capture names.
    pub Id = "id";
    pub Op = "op";
    pub Lhs = "lhs";
    pub Rhs = "rhs";
}

pub fn passes() -> Vec<trieste_lib::Pass> {
    vec![
        expressions(),
        multiply_divide(),
        add_subtract(),
        trim(),
        check_refs(),
        maths(),
        cleanup(),
    ]
}

/// Leaf-text generators used when fuzzing the calculator.
pub fn generators() -> Generators {
    Generators::new()
        .with(Int, |rng| (rng.next_u32() % 100).to_string())
        .with(Float, |rng| format!("{:.6}", rng.gen_range(-10.0..10.0)))
}

pub fn reader() -> Reader {
    Reader::new("infix", passes(), wf::parser(), |source| parse(source))
        .generators(generators())
}
