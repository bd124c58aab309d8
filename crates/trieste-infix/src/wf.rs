//! Per-pass shape declarations for the calculator.
//!
//! Each pass's declaration extends the previous one, overriding only the
//! shapes the pass changes.

use trieste_lib::wf::{Choice, Wellformed, field, seq};
use trieste_lib::{File, Group, Top};

use crate::{
    Add, Assign, Calculation, Divide, Equals, Expression, Float, Ident, Int, Literal, Multiply,
    Output, Paren, Print, Ref, String, Subtract,
};

pub fn literal() -> Choice {
    Int | Float
}

fn parse_tokens() -> Choice {
    literal() | String | Paren | Print | Ident | Add | Subtract | Divide | Multiply
}

pub fn parser() -> Wellformed {
    Wellformed::new()
        .shape(Top, File)
        .shape(File, seq(Group | Equals))
        .shape(Paren, seq(Group))
        .shape(Equals, seq(Group))
        .shape(Group, seq(parse_tokens()))
}

fn expression_tokens() -> Choice {
    (parse_tokens() - (String | Paren | Print)) | Expression
}

pub fn pass_expressions() -> Wellformed {
    Wellformed::new()
        .shape(Top, Calculation)
        .shape(Calculation, seq(Assign | Output))
        // The Ident field is a symbol bound in the enclosing scope.
        .shape(Assign, (Ident * Expression).binding(Ident))
        .shape(Output, String * Expression)
        .shape(Expression, seq(expression_tokens()).minlen(1))
}

pub fn pass_multiply_divide() -> Wellformed {
    pass_expressions()
        | Wellformed::new()
            .shape(Multiply, Expression * Expression)
            .shape(Divide, Expression * Expression)
}

pub fn pass_add_subtract() -> Wellformed {
    pass_multiply_divide()
        | Wellformed::new()
            .shape(Add, Expression * Expression)
            .shape(Subtract, Expression * Expression)
}

fn operand_tokens() -> Choice {
    expression_tokens() - Expression
}

pub fn pass_trim() -> Wellformed {
    pass_add_subtract() | Wellformed::new().shape(Expression, operand_tokens())
}

fn checked_tokens() -> Choice {
    (operand_tokens() - Ident) | Ref
}

pub fn pass_check_refs() -> Wellformed {
    pass_trim()
        | Wellformed::new()
            .shape(Expression, checked_tokens())
            .shape(Ref, Ident)
}

pub fn pass_maths() -> Wellformed {
    pass_check_refs()
        | Wellformed::new()
            .shape(Assign, Ident * Literal)
            .shape(Output, String * Literal)
            .shape(Literal, literal())
}

pub fn pass_cleanup() -> Wellformed {
    pass_maths()
        | Wellformed::new()
            .shape(Calculation, seq(Output))
            // A choice as a field, under the old field's name.
            .shape(Output, field(String, String) * field(Expression, literal()))
}
