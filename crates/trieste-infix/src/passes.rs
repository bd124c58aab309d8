//! The calculator's rewrite passes.

use std::rc::Rc;

use trieste_lib::pass::{PassDef, dir};
use trieste_lib::{
    Error, ErrorAst, ErrorMsg, File, Group, Match, Node, Pass, Pattern, Top, any, end, inside, t,
};

use crate::wf;
use crate::{
    Add, Assign, Calculation, Divide, Equals, Expression, Float, Id, Ident, Int, Lhs, Literal,
    Multiply, Op, Output, Paren, Print, Ref, Rhs, String, Subtract,
};

fn err(ast: Vec<Node>, msg: &str) -> Node {
    Error << (ErrorMsg ^ msg) << (ErrorAst << ast)
}

fn exists(nodes: &[Node]) -> bool {
    nodes.first().is_some_and(|n| !n.lookup().is_empty())
}

/// An identifier can be folded when its latest definition assigns a
/// literal.
fn can_replace(nodes: &[Node]) -> bool {
    let defs = match nodes.first() {
        Some(node) => node.lookup(),
        None => return false,
    };

    defs.first().is_some_and(|assign| {
        assign.back().is_some_and(|value| value.token() == Literal)
    })
}

fn get_int(node: &Node) -> i64 {
    node.location().view().parse().unwrap_or_default()
}

fn get_float(node: &Node) -> f64 {
    node.location().view().parse().unwrap_or_default()
}

fn number() -> Pattern {
    t([Int, Float])
}

/// Structures the parse groups into a calculation of assignments and
/// outputs; everything that doesn't fit becomes an Error.
pub fn expressions() -> Pass {
    Rc::new(PassDef::new(
        "expressions",
        wf::pass_expressions(),
        dir::topdown,
        vec![
            // The File's contents become the Calculation.
            inside(Top) * t(File).cap(File) >> |m: &mut Match| {
                Calculation << m.contents(File)
            },

            // `<ident> = <expr>`: an Equals with a single-ident group on the
            // left becomes an Assign.
            inside(Calculation)
                * (t(Equals)
                    << ((t(Group) << t(Ident).cap(Id)) * t(Group).cap(Rhs)))
                >> |m: &mut Match| {
                    Assign << m.node(Id) << (Expression << m.contents(Rhs))
                },

            // `print <string> <expr>`: the remaining tokens of the group
            // form the output expression.
            inside(Calculation)
                * (t(Group)
                    << (t(Print) * t(String).cap(Lhs) * any().rep().cap(Rhs)))
                >> |m: &mut Match| {
                    Output << m.node(Lhs) << (Expression << m.range(Rhs))
                },

            // Parens inside expressions unwrap to nested expressions.
            inside(Expression) * (t(Paren) << t(Group).cap(Group)) >> |m: &mut Match| {
                Expression << m.contents(Group)
            },

            // Rules are ordered: anything the structural rules above did
            // not claim is an error.
            t(Paren).cap(Paren) >> |m: &mut Match| err(m.range(Paren), "Empty paren"),

            t(Equals).cap(Equals) >> |m: &mut Match| err(m.range(Equals), "Invalid assign"),

            t(Print).cap(Print) >> |m: &mut Match| err(m.range(Print), "Invalid output"),

            (t(Expression).cap(Rhs) << end()) >> |m: &mut Match| {
                err(m.range(Rhs), "Empty expression")
            },

            inside(Expression) * t(String).cap(String) >> |m: &mut Match| {
                err(m.range(String), "Expressions cannot contain strings")
            },

            t(Group).cap(Group) >> |m: &mut Match| err(m.range(Group), "syntax error"),
        ],
    ))
}

fn expression_arg() -> Pattern {
    t([Expression, Ident]) / number()
}

/// Groups `*` and `/` triplets, tightest first.
pub fn multiply_divide() -> Pass {
    Rc::new(PassDef::new(
        "multiply_divide",
        wf::pass_multiply_divide(),
        dir::topdown,
        vec![
            inside(Expression)
                * (expression_arg().cap(Lhs)
                    * t([Multiply, Divide]).cap(Op)
                    * expression_arg().cap(Rhs))
                >> |m: &mut Match| {
                    Expression
                        << (m.node(Op)
                            << (Expression << m.node(Lhs))
                            << (Expression << m.range(Rhs)))
                },

            (t([Multiply, Divide]).cap(Op) << end()) >> |m: &mut Match| {
                err(m.range(Op), "No arguments")
            },
        ],
    ))
}

/// Groups `+` and `-` triplets after multiplication has bound.
pub fn add_subtract() -> Pass {
    Rc::new(PassDef::new(
        "add_subtract",
        wf::pass_add_subtract(),
        dir::topdown,
        vec![
            inside(Expression)
                * (expression_arg().cap(Lhs)
                    * t([Add, Subtract]).cap(Op)
                    * expression_arg().cap(Rhs))
                >> |m: &mut Match| {
                    Expression
                        << (m.node(Op)
                            << (Expression << m.node(Lhs))
                            << (Expression << m.range(Rhs)))
                },

            (t([Add, Subtract]).cap(Op) << end()) >> |m: &mut Match| {
                err(m.range(Op), "No arguments")
            },
        ],
    ))
}

/// Unwraps single-child expressions.
pub fn trim() -> Pass {
    Rc::new(PassDef::new(
        "trim",
        wf::pass_trim(),
        dir::topdown,
        vec![
            (t(Expression) << (t(Expression).cap(Expression) * end())) >> |m: &mut Match| {
                m.node(Expression)
            },

            (t(Expression) << (any() * any().cap(Rhs))) >> |m: &mut Match| {
                err(m.range(Rhs), "Only one value allowed per expression")
            },
        ],
    ))
}

/// Replaces identifier uses with references, or errors on undefined names.
pub fn check_refs() -> Pass {
    Rc::new(PassDef::new(
        "check_refs",
        wf::pass_check_refs(),
        dir::topdown,
        vec![
            inside(Expression) * t(Ident).cap(Id) >> |m: &mut Match| {
                let id = m.node(Id);
                if id.lookup().is_empty() {
                    err(vec![id], "undefined")
                } else {
                    Ref << id
                }
            },
        ],
    ))
}

fn maths_op() -> Pattern {
    t([Add, Subtract, Multiply, Divide])
}

/// Folds the arithmetic down to literals.
pub fn maths() -> Pass {
    Rc::new(PassDef::new(
        "maths",
        wf::pass_maths(),
        dir::topdown,
        vec![
            (t(Add) << ((t(Literal) << t(Int).cap(Lhs)) * (t(Literal) << t(Int).cap(Rhs))))
                >> |m: &mut Match| {
                    let sum = get_int(&m.node(Lhs)).wrapping_add(get_int(&m.node(Rhs)));
                    Int ^ sum.to_string()
                },

            (t(Add) << ((t(Literal) << number().cap(Lhs)) * (t(Literal) << number().cap(Rhs))))
                >> |m: &mut Match| {
                    let sum = get_float(&m.node(Lhs)) + get_float(&m.node(Rhs));
                    Float ^ sum.to_string()
                },

            (t(Subtract)
                << ((t(Literal) << t(Int).cap(Lhs)) * (t(Literal) << t(Int).cap(Rhs))))
                >> |m: &mut Match| {
                    let diff = get_int(&m.node(Lhs)).wrapping_sub(get_int(&m.node(Rhs)));
                    Int ^ diff.to_string()
                },

            (t(Subtract)
                << ((t(Literal) << number().cap(Lhs)) * (t(Literal) << number().cap(Rhs))))
                >> |m: &mut Match| {
                    let diff = get_float(&m.node(Lhs)) - get_float(&m.node(Rhs));
                    Float ^ diff.to_string()
                },

            (t(Multiply)
                << ((t(Literal) << t(Int).cap(Lhs)) * (t(Literal) << t(Int).cap(Rhs))))
                >> |m: &mut Match| {
                    let product = get_int(&m.node(Lhs)).wrapping_mul(get_int(&m.node(Rhs)));
                    Int ^ product.to_string()
                },

            (t(Multiply)
                << ((t(Literal) << number().cap(Lhs)) * (t(Literal) << number().cap(Rhs))))
                >> |m: &mut Match| {
                    let product = get_float(&m.node(Lhs)) * get_float(&m.node(Rhs));
                    Float ^ product.to_string()
                },

            (t(Divide) << ((t(Literal) << t(Int).cap(Lhs)) * (t(Literal) << t(Int).cap(Rhs))))
                >> |m: &mut Match| {
                    let rhs = get_int(&m.node(Rhs));
                    if rhs == 0 {
                        return err(m.range(Rhs), "Divide by zero");
                    }
                    Int ^ (get_int(&m.node(Lhs)).wrapping_div(rhs)).to_string()
                },

            (t(Divide)
                << ((t(Literal) << number().cap(Lhs)) * (t(Literal) << number().cap(Rhs))))
                >> |m: &mut Match| {
                    let rhs = get_float(&m.node(Rhs));
                    if rhs == 0.0 {
                        return err(m.range(Rhs), "Divide by zero");
                    }
                    Float ^ (get_float(&m.node(Lhs)) / rhs).to_string()
                },

            // A reference to a literal assignment folds to a copy of the
            // assigned value.
            (t(Expression) << (t(Ref) << t(Ident).cap(Id)).action(can_replace))
                >> |m: &mut Match| {
                    let defs = m.node(Id).lookup();
                    let assign = defs.first().expect("guarded by the action");
                    assign.back().expect("assign has a value").deep_clone()
                },

            (t(Expression) << number().cap(Rhs)) >> |m: &mut Match| Literal << m.node(Rhs),

            // This case shouldn't arise from parsed programs, but occurs
            // during generative testing.
            (t(Expression) << (t(Ref) << t(Ident).cap(Id)).action(|n| !exists(n)))
                >> |_: &mut Match| Literal << (Int ^ "0"),

            // Note how the error cases pattern match explicitly on Error.
            inside(Expression)
                * (maths_op()
                    << ((t(Expression).cap(Expression) << t(Error)) * t(Literal)))
                >> |m: &mut Match| {
                    err(m.range(Expression), "Invalid left hand argument")
                },

            inside(Expression)
                * (maths_op()
                    << (t(Literal) * (t(Expression).cap(Expression) << t(Error))))
                >> |m: &mut Match| {
                    err(m.range(Expression), "Invalid right hand argument")
                },

            inside(Expression)
                * (maths_op().cap(Op)
                    << ((t(Expression) << t(Error)) * (t(Expression) << t(Error))))
                >> |m: &mut Match| err(m.range(Op), "No valid arguments"),

            inside(Calculation)
                * (t(Output).cap(Output)
                    << (t(String) * (t(Expression) << t(Error))))
                >> |m: &mut Match| err(m.range(Output), "Empty output expression"),

            inside(Calculation)
                * (t(Assign).cap(Assign)
                    << (t(Ident) * (t(Expression) << t(Error))))
                >> |m: &mut Match| err(m.range(Assign), "Empty assign expression"),
        ],
    ))
}

/// Drops assignments and unwraps literals; only outputs remain.
pub fn cleanup() -> Pass {
    Rc::new(PassDef::new(
        "cleanup",
        wf::pass_cleanup(),
        dir::topdown,
        vec![
            inside(Calculation) * t(Assign) >> |_: &mut Match| -> Option<Node> { None },

            (t(Literal) << any().cap(Rhs)) >> |m: &mut Match| m.node(Rhs),
        ],
    ))
}
