use trieste_core::{Error, ErrorAst, ErrorMsg, Lift, NoChange, Node, Seq, Top, tokens};

use crate::pass::{PassDef, dir};
use crate::rewrite::{Match, end, inside, t};

tokens! {
    Calc = "calc";
    Wrap = "wrap";
    Int = "int" [print];
    Ident = "ident" [print];
    Add = "+";
    Lhs = "lhs";
    Rhs = "rhs";
}

fn wf_any() -> trieste_core::wf::Wellformed {
    trieste_core::wf::Wellformed::new()
}

fn top(children: Vec<Node>) -> Node {
    Node::new(Top) << (Calc << children)
}

fn int(text: &str) -> Node {
    Int ^ text
}

#[test]
fn rewrites_to_fixed_point() {
    // Fold Int + Int pairs until none remain.
    let pass = PassDef::new(
        "fold",
        wf_any(),
        dir::topdown,
        vec![
            t(Int).cap(Lhs) * t(Add) * t(Int).cap(Rhs) >> |m: &mut Match| {
                let lhs: i64 = m.node(Lhs).location().view().parse().unwrap();
                let rhs: i64 = m.node(Rhs).location().view().parse().unwrap();
                Int ^ (lhs + rhs).to_string()
            },
        ],
    );

    let ast = top(vec![
        int("1"),
        Add.into(),
        int("2"),
        Add.into(),
        int("3"),
    ]);

    let (count, changes) = pass.run(&ast).unwrap();
    assert_eq!(changes, 2);
    // One extra iteration to observe the fixed point.
    assert_eq!(count, 2);

    let calc = ast.front().unwrap();
    assert_eq!(calc.len(), 1);
    assert_eq!(calc.front().unwrap().location().view(), "6");
}

#[test]
fn seq_results_splice_in_place() {
    let pass = PassDef::new(
        "duplicate",
        wf_any(),
        dir::topdown | dir::once,
        vec![
            t(Int).cap(Lhs) >> |m: &mut Match| {
                let text = m.node(Lhs).location().view().to_string();
                Seq << (Ident ^ text.clone()) << (Ident ^ text)
            },
        ],
    );

    let ast = top(vec![int("7"), int("8")]);
    let (_, changes) = pass.run(&ast).unwrap();
    assert_eq!(changes, 4);

    let calc = ast.front().unwrap();
    let views: Vec<String> = calc
        .children()
        .map(|c| c.location().view().to_string())
        .collect();
    assert_eq!(views, ["7", "7", "8", "8"]);
}

#[test]
fn empty_effect_removes_the_match() {
    let pass = PassDef::new(
        "strip",
        wf_any(),
        dir::topdown,
        vec![t(Add) >> |_: &mut Match| -> Option<Node> { None }],
    );

    let ast = top(vec![int("1"), Add.into(), int("2"), Add.into()]);
    let (count, changes) = pass.run(&ast).unwrap();
    assert_eq!(changes, 0); // removals count the inserted nodes: zero
    assert_eq!(count, 1); // and so the pass stops after one iteration

    let calc = ast.front().unwrap();
    assert_eq!(calc.len(), 2);
}

#[test]
fn nochange_falls_through_to_later_rules() {
    let pass = PassDef::new(
        "fallthrough",
        wf_any(),
        dir::topdown | dir::once,
        vec![
            t(Int).cap(Lhs) >> |m: &mut Match| {
                if m.node(Lhs).location().view() == "0" {
                    Node::from(NoChange)
                } else {
                    Ident ^ "nonzero"
                }
            },
            t(Int) >> |_: &mut Match| Ident ^ "zero",
        ],
    );

    let ast = top(vec![int("0"), int("1")]);
    pass.run(&ast).unwrap();

    let calc = ast.front().unwrap();
    assert_eq!(calc.child(0).unwrap().location().view(), "zero");
    assert_eq!(calc.child(1).unwrap().location().view(), "nonzero");
}

#[test]
fn once_rewrites_each_position_once() {
    // Without `once` this rule would run forever.
    let pass = PassDef::new(
        "increment",
        wf_any(),
        dir::topdown | dir::once,
        vec![
            t(Int).cap(Lhs) >> |m: &mut Match| {
                let n: i64 = m.node(Lhs).location().view().parse().unwrap();
                Int ^ (n + 1).to_string()
            },
        ],
    );

    let ast = top(vec![int("0"), int("5")]);
    let (count, changes) = pass.run(&ast).unwrap();
    assert_eq!(count, 1);
    assert_eq!(changes, 2);

    let calc = ast.front().unwrap();
    assert_eq!(calc.child(0).unwrap().location().view(), "1");
    assert_eq!(calc.child(1).unwrap().location().view(), "6");
}

#[test]
fn spliced_children_share_the_union_location() {
    let source = trieste_core::Location::synthetic("1+2");
    let src = source.source.clone().unwrap();

    let lhs = Node::with_location(Int, trieste_core::Location::new(src.clone(), 0, 1));
    let add = Node::with_location(Add, trieste_core::Location::new(src.clone(), 1, 1));
    let rhs = Node::with_location(Int, trieste_core::Location::new(src, 2, 1));

    let pass = PassDef::new(
        "span",
        wf_any(),
        dir::topdown | dir::once,
        vec![
            t(Int) * t(Add) * t(Int) >> |_: &mut Match| Seq << Node::new(Wrap) << Node::new(Wrap),
        ],
    );

    let ast = top(vec![lhs, add, rhs]);
    pass.run(&ast).unwrap();

    let calc = ast.front().unwrap();
    assert_eq!(calc.len(), 2);
    for child in calc.children() {
        assert_eq!(child.location().view(), "1+2");
    }
}

#[test]
fn errors_are_opaque_to_rules() {
    let pass = PassDef::new(
        "rename",
        wf_any(),
        dir::topdown,
        vec![t(Int) >> |_: &mut Match| Ident ^ "renamed"],
    );

    let wrapped = Error << (ErrorMsg ^ "bad") << (ErrorAst << int("1"));
    let ast = top(vec![wrapped, int("2")]);
    pass.run(&ast).unwrap();

    let calc = ast.front().unwrap();
    // The Int inside the Error is untouched; the sibling is rewritten.
    let inside_error = calc.child(0).unwrap().child(1).unwrap().front().unwrap();
    assert_eq!(inside_error.location().view(), "1");
    assert_eq!(calc.child(1).unwrap().location().view(), "renamed");
}

#[test]
fn lift_splices_at_the_target_ancestor() {
    // A rule under Wrap lifts its Int up to the enclosing Calc.
    let pass = PassDef::new(
        "hoist",
        wf_any(),
        dir::topdown | dir::once,
        vec![
            inside(Wrap) * t(Int).cap(Lhs) >> |m: &mut Match| {
                Lift << Node::from(Calc) << m.node(Lhs)
            },
        ],
    );

    let wrap = Wrap << int("9");
    let ast = Node::new(Top) << (Calc << wrap << int("1"));

    pass.run(&ast).unwrap();

    let calc = ast.front().unwrap();
    assert_eq!(calc.len(), 3);
    // The lifted Int lands at the position of the subtree it escaped.
    assert_eq!(calc.child(0).unwrap().location().view(), "9");
    assert_eq!(calc.child(1).unwrap().token(), Wrap);
    assert!(calc.child(1).unwrap().is_empty());
    assert_eq!(calc.child(2).unwrap().location().view(), "1");
}

#[test]
fn dangling_lift_is_a_pipeline_error() {
    let pass = PassDef::new(
        "hoist",
        wf_any(),
        dir::topdown | dir::once,
        vec![
            t(Int).cap(Lhs) >> |m: &mut Match| {
                // No Wrap ancestor exists, so this Lift cannot land.
                Lift << Node::from(Wrap) << m.node(Lhs)
            },
        ],
    );

    let ast = top(vec![int("1")]);
    let err = pass.run(&ast).unwrap_err();
    assert!(err.to_string().contains("lifted nodes with no destination"));
}

#[test]
fn bottomup_rewrites_children_first() {
    // Each rewrite tags its depth order; bottom-up sees the leaf first.
    let pass = PassDef::new(
        "order",
        wf_any(),
        dir::bottomup | dir::once,
        vec![
            (t(Wrap) << (t(Ident) * end())).cap(Lhs) >> |_: &mut Match| Ident ^ "folded",
            t(Int) >> |_: &mut Match| Ident ^ "leaf",
        ],
    );

    // Wrap(Int): bottom-up turns Int into Ident first, so the Wrap rule
    // sees Wrap(Ident) and folds it in the same iteration.
    let ast = top(vec![Wrap << int("1")]);
    pass.run(&ast).unwrap();

    let calc = ast.front().unwrap();
    assert_eq!(calc.len(), 1);
    assert_eq!(calc.front().unwrap().location().view(), "folded");
}

#[test]
fn pre_and_post_callbacks_run_per_node() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let pre_order = order.clone();
    let post_order = order.clone();

    let pass = PassDef::new("callbacks", wf_any(), dir::topdown, vec![])
        .pre(Calc, move |_| {
            pre_order.borrow_mut().push("pre");
            0
        })
        .post(Calc, move |_| {
            post_order.borrow_mut().push("post");
            0
        });

    let ast = top(vec![int("1")]);
    let (count, changes) = pass.run(&ast).unwrap();
    assert_eq!((count, changes), (1, 0));
    assert_eq!(*order.borrow(), ["pre", "post"]);
}

#[test]
fn fast_pattern_skips_incompatible_rules() {
    use std::cell::Cell;
    use std::rc::Rc;

    let attempts = Rc::new(Cell::new(0));
    let observed = attempts.clone();

    // The action runs only if dispatch did not prune the rule.
    let pass = PassDef::new(
        "pruned",
        wf_any(),
        dir::topdown | dir::once,
        vec![
            t(Ident).action(move |_| {
                observed.set(observed.get() + 1);
                true
            }) >> |_: &mut Match| Node::from(NoChange),
        ],
    );

    let ast = top(vec![int("1"), int("2")]);
    pass.run(&ast).unwrap();
    assert_eq!(attempts.get(), 0);
}
