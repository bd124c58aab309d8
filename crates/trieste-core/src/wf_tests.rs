use crate::wf::{Generators, WfContext, Wellformed, field, seq};
use crate::{Include, Node, SourceDef, Top, tokens, wf};

tokens! {
    Calc = "calculation" [symtab | defbeforeuse];
    Assign = "assign" [lookup];
    Output = "output";
    Ident = "ident" [print];
    Int = "int" [print];
    Str = "string" [print];
    Expr = "expression";
    Use = "use";
}

fn calc_wf() -> Wellformed {
    Wellformed::new()
        .shape(Top, Calc)
        .shape(Calc, seq(Assign | Output))
        .shape(Assign, (Ident * Expr).binding(Ident))
        .shape(Output, Str * Expr)
        .shape(Expr, seq(Int | Ident).minlen(1))
}

fn sample_tree() -> Node {
    let top = Node::new(Top);
    let calc = Node::new(Calc);
    top.push_back(calc.clone());
    calc.push_back(Assign << (Ident ^ "x") << (Expr << (Int ^ "1")));
    calc.push_back(Output << (Str ^ "\"r\"") << (Expr << (Ident ^ "x")));
    top
}

#[test]
fn check_accepts_conforming_tree() {
    let wf = calc_wf();
    let top = sample_tree();
    wf.build_symtab(&top);
    assert!(wf.check(&top).is_ok());
}

#[test]
fn check_reports_wrong_child_kind() {
    let wf = calc_wf();
    let top = Node::new(Top);
    let calc = Node::new(Calc);
    top.push_back(calc.clone());
    calc.push_back(Node::new(Int));

    let errors = wf.check(&top).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("unexpected int"));
    assert!(errors[0].message.contains("assign, or output"));
}

#[test]
fn check_reports_arity_violations() {
    let wf = calc_wf();
    let top = Node::new(Top);
    let calc = Node::new(Calc);
    top.push_back(calc.clone());

    // Assign with a missing field and an Expr below the minimum length.
    calc.push_back(Assign << (Ident ^ "x"));
    calc.push_back(Output << (Str ^ "s") << (Expr << (Int ^ "1") ));
    calc.child(1).unwrap().child(1).unwrap().erase(0..1);

    wf.build_symtab(&top);
    let errors = wf.check(&top).unwrap_err();
    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    assert!(messages.iter().any(|m| m.contains("too few child nodes")));
    assert!(messages.iter().any(|m| m.contains("at least 1 children")));
}

#[test]
fn shapeless_nodes_must_be_leaves() {
    let wf = calc_wf();
    let top = Node::new(Top);
    let calc = Node::new(Calc);
    top.push_back(calc.clone());
    let assign = Assign << (Ident ^ "x") << (Expr << (Int ^ "1"));
    calc.push_back(assign.clone());
    assign.child(0).unwrap().push_back(Int ^ "9");

    wf.build_symtab(&top);
    let errors = wf.check(&top).unwrap_err();
    assert!(errors[0].message.contains("too many child nodes in ident"));
}

#[test]
fn error_subtrees_are_exempt() {
    let wf = calc_wf();
    let top = Node::new(Top);
    let calc = Node::new(Calc);
    top.push_back(calc.clone());
    calc.push_back(
        crate::Error << (crate::ErrorMsg ^ "bad") << (crate::ErrorAst << (Int ^ "0")),
    );

    assert!(wf.check(&top).is_ok());
}

#[test]
fn missing_binding_is_reported() {
    let wf = calc_wf();
    let top = sample_tree();
    // Symbol tables never built, so the Assign binding cannot resolve.
    let errors = wf.check(&top).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| e.message.contains("missing symbol table binding for assign"))
    );
}

#[test]
fn sequence_bindings_may_only_include() {
    let bad = Wellformed::new()
        .shape(Top, Calc)
        .shape(Calc, seq(Assign).binding(Assign));
    let top = Node::new(Top);
    top.push_back(Node::new(Calc));

    let errors = bad.check(&top).unwrap_err();
    assert!(errors[0].message.contains("can't bind a calculation sequence"));

    let good = Wellformed::new()
        .shape(Top, Calc)
        .shape(Calc, seq(Assign).binding(Include));
    assert!(good.check(&top).is_ok());
}

#[test]
fn build_symtab_is_idempotent() {
    let wf = calc_wf();
    let top = sample_tree();

    wf.build_symtab(&top);
    let first = top.to_string();
    wf.build_symtab(&top);
    assert_eq!(top.to_string(), first);
}

#[test]
fn generated_trees_conform() {
    let wf = calc_wf();
    let generators = Generators::new()
        .with(Int, |rng| {
            use rand::RngCore;
            (rng.next_u32() % 100).to_string()
        });

    for seed in 0..50 {
        let tree = wf.r#gen(&generators, seed, 4, true);
        if let Err(errors) = wf.check(&tree) {
            panic!(
                "seed {seed} generated a non-conforming tree:\n{}\n{}",
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(""),
                tree
            );
        }
    }
}

#[test]
fn generation_is_deterministic() {
    let wf = calc_wf();
    let generators = Generators::new();

    let a = wf.r#gen(&generators, 7, 4, true);
    let b = wf.r#gen(&generators, 7, 4, true);
    assert!(a.structurally_eq(&b));
    assert_eq!(a.hash(), b.hash());
}

#[test]
fn printed_ast_round_trips() {
    let wf = calc_wf();

    for seed in 0..20 {
        let tree = wf.r#gen(&Generators::new(), seed, 4, true);
        let printed = tree.to_string();
        let source = SourceDef::synthetic(printed);
        let parsed = wf.build_ast(&source, 0).expect("round trip parses");
        assert!(
            tree.structurally_eq(&parsed),
            "seed {seed} did not round trip:\n{tree}\nvs\n{parsed}"
        );
    }
}

#[test]
fn build_ast_rejects_unknown_types() {
    let wf = calc_wf();
    let source = SourceDef::synthetic("(top\n  (mystery))");
    let err = wf.build_ast(&source, 0).unwrap_err();
    assert!(matches!(err, wf::BuildAstError::UnknownType { .. }));
    assert_eq!(err.location().view(), "mystery");
}

#[test]
fn build_ast_rejects_incomplete_input() {
    let wf = calc_wf();
    let source = SourceDef::synthetic("(top\n  (calculation)");
    let err = wf.build_ast(&source, 0).unwrap_err();
    assert!(matches!(err, wf::BuildAstError::Incomplete { .. }));
}

#[test]
fn composition_is_right_biased() {
    let base = calc_wf();
    let refined = base.clone()
        | Wellformed::new().shape(Expr, seq(Int).minlen(1));

    let top = Node::new(Top);
    let calc = Node::new(Calc);
    top.push_back(calc.clone());
    let assign = Assign << (Ident ^ "x") << (Expr << (Ident ^ "y"));
    calc.push_back(assign);

    refined.build_symtab(&top);
    let errors = refined.check(&top).unwrap_err();
    assert!(errors.iter().any(|e| e.message.contains("unexpected ident")));

    base.build_symtab(&top);
    assert!(base.check(&top).is_ok());
}

#[test]
fn field_indexing() {
    let wf = calc_wf();

    let index = wf.index(Assign, Expr).unwrap();
    assert_eq!(index.token, Assign);
    assert_eq!(index.index, 1);

    assert!(wf.index(Assign, Use).is_none());
    // Sequences have no fields.
    assert!(wf.index(Calc, Assign).is_none());
}

#[test]
fn context_field_accessor() {
    let wf = calc_wf();
    let assign = Assign << (Ident ^ "x") << (Expr << (Int ^ "1"));

    assert!(wf::field_of(&assign, Expr).is_none());
    {
        let _ctx = WfContext::new(&[&wf]);
        let expr = wf::field_of(&assign, Expr).unwrap();
        assert_eq!(expr.token(), Expr);
    }
    assert!(wf::field_of(&assign, Expr).is_none());
}

#[test]
fn named_field_choices() {
    // A field may carry a choice under its own name, as in
    // `Output <<= String * (Expression >>= Int | Ident)`.
    let wf = Wellformed::new()
        .shape(Top, Output)
        .shape(Output, field(Str, Str) * field(Expr, Int | Ident));

    let top = Node::new(Top);
    top.push_back(Output << (Str ^ "s") << (Int ^ "1"));
    assert!(wf.check(&top).is_ok());

    let index = wf.index(Output, Expr).unwrap();
    assert_eq!(index.index, 1);
}

#[test]
fn mentions_scans_choices() {
    let wf = calc_wf();
    assert!(wf.mentions(Int));
    assert!(wf.mentions(Assign));
    assert!(!wf.mentions(Use));
}

#[test]
fn find_type_uses_context_shape() {
    let wf = calc_wf();
    assert_eq!(wf.find_type(None, "calculation"), Some(Calc));
    assert_eq!(wf.find_type(Some(Expr), "int"), Some(Int));
    assert_eq!(wf.find_type(None, "int"), None);
}
