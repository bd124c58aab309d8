use indoc::indoc;

use trieste_lib::{Checker, Fuzzer, ProcessResult};

use crate::{generators, parse, reader, wf};

fn read(source: &str) -> ProcessResult {
    reader().synthetic(source).wf_check_enabled(true).read()
}

fn error_messages(result: &ProcessResult) -> Vec<String> {
    result
        .errors
        .iter()
        .filter_map(|e| {
            e.children()
                .find(|c| c.token() == trieste_lib::ErrorMsg)
                .map(|c| c.location().view().to_string())
        })
        .collect()
}

#[test]
fn parse_groups_statements() {
    let source = trieste_lib::SourceDef::synthetic("x = 1 + 2;\n");
    let file = parse(&source);

    insta::assert_snapshot!(file.to_string(), @r"
    (file
      (equals
        (group
          (ident 1:x))
        (group
          (int 1:1)
          (+ 1:+)
          (int 1:2))))
    ");
}

#[test]
fn calculator_end_to_end() {
    let result = read(indoc! {r#"
        x = 1 + 2 * 3;
        print "r" x;
    "#});

    assert!(result.ok, "{}", result.error_report());

    insta::assert_snapshot!(result.ast.unwrap().to_string(), @r#"
    (top
      {}
      (calculation
        {}
        (output
          (string 3:"r")
          (int 1:7))))
    "#);
}

#[test]
fn parentheses_bind_tighter_than_precedence() {
    let result = read(indoc! {r#"
        print "r" (2 + 3) * 4;
    "#});

    assert!(result.ok, "{}", result.error_report());
    let output = result.ast.unwrap().front().unwrap().front().unwrap();
    assert_eq!(output.child(1).unwrap().location().view(), "20");
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let result = read(indoc! {r#"
        print "r" 2 + 3 * 4;
    "#});

    assert!(result.ok, "{}", result.error_report());
    let output = result.ast.unwrap().front().unwrap().front().unwrap();
    assert_eq!(output.child(1).unwrap().location().view(), "14");
}

#[test]
fn float_arithmetic_folds() {
    let result = read(indoc! {r#"
        print "f" 1.5 + 2.25;
    "#});

    assert!(result.ok, "{}", result.error_report());
    let output = result.ast.unwrap().front().unwrap().front().unwrap();
    let value = output.child(1).unwrap();
    assert_eq!(value.token(), crate::Float);
    assert_eq!(value.location().view(), "3.75");
}

#[test]
fn later_definitions_shadow_earlier_ones() {
    // Definitions are def-before-use: the print sees the latest assignment
    // preceding it.
    let result = read(indoc! {r#"
        x = 1;
        x = 2;
        print "r" x;
    "#});

    assert!(result.ok, "{}", result.error_report());
    let output = result.ast.unwrap().front().unwrap().front().unwrap();
    assert_eq!(output.child(1).unwrap().location().view(), "2");
}

#[test]
fn undefined_references_error() {
    let result = read(indoc! {r#"
        print "r" y;
    "#});

    assert!(!result.ok);
    assert_eq!(result.last_pass, "check_refs");
    assert_eq!(error_messages(&result), ["undefined"]);
}

#[test]
fn empty_parens_error() {
    let result = read(indoc! {r#"
        x = ();
    "#});

    assert!(!result.ok);
    assert_eq!(result.last_pass, "expressions");
    assert_eq!(error_messages(&result), ["Empty paren"]);
}

#[test]
fn division_by_zero_errors() {
    let result = read(indoc! {r#"
        print "r" 1 / 0;
    "#});

    assert!(!result.ok);
    // The zero division wraps its output statement as a whole.
    assert_eq!(error_messages(&result), ["Empty output expression"]);
}

#[test]
fn unknown_characters_fail_validation() {
    // `?` lexes to an Invalid leaf, which no pass shape admits.
    let result = read("x = 1 ? 2;\n");

    // The parse tree itself violates the entry shape, so the pipeline
    // never starts. A shape violation is diagnostic output, not an Error
    // subtree.
    assert!(!result.ok);
    assert_eq!(result.last_pass, "parse");
    assert!(result.errors.is_empty());
}

#[test]
fn generated_trees_conform_to_the_final_shape() {
    // Seeds 0..99 at depth 5 against the cleanup-pass declaration.
    let cleanup_wf = wf::pass_cleanup();
    let generators = generators();

    for seed in 0..100 {
        let tree = cleanup_wf.r#gen(&generators, seed, 5, true);
        assert!(
            cleanup_wf.check(&tree).is_ok(),
            "seed {seed} generated a non-conforming tree:\n{tree}"
        );
    }
}

#[test]
fn printed_trees_round_trip_through_build_ast() {
    let result = read(indoc! {r#"
        x = 4;
        print "r" x - 1;
    "#});
    assert!(result.ok, "{}", result.error_report());

    let ast = result.ast.unwrap();
    let printed = ast.to_string();
    let source = trieste_lib::SourceDef::synthetic(printed);
    let parsed = wf::pass_cleanup().build_ast(&source, 0).unwrap();
    assert!(ast.structurally_eq(&parsed));
}

#[test]
fn reentry_from_a_pass_dump() {
    // Dump after maths, then resume the pipeline from there. (Earlier
    // stages cannot resume faithfully: tokens without printed locations
    // come back with synthetic ones, and name resolution depends on them.)
    let full = read(indoc! {r#"
        x = 2;
        print "r" x * 3;
    "#});
    assert!(full.ok, "{}", full.error_report());

    let partial = reader()
        .synthetic(indoc! {r#"
            x = 2;
            print "r" x * 3;
        "#})
        .end_pass("maths")
        .wf_check_enabled(true)
        .read();
    assert!(partial.ok, "{}", partial.error_report());

    let dump = partial.ast.unwrap().to_string();
    let resumed = reader()
        .synthetic(dump)
        .start_pass("maths")
        .wf_check_enabled(true)
        .read();

    assert!(resumed.ok, "{}", resumed.error_report());
    assert!(
        resumed
            .ast
            .unwrap()
            .structurally_eq(&full.ast.unwrap())
    );
}

#[test]
fn checker_accepts_the_calculator_rules() {
    let report = Checker::for_reader(&reader()).check();
    assert!(report.ok(), "{report}");
}

#[test]
fn fuzzing_each_pass_holds_its_shape() {
    let report = Fuzzer::for_reader(&reader())
        .start_seed(42)
        .seed_count(30)
        .max_depth(5)
        .test();

    assert!(report.ok(), "{report}");
}

#[test]
fn fuzzing_the_whole_sequence_terminates() {
    let report = Fuzzer::for_reader(&reader())
        .start_seed(7)
        .seed_count(20)
        .max_depth(4)
        .test_sequence();

    assert!(report.ok(), "{report}");
}
