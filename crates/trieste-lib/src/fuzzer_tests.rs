use std::rc::Rc;

use trieste_core::wf::{Generators, Wellformed, seq};
use trieste_core::{Error, ErrorAst, ErrorMsg, Node, Top, tokens};

use crate::fuzzer::Fuzzer;
use crate::pass::{Pass, PassDef, dir};
use crate::rewrite::{Match, t};

tokens! {
    Doc = "doc";
    Item = "item" [print];
    Word = "word" [print];
    Final = "final" [print];
    Lhs = "lhs";
}

fn wf_items() -> Wellformed {
    Wellformed::new().shape(Top, Doc).shape(Doc, seq(Item))
}

fn wf_words() -> Wellformed {
    Wellformed::new().shape(Top, Doc).shape(Doc, seq(Word))
}

fn wf_final() -> Wellformed {
    Wellformed::new().shape(Top, Doc).shape(Doc, seq(Final))
}

fn convert_pass() -> Pass {
    Rc::new(PassDef::new(
        "convert",
        wf_words(),
        dir::topdown | dir::once,
        vec![
            t(Item).cap(Lhs) >> |m: &mut Match| {
                Word ^ m.node(Lhs).location().view().to_string()
            },
        ],
    ))
}

fn finalize_pass() -> Pass {
    Rc::new(PassDef::new(
        "finalize",
        wf_final(),
        dir::topdown | dir::once,
        vec![
            t(Word).cap(Lhs) >> |m: &mut Match| {
                Final ^ m.node(Lhs).location().view().to_string()
            },
        ],
    ))
}

#[test]
fn conforming_passes_fuzz_clean() {
    let report = Fuzzer::new(
        vec![convert_pass(), finalize_pass()],
        wf_items(),
        Generators::new(),
    )
    .start_seed(0)
    .seed_count(30)
    .max_depth(3)
    .test();

    assert!(report.ok(), "{report}");
    assert_eq!(report.passes.len(), 2);
    for stats in &report.passes {
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.passed + stats.errored, 30);
    }
}

#[test]
fn shape_violations_are_counted_as_failures() {
    // The pass claims to produce Words but leaves Items untouched.
    let broken = Rc::new(PassDef::new(
        "broken",
        wf_words(),
        dir::topdown | dir::once,
        vec![],
    ));

    let report = Fuzzer::new(vec![broken], wf_items(), Generators::new())
        .start_seed(0)
        .seed_count(20)
        .max_depth(3)
        .test();

    assert!(!report.ok());
    let stats = &report.passes[0];
    // Only trees with at least one Item can violate the output shape.
    assert!(stats.failed > 0);
    assert_eq!(stats.failed + stats.passed, 20);
}

#[test]
fn error_producing_passes_are_exempt_from_shapes() {
    let rejecting = Rc::new(PassDef::new(
        "reject",
        wf_words(),
        dir::topdown | dir::once,
        vec![
            t(Item).cap(Lhs) >> |m: &mut Match| {
                Error << (ErrorMsg ^ "no items allowed") << (ErrorAst << m.node(Lhs))
            },
        ],
    ));

    let report = Fuzzer::new(vec![rejecting], wf_items(), Generators::new())
        .start_seed(0)
        .seed_count(20)
        .max_depth(3)
        .test();

    assert!(report.ok(), "{report}");
    let stats = &report.passes[0];
    assert!(stats.errored > 0);
    assert_eq!(stats.error_messages.get("no items allowed"), Some(&stats.errored));
}

#[test]
fn generated_trees_are_hash_deduplicated() {
    let report = Fuzzer::new(vec![convert_pass()], wf_items(), Generators::new())
        .start_seed(0)
        .seed_count(30)
        .max_depth(2)
        .test();

    let stats = &report.passes[0];
    assert!(stats.unique_trees > 1);
    assert!(stats.unique_trees <= 30);
}

#[test]
fn custom_generators_shape_leaf_text() {
    let generators = Generators::new().with(Item, |rng| {
        use rand::RngCore;
        format!("item{}", rng.next_u32() % 10)
    });

    let fuzzer = Fuzzer::new(vec![convert_pass()], wf_items(), generators)
        .start_seed(0)
        .seed_count(10)
        .max_depth(3);

    let report = fuzzer.test();
    assert!(report.ok(), "{report}");
}

#[test]
fn sequence_mode_runs_the_whole_range() {
    let report = Fuzzer::new(
        vec![convert_pass(), finalize_pass()],
        wf_items(),
        Generators::new(),
    )
    .start_seed(0)
    .seed_count(30)
    .max_depth(3)
    .test_sequence();

    assert!(report.ok(), "{report}");
    assert_eq!(report.passed, 30);
    assert_eq!(report.failed, 0);
    assert!(report.passed_sizes.max >= 1);
}

#[test]
fn sequence_mode_short_circuits_on_errors() {
    let rejecting = Rc::new(PassDef::new(
        "reject",
        wf_words(),
        dir::topdown | dir::once,
        vec![
            t(Item).cap(Lhs) >> |m: &mut Match| {
                Error << (ErrorMsg ^ "no items allowed") << (ErrorAst << m.node(Lhs))
            },
        ],
    ));

    let report = Fuzzer::new(
        vec![rejecting, finalize_pass()],
        wf_items(),
        Generators::new(),
    )
    .start_seed(0)
    .seed_count(20)
    .max_depth(3)
    .test_sequence();

    assert!(report.ok(), "{report}");
    assert!(report.failed > 0);
    assert!(report.error_passes.contains_key("reject"));
    assert!(!report.error_passes.contains_key("finalize"));
}
