use std::rc::Rc;

use trieste_core::wf::{Wellformed, seq};
use trieste_core::{NoChange, Node, Top, tokens};

use crate::checker::Checker;
use crate::pass::{Pass, PassDef, dir};
use crate::rewrite::{Match, Pattern, any, end, inside, t};

tokens! {
    Block = "block";
    Stmt = "stmt";
    Val = "val" [print];
    Mark = "mark";
    Hidden = "hidden" [internal];
    Id = "id";
}

fn wf_lang() -> Wellformed {
    Wellformed::new()
        .shape(Top, Block)
        .shape(Block, seq(Stmt | Val))
}

fn pass_of(rules: Vec<crate::rewrite::Rule>) -> Pass {
    Rc::new(PassDef::new("under-test", wf_lang(), dir::topdown, rules))
}

fn noop(pattern: Pattern) -> crate::rewrite::Rule {
    pattern >> |_: &mut Match| Node::from(NoChange)
}

fn check(rules: Vec<crate::rewrite::Rule>) -> crate::checker::CheckerReport {
    Checker::new(vec![pass_of(rules)], wf_lang()).check()
}

#[test]
fn clean_rules_pass() {
    let report = check(vec![
        noop(inside(Block) * t(Stmt).cap(Id) * t(Val).rep() * end()),
    ]);
    assert!(report.ok(), "{report}");
}

#[test]
fn zero_width_repetition_is_flagged() {
    let report = check(vec![noop(
        (inside(Block) * t(Val).opt()).rep() * t(Stmt),
    )]);

    assert!(!report.ok());
    let rendered = report.to_string();
    assert!(
        rendered.contains("would be infinitely repeated"),
        "{rendered}"
    );
}

#[test]
fn pattern_after_end_is_flagged() {
    let report = check(vec![noop(t(Stmt) * end() * t(Val))]);

    assert!(!report.ok());
    assert!(report.to_string().contains("Cannot have pattern after 'end()'"));
}

#[test]
fn empty_capture_is_flagged() {
    let report = check(vec![noop(inside(Block).cap(Id) * t(Stmt))]);

    assert!(!report.ok());
    assert!(report.to_string().contains("is always empty"));
}

#[test]
fn children_outer_must_match_one_node() {
    let report = check(vec![noop(t(Stmt).opt() << t(Val))]);

    assert!(!report.ok());
    assert!(
        report
            .to_string()
            .contains("should match exactly one node")
    );
}

#[test]
fn negation_body_must_match_one_node() {
    let report = check(vec![noop(!(t(Stmt) * t(Val)))]);

    assert!(!report.ok());
    assert!(report.to_string().contains("Negated pattern"));
}

#[test]
fn matching_internal_tokens_is_flagged() {
    let report = check(vec![noop(t(Hidden))]);

    assert!(!report.ok());
    assert!(
        report
            .to_string()
            .contains("Cannot match on internal tokens")
    );
}

#[test]
fn unknown_tokens_flagged_only_against_wf() {
    // Mark appears in neither the input nor the output WF.
    let rules = || vec![noop(t(Mark))];

    let lenient = Checker::new(vec![pass_of(rules())], wf_lang()).check();
    assert!(lenient.ok());

    let strict = Checker::new(vec![pass_of(rules())], wf_lang())
        .check_against_wf(true)
        .check();
    assert!(!strict.ok());
    assert!(
        strict
            .to_string()
            .contains("not defined in well-formedness rules")
    );

    let ignored = Checker::new(vec![pass_of(rules())], wf_lang())
        .check_against_wf(true)
        .ignored_tokens([Mark])
        .check();
    assert!(ignored.ok());
}

#[test]
fn shadowed_rules_are_reported() {
    let report = check(vec![
        noop(t([Stmt, Val])),
        noop(t(Stmt) * t(Val)),
    ]);

    assert!(!report.ok());
    let rendered = report.to_string();
    assert!(rendered.contains("Unreachable pattern"), "{rendered}");
    assert!(rendered.contains("shadowed by earlier pattern"));
}

#[test]
fn longer_patterns_do_not_shadow_shorter_ones() {
    let report = check(vec![
        noop(t(Stmt) * t(Val)),
        noop(t(Stmt) * any()),
    ]);
    assert!(report.ok(), "{report}");
}

#[test]
fn parent_filters_refine_shadowing() {
    // A narrower parent filter in the earlier rule does not shadow a rule
    // that fires in more contexts.
    let report = check(vec![
        noop(inside(Stmt) * t(Val)),
        noop(inside([Stmt, Block]) * t(Val)),
    ]);
    assert!(report.ok(), "{report}");

    // The broader filter in front does shadow the narrower rule.
    let report = check(vec![
        noop(inside([Stmt, Block]) * t(Val)),
        noop(inside(Stmt) * t(Val)),
    ]);
    assert!(!report.ok());
}
