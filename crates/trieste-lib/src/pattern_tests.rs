use trieste_core::{Node, tokens};

use crate::rewrite::{Match, Pattern, any, end, inside, re, start, t};

tokens! {
    Expr = "expr";
    Group2 = "subgroup";
    Int = "int" [print];
    Float = "float" [print];
    Ident = "ident" [print];
    Add = "+";
    Id = "id";
    Rhs = "rhs";
}

fn sample() -> Node {
    Expr << (Int ^ "1") << (Add ^ "+") << (Ident ^ "x") << (Int ^ "2")
}

fn try_match(pattern: &Pattern, parent: &Node, at: usize) -> Option<usize> {
    let mut m = Match::new(parent);
    let mut it = at;
    pattern.matches(&mut it, parent, &mut m).then_some(it)
}

#[test]
fn token_match_consumes_one() {
    let parent = sample();
    assert_eq!(try_match(&t(Int), &parent, 0), Some(1));
    assert_eq!(try_match(&t(Add), &parent, 0), None);
    assert_eq!(try_match(&t([Add, Ident]), &parent, 1), Some(2));
    // Past the end nothing matches.
    assert_eq!(try_match(&t(Int), &parent, 4), None);
}

#[test]
fn any_matches_everything_but_end() {
    let parent = sample();
    assert_eq!(try_match(&any(), &parent, 3), Some(4));
    assert_eq!(try_match(&any(), &parent, 4), None);
}

#[test]
fn sequencing_advances_through_children() {
    let parent = sample();
    let pattern = t(Int) * t(Add) * t(Ident);
    assert_eq!(try_match(&pattern, &parent, 0), Some(3));
    assert_eq!(try_match(&pattern, &parent, 1), None);
}

#[test]
fn regex_must_match_the_whole_view() {
    let parent = Expr << (Int ^ "42") << (Int ^ "42x");
    assert_eq!(try_match(&re(Int, "[0-9]+"), &parent, 0), Some(1));
    // Partial coverage of the text does not count.
    assert_eq!(try_match(&re(Int, "[0-9]+"), &parent, 1), None);
    assert_eq!(try_match(&re(Ident, "[0-9]+"), &parent, 0), None);
}

#[test]
fn start_and_end_are_zero_width() {
    let parent = sample();
    let at_start = start() * t(Int);
    assert_eq!(try_match(&at_start, &parent, 0), Some(1));
    assert_eq!(try_match(&at_start, &parent, 3), None);

    let at_end = t(Int) * end();
    assert_eq!(try_match(&at_end, &parent, 3), Some(4));
    assert_eq!(try_match(&at_end, &parent, 0), None);
}

#[test]
fn inside_checks_the_parent() {
    let parent = sample();
    assert_eq!(try_match(&(inside(Expr) * t(Int)), &parent, 0), Some(1));
    assert_eq!(try_match(&(inside(Group2) * t(Int)), &parent, 0), None);
}

#[test]
fn inside_star_walks_ancestors() {
    let outer = Node::new(Group2);
    let parent = sample();
    outer.push_back(parent.clone());

    let pattern = inside(Group2).rep() * t(Int);
    assert_eq!(try_match(&pattern, &parent, 0), Some(1));

    let pattern = inside(Ident).rep() * t(Int);
    assert_eq!(try_match(&pattern, &parent, 0), None);
}

#[test]
fn opt_backtracks_on_failure() {
    let parent = sample();
    let pattern = t(Int) * t(Add).opt() * t(Ident);
    assert_eq!(try_match(&pattern, &parent, 0), Some(3));

    // The optional part is absent here: Int then Ident directly.
    let parent = Expr << (Int ^ "1") << (Ident ^ "x");
    assert_eq!(try_match(&pattern, &parent, 0), Some(2));
}

#[test]
fn rep_is_greedy_and_always_succeeds() {
    let parent = Expr << (Int ^ "1") << (Int ^ "2") << (Ident ^ "x");
    let pattern = t(Int).rep();
    assert_eq!(try_match(&pattern, &parent, 0), Some(2));
    assert_eq!(try_match(&pattern, &parent, 2), Some(2));

    let pattern = t(Int).rep() * t(Ident);
    assert_eq!(try_match(&pattern, &parent, 0), Some(3));
}

#[test]
fn rep_rolls_back_a_partial_iteration() {
    // (Int Add)++ over Int Add Int Ident: the second iteration consumes the
    // Int then fails on Add, and must roll back to after the first pair.
    let parent = Expr << (Int ^ "1") << (Add ^ "+") << (Int ^ "2") << (Ident ^ "x");
    let pattern = (t(Int) * t(Add)).rep() * t(Int) * t(Ident);
    assert_eq!(try_match(&pattern, &parent, 0), Some(4));
}

#[test]
fn not_consumes_one_non_matching_child() {
    let parent = sample();
    let pattern = !t(Add);
    assert_eq!(try_match(&pattern, &parent, 0), Some(1));
    assert_eq!(try_match(&pattern, &parent, 1), None);
    assert_eq!(try_match(&pattern, &parent, 4), None);
}

#[test]
fn choice_takes_the_first_alternative() {
    let parent = sample();
    let pattern = t(Float) / t(Int);
    assert_eq!(try_match(&pattern, &parent, 0), Some(1));
    assert_eq!(try_match(&pattern, &parent, 1), None);
}

#[test]
fn lookahead_is_zero_width() {
    let parent = sample();
    let pattern = t(Int).pred() * any();
    assert_eq!(try_match(&pattern, &parent, 0), Some(1));
    assert_eq!(try_match(&pattern, &parent, 1), None);

    let pattern = t(Int).neg_pred() * any();
    assert_eq!(try_match(&pattern, &parent, 1), Some(2));
    assert_eq!(try_match(&pattern, &parent, 0), None);
}

#[test]
fn children_descends_into_the_first_match() {
    let inner = Group2 << (Int ^ "1") << (Int ^ "2");
    let parent = Expr << inner << (Ident ^ "x");

    let pattern = t(Group2) << (t(Int) * t(Int) * end());
    assert_eq!(try_match(&pattern, &parent, 0), Some(1));

    let pattern = t(Group2) << (t(Ident) * end());
    assert_eq!(try_match(&pattern, &parent, 0), None);
}

#[test]
fn captures_record_the_matched_range() {
    let parent = sample();
    let pattern = t(Int).cap(Id) * (t(Add) * t(Ident)).cap(Rhs);

    let mut m = Match::new(&parent);
    let mut it = 0;
    assert!(pattern.matches(&mut it, &parent, &mut m));

    assert_eq!(m.node(Id).location().view(), "1");
    let rhs = m.range(Rhs);
    assert_eq!(rhs.len(), 2);
    assert_eq!(rhs[1].location().view(), "x");
}

#[test]
fn failed_choice_arm_discards_its_captures() {
    let parent = sample();
    // First arm captures Int then requires Float and fails; the capture
    // must not leak into the effect.
    let pattern = (t(Int).cap(Id) * t(Float)) / (t(Int) * t(Add));

    let mut m = Match::new(&parent);
    let mut it = 0;
    assert!(pattern.matches(&mut it, &parent, &mut m));
    assert!(m.try_node(Id).is_none());
}

#[test]
fn contents_splices_captured_children() {
    let inner = Group2 << (Int ^ "1") << (Int ^ "2");
    let parent = Expr << inner;
    let pattern = t(Group2).cap(Rhs);

    let mut m = Match::new(&parent);
    let mut it = 0;
    assert!(pattern.matches(&mut it, &parent, &mut m));

    let contents = m.contents(Rhs);
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0].location().view(), "1");
}

#[test]
fn action_gates_the_match() {
    let parent = sample();
    let yes = t(Int).action(|nodes| nodes[0].location().view() == "1");
    assert_eq!(try_match(&yes, &parent, 0), Some(1));

    let no = t(Int).action(|nodes| nodes[0].location().view() == "9");
    assert_eq!(try_match(&no, &parent, 0), None);
}

#[test]
fn fast_pattern_prunes_dispatch() {
    let pattern = inside(Expr) * (t(Int) / t(Float));
    let fast = pattern.fast();

    assert!(fast.can_start(Int));
    assert!(fast.can_start(Float));
    assert!(!fast.can_start(Ident));
    assert!(fast.can_parent(Expr));
    assert!(!fast.can_parent(Group2));
}

#[test]
fn fast_pattern_opt_passes_through() {
    let pattern = t(Add).opt() * t(Int);
    let fast = pattern.fast();
    assert!(fast.can_start(Add));
    assert!(fast.can_start(Int));
    assert!(!fast.can_start(Ident));
}

#[test]
fn fast_pattern_choice_annihilates_on_any() {
    let pattern = t(Int) / any();
    assert!(pattern.fast().can_start(Ident));
}

#[test]
fn rep_of_rep_collapses() {
    let parent = Expr << (Int ^ "1") << (Int ^ "2");
    let pattern = t(Int).rep().rep();
    assert_eq!(try_match(&pattern, &parent, 0), Some(2));
}

#[test]
#[should_panic(expected = "captures not allowed inside a repetition")]
fn captures_inside_rep_panic() {
    let _ = t(Int).cap(Id).rep();
}

#[test]
#[should_panic(expected = "captures not allowed inside a negation")]
fn captures_inside_not_panic() {
    let _ = !t(Int).cap(Id);
}

#[test]
#[should_panic(expected = "captures not allowed inside a predicate")]
fn captures_inside_pred_panic() {
    let _ = t(Int).cap(Id).pred();
}

#[test]
#[should_panic(expected = "rep(start()) not allowed")]
fn rep_of_start_panics() {
    let _ = start().rep();
}

#[test]
#[should_panic(expected = "rep(end()) not allowed")]
fn rep_of_end_panics() {
    let _ = end().rep();
}

#[test]
#[should_panic(expected = "invalid regex")]
fn bad_regex_panics() {
    let _ = re(Int, "[unclosed");
}
