//! Static lint over rule patterns.
//!
//! Each rule's pattern is reified into a node tree under a meta
//! well-formedness declaration ([`pattern_wf`]); the lint rules then run as
//! ordinary rewrite passes of the engine over those trees, producing Error
//! nodes for the problems they find. A final analysis detects rules made
//! unreachable because an earlier rule's pattern is a structural prefix of
//! theirs.
//!
//! The prefix relation is deliberately incomplete: it may miss shadowing
//! (false negatives) but never reports reachable rules as shadowed.

mod lint;
mod prefix;
mod reify;

#[cfg(test)]
mod checker_tests;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use trieste_core::wf::{self, Wellformed, seq};
use trieste_core::{Group, Node, Token, TokenSet, Top};

use crate::pass::Pass;
use crate::reader::Reader;
use crate::rewriter::Rewriter;
use crate::writer::Writer;

pub(crate) use prefix::includes_prefix;
pub(crate) use reify::{pattern_to_string, reify_rule};

/// Reified pattern node kinds.
pub mod reified {
    use trieste_core::tokens;

    tokens! {
        pub First = "pattern-start";
        pub Last = "pattern-end";
        pub Any = "pattern-any";
        pub TokenMatch = "pattern-token-match";
        pub RegexMatch = "pattern-regex-match";
        pub Cap = "pattern-cap";
        pub Opt = "pattern-opt";
        pub Rep = "pattern-rep";
        pub Not = "pattern-not";
        pub Choice = "pattern-choice";
        pub Inside = "pattern-inside";
        pub InsideStar = "pattern-inside-star";
        pub Children = "pattern-children";
        pub Pred = "pattern-pred";
        pub NegPred = "pattern-neg-pred";
        pub Action = "pattern-action";
        /// A token name mentioned by a pattern.
        pub TokenName = "pattern-token-name" [print];
        /// A regex source string.
        pub Regex = "pattern-regex" [print];
    }
}

/// The meta declaration reified patterns conform to.
pub fn pattern_wf() -> Wellformed {
    use reified::*;

    let op = First
        | Last
        | Any
        | TokenMatch
        | RegexMatch
        | Cap
        | Opt
        | Rep
        | Not
        | Choice
        | Inside
        | InsideStar
        | Children
        | Pred
        | NegPred
        | Action;

    Wellformed::new()
        .shape(Top, Group)
        .shape(Group, seq(op))
        .shape(TokenMatch, seq(TokenName).minlen(1))
        .shape(RegexMatch, TokenName * Regex)
        .shape(Inside, seq(TokenName).minlen(1))
        .shape(InsideStar, seq(TokenName).minlen(1))
        .shape(Cap, Group * TokenName)
        .shape(Opt, Group)
        .shape(Rep, Group)
        .shape(Not, Group)
        .shape(Pred, Group)
        .shape(NegPred, Group)
        .shape(Action, Group)
        .shape(Choice, wf::field(First, Group) * wf::field(Last, Group))
        .shape(Children, wf::field(Group, Group) * wf::field(Children, Group))
}

/// Names to token kinds, collected while reifying the patterns under check.
pub(crate) type TokenRegistry = Rc<HashMap<String, Token>>;

/// One problem the checker found in one pass.
pub struct PatternProblem {
    pub pass: String,
    /// Rendering of the offending pattern.
    pub pattern: String,
    /// Lint diagnostics, as Error nodes over the reified tree.
    pub errors: Vec<Node>,
    /// Set when the pattern is unreachable behind an earlier one.
    pub shadowed_by: Option<String>,
}

/// Everything the checker found across the checked range.
#[derive(Default)]
pub struct CheckerReport {
    pub problems: Vec<PatternProblem>,
}

impl CheckerReport {
    pub fn ok(&self) -> bool {
        self.problems.is_empty()
    }
}

impl fmt::Display for CheckerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for problem in &self.problems {
            writeln!(f, "------------")?;
            writeln!(f, "Pass: {}", problem.pass)?;

            if let Some(earlier) = &problem.shadowed_by {
                writeln!(f, "Unreachable pattern:")?;
                writeln!(f, "{}", problem.pattern)?;
                writeln!(f, "Pattern is shadowed by earlier pattern:")?;
                writeln!(f, "{earlier}")?;
                continue;
            }

            writeln!(f, "Found bad pattern:")?;
            writeln!(f, "{}", problem.pattern)?;
            for error in &problem.errors {
                if let Some(msg) = error
                    .children()
                    .find(|c| c.token() == trieste_core::ErrorMsg)
                {
                    writeln!(f, "  {}", msg.location().view())?;
                }
            }
        }
        Ok(())
    }
}

/// Lints the rule patterns of a pass pipeline.
pub struct Checker {
    passes: Vec<Pass>,
    input_wf: Wellformed,
    start_index: usize,
    end_index: usize,
    check_wf: bool,
    ignored_tokens: TokenSet,
}

impl Checker {
    pub fn new(passes: Vec<Pass>, input_wf: Wellformed) -> Self {
        let end_index = passes.len();
        Checker {
            passes,
            input_wf,
            start_index: 1,
            end_index,
            check_wf: false,
            ignored_tokens: TokenSet::new(),
        }
    }

    pub fn for_reader(reader: &Reader) -> Self {
        Checker::new(reader.passes().to_vec(), reader.parse_wf().clone())
    }

    pub fn for_writer(writer: &Writer) -> Self {
        Checker::new(writer.passes().to_vec(), writer.input_wf().clone())
    }

    pub fn for_rewriter(rewriter: &Rewriter) -> Self {
        Checker::new(rewriter.passes().to_vec(), rewriter.input_wf().clone())
    }

    /// One-based index of the first pass to check.
    pub fn start_index(mut self, index: usize) -> Self {
        assert!(index > 0, "start_index must be greater than 0");
        self.start_index = index;
        self
    }

    pub fn end_index(mut self, index: usize) -> Self {
        self.end_index = index;
        self
    }

    /// Also flag tokens that appear in neither the input nor output WF of
    /// their pass.
    pub fn check_against_wf(mut self, value: bool) -> Self {
        self.check_wf = value;
        self
    }

    /// Tokens exempt from the WF-membership lint.
    pub fn ignored_tokens(mut self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.ignored_tokens.extend(tokens);
        self
    }

    pub fn check(&self) -> CheckerReport {
        let meta_wf = pattern_wf();
        let _ctx = wf::WfContext::new(&[&meta_wf]);

        let mut report = CheckerReport::default();

        for index in self.start_index..=self.end_index {
            let pass = &self.passes[index - 1];
            let prev_wf = if index == 1 {
                &self.input_wf
            } else {
                self.passes[index - 2].wf()
            };
            let result_wf = pass.wf();

            // Reify this pass's patterns and collect the token registry the
            // lints resolve names through.
            let mut names = HashMap::new();
            let patterns: Vec<Node> = pass
                .rules()
                .iter()
                .map(|rule| reify_rule(rule, &mut names))
                .collect();
            let registry: TokenRegistry = Rc::new(names);

            let mut lint_passes = vec![lint::check_pattern(registry.clone())];
            if self.check_wf {
                lint_passes.push(lint::check_tokens_exist(
                    registry.clone(),
                    prev_wf.clone(),
                    result_wf.clone(),
                    self.ignored_tokens.clone(),
                ));
            }

            let rewriter = Rewriter::new("pattern checker", lint_passes, meta_wf.clone());

            for pattern in &patterns {
                let rendered = pattern_to_string(&pattern_root(pattern));
                let result = rewriter.rewrite(pattern.deep_clone());

                if !result.ok {
                    report.problems.push(PatternProblem {
                        pass: pass.name().to_string(),
                        pattern: rendered,
                        errors: result.errors,
                        shadowed_by: None,
                    });
                }
            }

            // Unreachable patterns: an earlier pattern that is a structural
            // prefix of a later one always fires first.
            for (i, prefix) in patterns.iter().enumerate() {
                for pattern in &patterns[i + 1..] {
                    if includes_prefix(&pattern_root(prefix), &pattern_root(pattern)) {
                        report.problems.push(PatternProblem {
                            pass: pass.name().to_string(),
                            pattern: pattern_to_string(&pattern_root(pattern)),
                            errors: Vec::new(),
                            shadowed_by: Some(pattern_to_string(&pattern_root(prefix))),
                        });
                    }
                }
            }
        }

        report
    }
}

/// Reified patterns are `Top << Group`; the Group is the pattern proper.
fn pattern_root(pattern: &Node) -> Node {
    pattern.front().expect("reified pattern has a group")
}
