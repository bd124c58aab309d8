//! Randomized differential testing of pass pipelines.
//!
//! Single-pass mode generates trees conforming to one pass's input WF, runs
//! the pass, and validates the output against its output WF. Sequence mode
//! generates one tree against the pipeline's entry WF and feeds it through
//! the whole range, short-circuiting on the first Error subtree.
//!
//! A pass that turns a generated tree into Error nodes is counted as
//! "errored" (by message), not failed: producing errors exempts the tree
//! from well-formedness. Trees are deduplicated by structural hash; on a
//! collision the next seed past the configured range is tried, so the retry
//! budget is coupled to the seed range by design.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use trieste_core::wf::{Generators, Wellformed};
use trieste_core::{ErrorMsg, Node};

use crate::pass::Pass;
use crate::reader::Reader;
use crate::rewriter::Rewriter;
use crate::writer::Writer;

use trieste_core::wf;

pub struct Fuzzer {
    passes: Vec<Pass>,
    input_wf: Wellformed,
    generators: Generators,
    max_depth: usize,
    start_seed: u64,
    seed_count: u64,
    failfast: bool,
    start_index: usize,
    end_index: usize,
    max_retries: usize,
    bound_vars: bool,
}

impl Fuzzer {
    pub fn new(passes: Vec<Pass>, input_wf: Wellformed, generators: Generators) -> Self {
        let end_index = passes.len();
        Fuzzer {
            passes,
            input_wf,
            generators,
            max_depth: 10,
            start_seed: rand::random::<u32>() as u64,
            seed_count: 100,
            failfast: false,
            start_index: 1,
            end_index,
            max_retries: 100,
            bound_vars: true,
        }
    }

    pub fn for_reader(reader: &Reader) -> Self {
        Fuzzer::new(
            reader.passes().to_vec(),
            reader.parse_wf().clone(),
            reader.gen_locations().clone(),
        )
    }

    pub fn for_writer(writer: &Writer, generators: Generators) -> Self {
        Fuzzer::new(writer.passes().to_vec(), writer.input_wf().clone(), generators)
    }

    pub fn for_rewriter(rewriter: &Rewriter, generators: Generators) -> Self {
        Fuzzer::new(
            rewriter.passes().to_vec(),
            rewriter.input_wf().clone(),
            generators,
        )
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn start_seed(mut self, seed: u64) -> Self {
        self.start_seed = seed;
        self
    }

    pub fn seed_count(mut self, count: u64) -> Self {
        self.seed_count = count;
        self
    }

    /// Return on the first failure.
    pub fn failfast(mut self, value: bool) -> Self {
        self.failfast = value;
        self
    }

    /// One-based index of the first pass to fuzz.
    pub fn start_index(mut self, index: usize) -> Self {
        assert!(index > 0, "start_index must be greater than 0");
        self.start_index = index;
        self
    }

    pub fn end_index(mut self, index: usize) -> Self {
        self.end_index = index;
        self
    }

    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Whether generation performs symbol-table bindings.
    pub fn bound_vars(mut self, value: bool) -> Self {
        self.bound_vars = value;
        self
    }

    /// Fuzzes each pass in the range independently.
    pub fn test(&self) -> FuzzReport {
        let mut report = FuzzReport::default();

        for index in self.start_index..=self.end_index {
            let pass = &self.passes[index - 1];
            let wf = pass.wf();
            let prev = if index > 1 {
                self.passes[index - 2].wf()
            } else {
                &self.input_wf
            };

            if prev.is_empty() || wf.is_empty() {
                continue;
            }

            let _ctx = wf::WfContext::new(&[prev, wf]);

            let mut stats = PassFuzzStats {
                pass: pass.name().to_string(),
                ..PassFuzzStats::default()
            };

            let mut hashes = HashSet::new();
            let mut retry_seed = self.start_seed + self.seed_count;
            let mut retries = 0;

            for seed in self.start_seed..self.start_seed + self.seed_count {
                let mut actual_seed = seed;
                let mut ast = prev.r#gen(
                    &self.generators,
                    actual_seed,
                    self.max_depth,
                    self.bound_vars,
                );

                let mut hash = ast.hash();
                while hashes.contains(&hash) && retries < self.max_retries {
                    actual_seed = retry_seed;
                    ast = prev.r#gen(
                        &self.generators,
                        actual_seed,
                        self.max_depth,
                        self.bound_vars,
                    );
                    hash = ast.hash();
                    retry_seed += 1;
                    retries += 1;
                }
                hashes.insert(hash);

                let changes = match pass.run(&ast) {
                    Ok((_, changes)) => changes,
                    Err(e) => {
                        stats.failed += 1;
                        stats.record_seed(actual_seed, e.to_string());
                        if self.failfast {
                            report.passes.push(stats);
                            return report;
                        }
                        continue;
                    }
                };

                wf.build_symtab(&ast);

                let mut errors = Vec::new();
                ast.get_errors(&mut errors);
                if !errors.is_empty() {
                    // The pass reported errors, so the tree is exempt from
                    // well-formedness.
                    stats.errored += 1;
                    if let Some(message) = first_error_message(&errors) {
                        *stats.error_messages.entry(message).or_default() += 1;
                    }
                    continue;
                }

                if wf.check(&ast).is_err() {
                    stats.failed += 1;
                    stats.record_seed(actual_seed, "not well-formed".to_string());
                    if self.failfast {
                        report.passes.push(stats);
                        return report;
                    }
                    continue;
                }

                stats.passed += 1;
                if changes == 0 {
                    stats.trivial += 1;
                }
            }

            stats.unique_trees = hashes.len();
            stats.retries = retries;
            report.passes.push(stats);
        }

        report
    }

    /// Feeds each generated tree through the whole pass range.
    pub fn test_sequence(&self) -> SequenceFuzzReport {
        let mut report = SequenceFuzzReport::default();

        let gen_wf = if self.start_index > 1 {
            self.passes[self.start_index - 2].wf()
        } else {
            &self.input_wf
        };
        let init_wf = self.passes[self.start_index - 1].wf();

        assert!(
            !gen_wf.is_empty() && !init_wf.is_empty(),
            "cannot generate trees without a shape declaration"
        );

        let mut hashes = HashSet::new();
        let mut retry_seed = self.start_seed + self.seed_count;
        let mut retries = 0;

        let mut passed_sizes = Vec::new();
        let mut passed_heights = Vec::new();
        let mut failed_sizes = Vec::new();
        let mut failed_heights = Vec::new();
        let mut rewrites = Vec::new();

        for seed in self.start_seed..self.start_seed + self.seed_count {
            let mut actual_seed = seed;
            let mut ast = gen_wf.r#gen(
                &self.generators,
                actual_seed,
                self.max_depth,
                self.bound_vars,
            );

            let mut hash = ast.hash();
            while hashes.contains(&hash) && retries < self.max_retries {
                actual_seed = retry_seed;
                ast = gen_wf.r#gen(
                    &self.generators,
                    actual_seed,
                    self.max_depth,
                    self.bound_vars,
                );
                hash = ast.hash();
                retry_seed += 1;
                retries += 1;
            }
            hashes.insert(hash);

            let mut sequence_rewrites = Vec::new();
            let mut seq_ok = true;
            let mut errored = false;

            for index in self.start_index..=self.end_index {
                let pass = &self.passes[index - 1];
                let wf = pass.wf();
                let prev = if index > 1 {
                    self.passes[index - 2].wf()
                } else {
                    &self.input_wf
                };

                if prev.is_empty() || wf.is_empty() {
                    continue;
                }

                let _ctx = wf::WfContext::new(&[prev, wf]);

                let changes = match pass.run(&ast) {
                    Ok((_, changes)) => changes,
                    Err(e) => {
                        errored = true;
                        *report
                            .error_passes
                            .entry(pass.name().to_string())
                            .or_default()
                            .entry(e.to_string())
                            .or_default() += 1;
                        break;
                    }
                };
                sequence_rewrites.push(changes);

                wf.build_symtab(&ast);

                let mut errors = Vec::new();
                ast.get_errors(&mut errors);
                if !errors.is_empty() {
                    errored = true;
                    failed_sizes.push(ast.tree_size());
                    failed_heights.push(ast.tree_height());
                    if let Some(message) = first_error_message(&errors) {
                        *report
                            .error_passes
                            .entry(pass.name().to_string())
                            .or_default()
                            .entry(message)
                            .or_default() += 1;
                    }
                    // No need to run subsequent passes.
                    break;
                }

                if wf.check(&ast).is_err() {
                    seq_ok = false;
                    report.wf_failures += 1;
                    if self.failfast {
                        return report;
                    }
                }
            }

            rewrites.push(sequence_rewrites.iter().sum::<usize>());

            if seq_ok && !errored {
                report.passed += 1;
                passed_sizes.push(ast.tree_size());
                passed_heights.push(ast.tree_height());
            } else if errored {
                report.failed += 1;
            }

            if seq_ok && avg(&sequence_rewrites) < 1 {
                report.trivial += 1;
            }
        }

        report.passed_sizes = DistStats::of(&passed_sizes);
        report.passed_heights = DistStats::of(&passed_heights);
        report.failed_sizes = DistStats::of(&failed_sizes);
        report.failed_heights = DistStats::of(&failed_heights);
        report.avg_rewrites = avg(&rewrites);
        report.unique_trees = hashes.len();
        report.retries = retries;
        report
    }
}

fn first_error_message(errors: &[Node]) -> Option<String> {
    errors.first().and_then(|error| {
        error
            .children()
            .find(|c| c.token() == ErrorMsg)
            .map(|c| c.location().view().to_string())
    })
}

fn avg(values: &[usize]) -> usize {
    if values.is_empty() {
        0
    } else {
        values.iter().sum::<usize>() / values.len()
    }
}

/// Counters for one fuzzed pass.
#[derive(Debug, Default, Serialize)]
pub struct PassFuzzStats {
    pub pass: String,
    pub passed: usize,
    /// Passed with zero changes.
    pub trivial: usize,
    /// Produced Error nodes (exempt from well-formedness).
    pub errored: usize,
    /// Output violated the pass's declared shape.
    pub failed: usize,
    pub error_messages: IndexMap<String, usize>,
    pub failed_seeds: Vec<(u64, String)>,
    pub unique_trees: usize,
    pub retries: usize,
}

impl PassFuzzStats {
    fn record_seed(&mut self, seed: u64, message: String) {
        self.failed_seeds.push((seed, message));
    }
}

#[derive(Debug, Default, Serialize)]
pub struct FuzzReport {
    pub passes: Vec<PassFuzzStats>,
}

impl FuzzReport {
    pub fn ok(&self) -> bool {
        self.passes.iter().all(|p| p.failed == 0)
    }
}

impl fmt::Display for FuzzReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stats in &self.passes {
            writeln!(f, "Pass {}:", stats.pass)?;
            if stats.failed > 0 {
                writeln!(f, "  not WF {} times.", stats.failed)?;
            }
            if stats.errored > 0 {
                writeln!(f, "  errored {} times.", stats.errored)?;
            }
            for (message, count) in &stats.error_messages {
                writeln!(f, "    {message}: {count}")?;
            }
            writeln!(f, "  passed {} times.", stats.passed)?;
            if stats.trivial > 0 {
                writeln!(f, "    trivial: {}", stats.trivial)?;
            }
            writeln!(
                f,
                "  {} hash unique {} ({} {}).",
                stats.unique_trees,
                if stats.unique_trees == 1 { "tree" } else { "trees" },
                stats.retries,
                if stats.retries == 1 { "retry" } else { "retries" },
            )?;
        }
        Ok(())
    }
}

/// Average and maximum of a recorded distribution.
#[derive(Debug, Default, Serialize)]
pub struct DistStats {
    pub avg: usize,
    pub max: usize,
}

impl DistStats {
    fn of(values: &[usize]) -> Self {
        DistStats {
            avg: avg(values),
            max: values.iter().copied().max().unwrap_or(0),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SequenceFuzzReport {
    /// Full-sequence runs with no WF failures and no errors.
    pub passed: usize,
    /// Runs that stopped on an Error subtree.
    pub failed: usize,
    /// Well-formedness violations across all runs.
    pub wf_failures: usize,
    /// Runs averaging under one change per pass.
    pub trivial: usize,
    /// Pass name to error-message histogram.
    pub error_passes: IndexMap<String, IndexMap<String, usize>>,
    pub passed_sizes: DistStats,
    pub passed_heights: DistStats,
    pub failed_sizes: DistStats,
    pub failed_heights: DistStats,
    pub avg_rewrites: usize,
    pub unique_trees: usize,
    pub retries: usize,
}

impl SequenceFuzzReport {
    pub fn ok(&self) -> bool {
        self.wf_failures == 0
    }
}

impl fmt::Display for SequenceFuzzReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wf_failures > 0 {
            writeln!(f, " not WF {} times.", self.wf_failures)?;
        }
        for (pass, messages) in &self.error_passes {
            let total: usize = messages.values().sum();
            writeln!(f, " pass {pass} resulted in error: {total} times.")?;
            for (message, count) in messages {
                writeln!(f, "    {message}: {count}")?;
            }
        }
        writeln!(f, " failed to run full sequence: {} times.", self.failed)?;
        writeln!(f, " passed full sequence: {} times.", self.passed)?;
        if self.trivial > 0 {
            writeln!(
                f,
                " trees with < 1 change per pass on average: {}",
                self.trivial
            )?;
        }
        writeln!(f, " average rewrites per run: {}", self.avg_rewrites)?;
        writeln!(
            f,
            " {} hash unique {} ({} {}).",
            self.unique_trees,
            if self.unique_trees == 1 { "tree" } else { "trees" },
            self.retries,
            if self.retries == 1 { "retry" } else { "retries" },
        )?;
        writeln!(f, " failed runs:")?;
        writeln!(f, "   average tree size: {}", self.failed_sizes.avg)?;
        writeln!(f, "   average tree height: {}", self.failed_heights.avg)?;
        writeln!(f, "   max tree size: {}", self.failed_sizes.max)?;
        writeln!(f, "   max tree height: {}", self.failed_heights.max)?;
        writeln!(f, " passed runs:")?;
        writeln!(f, "   average tree size: {}", self.passed_sizes.avg)?;
        writeln!(f, "   average tree height: {}", self.passed_heights.avg)?;
        writeln!(f, "   max tree size: {}", self.passed_sizes.max)?;
        writeln!(f, "   max tree height: {}", self.passed_heights.max)?;
        Ok(())
    }
}
