//! The pipeline runner.
//!
//! A [`PassRange`] selects a window over a pass list together with the
//! well-formedness declaration the first pass's input must satisfy.
//! [`Process`] sequences the window: for each pass it pushes the pass's WF
//! onto the thread-local context, rewrites to a fixed point, validates
//! (symbol tables, collected Error nodes, optional WF check), records
//! statistics, and invokes the completion callback. The first validation
//! failure halts the pipeline and returns the last AST plus the collected
//! errors.

use std::time::Instant;

use serde::Serialize;

use trieste_core::wf::{self, Wellformed};
use trieste_core::{Error, ErrorAst, ErrorMsg, Node};

use crate::pass::Pass;
use crate::trace::{NoopTracer, Tracer};

/// Per-pass run statistics.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct PassStatistics {
    /// Iterations until the fixed point (1 under `once`).
    pub count: usize,
    /// Total rewrites across all iterations.
    pub changes: usize,
    /// Wall-clock duration in microseconds, validation included.
    pub duration_us: u64,
}

/// A window over a pass list, tracking the input WF of the next pass to run.
#[derive(Clone)]
pub struct PassRange {
    passes: Vec<Pass>,
    start: usize,
    end: usize,
    wf: Wellformed,
    entry_name: String,
}

impl PassRange {
    pub fn new(passes: Vec<Pass>, input_wf: Wellformed, entry_name: impl Into<String>) -> Self {
        let end = passes.len();
        PassRange {
            passes,
            start: 0,
            end,
            wf: input_wf,
            entry_name: entry_name.into(),
        }
    }

    /// Moves the window start to the named pass; the range then begins with
    /// that pass's output WF as its entry state.
    pub fn move_start(&mut self, name: &str) -> bool {
        match self.passes[self.start..self.end]
            .iter()
            .position(|p| p.name() == name)
        {
            Some(offset) => {
                let index = self.start + offset;
                self.wf = self.passes[index].wf().clone();
                self.entry_name = self.passes[index].name().to_string();
                self.start = index;
                true
            }
            None => false,
        }
    }

    /// Shrinks the window to end just after the named pass.
    pub fn move_end(&mut self, name: &str) -> bool {
        match self.passes[self.start..self.end]
            .iter()
            .position(|p| p.name() == name)
        {
            Some(offset) => {
                self.end = self.start + offset + 1;
                true
            }
            None => false,
        }
    }

    /// Empties the window; only entry validation will run.
    pub fn disable(&mut self) {
        self.end = self.start;
    }

    pub fn has_next(&self) -> bool {
        self.start < self.end
    }

    pub fn current(&self) -> &Pass {
        &self.passes[self.start]
    }

    /// Steps past the current pass, making its WF the entry state.
    pub fn advance(&mut self) {
        self.wf = self.current().wf().clone();
        self.entry_name = self.current().name().to_string();
        self.start += 1;
    }

    pub fn input_wf(&self) -> &Wellformed {
        &self.wf
    }

    pub fn entry_pass_name(&self) -> &str {
        &self.entry_name
    }
}

/// Result of a pipeline run. When not ok, `ast` is the last good tree and
/// `errors` the collected Error subtrees.
pub struct ProcessResult {
    pub ok: bool,
    pub last_pass: String,
    pub ast: Option<Node>,
    pub errors: Vec<Node>,
}

type PassCompleteFn<'a> =
    Box<dyn FnMut(&Node, &str, &Wellformed, usize, &PassStatistics) -> bool + 'a>;

/// Runs a collection of rewrite passes on an AST.
pub struct Process<'a> {
    range: PassRange,
    check_well_formed: bool,
    pass_complete: Option<PassCompleteFn<'a>>,
    tracer: Box<dyn Tracer + 'a>,
}

impl<'a> Process<'a> {
    pub fn new(range: PassRange) -> Self {
        Process {
            range,
            check_well_formed: true,
            pass_complete: None,
            tracer: Box::new(NoopTracer),
        }
    }

    /// Whether well-formedness is checked between passes.
    pub fn set_check_well_formed(mut self, value: bool) -> Self {
        self.check_well_formed = value;
        self
    }

    /// Invoked after each pass with the current AST and the completed pass's
    /// details; returning false aborts the pipeline.
    pub fn set_pass_complete(
        mut self,
        f: impl FnMut(&Node, &str, &Wellformed, usize, &PassStatistics) -> bool + 'a,
    ) -> Self {
        self.pass_complete = Some(Box::new(f));
        self
    }

    pub fn set_tracer(mut self, tracer: impl Tracer + 'a) -> Self {
        self.tracer = Box::new(tracer);
        self
    }

    /// Builds symbol tables with the current input WF, collects Error
    /// descendants, then (when enabled) runs the WF check.
    pub fn validate(&mut self, ast: &Node, errors: &mut Vec<Node>) -> bool {
        let wf = self.range.input_wf().clone();
        wf.build_symtab(ast);

        errors.clear();
        ast.get_errors(errors);
        let mut ok = errors.is_empty();

        if ok && self.check_well_formed {
            if let Err(violations) = wf.check(ast) {
                let pass = self.range.entry_pass_name().to_string();
                for violation in &violations {
                    self.tracer.wf_violation(&pass, violation);
                }
                ok = false;
            }
        }

        ok
    }

    /// Runs the pass window over `ast` to completion or first failure.
    pub fn run(mut self, ast: Node) -> ProcessResult {
        let _ctx = wf::WfContext::new(&[self.range.input_wf()]);
        let mut errors = Vec::new();

        let mut ok = self.validate(&ast, &mut errors);

        let stats = PassStatistics::default();
        let mut last_pass = self.range.entry_pass_name().to_string();
        ok = self.complete(&ast, &last_pass, 0, &stats) && ok;

        let mut index = 1;
        while ok && self.range.has_next() {
            let pass = self.range.current().clone();
            self.tracer.pass_start(pass.name());

            let now = Instant::now();
            wf::push(pass.wf());
            let run = pass.run(&ast);
            wf::pop();

            let (count, changes) = match run {
                Ok(counts) => counts,
                Err(err) => {
                    errors.push(
                        Error << (ErrorMsg ^ err.to_string()) << (ErrorAst << ast.deep_clone()),
                    );
                    return ProcessResult {
                        ok: false,
                        last_pass: pass.name().to_string(),
                        ast: Some(ast),
                        errors,
                    };
                }
            };

            self.range.advance();
            ok = self.validate(&ast, &mut errors);

            let stats = PassStatistics {
                count,
                changes,
                duration_us: now.elapsed().as_micros() as u64,
            };

            self.tracer.pass_complete(pass.name(), index, &stats);
            ok = self.complete(&ast, pass.name(), index, &stats) && ok;

            last_pass = pass.name().to_string();
            index += 1;
        }

        ProcessResult {
            ok,
            last_pass,
            ast: Some(ast),
            errors,
        }
    }

    fn complete(&mut self, ast: &Node, name: &str, index: usize, stats: &PassStatistics) -> bool {
        let wf = self.range.input_wf().clone();
        match &mut self.pass_complete {
            Some(f) => f(ast, name, &wf, index, stats),
            None => true,
        }
    }
}
