//! Execution tracing for the pipeline runner.
//!
//! The tracer is a zero-cost abstraction: [`NoopTracer`]'s methods are empty
//! `#[inline(always)]` functions the compiler removes entirely, so the
//! runner carries no tracing overhead unless a real tracer is installed.
//! [`PrintTracer`] collects human-readable lines with optional ANSI color.

use trieste_core::wf::WfError;

use crate::process::PassStatistics;

/// ANSI color palette for trace output. Standard 16-color codes only, so it
/// reads in both light and dark terminals.
#[derive(Clone, Copy, Debug)]
pub struct Colors {
    pub blue: &'static str,
    pub red: &'static str,
    pub dim: &'static str,
    pub reset: &'static str,
}

impl Default for Colors {
    fn default() -> Self {
        Self::OFF
    }
}

impl Colors {
    pub const ON: Self = Self {
        blue: "\x1b[34m",
        red: "\x1b[31m",
        dim: "\x1b[2m",
        reset: "\x1b[0m",
    };

    pub const OFF: Self = Self {
        blue: "",
        red: "",
        dim: "",
        reset: "",
    };

    pub fn new(enabled: bool) -> Self {
        if enabled { Self::ON } else { Self::OFF }
    }
}

/// Instrumentation points of a pipeline run.
///
/// - `pass_start` — before a pass begins rewriting
/// - `pass_complete` — after a pass ran and validated
/// - `wf_violation` — per well-formedness violation found between passes
pub trait Tracer {
    fn pass_start(&mut self, name: &str);

    fn pass_complete(&mut self, name: &str, index: usize, stats: &PassStatistics);

    fn wf_violation(&mut self, pass: &str, error: &WfError);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn pass_start(&mut self, _name: &str) {}

    #[inline(always)]
    fn pass_complete(&mut self, _name: &str, _index: usize, _stats: &PassStatistics) {}

    #[inline(always)]
    fn wf_violation(&mut self, _pass: &str, _error: &WfError) {}
}

/// Tracer that collects a line-based run log.
pub struct PrintTracer {
    colors: Colors,
    lines: Vec<String>,
}

impl PrintTracer {
    pub fn new(colors: Colors) -> Self {
        PrintTracer {
            colors,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Print all collected lines to stdout.
    pub fn print(&self) {
        for line in &self.lines {
            println!("{line}");
        }
    }
}

impl Tracer for PrintTracer {
    fn pass_start(&mut self, name: &str) {
        let c = self.colors;
        self.lines.push(format!("{}{name}{}:", c.blue, c.reset));
    }

    fn pass_complete(&mut self, name: &str, index: usize, stats: &PassStatistics) {
        let c = self.colors;
        self.lines.push(format!(
            "{}{index:02}{} {name}\titerations {}\tchanges {}\ttime (us) {}",
            c.dim, c.reset, stats.count, stats.changes, stats.duration_us
        ));
    }

    fn wf_violation(&mut self, pass: &str, error: &WfError) {
        let c = self.colors;
        self.lines
            .push(format!("{}{pass}{}: {error}", c.red, c.reset));
    }
}
