//! The Rewriter: a bare pass pipeline over an existing AST.

use std::path::PathBuf;

use trieste_core::Node;
use trieste_core::wf::Wellformed;

use crate::pass::Pass;
use crate::process::{PassRange, Process, ProcessResult};

/// Applies a named sequence of passes to an AST that some other stage
/// already produced.
pub struct Rewriter {
    name: String,
    passes: Vec<Pass>,
    input_wf: Wellformed,
    wf_check_enabled: bool,
    debug_path: Option<PathBuf>,
}

impl Rewriter {
    pub fn new(name: impl Into<String>, passes: Vec<Pass>, input_wf: Wellformed) -> Self {
        Rewriter {
            name: name.into(),
            passes,
            input_wf,
            wf_check_enabled: true,
            debug_path: None,
        }
    }

    pub fn wf_check_enabled(mut self, value: bool) -> Self {
        self.wf_check_enabled = value;
        self
    }

    pub fn debug_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn input_wf(&self) -> &Wellformed {
        &self.input_wf
    }

    pub fn rewrite(&self, ast: Node) -> ProcessResult {
        let range = PassRange::new(
            self.passes.clone(),
            self.input_wf.clone(),
            self.name.clone(),
        );

        let mut process = Process::new(range).set_check_well_formed(self.wf_check_enabled);
        if let Some(dir) = &self.debug_path {
            let dir = dir.clone();
            let name = self.name.clone();
            process = process.set_pass_complete(move |ast, pass, _wf, index, _stats| {
                crate::reader::dump_pass(&dir, &name, index, pass, ast).is_ok()
            });
        }

        process.run(ast)
    }
}
