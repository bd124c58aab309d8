//! The Reader: source text through a front-end parser and a pass pipeline.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use trieste_core::wf::{Generators, Wellformed};
use trieste_core::{Error, Node, Source, SourceDef, Top};

use crate::pass::Pass;
use crate::process::{PassRange, Process, ProcessResult};

const PARSE_ONLY: &str = "parse";

/// Front-end parse function: turns one source into a tree to be placed
/// under Top (typically rooted at `File`).
pub type ParseFn = Rc<dyn Fn(&Source) -> Node>;

enum Input {
    Path(PathBuf),
    Source(Source),
}

/// Reads source text into a language's AST by parsing and then running the
/// language's pass pipeline, validating between passes.
pub struct Reader {
    language_name: String,
    passes: Vec<Pass>,
    parse: ParseFn,
    parse_wf: Wellformed,
    generators: Generators,
    input: Option<Input>,
    wf_check_enabled: bool,
    debug_path: Option<PathBuf>,
    start_pass: Option<String>,
    end_pass: Option<String>,
    offset: usize,
}

impl Reader {
    pub fn new(
        language_name: impl Into<String>,
        passes: Vec<Pass>,
        parse_wf: Wellformed,
        parse: impl Fn(&Source) -> Node + 'static,
    ) -> Self {
        Reader {
            language_name: language_name.into(),
            passes,
            parse: Rc::new(parse),
            parse_wf,
            generators: Generators::new(),
            input: None,
            wf_check_enabled: false,
            debug_path: None,
            start_pass: None,
            end_pass: None,
            offset: 0,
        }
    }

    pub fn source(mut self, source: Source) -> Self {
        self.input = Some(Input::Source(source));
        self
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(Input::Path(path.into()));
        self
    }

    pub fn synthetic(self, contents: impl Into<String>) -> Self {
        let source = SourceDef::synthetic(contents);
        self.source(source)
    }

    pub fn wf_check_enabled(mut self, value: bool) -> Self {
        self.wf_check_enabled = value;
        self
    }

    /// Enables between-pass debug dumps into the given directory.
    pub fn debug_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    /// Re-enters the pipeline at the named pass; the input must then be a
    /// printed AST dumped after that pass.
    pub fn start_pass(mut self, name: impl Into<String>) -> Self {
        self.start_pass = Some(name.into());
        self
    }

    pub fn end_pass(mut self, name: impl Into<String>) -> Self {
        self.end_pass = Some(name.into());
        self
    }

    pub fn offset(mut self, pos: usize) -> Self {
        self.offset = pos;
        self
    }

    /// Leaf-text generators for fuzzing this language.
    pub fn generators(mut self, generators: Generators) -> Self {
        self.generators = generators;
        self
    }

    pub fn language_name(&self) -> &str {
        &self.language_name
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn parse_wf(&self) -> &Wellformed {
        &self.parse_wf
    }

    pub fn gen_locations(&self) -> &Generators {
        &self.generators
    }

    pub fn output_wf(&self) -> &Wellformed {
        self.passes
            .last()
            .map(|p| p.wf())
            .unwrap_or(&self.parse_wf)
    }

    /// All pass names, starting with the synthetic "parse" stage.
    pub fn pass_names(&self) -> Vec<String> {
        let mut names = vec![PARSE_ONLY.to_string()];
        names.extend(self.passes.iter().map(|p| p.name().to_string()));
        names
    }

    pub fn pass_index(&self, name: &str) -> Option<usize> {
        if name == PARSE_ONLY {
            return Some(0);
        }
        self.passes
            .iter()
            .position(|p| p.name() == name)
            .map(|i| i + 1)
    }

    /// Parses the configured input and runs the pass pipeline on it.
    pub fn read(&self) -> ProcessResult {
        let Some(input) = &self.input else {
            return ProcessResult {
                ok: false,
                last_pass: PARSE_ONLY.to_string(),
                ast: None,
                errors: vec![Error ^ "No source provided"],
            };
        };

        let fail = |errors: Vec<Node>| ProcessResult {
            ok: false,
            last_pass: PARSE_ONLY.to_string(),
            ast: None,
            errors,
        };

        let source = match input {
            Input::Path(path) => match SourceDef::load(path) {
                Ok(source) => source,
                Err(e) => return fail(vec![Error ^ format!("Could not read {}: {e}", path.display())]),
            },
            Input::Source(source) => source.clone(),
        };

        let mut range = PassRange::new(
            self.passes.clone(),
            self.parse_wf.clone(),
            PARSE_ONLY,
        );

        if let Some(end) = &self.end_pass {
            if end == PARSE_ONLY {
                range.disable();
            } else if !range.move_end(end) {
                return fail(vec![Error ^ format!("Unknown pass: {end}")]);
            }
        }

        let ast = match &self.start_pass {
            Some(start) => {
                if !range.move_start(start) {
                    return fail(vec![Error ^ format!("Unknown pass: {start}")]);
                }

                // The range points at the dumped pass; its output is the
                // input, so processing resumes on the next pass.
                range.advance();

                match range.input_wf().build_ast(&source, self.offset) {
                    Ok(ast) => ast,
                    Err(e) => {
                        let location = e.location().clone();
                        return fail(vec![
                            (Error ^ location.clone())
                                << (trieste_core::ErrorMsg ^ e.to_string())
                                << (trieste_core::ErrorAst ^ location),
                        ]);
                    }
                }
            }
            None => {
                let top = Node::new(Top);
                top.push_back((self.parse)(&source));
                top
            }
        };

        self.process(range).run(ast)
    }

    fn process(&self, range: PassRange) -> Process<'_> {
        let mut process = Process::new(range).set_check_well_formed(self.wf_check_enabled);

        if let Some(dir) = &self.debug_path {
            let dir = dir.clone();
            let language = self.language_name.clone();
            process = process.set_pass_complete(move |ast, name, _wf, index, _stats| {
                dump_pass(&dir, &language, index, name, ast).is_ok()
            });
        }

        process
    }
}

/// Writes a between-pass debug dump: the language name, the pass name, then
/// the printed AST.
pub(crate) fn dump_pass(
    dir: &Path,
    language: &str,
    index: usize,
    pass: &str,
    ast: &Node,
) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{index:02}_{pass}.trieste"));
    std::fs::write(path, format!("{language}\n{pass}\n{ast}\n"))
}
