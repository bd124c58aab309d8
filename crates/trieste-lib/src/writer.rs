//! The Writer: an AST through a pass pipeline and out to files.
//!
//! The pipeline's final tree must conform to [`wf_writer`]: a Top holding
//! Directory/File nodes, where a File pairs a `Path` with `Contents`. The
//! traversal then hands each File's contents to the language's
//! [`WriteFile`] closure against a [`Destination`].

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use trieste_core::wf::{self, Wellformed, seq};
use trieste_core::{
    Directory, Error, ErrorAst, ErrorMsg, File, Node, Top, tokens,
};

use crate::pass::Pass;
use crate::process::{PassRange, Process, ProcessResult};

tokens! {
    /// Relative path of a file or directory being written.
    pub Path = "path" [print];
    pub FileSeq = "fileseq";
    pub Contents = "contents";
}

/// The tree shape a write pipeline must produce.
pub fn wf_writer() -> Wellformed {
    Wellformed::new()
        .shape(Top, Directory | File)
        .shape(Directory, Path * FileSeq)
        .shape(FileSeq, seq(Directory | File))
        .shape(File, Path * Contents)
}

/// Serializes one file's Contents node into its output text.
pub type WriteFile = Rc<dyn Fn(&mut dyn fmt::Write, &Node) -> fmt::Result>;

enum Mode {
    FileSystem,
    Console,
    Synthetic,
}

/// Where written files go: the file system, stdout, or an in-memory map.
pub struct Destination {
    mode: Mode,
    path: PathBuf,
    files: HashMap<String, String>,
}

impl Destination {
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Destination {
            mode: Mode::FileSystem,
            path: path.into(),
            files: HashMap::new(),
        }
    }

    pub fn console() -> Self {
        Destination {
            mode: Mode::Console,
            path: PathBuf::from("."),
            files: HashMap::new(),
        }
    }

    /// Files are stored in memory and accessible via [`Destination::file`].
    pub fn synthetic() -> Self {
        Destination {
            mode: Mode::Synthetic,
            path: PathBuf::from("."),
            files: HashMap::new(),
        }
    }

    pub fn files(&self) -> &HashMap<String, String> {
        &self.files
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        let full = self.path.join(path);
        self.files.get(&full.to_string_lossy().to_string()).map(String::as_str)
    }

    fn push_directory(&mut self, name: &str) {
        self.path.push(name);
    }

    fn pop_directory(&mut self) {
        self.path.pop();
    }

    fn write(&mut self, name: &str, contents: &str) -> std::io::Result<()> {
        let full = self.path.join(name);
        match self.mode {
            Mode::FileSystem => {
                if let Some(parent) = full.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(full, contents)
            }
            Mode::Console => {
                println!("OPEN {}", full.display());
                println!("{contents}");
                println!("CLOSE {}", full.display());
                Ok(())
            }
            Mode::Synthetic => {
                self.files
                    .insert(full.to_string_lossy().to_string(), contents.to_string());
                Ok(())
            }
        }
    }
}

/// Writes an AST out as files after running it through a pass pipeline.
pub struct Writer {
    language_name: String,
    passes: Vec<Pass>,
    input_wf: Wellformed,
    write_file: WriteFile,
    destination: Destination,
    wf_check_enabled: bool,
    debug_path: Option<PathBuf>,
}

impl Writer {
    pub fn new(
        language_name: impl Into<String>,
        passes: Vec<Pass>,
        input_wf: Wellformed,
        write_file: impl Fn(&mut dyn fmt::Write, &Node) -> fmt::Result + 'static,
    ) -> Self {
        Writer {
            language_name: language_name.into(),
            passes,
            input_wf,
            write_file: Rc::new(write_file),
            destination: Destination::console(),
            wf_check_enabled: true,
            debug_path: None,
        }
    }

    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn dir(self, path: impl Into<PathBuf>) -> Self {
        self.destination(Destination::dir(path))
    }

    pub fn synthetic(self) -> Self {
        self.destination(Destination::synthetic())
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

    /// Runs the pipeline, then walks the resulting Directory/File tree
    /// writing each file. Returns the destination alongside the result so
    /// synthetic output can be inspected.
    pub fn write(mut self, ast: Node) -> (ProcessResult, Destination) {
        let range = PassRange::new(
            self.passes.clone(),
            self.input_wf.clone(),
            self.language_name.clone(),
        );

        let mut process = Process::new(range).set_check_well_formed(self.wf_check_enabled);
        if let Some(dir) = &self.debug_path {
            let dir = dir.clone();
            let language = self.language_name.clone();
            process = process.set_pass_complete(move |ast, name, _wf, index, _stats| {
                crate::reader::dump_pass(&dir, &language, index, name, ast).is_ok()
            });
        }

        let mut result = process.run(ast);
        if !result.ok {
            return (result, self.destination);
        }

        let writer_wf = wf_writer();
        let _ctx = wf::WfContext::new(&[&self.input_wf, &writer_wf]);

        let mut error_nodes = Vec::new();
        if let Some(ast) = &result.ast {
            self.emit(ast, &mut error_nodes);
        }

        if !error_nodes.is_empty() {
            result.ok = false;
            result.errors = error_nodes;
        }

        (result, self.destination)
    }

    fn emit(&mut self, node: &Node, errors: &mut Vec<Node>) {
        if node.token() == Top {
            for child in node.children() {
                self.emit(&child, errors);
            }
        } else if node.token() == Directory {
            let Some(path) = wf::field_of(node, Path) else {
                errors.push(emit_error("directory without a path", node));
                return;
            };

            self.destination.push_directory(path.location().view());
            if let Some(files) = wf::field_of(node, FileSeq) {
                for file in files.children() {
                    self.emit(&file, errors);
                }
            }
            self.destination.pop_directory();
        } else if node.token() == File {
            let (Some(path), Some(contents)) =
                (wf::field_of(node, Path), wf::field_of(node, Contents))
            else {
                errors.push(emit_error("file without path and contents", node));
                return;
            };

            let mut text = String::new();
            if (self.write_file)(&mut text, &contents).is_err() {
                errors.push(emit_error("could not serialize file", node));
                return;
            }

            if let Err(e) = self.destination.write(path.location().view(), &text) {
                errors.push(emit_error(&e.to_string(), node));
            }
        }
    }
}

fn emit_error(message: &str, node: &Node) -> Node {
    Error << (ErrorMsg ^ message) << (ErrorAst << node.deep_clone())
}
