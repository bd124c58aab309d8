//! Rendering collected Error subtrees.
//!
//! Errors travel through a pipeline as data (`Error <<= ErrorMsg *
//! ErrorAst`); this module renders a collected batch with source spans for
//! human consumption.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

use trieste_core::{ErrorMsg, Location, Node};

use crate::process::ProcessResult;

const DEFAULT_ERROR_LIMIT: usize = 20;

/// Builder-pattern printer for a batch of Error nodes.
pub struct ErrorPrinter<'e> {
    errors: &'e [Node],
    colored: bool,
    limit: usize,
}

impl<'e> ErrorPrinter<'e> {
    pub fn new(errors: &'e [Node]) -> Self {
        ErrorPrinter {
            errors,
            colored: false,
            limit: DEFAULT_ERROR_LIMIT,
        }
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn render(&self) -> String {
        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        let mut out = String::new();

        for (i, error) in self.errors.iter().enumerate() {
            if i == self.limit {
                let _ = writeln!(out, "Too many errors, stopping here");
                break;
            }

            if i > 0 {
                out.push('\n');
            }

            let message = error
                .children()
                .find(|c| c.token() == ErrorMsg)
                .map(|c| c.location().view().to_string())
                .unwrap_or_else(|| "unknown error".to_string());

            match error.children().find(|c| c.token() != ErrorMsg).and_then(span_of) {
                Some(location) => {
                    let source = location.source.clone().expect("span has a source");
                    let range = span_range(&location, source.view().len());

                    let mut snippet = Snippet::source(source.view()).line_start(1).annotation(
                        AnnotationKind::Primary
                            .span(range)
                            .label(&message),
                    );

                    if !source.origin().is_empty() {
                        snippet = snippet.path(source.origin());
                    }

                    let report = [Level::ERROR.primary_title(&message).element(snippet)];
                    let _ = writeln!(out, "{}", renderer.render(&report));
                }
                None => {
                    let _ = writeln!(out, "error: {message}");
                }
            }
        }

        out
    }
}

/// The most specific sourced location under an ErrorAst wrapper.
fn span_of(ast: Node) -> Option<Location> {
    let location = ast.location();
    if location.source.is_some() {
        return Some(location);
    }

    ast.children().find_map(span_of)
}

fn span_range(location: &Location, limit: usize) -> std::ops::Range<usize> {
    let start = location.pos.min(limit);
    let end = (location.pos + location.len).min(limit);
    if start == end {
        start..(start + 1).min(limit)
    } else {
        start..end
    }
}

impl ProcessResult {
    /// Renders the collected errors plus a pass-failure summary.
    pub fn error_report(&self) -> String {
        let mut out = ErrorPrinter::new(&self.errors).render();
        let _ = write!(
            out,
            "Pass {} failed with {} {}",
            self.last_pass,
            self.errors.len(),
            if self.errors.len() == 1 {
                "error!"
            } else {
                "errors!"
            }
        );
        out
    }
}
