// ABOUTME: Recursive block expander that walks the template tree with a scope stack
// ABOUTME: Repeats each-block bodies per list element and collects non-fatal diagnostics

use indexmap::IndexSet;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::ast::Node;
use super::error::{Diagnostic, Result, TemplateError};
use super::lexer::Position;
use super::path::{PathExpr, Resolved, Scope};
use super::substitute::substitute;

pub(crate) struct Expander<'v> {
    scope: Scope<'v>,
    max_iterations: usize,
    iterations: usize,
    diagnostics: IndexSet<Diagnostic>,
}

impl<'v> Expander<'v> {
    pub(crate) fn new(root: &'v JsonValue, max_iterations: usize) -> Self {
        Self {
            scope: Scope::new(root),
            max_iterations,
            iterations: 0,
            diagnostics: IndexSet::new(),
        }
    }

    pub(crate) fn expand(&mut self, nodes: &[Node<'_>], out: &mut String) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Placeholder { path, position } => {
                    if !substitute(out, &self.scope, path) {
                        self.missing(path, *position);
                    }
                }
                Node::Each {
                    path,
                    position,
                    body,
                } => self.expand_block(path, *position, body, out)?,
            }
        }
        Ok(())
    }

    fn expand_block(
        &mut self,
        path: &PathExpr<'_>,
        position: Position,
        body: &[Node<'_>],
        out: &mut String,
    ) -> Result<()> {
        let items = match self.scope.resolve(path) {
            Resolved::Value(JsonValue::Array(items)) => items,
            Resolved::Missing => {
                self.missing(path, position);
                return Ok(());
            }
            _ => {
                debug!(
                    "Loop path '{}' at line {}, column {} is not a list, skipping",
                    path, position.line, position.column
                );
                self.diagnostics.insert(Diagnostic::TypeMismatch {
                    path: path.to_string(),
                    position,
                });
                return Ok(());
            }
        };

        for (index, item) in items.iter().enumerate() {
            self.iterations += 1;
            if self.iterations > self.max_iterations {
                return Err(TemplateError::LimitExceeded {
                    limit: "loop iterations",
                    max: self.max_iterations,
                });
            }

            self.scope.push(item, index, items.len());
            let result = self.expand(body, out);
            self.scope.pop();
            result?;
        }

        Ok(())
    }

    fn missing(&mut self, path: &PathExpr<'_>, position: Position) {
        debug!(
            "Missing field '{}' at line {}, column {}, rendering empty",
            path, position.line, position.column
        );
        self.diagnostics.insert(Diagnostic::MissingField {
            path: path.to_string(),
            position,
        });
    }

    pub(crate) fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics.into_iter().collect()
    }
}
