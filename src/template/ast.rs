// ABOUTME: Builds the node tree of an offer template from its token stream
// ABOUTME: Matches each-blocks with an explicit depth stack and enforces the nesting limit

use super::error::{Result, TemplateError};
use super::lexer::{tokenize, Position, Token};
use super::path::PathExpr;

#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    Text(&'a str),
    Placeholder {
        path: PathExpr<'a>,
        position: Position,
    },
    Each {
        path: PathExpr<'a>,
        position: Position,
        body: Vec<Node<'a>>,
    },
}

/// An open `{{#each}}` waiting for its `{{/each}}`.
struct OpenBlock<'a> {
    path: PathExpr<'a>,
    position: Position,
    body: Vec<Node<'a>>,
}

/// Parse a template body into nodes.
pub fn parse(source: &str, max_depth: usize) -> Result<Vec<Node<'_>>> {
    let mut root = Vec::new();
    let mut open: Vec<OpenBlock<'_>> = Vec::new();

    for token in tokenize(source)? {
        match token {
            Token::Text(text) => current(&mut root, &mut open).push(Node::Text(text)),
            Token::Placeholder { path, position } => {
                current(&mut root, &mut open).push(Node::Placeholder {
                    path: PathExpr::parse(path),
                    position,
                });
            }
            Token::EachOpen { path, position } => {
                if open.len() >= max_depth {
                    return Err(TemplateError::LimitExceeded {
                        limit: "block nesting depth",
                        max: max_depth,
                    });
                }
                open.push(OpenBlock {
                    path: PathExpr::parse(path),
                    position,
                    body: Vec::new(),
                });
            }
            Token::EachClose { position } => {
                let Some(block) = open.pop() else {
                    return Err(TemplateError::malformed(
                        "{{/each}} without a matching {{#each}}",
                        position,
                    ));
                };
                current(&mut root, &mut open).push(Node::Each {
                    path: block.path,
                    position: block.position,
                    body: block.body,
                });
            }
        }
    }

    if let Some(unclosed) = open.first() {
        return Err(TemplateError::malformed(
            format!("{{{{#each {}}}}} has no matching {{{{/each}}}}", unclosed.path),
            unclosed.position,
        ));
    }

    Ok(root)
}

fn current<'n, 'a>(
    root: &'n mut Vec<Node<'a>>,
    open: &'n mut [OpenBlock<'a>],
) -> &'n mut Vec<Node<'a>> {
    match open.last_mut() {
        Some(block) => &mut block.body,
        None => root,
    }
}

/// Every placeholder and loop path referenced by the template, in order.
pub fn referenced_paths(nodes: &[Node<'_>]) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(nodes, &mut paths);
    paths
}

fn collect_paths(nodes: &[Node<'_>], paths: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Placeholder { path, .. } => push_unique(paths, path.to_string()),
            Node::Each { path, body, .. } => {
                push_unique(paths, path.to_string());
                collect_paths(body, paths);
            }
        }
    }
}

fn push_unique(paths: &mut Vec<String>, path: String) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}
