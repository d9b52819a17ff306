// ABOUTME: Single-pass tokenizer for offer templates
// ABOUTME: Splits a template body into literal, placeholder and each-block tokens with source positions

use serde::Serialize;

use super::error::{Result, TemplateError};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// 1-based line and column of a tag in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Placeholder { path: &'a str, position: Position },
    EachOpen { path: &'a str, position: Position },
    EachClose { position: Position },
}

/// Tokenize a template body.
///
/// A `{{` with no closing `}}` is kept as literal text, unless it starts a
/// block directive (`{{#` or `{{/`), which is an error.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut lines = LineTracker::new(source);
    let mut cursor = 0;

    while let Some(found) = source[cursor..].find(OPEN) {
        let start = cursor + found;
        if start > cursor {
            tokens.push(Token::Text(&source[cursor..start]));
        }

        let position = lines.position_at(start);
        let inner_start = start + OPEN.len();

        let Some(found_close) = source[inner_start..].find(CLOSE) else {
            let rest = source[inner_start..].trim_start();
            if rest.starts_with('#') || rest.starts_with('/') {
                return Err(TemplateError::malformed(
                    "unterminated directive, expected '}}'",
                    position,
                ));
            }
            tokens.push(Token::Text(&source[start..]));
            cursor = source.len();
            break;
        };

        let end = inner_start + found_close;
        tokens.push(classify(source[inner_start..end].trim(), position)?);
        cursor = end + CLOSE.len();
    }

    if cursor < source.len() {
        tokens.push(Token::Text(&source[cursor..]));
    }

    Ok(tokens)
}

fn classify(inner: &str, position: Position) -> Result<Token<'_>> {
    if let Some(directive) = inner.strip_prefix('#') {
        let mut parts = directive.split_whitespace();
        return match (parts.next(), parts.next(), parts.next()) {
            (Some("each"), Some(path), None) => Ok(Token::EachOpen { path, position }),
            (Some("each"), None, _) => Err(TemplateError::malformed(
                "{{#each}} requires a list path",
                position,
            )),
            (Some("each"), Some(_), Some(_)) => Err(TemplateError::malformed(
                "{{#each}} takes exactly one path",
                position,
            )),
            (Some(other), _, _) => Err(TemplateError::malformed(
                format!("unsupported block directive '#{}'", other),
                position,
            )),
            (None, _, _) => Err(TemplateError::malformed("empty block directive", position)),
        };
    }

    if inner.starts_with('{') {
        return Err(TemplateError::malformed(
            "raw '{{{...}}}' output is not supported",
            position,
        ));
    }

    if let Some(directive) = inner.strip_prefix('/') {
        return match directive.trim() {
            "each" => Ok(Token::EachClose { position }),
            other => Err(TemplateError::malformed(
                format!("unsupported closing directive '/{}'", other),
                position,
            )),
        };
    }

    Ok(Token::Placeholder {
        path: inner,
        position,
    })
}

/// Converts increasing byte offsets into line/column positions.
struct LineTracker<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> LineTracker<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn position_at(&mut self, offset: usize) -> Position {
        for ch in self.source[self.offset..offset].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = offset;
        Position::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_mixed_template() {
        let tokens = tokenize("Hi {{ patient.name }}!{{#each treatments}}{{name}}{{/each}}").unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Text("Hi "),
                Token::Placeholder {
                    path: "patient.name",
                    position: Position::new(1, 4),
                },
                Token::Text("!"),
                Token::EachOpen {
                    path: "treatments",
                    position: Position::new(1, 23),
                },
                Token::Placeholder {
                    path: "name",
                    position: Position::new(1, 43),
                },
                Token::EachClose {
                    position: Position::new(1, 51),
                },
            ]
        );
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(tokenize("no tags").unwrap(), vec![Token::Text("no tags")]);
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = tokenize("<p>\n  ünï {{x}}\n{{y}}").unwrap();
        let positions: Vec<Position> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Placeholder { position, .. } => Some(*position),
                _ => None,
            })
            .collect();

        assert_eq!(positions, vec![Position::new(2, 7), Position::new(3, 1)]);
    }

    #[test]
    fn test_unsupported_directives_rejected() {
        let err = tokenize("{{#if patient.email}}x{{/if}}").unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("#if"));

        assert!(tokenize("{{/if}}").unwrap_err().is_malformed());
        assert!(tokenize("{{#each}}").unwrap_err().is_malformed());
        assert!(tokenize("{{#each a b}}").unwrap_err().is_malformed());
    }

    #[test]
    fn test_triple_brace_rejected() {
        match tokenize("<p>{{{patient.name}}}</p>").unwrap_err() {
            TemplateError::MalformedDirective { message, position } => {
                assert!(message.contains("not supported"));
                assert_eq!(position, Position::new(1, 4));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(tokenize("{{ {x} }}").unwrap_err().is_malformed());
    }

    #[test]
    fn test_unterminated_tags() {
        assert_eq!(
            tokenize("a {{ b").unwrap(),
            vec![Token::Text("a "), Token::Text("{{ b")]
        );

        let err = tokenize("ok {{#each treatments").unwrap_err();
        match err {
            TemplateError::MalformedDirective { position, .. } => {
                assert_eq!(position, Position::new(1, 4));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
