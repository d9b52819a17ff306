// ABOUTME: Dotted path expressions and the scope stack they resolve against
// ABOUTME: Handles ../ escapes to enclosing loop scopes and the @index/@first/@last loop variables

use serde_json::Value as JsonValue;
use std::fmt;

/// A parsed `{{path}}` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr<'a> {
    raw: &'a str,
    /// Number of `../` escapes.
    up: usize,
    /// Empty means the scope value itself (`this`).
    segments: Vec<&'a str>,
}

impl<'a> PathExpr<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let mut rest = raw;
        let mut up = 0;
        loop {
            if let Some(stripped) = rest.strip_prefix("../") {
                up += 1;
                rest = stripped;
            } else if rest == ".." {
                up += 1;
                rest = "";
            } else if let Some(stripped) = rest.strip_prefix("./") {
                rest = stripped;
            } else {
                break;
            }
        }

        let segments = match rest {
            "this" | "." => Vec::new(),
            "" if up > 0 => Vec::new(),
            // an empty tag never resolves
            "" => vec![""],
            _ => rest
                .strip_prefix("this.")
                .unwrap_or(rest)
                .split('.')
                .collect(),
        };

        Self { raw, up, segments }
    }

    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    pub fn up(&self) -> usize {
        self.up
    }
}

impl fmt::Display for PathExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}

/// Result of resolving a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'v> {
    Value(&'v JsonValue),
    Index(usize),
    Flag(bool),
    Missing,
}

#[derive(Debug, Clone, Copy)]
struct Frame<'v> {
    value: &'v JsonValue,
    /// Position within the enclosing loop; `None` for the root.
    index: Option<usize>,
    len: usize,
}

/// Root context plus one frame per enclosing loop.
#[derive(Debug, Clone)]
pub struct Scope<'v> {
    frames: Vec<Frame<'v>>,
}

impl<'v> Scope<'v> {
    pub fn new(root: &'v JsonValue) -> Self {
        Self {
            frames: vec![Frame {
                value: root,
                index: None,
                len: 1,
            }],
        }
    }

    /// Enter one loop iteration
    pub fn push(&mut self, value: &'v JsonValue, index: usize, len: usize) {
        self.frames.push(Frame {
            value,
            index: Some(index),
            len,
        });
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn resolve(&self, path: &PathExpr<'_>) -> Resolved<'v> {
        if path.up >= self.frames.len() {
            return Resolved::Missing;
        }
        let frame = self.frames[self.frames.len() - 1 - path.up];

        if let Some(variable) = path.segments.first().and_then(|s| s.strip_prefix('@')) {
            if path.segments.len() != 1 {
                return Resolved::Missing;
            }
            return match (variable, frame.index) {
                ("index", Some(index)) => Resolved::Index(index),
                ("number", Some(index)) => Resolved::Index(index + 1),
                ("first", Some(index)) => Resolved::Flag(index == 0),
                ("last", Some(index)) => Resolved::Flag(index + 1 == frame.len),
                _ => Resolved::Missing,
            };
        }

        let mut current = frame.value;
        for segment in &path.segments {
            let next = match current {
                JsonValue::Object(map) => map.get(*segment),
                JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return Resolved::Missing,
            }
        }

        if current.is_null() {
            Resolved::Missing
        } else {
            Resolved::Value(current)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_forms() {
        let path = PathExpr::parse("offer.grandTotal");
        assert_eq!(path.up(), 0);
        assert_eq!(path.segments, vec!["offer", "grandTotal"]);

        let path = PathExpr::parse("../../offer.currency");
        assert_eq!(path.up(), 2);
        assert_eq!(path.segments, vec!["offer", "currency"]);

        assert!(PathExpr::parse("this").segments.is_empty());
        assert_eq!(PathExpr::parse("this.name").segments, vec!["name"]);
        assert!(PathExpr::parse("../").segments.is_empty());
        assert_eq!(PathExpr::parse("../").up(), 1);
        assert_eq!(PathExpr::parse("./name").segments, vec!["name"]);
    }

    #[test]
    fn test_resolve_root_paths() {
        let root = json!({ "patient": { "name": "Zoë", "email": null }, "offer": {} });
        let scope = Scope::new(&root);

        assert_eq!(
            scope.resolve(&PathExpr::parse("patient.name")),
            Resolved::Value(&json!("Zoë"))
        );
        assert_eq!(
            scope.resolve(&PathExpr::parse("patient.email")),
            Resolved::Missing
        );
        assert_eq!(
            scope.resolve(&PathExpr::parse("patient.name.first")),
            Resolved::Missing
        );
        assert_eq!(scope.resolve(&PathExpr::parse("")), Resolved::Missing);
        assert_eq!(scope.resolve(&PathExpr::parse("../x")), Resolved::Missing);
        assert_eq!(scope.resolve(&PathExpr::parse("@index")), Resolved::Missing);
    }

    #[test]
    fn test_resolve_in_loop_frames() {
        let root = json!({
            "offer": { "currency": "TRY" },
            "treatments": [{ "name": "Implant", "currency": "EUR" }, { "name": "Filling" }]
        });
        let items = root["treatments"].as_array().unwrap();
        let mut scope = Scope::new(&root);
        scope.push(&items[1], 1, items.len());

        assert_eq!(
            scope.resolve(&PathExpr::parse("name")),
            Resolved::Value(&json!("Filling"))
        );
        assert_eq!(
            scope.resolve(&PathExpr::parse("offer.currency")),
            Resolved::Missing
        );
        assert_eq!(
            scope.resolve(&PathExpr::parse("../offer.currency")),
            Resolved::Value(&json!("TRY"))
        );
        assert_eq!(scope.resolve(&PathExpr::parse("@index")), Resolved::Index(1));
        assert_eq!(scope.resolve(&PathExpr::parse("@number")), Resolved::Index(2));
        assert_eq!(scope.resolve(&PathExpr::parse("@first")), Resolved::Flag(false));
        assert_eq!(scope.resolve(&PathExpr::parse("@last")), Resolved::Flag(true));

        // the root frame is never popped
        for _ in 0..2 {
            scope.pop();
            assert_eq!(
                scope.resolve(&PathExpr::parse("offer.currency")),
                Resolved::Value(&json!("TRY"))
            );
            assert_eq!(scope.resolve(&PathExpr::parse("@index")), Resolved::Missing);
        }
    }

    #[test]
    fn test_numeric_segments_index_arrays() {
        let root = json!({ "treatments": [{ "name": "Implant" }] });
        let scope = Scope::new(&root);
        assert_eq!(
            scope.resolve(&PathExpr::parse("treatments.0.name")),
            Resolved::Value(&json!("Implant"))
        );
        assert_eq!(
            scope.resolve(&PathExpr::parse("treatments.3.name")),
            Resolved::Missing
        );
    }
}
