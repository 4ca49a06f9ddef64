/// pest-based parser for the declaration subset of Groovy.
///
/// The parser produces a generic tree of `Pair<Rule>` nodes; `SyntaxTree`
/// keeps the original text next to it so that comments skipped by the
/// grammar (javadoc in particular) can be recovered from source snippets.
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::errors::{Result, StubError};

#[derive(Parser)]
#[grammar = "parser/groovy.pest"] // relative to src
pub struct GroovyParser;

const TAB_WIDTH: usize = 2;

/// A parsed compilation unit together with the text it was parsed from.
pub struct SyntaxTree<'i> {
    source: &'i str,
    root: Pair<'i, Rule>,
}

impl<'i> SyntaxTree<'i> {
    /// The `compilation_unit` node.
    pub fn root(&self) -> Pair<'i, Rule> {
        self.root.clone()
    }

    pub fn source(&self) -> &'i str {
        self.source
    }

    /// Source text between two byte offsets, clamped to the input.
    ///
    /// Returns an empty string for an inverted range.
    pub fn snippet(&self, start: usize, end: usize) -> &'i str {
        let end = end.min(self.source.len());
        if start >= end {
            return "";
        }
        self.source.get(start..end).unwrap_or("")
    }

    /// Renders the tree as indented `Rule => (start,end) "text"` lines.
    pub fn dump(&self) -> String {
        let mut lines = Vec::new();
        dump_pair(&self.root, 0, &mut lines);
        lines.join("\n")
    }
}

fn dump_pair(pair: &Pair<'_, Rule>, level: usize, lines: &mut Vec<String>) {
    let span = pair.as_span();
    let pad = " ".repeat(level * TAB_WIDTH);
    lines.push(format!(
        "{}{:?} => ({},{}) {:?}",
        pad,
        pair.as_rule(),
        span.start(),
        span.end(),
        span.as_str()
    ));
    for child in pair.clone().into_inner() {
        dump_pair(&child, level + 1, lines);
    }
}

/// Parses Groovy source text.
///
/// `path` is only used to label errors. A rejected input yields
/// `StubError::Parse` with the 1-based line and column pest reported.
pub fn parse<'i>(path: &str, source: &'i str) -> Result<SyntaxTree<'i>> {
    let mut pairs = GroovyParser::parse(Rule::compilation_unit, source).map_err(|e| {
        let (line, column) = match e.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        StubError::Parse {
            message: e.variant.message().to_string(),
            path: path.to_string(),
            line,
            column,
        }
    })?;

    let root = pairs.next().ok_or_else(|| StubError::Parse {
        message: "empty parse result".to_string(),
        path: path.to_string(),
        line: 1,
        column: 1,
    })?;

    Ok(SyntaxTree { source, root })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_of(source: &str) -> Vec<Rule> {
        let tree = parse("test.groovy", source).unwrap();
        tree.root().into_inner().map(|p| p.as_rule()).collect()
    }

    #[test]
    fn test_top_level_rules() {
        let rules = rules_of("package a.b\nimport c.D\nclass E {}\n");
        assert_eq!(
            rules,
            vec![Rule::package_def, Rule::import_def, Rule::type_def, Rule::EOI]
        );
    }

    #[test]
    fn test_identifier_rejects_reserved_words() {
        assert!(GroovyParser::parse(Rule::identifier, "class").is_err());
        let pair = GroovyParser::parse(Rule::identifier, "classLoader")
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(pair.as_str(), "classLoader");
    }

    #[test]
    fn test_number_literal_kinds() {
        let cases = [
            ("42", Rule::int_lit),
            ("42L", Rule::long_lit),
            ("1.5f", Rule::float_lit),
            ("1.5d", Rule::double_lit),
            ("1.5", Rule::big_decimal_lit),
            ("10G", Rule::big_integer_lit),
            ("0xFF", Rule::int_lit),
        ];
        for (text, expected) in cases {
            let pair = GroovyParser::parse(Rule::literal_arg, text)
                .unwrap()
                .next()
                .unwrap();
            let inner = pair.into_inner().next().unwrap();
            assert_eq!(inner.as_rule(), expected, "literal {}", text);
        }
    }

    #[test]
    fn test_method_body_skips_nested_braces() {
        let source = "class A {\n  def run() { if (x) { '}' } else { \"{\" } }\n  def other() {}\n}\n";
        assert!(parse("A.groovy", source).is_ok());
    }

    #[test]
    fn test_parse_error_has_location() {
        let err = parse("Broken.groovy", "class Broken {\n  def (\n}\n")
            .err()
            .unwrap();
        match err {
            StubError::Parse { path, line, .. } => {
                assert_eq!(path, "Broken.groovy");
                assert!(line >= 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_snippet_is_clamped() {
        let tree = parse("t.groovy", "class A {}").unwrap();
        assert_eq!(tree.snippet(0, 5), "class");
        assert_eq!(tree.snippet(6, 100), "A {}");
        assert_eq!(tree.snippet(8, 2), "");
    }

    #[test]
    fn test_dump_lists_rules() {
        let tree = parse("t.groovy", "class A {}").unwrap();
        let dump = tree.dump();
        assert!(dump.starts_with("compilation_unit"));
        assert!(dump.contains("class_def"));
    }
}
