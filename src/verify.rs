/// Syntax check of rendered stubs with the tree-sitter Java grammar.
use tree_sitter::{Node as TsNode, Parser, Tree};

use crate::errors::{Result, StubError};

/// Parses `text` as Java and fails if the tree contains an error or a
/// missing node. The error names the first offending position.
pub fn verify_stub(class_name: &str, text: &str) -> Result<()> {
    let tree = parse_java(class_name, text)?;
    let root = tree.root_node();
    if !root.has_error() {
        return Ok(());
    }

    let message = match first_error(root) {
        Some(node) => {
            let pos = node.start_position();
            let what = if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "syntax error".to_string()
            };
            format!(
                "rendered stub does not parse: {} at {}:{}",
                what,
                pos.row + 1,
                pos.column + 1
            )
        }
        None => "rendered stub does not parse".to_string(),
    };
    Err(StubError::Render {
        message,
        class: class_name.to_string(),
    })
}

fn parse_java(class_name: &str, text: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    let language = tree_sitter_java::LANGUAGE;
    parser
        .set_language(&language.into())
        .map_err(|e| StubError::Render {
            message: format!("failed to load Java grammar: {e}"),
            class: class_name.to_string(),
        })?;
    parser.parse(text, None).ok_or_else(|| StubError::Render {
        message: "tree-sitter parse returned None".to_string(),
        class: class_name.to_string(),
    })
}

/// Depth-first search for the first error or missing node.
fn first_error(node: TsNode<'_>) -> Option<TsNode<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            if let Some(found) = first_error(cursor.node()) {
                return Some(found);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_java_passes() {
        let text = "package a;\npublic class A {\n    public int getX() {\n        throw new InternalError(\"Stubbed method\");\n    }\n}\n";
        assert!(verify_stub("A", text).is_ok());
    }

    #[test]
    fn test_broken_java_is_render_error() {
        let err = verify_stub("A", "public class A {\n    public int getX( {\n}\n")
            .err()
            .unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("does not parse"));
    }
}
