/// Javadoc recovery from the raw text between two declarations.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{JavaDoc, JavaDocTag};

/// Greedy prefix so that the match lands on the last `/** ... */` block.
static LAST_JAVADOC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A.*/\*\*(.*?)\*/").expect("javadoc pattern is valid")
});

/// Finds the last javadoc block in `snippet` and parses it.
///
/// Blank lines and ordinary comments between the block and the declaration
/// do not break the association.
pub fn extract(snippet: &str) -> Option<JavaDoc> {
    let captures = LAST_JAVADOC.captures(snippet)?;
    let body = captures.get(1)?.as_str();
    let doc = parse(body);
    if doc.is_empty() {
        None
    } else {
        Some(doc)
    }
}

/// Parses the inside of a javadoc block (without `/**` and `*/`).
///
/// Lines before the first `@tag` form the comment; each tag collects the
/// lines that follow it until the next tag.
pub fn parse(body: &str) -> JavaDoc {
    let mut comment_lines: Vec<String> = Vec::new();
    let mut tags: Vec<JavaDocTag> = Vec::new();

    for raw_line in body.lines() {
        let line = strip_decoration(raw_line);
        if let Some(tag) = parse_tag_line(line) {
            tags.push(tag);
        } else if let Some(tag) = tags.last_mut() {
            let text = line.trim();
            if !text.is_empty() {
                if !tag.value.is_empty() {
                    tag.value.push('\n');
                }
                tag.value.push_str(text);
            }
        } else {
            comment_lines.push(line.trim_end().to_string());
        }
    }

    JavaDoc {
        comment: comment_lines.join("\n").trim().to_string(),
        tags,
    }
}

/// Removes leading whitespace, the `*` gutter and one following space.
fn strip_decoration(line: &str) -> &str {
    let trimmed = line.trim_start();
    let without_stars = trimmed.trim_start_matches('*');
    if without_stars.len() == trimmed.len() {
        return trimmed;
    }
    without_stars.strip_prefix(' ').unwrap_or(without_stars)
}

fn parse_tag_line(line: &str) -> Option<JavaDocTag> {
    let rest = line.trim_start().strip_prefix('@')?;
    if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let (name, value) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };
    Some(JavaDocTag {
        name: name.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_takes_last_block() {
        let snippet = "/** first */\n\n/**\n * Second one.\n */\n\n";
        let doc = extract(snippet).unwrap();
        assert_eq!(doc.comment, "Second one.");
    }

    #[test]
    fn test_extract_ignores_plain_comments() {
        assert!(extract("/* not javadoc */\n// nor this\n").is_none());
    }

    #[test]
    fn test_extract_skips_trailing_line_comment() {
        let doc = extract("/** Counter. */\n// implementation note\n").unwrap();
        assert_eq!(doc.comment, "Counter.");
    }

    #[test]
    fn test_parse_tags_in_order() {
        let doc = parse(
            "\n * Adds numbers.\n *\n * @param a first\n * @param b second\n *        operand\n * @return the sum\n ",
        );
        assert_eq!(doc.comment, "Adds numbers.");
        assert_eq!(doc.tags.len(), 3);
        assert_eq!(doc.tags[0].name, "param");
        assert_eq!(doc.tags[0].value, "a first");
        assert_eq!(doc.tags[1].value, "b second\noperand");
        assert_eq!(doc.tags[2].name, "return");
        let params: Vec<&str> = doc.tag_values("param").collect();
        assert_eq!(params, vec!["a first", "b second\noperand"]);
    }

    #[test]
    fn test_inline_tags_stay_in_comment() {
        let doc = parse(" * See {@link Foo}\n * for details.\n");
        assert_eq!(doc.comment, "See {@link Foo}\nfor details.");
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn test_empty_block_yields_none() {
        assert!(extract("/** */").is_none());
    }
}
