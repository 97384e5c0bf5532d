//! The line protocol between the model and the step executor.
//!
//! A completion is read line by line. A line whose trimmed text starts with
//! [`TOOL_MARKER`] asks for a tool call in the form
//! `[TOOL] tool-name: parameter`; any other non-empty line is narrative.

use taskweave_core::error::ParseError;

/// Reserved prefix of a tool invocation line.
pub const TOOL_MARKER: &str = "[TOOL]";

/// Keyword that starts a memory-write directive.
const REMEMBER_KEYWORD: &str = "记住";

/// One classified line of a completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseLine {
    /// Free text written by the model, trimmed.
    Narrative(String),
    /// A well-formed tool invocation.
    ToolCall { name: String, parameter: String },
    /// A marker line that could not be split into name and parameter.
    Malformed { raw: String, error: ParseError },
}

/// Classify a single line. Blank lines yield `None`.
pub fn classify_line(line: &str) -> Option<ResponseLine> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some(rest) = trimmed.strip_prefix(TOOL_MARKER) else {
        return Some(ResponseLine::Narrative(trimmed.to_string()));
    };

    let Some((name, parameter)) = rest.split_once(':') else {
        return Some(ResponseLine::Malformed {
            raw: trimmed.to_string(),
            error: ParseError::MissingSeparator(trimmed.to_string()),
        });
    };

    let name = name.trim();
    if name.is_empty() {
        return Some(ResponseLine::Malformed {
            raw: trimmed.to_string(),
            error: ParseError::EmptyToolName(trimmed.to_string()),
        });
    }

    Some(ResponseLine::ToolCall {
        name: name.to_string(),
        parameter: parameter.trim().to_string(),
    })
}

/// Classify every non-blank line of a completion, in order.
pub fn parse_response(text: &str) -> Vec<ResponseLine> {
    text.lines().filter_map(classify_line).collect()
}

/// Whether a narrative line asks for its text to be remembered.
pub fn is_remember_directive(line: &str) -> bool {
    let line = line.trim();
    line.starts_with(REMEMBER_KEYWORD)
        || line
            .get(..8)
            .is_some_and(|head| head.eq_ignore_ascii_case("remember"))
        || line.contains("记住：")
        || line.contains("记住:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrative_lines_are_trimmed() {
        assert_eq!(
            classify_line("   Found 3 competitors  "),
            Some(ResponseLine::Narrative("Found 3 competitors".into()))
        );
        assert_eq!(classify_line("   "), None);
    }

    #[test]
    fn tool_call_splits_on_first_colon() {
        assert_eq!(
            classify_line("[TOOL] search_web: pricing: 2024"),
            Some(ResponseLine::ToolCall {
                name: "search_web".into(),
                parameter: "pricing: 2024".into(),
            })
        );
    }

    #[test]
    fn indented_marker_is_recognised() {
        assert!(matches!(
            classify_line("  [TOOL]lookup:x"),
            Some(ResponseLine::ToolCall { name, parameter }) if name == "lookup" && parameter == "x"
        ));
    }

    #[test]
    fn missing_colon_is_malformed() {
        match classify_line("[TOOL] search_web pricing") {
            Some(ResponseLine::Malformed { error, .. }) => {
                assert!(matches!(error, ParseError::MissingSeparator(_)));
            }
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn empty_name_is_malformed() {
        assert!(matches!(
            classify_line("[TOOL]  : something"),
            Some(ResponseLine::Malformed { error: ParseError::EmptyToolName(_), .. })
        ));
    }

    #[test]
    fn marker_in_middle_is_narrative() {
        assert!(matches!(
            classify_line("I will now use [TOOL] search_web: x"),
            Some(ResponseLine::Narrative(_))
        ));
    }

    #[test]
    fn parse_response_keeps_order_and_drops_blanks() {
        let lines = parse_response("[TOOL] a: 1\n\nmiddle\n[TOOL] b: 2\n");
        assert_eq!(lines.len(), 3);
        assert!(matches!(&lines[0], ResponseLine::ToolCall { name, .. } if name == "a"));
        assert_eq!(lines[1], ResponseLine::Narrative("middle".into()));
        assert!(matches!(&lines[2], ResponseLine::ToolCall { name, .. } if name == "b"));
    }

    #[test]
    fn remember_directives() {
        assert!(is_remember_directive("记住 用户喜欢简洁的回答"));
        assert!(is_remember_directive("Remember: launch is in May"));
        assert!(is_remember_directive("REMEMBER the budget"));
        assert!(is_remember_directive("请记住：预算一万"));
        assert!(is_remember_directive("note 记住:x"));
        assert!(!is_remember_directive("I will not forget"));
        assert!(!is_remember_directive("rem"));
        assert!(!is_remember_directive("Please remember this"));
    }
}
