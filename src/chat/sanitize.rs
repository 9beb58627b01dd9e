//! Sanitization of raw completion output.

use crate::retrieval::Completion;
use regex::Regex;
use std::sync::LazyLock;

/// Matches a complete reasoning span, non-greedy, across newlines.
/// An unterminated opener is deliberately left untouched.
static THINK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));

/// Clean a raw completion into plain answer text.
///
/// Unwraps an envelope exactly once, removes every `<think>...</think>`
/// span, and trims surrounding whitespace. Idempotent.
pub fn sanitize(raw: Completion) -> String {
    let text = match raw {
        Completion::Text(text) => text,
        Completion::Enveloped { result } => result,
    };

    THINK_SPAN.replace_all(&text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_trims_whitespace() {
        assert_eq!(sanitize(Completion::Text("  plain answer \n".into())), "plain answer");
    }

    #[test]
    fn test_removes_think_span() {
        let out = sanitize(Completion::Text(
            "<think>internal</think>The answer is 42.".into(),
        ));
        assert_eq!(out, "The answer is 42.");
    }

    #[test]
    fn test_removes_multiline_and_multiple_spans() {
        let out = sanitize(Completion::Text(
            "<think>line one\nline two</think>Leo.<think>more</think> DiCaprio.".into(),
        ));
        assert_eq!(out, "Leo. DiCaprio.");
    }

    #[test]
    fn test_unwrap_once() {
        let out = sanitize(Completion::Enveloped {
            result: "<think>x</think>final".into(),
        });
        assert_eq!(out, "final");
    }

    #[test]
    fn test_unterminated_opener_left_untouched() {
        let out = sanitize(Completion::Text("<think>never closed... answer".into()));
        assert_eq!(out, "<think>never closed... answer");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<think>internal</think>The answer is 42.",
            "no markers here",
            "  <think>a</think> <think>b</think> two spans  ",
        ];
        for input in inputs {
            let once = sanitize(Completion::Text(input.into()));
            let twice = sanitize(Completion::Text(once.clone()));
            assert_eq!(once, twice);
        }
    }
}
