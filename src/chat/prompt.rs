//! Prompt composition from session history.

use super::Exchange;

/// Serialize prior exchanges plus the new query into a single prompt.
///
/// Each exchange becomes a `User:` line followed by a `Bot:` line, in
/// chronological order, with the new query as the final `User:` line. The
/// exact framing is a contract with the completion backend, which receives
/// concatenated text rather than structured messages.
pub fn compose(history: &[Exchange], query: &str) -> String {
    let mut prompt = String::new();
    for exchange in history {
        prompt.push_str("User: ");
        prompt.push_str(&exchange.query);
        prompt.push_str("\nBot: ");
        prompt.push_str(&exchange.answer);
        prompt.push('\n');
    }
    prompt.push_str("User: ");
    prompt.push_str(query);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_is_single_query_line() {
        assert_eq!(compose(&[], "Q"), "User: Q");
    }

    #[test]
    fn test_history_lines_precede_query_in_order() {
        let history = vec![Exchange::new("A", "B")];
        let prompt = compose(&history, "Q");
        assert_eq!(prompt, "User: A\nBot: B\nUser: Q");
    }

    #[test]
    fn test_multiple_exchanges_chronological() {
        let history = vec![
            Exchange::new("first question", "first answer"),
            Exchange::new("second question", "second answer"),
        ];
        let prompt = compose(&history, "third question");

        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(
            lines,
            [
                "User: first question",
                "Bot: first answer",
                "User: second question",
                "Bot: second answer",
                "User: third question",
            ]
        );
    }
}
