//! Sliding-window management for session history.

use super::Exchange;

/// Append an exchange and trim the history to at most `max_size` entries,
/// dropping the oldest entries first.
///
/// Pure function; `max_size == 0` yields an empty history.
pub fn append_and_trim(
    mut history: Vec<Exchange>,
    new_exchange: Exchange,
    max_size: usize,
) -> Vec<Exchange> {
    history.push(new_exchange);
    if history.len() > max_size {
        history.drain(..history.len() - max_size);
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(n: usize) -> Exchange {
        Exchange::new(format!("q{}", n), format!("a{}", n))
    }

    #[test]
    fn test_append_below_window() {
        let history = append_and_trim(Vec::new(), exchange(1), 5);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "q1");
    }

    #[test]
    fn test_window_invariant_keeps_most_recent() {
        let mut history = Vec::new();
        for n in 1..=7 {
            history = append_and_trim(history, exchange(n), 5);
            assert_eq!(history.len(), n.min(5));
        }

        let queries: Vec<&str> = history.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, ["q3", "q4", "q5", "q6", "q7"]);
    }

    #[test]
    fn test_zero_window_yields_empty() {
        let history = append_and_trim(vec![exchange(1)], exchange(2), 0);
        assert!(history.is_empty());
    }

    #[test]
    fn test_window_of_one() {
        let history = append_and_trim(vec![exchange(1)], exchange(2), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "q2");
    }
}
