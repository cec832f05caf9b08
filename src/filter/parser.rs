//! Filter parser for lead queries
//!
//! Turns command-line tokens into a [`FilterState`].
//!
//! # Grammar
//!
//! ```text
//! filter := token*
//! token  := priority=<p> | project=<name> | assigned=<ref> | source=<s> | <word>
//! ```
//!
//! Bare words are joined with spaces into the search text. Repeating a key
//! replaces the earlier value.

use crate::filter::evaluator::FilterState;
use crate::models::Priority;

/// Parse filter tokens into a FilterState
///
/// # Example
///
/// ```
/// use leadboard::filter::parse_filter;
///
/// let filters = parse_filter(&["priority=high".to_string(), "asha".to_string()]).unwrap();
/// assert_eq!(filters.search.as_deref(), Some("asha"));
/// ```
pub fn parse_filter(tokens: &[String]) -> Result<FilterState, String> {
    let mut filters = FilterState::default();
    let mut words: Vec<&str> = Vec::new();

    for token in tokens {
        let Some((key, value)) = token.split_once('=') else {
            words.push(token.as_str());
            continue;
        };
        let value = value.trim();
        match key.to_lowercase().as_str() {
            "priority" => {
                let priority = Priority::from_str(value).ok_or_else(|| {
                    format!(
                        "Invalid priority: '{}'. Valid priorities: critical, high, medium, low",
                        value
                    )
                })?;
                filters.priority = Some(priority);
            }
            "project" => filters.project_ref = non_empty(value),
            "assigned" | "assignee" => filters.assigned_to_ref = non_empty(value),
            "source" => filters.source = non_empty(value),
            "search" => words.push(value),
            _ => return Err(format!("Invalid filter token: {}", token)),
        }
    }

    let search = words.join(" ");
    filters.search = non_empty(search.trim());
    Ok(filters)
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_tokens() {
        let filters = parse_filter(&[]).unwrap();
        assert!(filters.is_empty());
    }

    #[test]
    fn test_keyed_tokens() {
        let filters = parse_filter(&tokens(&[
            "priority=Critical",
            "project=skyline",
            "assigned=priya",
            "source=website",
        ]))
        .unwrap();
        assert_eq!(filters.priority, Some(Priority::Critical));
        assert_eq!(filters.project_ref.as_deref(), Some("skyline"));
        assert_eq!(filters.assigned_to_ref.as_deref(), Some("priya"));
        assert_eq!(filters.source.as_deref(), Some("website"));
        assert!(filters.search.is_none());
    }

    #[test]
    fn test_bare_words_become_search() {
        let filters = parse_filter(&tokens(&["asha", "rao", "priority=low"])).unwrap();
        assert_eq!(filters.search.as_deref(), Some("asha rao"));
        assert_eq!(filters.priority, Some(Priority::Low));
    }

    #[test]
    fn test_empty_value_clears_constraint() {
        let filters = parse_filter(&tokens(&["project=skyline", "project="])).unwrap();
        assert!(filters.project_ref.is_none());
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(parse_filter(&tokens(&["priority=urgent"])).is_err());
        let err = parse_filter(&tokens(&["stage=new"])).unwrap_err();
        assert!(err.contains("Invalid filter token"));
    }
}
