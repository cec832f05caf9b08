// Fuzzy matching for "did you mean" suggestions on stage names

/// Calculate Levenshtein distance between two strings
/// Returns the minimum number of single-character edits (insertions, deletions, substitutions)
/// needed to transform one string into another
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    if s1_chars.is_empty() {
        return s2_chars.len();
    }
    if s2_chars.is_empty() {
        return s1_chars.len();
    }

    // Single rolling row of the edit matrix
    let mut prev: Vec<usize> = (0..=s2_chars.len()).collect();
    let mut curr = vec![0; s2_chars.len() + 1];

    for (i, a) in s1_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, b) in s2_chars.iter().enumerate() {
            let cost = if a == b { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1)        // deletion
                .min(curr[j] + 1)                  // insertion
                .min(prev[j] + cost);              // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[s2_chars.len()]
}

/// Find candidates close to `search`.
/// Returns up to 3 matches sorted by distance (closest first), then name.
/// Candidates that start with the search text always qualify.
pub fn find_near_matches(search: &str, candidates: &[&str], max_distance: usize) -> Vec<(String, usize)> {
    let search_lower = search.to_lowercase();
    let mut matches: Vec<(String, usize)> = Vec::new();

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();
        let distance = levenshtein_distance(&search_lower, &candidate_lower);
        if distance <= max_distance {
            matches.push((candidate.to_string(), distance));
        } else if !search_lower.is_empty() && candidate_lower.starts_with(&search_lower) {
            matches.push((candidate.to_string(), max_distance));
        }
    }

    matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    matches.into_iter().take(3).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("same", "same"), 0);
        assert_eq!(levenshtein_distance("booked", "booekd"), 2);
    }

    #[test]
    fn test_find_near_matches() {
        let stages = ["new", "contacted", "qualified", "negotiating", "booked", "lost"];

        let matches = find_near_matches("contacted", &stages, 2);
        assert_eq!(matches[0], ("contacted".to_string(), 0));

        let matches = find_near_matches("qualifed", &stages, 2);
        assert_eq!(matches[0].0, "qualified");

        let matches = find_near_matches("nego", &stages, 2);
        assert_eq!(matches[0].0, "negotiating");

        assert!(find_near_matches("warehouse", &stages, 2).is_empty());
    }

    #[test]
    fn test_matches_are_case_insensitive() {
        let matches = find_near_matches("BOOKD", &["booked", "lost"], 2);
        assert_eq!(matches, vec![("booked".to_string(), 1)]);
    }
}
