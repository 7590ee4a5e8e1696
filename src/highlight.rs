use std::collections::HashSet;
use std::ops::Range;

use regex::{Regex, RegexBuilder};

pub fn build_highlight_regex(tokens: &[String]) -> Option<Regex> {
    if tokens.is_empty() {
        return None;
    }
    let mut unique = Vec::new();
    let mut seen = HashSet::new();
    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let lowered = token.to_lowercase();
        if seen.insert(lowered) {
            unique.push(token.clone());
        }
    }
    if unique.is_empty() {
        return None;
    }
    unique.sort_by(|a, b| b.len().cmp(&a.len()));
    let pattern = unique
        .into_iter()
        .map(|token| regex::escape(&token))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Byte ranges of `text` the row renderer should emphasise.
pub fn match_ranges(regex: &Regex, text: &str) -> Vec<Range<usize>> {
    regex.find_iter(text).map(|found| found.range()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_longer_tokens_first() {
        let regex = build_highlight_regex(&["te".into(), "test".into()]).expect("regex");
        let matches: Vec<_> = regex.find_iter("test1").map(|m| m.as_str()).collect();
        assert_eq!(matches, vec!["test"]);
    }

    #[test]
    fn deduplicates_case_insensitive_tokens() {
        let regex =
            build_highlight_regex(&["Trip".into(), "trip".into(), "TRIP".into()]).expect("regex");
        assert_eq!(regex.as_str(), "Trip");
    }

    #[test]
    fn ranges_cover_every_occurrence() {
        let regex = build_highlight_regex(&["te".into()]).expect("regex");
        assert_eq!(match_ranges(&regex, "Test te1"), vec![0..2, 5..7]);
    }

    #[test]
    fn metacharacters_are_escaped() {
        let regex = build_highlight_regex(&["a.b".into()]).expect("regex");
        assert!(match_ranges(&regex, "axb").is_empty());
        assert_eq!(match_ranges(&regex, "xa.b"), vec![1..4]);
    }
}
