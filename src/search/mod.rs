use regex::Regex;

use crate::highlight::build_highlight_regex;

/// Normalised search input. The lowered needle is kept alongside the raw text
/// so every title comparison does not have to re-fold the query.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    raw: String,
    needle: String,
}

impl SearchQuery {
    /// Returns `None` when the input would not narrow the list.
    pub fn parse(input: &str, trim_whitespace: bool) -> Option<Self> {
        let text = if trim_whitespace { input.trim() } else { input };
        if text.is_empty() {
            return None;
        }
        Some(Self {
            raw: text.to_string(),
            needle: text.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, title: &str) -> bool {
        title.to_lowercase().contains(&self.needle)
    }

    pub fn highlight_regex(&self) -> Option<Regex> {
        build_highlight_regex(std::slice::from_ref(&self.raw))
    }
}

/// Keeps the items whose title contains the query, preserving order.
pub fn filter_by_title<'a, T, F>(
    items: &'a [T],
    query: Option<&SearchQuery>,
    title: F,
) -> Vec<&'a T>
where
    F: Fn(&T) -> &str,
{
    match query {
        Some(query) => items.iter().filter(|item| query.matches(title(*item))).collect(),
        None => items.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLES: [&str; 4] = ["test1", "test2", "lol", "te1"];

    fn run(input: &str) -> Vec<&'static str> {
        let query = SearchQuery::parse(input, true);
        filter_by_title(&TITLES, query.as_ref(), |title| *title)
            .into_iter()
            .copied()
            .collect()
    }

    #[test]
    fn blank_input_does_not_filter() {
        assert!(SearchQuery::parse("", true).is_none());
        assert!(SearchQuery::parse("   ", true).is_none());
        assert_eq!(run(""), TITLES.to_vec());
    }

    #[test]
    fn whitespace_is_kept_when_trimming_disabled() {
        let query = SearchQuery::parse(" ", false).expect("query");
        assert!(query.matches("Road trip"));
        assert!(!query.matches("lol"));
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        assert_eq!(run("test"), vec!["test1", "test2"]);
        assert_eq!(run("TE"), vec!["test1", "test2", "te1"]);
        assert!(run("xyz").is_empty());
    }

    #[test]
    fn unicode_titles_fold_case() {
        let query = SearchQuery::parse("ÉTÉ", true).expect("query");
        assert!(query.matches("Vacances d'été"));
    }
}
