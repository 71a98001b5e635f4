//! Tokenizer and ranking shared by the bundled index backends
//!
//! Tokens are lowercased runs of alphanumeric characters. An entry scores one
//! point per distinct query token that equals, or is a prefix of, one of the
//! entry's tokens.

use crate::search::SearchResult;
use std::collections::BTreeSet;

/// Split text into lowercase alphanumeric tokens, de-duplicated and sorted
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Relevance of `text` for the given query tokens
pub fn score(query_tokens: &BTreeSet<String>, text: &str) -> usize {
    let entry_tokens = tokenize(text);
    query_tokens
        .iter()
        .filter(|q| entry_tokens.iter().any(|t| t.starts_with(q.as_str())))
        .count()
}

/// Score, filter and order candidate entries for `query`
pub fn rank<I>(query: &str, candidates: I) -> Vec<SearchResult>
where
    I: IntoIterator<Item = SearchResult>,
{
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, SearchResult)> = candidates
        .into_iter()
        .map(|r| (score(&query_tokens, &r.text), r))
        .filter(|(s, _)| *s > 0)
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.cmp(sa)
            .then_with(|| b.weight.cmp(&a.weight))
            .then_with(|| a.id.cmp(&b.id))
    });

    scored.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, text: &str, weight: u32) -> SearchResult {
        SearchResult {
            id,
            text: text.to_string(),
            kind: "snapshot".to_string(),
            uid: format!("uid-{}", id),
            org_id: 1,
            weight,
        }
    }

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        let tokens = tokenize("CPU usage / Node-01");
        let expected: BTreeSet<String> = ["cpu", "usage", "node", "01"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_prefix_match_counts() {
        let q = tokenize("lat");
        assert_eq!(score(&q, "Latency p99"), 1);
        assert_eq!(score(&q, "throughput"), 0);
    }

    #[test]
    fn test_rank_orders_by_score_then_weight_then_id() {
        let results = rank(
            "cpu memory",
            vec![
                entry(1, "cpu", 1),
                entry(2, "cpu memory", 1),
                entry(3, "memory", 5),
                entry(4, "disk", 9),
                entry(5, "memory", 5),
            ],
        );
        let ids: Vec<i64> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 5, 1]);
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        assert!(rank("  --  ", vec![entry(1, "cpu", 1)]).is_empty());
    }
}
