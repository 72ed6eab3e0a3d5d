//! Merging and rendering of results gathered from several providers or
//! knowledge bases.

use std::cmp::Ordering;

use super::search::SearchResult;

const RESULT_SEPARATOR: &str = "\n\n---\n\n";

/// Options for rendering results as text
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Omit raw metadata; used when results feed a prompt rather than a UI
    pub compact: bool,
}

impl FormatOptions {
    pub fn compact() -> Self {
        Self { compact: true }
    }
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

/// Sort by score, highest first.
///
/// The sort is stable: equal scores keep their incoming order, which for
/// merged lists is source order then original order. NaN scores sink.
pub fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        rank_key(b.score)
            .partial_cmp(&rank_key(a.score))
            .unwrap_or(Ordering::Equal)
    });
}

/// Concatenate result lists in source order, rank globally, keep the first `limit`
pub fn merge_results<I>(sources: I, limit: usize) -> Vec<SearchResult>
where
    I: IntoIterator<Item = Vec<SearchResult>>,
{
    let mut merged: Vec<SearchResult> = sources.into_iter().flatten().collect();
    sort_by_score(&mut merged);
    merged.truncate(limit);
    merged
}

/// Render results as text blocks separated by `---`
pub fn format_results(results: &[SearchResult], options: FormatOptions) -> String {
    if results.is_empty() {
        return "No relevant results found.".to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, result)| format_result(i + 1, result, options))
        .collect::<Vec<_>>()
        .join(RESULT_SEPARATOR)
}

fn format_result(position: usize, result: &SearchResult, options: FormatOptions) -> String {
    let mut block = format!(
        "[{}] {} (score: {:.3})\n{}",
        position,
        result.id,
        result.score,
        result.content.trim()
    );

    if !options.compact && !result.metadata.is_empty() {
        let metadata = serde_json::Value::Object(result.metadata.clone());
        block.push_str("\nMetadata: ");
        block.push_str(&metadata.to_string());
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f32) -> SearchResult {
        SearchResult::new(id, format!("content of {}", id), score)
    }

    fn scores(results: &[SearchResult]) -> Vec<f32> {
        results.iter().map(|r| r.score).collect()
    }

    #[test]
    fn test_merge_orders_across_sources() {
        let kb1 = vec![hit("a", 0.2), hit("b", 0.9), hit("c", 0.5)];
        let kb2 = vec![hit("d", 0.7)];

        let merged = merge_results(vec![kb1, kb2], 3);

        assert_eq!(scores(&merged), vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn test_merge_ties_keep_source_order() {
        let first = vec![hit("a", 0.5), hit("b", 0.5)];
        let second = vec![hit("c", 0.5)];

        let merged = merge_results(vec![first, second], 10);

        let ids: Vec<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_limit_larger_than_input() {
        let merged = merge_results(vec![vec![hit("a", 0.1)]], 5);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_nan_scores_sink() {
        let mut results = vec![hit("nan", f32::NAN), hit("low", 0.1)];
        sort_by_score(&mut results);
        assert_eq!(results[0].id, "low");
    }

    #[test]
    fn test_format_full_includes_metadata() {
        let results = vec![hit("KB:a#content", 0.75).with_metadata("name", "Doc".into())];

        let text = format_results(&results, FormatOptions::default());

        assert!(text.starts_with("[1] KB:a#content (score: 0.750)"));
        assert!(text.contains("content of KB:a#content"));
        assert!(text.contains("Metadata: {\"name\":\"Doc\"}"));
    }

    #[test]
    fn test_format_compact_omits_metadata() {
        let results = vec![
            hit("x", 0.9).with_metadata("name", "Doc".into()),
            hit("y", 0.4),
        ];

        let text = format_results(&results, FormatOptions::compact());

        assert!(!text.contains("Metadata"));
        assert_eq!(text.matches("---").count(), 1);
        assert!(text.contains("[2] y (score: 0.400)"));
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(
            format_results(&[], FormatOptions::compact()),
            "No relevant results found."
        );
    }
}
