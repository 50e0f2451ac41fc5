//! Zoom in on a single promising hit: re-grep just that file with all
//! search terms as one OR-pattern and a wider context window.

use std::path::Path;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::models::MatchRecord;
use crate::search::grep::{run_grep, SearchQuery};

/// Re-search the hit's file with every term joined by `|` in extended
/// regex mode and `expand_context` lines each side. Returns the first
/// match's content, or None if the file is gone or nothing matches.
/// Skipping this step entirely only costs answer quality, never
/// correctness.
pub async fn expand_context(
    terms: &[String],
    hit: &MatchRecord,
    config: &SearchConfig,
) -> Option<String> {
    let file = Path::new(&hit.file);
    if !file.exists() {
        tracing::warn!("cannot expand context, file not found: {}", hit.file);
        return None;
    }

    let pattern = terms.join("|");
    let mut query = SearchQuery::new(pattern, file);
    query.context_before = config.expand_context;
    query.context_after = config.expand_context;
    query.extended_regex = true;

    let timeout = Duration::from_secs(config.grep_timeout_secs);
    let records = run_grep(&query, timeout).await;
    match records.into_iter().next() {
        Some(record) => Some(record.content),
        None => {
            tracing::debug!("no expanded match in {}", hit.file);
            None
        }
    }
}
