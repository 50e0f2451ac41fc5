//! Priority-ordered search across the repository checkout.
//!
//! Curated subtrees (tech reports, demos) are far more likely to hold a
//! directly useful answer than the bulk of the tree, so they are
//! searched first, each with its own match cap, and the general tier
//! excludes them so its budget goes to everything else. Results keep
//! strict tier order; tiers are never interleaved.

use std::path::Path;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::models::MatchRecord;
use crate::search::grep::{run_grep, SearchQuery};

/// Search the checkout for one term. Tier order:
/// 1. each configured priority subtree, in order, capped per tier;
/// 2. the whole root minus those subtrees, same cap.
/// A missing subtree contributes nothing. Never fails: degraded tiers
/// come back empty.
pub async fn search_repo(term: &str, root: &Path, config: &SearchConfig) -> Vec<MatchRecord> {
    if !root.exists() {
        tracing::warn!("repository not found at {}", root.display());
        return Vec::new();
    }

    let timeout = Duration::from_secs(config.grep_timeout_secs);
    let mut results = Vec::new();

    for subdir in &config.priority_subdirs {
        let dir = root.join(subdir);
        if !dir.exists() {
            continue;
        }
        let query = tier_query(term, &dir, config);
        results.extend(run_grep(&query, timeout).await);
    }

    let mut general = tier_query(term, root, config);
    general.exclude_patterns = config
        .priority_subdirs
        .iter()
        .map(|s| format!("{s}/*"))
        .collect();
    results.extend(run_grep(&general, timeout).await);

    results
}

fn tier_query(term: &str, dir: &Path, config: &SearchConfig) -> SearchQuery {
    let mut query = SearchQuery::new(term, dir);
    query.context_before = config.context_before;
    query.context_after = config.context_after;
    query.max_matches = config.per_tier_cap;
    query
}
