//! Single grep invocation against one directory or file.

use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;

use crate::models::MatchRecord;
use crate::search::parse::parse_grep_output;

/// Prefix used for transient exclusion files so leftovers are easy to
/// spot (there should never be any: the file is removed on drop).
pub const EXCLUDE_FILE_PREFIX: &str = "repo-qa-exclude-";

/// One grep invocation. Immutable once built; `run` consumes nothing
/// and may be called repeatedly.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub pattern: String,
    pub root: PathBuf,
    pub context_before: usize,
    pub context_after: usize,
    pub max_matches: usize,
    pub ignore_case: bool,
    pub extended_regex: bool,
    /// Glob patterns passed to grep via a transient `--exclude-from` file
    pub exclude_patterns: Vec<String>,
}

impl SearchQuery {
    pub fn new(pattern: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            pattern: pattern.into(),
            root: root.into(),
            context_before: 10,
            context_after: 10,
            max_matches: 5,
            ignore_case: true,
            extended_regex: false,
            exclude_patterns: Vec::new(),
        }
    }
}

/// Run a query and return parsed records, capped at `max_matches`.
///
/// Failure policy: grep exiting 1 means no matches and yields an empty
/// vec; any other non-zero exit, a spawn failure, or a timeout is
/// logged and also yields an empty vec, so one broken directory search
/// cannot abort the surrounding question.
pub async fn run_grep(query: &SearchQuery, timeout: Duration) -> Vec<MatchRecord> {
    match run_grep_inner(query, timeout).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(
                "grep failed for pattern {:?} under {}: {e:#}",
                query.pattern,
                query.root.display()
            );
            Vec::new()
        }
    }
}

async fn run_grep_inner(query: &SearchQuery, timeout: Duration) -> Result<Vec<MatchRecord>> {
    // The exclusion file lives exactly as long as this invocation:
    // NamedTempFile removes it on drop, on every exit path.
    let exclude_file = write_exclude_file(&query.exclude_patterns)?;

    let mut cmd = Command::new("grep");
    cmd.arg("-r");
    if query.ignore_case {
        cmd.arg("-i");
    }
    if query.extended_regex {
        cmd.arg("-E");
    }
    cmd.arg("-B").arg(query.context_before.to_string());
    cmd.arg("-A").arg(query.context_after.to_string());
    cmd.arg("-m").arg(query.max_matches.to_string());
    cmd.arg("--with-filename");
    cmd.arg("--color=never");
    if let Some(ref file) = exclude_file {
        cmd.arg(format!("--exclude-from={}", file.path().display()));
    }
    // GNU grep matches exclusion globs against base names only, so a
    // `subtree/*` line in the file never skips the subtree itself.
    // Derive an --exclude-dir for each such pattern to make subtree
    // exclusion hold.
    for pattern in &query.exclude_patterns {
        if let Some(stem) = pattern.strip_suffix("/*") {
            if let Some(base) = stem.rsplit('/').next() {
                cmd.arg(format!("--exclude-dir={base}"));
            }
        }
    }
    // The pattern is model- or tokenizer-derived and untrusted; pass it
    // via -e so a leading dash can never be parsed as a grep option.
    cmd.arg("-e").arg(&query.pattern);
    cmd.arg(&query.root);
    cmd.stdin(Stdio::null()).kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| anyhow::anyhow!("grep timed out after {}s", timeout.as_secs()))?
        .context("failed to launch grep")?;

    // Exit 1 = no matches, not an error.
    match output.status.code() {
        Some(0) | Some(1) => {}
        _ => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("grep exited with {}: {}", output.status, stderr.trim());
        }
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut records = parse_grep_output(&stdout);
    // grep's -m cap is per file; enforce the overall cap on parsed records.
    records.truncate(query.max_matches);
    Ok(records)
}

/// Materialize exclusion globs into a uniquely-named temp file, or None
/// when there is nothing to exclude.
fn write_exclude_file(patterns: &[String]) -> Result<Option<tempfile::NamedTempFile>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut file = tempfile::Builder::new()
        .prefix(EXCLUDE_FILE_PREFIX)
        .suffix(".txt")
        .tempfile()
        .context("failed to create exclusion file")?;
    for pattern in patterns {
        writeln!(file, "{pattern}").context("failed to write exclusion file")?;
    }
    file.flush()?;
    Ok(Some(file))
}
