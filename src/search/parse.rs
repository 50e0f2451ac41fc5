//! Parser for grep's context-line output.
//!
//! With `-B`/`-A`, grep emits groups of lines separated by a line that
//! is exactly `--`. Every line in a group starts with the file path
//! followed by `:` on the matching line or `-` on a context line.
//! Rather than parsing each line on its own, a group's file path is
//! taken from the line with the earliest colon, and that prefix (plus
//! one separator character) is stripped from every line.

use crate::models::MatchRecord;

/// Convert raw grep output into match records, one per `--`-separated
/// group. Groups with no colon anywhere cannot be attributed to a file
/// and are dropped.
pub fn parse_grep_output(output: &str) -> Vec<MatchRecord> {
    let mut groups: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in output.lines() {
        if line.trim() == "--" {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        groups.push(current);
    }

    let mut records = Vec::new();
    for group in groups {
        // File prefix = everything before the earliest colon in the group.
        let mut prefix: Option<&str> = None;
        let mut min_colon = usize::MAX;
        for line in &group {
            if let Some(idx) = line.find(':') {
                if idx < min_colon {
                    min_colon = idx;
                    prefix = Some(&line[..idx]);
                }
            }
        }
        let Some(prefix) = prefix else {
            // Only context lines, no match line: unattributable.
            continue;
        };

        let content_lines: Vec<&str> = group
            .iter()
            .map(|line| match line.strip_prefix(prefix) {
                Some(rest) => {
                    // Drop the one separator character (':' or '-').
                    let mut chars = rest.chars();
                    chars.next();
                    chars.as_str()
                }
                // Malformed tool output: keep the line verbatim.
                None => line,
            })
            .collect();

        records.push(MatchRecord {
            file: prefix.to_string(),
            content: content_lines.join("\n"),
        });
    }

    records
}
