//! Question-answering pipeline: derive search terms, fan out grep
//! searches, optionally refine and expand the evidence, then ask the
//! model for the final answer.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::errors::QaError;
use crate::llm::ChatModel;
use crate::models::{Answer, MatchRecord};
use crate::search::expand::expand_context;
use crate::search::repo::search_repo;

pub struct QaPipeline {
    root: PathBuf,
    search: SearchConfig,
    model: Arc<dyn ChatModel>,
}

impl QaPipeline {
    pub fn new(root: PathBuf, search: SearchConfig, model: Arc<dyn ChatModel>) -> Self {
        Self {
            root,
            search,
            model,
        }
    }

    /// Run the full pipeline for one question. Only a failed answer
    /// call is fatal; everything before it degrades (empty evidence
    /// still produces an answer, a bad refinement falls back to the
    /// unrefined set with a diagnostic).
    pub async fn answer(&self, question: &str) -> Result<Answer, QaError> {
        tracing::info!("question received: {question:?}");

        let terms = self.extract_terms(question).await;
        tracing::info!("extracted {} search terms: {terms:?}", terms.len());

        let mut results = Vec::new();
        for term in &terms {
            results.extend(search_repo(term, &self.root, &self.search).await);
        }
        if self.search.dedupe {
            dedupe_records(&mut results);
        }
        tracing::info!(
            "search produced {} records: {:?}",
            results.len(),
            results.iter().map(|r| r.file.as_str()).collect::<Vec<_>>()
        );

        let mut diagnostic = None;
        if self.search.refine && !results.is_empty() {
            match self.refine(question, &results).await {
                Ok(refined) => {
                    tracing::info!("refinement kept {} of {} records", refined.len(), results.len());
                    results = refined;
                }
                Err(e) => {
                    // Reported, not silently dropped: the caller learns
                    // the evidence set was left unrefined.
                    tracing::warn!("refinement aborted: {e}");
                    diagnostic = Some(e.to_string());
                }
            }
        }

        let expanded = if self.search.expand_top_hit {
            match results.first() {
                Some(top) => expand_context(&terms, top, &self.search).await,
                None => None,
            }
        } else {
            None
        };

        let prompt = build_answer_prompt(question, &results, expanded.as_deref());
        let text = self.model.complete(&prompt).await?;
        tracing::info!("answer produced ({} chars)", text.len());

        Ok(Answer { text, diagnostic })
    }

    /// Derive search terms: ask the model for literal grep-able terms,
    /// one per line; fall back to whitespace tokenization when the
    /// model is disabled or unreachable.
    async fn extract_terms(&self, question: &str) -> Vec<String> {
        if self.search.use_llm_terms {
            match self.model.complete(&build_terms_prompt(question)).await {
                Ok(response) => {
                    let terms = parse_term_lines(&response);
                    if !terms.is_empty() {
                        return terms;
                    }
                    tracing::warn!("model returned no usable terms, falling back to tokenization");
                }
                Err(e) => {
                    tracing::warn!("term extraction via model failed ({e}), falling back");
                }
            }
        }
        whitespace_terms(question)
    }

    /// Ask the model to pick the most relevant records by 1-based
    /// index. A selection that does not parse cleanly is an error: the
    /// caller falls back to the unrefined set rather than guessing.
    async fn refine(
        &self,
        question: &str,
        results: &[MatchRecord],
    ) -> Result<Vec<MatchRecord>, QaError> {
        let prompt = build_refine_prompt(question, results);
        let response = self.model.complete(&prompt).await?;
        let indices = parse_selection(&response, results.len())?;
        Ok(indices
            .into_iter()
            .map(|i| results[i - 1].clone())
            .collect())
    }
}

fn build_terms_prompt(question: &str) -> String {
    format!(
        "To answer the user's question we will first extract good search terms. \
         These terms will be grepped for literally in a large codebase, so they must \
         be specific and literal.\n\
         Return each search term on its own line with no other text. Do not create \
         redundant terms and do not invent things the user did not mention. \
         If there is only one obvious term, return just that one term.\n\n\
         User's question: {question}"
    )
}

fn build_refine_prompt(question: &str, results: &[MatchRecord]) -> String {
    use std::fmt::Write;

    let mut prompt = String::from(
        "Below are numbered search results from a codebase, followed by a question. \
         Reply with ONLY the numbers of the results most relevant to the question, \
         comma-separated (for example: 1,3,4).\n\n",
    );
    for (i, record) in results.iter().enumerate() {
        let _ = write!(prompt, "{}. {}\n{}\n\n", i + 1, record.file, record.content);
    }
    let _ = write!(prompt, "Question: {question}");
    prompt
}

fn build_answer_prompt(
    question: &str,
    results: &[MatchRecord],
    expanded: Option<&str>,
) -> String {
    use std::fmt::Write;

    let mut prompt = String::from("Given the following search results, answer the question.\n\n");
    if results.is_empty() {
        prompt.push_str("(No matches were found in the repository for this question.)\n\n");
    }
    for record in results {
        let _ = write!(prompt, "--- {} ---\n{}\n\n", record.file, record.content);
    }
    if let Some(extra) = expanded {
        let _ = write!(prompt, "--- additional context around the top result ---\n{extra}\n\n");
    }
    let _ = write!(prompt, "Question: {question}");
    prompt
}

/// Non-empty trimmed lines of a model response, one term each.
fn parse_term_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Naive fallback strategy: whitespace tokens of the question.
fn whitespace_terms(question: &str) -> Vec<String> {
    question.split_whitespace().map(str::to_string).collect()
}

/// Parse a comma-separated list of 1-based indices from model text.
/// Strict by design: the model's reply is untrusted input, and a
/// silently mangled selection would change which evidence reaches the
/// answer.
fn parse_selection(response: &str, len: usize) -> Result<Vec<usize>, QaError> {
    let mut indices = Vec::new();
    for part in response.trim().split(',') {
        let part = part.trim();
        let index: usize = part
            .parse()
            .map_err(|_| QaError::Selection(format!("not a number: {part:?}")))?;
        if index == 0 || index > len {
            return Err(QaError::Selection(format!(
                "index {index} out of range 1..={len}"
            )));
        }
        indices.push(index);
    }
    Ok(indices)
}

/// Drop records repeating an earlier (file, content) pair; first
/// occurrence (highest priority) wins.
fn dedupe_records(records: &mut Vec<MatchRecord>) {
    let mut seen = std::collections::HashSet::new();
    records.retain(|r| seen.insert((r.file.clone(), r.content.clone())));
}
