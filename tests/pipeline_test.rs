//! End-to-end tests for the question-answering pipeline.
//!
//! These exercise term extraction, tiered search, refinement, context
//! expansion, and answer prompt construction against a temporary
//! checkout on disk, with scripted fake models standing in for the LLM.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use repo_qa::config::SearchConfig;
use repo_qa::errors::QaError;
use repo_qa::llm::ChatModel;
use repo_qa::qa::QaPipeline;

/// Fake model that pops scripted replies in order and records every
/// prompt it is handed.
struct ScriptedModel {
    replies: Mutex<Vec<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .rev()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, QaError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop() {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(QaError::Service(anyhow::anyhow!(msg))),
            None => panic!("fake model ran out of scripted replies"),
        }
    }
}

fn write_file(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A small checkout: a curated report, a demo, and bulk sources.
fn sample_checkout() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "tech-reports/mem.md",
        "# Memory subsystem\n\nThe memory allocator hands out 4 KiB pages\nfrom a per-core free list.\n",
    );
    write_file(
        dir.path(),
        "models/demos/alloc_demo.py",
        "# demo of the memory allocator API\nbuf = allocate(4096)\n",
    );
    write_file(
        dir.path(),
        "src/allocator.c",
        "/* the memory allocator implementation */\nvoid *alloc_page(void) { return pop(freelist); }\n",
    );
    write_file(dir.path(), "src/unrelated.c", "int add(int a, int b) { return a + b; }\n");
    dir
}

fn pipeline(root: &Path, search: SearchConfig, model: Arc<ScriptedModel>) -> QaPipeline {
    QaPipeline::new(root.to_path_buf(), search, model)
}

fn quick_search() -> SearchConfig {
    SearchConfig {
        context_before: 2,
        context_after: 2,
        ..SearchConfig::default()
    }
}

#[tokio::test]
async fn test_scenario_memory_allocator_prioritizes_report() {
    let checkout = sample_checkout();
    let model = ScriptedModel::new(vec![
        Ok("memory allocator"),                         // term extraction
        Ok("It hands out 4 KiB pages per core."),       // answer
    ]);

    let answer = pipeline(checkout.path(), quick_search(), model.clone())
        .answer("How does the memory allocator work?")
        .await
        .unwrap();

    assert!(!answer.text.is_empty());
    assert!(answer.diagnostic.is_none());

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    // The answer prompt embeds evidence in tier order: the curated
    // report must precede anything from src/.
    let answer_prompt = &prompts[1];
    let report_pos = answer_prompt.find("tech-reports").expect("report missing");
    let general_pos = answer_prompt.find("src/allocator.c").expect("source missing");
    assert!(report_pos < general_pos, "report tier not first in prompt");
    assert!(answer_prompt.contains("How does the memory allocator work?"));
}

#[tokio::test]
async fn test_empty_search_still_reaches_an_answer() {
    let checkout = sample_checkout();
    let model = ScriptedModel::new(vec![
        Ok("quantum_flux_capacitor"), // term that matches nothing
        Ok("I found no evidence of that in the repository."),
    ]);

    let answer = pipeline(checkout.path(), quick_search(), model.clone())
        .answer("Is there a quantum flux capacitor?")
        .await
        .unwrap();

    assert!(!answer.text.is_empty());
    let prompts = model.prompts();
    assert!(prompts[1].contains("No matches were found"));
}

#[tokio::test]
async fn test_term_extraction_falls_back_when_model_fails() {
    let checkout = sample_checkout();
    let model = ScriptedModel::new(vec![
        Err("rate limited"),              // term extraction fails
        Ok("Answer from fallback terms"), // answer still happens
    ]);

    let answer = pipeline(checkout.path(), quick_search(), model.clone())
        .answer("allocator")
        .await
        .unwrap();

    assert_eq!(answer.text, "Answer from fallback terms");
    // Whitespace fallback searched for "allocator" and found evidence
    assert!(model.prompts()[1].contains("tech-reports"));
}

#[tokio::test]
async fn test_refinement_narrows_the_evidence() {
    let checkout = sample_checkout();
    let mut search = quick_search();
    search.refine = true;
    let model = ScriptedModel::new(vec![
        Ok("memory allocator"), // terms
        Ok("2"),                // refinement: keep only the second record
        Ok("refined answer"),   // answer
    ]);

    let answer = pipeline(checkout.path(), search, model.clone())
        .answer("How does the memory allocator work?")
        .await
        .unwrap();

    assert_eq!(answer.text, "refined answer");
    assert!(answer.diagnostic.is_none());

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 3);
    // Refinement prompt enumerates records 1-based
    assert!(prompts[1].contains("1. "));
    // The record kept is the demo (tier 2), so the answer prompt must
    // not carry the report anymore
    assert!(prompts[2].contains("models/demos"));
    assert!(!prompts[2].contains("tech-reports"));
}

#[tokio::test]
async fn test_malformed_selection_falls_back_with_diagnostic() {
    let checkout = sample_checkout();
    let mut search = quick_search();
    search.refine = true;
    let model = ScriptedModel::new(vec![
        Ok("memory allocator"),
        Ok("the first and third ones look good"), // unparsable selection
        Ok("answer over unrefined set"),
    ]);

    let answer = pipeline(checkout.path(), search, model.clone())
        .answer("How does the memory allocator work?")
        .await
        .unwrap();

    assert_eq!(answer.text, "answer over unrefined set");
    let diagnostic = answer.diagnostic.expect("diagnostic missing");
    assert!(diagnostic.contains("invalid result selection"));
    // Unrefined set: the report is still in the answer prompt
    assert!(model.prompts()[2].contains("tech-reports"));
}

#[tokio::test]
async fn test_out_of_range_selection_is_reported() {
    let checkout = sample_checkout();
    let mut search = quick_search();
    search.refine = true;
    let model = ScriptedModel::new(vec![
        Ok("memory allocator"),
        Ok("99"), // far more indices than records
        Ok("answer"),
    ]);

    let answer = pipeline(checkout.path(), search, model.clone())
        .answer("How does the memory allocator work?")
        .await
        .unwrap();

    assert!(answer.diagnostic.unwrap().contains("out of range"));
}

#[tokio::test]
async fn test_dedupe_collapses_repeated_terms() {
    let checkout = sample_checkout();

    // Same term twice: without dedupe every record appears twice
    let model = ScriptedModel::new(vec![
        Ok("memory allocator\nmemory allocator"),
        Ok("answer"),
    ]);
    let answer = pipeline(checkout.path(), quick_search(), model.clone())
        .answer("How does the memory allocator work?")
        .await
        .unwrap();
    assert!(!answer.text.is_empty());
    let duplicated = model.prompts()[1].matches("tech-reports/mem.md").count();
    assert_eq!(duplicated, 2);

    // With dedupe the repeat disappears
    let mut search = quick_search();
    search.dedupe = true;
    let model = ScriptedModel::new(vec![
        Ok("memory allocator\nmemory allocator"),
        Ok("answer"),
    ]);
    pipeline(checkout.path(), search, model.clone())
        .answer("How does the memory allocator work?")
        .await
        .unwrap();
    let deduped = model.prompts()[1].matches("tech-reports/mem.md").count();
    assert_eq!(deduped, 1);
}

#[tokio::test]
async fn test_expand_top_hit_enriches_the_prompt() {
    let checkout = sample_checkout();
    // Give the report enough body that the expanded window adds lines
    // the first pass (2 lines of context) could not see.
    let mut lines: Vec<String> = (0..30).map(|i| format!("background {i}")).collect();
    lines[15] = "the memory allocator uses a buddy system".to_string();
    write_file(
        checkout.path(),
        "tech-reports/mem.md",
        &(lines.join("\n") + "\n"),
    );

    let mut search = quick_search();
    search.expand_top_hit = true;
    let model = ScriptedModel::new(vec![Ok("memory allocator"), Ok("answer")]);

    pipeline(checkout.path(), search, model.clone())
        .answer("How does the memory allocator work?")
        .await
        .unwrap();

    let answer_prompt = &model.prompts()[1];
    assert!(answer_prompt.contains("additional context around the top result"));
    // The 20-line window reaches lines the 2-line window missed
    assert!(answer_prompt.contains("background 0"));
}

#[tokio::test]
async fn test_answer_failure_propagates_as_service_error() {
    let checkout = sample_checkout();
    let model = ScriptedModel::new(vec![
        Ok("memory allocator"),
        Err("connection refused"), // the answer call itself fails
    ]);

    let err = pipeline(checkout.path(), quick_search(), model)
        .answer("How does the memory allocator work?")
        .await
        .unwrap_err();

    assert!(matches!(err, QaError::Service(_)));
}
