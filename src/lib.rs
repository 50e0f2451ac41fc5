//! # repo-qa
//!
//! A web service that answers natural-language questions about a
//! single checked-out repository by pairing literal grep searches with
//! an LLM.
//!
//! ## Pipeline
//!
//! ```text
//!   question
//!      │
//!      ▼
//!  ┌──────────────────┐   model strategy, whitespace fallback
//!  │ term extraction  │
//!  └────────┬─────────┘
//!           │ one search per term
//!           ▼
//!  ┌──────────────────┐   tier 1: tech-reports (cap 5)
//!  │ repository search │  tier 2: models/demos (cap 5)
//!  └────────┬─────────┘   tier 3: rest of tree, tiers excluded (cap 5)
//!           │ ordered, tiers never interleaved
//!           ▼
//!  ┌──────────────────┐   optional: model picks indices, strict parse
//!  │    refinement    │
//!  └────────┬─────────┘
//!           ▼
//!  ┌──────────────────┐   optional: re-grep top hit, 20-line window
//!  │ context expansion │
//!  └────────┬─────────┘
//!           ▼
//!  ┌──────────────────┐   evidence embedded verbatim in the prompt
//!  │      answer      │
//!  └──────────────────┘
//! ```
//!
//! ## Module overview
//!
//! - [`config`] - Environment-based configuration with search tuning knobs
//! - [`models`] - Shared data types: `MatchRecord`, ask request/response
//! - [`errors`] - The `QaError` taxonomy
//! - [`git`] - Checkout provisioning (clone / fast-forward update) via git2
//! - [`search::parse`] - grep context-output parser
//! - [`search::grep`] - Single grep invocation with timeout and exclusions
//! - [`search::repo`] - Priority-tiered repository search
//! - [`search::expand`] - Wider-window re-search of a single hit
//! - [`llm`] - `ChatModel` trait plus the Ollama / OpenAI HTTP client
//! - [`qa`] - The question-answering pipeline
//! - [`api`] - Axum handlers
//! - [`state`] - Shared application state

pub mod api;
pub mod config;
pub mod errors;
pub mod git;
pub mod llm;
pub mod models;
pub mod qa;
pub mod search;
pub mod state;
