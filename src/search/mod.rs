//! Grep-backed evidence retrieval: output parsing, single invocations,
//! priority-tiered repository search, and context expansion.

pub mod expand;
pub mod grep;
pub mod parse;
pub mod repo;
