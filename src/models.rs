use serde::{Deserialize, Serialize};

/// One grep hit: the file it came from and the matched lines together
/// with their surrounding context. Produced only by the output parser
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub file: String,
    pub content: String,
}

/// Ask request body. `prompt` is optional so that a missing field and
/// an empty field get the same "Invalid input." treatment.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Ask response body. Always well-formed; when an internal step failed
/// the reply carries an explanatory message and `diagnostic` the detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Final pipeline output: the model's answer text plus an optional
/// diagnostic from a non-fatal step (e.g. an aborted refinement).
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub diagnostic: Option<String>,
}
