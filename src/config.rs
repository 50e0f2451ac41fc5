use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the cloned repository checkout lives
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Repository to answer questions about
    pub repo: RepoConfig,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Search pipeline tuning
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Clone URL; empty means "never clone, use whatever is on disk"
    pub url: String,
    /// Checkout directory name under data_dir
    pub name: String,
    /// Pull latest changes (and submodules) at startup
    pub update_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for chat completions
    pub chat_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Completion token budget for the answer call
    pub max_tokens: u32,
}

/// Knobs for the grep pipeline. Defaults mirror the search this service
/// was built around: 10 lines of context each side, 5 matches per tier,
/// curated subtrees searched before the bulk of the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Context lines before each match
    pub context_before: usize,
    /// Context lines after each match
    pub context_after: usize,
    /// Match cap per priority tier
    pub per_tier_cap: usize,
    /// Context lines each side when expanding a single hit
    pub expand_context: usize,
    /// Subtrees searched first, in priority order, then excluded from
    /// the general tier
    pub priority_subdirs: Vec<String>,
    /// Timeout for a single grep invocation
    pub grep_timeout_secs: u64,
    /// Drop records that repeat an earlier (file, content) pair
    pub dedupe: bool,
    /// Ask the model to select the most relevant records before answering
    pub refine: bool,
    /// Re-grep the top hit with a wider window before answering
    pub expand_top_hit: bool,
    /// Derive terms with the model (falls back to whitespace split on failure)
    pub use_llm_terms: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9000".to_string(),
            repo: RepoConfig::default(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            name: "repo".to_string(),
            update_on_start: false,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            api_key: None,
            max_tokens: 512,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            context_before: 10,
            context_after: 10,
            per_tier_cap: 5,
            expand_context: 20,
            priority_subdirs: vec!["tech-reports".to_string(), "models/demos".to_string()],
            grep_timeout_secs: 30,
            dedupe: false,
            refine: false,
            expand_top_hit: false,
            use_llm_terms: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("REPO_QA_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("REPO_QA_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("REPO_QA_REPO_URL") {
            // Derive the checkout name from the URL unless overridden below
            if let Some(name) = repo_name_from_url(&url) {
                config.repo.name = name;
            }
            config.repo.url = url;
        }
        if let Ok(name) = std::env::var("REPO_QA_REPO_NAME") {
            config.repo.name = name;
        }
        if let Ok(val) = std::env::var("REPO_QA_UPDATE_ON_START") {
            config.repo.update_on_start = env_flag(&val);
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(v) = val.parse() {
                config.llm.max_tokens = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_QA_CONTEXT_LINES") {
            if let Ok(v) = val.parse::<usize>() {
                config.search.context_before = v;
                config.search.context_after = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_QA_PER_TIER_CAP") {
            if let Ok(v) = val.parse() {
                config.search.per_tier_cap = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_QA_PRIORITY_DIRS") {
            let dirs: Vec<String> = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !dirs.is_empty() {
                config.search.priority_subdirs = dirs;
            }
        }
        if let Ok(val) = std::env::var("REPO_QA_GREP_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.search.grep_timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_QA_DEDUPE") {
            config.search.dedupe = env_flag(&val);
        }
        if let Ok(val) = std::env::var("REPO_QA_REFINE") {
            config.search.refine = env_flag(&val);
        }
        if let Ok(val) = std::env::var("REPO_QA_EXPAND_TOP_HIT") {
            config.search.expand_top_hit = env_flag(&val);
        }
        if let Ok(val) = std::env::var("REPO_QA_LLM_TERMS") {
            config.search.use_llm_terms = env_flag(&val);
        }

        config
    }

    /// Directory holding the repository checkout.
    pub fn repo_dir(&self) -> PathBuf {
        self.data_dir.join(&self.repo.name)
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

fn repo_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/').trim_end_matches(".git");
    let name = trimmed.rsplit(['/', ':']).next()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
