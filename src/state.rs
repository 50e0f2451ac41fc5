use std::sync::Arc;

use crate::config::Config;
use crate::llm::{ChatModel, HttpChatModel};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub model: Arc<dyn ChatModel>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        let model = Arc::new(HttpChatModel::new(client, config.llm.clone()));
        Ok(Self { config, model })
    }

    /// State with an injected model, for tests.
    pub fn with_model(config: Config, model: Arc<dyn ChatModel>) -> Self {
        Self { config, model }
    }
}
