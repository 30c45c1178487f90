//! Shared handles a run needs, constructed once per process.

use claims_core::config::ProviderConfig;
use claims_core::{AgentSettings, AppConfig, AppError, AppResult};
use claims_llm::{create_client, ClientOptions, LlmClient, LlmRequest};
use claims_prompt::PromptLibrary;
use claims_retrieval::{create_engine, RetrievalEngine};
use claims_tabular::TabularStore;
use std::sync::Arc;

/// Completion service, stores and prompts shared by every run.
#[derive(Clone)]
pub struct AgentServices {
    pub llm: Arc<dyn LlmClient>,
    pub model: String,
    pub tabular: Arc<TabularStore>,
    pub retrieval: Arc<dyn RetrievalEngine>,
    pub prompts: Arc<PromptLibrary>,
    pub settings: AgentSettings,
}

impl AgentServices {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        tabular: Arc<TabularStore>,
        retrieval: Arc<dyn RetrievalEngine>,
        prompts: Arc<PromptLibrary>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            tabular,
            retrieval,
            prompts,
            settings,
        }
    }

    /// Build every service from configuration.
    ///
    /// Loads each CSV in the data directory as a table and opens the
    /// configured retrieval engine over the same directory.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let api_key = config.resolve_api_key(&config.provider);
        let endpoint = config.endpoint();
        let region = config.region();
        let api_version = match config.get_provider_config(&config.provider) {
            Some(ProviderConfig::Anthropic { api_version, .. }) => api_version,
            _ => None,
        };

        let llm = create_client(
            &config.provider,
            ClientOptions {
                endpoint: endpoint.as_deref(),
                api_key: api_key.as_deref(),
                region: Some(region.as_str()),
                api_version: api_version.as_deref(),
            },
        )
        .map_err(AppError::Llm)?;

        let data_dir = config.data_dir();
        let tabular = TabularStore::new()?;
        if data_dir.is_dir() {
            let loaded = tabular.load_dir(&data_dir)?;
            tracing::info!("Loaded {} tables from {:?}", loaded.len(), data_dir);
        }

        let retrieval = create_engine(&config.retrieval, &data_dir)?;
        let prompts = PromptLibrary::load(&config.workspace)?;

        Ok(Self::new(
            llm,
            config.model.clone(),
            Arc::new(tabular),
            retrieval,
            Arc::new(prompts),
            config.agent.clone(),
        ))
    }

    /// One non-streaming completion, returning the trimmed text.
    pub(crate) async fn complete(
        &self,
        prompt: String,
        max_tokens: u32,
        temperature: Option<f32>,
    ) -> AppResult<String> {
        let mut request = LlmRequest::new(prompt, &self.model).with_max_tokens(max_tokens);
        if let Some(temperature) = temperature {
            request = request.with_temperature(temperature);
        }

        let response = self.llm.complete(&request).await?;
        if response.is_truncated() {
            tracing::warn!("Completion hit the {} token budget", max_tokens);
        }
        tracing::debug!(
            "Completion used {} tokens ({})",
            response.usage.total_tokens,
            self.llm.provider_name()
        );
        Ok(response.content.trim().to_string())
    }
}
