//! Configuration management for the claims agent.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (`.claims/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with persisted state stored in `.claims/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the completion factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 4] = ["anthropic", "claude", "bedrock", "aws-bedrock"];

/// Retrieval engines selectable by name.
pub const KNOWN_ENGINES: [&str; 4] = ["lexical", "bm25", "dense", "vector"];

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_BEDROCK_MODEL: &str = "us.anthropic.claude-sonnet-4-5-20250929-v1:0";
const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .claims/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Completion provider ("anthropic" or "bedrock")
    pub provider: String,

    /// Model identifier for the active provider
    pub model: String,

    /// Explicit API key, overrides any provider-specific env var
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Directory holding CSV tables and the persisted lexical index.
    /// Defaults to `<workspace>/.claims/data` when unset.
    pub data_dir: Option<PathBuf>,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,

    /// Orchestration tuning
    pub agent: AgentSettings,

    /// Retrieval engine selection and chunking
    pub retrieval: RetrievalSettings,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
///
/// Untagged: `Bedrock` is tried first because it is the only shape with a
/// required `region`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Bedrock {
        region: String,
        model: String,
        #[serde(rename = "apiKeyEnv")]
        api_key_env: Option<String>,
        endpoint: Option<String>,
    },
    Anthropic {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        #[serde(rename = "apiVersion")]
        api_version: Option<String>,
    },
}

impl ProviderConfig {
    pub fn model(&self) -> &str {
        match self {
            Self::Bedrock { model, .. } | Self::Anthropic { model, .. } => model,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Bedrock { endpoint, .. } | Self::Anthropic { endpoint, .. } => {
                endpoint.as_deref()
            }
        }
    }
}

/// Orchestration tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettings {
    /// Ceiling compared against the failed-execution count before a repair.
    #[serde(default = "default_sql_max_retries")]
    pub sql_max_retries: u32,

    /// Sample rows per table shown to SQL generation.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,

    /// Passages returned by document search.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Prior conversation turns rendered into the synthesis prompt.
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

fn default_sql_max_retries() -> u32 {
    1
}

fn default_sample_rows() -> usize {
    5
}

fn default_top_k() -> usize {
    5
}

fn default_history_turns() -> usize {
    6
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            sql_max_retries: default_sql_max_retries(),
            sample_rows: default_sample_rows(),
            top_k: default_top_k(),
            history_turns: default_history_turns(),
        }
    }
}

/// Retrieval engine selection and chunking parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// "lexical" or "dense"
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Window length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive windows
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_engine() -> String {
    "lexical".to_string()
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    100
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    data_dir: Option<String>,
    agent: Option<AgentSettings>,
    retrieval: Option<RetrievalSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "anthropic".to_string(),
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            data_dir: None,
            llm: None,
            agent: AgentSettings::default(),
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and environment.
    ///
    /// Environment variables:
    /// - `CLAIMS_WORKSPACE`: Override workspace path
    /// - `CLAIMS_CONFIG`: Path to config file
    /// - `CLAIMS_PROVIDER`: Completion provider
    /// - `CLAIMS_MODEL`: Model identifier
    /// - `CLAIMS_API_KEY`: API key
    /// - `CLAIMS_RAG_ENGINE`: Retrieval engine
    /// - `CLAIMS_SQL_MAX_RETRIES`: SQL repair ceiling
    /// - `CLAIMS_DATA_DIR`: Data directory
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use claims_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("CLAIMS_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("CLAIMS_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.claims_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("CLAIMS_PROVIDER") {
            config.model = default_model_for(&provider).to_string();
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("CLAIMS_MODEL") {
            config.model = model;
        }

        if let Ok(engine) = std::env::var("CLAIMS_RAG_ENGINE") {
            config.retrieval.engine = engine;
        }

        if let Ok(retries) = std::env::var("CLAIMS_SQL_MAX_RETRIES") {
            config.agent.sql_max_retries = retries.parse().map_err(|e| {
                AppError::Config(format!("Invalid CLAIMS_SQL_MAX_RETRIES '{}': {}", retries, e))
            })?;
        }

        if let Ok(data_dir) = std::env::var("CLAIMS_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(data_dir));
        }

        config.api_key = std::env::var("CLAIMS_API_KEY").ok();
        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(data_dir) = config_file.data_dir {
            result.data_dir = Some(PathBuf::from(data_dir));
        }

        if let Some(agent) = config_file.agent {
            result.agent = agent;
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            result.model = match llm.providers.get(&llm.active_provider) {
                Some(provider_config) => provider_config.model().to_string(),
                None => default_model_for(&llm.active_provider).to_string(),
            };
            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            if provider != self.provider {
                self.model = self
                    .get_provider_config(&provider)
                    .map(|pc| pc.model().to_string())
                    .unwrap_or_else(|| default_model_for(&provider).to_string());
            }
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .claims directory.
    pub fn claims_dir(&self) -> PathBuf {
        self.workspace.join(".claims")
    }

    /// Directory holding CSV tables and the persisted index.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| self.claims_dir().join("data"))
    }

    /// Ensure the .claims directory and the data directory exist.
    pub fn ensure_claims_dir(&self) -> AppResult<()> {
        for dir in [self.claims_dir(), self.data_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir).map_err(|e| {
                    AppError::Config(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }
        Ok(())
    }

    /// Get a provider's configuration block, if the config file declared one.
    pub fn get_provider_config(&self, provider: &str) -> Option<ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider).cloned())
    }

    /// Custom endpoint for the active provider.
    pub fn endpoint(&self) -> Option<String> {
        self.get_provider_config(&self.provider)
            .and_then(|pc| pc.endpoint().map(str::to_string))
    }

    /// AWS region for the Bedrock provider.
    pub fn region(&self) -> String {
        match self.get_provider_config(&self.provider) {
            Some(ProviderConfig::Bedrock { region, .. }) => region,
            _ => std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_AWS_REGION.to_string()),
        }
    }

    /// Name of the environment variable holding the provider's credential.
    pub fn api_key_env(&self, provider: &str) -> String {
        match self.get_provider_config(provider) {
            Some(ProviderConfig::Anthropic { api_key_env, .. }) => api_key_env,
            Some(ProviderConfig::Bedrock {
                api_key_env: Some(env),
                ..
            }) => env,
            _ => default_api_key_env(provider).to_string(),
        }
    }

    /// Resolve the API key for a provider.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }
        std::env::var(self.api_key_env(provider)).ok()
    }

    /// Validate configuration for the active provider and retrieval engine.
    pub fn validate(&self) -> AppResult<()> {
        let provider = normalize_name(&self.provider);
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_ENGINES.contains(&normalize_name(&self.retrieval.engine).as_str()) {
            return Err(AppError::Config(format!(
                "Unknown retrieval engine: {}. Supported: {}",
                self.retrieval.engine,
                KNOWN_ENGINES.join(", ")
            )));
        }

        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.retrieval.chunk_overlap, self.retrieval.chunk_size
            )));
        }

        if self.resolve_api_key(&provider).is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.api_key_env(&provider)
            )));
        }

        Ok(())
    }
}

/// Case-folded form of a provider or engine name, as the factories match it.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Default model for a provider name.
pub fn default_model_for(provider: &str) -> &'static str {
    match normalize_name(provider).as_str() {
        "bedrock" | "aws-bedrock" => DEFAULT_BEDROCK_MODEL,
        _ => DEFAULT_ANTHROPIC_MODEL,
    }
}

fn default_api_key_env(provider: &str) -> &'static str {
    match normalize_name(provider).as_str() {
        "bedrock" | "aws-bedrock" => "AWS_BEARER_TOKEN_BEDROCK",
        _ => "ANTHROPIC_API_KEY",
    }
}
