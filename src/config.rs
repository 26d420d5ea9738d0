use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_TRELLO_URL: &str = "https://api.trello.com/1";
pub const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub trello: Option<TrelloConfig>,
    pub llm: Option<LlmConfig>,
    #[serde(default)]
    pub names: Names,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrelloConfig {
    pub api_key: String,
    pub token: String,
    #[serde(default = "default_trello_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    #[serde(default = "default_llm_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Board and list names the commands look up on the remote side.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Names {
    pub inbox_board: String,
    pub projects_board: String,
    pub inbox_list: String,
    pub deferred_list: String,
    pub archive_list: String,
    pub culled_list: String,
    pub merged_list: String,
}

impl Default for Names {
    fn default() -> Self {
        Self {
            inbox_board: "inbox".into(),
            projects_board: "projects".into(),
            inbox_list: "inbox".into(),
            deferred_list: "deferred".into(),
            archive_list: "archive".into(),
            culled_list: "culled for upcoming week".into(),
            merged_list: "merged".into(),
        }
    }
}

fn default_trello_url() -> String {
    DEFAULT_TRELLO_URL.into()
}

fn default_llm_url() -> String {
    DEFAULT_LLM_URL.into()
}

fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_max_tokens() -> u32 {
    10
}

impl AppConfig {
    pub fn trello(&self) -> Result<&TrelloConfig> {
        self.trello.as_ref().context(
            "Trello credentials missing. Set TRELLO_KEY and TRELLO_TOKEN or add [trello] to ~/.inbox/config.toml",
        )
    }

    pub fn llm(&self) -> Result<&LlmConfig> {
        self.llm.as_ref().context(
            "Model credentials missing. Set OPENAI_API_KEY or add [llm] to ~/.inbox/config.toml",
        )
    }

    /// Credentials from the environment win over the file.
    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let (Some(api_key), Some(token)) = (env("TRELLO_KEY"), env("TRELLO_TOKEN")) {
            let base_url = self
                .trello
                .as_ref()
                .map(|t| t.base_url.clone())
                .unwrap_or_else(default_trello_url);
            self.trello = Some(TrelloConfig {
                api_key,
                token,
                base_url,
            });
        }

        if let Some(api_key) = env("OPENAI_API_KEY") {
            match &mut self.llm {
                Some(llm) => llm.api_key = api_key,
                None => {
                    self.llm = Some(LlmConfig {
                        api_key,
                        base_url: default_llm_url(),
                        model: default_model(),
                        max_tokens: default_max_tokens(),
                    })
                }
            }
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".inbox")
        .join("config.toml")
}

fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !dotenv_missing(&e) {
            tracing::warn!(error = %e, "ignoring unreadable .env");
        }
    }
}

fn dotenv_missing(err: &dotenvy::Error) -> bool {
    matches!(err, dotenvy::Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    load_dotenv();
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    load_config_from(&path, |key| std::env::var(key).ok())
}

pub fn load_config_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<AppConfig> {
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        AppConfig::default()
    };
    config.apply_env(env);
    Ok(config)
}
