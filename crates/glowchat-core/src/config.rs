use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::ai::{ChatClient, RequestParams};
use crate::provider::Provider;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful L'Oréal beauty assistant. You should only answer questions related to:
- L'Oréal products and product recommendations
- Beauty routines and skincare advice
- Makeup tips and techniques
- Hair care and styling
- General beauty and cosmetics questions

If someone asks about topics unrelated to beauty, L'Oréal products, or cosmetics, politely redirect them back to beauty-related topics. Always be friendly, helpful, and knowledgeable about L'Oréal's product lines.";

pub const DEFAULT_GREETING: &str = "👋 Hello! I'm your L'Oréal beauty assistant. I can help you with product recommendations, beauty routines, makeup tips, and skincare advice. How can I help you today?";

/// Checked for every provider, before the config file.
const API_KEY_VAR: &str = "GLOWCHAT_API_KEY";
/// Only ever sent to OpenAI itself, never to a relay.
const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_greeting() -> Option<String> {
    Some(DEFAULT_GREETING.to_string())
}

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub request_params: Map<String, Value>,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Shown once at startup; never sent to the endpoint
    #[serde(default = "default_greeting")]
    pub greeting: Option<String>,
    #[serde(default = "default_true")]
    pub truncation_hint: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::Relay.as_str().to_string()),
            endpoint_url: None,
            api_key: None,
            model: None,
            max_tokens: None,
            temperature: None,
            request_params: Map::new(),
            system_prompt: default_system_prompt(),
            greeting: default_greeting(),
            truncation_hint: true,
            timeout_secs: None,
        }
    }

    /// Load from the default location, falling back to defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("glowchat").join("config.json"))
    }

    pub fn provider(&self) -> Result<Provider> {
        match &self.provider {
            None => Ok(Provider::default()),
            Some(name) => Provider::parse(name),
        }
    }

    pub fn endpoint(&self) -> Result<String> {
        if let Some(url) = &self.endpoint_url {
            return Ok(url.clone());
        }
        let provider = self.provider()?;
        provider
            .default_endpoint()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("No endpoint_url configured for the {} provider", provider.as_str()))
    }

    /// Bearer token: env vars first, then the config file.
    ///
    /// `OPENAI_API_KEY` is only consulted for the openai provider.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_from(|name| std::env::var(name).ok())
    }

    fn api_key_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        let env = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let is_openai = matches!(self.provider(), Ok(Provider::OpenAI));

        env(API_KEY_VAR)
            .or_else(|| if is_openai { env(OPENAI_KEY_VAR) } else { None })
            .or_else(|| self.api_key.clone())
    }

    pub fn request_params(&self) -> Result<RequestParams> {
        let model = self.model.clone()
            .or_else(|| self.provider().ok()?.default_model().map(str::to_string));

        Ok(RequestParams {
            model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            extra: self.request_params.clone(),
        })
    }

    /// Greeting to show at startup, if any.
    pub fn greeting(&self) -> Option<&str> {
        self.greeting.as_deref().filter(|g| !g.trim().is_empty())
    }

    pub fn client(&self) -> Result<ChatClient> {
        self.client_with_key(self.api_key())
    }

    fn client_with_key(&self, api_key: Option<String>) -> Result<ChatClient> {
        let provider = self.provider()?;
        let mut client = ChatClient::new(&self.endpoint()?).with_params(self.request_params()?);

        match api_key {
            Some(key) => client = client.with_api_key(&key),
            None if provider.requires_api_key() => {
                return Err(anyhow!(
                    "The {} provider needs an API key (set GLOWCHAT_API_KEY or api_key in {})",
                    provider.as_str(),
                    Self::get_config_path().map(|p| p.display().to_string()).unwrap_or_default()
                ));
            }
            None => {}
        }

        if let Some(secs) = self.timeout_secs {
            client = client.with_timeout(Duration::from_secs(secs))?;
        }

        Ok(client)
    }
}
