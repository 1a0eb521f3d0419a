use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use super::error::ExchangeError;
use crate::state::{ChatMessage, ChatRole};

/// Optional fields sent alongside `messages` in every request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    /// Anything else the endpoint understands, merged into the body as-is
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    role: ChatRole,
    content: String,
}

/// Client for an OpenAI-style chat-completions endpoint (direct or relayed).
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    params: RequestParams,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            api_key: None,
            params: RequestParams::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ExchangeError> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `host[:port]` of the endpoint, without scheme, credentials or path.
    pub fn endpoint_host(&self) -> Option<String> {
        let url = Url::parse(&self.endpoint).ok()?;
        let host = url.host_str()?;
        Some(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    /// JSON body for a request carrying `messages`.
    ///
    /// Extra params go in first so the typed fields and `messages` win on
    /// key collisions.
    pub fn request_body(&self, messages: &[ChatMessage]) -> Result<Value, ExchangeError> {
        let mut body = self.params.extra.clone();

        if let Some(model) = &self.params.model {
            body.insert("model".to_string(), Value::from(model.as_str()));
        }
        if let Some(max_tokens) = self.params.max_tokens {
            body.insert("max_tokens".to_string(), Value::from(max_tokens));
        }
        if let Some(temperature) = self.params.temperature {
            body.insert("temperature".to_string(), Value::from(temperature));
        }
        body.insert("messages".to_string(), serde_json::to_value(messages)?);

        Ok(Value::Object(body))
    }

    /// Send the whole conversation and return the assistant's reply text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ExchangeError> {
        let body = self.request_body(messages)?;

        let mut request = self.client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        tracing::debug!(endpoint = %self.endpoint, messages = messages.len(), "sending chat request");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Protocol { status, body });
        }

        let text = response.text().await?;
        parse_reply(&text)
    }
}

/// Pull `choices[0].message.content` out of a chat-completion body.
pub fn parse_reply(body: &str) -> Result<String, ExchangeError> {
    let completion: ChatCompletion = serde_json::from_str(body)?;
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ExchangeError::format("response has no choices"))?;

    if choice.message.role != ChatRole::Assistant {
        return Err(ExchangeError::format(format!(
            "expected an assistant message, got role {}",
            choice.message.role.as_str()
        )));
    }

    Ok(choice.message.content)
}
