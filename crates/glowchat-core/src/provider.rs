/// Where chat requests go.
///
/// `Relay` is a proxy (for example a Cloudflare Worker) that holds the API key
/// itself; `OpenAI` talks to the chat-completions API directly with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Relay,
    OpenAI,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Relay => "relay",
            Provider::OpenAI => "openai",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relay" | "proxy" => Some(Provider::Relay),
            "openai" => Some(Provider::OpenAI),
            _ => None,
        }
    }

    pub fn all() -> Vec<Provider> {
        vec![Provider::Relay, Provider::OpenAI]
    }

    /// Like `from_str`, but the error names every accepted provider.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        Self::from_str(s).ok_or_else(|| {
            let names: Vec<&str> = Self::all().iter().map(Provider::as_str).collect();
            anyhow::anyhow!("Unknown provider '{}' (expected one of: {})", s, names.join(", "))
        })
    }

    /// Endpoint used when the config doesn't name one. Relays have no default.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Provider::Relay => None,
            Provider::OpenAI => Some("https://api.openai.com/v1/chat/completions"),
        }
    }

    pub fn default_model(&self) -> Option<&'static str> {
        match self {
            Provider::Relay => None,
            Provider::OpenAI => Some("gpt-4o"),
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, Provider::OpenAI)
    }
}
