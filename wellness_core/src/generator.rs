//! Text-generation capabilities and their bindings to advisor roles.
//!
//! The core only relies on [`Generator::invoke`]: instruction text in, advisory
//! text out, or a fault. [`ChatGenerator`] talks to any OpenAI-compatible
//! chat-completions endpoint (Groq by default).

use crate::capability::Advisor;
use crate::config::GenerationConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Why a generation attempt failed
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorFault {
    #[error("request timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),
}

/// A text-generation capability
pub trait Generator: Send + Sync {
    fn invoke(&self, instruction: &str) -> std::result::Result<String, GeneratorFault>;
}

// ============================================================================
// Chat-completions backend
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint
pub struct ChatGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key_env: String,
    api_key: Option<String>,
    temperature: f32,
    persona: String,
}

impl ChatGenerator {
    pub fn new(config: &GenerationConfig, persona: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let api_key = config.api_key();

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
            api_key,
            temperature: config.temperature,
            persona: persona.into(),
        })
    }
}

impl fmt::Debug for ChatGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatGenerator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("persona", &self.persona)
            .finish()
    }
}

impl Generator for ChatGenerator {
    fn invoke(&self, instruction: &str) -> std::result::Result<String, GeneratorFault> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GeneratorFault::MissingApiKey(self.api_key_env.clone()))?;

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.persona,
                },
                ChatMessage {
                    role: "user",
                    content: instruction,
                },
            ],
            temperature: self.temperature,
        };

        tracing::debug!("POST {} (model {})", self.endpoint, self.model);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorFault::Timeout
                } else {
                    GeneratorFault::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GeneratorFault::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| GeneratorFault::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GeneratorFault::Malformed("response has no message content".into()))
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// Advisor role → generator, built once at start-up and injected into the
/// dispatcher
#[derive(Clone, Default)]
pub struct Bindings {
    generators: HashMap<Advisor, Arc<dyn Generator>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`ChatGenerator`] per advisor role, each with its own persona
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        if config.api_key().is_none() {
            tracing::warn!(
                "${} is not set; advisory requests will fail until it is",
                config.api_key_env
            );
        }

        let mut bindings = Self::new();
        for advisor in Advisor::ALL {
            let generator = ChatGenerator::new(config, advisor.persona())?;
            bindings.bind(advisor, Arc::new(generator));
        }
        tracing::debug!("Bound {} advisors to {}", bindings.len(), config.base_url);
        Ok(bindings)
    }

    /// Bind the same generator to every advisor role
    pub fn uniform(generator: Arc<dyn Generator>) -> Self {
        let mut bindings = Self::new();
        for advisor in Advisor::ALL {
            bindings.bind(advisor, Arc::clone(&generator));
        }
        bindings
    }

    pub fn bind(&mut self, advisor: Advisor, generator: Arc<dyn Generator>) -> &mut Self {
        self.generators.insert(advisor, generator);
        self
    }

    pub fn get(&self, advisor: Advisor) -> Option<&dyn Generator> {
        self.generators.get(&advisor).map(|g| g.as_ref())
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<_> = self.generators.keys().collect();
        bound.sort();
        f.debug_struct("Bindings").field("bound", &bound).finish()
    }
}
