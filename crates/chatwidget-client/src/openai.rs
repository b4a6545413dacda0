//! OpenAI-compatible chat completion client.

use crate::CompletionClient;
use crate::error::CompletionError;
use async_trait::async_trait;
use chatwidget_config::ClientConfig;
use chatwidget_protocol::{ChatTurn, Role};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Client for a hosted `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    system_prompt: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiCompletionClient {
    /// Build a client from config, resolving the API key once.
    ///
    /// A missing key is not an error here; requests fail with
    /// `CompletionError::MissingApiKey` instead so the session keeps working.
    pub fn from_config(config: &ClientConfig) -> Result<Self, CompletionError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let http = builder.build()?;
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            warn!(
                "no API key configured; requests will fail (env={})",
                config.api_key_env
            );
        }
        info!(
            "initialized completion client (endpoint={}, model={})",
            config.endpoint, config.model
        );
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            api_key_env: config.api_key_env.clone(),
            system_prompt: config.system_prompt.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Override the resolved API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Assemble the request body: system instruction first, then the turns.
    fn request_body<'a>(&'a self, turns: &'a [ChatTurn]) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(WireMessage {
            role: Role::System.as_str(),
            content: &self.system_prompt,
        });
        messages.extend(turns.iter().map(|turn| WireMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        }));
        ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    async fn send(&self, turns: &[ChatTurn]) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::MissingApiKey(self.api_key_env.clone()))?;

        debug!(
            "sending completion request (model={}, turns={})",
            self.model,
            turns.len()
        );
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.request_body(turns))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("completion request failed (status={})", status.as_u16());
            return Err(CompletionError::from_status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let parsed: ChatResponse =
            serde_json::from_slice(&body).map_err(|_| CompletionError::InvalidResponse)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or(CompletionError::InvalidResponse)?;
        debug!("completion received (content_len={})", content.len());
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(
        &self,
        turns: &[ChatTurn],
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        if cancel.is_cancelled() {
            return Err(CompletionError::Canceled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("completion request canceled");
                Err(CompletionError::Canceled)
            }
            result = self.send(turns) => result,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
