//! Ollama translator adapter
//!
//! Sends the editing instruction to an Ollama-compatible `/api/generate`
//! endpoint and hands back the generated text untouched. Plan extraction
//! happens in the planner, never here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::planner::system_prompt;
use crate::ports::*;
use crate::utils::path::truncate_head;

/// Characters of an error body kept in `TranslatorHttpError`
const BODY_LIMIT: usize = 500;

/// Request body for `/api/generate`
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: String,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

/// Non-streaming response envelope
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Translator backed by an Ollama server
pub struct OllamaTranslator {
    client: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl OllamaTranslator {
    /// Create a translator for `base_url`
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::TranslatorUnavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            max_tokens,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn map_send_error(&self, err: reqwest::Error) -> DomainError {
        if err.is_timeout() {
            DomainError::TranslatorTimeout(format!(
                "no answer from {} within {} seconds",
                self.base_url,
                self.timeout.as_secs()
            ))
        } else {
            DomainError::TranslatorUnavailable(format!("{}: {}", self.base_url, err))
        }
    }
}

#[async_trait]
impl TranslatorPort for OllamaTranslator {
    async fn translate(&self, instruction: &str) -> Result<String, DomainError> {
        info!("Requesting edit plan from {} ({})", self.base_url, self.model);
        let request = GenerateRequest {
            model: &self.model,
            system: system_prompt(),
            prompt: instruction.trim(),
            stream: false,
            options: GenerateOptions {
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(DomainError::TranslatorHttpError {
                status: status.as_u16(),
                body: truncate_head(body.trim(), BODY_LIMIT),
            });
        }

        match serde_json::from_str::<GenerateResponse>(&body) {
            Ok(envelope) => {
                debug!("Translator answered with {} characters", envelope.response.len());
                Ok(envelope.response)
            }
            Err(_) => {
                debug!("Translator envelope is not JSON; using raw body");
                Ok(body)
            }
        }
    }
}
