//! Text generation API client.
//!
//! A lightweight client for the Gemini `generateContent` endpoint. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Discovering the API key from `GEMINI_API_KEY`
//! - Validating `GEMINI_API_BASE` for safety
//! - Building requests with a consistent User-Agent
//!
//! The client is usable without a key; [`GeminiClient::is_configured`] reports whether
//! requests can succeed so callers can surface a clear error instead of a 403.
//!
//! # Example
//!
//! ```ignore
//! use agentflow_api::GeminiClient;
//!
//! async fn demo() -> anyhow::Result<()> {
//!     let client = GeminiClient::new_from_env("gemini-2.5-flash")?;
//!     let text = client.generate_content("Say hi", Some("Be brief")).await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

use std::env;
use std::time::Duration;

use agentflow_util::{redact_sensitive, truncate_for_log};
use anyhow::{Context, Result, anyhow, bail};
use reqwest::{Client, Url, header};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable overriding the API base URL.
pub const API_BASE_ENV: &str = "GEMINI_API_BASE";
/// Public endpoint used when no override is configured.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Allowed hostnames or base domains for non-local configurations of
/// `GEMINI_API_BASE`. Subdomains of these domains are also allowed.
const ALLOWED_API_DOMAINS: &[&str] = &["googleapis.com"];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];
/// Longest error body echoed back into error messages.
const ERROR_BODY_PREVIEW_CHARS: usize = 300;

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for text generation.
pub struct GeminiClient {
    pub base_url: String,
    pub model: String,
    pub http: Client,
    pub user_agent: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Construct a client from `GEMINI_API_KEY` and `GEMINI_API_BASE`.
    ///
    /// Non-localhost hosts must use HTTPS and be within an allowed Google API domain.
    pub fn new_from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty());
        let base_url = env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.into());
        Self::new(base_url, model, api_key)
    }

    /// Construct a client from explicit settings.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url,
            model: model.into(),
            http,
            user_agent: format!("agentflow/0.1; {}", env::consts::OS),
            api_key,
        })
    }

    /// Returns true when an API key is available.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generates text for `prompt`, optionally steered by a system instruction.
    ///
    /// Returns the concatenated text parts of the first candidate.
    pub async fn generate_content(&self, prompt: &str, system_instruction: Option<&str>) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("{API_KEY_ENV} is not set"))?;

        let url = self.generate_content_url();
        debug!(url = %url, model = %self.model, has_system_instruction = system_instruction.is_some(), "requesting text generation");

        let response = self
            .http
            .post(url)
            .header(header::USER_AGENT, &self.user_agent)
            .header("x-goog-api-key", api_key)
            .json(&GenerateContentRequest::new(prompt, system_instruction))
            .send()
            .await
            .context("text generation request failed")?;

        let status = response.status();
        let body = response.text().await.context("read text generation response")?;
        if !status.is_success() {
            bail!(
                "text generation returned HTTP {}: {}",
                status.as_u16(),
                redact_sensitive(&truncate_for_log(&body, ERROR_BODY_PREVIEW_CHARS))
            );
        }

        let payload: Value = serde_json::from_str(&body).context("parse text generation response")?;
        extract_candidate_text(&payload)
    }

    fn generate_content_url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, system_instruction: Option<&'a str>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: system_instruction.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
        }
    }
}

/// Pulls the text of the first candidate out of a `generateContent` response.
fn extract_candidate_text(payload: &Value) -> Result<String> {
    if let Some(reason) = payload.pointer("/promptFeedback/blockReason").and_then(Value::as_str) {
        bail!("prompt was blocked: {reason}");
    }

    let parts = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("response did not contain any candidates"))?;

    let text: String = parts.iter().filter_map(|part| part.get("text").and_then(Value::as_str)).collect();
    if text.is_empty() {
        bail!("response candidate contained no text");
    }
    Ok(text)
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS, and host must be an allowed Google API domain or a
///   subdomain thereof
fn validate_base_url(base: &str) -> Result<()> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid {API_BASE_ENV} URL '{}': {}", base, e))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| anyhow!("{API_BASE_ENV} must include a host"))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(anyhow!(
            "{API_BASE_ENV} must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        ));
    }

    let is_allowed_domain = ALLOWED_API_DOMAINS.iter().any(|&allowed_domain| {
        host_name.eq_ignore_ascii_case(allowed_domain) || host_name.ends_with(&format!(".{}", allowed_domain))
    });
    if !is_allowed_domain {
        return Err(anyhow!(
            "{API_BASE_ENV} host '{}' is not allowed; must be one of {:?} or a subdomain, or localhost",
            host_name,
            ALLOWED_API_DOMAINS
        ));
    }

    Ok(())
}
