//! Prompt building and the text-generation provider.
//!
//! Calls are single-shot. A provider failure of any kind is logged and
//! replaced by a fixed fallback string, so callers always receive text.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taskboard_common::{Project, Task};

use crate::config::AiSettings;

pub const SUMMARY_FALLBACK: &str = "Unable to generate AI summary at this time.";
pub const ANSWER_FALLBACK: &str = "Unable to get AI answer at this time.";

/// Abstraction over the text-generation provider for testability.
/// Real implementation: `GeminiClient`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ── Gemini provider ───────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

/// Calls the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, endpoint: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            url: format!(
                "{}/models/{}:generateContent",
                endpoint.trim_end_matches('/'),
                model
            ),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let resp: GenerateResponse = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send generateContent request")?
            .error_for_status()
            .context("generateContent returned error status")?
            .json()
            .await
            .context("Failed to parse generateContent response")?;
        resp.text()
            .context("generateContent response contained no text")
    }
}

// ── Bridge ────────────────────────────────────────────────────────────

/// Builds prompts and forwards them to the configured generator.
///
/// With no generator configured (no API key) every call returns the
/// fallback text.
#[derive(Clone, Default)]
pub struct AiBridge {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl AiBridge {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    /// Disabled bridge; every call yields the fallback.
    pub fn disabled() -> Self {
        Self { generator: None }
    }

    pub fn from_settings(settings: &AiSettings) -> Self {
        match settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => {
                tracing::info!(model = %settings.model, "AI bridge enabled");
                Self::new(Arc::new(GeminiClient::new(
                    key,
                    &settings.endpoint,
                    &settings.model,
                )))
            }
            None => {
                tracing::warn!("GEMINI_API_KEY is not set; AI endpoints will return fallback text");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn summarize_project(&self, project: &Project, tasks: &[Task]) -> String {
        let prompt = summary_prompt(project, tasks);
        self.generate_or(&prompt, SUMMARY_FALLBACK, "summary").await
    }

    pub async fn answer_task_question(&self, question: &str, task: &Task, context_type: &str) -> String {
        let prompt = answer_prompt(question, task, context_type);
        self.generate_or(&prompt, ANSWER_FALLBACK, "answer").await
    }

    async fn generate_or(&self, prompt: &str, fallback: &str, kind: &str) -> String {
        let Some(generator) = &self.generator else {
            return fallback.to_string();
        };
        match generator.generate(prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(kind, error = %format!("{:#}", e), "AI request failed, using fallback");
                fallback.to_string()
            }
        }
    }
}

pub fn summary_prompt(project: &Project, tasks: &[Task]) -> String {
    let task_lines: Vec<String> = tasks
        .iter()
        .map(|t| format!("- {} ({}): {}", t.title, t.status, t.description))
        .collect();
    format!(
        "Analyze this project and provide a comprehensive executive summary:\n\n\
         Project: {}\n\
         Description: {}\n\n\
         Tasks ({} total):\n\
         {}\n\n\
         Please provide:\n\
         1. Project overview and current status\n\
         2. Task distribution across statuses\n\
         3. Key insights and recommendations\n\
         4. Potential risks or blockers\n\
         5. Next steps and priorities\n\n\
         Format as a professional executive summary.",
        project.name,
        project.description,
        tasks.len(),
        task_lines.join("\n"),
    )
}

pub fn answer_prompt(question: &str, task: &Task, context_type: &str) -> String {
    format!(
        "Context: {}\n\
         Task: {}\n\
         Description: {}\n\
         Status: {}\n\n\
         Question: {}\n\n\
         Please provide a helpful, specific answer based on the task context.",
        context_type, task.title, task.description, task.status, question,
    )
}
