//! Gemini planner.
//!
//! Asks Gemini for a production manifest as JSON, trying each configured
//! model in turn. Optionally runs the research tool first and hands its
//! notes to the model.

use async_trait::async_trait;
use director_models::{sanitize_filename, ProductionManifest};
use director_tools::{GeneratorCommands, ToolRunner};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ApiKey, DirectorConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_PLANNER_MODELS};
use crate::error::{DirectorError, DirectorResult};
use crate::invoke::invoke_tool;
use crate::planner::Planner;
use crate::retry::RetryConfig;

/// Research notes longer than this are cut before prompting.
const MAX_RESEARCH_CHARS: usize = 20_000;

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

struct ResearchStep {
    runner: Arc<dyn ToolRunner>,
    commands: GeneratorCommands,
    notes_dir: PathBuf,
}

/// Planner backed by the Gemini `generateContent` API.
pub struct GeminiPlanner {
    api_key: ApiKey,
    client: Client,
    base_url: String,
    models: Vec<String>,
    research: Option<ResearchStep>,
}

impl GeminiPlanner {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            client: Client::new(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            models: DEFAULT_PLANNER_MODELS.iter().map(|m| m.to_string()).collect(),
            research: None,
        }
    }

    /// Build from configuration; fails without an API key.
    pub fn from_config(config: &DirectorConfig) -> DirectorResult<Self> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or_else(|| DirectorError::config("GEMINI_API_KEY not set"))?;

        Ok(Self::new(api_key)
            .with_base_url(&config.gemini_base_url)
            .with_models(config.planner_models.clone()))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        if !models.is_empty() {
            self.models = models;
        }
        self
    }

    /// Run the research tool before planning; notes are written under `notes_dir`.
    pub fn with_research(
        mut self,
        runner: Arc<dyn ToolRunner>,
        commands: GeneratorCommands,
        notes_dir: impl Into<PathBuf>,
    ) -> Self {
        self.research = Some(ResearchStep {
            runner,
            commands,
            notes_dir: notes_dir.into(),
        });
        self
    }

    /// Research notes for the topic, or `None` when research is off or fails.
    async fn research_notes(&self, topic: &str) -> Option<String> {
        let step = self.research.as_ref()?;
        let output = step
            .notes_dir
            .join(format!("{}.md", sanitize_filename(topic)));

        if let Err(e) = tokio::fs::create_dir_all(&step.notes_dir).await {
            warn!("Cannot create research directory, planning without notes: {}", e);
            return None;
        }

        info!(topic, "Researching topic");
        let invocation = step.commands.research(topic, &output);
        let researched =
            invoke_tool(step.runner.as_ref(), &invocation, &RetryConfig::none()).await;
        let path = match researched {
            Ok(path) => path,
            Err(e) => {
                warn!("Research failed, planning without notes: {}", e);
                return None;
            }
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(notes) => Some(notes.chars().take(MAX_RESEARCH_CHARS).collect()),
            Err(e) => {
                warn!("Cannot read research notes, planning without them: {}", e);
                None
            }
        }
    }

    fn build_prompt(&self, topic: &str, research: Option<&str>) -> DirectorResult<String> {
        let schema = serde_json::to_string_pretty(&ProductionManifest::json_schema())?;
        let research = research
            .map(|notes| format!("\nResearch notes (prefer these facts over memory):\n{notes}\n"))
            .unwrap_or_default();

        Ok(format!(
            r#"You are a visual director planning a short educational video.
Topic: "{topic}"
{research}
Goal: a cinematic presentation that mixes rich cinematic imagery with clean, modern infographics.

Instructions:
1. Identify the key facts, dates and concepts of the topic.
2. Alternate visual styles:
   - "Cinematic" for establishing shots, mood and real-world examples.
   - "Infographic" for data, timelines, concepts and processes.
   - "Vintage Map" or "3D Model" where they fit.
3. Infographic prompts should ask for: "Minimalist vector art, clean lines, white background,
   clear iconography representing <concept>". Do not ask for complex text.
4. Scenes last 4 to 10 seconds. Motion clips ("visual_type": "video") must be 4, 6 or 8 seconds.
5. Use "audio_source": "generated" with narration_text and music_prompt for narrated scenes,
   "native" only for motion clips whose own sound should be kept.
6. When the same subject appears in several scenes, give those scenes one "reference_group"
   label and put a "reference_prompt" describing the subject on the first of them.
7. Scene ids are unique positive integers.

Return ONLY a single JSON object that validates against this JSON schema:
{schema}
"#
        ))
    }

    async fn call_gemini_api(
        &self,
        model: &str,
        prompt: &str,
    ) -> DirectorResult<ProductionManifest> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            model,
            self.api_key.expose()
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                DirectorError::planning(format!(
                    "Gemini API request failed: {}",
                    e.without_url()
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DirectorError::planning(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            DirectorError::planning(format!("Failed to parse Gemini response: {}", e.without_url()))
        })?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| DirectorError::planning("No content in Gemini response"))?;

        let manifest = ProductionManifest::from_json(strip_code_fences(text))?;
        Ok(manifest)
    }
}

/// Remove a surrounding markdown code fence, if any.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[async_trait]
impl Planner for GeminiPlanner {
    async fn plan(&self, topic: &str) -> DirectorResult<ProductionManifest> {
        let notes = self.research_notes(topic).await;
        let prompt = self.build_prompt(topic, notes.as_deref())?;
        debug!(chars = prompt.len(), "Planner prompt built");

        let mut last_error = None;
        for model in &self.models {
            info!("Planning with model: {}", model);
            match self.call_gemini_api(model, &prompt).await {
                Ok(manifest) => {
                    info!(
                        title = %manifest.title,
                        scenes = manifest.scenes.len(),
                        "Plan ready from {}", model
                    );
                    return Ok(manifest);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DirectorError::planning("No planner models configured")))
    }
}
