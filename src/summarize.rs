use std::future::Future;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{NotesError, Result};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub const MIN_WORDS: u32 = 250;
pub const MAX_WORDS: u32 = 1500;
pub const DEFAULT_WORDS: u32 = 750;

/// Gemini models offered for note generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
pub enum Model {
    #[default]
    #[value(name = "gemini-1.5-pro-002")]
    #[serde(rename = "gemini-1.5-pro-002")]
    Gemini15Pro002,
    #[value(name = "gemini-1.5-flash-002")]
    #[serde(rename = "gemini-1.5-flash-002")]
    Gemini15Flash002,
}

impl Model {
    pub fn api_name(&self) -> &str {
        match self {
            Model::Gemini15Pro002 => "gemini-1.5-pro-002",
            Model::Gemini15Flash002 => "gemini-1.5-flash-002",
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// Language the notes are written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLanguage {
    #[default]
    Korean,
    English,
    Japanese,
    Chinese,
}

impl SummaryLanguage {
    pub fn name(&self) -> &str {
        match self {
            SummaryLanguage::Korean => "Korean",
            SummaryLanguage::English => "English",
            SummaryLanguage::Japanese => "Japanese",
            SummaryLanguage::Chinese => "Chinese",
        }
    }
}

/// Instruction block placed in front of the transcript
pub fn build_prompt(words: u32, language: SummaryLanguage) -> String {
    format!(
        "You are a YouTube Video Summarizer tasked with providing an in-depth analysis of a video's content. \
Your goal is to generate a comprehensive summary that captures the main points, key arguments, and supporting details within a {words}-word limit. \
Please thoroughly analyze the transcript text provided and offer a detailed summary, ensuring to cover all relevant aspects of the video.\n\n\
Format your response in a well-structured way with clear sections, bullet points for key takeaways, and highlight important concepts.\n\n\
Please provide the summary in {} language.\n\n\
Here is the transcript: ",
        language.name()
    )
}

/// A text-generation backend: prompt in, generated text out
pub trait Summarizer {
    fn generate(&self, model: &str, prompt: &str) -> impl Future<Output = Result<String>>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

/// Google Generative Language API client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl Summarizer for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        debug!("Generating notes via Gemini with model {model} ({} prompt chars)", prompt.len());

        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let resp = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotesError::GenerationFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(NotesError::GenerationFailed(format!("Gemini API returned {status}: {body}")));
        }

        let json: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| NotesError::GenerationFailed(format!("unreadable Gemini response: {e}")))?;
        extract_text(json)
    }
}

fn extract_text(resp: GenerateResponse) -> Result<String> {
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(NotesError::GenerationFailed(
            "Gemini returned no text (empty or blocked response)".to_string(),
        ));
    }
    Ok(text)
}
