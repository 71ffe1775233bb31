use std::time::{Duration, Instant};

use log::{debug, error, info};
use serde::{Serialize, Serializer};

use crate::captions::CaptionSource;
use crate::summarize::{Model, Summarizer, SummaryLanguage, build_prompt};
use crate::transcript::{assemble, select_track};
use crate::{NotesError, Result, Transcript, extract_video_id};

/// Where a request is in its lifecycle. Showing the notes happens in the binary after `run` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Idle,
    IdentifierExtracted,
    TracksListed,
    LanguageSelected,
    TranscriptAssembled,
    SummaryGenerated,
    /// Terminal; reachable from any other stage
    Failed(String),
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::IdentifierExtracted => "identifier extracted",
            Stage::TracksListed => "tracks listed",
            Stage::LanguageSelected => "language selected",
            Stage::TranscriptAssembled => "transcript assembled",
            Stage::SummaryGenerated => "summary generated",
            Stage::Failed(reason) => return write!(f, "failed: {reason}"),
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
pub struct NotesRequest {
    pub url: String,
    /// Caption language to use; translation is requested when no track matches
    pub caption_lang: Option<String>,
    pub model: Model,
    pub words: u32,
    pub language: SummaryLanguage,
}

/// Everything a finished request produced
#[derive(Debug, Clone, Serialize)]
pub struct Notes {
    pub video_id: String,
    pub transcript: Transcript,
    pub summary: String,
    #[serde(rename = "elapsed_secs", serialize_with = "secs")]
    pub elapsed: Duration,
}

fn secs<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

struct Progress {
    stage: Stage,
}

impl Progress {
    fn advance(&mut self, next: Stage) {
        debug!("Request stage: {} -> {next}", self.stage);
        self.stage = next;
    }

    fn fail(&mut self, e: NotesError) -> NotesError {
        error!("Request failed after '{}': {e}", self.stage);
        self.stage = Stage::Failed(e.to_string());
        e
    }
}

/// Run one request from URL to generated notes; nothing partial is ever returned
pub async fn run<S, M>(source: &S, summarizer: &M, request: &NotesRequest) -> Result<Notes>
where
    S: CaptionSource,
    M: Summarizer,
{
    let mut progress = Progress { stage: Stage::Idle };

    let video_id =
        extract_video_id(&request.url).ok_or_else(|| progress.fail(NotesError::InvalidUrl(request.url.clone())))?;
    progress.advance(Stage::IdentifierExtracted);

    let tracks = source.list_tracks(&video_id).await.map_err(|e| progress.fail(e))?;
    progress.advance(Stage::TracksListed);

    let selection =
        select_track(&tracks, request.caption_lang.as_deref()).map_err(|e| progress.fail(e))?;
    progress.advance(Stage::LanguageSelected);

    let transcript = assemble(source, &selection).await.map_err(|e| progress.fail(e))?;
    progress.advance(Stage::TranscriptAssembled);

    let prompt = build_prompt(request.words, request.language) + &transcript.text;
    let model = request.model.api_name();

    let started = Instant::now();
    let summary = summarizer
        .generate(model, &prompt)
        .await
        .map_err(|e| progress.fail(e))?;
    let elapsed = started.elapsed();
    progress.advance(Stage::SummaryGenerated);

    info!("Generated notes for {video_id} with {model} in {elapsed:.2?}");

    Ok(Notes {
        video_id,
        transcript,
        summary,
        elapsed,
    })
}
