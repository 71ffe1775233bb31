use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ytnotes::captions::CaptionSource;
use ytnotes::{CaptionTrack, NotesError, Result, Snippet};

#[derive(Clone, Default)]
pub struct MockCaptionSource {
    pub tracks: Vec<CaptionTrack>,
    pub snippets: Vec<Snippet>,
    /// Errors returned by successive `list_tracks` calls before succeeding
    pub list_failures: Arc<Mutex<VecDeque<NotesError>>>,
    pub fetch_failure: Arc<Mutex<Option<NotesError>>>,
    pub list_calls: Arc<Mutex<Vec<String>>>,
    pub fetch_calls: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

pub fn track(code: &str, generated: bool, translatable: bool) -> CaptionTrack {
    CaptionTrack {
        language_code: code.to_string(),
        name: code.to_uppercase(),
        is_generated: generated,
        is_translatable: translatable,
        base_url: format!("https://captions.test/{code}"),
    }
}

pub fn snippets(texts: &[&str]) -> Vec<Snippet> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| Snippet {
            text: text.to_string(),
            start: i as f64,
            duration: Some(1.0),
        })
        .collect()
}

pub fn blocked() -> NotesError {
    NotesError::ServiceUnavailable {
        subject: "video dQw4w9WgXcQ".to_string(),
        reason: "HTTP 429 Too Many Requests".to_string(),
    }
}

impl MockCaptionSource {
    pub fn new(tracks: Vec<CaptionTrack>, snippets: Vec<Snippet>) -> Self {
        Self {
            tracks,
            snippets,
            ..Self::default()
        }
    }

    pub fn failing_list(self, errors: impl IntoIterator<Item = NotesError>) -> Self {
        self.list_failures.lock().unwrap().extend(errors);
        self
    }

    pub fn failing_fetch(self, error: NotesError) -> Self {
        *self.fetch_failure.lock().unwrap() = Some(error);
        self
    }
}

impl CaptionSource for MockCaptionSource {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        self.list_calls.lock().unwrap().push(video_id.to_string());
        if let Some(err) = self.list_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.tracks.clone())
    }

    async fn fetch_snippets(&self, track: &CaptionTrack, translate_to: Option<&str>) -> Result<Vec<Snippet>> {
        self.fetch_calls
            .lock()
            .unwrap()
            .push((track.language_code.clone(), translate_to.map(str::to_string)));
        if let Some(err) = self.fetch_failure.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.snippets.clone())
    }
}
