use std::sync::{Arc, Mutex};

use ytnotes::summarize::Summarizer;
use ytnotes::{NotesError, Result};

#[derive(Clone)]
pub struct MockSummarizer {
    pub summary: String,
    /// (model, prompt) for every call
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
    pub fail_with: Option<String>,
}

impl MockSummarizer {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            summary: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl Summarizer for MockSummarizer {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        if let Some(ref msg) = self.fail_with {
            return Err(NotesError::GenerationFailed(msg.clone()));
        }
        Ok(self.summary.clone())
    }
}
