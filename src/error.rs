use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotesError {
    #[error("could not extract a video ID from: {0}")]
    InvalidUrl(String),

    #[error("video {video_id} not found or has no captions: {reason}")]
    NotFound { video_id: String, reason: String },

    #[error("YouTube blocked the request for {subject}: {reason}")]
    ServiceUnavailable { subject: String, reason: String },

    #[error("no captions in language '{language}' and no translatable track to translate from")]
    LanguageUnavailable { language: String },

    #[error("this video has no captions available")]
    NoCaptionsAvailable,

    #[error("caption data could not be read: {0}")]
    MalformedCaptionData(String),

    #[error("summary generation failed: {0}")]
    GenerationFailed(String),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("caption request failed: {0}")]
    Unknown(String),
}

impl NotesError {
    /// Only throttling/blocking from the caption backend is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotesError::ServiceUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, NotesError>;
