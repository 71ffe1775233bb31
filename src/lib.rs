pub mod captions;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod retry;
pub mod summarize;
pub mod transcript;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use error::{NotesError, Result};

/// One caption track published for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionTrack {
    pub language_code: String,
    pub name: String,
    pub is_generated: bool,
    pub is_translatable: bool,
    /// Opaque handle the caption source uses to fetch this track
    #[serde(skip)]
    pub base_url: String,
}

/// A single timed caption fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub text: String,
    pub start: f64,
    pub duration: Option<f64>,
}

/// Flattened caption text for the chosen track
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub language_code: String,
    pub translated_from: Option<String>,
    pub text: String,
}

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)([^&\n?]+)")
        .expect("video ID pattern is valid")
});

/// Extract video ID from the supported YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(input.trim())
        .map(|caps| caps[1].to_string())
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/0.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=120"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_short_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_short_url_with_query() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=abcdef"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_token_stops_at_newline() {
        assert_eq!(
            extract_video_id("https://youtu.be/abc123\nhttps://youtu.be/other"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_shorts_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_bare_id_is_not_a_url() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_invalid_url() {
        assert_eq!(extract_video_id("https://vimeo.com/12345"), None);
    }

    #[test]
    fn test_marker_without_token() {
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v="), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_whitespace_trimming() {
        assert_eq!(
            extract_video_id("  https://youtu.be/dQw4w9WgXcQ  "),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_thumbnail_and_watch_urls() {
        assert_eq!(thumbnail_url("abc"), "https://img.youtube.com/vi/abc/0.jpg");
        assert_eq!(watch_url("abc"), "https://www.youtube.com/watch?v=abc");
    }
}
