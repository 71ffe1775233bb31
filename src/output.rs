use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CaptionTrack;
use crate::pipeline::Notes;

/// Common targets offered for machine translation of a translatable track
pub const TRANSLATION_TARGETS: [(&str, &str); 9] = [
    ("ko", "Korean"),
    ("en", "English"),
    ("ja", "Japanese"),
    ("zh-Hans", "Chinese (Simplified)"),
    ("zh-Hant", "Chinese (Traditional)"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("ru", "Russian"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").expect("heading pattern is valid"));
static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*|__").expect("emphasis pattern is valid"));
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)[*+][ \t]+").expect("bullet pattern is valid"));

/// Drop heading and bold markers, normalize bullets to dashes
pub fn plain_text(markdown: &str) -> String {
    let text = HEADING_RE.replace_all(markdown, "");
    let text = EMPHASIS_RE.replace_all(&text, "");
    BULLET_RE.replace_all(&text, "${1}- ").into_owned()
}

/// Render generated notes for the terminal
pub fn render_notes(notes: &Notes, format: OutputFormat) -> serde_json::Result<String> {
    let summary = &notes.summary;
    Ok(match format {
        OutputFormat::Text => format!("Detailed notes:\n\n{}", plain_text(summary)),
        OutputFormat::Markdown => format!("## Detailed notes\n\n{summary}"),
        OutputFormat::Json => serde_json::to_string_pretty(notes)?,
    })
}

pub fn notes_file_name(video_id: &str) -> String {
    format!("youtube_notes_{video_id}.txt")
}

fn render_group(out: &mut Vec<String>, heading: &str, tracks: &[&CaptionTrack]) {
    out.push(heading.to_string());
    if tracks.is_empty() {
        out.push("  none".to_string());
    }
    for t in tracks {
        let translatable = if t.is_translatable { ", translatable" } else { "" };
        out.push(format!("  - {} ({}{translatable})", t.name, t.language_code));
    }
}

/// Tracks as a JSON array, in listing order
pub fn render_track_list_json(tracks: &[CaptionTrack]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(tracks)
}

/// Render available tracks split into manual and auto-generated groups
pub fn render_track_list(tracks: &[CaptionTrack]) -> String {
    if tracks.is_empty() {
        return "This video has no captions available.".to_string();
    }

    let (generated, manual): (Vec<&CaptionTrack>, Vec<&CaptionTrack>) = tracks.iter().partition(|t| t.is_generated);

    let mut out = Vec::new();
    render_group(&mut out, "Manual captions:", &manual);
    render_group(&mut out, "Auto-generated captions:", &generated);

    if tracks.iter().any(|t| t.is_translatable) {
        out.push(String::new());
        out.push("Translation targets (use --lang CODE):".to_string());
        for (code, name) in TRANSLATION_TARGETS {
            out.push(format!("  - {name} ({code})"));
        }
    }

    out.join("\n")
}
