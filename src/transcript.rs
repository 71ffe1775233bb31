use log::{debug, info};

use crate::captions::CaptionSource;
use crate::{CaptionTrack, NotesError, Result, Snippet, Transcript};

/// Languages tried, in order, when the caller does not ask for one
pub const PREFERRED_LANGUAGES: [&str; 2] = ["ko", "en"];

/// Which track to fetch, and whether to have the backend translate it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<'a> {
    Track(&'a CaptionTrack),
    Translate { source: &'a CaptionTrack, target: String },
}

impl Selection<'_> {
    pub fn track(&self) -> &CaptionTrack {
        match self {
            Selection::Track(track) => track,
            Selection::Translate { source, .. } => source,
        }
    }

    pub fn target_language(&self) -> &str {
        match self {
            Selection::Track(track) => &track.language_code,
            Selection::Translate { target, .. } => target,
        }
    }
}

pub fn select_track<'a>(tracks: &'a [CaptionTrack], requested: Option<&str>) -> Result<Selection<'a>> {
    if let Some(code) = requested {
        if let Some(track) = tracks.iter().find(|t| t.language_code == code) {
            return Ok(Selection::Track(track));
        }
        return tracks
            .iter()
            .find(|t| t.is_translatable)
            .map(|source| Selection::Translate {
                source,
                target: code.to_string(),
            })
            .ok_or_else(|| NotesError::LanguageUnavailable {
                language: code.to_string(),
            });
    }

    let preferred = PREFERRED_LANGUAGES
        .iter()
        .find_map(|code| tracks.iter().find(|t| t.language_code == *code));

    preferred
        .or_else(|| tracks.first())
        .map(Selection::Track)
        .ok_or(NotesError::NoCaptionsAvailable)
}

/// Flatten snippets into one string, each preceded by a single space
pub fn join_snippets(snippets: &[Snippet]) -> String {
    let mut text = String::with_capacity(snippets.iter().map(|s| s.text.len() + 1).sum());
    for snippet in snippets {
        text.push(' ');
        text.push_str(&snippet.text);
    }
    text
}

/// Fetch the selected track (translated if needed) and flatten it to text
pub async fn assemble<S: CaptionSource>(source: &S, selection: &Selection<'_>) -> Result<Transcript> {
    let (snippets, translated_from) = match selection {
        Selection::Track(track) => {
            debug!("Using caption track: lang={} ({})", track.language_code, track.name);
            (source.fetch_snippets(track, None).await?, None)
        }
        Selection::Translate { source: track, target } => {
            info!(
                "No '{target}' captions; translating from {} ({})",
                track.language_code, track.name
            );
            (
                source.fetch_snippets(track, Some(target.as_str())).await?,
                Some(track.language_code.clone()),
            )
        }
    };

    debug!("Assembling {} snippets", snippets.len());

    Ok(Transcript {
        language_code: selection.target_language().to_string(),
        translated_from,
        text: join_snippets(&snippets),
    })
}

/// Pick a track, fetch it, and flatten it to text
pub async fn fetch_transcript<S: CaptionSource>(
    source: &S,
    tracks: &[CaptionTrack],
    requested: Option<&str>,
) -> Result<Transcript> {
    let selection = select_track(tracks, requested)?;
    assemble(source, &selection).await
}
