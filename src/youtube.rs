use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::captions::CaptionSource;
use crate::config::ProxyCredentials;
use crate::{CaptionTrack, NotesError, Result, Snippet, watch_url};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const WEBSHARE_PROXY_URL: &str = "http://p.webshare.io:80";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InnerTubePlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<RawCaptionTrack>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionTrack {
    base_url: String,
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
    #[serde(default)]
    is_translatable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    runs: Option<Vec<TextRun>>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl RawCaptionTrack {
    fn into_track(self) -> CaptionTrack {
        let name = self
            .name
            .and_then(|n| {
                n.simple_text
                    .or_else(|| n.runs.and_then(|runs| runs.into_iter().next()).map(|r| r.text))
            })
            .unwrap_or_else(|| self.language_code.clone());

        CaptionTrack {
            is_generated: self.kind.as_deref() == Some("asr"),
            is_translatable: self.is_translatable,
            base_url: self.base_url.replace("&fmt=srv3", ""),
            language_code: self.language_code,
            name,
        }
    }
}

/// Caption source backed by YouTube's InnerTube player API and timed-text endpoint
pub struct YouTubeCaptions {
    client: reqwest::Client,
}

impl YouTubeCaptions {
    pub fn new(proxy: Option<&ProxyCredentials>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(creds) = proxy {
            debug!("Routing caption requests through {WEBSHARE_PROXY_URL} as {}", creds.username);
            let proxy = reqwest::Proxy::all(WEBSHARE_PROXY_URL)
                .map_err(|e| NotesError::Unknown(format!("invalid proxy configuration: {e}")))?
                .basic_auth(&format!("{}-rotate", creds.username), &creds.password);
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| NotesError::Unknown(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn get_text(&self, url: &str, subject: &str) -> Result<String> {
        let resp = self.client.get(url).send().await.map_err(transport_error)?;
        check_status(&resp, subject)?;
        resp.text().await.map_err(transport_error)
    }

    async fn fetch_player(&self, video_id: &str) -> Result<InnerTubePlayerResponse> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = watch_url(video_id);
        let subject = format!("video {video_id}");
        debug!("Fetching watch page: {watch_url}");
        let page_html = self.get_text(&watch_url, &subject).await?;

        let api_key = extract_api_key(&page_html, video_id)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");

        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "20.10.38"
                }
            },
            "videoId": video_id
        });

        let resp = self
            .client
            .post(&player_url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(&resp, &subject)?;

        resp.json()
            .await
            .map_err(|e| NotesError::Unknown(format!("unreadable InnerTube response: {e}")))
    }
}

impl CaptionSource for YouTubeCaptions {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        let resp = self.fetch_player(video_id).await?;
        tracks_from_player(resp, video_id)
    }

    async fn fetch_snippets(&self, track: &CaptionTrack, translate_to: Option<&str>) -> Result<Vec<Snippet>> {
        let url = snippet_url(track, translate_to);
        debug!(
            "Fetching caption track: lang={} translate_to={translate_to:?}",
            track.language_code
        );

        let subject = format!("{} caption track", track.language_code);
        let caption_xml = self.get_text(&url, &subject).await?;
        parse_caption_xml(&caption_xml)
    }
}

fn transport_error(e: reqwest::Error) -> NotesError {
    NotesError::Unknown(e.to_string())
}

/// Timed-text URL for a track, asking the backend to translate when a target is given
fn snippet_url(track: &CaptionTrack, translate_to: Option<&str>) -> String {
    match translate_to {
        Some(target) => format!("{}&tlang={target}", track.base_url),
        None => track.base_url.clone(),
    }
}

fn check_status(resp: &reqwest::Response, subject: &str) -> Result<()> {
    status_error(resp.status(), subject, resp.url().as_str())
}

fn status_error(status: reqwest::StatusCode, subject: &str, url: &str) -> Result<()> {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(NotesError::ServiceUnavailable {
            subject: subject.to_string(),
            reason: format!("HTTP {status}"),
        });
    }
    if !status.is_success() {
        return Err(NotesError::Unknown(format!("HTTP {status} for {url}")));
    }
    Ok(())
}

fn extract_api_key(html: &str, video_id: &str) -> Result<String> {
    if html.contains("g-recaptcha") {
        return Err(NotesError::ServiceUnavailable {
            subject: format!("video {video_id}"),
            reason: "watch page served a reCAPTCHA challenge".to_string(),
        });
    }

    let patterns = [
        r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#,
        // Fallback: try the newer pattern
        r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#,
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).map_err(|e| NotesError::Unknown(e.to_string()))?;
        if let Some(caps) = re.captures(html) {
            return Ok(caps[1].to_string());
        }
    }

    Err(NotesError::Unknown(
        "could not extract InnerTube API key from watch page".to_string(),
    ))
}

fn assert_playable(status: Option<&PlayabilityStatus>, video_id: &str) -> Result<()> {
    let Some(status) = status else {
        return Ok(());
    };
    let code = status.status.as_deref().unwrap_or("OK");
    let reason = status.reason.clone().unwrap_or_default();

    match code {
        "OK" => Ok(()),
        "LOGIN_REQUIRED" if reason.contains("not a bot") => Err(NotesError::ServiceUnavailable {
            subject: format!("video {video_id}"),
            reason,
        }),
        "ERROR" if reason.to_lowercase().contains("unavailable") => Err(NotesError::NotFound {
            video_id: video_id.to_string(),
            reason,
        }),
        _ => Err(NotesError::Unknown(format!("video {video_id} is not playable ({code}): {reason}"))),
    }
}

fn tracks_from_player(resp: InnerTubePlayerResponse, video_id: &str) -> Result<Vec<CaptionTrack>> {
    assert_playable(resp.playability_status.as_ref(), video_id)?;

    let raw = resp
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default();

    if raw.is_empty() {
        return Err(NotesError::NotFound {
            video_id: video_id.to_string(),
            reason: "transcripts are disabled or none were published".to_string(),
        });
    }

    let (manual, generated): (Vec<_>, Vec<_>) = raw
        .into_iter()
        .map(RawCaptionTrack::into_track)
        .partition(|t| !t.is_generated);

    debug!(
        "Found {} manual and {} auto-generated tracks for {video_id}",
        manual.len(),
        generated.len()
    );
    Ok(manual.into_iter().chain(generated).collect())
}

fn parse_timing(e: &quick_xml::events::BytesStart<'_>) -> Result<(f64, Option<f64>)> {
    let mut start = None;
    let mut dur = None;
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"start" => {
                start = Some(value.parse::<f64>().map_err(|_| {
                    NotesError::MalformedCaptionData(format!("invalid start offset '{value}'"))
                })?);
            }
            b"dur" => dur = value.parse::<f64>().ok(),
            _ => {}
        }
    }
    let start = start.ok_or_else(|| NotesError::MalformedCaptionData("caption entry without a start offset".to_string()))?;
    Ok((start, dur))
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Snippet>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut snippets = Vec::new();
    let mut current: Option<(f64, Option<f64>)> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                current = Some(parse_timing(e)?);
                text.clear();
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"text" => {
                let (start, duration) = parse_timing(e)?;
                snippets.push(Snippet {
                    text: String::new(),
                    start,
                    duration,
                });
            }
            Ok(Event::Text(ref e)) if current.is_some() => {
                let raw = e
                    .unescape()
                    .map_err(|err| NotesError::MalformedCaptionData(format!("undecodable caption text: {err}")))?;
                text.push_str(&raw);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                if let Some((start, duration)) = current.take() {
                    snippets.push(Snippet {
                        text: html_escape::decode_html_entities(&text).to_string(),
                        start,
                        duration,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(NotesError::MalformedCaptionData(format!(
                    "error parsing caption XML: {e}"
                )));
            }
            _ => {}
        }
    }

    Ok(snippets)
}
