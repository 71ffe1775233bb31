use std::future::Future;

use crate::{CaptionTrack, Result, Snippet};

/// A backend that publishes caption tracks for videos.
///
/// Implementations make exactly one logical request per call and never retry;
/// wrap them in [`crate::retry::Retrying`] for backoff on throttling.
pub trait CaptionSource {
    /// List tracks in listing order: manually created first, then auto-generated
    fn list_tracks(&self, video_id: &str) -> impl Future<Output = Result<Vec<CaptionTrack>>>;

    /// Fetch the ordered snippets of a track, machine-translated when `translate_to` is set
    fn fetch_snippets(
        &self,
        track: &CaptionTrack,
        translate_to: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Snippet>>>;
}
