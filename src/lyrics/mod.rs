//! Lyrics: parsing, remote lookup, and the cache-first resolution flow
//!
//! This module provides:
//! - LRCLIB API client for fetching lyrics
//! - a parser for synced and plain lyrics text
//! - `resolve`, the cache -> search -> cache-write pipeline

pub mod lrclib;
pub mod parser;

pub use lrclib::LrclibClient;
pub use parser::{LyricLine, LyricsTrack};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::storage::StorageHandle;

static JUNK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[.*?\]|\(.*?\)|official|lyric|video|audio|h[dq]")
        .expect("junk pattern")
});
static FEAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:ft\.?|feat\.?)\s+.*$").expect("feat pattern"));

/// Clean tag values before they become search terms. Uploader junk
/// ("Official Lyric Video [HD]"), bracketed annotations and featuring
/// credits never appear in the lyrics database's canonical titles.
pub fn sanitize_for_search(artist: &str, title: &str) -> (String, String) {
    (sanitize_term(artist), sanitize_term(title))
}

fn sanitize_term(raw: &str) -> String {
    let cleaned = JUNK_RE.replace_all(raw, "");
    let cleaned = FEAT_RE.replace_all(cleaned.trim(), "");
    cleaned
        .trim()
        .trim_end_matches(['-', ':'])
        .trim()
        .to_string()
}

/// Resolve displayable lyrics for a track: cache first (keyed by the
/// track fingerprint, skipped when none exists yet), then an LRCLIB
/// search with sanitized terms, persisting whatever the search returns.
///
/// Never fails to the caller: any error degrades to a plain one-line
/// message suitable for the lyrics pane.
pub async fn resolve(
    storage: StorageHandle,
    client: LrclibClient,
    artist: String,
    title: String,
    fingerprint: Option<String>,
    force_refresh: bool,
) -> LyricsTrack {
    if !force_refresh && let Some(id) = &fingerprint {
        let storage = storage.clone();
        let id = id.clone();
        if let Ok(Ok(Some(text))) =
            tokio::task::spawn_blocking(move || storage.get_lyrics(&id)).await
        {
            return LyricsTrack::parse(&text);
        }
    }

    let (artist, title) = sanitize_for_search(&artist, &title);
    match client.search_synced(&artist, &title).await {
        Ok(Some(text)) => {
            if let Some(id) = fingerprint {
                let stored = text.clone();
                let result = tokio::task::spawn_blocking(move || {
                    storage.put_lyrics(&id, &stored, crate::storage::now_unix())
                })
                .await;
                if let Ok(Err(e)) = result {
                    tracing::warn!("failed to cache lyrics: {e:#}");
                }
            }
            LyricsTrack::parse(&text)
        }
        Ok(None) => LyricsTrack::default(),
        Err(e) => {
            tracing::warn!("lyrics search failed: {e:#}");
            LyricsTrack::message("Error finding lyrics.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_junk_words_and_brackets() {
        let (artist, title) = sanitize_for_search(
            "Some Artist",
            "Great Song (Official Lyric Video) [HD]",
        );
        assert_eq!(artist, "Some Artist");
        assert_eq!(title, "Great Song");
    }

    #[test]
    fn test_sanitize_strips_feat_suffix() {
        let (artist, title) =
            sanitize_for_search("Artist ft. Somebody", "Song feat. Someone Else");
        assert_eq!(artist, "Artist");
        assert_eq!(title, "Song");
    }

    #[test]
    fn test_sanitize_strips_trailing_separators() {
        let (_, title) = sanitize_for_search("x", "Great Song (Audio) - ");
        assert_eq!(title, "Great Song");
        let (_, title) = sanitize_for_search("x", "Great Song:");
        assert_eq!(title, "Great Song");
    }

    #[test]
    fn test_sanitize_is_case_insensitive() {
        let (_, title) = sanitize_for_search("x", "Great Song OFFICIAL VIDEO hq");
        assert_eq!(title, "Great Song");
    }

    #[test]
    fn test_sanitize_keeps_clean_input() {
        let (artist, title) = sanitize_for_search("Plain Artist", "Plain Title");
        assert_eq!(artist, "Plain Artist");
        assert_eq!(title, "Plain Title");
    }
}
