//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics.
//! API Documentation: https://lrclib.net/docs

use serde::Deserialize;

/// One hit from the LRCLIB search endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct LrclibHit {
    #[allow(dead_code)]
    #[serde(rename = "trackName")]
    track_name: String,
    #[allow(dead_code)]
    #[serde(rename = "artistName")]
    artist_name: String,
    #[serde(rename = "syncedLyrics")]
    pub synced_lyrics: Option<String>,
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";
    const USER_AGENT: &'static str = "verse/0.1.0 (https://github.com/verse-player/verse)";

    /// Create a new LRCLIB client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(Self::USER_AGENT)
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("failed to create reqwest client"),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Search for synced lyrics by artist and title. Returns the raw LRC
    /// body of the first hit that carries synced lyrics, or None when the
    /// database has nothing usable.
    pub async fn search_synced(
        &self,
        artist: &str,
        title: &str,
    ) -> anyhow::Result<Option<String>> {
        let url = format!(
            "{}/search?artist_name={}&track_name={}",
            self.base_url,
            urlencoding::encode(artist),
            urlencoding::encode(title)
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("LRCLIB search error: {}", response.status());
        }

        let hits: Vec<LrclibHit> = response.json().await?;
        Ok(hits
            .into_iter()
            .find_map(|hit| hit.synced_lyrics.filter(|text| !text.is_empty())))
    }
}

impl Default for LrclibClient {
    fn default() -> Self {
        Self::new()
    }
}
