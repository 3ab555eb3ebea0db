//! # YouTube Channel Resolution Module
//!
//! Resolves a submitted YouTube channel URL (channel-ID, custom-URL, legacy
//! username, or @handle form) to a canonical channel ID and display name via
//! the YouTube Data API v3. Display names are filtered down to their Latin
//! segments because the verification OCR pass runs the channel name against
//! English-language screenshots; when nothing Latin remains, the @handle
//! from the URL stands in.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

static URL_FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://)?(www\.)?youtube\.com/").expect("url format regex must compile")
});

static LATIN_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9 ]+$").expect("latin segment regex must compile"));

static URL_HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([a-zA-Z0-9_]+)").expect("handle regex must compile"));

/// The identifier forms a channel URL can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// 24-character canonical channel ID (`/channel/UC...`)
    ChannelId,
    /// Custom URL (`/c/name`)
    Custom,
    /// Legacy username (`/user/name`)
    User,
    /// Handle (`/@name`)
    Handle,
}

/// Extracted identifier plus its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelIdentifier {
    pub kind: IdentifierKind,
    pub value: String,
}

/// Resolved channel data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub title: String,
}

/// Check a string looks like a YouTube channel URL at all
pub fn is_youtube_url(url: &str) -> bool {
    URL_FORMAT_RE.is_match(url)
}

/// Extract the channel identifier from any of the supported URL forms
pub fn extract_identifier(url: &str) -> Option<ChannelIdentifier> {
    static PATTERNS: LazyLock<Vec<(Regex, IdentifierKind)>> = LazyLock::new(|| {
        vec![
            (
                Regex::new(r"/channel/([a-zA-Z0-9_-]{24})").expect("channel id regex"),
                IdentifierKind::ChannelId,
            ),
            (
                Regex::new(r"/c/([a-zA-Z0-9_-]+)").expect("custom url regex"),
                IdentifierKind::Custom,
            ),
            (
                Regex::new(r"/user/([a-zA-Z0-9_-]+)").expect("user url regex"),
                IdentifierKind::User,
            ),
            (
                Regex::new(r"/@([a-zA-Z0-9_.-]+)").expect("handle url regex"),
                IdentifierKind::Handle,
            ),
        ]
    });

    for (pattern, kind) in PATTERNS.iter() {
        if let Some(captures) = pattern.captures(url) {
            return Some(ChannelIdentifier {
                kind: *kind,
                value: captures[1].to_string(),
            });
        }
    }
    None
}

/// Keep only the Latin words of a display name.
///
/// Segments made purely of `[a-zA-Z0-9 ]` survive; when none do, fall back
/// to the @handle from the URL, and as a last resort return the original
/// text unchanged.
pub fn filter_latin_segments(text: &str, url: &str) -> String {
    let valid_segments: Vec<&str> = text
        .split_whitespace()
        .filter(|segment| LATIN_SEGMENT_RE.is_match(segment))
        .collect();

    let filtered = valid_segments.join(" ");
    if !filtered.is_empty() {
        return filtered;
    }

    match URL_HANDLE_RE.captures(url) {
        Some(captures) => captures[1].to_string(),
        None => text.to_string(),
    }
}

// YouTube Data API v3 response shapes (only the fields we read)

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "channelId", default)]
    channel_id: Option<String>,
}

/// YouTube Data API v3 client
pub struct YoutubeClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl YoutubeClient {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create YouTube HTTP client: {}", e))?;

        Ok(Self {
            api_key,
            http,
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
        })
    }

    /// Resolve a channel URL to its canonical ID and filtered display name.
    ///
    /// Returns `Ok(None)` when the URL carries no recognizable identifier or
    /// the API finds no matching channel.
    pub async fn resolve_channel(&self, url: &str) -> anyhow::Result<Option<ChannelInfo>> {
        let identifier = match extract_identifier(url) {
            Some(identifier) => identifier,
            None => {
                debug!(url = %url, "No channel identifier found in URL");
                return Ok(None);
            }
        };

        let channel = match identifier.kind {
            IdentifierKind::ChannelId => self.lookup_by_id(&identifier.value).await?,
            _ => match self.search_channel_id(&identifier.value).await? {
                Some(channel_id) => self.lookup_by_id(&channel_id).await?,
                None => None,
            },
        };

        Ok(channel.map(|info| ChannelInfo {
            title: filter_latin_segments(&info.title, url),
            ..info
        }))
    }

    /// `channels.list` by canonical channel ID
    async fn lookup_by_id(&self, channel_id: &str) -> anyhow::Result<Option<ChannelInfo>> {
        let response = self
            .http
            .get(format!("{}/channels", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("id", channel_id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("YouTube channels.list request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "YouTube channels.list returned HTTP {}",
                response.status().as_u16()
            ));
        }

        let parsed: ChannelListResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Invalid channels.list response: {}", e))?;

        Ok(parsed.items.into_iter().next().map(|item| ChannelInfo {
            channel_id: item.id,
            title: item.snippet.title,
        }))
    }

    /// `search.list` to turn a custom URL / username / handle into an ID
    async fn search_channel_id(&self, query: &str) -> anyhow::Result<Option<String>> {
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "channel"),
                ("maxResults", "1"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("YouTube search.list request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "YouTube search.list returned HTTP {}",
                response.status().as_u16()
            ));
        }

        let parsed: SearchListResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Invalid search.list response: {}", e))?;

        let channel_id = parsed
            .items
            .into_iter()
            .next()
            .and_then(|item| item.id.channel_id);

        if channel_id.is_none() {
            warn!(query = %query, "YouTube search found no channel");
        }
        Ok(channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_youtube_url() {
        assert!(is_youtube_url("https://www.youtube.com/@SomeChannel"));
        assert!(is_youtube_url("http://youtube.com/channel/UCabcdefghijklmnopqrstuv"));
        assert!(is_youtube_url("youtube.com/c/Something"));
        assert!(!is_youtube_url("https://vimeo.com/12345"));
    }

    #[test]
    fn test_extract_identifier_forms() {
        let id = extract_identifier("https://www.youtube.com/channel/UCabcdefghijklmnopqr_-12")
            .expect("channel id should extract");
        assert_eq!(id.kind, IdentifierKind::ChannelId);
        assert_eq!(id.value, "UCabcdefghijklmnopqr_-12");

        let custom = extract_identifier("https://youtube.com/c/MyChannel")
            .expect("custom url should extract");
        assert_eq!(custom.kind, IdentifierKind::Custom);
        assert_eq!(custom.value, "MyChannel");

        let user =
            extract_identifier("https://youtube.com/user/OldName").expect("user should extract");
        assert_eq!(user.kind, IdentifierKind::User);

        let handle = extract_identifier("https://www.youtube.com/@Some.Handle-1")
            .expect("handle should extract");
        assert_eq!(handle.kind, IdentifierKind::Handle);
        assert_eq!(handle.value, "Some.Handle-1");

        assert!(extract_identifier("https://www.youtube.com/watch?v=abc").is_none());
    }

    #[test]
    fn test_filter_latin_segments_keeps_english() {
        let filtered = filter_latin_segments("Tech Channel 42", "https://youtube.com/@tech");
        assert_eq!(filtered, "Tech Channel 42");
    }

    #[test]
    fn test_filter_latin_segments_drops_non_latin_words() {
        let filtered = filter_latin_segments("قناة Tech قناة", "https://youtube.com/@tech");
        assert_eq!(filtered, "Tech");
    }

    #[test]
    fn test_filter_latin_segments_falls_back_to_handle() {
        let filtered = filter_latin_segments("قناة التقنية", "https://youtube.com/@TechHandle");
        assert_eq!(filtered, "TechHandle");
    }

    #[test]
    fn test_filter_latin_segments_last_resort_original() {
        let filtered = filter_latin_segments("قناة التقنية", "https://youtube.com/channel/UCx");
        assert_eq!(filtered, "قناة التقنية");
    }
}
