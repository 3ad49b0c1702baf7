use std::collections::HashMap;

use serde::Deserialize;

use super::{VideoError, VideoResult, VideoSearchProvider, VideoSearchResult};
use crate::http::{HttpClient, HttpResponseData, Upstream};

const ERROR_BODY_MAX_CHARS: usize = 400;
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// YouTube Data API v3 search plus a follow-up lookup for durations.
#[derive(Debug, Clone)]
pub struct YouTubeSearch {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl YouTubeSearch {
    pub fn new(http: HttpClient, api_key: String, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn search_ids(&self, query: &str, limit: usize) -> VideoSearchResult<Vec<SearchItem>> {
        let max_results = limit.to_string();
        let resp = self
            .http
            .get(
                Upstream::YouTube,
                &format!("{}/youtube/v3/search", self.base_url),
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("maxResults", max_results.as_str()),
                    ("q", query),
                    ("key", self.api_key.as_str()),
                ],
            )
            .await
            .map_err(|err| VideoError::Transport(err.to_string()))?;

        let parsed: SearchResponse = parse_success(&resp)?;
        Ok(parsed
            .items
            .into_iter()
            .filter(|item| item.id.video_id.is_some())
            .take(limit)
            .collect())
    }

    async fn durations(&self, ids: &[String]) -> VideoSearchResult<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = ids.join(",");
        let resp = self
            .http
            .get(
                Upstream::YouTube,
                &format!("{}/youtube/v3/videos", self.base_url),
                &[
                    ("part", "contentDetails"),
                    ("id", joined.as_str()),
                    ("key", self.api_key.as_str()),
                ],
            )
            .await
            .map_err(|err| VideoError::Transport(err.to_string()))?;

        let parsed: VideosResponse = parse_success(&resp)?;
        Ok(parsed
            .items
            .into_iter()
            .filter_map(|item| {
                let duration = item.content_details?.duration?;
                Some((item.id, format_iso_duration(&duration)?))
            })
            .collect())
    }
}

impl VideoSearchProvider for YouTubeSearch {
    async fn search(&self, query: &str, limit: usize) -> VideoSearchResult<Vec<VideoResult>> {
        let items = self.search_ids(query, limit).await?;
        let ids = items
            .iter()
            .filter_map(|item| item.id.video_id.clone())
            .collect::<Vec<_>>();
        let durations = self.durations(&ids).await?;

        Ok(items
            .into_iter()
            .filter_map(|item| {
                let id = item.id.video_id?;
                let duration = durations
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| "N/A".to_string());
                Some(VideoResult {
                    title: unescape_html(&item.snippet.title),
                    link: format!("{WATCH_URL}{id}"),
                    channel: unescape_html(&item.snippet.channel_title),
                    duration,
                })
            })
            .collect())
    }
}

fn parse_success<T: for<'de> Deserialize<'de>>(resp: &HttpResponseData) -> VideoSearchResult<T> {
    if !resp.is_success() {
        return Err(VideoError::HttpStatus {
            status: resp.status,
            body: resp.error_excerpt(ERROR_BODY_MAX_CHARS),
        });
    }
    resp.json().map_err(|err| VideoError::Parse(err.to_string()))
}

/// `PT1H2M3S` -> `1:02:03`, `PT4M5S` -> `4:05`.
pub fn format_iso_duration(raw: &str) -> Option<String> {
    let rest = raw.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, time),
        None => (rest, ""),
    };

    let mut total_secs = 0_u64;
    for (part, units) in [
        (date_part, &[('W', 604_800), ('D', 86_400)][..]),
        (time_part, &[('H', 3_600), ('M', 60), ('S', 1)][..]),
    ] {
        let mut digits = String::new();
        for ch in part.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }
            let (_, factor) = units.iter().find(|(unit, _)| *unit == ch)?;
            let value = digits.parse::<u64>().ok()?;
            total_secs += value * factor;
            digits.clear();
        }
        if !digits.is_empty() {
            return None;
        }
    }

    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    Some(if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    })
}

fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    title: String,
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}
