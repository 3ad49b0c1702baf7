use async_trait::async_trait;

use super::registry::{ParamType, ToolArgs, ToolError, ToolHandler, ToolReply, ToolSchema};
use crate::video::{VideoResult, VideoSearchProvider};

pub const YOUTUBE_VIDEOS_TOOL: &str = "get_youtube_videos";
const VIDEO_LIMIT: usize = 3;

pub fn youtube_videos_schema() -> ToolSchema {
    ToolSchema::new(
        YOUTUBE_VIDEOS_TOOL,
        "Fetches top YouTube learning videos related to the career.",
    )
    .required(
        "career",
        ParamType::String,
        "Career name to search videos for.",
    )
}

pub struct YouTubeVideosTool<V> {
    search: Option<V>,
}

impl<V> YouTubeVideosTool<V> {
    /// `None` means no YouTube key is configured.
    pub fn new(search: Option<V>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl<V: VideoSearchProvider> ToolHandler for YouTubeVideosTool<V> {
    async fn call(&self, args: ToolArgs) -> Result<ToolReply, ToolError> {
        let Some(search) = &self.search else {
            return Ok(ToolReply::text(
                "Video suggestions are not configured. Set YOUTUBE_API_KEY to enable them.",
            ));
        };

        let career = args.string("career").unwrap_or_default().trim();
        let query = format!("{career} roadmap skills");
        match search.search(&query, VIDEO_LIMIT).await {
            Ok(videos) => Ok(ToolReply::text(format_videos(&videos))),
            Err(err) => Ok(ToolReply::text(format!(
                "Error fetching YouTube videos: {err}"
            ))),
        }
    }
}

pub fn format_videos(videos: &[VideoResult]) -> String {
    if videos.is_empty() {
        return "No videos found.".to_string();
    }

    videos
        .iter()
        .map(|video| {
            format!(
                "- [{}]({}) by {} ({})",
                video.title, video.link, video.channel, video.duration
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
