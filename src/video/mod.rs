mod youtube;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use youtube::{YouTubeSearch, format_iso_duration};

pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoResult {
    pub title: String,
    pub link: String,
    pub channel: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    HttpStatus { status: u16, body: String },
    Transport(String),
    Parse(String),
}

impl Display for VideoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpStatus { status, body } => {
                write!(f, "video search failed with status {status}: {body}")
            }
            Self::Transport(msg) => write!(f, "video search transport error: {msg}"),
            Self::Parse(msg) => write!(f, "video search parse error: {msg}"),
        }
    }
}

impl Error for VideoError {}

pub type VideoSearchResult<T> = std::result::Result<T, VideoError>;

pub trait VideoSearchProvider: Send + Sync {
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = VideoSearchResult<Vec<VideoResult>>> + Send;
}
