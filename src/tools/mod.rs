mod career;
pub mod registry;
mod roadmap;
mod videos;

use std::sync::Arc;
use std::time::Duration;

use crate::knowledge::KnowledgeBaseStore;
use crate::llm::provider::LlmProvider;
use crate::video::VideoSearchProvider;

pub use career::{CAREER_INFO_TOOL, CareerInfoTool, career_info_schema};
pub use registry::{
    ParamType, RegistryError, ToolArgs, ToolCall, ToolError, ToolHandler, ToolOutcome,
    ToolParameter, ToolPayload, ToolRegistry, ToolReply, ToolSchema,
};
pub use roadmap::{
    CAREER_ROADMAP_TOOL, CareerRoadmapTool, DEFAULT_ROADMAP_DELAY, career_roadmap_schema,
    roadmap_prompt,
};
pub use videos::{YOUTUBE_VIDEOS_TOOL, YouTubeVideosTool, format_videos, youtube_videos_schema};

/// Career info, video search and roadmap generation, in that order.
pub fn default_registry<P, V>(
    provider: P,
    videos: Option<V>,
    knowledge: Arc<dyn KnowledgeBaseStore>,
    roadmap_delay: Duration,
) -> Result<ToolRegistry, RegistryError>
where
    P: LlmProvider + Send + Sync + 'static,
    V: VideoSearchProvider + 'static,
{
    let mut registry = ToolRegistry::new();
    registry.register(career_info_schema(), Arc::new(CareerInfoTool::new(knowledge)))?;
    registry.register(
        youtube_videos_schema(),
        Arc::new(YouTubeVideosTool::new(videos)),
    )?;
    registry.register(
        career_roadmap_schema(),
        Arc::new(CareerRoadmapTool::new(provider, roadmap_delay)),
    )?;
    Ok(registry)
}
