use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::registry::{ParamType, ToolArgs, ToolError, ToolHandler, ToolReply, ToolSchema};
use crate::llm::provider::{AssistantInput, LlmProvider};

pub const CAREER_ROADMAP_TOOL: &str = "get_career_roadmap";
pub const DEFAULT_ROADMAP_DELAY: Duration = Duration::from_millis(1_000);

pub fn career_roadmap_schema() -> ToolSchema {
    ToolSchema::new(
        CAREER_ROADMAP_TOOL,
        "Provides a detailed career roadmap, skills, and resources for a specific career path like 'data science' or 'software engineer'. Use this when the user asks for a roadmap or expresses interest in a specific career.",
    )
    .required(
        "career",
        ParamType::String,
        "The name of the career path, e.g., 'Software Engineer'.",
    )
}

pub fn roadmap_prompt(career: &str) -> String {
    format!(
        r#"You are a world-class career mentor providing a detailed guide for an aspiring '{career}'.
Your response must be encouraging, clear, and structured.
Generate the following sections in well-formatted Markdown:

### Key Skills to Master
List and briefly describe the most crucial technical and soft skills.

### Career Roadmap Summary
Provide a step-by-step summary of the career path from beginner to advanced.

### Resume Keywords
Suggest powerful keywords to include in a resume for this career.

### Recommended Learning Resources
Provide a bulleted list of 3-5 high-quality learning resources. Include a mix of online courses, essential books, and popular YouTube channels or blogs.

### Career Roadmap Visualization
Create a Mermaid flowchart using modern Mermaid v10 syntax.
- Use the graph TD direction for a top-down flowchart.
- Enclose all node text in double quotes within the brackets, for example: A["Step 1: Learn Python"] --> B["Step 2: Master SQL"];
- Put the chart in a fenced code block whose info string is mermaid."#
    )
}

/// Generates roadmaps with a separate tool-less model call, cached per career.
pub struct CareerRoadmapTool<P> {
    provider: P,
    delay: Duration,
    cache: Mutex<HashMap<String, String>>,
}

impl<P> CareerRoadmapTool<P> {
    pub fn new(provider: P, delay: Duration) -> Self {
        Self {
            provider,
            delay,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &str) -> Option<String> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn remember(&self, key: String, roadmap: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, roadmap.to_string());
        }
    }
}

#[async_trait]
impl<P: LlmProvider + Send + Sync> ToolHandler for CareerRoadmapTool<P> {
    async fn call(&self, args: ToolArgs) -> Result<ToolReply, ToolError> {
        let career = args.string("career").unwrap_or_default().trim();
        if career.is_empty() {
            return Err(ToolError::new("no career was named"));
        }

        let key = career.to_lowercase();
        if let Some(roadmap) = self.cached(&key) {
            return Ok(ToolReply::text(roadmap));
        }

        // Spaces out back-to-back model calls.
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let output = self
            .provider
            .generate(AssistantInput::prompt(roadmap_prompt(career)))
            .await
            .map_err(|err| ToolError::new(err.to_string()))?;
        let roadmap = output
            .first_text()
            .ok_or_else(|| ToolError::new("the model returned no roadmap"))?;

        self.remember(key, &roadmap);
        Ok(ToolReply::text(roadmap))
    }
}
