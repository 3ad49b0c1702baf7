use std::sync::Arc;

use async_trait::async_trait;

use super::registry::{ParamType, ToolArgs, ToolError, ToolHandler, ToolPayload, ToolReply, ToolSchema};
use crate::knowledge::{CareerInfo, KnowledgeBaseStore, roadmap_url};

pub const CAREER_INFO_TOOL: &str = "get_career_info";

pub fn career_info_schema() -> ToolSchema {
    ToolSchema::new(
        CAREER_INFO_TOOL,
        "Fetch structured career information, roadmap, resources, mentors and jobs for a given career.",
    )
    .required(
        "career_name",
        ParamType::String,
        "Name of the career (e.g., Data Scientist).",
    )
    .optional(
        "user_skills",
        ParamType::StringList,
        "List of user's existing skills.",
    )
}

pub struct CareerInfoTool {
    knowledge: Arc<dyn KnowledgeBaseStore>,
}

impl CareerInfoTool {
    pub fn new(knowledge: Arc<dyn KnowledgeBaseStore>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl ToolHandler for CareerInfoTool {
    async fn call(&self, args: ToolArgs) -> Result<ToolReply, ToolError> {
        let career = args.string("career_name").unwrap_or_default().trim();
        let user_skills = args.string_list("user_skills").unwrap_or_default();

        let Some(record) = self.knowledge.lookup(career) else {
            let mut text = format!("No knowledge-base entry found for {career}.");
            if let Some(url) = roadmap_url(career) {
                text.push_str(&format!(" A community roadmap is available at {url}"));
            }
            return Ok(ToolReply::text(text));
        };

        let info = CareerInfo::from_record(career, record, &user_skills);
        Ok(ToolReply::text(summarize(&info)).with_payload(ToolPayload::CareerInfo(info)))
    }
}

fn summarize(info: &CareerInfo) -> String {
    let mut text = format!(
        "Career: {}\n{}\nRequired skills: {}",
        info.career,
        info.record.description,
        info.record.required_skills.join(", ")
    );
    if info.missing_skills.is_empty() {
        text.push_str("\nYou already cover every required skill.");
    } else {
        text.push_str(&format!(
            "\nSkills to build: {}",
            info.missing_skills.join(", ")
        ));
    }
    if !info.record.future_skills.is_empty() {
        text.push_str(&format!(
            "\nSkills of the future: {}",
            info.record.future_skills.join(", ")
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::{CAREER_INFO_TOOL, CareerInfoTool, career_info_schema};
    use crate::knowledge::StaticKnowledgeBase;
    use crate::tools::{ToolCall, ToolPayload, ToolRegistry};
    use serde_json::json;
    use std::sync::Arc;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                career_info_schema(),
                Arc::new(CareerInfoTool::new(Arc::new(StaticKnowledgeBase::new()))),
            )
            .expect("register");
        registry
    }

    #[tokio::test]
    async fn hit_returns_summary_and_structured_payload() {
        let outcome = registry()
            .dispatch(&ToolCall::new(
                CAREER_INFO_TOOL,
                json!({"career_name": "Software Engineer", "user_skills": ["testing"]}),
            ))
            .await;

        assert!(outcome.succeeded);
        assert!(outcome.text.starts_with("Career: Software Engineer"));
        assert!(
            outcome
                .text
                .contains("Skills to build: Programming, Algorithms, System Design")
        );
        let Some(ToolPayload::CareerInfo(info)) = outcome.payload else {
            panic!("expected career payload");
        };
        assert_eq!(info.career, "Software Engineer");
        assert_eq!(info.roadmap.len(), 3);
    }

    #[tokio::test]
    async fn miss_suggests_roadmap_page_for_known_careers() {
        let outcome = registry()
            .dispatch(&ToolCall::new(
                CAREER_INFO_TOOL,
                json!({"career_name": "DevOps Engineer"}),
            ))
            .await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.payload, None);
        assert!(outcome.text.contains("No knowledge-base entry found for DevOps Engineer."));
        assert!(outcome.text.contains("https://roadmap.sh/devops"));
    }

    #[tokio::test]
    async fn lookup_stays_case_sensitive() {
        let outcome = registry()
            .dispatch(&ToolCall::new(
                CAREER_INFO_TOOL,
                json!({"career_name": "astronaut"}),
            ))
            .await;
        assert_eq!(outcome.text, "No knowledge-base entry found for astronaut.");
    }
}
