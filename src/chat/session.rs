use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use super::prompt::{CHAT_SYSTEM_INSTRUCTION, opening_greeting};
use crate::llm::provider::{
    AssistantInput, AssistantMessage, AssistantPart, AssistantRole, FunctionDeclaration,
    LlmError, LlmProvider, ToolCallingMode, extract_text,
};
use crate::quiz::{AnswerMap, QuestionSpec, preferred_career, seed_summary};
use crate::tools::{ToolCall, ToolRegistry};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SEED_TURNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionReply {
    Text(String),
    ToolCall(ToolCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    MissingCredential,
    RateLimited(String),
    Upstream(String),
    EmptyReply,
}

impl SessionError {
    /// Text shown to the user in place of a reply.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => {
                "Gemini API key not found. Set GEMINI_API_KEY (or GOOGLE_API_KEY) and restart to chat with the mentor.".to_string()
            }
            Self::RateLimited(_) => {
                "API rate limit exceeded. Please wait a minute before sending another message."
                    .to_string()
            }
            Self::Upstream(msg) => format!("An error occurred: {msg}"),
            Self::EmptyReply => {
                "An error occurred: the mentor returned an empty reply. Please try rephrasing."
                    .to_string()
            }
        }
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "no model credential is configured"),
            Self::RateLimited(msg) => write!(f, "rate limited: {msg}"),
            Self::Upstream(msg) => write!(f, "upstream failure: {msg}"),
            Self::EmptyReply => write!(f, "model reply had no usable content"),
        }
    }
}

impl Error for SessionError {}

impl From<LlmError> for SessionError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey => Self::MissingCredential,
            LlmError::EmptyResponse => Self::EmptyReply,
            err if err.is_rate_limited() => Self::RateLimited(err.to_string()),
            err => Self::Upstream(err.to_string()),
        }
    }
}

/// One conversation with the model, seeded from a finished quiz.
pub struct ConversationSession<P> {
    provider: P,
    seed: AnswerMap,
    history: Vec<Turn>,
    declarations: Vec<FunctionDeclaration>,
    timeout: Duration,
}

impl<P: LlmProvider> ConversationSession<P> {
    pub fn start(
        provider: Option<P>,
        seed: AnswerMap,
        questions: &[QuestionSpec],
        tools: &ToolRegistry,
    ) -> Result<Self, SessionError> {
        let provider = provider.ok_or(SessionError::MissingCredential)?;
        let history = vec![
            Turn::new(Role::User, seed_summary(questions, &seed)),
            Turn::new(Role::Assistant, opening_greeting(preferred_career(&seed))),
        ];

        Ok(Self {
            provider,
            seed,
            history,
            declarations: tools.declarations(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// History without the hidden seed exchange.
    pub fn visible_turns(&self) -> &[Turn] {
        &self.history[SEED_TURNS.min(self.history.len())..]
    }

    pub fn greeting(&self) -> Option<&str> {
        self.history
            .get(SEED_TURNS - 1)
            .map(|turn| turn.content.as_str())
    }

    pub fn seed(&self) -> &AnswerMap {
        &self.seed
    }

    pub fn record_assistant(&mut self, text: impl Into<String>) {
        self.history.push(Turn::new(Role::Assistant, text));
    }

    pub async fn send_message(&mut self, text: &str) -> Result<SessionReply, SessionError> {
        self.history.push(Turn::new(Role::User, text));

        let input = self.build_input();
        let output = tokio::time::timeout(self.timeout, self.provider.generate(input))
            .await
            .map_err(|_| {
                SessionError::Upstream(format!(
                    "the mentor did not answer within {} seconds",
                    self.timeout.as_secs()
                ))
            })??;

        let Some(candidate) = output
            .candidates
            .into_iter()
            .find(|candidate| !candidate.safety_blocked && !candidate.message.parts.is_empty())
        else {
            return Err(SessionError::EmptyReply);
        };

        let call = candidate.message.parts.iter().find_map(|part| match part {
            AssistantPart::FunctionCall { name, args_json } => {
                Some(ToolCall::new(name.clone(), args_json.clone()))
            }
            AssistantPart::Text { .. } => None,
        });
        if let Some(call) = call {
            return Ok(SessionReply::ToolCall(call));
        }

        let reply = extract_text(&candidate.message.parts);
        if reply.is_empty() {
            return Err(SessionError::EmptyReply);
        }
        self.history.push(Turn::new(Role::Assistant, reply.clone()));
        Ok(SessionReply::Text(reply))
    }

    fn build_input(&self) -> AssistantInput {
        AssistantInput {
            system_instruction: Some(CHAT_SYSTEM_INSTRUCTION.to_string()),
            messages: self
                .history
                .iter()
                .map(|turn| {
                    let role = match turn.role {
                        Role::User => AssistantRole::User,
                        Role::Assistant => AssistantRole::Model,
                    };
                    AssistantMessage::text(role, turn.content.clone())
                })
                .collect(),
            tools: self.declarations.clone(),
            tool_calling_mode: ToolCallingMode::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConversationSession, Role, SessionError, SessionReply};
    use crate::llm::provider::{
        AssistantCandidate, AssistantInput, AssistantMessage, AssistantOutput, AssistantPart,
        AssistantRole, LlmError, LlmProvider, LlmResult, ToolCallingMode,
    };
    use crate::quiz::{AnswerMap, AnswerValue, PREFERRED_CAREER_KEY, default_questions};
    use crate::tools::{ParamType, ToolCall, ToolRegistry, ToolSchema};
    use crate::tools::{ToolArgs, ToolError, ToolHandler, ToolReply};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct ScriptedProvider {
        replies: Arc<Mutex<VecDeque<LlmResult<AssistantOutput>>>>,
        inputs: Arc<Mutex<Vec<AssistantInput>>>,
        stall: bool,
    }

    impl ScriptedProvider {
        fn with(replies: Vec<LlmResult<AssistantOutput>>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                ..Self::default()
            }
        }
    }

    impl LlmProvider for ScriptedProvider {
        async fn generate(&self, input: AssistantInput) -> LlmResult<AssistantOutput> {
            self.inputs.lock().expect("inputs lock").push(input);
            if self.stall {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            self.replies
                .lock()
                .expect("replies lock")
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }

    struct Noop;

    #[async_trait]
    impl ToolHandler for Noop {
        async fn call(&self, _args: ToolArgs) -> Result<ToolReply, ToolError> {
            Ok(ToolReply::text("ok"))
        }
    }

    fn output(parts: Vec<AssistantPart>) -> LlmResult<AssistantOutput> {
        Ok(AssistantOutput {
            candidates: vec![AssistantCandidate {
                message: AssistantMessage {
                    role: AssistantRole::Model,
                    parts,
                },
                finish_reason: Some("STOP".to_string()),
                safety_blocked: false,
            }],
        })
    }

    fn text(value: &str) -> AssistantPart {
        AssistantPart::Text {
            text: value.to_string(),
        }
    }

    fn tools() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolSchema::new("get_career_roadmap", "roadmap").required(
                    "career",
                    ParamType::String,
                    "career",
                ),
                Arc::new(Noop),
            )
            .expect("register");
        registry
    }

    fn answers() -> AnswerMap {
        let mut answers = AnswerMap::new();
        answers.insert(
            PREFERRED_CAREER_KEY,
            AnswerValue::Single("Data Scientist".to_string()),
        );
        answers
    }

    fn start(provider: ScriptedProvider) -> ConversationSession<ScriptedProvider> {
        ConversationSession::start(Some(provider), answers(), &default_questions(), &tools())
            .expect("session")
    }

    #[test]
    fn start_without_provider_is_a_configuration_failure() {
        let err = ConversationSession::<ScriptedProvider>::start(
            None,
            answers(),
            &default_questions(),
            &tools(),
        )
        .err()
        .expect("missing credential");
        assert_eq!(err, SessionError::MissingCredential);
    }

    #[test]
    fn start_seeds_hidden_opening_exchange() {
        let session = start(ScriptedProvider::default());
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].role, Role::User);
        assert!(
            session.history()[0]
                .content
                .contains("- Preferred Career: Data Scientist")
        );
        assert!(
            session
                .greeting()
                .expect("greeting")
                .contains("**Data Scientist**")
        );
        assert!(session.visible_turns().is_empty());
        assert_eq!(
            session.seed().get(PREFERRED_CAREER_KEY),
            Some(&AnswerValue::Single("Data Scientist".to_string()))
        );
    }

    #[tokio::test]
    async fn text_reply_is_appended_and_request_carries_history_and_tools() {
        let provider = ScriptedProvider::with(vec![output(vec![text("Data scientists analyze data.")])]);
        let mut session = start(provider.clone());

        let reply = session
            .send_message("What do data scientists do?")
            .await
            .expect("reply");

        assert_eq!(
            reply,
            SessionReply::Text("Data scientists analyze data.".to_string())
        );
        let visible = session.visible_turns();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].content, "What do data scientists do?");
        assert_eq!(visible[1].role, Role::Assistant);

        let inputs = provider.inputs.lock().expect("inputs lock");
        assert_eq!(inputs[0].messages.len(), 3);
        assert_eq!(inputs[0].tool_calling_mode, ToolCallingMode::Auto);
        assert_eq!(inputs[0].tools[0].name, "get_career_roadmap");
        assert!(inputs[0].system_instruction.is_some());
    }

    #[tokio::test]
    async fn function_call_takes_precedence_over_text() {
        let provider = ScriptedProvider::with(vec![output(vec![
            text("Sure, here is a roadmap"),
            AssistantPart::FunctionCall {
                name: "get_career_roadmap".to_string(),
                args_json: json!({"career": "DevOps Engineer"}),
            },
        ])]);
        let mut session = start(provider);

        let reply = session.send_message("roadmap for devops").await.expect("reply");
        assert_eq!(
            reply,
            SessionReply::ToolCall(ToolCall::new(
                "get_career_roadmap",
                json!({"career": "DevOps Engineer"})
            ))
        );
        assert_eq!(session.visible_turns().len(), 1);

        session.record_assistant("roadmap body");
        assert_eq!(session.visible_turns().len(), 2);
        assert_eq!(session.visible_turns()[1].content, "roadmap body");
    }

    #[tokio::test]
    async fn rate_limit_keeps_user_turn_without_assistant_turn() {
        let provider = ScriptedProvider::with(vec![Err(LlmError::RateLimited {
            status: 429,
            body: "RESOURCE_EXHAUSTED".to_string(),
        })]);
        let mut session = start(provider);

        let err = session.send_message("hello").await.expect_err("rate limited");
        assert!(matches!(err, SessionError::RateLimited(_)));
        assert_eq!(
            err.user_message(),
            "API rate limit exceeded. Please wait a minute before sending another message."
        );
        assert_eq!(session.visible_turns().len(), 1);
        assert_eq!(session.visible_turns()[0].role, Role::User);
    }

    #[tokio::test]
    async fn other_failures_are_generic_upstream_errors() {
        let provider = ScriptedProvider::with(vec![Err(LlmError::HttpStatus {
            status: 500,
            body: "boom".to_string(),
        })]);
        let mut session = start(provider);

        let err = session.send_message("hello").await.expect_err("upstream");
        assert!(err.user_message().starts_with("An error occurred: "));
        assert!(matches!(err, SessionError::Upstream(_)));
    }

    #[tokio::test]
    async fn blocked_or_blank_candidates_are_empty_replies() {
        let provider = ScriptedProvider::with(vec![
            Ok(AssistantOutput {
                candidates: vec![AssistantCandidate {
                    message: AssistantMessage::text(AssistantRole::Model, "blocked"),
                    finish_reason: Some("SAFETY".to_string()),
                    safety_blocked: true,
                }],
            }),
            output(vec![text("   ")]),
        ]);
        let mut session = start(provider);

        assert_eq!(
            session.send_message("one").await,
            Err(SessionError::EmptyReply)
        );
        assert_eq!(
            session.send_message("two").await,
            Err(SessionError::EmptyReply)
        );
        assert_eq!(session.visible_turns().len(), 2);
    }

    #[tokio::test]
    async fn slow_model_times_out_as_upstream_error() {
        let provider = ScriptedProvider {
            stall: true,
            ..ScriptedProvider::default()
        };
        let mut session = start(provider).with_timeout(Duration::from_millis(20));

        let err = session.send_message("hello").await.expect_err("timeout");
        assert!(matches!(err, SessionError::Upstream(msg) if msg.contains("did not answer")));
    }
}
