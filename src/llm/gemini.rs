use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{
    AssistantCandidate, AssistantInput, AssistantMessage, AssistantOutput, AssistantPart,
    AssistantRole, FunctionDeclaration, LlmError, LlmProvider, LlmResult, ToolCallingMode,
};
use crate::http::{HttpClient, HttpResponseData, Upstream};

const ERROR_BODY_MAX_CHARS: usize = 400;
const BLOCKED_FINISH_REASONS: [&str; 4] =
    ["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT"];

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(
        http: HttpClient,
        api_key: Option<String>,
        model: String,
        base_url: String,
    ) -> LlmResult<Self> {
        let api_key = api_key
            .filter(|v| !v.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        Ok(Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_request(input: &AssistantInput) -> GeminiGenerateRequest {
        let contents = input
            .messages
            .iter()
            .map(|message| GeminiContent {
                role: match message.role {
                    AssistantRole::User => "user",
                    AssistantRole::Model => "model",
                }
                .to_string(),
                parts: message.parts.iter().map(GeminiPart::from_part).collect(),
            })
            .collect();

        let (tools, tool_config) = if input.tools.is_empty() {
            (None, None)
        } else {
            let mode = match input.tool_calling_mode {
                ToolCallingMode::Auto => "AUTO",
                ToolCallingMode::None => "NONE",
            };
            (
                Some(vec![GeminiTool {
                    function_declarations: input
                        .tools
                        .iter()
                        .map(GeminiFunctionDeclaration::from_declaration)
                        .collect(),
                }]),
                Some(GeminiToolConfig {
                    function_calling_config: GeminiFunctionCallingConfig {
                        mode: mode.to_string(),
                    },
                }),
            )
        };

        GeminiGenerateRequest {
            contents,
            system_instruction: input
                .system_instruction
                .as_ref()
                .map(|text| GeminiSystemInstruction {
                    parts: vec![GeminiPart::Text { text: text.clone() }],
                }),
            tools,
            tool_config,
        }
    }

    fn normalize_response(resp: GeminiGenerateResponse) -> LlmResult<AssistantOutput> {
        let candidates = resp
            .candidates
            .into_iter()
            .map(|candidate| {
                let parts = candidate
                    .content
                    .map(|content| {
                        content
                            .parts
                            .into_iter()
                            .filter_map(GeminiResponsePart::into_part)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                let safety_blocked = candidate
                    .finish_reason
                    .as_deref()
                    .is_some_and(|reason| BLOCKED_FINISH_REASONS.contains(&reason));

                AssistantCandidate {
                    message: AssistantMessage {
                        role: AssistantRole::Model,
                        parts,
                    },
                    finish_reason: candidate.finish_reason,
                    safety_blocked,
                }
            })
            .collect::<Vec<_>>();

        if candidates
            .iter()
            .all(|candidate| candidate.message.parts.is_empty())
        {
            return Err(LlmError::EmptyResponse);
        }

        Ok(AssistantOutput { candidates })
    }
}

/// 429 and `RESOURCE_EXHAUSTED` both mean the quota ran out.
fn classify_failure(resp: &HttpResponseData) -> LlmError {
    let status = resp.status;
    let body = resp.error_excerpt(ERROR_BODY_MAX_CHARS);
    if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
        LlmError::RateLimited { status, body }
    } else {
        LlmError::HttpStatus { status, body }
    }
}

impl LlmProvider for GeminiProvider {
    async fn generate(&self, input: AssistantInput) -> LlmResult<AssistantOutput> {
        let payload = Self::build_request(&input);
        let resp = self
            .http
            .post_json(
                Upstream::Gemini,
                &self.endpoint(),
                &[("key", self.api_key.as_str())],
                &payload,
            )
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if !resp.is_success() {
            return Err(classify_failure(&resp));
        }

        let parsed = resp
            .json::<GeminiGenerateResponse>()
            .map_err(|err| LlmError::Parse(err.to_string()))?;
        Self::normalize_response(parsed)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<GeminiToolConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
}

impl GeminiPart {
    fn from_part(part: &AssistantPart) -> Self {
        match part {
            AssistantPart::Text { text } => Self::Text { text: text.clone() },
            AssistantPart::FunctionCall { name, args_json } => Self::FunctionCall {
                function_call: GeminiFunctionCall {
                    name: name.clone(),
                    args: args_json.clone(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

impl GeminiFunctionDeclaration {
    fn from_declaration(declaration: &FunctionDeclaration) -> Self {
        Self {
            name: declaration.name.clone(),
            description: declaration.description.clone(),
            parameters: declaration.parameters_json_schema.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiToolConfig {
    function_calling_config: GeminiFunctionCallingConfig,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionCallingConfig {
    mode: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponsePart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

impl GeminiResponsePart {
    fn into_part(self) -> Option<AssistantPart> {
        if let Some(call) = self.function_call {
            return Some(AssistantPart::FunctionCall {
                name: call.name,
                args_json: call.args,
            });
        }
        self.text.map(|text| AssistantPart::Text { text })
    }
}
