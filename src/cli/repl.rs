use crate::chat::{ConversationSession, Role, SessionReply};
use crate::cli::commands::{
    Command, HELP_TEXT, QUIZ_HELP_TEXT, QuizInput, SUMMARY_HELP_TEXT, SummaryInput,
    is_command_line, is_exit_line, parse_command, parse_quiz_input, parse_summary_input,
};
use crate::cli::printer::{write_lines, write_prompt};
use crate::cli::theme::Theme;
use crate::cli::timeline::{
    AssistantStepEvent, AssistantTurn, AssistantTurnState, OutputKind, QuizQuestionView,
    Timeline, TimelineEntry,
};
use crate::config::{AppConfig, ThemeConfig, ThemeToken};
use crate::knowledge::{CareerInfo, KnowledgeBaseStore, StaticKnowledgeBase};
use crate::llm::GeminiProvider;
use crate::quiz::{AnswerMap, AnswerValue, QuizEngine, default_questions, seed_summary, summary_rows};
use crate::render::{extract_diagram_block, roadmap_flowchart, strip_diagram_blocks};
use crate::tools::{RegistryError, ToolCall, ToolPayload, ToolRegistry, default_registry};
use crate::trace::SessionTrace;
use crate::video::YouTubeSearch;
use anyhow::Result;
use crossterm::tty::IsTty;
use ratatui::text::{Line, Span};
use serde_json::Value;
use std::env;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Quiz,
    Summary,
    Chat,
}

struct ChatState {
    session: ConversationSession<GeminiProvider>,
    registry: ToolRegistry,
}

pub struct AppState {
    pub mode: Mode,
    pub session_id: String,
    pub quiz: QuizEngine,
    pub llm: Option<GeminiProvider>,
    pub videos: Option<YouTubeSearch>,
    pub knowledge: Arc<dyn KnowledgeBaseStore>,
    pub request_timeout: Duration,
    pub roadmap_delay: Duration,
    pub theme_config: ThemeConfig,
    pub trace: SessionTrace,
    chat: Option<ChatState>,
    last_career: Option<CareerInfo>,
    timeline: Timeline,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        session_id: String,
        llm: Option<GeminiProvider>,
        videos: Option<YouTubeSearch>,
        trace: SessionTrace,
    ) -> Self {
        let mut state = Self {
            mode: Mode::Quiz,
            session_id,
            quiz: QuizEngine::new(default_questions()),
            llm,
            videos,
            knowledge: Arc::new(StaticKnowledgeBase::new()),
            request_timeout: config.request_timeout,
            roadmap_delay: config.roadmap_delay,
            theme_config: config.theme.clone(),
            trace,
            chat: None,
            last_career: None,
            timeline: Timeline::new(),
        };

        state.timeline.push_output(
            OutputKind::SystemInfo,
            "Welcome to Career Mentor. Answer a short quiz, then chat with your AI mentor.",
        );
        state.timeline.push_output(OutputKind::SystemInfo, QUIZ_HELP_TEXT);
        state.show_question();
        state
    }

    /// True when handling `line` sends a request to the model.
    pub fn awaits_model(&self, line: &str) -> bool {
        self.mode == Mode::Chat && !line.is_empty() && !is_command_line(line)
    }

    pub async fn handle_line(&mut self, line: &str) {
        match self.mode {
            Mode::Quiz => self.handle_quiz_line(line),
            Mode::Summary => self.handle_summary_line(line),
            Mode::Chat => self.handle_chat_line(line).await,
        }
    }

    fn handle_quiz_line(&mut self, line: &str) {
        self.trace.log_quiz_input(line);
        let Ok(question) = self.quiz.current_question() else {
            self.show_summary();
            return;
        };
        let options = question.options.clone();
        let allows_multiple = question.allows_multiple;

        let input = match parse_quiz_input(line, options.len(), allows_multiple) {
            Ok(input) => input,
            Err(err) => {
                self.push_error(err.message());
                return;
            }
        };

        let answer = match input {
            QuizInput::Back => {
                self.quiz.previous();
                self.show_question();
                return;
            }
            QuizInput::Restart => {
                self.quiz.restart();
                self.timeline
                    .push_output(OutputKind::SystemInfo, "Quiz restarted.");
                self.show_question();
                return;
            }
            QuizInput::Keep => match self.quiz.stored_answer() {
                Some(stored) => stored.clone(),
                None if allows_multiple => AnswerValue::Multiple(Vec::new()),
                None => {
                    self.push_error("Choose an option by typing its number.");
                    return;
                }
            },
            QuizInput::Clear => AnswerValue::Multiple(Vec::new()),
            QuizInput::Select(picks) => {
                let mut choices = picks
                    .into_iter()
                    .filter_map(|number| options.get(number - 1).cloned())
                    .collect::<Vec<_>>();
                if allows_multiple {
                    AnswerValue::Multiple(choices)
                } else {
                    AnswerValue::Single(choices.pop().unwrap_or_default())
                }
            }
        };

        match self.quiz.submit_answer(answer) {
            Ok(()) if self.quiz.is_complete() => self.show_summary(),
            Ok(()) => self.show_question(),
            Err(err) => self.push_error(&err.to_string()),
        }
    }

    fn handle_summary_line(&mut self, line: &str) {
        self.trace.log_quiz_input(line);
        match parse_summary_input(line) {
            Ok(SummaryInput::Submit) => {
                let answers = match self.quiz.summary() {
                    Ok(answers) => answers.clone(),
                    Err(err) => {
                        self.push_error(&err.to_string());
                        return;
                    }
                };
                if !self.start_chat(answers) {
                    return;
                }
                if let Err(err) = self.quiz.take_summary() {
                    self.push_error(&err.to_string());
                }
            }
            Ok(SummaryInput::Back) => {
                self.quiz.previous();
                self.mode = Mode::Quiz;
                self.show_question();
            }
            Ok(SummaryInput::Restart) => {
                self.quiz.restart();
                self.mode = Mode::Quiz;
                self.show_question();
            }
            Err(err) => self.push_error(err.message()),
        }
    }

    async fn handle_chat_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        if is_command_line(line) {
            match parse_command(line) {
                Ok(command) => self.handle_command(command),
                Err(err) => self.push_error(err.message()),
            }
            return;
        }

        let Some(chat) = self.chat.as_mut() else {
            self.push_error("The mentor chat is not running. Type /quiz to start over.");
            return;
        };

        self.timeline.push_user_input(line);
        self.trace.log_chat_input(line);

        let (events, text, payload) = match chat.session.send_message(line).await {
            Ok(SessionReply::Text(text)) => (Vec::new(), text, None),
            Ok(SessionReply::ToolCall(call)) => {
                let mut events = vec![AssistantStepEvent::ToolRequest {
                    text: format!("-> Calling {}", describe_call(&call)),
                }];
                self.trace.log_tool_call(&call.name, &call.arguments);

                let outcome = chat.registry.dispatch(&call).await;
                self.trace.log_tool_output(outcome.succeeded, &outcome.text);
                let status = if outcome.succeeded { "finished" } else { "failed" };
                events.push(AssistantStepEvent::ToolResult {
                    text: format!("<- {} {status}", call.name),
                });

                chat.session.record_assistant(outcome.text.clone());
                (events, outcome.text, outcome.payload)
            }
            Err(err) => {
                self.trace.log_chat_output(&format!("error: {err}"));
                self.timeline
                    .push(TimelineEntry::AssistantTurn(AssistantTurn {
                        events: Vec::new(),
                        state: AssistantTurnState::CompletedError(err.user_message()),
                    }));
                return;
            }
        };

        self.trace.log_chat_output(&text);
        self.push_assistant_text(events, &text);
        if let Some(ToolPayload::CareerInfo(info)) = payload {
            self.show_career(&info);
            self.last_career = Some(info);
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Help => self.timeline.push_output(OutputKind::SystemInfo, HELP_TEXT),
            Command::Profile => {
                let Some(chat) = &self.chat else {
                    self.push_error("No quiz answers yet.");
                    return;
                };
                let rows = summary_rows(self.quiz.questions(), chat.session.seed());
                self.timeline.push(TimelineEntry::QuizSummary(rows));
            }
            Command::Career => match self.last_career.clone() {
                Some(info) => self.show_career(&info),
                None => self.timeline.push_output(
                    OutputKind::SystemInfo,
                    "No career details yet. Ask the mentor about a career, for example \"What skills does a Data Scientist need?\"",
                ),
            },
            Command::History(limit) => self.show_history(limit),
            Command::Restart => {
                let Some(chat) = self.chat.take() else {
                    self.push_error("The mentor chat is not running.");
                    return;
                };
                let answers = chat.session.seed().clone();
                self.last_career = None;
                if self.start_chat(answers) {
                    self.timeline
                        .push_output(OutputKind::SystemInfo, "Started a new conversation.");
                }
            }
            Command::Quiz => {
                self.chat = None;
                self.last_career = None;
                self.quiz.restart();
                self.mode = Mode::Quiz;
                self.timeline.push_output(OutputKind::SystemInfo, QUIZ_HELP_TEXT);
                self.show_question();
            }
            Command::Trace => self.timeline.push_output(
                OutputKind::SystemInfo,
                &format!("Trace file: {}", self.trace.file_path().display()),
            ),
        }
    }

    /// Opens a conversation seeded with `answers`; false leaves the current mode untouched.
    fn start_chat(&mut self, answers: AnswerMap) -> bool {
        let registry = match self.build_registry() {
            Ok(registry) => registry,
            Err(err) => {
                self.push_error(&err.to_string());
                return false;
            }
        };

        let questions = self.quiz.questions().to_vec();
        match ConversationSession::start(self.llm.clone(), answers, &questions, &registry) {
            Ok(session) => {
                let session = session.with_timeout(self.request_timeout);
                self.trace
                    .log_quiz_output(&seed_summary(&questions, session.seed()));
                if let Some(greeting) = session.greeting() {
                    let greeting = greeting.to_string();
                    self.push_assistant_text(Vec::new(), &greeting);
                }
                self.timeline.push_output(
                    OutputKind::SystemInfo,
                    "Type /help for commands or exit to leave.",
                );
                self.chat = Some(ChatState { session, registry });
                self.mode = Mode::Chat;
                true
            }
            Err(err) => {
                self.trace.log_quiz_output(&format!("error: {err}"));
                self.push_error(&err.user_message());
                false
            }
        }
    }

    fn build_registry(&self) -> Result<ToolRegistry, RegistryError> {
        let Some(provider) = self.llm.clone() else {
            return Ok(ToolRegistry::new());
        };
        default_registry(
            provider,
            self.videos.clone(),
            Arc::clone(&self.knowledge),
            self.roadmap_delay,
        )
    }

    fn show_question(&mut self) {
        self.mode = Mode::Quiz;
        let Ok(question) = self.quiz.current_question() else {
            self.show_summary();
            return;
        };
        let (position, total) = self.quiz.progress();
        let selected = self
            .quiz
            .stored_answer()
            .map(|answer| {
                answer
                    .selections()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        self.timeline
            .push(TimelineEntry::QuizQuestion(QuizQuestionView {
                position,
                total,
                prompt: question.prompt.clone(),
                options: question.options.clone(),
                allows_multiple: question.allows_multiple,
                selected,
            }));
    }

    fn show_summary(&mut self) {
        self.mode = Mode::Summary;
        let rows = summary_rows(self.quiz.questions(), self.quiz.answers());
        self.timeline.push(TimelineEntry::QuizSummary(rows));
        self.timeline
            .push_output(OutputKind::SystemInfo, SUMMARY_HELP_TEXT);
    }

    fn show_history(&mut self, limit: Option<usize>) {
        let Some(chat) = &self.chat else {
            self.push_error("The mentor chat is not running.");
            return;
        };
        let turns = chat.session.visible_turns();
        if turns.is_empty() {
            self.timeline
                .push_output(OutputKind::SystemInfo, "No messages yet.");
            return;
        }

        let skip = limit.map_or(0, |limit| turns.len().saturating_sub(limit));
        let entries = turns[skip..]
            .iter()
            .map(|turn| match turn.role {
                Role::User => TimelineEntry::UserInput(turn.content.clone()),
                Role::Assistant => TimelineEntry::AssistantTurn(AssistantTurn {
                    events: Vec::new(),
                    state: AssistantTurnState::CompletedText(strip_diagram_blocks(
                        &turn.content,
                    )),
                }),
            })
            .collect::<Vec<_>>();
        for entry in entries {
            self.timeline.push(entry);
        }
    }

    fn show_career(&mut self, info: &CareerInfo) {
        self.timeline
            .push(TimelineEntry::CareerPanel(Box::new(info.clone())));
        self.timeline
            .push(TimelineEntry::Diagram(roadmap_flowchart(&info.roadmap)));
    }

    fn push_assistant_text(&mut self, events: Vec<AssistantStepEvent>, text: &str) {
        let diagram = extract_diagram_block(text);
        let body = match diagram {
            Some(_) => strip_diagram_blocks(text),
            None => text.trim_end().to_string(),
        };

        self.timeline
            .push(TimelineEntry::AssistantTurn(AssistantTurn {
                events,
                state: AssistantTurnState::CompletedText(body),
            }));
        if let Some(diagram) = diagram {
            self.timeline.push(TimelineEntry::Diagram(diagram));
        }
    }

    fn push_error(&mut self, message: &str) {
        self.timeline.push_output(OutputKind::SystemError, message);
    }
}

/// `get_career_info(career_name: "Data Scientist")`
fn describe_call(call: &ToolCall) -> String {
    let args = match &call.arguments {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    format!("{}({args})", call.name)
}

pub fn prompt_for(mode: Mode) -> &'static str {
    match mode {
        Mode::Quiz => "quiz> ",
        Mode::Summary => "review> ",
        Mode::Chat => "you> ",
    }
}

fn prompt_line(mode: Mode, theme: &Theme) -> Line<'static> {
    let token = match mode {
        Mode::Quiz | Mode::Summary => ThemeToken::QuizPrompt,
        Mode::Chat => ThemeToken::ChatPrompt,
    };
    Line::from(Span::styled(prompt_for(mode), theme.style(token)))
}

fn waiting_line(theme: &Theme) -> Line<'static> {
    Line::from(Span::styled(
        "  Thinking...",
        theme.style(ThemeToken::AssistantWaiting),
    ))
}

fn colors_enabled() -> bool {
    let no_color = env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
    !no_color && io::stdout().is_tty()
}

pub async fn run_repl(state: &mut AppState) -> Result<()> {
    let colored = colors_enabled();
    let theme = Theme::from_config(colored, &state.theme_config);
    let mut stdout = io::stdout();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        write_lines(&mut stdout, &state.timeline.take_unprinted(&theme), colored)?;
        write_prompt(&mut stdout, &prompt_line(state.mode, &theme), colored)?;

        let Some(line) = input.next_line().await? else {
            write_lines(&mut stdout, &[Line::from("")], colored)?;
            break;
        };
        let line = line.trim();
        if is_exit_line(line) {
            break;
        }

        if state.awaits_model(line) {
            write_lines(&mut stdout, &[waiting_line(&theme)], colored)?;
        }
        state.handle_line(line).await;
    }

    Ok(())
}
