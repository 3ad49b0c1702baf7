use crate::cli::theme::Theme;
use crate::config::ThemeToken;
use crate::knowledge::CareerInfo;
use ratatui::text::{Line, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputKind {
    AssistantText,
    ToolRequest,
    ToolResult,
    Diagram,
    SystemInfo,
    SystemError,
}

#[derive(Debug, Clone)]
pub(crate) enum TimelineEntry {
    OutputLine { kind: OutputKind, text: String },
    QuizQuestion(QuizQuestionView),
    QuizSummary(Vec<(String, String)>),
    UserInput(String),
    AssistantTurn(AssistantTurn),
    Diagram(String),
    CareerPanel(Box<CareerInfo>),
}

/// A question as shown to the user, with the stored choices marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QuizQuestionView {
    pub(crate) position: usize,
    pub(crate) total: usize,
    pub(crate) prompt: String,
    pub(crate) options: Vec<String>,
    pub(crate) allows_multiple: bool,
    pub(crate) selected: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct AssistantTurn {
    pub(crate) events: Vec<AssistantStepEvent>,
    pub(crate) state: AssistantTurnState,
}

#[derive(Debug, Clone)]
pub(crate) enum AssistantTurnState {
    CompletedText(String),
    CompletedError(String),
}

#[derive(Debug, Clone)]
pub(crate) enum AssistantStepEvent {
    ToolRequest { text: String },
    ToolResult { text: String },
}

/// Append-only log of what was shown; `printed` marks what already reached the terminal.
#[derive(Debug, Clone, Default)]
pub(crate) struct Timeline {
    entries: Vec<TimelineEntry>,
    printed: usize,
}

impl Timeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: TimelineEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn push_output(&mut self, kind: OutputKind, text: &str) {
        for line in split_output_lines(text) {
            self.entries.push(TimelineEntry::OutputLine {
                kind,
                text: line.to_string(),
            });
        }
    }

    pub(crate) fn push_user_input(&mut self, text: &str) {
        for line in split_output_lines(text) {
            self.entries.push(TimelineEntry::UserInput(line.to_string()));
        }
    }

    pub(crate) fn render_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        render_entries(&self.entries, theme)
    }

    /// Lines for entries pushed since the previous call.
    pub(crate) fn take_unprinted(&mut self, theme: &Theme) -> Vec<Line<'static>> {
        let lines = render_entries(&self.entries[self.printed..], theme);
        self.printed = self.entries.len();
        lines
    }
}

fn render_entries(entries: &[TimelineEntry], theme: &Theme) -> Vec<Line<'static>> {
    let context = RenderContext { theme };
    let mut lines = Vec::new();
    for entry in entries {
        widget_for_entry(entry).render(&context, &mut lines);
    }
    lines
}

trait TimelineWidget {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>);
}

struct RenderContext<'a> {
    theme: &'a Theme,
}

impl RenderContext<'_> {
    fn line(&self, token: ThemeToken, text: impl Into<String>) -> Line<'static> {
        Line::from(Span::styled(text.into(), self.theme.style(token)))
    }
}

struct OutputLineWidget<'a> {
    kind: OutputKind,
    text: &'a str,
}

impl TimelineWidget for OutputLineWidget<'_> {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>) {
        lines.push(context.line(output_token_for(self.kind), self.text));
    }
}

struct QuizQuestionWidget<'a> {
    view: &'a QuizQuestionView,
}

impl TimelineWidget for QuizQuestionWidget<'_> {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>) {
        let view = self.view;
        lines.push(Line::from(""));
        lines.push(context.line(
            ThemeToken::QuizProgress,
            format!("Question {} of {}", view.position, view.total),
        ));
        lines.push(context.line(ThemeToken::QuizPrompt, view.prompt.clone()));

        let (open, close) = if view.allows_multiple {
            ('[', ']')
        } else {
            ('(', ')')
        };
        for (index, option) in view.options.iter().enumerate() {
            let mark = if view.selected.contains(option) {
                if view.allows_multiple { 'x' } else { '*' }
            } else {
                ' '
            };
            lines.push(context.line(
                ThemeToken::QuizOption,
                format!("  {open}{mark}{close} {}. {option}", index + 1),
            ));
        }

        let hint = if view.allows_multiple {
            "Select any options, separated by commas. '-' clears the selection."
        } else {
            "Select one option."
        };
        lines.push(context.line(ThemeToken::QuizProgress, hint));
    }
}

struct QuizSummaryWidget<'a> {
    rows: &'a [(String, String)],
}

impl TimelineWidget for QuizSummaryWidget<'_> {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>) {
        lines.push(Line::from(""));
        lines.push(context.line(ThemeToken::QuizPrompt, "Your answers"));
        for (prompt, answer) in self.rows {
            lines.push(context.line(ThemeToken::QuizOption, format!("  {prompt}")));
            lines.push(context.line(ThemeToken::QuizProgress, format!("    {answer}")));
        }
    }
}

struct UserInputWidget<'a> {
    text: &'a str,
}

impl TimelineWidget for UserInputWidget<'_> {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>) {
        lines.push(Line::from(vec![
            Span::styled("you> ", context.theme.style(ThemeToken::ChatPrompt)),
            Span::styled(
                self.text.to_string(),
                context.theme.style(ThemeToken::UserInput),
            ),
        ]));
    }
}

struct AssistantTurnWidget<'a> {
    turn: &'a AssistantTurn,
}

impl TimelineWidget for AssistantTurnWidget<'_> {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>) {
        const STEP_PADDING: &str = "  ";

        for event in &self.turn.events {
            let (kind, text) = match event {
                AssistantStepEvent::ToolRequest { text } => (OutputKind::ToolRequest, text),
                AssistantStepEvent::ToolResult { text } => (OutputKind::ToolResult, text),
            };
            lines.push(context.line(output_token_for(kind), format!("{STEP_PADDING}{text}")));
        }

        let (kind, text) = match &self.turn.state {
            AssistantTurnState::CompletedText(text) => (OutputKind::AssistantText, text),
            AssistantTurnState::CompletedError(message) => (OutputKind::SystemError, message),
        };
        lines.push(Line::from(""));
        for line in split_output_lines(text) {
            lines.push(context.line(output_token_for(kind), line));
        }
        lines.push(Line::from(""));
    }
}

struct DiagramWidget<'a> {
    source: &'a str,
}

impl TimelineWidget for DiagramWidget<'_> {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>) {
        let token = output_token_for(OutputKind::Diagram);
        lines.push(context.line(token, "  ┌ roadmap diagram (mermaid)"));
        for line in split_output_lines(self.source) {
            lines.push(context.line(token, format!("  │ {line}")));
        }
        lines.push(context.line(token, "  └"));
        lines.push(Line::from(""));
    }
}

struct CareerPanelWidget<'a> {
    info: &'a CareerInfo,
}

impl TimelineWidget for CareerPanelWidget<'_> {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>) {
        let info = self.info;
        let record = &info.record;
        let mut push = |text: String| lines.push(context.line(ThemeToken::CareerPanel, text));

        push(format!("== {} ==", info.career));
        push(record.description.clone());
        push(format!(
            "Required skills: {}",
            record.required_skills.join(", ")
        ));
        if info.missing_skills.is_empty() {
            push("Skills to build: none, you already cover the required skills".to_string());
        } else {
            push(format!("Skills to build: {}", info.missing_skills.join(", ")));
        }
        if !record.future_skills.is_empty() {
            push(format!(
                "Skills of the future: {}",
                record.future_skills.join(", ")
            ));
        }

        if !record.courses.is_empty() {
            push("Courses:".to_string());
            for course in &record.courses {
                push(format!("  - {} ({})", course.title, course.link));
            }
        }
        if !record.portfolio_examples.is_empty() {
            push("Portfolio ideas:".to_string());
            for example in &record.portfolio_examples {
                push(format!("  - {example}"));
            }
        }
        if !record.mentors.is_empty() {
            push("Mentors:".to_string());
            for mentor in &record.mentors {
                push(format!("  - {} ({})", mentor.name, mentor.link));
            }
        }
        if !record.jobs.is_empty() {
            push("Job openings:".to_string());
            for job in &record.jobs {
                push(format!("  - {} at {} ({})", job.title, job.company, job.link));
            }
        }

        push("Roadmap:".to_string());
        for phase in &info.roadmap {
            push(format!("  {} - {}", phase.phase, phase.focus));
            for resource in &phase.resources {
                push(format!("    - {} ({})", resource.label, resource.link));
            }
        }
        lines.push(Line::from(""));
    }
}

fn widget_for_entry(entry: &TimelineEntry) -> Box<dyn TimelineWidget + '_> {
    match entry {
        TimelineEntry::OutputLine { kind, text } => {
            Box::new(OutputLineWidget { kind: *kind, text })
        }
        TimelineEntry::QuizQuestion(view) => Box::new(QuizQuestionWidget { view }),
        TimelineEntry::QuizSummary(rows) => Box::new(QuizSummaryWidget { rows }),
        TimelineEntry::UserInput(text) => Box::new(UserInputWidget { text }),
        TimelineEntry::AssistantTurn(turn) => Box::new(AssistantTurnWidget { turn }),
        TimelineEntry::Diagram(source) => Box::new(DiagramWidget { source }),
        TimelineEntry::CareerPanel(info) => Box::new(CareerPanelWidget { info }),
    }
}

fn split_output_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }

    text.lines().collect()
}

fn output_token_for(kind: OutputKind) -> ThemeToken {
    match kind {
        OutputKind::AssistantText => ThemeToken::AssistantText,
        OutputKind::ToolRequest => ThemeToken::ToolRequest,
        OutputKind::ToolResult => ThemeToken::ToolResult,
        OutputKind::Diagram => ThemeToken::Diagram,
        OutputKind::SystemInfo => ThemeToken::SystemInfo,
        OutputKind::SystemError => ThemeToken::SystemError,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AssistantStepEvent, AssistantTurn, AssistantTurnState, OutputKind, QuizQuestionView,
        Timeline, TimelineEntry, output_token_for, split_output_lines,
    };
    use crate::cli::theme::Theme;
    use crate::config::ThemeToken;
    use crate::knowledge::{CareerInfo, KnowledgeBaseStore, StaticKnowledgeBase};

    fn text_lines(lines: Vec<ratatui::text::Line<'static>>) -> Vec<String> {
        lines.into_iter().map(|line| line.to_string()).collect()
    }

    fn question(selected: &[&str], allows_multiple: bool) -> QuizQuestionView {
        QuizQuestionView {
            position: 2,
            total: 8,
            prompt: "Which languages do you know?".to_string(),
            options: vec!["Python".to_string(), "Java".to_string()],
            allows_multiple,
            selected: selected.iter().map(|value| value.to_string()).collect(),
        }
    }

    #[test]
    fn split_lines_works() {
        assert_eq!(split_output_lines("a\nb\n"), vec!["a", "b"]);
        assert!(split_output_lines("").is_empty());
    }

    #[test]
    fn output_kind_maps_to_theme_tokens() {
        assert_eq!(
            output_token_for(OutputKind::ToolRequest),
            ThemeToken::ToolRequest
        );
        assert_eq!(output_token_for(OutputKind::Diagram), ThemeToken::Diagram);
        assert_eq!(
            output_token_for(OutputKind::AssistantText),
            ThemeToken::AssistantText
        );
        assert_eq!(
            output_token_for(OutputKind::SystemError),
            ThemeToken::SystemError
        );
    }

    #[test]
    fn quiz_question_marks_stored_choices() {
        let mut timeline = Timeline::new();
        timeline.push(TimelineEntry::QuizQuestion(question(&["Java"], true)));
        timeline.push(TimelineEntry::QuizQuestion(question(&["Python"], false)));

        let rendered = text_lines(timeline.render_lines(&Theme::new(false))).join("\n");
        insta::assert_snapshot!(rendered.trim_start(), @r"
        Question 2 of 8
        Which languages do you know?
          [ ] 1. Python
          [x] 2. Java
        Select any options, separated by commas. '-' clears the selection.

        Question 2 of 8
        Which languages do you know?
          (*) 1. Python
          ( ) 2. Java
        Select one option.
        ");
    }

    #[test]
    fn assistant_turn_renders_steps_then_text() {
        let mut timeline = Timeline::new();
        timeline.push_user_input("roadmap for data science");
        timeline.push(TimelineEntry::AssistantTurn(AssistantTurn {
            events: vec![
                AssistantStepEvent::ToolRequest {
                    text: "-> get_career_roadmap".to_string(),
                },
                AssistantStepEvent::ToolResult {
                    text: "<- get_career_roadmap finished".to_string(),
                },
            ],
            state: AssistantTurnState::CompletedText("### Key Skills\nPython".to_string()),
        }));

        let lines = text_lines(timeline.render_lines(&Theme::new(false)));
        assert_eq!(lines[0], "you> roadmap for data science");
        assert_eq!(lines[1], "  -> get_career_roadmap");
        assert_eq!(lines[2], "  <- get_career_roadmap finished");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "### Key Skills");
        assert_eq!(lines[5], "Python");
    }

    #[test]
    fn assistant_error_renders_message() {
        let mut timeline = Timeline::new();
        timeline.push(TimelineEntry::AssistantTurn(AssistantTurn {
            events: Vec::new(),
            state: AssistantTurnState::CompletedError("An error occurred: boom".to_string()),
        }));

        let lines = text_lines(timeline.render_lines(&Theme::new(false)));
        assert!(lines.iter().any(|line| line == "An error occurred: boom"));
    }

    #[test]
    fn diagram_is_framed() {
        let mut timeline = Timeline::new();
        timeline.push(TimelineEntry::Diagram("graph TD\n    A --> B".to_string()));

        let lines = text_lines(timeline.render_lines(&Theme::new(false)));
        assert_eq!(lines[0], "  ┌ roadmap diagram (mermaid)");
        assert_eq!(lines[1], "  │ graph TD");
        assert_eq!(lines[2], "  │     A --> B");
        assert_eq!(lines[3], "  └");
    }

    #[test]
    fn career_panel_lists_gaps_and_roadmap() {
        let kb = StaticKnowledgeBase::new();
        let record = kb.lookup("Data Scientist").expect("record");
        let info = CareerInfo::from_record("Data Scientist", record, &["python".to_string()]);

        let mut timeline = Timeline::new();
        timeline.push(TimelineEntry::CareerPanel(Box::new(info)));
        let lines = text_lines(timeline.render_lines(&Theme::new(false)));

        assert_eq!(lines[0], "== Data Scientist ==");
        let gaps = lines
            .iter()
            .find(|line| line.starts_with("Skills to build: "))
            .expect("gap line");
        assert!(!gaps.contains("Python"));
        assert!(lines.iter().any(|line| line == "Roadmap:"));
        assert!(
            lines
                .iter()
                .any(|line| line.starts_with("  Phase 1: Foundations"))
        );
    }

    #[test]
    fn take_unprinted_only_returns_new_entries() {
        let theme = Theme::new(false);
        let mut timeline = Timeline::new();
        timeline.push_output(OutputKind::SystemInfo, "first\nsecond");
        assert_eq!(
            text_lines(timeline.take_unprinted(&theme)),
            vec!["first", "second"]
        );
        assert!(timeline.take_unprinted(&theme).is_empty());

        timeline.push_output(OutputKind::SystemError, "third");
        assert_eq!(text_lines(timeline.take_unprinted(&theme)), vec!["third"]);
        assert_eq!(timeline.render_lines(&theme).len(), 3);
    }
}
