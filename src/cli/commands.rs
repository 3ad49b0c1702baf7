#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    Profile,
    Career,
    History(Option<usize>),
    Restart,
    Quiz,
    Trace,
}

/// One line typed while a quiz question is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum QuizInput {
    /// 1-based option numbers, in the order typed.
    Select(Vec<usize>),
    /// Empty line: keep the stored answer, or answer "none" on a multi-select.
    Keep,
    /// `-` or `clear` on a multi-select: store an empty selection.
    Clear,
    Back,
    Restart,
}

/// One line typed while the quiz summary is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SummaryInput {
    Submit,
    Back,
    Restart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

pub(crate) const HELP_TEXT: &str = "Available commands:\n  /help          Show this command list\n  /profile       Show the quiz answers the mentor was given\n  /career        Show the last career details the mentor looked up\n  /history [n]   Show the conversation so far (or the last n turns)\n  /restart       Start a fresh conversation from the same quiz answers\n  /quiz          Retake the quiz\n  /trace         Show path to the current trace file\n  exit, quit     Leave the program";

pub(crate) const QUIZ_HELP_TEXT: &str = "Type an option number (or several separated by commas where allowed). Empty line keeps the current answer, '-' or 'clear' empties a multi-choice answer, 'b' goes back, '/restart' starts over.";

pub(crate) const SUMMARY_HELP_TEXT: &str =
    "Type 'submit' to start chatting with your mentor, 'back' to change the last answer, or 'restart' to start over.";

pub(crate) fn parse_command(line: &str) -> Result<Command, ParseError> {
    if !line.starts_with('/') {
        return Err(ParseError::new("not a command"));
    }

    let trimmed = line.trim();
    if trimmed == "/" {
        return Err(ParseError::new("empty command. Try /help"));
    }

    let command_text = &trimmed[1..];
    let mut parts = command_text.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_ascii_lowercase();
    if name.is_empty() {
        return Err(ParseError::new("empty command. Try /help"));
    }
    let rest = parts.next().map(str::trim).unwrap_or("");

    match name.as_str() {
        "help" => expect_no_args(rest, Command::Help, "usage: /help"),
        "profile" => expect_no_args(rest, Command::Profile, "usage: /profile"),
        "career" => expect_no_args(rest, Command::Career, "usage: /career"),
        "history" => parse_history(rest),
        "restart" => expect_no_args(rest, Command::Restart, "usage: /restart"),
        "quiz" => expect_no_args(rest, Command::Quiz, "usage: /quiz"),
        "trace" => expect_no_args(rest, Command::Trace, "usage: /trace"),
        _ => Err(ParseError::new(format!(
            "unknown command '/{name}'. Try /help"
        ))),
    }
}

pub(crate) fn is_command_line(line: &str) -> bool {
    line.starts_with('/')
}

pub(crate) fn is_exit_line(line: &str) -> bool {
    matches!(line.trim(), "exit" | "quit" | "/exit" | "/quit")
}

/// Parses an answer line against a question with `option_count` options.
pub(crate) fn parse_quiz_input(
    line: &str,
    option_count: usize,
    allows_multiple: bool,
) -> Result<QuizInput, ParseError> {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" => return Ok(QuizInput::Keep),
        "b" | "back" => return Ok(QuizInput::Back),
        "/restart" | "restart" => return Ok(QuizInput::Restart),
        "-" | "clear" if allows_multiple => return Ok(QuizInput::Clear),
        "-" | "clear" => {
            return Err(ParseError::new(
                "choose exactly one option for this question",
            ));
        }
        _ => {}
    }

    let mut picks = Vec::new();
    for token in trimmed.split(',').map(str::trim) {
        let number = token
            .parse::<usize>()
            .ok()
            .filter(|number| (1..=option_count).contains(number))
            .ok_or_else(|| {
                ParseError::new(format!("'{token}' is not an option between 1 and {option_count}"))
            })?;
        if picks.contains(&number) {
            return Err(ParseError::new(format!("option {number} was chosen twice")));
        }
        picks.push(number);
    }

    if !allows_multiple && picks.len() != 1 {
        return Err(ParseError::new("choose exactly one option for this question"));
    }
    Ok(QuizInput::Select(picks))
}

pub(crate) fn parse_summary_input(line: &str) -> Result<SummaryInput, ParseError> {
    match line.trim().to_ascii_lowercase().as_str() {
        "submit" | "s" | "" => Ok(SummaryInput::Submit),
        "back" | "b" => Ok(SummaryInput::Back),
        "restart" | "/restart" => Ok(SummaryInput::Restart),
        _ => Err(ParseError::new("usage: submit | back | restart")),
    }
}

fn expect_no_args(rest: &str, command: Command, usage: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::new(usage))
    }
}

fn parse_history(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Ok(Command::History(None));
    }

    let value = rest
        .parse::<usize>()
        .map_err(|_| ParseError::new("usage: /history [n]"))?;
    if value == 0 {
        return Err(ParseError::new("usage: /history [n] (n must be >= 1)"));
    }

    Ok(Command::History(Some(value)))
}
