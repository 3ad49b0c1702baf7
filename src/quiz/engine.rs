use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSpec {
    pub key: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub allows_multiple: bool,
}

impl QuestionSpec {
    pub fn single(key: &str, prompt: &str, options: &[&str]) -> Self {
        Self::build(key, prompt, options, false)
    }

    pub fn multiple(key: &str, prompt: &str, options: &[&str]) -> Self {
        Self::build(key, prompt, options, true)
    }

    fn build(key: &str, prompt: &str, options: &[&str], allows_multiple: bool) -> Self {
        Self {
            key: key.to_string(),
            prompt: prompt.to_string(),
            options: options.iter().map(|option| (*option).to_string()).collect(),
            allows_multiple,
        }
    }

    fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|option| option == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    Single(String),
    Multiple(Vec<String>),
}

impl AnswerValue {
    pub fn multiple<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Multiple(values.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(value) => value.is_empty(),
            Self::Multiple(values) => values.is_empty(),
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(_) => None,
        }
    }

    pub fn selections(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerMap {
    entries: BTreeMap<String, AnswerValue>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AnswerValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    OutOfRange { cursor: usize, len: usize },
    InvalidAnswer { key: String, reason: String },
    NotComplete { cursor: usize, len: usize },
}

impl Display for QuizError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { cursor, len } => {
                write!(f, "no current question: quiz is complete ({cursor}/{len})")
            }
            Self::InvalidAnswer { key, reason } => write!(f, "invalid answer for {key}: {reason}"),
            Self::NotComplete { cursor, len } => {
                write!(f, "quiz is not complete yet ({cursor}/{len} answered)")
            }
        }
    }
}

impl Error for QuizError {}

pub type QuizResult<T> = std::result::Result<T, QuizError>;

/// Linear quiz wizard.
///
/// The cursor only moves forward through `submit_answer`, one step at a time.
/// `previous` keeps every stored answer so revisiting a question offers the
/// earlier choice as the default.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    questions: Vec<QuestionSpec>,
    cursor: usize,
    answers: AnswerMap,
}

impl QuizEngine {
    pub fn new(questions: Vec<QuestionSpec>) -> Self {
        Self {
            questions,
            cursor: 0,
            answers: AnswerMap::new(),
        }
    }

    pub fn questions(&self) -> &[QuestionSpec] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.questions.len()
    }

    /// 1-based position of the current question and the total count.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.questions.len();
        ((self.cursor + 1).min(total), total)
    }

    pub fn current_question(&self) -> QuizResult<&QuestionSpec> {
        self.questions.get(self.cursor).ok_or(QuizError::OutOfRange {
            cursor: self.cursor,
            len: self.questions.len(),
        })
    }

    pub fn stored_answer(&self) -> Option<&AnswerValue> {
        let question = self.questions.get(self.cursor)?;
        self.answers.get(&question.key)
    }

    pub fn submit_answer(&mut self, value: AnswerValue) -> QuizResult<()> {
        let question = self.current_question()?;
        validate_answer(question, &value)?;

        let key = question.key.clone();
        self.answers.insert(key, value);
        self.cursor += 1;
        Ok(())
    }

    pub fn previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn restart(&mut self) {
        self.cursor = 0;
        self.answers.clear();
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn summary(&self) -> QuizResult<&AnswerMap> {
        if self.is_complete() {
            Ok(&self.answers)
        } else {
            Err(self.not_complete())
        }
    }

    /// Hands the finalized answers to the caller and resets the quiz.
    pub fn take_summary(&mut self) -> QuizResult<AnswerMap> {
        if !self.is_complete() {
            return Err(self.not_complete());
        }

        self.cursor = 0;
        Ok(std::mem::take(&mut self.answers))
    }

    fn not_complete(&self) -> QuizError {
        QuizError::NotComplete {
            cursor: self.cursor,
            len: self.questions.len(),
        }
    }
}

fn validate_answer(question: &QuestionSpec, value: &AnswerValue) -> QuizResult<()> {
    let invalid = |reason: String| QuizError::InvalidAnswer {
        key: question.key.clone(),
        reason,
    };

    match value {
        AnswerValue::Single(_) if question.allows_multiple => Err(invalid(
            "expected a list of selections for a multi-select question".to_string(),
        )),
        AnswerValue::Multiple(_) if !question.allows_multiple => {
            Err(invalid("expected exactly one selection".to_string()))
        }
        AnswerValue::Single(choice) => {
            if question.has_option(choice) {
                Ok(())
            } else {
                Err(invalid(format!("'{choice}' is not one of the options")))
            }
        }
        AnswerValue::Multiple(choices) => {
            for (index, choice) in choices.iter().enumerate() {
                if !question.has_option(choice) {
                    return Err(invalid(format!("'{choice}' is not one of the options")));
                }
                if choices[..index].contains(choice) {
                    return Err(invalid(format!("'{choice}' was selected more than once")));
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnswerMap, AnswerValue, QuestionSpec, QuizEngine, QuizError};

    fn two_question_quiz() -> QuizEngine {
        QuizEngine::new(vec![
            QuestionSpec::single("q1", "Pick one", &["A", "B"]),
            QuestionSpec::multiple("q2", "Pick any", &["X", "Y"]),
        ])
    }

    #[test]
    fn two_question_scenario_produces_summary() {
        let mut quiz = two_question_quiz();
        quiz.submit_answer(AnswerValue::Single("A".to_string()))
            .expect("q1");
        quiz.submit_answer(AnswerValue::multiple(["X", "Y"]))
            .expect("q2");

        assert!(quiz.is_complete());
        let mut expected = AnswerMap::new();
        expected.insert("q1", AnswerValue::Single("A".to_string()));
        expected.insert("q2", AnswerValue::multiple(["X", "Y"]));
        assert_eq!(quiz.summary().expect("summary"), &expected);
    }

    #[test]
    fn submit_advances_by_one_and_stops_at_len() {
        let mut quiz = two_question_quiz();
        assert_eq!(quiz.cursor(), 0);
        quiz.submit_answer(AnswerValue::Single("B".to_string()))
            .expect("q1");
        assert_eq!(quiz.cursor(), 1);
        quiz.submit_answer(AnswerValue::Multiple(vec![]))
            .expect("empty multi-select is a valid submission");
        assert_eq!(quiz.cursor(), 2);

        let err = quiz
            .submit_answer(AnswerValue::Single("A".to_string()))
            .expect_err("no question left");
        assert_eq!(err, QuizError::OutOfRange { cursor: 2, len: 2 });
        assert_eq!(quiz.cursor(), 2);
    }

    #[test]
    fn current_question_fails_when_complete() {
        let mut quiz = two_question_quiz();
        quiz.submit_answer(AnswerValue::Single("A".to_string()))
            .expect("q1");
        quiz.submit_answer(AnswerValue::multiple(["Y"])).expect("q2");

        assert!(matches!(
            quiz.current_question(),
            Err(QuizError::OutOfRange { .. })
        ));
    }

    #[test]
    fn invalid_answers_are_rejected_without_moving() {
        let mut quiz = two_question_quiz();

        let err = quiz
            .submit_answer(AnswerValue::Single("C".to_string()))
            .expect_err("unknown option");
        assert!(err.to_string().contains("'C' is not one of the options"));

        let err = quiz
            .submit_answer(AnswerValue::multiple(["A"]))
            .expect_err("multi on single-select");
        assert!(err.to_string().contains("exactly one selection"));
        assert_eq!(quiz.cursor(), 0);

        quiz.submit_answer(AnswerValue::Single("A".to_string()))
            .expect("q1");
        let err = quiz
            .submit_answer(AnswerValue::multiple(["X", "X"]))
            .expect_err("duplicate selection");
        assert!(err.to_string().contains("more than once"));
        let err = quiz
            .submit_answer(AnswerValue::Single("X".to_string()))
            .expect_err("single on multi-select");
        assert!(err.to_string().contains("list of selections"));
        assert_eq!(quiz.cursor(), 1);
    }

    #[test]
    fn previous_is_a_no_op_at_start() {
        let mut quiz = two_question_quiz();
        quiz.previous();
        assert_eq!(quiz.cursor(), 0);
    }

    #[test]
    fn going_back_preserves_later_answers() {
        let mut quiz = QuizEngine::new(vec![
            QuestionSpec::single("q1", "one", &["A", "B"]),
            QuestionSpec::single("q2", "two", &["C", "D"]),
            QuestionSpec::single("q3", "three", &["E", "F"]),
        ]);
        quiz.submit_answer(AnswerValue::Single("A".to_string()))
            .expect("q1");
        quiz.submit_answer(AnswerValue::Single("D".to_string()))
            .expect("q2");

        quiz.previous();
        quiz.previous();
        assert_eq!(quiz.cursor(), 0);
        assert_eq!(
            quiz.stored_answer(),
            Some(&AnswerValue::Single("A".to_string()))
        );

        quiz.submit_answer(AnswerValue::Single("A".to_string()))
            .expect("resubmit q1");
        assert_eq!(quiz.cursor(), 1);
        assert_eq!(
            quiz.stored_answer(),
            Some(&AnswerValue::Single("D".to_string()))
        );
        assert_eq!(
            quiz.answers().get("q2"),
            Some(&AnswerValue::Single("D".to_string()))
        );
    }

    #[test]
    fn completed_quiz_can_step_back_to_edit() {
        let mut quiz = two_question_quiz();
        quiz.submit_answer(AnswerValue::Single("A".to_string()))
            .expect("q1");
        quiz.submit_answer(AnswerValue::multiple(["X"])).expect("q2");
        assert!(quiz.is_complete());

        quiz.previous();
        assert!(!quiz.is_complete());
        assert_eq!(quiz.current_question().expect("q2").key, "q2");
        assert!(matches!(
            quiz.summary(),
            Err(QuizError::NotComplete { cursor: 1, len: 2 })
        ));

        quiz.submit_answer(AnswerValue::multiple(["Y"])).expect("edit q2");
        assert_eq!(
            quiz.summary().expect("summary").get("q2"),
            Some(&AnswerValue::multiple(["Y"]))
        );
    }

    #[test]
    fn restart_clears_everything() {
        let mut quiz = two_question_quiz();
        quiz.submit_answer(AnswerValue::Single("A".to_string()))
            .expect("q1");
        quiz.submit_answer(AnswerValue::multiple(["X"])).expect("q2");

        quiz.restart();
        assert_eq!(quiz.cursor(), 0);
        assert!(quiz.answers().is_empty());
        assert_eq!(quiz.stored_answer(), None);
    }

    #[test]
    fn take_summary_hands_off_and_resets() {
        let mut quiz = two_question_quiz();
        assert!(quiz.take_summary().is_err());

        quiz.submit_answer(AnswerValue::Single("B".to_string()))
            .expect("q1");
        quiz.submit_answer(AnswerValue::multiple(["Y"])).expect("q2");

        let answers = quiz.take_summary().expect("hand-off");
        assert_eq!(answers.len(), 2);
        assert_eq!(quiz.cursor(), 0);
        assert!(quiz.answers().is_empty());
    }

    #[test]
    fn progress_reports_one_based_position() {
        let mut quiz = two_question_quiz();
        assert_eq!(quiz.progress(), (1, 2));
        quiz.submit_answer(AnswerValue::Single("A".to_string()))
            .expect("q1");
        assert_eq!(quiz.progress(), (2, 2));
        quiz.submit_answer(AnswerValue::multiple(["X"])).expect("q2");
        assert_eq!(quiz.progress(), (2, 2));
    }
}
