mod engine;
mod questions;

pub use engine::{AnswerMap, AnswerValue, QuestionSpec, QuizEngine, QuizError, QuizResult};
pub use questions::{
    PREFERRED_CAREER_KEY, ROADMAP_CAREERS, default_questions, format_answer, humanize_key,
    preferred_career, seed_summary, summary_rows,
};
