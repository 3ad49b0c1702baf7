use super::engine::{AnswerMap, AnswerValue, QuestionSpec};

pub const PREFERRED_CAREER_KEY: &str = "preferred_career";

pub const ROADMAP_CAREERS: [&str; 5] = [
    "Frontend Developer",
    "Backend Developer",
    "DevOps Engineer",
    "Data Scientist",
    "Machine Learning Engineer",
];

pub fn default_questions() -> Vec<QuestionSpec> {
    vec![
        QuestionSpec::single(
            "age_range",
            "What is your age range?",
            &["Below 15", "15-18", "19-22", "23-30", "31-40", "41+"],
        ),
        QuestionSpec::single(
            "gender",
            "What is your gender?",
            &[
                "Male",
                "Female",
                "Non-binary/Third gender",
                "Prefer not to say",
            ],
        ),
        QuestionSpec::single(
            "education",
            "What is your highest level of education?",
            &[
                "School (Up to Class 10)",
                "Higher Secondary (Class 12)",
                "Diploma",
                "Undergraduate Degree",
                "Postgraduate Degree",
                "Doctorate (PhD)",
                "Other/None",
            ],
        ),
        QuestionSpec::multiple(
            "subjects",
            "Which subjects do you find most interesting?",
            &[
                "Math & Science",
                "Art & Design",
                "English & Literature",
                "History & Social Studies",
                "Technology & Computers",
                "Physical Education",
            ],
        ),
        QuestionSpec::multiple(
            "programming_language_known",
            "Which programming languages do you know?",
            &["Python", "C++", "JavaScript", "Ruby", "C", "Java", "None"],
        ),
        QuestionSpec::single(
            "problem_solving",
            "How do you prefer to solve problems?",
            &[
                "With a logical and analytical approach",
                "Through creative brainstorming",
                "By experimenting with trial and error",
                "By collaborating and asking for help",
            ],
        ),
        QuestionSpec::single(
            "communication_skills",
            "How confident are you in your communication skills?",
            &["Very confident", "Somewhat confident", "Not very confident"],
        ),
        QuestionSpec::single(
            PREFERRED_CAREER_KEY,
            "Which career path interests you the most?",
            &ROADMAP_CAREERS,
        ),
    ]
}

/// `programming_language_known` -> `Programming Language Known`.
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_answer(answer: Option<&AnswerValue>) -> String {
    match answer {
        Some(value) if !value.is_empty() => match value {
            AnswerValue::Single(choice) => format!("→ {choice}"),
            AnswerValue::Multiple(choices) => choices.join(" → "),
        },
        _ => "Not answered".to_string(),
    }
}

/// One `(prompt, rendered answer)` row per question, in quiz order.
pub fn summary_rows(questions: &[QuestionSpec], answers: &AnswerMap) -> Vec<(String, String)> {
    questions
        .iter()
        .map(|question| {
            (
                question.prompt.clone(),
                format_answer(answers.get(&question.key)),
            )
        })
        .collect()
}

/// Plain-text profile used to seed the conversation.
pub fn seed_summary(questions: &[QuestionSpec], answers: &AnswerMap) -> String {
    let mut text = "The user has completed a quiz. Here are their answers:\n".to_string();
    for question in questions {
        let Some(answer) = answers.get(&question.key) else {
            continue;
        };
        let rendered = match answer {
            AnswerValue::Single(choice) => choice.clone(),
            AnswerValue::Multiple(choices) if choices.is_empty() => "None selected".to_string(),
            AnswerValue::Multiple(choices) => choices.join(", "),
        };
        text.push_str(&format!("- {}: {rendered}\n", humanize_key(&question.key)));
    }
    text
}

pub fn preferred_career(answers: &AnswerMap) -> Option<&str> {
    answers
        .get(PREFERRED_CAREER_KEY)
        .and_then(AnswerValue::as_single)
        .filter(|career| !career.trim().is_empty())
}
