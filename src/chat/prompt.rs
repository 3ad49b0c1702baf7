pub const CHAT_SYSTEM_INSTRUCTION: &str = r#"You are a friendly and encouraging AI career mentor. Your goal is to help the user explore career paths based on their quiz results and answer their career-related questions.

Tools:
1) get_career_roadmap: use it only when the user specifically asks for a detailed roadmap for a career.
2) get_career_info: use it for structured facts about a career (skills, courses, mentors, jobs). Pass the user's known skills when you know them.
3) get_youtube_videos: use it when the user asks for videos or visual learning material.

For general questions about careers (e.g. "What do data scientists do?") or other topics, answer directly in a conversational manner."#;

pub fn opening_greeting(preferred_career: Option<&str>) -> String {
    match preferred_career {
        Some(career) => format!(
            "Hello! Thanks for completing the quiz. You picked **{career}** as the path that interests you most, so that is a great place to start. Ask me for a detailed roadmap, the skills you still need, or learning videos, or feel free to ask any other career question!"
        ),
        None => "Hello! Thanks for completing the quiz. Based on your answers, a career in **Data Science** or **Software Engineering** could be a great fit for you. You can ask me for a detailed roadmap for these careers, or feel free to ask any other questions you might have!".to_string(),
    }
}
