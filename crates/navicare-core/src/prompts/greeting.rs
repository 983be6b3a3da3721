//! Opening greeting prompt.

/// `{language}` is replaced with the session language name.
pub const GREETING_TEMPLATE: &str = r#"Generate a warm, professional medical assistant greeting in {language}.
Mention that you are NaviCare AI, an assistant for symptom assessment and provider navigation.
Include a clear disclaimer that you are not a doctor and users should call emergency services for immediate life-threatening issues.
End with a question asking how you can help today."#;

pub fn greeting_prompt(language: &str) -> String {
    GREETING_TEMPLATE.replace("{language}", language)
}
