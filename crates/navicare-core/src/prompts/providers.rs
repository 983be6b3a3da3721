//! Two-phase provider lookup prompts: open retrieval, then strict extraction.

use crate::types::ProviderQuery;

/// Retrieval prompt. Sent with web search enabled.
pub const PROVIDER_SEARCH_TEMPLATE: &str = r#"Find 5 {specialty} medical providers near ZIP code {zip}{insurance}.
Provide their name, practice address, phone number, website, hours of operation, and an online booking link if available.
Check multiple sources to verify accuracy.
IMPORTANT: Provide the details and any descriptive text in {language}."#;

/// Extraction prompt. `{text}` is the retrieval answer.
pub const PROVIDER_EXTRACTION_TEMPLATE: &str = r#"Extract the provider details from the following text into a structured JSON list.
Ensure bookingUrl is a valid URL or null.
Include 'acceptedInsurance' as an array of strings based on the text.
Text: {text}"#;

pub fn provider_search_prompt(query: &ProviderQuery) -> String {
    let insurance = match query.insurance.as_deref().map(str::trim) {
        Some(i) if !i.is_empty() => format!(" that accept {} insurance", i),
        _ => String::new(),
    };
    PROVIDER_SEARCH_TEMPLATE
        .replace("{specialty}", &query.specialty)
        .replace("{zip}", &query.zip_code)
        .replace("{insurance}", &insurance)
        .replace("{language}", &query.language)
}

pub fn provider_extraction_prompt(text: &str) -> String {
    PROVIDER_EXTRACTION_TEMPLATE.replace("{text}", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(insurance: Option<&str>) -> ProviderQuery {
        ProviderQuery {
            specialty: "Orthopedics".into(),
            zip_code: "90210".into(),
            insurance: insurance.map(String::from),
            language: "English".into(),
        }
    }

    #[test]
    fn search_prompt_with_insurance() {
        let p = provider_search_prompt(&query(Some("Aetna")));
        assert!(p.starts_with("Find 5 Orthopedics medical providers near ZIP code 90210 that accept Aetna insurance."));
        assert!(p.contains("text in English."));
    }

    #[test]
    fn search_prompt_without_insurance() {
        let p = provider_search_prompt(&query(Some("  ")));
        assert!(p.starts_with("Find 5 Orthopedics medical providers near ZIP code 90210.\n"));
    }

    #[test]
    fn extraction_embeds_text() {
        assert!(provider_extraction_prompt("Dr. A, 555").ends_with("Text: Dr. A, 555"));
    }
}
