mod common;

use common::*;
use navicare_core::prompts::{GREETING_EMPTY_FALLBACK, TRIAGE_CLARIFICATION_FALLBACK};
use navicare_core::{
    find_language, GatewayError, Language, Message, ProviderQuery, ReasoningGateway, TriageLevel,
};
use chrono::Utc;

fn query() -> ProviderQuery {
    ProviderQuery {
        specialty: "Dermatology".into(),
        zip_code: "02139".into(),
        insurance: None,
        language: "English".into(),
    }
}

#[tokio::test]
async fn blank_greeting_uses_empty_fallback() {
    let client = ScriptedClient::new(vec![text("   ")]);
    let gateway = ReasoningGateway::new(client.clone());
    let greeting = gateway.request_greeting(&Language::default()).await.unwrap();
    assert_eq!(greeting, GREETING_EMPTY_FALLBACK);
    assert!(client.requests()[0].contents[0].text.contains("greeting in English."));
}

#[tokio::test]
async fn greeting_transport_error_is_returned() {
    let gateway = ReasoningGateway::new(ScriptedClient::new(vec![Reply::Fail]));
    let err = gateway.request_greeting(&Language::default()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Http { status: 503, .. }));
}

#[tokio::test]
async fn triage_parses_fenced_completion() {
    let client = ScriptedClient::new(vec![text(
        "```json\n{\"isTriageComplete\":true,\"triageResult\":{\"level\":\"ROUTINE\",\"specialtyNeeded\":\"Dermatology\",\"recommendation\":\"Book a visit.\"}}\n```",
    )]);
    let gateway = ReasoningGateway::new(client.clone());
    let history = vec![Message::user("Rash", Utc::now())];
    let french = find_language("French").unwrap();

    let turn = gateway.advance_triage(&history, &french).await.unwrap();
    let result = turn.resolved().unwrap();
    assert_eq!(result.level, TriageLevel::Routine);
    assert_eq!(result.specialty(), Some("Dermatology"));

    let request = &client.requests()[0];
    assert!(request.system_instruction.as_deref().unwrap().ends_with("in French."));
    assert_eq!(request.response_schema.as_ref().unwrap()["required"][0], "isTriageComplete");
}

#[tokio::test]
async fn triage_without_completion_flag_is_clarification() {
    let gateway = ReasoningGateway::new(ScriptedClient::new(vec![text(r#"{"nextQuestion":"How long?"}"#)]));
    let turn = gateway.advance_triage(&[], &Language::default()).await.unwrap();
    assert!(!turn.is_triage_complete);
    assert_eq!(turn.next_question.as_deref(), Some(TRIAGE_CLARIFICATION_FALLBACK));
}

#[tokio::test]
async fn empty_triage_answer_is_clarification() {
    let gateway = ReasoningGateway::new(ScriptedClient::new(vec![Reply::Empty]));
    let turn = gateway.advance_triage(&[], &Language::default()).await.unwrap();
    assert_eq!(turn.next_question.as_deref(), Some(TRIAGE_CLARIFICATION_FALLBACK));
}

#[tokio::test]
async fn search_failure_in_either_phase_is_empty() {
    let gateway = ReasoningGateway::new(ScriptedClient::new(vec![Reply::Fail]));
    assert!(gateway.search_providers(&query()).await.is_empty());

    let client = ScriptedClient::new(vec![text("Skin Co, 555"), text("not json")]);
    let gateway = ReasoningGateway::new(client.clone());
    assert!(gateway.search_providers(&query()).await.is_empty());
    assert_eq!(client.calls(), 2);

    let client = ScriptedClient::new(vec![Reply::Empty]);
    let gateway = ReasoningGateway::new(client.clone());
    assert!(gateway.search_providers(&query()).await.is_empty());
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn search_extraction_embeds_retrieval_text() {
    let client = ScriptedClient::new(vec![
        text("Skin Co at 9 Elm St, call 555-0199"),
        text(r#"[{"name":"Skin Co","address":"9 Elm St","phone":"555-0199","bookingUrl":null}]"#),
    ]);
    let gateway = ReasoningGateway::new(client.clone());
    let providers = gateway.search_providers(&query()).await;

    assert_eq!(providers.len(), 1);
    assert!(providers[0].verified);
    let requests = client.requests();
    assert!(requests[0].web_search);
    assert!(requests[0].response_schema.is_none());
    assert!(!requests[1].web_search);
    assert!(requests[1].contents[0].text.ends_with("Text: Skin Co at 9 Elm St, call 555-0199"));
}

#[tokio::test]
async fn speech_absent_is_none() {
    let gateway = ReasoningGateway::new(ScriptedClient::new(vec![text("no audio here")]));
    assert_eq!(gateway.synthesize_speech("Hello", "Kore").await.unwrap(), None);

    let gateway = ReasoningGateway::new(ScriptedClient::new(vec![Reply::Audio("AAAA".into())]));
    assert_eq!(gateway.synthesize_speech("Hello", "Kore").await.unwrap().as_deref(), Some("AAAA"));
}
