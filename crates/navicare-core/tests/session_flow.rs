mod common;

use base64::Engine;
use common::*;
use navicare_core::prompts::{GREETING_FALLBACK, TECHNICAL_ISSUE_MESSAGE, TRIAGE_CLARIFICATION_FALLBACK};
use navicare_core::{find_language, Event, Phase, Role, SessionError, TriageLevel, VoiceActivity};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn urgent_orthopedics_end_to_end() {
    let mut h = harness(vec![
        text("Hello, I am NaviCare AI."),
        question("How long has your knee hurt?"),
        complete("URGENT", Some("Orthopedics")),
        text("Bay Ortho, 1 Main St, 555-0100. Knee Center, 4 Main St, 555-0101."),
        text(r#"[{"name":"Bay Ortho","address":"1 Main St","phone":"555-0100"},
                {"name":"Knee Center","address":"4 Main St","phone":"555-0101","acceptedInsurance":["Aetna"]}]"#),
    ]);
    let d = &mut h.driver;

    d.start().await.unwrap();
    settle(d).await;
    assert_eq!(d.state().phase, Phase::Conversing);
    assert_eq!(d.state().messages[0].text, "Hello, I am NaviCare AI.");

    d.send("My knee is swollen").await.unwrap();
    settle(d).await;
    assert_eq!(d.state().messages.last().unwrap().text, "How long has your knee hurt?");

    d.send("Three days").await.unwrap();
    settle(d).await;
    let state = d.state();
    assert_eq!(state.phase, Phase::Resolved);
    assert_eq!(state.triage.as_ref().unwrap().level, TriageLevel::Urgent);
    assert!(!state.emergency_escalated);
    assert!(state.can_search_providers());
    assert_eq!(state.messages.last().unwrap().text, "Follow the care plan.");

    assert_eq!(d.search().await.unwrap_err(), SessionError::MissingZipCode);
    d.set_search_inputs("90210", "Aetna").await.unwrap();
    d.search().await.unwrap();
    settle(d).await;
    assert_eq!(d.state().providers.len(), 2);
    assert!(d.state().providers.iter().all(|p| p.specialty == "Orthopedics"));

    let requests = h.client.requests();
    assert_eq!(requests.len(), 5);
    // second triage call carries the whole conversation in order
    let roles: Vec<Role> = requests[2].contents.iter().map(|c| c.role).collect();
    assert_eq!(roles, vec![Role::Model, Role::User, Role::Model, Role::User]);
    assert!(requests[2].response_schema.is_some());
    assert!(requests[3].web_search);
    assert!(requests[3].contents[0].text.contains("that accept Aetna insurance"));
    assert!(requests[4].response_schema.is_some());
}

#[tokio::test]
async fn emergency_is_monotonic_until_reset() {
    let mut h = harness(vec![text("Hi"), complete("EMERGENCY", Some("Cardiology"))]);
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;
    d.send("Crushing chest pain").await.unwrap();
    settle(d).await;

    assert!(d.state().emergency_escalated);
    assert!(d.state().emergency_notice().unwrap().contains("911"));
    assert_eq!(d.send("it's better now").await.unwrap_err(), SessionError::NotConversing);
    d.set_search_inputs("10001", "").await.unwrap();
    assert_eq!(d.search().await.unwrap_err(), SessionError::SearchUnavailable);
    assert!(d.state().emergency_escalated);

    d.reset().await.unwrap();
    assert!(!d.state().emergency_escalated);
    assert_eq!(d.state().phase, Phase::Consent);
}

#[tokio::test]
async fn emergency_with_null_fields_still_escalates() {
    let mut h = harness(vec![
        text("Hi"),
        text(r#"{"isTriageComplete":true,"nextQuestion":null,"triageResult":{"level":"EMERGENCY","recommendation":"Call 911 now.","specialtyNeeded":null,"reasonForReferral":null,"summary":null}}"#),
    ]);
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;
    d.send("I can't breathe").await.unwrap();
    settle(d).await;

    assert_eq!(d.state().phase, Phase::Resolved);
    assert!(d.state().emergency_escalated);
    assert_eq!(d.state().triage.as_ref().unwrap().level, TriageLevel::Emergency);
    assert_eq!(d.state().messages.last().unwrap().text, "Call 911 now.");
}

#[tokio::test]
async fn self_care_offers_no_search() {
    let mut h = harness(vec![text("Hi"), complete("SELF_CARE", Some("General Practice"))]);
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;
    d.send("Mild sniffles").await.unwrap();
    settle(d).await;

    assert_eq!(d.state().triage.as_ref().unwrap().level, TriageLevel::SelfCare);
    assert!(!d.state().can_search_providers());
    d.set_search_inputs("10001", "").await.unwrap();
    assert_eq!(d.search().await.unwrap_err(), SessionError::SearchUnavailable);
}

#[tokio::test]
async fn blank_input_changes_nothing() {
    let mut h = harness(vec![text("Hi")]);
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;
    let before = d.state().clone();
    let calls = h.client.calls();

    assert_eq!(d.send("  \t ").await.unwrap_err(), SessionError::EmptyInput);
    assert_eq!(d.state(), &before);
    assert_eq!(h.client.calls(), calls);
}

#[tokio::test]
async fn malformed_triage_asks_for_clarification() {
    let mut h = harness(vec![text("Hi"), text("{isTriageComplete: maybe")]);
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;
    d.send("Headache").await.unwrap();
    settle(d).await;

    assert_eq!(d.state().phase, Phase::Conversing);
    assert_eq!(d.state().messages.last().unwrap().text, TRIAGE_CLARIFICATION_FALLBACK);
    assert!(d.state().can_send());
}

#[tokio::test]
async fn backend_failures_degrade_to_fixed_text() {
    let mut h = harness(vec![Reply::Fail, Reply::Fail]);
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;
    assert_eq!(d.state().messages[0].text, GREETING_FALLBACK);

    d.send("Headache").await.unwrap();
    settle(d).await;
    assert_eq!(d.state().messages.last().unwrap().text, TECHNICAL_ISSUE_MESSAGE);
    assert_eq!(d.state().phase, Phase::Conversing);
}

#[tokio::test]
async fn second_send_while_loading_is_rejected() {
    let mut h = harness(vec![text("Hi"), question("Where?")]);
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;

    d.send("Back pain").await.unwrap();
    assert_eq!(d.send("Also tired").await.unwrap_err(), SessionError::RequestInFlight);
    settle(d).await;
    let user_turns = d.state().messages.iter().filter(|m| m.role == Role::User).count();
    assert_eq!(user_turns, 1);
}

#[tokio::test]
async fn transcript_feeds_the_text_path() {
    let mut h = harness_with_capture(
        vec![text("Hola"), question("¿Desde cuándo?")],
        ScriptedCapture::saying("Me duele la cabeza"),
    );
    let d = &mut h.driver;
    d.select_language(find_language("Spanish").unwrap()).await.unwrap();
    d.start().await.unwrap();
    settle(d).await;

    d.toggle_listening().await.unwrap();
    assert_eq!(d.state().voice_activity(), VoiceActivity::Listening);
    let transcript = d.next_event().await;
    d.dispatch(transcript).await.unwrap();
    settle(d).await;
    d.drain().await;

    let state = d.state();
    assert_eq!(state.messages[1].text, "Me duele la cabeza");
    assert_eq!(state.messages[2].text, "¿Desde cuándo?");
    assert!(!state.listening);
    assert_eq!(h.capture.languages.lock().unwrap().as_slice(), ["Spanish"]);
    assert!(h.client.requests()[1]
        .system_instruction
        .as_deref()
        .unwrap()
        .ends_with("in Spanish."));
}

#[tokio::test]
async fn read_aloud_plays_decoded_pcm() {
    let pcm: Vec<u8> = vec![0x00, 0x40, 0x00, 0xC0];
    let audio = base64::engine::general_purpose::STANDARD.encode(&pcm);
    let mut h = harness(vec![text("Hi"), Reply::Audio(audio)]);
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;

    d.read_aloud(0).await.unwrap();
    assert_eq!(d.state().voice_activity(), VoiceActivity::Speaking);
    assert_eq!(d.read_aloud(0).await.unwrap_err(), SessionError::SpeechBusy);
    settle(d).await;

    assert!(!d.state().speaking);
    assert_eq!(h.output.played.lock().unwrap().as_slice(), [pcm]);
    let speech = &h.client.requests()[1];
    assert_eq!(speech.speech_voice.as_deref(), Some("Kore"));
    assert_eq!(speech.model, navicare_core::config::DEFAULT_SPEECH_MODEL);
}

#[tokio::test]
async fn absent_audio_plays_nothing() {
    let mut h = harness(vec![text("Hi"), Reply::Empty]);
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;

    d.read_aloud(0).await.unwrap();
    settle(d).await;
    assert!(!d.state().speaking);
    assert!(h.output.played.lock().unwrap().is_empty());
    assert_eq!(h.client.calls(), 2);
}

#[tokio::test]
async fn reset_cancels_and_releases() {
    let mut h = harness(vec![text("Hi"), question("When did it start?")]);
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;
    d.send("Rash on my arm").await.unwrap();

    d.reset().await.unwrap();
    assert_eq!(h.output.releases.load(Ordering::SeqCst), 1);
    assert_eq!(h.capture.cancels.load(Ordering::SeqCst), 1);
    assert_eq!(d.state().phase, Phase::Consent);
    assert!(d.state().messages.is_empty());
    assert!(!d.state().is_loading());

    // a reply that raced the reset is stale
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    d.drain().await;
    assert!(d.state().messages.is_empty());
}

#[tokio::test]
async fn reset_discards_queued_transcripts() {
    let mut h = harness_with_capture(vec![text("Hi"), text("Hi again")], ScriptedCapture::saying("stale words"));
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;
    // capture queues a transcript and its end before anyone reads them
    d.toggle_listening().await.unwrap();
    d.reset().await.unwrap();

    d.start().await.unwrap();
    let event = d.next_event().await;
    assert!(matches!(event, Event::GreetingReady { .. }));
    d.dispatch(event).await.unwrap();
    d.drain().await;

    let state = d.state();
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].text, "Hi again");
    assert!(!state.listening);
    assert_eq!(h.client.calls(), 2);
}

#[tokio::test]
async fn saved_providers_toggle_by_identity() {
    let mut h = harness(vec![
        text("Hi"),
        complete("ROUTINE", Some("Dermatology")),
        text("Skin Co, 9 Elm St, 555-0199"),
        text(r#"[{"name":"Skin Co","address":"9 Elm St","phone":"555-0199"}]"#),
    ]);
    let d = &mut h.driver;
    d.start().await.unwrap();
    settle(d).await;
    d.send("Itchy rash for weeks").await.unwrap();
    settle(d).await;
    d.set_search_inputs("02139", "").await.unwrap();
    d.search().await.unwrap();
    settle(d).await;

    let provider = d.state().provider(0).unwrap().clone();
    assert!(d.toggle_saved(&provider).unwrap());
    assert_eq!(d.directory().saved().len(), 1);
    assert!(!d.toggle_saved(&provider).unwrap());
    assert!(d.directory().saved().is_empty());
    assert_eq!(d.state().provider(3).unwrap_err(), SessionError::NoSuchProvider(3));
}
