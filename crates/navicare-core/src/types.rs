//! Shared data model: conversation turns, triage outcome, providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who authored a turn. Serialized as the reasoning service's role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One turn of the conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp,
        }
    }

    pub fn model(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            timestamp,
        }
    }
}

/// Disposition category. Dispatched on exact value, never compared by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum TriageLevel {
    Emergency,
    Urgent,
    Routine,
    SelfCare,
}

impl TriageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriageLevel::Emergency => "EMERGENCY",
            TriageLevel::Urgent => "URGENT",
            TriageLevel::Routine => "ROUTINE",
            TriageLevel::SelfCare => "SELF_CARE",
        }
    }

    /// EMERGENCY routes to emergency services and SELF_CARE needs no referral,
    /// so only URGENT and ROUTINE open the provider directory.
    pub fn needs_directory(&self) -> bool {
        matches!(self, TriageLevel::Urgent | TriageLevel::Routine)
    }

    /// Care setting the level directs the patient to.
    pub fn care_setting(&self) -> &'static str {
        match self {
            TriageLevel::Emergency => "Nearest emergency room or call 911",
            TriageLevel::Urgent => "Urgent care or telehealth within 24 hours",
            TriageLevel::Routine => "Primary care or specialist appointment",
            TriageLevel::SelfCare => "Home care guidance",
        }
    }
}

impl fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriageLevel {
    type Err = String;

    /// Accepts the canonical names plus case/separator variants ("self care", "Self-Care").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_uppercase() })
            .collect();
        match normalized.as_str() {
            "EMERGENCY" => Ok(TriageLevel::Emergency),
            "URGENT" => Ok(TriageLevel::Urgent),
            "ROUTINE" => Ok(TriageLevel::Routine),
            "SELF_CARE" | "SELFCARE" => Ok(TriageLevel::SelfCare),
            _ => Err(format!("unknown triage level: {}", s)),
        }
    }
}

impl TryFrom<String> for TriageLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Missing and `null` both read as the type's default. The model sends
/// explicit nulls for fields it has nothing to say about.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Terminal outcome of a triage conversation. Set once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageResult {
    pub level: TriageLevel,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty_needed: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason_for_referral: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
}

/// Shown when the model names no specialty.
pub const DEFAULT_SPECIALTY: &str = "General Practice";

impl TriageResult {
    /// Specialty to search for, if the model named a non-blank one.
    pub fn specialty(&self) -> Option<&str> {
        self.specialty_needed
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Plain-text referral note for copying into another system.
    pub fn referral_note(&self) -> String {
        let mut note = String::new();
        note.push_str(&format!("Triage level: {}\n", self.level));
        note.push_str(&format!("Care setting: {}\n", self.level.care_setting()));
        note.push_str(&format!(
            "Recommended specialty: {}\n",
            self.specialty().unwrap_or(DEFAULT_SPECIALTY)
        ));
        if !self.reason_for_referral.trim().is_empty() {
            note.push_str(&format!("Reason for referral: {}\n", self.reason_for_referral.trim()));
        }
        if !self.summary.trim().is_empty() {
            note.push_str(&format!("Summary: {}\n", self.summary.trim()));
        }
        if !self.recommendation.trim().is_empty() {
            note.push_str(&format!("Next steps: {}\n", self.recommendation.trim()));
        }
        note
    }
}

/// One triage response from the reasoning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageTurn {
    pub is_triage_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triage_result: Option<TriageResult>,
}

impl TriageTurn {
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            is_triage_complete: false,
            next_question: Some(text.into()),
            triage_result: None,
        }
    }

    pub fn complete(result: TriageResult) -> Self {
        Self {
            is_triage_complete: true,
            next_question: None,
            triage_result: Some(result),
        }
    }

    /// The result, only when the turn both claims completion and carries one.
    pub fn resolved(&self) -> Option<&TriageResult> {
        if self.is_triage_complete {
            self.triage_result.as_ref()
        } else {
            None
        }
    }
}

fn default_verified() -> bool {
    true
}

fn null_as_verified<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_verified))
}

/// A care provider. Identity is the (name, phone) pair.
///
/// Blank name, address or phone deserialize fine; the gateway drops such records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub specialty: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub accepted_insurance: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(default = "default_verified", deserialize_with = "null_as_verified")]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Provider {
    pub fn identity(&self) -> (&str, &str) {
        (&self.name, &self.phone)
    }

    pub fn same_identity(&self, other: &Provider) -> bool {
        self.identity() == other.identity()
    }
}

/// Inputs for a directory search.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderQuery {
    pub specialty: String,
    pub zip_code: String,
    pub insurance: Option<String>,
    /// Language name the descriptive text should be written in.
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_wire_names() {
        assert_eq!(serde_json::to_string(&TriageLevel::SelfCare).unwrap(), "\"SELF_CARE\"");
        let level: TriageLevel = serde_json::from_str("\"EMERGENCY\"").unwrap();
        assert_eq!(level, TriageLevel::Emergency);
        let level: TriageLevel = serde_json::from_str("\"self care\"").unwrap();
        assert_eq!(level, TriageLevel::SelfCare);
        assert!(serde_json::from_str::<TriageLevel>("\"CRITICAL\"").is_err());
    }

    #[test]
    fn directory_only_for_urgent_and_routine() {
        assert!(TriageLevel::Urgent.needs_directory());
        assert!(TriageLevel::Routine.needs_directory());
        assert!(!TriageLevel::Emergency.needs_directory());
        assert!(!TriageLevel::SelfCare.needs_directory());
    }

    #[test]
    fn triage_turn_requires_completion_flag() {
        assert!(serde_json::from_str::<TriageTurn>(r#"{"nextQuestion":"How long?"}"#).is_err());
        let turn: TriageTurn =
            serde_json::from_str(r#"{"isTriageComplete":false,"nextQuestion":"How long?"}"#).unwrap();
        assert_eq!(turn, TriageTurn::question("How long?"));
        assert!(turn.resolved().is_none());
    }

    #[test]
    fn completion_without_result_is_not_resolved() {
        let turn: TriageTurn = serde_json::from_str(r#"{"isTriageComplete":true}"#).unwrap();
        assert!(turn.resolved().is_none());
    }

    #[test]
    fn provider_defaults() {
        let p: Provider = serde_json::from_str(
            r#"{"name":"Bay Ortho","address":"1 Main St","phone":"555-0100","bookingUrl":null}"#,
        )
        .unwrap();
        assert!(p.verified);
        assert!(p.accepted_insurance.is_empty());
        assert!(p.booking_url.is_none());
    }

    #[test]
    fn provider_nulls_take_defaults() {
        let p: Provider = serde_json::from_str(
            r#"{"name":"Bay Ortho","specialty":null,"address":"1 Main St","phone":"555-0100",
                "verified":null,"acceptedInsurance":null,"website":null}"#,
        )
        .unwrap();
        assert!(p.verified);
        assert!(p.accepted_insurance.is_empty());
        assert!(p.specialty.is_empty());
        assert!(p.website.is_none());
    }

    #[test]
    fn result_nulls_take_defaults() {
        let turn: TriageTurn = serde_json::from_str(
            r#"{"isTriageComplete":true,"nextQuestion":null,"triageResult":{"level":"EMERGENCY",
                "recommendation":null,"specialtyNeeded":null,"reasonForReferral":null,"summary":null}}"#,
        )
        .unwrap();
        let result = turn.resolved().unwrap();
        assert_eq!(result.level, TriageLevel::Emergency);
        assert!(result.reason_for_referral.is_empty());
        assert!(result.recommendation.is_empty());
        assert!(result.specialty().is_none());
    }

    #[test]
    fn referral_note_falls_back_to_general_practice() {
        let result = TriageResult {
            level: TriageLevel::Routine,
            recommendation: "Book a visit this week.".into(),
            specialty_needed: Some("  ".into()),
            reason_for_referral: "Persistent rash".into(),
            summary: "Two-week pruritic rash on forearm.".into(),
        };
        let note = result.referral_note();
        assert!(note.contains("Triage level: ROUTINE"));
        assert!(note.contains("Recommended specialty: General Practice"));
        assert!(note.contains("Reason for referral: Persistent rash"));
        assert!(note.contains("Next steps: Book a visit this week."));
    }
}
