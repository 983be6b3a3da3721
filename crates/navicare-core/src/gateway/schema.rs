//! Response schemas sent with structured requests (OpenAPI subset, upper-case type names).

use serde_json::{json, Value};

/// `{isTriageComplete: required bool, nextQuestion?, triageResult?}`.
pub fn triage_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isTriageComplete": { "type": "BOOLEAN" },
            "nextQuestion": { "type": "STRING" },
            "triageResult": {
                "type": "OBJECT",
                "properties": {
                    "level": {
                        "type": "STRING",
                        "description": "EMERGENCY, URGENT, ROUTINE, or SELF_CARE"
                    },
                    "recommendation": { "type": "STRING" },
                    "specialtyNeeded": { "type": "STRING" },
                    "reasonForReferral": { "type": "STRING" },
                    "summary": { "type": "STRING" }
                }
            }
        },
        "required": ["isTriageComplete"]
    })
}

/// Array of provider records; name, address and phone are required per record.
pub fn provider_list_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "specialty": { "type": "STRING" },
                "address": { "type": "STRING" },
                "phone": { "type": "STRING" },
                "website": { "type": "STRING" },
                "bookingUrl": { "type": "STRING" },
                "hours": { "type": "STRING" },
                "acceptedInsurance": { "type": "ARRAY", "items": { "type": "STRING" } },
                "verified": { "type": "BOOLEAN" }
            },
            "required": ["name", "address", "phone"]
        }
    })
}
