//! The counselling flows shipped with the service.
//!
//! Each submodule builds one [`FlowDefinition`]: its input and output
//! contracts, prompt template, safety binding and deterministic fallback.

use serde_json::{json, Value};

use super::registry::FlowDefinition;

pub mod crisis_intervention;
pub mod mental_health_assessment;
pub mod peer_support_moderation;
pub mod psychoeducation;
pub mod therapeutic_activities;
pub mod therapeutic_response;

pub const THERAPEUTIC_RESPONSE: &str = "therapeutic-response";
pub const MENTAL_HEALTH_ASSESSMENT: &str = "mental-health-assessment";
pub const CRISIS_INTERVENTION: &str = "crisis-intervention";
pub const PSYCHOEDUCATION: &str = "psychoeducation";
pub const THERAPEUTIC_ACTIVITIES: &str = "therapeutic-activities";
pub const PEER_SUPPORT_MODERATION: &str = "peer-support-moderation";

/// Opening line of every conversational fallback.
pub const CONNECTION_TROUBLE: &str = "I apologize, but I'm having trouble connecting right now. \
Please try again, or consider reaching out to a human counselor if you need immediate support.";

/// Short helpline reminder appended to fallback text.
pub const HELPLINE_REMINDER: &str = "If you are in crisis, call or text 988, or call Tele-MANAS \
at 1800-89-14416. Both are free and available 24/7.";

/// Every catalog flow, in no particular order.
pub fn all() -> Vec<FlowDefinition> {
    vec![
        therapeutic_response::definition(),
        mental_health_assessment::definition(),
        crisis_intervention::definition(),
        psychoeducation::definition(),
        therapeutic_activities::definition(),
        peer_support_moderation::definition(),
    ]
}

/// Emergency contacts in the shape of `emergencyContacts` items.
pub fn emergency_contacts() -> Value {
    json!([
        {
            "service": "988 Suicide & Crisis Lifeline",
            "contact": "Call or text 988",
            "availability": "24/7"
        },
        {
            "service": "Tele-MANAS National Mental Health Helpline",
            "contact": "1800-89-14416 (https://telemanas.mohfw.gov.in/home)",
            "availability": "24/7"
        },
        {
            "service": "Emergency services",
            "contact": "Call 112 (India) or 911 (US), or go to the nearest emergency room",
            "availability": "24/7"
        }
    ])
}

fn fallback_text(lead: &str) -> String {
    format!("{} {} {}", CONNECTION_TROUBLE, lead, HELPLINE_REMINDER)
}
