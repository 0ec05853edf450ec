//! Immediate crisis response with a concrete safety plan.
//!
//! This is the flow critical conversations are redirected to. Its fallback is
//! a complete static safety plan, so a student in crisis always receives
//! helplines and next steps even when the model is unreachable.

use serde_json::{json, Value};

use super::{emergency_contacts, CONNECTION_TROUBLE, CRISIS_INTERVENTION};
use crate::domain::flows::contract::{Contract, FieldType};
use crate::domain::flows::prompt::PromptTemplate;
use crate::domain::flows::registry::FlowDefinition;
use crate::domain::safety::{InputSignal, RiskLevel, SafetyBinding};

pub const CRISIS_TYPES: &[&str] = &[
    "suicidal",
    "self-harm",
    "panic",
    "psychosis",
    "violence",
    "substance",
    "other",
];

const PREAMBLE: &str = "You are a crisis intervention specialist. Your first priority is keeping \
the student safe. Be calm, direct and supportive.";

const GUIDELINES: &str = "\
CRISIS INTERVENTION PROTOCOL:
1. Validate their pain, thank them for reaching out and make clear they are not alone right now.
2. Build an urgent safety plan of clear, immediate actions, numbered from 1:
   - Step 1 creates distance from any means of harm that was mentioned.
   - The next steps connect them to a live, trained person: call or text 988, Tele-MANAS at 1800-89-14416, or the campus crisis line.
   - Then move them to a safe public place or to other people.
   - The last step is calling emergency services or going to an emergency room if the thoughts intensify.
3. Offer two or three fast physiological coping techniques, such as cold water on the face, intense exercise or 5-4-3-2-1 grounding.
4. List emergency contacts with how to reach them and when they are available.
5. Always set followUpRequired and escalationNeeded to true.

Prioritize action over open-ended conversation. This is an emergency response.";

pub fn definition() -> FlowDefinition {
    FlowDefinition::new(
        CRISIS_INTERVENTION,
        input_contract(),
        output_contract(),
        PromptTemplate::new(PREAMBLE)
            .text("Crisis Situation", "/userMessage")
            .text("Crisis Type", "/crisisType")
            .text("Current Location", "/currentLocation")
            .text("Has Immediate Support", "/hasSupport")
            .text("Previous Attempts", "/previousAttempts")
            .guidelines(GUIDELINES),
        SafetyBinding::new()
            .signal(InputSignal::when_true(
                "/previousAttempts",
                RiskLevel::High,
                "previous-attempts",
            ))
            .signal(InputSignal::when_equals(
                "/crisisType",
                "suicidal",
                RiskLevel::Critical,
                "crisis-type:suicidal",
            ))
            .signal(InputSignal::when_equals(
                "/crisisType",
                "self-harm",
                RiskLevel::High,
                "crisis-type:self-harm",
            ))
            .signal(InputSignal::when_equals(
                "/crisisType",
                "violence",
                RiskLevel::High,
                "crisis-type:violence",
            ))
            // Reaching this flow is itself a crisis report.
            .minimum_risk(RiskLevel::High, "crisis-intervention")
            .escalation_field("/followUpRequired")
            .escalation_field("/escalationNeeded"),
        fallback,
    )
}

fn input_contract() -> Contract {
    Contract::new()
        .required("userMessage", FieldType::Text)
        .required("crisisType", FieldType::one_of(CRISIS_TYPES))
        .optional("currentLocation", FieldType::Text)
        .required("hasSupport", FieldType::Boolean)
        .optional("previousAttempts", FieldType::Boolean)
}

fn output_contract() -> Contract {
    Contract::new()
        .required("immediateResponse", FieldType::Text)
        .required(
            "safetyPlan",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("step", FieldType::number_at_least(1.0))
                    .required("action", FieldType::Text)
                    .required("rationale", FieldType::Text),
            )),
        )
        .required(
            "copingTechniques",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("name", FieldType::Text)
                    .required("instructions", FieldType::Text)
                    .required("duration", FieldType::Text),
            )),
        )
        .required(
            "emergencyContacts",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("service", FieldType::Text)
                    .required("contact", FieldType::Text)
                    .required("availability", FieldType::Text),
            )),
        )
        .required("followUpRequired", FieldType::Boolean)
        .required("escalationNeeded", FieldType::Boolean)
}

fn fallback(input: &Value) -> Value {
    let has_support = input.get("hasSupport").and_then(Value::as_bool).unwrap_or(false);
    let company = if has_support {
        "Go to the person who supports you, or ask them to come to you, and tell them what is happening."
    } else {
        "Move to a safe public place, such as a residence hall lobby or library, where other people are around."
    };

    json!({
        "immediateResponse": format!(
            "{} I'm really glad you reached out. You are not alone right now, and \
             people are ready to help you this minute. Please follow the steps below.",
            CONNECTION_TROUBLE
        ),
        "safetyPlan": [
            {
                "step": 1,
                "action": "Put distance between yourself and anything you could use to hurt yourself.",
                "rationale": "Space from the means of harm keeps you safe while the feeling passes."
            },
            {
                "step": 2,
                "action": "Call or text 988, or call Tele-MANAS at 1800-89-14416, and talk to a trained counselor now.",
                "rationale": "A live, trained person can stay with you through this moment."
            },
            {
                "step": 3,
                "action": company,
                "rationale": "Being around others makes it easier to stay safe."
            },
            {
                "step": 4,
                "action": "If the thoughts get stronger, call 112 (India) or 911 (US), or go to the nearest emergency room.",
                "rationale": "Emergency services can act immediately."
            }
        ],
        "copingTechniques": [
            {
                "name": "Cold water reset",
                "instructions": "Splash cold water on your face or hold something cold against your wrists.",
                "duration": "30 seconds"
            },
            {
                "name": "Paced breathing",
                "instructions": "Breathe in for 4 counts, hold for 4, and breathe out slowly for 6.",
                "duration": "2 minutes"
            },
            {
                "name": "5-4-3-2-1 grounding",
                "instructions": "Name 5 things you see, 4 you can touch, 3 you hear, 2 you smell and 1 you taste.",
                "duration": "3 minutes"
            }
        ],
        "emergencyContacts": emergency_contacts(),
        "followUpRequired": true,
        "escalationNeeded": true
    })
}
