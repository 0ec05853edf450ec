//! Conversational reply from the AI counselor.

use serde_json::{json, Value};

use super::{fallback_text, THERAPEUTIC_RESPONSE};
use crate::domain::flows::contract::{Contract, FieldType};
use crate::domain::flows::prompt::PromptTemplate;
use crate::domain::flows::registry::FlowDefinition;
use crate::domain::safety::{RiskLevel, SafetyBinding};

pub const LANGUAGES: &[&str] = &["english", "hindi", "kashmiri"];

pub const TONES: &[&str] = &["supportive", "empathetic", "encouraging", "validating", "exploratory"];

const PREAMBLE: &str = "You are a professional, empathetic AI counselor for college students, \
grounded in evidence-based approaches such as CBT, DBT and person-centered therapy. Offer \
supportive, non-judgmental guidance and keep professional boundaries.";

const GUIDELINES: &str = "\
THERAPEUTIC GUIDELINES:
1. Listen first. Acknowledge and validate feelings and normalize the experience.
2. Work collaboratively. Use \"we\" language and let the student choose the direction.
3. Pace yourself. Explore before solving, but when the student asks what to do, give a few clear, actionable strategies.
4. Build on strengths. Treat reaching out as a strength.
5. Keep safety first while maintaining rapport.

RESPONSE STRUCTURE:
1. Open with validation.
2. If distress is high, offer one small coping tool such as box breathing.
3. Ask gentle, open-ended questions.
4. Offer a choice between practical strategies and exploring feelings.
5. Close with a hopeful statement that leaves the student in control.

RISK ASSESSMENT:
- Screen for suicidal ideation, self-harm or harm to others.
- Note hopelessness, worthlessness or isolation.
- Note physical stress symptoms such as a racing heart or sleeplessness.
Report what you observe in riskIndicators.

Techniques to draw on: cognitive reframing, 5-4-3-2-1 grounding, box or 4-4-6 breathing, \
behavioral activation, self-compassion. Be conversational and avoid clinical jargon. \
Reply in the student's preferred language when one is given.";

/// Tone keyword ladder used when no model reply is available.
const TONE_LADDER: &[(&[&str], &str)] = &[
    (&["stressed", "anxious", "worried"], "supportive"),
    (&["sad", "depressed", "down"], "empathetic"),
    (&["angry", "frustrated"], "validating"),
    (&["help", "advice"], "exploratory"),
];

pub fn definition() -> FlowDefinition {
    FlowDefinition::new(
        THERAPEUTIC_RESPONSE,
        input_contract(),
        output_contract(),
        PromptTemplate::new(PREAMBLE)
            .text("Current Message", "/userMessage")
            .text("Preferred Language", "/userProfile/preferredLanguage")
            .list("Previous Concerns", "/userProfile/previousConcerns")
            .text("Current Mood", "/userProfile/currentMoodState")
            .guidelines(GUIDELINES),
        SafetyBinding::new().model_risk("/riskIndicators/level", "/riskIndicators/flags"),
        fallback,
    )
}

fn input_contract() -> Contract {
    Contract::new().required("userMessage", FieldType::Text).optional(
        "userProfile",
        FieldType::object(
            Contract::new()
                .optional("preferredLanguage", FieldType::one_of(LANGUAGES))
                .optional("previousConcerns", FieldType::text_list())
                .optional("currentMoodState", FieldType::Text),
        ),
    )
}

fn output_contract() -> Contract {
    Contract::new()
        .required("response", FieldType::Text)
        .required("emotionalTone", FieldType::one_of(TONES))
        .optional("suggestedTechniques", FieldType::text_list())
        .optional("followUpQuestions", FieldType::text_list())
        .required(
            "riskIndicators",
            FieldType::object(
                Contract::new()
                    .required("level", FieldType::one_of(&RiskLevel::NAMES))
                    .optional("flags", FieldType::text_list()),
            ),
        )
}

/// Picks a reply tone from keywords in the student's message.
pub fn infer_tone(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    TONE_LADDER
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, tone)| *tone)
        .unwrap_or("encouraging")
}

fn fallback(input: &Value) -> Value {
    let message = input.get("userMessage").and_then(Value::as_str).unwrap_or("");

    json!({
        "response": fallback_text(
            "While we wait, try a slow breath in for four counts, hold for four, and out for six."
        ),
        "emotionalTone": infer_tone(message),
        "suggestedTechniques": [
            "4-4-6 breathing",
            "5-4-3-2-1 grounding: name five things you see, four you can touch, three you hear, two you smell, one you taste"
        ],
        "followUpQuestions": [],
        "riskIndicators": {"level": "none", "flags": []}
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_follows_keyword_ladder() {
        assert_eq!(infer_tone("I'm so STRESSED about finals"), "supportive");
        assert_eq!(infer_tone("feeling sad today"), "empathetic");
        assert_eq!(infer_tone("I'm frustrated with my roommate"), "validating");
        assert_eq!(infer_tone("can you give me advice?"), "exploratory");
        assert_eq!(infer_tone("I aced my exam"), "encouraging");
    }

    #[test]
    fn earlier_rungs_win() {
        assert_eq!(infer_tone("worried and sad, need help"), "supportive");
    }

    #[test]
    fn fallback_uses_inferred_tone() {
        let output = fallback(&json!({"userMessage": "I'm angry"}));
        assert_eq!(output["emotionalTone"], "validating");
        assert!(output["response"].as_str().unwrap().contains("human counselor"));
    }

    #[test]
    fn profile_is_validated() {
        let flow = definition();
        let bad = json!({"userMessage": "hi", "userProfile": {"preferredLanguage": "french"}});
        let errors = flow.input_contract().validate(&bad).unwrap_err();
        assert_eq!(errors[0].field(), "userProfile.preferredLanguage");
    }

    #[test]
    fn scans_user_message() {
        let flow = definition();
        let text = flow.safety().scanned_text(&json!({"userMessage": "end it all"}));
        assert_eq!(text, "end it all");
    }

    #[test]
    fn scans_profile_text() {
        let input = json!({
            "userMessage": "hi",
            "userProfile": {"previousConcerns": ["feeling worthless"], "currentMoodState": "numb"}
        });
        let text = definition().safety().scanned_text(&input);
        assert_eq!(text, "hi\nfeeling worthless\nnumb");
    }
}
