//! Moderation and coaching for peer support forum posts.

use serde_json::{json, Value};

use super::{CONNECTION_TROUBLE, PEER_SUPPORT_MODERATION};
use crate::domain::flows::contract::{Contract, FieldType};
use crate::domain::flows::prompt::PromptTemplate;
use crate::domain::flows::registry::FlowDefinition;
use crate::domain::safety::SafetyBinding;

pub const MESSAGE_TYPES: &[&str] = &["initial-post", "reply", "advice", "sharing"];
pub const RESPONSE_TONES: &[&str] = &["supportive", "empathetic", "encouraging", "practical"];

/// Placeholder used when content is withheld.
pub const REDACTED: &str = "[REDACTED]";

const PREAMBLE: &str = "You are a peer support moderator for a student forum. Keep the community \
safe, guide the author and improve the quality of the conversation. Analyze the message below.";

const GUIDELINES: &str = "\
MODERATION TASKS:
1. safetyCheck: set isAppropriate to false if any red flag is present, list every concern and suggest edits that make the post safe.
2. redactedContent: copy the message with personal information and harmful advice replaced by [REDACTED].
3. enhancedMessage: rewrite the post so it is safe and constructive, uses \"I\" statements and turns absolute claims into personal experience.
4. suggestedResponses: three replies others could send to the original poster, open-ended and empathetic.
5. peerSupportGuidance: points for the author, praising what worked and gently correcting what to avoid.

RED FLAGS:
- Personal information: names, addresses, phone numbers, specific locations.
- Harmful advice: illegal activity, sharing prescription drugs, encouraging self-harm.
- Medical or psychiatric advice: diagnosing, prescribing, posing as a clinician.
- Absolute claims such as \"this will cure you\".
- Boundary violations such as offering to meet up or sharing contact details.";

pub fn definition() -> FlowDefinition {
    FlowDefinition::new(
        PEER_SUPPORT_MODERATION,
        input_contract(),
        output_contract(),
        PromptTemplate::new(PREAMBLE)
            .text("Message", "/message")
            .text("Message Type", "/messageType")
            .json("Context", "/conversationContext")
            .guidelines(GUIDELINES),
        SafetyBinding::new(),
        fallback,
    )
}

fn input_contract() -> Contract {
    Contract::new()
        .required("message", FieldType::Text)
        .optional(
            "conversationContext",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("author", FieldType::Text)
                    .required("content", FieldType::Text)
                    .required("timestamp", FieldType::Text),
            )),
        )
        .required("messageType", FieldType::one_of(MESSAGE_TYPES))
}

fn output_contract() -> Contract {
    Contract::new()
        .required(
            "safetyCheck",
            FieldType::object(
                Contract::new()
                    .required("isAppropriate", FieldType::Boolean)
                    .optional("concerns", FieldType::text_list())
                    .optional("suggestedEdits", FieldType::text_list()),
            ),
        )
        .optional("enhancedMessage", FieldType::Text)
        .required(
            "suggestedResponses",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("tone", FieldType::one_of(RESPONSE_TONES))
                    .required("response", FieldType::Text),
            )),
        )
        .required("peerSupportGuidance", FieldType::text_list())
        .required("redactedContent", FieldType::Text)
}

/// Holds the post for human review without publishing any of its content.
fn fallback(_input: &Value) -> Value {
    json!({
        "safetyCheck": {
            "isAppropriate": false,
            "concerns": ["Automatic review is unavailable; the post is held for a human moderator."],
            "suggestedEdits": []
        },
        "suggestedResponses": [
            {
                "tone": "supportive",
                "response": "Thank you for sharing this. How are you doing right now?"
            }
        ],
        "peerSupportGuidance": [
            CONNECTION_TROUBLE,
            "A moderator will review your post shortly."
        ],
        "redactedContent": REDACTED
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_withholds_content() {
        let output = fallback(&json!({"message": "call me at 555-0100", "messageType": "reply"}));
        assert_eq!(output["safetyCheck"]["isAppropriate"], false);
        assert_eq!(output["redactedContent"], REDACTED);
        assert!(!output.to_string().contains("555-0100"));
    }

    #[test]
    fn context_entries_need_author_and_timestamp() {
        let input = json!({
            "message": "same here",
            "messageType": "reply",
            "conversationContext": [{"author": "a", "content": "hi"}]
        });
        let errors = definition().input_contract().validate(&input).unwrap_err();
        assert_eq!(errors[0].field(), "conversationContext[0].timestamp");
    }

    #[test]
    fn message_is_scanned() {
        let text = definition().safety().scanned_text(&json!({"message": "I feel worthless"}));
        assert_eq!(text, "I feel worthless");
    }
}
