//! Structured wellbeing assessment from a questionnaire.

use serde_json::{json, Value};

use super::{fallback_text, MENTAL_HEALTH_ASSESSMENT};
use crate::domain::flows::contract::{Contract, FieldType};
use crate::domain::flows::prompt::PromptTemplate;
use crate::domain::flows::registry::FlowDefinition;
use crate::domain::safety::{InputSignal, RiskLevel, SafetyBinding};

pub const SEVERITIES: &[&str] = &["mild", "moderate", "severe"];
pub const INTERVENTION_TYPES: &[&str] = &["self-help", "peer-support", "professional", "crisis"];
pub const PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];

const PREAMBLE: &str = "You are conducting a comprehensive mental health assessment from a \
student's questionnaire answers. Be professional, empathetic and validating.";

const GUIDELINES: &str = "\
ASSESSMENT FRAMEWORK:
1. Analyze the answers across biological, psychological and social domains and name the patterns, such as poor sleep feeding low mood.
2. Rate each area of concern as mild, moderate or severe by its impact on daily functioning.
3. Look for strengths and protective factors, even small ones. Reaching out counts.
4. Give concrete recommendations for every area of concern.
5. Suggest a prioritized mix of self-help, peer-support, professional and crisis interventions.
6. Write a warm personalized_message in plain language: validate the struggle, say it is not their fault, credit them for reaching out and convey hope.

INTERVENTION HIERARCHY:
1. Crisis intervention for immediate safety concerns.
2. Professional services for severe symptoms.
3. Peer support or academic accommodations for moderate symptoms.
4. Self-help resources for mild symptoms.

Set immediateActionNeeded to true whenever self-harm thoughts or suicidal ideation are reported.";

pub fn definition() -> FlowDefinition {
    FlowDefinition::new(
        MENTAL_HEALTH_ASSESSMENT,
        input_contract(),
        output_contract(),
        PromptTemplate::new(PREAMBLE)
            .json("Assessment Responses", "/responses")
            .text("Additional Context", "/additionalContext")
            .guidelines(GUIDELINES),
        SafetyBinding::new()
            .signal(InputSignal::when_true(
                "/responses/suicidalIdeation",
                RiskLevel::Critical,
                "suicidal-ideation",
            ))
            .signal(InputSignal::when_true(
                "/responses/selfHarmThoughts",
                RiskLevel::High,
                "self-harm-thoughts",
            ))
            .escalation_field("/immediateActionNeeded"),
        fallback,
    )
}

fn input_contract() -> Contract {
    Contract::new()
        .required(
            "responses",
            FieldType::object(
                Contract::new()
                    .required("mood", FieldType::Text)
                    .required("sleep", FieldType::Text)
                    .required("appetite", FieldType::Text)
                    .required("energy", FieldType::Text)
                    .required("concentration", FieldType::Text)
                    .required("socialInteraction", FieldType::Text)
                    .required("stressors", FieldType::text_list())
                    .required("copingStrategies", FieldType::text_list())
                    .required("supportSystem", FieldType::Text)
                    .optional("substanceUse", FieldType::Text)
                    .required("selfHarmThoughts", FieldType::Boolean)
                    .required("suicidalIdeation", FieldType::Boolean),
            ),
        )
        .optional("additionalContext", FieldType::Text)
}

fn output_contract() -> Contract {
    Contract::new()
        .required("overallWellbeingScore", FieldType::number_range(1.0, 10.0))
        .required(
            "areasOfConcern",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("area", FieldType::Text)
                    .required("severity", FieldType::one_of(SEVERITIES))
                    .required("recommendations", FieldType::text_list()),
            )),
        )
        .required("strengths", FieldType::text_list())
        .required("immediateActionNeeded", FieldType::Boolean)
        .required(
            "suggestedInterventions",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("type", FieldType::one_of(INTERVENTION_TYPES))
                    .required("description", FieldType::Text)
                    .required("priority", FieldType::one_of(PRIORITIES)),
            )),
        )
        .required("personalized_message", FieldType::Text)
}

fn fallback(input: &Value) -> Value {
    let mut strengths = vec![Value::from("Taking the time to check in on your wellbeing")];
    if let Some(Value::Array(coping)) = input.pointer("/responses/copingStrategies") {
        strengths.extend(
            coping
                .iter()
                .filter_map(Value::as_str)
                .map(|c| Value::from(format!("Already using a coping strategy: {}", c))),
        );
    }

    json!({
        "overallWellbeingScore": 5,
        "areasOfConcern": [],
        "strengths": strengths,
        "immediateActionNeeded": false,
        "suggestedInterventions": [{
            "type": "professional",
            "description": "Book a session with a campus counselor to go through your answers together.",
            "priority": "medium"
        }],
        "personalized_message": fallback_text(
            "Your answers have not been lost, and a counselor can review them with you."
        )
    })
}
