//! Psychoeducation modules on common mental health topics.

use serde_json::{json, Value};

use super::{fallback_text, PSYCHOEDUCATION};
use crate::domain::flows::contract::{Contract, FieldType};
use crate::domain::flows::prompt::PromptTemplate;
use crate::domain::flows::registry::FlowDefinition;
use crate::domain::safety::SafetyBinding;

pub const TOPICS: &[&str] = &[
    "anxiety",
    "depression",
    "stress",
    "trauma",
    "relationships",
    "self-esteem",
    "grief",
    "anger",
    "addiction",
    "eating-disorders",
    "sleep",
    "mindfulness",
    "boundaries",
    "communication",
    "coping-skills",
];

pub const USER_LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];
pub const FORMATS: &[&str] = &["explanation", "exercises", "strategies", "mixed"];

const PREAMBLE: &str = "You are an expert mental health educator. Create a clear, practical \
psychoeducation module on the requested topic for a college student.";

const GUIDELINES: &str = "\
MODULE STRUCTURE:
1. introduction: open with a simple, normalizing metaphor.
2. keyConceptsExplained: three or four core concepts, each with an explanation and its relevance to the student. Answer any specific questions here.
3. practicalStrategies: three or four strategies, each with exact steps and an expected outcome.
4. exercises: one or two structured exercises with purpose, instructions and frequency.
5. commonMyths: two or three myths, each paired with the reality.
6. additionalResources: three or four reputable books, apps or websites.
7. homework: two or three specific, measurable practice tasks.

CONTENT GUIDELINES:
- Normalize, don't stigmatize.
- Explain clinical ideas in plain terms matched to the user level.
- Focus on what the student can do.
- Set realistic expectations; change takes practice.";

pub fn definition() -> FlowDefinition {
    FlowDefinition::new(
        PSYCHOEDUCATION,
        input_contract(),
        output_contract(),
        PromptTemplate::new(PREAMBLE)
            .text("Topic", "/topic")
            .text("User Level", "/userLevel")
            .text("Format Preference", "/preferredFormat")
            .list("Specific Questions", "/specificQuestions")
            .guidelines(GUIDELINES),
        SafetyBinding::new(),
        fallback,
    )
}

fn input_contract() -> Contract {
    Contract::new()
        .required("topic", FieldType::one_of(TOPICS))
        .required("userLevel", FieldType::one_of(USER_LEVELS))
        .required("preferredFormat", FieldType::one_of(FORMATS))
        .optional("specificQuestions", FieldType::text_list())
}

fn output_contract() -> Contract {
    let content = Contract::new()
        .required("introduction", FieldType::Text)
        .required(
            "keyConceptsExplained",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("concept", FieldType::Text)
                    .required("explanation", FieldType::Text)
                    .required("relevance", FieldType::Text),
            )),
        )
        .required(
            "practicalStrategies",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("strategy", FieldType::Text)
                    .required("steps", FieldType::text_list())
                    .required("expectedOutcome", FieldType::Text),
            )),
        )
        .required(
            "exercises",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("name", FieldType::Text)
                    .required("purpose", FieldType::Text)
                    .required("instructions", FieldType::text_list())
                    .required("frequency", FieldType::Text),
            )),
        )
        .required(
            "commonMyths",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("myth", FieldType::Text)
                    .required("reality", FieldType::Text),
            )),
        );

    Contract::new()
        .required("content", FieldType::object(content))
        .required("additionalResources", FieldType::text_list())
        .optional("homework", FieldType::text_list())
}

fn fallback(input: &Value) -> Value {
    let topic = input
        .get("topic")
        .and_then(Value::as_str)
        .unwrap_or("this topic")
        .replace('-', " ");

    json!({
        "content": {
            "introduction": fallback_text(&format!(
                "The full module on {} is not available yet, but here is one skill that helps with almost everything.",
                topic
            )),
            "keyConceptsExplained": [],
            "practicalStrategies": [{
                "strategy": "Paced breathing",
                "steps": [
                    "Breathe in through your nose for 4 counts",
                    "Hold for 4 counts",
                    "Breathe out slowly for 6 counts",
                    "Repeat for two minutes"
                ],
                "expectedOutcome": "A calmer body and a little more room to think."
            }],
            "exercises": [],
            "commonMyths": []
        },
        "additionalResources": [
            "Your campus counseling center",
            "Tele-MANAS: 1800-89-14416 (https://telemanas.mohfw.gov.in/home)"
        ]
    })
}
