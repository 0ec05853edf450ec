//! Personalized therapeutic activities and a weekly plan.

use serde_json::{json, Value};

use super::{fallback_text, THERAPEUTIC_ACTIVITIES};
use crate::domain::flows::contract::{Contract, FieldType};
use crate::domain::flows::prompt::PromptTemplate;
use crate::domain::flows::registry::FlowDefinition;
use crate::domain::safety::SafetyBinding;

pub const AVAILABLE_TIMES: &[&str] = &["5min", "15min", "30min", "1hour", "ongoing"];

pub const ACTIVITY_KINDS: &[&str] = &[
    "journaling",
    "meditation",
    "exercise",
    "creative",
    "social",
    "cognitive",
    "behavioral",
    "mindfulness",
    "self-care",
    "skill-building",
];

pub const ENERGY_LEVELS: &[&str] = &["low", "medium", "high"];
pub const DIFFICULTIES: &[&str] = &["easy", "moderate", "challenging"];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const PREAMBLE: &str = "Design personalized therapeutic activities for a student based on their \
current state and preferences. Keep them creative, gentle and achievable with low motivation.";

const GUIDELINES: &str = "\
ACTIVITY DESIGN PRINCIPLES:
1. Use behavioral activation: activities that are easy to start and give a small sense of accomplishment. Action comes before motivation.
2. Favor sensory and creative activities over cognitively heavy ones.
3. Frame every activity as an act of self-kindness, not a chore.
4. Give step-by-step instructions, the purpose, the expected benefit and a simple tracking metric.
5. Add a manageable sample weeklyPlan that spreads the activities across the week.
6. Close with a patient motivationalMessage that normalizes low motivation and explains \"action before feeling\".

Suggest three or four varied activities that fit the available time and energy level.";

pub fn definition() -> FlowDefinition {
    FlowDefinition::new(
        THERAPEUTIC_ACTIVITIES,
        input_contract(),
        output_contract(),
        PromptTemplate::new(PREAMBLE)
            .text("Primary Concern", "/primaryConcern")
            .text("Available Time", "/availableTime")
            .text("Current Mood (1-10)", "/currentMood")
            .text("Energy Level", "/energyLevel")
            .list("Preferred Activities", "/preferredActivities")
            .guidelines(GUIDELINES),
        SafetyBinding::new(),
        fallback,
    )
}

fn input_contract() -> Contract {
    Contract::new()
        .required("primaryConcern", FieldType::Text)
        .required("availableTime", FieldType::one_of(AVAILABLE_TIMES))
        .optional(
            "preferredActivities",
            FieldType::array_of(FieldType::one_of(ACTIVITY_KINDS)),
        )
        .required("currentMood", FieldType::number_range(1.0, 10.0))
        .required("energyLevel", FieldType::one_of(ENERGY_LEVELS))
}

fn output_contract() -> Contract {
    let weekly_plan = WEEKDAYS
        .iter()
        .fold(Contract::new(), |plan, day| plan.required(*day, FieldType::text_list()));

    Contract::new()
        .required(
            "activities",
            FieldType::array_of(FieldType::object(
                Contract::new()
                    .required("name", FieldType::Text)
                    .required("type", FieldType::Text)
                    .required("duration", FieldType::Text)
                    .required("difficulty", FieldType::one_of(DIFFICULTIES))
                    .required("instructions", FieldType::text_list())
                    .required("purpose", FieldType::Text)
                    .required("expectedBenefit", FieldType::Text)
                    .optional("trackingMetric", FieldType::Text),
            )),
        )
        .optional("weeklyPlan", FieldType::object(weekly_plan))
        .required("motivationalMessage", FieldType::Text)
}

fn fallback(input: &Value) -> Value {
    let duration = match input.get("availableTime").and_then(Value::as_str) {
        Some("5min") => "5 minutes",
        _ => "10 minutes",
    };

    json!({
        "activities": [
            {
                "name": "Gentle walk",
                "type": "behavioral",
                "duration": duration,
                "difficulty": "easy",
                "instructions": [
                    "Put on your shoes and step outside or into a hallway",
                    "Walk slowly and notice five things around you",
                    "Come back and note how you feel"
                ],
                "purpose": "Start moving before waiting for motivation.",
                "expectedBenefit": "A small lift in energy and mood.",
                "trackingMetric": "Mood before and after, from 1 to 10"
            },
            {
                "name": "Three-line journal",
                "type": "journaling",
                "duration": "5 minutes",
                "difficulty": "easy",
                "instructions": [
                    "Write one thing that felt hard today",
                    "Write one thing you did anyway",
                    "Write one kind sentence to yourself"
                ],
                "purpose": "Practice self-compassion in a small, finishable task.",
                "expectedBenefit": "A sense of accomplishment and perspective."
            }
        ],
        "motivationalMessage": fallback_text(
            "Low motivation is common and it is not a personal failing. Small actions come first and the feelings often follow."
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_range_is_enforced() {
        let contract = definition().input_contract().clone();
        let input = json!({"primaryConcern": "x", "availableTime": "ongoing", "currentMood": 0, "energyLevel": "low"});
        let errors = contract.validate(&input).unwrap_err();
        assert_eq!(errors[0].field(), "currentMood");
    }

    #[test]
    fn preferred_activities_are_enum_checked() {
        let contract = definition().input_contract().clone();
        let input = json!({
            "primaryConcern": "x", "availableTime": "30min", "currentMood": 5,
            "energyLevel": "medium", "preferredActivities": ["journaling", "gaming"]
        });
        let errors = contract.validate(&input).unwrap_err();
        assert_eq!(errors[0].field(), "preferredActivities[1]");
    }

    #[test]
    fn weekly_plan_requires_every_day() {
        let contract = definition().output_contract().clone();
        let mut output = fallback(&json!({}));
        output["weeklyPlan"] = json!({"monday": ["walk"]});
        let errors = contract.validate(&output).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert_eq!(errors[0].field(), "weeklyPlan.tuesday");
    }

    #[test]
    fn fallback_respects_short_time() {
        let output = fallback(&json!({"availableTime": "5min"}));
        assert_eq!(output["activities"][0]["duration"], "5 minutes");
    }
}
