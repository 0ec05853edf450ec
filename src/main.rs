//! Campus Care interactive counselling session.
//!
//! Reads one student message per line from stdin and answers through the
//! `therapeutic-response` flow. Set `CAMPUS_CARE_LOG_JSON=1` for JSON logs.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_care::adapters::ai::GeminiProvider;
use campus_care::application::{FlowExecutor, FlowOutcome, SafetyPipeline};
use campus_care::config::{AppConfig, ValidationError};
use campus_care::domain::conversation::Message;
use campus_care::domain::flows::catalog::{self, THERAPEUTIC_RESPONSE};
use campus_care::domain::flows::FlowRegistry;
use campus_care::domain::foundation::Timestamp;
use campus_care::domain::safety::EscalationRouter;

const BANNER_RULE: &str = "========================================================";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::load()?;
    config.validate()?;

    let gemini = config
        .ai
        .gemini()
        .ok_or(ValidationError::MissingRequired("GOOGLE_API_KEY"))?;
    let provider = Arc::new(GeminiProvider::new(gemini)?);
    let registry = Arc::new(FlowRegistry::with_default_flows());

    let executor =
        FlowExecutor::new(registry, provider).with_settings(config.ai.executor_settings());
    let pipeline = SafetyPipeline::new(executor)
        .with_classifier(Arc::new(config.safety.classifier()?))
        .with_router(EscalationRouter::new(config.safety.crisis_flow.clone()))
        .with_window_size(config.conversation.window_size);

    tracing::info!(
        model = %config.ai.model,
        window_size = config.conversation.window_size,
        "Campus Care session started"
    );

    println!("Campus Care - type a message and press enter (Ctrl-D to quit).");

    let mut history: Vec<Message> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let input = serde_json::json!({ "userMessage": text });
        match pipeline.invoke(THERAPEUTIC_RESPONSE, input, &history).await {
            Ok(outcome) => {
                let reply = outcome.output["response"]
                    .as_str()
                    .unwrap_or(catalog::CONNECTION_TROUBLE)
                    .to_string();

                println!("\n{}\n", reply);
                if outcome.needs_attention() {
                    print_crisis_banner(&outcome);
                }

                history.push(Message::user(text).at(Timestamp::now()));
                history.push(Message::counselor(reply).at(Timestamp::now()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Invocation rejected");
                println!("\n{}\n", e);
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("CAMPUS_CARE_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");

    // Logs go to stderr so they never interleave with the conversation.
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_crisis_banner(outcome: &FlowOutcome) {
    println!("{}", BANNER_RULE);
    println!("  You don't have to go through this alone.");
    println!("  Risk level: {}", outcome.risk.level().as_str());
    println!("  {}", catalog::HELPLINE_REMINDER);
    if let Some(flow) = &outcome.redirect_to {
        println!("  Connecting you with crisis support ({}).", flow);
    }
    println!("  Please also reach out to your campus counseling center.");
    println!("{}", BANNER_RULE);
    println!();
}
