use anyhow::Context;
use serde_json::json;
use tracing_subscriber::fmt::init;

use quiz_api::{config::Config, services::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::load().context("Failed to load configuration")?;
    let app_state = AppState::connect(config)
        .await
        .context("Failed to initialize app state")?;

    let questions = json!([
        {
            "id": "q1",
            "type": "BOOLEAN",
            "title": "Is the sky blue?",
            "correctAnswer": true,
            "required": true
        },
        {
            "id": "q2",
            "type": "INPUT",
            "title": "Capital of France?",
            "correctAnswer": "Paris",
            "required": true
        }
    ]);

    let quiz = app_state
        .quizzes
        .create(Some("Sample Quiz"), &questions)
        .await
        .context("Failed to seed sample quiz")?;

    tracing::info!(quiz_id = %quiz.id, "Seeded sample quiz");
    println!("Seeded quiz {}", quiz.id);

    Ok(())
}
