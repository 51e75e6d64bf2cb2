//! Palaver console bot - REPL demo for the dialog engine
//!
//! Runs a small onboarding conversation (name, favorite color, confirm)
//! through the full engine: component dialog wrapping a waterfall, prompts
//! with retry, persisted dialog state between lines (and between runs, when
//! a state directory is configured).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use futures::future::BoxFuture;
use rustyline::error::ReadlineError;
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use palaver::activity::{Activity, ResourceResponse};
use palaver::config::BotConfig;
use palaver::dialogs::{
    ComponentDialog, DialogContext, DialogRegistry, DialogTurnResult, DialogTurnStatus,
    WaterfallDialog, WaterfallStepContext,
};
use palaver::prompts::{
    ChoiceRecognizer, ConfirmRecognizer, Prompt, PromptOptions, TextRecognizer,
};
use palaver::state::{ConversationStore, FileStore, MemoryStore};
use palaver::turn::{Transport, TurnContext};

#[derive(Parser)]
#[command(name = "palaver")]
#[command(about = "Console demo bot for the Palaver dialog engine")]
struct Args {
    /// Locale stamped onto inbound messages
    #[arg(long, env = "PALAVER_LOCALE")]
    locale: Option<String>,

    /// Path to a TOML config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory for persisted conversation state (in-memory when unset)
    #[arg(long, env = "PALAVER_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Conversation id to resume
    #[arg(long, default_value = "console")]
    conversation: String,
}

/// Transport that prints outbound activities to the terminal.
struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_activity(&self, activity: &Activity) -> palaver::Result<ResourceResponse> {
        if let Some(text) = &activity.text {
            println!("bot> {text}");
        }
        Ok(ResourceResponse::new())
    }
}

fn ask_name<'s>(
    step: &'s mut WaterfallStepContext<'_, '_>,
) -> BoxFuture<'s, palaver::Result<DialogTurnResult>> {
    Box::pin(async move {
        step.prompt(
            "name-prompt",
            PromptOptions::with_text("What should I call you?")
                .retry_text("Sorry, I still need a name."),
        )
        .await
    })
}

fn ask_color<'s>(
    step: &'s mut WaterfallStepContext<'_, '_>,
) -> BoxFuture<'s, palaver::Result<DialogTurnResult>> {
    Box::pin(async move {
        step.set_value("name", step.result.clone().unwrap_or(Value::Null));
        step.prompt(
            "color-prompt",
            PromptOptions::with_text("Pick a favorite color.")
                .retry_text("One of these, please.")
                .choices(["red", "green", "blue"]),
        )
        .await
    })
}

fn confirm_summary<'s>(
    step: &'s mut WaterfallStepContext<'_, '_>,
) -> BoxFuture<'s, palaver::Result<DialogTurnResult>> {
    Box::pin(async move {
        step.set_value("color", step.result.clone().unwrap_or(Value::Null));
        let name = step
            .value("name")
            .and_then(Value::as_str)
            .unwrap_or("stranger")
            .to_string();
        let color = step
            .value("color")
            .and_then(|c| c.get("value"))
            .and_then(Value::as_str)
            .unwrap_or("that color")
            .to_string();
        step.prompt(
            "confirm-prompt",
            PromptOptions::with_text(format!("So you're {name} and you like {color}?")),
        )
        .await
    })
}

fn finish<'s>(
    step: &'s mut WaterfallStepContext<'_, '_>,
) -> BoxFuture<'s, palaver::Result<DialogTurnResult>> {
    Box::pin(async move {
        let confirmed = step.result.as_ref().and_then(Value::as_bool).unwrap_or(false);
        let summary = serde_json::json!({
            "name": step.value("name").cloned().unwrap_or(Value::Null),
            "color": step.value("color").and_then(|c| c.get("value")).cloned().unwrap_or(Value::Null),
            "confirmed": confirmed,
        });
        step.dc.end_dialog(Some(summary)).await
    })
}

fn build_registry() -> palaver::Result<DialogRegistry> {
    let onboarding = ComponentDialog::new("onboarding")
        .add_dialog(
            WaterfallDialog::new("survey")
                .step(ask_name)
                .step(ask_color)
                .step(confirm_summary)
                .step(finish),
        )?
        .add_dialog(Prompt::new("name-prompt", TextRecognizer))?
        .add_dialog(Prompt::new("color-prompt", ChoiceRecognizer::default()))?
        .add_dialog(Prompt::new("confirm-prompt", ConfirmRecognizer::default()))?
        .with_initial("survey");

    let mut registry = DialogRegistry::new();
    registry.add(onboarding)?;
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env from ~/.palaver/.env, falling back to the current dir.
    let env_path = dirs::home_dir()
        .map(|h| h.join(".palaver").join(".env"))
        .filter(|p| p.exists());
    if let Some(path) = env_path {
        let _ = dotenvy::from_path(&path);
    } else {
        let _ = dotenvy::dotenv();
    }

    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = BotConfig::load(args.config.as_deref())?;
    if let Some(locale) = args.locale {
        config.locale = locale;
    }
    if let Some(state_dir) = args.state_dir {
        config.state_dir = Some(state_dir);
    }

    let store: Arc<dyn ConversationStore> = match &config.state_dir {
        Some(dir) => Arc::new(FileStore::new(dir.clone())),
        None => Arc::new(MemoryStore::new()),
    };
    let transport = Arc::new(ConsoleTransport);
    let registry = build_registry()?;

    println!("{}", config.greeting);

    let mut rl = rustyline::DefaultEditor::new()?;
    loop {
        let line = match rl.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(&line);

        if line == "/quit" {
            break;
        }

        let mut state = store.load(&args.conversation).await?;

        if line == "/cancel" {
            let activity = Activity::message(&line).with_locale(&config.locale);
            let mut turn = TurnContext::new(transport.clone(), activity);
            let mut dc = DialogContext::new(&registry, &mut turn, &mut state.stack);
            dc.cancel_all_dialogs().await?;
            store.save(&args.conversation, &state).await?;
            println!("bot> Okay, never mind.");
            continue;
        }

        let activity = Activity::message(&line).with_locale(&config.locale);
        let mut turn = TurnContext::new(transport.clone(), activity);
        match registry.run_turn(&mut turn, &mut state, "onboarding").await {
            Ok(result) => {
                // Only a clean turn commits the mutated stack.
                store.save(&args.conversation, &state).await?;
                if result.status == DialogTurnStatus::Complete {
                    if let Some(summary) = result.result {
                        println!("bot> All set: {summary}");
                    }
                }
            }
            Err(e) => {
                eprintln!("turn failed: {e}");
            }
        }
    }

    println!("bye!");
    Ok(())
}
