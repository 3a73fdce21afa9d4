use core::time::Duration;
use std::{process, sync::Arc, time::Instant};

use clap::Parser as _;
use llmrelay::{
    cli::Args,
    cooldown::CooldownGate,
    discord,
    generators::gemini::GeminiGenerator,
    invoker::ModelInvoker,
    relay::Relay,
    web,
};
use thiserror::Error;
use tracing::{error, info};

const COOLDOWN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
enum StartupError {
    #[error("Failed to bind the liveness endpoint: {0}.")]
    Bind(#[from] std::io::Error),
    #[error("Discord client error: {0}.")]
    Discord(#[from] serenity::Error),
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args = Args::parse();

    if let Err(err) = run(args).await {
        error!(error = %err, "startup failed");
        process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

async fn run(args: Args) -> Result<(), StartupError> {
    let invoker = ModelInvoker::new(
        GeminiGenerator::new(args.gemini_api_key),
        args.models.clone(),
        Duration::from_secs(args.attempt_timeout_secs),
        Duration::from_secs(args.deadline_secs),
    );
    let gate = CooldownGate::new(Duration::from_secs(args.cooldown_secs));
    let relay = Arc::new(Relay::new(
        invoker,
        gate,
        args.channel_id,
        usize::from(args.max_message_chars),
    ));

    // Bind before logging in so a taken port fails startup, not the probe.
    let listener = web::bind(args.port).await?;
    tokio::spawn(async move {
        if let Err(err) = web::serve(listener).await {
            error!(error = %err, "liveness endpoint terminated");
        }
    });

    let sweeper = Arc::clone(&relay);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(COOLDOWN_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            sweeper.sweep_cooldowns(Instant::now());
        }
    });

    info!(models = ?args.models, "starting Discord client");

    discord::run(&args.discord_token, relay).await?;

    Ok(())
}
