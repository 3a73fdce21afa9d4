use clap::{builder::NonEmptyStringValueParser, Parser};

#[non_exhaustive]
#[derive(Parser)]
#[command(author, version, about)]
pub struct Args {
    #[arg(
        long,
        env = "DISCORD_TOKEN",
        hide_env_values = true,
        help = "Discord bot login token"
    )]
    pub discord_token: String,
    #[arg(
        long,
        env = "GEMINI_API_KEY",
        hide_env_values = true,
        help = "API key used for all generation calls"
    )]
    pub gemini_api_key: String,
    #[arg(
        long,
        env = "AI_CHANNEL_ID",
        help = "Only relay messages from this channel (all channels if unset)"
    )]
    pub channel_id: Option<String>,
    #[arg(
        long,
        env = "RELAY_MODELS",
        value_delimiter = ',',
        default_value = "gemini-1.5-flash,gemini-1.5-pro,gemini-1.0-pro",
        value_parser = NonEmptyStringValueParser::new(),
        help = "Ordered fallback chain of model identifiers"
    )]
    pub models: Vec<String>,
    #[arg(
        long,
        env = "RELAY_COOLDOWN_SECS",
        default_value_t = 5,
        help = "Minimum seconds between relayed requests per user (0 disables)"
    )]
    pub cooldown_secs: u64,
    #[arg(
        long,
        env = "RELAY_ATTEMPT_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Per-model generation timeout in seconds"
    )]
    pub attempt_timeout_secs: u64,
    #[arg(
        long,
        env = "RELAY_DEADLINE_SECS",
        default_value_t = 45,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Overall budget for one fallback chain in seconds"
    )]
    pub deadline_secs: u64,
    #[arg(
        long,
        env = "RELAY_MAX_MESSAGE_CHARS",
        default_value_t = 1900,
        value_parser = clap::value_parser!(u16).range(1..=2000),
        help = "Upper bound on outbound message length, in characters"
    )]
    pub max_message_chars: u16,
    #[arg(
        long,
        env = "PORT",
        default_value_t = 8000,
        help = "Port for the liveness probe endpoint"
    )]
    pub port: u16,
}
