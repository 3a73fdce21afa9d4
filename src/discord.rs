//! Discord gateway adapter for the relay pipeline.

use std::sync::Arc;

use serenity::all::{
    Client, Context, EventHandler, GatewayIntents, Message, ReactionType,
    Ready,
};
use serenity::async_trait;
use tracing::{debug, info};

use crate::{
    relay::{Outbound, OutboundError, Relay, Request},
    TextGenerator,
};

pub struct Handler<G> {
    relay: Arc<Relay<G>>,
}

impl<G> Handler<G> {
    #[inline]
    #[must_use]
    pub const fn new(relay: Arc<Relay<G>>) -> Self {
        Self { relay }
    }

    /// Gateway intents the bot needs to see message content.
    #[inline]
    #[must_use]
    pub const fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            .union(GatewayIntents::GUILD_MESSAGES)
            .union(GatewayIntents::DIRECT_MESSAGES)
            .union(GatewayIntents::MESSAGE_CONTENT)
    }
}

/// [`Outbound`] over one received message: typing goes to its channel,
/// replies and reactions target the message itself.
struct MessageOutbound<'ctx> {
    ctx: &'ctx Context,
    message: &'ctx Message,
}

#[async_trait]
impl Outbound for MessageOutbound<'_> {
    async fn typing(&self) -> Result<(), OutboundError> {
        self.message
            .channel_id
            .broadcast_typing(&self.ctx.http)
            .await
            .map_err(|err| OutboundError(err.to_string()))
    }

    async fn reply(&self, text: &str) -> Result<(), OutboundError> {
        self.message
            .reply(&self.ctx.http, text)
            .await
            .map(drop)
            .map_err(|err| OutboundError(err.to_string()))
    }

    async fn react(&self, emoji: char) -> Result<(), OutboundError> {
        self.message
            .react(&self.ctx.http, ReactionType::Unicode(emoji.to_string()))
            .await
            .map(drop)
            .map_err(|err| OutboundError(err.to_string()))
    }
}

#[async_trait]
impl<G> EventHandler for Handler<G>
where
    G: TextGenerator + 'static,
{
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(bot_name = %ready.user.name, "logged in, ready for messages");
    }

    async fn message(&self, ctx: Context, message: Message) {
        let request = Request::new(
            message.author.id.to_string(),
            message.channel_id.to_string(),
            message.author.bot,
            message.content.clone(),
        );

        let outbound = MessageOutbound {
            ctx: &ctx,
            message: &message,
        };

        let outcome = self.relay.handle(&request, &outbound).await;

        debug!(
            requester_id = %request.requester_id,
            outcome = ?outcome,
            "relay finished"
        );
    }
}

/// Logs in and runs the gateway event loop until the client stops.
pub async fn run<G>(
    token: &str,
    relay: Arc<Relay<G>>,
) -> Result<(), serenity::Error>
where
    G: TextGenerator + 'static,
{
    let mut client = Client::builder(token, Handler::<G>::intents())
        .event_handler(Handler::new(relay))
        .await?;

    client.start().await
}
