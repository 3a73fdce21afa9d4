//! The per-message pipeline: filter, cooldown, invoke, chunk, deliver.

use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
    chunker,
    cooldown::CooldownGate,
    invoker::ModelInvoker,
    Generated, TextGenerator,
};

/// Shown when generation succeeded but the content filter withheld the text.
pub const MODERATION_NOTICE: &str =
    "Sorry, I can't answer that one. The reply was blocked by the content \
     filter.";

/// Shown when every model failed. Diagnostic detail stays in the logs.
pub const FAILURE_NOTICE: &str =
    "The AI backend is unavailable right now. Please try again in a bit.";

/// Reaction acknowledging a request denied by the cooldown gate.
pub const COOLDOWN_EMOJI: char = '🕒';

/// One inbound message event, reduced to what the pipeline needs.
#[derive(Debug, Clone)]
pub struct Request {
    pub requester_id: String,
    pub channel_id: String,
    pub from_bot: bool,
    pub text: String,
}

impl Request {
    #[inline]
    #[must_use]
    pub const fn new(
        requester_id: String,
        channel_id: String,
        from_bot: bool,
        text: String,
    ) -> Self {
        Self {
            requester_id,
            channel_id,
            from_bot,
            text,
        }
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct OutboundError(pub String);

/// Platform actions available while handling one inbound message.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn typing(&self) -> Result<(), OutboundError>;

    async fn reply(&self, text: &str) -> Result<(), OutboundError>;

    async fn react(&self, emoji: char) -> Result<(), OutboundError>;
}

/// Terminal result of one pass through the pipeline.
#[non_exhaustive]
#[derive(Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    IgnoredSelf,
    IgnoredChannel,
    CooldownRejected,
    Delivered { chunks: usize },
    DeliveredModerationNotice,
    DeliveredFailureNotice,
    DeliveryFailed { sent: usize },
}

pub struct Relay<G> {
    invoker: ModelInvoker<G>,
    gate: CooldownGate,
    allowed_channel: Option<String>,
    max_message_chars: usize,
}

impl<G> Relay<G>
where
    G: TextGenerator,
{
    #[inline]
    #[must_use]
    pub const fn new(
        invoker: ModelInvoker<G>,
        gate: CooldownGate,
        allowed_channel: Option<String>,
        max_message_chars: usize,
    ) -> Self {
        Self {
            invoker,
            gate,
            allowed_channel,
            max_message_chars,
        }
    }

    /// Runs one inbound message through the pipeline to a terminal outcome.
    ///
    /// Chunks are sent strictly in order, each send awaited before the
    /// next. A failed send drops the remainder of the sequence; it is
    /// logged and never retried.
    pub async fn handle(
        &self,
        request: &Request,
        outbound: &impl Outbound,
    ) -> RelayOutcome {
        if request.from_bot {
            return RelayOutcome::IgnoredSelf;
        }

        if let Some(ref allowed) = self.allowed_channel {
            if *allowed != request.channel_id {
                debug!(
                    channel_id = %request.channel_id,
                    "message outside the allowed channel"
                );
                return RelayOutcome::IgnoredChannel;
            }
        }

        if !self.gate.try_acquire(&request.requester_id, Instant::now()) {
            debug!(
                requester_id = %request.requester_id,
                "request denied by cooldown"
            );
            if let Err(err) = outbound.react(COOLDOWN_EMOJI).await {
                warn!(error = %err, "failed to acknowledge cooldown");
            }
            return RelayOutcome::CooldownRejected;
        }

        // Best effort. A missing typing indicator is not worth aborting for.
        if let Err(err) = outbound.typing().await {
            warn!(error = %err, "failed to send typing indicator");
        }

        match self.invoker.invoke(&request.text).await {
            Ok(Generated::Text(text)) => self.deliver(&text, outbound).await,
            Ok(Generated::Empty) => {
                debug!(
                    requester_id = %request.requester_id,
                    "generation returned no usable text"
                );
                self.notify(MODERATION_NOTICE, outbound)
                    .await
                    .map_or(RelayOutcome::DeliveryFailed { sent: 0 }, |()| {
                        RelayOutcome::DeliveredModerationNotice
                    })
            }
            Err(err) => {
                error!(error = %err, "generation failed");
                self.notify(FAILURE_NOTICE, outbound)
                    .await
                    .map_or(RelayOutcome::DeliveryFailed { sent: 0 }, |()| {
                        RelayOutcome::DeliveredFailureNotice
                    })
            }
        }
    }

    /// Sweeps the cooldown map. Intended to run on a periodic task.
    #[inline]
    pub fn sweep_cooldowns(&self, now: Instant) {
        self.gate.sweep(now);
        debug!(tracked = self.gate.tracked(), "cooldown map swept");
    }

    async fn deliver(
        &self,
        text: &str,
        outbound: &impl Outbound,
    ) -> RelayOutcome {
        let chunks = chunker::chunk(text, self.max_message_chars);
        let total = chunks.len();

        debug!(chunk_count = total, "delivering reply");

        for chunk in &chunks {
            if let Err(err) = outbound.reply(&chunk.text).await {
                error!(
                    error = %err,
                    sent = chunk.index,
                    chunk_count = total,
                    "send failed mid-sequence, dropping remaining chunks"
                );
                return RelayOutcome::DeliveryFailed { sent: chunk.index };
            }
        }

        RelayOutcome::Delivered { chunks: total }
    }

    async fn notify(
        &self,
        notice: &str,
        outbound: &impl Outbound,
    ) -> Result<(), OutboundError> {
        outbound.reply(notice).await.map_err(|err| {
            error!(error = %err, "failed to deliver notice");
            err
        })
    }
}
