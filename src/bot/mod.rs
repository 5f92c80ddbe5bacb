//! Chat bot front-end: conversation dispatcher and transport seam

pub mod flow;
pub mod session;
pub mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, instrument};

use crate::error::ForecastError;
use crate::models::{Coordinate, ForecastWindow};
use crate::series;
use crate::service::ForecastProvider;
use self::flow::{Effect, Event, UNEXPECTED_ERROR, render_report, transition};
use self::session::{ChatId, SessionStore};

/// Outbound chat operations the dispatcher needs
///
/// The transport framing behind these calls is not this module's concern;
/// tests substitute a recording implementation.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str) -> anyhow::Result<()>;
    /// Send a prompt carrying the two inline window-choice buttons
    async fn send_window_choices(&self, chat: ChatId, prompt: &str) -> anyhow::Result<()>;
}

/// Drives the per-chat conversation state machine
///
/// Each inbound event advances the pure transition function, persists the
/// resulting session, and interprets the effects. Failures are reported to
/// the chat and never escape to the caller, so one broken conversation
/// cannot take down the update loop.
pub struct ConversationController {
    provider: Arc<dyn ForecastProvider>,
    transport: Arc<dyn ChatTransport>,
    sessions: SessionStore,
}

impl ConversationController {
    #[must_use]
    pub fn new(
        provider: Arc<dyn ForecastProvider>,
        transport: Arc<dyn ChatTransport>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            provider,
            transport,
            sessions,
        }
    }

    /// Handle one inbound event for one chat
    #[instrument(skip(self, event))]
    pub async fn handle(&self, chat: ChatId, event: Event) {
        let current = self.sessions.get(chat).await;
        let step = transition(current, &event);
        self.sessions.apply(chat, step.next).await;

        for effect in step.effects {
            if let Err(e) = self.run_effect(chat, effect).await {
                error!("Effect failed for chat {chat}: {e:#}");
            }
        }
    }

    async fn run_effect(&self, chat: ChatId, effect: Effect) -> anyhow::Result<()> {
        match effect {
            Effect::Reply(text) => self.transport.send_text(chat, &text).await,
            Effect::OfferWindowChoices(prompt) => {
                self.transport.send_window_choices(chat, &prompt).await
            }
            Effect::Report { window, start, end } => self.report(chat, window, &start, &end).await,
        }
    }

    /// Fetch both route points and send the comparison
    ///
    /// The session was already cleared when the transition produced the
    /// report effect, so whatever happens here the next flow starts clean.
    async fn report(
        &self,
        chat: ChatId,
        window: ForecastWindow,
        start: &Coordinate,
        end: &Coordinate,
    ) -> anyhow::Result<()> {
        let text = match self.build_report(window, start, end).await {
            Ok(report) => report,
            Err(e @ (ForecastError::BadRequest { .. } | ForecastError::ApiKey { .. })) => {
                e.user_message()
            }
            Err(e) => {
                error!("Report for chat {chat} failed: {e}");
                UNEXPECTED_ERROR.to_string()
            }
        };

        self.transport.send_text(chat, &text).await
    }

    /// A failure on the start point suppresses the end-point fetch entirely
    async fn build_report(
        &self,
        window: ForecastWindow,
        start: &Coordinate,
        end: &Coordinate,
    ) -> Result<String, ForecastError> {
        let start_series = series::to_series(&self.provider.forecast(start).await?, window)?;
        let end_series = series::to_series(&self.provider.forecast(end).await?, window)?;
        Ok(render_report(&start_series, &end_series))
    }
}
