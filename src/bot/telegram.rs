//! Minimal Telegram Bot API transport
//!
//! Long-polls getUpdates and decodes messages and button callbacks into flow
//! events; the outbound side implements `ChatTransport`. Only the handful of
//! Bot API fields this bot touches are modeled.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::flow::{CALLBACK_FIVE_DAYS, CALLBACK_THREE_DAYS, Event};
use super::session::ChatId;
use super::{ChatTransport, ConversationController};
use crate::config::BotConfig;
use crate::models::ForecastWindow;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

pub struct TelegramTransport {
    client: Client,
    base_url: String,
    poll_timeout: u32,
}

impl TelegramTransport {
    pub fn new(config: &BotConfig) -> Result<Self> {
        // The client timeout must outlast the long-poll hold time
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.poll_timeout_seconds) + 10))
            .build()
            .with_context(|| "Failed to create Telegram HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", TELEGRAM_API_URL, config.token),
            poll_timeout: config.poll_timeout_seconds,
        })
    }

    /// Call one Bot API method and unwrap the `{ok, result}` envelope
    async fn call<B: Serialize + Sync>(&self, method: &str, body: &B) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Telegram {method} request failed"))?;

        let envelope: wire::ApiResponse = response
            .json()
            .await
            .with_context(|| format!("Telegram {method} returned an undecodable body"))?;

        if !envelope.ok {
            return Err(anyhow!(
                "Telegram {method} rejected: {}",
                envelope.description.unwrap_or_else(|| "no description".to_string())
            ));
        }

        Ok(envelope.result.unwrap_or(Value::Null))
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<wire::Update>> {
        let result = self
            .call(
                "getUpdates",
                &json!({ "timeout": self.poll_timeout, "offset": offset }),
            )
            .await?;

        serde_json::from_value(result).with_context(|| "Undecodable getUpdates result")
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.call("answerCallbackQuery", &json!({ "callback_query_id": callback_id }))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<()> {
        self.call("sendMessage", &json!({ "chat_id": chat, "text": text }))
            .await
            .map(|_| ())
    }

    async fn send_window_choices(&self, chat: ChatId, prompt: &str) -> Result<()> {
        self.call(
            "sendMessage",
            &json!({
                "chat_id": chat,
                "text": prompt,
                "reply_markup": {
                    "inline_keyboard": [[
                        { "text": "3-day forecast", "callback_data": CALLBACK_THREE_DAYS },
                        { "text": "5-day forecast", "callback_data": CALLBACK_FIVE_DAYS },
                    ]]
                }
            }),
        )
        .await
        .map(|_| ())
    }
}

/// Long-poll loop feeding the conversation dispatcher
///
/// Each update is handled in its own task, so a conversation suspended on a
/// forecast request never blocks other chats. A failed poll backs off and
/// retries; the loop itself only ends if the runtime shuts down.
pub async fn run_polling(
    controller: Arc<ConversationController>,
    transport: Arc<TelegramTransport>,
) -> Result<()> {
    let mut offset: i64 = 0;
    info!("Telegram long-poll loop started");

    loop {
        let updates = match transport.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!("getUpdates failed: {e:#}");
                tokio::time::sleep(Duration::from_secs(3)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            if let Some(callback_id) = update.callback_id() {
                if let Err(e) = transport.answer_callback(callback_id).await {
                    debug!("answerCallbackQuery failed: {e:#}");
                }
            }

            let Some((chat, event)) = decode_update(update) else {
                continue;
            };

            let controller = Arc::clone(&controller);
            tokio::spawn(async move {
                controller.handle(chat, event).await;
            });
        }
    }
}

/// Map one Bot API update to a chat id and a flow event
fn decode_update(update: wire::Update) -> Option<(ChatId, Event)> {
    if let Some(callback) = update.callback_query {
        let chat = callback.message.as_ref().map(|m| m.chat.id)?;
        let event = decode_callback(callback.data.as_deref()?)?;
        return Some((chat, event));
    }

    let message = update.message?;
    let text = message.text?;
    Some((message.chat.id, decode_text(&text)))
}

fn decode_text(text: &str) -> Event {
    match text.trim() {
        "/start" => Event::Start,
        "/help" => Event::Help,
        "/weather" => Event::Weather,
        other => Event::Text(other.to_string()),
    }
}

fn decode_callback(data: &str) -> Option<Event> {
    match data {
        CALLBACK_THREE_DAYS => Some(Event::WindowChosen(ForecastWindow::Three)),
        CALLBACK_FIVE_DAYS => Some(Event::WindowChosen(ForecastWindow::Five)),
        _ => None,
    }
}

/// Bot API wire structures, limited to the fields in use
mod wire {
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Debug, Deserialize)]
    pub struct ApiResponse {
        pub ok: bool,
        pub result: Option<Value>,
        pub description: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Update {
        pub update_id: i64,
        pub message: Option<Message>,
        pub callback_query: Option<CallbackQuery>,
    }

    impl Update {
        pub fn callback_id(&self) -> Option<&str> {
            self.callback_query.as_ref().map(|c| c.id.as_str())
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct Message {
        pub chat: Chat,
        pub text: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Chat {
        pub id: i64,
    }

    #[derive(Debug, Deserialize)]
    pub struct CallbackQuery {
        pub id: String,
        pub data: Option<String>,
        pub message: Option<Message>,
    }
}
