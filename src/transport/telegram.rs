// src/transport/telegram.rs
//
// Bot API long polling: `getUpdates` feeds messages into the session manager,
// replies go back through `sendMessage`.

use crate::command::{Keyboard, Reply, SessionManager};
use crate::config::TelegramConfig;
use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

const ERROR_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Bot API error: {0}")]
    Api(String),
}

// Request URLs embed the bot token, so they never reach error text.
impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        TelegramError::Http(e.without_url())
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct ReplyKeyboardMarkup {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
    one_time_keyboard: bool,
}

#[derive(Debug, Serialize)]
struct KeyboardButton {
    text: String,
}

impl From<Keyboard> for ReplyKeyboardMarkup {
    fn from(keyboard: Keyboard) -> Self {
        Self {
            keyboard: keyboard
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(|text| KeyboardButton { text }).collect())
                .collect(),
            resize_keyboard: true,
            one_time_keyboard: keyboard.one_time,
        }
    }
}

pub struct TelegramTransport {
    client: Client,
    endpoint: Url,
    poll_timeout_secs: u64,
    sessions: Arc<SessionManager>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TelegramTransport {
    pub fn new(config: &TelegramConfig, sessions: Arc<SessionManager>) -> anyhow::Result<Self> {
        // Long polls hold the request open for `poll_timeout_secs`.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()
            .context("Failed to create HTTP client")?;

        // The token contains ':', so it cannot go through `Url::join`.
        let mut endpoint = config.api_url.clone();
        let base_path = endpoint.path().trim_end_matches('/').to_string();
        endpoint.set_path(&format!("{}/bot{}/", base_path, config.token));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            client,
            endpoint,
            poll_timeout_secs: config.poll_timeout_secs,
            sessions,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub async fn run(self: Arc<Self>) {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut offset = 0;

        info!("Starting Telegram long polling");

        loop {
            let polled = tokio::select! {
                polled = self.poll_once(offset) => polled,
                _ = wait_for_shutdown(&mut shutdown_rx) => break,
            };

            match polled {
                Ok(next) => offset = next,
                Err(e) => {
                    warn!("Telegram polling failed: {}", e);
                    tokio::select! {
                        _ = sleep(ERROR_BACKOFF) => {}
                        _ = wait_for_shutdown(&mut shutdown_rx) => break,
                    }
                }
            }
        }

        info!("Telegram transport shutting down");
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Fetch one batch of updates, answer each message, and return the offset
    /// for the next poll.
    pub async fn poll_once(&self, offset: i64) -> Result<i64, TelegramError> {
        let updates = self.get_updates(offset).await?;
        let mut next = offset;

        for update in updates {
            next = next.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text else {
                continue;
            };

            let user = message.from.map(|u| u.id).unwrap_or(message.chat.id);
            debug!("Message from user {}: {:?}", user, text);

            let reply = self.sessions.handle(user, &text).await;
            if let Err(e) = self.send_message(message.chat.id, reply).await {
                warn!("Failed to reply to chat {}: {}", message.chat.id, e);
            }
        }

        Ok(next)
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdates {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: ["message"],
        };

        self.call("getUpdates", &body).await
    }

    pub async fn send_message(&self, chat_id: i64, reply: Reply) -> Result<(), TelegramError> {
        let body = SendMessage {
            chat_id,
            text: &reply.text,
            reply_markup: reply.keyboard.map(ReplyKeyboardMarkup::from),
        };

        let _: serde_json::Value = self.call("sendMessage", &body).await?;
        Ok(())
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint.join(method)?;
        let response: ApiResponse<T> = self.client.post(url).json(body).send().await?.json().await?;

        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TelegramError::Api(
                response
                    .description
                    .unwrap_or_else(|| format!("{} failed", method)),
            )),
        }
    }
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
