//! Per-chat session store
//!
//! An explicit component injected into the dispatcher rather than ambient
//! global state. The mutex guards only map access; handlers never hold it
//! across a network await, so overlapping conversations stay independent.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::flow::Session;

/// Chat identity as delivered by the transport
pub type ChatId = i64;

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ChatId, Session>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one chat's session, if any
    pub async fn get(&self, chat: ChatId) -> Option<Session> {
        self.sessions.lock().await.get(&chat).cloned()
    }

    pub async fn put(&self, chat: ChatId, session: Session) {
        self.sessions.lock().await.insert(chat, session);
    }

    pub async fn clear(&self, chat: ChatId) {
        self.sessions.lock().await.remove(&chat);
    }

    /// Persist a transition result: `Some` stores, `None` clears
    pub async fn apply(&self, chat: ChatId, next: Option<Session>) {
        match next {
            Some(session) => self.put(chat, session).await,
            None => self.clear(chat).await,
        }
    }
}
