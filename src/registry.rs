//! Shared session storage keyed by channel.
//!
//! One combat runs per channel. The registry hands out
//! `Arc<Mutex<CombatSession>>` handles so a caller can hold its session
//! across await points without pinning the whole registry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::session::{CombatSession, SessionConfig};

pub type SessionHandle = Arc<Mutex<CombatSession>>;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh session on the channel, replacing any session already
    /// running there.
    pub async fn open(&self, channel: &str, config: SessionConfig) -> SessionHandle {
        let session = Arc::new(Mutex::new(CombatSession::new(config)));
        let mut sessions = self.sessions.write().await;
        if sessions.insert(channel.to_string(), Arc::clone(&session)).is_some() {
            info!(channel, "replacing running session");
        }
        info!(channel, "session opened");
        session
    }

    pub async fn get(&self, channel: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(channel).cloned()
    }

    /// Drop the channel's session. Handles already held stay usable; the
    /// registry just stops handing the session out.
    pub async fn close(&self, channel: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let handle = sessions.remove(channel);
        if handle.is_some() {
            info!(channel, "session closed");
        }
        handle
    }

    /// Channels with a running session, sorted for stable listings.
    pub async fn channels(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let mut channels: Vec<String> = sessions.keys().cloned().collect();
        channels.sort();
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_then_get_returns_same_session() {
        let registry = SessionRegistry::new();
        let opened = registry.open("general", SessionConfig::new("Ambush")).await;
        let fetched = registry.get("general").await.unwrap();
        assert!(Arc::ptr_eq(&opened, &fetched));
        assert_eq!(fetched.lock().await.name, "Ambush");
    }

    #[tokio::test]
    async fn test_get_unknown_channel() {
        let registry = SessionRegistry::new();
        assert!(registry.get("general").await.is_none());
    }

    #[tokio::test]
    async fn test_open_replaces_existing_session() {
        let registry = SessionRegistry::new();
        registry.open("general", SessionConfig::new("First")).await;
        registry.open("general", SessionConfig::new("Second")).await;
        let session = registry.get("general").await.unwrap();
        assert_eq!(session.lock().await.name, "Second");
    }

    #[tokio::test]
    async fn test_close_removes_the_channel() {
        let registry = SessionRegistry::new();
        registry.open("general", SessionConfig::new("Ambush")).await;
        assert!(registry.close("general").await.is_some());
        assert!(registry.get("general").await.is_none());
        assert!(registry.close("general").await.is_none());
    }

    #[tokio::test]
    async fn test_channels_are_sorted() {
        let registry = SessionRegistry::new();
        registry.open("tavern", SessionConfig::new("B")).await;
        registry.open("arena", SessionConfig::new("A")).await;
        assert_eq!(registry.channels().await, vec!["arena", "tavern"]);
    }

    #[tokio::test]
    async fn test_edits_through_a_handle_stick() {
        let registry = Arc::new(SessionRegistry::new());
        registry.open("general", SessionConfig::new("Ambush")).await;

        let writer = Arc::clone(&registry);
        let task = tokio::spawn(async move {
            let session = writer.get("general").await.unwrap();
            session.lock().await.add_npc("Goblin", Some(7), Some(15), None);
        });
        task.await.unwrap();

        let session = registry.get("general").await.unwrap();
        assert!(session.lock().await.combatant("npc_goblin").is_some());
    }
}
