//! Authoritative concert session
//!
//! One [`SessionCoordinator`] owns the [`ConcertSession`] and a queue per
//! connected viewer. Every mutation is followed by a fan-out to all queues
//! before the call returns, so viewers observe mutations in coordinator order.

use std::collections::BTreeMap;
use std::sync::Arc;

use livestage_core::{ClientMessage, Clock, ConcertSession, ServerMessage, SystemClock};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::{ControlError, Result};

/// Connection handle
pub type ClientId = u64;

/// Coordinator shared between socket tasks
pub type SharedCoordinator = Arc<Mutex<SessionCoordinator>>;

/// Session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Song used when a start request names none
    pub fallback_song: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fallback_song: "assets/audio/song1.mp3".to_string(),
        }
    }
}

/// Owner of the session and of every viewer's outgoing queue
pub struct SessionCoordinator {
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    session: ConcertSession,
    clients: BTreeMap<ClientId, UnboundedSender<ServerMessage>>,
    next_id: ClientId,
}

impl SessionCoordinator {
    /// Create an idle coordinator reading time from `clock`
    pub fn new(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            session: ConcertSession::new(),
            clients: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create an idle coordinator on the system clock
    pub fn with_system_clock(config: SessionConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Wrap for sharing between socket tasks
    pub fn into_shared(self) -> SharedCoordinator {
        Arc::new(Mutex::new(self))
    }

    /// Current session
    pub fn session(&self) -> &ConcertSession {
        &self.session
    }

    /// Number of open channels
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Register a viewer; its queue already holds the `INIT` handshake
    pub fn connect(&mut self) -> (ClientId, UnboundedReceiver<ServerMessage>) {
        let id = self.next_id;
        self.next_id += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        let init = ServerMessage::init(self.session.clone(), self.clock.now_ms());
        // The receiver is still in hand, so this cannot fail
        let _ = tx.send(init);
        self.clients.insert(id, tx);

        info!("Viewer {} connected ({} open)", id, self.clients.len());
        (id, rx)
    }

    /// Drop a viewer's channel; returns whether it was registered
    pub fn disconnect(&mut self, id: ClientId) -> bool {
        let removed = self.clients.remove(&id).is_some();
        if removed {
            info!("Viewer {} disconnected ({} open)", id, self.clients.len());
        }
        removed
    }

    /// Start or restart the show and broadcast `CONCERT_STARTED`
    pub fn handle_start(&mut self, song_url: Option<String>) -> ServerMessage {
        let song = song_url
            .filter(|song| !song.is_empty())
            .unwrap_or_else(|| self.config.fallback_song.clone());
        let now = self.clock.now_ms();
        let restart = self.session.is_playing;
        self.session.start(now, song.clone());

        info!(
            "Concert {} at {} with {}",
            if restart { "restarted" } else { "started" },
            now,
            song
        );

        let message = ServerMessage::ConcertStarted {
            start_time: now,
            song_url: song,
        };
        self.broadcast(&message);
        message
    }

    /// Count a cheer and broadcast `CHEER_UPDATE`; returns the new total
    pub fn handle_cheer(&mut self) -> u64 {
        let cheer_count = self.session.record_cheer();
        debug!("Cheer #{}", cheer_count);
        self.broadcast(&ServerMessage::CheerUpdate { cheer_count });
        cheer_count
    }

    /// Apply one decoded client message
    pub fn dispatch(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::StartConcert { song_url } => {
                self.handle_start(song_url);
            }
            ClientMessage::Cheer => {
                self.handle_cheer();
            }
            ClientMessage::Unknown => {
                debug!("Ignoring unknown client message type");
            }
        }
    }

    /// Decode and apply one text frame
    pub fn handle_text(&mut self, text: &str) -> Result<()> {
        let message = ClientMessage::from_json(text)
            .map_err(|e| ControlError::InvalidMessage(e.to_string()))?;
        self.dispatch(message);
        Ok(())
    }

    fn broadcast(&mut self, message: &ServerMessage) {
        self.clients.retain(|id, tx| {
            if tx.send(message.clone()).is_ok() {
                true
            } else {
                debug!("Dropping closed channel for viewer {}", id);
                false
            }
        });
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("session", &self.session)
            .field("clients", &self.clients.len())
            .finish()
    }
}
