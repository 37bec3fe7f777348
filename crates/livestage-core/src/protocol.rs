//! Duplex channel messages between the session server and viewers
//!
//! Messages are JSON objects tagged by a `type` field. Unknown client message
//! types decode to [`ClientMessage::Unknown`] so that a newer client never
//! breaks an older server.

use serde::{Deserialize, Serialize};

use crate::session::{ConcertSession, Timestamp};
use crate::Result;

/// Message from a viewer to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Start (or restart) the show
    StartConcert {
        /// Song to play; the server substitutes its fallback when absent
        #[serde(rename = "songUrl", default, skip_serializing_if = "Option::is_none")]
        song_url: Option<String>,
    },
    /// Add one cheer to the shared counter
    Cheer,
    /// Any message type this build does not know
    #[serde(other)]
    Unknown,
}

/// Payload of the `INIT` handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    /// Full session snapshot
    pub concert_state: ConcertSession,
    /// Server wall clock when the handshake was produced
    pub server_time: Timestamp,
}

/// Message from the server to viewers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Sent once per connection, before anything else
    Init {
        /// Session snapshot and server time
        data: InitPayload,
    },
    /// The show (re)started
    ConcertStarted {
        /// Server time of the start
        #[serde(rename = "startTime")]
        start_time: Timestamp,
        /// Song being played
        #[serde(rename = "songUrl")]
        song_url: String,
    },
    /// The shared cheer counter changed
    CheerUpdate {
        /// New total
        #[serde(rename = "cheerCount")]
        cheer_count: u64,
    },
}

impl ClientMessage {
    /// Decode a text frame
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as a text frame
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ServerMessage {
    /// Build the handshake message
    pub fn init(concert_state: ConcertSession, server_time: Timestamp) -> Self {
        ServerMessage::Init {
            data: InitPayload {
                concert_state,
                server_time,
            },
        }
    }

    /// Decode a text frame
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as a text frame
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
