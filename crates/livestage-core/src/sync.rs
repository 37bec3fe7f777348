//! Client-side session mirror and clock synchronization
//!
//! The offset is a single-sample estimate taken at the handshake (and again
//! whenever a start broadcast arrives), so its accuracy is bounded by the
//! one-way latency of that message. No round trips are ever made.

use tracing::{debug, info};

use crate::protocol::ServerMessage;
use crate::session::{ConcertSession, Timestamp};

/// What changed in the mirror after applying a server message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    /// Mirror replaced by a handshake
    Initialized {
        /// Whether the session was already playing at connect time
        playing: bool,
    },
    /// A show (re)started
    Started {
        /// Song being played
        song: String,
    },
    /// Cheer counter changed
    CheerCount(u64),
}

/// Per-viewer copy of the session plus the estimated clock offset
#[derive(Debug, Clone, Default)]
pub struct ShowMirror {
    session: ConcertSession,
    server_time_offset_ms: f64,
    synced: bool,
}

impl ShowMirror {
    /// Create an empty, unsynchronized mirror
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one server message received at local time `local_now`
    pub fn apply(&mut self, message: &ServerMessage, local_now: Timestamp) -> MirrorEvent {
        match message {
            ServerMessage::Init { data } => {
                self.session = data.concert_state.clone();
                self.server_time_offset_ms = (data.server_time - local_now) as f64;
                self.synced = true;
                info!(
                    "Session mirror initialized: offset={}ms playing={}",
                    self.server_time_offset_ms, self.session.is_playing
                );
                MirrorEvent::Initialized {
                    playing: self.session.is_playing,
                }
            }
            ServerMessage::ConcertStarted {
                start_time,
                song_url,
            } => {
                self.session.start(*start_time, song_url.clone());
                self.server_time_offset_ms = (*start_time - local_now) as f64;
                self.synced = true;
                debug!(
                    "Concert started at {} ({}), offset re-estimated to {}ms",
                    start_time, song_url, self.server_time_offset_ms
                );
                MirrorEvent::Started {
                    song: song_url.clone(),
                }
            }
            ServerMessage::CheerUpdate { cheer_count } => {
                self.session.cheer_count = *cheer_count;
                MirrorEvent::CheerCount(*cheer_count)
            }
        }
    }

    /// Mirrored session
    pub fn session(&self) -> &ConcertSession {
        &self.session
    }

    /// Estimated `server - local` offset in milliseconds
    pub fn server_time_offset_ms(&self) -> f64 {
        self.server_time_offset_ms
    }

    /// Whether an offset has been estimated at least once
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Local time translated to the server clock
    pub fn server_now(&self, local_now: Timestamp) -> f64 {
        local_now as f64 + self.server_time_offset_ms
    }

    /// Elapsed show time in milliseconds, `None` before the first start
    ///
    /// The value can be slightly negative right after a start when the local
    /// clock estimate lags; callers treat that as "not yet playing".
    pub fn elapsed_show_ms(&self, local_now: Timestamp) -> Option<f64> {
        self.session
            .start_time
            .map(|start| self.server_now(local_now) - start as f64)
    }

    /// Elapsed show time in seconds while the show is playing
    pub fn playing_show_secs(&self, local_now: Timestamp) -> Option<f64> {
        if !self.session.is_playing {
            return None;
        }
        self.elapsed_show_ms(local_now)
            .filter(|ms| *ms >= 0.0)
            .map(|ms| ms / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_session(start: Timestamp) -> ConcertSession {
        let mut session = ConcertSession::new();
        session.start(start, "song.mp3");
        session
    }

    #[test]
    fn test_unstarted_mirror_has_no_elapsed_time() {
        let mut mirror = ShowMirror::new();
        assert_eq!(mirror.elapsed_show_ms(1_000), None);

        mirror.apply(&ServerMessage::init(ConcertSession::new(), 5_000), 1_000);
        assert!(mirror.is_synced());
        assert_eq!(mirror.elapsed_show_ms(1_000), None);
        assert_eq!(mirror.playing_show_secs(1_000), None);
    }

    #[test]
    fn test_offset_from_init() {
        let mut mirror = ShowMirror::new();
        let event = mirror.apply(&ServerMessage::init(playing_session(10_000), 12_000), 2_000);

        assert_eq!(event, MirrorEvent::Initialized { playing: true });
        assert_eq!(mirror.server_time_offset_ms(), 10_000.0);
        // 500ms of local time later the show has been running 2.5s
        assert_eq!(mirror.elapsed_show_ms(2_500), Some(2_500.0));
        assert_eq!(mirror.playing_show_secs(2_500), Some(2.5));
    }

    #[test]
    fn test_concert_started_resyncs() {
        let mut mirror = ShowMirror::new();
        mirror.apply(&ServerMessage::init(ConcertSession::new(), 40_000), 1_000);

        let event = mirror.apply(
            &ServerMessage::ConcertStarted {
                start_time: 40_300,
                song_url: "fast.mp3".into(),
            },
            1_200,
        );
        assert_eq!(
            event,
            MirrorEvent::Started {
                song: "fast.mp3".into()
            }
        );
        assert_eq!(mirror.elapsed_show_ms(1_200), Some(0.0));
        assert!(mirror.session().is_playing);
    }

    #[test]
    fn test_cheer_update_only_touches_counter() {
        let mut mirror = ShowMirror::new();
        mirror.apply(&ServerMessage::init(playing_session(1), 1), 1);
        mirror.apply(&ServerMessage::CheerUpdate { cheer_count: 9 }, 2);
        assert_eq!(mirror.session().cheer_count, 9);
        assert_eq!(mirror.session().start_time, Some(1));
    }
}
