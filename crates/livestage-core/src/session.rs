//! Concert session state and clocks
//!
//! [`ConcertSession`] is the record the server owns and every viewer mirrors.
//! Time is expressed as integer milliseconds since the Unix epoch so that the
//! value survives a JSON round trip unchanged on both sides.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Shared show state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcertSession {
    /// Server time at which the show started, `None` before the first start
    pub start_time: Option<Timestamp>,
    /// Whether a show is running
    pub is_playing: bool,
    /// Total cheers received since process start
    pub cheer_count: u64,
    /// Song reference of the running show
    pub current_song: Option<String>,
}

impl ConcertSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the show at `at` with the given song
    pub fn start(&mut self, at: Timestamp, song: impl Into<String>) {
        self.start_time = Some(at);
        self.is_playing = true;
        self.current_song = Some(song.into());
    }

    /// Count one cheer and return the new total
    pub fn record_cheer(&mut self) -> u64 {
        self.cheer_count = self.cheer_count.saturating_add(1);
        self.cheer_count
    }
}

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_ms(&self) -> Timestamp;
}

/// Wall clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and simulation
///
/// Clones share the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock reading `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    /// Set the current time
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `delta_ms`
    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
