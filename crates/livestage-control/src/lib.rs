//! LiveStage Control - Session Server
//!
//! This crate hosts the authoritative side of the show:
//! - **Coordinator**: the single concert session, its mutations and the
//!   fan-out of every change to connected viewers
//! - **Tickets**: the ticket application collaborator behind a trait
//! - **Web API**: the `/ws` channel plus the REST routes for status and
//!   ticketing (requires the `http-api` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use livestage_control::{SessionConfig, SessionCoordinator};
//! use livestage_core::ClientMessage;
//!
//! let mut coordinator = SessionCoordinator::with_system_clock(SessionConfig::default());
//! let (_id, _inbox) = coordinator.connect();
//! coordinator.dispatch(ClientMessage::Cheer);
//! ```

#![allow(missing_docs)]

/// Session coordinator
pub mod coordinator;
/// Error types
pub mod error;
/// Ticket applications
pub mod tickets;

#[cfg(feature = "http-api")]
/// Web API server
pub mod web;

// Re-exports
pub use coordinator::{ClientId, SessionConfig, SessionCoordinator, SharedCoordinator};
pub use error::{ControlError, Result};
pub use tickets::{
    ApplicationId, InMemoryTicketRegistry, TicketApplication, TicketRegistry, TicketStatus,
};

#[cfg(feature = "http-api")]
pub use web::{AuthConfig, WebServer, WebServerConfig};
