//! Web API and show channel
//!
//! - `GET /ws`: the duplex show channel
//! - `GET /api/status`: server and session status
//! - `POST /api/payment`, `POST /api/enter`: ticket application and entry
//! - `GET /api/admin/pending`, `POST /api/admin/approve`: admin ticket review

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod websocket;

pub use auth::AuthConfig;
pub use handlers::ApiResponse;
pub use server::{AppState, WebServer, WebServerConfig};
