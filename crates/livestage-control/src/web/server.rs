//! Axum HTTP server

use axum::http::{header, HeaderValue, Method};
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::coordinator::SharedCoordinator;
use crate::tickets::TicketRegistry;
use crate::{error::ControlError, Result};

use super::auth::{extract_admin_password, AuthConfig, ADMIN_HEADER};
use super::routes::build_router;
use super::websocket::ws_handler;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub coordinator: SharedCoordinator,
    pub tickets: Arc<dyn TicketRegistry>,
    pub auth: Arc<AuthConfig>,
    pub started_at: Instant,
}

/// Web server configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WebServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub allowed_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            enable_cors: true,
            allowed_origins: vec!["*".to_string()],
            auth: AuthConfig::new(),
        }
    }
}

impl WebServerConfig {
    /// Create a new web server config
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Set the host address
    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    /// Set CORS enabled/disabled
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// Set allowed origins for CORS
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Set authentication config
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ControlError::HttpError(format!("Invalid address: {}", e)))
    }
}

/// Web server for the show channel and REST API
pub struct WebServer {
    config: WebServerConfig,
    state: AppState,
}

impl WebServer {
    /// Create a new web server around a coordinator and ticket registry
    pub fn new(
        config: WebServerConfig,
        coordinator: SharedCoordinator,
        tickets: Arc<dyn TicketRegistry>,
    ) -> Self {
        let state = AppState {
            coordinator,
            tickets,
            auth: Arc::new(config.auth.clone()),
            started_at: Instant::now(),
        };
        Self { config, state }
    }

    /// Shared state handed to every request
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Complete application router
    pub fn router(&self) -> Result<Router> {
        let app = build_router(&self.state)
            .route("/ws", axum::routing::get(ws_handler))
            .layer(middleware::from_fn(security_headers))
            .with_state(self.state.clone());

        if !self.config.enable_cors {
            return Ok(app);
        }

        let cors_layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                header::CONTENT_TYPE,
                header::HeaderName::from_static(ADMIN_HEADER),
            ]);

        if self.config.allowed_origins.iter().any(|o| o == "*")
            || self.config.allowed_origins.is_empty()
        {
            Ok(app.layer(cors_layer.allow_origin(Any)))
        } else {
            let origins = self
                .config
                .allowed_origins
                .iter()
                .map(|o| {
                    o.parse::<HeaderValue>().map_err(|e| {
                        ControlError::HttpError(format!("Invalid origin header: {}", e))
                    })
                })
                .collect::<Result<Vec<HeaderValue>>>()?;
            Ok(app.layer(cors_layer.allow_origin(origins)))
        }
    }

    /// Run the web server until it fails
    pub async fn run(self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let app = self.router()?;

        if !self.config.auth.is_enabled() {
            tracing::warn!("No admin secret configured; admin routes are locked");
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ControlError::HttpError(format!("Failed to bind: {}", e)))?;
        tracing::info!("Web server listening on {}", addr);

        axum::serve(listener, app.into_make_service())
            .await
            .map_err(|e| ControlError::HttpError(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Spawn the server in a background task
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Admin route guard
pub(crate) async fn admin_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let authorized = extract_admin_password(req.headers())
        .map(|candidate| state.auth.validate(&candidate))
        .unwrap_or(false);

    if !authorized {
        tracing::warn!("Admin request refused: {} {}", req.method(), req.uri().path());
        return ControlError::Forbidden.into_response();
    }

    next.run(req).await
}

/// Security headers middleware
async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}
