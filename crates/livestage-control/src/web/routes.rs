//! REST API route definitions

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};

use super::handlers::{
    ApiResponse, ApproveRequest, ApproveResponse, EnterRequest, PaymentRequest,
    PaymentResponse, StatusResponse,
};
use super::server::{admin_guard, AppState};
use crate::tickets::TicketApplication;
use crate::{ControlError, Result};

/// Build the API router
///
/// Admin routes sit behind the `admin-password` check.
pub fn build_router(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/api/admin/pending", get(get_pending))
        .route("/api/admin/approve", post(approve))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_guard));

    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/payment", post(submit_payment))
        .route("/api/enter", post(enter))
        .merge(admin)
}

/// GET /api/status - Server and session status
async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<StatusResponse>> {
    let (session, connected_viewers) = {
        let coordinator = state.coordinator.lock();
        (coordinator.session().clone(), coordinator.client_count())
    };

    Json(ApiResponse::success(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        connected_viewers,
        session,
    }))
}

/// POST /api/payment - Register a ticket application
async fn submit_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<ApiResponse<PaymentResponse>>> {
    let id = state.tickets.apply(&request.name, &request.depositor_name)?;
    Ok(Json(ApiResponse::success(PaymentResponse { id })))
}

/// GET /api/admin/pending - Pending applications, newest first
async fn get_pending(State(state): State<AppState>) -> Json<ApiResponse<Vec<TicketApplication>>> {
    Json(ApiResponse::success(state.tickets.pending()))
}

/// POST /api/admin/approve - Approve an application and issue its token
async fn approve(
    State(state): State<AppState>,
    Json(request): Json<ApproveRequest>,
) -> Result<Json<ApiResponse<ApproveResponse>>> {
    let token = state.tickets.approve(request.id)?;
    Ok(Json(ApiResponse::success(ApproveResponse { token })))
}

/// POST /api/enter - Check a name and access token
async fn enter(
    State(state): State<AppState>,
    Json(request): Json<EnterRequest>,
) -> Result<Json<ApiResponse<()>>> {
    if !state.tickets.verify(&request.name, &request.token) {
        tracing::warn!("Entry refused for {:?}", request.name);
        return Err(ControlError::Unauthorized);
    }
    Ok(Json(ApiResponse::success(())))
}
