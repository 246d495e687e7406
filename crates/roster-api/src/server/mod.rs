use std::fmt;
use std::net::SocketAddr;

use axum::extract::{Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    ApiError, DrawResult, ErrorCode, InjectionPrompt, NewPartnerInput, PartySlot,
    PoolRefreshResult, RosterSnapshot, SCHEMA_VERSION_V1,
};
use roster_core::gacha::DrawKind;
use roster_core::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::{EngineApi, PersistenceError};

const DEFAULT_SQLITE_PATH: &str = "partner_roster.sqlite";

include!("error.rs");
include!("state.rs");
include!("routes/roster.rs");
include!("routes/economy.rs");
include!("routes/events.rs");
include!("util.rs");

pub async fn serve(addr: SocketAddr) -> Result<(), ServerError> {
    let api = EngineApi::open(default_sqlite_path(), default_draw_seed())?;
    let state = AppState::new(api);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "roster api listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/roster/snapshot", get(get_snapshot))
        .route("/api/v1/roster/sync", post(sync_now))
        .route("/api/v1/roster/partners", post(register_custom_partner))
        .route("/api/v1/roster/party/add", post(add_to_party))
        .route("/api/v1/roster/party/remove", post(remove_from_party))
        .route("/api/v1/pool/csv_url", post(set_pool_csv_url))
        .route("/api/v1/pool/refresh", post(refresh_pool))
        .route("/api/v1/gacha/draw", post(draw_gacha))
        .route("/api/v1/gacha/pickup", post(pickup_by_name))
        .route("/api/v1/sdp/grant", post(grant_sdp))
        .route("/api/v1/profiles/queue", post(queue_brief_profile))
        .route("/api/v1/prompts/drain", post(drain_prompts))
        .route("/api/v1/events/stat_update", post(event_stat_update))
        .route("/api/v1/events/user_message", post(event_user_message))
        .route("/api/v1/events/generation", post(event_generation))
        .route("/api/v1/events/chat_changed", post(event_chat_changed))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests;
