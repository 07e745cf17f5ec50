//! # API REST
//!
//! REST API implementation for the candidate scout.
//!
//! Handles:
//! - The ingestion bridge endpoints external agents push records to
//! - Operator endpoints for reviewing, committing and clearing the pending queue
//! - Session endpoints for searching, parsing, exporting and drafting invitations
//! - OpenAPI/Swagger documentation and CORS
//!
//! Uses `api-shared` for wire types and `scout-core` for everything else.

#![warn(rust_2018_idioms)]

pub mod settings;

use axum::{
    extract::{rejection::JsonRejection, Path as AxumPath, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{auth, types as wire, HealthService};
use scout_core::{
    CandidatePipeline, CandidateRecord, CommitReport, IngestPayload, IngestionBridge,
    ScoutError, SessionStore, StoreMode,
};

/// Application state shared across REST API handlers.
///
/// The session store and the bridge are the same instances the operator console uses when both
/// run in one process.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CandidatePipeline>,
    pub session: Arc<SessionStore>,
    pub bridge: Arc<IngestionBridge>,
    /// Key required on every state-changing endpoint, if any. Reads stay open.
    pub api_key: Option<Arc<str>>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        ingest,
        ingest_save,
        list_pending,
        clear_pending,
        commit_pending,
        commit_pending_one,
        queue_session,
        list_committed,
        list_session,
        clear_session,
        export_session,
        parse_session,
        search,
        draft_invite,
    ),
    components(schemas(
        wire::HealthRes,
        wire::OutcomeStatus,
        wire::RecordRes,
        wire::ListRecordsRes,
        wire::IngestReq,
        wire::IngestRes,
        wire::CommitRes,
        wire::ClearRes,
        wire::SearchReq,
        wire::ParseReq,
        wire::BatchRes,
        wire::InviteReq,
        wire::InviteRes,
        wire::QueueReq,
        wire::ErrorRes,
    ))
)]
pub struct ApiDoc;

type ApiError = (StatusCode, Json<wire::ErrorRes>);

/// Builds the full router: API routes, Swagger UI and permissive CORS.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(ingest))
        .route("/ingest/save", post(ingest_save))
        .route("/pending", get(list_pending).delete(clear_pending))
        .route("/pending/commit", post(commit_pending))
        .route("/pending/:id/commit", post(commit_pending_one))
        .route("/committed", get(list_committed))
        .route("/session", get(list_session).delete(clear_session))
        .route("/session/export", get(export_session))
        .route("/session/parse", post(parse_session))
        .route("/session/queue", post(queue_session))
        .route("/session/invite", post(draft_invite))
        .route("/search", post(search))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = wire::HealthRes)
    )
)]
/// Health check endpoint for the REST API.
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> Json<wire::HealthRes> {
    Json(HealthService::check_health(
        state.bridge.pending_len(),
        &state.bridge.backend(),
    ))
}

#[utoipa::path(
    post,
    path = "/ingest",
    request_body = wire::IngestReq,
    responses(
        (status = 202, description = "Record queued for review", body = wire::IngestRes),
        (status = 400, description = "Malformed payload", body = wire::ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = wire::ErrorRes)
    )
)]
/// Queue a record pushed by an external agent.
///
/// Returns as soon as the record is queued; the durable backend is not contacted.
///
/// # Errors
/// Returns `400 Bad Request` if the payload is not JSON or lacks `name`/`score`, and
/// `401 Unauthorized` if an API key is configured and the request does not carry it.
#[axum::debug_handler]
async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<wire::IngestReq>, JsonRejection>,
) -> Result<(StatusCode, Json<wire::IngestRes>), ApiError> {
    check_api_key(&state, &headers)?;
    let Json(req) = payload.map_err(rejection)?;

    let receipt = state
        .bridge
        .receive(ingest_payload(req))
        .map_err(|e| error_response(&e))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(wire::IngestRes {
            status: wire::OutcomeStatus::Received,
            id: Some(receipt.id.to_string()),
            queued: Some(receipt.queued),
            message: Some("queued for review".into()),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/ingest/save",
    request_body = wire::IngestReq,
    responses(
        (status = 200, description = "Record written to the backend", body = wire::IngestRes),
        (status = 400, description = "Malformed payload", body = wire::ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = wire::ErrorRes),
        (status = 502, description = "Backend write failed", body = wire::IngestRes)
    )
)]
/// Write a record straight to the durable backend, waiting for the result.
#[axum::debug_handler]
async fn ingest_save(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<wire::IngestReq>, JsonRejection>,
) -> Result<(StatusCode, Json<wire::IngestRes>), ApiError> {
    check_api_key(&state, &headers)?;
    let Json(req) = payload.map_err(rejection)?;

    match state.bridge.save(ingest_payload(req)).await {
        Ok(record) => Ok((
            StatusCode::OK,
            Json(wire::IngestRes {
                status: wire::OutcomeStatus::Success,
                id: Some(record.id.to_string()),
                queued: None,
                message: None,
            }),
        )),
        Err(e) if e.is_backend() => {
            tracing::error!("Save record error: {:?}", e);
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(wire::IngestRes {
                    status: wire::OutcomeStatus::Failed,
                    id: None,
                    queued: None,
                    message: Some(e.to_string()),
                }),
            ))
        }
        Err(e) => Err(error_response(&e)),
    }
}

#[utoipa::path(
    get,
    path = "/pending",
    responses(
        (status = 200, description = "Records awaiting review", body = wire::ListRecordsRes)
    )
)]
#[axum::debug_handler]
async fn list_pending(State(state): State<AppState>) -> Json<wire::ListRecordsRes> {
    Json(list_res(&state.bridge.pending()))
}

#[utoipa::path(
    delete,
    path = "/pending",
    responses(
        (status = 200, description = "Pending queue cleared", body = wire::ClearRes),
        (status = 401, description = "Missing or invalid API key", body = wire::ErrorRes)
    )
)]
/// Discard every pending record without writing it anywhere.
#[axum::debug_handler]
async fn clear_pending(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<wire::ClearRes>, ApiError> {
    check_api_key(&state, &headers)?;
    Ok(Json(wire::ClearRes {
        cleared: state.bridge.clear_pending(),
    }))
}

#[utoipa::path(
    post,
    path = "/pending/commit",
    responses(
        (status = 200, description = "Queue committed", body = wire::CommitRes),
        (status = 401, description = "Missing or invalid API key", body = wire::ErrorRes),
        (status = 502, description = "Backend write failed; queue unchanged", body = wire::CommitRes)
    )
)]
/// Commit the whole pending queue in one backend batch.
///
/// On failure the queue is left exactly as it was and the reason is returned. A client that
/// disconnects mid-commit does not cancel it.
#[axum::debug_handler]
async fn commit_pending(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<wire::CommitRes>), ApiError> {
    check_api_key(&state, &headers)?;
    let result = state.bridge.commit_all().await;
    Ok(commit_response(&state, result))
}

#[utoipa::path(
    post,
    path = "/pending/{id}/commit",
    params(("id" = String, Path, description = "Pending record id")),
    responses(
        (status = 200, description = "Record committed", body = wire::CommitRes),
        (status = 400, description = "Invalid id", body = wire::ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = wire::ErrorRes),
        (status = 404, description = "No pending record with that id", body = wire::ErrorRes),
        (status = 502, description = "Backend write failed; queue unchanged", body = wire::CommitRes)
    )
)]
/// Commit a single pending record.
#[axum::debug_handler]
async fn commit_pending_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Result<(StatusCode, Json<wire::CommitRes>), ApiError> {
    check_api_key(&state, &headers)?;
    let id = match uuid::Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Invalid pending record id: {:?}", e);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(wire::ErrorRes::new("invalid record id")),
            ));
        }
    };

    match state.bridge.commit_one(id).await {
        Err(e @ ScoutError::PendingRecordNotFound(_)) => Err(error_response(&e)),
        result => Ok(commit_response(&state, result)),
    }
}

#[utoipa::path(
    post,
    path = "/session/queue",
    request_body = wire::QueueReq,
    responses(
        (status = 202, description = "Session record queued for review", body = wire::IngestRes),
        (status = 400, description = "Malformed request", body = wire::ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = wire::ErrorRes),
        (status = 404, description = "No session record with that name", body = wire::ErrorRes),
        (status = 409, description = "Record already pending", body = wire::ErrorRes)
    )
)]
/// Queue the first session record with the given name for review.
#[axum::debug_handler]
async fn queue_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<wire::QueueReq>, JsonRejection>,
) -> Result<(StatusCode, Json<wire::IngestRes>), ApiError> {
    check_api_key(&state, &headers)?;
    let Json(req) = payload.map_err(rejection)?;

    let receipt = state
        .bridge
        .queue_from_session(&state.session, &req.name)
        .map_err(|e| {
            tracing::warn!("Queue session record error: {}", e);
            error_response(&e)
        })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(wire::IngestRes {
            status: wire::OutcomeStatus::Received,
            id: Some(receipt.id.to_string()),
            queued: Some(receipt.queued),
            message: Some("queued for review".into()),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/committed",
    responses(
        (status = 200, description = "Records committed by this process", body = wire::ListRecordsRes)
    )
)]
#[axum::debug_handler]
async fn list_committed(State(state): State<AppState>) -> Json<wire::ListRecordsRes> {
    Json(list_res(&state.bridge.committed().snapshot()))
}

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Session records in store order", body = wire::ListRecordsRes)
    )
)]
#[axum::debug_handler]
async fn list_session(State(state): State<AppState>) -> Json<wire::ListRecordsRes> {
    Json(list_res(&state.session.snapshot()))
}

#[utoipa::path(
    delete,
    path = "/session",
    responses(
        (status = 200, description = "Session cleared", body = wire::ClearRes),
        (status = 401, description = "Missing or invalid API key", body = wire::ErrorRes)
    )
)]
#[axum::debug_handler]
async fn clear_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<wire::ClearRes>, ApiError> {
    check_api_key(&state, &headers)?;
    let cleared = state.session.len();
    state.session.clear();
    Ok(Json(wire::ClearRes { cleared }))
}

#[utoipa::path(
    get,
    path = "/session/export",
    responses(
        (status = 200, description = "Session as CSV", body = String, content_type = "text/csv"),
        (status = 500, description = "Internal server error", body = wire::ErrorRes)
    )
)]
/// Download the session store as CSV, one row per record.
#[axum::debug_handler]
async fn export_session(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let csv = state.session.export_csv().map_err(|e| {
        tracing::error!("Export session error: {:?}", e);
        error_response(&e)
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"scout_session.csv\"",
            ),
        ],
        csv,
    ))
}

#[utoipa::path(
    post,
    path = "/session/parse",
    request_body = wire::ParseReq,
    responses(
        (status = 200, description = "Raw text parsed into the session", body = wire::BatchRes),
        (status = 400, description = "Malformed request", body = wire::ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = wire::ErrorRes)
    )
)]
/// Parse a pasted raw batch into the session without calling the generation service.
#[axum::debug_handler]
async fn parse_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<wire::ParseReq>, JsonRejection>,
) -> Result<Json<wire::BatchRes>, ApiError> {
    check_api_key(&state, &headers)?;
    let Json(req) = payload.map_err(rejection)?;
    let report = state
        .pipeline
        .ingest_text(&req.raw_text, &state.session, store_mode(req.append))
        .await;

    Ok(Json(wire::BatchRes {
        records: report.records.iter().map(record_res).collect(),
        notices: report.notices,
        session_size: state.session.len(),
    }))
}

#[utoipa::path(
    post,
    path = "/search",
    request_body = wire::SearchReq,
    responses(
        (status = 200, description = "Search results stored in the session", body = wire::BatchRes),
        (status = 400, description = "Malformed request", body = wire::ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = wire::ErrorRes),
        (status = 502, description = "Generation service failed", body = wire::ErrorRes),
        (status = 503, description = "Generation service not configured", body = wire::ErrorRes)
    )
)]
/// Run a search-grounded generation for `query` and store the parsed candidates.
#[axum::debug_handler]
async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<wire::SearchReq>, JsonRejection>,
) -> Result<Json<wire::BatchRes>, ApiError> {
    check_api_key(&state, &headers)?;
    let Json(req) = payload.map_err(rejection)?;

    match state
        .pipeline
        .search(&req.query, &state.session, store_mode(req.append))
        .await
    {
        Ok(report) => Ok(Json(wire::BatchRes {
            records: report.records.iter().map(record_res).collect(),
            notices: report.notices,
            session_size: state.session.len(),
        })),
        Err(e) => {
            tracing::error!("Search error: {:?}", e);
            Err(error_response(&e))
        }
    }
}

#[utoipa::path(
    post,
    path = "/session/invite",
    request_body = wire::InviteReq,
    responses(
        (status = 200, description = "Invitation drafted", body = wire::InviteRes),
        (status = 404, description = "No session record with that name", body = wire::ErrorRes),
        (status = 502, description = "Generation service failed", body = wire::ErrorRes),
        (status = 503, description = "Generation service not configured", body = wire::ErrorRes)
    )
)]
/// Draft an invitation for the first session record with the given name.
#[axum::debug_handler]
async fn draft_invite(
    State(state): State<AppState>,
    payload: Result<Json<wire::InviteReq>, JsonRejection>,
) -> Result<Json<wire::InviteRes>, ApiError> {
    let Json(req) = payload.map_err(rejection)?;

    match state.pipeline.draft_invite(&state.session, &req.name).await {
        Ok(invite) => Ok(Json(wire::InviteRes {
            record: record_res(&invite.record),
            message: invite.message,
        })),
        Err(e) => {
            tracing::error!("Draft invite error: {:?}", e);
            Err(error_response(&e))
        }
    }
}

// Helper functions

fn check_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let provided = headers
        .get(auth::API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    auth::validate_api_key(provided, state.api_key.as_deref()).map_err(|e| {
        tracing::warn!("Rejected request: {}", e);
        (StatusCode::UNAUTHORIZED, Json(wire::ErrorRes::new(e.to_string())))
    })
}

fn rejection(e: JsonRejection) -> ApiError {
    tracing::warn!("Malformed request body: {}", e.body_text());
    (StatusCode::BAD_REQUEST, Json(wire::ErrorRes::new(e.body_text())))
}

fn error_response(e: &ScoutError) -> ApiError {
    let status = match e {
        ScoutError::MalformedPayload(_) | ScoutError::InvalidInput(_) | ScoutError::Text(_) => {
            StatusCode::BAD_REQUEST
        }
        ScoutError::PendingRecordNotFound(_) | ScoutError::SessionRecordNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        ScoutError::AlreadyPending(_) => StatusCode::CONFLICT,
        ScoutError::GenerationUnconfigured => StatusCode::SERVICE_UNAVAILABLE,
        ScoutError::GenerationRequest(_)
        | ScoutError::GenerationStatus { .. }
        | ScoutError::GenerationEmpty
        | ScoutError::GenerationTimeout(_) => StatusCode::BAD_GATEWAY,
        e if e.is_backend() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(wire::ErrorRes::new(e.to_string())))
}

fn commit_response(
    state: &AppState,
    result: scout_core::ScoutResult<CommitReport>,
) -> (StatusCode, Json<wire::CommitRes>) {
    match result {
        Ok(report) => (
            StatusCode::OK,
            Json(wire::CommitRes {
                status: wire::OutcomeStatus::Success,
                committed: report.committed.iter().map(record_res).collect(),
                remaining: report.remaining,
                message: None,
            }),
        ),
        Err(e) => {
            tracing::error!("Commit error: {:?}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(wire::CommitRes {
                    status: wire::OutcomeStatus::Failed,
                    committed: Vec::new(),
                    remaining: state.bridge.pending_len(),
                    message: Some(e.to_string()),
                }),
            )
        }
    }
}

fn ingest_payload(req: wire::IngestReq) -> IngestPayload {
    IngestPayload {
        name: req.name,
        score: req.score,
        identifier: req.identifier,
        category: req.category,
        reference_url: req.reference_url,
        raw_text: req.raw_text,
    }
}

fn store_mode(append: bool) -> StoreMode {
    if append {
        StoreMode::Append
    } else {
        StoreMode::Replace
    }
}

fn list_res(records: &[CandidateRecord]) -> wire::ListRecordsRes {
    wire::ListRecordsRes {
        count: records.len(),
        records: records.iter().map(record_res).collect(),
    }
}

pub fn record_res(record: &CandidateRecord) -> wire::RecordRes {
    wire::RecordRes {
        id: record.id.to_string(),
        name: record.name.clone(),
        identifier: record.identifier.clone(),
        category: record.category.clone(),
        score: record.score().value(),
        tier: record.tier().to_string(),
        status: record.status().to_string(),
        reference_url: record.reference_url.clone(),
        raw_text: record.raw_text.clone(),
        received_at: record.received_at.to_rfc3339(),
    }
}
