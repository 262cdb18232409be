//! axum handlers for the registry.
//!
//! Every route answers both `GET` and `POST`:
//!
//! - `/fib/{algo}?input=N` submits a computation and returns its id.
//! - `/find/{id}` returns the record, pending or complete.
//! - `/shutdown` starts a graceful shutdown and returns `202`.
//!
//! `/fib` and `/find` without their path segment fail validation like an
//! empty value would. Any other path is a `404`.

use crate::server::{
    service::{
        AppState,
        request::{SequenceQuery, parse_algorithm, parse_id, parse_input},
        response::{ApiError, MessageBody, SequenceResponse},
    },
    telemetry::{
        increment_lookups, increment_not_found, increment_rejections, increment_submissions,
    },
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{MethodRouter, get},
};
use core::time::Duration;
use fibreg::SequenceId;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Builds the application router over `state`.
///
/// Requests that take longer than `request_timeout` are answered with `408`.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/fib/{algo}", get_or_post(new_sequence))
        .route("/fib", get_or_post(missing_algorithm))
        .route("/fib/", get_or_post(missing_algorithm))
        .route("/find/{id}", get_or_post(find_sequence))
        .route("/find", get_or_post(missing_id))
        .route("/find/", get_or_post(missing_id))
        .route("/shutdown", get_or_post(shutdown))
        .fallback(invalid_endpoint)
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}

fn get_or_post<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: axum::handler::Handler<T, AppState>,
    T: 'static,
{
    get(handler.clone())
        .post(handler)
        .fallback(unsupported_method)
}

/// Validates the algorithm and input, then submits the computation.
///
/// Responds with the bare id as soon as the record exists; the term itself is
/// computed in the background.
#[tracing::instrument(level = "debug", skip(state))]
pub async fn new_sequence(
    State(state): State<AppState>,
    Path(algo): Path<String>,
    Query(query): Query<SequenceQuery>,
) -> Result<Json<SequenceId>, ApiError> {
    let algorithm = parse_algorithm(&algo).inspect_err(|_| increment_rejections())?;
    let input = parse_input(query.input.as_deref(), state.max_input)
        .inspect_err(|_| increment_rejections())?;

    let id = state
        .dispatcher
        .submit(algorithm, input)
        .map_err(ApiError::from)
        .inspect_err(|_| increment_rejections())?;

    increment_submissions(algorithm);
    tracing::info!("Accepted sequence {id} ({algorithm}, n = {input})");
    Ok(Json(id))
}

/// Returns the current snapshot of the record at `id`.
#[tracing::instrument(level = "debug", skip(state))]
pub async fn find_sequence(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SequenceResponse>, ApiError> {
    let id = parse_id(&id).inspect_err(|_| increment_rejections())?;
    increment_lookups();

    let record = state
        .dispatcher
        .lookup(id)
        .map_err(ApiError::from)
        .inspect_err(|e| {
            if *e == ApiError::NotFound {
                increment_not_found();
            }
        })?;

    SequenceResponse::try_from(&record).map(Json)
}

/// Triggers the same graceful shutdown as `SIGINT`/`SIGTERM`.
pub async fn shutdown(State(state): State<AppState>) -> (StatusCode, Json<MessageBody>) {
    tracing::info!("Shutdown requested over HTTP");
    state.shutdown.cancel();
    (
        StatusCode::ACCEPTED,
        Json(MessageBody::new("Shutting down gracefully")),
    )
}

async fn missing_algorithm() -> ApiError {
    increment_rejections();
    ApiError::InvalidAlgorithm(String::new())
}

async fn missing_id() -> ApiError {
    increment_rejections();
    ApiError::InvalidId
}

async fn invalid_endpoint() -> ApiError {
    ApiError::InvalidEndpoint
}

async fn unsupported_method() -> ApiError {
    ApiError::UnsupportedMethod
}
