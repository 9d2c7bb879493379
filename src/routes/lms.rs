use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::extractors::{JsonBody, QueryParams};
use crate::metrics::{self, summary, Bound, MetricKind, MetricPayload, MetricsQuery};
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::metric_events::MetricEvent;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/metric", get(get_metrics).post(create_metric))
        .route("/attendance", get(get_attendance))
        .route("/study-time", get(get_study_time))
        .route("/correct", get(get_correct_rate))
        .route("/progress", get(get_progress))
}

#[derive(Debug, Deserialize)]
struct CreateMetricRequest {
    metric: String,
    value: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttendanceQuery {
    start_time: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StudyTimeResponse {
    total_minutes: f64,
}

#[derive(Debug, Serialize)]
struct RateResponse {
    rate: u32,
}

async fn create_metric(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateMetricRequest>,
) -> Result<impl IntoResponse, AppError> {
    let kind = req
        .metric
        .trim()
        .parse::<MetricKind>()
        .map_err(|_| AppError::bad_request("LMS_INVALID_METRIC", "metric value is invalid"))?;
    let payload = MetricPayload::decode(kind, &req.value).ok_or_else(|| {
        AppError::bad_request(
            "LMS_INVALID_METRIC_VALUE",
            &format!("value does not match the {kind} payload"),
        )
    })?;
    payload
        .check_bounds()
        .map_err(|msg| AppError::bad_request("LMS_INVALID_METRIC_VALUE", &msg))?;

    let event = MetricEvent {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: auth.user_id,
        kind,
        value: payload.to_value(),
        created_at: Utc::now(),
    };
    state.store().append_metric_event(&event)?;

    tracing::debug!(event_id = %event.id, metric = %kind, "Metric event recorded");
    Ok(created(event))
}

async fn get_metrics(
    auth: AuthUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<MetricsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let validated = query.validate(state.config().metrics_offset())?;
    let outcome = metrics::run_query(state.store(), &auth.user_id, &validated)?;
    Ok(ok(outcome))
}

async fn get_attendance(
    auth: AuthUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<AttendanceQuery>,
) -> Result<impl IntoResponse, AppError> {
    let offset = state.config().metrics_offset();
    let anchor = match query.start_time.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => metrics::window::parse_instant(raw, offset, Bound::Start)
            .ok_or_else(|| {
                AppError::bad_request("LMS_INVALID_QUERY", "startTime is not a valid timestamp")
            })?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let attendance = summary::attendance(state.store(), &auth.user_id, anchor, offset)?;
    Ok(ok(attendance))
}

async fn get_study_time(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let total_minutes = summary::total_study_time(
        state.store(),
        &auth.user_id,
        Utc::now(),
        state.config().metrics_offset(),
    )?;
    Ok(ok(StudyTimeResponse { total_minutes }))
}

async fn get_correct_rate(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rate = summary::correct_rate(
        state.store(),
        &auth.user_id,
        Utc::now(),
        state.config().metrics_offset(),
    )?;
    Ok(ok(RateResponse { rate }))
}

async fn get_progress(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let progress = summary::progress_rate(state.store(), &auth.user_id)?;
    Ok(ok(progress))
}
