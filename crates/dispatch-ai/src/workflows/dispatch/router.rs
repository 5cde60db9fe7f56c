use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::autotune::AutotuneController;
use super::domain::{ActorContext, AssignmentId, Criterion, OrganizationId, ShiftId};
use super::guardrails::GuardrailReport;
use super::repository::FeedbackResult;
use super::service::{
    AutofillRequest, DispatchError, FeedbackRequest, MatchingService, PredictRequest,
    PredictionOutcome, Recommendation,
};

/// Shared state behind the dispatch routes.
#[derive(Clone)]
pub struct DispatchRouterState {
    pub service: Arc<MatchingService>,
    pub autotune: Arc<AutotuneController>,
}

/// Router builder exposing the dispatch operations over HTTP.
pub fn dispatch_router(state: DispatchRouterState) -> Router {
    Router::new()
        .route("/api/v1/dispatch/predict", post(predict_handler))
        .route("/api/v1/dispatch/autofill", post(autofill_handler))
        .route("/api/v1/dispatch/autotune", post(autotune_handler))
        .route("/api/v1/dispatch/feedback", post(feedback_handler))
        .route("/api/v1/dispatch/weights", get(weights_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictBody {
    #[serde(default)]
    shift_id: String,
    #[serde(default)]
    organization_id: String,
    #[serde(default)]
    criteria: Option<Vec<Criterion>>,
    #[serde(default)]
    auto_assign: bool,
    #[serde(default)]
    dry_run: bool,
    #[serde(default)]
    actor: Option<ActorContext>,
}

/// Wire view of a prediction run, flattening the commit outcome into the
/// `auto_assigned` / `assignment_id` pair callers key on.
#[derive(Debug, Serialize)]
pub(crate) struct PredictView {
    shift_id: ShiftId,
    organization_id: OrganizationId,
    recommendations: Vec<Recommendation>,
    guardrails: GuardrailReport,
    auto_assigned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignment_id: Option<AssignmentId>,
    dry_run: bool,
}

impl From<PredictionOutcome> for PredictView {
    fn from(outcome: PredictionOutcome) -> Self {
        let auto_assigned = outcome.auto_assigned();
        let assignment_id = outcome.assignment_id().cloned();
        Self {
            shift_id: outcome.shift_id,
            organization_id: outcome.organization_id,
            recommendations: outcome.recommendations,
            guardrails: outcome.guardrails,
            auto_assigned,
            assignment_id,
            dry_run: outcome.dry_run,
        }
    }
}

pub(crate) async fn predict_handler(
    State(state): State<DispatchRouterState>,
    Json(body): Json<PredictBody>,
) -> Response {
    let shift_id = body.shift_id.trim().to_string();
    let organization_id = body.organization_id.trim().to_string();
    if shift_id.is_empty() || organization_id.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "shift_id and organization_id are required",
        );
    }

    let request = PredictRequest {
        shift_id: ShiftId(shift_id),
        organization_id: OrganizationId(organization_id),
        criteria: body.criteria.unwrap_or_default(),
        auto_assign: body.auto_assign,
        dry_run: body.dry_run,
        actor: body.actor.unwrap_or_default(),
    };

    match state.service.predict(request) {
        Ok(outcome) => (StatusCode::OK, Json(PredictView::from(outcome))).into_response(),
        Err(error) => dispatch_error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AutofillBody {
    #[serde(default)]
    organization_id: String,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    criteria: Option<Vec<Criterion>>,
    #[serde(default)]
    actor: Option<ActorContext>,
}

const DEFAULT_AUTOFILL_LIMIT: usize = 10;

pub(crate) async fn autofill_handler(
    State(state): State<DispatchRouterState>,
    Json(body): Json<AutofillBody>,
) -> Response {
    let organization_id = body.organization_id.trim().to_string();
    if organization_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "organization_id is required");
    }

    let request = AutofillRequest {
        organization_id: OrganizationId(organization_id),
        limit: body.limit.unwrap_or(DEFAULT_AUTOFILL_LIMIT),
        criteria: body.criteria.unwrap_or_default(),
        actor: body.actor.unwrap_or_default(),
    };

    match state.service.autofill(request) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => dispatch_error_response(error),
    }
}

pub(crate) async fn autotune_handler(State(state): State<DispatchRouterState>) -> Response {
    let report = state.autotune.run();
    (StatusCode::OK, Json(report)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedbackBody {
    #[serde(default)]
    assignment_id: String,
    result: FeedbackResult,
    #[serde(default)]
    responded_in: Option<i64>,
}

pub(crate) async fn feedback_handler(
    State(state): State<DispatchRouterState>,
    Json(body): Json<FeedbackBody>,
) -> Response {
    let assignment_id = body.assignment_id.trim().to_string();
    if assignment_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "assignment_id is required");
    }

    let request = FeedbackRequest {
        assignment_id: AssignmentId(assignment_id),
        result: body.result,
        responded_in: body.responded_in,
    };

    match state.service.record_feedback(request) {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(error) => dispatch_error_response(error),
    }
}

pub(crate) async fn weights_handler(State(state): State<DispatchRouterState>) -> Response {
    (StatusCode::OK, Json(state.service.weights_view())).into_response()
}

fn dispatch_error_response(error: DispatchError) -> Response {
    let status = match &error {
        DispatchError::MissingIdentifiers => StatusCode::BAD_REQUEST,
        DispatchError::AssignmentNotFound(_) => StatusCode::NOT_FOUND,
        DispatchError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &error.to_string())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
