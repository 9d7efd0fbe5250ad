//! Runtime endpoints for the polling function and workflow.
//!
//! - `POST /functions/polling_function`        : run the function with its inputs
//! - `POST /workflows/polling_workflow/form`   : render the intake form
//! - `POST /workflows/polling_workflow/submit` : submit the form and run the function
//!
//! A caller-supplied `x-correlation-id` header is carried through every log
//! line and error body for the request; otherwise one is generated.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use pollbot_core::{DomainError, FunctionOutcome, InterfaceError, PollRequest};
use pollbot_slack::{
    api::SlackApi,
    function::PollingFunction,
    workflow::{FormSubmission, FormView, PollingWorkflow, WorkflowInputs},
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct RuntimeState {
    function: Arc<PollingFunction>,
    workflow: Arc<PollingWorkflow>,
}

impl RuntimeState {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self {
            function: Arc::new(PollingFunction::new(api.clone())),
            workflow: Arc::new(PollingWorkflow::new(PollingFunction::new(api))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkflowSubmitRequest {
    #[serde(default)]
    pub inputs: WorkflowInputs,
    #[serde(flatten)]
    pub submission: FormSubmission,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
    pub correlation_id: String,
}

type ErrorResponse = (StatusCode, Json<ErrorBody>);

pub fn router(state: RuntimeState) -> Router {
    Router::new()
        .route("/functions/polling_function", post(run_polling_function))
        .route("/workflows/polling_workflow/form", post(open_polling_form))
        .route("/workflows/polling_workflow/submit", post(submit_polling_form))
        .with_state(state)
}

async fn run_polling_function(
    State(state): State<RuntimeState>,
    headers: HeaderMap,
    payload: Result<Json<PollRequest>, JsonRejection>,
) -> Result<Json<FunctionOutcome>, ErrorResponse> {
    let correlation_id = correlation_id(&headers);
    let Json(request) = payload.map_err(|rejection| reject_payload(rejection, &correlation_id))?;
    if let Err(error) = request.validate() {
        return Err(reject(error, &correlation_id));
    }

    Ok(Json(state.function.execute_with_correlation(&request, &correlation_id).await))
}

async fn open_polling_form(
    State(state): State<RuntimeState>,
    headers: HeaderMap,
    payload: Result<Json<WorkflowInputs>, JsonRejection>,
) -> Result<Json<FormView>, ErrorResponse> {
    let correlation_id = correlation_id(&headers);
    let Json(inputs) = payload.map_err(|rejection| reject_payload(rejection, &correlation_id))?;
    Ok(Json(state.workflow.form(&inputs)))
}

async fn submit_polling_form(
    State(state): State<RuntimeState>,
    headers: HeaderMap,
    payload: Result<Json<WorkflowSubmitRequest>, JsonRejection>,
) -> Result<Json<FunctionOutcome>, ErrorResponse> {
    let correlation_id = correlation_id(&headers);
    let Json(request) = payload.map_err(|rejection| reject_payload(rejection, &correlation_id))?;

    state
        .workflow
        .submit_with_correlation(&request.inputs, &request.submission, &correlation_id)
        .await
        .map(Json)
        .map_err(|error| {
            reject(DomainError::MissingField(error.field().to_owned()), &correlation_id)
        })
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn reject_payload(rejection: JsonRejection, correlation_id: &str) -> ErrorResponse {
    reject(DomainError::InvalidPayload(rejection.body_text()), correlation_id)
}

fn reject(error: DomainError, correlation_id: &str) -> ErrorResponse {
    let interface = InterfaceError::bad_request(error, correlation_id);
    warn!(
        event_name = "ingress.http.request_rejected",
        correlation_id = %interface.correlation_id(),
        error = %interface,
        "rejected runtime request"
    );

    let body = ErrorBody {
        error: interface.user_message(),
        detail: interface.message().to_owned(),
        correlation_id: interface.correlation_id().to_owned(),
    };
    (StatusCode::BAD_REQUEST, Json(body))
}
