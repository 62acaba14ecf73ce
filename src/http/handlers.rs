//! HTTP handlers for the admin and public surfaces.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::chain::types::ChainError;
use crate::credentials::model::{CertificateType, CredentialRequest, RequestStatus};
use crate::credentials::workflow::WorkflowError;
use crate::http::server::AppState;
use crate::verification::VerificationOutcome;

/// JSON error envelope; the message is the error's own rendering so
/// operators see the distinct failure, not a generic one.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pending_tx_hash: Option<String>,
}

pub struct ApiError(WorkflowError);

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WorkflowError::RequestNotFound(_) | WorkflowError::CredentialNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            WorkflowError::InvalidTransition { .. } | WorkflowError::NotRevocable { .. } => {
                StatusCode::CONFLICT
            }
            WorkflowError::MissingReason => StatusCode::BAD_REQUEST,
            WorkflowError::Chain(e) => chain_status(e),
            WorkflowError::Backend(_) => StatusCode::BAD_GATEWAY,
            WorkflowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let pending_tx_hash = match &self.0 {
            WorkflowError::Chain(e) => e.pending_tx_hash().map(|h| format!("{:#x}", h)),
            _ => None,
        };

        let body = ErrorBody {
            error: self.0.to_string(),
            pending_tx_hash,
        };
        (status, Json(body)).into_response()
    }
}

fn chain_status(e: &ChainError) -> StatusCode {
    match e {
        ChainError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
        ChainError::WalletUnavailable(_)
        | ChainError::NetworkMismatch { .. }
        | ChainError::ContractNotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        ChainError::TxTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ChainError::SignerDeclined
        | ChainError::TxRejected(_)
        | ChainError::TxReverted { .. }
        | ChainError::EventNotFound { .. }
        | ChainError::Rpc(_) => StatusCode::BAD_GATEWAY,
    }
}

// --- public surface ---

#[derive(Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub version: &'static str,
    pub rpc_healthy: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        rpc_healthy: state.chain.is_healthy().await,
    })
}

/// Public verification. Unauthenticated, read-only.
pub async fn verify(
    State(state): State<AppState>,
    Path(payload): Path<String>,
) -> Response {
    verify_payload(&state, &payload).await
}

#[derive(Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub payload: String,
}

/// Query-parameter form, for payloads that do not survive a path segment
/// (full verification URLs).
pub async fn verify_query(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    verify_payload(&state, &query.payload).await
}

async fn verify_payload(state: &AppState, payload: &str) -> Response {
    let outcome = state.resolver.resolve(payload).await;
    let status = match &outcome {
        VerificationOutcome::Verified { .. } | VerificationOutcome::Revoked { .. } => {
            StatusCode::OK
        }
        VerificationOutcome::NotFound => StatusCode::NOT_FOUND,
        VerificationOutcome::Invalid { .. } => StatusCode::BAD_REQUEST,
    };
    (status, Json(outcome)).into_response()
}

// --- admin surface ---

#[derive(Deserialize)]
pub struct SubmitRequestBody {
    pub student_id: String,
    pub student_address: alloy::primitives::Address,
    pub certificate_type: CertificateType,
    pub subject_ref: Option<String>,
    pub semester_ref: Option<String>,
    pub roadmap_ref: Option<String>,
}

pub async fn submit_request(
    State(state): State<AppState>,
    Json(body): Json<SubmitRequestBody>,
) -> Result<(StatusCode, Json<CredentialRequest>), ApiError> {
    if body.student_id.trim().is_empty() {
        return Err(WorkflowError::Chain(ChainError::InvalidArgument {
            method: "submitRequest",
            reason: "studentId must not be empty".to_string(),
        })
        .into());
    }

    let mut request = CredentialRequest::new(
        body.student_id,
        body.student_address,
        body.certificate_type,
    );
    request.subject_ref = body.subject_ref;
    request.semester_ref = body.semester_ref;
    request.roadmap_ref = body.roadmap_ref;

    let stored = state.workflow.submit_request(request);
    Ok((StatusCode::CREATED, Json(stored)))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<RequestStatus>,
}

pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<CredentialRequest>> {
    let mut requests = state.workflow.store().list_requests(query.status);
    requests.sort_by_key(|r| r.requested_at);
    Json(requests)
}

pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CredentialRequest>, ApiError> {
    state
        .workflow
        .store()
        .get_request(&id)
        .map(Json)
        .ok_or_else(|| WorkflowError::RequestNotFound(id).into())
}

#[derive(Deserialize, Default)]
pub struct ApproveBody {
    pub admin_notes: Option<String>,
}

pub async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ApproveBody>>,
) -> Result<Json<CredentialRequest>, ApiError> {
    let notes = body.and_then(|Json(b)| b.admin_notes);
    let updated = state.workflow.approve_and_issue(&id, notes).await?;
    Ok(Json(updated))
}

pub async fn approve_off_chain(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ApproveBody>>,
) -> Result<Json<CredentialRequest>, ApiError> {
    let notes = body.and_then(|Json(b)| b.admin_notes);
    let updated = state.workflow.approve_off_chain(&id, notes)?;
    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct ReasonBody {
    pub reason: String,
}

pub async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ReasonBody>,
) -> Result<Json<CredentialRequest>, ApiError> {
    let updated = state.workflow.reject(&id, &body.reason)?;
    Ok(Json(updated))
}

#[derive(Serialize)]
pub struct ReconcileBody {
    pub outcome: crate::credentials::ReconcileOutcome,
    pub request: CredentialRequest,
}

pub async fn reconcile_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReconcileBody>, ApiError> {
    let outcome = state.workflow.reconcile(&id).await?;
    let request = state
        .workflow
        .store()
        .get_request(&id)
        .ok_or_else(|| WorkflowError::RequestNotFound(id.clone()))?;
    Ok(Json(ReconcileBody { outcome, request }))
}

pub async fn revoke_credential(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Json(body): Json<ReasonBody>,
) -> Result<Json<crate::credentials::Credential>, ApiError> {
    let updated = state.workflow.revoke(&number, &body.reason).await?;
    Ok(Json(updated))
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub requests: std::collections::HashMap<RequestStatus, usize>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        requests: state.workflow.store().request_summary(),
    })
}
