//! HTTP surface for the workflow service.
//!
//! Thin handlers: decode the request, call the service, map the error.
//! All workflow rules live in `formflow-core`; nothing here inspects
//! submission state beyond shaping the response.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use formflow_core::domain::assignment::{Assignment, AssignmentId};
use formflow_core::domain::submission::{
    ApprovalEvent, Decision, Submission, SubmissionData, SubmissionId,
};
use formflow_core::domain::template::TemplateId;
use formflow_core::reporting::{ApproverLevelStats, TemplateStats};

use crate::workflow::{ServiceError, WorkflowService};

#[derive(Clone)]
pub struct ApiState {
    service: Arc<WorkflowService>,
}

pub fn router(service: Arc<WorkflowService>) -> Router {
    Router::new()
        .route("/api/v1/submissions", post(create_submission))
        .route("/api/v1/submissions/bulk-decide", post(bulk_decide))
        .route("/api/v1/submissions/{id}", get(get_submission))
        .route("/api/v1/submissions/{id}/resubmit", post(resubmit))
        .route("/api/v1/submissions/{id}/decide", post(decide))
        .route("/api/v1/assignments", post(create_assignments).get(list_assignments))
        .route("/api/v1/assignments/{id}", delete(delete_assignment))
        .route("/api/v1/templates/{id}/stats", get(template_stats))
        .route("/api/v1/templates/{id}/approver-breakdown", get(approver_breakdown))
        .with_state(ApiState { service })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub kind: String,
}

type Rejection = (StatusCode, Json<ApiError>);

fn reject(error: ServiceError) -> Rejection {
    let status = match error.kind() {
        "validation_error" => StatusCode::BAD_REQUEST,
        "template_not_found" | "submission_not_found" | "assignment_not_found" => {
            StatusCode::NOT_FOUND
        }
        "unauthorized_approver" => StatusCode::FORBIDDEN,
        "not_pending" | "wrong_level" | "invalid_state" | "concurrent_modification" => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(ApiError { error: error.to_string(), kind: error.kind().to_string() }))
}

#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    pub template_id: String,
    pub data: SubmissionData,
    pub submitted_by: String,
    #[serde(default)]
    pub assignment_id: Option<String>,
    /// When set, the data is stored as a draft and skips required-field
    /// validation and the approval chain.
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResubmitRequest {
    pub data: SubmissionData,
    /// Assignment to fill when this finalizes a drafted form.
    #[serde(default)]
    pub assignment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    pub level: u32,
    pub approver_id: String,
    pub decision: Decision,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDecideRequest {
    pub submission_ids: Vec<String>,
    pub approver_id: String,
    pub decision: Decision,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkDecideResponse {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkDecideFailureResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkDecideFailureResponse {
    pub submission_id: String,
    pub kind: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub id: String,
    pub template_id: String,
    pub status: String,
    pub current_level: u32,
    pub data: SubmissionData,
    pub approval_history: Vec<ApprovalEventResponse>,
    pub submitted_by: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApprovalEventResponse {
    pub level: u32,
    pub approver_id: String,
    pub decision: String,
    pub comments: Option<String>,
    pub actioned_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionResponse {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id.0,
            template_id: submission.template_id.0,
            status: submission.status.as_str().to_string(),
            current_level: submission.current_level,
            data: submission.data,
            approval_history: submission
                .approval_history
                .into_iter()
                .map(ApprovalEventResponse::from)
                .collect(),
            submitted_by: submission.submitted_by,
            version: submission.version,
            created_at: submission.created_at,
            updated_at: submission.updated_at,
        }
    }
}

impl From<ApprovalEvent> for ApprovalEventResponse {
    fn from(event: ApprovalEvent) -> Self {
        Self {
            level: event.level,
            approver_id: event.approver_id,
            decision: event.decision.as_str().to_string(),
            comments: event.comments,
            actioned_at: event.actioned_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentsRequest {
    pub template_ids: Vec<String>,
    pub employee_id: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ListAssignmentsQuery {
    pub employee_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub id: String,
    pub template_id: String,
    pub employee_id: String,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub linked_submission_id: Option<String>,
    pub overdue: bool,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssignmentResponse {
    fn from_assignment(assignment: Assignment, now: DateTime<Utc>) -> Self {
        let overdue = assignment.is_overdue(now);
        Self {
            id: assignment.id.0,
            template_id: assignment.template_id.0,
            employee_id: assignment.employee_id,
            status: assignment.status.as_str().to_string(),
            due_date: assignment.due_date,
            linked_submission_id: assignment.linked_submission_id.map(|id| id.0),
            overdue,
            version: assignment.version,
            created_at: assignment.created_at,
            updated_at: assignment.updated_at,
        }
    }
}

async fn create_submission(
    State(state): State<ApiState>,
    Json(request): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), Rejection> {
    let template_id = TemplateId(request.template_id);
    let assignment_id = request.assignment_id.map(AssignmentId);

    let submission = if request.draft {
        state
            .service
            .save_draft(&template_id, request.data, &request.submitted_by, assignment_id.as_ref())
            .await
            .map_err(reject)?
    } else {
        state
            .service
            .create_submission(
                &template_id,
                request.data,
                &request.submitted_by,
                assignment_id.as_ref(),
            )
            .await
            .map_err(reject)?
    };

    Ok((StatusCode::CREATED, Json(submission.into())))
}

async fn get_submission(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<SubmissionResponse>, Rejection> {
    let submission =
        state.service.get_submission(&SubmissionId(id)).await.map_err(reject)?;
    Ok(Json(submission.into()))
}

async fn resubmit(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<ResubmitRequest>,
) -> Result<Json<SubmissionResponse>, Rejection> {
    let assignment_id = request.assignment_id.map(AssignmentId);
    let submission = state
        .service
        .resubmit(&SubmissionId(id), request.data, assignment_id.as_ref())
        .await
        .map_err(reject)?;
    Ok(Json(submission.into()))
}

async fn decide(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<DecideRequest>,
) -> Result<Json<SubmissionResponse>, Rejection> {
    let submission = state
        .service
        .decide(
            &SubmissionId(id),
            request.level,
            &request.approver_id,
            request.decision,
            request.comments,
        )
        .await
        .map_err(reject)?;
    Ok(Json(submission.into()))
}

async fn bulk_decide(
    State(state): State<ApiState>,
    Json(request): Json<BulkDecideRequest>,
) -> Json<BulkDecideResponse> {
    let submission_ids = request.submission_ids.into_iter().map(SubmissionId).collect();
    let report = state
        .service
        .bulk_decide(submission_ids, &request.approver_id, request.decision, request.comments)
        .await;
    Json(BulkDecideResponse {
        succeeded: report.succeeded.into_iter().map(|id| id.0).collect(),
        failed: report
            .failed
            .into_iter()
            .map(|failure| BulkDecideFailureResponse {
                submission_id: failure.submission_id.0,
                kind: failure.kind.to_string(),
                reason: failure.reason,
            })
            .collect(),
    })
}

async fn create_assignments(
    State(state): State<ApiState>,
    Json(request): Json<CreateAssignmentsRequest>,
) -> Result<(StatusCode, Json<Vec<AssignmentResponse>>), Rejection> {
    let template_ids: Vec<TemplateId> =
        request.template_ids.into_iter().map(TemplateId).collect();
    let created = state
        .service
        .create_assignments(&template_ids, &request.employee_id, request.due_date)
        .await
        .map_err(reject)?;

    let now = Utc::now();
    let body = created
        .into_iter()
        .map(|assignment| AssignmentResponse::from_assignment(assignment, now))
        .collect();
    Ok((StatusCode::CREATED, Json(body)))
}

async fn list_assignments(
    State(state): State<ApiState>,
    Query(query): Query<ListAssignmentsQuery>,
) -> Result<Json<Vec<AssignmentResponse>>, Rejection> {
    let assignments = state
        .service
        .assignments_for_employee(&query.employee_id)
        .await
        .map_err(reject)?;

    let now = Utc::now();
    let body = assignments
        .into_iter()
        .map(|assignment| AssignmentResponse::from_assignment(assignment, now))
        .collect();
    Ok(Json(body))
}

async fn delete_assignment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, Rejection> {
    state.service.delete_assignment(&AssignmentId(id)).await.map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn template_stats(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<TemplateStats>, Rejection> {
    let stats = state.service.template_stats(&TemplateId(id)).await.map_err(reject)?;
    Ok(Json(stats))
}

async fn approver_breakdown(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ApproverLevelStats>>, Rejection> {
    let breakdown = state
        .service
        .template_approver_breakdown(&TemplateId(id))
        .await
        .map_err(reject)?;
    Ok(Json(breakdown))
}
