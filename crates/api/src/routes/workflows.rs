//! Workflow routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docseal_core::workflow::{
    AdvanceRequest, ApprovalPath, Role, Workflow, WorkflowAction, WorkflowActionKind,
    WorkflowState,
};
use docseal_shared::types::{ActionId, DocumentId, UserId, WorkflowId};

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the workflow routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workflows/{workflow_id}", get(get_workflow))
        .route("/workflows/{workflow_id}/actions", get(list_actions))
        .route(
            "/workflows/{workflow_id}/actions/{action_id}/signature",
            get(reveal_signature),
        )
        .route("/workflows/{workflow_id}/advance", post(advance))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Workflow as returned by the API.
#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    /// Workflow ID.
    pub id: WorkflowId,
    /// Owning document.
    pub document_id: DocumentId,
    /// Role for each step.
    pub step_roles: ApprovalPath,
    /// Step awaiting action.
    pub current_step: u32,
    /// Number of steps.
    pub total_steps: u32,
    /// `open`, `completed` or `rejected`.
    pub state: &'static str,
    /// Role that may act next.
    pub required_role: Option<Role>,
    /// All steps taken.
    pub is_completed: bool,
    /// Rejected at some step.
    pub is_rejected: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last transition time.
    pub updated_at: DateTime<Utc>,
}

impl From<Workflow> for WorkflowResponse {
    fn from(w: Workflow) -> Self {
        let state = match w.state() {
            WorkflowState::Open { .. } => "open",
            WorkflowState::Completed => "completed",
            WorkflowState::Rejected => "rejected",
        };
        Self {
            id: w.id,
            document_id: w.document_id,
            current_step: w.current_step,
            total_steps: w.total_steps(),
            state,
            required_role: w.required_role(),
            is_completed: w.is_completed,
            is_rejected: w.is_rejected,
            created_at: w.created_at,
            updated_at: w.updated_at,
            step_roles: w.step_roles,
        }
    }
}

/// Recorded action; the sealed signature itself is never returned here.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// Action ID.
    pub id: ActionId,
    /// Acting user.
    pub actor_id: UserId,
    /// Action kind.
    pub action: WorkflowActionKind,
    /// Step the action was taken at.
    pub step: u32,
    /// Optional comment.
    pub comment: Option<String>,
    /// Whether a signature was attached.
    pub has_signature: bool,
    /// When the action was recorded.
    pub created_at: DateTime<Utc>,
}

impl From<WorkflowAction> for ActionResponse {
    fn from(a: WorkflowAction) -> Self {
        Self {
            id: a.id,
            actor_id: a.actor_id,
            action: a.action,
            step: a.step,
            comment: a.comment,
            has_signature: a.signature.is_some(),
            created_at: a.created_at,
        }
    }
}

/// Request body for advancing a workflow.
#[derive(Debug, Deserialize)]
pub struct AdvanceWorkflowRequest {
    /// Action kind, e.g. `approved`.
    pub action: String,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Optional signature payload (`data:image/...`).
    #[serde(default)]
    pub signature: Option<String>,
}

/// Response for a successful advance.
#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    /// The recorded action.
    pub action: ActionResponse,
    /// Workflow after the action.
    pub workflow: WorkflowResponse,
}

/// Revealed signature payload.
#[derive(Debug, Serialize)]
pub struct SignatureResponse {
    /// Action the signature belongs to.
    pub action_id: ActionId,
    /// Plaintext signature payload.
    pub signature: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/workflows/{workflow_id}`
async fn get_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<WorkflowId>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let workflow = state.workflows.workflow(workflow_id).await?;
    Ok(Json(workflow.into()))
}

/// GET `/workflows/{workflow_id}/actions`
async fn list_actions(
    State(state): State<AppState>,
    Path(workflow_id): Path<WorkflowId>,
) -> Result<Json<Vec<ActionResponse>>, ApiError> {
    let actions = state.workflows.actions(workflow_id).await?;
    Ok(Json(actions.into_iter().map(Into::into).collect()))
}

/// GET `/workflows/{workflow_id}/actions/{action_id}/signature`
async fn reveal_signature(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((workflow_id, action_id)): Path<(WorkflowId, ActionId)>,
) -> Result<Json<SignatureResponse>, ApiError> {
    let action = state
        .workflows
        .actions(workflow_id)
        .await?
        .into_iter()
        .find(|a| a.id == action_id)
        .ok_or_else(|| ApiError::not_found("ACTION_NOT_FOUND", format!("Action {action_id} not found")))?;

    let signature = state
        .workflows
        .reveal_signature(&action)
        .await
        .ok_or_else(|| ApiError::not_found("SIGNATURE_NOT_FOUND", "No readable signature for this action"))?;

    tracing::info!(
        workflow_id = %workflow_id,
        action_id = %action_id,
        viewer = %auth.user_id(),
        "Signature revealed"
    );
    Ok(Json(SignatureResponse {
        action_id,
        signature,
    }))
}

/// POST `/workflows/{workflow_id}/advance`
///
/// The actor is the token subject acting under the token's role.
async fn advance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workflow_id): Path<WorkflowId>,
    Json(payload): Json<AdvanceWorkflowRequest>,
) -> Result<Json<AdvanceResponse>, ApiError> {
    let actor = auth.actor()?;
    let action = WorkflowActionKind::parse(&payload.action).ok_or_else(|| {
        ApiError::bad_request(
            "INVALID_ACTION",
            format!("unknown action '{}'", payload.action),
        )
    })?;

    let recorded = state
        .workflows
        .advance(AdvanceRequest {
            workflow_id,
            actor,
            action,
            comment: payload.comment.filter(|c| !c.trim().is_empty()),
            signature: payload.signature,
        })
        .await?;
    let workflow = state.workflows.workflow(workflow_id).await?;

    Ok(Json(AdvanceResponse {
        action: recorded.into(),
        workflow: workflow.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_response_reports_state_and_next_role() {
        let now = Utc::now();
        let workflow = Workflow {
            id: WorkflowId::new(),
            document_id: DocumentId::new(),
            step_roles: ApprovalPath::new(vec![Role::AcademicStaff, Role::Dean]).unwrap(),
            current_step: 1,
            is_completed: false,
            is_rejected: false,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(WorkflowResponse::from(workflow)).unwrap();
        assert_eq!(json["state"], "open");
        assert_eq!(json["required_role"], "dean");
        assert_eq!(json["total_steps"], 2);
        assert_eq!(json["step_roles"], serde_json::json!(["academic_staff", "dean"]));
    }

    #[test]
    fn test_action_response_hides_sealed_signature() {
        let action = WorkflowAction {
            id: ActionId::new(),
            workflow_id: WorkflowId::new(),
            document_id: DocumentId::new(),
            actor_id: UserId::new(),
            action: WorkflowActionKind::Signed,
            step: 0,
            comment: None,
            signature: Some("enc:v1:AAAA".to_string()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(ActionResponse::from(action)).unwrap();
        assert_eq!(json["has_signature"], true);
        assert!(json.get("signature").is_none());
        assert_eq!(json["action"], "signed");
    }
}
