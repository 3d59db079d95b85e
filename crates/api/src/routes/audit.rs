//! Audit ledger query route.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use docseal_core::audit::{AuditEntryKind, AuditFilter, AuditRecord};
use docseal_shared::types::{DocumentId, UserId, WorkflowId};

use crate::{AppState, error::ApiError};

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

/// Creates the audit routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/audit", get(query_ledger))
}

/// Ledger query parameters; all filters are optional and combine with AND.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    /// Only entries for this document.
    pub document_id: Option<DocumentId>,
    /// Only entries for this workflow.
    pub workflow_id: Option<WorkflowId>,
    /// Only entries by this actor.
    pub actor_id: Option<UserId>,
    /// Only entries of this kind.
    pub kind: Option<String>,
    /// Resume after this sequence.
    pub after: Option<i64>,
    /// Maximum records to return.
    pub limit: Option<usize>,
}

impl AuditQuery {
    fn filter(&self) -> Result<AuditFilter, ApiError> {
        let kind = self
            .kind
            .as_deref()
            .map(|k| {
                AuditEntryKind::parse(k).ok_or_else(|| {
                    ApiError::bad_request("INVALID_FILTER", format!("unknown entry kind '{k}'"))
                })
            })
            .transpose()?;

        Ok(AuditFilter {
            document_id: self.document_id,
            workflow_id: self.workflow_id,
            actor_id: self.actor_id,
            kind,
        })
    }

    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Page of ledger records.
#[derive(Debug, Serialize)]
pub struct AuditPage {
    /// Records in ledger order.
    pub records: Vec<AuditRecord>,
    /// Pass as `after` to fetch the next page; absent when this page was
    /// not full.
    pub next_after: Option<i64>,
}

/// GET `/audit`
async fn query_ledger(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditPage>, ApiError> {
    let filter = query.filter()?;
    let limit = query.limit();

    let records: Vec<AuditRecord> = state
        .ledger
        .query_after(filter, query.after)
        .take(limit)
        .try_collect()
        .await?;

    let next_after = if records.len() == limit {
        records.last().map(|r| r.sequence)
    } else {
        None
    };

    Ok(Json(AuditPage {
        records,
        next_after,
    }))
}
