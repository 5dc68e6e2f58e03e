//! Axum routes and error mapping.

use crate::service::{DocService, ServiceError};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use docsync_core::StoreError;
use docsync_proto::routes::{DOCS_ROUTE, DOC_ROUTE, HEALTH_ROUTE, OPS_ROUTE};
use docsync_proto::{
    decode, DocListResponse, DocResponse, ErrorBody, HealthResponse, OpsSinceQuery,
    OpsSinceResponse, PostOpsRequest, PostOpsResponse, PutDocRequest,
};

/// Build the HTTP router over a document service.
pub fn router(service: DocService) -> Router {
    Router::new()
        .route(HEALTH_ROUTE, get(handle_health))
        .route(DOCS_ROUTE, get(handle_list_docs))
        .route(DOC_ROUTE, get(handle_get_doc).put(handle_put_doc))
        .route(OPS_ROUTE, get(handle_ops_since).post(handle_post_ops))
        .with_state(service)
}

async fn handle_health(State(service): State<DocService>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        documents: service.store().len(),
    })
}

async fn handle_list_docs(State(service): State<DocService>) -> Json<DocListResponse> {
    Json(service.list_docs())
}

async fn handle_put_doc(
    State(service): State<DocService>,
    Path(doc_id): Path<String>,
    body: Bytes,
) -> Result<Json<DocResponse>, ServiceError> {
    let req: PutDocRequest = decode(&body)?;
    tracing::debug!(doc_id = %doc_id, kind = %req.kind, "PUT document");
    service.put_doc(&doc_id, req).map(Json)
}

async fn handle_get_doc(
    State(service): State<DocService>,
    Path(doc_id): Path<String>,
) -> Result<Json<DocResponse>, ServiceError> {
    service.get_doc(&doc_id).map(Json)
}

async fn handle_post_ops(
    State(service): State<DocService>,
    Path(doc_id): Path<String>,
    body: Bytes,
) -> Result<Json<PostOpsResponse>, ServiceError> {
    let req: PostOpsRequest = decode(&body)?;
    tracing::debug!(
        doc_id = %doc_id,
        ops = req.ops.len(),
        since = req.since,
        "POST operations"
    );
    service.post_ops(&doc_id, req).map(Json)
}

async fn handle_ops_since(
    State(service): State<DocService>,
    Path(doc_id): Path<String>,
    Query(query): Query<OpsSinceQuery>,
) -> Result<Json<OpsSinceResponse>, ServiceError> {
    service.ops_since(&doc_id, query.since).map(Json)
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::Store(StoreError::UnsupportedType(_)) | ServiceError::Message(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(error = %self, "Request for missing document");
        } else {
            tracing::warn!(error = %self, "Rejected request");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
