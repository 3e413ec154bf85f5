use armrp_api::{
    AsyncOperationContext, OPERATION_RESULTS, OPERATION_STATUSES, Response, ResponseRecorder,
    validate_content_type,
};
use armrp_core::ResourceId;
use axum::{
    Json,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{ApplicationRequest, ApplicationView, OperationState, OperationStatus};
use crate::server::AppState;
use crate::store::{ApplicationRecord, OperationRecord, ResourceStore, StoreError};

/// Response whose body, if any, is an error envelope or untyped JSON.
type ArmResponse = Response<Value>;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct ApplicationPath {
    pub plane_type: String,
    pub plane_name: String,
    pub resource_group: String,
    pub namespace: String,
    pub name: String,
}

impl ApplicationPath {
    pub fn resource_id(&self) -> armrp_core::Result<ResourceId> {
        ResourceId::new(
            ResourceId::plane_scope_for(&self.plane_type, &self.plane_name),
            &self.namespace,
            "applications",
            &self.name,
        )?
        .with_resource_group(&self.resource_group)
    }
}

#[derive(Debug, Deserialize)]
pub struct OperationPath {
    pub plane_type: String,
    pub plane_name: String,
    pub namespace: String,
    pub location: String,
    pub operation_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiVersionQuery {
    #[serde(rename = "api-version")]
    pub api_version: Option<String>,
}

/// Apply `response` for the request described by `req`. A response that
/// cannot be written is replaced by a 500 error envelope.
pub(crate) fn respond<T: Serialize>(response: Response<T>, req: &Parts) -> axum::response::Response {
    let mut recorder = ResponseRecorder::new();
    let Err(err) = response.apply(req, &mut recorder) else {
        return recorder.into_response();
    };
    tracing::error!(error = %err, "failed to write response");

    let mut fallback = ResponseRecorder::new();
    match ArmResponse::internal_server_error_message(err.to_string()).apply(req, &mut fallback) {
        Ok(()) => fallback.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to write error response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Ids rejected for caller input are a 400; anything else is ours.
fn resource_id_error(err: &armrp_core::CoreError) -> ArmResponse {
    if err.is_client_error() {
        ArmResponse::bad_request(err.to_string())
    } else {
        tracing::error!(error = %err, "failed to build resource id");
        ArmResponse::internal_server_error_message(err.to_string())
    }
}

pub async fn put_application(
    State(state): State<AppState>,
    Path(path): Path<ApplicationPath>,
    Query(query): Query<ApiVersionQuery>,
    req: Request,
) -> axum::response::Response {
    let (parts, body) = req.into_parts();
    if let Err(body) = validate_content_type(&parts.headers) {
        return respond(ArmResponse::bad_request_arm(body), &parts);
    }
    let id = match path.resource_id() {
        Ok(id) => id,
        Err(e) => return respond(resource_id_error(&e), &parts),
    };
    let bytes = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return respond(
                ArmResponse::bad_request(format!("failed to read request body: {e}")),
                &parts,
            );
        }
    };
    let request: ApplicationRequest = match serde_json::from_slice(&bytes) {
        Ok(request) => request,
        Err(e) => {
            return respond(
                ArmResponse::bad_request(format!("invalid request body: {e}")),
                &parts,
            );
        }
    };
    if let Err(errors) = request.validate() {
        return respond(ArmResponse::validation_error(&errors), &parts);
    }

    let view = ApplicationView::evaluate(&id, &request.properties.resources);
    let operation_id = Uuid::new_v4();
    let created = state.store.upsert_application(ApplicationRecord {
        id: id.clone(),
        resources: request.properties.resources,
        operation_id,
    });

    let api_version = query
        .api_version
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| state.async_operations.api_version.clone());
    let http_code = if created {
        StatusCode::CREATED
    } else {
        StatusCode::ACCEPTED
    };
    let context = AsyncOperationContext::new(
        id,
        operation_id,
        &state.async_operations.location,
        api_version,
        http_code,
    );
    let status = OperationStatus::for_application(
        context.path(OPERATION_STATUSES),
        operation_id.to_string(),
        &view,
        OffsetDateTime::now_utc(),
    );
    tracing::info!(
        application = %view.id,
        operation_id = %operation_id,
        operation_status = ?status.status,
        created,
        "application accepted"
    );
    state.store.insert_operation(OperationRecord {
        context: context.clone(),
        status,
    });

    respond(
        Response::async_operation(Some(view), context)
            .with_retry_after(state.async_operations.retry_after_secs),
        &parts,
    )
}

pub async fn get_application(
    State(state): State<AppState>,
    Path(path): Path<ApplicationPath>,
    req: Request,
) -> axum::response::Response {
    let parts = req.into_parts().0;
    let id = match path.resource_id() {
        Ok(id) => id,
        Err(e) => return respond(resource_id_error(&e), &parts),
    };
    match state.store.get_application(&id) {
        Ok(record) => respond(
            Response::ok(ApplicationView::evaluate(&record.id, &record.resources)),
            &parts,
        ),
        Err(_) => respond(ArmResponse::not_found(&id), &parts),
    }
}

pub async fn delete_application(
    State(state): State<AppState>,
    Path(path): Path<ApplicationPath>,
    req: Request,
) -> axum::response::Response {
    let parts = req.into_parts().0;
    let id = match path.resource_id() {
        Ok(id) => id,
        Err(e) => return respond(resource_id_error(&e), &parts),
    };
    let deleted = state.store.delete_application(&id);
    tracing::info!(application = %id, deleted, "application deleted");
    respond(ArmResponse::no_content(), &parts)
}

pub async fn application_method_not_allowed(req: Request) -> axum::response::Response {
    let parts = req.into_parts().0;
    let message = format!(
        "The method '{}' is not supported by the resource",
        parts.method
    );
    respond(
        ArmResponse::method_not_allowed(parts.uri.path().to_string(), message),
        &parts,
    )
}

/// Find the operation named by `path`, which must also match the scope,
/// namespace and location the operation was created under.
fn find_operation(store: &ResourceStore, path: &OperationPath) -> Result<OperationRecord, StoreError> {
    let record = store.get_operation(&path.operation_id)?;
    let context = &record.context;
    let matches = context.resource_id.plane_scope()
        == ResourceId::plane_scope_for(&path.plane_type, &path.plane_name)
        && context
            .resource_id
            .provider_namespace()
            .eq_ignore_ascii_case(&path.namespace)
        && context.location.eq_ignore_ascii_case(&path.location);
    if matches {
        Ok(record)
    } else {
        Err(StoreError::OperationNotFound(path.operation_id.clone()))
    }
}

pub async fn get_operation_status(
    State(state): State<AppState>,
    Path(path): Path<OperationPath>,
    req: Request,
) -> axum::response::Response {
    let parts = req.into_parts().0;
    match find_operation(&state.store, &path) {
        Ok(record) => respond(Response::ok(record.status), &parts),
        Err(e) => respond(ArmResponse::not_found_message(e.to_string()), &parts),
    }
}

pub async fn get_operation_result(
    State(state): State<AppState>,
    Path(path): Path<OperationPath>,
    req: Request,
) -> axum::response::Response {
    let parts = req.into_parts().0;
    let record = match find_operation(&state.store, &path) {
        Ok(record) => record,
        Err(e) => return respond(ArmResponse::not_found_message(e.to_string()), &parts),
    };

    match record.status.status {
        OperationState::Provisioning => {
            let mut headers = HeaderMap::new();
            match HeaderValue::from_str(&record.context.url(&parts, OPERATION_RESULTS)) {
                Ok(location) => {
                    headers.insert(header::LOCATION, location);
                }
                Err(e) => tracing::warn!(error = %e, "operation result url is not a valid header"),
            }
            headers.insert(
                header::RETRY_AFTER,
                HeaderValue::from(state.async_operations.retry_after_secs),
            );
            respond(ArmResponse::async_operation_result(headers), &parts)
        }
        OperationState::Succeeded => respond(ArmResponse::no_content(), &parts),
        OperationState::Failed => respond(Response::ok(record.status), &parts),
    }
}
