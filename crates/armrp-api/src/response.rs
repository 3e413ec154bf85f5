//! Response envelopes written back to the client.
//!
//! Every request handler ends by producing one [`Response`] and applying it
//! to the exchange exactly once.

use armrp_core::ResourceId;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header, request::Parts};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::{ErrorDetails, ErrorResponse, codes};
use crate::location::{AsyncOperationContext, escape_path, forwarded_proto, request_host};
use crate::validation::ValidationErrors;
use crate::writer::ResponseWriter;

/// Retry interval, in seconds, advertised to clients polling an operation.
pub const DEFAULT_RETRY_AFTER: &str = "60";

pub const APPLICATION_JSON: &str = "application/json";

/// Header carrying the operation status URL.
pub const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("error marshaling {type_name}: {source}")]
    Serialize {
        type_name: &'static str,
        source: serde_json::Error,
    },
    #[error("error writing marshaled {type_name} bytes to output: {source}")]
    Write {
        type_name: &'static str,
        source: std::io::Error,
    },
}

/// Body and polling details of an accepted asynchronous operation.
#[derive(Debug, Clone)]
pub struct AsyncOperationResponse<T> {
    pub body: Option<T>,
    pub context: AsyncOperationContext,
    pub retry_after: String,
}

/// One HTTP response category. Bodies are written as indented JSON.
#[derive(Debug, Clone)]
pub enum Response<T = Value> {
    /// 200, used when a change is processed synchronously.
    Ok { body: Option<T>, headers: HeaderMap },
    /// 201, synchronous create.
    Created { body: Option<T> },
    /// 201 with a `Location` header, asynchronous create.
    CreatedAsync {
        body: Option<T>,
        location: String,
        scheme: String,
    },
    /// 202 with a `Location` header, asynchronous update.
    AcceptedAsync {
        body: Option<T>,
        location: String,
        scheme: String,
    },
    /// Caller-chosen status with operation polling headers.
    AsyncOperation(AsyncOperationResponse<T>),
    /// 204, used for deletes.
    NoContent,
    BadRequest(ErrorResponse),
    ValidationError(ErrorResponse),
    NotFound(ErrorResponse),
    Conflict(ErrorResponse),
    PreconditionFailed(ErrorResponse),
    ClientAuthenticationFailed(ErrorResponse),
    MethodNotAllowed(ErrorResponse),
    InternalServerError(ErrorResponse),
    /// 202 carrying only headers, returned while an operation result is pending.
    AsyncOperationResult { headers: HeaderMap },
}

impl<T> Response<T> {
    /// 200 with `body`.
    pub fn ok(body: T) -> Self {
        Self::Ok {
            body: Some(body),
            headers: HeaderMap::new(),
        }
    }

    /// 200 with an optional body and extra headers.
    pub fn ok_with_headers(body: Option<T>, headers: HeaderMap) -> Self {
        Self::Ok { body, headers }
    }

    pub fn created(body: T) -> Self {
        Self::Created { body: Some(body) }
    }

    pub fn created_async(body: T, location: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::CreatedAsync {
            body: Some(body),
            location: location.into(),
            scheme: scheme.into(),
        }
    }

    pub fn accepted_async(body: T, location: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::AcceptedAsync {
            body: Some(body),
            location: location.into(),
            scheme: scheme.into(),
        }
    }

    pub fn async_operation(body: Option<T>, context: AsyncOperationContext) -> Self {
        Self::AsyncOperation(AsyncOperationResponse {
            body,
            context,
            retry_after: DEFAULT_RETRY_AFTER.to_string(),
        })
    }

    /// Override the `Retry-After` value of an async operation response.
    pub fn with_retry_after(mut self, seconds: u32) -> Self {
        if let Self::AsyncOperation(op) = &mut self {
            op.retry_after = seconds.to_string();
        }
        self
    }

    pub fn no_content() -> Self {
        Self::NoContent
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(ErrorResponse::new(codes::INVALID, message))
    }

    pub fn bad_request_arm(body: ErrorResponse) -> Self {
        Self::BadRequest(body)
    }

    /// 400 listing every failed field as a nested detail.
    pub fn validation_error(errors: &ValidationErrors) -> Self {
        let mut error = ErrorDetails::new(codes::INVALID, errors.to_string());
        for field_error in errors {
            error = error.with_detail(
                ErrorDetails::new("", field_error.to_string()).with_target(&field_error.field),
            );
        }
        Self::ValidationError(error.into())
    }

    pub fn not_found(id: &ResourceId) -> Self {
        Self::NotFound(
            ErrorResponse::new(
                codes::NOT_FOUND,
                format!("the resource with id '{id}' was not found"),
            )
            .with_target(id.to_string()),
        )
    }

    pub fn not_found_message(message: impl Into<String>) -> Self {
        Self::NotFound(ErrorResponse::new(codes::NOT_FOUND, message))
    }

    /// 404 for an api-version the resource type does not support.
    pub fn not_found_api_version(resource_type: &str, namespace: &str, api_version: &str) -> Self {
        Self::NotFound(ErrorResponse::new(
            codes::INVALID_RESOURCE_TYPE,
            format!(
                "The resource type '{resource_type}' could not be found in the namespace '{namespace}' for api version '{api_version}'."
            ),
        ))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(ErrorResponse::new(codes::CONFLICT, message))
    }

    pub fn precondition_failed(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PreconditionFailed(
            ErrorResponse::new(codes::PRECONDITION_FAILED, message).with_target(target),
        )
    }

    pub fn client_authentication_failed() -> Self {
        Self::ClientAuthenticationFailed(ErrorResponse::new(
            codes::INVALID_AUTHENTICATION_INFO,
            "Server failed to authenticate the request",
        ))
    }

    pub fn method_not_allowed(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MethodNotAllowed(ErrorResponse::new(codes::INVALID, message).with_target(target))
    }

    pub fn internal_server_error(body: ErrorResponse) -> Self {
        Self::InternalServerError(body)
    }

    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        Self::InternalServerError(ErrorResponse::new(codes::INTERNAL, message))
    }

    pub fn async_operation_result(headers: HeaderMap) -> Self {
        Self::AsyncOperationResult { headers }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Ok { .. } => StatusCode::OK,
            Self::Created { .. } | Self::CreatedAsync { .. } => StatusCode::CREATED,
            Self::AcceptedAsync { .. } | Self::AsyncOperationResult { .. } => StatusCode::ACCEPTED,
            Self::AsyncOperation(op) => op.context.http_code,
            Self::NoContent => StatusCode::NO_CONTENT,
            Self::BadRequest(_) | Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            Self::ClientAuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<T: Serialize> Response<T> {
    /// Write this response to `w`. `req` is the inbound request, used to build
    /// absolute polling URLs.
    ///
    /// The body is encoded before anything is written, so an encoding failure
    /// leaves the exchange untouched.
    pub fn apply<W>(self, req: &Parts, w: &mut W) -> Result<(), ApplyError>
    where
        W: ResponseWriter + ?Sized,
    {
        let status = self.status_code();
        tracing::info!(
            http.status_code = status.as_u16(),
            "responding with status code: {}",
            status.as_u16()
        );

        match self {
            Self::Ok { body, headers } => {
                let payload = Payload::encode(body.as_ref())?;
                append_headers(w, headers);
                payload.write(w, status)
            }
            Self::Created { body } => Payload::encode(body.as_ref())?.write(w, status),
            Self::CreatedAsync {
                body,
                location,
                scheme,
            }
            | Self::AcceptedAsync {
                body,
                location,
                scheme,
            } => {
                let payload = Payload::encode(body.as_ref())?;
                let location = absolute_location(req, &location, &scheme);
                tracing::info!(location = %location, "returning location");
                insert_header(w, header::LOCATION, &location);
                payload.write(w, status)
            }
            Self::AsyncOperation(op) => {
                let payload = Payload::encode(op.body.as_ref())?;
                let urls = op.context.urls(req);
                insert_header(w, header::LOCATION, &urls.result);
                insert_header(w, HeaderName::from_static(AZURE_ASYNC_OPERATION), &urls.status);
                insert_header(w, header::RETRY_AFTER, &op.retry_after);
                payload.write(w, status)
            }
            Self::NoContent => {
                w.write_head(status);
                Ok(())
            }
            Self::BadRequest(body)
            | Self::ValidationError(body)
            | Self::NotFound(body)
            | Self::Conflict(body)
            | Self::PreconditionFailed(body)
            | Self::ClientAuthenticationFailed(body)
            | Self::MethodNotAllowed(body)
            | Self::InternalServerError(body) => Payload::encode(Some(&body))?.write(w, status),
            Self::AsyncOperationResult { headers } => {
                w.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(APPLICATION_JSON),
                );
                append_headers(w, headers);
                w.write_head(status);
                Ok(())
            }
        }
    }
}

/// An encoded body, or nothing when the response has no body.
struct Payload {
    type_name: &'static str,
    bytes: Option<Vec<u8>>,
}

impl Payload {
    fn encode<B: Serialize>(body: Option<&B>) -> Result<Self, ApplyError> {
        let type_name = std::any::type_name::<B>();
        let bytes = body
            .map(serde_json::to_vec_pretty)
            .transpose()
            .map_err(|source| ApplyError::Serialize { type_name, source })?;
        Ok(Self { type_name, bytes })
    }

    fn write<W>(self, w: &mut W, status: StatusCode) -> Result<(), ApplyError>
    where
        W: ResponseWriter + ?Sized,
    {
        let Some(bytes) = self.bytes else {
            w.write_head(status);
            return Ok(());
        };
        w.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_JSON),
        );
        w.write_head(status);
        w.write_body(&bytes).map_err(|source| ApplyError::Write {
            type_name: self.type_name,
            source,
        })
    }
}

/// Absolute URL for a relative `location`.
///
/// Scheme precedence: `X-Forwarded-Proto`, then the configured `scheme`, then
/// the scheme of the request URI. Each path segment of `location` is percent-encoded.
fn absolute_location(req: &Parts, location: &str, scheme: &str) -> String {
    let location = escape_path(location);
    let scheme = forwarded_proto(req)
        .or(Some(scheme).filter(|s| !s.is_empty()))
        .or_else(|| req.uri.scheme_str())
        .unwrap_or("");
    let host = request_host(req);
    let separator = if location.is_empty() || location.starts_with('/') {
        ""
    } else {
        "/"
    };
    if scheme.is_empty() {
        format!("//{host}{separator}{location}")
    } else {
        format!("{scheme}://{host}{separator}{location}")
    }
}

fn insert_header<W>(w: &mut W, name: HeaderName, value: &str)
where
    W: ResponseWriter + ?Sized,
{
    match HeaderValue::from_str(value) {
        Ok(value) => {
            w.headers_mut().insert(name, value);
        }
        Err(e) => tracing::warn!(header = %name, error = %e, "dropping invalid header value"),
    }
}

fn append_headers<W>(w: &mut W, headers: HeaderMap)
where
    W: ResponseWriter + ?Sized,
{
    let staged = w.headers_mut();
    let mut current = None;
    for (name, value) in headers {
        if let Some(name) = name {
            current = Some(name);
        }
        if let Some(name) = &current {
            staged.append(name.clone(), value);
        }
    }
}
