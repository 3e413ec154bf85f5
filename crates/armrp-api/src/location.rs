//! Polling URLs for asynchronous operations.
//!
//! Clients follow `Location` to the operation result and
//! `Azure-AsyncOperation` to the operation status until the operation
//! reaches a terminal state.

use armrp_core::ResourceId;
use axum::http::{StatusCode, header, request::Parts};
use url::form_urlencoded;
use uuid::Uuid;

pub const OPERATION_RESULTS: &str = "operationResults";
pub const OPERATION_STATUSES: &str = "operationStatuses";

/// Header set by the fronting proxy with the protocol the client used.
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

const FALLBACK_SCHEME: &str = "http";

/// Everything needed to describe one accepted asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncOperationContext {
    pub resource_id: ResourceId,
    pub operation_id: Uuid,
    pub location: String,
    pub api_version: String,
    pub http_code: StatusCode,
}

impl AsyncOperationContext {
    pub fn new(
        resource_id: ResourceId,
        operation_id: Uuid,
        location: impl Into<String>,
        api_version: impl Into<String>,
        http_code: StatusCode,
    ) -> Self {
        Self {
            resource_id,
            operation_id,
            location: location.into(),
            api_version: api_version.into(),
            http_code,
        }
    }

    /// Path of the operation under `segment`, without scheme, host or query.
    pub fn path(&self, segment: &str) -> String {
        format!(
            "{}/providers/{}/locations/{}/{}/{}",
            self.resource_id.plane_scope(),
            self.resource_id.provider_namespace(),
            self.location,
            segment,
            self.operation_id
        )
    }

    /// Absolute URL of the operation under `segment` as seen by the client of `req`.
    pub fn url(&self, req: &Parts, segment: &str) -> String {
        let scheme = forwarded_proto(req)
            .or_else(|| req.uri.scheme_str())
            .unwrap_or(FALLBACK_SCHEME);
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("api-version", &self.api_version)
            .finish();
        format!(
            "{scheme}://{host}{path}?{query}",
            host = request_host(req),
            path = escape_path(&self.path(segment))
        )
    }

    pub fn urls(&self, req: &Parts) -> AsyncOperationUrls {
        AsyncOperationUrls {
            result: self.url(req, OPERATION_RESULTS),
            status: self.url(req, OPERATION_STATUSES),
        }
    }
}

/// Operation result (`Location`) and operation status (`Azure-AsyncOperation`) URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncOperationUrls {
    pub result: String,
    pub status: String,
}

/// Percent-encode each segment of `path`, keeping the `/` separators.
///
/// Path parameters arrive decoded, so they must be encoded again before they
/// are placed in a URL.
pub fn escape_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Host the client addressed: the `Host` header, else the URI authority.
pub fn request_host(req: &Parts) -> &str {
    req.headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri.authority().map(|a| a.as_str()))
        .unwrap_or("")
}

/// Non-empty `X-Forwarded-Proto` value, if the request carries one.
pub fn forwarded_proto(req: &Parts) -> Option<&str> {
    req.headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn context() -> AsyncOperationContext {
        let id = ResourceId::new(
            "/planes/radius/local",
            "Applications.Core",
            "applications",
            "shop",
        )
        .unwrap()
        .with_resource_group("test-group")
        .unwrap();
        AsyncOperationContext::new(
            id,
            Uuid::from_u128(1),
            "global",
            "2023-10-01-preview",
            StatusCode::CREATED,
        )
    }

    #[test]
    fn builds_result_and_status_urls() {
        let req = parts("/ignored", &[("host", "h")]);
        let urls = context().urls(&req);
        assert_eq!(
            urls.result,
            "http://h/planes/radius/local/providers/Applications.Core/locations/global/operationResults/00000000-0000-0000-0000-000000000001?api-version=2023-10-01-preview"
        );
        assert_eq!(
            urls.status,
            "http://h/planes/radius/local/providers/Applications.Core/locations/global/operationStatuses/00000000-0000-0000-0000-000000000001?api-version=2023-10-01-preview"
        );
    }

    #[test]
    fn forwarded_proto_changes_only_the_scheme() {
        let plain = context().urls(&parts("/", &[("host", "h")]));
        let forwarded = context().urls(&parts(
            "/",
            &[("host", "h"), ("x-forwarded-proto", "https")],
        ));
        assert_eq!(forwarded.result, plain.result.replacen("http://", "https://", 1));
        assert_eq!(forwarded.status, plain.status.replacen("http://", "https://", 1));
    }

    #[test]
    fn empty_forwarded_proto_is_ignored() {
        let req = parts("/", &[("host", "h"), ("x-forwarded-proto", "")]);
        assert!(context().url(&req, OPERATION_RESULTS).starts_with("http://h/"));
    }

    #[test]
    fn host_falls_back_to_uri_authority() {
        let req = parts("https://example.com:8443/planes", &[]);
        let url = context().url(&req, OPERATION_STATUSES);
        assert!(url.starts_with("https://example.com:8443/planes/radius/local/"));
    }

    #[test]
    fn decoded_path_segments_are_encoded_again() {
        for (plane, encoded) in [("my plane", "my%20plane"), ("x?y", "x%3Fy"), ("a\nb", "a%0Ab")] {
            let id = ResourceId::new(
                ResourceId::plane_scope_for("radius", plane),
                "Applications.Core",
                "applications",
                "shop",
            )
            .unwrap();
            let ctx = AsyncOperationContext::new(
                id,
                Uuid::from_u128(1),
                "global",
                "v1",
                StatusCode::CREATED,
            );
            let url = ctx.url(&parts("/", &[("host", "h")]), OPERATION_RESULTS);
            assert!(
                url.starts_with(&format!("http://h/planes/radius/{encoded}/providers/")),
                "{url}"
            );
            assert!(url.ends_with("?api-version=v1"));
            assert!(axum::http::HeaderValue::from_str(&url).is_ok());
            assert_eq!(ctx.path(OPERATION_RESULTS).matches(plane).count(), 1);
        }
    }

    #[test]
    fn escape_path_keeps_separators_and_plain_names() {
        assert_eq!(
            escape_path("/planes/radius/local/providers/Applications.Core"),
            "/planes/radius/local/providers/Applications.Core"
        );
        assert_eq!(escape_path("ops/50%"), "ops/50%25");
        assert_eq!(escape_path(""), "");
    }

    #[test]
    fn api_version_is_query_encoded() {
        let mut ctx = context();
        ctx.api_version = "2023 preview&x".into();
        let url = ctx.url(&parts("/", &[("host", "h")]), OPERATION_RESULTS);
        assert!(url.ends_with("?api-version=2023+preview%26x"));
    }
}
