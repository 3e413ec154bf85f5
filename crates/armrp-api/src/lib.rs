pub mod error;
pub mod location;
pub mod response;
pub mod validation;
pub mod writer;

pub use error::{
    ErrorAdditionalInfo, ErrorDetails, ErrorResponse, SdkErrorAdditionalInfo, SdkErrorResponse,
    SdkResponseError, codes, convert_sdk_error_response, is_not_found_error,
};
pub use location::{AsyncOperationContext, AsyncOperationUrls, OPERATION_RESULTS, OPERATION_STATUSES};
pub use response::{
    APPLICATION_JSON, AZURE_ASYNC_OPERATION, ApplyError, AsyncOperationResponse,
    DEFAULT_RETRY_AFTER, Response,
};
pub use validation::{FieldError, ValidationErrors};
pub use writer::{ResponseRecorder, ResponseWriter};

use axum::http::{HeaderMap, header};

// -------------------------
// Content Negotiation
// -------------------------
/// Validate Content-Type for requests with bodies: require application/json
pub fn validate_content_type(headers: &HeaderMap) -> Result<(), ErrorResponse> {
    if let Some(ct) = headers.get(header::CONTENT_TYPE) {
        let val = ct.to_str().unwrap_or("").to_ascii_lowercase();
        if !val.starts_with(APPLICATION_JSON) {
            return Err(ErrorResponse::new(
                codes::INVALID,
                format!("Unsupported Content-Type: {val}. Only application/json is supported."),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod content_negotiation_tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn content_type_allows_json_variants() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );
        assert!(validate_content_type(&headers).is_ok());
        assert!(validate_content_type(&HeaderMap::new()).is_ok());
    }

    #[test]
    fn content_type_rejects_xml() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/xml"),
        );
        let err = validate_content_type(&headers).unwrap_err();
        assert_eq!(err.error.code, codes::INVALID);
    }
}
