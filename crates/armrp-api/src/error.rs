//! ARM error envelope and conversion from cloud SDK error payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use thiserror::Error;

/// Error codes used in ARM error payloads.
pub mod codes {
    pub const INVALID: &str = "BadRequest";
    pub const NOT_FOUND: &str = "NotFound";
    pub const CONFLICT: &str = "Conflict";
    pub const INTERNAL: &str = "Internal";
    pub const PRECONDITION_FAILED: &str = "PreconditionFailed";
    pub const INVALID_AUTHENTICATION_INFO: &str = "InvalidAuthenticationInfo";
    pub const INVALID_RESOURCE_TYPE: &str = "InvalidResourceType";
}

/// Top-level ARM error body: `{"error": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails::new(code, message),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.error.target = target.into();
        self
    }
}

impl From<ErrorDetails> for ErrorResponse {
    fn from(error: ErrorDetails) -> Self {
        Self { error }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
    /// Nested errors. A `None` entry stands for a null detail in the source payload.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Option<ErrorDetails>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_info: Vec<ErrorAdditionalInfo>,
}

impl ErrorDetails {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_detail(mut self, detail: ErrorDetails) -> Self {
        self.details.push(Some(detail));
        self
    }

    /// Iterate over the non-null nested details.
    pub fn nested(&self) -> impl Iterator<Item = &ErrorDetails> {
        self.details.iter().flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorAdditionalInfo {
    #[serde(rename = "type", default)]
    pub info_type: String,
    #[serde(default)]
    pub info: Option<Map<String, Value>>,
}

// -------------------------
// Cloud SDK error payloads
// -------------------------

/// Error payload as returned by the cloud provider SDK. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub details: Vec<Option<SdkErrorResponse>>,
    #[serde(default)]
    pub additional_info: Vec<Option<SdkErrorAdditionalInfo>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdkErrorAdditionalInfo {
    #[serde(rename = "type", default)]
    pub info_type: Option<String>,
    /// Arbitrary JSON; only objects survive conversion.
    #[serde(default)]
    pub info: Option<Value>,
}

/// Convert an SDK error payload into [`ErrorDetails`], recursing through nested details.
///
/// `None` converts to `None`. Additional info payloads that are not JSON
/// objects are dropped.
pub fn convert_sdk_error_response(sdk: Option<&SdkErrorResponse>) -> Option<ErrorDetails> {
    let sdk = sdk?;
    Some(ErrorDetails {
        code: sdk.code.clone().unwrap_or_default(),
        message: sdk.message.clone().unwrap_or_default(),
        target: sdk.target.clone().unwrap_or_default(),
        details: sdk
            .details
            .iter()
            .map(|detail| convert_sdk_error_response(detail.as_ref()))
            .collect(),
        additional_info: sdk
            .additional_info
            .iter()
            .map(|info| convert_additional_info(info.as_ref()))
            .collect(),
    })
}

fn convert_additional_info(info: Option<&SdkErrorAdditionalInfo>) -> ErrorAdditionalInfo {
    let Some(info) = info else {
        return ErrorAdditionalInfo::default();
    };
    ErrorAdditionalInfo {
        info_type: info.info_type.clone().unwrap_or_default(),
        info: match &info.info {
            Some(Value::Object(map)) => Some(map.clone()),
            _ => None,
        },
    }
}

/// Error returned by the SDK transport for a non-success HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("RESPONSE {status_code}: {error_code}")]
pub struct SdkResponseError {
    pub status_code: u16,
    pub error_code: String,
}

/// Message produced by the fake SDK server used in tests for a 404.
pub const FAKE_SERVER_NOT_FOUND_RESPONSE: &str =
    "unexpected status code 404. acceptable values are http.StatusOK";

/// Report whether an error represents a missing resource.
///
/// Recognizes SDK response errors anywhere in the source chain, the fake
/// server's 404 message, and error text that is itself an ARM error body with
/// code `NotFound`.
pub fn is_not_found_error(err: Option<&(dyn StdError + 'static)>) -> bool {
    let Some(err) = err else {
        return false;
    };

    if err.to_string().contains(FAKE_SERVER_NOT_FOUND_RESPONSE) {
        return true;
    }

    let response_error = std::iter::successors(Some(err), |&e| e.source())
        .find_map(|e| e.downcast_ref::<SdkResponseError>());
    if let Some(response_error) = response_error {
        return response_error.error_code == codes::NOT_FOUND || response_error.status_code == 404;
    }

    match serde_json::from_str::<ErrorResponse>(&err.to_string()) {
        Ok(body) => body.error.code == codes::NOT_FOUND,
        Err(_) => false,
    }
}
