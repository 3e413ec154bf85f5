use armrp_api::{
    Response, ResponseRecorder, SdkErrorResponse, ValidationErrors, convert_sdk_error_response,
};
use assert_json_diff::assert_json_eq;
use axum::http::{Request, StatusCode, request::Parts};
use serde_json::{Value, json};

fn request() -> Parts {
    Request::builder()
        .uri("/planes/radius/local/resourceGroups/g/providers/Applications.Core/applications/shop")
        .header("host", "localhost:8080")
        .body(())
        .unwrap()
        .into_parts()
        .0
}

#[test]
fn sdk_error_is_surfaced_as_internal_server_error_body() {
    let sdk: SdkErrorResponse = serde_json::from_value(json!({
        "code": "DeploymentFailed",
        "message": "At least one resource deployment operation failed.",
        "details": [{
            "code": "Conflict",
            "message": "Another operation is in progress.",
            "target": "db",
            "additionalInfo": [
                {"type": "RetryInfo", "info": {"retryAfterSeconds": 30}},
                {"type": "Opaque", "info": [1, 2, 3]}
            ]
        }]
    }))
    .unwrap();

    let details = convert_sdk_error_response(Some(&sdk)).expect("converted");
    let response: Response = Response::internal_server_error(details.into());

    let mut recorder = ResponseRecorder::new();
    response.apply(&request(), &mut recorder).unwrap();

    assert_eq!(recorder.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    let body: Value = recorder.body_json().unwrap();
    assert_json_eq!(
        body,
        json!({
            "error": {
                "code": "DeploymentFailed",
                "message": "At least one resource deployment operation failed.",
                "details": [{
                    "code": "Conflict",
                    "message": "Another operation is in progress.",
                    "target": "db",
                    "additionalInfo": [
                        {"type": "RetryInfo", "info": {"retryAfterSeconds": 30}},
                        {"type": "Opaque", "info": null}
                    ]
                }]
            }
        })
    );
}

#[test]
fn validation_error_wire_shape() {
    let mut errors = ValidationErrors::new();
    errors.add("properties.resources[0].name", "must not be empty");
    errors.add("properties.resources[1].name", "duplicates another resource");

    let response: Response = Response::validation_error(&errors);
    let mut recorder = ResponseRecorder::new();
    response.apply(&request(), &mut recorder).unwrap();

    let body: Value = recorder.body_json().unwrap();
    assert_json_eq!(
        body,
        json!({
            "error": {
                "code": "BadRequest",
                "message": errors.to_string(),
                "details": [
                    {
                        "code": "",
                        "message": "Field validation for 'properties.resources[0].name' failed: must not be empty",
                        "target": "properties.resources[0].name"
                    },
                    {
                        "code": "",
                        "message": "Field validation for 'properties.resources[1].name' failed: duplicates another resource",
                        "target": "properties.resources[1].name"
                    }
                ]
            }
        })
    );
}
