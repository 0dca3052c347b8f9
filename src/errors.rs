use std::borrow::Cow;
use std::collections::HashMap;

use hyper::StatusCode;
use serde_json;
use validator::{ValidationError, ValidationErrors};

use http::errors::{Codeable, PayloadCarrier};

/// Error kinds surfaced by the service layer. Engines attach one of these as
/// context on a `failure::Error`; the controller walks the cause chain and
/// renders the first kind it finds.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Not found")]
    NotFound,
    #[fail(display = "Parse error")]
    Parse,
    #[fail(display = "Validation error")]
    Validate(ValidationErrors),
    #[fail(display = "Conflict: {}", _0)]
    Conflict(String),
    #[fail(display = "Equipment {} is not available for the requested dates", equipment_id)]
    Availability {
        equipment_id: i32,
        conflicting_booking_id: Option<i32>,
    },
    #[fail(display = "Cannot transition from {} to {}", current, requested)]
    StatusTransition {
        current: String,
        requested: String,
        allowed: Vec<String>,
    },
    #[fail(display = "Operation refused: {}", _0)]
    Business(String),
    #[fail(display = "Payment error: {}", _0)]
    Payment(String),
    #[fail(display = "Document error: {}", _0)]
    Document(String),
}

impl Codeable for Error {
    fn code(&self) -> StatusCode {
        match *self {
            Error::NotFound => StatusCode::NotFound,
            Error::Parse => StatusCode::UnprocessableEntity,
            Error::Validate(_) => StatusCode::BadRequest,
            Error::Conflict(_) | Error::Availability { .. } | Error::StatusTransition { .. } => {
                StatusCode::Conflict
            }
            Error::Business(_) | Error::Payment(_) | Error::Document(_) => StatusCode::BadRequest,
        }
    }
}

impl PayloadCarrier for Error {
    fn payload(&self) -> Option<serde_json::Value> {
        match *self {
            Error::Validate(ref errors) => serde_json::to_value(errors.clone()).ok(),
            Error::Availability {
                equipment_id,
                conflicting_booking_id,
            } => Some(json!({
                "resource_id": equipment_id,
                "conflicting_booking_id": conflicting_booking_id,
            })),
            Error::StatusTransition {
                ref current,
                ref requested,
                ref allowed,
            } => Some(json!({
                "current_status": current,
                "new_status": requested,
                "allowed_transitions": allowed,
            })),
            _ => None,
        }
    }
}

/// Builds the `Validate` kind from a single ad-hoc message, for checks that
/// do not come from a derived validator.
pub fn validation_error(field: &'static str, message: &str) -> Error {
    let mut errors = ValidationErrors::new();
    errors.add(
        field,
        ValidationError {
            code: Cow::from(field),
            message: Some(Cow::from(message.to_string())),
            params: HashMap::new(),
        },
    );
    Error::Validate(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::NotFound.code(), StatusCode::NotFound);
        assert_eq!(Error::Parse.code(), StatusCode::UnprocessableEntity);
        assert_eq!(
            Error::Availability {
                equipment_id: 1,
                conflicting_booking_id: None,
            }.code(),
            StatusCode::Conflict
        );
        assert_eq!(Error::Business("nope".to_string()).code(), StatusCode::BadRequest);
        assert_eq!(validation_error("query", "too long").code(), StatusCode::BadRequest);
    }

    #[test]
    fn test_transition_payload_names_allowed() {
        let err = Error::StatusTransition {
            current: "COMPLETED".to_string(),
            requested: "PENDING".to_string(),
            allowed: vec![],
        };
        let payload = err.payload().unwrap();
        assert_eq!(payload["current_status"], "COMPLETED");
        assert_eq!(payload["allowed_transitions"].as_array().unwrap().len(), 0);
    }
}
