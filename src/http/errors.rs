use std::marker::PhantomData;

use failure::{Error as FailureError, Fail};
use hyper::StatusCode;
use serde_json;

/// Maps an error kind onto an http status code.
pub trait Codeable {
    fn code(&self) -> StatusCode;
}

/// Optional structured details attached to an error response.
pub trait PayloadCarrier {
    fn payload(&self) -> Option<serde_json::Value>;
}

/// Wire form of a failed response. Internals never leak here: anything
/// without a recognizable kind in its cause chain renders as a bare 500.
#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub code: u16,
    pub description: String,
    pub payload: Option<serde_json::Value>,
}

pub struct ErrorMessageWrapper<E> {
    pub inner: ErrorMessage,
    pub status: StatusCode,
    _error_type: PhantomData<E>,
}

impl<E: Fail + Codeable + PayloadCarrier> ErrorMessageWrapper<E> {
    /// Walks the cause chain and takes the first typed kind it finds.
    pub fn from(error: &FailureError) -> Self {
        let mut status = StatusCode::InternalServerError;
        let mut message = ErrorMessage {
            code: status.to_u16(),
            description: "Internal server error".to_string(),
            payload: None,
        };
        for cause in error.iter_chain() {
            if let Some(kind) = cause.downcast_ref::<E>() {
                status = kind.code();
                message = ErrorMessage {
                    code: status.to_u16(),
                    description: format!("{}", kind),
                    payload: kind.payload(),
                };
                break;
            }
        }
        Self {
            inner: message,
            status,
            _error_type: PhantomData,
        }
    }
}
