use std::marker::PhantomData;
use std::sync::Arc;

use failure::{Error as FailureError, Fail};
use futures::future;
use futures::Future;
use hyper;
use hyper::header::{ContentLength, ContentType};
use hyper::server::{Request, Response, Service};
use hyper::StatusCode;
use serde_json;

use super::errors::{Codeable, ErrorMessageWrapper, PayloadCarrier};

/// Future type the controller produces: a serialized body or a typed error.
pub type ControllerFuture = Box<Future<Item = String, Error = FailureError>>;

/// A controller parses the route, dispatches to a service and serializes the
/// outcome.
pub trait Controller {
    fn call(&self, request: Request) -> ControllerFuture;
}

/// Hyper service adapter around a `Controller`, translating typed errors into
/// json error responses.
pub struct Application<E> {
    pub controller: Arc<Controller>,
    _error_type: PhantomData<E>,
}

impl<E: 'static> Application<E>
where
    E: Fail + Codeable + PayloadCarrier,
{
    pub fn new<C: Controller + 'static>(controller: C) -> Self {
        Self {
            controller: Arc::new(controller),
            _error_type: PhantomData,
        }
    }

    fn response_with_body(body: String) -> Response {
        Response::new()
            .with_header(ContentLength(body.len() as u64))
            .with_header(ContentType::json())
            .with_status(StatusCode::Ok)
            .with_body(body)
    }

    fn response_with_error(error: &FailureError) -> Response {
        let wrapper = ErrorMessageWrapper::<E>::from(error);
        let body = serde_json::to_string(&wrapper.inner)
            .unwrap_or_else(|_| r#"{"code":500,"description":"Internal server error"}"#.to_string());
        Response::new()
            .with_header(ContentLength(body.len() as u64))
            .with_header(ContentType::json())
            .with_status(wrapper.status)
            .with_body(body)
    }
}

impl<E: 'static> Service for Application<E>
where
    E: Fail + Codeable + PayloadCarrier,
{
    type Request = Request;
    type Response = Response;
    type Error = hyper::Error;
    type Future = Box<Future<Item = Response, Error = hyper::Error>>;

    fn call(&self, req: Request) -> Self::Future {
        Box::new(self.controller.call(req).then(|result| match result {
            Ok(body) => future::ok(Self::response_with_body(body)),
            Err(error) => future::ok(Self::response_with_error(&error)),
        }))
    }
}
