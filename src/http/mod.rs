//! Http layer of the app: the hyper `Service` wrapper, the controller
//! contract and request/response helpers. The controller only has to produce
//! a serialized body or a typed error; everything else lives here.

pub mod controller;
pub mod errors;
pub mod request_util;

pub use self::controller::*;
