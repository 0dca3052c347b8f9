use std::collections::HashMap;

use failure::Error as FailureError;
use futures::future::IntoFuture;
use futures::{Future, Stream};
use hyper;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json;

use super::controller::ControllerFuture;

/// Reads the whole request body into a string.
pub fn read_body(body: hyper::Body) -> Box<Future<Item = String, Error = FailureError>> {
    Box::new(
        body.concat2()
            .map_err(|e| -> FailureError { e.into() })
            .map(|chunk| String::from_utf8_lossy(&chunk).to_string()),
    )
}

/// Reads and deserializes the request body. Callers attach their own `Parse`
/// context on failure.
pub fn parse_body<T>(body: hyper::Body) -> Box<Future<Item = T, Error = FailureError>>
where
    T: DeserializeOwned + 'static,
{
    Box::new(read_body(body).and_then(|string| serde_json::from_str::<T>(&string).map_err(From::from)))
}

/// Serializes a service future into the controller's response body future.
pub fn serialize_future<T, F>(fut: F) -> ControllerFuture
where
    T: Serialize + 'static,
    F: IntoFuture<Item = T, Error = FailureError> + 'static,
{
    Box::new(
        fut.into_future()
            .and_then(|resp| serde_json::to_string(&resp).map_err(From::from)),
    )
}

/// Splits a raw query string into decoded key/value pairs.
pub fn query_params(query: &str) -> HashMap<&str, String> {
    query
        .split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) if !key.is_empty() => Some((key, percent_decode(value))),
                _ => None,
            }
        })
        .collect()
}

/// Minimal percent decoding for query values: `%XX` escapes and `+` spaces.
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 3 <= bytes.len() => {
                let decoded = ::std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                match decoded {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let params = query_params("skip=0&limit=20&query=4k+camera&flag");
        assert_eq!(params.get("skip").map(|s| s.as_ref()), Some("0"));
        assert_eq!(params.get("limit").map(|s| s.as_ref()), Some("20"));
        assert_eq!(params.get("query").map(|s| s.as_ref()), Some("4k camera"));
        assert!(params.get("flag").is_none());
    }

    #[test]
    fn test_percent_decode_dates() {
        let params = query_params("start_date=2025-01-10T00%3A00%3A00Z");
        assert_eq!(
            params.get("start_date").map(|s| s.as_ref()),
            Some("2025-01-10T00:00:00Z")
        );
    }
}
