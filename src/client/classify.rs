//! Response classification.
//!
//! | Status     | Result                         |
//! |------------|--------------------------------|
//! | 401, 403   | [`Error::Auth`]                |
//! | 404        | [`Error::NotFound`]            |
//! | 429        | [`Error::RateLimit`]           |
//! | 500-599    | [`Error::Server`]              |
//! | other 4xx+ | [`Error::Request`]             |
//! | 204        | [`Payload::NoContent`]         |
//! | other      | [`Payload::Json`] or [`Error::Protocol`] |

use serde_json::Value;

use super::retry_after::parse_retry_after;
use crate::{Error, Result};

/// Successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    NoContent,
}

/// Map a status, its `Retry-After` header and body to a payload or a typed error.
pub fn classify(status: u16, retry_after: Option<&str>, body: &str) -> Result<Payload> {
    let body = body.trim();
    match status {
        401 | 403 => Err(Error::auth(format!(
            "Unauthorized response {}: {}",
            status, body
        ))),
        404 => Err(Error::not_found(body)),
        429 => Err(Error::RateLimit {
            retry_after: parse_retry_after(retry_after),
        }),
        500..=599 => Err(Error::Server {
            status,
            message: body.to_string(),
            retry_after: parse_retry_after(retry_after),
        }),
        400.. => Err(Error::Request {
            status,
            message: body.to_string(),
        }),
        204 => Ok(Payload::NoContent),
        _ => serde_json::from_str(body)
            .map(Payload::Json)
            .map_err(|e| Error::Protocol(format!("HTTP {} body is not JSON: {}", status, e))),
    }
}
