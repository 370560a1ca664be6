use axum::http::HeaderMap;
use serde::Serialize;

use crate::web::session::cookie_value;

pub const FLASH_COOKIE: &str = "VITALOG_FLASH";

/// One-shot message carried across a redirect in a short-lived cookie and
/// consumed by the next page load.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Flash {
    pub kind: String, // "error" | "success"
    pub message: String,
}

// Flash messages are our own fixed strings; '+' for space keeps the cookie
// value within the characters RFC 6265 allows.
fn encode(message: &str) -> String {
    message.replace(' ', "+")
}

fn decode(value: &str) -> String {
    value.replace('+', " ")
}

pub fn set_cookie(kind: &str, message: &str) -> String {
    format!(
        "{FLASH_COOKIE}={kind}:{}; Path=/; Max-Age=60",
        encode(message)
    )
}

pub fn clear_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/; Max-Age=0")
}

/// The pending flash, if the request carries one.
pub fn read(headers: &HeaderMap) -> Option<Flash> {
    let raw = cookie_value(headers, FLASH_COOKIE)?;
    let (kind, message) = raw.split_once(':')?;
    Some(Flash {
        kind: kind.to_string(),
        message: decode(message),
    })
}

/// True when the request carries a flash cookie, even a malformed one.
pub fn present(headers: &HeaderMap) -> bool {
    cookie_value(headers, FLASH_COOKIE).is_some()
}
