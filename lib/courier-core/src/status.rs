//! Standard reason phrases for HTTP status codes.

use http::StatusCode;

/// Returns the lower-case reason phrase for a status code.
///
/// Registered codes use the canonical phrase from [`http::StatusCode`]
/// (`403` gives `"forbidden"`). Unregistered codes fall back to the phrase
/// of their class.
///
/// # Example
///
/// ```
/// use courier_core::status::reason_phrase;
///
/// assert_eq!(reason_phrase(403), "forbidden");
/// assert_eq!(reason_phrase(599), "server error");
/// ```
#[must_use]
pub fn reason_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map_or_else(|| class_phrase(status).to_string(), str::to_lowercase)
}

const fn class_phrase(status: u16) -> &'static str {
    match status {
        100..=199 => "informational",
        200..=299 => "success",
        300..=399 => "redirected",
        400..=499 => "client error",
        500..=599 => "server error",
        _ => "unknown",
    }
}

/// Returns `true` if `status` is in the success range `200..300`.
#[must_use]
pub const fn is_success(status: u16) -> bool {
    status >= 200 && status < 300
}

/// Returns `true` if `status` can appear on an HTTP status line.
#[must_use]
pub const fn is_valid(status: u16) -> bool {
    status >= 100 && status <= 999
}
