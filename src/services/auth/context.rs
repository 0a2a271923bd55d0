//! Inbound `X-Context-*` headers -> `RequestContext`.
//!
//! Pure function of the header map. Missing headers become defaults.
//! A malformed `X-Context-User-Id` is treated as absent, while a malformed
//! member-id list follows the fail-open rule of `parse_household_member_ids`.

use axum::http::HeaderMap;

use crate::services::auth::types::RequestContext;
use crate::services::headers::{
    HEADER_CONTEXT_HOUSEHOLD_ID, HEADER_CONTEXT_HOUSEHOLD_MEMBER_IDS, HEADER_CONTEXT_NODE_ID,
    HEADER_CONTEXT_USER_ID, parse_household_member_ids,
};

pub fn extract(headers: &HeaderMap) -> RequestContext {
    RequestContext {
        household_id: header_str(headers, HEADER_CONTEXT_HOUSEHOLD_ID).map(str::to_string),
        node_id: header_str(headers, HEADER_CONTEXT_NODE_ID).map(str::to_string),
        user_id: parse_user_id(header_str(headers, HEADER_CONTEXT_USER_ID)),
        household_member_ids: parse_household_member_ids(header_str(
            headers,
            HEADER_CONTEXT_HOUSEHOLD_MEMBER_IDS,
        )),
    }
}

/// Trimmed, non-empty, valid UTF-8 header value.
pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_user_id(raw: Option<&str>) -> Option<i64> {
    let raw = raw?;
    match raw.parse::<i64>() {
        Ok(user_id) => Some(user_id),
        Err(_) => {
            tracing::debug!("ignoring malformed {} header", HEADER_CONTEXT_USER_ID);
            None
        }
    }
}
