//! Header names and encoding rules for app-to-app calls.
//!
//! Every service sharing the app-to-app contract must use these names
//! byte-for-byte. Lookups through `HeaderMap` are case-insensitive.

use std::collections::HashMap;

use crate::config::ConfigError;
use crate::services::auth::types::RequestContext;

pub const HEADER_APP_ID: &str = "X-Jarvis-App-Id";
pub const HEADER_APP_KEY: &str = "X-Jarvis-App-Key";
pub const HEADER_CONTEXT_HOUSEHOLD_ID: &str = "X-Context-Household-Id";
pub const HEADER_CONTEXT_NODE_ID: &str = "X-Context-Node-Id";
pub const HEADER_CONTEXT_USER_ID: &str = "X-Context-User-Id";
pub const HEADER_CONTEXT_HOUSEHOLD_MEMBER_IDS: &str = "X-Context-Household-Member-Ids";

pub const ENV_APP_ID: &str = "JARVIS_AUTH_APP_ID";
pub const ENV_APP_KEY: &str = "JARVIS_AUTH_APP_KEY";

/// Headers authenticating this service towards another one.
pub fn app_headers(app_id: &str, app_key: &str) -> HashMap<&'static str, String> {
    HashMap::from([
        (HEADER_APP_ID, app_id.to_string()),
        (HEADER_APP_KEY, app_key.to_string()),
    ])
}

/// Same as [`app_headers`], reading `JARVIS_AUTH_APP_ID` / `JARVIS_AUTH_APP_KEY`.
pub fn app_headers_from_env() -> Result<HashMap<&'static str, String>, ConfigError> {
    let app_id = std::env::var(ENV_APP_ID)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::Missing(ENV_APP_ID))?;
    let app_key = std::env::var(ENV_APP_KEY)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::Missing(ENV_APP_KEY))?;

    Ok(app_headers(&app_id, &app_key))
}

/// Encode a context for a downstream call. Absent or empty values produce no header.
pub fn build_context_headers(context: &RequestContext) -> HashMap<&'static str, String> {
    let mut headers = HashMap::new();

    if let Some(household_id) = context.household_id.as_deref().filter(|s| !s.is_empty()) {
        headers.insert(HEADER_CONTEXT_HOUSEHOLD_ID, household_id.to_string());
    }

    if let Some(node_id) = context.node_id.as_deref().filter(|s| !s.is_empty()) {
        headers.insert(HEADER_CONTEXT_NODE_ID, node_id.to_string());
    }

    if let Some(user_id) = context.user_id {
        headers.insert(HEADER_CONTEXT_USER_ID, user_id.to_string());
    }

    if !context.household_member_ids.is_empty() {
        headers.insert(
            HEADER_CONTEXT_HOUSEHOLD_MEMBER_IDS,
            encode_member_ids(&context.household_member_ids),
        );
    }

    headers
}

pub fn encode_member_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode `X-Context-Household-Member-Ids`.
///
/// Fail-open: a single malformed segment yields an empty list instead of an
/// error or a partial list. Empty segments (`"1,,2"`) are skipped.
pub fn parse_household_member_ids(raw: Option<&str>) -> Vec<i64> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Vec::new();
    };

    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::parse::<i64>)
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_default()
}

impl RequestContext {
    pub fn to_headers(&self) -> HashMap<&'static str, String> {
        build_context_headers(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_ids_round_trip() {
        for ids in [vec![], vec![0], vec![1, 2, 3], vec![42, 7, 9_000_000_000]] {
            let encoded = encode_member_ids(&ids);
            assert_eq!(parse_household_member_ids(Some(&encoded)), ids);
        }
    }

    #[test]
    fn absent_or_empty_member_ids_decode_to_empty() {
        assert!(parse_household_member_ids(None).is_empty());
        assert!(parse_household_member_ids(Some("")).is_empty());
        assert!(parse_household_member_ids(Some(" , ,")).is_empty());
    }

    #[test]
    fn member_ids_tolerate_whitespace_and_empty_segments() {
        assert_eq!(parse_household_member_ids(Some("1, 2,3")), vec![1, 2, 3]);
        assert_eq!(parse_household_member_ids(Some(" 4 ,,5, ")), vec![4, 5]);
    }

    // Fail-open on purpose: any bad segment drops the whole list.
    #[test]
    fn malformed_member_ids_yield_empty_not_partial() {
        assert!(parse_household_member_ids(Some("1,abc,3")).is_empty());
        assert!(parse_household_member_ids(Some("1,2.5")).is_empty());
        assert!(parse_household_member_ids(Some("99999999999999999999")).is_empty());
    }

    #[test]
    fn context_headers_omit_absent_values() {
        let headers = build_context_headers(&RequestContext::default());
        assert!(headers.is_empty());

        let headers = build_context_headers(&RequestContext {
            household_id: Some(String::new()),
            node_id: None,
            user_id: None,
            household_member_ids: vec![],
        });
        assert!(headers.is_empty());
    }

    #[test]
    fn context_headers_encode_every_field() {
        let context = RequestContext {
            household_id: Some("hh-1".into()),
            node_id: Some("kitchen".into()),
            user_id: Some(42),
            household_member_ids: vec![1, 2, 3],
        };

        let headers = context.to_headers();
        assert_eq!(headers[HEADER_CONTEXT_HOUSEHOLD_ID], "hh-1");
        assert_eq!(headers[HEADER_CONTEXT_NODE_ID], "kitchen");
        assert_eq!(headers[HEADER_CONTEXT_USER_ID], "42");
        assert_eq!(headers[HEADER_CONTEXT_HOUSEHOLD_MEMBER_IDS], "1,2,3");
    }

    #[test]
    fn user_id_zero_is_still_sent() {
        let context = RequestContext {
            user_id: Some(0),
            ..Default::default()
        };
        assert_eq!(context.to_headers()[HEADER_CONTEXT_USER_ID], "0");
    }

    #[test]
    fn app_headers_use_contract_names() {
        let headers = app_headers("svc", "key");
        assert_eq!(headers[HEADER_APP_ID], "svc");
        assert_eq!(headers[HEADER_APP_KEY], "key");
    }
}
