//! Blocking HTTP client for the Mesh API.
//!
//! One client per command invocation. Every request carries the bearer
//! token (when present) and is bounded by a fixed overall timeout; there
//! are no in-band retries — re-invoking the command is the retry story.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{
    DirectMessage, DmPage, ErrorBody, Pagination, RegisterKeyRequest, RegisteredKey,
    SendDmRequest, User,
};
use super::DmApi;
use crate::error::{Error, Result};

/// Fixed overall request deadline.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("mesh-cli/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the Mesh API.
pub struct ApiClient {
    base_url: String,
    http: reqwest::blocking::Client,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for `base_url`, authenticating with `token` when
    /// present.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Transport {
                op: "client_init",
                message: e.to_string(),
            })?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            http,
            token,
        })
    }

    /// Check that the API server is reachable.
    pub fn health(&self) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct Health {
            #[allow(dead_code)]
            status: String,
        }
        let _: Health = self.get("health", "/health")?;
        Ok(())
    }

    /// Fetch the authenticated user.
    pub fn get_status(&self) -> Result<User> {
        self.get("get_status", "/v1/auth/status")
    }

    /// Fetch a user by handle.
    pub fn get_user(&self, handle: &str) -> Result<User> {
        self.get("get_user", &format!("/v1/users/{handle}"))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get<T: DeserializeOwned>(&self, op: &'static str, path: &str) -> Result<T> {
        self.execute(op, self.http.get(self.url(path)))
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        op: &'static str,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(op, self.http.post(self.url(path)).json(body))
    }

    fn execute<T: DeserializeOwned>(
        &self,
        op: &'static str,
        mut request: reqwest::blocking::RequestBuilder,
    ) -> Result<T> {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| map_send_error(op, e))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| Error::Transport {
            op,
            message: format!("read response: {e}"),
        })?;

        if status >= 400 {
            return Err(map_error_body(op, status, &body));
        }

        serde_json::from_str(&body).map_err(|e| Error::UnexpectedResponse {
            op,
            message: e.to_string(),
        })
    }
}

impl DmApi for ApiClient {
    fn send_dm(&self, req: &SendDmRequest) -> Result<DirectMessage> {
        self.post("send_dm", "/v1/dms", req)
    }

    fn list_dms(&self, page: &Pagination) -> Result<DmPage> {
        let request = self
            .http
            .get(self.url("/v1/dms"))
            .query(&query_pairs(page));
        self.execute("list_dms", request)
    }

    fn register_dm_key(&self, req: &RegisterKeyRequest) -> Result<RegisteredKey> {
        self.post("register_dm_key", "/v1/dms/keys", req)
    }

    fn get_dm_key(&self, ident: &str) -> Result<RegisteredKey> {
        self.get("get_dm_key", &format!("/v1/dms/keys/{ident}"))
    }
}

fn query_pairs(page: &Pagination) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(limit) = page.limit {
        pairs.push(("limit", limit.to_string()));
    }
    if let Some(before) = &page.before {
        pairs.push(("before", before.clone()));
    }
    if let Some(after) = &page.after {
        pairs.push(("after", after.clone()));
    }
    pairs
}

fn map_send_error(op: &'static str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(op)
    } else {
        Error::Transport {
            op,
            message: err.to_string(),
        }
    }
}

/// Map a non-2xx response to a typed error.
///
/// Bodies matching the server's `{error, reason?}` shape keep the server's
/// code; anything else gets a synthetic `http_<status>` code with a body
/// excerpt, so an HTML error page from a proxy still surfaces usefully.
fn map_error_body(op: &'static str, status: u16, body: &str) -> Error {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.is_empty() => Error::Api {
            op,
            status,
            code: parsed.error.clone(),
            message: parsed.reason.unwrap_or(parsed.error),
        },
        _ => Error::Api {
            op,
            status,
            code: format!("http_{status}"),
            message: excerpt(body),
        },
    }
}

fn excerpt(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty body)".into();
    }
    let mut out: String = trimmed.chars().take(MAX).collect();
    if trimmed.chars().count() > MAX {
        out.push('…');
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_error_body_keeps_server_code() {
        let err = map_error_body(
            "get_dm_key",
            404,
            r#"{"error":"not_found","reason":"no key registered"}"#,
        );
        match err {
            Error::Api {
                op,
                status,
                code,
                message,
            } => {
                assert_eq!(op, "get_dm_key");
                assert_eq!(status, 404);
                assert_eq!(code, "not_found");
                assert_eq!(message, "no key registered");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_error_body_gets_synthetic_code() {
        let err = map_error_body("send_dm", 502, "<html>Bad Gateway</html>");
        match err {
            Error::Api { code, .. } => assert_eq!(code, "http_502"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn empty_error_body_gets_synthetic_code() {
        let err = map_error_body("send_dm", 500, "");
        match err {
            Error::Api { code, message, .. } => {
                assert_eq!(code, "http_500");
                assert_eq!(message, "(empty body)");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn pagination_pairs_skip_unset_fields() {
        let page = Pagination {
            limit: Some(20),
            before: None,
            after: Some("cur_123".into()),
        };
        let pairs = query_pairs(&page);
        assert_eq!(
            pairs,
            vec![("limit", "20".to_string()), ("after", "cur_123".to_string())]
        );
        assert!(query_pairs(&Pagination::default()).is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new("https://api.example.com/", None).unwrap();
        assert_eq!(client.url("/v1/dms"), "https://api.example.com/v1/dms");
    }
}
