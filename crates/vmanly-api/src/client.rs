// Dataservice HTTP client
//
// Wraps `reqwest::Client` with controller URL construction, XSRF token
// handling, `{ data: [...] }` envelope unwrapping and error mapping.
// Endpoint groups (lists, definitions, policies, templates, actions) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{DataEnvelope, ErrorEnvelope};
use crate::transport::TransportConfig;

const XSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Raw HTTP client for the controller's `/dataservice/` API.
///
/// Every request carries the session cookie from the jar and, once the
/// login handshake fetched one, the XSRF token header. Listing methods
/// return the unwrapped `data` payload.
pub struct VmanageClient {
    http: reqwest::Client,
    base_url: Url,
    xsrf_token: Mutex<Option<String>>,
}

impl VmanageClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (the session lives in the `JSESSIONID` cookie). The
    /// `base_url` is the controller root, e.g. `https://vmanage:8443`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            xsrf_token: Mutex::new(None),
        }
    }

    /// The underlying HTTP client (for the login handshake).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── XSRF token management ─────────────────────────────────────────

    pub(crate) fn set_xsrf_token(&self, token: Option<String>) {
        trace!(present = token.is_some(), "storing XSRF token");
        *self
            .xsrf_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Whether the login handshake produced an XSRF token.
    pub fn has_xsrf_token(&self) -> bool {
        self.xsrf_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn apply_xsrf(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self
            .xsrf_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_deref() {
            Some(token) => builder.header(XSRF_HEADER, token),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a URL relative to the controller root (`/j_security_check`,
    /// `/logout`).
    pub(crate) fn root_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// Build a dataservice URL: `{base}/dataservice/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/dataservice/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET a dataservice path and return the parsed JSON body.
    pub async fn get_json(&self, path: &str) -> Result<Value, Error> {
        let url = self.api_url(path)?;
        debug!("GET {url}");
        let resp = self.apply_xsrf(self.http.get(url)).send().await?;
        self.handle_response(resp).await
    }

    /// GET a listing and unwrap the `{ data: [...] }` envelope.
    pub async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, Error> {
        let body = self.get_json(path).await?;
        decode::<DataEnvelope<T>>(&body).map(|envelope| envelope.data)
    }

    /// POST a JSON body to a dataservice path.
    pub async fn post_json(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Value, Error> {
        let url = self.api_url(path)?;
        debug!("POST {url}");
        let resp = self
            .apply_xsrf(self.http.post(url).json(body))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// PUT a JSON body to a dataservice path.
    pub async fn put_json(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Value, Error> {
        let url = self.api_url(path)?;
        debug!("PUT {url}");
        let resp = self
            .apply_xsrf(self.http.put(url).json(body))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// DELETE a dataservice path.
    pub async fn delete(&self, path: &str) -> Result<Value, Error> {
        let url = self.api_url(path)?;
        debug!("DELETE {url}");
        let resp = self.apply_xsrf(self.http.delete(url)).send().await?;
        self.handle_response(resp).await
    }

    /// Map a response to its JSON body or a typed error.
    ///
    /// Empty bodies decode to `Value::Null`. The controller answers an
    /// expired session with its HTML login page and HTTP 200, so an HTML
    /// body is reported as an authentication failure.
    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "session expired or invalid credentials".into(),
            });
        }

        let body = resp.text().await?;

        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &body));
        }

        let trimmed = body.trim_start();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        if trimmed.starts_with('<') {
            return Err(Error::Authentication {
                message: "session expired (controller returned its login page)".into(),
            });
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;

        // Some endpoints report failures as an `error` object with HTTP 200.
        if value.get("error").is_some_and(Value::is_object) {
            return Err(parse_error(status.as_u16(), &body));
        }

        Ok(value)
    }
}

/// Build an `Error::Api` from an error body, falling back to a preview of
/// the raw text when it isn't the usual `{"error": {...}}` shape.
fn parse_error(status: u16, body: &str) -> Error {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error: Some(err) }) => Error::Api {
            status,
            message: err
                .message
                .unwrap_or_else(|| format!("HTTP {status}")),
            details: err.details,
            code: err.code,
        },
        _ => {
            let preview = preview(body);
            Error::Api {
                status,
                message: if preview.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {preview}")
                },
                details: None,
                code: None,
            }
        }
    }
}

/// The first 200 characters of a body, for error messages.
fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Decode an already-parsed body into a typed payload.
pub(crate) fn decode<T: DeserializeOwned>(body: &Value) -> Result<T, Error> {
    T::deserialize(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> VmanageClient {
        VmanageClient::with_client(reqwest::Client::new(), base.parse().unwrap())
    }

    #[test]
    fn api_url_joins_dataservice_prefix() {
        let c = client("https://vmanage.example.com:8443/");
        assert_eq!(
            c.api_url("template/policy/list").unwrap().as_str(),
            "https://vmanage.example.com:8443/dataservice/template/policy/list"
        );
        assert_eq!(
            c.api_url("/device/action/status/abc").unwrap().as_str(),
            "https://vmanage.example.com:8443/dataservice/device/action/status/abc"
        );
    }

    #[test]
    fn parse_error_reads_envelope() {
        let err = parse_error(
            400,
            r#"{"error":{"message":"Failed to create","details":"duplicate name","code":"POLICY0003"}}"#,
        );
        match err {
            Error::Api {
                status,
                message,
                details,
                code,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Failed to create");
                assert_eq!(details.as_deref(), Some("duplicate name"));
                assert_eq!(code.as_deref(), Some("POLICY0003"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_error_falls_back_to_body_preview() {
        let err = parse_error(502, "Bad Gateway");
        assert!(matches!(err, Error::Api { status: 502, ref message, .. } if message == "HTTP 502: Bad Gateway"));
    }
}
