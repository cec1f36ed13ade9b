// Async HTTP client for the tailon REST API.
//
// Base path: /api/v1/
// Auth: none at this layer (identity is resolved by the server's network layer)

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::models::{ActionResponse, ApplicationResponse, User};
use crate::stream::{LogStreamHandle, ReconnectConfig};
use crate::transport::TransportConfig;

const API_PREFIX: &str = "/api/v1";

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the tailon process manager.
///
/// Cheap to clone; both inner `reqwest::Client`s share connection pools.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    /// Client without an overall request timeout, for event streams.
    stream_http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a server root URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            stream_http: transport.build_stream_client()?,
            base_url: Self::normalize_base_url(base_url)?,
        })
    }

    /// Wrap an existing `reqwest::Client` for both request and stream traffic.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            stream_http: http.clone(),
            http,
            base_url: Self::normalize_base_url(base_url)?,
        })
    }

    /// Append `/api/v1/` unless the caller already pointed at it.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with(API_PREFIX) {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}{API_PREFIX}/"));
        }

        Ok(url)
    }

    /// The normalized API base (always ends with `/api/v1/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append percent-encoded path segments onto the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("POST {url}");
        let resp = self.http.post(url).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    #[allow(clippy::unused_self)]
    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = match body.trim() {
                "" => status.canonical_reason().unwrap_or("request failed").to_owned(),
                text => text.to_owned(),
            };
            return Err(Error::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    // ── Applications ─────────────────────────────────────────────────

    /// Fetch the full snapshot: application name → state.
    pub async fn list_applications(
        &self,
    ) -> Result<BTreeMap<String, ApplicationResponse>, Error> {
        self.get(self.url(&["apps"])?).await
    }

    /// Fetch a single application.
    pub async fn get_application(&self, name: &str) -> Result<ApplicationResponse, Error> {
        self.get(self.url(&["apps", name])?).await
    }

    pub async fn start_application(&self, name: &str) -> Result<ActionResponse, Error> {
        self.post(self.url(&["apps", name, "start"])?).await
    }

    /// Stop an application. `force` kills instead of signalling gracefully.
    pub async fn stop_application(&self, name: &str, force: bool) -> Result<ActionResponse, Error> {
        let mut url = self.url(&["apps", name, "stop"])?;
        if force {
            url.query_pairs_mut().append_pair("force", "true");
        }
        self.post(url).await
    }

    pub async fn restart_application(&self, name: &str) -> Result<ActionResponse, Error> {
        self.post(self.url(&["apps", name, "restart"])?).await
    }

    // ── Identity ─────────────────────────────────────────────────────

    /// The identity the server resolved for this client.
    pub async fn whoami(&self) -> Result<User, Error> {
        self.get(self.url(&["whoami"])?).await
    }

    // ── Log streams ──────────────────────────────────────────────────

    /// URL of the server-sent event stream for one application.
    pub fn log_stream_url(&self, name: &str) -> Result<Url, Error> {
        let mut url = self.url(&["apps", name, "logs"])?;
        url.query_pairs_mut().append_pair("stream", "true");
        Ok(url)
    }

    /// Open the log event stream for `name`.
    ///
    /// Spawns the reconnecting reader on the current tokio runtime; the
    /// returned handle cancels it when closed or dropped.
    pub fn open_log_stream(
        &self,
        name: &str,
        reconnect: ReconnectConfig,
    ) -> Result<LogStreamHandle, Error> {
        let url = self.log_stream_url(name)?;
        Ok(LogStreamHandle::connect(
            self.stream_http.clone(),
            url,
            reconnect,
            CancellationToken::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::from_reqwest(base, reqwest::Client::new()).expect("valid base url")
    }

    #[test]
    fn base_url_gains_api_prefix() {
        assert_eq!(
            client("http://localhost:8080").base_url().as_str(),
            "http://localhost:8080/api/v1/"
        );
        assert_eq!(
            client("http://localhost:8080/").base_url().as_str(),
            "http://localhost:8080/api/v1/"
        );
    }

    #[test]
    fn base_url_keeps_existing_prefix() {
        assert_eq!(
            client("https://host/tailon/api/v1").base_url().as_str(),
            "https://host/tailon/api/v1/"
        );
    }

    #[test]
    fn app_names_are_percent_encoded() {
        let url = client("http://h").url(&["apps", "my app/1", "start"]).expect("url");
        assert_eq!(url.as_str(), "http://h/api/v1/apps/my%20app%2F1/start");
    }

    #[test]
    fn log_stream_url_requests_streaming() {
        let url = client("http://h").log_stream_url("web").expect("url");
        assert_eq!(url.as_str(), "http://h/api/v1/apps/web/logs?stream=true");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::from_reqwest("not a url", reqwest::Client::new()),
            Err(Error::InvalidUrl(_))
        ));
    }
}
