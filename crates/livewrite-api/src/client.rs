// HTTP client for the backend's REST API.
//
// Base path: {endpoint} (e.g. https://cloud.appwrite.io/v1)
// Auth: project header + one credential header, or session cookies.
// Endpoint groups (databases, storage, account) are inherent methods
// in sibling modules; this file only deals with transport mechanics.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::cookie::{CookieStore, Jar};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::{self, Credentials};
use crate::error::Error;
use crate::realtime::{ReconnectConfig, RealtimeHandle, RealtimeOptions};
use crate::transport::TransportConfig;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one backend project.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct AppwriteClient {
    http: reqwest::Client,
    endpoint: Url,
    project: String,
    credentials: Credentials,
    transport: TransportConfig,
    /// Cookie jar reference for forwarding the session to the realtime socket.
    cookie_jar: Option<Arc<Jar>>,
}

impl AppwriteClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `project` at `endpoint`.
    ///
    /// A cookie jar is always attached so email/password sessions created
    /// through [`create_email_password_session`](Self::create_email_password_session)
    /// persist across requests.
    pub fn new(
        endpoint: &str,
        project: impl Into<String>,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let project = project.into();
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let headers = auth::default_headers(&project, &credentials)?;
        let http = config.build_client_with_headers(headers)?;
        let endpoint = Self::normalize_endpoint(endpoint)?;
        let cookie_jar = config.cookie_jar.clone();

        Ok(Self {
            http,
            endpoint,
            project,
            credentials,
            transport: config,
            cookie_jar,
        })
    }

    /// Ensure the endpoint ends with `/` so relative joins keep its path.
    fn normalize_endpoint(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The REST endpoint, always with a trailing slash.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The project identifier sent with every request.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Session cookies for the endpoint, formatted as a `Cookie` header.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.endpoint)?;
        cookies.to_str().ok().map(String::from)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Join a relative path (e.g. `"account"`) onto the endpoint.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.endpoint.join(path.trim_start_matches('/'))?)
    }

    /// The realtime socket URL for a set of channels:
    /// `wss://{host}{path}/realtime?project={project}&channels[]={channel}...`
    pub fn realtime_url(&self, channels: &[String]) -> Result<Url, Error> {
        let mut url = self.url("realtime")?;
        let scheme = if self.endpoint.scheme() == "https" {
            "wss"
        } else {
            "ws"
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocketConnect(format!("cannot use {scheme} for {url}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("project", &self.project);
            for channel in channels {
                query.append_pair("channels[]", channel);
            }
        }
        Ok(url)
    }

    // ── Realtime ─────────────────────────────────────────────────────

    /// Open a realtime socket for `channels`.
    ///
    /// Returns immediately; the handshake happens on the spawned task and
    /// [`RealtimeHandle::connections`] reports when it completes.
    /// Dropping the returned handle closes the socket.
    pub fn subscribe(
        &self,
        channels: Vec<String>,
        reconnect: ReconnectConfig,
    ) -> Result<RealtimeHandle, Error> {
        let url = self.realtime_url(&channels)?;
        let options = RealtimeOptions {
            cookie: self.cookie_header(),
            session: self.credentials.realtime_session().cloned(),
            insecure: matches!(
                self.transport.tls,
                crate::transport::TlsMode::DangerAcceptInvalid
            ),
        };
        Ok(RealtimeHandle::connect(url, reconnect, options))
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.get_with_params(path, &[]).await
    }

    pub(crate) async fn get_bytes(&self, url: Url) -> Result<Bytes, Error> {
        debug!("GET {url} (bytes)");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.bytes().await?)
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok();

        let message = parsed
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.clone()
                }
            });

        if status == reqwest::StatusCode::UNAUTHORIZED && parsed.is_none() {
            return Error::Authentication { message };
        }

        Error::Api {
            status: status.as_u16(),
            message,
            kind: parsed.and_then(|e| e.kind),
        }
    }
}

/// Encode `queries[]` parameters the way the REST API expects them.
pub(crate) fn query_params(queries: &[String]) -> Vec<(&'static str, String)> {
    queries.iter().map(|q| ("queries[]", q.clone())).collect()
}
