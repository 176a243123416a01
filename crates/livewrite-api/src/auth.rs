use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

const HEADER_PROJECT: &str = "x-appwrite-project";
const HEADER_KEY: &str = "x-appwrite-key";
const HEADER_SESSION: &str = "x-appwrite-session";
const HEADER_JWT: &str = "x-appwrite-jwt";
const HEADER_RESPONSE_FORMAT: &str = "x-appwrite-response-format";

/// Response format the models in [`crate::models`] are written against.
pub const RESPONSE_FORMAT: &str = "1.5.0";

/// Credentials for authenticating with the backend.
///
/// Each variant carries the secret material for its auth flow.
#[derive(Debug, Clone, Default)]
pub enum Credentials {
    /// No credential header. Requests run as the guest role, or as the
    /// session held in the cookie jar after [`create_email_password_session`].
    ///
    /// [`create_email_password_session`]: crate::AppwriteClient::create_email_password_session
    #[default]
    Anonymous,

    /// Server API key (`X-Appwrite-Key`).
    ApiKey(SecretString),

    /// Session secret (`X-Appwrite-Session`). Also sent to the realtime
    /// socket as an `authentication` frame.
    Session(SecretString),

    /// Short-lived account JWT (`X-Appwrite-JWT`).
    Jwt(SecretString),
}

impl Credentials {
    /// Session secret to forward to the realtime socket, if any.
    pub fn realtime_session(&self) -> Option<&SecretString> {
        match self {
            Self::Session(secret) => Some(secret),
            _ => None,
        }
    }

    fn header(&self) -> Option<(&'static str, &SecretString)> {
        match self {
            Self::Anonymous => None,
            Self::ApiKey(key) => Some((HEADER_KEY, key)),
            Self::Session(secret) => Some((HEADER_SESSION, secret)),
            Self::Jwt(token) => Some((HEADER_JWT, token)),
        }
    }
}

/// Build the default header set sent with every request.
pub(crate) fn default_headers(project: &str, credentials: &Credentials) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();

    let project_value = HeaderValue::from_str(project)
        .map_err(|e| Error::InvalidCredential(format!("invalid project id header value: {e}")))?;
    headers.insert(HeaderName::from_static(HEADER_PROJECT), project_value);
    headers.insert(
        HeaderName::from_static(HEADER_RESPONSE_FORMAT),
        HeaderValue::from_static(RESPONSE_FORMAT),
    );

    if let Some((name, secret)) = credentials.header() {
        let mut value = HeaderValue::from_str(secret.expose_secret())
            .map_err(|e| Error::InvalidCredential(format!("invalid {name} header value: {e}")))?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(name), value);
    }

    Ok(headers)
}
