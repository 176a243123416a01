// Account endpoints
//
// The current user plus email/password session management. Sessions
// created here land in the client's cookie jar, so subsequent requests
// and realtime sockets run as that user.

use serde_json::json;
use tracing::debug;

use crate::client::AppwriteClient;
use crate::error::Error;
use crate::models::{Session, User};

impl AppwriteClient {
    /// The currently authenticated user.
    ///
    /// `GET /account`
    pub async fn get_account(&self) -> Result<User, Error> {
        debug!("getting account");
        self.get("account").await
    }

    /// Log in with email and password.
    ///
    /// `POST /account/sessions/email`
    pub async fn create_email_password_session(
        &self,
        email: &str,
        password: &secrecy::SecretString,
    ) -> Result<Session, Error> {
        use secrecy::ExposeSecret;

        debug!(email, "creating email session");
        self.post(
            "account/sessions/email",
            &json!({
                "email": email,
                "password": password.expose_secret(),
            }),
        )
        .await
    }

    /// Delete a session. Pass `"current"` to log out.
    ///
    /// `DELETE /account/sessions/{session}`
    pub async fn delete_session(&self, session_id: &str) -> Result<(), Error> {
        debug!(session_id, "deleting session");
        self.delete(&format!("account/sessions/{session_id}")).await
    }
}
