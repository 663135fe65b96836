// Session handshake
//
// Form login against `/j_security_check` sets the `JSESSIONID` cookie in
// the client's jar. Controllers from 19.2 on additionally require the
// XSRF token from `client/token` on every dataservice request.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::VmanageClient;
use crate::error::Error;

impl VmanageClient {
    /// Authenticate with username/password and fetch the XSRF token.
    ///
    /// The login endpoint answers HTTP 200 in both cases; a rejected login
    /// is recognised by the HTML login page in the reply body.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.root_url("/j_security_check")?;
        debug!("logging in at {url}");

        let resp = self
            .http()
            .post(url)
            .form(&[
                ("j_username", username),
                ("j_password", password.expose_secret()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status})"),
            });
        }
        if body.to_ascii_lowercase().contains("<html") {
            return Err(Error::Authentication {
                message: format!("controller rejected the credentials for {username}"),
            });
        }

        self.fetch_xsrf_token().await?;
        debug!("login successful");
        Ok(())
    }

    /// `GET client/token`. Older controllers don't have the endpoint, in
    /// which case requests go out without the header.
    async fn fetch_xsrf_token(&self) -> Result<(), Error> {
        let url = self.api_url("client/token")?;
        debug!("GET {url}");
        let resp = self.http().get(url).send().await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("controller has no token endpoint; continuing without XSRF token");
            self.set_xsrf_token(None);
            return Ok(());
        }
        if !resp.status().is_success() {
            return Err(Error::Authentication {
                message: format!("token request failed (HTTP {})", resp.status()),
            });
        }

        let token = resp.text().await?;
        let token = token.trim();
        if token.is_empty() || token.starts_with('<') {
            return Err(Error::Authentication {
                message: "session was not established (no XSRF token)".into(),
            });
        }
        self.set_xsrf_token(Some(token.to_owned()));
        Ok(())
    }

    /// End the current session.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.root_url("/logout?nocache=")?;
        debug!("logging out at {url}");
        let _resp = self.http().get(url).send().await?;
        self.set_xsrf_token(None);
        debug!("logout complete");
        Ok(())
    }
}
