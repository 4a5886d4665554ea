//! Web-auth handshake
//!
//! Some deployments sit behind an HTTP gatekeeper that must be satisfied
//! before the host accepts traffic. When a `webauth` block is configured,
//! a cookie-backed form login runs before any SSH work; when absent the
//! step is skipped entirely.

use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::config::WebauthConfig;
use crate::error::{Error, Result};

/// What the handshake did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebauthOutcome {
    /// Login and probe both returned 200.
    Started,
    /// No `webauth` block in the configuration; nothing was attempted.
    NotConfigured,
}

/// Perform the two-step gatekeeper handshake.
///
/// An absent configuration is a no-op, not a failure. Any non-200 response
/// is fatal: [`Error::Login`] for the credential POST, [`Error::Webauth`]
/// for the follow-up probe.
pub async fn start_session(config: Option<&WebauthConfig>) -> Result<WebauthOutcome> {
    let Some(config) = config else {
        debug!("No webauth configured, skipping");
        return Ok(WebauthOutcome::NotConfigured);
    };

    let client = build_client(config.legacy_tls)?;

    info!("Logging in via {}", config.login_url);
    let response = client
        .post(&config.login_url)
        .query(&[("target", ""), ("auth_id", ""), ("ap_name", "")])
        .form(&[
            ("login", "login"),
            ("username", config.username.as_str()),
            ("password", config.password.as_str()),
        ])
        .send()
        .await?;
    if response.status() != StatusCode::OK {
        return Err(Error::Login(response.status().as_u16()));
    }

    // The probe rides on the session cookies issued by the login response.
    let response = client
        .post(&config.webauth_url)
        .form(&[
            ("rs", "is_lsys_image_exist"),
            ("rsargs[]", "root"),
            ("csrf_token", ""),
        ])
        .send()
        .await?;
    if response.status() != StatusCode::OK {
        return Err(Error::Webauth(response.status().as_u16()));
    }

    info!("Webauth session established");
    Ok(WebauthOutcome::Started)
}

fn build_client(legacy_tls: bool) -> Result<Client> {
    let mut builder = Client::builder().cookie_store(true);
    if legacy_tls {
        builder = builder
            .danger_accept_invalid_certs(true)
            .min_tls_version(reqwest::tls::Version::TLS_1_0);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::WebauthConfig;

    fn config_for(server: &MockServer) -> WebauthConfig {
        WebauthConfig {
            login_url: format!("{}/login", server.uri()),
            webauth_url: format!("{}/webauth", server.uri()),
            username: "op".to_string(),
            password: "hunter2".to_string(),
            legacy_tls: false,
        }
    }

    #[tokio::test]
    async fn absent_config_is_a_noop() {
        let outcome = start_session(None).await.unwrap();
        assert_eq!(outcome, WebauthOutcome::NotConfigured);
    }

    #[tokio::test]
    async fn successful_handshake() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_string_contains("username=op"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webauth"))
            .and(body_string_contains("rs=is_lsys_image_exist"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = start_session(Some(&config_for(&server))).await.unwrap();
        assert_eq!(outcome, WebauthOutcome::Started);
    }

    #[tokio::test]
    async fn non_200_login_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = start_session(Some(&config_for(&server))).await.unwrap_err();
        assert!(matches!(err, Error::Login(403)));
    }

    #[tokio::test]
    async fn non_200_probe_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webauth"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = start_session(Some(&config_for(&server))).await.unwrap_err();
        assert!(matches!(err, Error::Webauth(500)));
    }
}
