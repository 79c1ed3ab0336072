//! HTTPS registration of a switch with the gateway

use switchsim_core::{SwitchIdentity, SwitchRegistration};
use tracing::{debug, info};
use url::Url;

use crate::error::RegistrationError;

/// One-shot `POST /switch_register` client
///
/// Certificate verification is disabled: the gateway swaps in the switch's
/// own certificate after registration.
#[derive(Debug, Clone)]
pub struct RegistrationClient {
    http: reqwest::Client,
    register_url: Url,
}

impl RegistrationClient {
    pub fn new(register_url: Url) -> Result<Self, RegistrationError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(RegistrationError::ClientBuild)?;

        Ok(Self { http, register_url })
    }

    pub fn register_url(&self) -> &Url {
        &self.register_url
    }

    /// Register `identity`; only transport-level success is observed
    pub async fn register(&self, identity: &SwitchIdentity) -> Result<(), RegistrationError> {
        let body = serde_json::to_vec(&SwitchRegistration::for_switch(identity))?;

        info!("{}: Sending https request", identity);
        let response = self
            .http
            .post(self.register_url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(RegistrationError::Request)?;

        debug!("{}: registration answered with {}", identity, response.status());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_register_posts_serial_and_empty_crt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/switch_register"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"serial": "sw0", "crt": ""})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/switch_register", server.uri())).unwrap();
        let client = RegistrationClient::new(url).unwrap();

        client.register(&SwitchIdentity::new("sw0")).await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_still_counts_as_registered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/switch_register", server.uri())).unwrap();
        let client = RegistrationClient::new(url).unwrap();

        assert!(client.register(&SwitchIdentity::new("sw0")).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_gateway_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/switch_register", addr)).unwrap();
        let client = RegistrationClient::new(url).unwrap();

        let err = client.register(&SwitchIdentity::new("sw0")).await.unwrap_err();
        assert!(matches!(err, RegistrationError::Request(_)));
    }
}
