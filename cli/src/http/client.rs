//! HTTP client implementation

use reqwest::{header, Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use api_client::models::ErrorResponse;

use crate::errors::CliError;

/// HTTP client for the platform API
pub struct HttpClient {
    client: Client,
    base_url: Url,
    token: SecretString,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, token: SecretString) -> Result<Self, CliError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("clever-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url.trim_end_matches('/'))?,
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from a path relative to the API root
    pub fn endpoint(&self, path: &str) -> Result<Url, CliError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}", base, path))?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            header::AUTHORIZATION,
            format!("Bearer {}", self.token.expose_secret()),
        )
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, CliError> {
        debug!("GET {}", url);
        let request = self.authorize(self.client.get(url));
        self.send(request).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, CliError> {
        debug!("POST {}", url);
        let request = self.authorize(self.client.post(url)).json(body);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, CliError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP request failed: {} - {}", status, body);
            return Err(api_error(status.as_u16(), &body));
        }

        Ok(response.json().await?)
    }
}

/// Build an API error, preferring the message of a JSON error body
pub fn api_error(status: u16, body: &str) -> CliError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string());

    CliError::ApiError { status, message }
}

/// Path prefix of the resources owned by an organisation or by the user
pub fn owner_path(owner_id: &str) -> String {
    if owner_id.starts_with("user_") {
        "/v2/self".to_string()
    } else {
        format!("/v2/organisations/{}", owner_id)
    }
}
