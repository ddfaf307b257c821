//! HTTP transport shared by the client and its create strategies

use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, Result};

/// Base URL, HTTP client and credentials for one API server
#[derive(Debug, Clone)]
pub struct Transport {
    base_url: String,
    client: Client,
    bearer_token: Option<String>,
    cookie: Option<String>,
}

impl Transport {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            bearer_token: None,
            cookie: None,
        }
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Session cookies sent along with every request
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Full URL for an absolute API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Starts a request carrying the configured credentials
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));

        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }

        builder
    }

    /// Sends a request and deserializes the JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.header(ACCEPT, "application/json").send().await?;
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Sends a request and returns the body as text
    pub async fn send_text(&self, builder: RequestBuilder) -> Result<String> {
        let response = builder.send().await?;
        let response = Self::check_status(response).await?;

        Ok(response.text().await?)
    }

    /// Sends a JSON document and returns the object the server stored
    pub async fn send_document(&self, builder: RequestBuilder, body: &Value) -> Result<Value> {
        self.send_json(builder.json(body)).await
    }

    /// Turns a non-success status into an error
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_trims_trailing_slash() {
        let transport = Transport::new("https://api.cluster.local:6443/", Client::new());
        assert_eq!(transport.base_url(), "https://api.cluster.local:6443");
        assert_eq!(
            transport.url("/api/v1"),
            "https://api.cluster.local:6443/api/v1"
        );
    }

    #[test]
    fn test_blank_credentials_are_ignored() {
        let transport = Transport::new("http://localhost:8001", Client::new())
            .with_bearer_token(Some("  ".to_string()))
            .with_cookie(Some(String::new()));

        assert!(transport.bearer_token.is_none());
        assert!(transport.cookie().is_none());
    }
}
