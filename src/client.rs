use crate::catalog::{parse_catalog, ModelCatalog};
use crate::config::Settings;
use crate::inference::{parse_run_response, Completion, Inference, Payload};
use crate::models::{Credentials, Error, ModelDescriptor, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

/// HTTP transport for the Workers AI REST endpoints.
pub struct WorkersAiClient {
    client: reqwest::Client,
    base_url: String,
}

impl WorkersAiClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.api_base_url.clone(), settings.request_timeout)
    }

    pub fn models_url(&self, credentials: &Credentials) -> String {
        format!(
            "{}/accounts/{}/ai/models/search",
            self.base_url, credentials.account_id
        )
    }

    pub fn run_url(&self, credentials: &Credentials, model_name: &str) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url, credentials.account_id, model_name
        )
    }

    fn headers(credentials: &Credentials) -> Result<HeaderMap> {
        credentials.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", credentials.token))
                .map_err(|_| Error::Config("Invalid API token format".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl ModelCatalog for WorkersAiClient {
    async fn fetch(&self, credentials: &Credentials) -> Result<Vec<ModelDescriptor>> {
        let headers = Self::headers(credentials)?;
        let url = self.models_url(credentials);
        tracing::debug!(%url, "fetching model catalog");

        let response = self.client.get(&url).headers(headers).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(status, bytes = body.len(), "model catalog response");

        let models = parse_catalog(status, &body)?;
        tracing::info!(count = models.len(), "model catalog fetched");
        Ok(models)
    }
}

#[async_trait]
impl Inference for WorkersAiClient {
    async fn send(
        &self,
        model: &ModelDescriptor,
        credentials: &Credentials,
        payload: &Payload,
    ) -> Result<Completion> {
        let headers = Self::headers(credentials)?;
        let url = self.run_url(credentials, &model.name);
        tracing::debug!(%url, modality = ?payload.modality(), "sending run request");

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(payload)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(status, bytes = body.len(), "run response");

        parse_run_response(payload.modality(), status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_account_scoped_layout() {
        let client = WorkersAiClient::new("https://api.example.com/client/v4/", None).unwrap();
        let creds = Credentials::new("acct", "tok");

        assert_eq!(
            client.models_url(&creds),
            "https://api.example.com/client/v4/accounts/acct/ai/models/search"
        );
        assert_eq!(
            client.run_url(&creds, "@cf/meta/llama-3-8b-instruct"),
            "https://api.example.com/client/v4/accounts/acct/ai/run/@cf/meta/llama-3-8b-instruct"
        );
    }

    #[test]
    fn headers_carry_bearer_token() {
        let headers = WorkersAiClient::headers(&Credentials::new("acct", "tok")).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn headers_require_credentials() {
        let err = WorkersAiClient::headers(&Credentials::new("acct", "")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
