use crate::inference::{describe_errors, ApiMessage};
use crate::models::{Credentials, Error, ModelDescriptor, Result};
use async_trait::async_trait;
use serde::Deserialize;

#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// List the models available to the account. One request, no retries.
    async fn fetch(&self, credentials: &Credentials) -> Result<Vec<ModelDescriptor>>;
}

#[derive(Debug, Deserialize)]
struct CatalogEnvelope {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    result: Vec<ModelDescriptor>,
}

/// Interpret the body of a model search response.
pub fn parse_catalog(status: u16, body: &str) -> Result<Vec<ModelDescriptor>> {
    if !(200..300).contains(&status) {
        return Err(Error::Auth {
            status,
            body: body.chars().take(200).collect(),
        });
    }

    let envelope: CatalogEnvelope = serde_json::from_str(body)
        .map_err(|e| Error::protocol(format!("failed to decode response: {e}"), body))?;

    if !envelope.success {
        let detail = describe_errors(&envelope.errors)
            .unwrap_or_else(|| "failed to fetch models".to_string());
        return Err(Error::Service(detail));
    }

    Ok(envelope.result)
}
