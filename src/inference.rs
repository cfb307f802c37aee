use crate::history::HistoryBuffer;
use crate::models::{Credentials, Error, ModelDescriptor, Result, Turn};
use crate::selector::{TEXT_GENERATION, TEXT_TO_IMAGE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SYSTEM_PROMPT: &str = "You are a friendly assistant";

/// Which endpoint flavour a session talks to. Each modality knows how to build
/// its request body and which field of the response carries the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub fn capability(self) -> &'static str {
        match self {
            Modality::Text => TEXT_GENERATION,
            Modality::Image => TEXT_TO_IMAGE,
        }
    }

    /// Whether turns of this modality are kept in the history buffer.
    pub fn uses_history(self) -> bool {
        matches!(self, Modality::Text)
    }

    /// Text requests carry the system turn followed by the stored history.
    /// Image requests carry only the latest prompt.
    pub fn build_payload(self, history: &HistoryBuffer, latest: &str) -> Payload {
        match self {
            Modality::Text => {
                let mut messages = Vec::with_capacity(history.len() + 1);
                messages.push(Turn::system(SYSTEM_PROMPT));
                messages.extend(history.snapshot());
                Payload::Chat { messages }
            }
            Modality::Image => Payload::Prompt {
                prompt: latest.to_string(),
            },
        }
    }

    fn result_field(self) -> &'static str {
        match self {
            Modality::Text => "response",
            Modality::Image => "image",
        }
    }
}

/// JSON body of a single run request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Chat { messages: Vec<Turn> },
    Prompt { prompt: String },
}

impl Payload {
    pub fn modality(&self) -> Modality {
        match self {
            Payload::Chat { .. } => Modality::Text,
            Payload::Prompt { .. } => Modality::Image,
        }
    }
}

/// Decoded answer of a run request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Text(String),
    /// Base64 encoded image data.
    Image(String),
}

#[async_trait]
pub trait Inference: Send + Sync {
    /// Send one run request. Exactly one attempt is made.
    async fn send(
        &self,
        model: &ModelDescriptor,
        credentials: &Credentials,
        payload: &Payload,
    ) -> Result<Completion>;
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

pub(crate) fn describe_errors(errors: &[ApiMessage]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    let joined = errors
        .iter()
        .map(|e| match e.code {
            Some(code) => format!("{} (code {})", e.message, code),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ");
    Some(joined)
}

#[derive(Debug, Deserialize)]
struct RunEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    result: Option<Value>,
}

/// Interpret the body of a run response for the given modality.
pub fn parse_run_response(modality: Modality, status: u16, body: &str) -> Result<Completion> {
    if status == 401 || status == 403 {
        return Err(Error::Auth {
            status,
            body: body.chars().take(200).collect(),
        });
    }

    let envelope: RunEnvelope = serde_json::from_str(body)
        .map_err(|e| Error::protocol(format!("failed to parse JSON response: {e}"), body))?;

    let rejected = envelope.success == Some(false) || !(200..300).contains(&status);
    if rejected {
        let detail = describe_errors(&envelope.errors)
            .unwrap_or_else(|| format!("request failed with HTTP {status}"));
        return Err(Error::Service(detail));
    }

    let field = modality.result_field();
    let value = envelope
        .result
        .as_ref()
        .and_then(|result| result.get(field))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::protocol(format!("missing result.{field}"), body))?;

    Ok(match modality {
        Modality::Text => Completion::Text(value.to_string()),
        Modality::Image => Completion::Image(value.to_string()),
    })
}
