use rustyline::error::ReadlineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account id and API token sent with every request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub account_id: String,
    pub token: String,
}

impl Credentials {
    pub fn new(account_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            token: token.into(),
        }
    }

    /// Both fields must be non-empty before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.account_id.trim().is_empty() || self.token.trim().is_empty() {
            return Err(Error::Config(
                "account id and API token cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// Keep the token out of logs and panics.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("token", &"<hidden>")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawTask {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawModel {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    task: RawTask,
}

/// One entry of the account's model catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawModel")]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub capability: String,
}

impl From<RawModel> for ModelDescriptor {
    fn from(raw: RawModel) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            capability: raw.task.name,
        }
    }
}

impl ModelDescriptor {
    /// Last path segment of the model name, e.g. `llama-3-8b-instruct` for
    /// `@cf/meta/llama-3-8b-instruct`.
    pub fn base_name(&self) -> &str {
        let trimmed = self.name.trim().trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication rejected (HTTP {status}): {body}")]
    Auth { status: u16, body: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected response payload: {reason}\nRaw Response: {raw}")]
    Protocol { reason: String, raw: String },
    #[error("Service reported failure: {0}")]
    Service(String),
    #[error("No models with the '{0}' capability available")]
    NoCapableModel(String),
    #[error("Session ended by user")]
    UserExit,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Terminal error: {0}")]
    Terminal(String),
    #[error("Readline error: {0}")]
    Readline(String),
    #[error("Failed to decode base64 image: {0}")]
    Image(#[from] base64::DecodeError),
}

impl Error {
    /// Errors after which no further request can succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Auth { .. } | Error::Config(_) | Error::UserExit)
    }

    pub(crate) fn protocol(reason: impl fmt::Display, raw: &str) -> Self {
        const MAX_RAW: usize = 2048;
        let raw = if raw.len() > MAX_RAW {
            let mut end = MAX_RAW;
            while !raw.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &raw[..end])
        } else {
            raw.to_string()
        };
        Error::Protocol {
            reason: reason.to_string(),
            raw,
        }
    }
}

impl From<ReadlineError> for Error {
    fn from(err: ReadlineError) -> Self {
        match err {
            ReadlineError::Eof | ReadlineError::Interrupted => Error::UserExit,
            other => Error::Readline(other.to_string()),
        }
    }
}

impl From<clearscreen::Error> for Error {
    fn from(err: clearscreen::Error) -> Self {
        Error::Terminal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
