use crate::models::{Credentials, Error, Result};
use crate::session::FailurePolicy;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_IMAGE_OUTPUT: &str = "generated_image.png";
pub const CREDENTIALS_FILE_NAME: &str = ".aiCFtoken.json";
pub const DEFAULT_LOG_FILTER: &str = "cfai_chat=warn";
pub const TOKEN_HELP_URL: &str = "https://dash.cloudflare.com/profile/api-tokens";

/// Runtime settings, read from the environment (and `.env`) once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub credentials_file: PathBuf,
    pub request_timeout: Option<Duration>,
    pub image_output: PathBuf,
    pub failure_policy: FailurePolicy,
    pub env_credentials: Option<Credentials>,
    pub log_filter: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_base_url = get("CFAI_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let credentials_file = match get("CFAI_CREDENTIALS_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_credentials_file(),
        };

        let request_timeout = match get("CFAI_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    Error::Config(format!("CFAI_REQUEST_TIMEOUT_SECS must be whole seconds, got '{raw}'"))
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let image_output = PathBuf::from(
            get("CFAI_IMAGE_OUTPUT").unwrap_or_else(|| DEFAULT_IMAGE_OUTPUT.to_string()),
        );

        let failure_policy = if get("CFAI_FAIL_FAST").is_some_and(|v| is_truthy(&v)) {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        };

        let env_credentials = match (get("CLOUDFLARE_ACCOUNT_ID"), get("CLOUDFLARE_API_TOKEN")) {
            (Some(account_id), Some(token)) => Some(Credentials::new(account_id, token)),
            _ => None,
        };

        let log_filter = get("CFAI_LOG")
            .or_else(|| get("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            api_base_url,
            credentials_file,
            request_timeout,
            image_output,
            failure_policy,
            env_credentials,
            log_filter,
        })
    }
}

fn default_credentials_file() -> PathBuf {
    dirs::home_dir()
        .map(|mut path| {
            path.push(CREDENTIALS_FILE_NAME);
            path
        })
        .unwrap_or_else(|| CREDENTIALS_FILE_NAME.into())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
