use crate::models::{Credentials, Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub trait CredentialStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Credentials>>;

    fn save(&self, credentials: &Credentials) -> Result<()>;
}

/// Credentials kept as `{"account_id": ..., "token": ...}` in a local JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let credentials: Credentials = serde_json::from_str(&data).map_err(|e| {
            Error::Config(format!(
                "credentials file {} is not valid JSON: {e}",
                self.path.display()
            ))
        })?;

        tracing::debug!(path = %self.path.display(), "credentials loaded");
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        credentials.validate()?;

        let data = serde_json::to_string(credentials)
            .map_err(|e| Error::Config(format!("failed to encode credentials: {e}")))?;
        fs::write(&self.path, data)?;
        restrict_permissions(&self.path)?;

        tracing::info!(path = %self.path.display(), "credentials saved");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
