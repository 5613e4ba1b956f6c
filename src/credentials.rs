use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted bearer token. The fetch client only reads it; the session
/// writes and clears it.
pub trait CredentialStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: &str) -> Result<(), CredentialError>;
    fn clear(&self) -> Result<(), CredentialError>;
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: Mutex::new(token.map(str::to_string)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.token.lock().expect("credentials poisoned").clone()
    }

    fn set_token(&self, token: &str) -> Result<(), CredentialError> {
        *self.token.lock().expect("credentials poisoned") = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.token.lock().expect("credentials poisoned") = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct CredentialsFile {
    access_token: String,
    saved_at: i64,
}

/// Token kept in `credentials.json` under the data directory.
pub struct FileCredentialStore {
    root: PathBuf,
}

impl FileCredentialStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path(&self) -> PathBuf {
        self.root.join(CREDENTIALS_FILE)
    }

    fn load(&self) -> Result<CredentialsFile, CredentialError> {
        let text = fs::read_to_string(self.path())?;
        Ok(serde_json::from_str(&text)?)
    }

    fn write_atomic(&self, data: &CredentialsFile) -> Result<(), CredentialError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path();
        let temp_path = path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(data)?;
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn token(&self) -> Option<String> {
        match self.load() {
            Ok(file) if !file.access_token.trim().is_empty() => Some(file.access_token),
            Ok(_) => None,
            Err(CredentialError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                log::warn!("ignoring unreadable credentials file: {err}");
                None
            }
        }
    }

    fn set_token(&self, token: &str) -> Result<(), CredentialError> {
        self.write_atomic(&CredentialsFile {
            access_token: token.to_string(),
            saved_at: chrono::Utc::now().timestamp(),
        })
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
