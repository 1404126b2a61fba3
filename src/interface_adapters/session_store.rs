use crate::domain::{SessionKey, SessionStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

// In-memory session store adapter; values live as long as the process.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    pub values: Arc<Mutex<HashMap<SessionKey, String>>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, String> {
        let values = self.values.lock().await;
        Ok(values.get(&key).cloned())
    }

    async fn set(&self, key: SessionKey, value: String) -> Result<(), String> {
        let mut values = self.values.lock().await;
        values.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: SessionKey) -> Result<bool, String> {
        let mut values = self.values.lock().await;
        Ok(values.remove(&key).is_some())
    }
}

// On-disk layout of the session file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl SessionFile {
    fn slot(&mut self, key: SessionKey) -> &mut Option<String> {
        match key {
            SessionKey::Access => &mut self.access,
            SessionKey::Refresh => &mut self.refresh,
            SessionKey::Email => &mut self.email,
        }
    }
}

// Why a session file could not be loaded.
#[derive(Debug, thiserror::Error)]
enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Corrupt {
        path: String,
        source: toml::de::Error,
    },
}

/// Durable session store backed by a TOML file.
///
/// The file is read on every access and replaced on every change so that values
/// survive restarts. A missing file reads as an empty session. On unix the file
/// is only readable by its owner.
#[derive(Clone)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Arc<Mutex<()>>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    async fn load(&self) -> Result<SessionFile, LoadError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => toml::from_str(&text).map_err(|source| LoadError::Corrupt {
                path: self.path.display().to_string(),
                source,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(SessionFile::default()),
            Err(source) => Err(LoadError::Read {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }

    async fn save(&self, file: &SessionFile) -> Result<(), String> {
        let text = toml::to_string(file).map_err(|err| format!("failed to encode session: {err}"))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| format!("failed to create {}: {err}", parent.display()))?;
        }

        // Write a sibling file first and rename it over the session, so a crash
        // mid-write never leaves a truncated session behind.
        let staging = self.staging_path();
        write_private(&staging, text.as_bytes())
            .await
            .map_err(|err| format!("failed to write {}: {err}", staging.display()))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|err| format!("failed to replace {}: {err}", self.path.display()))
    }

    // Drops an unreadable session file so sign-out can always succeed.
    async fn discard(&self) -> Result<(), String> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(format!("failed to remove {}: {err}", self.path.display())),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    // A leftover staging file keeps its old mode, so tighten it explicitly.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }
    file.write_all(bytes).await?;
    file.sync_all().await
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, String> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await.map_err(|err| err.to_string())?;
        Ok(file.slot(key).take())
    }

    async fn set(&self, key: SessionKey, value: String) -> Result<(), String> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await.map_err(|err| err.to_string())?;
        *file.slot(key) = Some(value);
        self.save(&file).await
    }

    async fn remove(&self, key: SessionKey) -> Result<bool, String> {
        let _guard = self.lock.lock().await;
        let mut file = match self.load().await {
            Ok(file) => file,
            Err(err @ LoadError::Corrupt { .. }) => {
                // Nothing in the file can be trusted; forgetting it removes the key too.
                tracing::warn!(error = %err, "discarding unreadable session file.");
                self.discard().await?;
                return Ok(true);
            }
            Err(err) => return Err(err.to_string()),
        };

        let removed = file.slot(key).take().is_some();
        if removed {
            self.save(&file).await?;
        }
        Ok(removed)
    }
}
