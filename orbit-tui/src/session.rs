use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::storage::{MemoryStorageAdapter, StorageAdapter};
use orbit_types::Role;

/// Storage keys shared with the web client's local storage layout.
pub const TOKEN_KEY: &str = "authToken";
pub const ROLE_KEY: &str = "userRole";
pub const USERNAME_KEY: &str = "username";

/// Manages the session file in the user's home directory.
///
/// Entries are stored as a JSON object in `~/.orbit/session.json` with 0600
/// permissions so only the owner can read the token.
#[derive(Debug, Clone)]
pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    /// Creates a SessionStore with the default path `~/.orbit/session.json`.
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(Self::at(home_dir.join(".orbit").join("session.json")))
    }

    pub fn at(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    /// Loads all stored entries.
    ///
    /// A missing file yields an empty map. A file that is not a JSON object of
    /// strings is treated as corrupted and also yields an empty map.
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.file_path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.file_path).context("Failed to read session file")?;

        if content.trim().is_empty() {
            log::warn!("Session file is empty, treating as no session");
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str::<BTreeMap<String, String>>(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                log::warn!("Session file is corrupted ({}), treating as no session", e);
                Ok(BTreeMap::new())
            }
        }
    }

    /// Writes all entries atomically (temp file + rename) with 0600 permissions.
    pub fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).context("Failed to create .orbit directory")?;
        }

        let json = serde_json::to_string_pretty(entries).context("Failed to serialize session")?;
        let temp_path = self.file_path.with_extension("json.tmp");

        let mut file =
            fs::File::create(&temp_path).context("Failed to create temporary session file")?;
        file.write_all(json.as_bytes())
            .context("Failed to write session file")?;
        file.sync_all()
            .context("Failed to sync session file to disk")?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))
                .context("Failed to set session file permissions")?;
        }

        fs::rename(&temp_path, &self.file_path)
            .context("Failed to rename temporary session file")?;

        log::debug!("Saved session to {}", self.file_path.display());
        Ok(())
    }

    /// Deletes the session file. Succeeds if the file does not exist.
    pub fn delete(&self) -> Result<()> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path).context("Failed to delete session file")?;
            log::info!("Deleted session file at {}", self.file_path.display());
        }
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }
}

/// Explicit session handle passed to the API client and screens.
///
/// Holds token, role and username in an injectable storage adapter. Storage
/// read failures are logged and treated as "not set".
#[derive(Clone)]
pub struct SessionContext {
    storage: Arc<dyn StorageAdapter>,
}

impl SessionContext {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorageAdapter::new()))
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                log::warn!("Failed to read {} from session storage: {}", key, e);
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.read(TOKEN_KEY)
    }

    pub fn role(&self) -> Option<Role> {
        self.read(ROLE_KEY).as_deref().and_then(Role::parse)
    }

    pub fn username(&self) -> Option<String> {
        self.read(USERNAME_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Persist a fresh login.
    pub fn store_login(&self, token: &str, role: Role, username: &str) -> Result<()> {
        self.storage.set(TOKEN_KEY, token)?;
        self.sync_identity(role, username)
    }

    /// Overwrite role and username with the server's current view of the account.
    pub fn sync_identity(&self, role: Role, username: &str) -> Result<()> {
        self.storage.set(ROLE_KEY, role.as_str())?;
        self.storage.set(USERNAME_KEY, username)
    }

    /// Remove token, role and username. All three are attempted even when
    /// one fails.
    pub fn clear(&self) -> Result<()> {
        self.storage.remove_all(&[TOKEN_KEY, ROLE_KEY, USERNAME_KEY])?;
        log::info!("Session cleared");
        Ok(())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
