use crate::common::StoredToken;
use crate::error::AuthError;
use chrono::{Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};

const EXPIRY_BUFFER: Duration = Duration::minutes(5);

/// JSON token cache at a caller-chosen path.
pub struct TokenStore {
    token_path: PathBuf,
}

impl TokenStore {
    pub fn new(token_path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let token_path = token_path.into();

        if let Some(parent) = token_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    AuthError::TokenStorage(format!("Failed to create cache directory: {}", e))
                })?;
            }
        }

        Ok(Self { token_path })
    }

    /// `<cache dir>/picago/token.json`
    pub fn default_path() -> Result<PathBuf, AuthError> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| AuthError::Configuration("Could not find cache directory".to_string()))?
            .join("picago");
        Ok(cache_dir.join("token.json"))
    }

    pub fn path(&self) -> &Path {
        &self.token_path
    }

    pub fn save_token(&self, token: &StoredToken) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(token)?;

        fs::write(&self.token_path, json)
            .map_err(|e| AuthError::TokenStorage(format!("Failed to save token: {}", e)))?;

        // Set permissions to 0600 (read/write for owner only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.token_path)
                .map_err(|e| {
                    AuthError::TokenStorage(format!("Failed to get file permissions: {}", e))
                })?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.token_path, perms).map_err(|e| {
                AuthError::TokenStorage(format!("Failed to set file permissions: {}", e))
            })?;
        }

        tracing::debug!(path = %self.token_path.display(), "Saved token");
        Ok(())
    }

    pub fn load_token(&self) -> Result<Option<StoredToken>, AuthError> {
        if !self.token_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.token_path)
            .map_err(|e| AuthError::TokenStorage(format!("Failed to read token: {}", e)))?;

        let token: StoredToken = serde_json::from_str(&json)?;
        Ok(Some(token))
    }

    pub fn delete_token(&self) -> Result<(), AuthError> {
        if self.token_path.exists() {
            fs::remove_file(&self.token_path)
                .map_err(|e| AuthError::TokenStorage(format!("Failed to delete token: {}", e)))?;
        }
        Ok(())
    }

    /// Tokens count as expired 5 minutes early. A token without expiry never expires.
    pub fn is_token_expired(&self, token: &StoredToken) -> bool {
        match token.expires_at {
            Some(expires_at) => expires_at <= Utc::now() + EXPIRY_BUFFER,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_in: Option<Duration>) -> StoredToken {
        StoredToken {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: expires_in.map(|d| Utc::now() + d),
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json")).unwrap();

        assert!(store.load_token().unwrap().is_none());
    }

    #[test]
    fn save_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.json")).unwrap();
        let saved = token(Some(Duration::hours(1)));

        store.save_token(&saved).unwrap();
        let loaded = store.load_token().unwrap().unwrap();
        assert_eq!(loaded.access_token, saved.access_token);
        assert_eq!(loaded.refresh_token, saved.refresh_token);
        assert_eq!(
            loaded.expires_at.map(|t| t.timestamp()),
            saved.expires_at.map(|t| t.timestamp())
        );

        store.delete_token().unwrap();
        assert!(store.load_token().unwrap().is_none());
        // Deleting twice is fine.
        store.delete_token().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json")).unwrap();
        store.save_token(&token(None)).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json")).unwrap();
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.load_token(), Err(AuthError::Json(_))));
    }

    #[test]
    fn expiry_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json")).unwrap();

        assert!(!store.is_token_expired(&token(Some(Duration::hours(1)))));
        assert!(store.is_token_expired(&token(Some(Duration::minutes(2)))));
        assert!(store.is_token_expired(&token(Some(Duration::minutes(-1)))));
        assert!(!store.is_token_expired(&token(None)));
    }
}
