use refresh_core::error::RefreshError;

/// Environment variable holding the platform API token.
pub const TOKEN_ENV: &str = "SNYK_TOKEN";

/// Keychain entry name for the platform API token.
pub const TOKEN_KEY: &str = "api-token";

/// Trait for credential storage backends.
pub trait CredentialStore: Send + Sync {
    /// Store a token under the given key.
    fn store(&self, key: &str, token: &str) -> Result<(), RefreshError>;

    /// Retrieve a token by key.
    fn get(&self, key: &str) -> Result<Option<String>, RefreshError>;

    /// Delete a stored token.
    fn delete(&self, key: &str) -> Result<(), RefreshError>;
}

/// Read-only store backed by a single environment variable.
pub struct EnvStore {
    var: String,
}

impl EnvStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvStore {
    fn default() -> Self {
        Self::new(TOKEN_ENV)
    }
}

impl CredentialStore for EnvStore {
    fn store(&self, _key: &str, _token: &str) -> Result<(), RefreshError> {
        Err(RefreshError::CredentialError {
            message: format!("{} is read from the environment and cannot be stored", self.var),
        })
    }

    fn get(&self, _key: &str) -> Result<Option<String>, RefreshError> {
        Ok(std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    fn delete(&self, _key: &str) -> Result<(), RefreshError> {
        Err(RefreshError::CredentialError {
            message: format!("{} is read from the environment and cannot be deleted", self.var),
        })
    }
}

/// OS keychain-backed credential store using the `keyring` crate.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: "refresh".to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, RefreshError> {
        keyring::Entry::new(&self.service, key).map_err(|e| RefreshError::CredentialError {
            message: e.to_string(),
        })
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringStore {
    fn store(&self, key: &str, token: &str) -> Result<(), RefreshError> {
        self.entry(key)?
            .set_password(token)
            .map_err(|e| RefreshError::CredentialError {
                message: e.to_string(),
            })
    }

    fn get(&self, key: &str) -> Result<Option<String>, RefreshError> {
        match self.entry(key)?.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(RefreshError::CredentialError {
                message: e.to_string(),
            }),
        }
    }

    fn delete(&self, key: &str) -> Result<(), RefreshError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(RefreshError::CredentialError {
                message: e.to_string(),
            }),
        }
    }
}

/// In-memory credential store for testing.
pub struct MemoryStore {
    store: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            store: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, std::collections::HashMap<String, String>>, RefreshError>
    {
        self.store.lock().map_err(|_| RefreshError::CredentialError {
            message: "memory store poisoned".into(),
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryStore {
    fn store(&self, key: &str, token: &str) -> Result<(), RefreshError> {
        self.lock()?.insert(key.to_string(), token.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, RefreshError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), RefreshError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Return the API token from the first store that has one.
///
/// A store that errors (e.g. no keychain daemon) is logged and skipped.
pub fn resolve_token(stores: &[&dyn CredentialStore]) -> Result<String, RefreshError> {
    for store in stores {
        match store.get(TOKEN_KEY) {
            Ok(Some(token)) => return Ok(token),
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "credential store unavailable"),
        }
    }
    Err(RefreshError::CredentialError {
        message: format!("no API token found; set {TOKEN_ENV} or run `refresh config set-token`"),
    })
}
