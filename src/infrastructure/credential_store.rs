use crate::infrastructure::error::InfraError;
use std::sync::Mutex;

/// Holds the bearer token attached to every backend request.
pub trait AccessTokenStore: Send + Sync {
    fn save_token(&self, token: &str) -> Result<(), InfraError>;
    fn load_token(&self) -> Result<Option<String>, InfraError>;
    fn delete_token(&self) -> Result<(), InfraError>;
}

#[derive(Debug, Default)]
pub struct InMemoryAccessTokenStore {
    token: Mutex<Option<String>>,
}

impl InMemoryAccessTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl AccessTokenStore for InMemoryAccessTokenStore {
    fn save_token(&self, token: &str) -> Result<(), InfraError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(InfraError::InvalidConfig("access token must not be empty".to_string()));
        }
        let mut guard = self
            .token
            .lock()
            .map_err(|error| InfraError::Lock(format!("token store: {error}")))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn load_token(&self) -> Result<Option<String>, InfraError> {
        let guard = self
            .token
            .lock()
            .map_err(|error| InfraError::Lock(format!("token store: {error}")))?;
        Ok(guard.clone())
    }

    fn delete_token(&self) -> Result<(), InfraError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|error| InfraError::Lock(format!("token store: {error}")))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn save_load_and_delete_token() {
        let store = InMemoryAccessTokenStore::default();
        assert_eq!(store.load_token().expect("load"), None);

        store.save_token(" abc123 ").expect("save");
        assert_eq!(store.load_token().expect("load"), Some("abc123".to_string()));

        store.delete_token().expect("delete");
        assert_eq!(store.load_token().expect("load"), None);
    }

    #[test]
    fn poisoned_lock_reports_lock_error() {
        let store = Arc::new(InMemoryAccessTokenStore::with_token("abc"));
        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.token.lock().expect("lock");
            panic!("poison the token lock");
        })
        .join();

        assert!(matches!(store.load_token(), Err(InfraError::Lock(_))));
        assert!(matches!(store.save_token("next"), Err(InfraError::Lock(_))));
        assert!(matches!(store.delete_token(), Err(InfraError::Lock(_))));
    }

    #[test]
    fn blank_token_is_rejected() {
        let store = InMemoryAccessTokenStore::with_token("kept");
        assert!(store.save_token("   ").is_err());
        assert_eq!(store.load_token().expect("load"), Some("kept".to_string()));
    }
}
