use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;

use super::SessionStore;

lazy_static! {
    static ref CURRENT: Mutex<Option<Arc<SessionStore>>> = Mutex::new(None);
}

/// Process-wide access to the one session store. Installing twice or
/// reading before installation is a programming-contract violation and
/// fails loudly rather than silently creating a second store.
pub struct SessionProvider;

impl SessionProvider {
    pub fn install(store: Arc<SessionStore>) -> Result<(), SessionContextError> {
        let mut slot = CURRENT.lock().unwrap();

        if slot.is_some() {
            return Err(SessionContextError::new(
                "a session provider is already installed".to_string(),
            ));
        }

        *slot = Some(store);
        Ok(())
    }

    pub fn current() -> Result<Arc<SessionStore>, SessionContextError> {
        match CURRENT.lock().unwrap().as_ref() {
            Some(store) => Ok(store.to_owned()),
            None => Err(SessionContextError::new(
                "session access requires an installed session provider".to_string(),
            )),
        }
    }
}

#[derive(Debug)]
pub struct SessionContextError {
    reason: String,
}

impl SessionContextError {
    pub fn new(reason: String) -> Self {
        Self { reason }
    }
}

impl std::fmt::Display for SessionContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl std::error::Error for SessionContextError {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::SessionProvider;
    use crate::core::session::{storage::MockSessionStorage, SessionStore};

    // One test covers the whole lifecycle: the slot is process-wide, so the
    // ordering between separate tests would not be deterministic.
    #[tokio::test]
    async fn accessor_fails_before_install_and_double_install_is_rejected() {
        assert!(SessionProvider::current().is_err());

        let store = Arc::new(SessionStore::new(Box::new(MockSessionStorage::new())));
        SessionProvider::install(store.to_owned()).unwrap();

        assert!(SessionProvider::current().is_ok());
        assert!(SessionProvider::install(store).is_err());
    }
}
