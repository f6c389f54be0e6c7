use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};

use crate::core::session::SessionStore;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Builds bearer-authenticated HTTP clients from the current session.
/// A built client is cached and reused until it expires or the session
/// changes, so every request always carries the token of the session that
/// was live when it started.
#[derive(Clone)]
pub struct AuthenticatedHttpClientFactory {
    pub base_url: String,
    store: Arc<SessionStore>,
    timeout: Duration,
    expiration: TimeDelta,
    cached: Arc<Mutex<Option<(u64, ManagedHttpClient)>>>,
}

impl AuthenticatedHttpClientFactory {
    pub fn new(base_url: String, store: Arc<SessionStore>, timeout_secs: u64) -> Self {
        Self {
            base_url,
            store,
            timeout: Duration::from_secs(timeout_secs),
            expiration: TimeDelta::minutes(30),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.store.access_token()
    }

    pub fn create_client(&self) -> Result<Client, Box<dyn std::error::Error + Send + Sync>> {
        let epoch = *self.store.subscribe().borrow();

        {
            let cached = self.cached.lock().unwrap();

            if let Some((cached_epoch, managed)) = cached.as_ref() {
                if *cached_epoch == epoch {
                    if let Ok(client) = managed.get() {
                        return Ok(client);
                    }
                }
            }
        }

        debug!("creating authenticated http client");

        let token = match self.bearer_token() {
            Some(t) => t,
            None => {
                return Err(Box::new(CredentialError::new(
                    "Access token is missing".to_string(),
                )))
            }
        };

        let mut headers = HeaderMap::new();
        headers.append(
            AUTHORIZATION,
            HeaderValue::from_str(format!("Bearer {}", token).as_str())?,
        );

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .timeout(self.timeout)
            .user_agent(APP_USER_AGENT)
            .build()?;

        let managed = ManagedHttpClient::new(client.to_owned(), self.expiration);
        *self.cached.lock().unwrap() = Some((epoch, managed));

        Ok(client)
    }
}

#[derive(Clone)]
pub struct ManagedHttpClient {
    client: Client,
    expiry: DateTime<Utc>,
}

impl ManagedHttpClient {
    pub fn new(client: Client, lifetime: TimeDelta) -> Self {
        let expiry = Utc::now() + lifetime;
        Self { client, expiry }
    }

    pub fn get(&self) -> Result<Client, Box<dyn std::error::Error + Send + Sync>> {
        if Utc::now() > self.expiry {
            return Err(Box::new(ManagedHttpClientError::new(
                "HTTP client expired".to_string(),
            )));
        }
        Ok(self.client.clone())
    }
}

pub struct ManagedHttpClientError {
    error: String,
}

impl ManagedHttpClientError {
    pub fn new(error: String) -> Self {
        Self { error }
    }
}

impl std::fmt::Display for ManagedHttpClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ManagedHttpClientError: {}", self.error)
    }
}

impl std::fmt::Debug for ManagedHttpClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ManagedHttpClientError: {}", self.error)
    }
}

impl std::error::Error for ManagedHttpClientError {}

#[derive(Debug)]
pub struct CredentialError {
    reason: String,
}

impl CredentialError {
    pub fn new(reason: String) -> Self {
        Self { reason }
    }
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl std::error::Error for CredentialError {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeDelta;

    use super::{AuthenticatedHttpClientFactory, ManagedHttpClient};
    use crate::core::session::{models::Session, storage::MockSessionStorage, SessionStore};

    #[tokio::test]
    async fn create_client_requires_a_token() {
        let store = Arc::new(SessionStore::new(Box::new(MockSessionStorage::new())));
        let factory =
            AuthenticatedHttpClientFactory::new("http://localhost".to_string(), store, 30);

        let res = factory.create_client();

        assert!(res.is_err());
        assert_eq!("Access token is missing", res.unwrap_err().to_string());
    }

    #[tokio::test]
    async fn create_client_succeeds_with_a_session() {
        let mut storage = MockSessionStorage::new();
        storage.expect_set().returning(|_| Ok(()));

        let store = Arc::new(SessionStore::new(Box::new(storage)));
        store.login(Session::new("tok123".to_string())).await;

        let factory =
            AuthenticatedHttpClientFactory::new("http://localhost".to_string(), store, 30);

        assert!(factory.create_client().is_ok());
    }

    #[test]
    fn expired_managed_client_is_refused() {
        let client = reqwest::Client::new();
        let managed = ManagedHttpClient::new(client, TimeDelta::minutes(-1));

        assert!(managed.get().is_err());
    }
}
