use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::{
    common::{
        http_client_factory::AuthenticatedHttpClientFactory,
        transport::{server_message, ApiResponse},
    },
    fetch::{FetchCell, FetchState},
};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CheckoutSession {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Starts a credit purchase checkout. This agent is imperative: nothing
/// happens until `checkout` is invoked, and it may be invoked again after
/// a failure. Every invocation resets `loading` and `error` first.
#[derive(Clone)]
pub struct CheckoutAgent {
    factory: AuthenticatedHttpClientFactory,
    cell: Arc<FetchCell<CheckoutSession>>,
}

impl CheckoutAgent {
    pub fn new(factory: AuthenticatedHttpClientFactory) -> Self {
        Self {
            factory,
            cell: Arc::new(FetchCell::new()),
        }
    }

    pub fn state(&self) -> FetchState<CheckoutSession> {
        self.cell.snapshot()
    }

    pub fn checkout_url(&self) -> Option<String> {
        self.cell.snapshot().data.and_then(|s| s.url)
    }

    pub fn transaction_id(&self) -> Option<String> {
        self.cell.snapshot().data.and_then(|s| s.id)
    }

    pub async fn checkout(&self, quantity: u32) -> FetchState<CheckoutSession> {
        let generation = self.cell.begin();

        if quantity == 0 {
            self.cell
                .resolve(generation, Err("quantity is required".to_string()));
            return self.cell.snapshot();
        }

        if self.factory.bearer_token().is_none() {
            debug!("checkout attempted without a session");
            self.cell.resolve(
                generation,
                Err("Authentication token is missing. Please log in again.".to_string()),
            );
            return self.cell.snapshot();
        }

        let outcome = self.post(quantity).await;
        self.cell.resolve(generation, outcome);

        self.cell.snapshot()
    }

    async fn post(&self, quantity: u32) -> Result<CheckoutSession, String> {
        debug!("starting checkout for {quantity} credits");

        let client = self.factory.create_client().map_err(|e| e.to_string())?;

        let url = format!("{}/api/payments/checkout", self.factory.base_url);

        let resp = client
            .post(url)
            .json(&json!({ "quantity": quantity }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| e.to_string())?;

        let envelope = match serde_json::from_str::<ApiResponse<CheckoutSession>>(&body) {
            Ok(e) => e,
            Err(_) => return Err(server_message(status, &body)),
        };

        if !status.is_success() || envelope.is_failure() {
            return Err(envelope
                .message
                .unwrap_or_else(|| "An error occurred during payment checkout.".to_string()));
        }

        match envelope.data {
            Some(session) => Ok(session),
            None => Err("An error occurred during payment checkout.".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::CheckoutAgent;
    use crate::core::{
        common::http_client_factory::AuthenticatedHttpClientFactory,
        session::{models::Session, storage::MockSessionStorage, SessionStore},
    };

    async fn logged_in_factory(base_url: String) -> AuthenticatedHttpClientFactory {
        let mut storage = MockSessionStorage::new();
        storage.expect_set().returning(|_| Ok(()));

        let store = Arc::new(SessionStore::new(Box::new(storage)));
        store.login(Session::new("tok123".to_string())).await;

        AuthenticatedHttpClientFactory::new(base_url, store, 30)
    }

    #[tokio::test]
    async fn successful_checkout_exposes_url_and_transaction_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/payments/checkout"))
            .and(body_json(json!({ "quantity": 3 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statusCode": 200,
                "data": { "url": "https://pay.example/cs_1", "id": "cs_1" }
            })))
            .mount(&mock_server)
            .await;

        let agent = CheckoutAgent::new(logged_in_factory(mock_server.uri()).await);

        let state = agent.checkout(3).await;

        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(Some("https://pay.example/cs_1".to_string()), agent.checkout_url());
        assert_eq!(Some("cs_1".to_string()), agent.transaction_id());
    }

    #[tokio::test]
    async fn declined_checkout_surfaces_the_server_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/payments/checkout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statusCode": 500,
                "message": "card declined"
            })))
            .mount(&mock_server)
            .await;

        let agent = CheckoutAgent::new(logged_in_factory(mock_server.uri()).await);

        let state = agent.checkout(3).await;

        assert_eq!(Some("card declined".to_string()), state.error);
        assert!(agent.checkout_url().is_none());
    }

    #[tokio::test]
    async fn missing_token_settles_without_any_request() {
        let store = Arc::new(SessionStore::new(Box::new(MockSessionStorage::new())));
        let factory =
            AuthenticatedHttpClientFactory::new("http://127.0.0.1:1".to_string(), store, 30);

        let agent = CheckoutAgent::new(factory);

        let state = agent.checkout(3).await;

        assert!(!state.loading);
        assert_eq!(
            Some("Authentication token is missing. Please log in again.".to_string()),
            state.error
        );
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected_before_anything_else() {
        let store = Arc::new(SessionStore::new(Box::new(MockSessionStorage::new())));
        let factory =
            AuthenticatedHttpClientFactory::new("http://127.0.0.1:1".to_string(), store, 30);

        let agent = CheckoutAgent::new(factory);

        let state = agent.checkout(0).await;

        assert_eq!(Some("quantity is required".to_string()), state.error);
    }

    #[tokio::test]
    async fn checkout_can_be_retried_after_a_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/payments/checkout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statusCode": 500,
                "message": "card declined"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let agent = CheckoutAgent::new(logged_in_factory(mock_server.uri()).await);
        let state = agent.checkout(2).await;
        assert!(state.error.is_some());

        mock_server.reset().await;
        Mock::given(method("POST"))
            .and(path("/api/payments/checkout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statusCode": 200,
                "data": { "url": "https://pay.example/cs_2", "id": "cs_2" }
            })))
            .mount(&mock_server)
            .await;

        let state = agent.checkout(2).await;

        assert!(state.error.is_none(), "error should reset on retry");
        assert_eq!(Some("cs_2".to_string()), agent.transaction_id());
    }
}
