use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::{
    common::{
        http_client_factory::AuthenticatedHttpClientFactory,
        transport::{server_message, ApiResponse, GENERIC_FAILURE_MESSAGE},
    },
    fetch::{FetchCell, FetchState},
};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_assessments: Option<u64>,
    #[serde(default)]
    pub assessments_this_month: Option<u64>,
    #[serde(default)]
    pub average_maturity_score: Option<f64>,
    #[serde(default)]
    pub recent_assessments: Option<Vec<DashboardAssessment>>,
    #[serde(default)]
    pub popular_assessments: Option<Vec<DashboardAssessment>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DashboardAssessment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub maturity_score: Option<f64>,
    #[serde(default)]
    pub evaluation_count: Option<u64>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Fetches the dashboard summary. Requires a session; a missing credential
/// settles immediately as an explicit error.
#[derive(Clone)]
pub struct DashboardAgent {
    factory: AuthenticatedHttpClientFactory,
    cell: Arc<FetchCell<DashboardSummary>>,
}

impl DashboardAgent {
    pub fn new(factory: AuthenticatedHttpClientFactory) -> Self {
        Self {
            factory,
            cell: Arc::new(FetchCell::new()),
        }
    }

    pub fn state(&self) -> FetchState<DashboardSummary> {
        self.cell.snapshot()
    }

    pub async fn refresh(&self) -> FetchState<DashboardSummary> {
        let generation = self.cell.begin();

        if self.factory.bearer_token().is_none() {
            debug!("dashboard fetch attempted without a session");
            self.cell
                .resolve(generation, Err("Access token is missing".to_string()));
            return self.cell.snapshot();
        }

        let outcome = self.fetch().await;
        self.cell.resolve(generation, outcome);

        self.cell.snapshot()
    }

    async fn fetch(&self) -> Result<DashboardSummary, String> {
        let client = self.factory.create_client().map_err(|e| e.to_string())?;

        let url = format!("{}/api/dashboard", self.factory.base_url);

        let resp = client.get(url).send().await.map_err(|e| e.to_string())?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| e.to_string())?;

        if !status.is_success() {
            return Err(server_message(status, &body));
        }

        let envelope = serde_json::from_str::<ApiResponse<DashboardSummary>>(&body)
            .map_err(|_| GENERIC_FAILURE_MESSAGE.to_string())?;

        if envelope.is_failure() {
            return Err(envelope.failure_message());
        }

        match envelope.data {
            Some(summary) => Ok(summary),
            None => Err(GENERIC_FAILURE_MESSAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::DashboardAgent;
    use crate::core::{
        common::http_client_factory::AuthenticatedHttpClientFactory,
        session::{models::Session, storage::MockSessionStorage, SessionStore},
    };

    #[tokio::test]
    async fn dashboard_settles_with_the_summary() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/dashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "total_assessments": 12,
                    "assessments_this_month": 3,
                    "average_maturity_score": 3.4,
                    "recent_assessments": [ { "id": "e1", "title": "SOC 2" } ],
                    "popular_assessments": []
                }
            })))
            .mount(&mock_server)
            .await;

        let mut storage = MockSessionStorage::new();
        storage.expect_set().returning(|_| Ok(()));
        let store = Arc::new(SessionStore::new(Box::new(storage)));
        store.login(Session::new("tok123".to_string())).await;

        let agent = DashboardAgent::new(AuthenticatedHttpClientFactory::new(
            mock_server.uri(),
            store,
            30,
        ));

        let state = agent.refresh().await;

        assert!(!state.loading);
        let summary = state.data.unwrap();
        assert_eq!(Some(12), summary.total_assessments);
        assert_eq!(Some(3.4), summary.average_maturity_score);
        assert_eq!(1, summary.recent_assessments.unwrap().len());
    }

    #[tokio::test]
    async fn missing_token_settles_with_an_explicit_error() {
        let store = Arc::new(SessionStore::new(Box::new(MockSessionStorage::new())));
        let factory =
            AuthenticatedHttpClientFactory::new("http://127.0.0.1:1".to_string(), store, 30);

        let agent = DashboardAgent::new(factory);

        assert!(!agent.state().loading);

        let state = agent.refresh().await;

        assert!(!state.loading);
        assert!(state.data.is_none());
        assert_eq!(Some("Access token is missing".to_string()), state.error);
    }
}
