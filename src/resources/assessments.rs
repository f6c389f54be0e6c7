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

use super::PageQuery;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Evaluation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "assessmentTitle", alias = "title", default)]
    pub title: Option<String>,
    #[serde(rename = "maturityScore", default)]
    pub maturity_score: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AssessmentSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "questionCount", default)]
    pub question_count: Option<u32>,
    #[serde(rename = "evaluationCount", default)]
    pub evaluation_count: Option<u32>,
    #[serde(rename = "credReq", default)]
    pub cred_req: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AssessmentDetail {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "questionCount", default)]
    pub question_count: Option<u32>,
    #[serde(rename = "credReq", default)]
    pub cred_req: Option<u32>,
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Question {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// The evaluations endpoint answers with two different envelopes depending
/// on the API version: a bare `{"evaluations": [..]}` or the standard
/// envelope with the list nested under `data.data`. Both are live, both
/// are normalized to the same flat list right here at the boundary.
#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
enum EvaluationsEnvelope {
    Flat { evaluations: Vec<Evaluation> },
    Wrapped(ApiResponse<EvaluationsPage>),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct EvaluationsPage {
    #[serde(default)]
    data: Vec<Evaluation>,
}

impl EvaluationsEnvelope {
    fn normalize(self) -> Result<Vec<Evaluation>, String> {
        match self {
            EvaluationsEnvelope::Flat { evaluations } => Ok(evaluations),
            EvaluationsEnvelope::Wrapped(envelope) => {
                if envelope.is_failure() {
                    return Err(envelope.failure_message());
                }

                Ok(envelope.data.map(|page| page.data).unwrap_or_default())
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct CatalogPage {
    #[serde(default)]
    results: Vec<AssessmentSummary>,
}

/// Lists the user's past evaluations.
#[derive(Clone)]
pub struct EvaluationListAgent {
    factory: AuthenticatedHttpClientFactory,
    cell: Arc<FetchCell<Vec<Evaluation>>>,
}

impl EvaluationListAgent {
    pub fn new(factory: AuthenticatedHttpClientFactory) -> Self {
        Self {
            factory,
            cell: Arc::new(FetchCell::new()),
        }
    }

    pub fn state(&self) -> FetchState<Vec<Evaluation>> {
        self.cell.snapshot()
    }

    /// Without a token the agent stays idle: no request, no state change.
    pub async fn refresh(&self, query: &PageQuery) -> FetchState<Vec<Evaluation>> {
        if self.factory.bearer_token().is_none() {
            debug!("no access token yet, evaluations fetch stays idle");
            return self.cell.snapshot();
        }

        let generation = self.cell.begin();
        let outcome = self.fetch(query).await;
        self.cell.resolve(generation, outcome);

        self.cell.snapshot()
    }

    async fn fetch(&self, query: &PageQuery) -> Result<Vec<Evaluation>, String> {
        let client = self.factory.create_client().map_err(|e| e.to_string())?;

        let url = format!(
            "{}/api/evaluations?{}",
            self.factory.base_url,
            query.to_query_string()
        );

        let resp = client.get(url).send().await.map_err(|e| e.to_string())?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| e.to_string())?;

        if !status.is_success() {
            return Err(server_message(status, &body));
        }

        let envelope = serde_json::from_str::<EvaluationsEnvelope>(&body)
            .map_err(|_| GENERIC_FAILURE_MESSAGE.to_string())?;

        envelope.normalize()
    }
}

/// Lists the assessments catalog.
#[derive(Clone)]
pub struct CatalogAgent {
    factory: AuthenticatedHttpClientFactory,
    cell: Arc<FetchCell<Vec<AssessmentSummary>>>,
}

impl CatalogAgent {
    pub fn new(factory: AuthenticatedHttpClientFactory) -> Self {
        Self {
            factory,
            cell: Arc::new(FetchCell::new()),
        }
    }

    pub fn state(&self) -> FetchState<Vec<AssessmentSummary>> {
        self.cell.snapshot()
    }

    pub async fn refresh(&self, query: &PageQuery) -> FetchState<Vec<AssessmentSummary>> {
        if self.factory.bearer_token().is_none() {
            debug!("no access token yet, catalog fetch stays idle");
            return self.cell.snapshot();
        }

        let generation = self.cell.begin();
        let outcome = self.fetch(query).await;
        self.cell.resolve(generation, outcome);

        self.cell.snapshot()
    }

    async fn fetch(&self, query: &PageQuery) -> Result<Vec<AssessmentSummary>, String> {
        let client = self.factory.create_client().map_err(|e| e.to_string())?;

        let url = format!(
            "{}/api/assessments/all?{}",
            self.factory.base_url,
            query.to_query_string()
        );

        let resp = client.get(url).send().await.map_err(|e| e.to_string())?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| e.to_string())?;

        if !status.is_success() {
            return Err(server_message(status, &body));
        }

        let envelope = serde_json::from_str::<ApiResponse<CatalogPage>>(&body)
            .map_err(|_| GENERIC_FAILURE_MESSAGE.to_string())?;

        if envelope.is_failure() {
            return Err(envelope.failure_message());
        }

        Ok(envelope.data.map(|page| page.results).unwrap_or_default())
    }
}

/// Fetches one assessment by identifier. The identifier is the driving
/// parameter: a refresh for a new identifier supersedes any in-flight
/// fetch for the previous one.
#[derive(Clone)]
pub struct AssessmentDetailAgent {
    factory: AuthenticatedHttpClientFactory,
    cell: Arc<FetchCell<AssessmentDetail>>,
}

impl AssessmentDetailAgent {
    pub fn new(factory: AuthenticatedHttpClientFactory) -> Self {
        Self {
            factory,
            cell: Arc::new(FetchCell::new()),
        }
    }

    pub fn state(&self) -> FetchState<AssessmentDetail> {
        self.cell.snapshot()
    }

    pub async fn refresh(&self, id: &str) -> FetchState<AssessmentDetail> {
        if id.trim().is_empty() {
            debug!("no assessment id given, detail fetch stays idle");
            return self.cell.snapshot();
        }

        if self.factory.bearer_token().is_none() {
            debug!("no access token yet, detail fetch stays idle");
            return self.cell.snapshot();
        }

        let generation = self.cell.begin();
        let outcome = self.fetch(id).await;
        self.cell.resolve(generation, outcome);

        self.cell.snapshot()
    }

    async fn fetch(&self, id: &str) -> Result<AssessmentDetail, String> {
        debug!("fetching assessment details for id {id}");

        let client = self.factory.create_client().map_err(|e| e.to_string())?;

        let url = format!("{}/api/assessments/{}", self.factory.base_url, id);

        let resp = client.get(url).send().await.map_err(|e| e.to_string())?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| e.to_string())?;

        if !status.is_success() {
            return Err(server_message(status, &body));
        }

        let envelope = serde_json::from_str::<ApiResponse<AssessmentDetail>>(&body)
            .map_err(|_| GENERIC_FAILURE_MESSAGE.to_string())?;

        if envelope.is_failure() {
            return Err(envelope.failure_message());
        }

        match envelope.data {
            Some(detail) => Ok(detail),
            None => Err("no assessment details found".to_string()),
        }
    }
}
