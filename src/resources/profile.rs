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
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub credits: Option<i64>,
    #[serde(rename = "profileImage", default)]
    pub profile_image: Option<String>,
    #[serde(rename = "workRole", default)]
    pub work_role: Option<String>,
    #[serde(rename = "companyName", default)]
    pub company_name: Option<String>,
}

/// Fetches the authenticated user profile. Unlike the list agents this one
/// needs a token to mean anything at all, so a missing credential settles
/// immediately as an explicit error instead of waiting.
#[derive(Clone)]
pub struct ProfileAgent {
    factory: AuthenticatedHttpClientFactory,
    cell: Arc<FetchCell<UserProfile>>,
}

impl ProfileAgent {
    pub fn new(factory: AuthenticatedHttpClientFactory) -> Self {
        Self {
            factory,
            cell: Arc::new(FetchCell::new()),
        }
    }

    pub fn state(&self) -> FetchState<UserProfile> {
        self.cell.snapshot()
    }

    pub async fn refresh(&self) -> FetchState<UserProfile> {
        let generation = self.cell.begin();

        if self.factory.bearer_token().is_none() {
            debug!("profile fetch attempted without a session");
            self.cell
                .resolve(generation, Err("Access token is missing".to_string()));
            return self.cell.snapshot();
        }

        let outcome = self.fetch().await;
        self.cell.resolve(generation, outcome);

        self.cell.snapshot()
    }

    async fn fetch(&self) -> Result<UserProfile, String> {
        let client = self.factory.create_client().map_err(|e| e.to_string())?;

        let url = format!("{}/api/users/profile", self.factory.base_url);

        let resp = client.get(url).send().await.map_err(|e| e.to_string())?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| e.to_string())?;

        if !status.is_success() {
            return Err(server_message(status, &body));
        }

        let envelope = serde_json::from_str::<ApiResponse<UserProfile>>(&body)
            .map_err(|_| GENERIC_FAILURE_MESSAGE.to_string())?;

        if envelope.is_failure() {
            return Err(envelope.failure_message());
        }

        match envelope.data {
            Some(profile) => Ok(profile),
            None => Err(GENERIC_FAILURE_MESSAGE.to_string()),
        }
    }
}
