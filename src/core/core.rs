use std::sync::Arc;

use chrono::Utc;
use log::info;
use serde::Serialize;

use crate::{
    core::{
        common::{http_client_factory::AuthenticatedHttpClientFactory, transport::ApiResponseError},
        configuration::Configuration,
        fetch::FetchState,
        session::{FileSystemStorage, Session, SessionProvider, SessionStore},
    },
    resources::{
        assessments::{AssessmentDetailAgent, CatalogAgent, EvaluationListAgent},
        dashboard::DashboardAgent,
        payments::CheckoutAgent,
        profile::ProfileAgent,
        PageQuery,
    },
};

/// Opens the durable session store, rehydrates it and installs it as the
/// process-wide provider. Commands run one per process, so install happens
/// exactly once.
async fn open_store(
    conf: &Configuration,
) -> Result<Arc<SessionStore>, Box<dyn std::error::Error + Send + Sync>> {
    let data_dir = conf
        .core
        .data_directory
        .to_owned()
        .unwrap_or_else(|| ".".to_string());

    let store = Arc::new(SessionStore::new(Box::new(FileSystemStorage::new(data_dir))));
    store.initialize().await;

    SessionProvider::install(store)?;

    Ok(SessionProvider::current()?)
}

fn create_factory(conf: &Configuration, store: Arc<SessionStore>) -> AuthenticatedHttpClientFactory {
    AuthenticatedHttpClientFactory::new(
        conf.api.base_url(),
        store,
        conf.api.timeout.unwrap_or(30),
    )
}

fn page_query(
    conf: &Configuration,
    page: Option<u32>,
    limit: Option<u32>,
    order_by: Option<String>,
) -> PageQuery {
    let defaults = PageQuery::default();

    PageQuery {
        page: page.or(conf.api.page).unwrap_or(defaults.page),
        limit: limit.or(conf.api.limit).unwrap_or(defaults.limit),
        order_by: order_by
            .or_else(|| conf.api.order_by.to_owned())
            .unwrap_or(defaults.order_by),
    }
}

/// A settled error state becomes the process outcome; settled data is
/// printed as pretty JSON.
fn render<T: Serialize + Clone>(
    state: FetchState<T>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(message) = state.error {
        return Err(Box::new(ApiResponseError::new(message)));
    }

    match state.data {
        Some(data) => println!("{}", serde_json::to_string_pretty(&data)?),
        None => println!("null"),
    }

    Ok(())
}

pub async fn login(
    conf: &Configuration,
    access_token: String,
    email: Option<String>,
    first_name: Option<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let store = open_store(conf).await?;

    let mut session = Session::new(access_token);
    session.profile.email = email;
    session.profile.first_name = first_name;

    store.login(session).await;

    info!("session stored");
    Ok(())
}

pub async fn logout(
    conf: &Configuration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let store = open_store(conf).await?;

    store.logout().await;

    info!("session cleared");
    Ok(())
}

pub async fn profile(
    conf: &Configuration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let store = open_store(conf).await?;
    let agent = ProfileAgent::new(create_factory(conf, store));

    render(agent.refresh().await)
}

pub async fn dashboard(
    conf: &Configuration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let store = open_store(conf).await?;
    let agent = DashboardAgent::new(create_factory(conf, store));

    render(agent.refresh().await)
}

pub async fn evaluations(
    conf: &Configuration,
    page: Option<u32>,
    limit: Option<u32>,
    order_by: Option<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let store = open_store(conf).await?;
    let agent = EvaluationListAgent::new(create_factory(conf, store.to_owned()));

    if store.read().is_none() {
        return Err(Box::new(ApiResponseError::new(
            "no session, run the login command first".to_string(),
        )));
    }

    render(agent.refresh(&page_query(conf, page, limit, order_by)).await)
}

pub async fn catalog(
    conf: &Configuration,
    page: Option<u32>,
    limit: Option<u32>,
    order_by: Option<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let store = open_store(conf).await?;
    let agent = CatalogAgent::new(create_factory(conf, store.to_owned()));

    if store.read().is_none() {
        return Err(Box::new(ApiResponseError::new(
            "no session, run the login command first".to_string(),
        )));
    }

    render(agent.refresh(&page_query(conf, page, limit, order_by)).await)
}

pub async fn assessment(
    conf: &Configuration,
    id: String,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let store = open_store(conf).await?;
    let agent = AssessmentDetailAgent::new(create_factory(conf, store.to_owned()));

    if store.read().is_none() {
        return Err(Box::new(ApiResponseError::new(
            "no session, run the login command first".to_string(),
        )));
    }

    render(agent.refresh(&id).await)
}

pub async fn checkout(
    conf: &Configuration,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let store = open_store(conf).await?;
    let agent = CheckoutAgent::new(create_factory(conf, store));

    let state = agent.checkout(quantity).await;

    if state.error.is_none() {
        if let Some(url) = agent.checkout_url() {
            info!("checkout session ready, open the url to complete payment: {url}");
        }
    }

    render(state)
}

pub async fn session_diagnostic(
    conf: &Configuration,
    show_token: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let store = open_store(conf).await?;

    match store.read() {
        Some(session) => {
            println!("SESSION_PRESENT: true");
            println!(
                "PROFILE_SHAPE: {}",
                if session.user.is_some() { "nested" } else { "flat" }
            );

            if let Some(credits) = session.credits() {
                println!("CREDITS: {credits}");
            }

            if show_token {
                println!("ACCESS_TOKEN: {}", session.access_token);
            }
        }
        None => {
            println!("SESSION_PRESENT: false");
        }
    }

    info!("session diagnostic completed at {}", Utc::now());
    Ok(())
}
