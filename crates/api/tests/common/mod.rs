#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use doer_activation::{ActivationServices, MemoryActivationStore};
use doer_api::auth::jwt::{generate_access_token, JwtConfig};
use doer_api::config::ServerConfig;
use doer_api::profile::{ProfileCache, ProfileRefresher};
use doer_api::routes;
use doer_api::state::AppState;
use doer_core::policy::ActivationPolicy;
use doer_core::retry::RetryPolicy;
use doer_core::types::DbId;
use doer_db::models::doer::{CreateDoer, Doer};
use doer_db::models::quiz::{CreateQuizQuestion, QuizQuestion};
use doer_db::models::training::{CreateTrainingModule, TrainingModule};
use doer_events::EventBus;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Build a test `ServerConfig` with safe defaults and a fast retry policy.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        activation: ActivationPolicy::default(),
        store_retry: RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2.0,
        },
    }
}

/// A running test application over an in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryActivationStore>,
    pub bus: Arc<EventBus>,
    pub profiles: Arc<ProfileCache>,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack that production uses. The profile
/// refresher runs as a background task, as it does in production.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryActivationStore::new());
    let bus = Arc::new(EventBus::default());
    let profiles = Arc::new(ProfileCache::new());

    let activation = ActivationServices::new(store.clone(), Arc::clone(&bus))
        .with_policy(config.activation)
        .with_retry(config.store_retry);

    tokio::spawn(
        ProfileRefresher::new(Arc::clone(&profiles), store.clone()).run(bus.subscribe()),
    );

    let state = AppState {
        activation,
        config: Arc::new(config),
        event_bus: Arc::clone(&bus),
        profiles: Arc::clone(&profiles),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    TestApp {
        router,
        store,
        bus,
        profiles,
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub fn seed_doer(store: &MemoryActivationStore, email: &str) -> Doer {
    store.seed_doer(CreateDoer {
        full_name: "Test Doer".to_string(),
        email: email.to_string(),
    })
}

pub fn seed_modules(store: &MemoryActivationStore, count: i32) -> Vec<TrainingModule> {
    (1..=count)
        .map(|i| {
            store.seed_module(CreateTrainingModule {
                title: format!("Module {i}"),
                description: Some("Intro".to_string()),
                module_type: "article".to_string(),
                content_url: format!("https://cdn.test/{i}"),
                duration_minutes: Some(10),
                order_index: Some(i),
                is_required: None,
            })
        })
        .collect()
}

/// Seed `count` questions whose correct answer is option 2.
pub fn seed_questions(store: &MemoryActivationStore, count: i32) -> Vec<QuizQuestion> {
    (1..=count)
        .map(|i| {
            store.seed_question(CreateQuizQuestion {
                question_text: format!("Question {i}"),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct_option_index: 2,
                order_index: Some(i),
            })
        })
        .collect()
}

/// A JSON answers map with the first `correct` questions right.
pub fn answers(questions: &[QuizQuestion], correct: usize) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let choice = if i < correct { 2 } else { 0 };
            (q.id.to_string(), serde_json::json!(choice))
        })
        .collect();
    serde_json::json!({ "answers": map })
}

pub fn token_for(doer_id: DbId) -> String {
    generate_access_token(doer_id, &test_config().jwt).expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::POST, uri, body, token).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::PUT, uri, body, token).await
}

async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
