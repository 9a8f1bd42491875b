use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use signup_core::{RegistryError, SignupService};

/// Where `GET /` sends browsers. The front-end is served elsewhere.
pub const INDEX_PATH: &str = "/static/index.html";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    detail: String,
}

impl AppError {
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { .. } => Self::not_found(err.to_string()),
            RegistryError::AlreadyRegistered { .. } | RegistryError::NotRegistered { .. } => {
                Self::bad_request(err.to_string())
            }
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "detail": self.detail });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(service: SignupService) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/activities", get(list_activities))
        .route("/activities/{name}/signup", post(signup_for_activity))
        .route("/activities/{name}/unregister", delete(unregister_from_activity))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Combine a bind address and port into a socket address.
///
/// `bind` is an IPv4 or IPv6 address; IPv6 may be written with or without
/// surrounding brackets (`::1` or `[::1]`).
pub fn listen_addr(bind: &str, port: u16) -> Result<SocketAddr> {
    let host = bind
        .strip_prefix('[')
        .and_then(|b| b.strip_suffix(']'))
        .unwrap_or(bind);
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("invalid bind address {bind:?}"))?;
    Ok(SocketAddr::new(ip, port))
}

pub async fn run_serve(service: SignupService, bind: &str, port: u16) -> Result<()> {
    let app = build_router(service);
    let addr = listen_addr(bind, port)?;
    tracing::info!("signup serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("signup serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> Redirect {
    Redirect::temporary(INDEX_PATH)
}

async fn list_activities(State(service): State<SignupService>) -> impl IntoResponse {
    Json(service.list())
}

async fn signup_for_activity(
    State(service): State<SignupService>,
    Path(name): Path<String>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Query(EmailQuery { email }) = query?;
    let confirmation = service.sign_up(&name, &email)?;
    Ok(Json(MessageResponse {
        message: confirmation.to_string(),
    }))
}

async fn unregister_from_activity(
    State(service): State<SignupService>,
    Path(name): Path<String>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Query(EmailQuery { email }) = query?;
    let confirmation = service.unregister(&name, &email)?;
    Ok(Json(MessageResponse {
        message: confirmation.to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use tower::ServiceExt;

    use signup_core::{Activity, ActivityRegistry, SignupService};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send(service: &SignupService, method: Method, uri: &str) -> axum::response::Response {
        let app = super::build_router(service.clone());
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn activities(service: &SignupService) -> serde_json::Value {
        let resp = send(service, Method::GET, "/activities").await;
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await
    }

    async fn participants(service: &SignupService, activity: &str) -> Vec<String> {
        let json = activities(service).await;
        serde_json::from_value(json[activity]["participants"].clone()).unwrap()
    }

    fn detail(json: &serde_json::Value) -> String {
        json["detail"]
            .as_str()
            .expect("error body should have a detail string")
            .to_lowercase()
    }

    // -----------------------------------------------------------------------
    // Listen address
    // -----------------------------------------------------------------------

    #[test]
    fn test_listen_addr_ipv4() {
        let addr = super::listen_addr("127.0.0.1", 8000).unwrap();
        assert_eq!(addr, SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)));
    }

    #[test]
    fn test_listen_addr_ipv6() {
        let expected = SocketAddr::from((Ipv6Addr::LOCALHOST, 8000));
        assert_eq!(super::listen_addr("::1", 8000).unwrap(), expected);
        assert_eq!(super::listen_addr("[::1]", 8000).unwrap(), expected);

        let any = super::listen_addr("::", 0).unwrap();
        assert!(any.is_ipv6());
        assert_eq!(any.port(), 0);
    }

    #[test]
    fn test_listen_addr_rejects_hostnames() {
        let err = super::listen_addr("localhost", 8000).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("invalid bind address"), "{msg}");
    }

    #[tokio::test]
    async fn test_serve_accepts_ipv6_bind() {
        // Hosts without IPv6 loopback cannot bind; the address itself must
        // still parse, so only a bind-time I/O error is acceptable.
        let handle = tokio::spawn(super::run_serve(SignupService::seeded(), "::1", 0));
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        if handle.is_finished() {
            let err = handle.await.unwrap().unwrap_err();
            assert!(
                err.downcast_ref::<std::io::Error>().is_some(),
                "unexpected error: {err:#}"
            );
        } else {
            handle.abort();
        }
    }

    // -----------------------------------------------------------------------
    // Root
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_root_redirects_to_index() {
        let service = SignupService::seeded();

        let resp = send(&service, Method::GET, "/").await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/static/index.html"
        );
    }

    // -----------------------------------------------------------------------
    // GET /activities
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_all_activities() {
        let service = SignupService::seeded();

        let json = activities(&service).await;
        let obj = json.as_object().expect("response should be an object");
        assert_eq!(obj.len(), 3);
        for name in ["Basketball Team", "Swimming Club", "Drama Club"] {
            let activity = &json[name];
            assert!(activity.get("description").is_some(), "{name}");
            assert!(activity.get("schedule").is_some(), "{name}");
            assert!(
                activity["max_participants"].as_u64().unwrap() > 0,
                "{name} should have positive capacity"
            );
            assert!(activity["participants"].is_array(), "{name}");
        }
    }

    #[tokio::test]
    async fn test_activities_participants() {
        let service = SignupService::seeded();

        let roster = participants(&service, "Basketball Team").await;
        assert_eq!(roster, vec!["james@mergington.edu", "william@mergington.edu"]);
    }

    // -----------------------------------------------------------------------
    // POST /activities/{name}/signup
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_signup_new_participant() {
        let service = SignupService::seeded();

        let resp = send(
            &service,
            Method::POST,
            "/activities/Basketball%20Team/signup?email=new.student@mergington.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(
            json["message"],
            "Signed up new.student@mergington.edu for Basketball Team"
        );

        let roster = participants(&service, "Basketball Team").await;
        assert_eq!(roster.len(), 3);
        assert!(roster.contains(&"new.student@mergington.edu".to_string()));
    }

    #[tokio::test]
    async fn test_signup_duplicate_participant() {
        let service = SignupService::seeded();

        let resp = send(
            &service,
            Method::POST,
            "/activities/Basketball%20Team/signup?email=james@mergington.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(detail(&json).contains("already signed up"), "{json}");

        assert_eq!(participants(&service, "Basketball Team").await.len(), 2);
    }

    #[tokio::test]
    async fn test_signup_nonexistent_activity() {
        let service = SignupService::seeded();
        let before = activities(&service).await;

        let resp = send(
            &service,
            Method::POST,
            "/activities/Nonexistent%20Activity/signup?email=test@mergington.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["detail"], "Activity not found");

        assert_eq!(activities(&service).await, before);
    }

    #[tokio::test]
    async fn test_signup_multiple_participants() {
        let service = SignupService::seeded();
        let emails = [
            "student1@mergington.edu",
            "student2@mergington.edu",
            "student3@mergington.edu",
        ];

        for email in emails {
            let uri = format!("/activities/Drama%20Club/signup?email={email}");
            let resp = send(&service, Method::POST, &uri).await;
            assert_eq!(resp.status(), StatusCode::OK, "{email}");
        }

        let roster = participants(&service, "Drama Club").await;
        assert_eq!(roster.len(), 5);
        for email in emails {
            assert!(roster.contains(&email.to_string()), "{email}");
        }
    }

    #[tokio::test]
    async fn test_signup_decodes_query_email() {
        let service = SignupService::seeded();

        let resp = send(
            &service,
            Method::POST,
            "/activities/Drama%20Club/signup?email=first%2Blast%40mergington.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let roster = participants(&service, "Drama Club").await;
        assert!(roster.contains(&"first+last@mergington.edu".to_string()));
    }

    #[tokio::test]
    async fn test_signup_activity_name_is_case_sensitive() {
        let service = SignupService::seeded();

        let resp = send(
            &service,
            Method::POST,
            "/activities/basketball%20team/signup?email=test@mergington.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_signup_missing_email_is_unprocessable() {
        let service = SignupService::seeded();

        let resp = send(&service, Method::POST, "/activities/Drama%20Club/signup").await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        assert!(json["detail"].is_string(), "{json}");

        assert_eq!(participants(&service, "Drama Club").await.len(), 2);
    }

    #[tokio::test]
    async fn test_signup_past_capacity_is_accepted() {
        let mut registry = ActivityRegistry::new();
        registry.insert(
            "Tiny Club",
            Activity::new("Small", "Mondays", 1).with_participants(["a@mergington.edu"]),
        );
        let service = SignupService::new(registry);

        let resp = send(
            &service,
            Method::POST,
            "/activities/Tiny%20Club/signup?email=b@mergington.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = activities(&service).await;
        assert_eq!(json["Tiny Club"]["max_participants"], 1);
        let roster = json["Tiny Club"]["participants"].as_array().unwrap();
        assert_eq!(roster.len(), 2);
    }

    #[tokio::test]
    async fn test_signup_requires_post() {
        let service = SignupService::seeded();

        let resp = send(
            &service,
            Method::GET,
            "/activities/Drama%20Club/signup?email=x@mergington.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    // -----------------------------------------------------------------------
    // DELETE /activities/{name}/unregister
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_unregister_existing_participant() {
        let service = SignupService::seeded();

        let resp = send(
            &service,
            Method::DELETE,
            "/activities/Basketball%20Team/unregister?email=james@mergington.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(
            json["message"],
            "Unregistered james@mergington.edu from Basketball Team"
        );

        let roster = participants(&service, "Basketball Team").await;
        assert_eq!(roster, vec!["william@mergington.edu"]);
    }

    #[tokio::test]
    async fn test_unregister_nonexistent_participant() {
        let service = SignupService::seeded();

        let resp = send(
            &service,
            Method::DELETE,
            "/activities/Basketball%20Team/unregister?email=notregistered@mergington.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(detail(&json).contains("not registered"), "{json}");

        assert_eq!(participants(&service, "Basketball Team").await.len(), 2);
    }

    #[tokio::test]
    async fn test_unregister_from_nonexistent_activity() {
        let service = SignupService::seeded();

        let resp = send(
            &service,
            Method::DELETE,
            "/activities/Nonexistent%20Activity/unregister?email=test@mergington.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert!(detail(&json).contains("not found"), "{json}");
    }

    #[tokio::test]
    async fn test_signup_and_unregister_workflow() {
        let service = SignupService::seeded();
        let before = participants(&service, "Swimming Club").await;
        let email = "workflow.test@mergington.edu";

        let uri = format!("/activities/Swimming%20Club/signup?email={email}");
        let resp = send(&service, Method::POST, &uri).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let roster = participants(&service, "Swimming Club").await;
        assert!(roster.contains(&email.to_string()));

        let uri = format!("/activities/Swimming%20Club/unregister?email={email}");
        let resp = send(&service, Method::DELETE, &uri).await;
        assert_eq!(resp.status(), StatusCode::OK);

        assert_eq!(participants(&service, "Swimming Club").await, before);
    }

    #[tokio::test]
    async fn test_basketball_scenario_counts() {
        let service = SignupService::seeded();
        assert_eq!(participants(&service, "Basketball Team").await.len(), 2);

        let resp = send(
            &service,
            Method::POST,
            "/activities/Basketball%20Team/signup?email=new@x.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(participants(&service, "Basketball Team").await.len(), 3);

        let resp = send(
            &service,
            Method::DELETE,
            "/activities/Basketball%20Team/unregister?email=james@mergington.edu",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let roster = participants(&service, "Basketball Team").await;
        assert_eq!(roster.len(), 2);
        assert!(!roster.contains(&"james@mergington.edu".to_string()));
    }
}
