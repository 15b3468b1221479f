use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{auth, exam_papers, questions, reactions, sheets};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1",
              Router::new()
                  .merge(auth::router())
                  .merge(sheets::router())
                  .merge(questions::router())
                  .merge(reactions::router())
                  .merge(exam_papers::router())
                  .route("/health", get(|| async { "ok" }))
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
        .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(app: &Router, email: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": email,
                "password": "hunter2hunter2",
                "name": "Asha",
                "institution_name": "VIT-AP"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/api/v1/sheets/by-code/ZZZZZZ", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn creating_a_sheet_requires_a_token() {
        let app = build_app(AppState::fake());
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/sheets",
            None,
            Some(json!({ "title": "DSA" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn registration_outside_institution_domain_is_rejected() {
        let app = build_app(AppState::fake());
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "asha@gmail.com",
                "password": "hunter2hunter2",
                "name": "Asha",
                "institution_name": "VIT-AP"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn shared_sheet_flow_over_http() {
        let app = build_app(AppState::fake());
        let owner = register(&app, "owner@vitapstudent.ac.in").await;
        let viewer = register(&app, "viewer@vitapstudent.ac.in").await;

        let (status, sheet) = call(
            &app,
            Method::POST,
            "/api/v1/sheets",
            Some(&owner),
            Some(json!({ "title": "DSA Prep", "code": "k3f9qz" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sheet["access_code"], "K3F9QZ");
        let sheet_id = sheet["id"].as_str().unwrap().to_string();

        let (status, q) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sheets/{sheet_id}/questions"),
            Some(&owner),
            Some(json!({ "title": "Two Sum", "difficulty": "easy" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let qid = q["id"].as_str().unwrap().to_string();

        let (status, found) = call(&app, Method::GET, "/api/v1/sheets/by-code/K3F9QZ", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["owner_name"], "Asha");

        let (status, _) = call(
            &app,
            Method::GET,
            &format!("/api/v1/sheets/{sheet_id}/questions"),
            Some(&viewer),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, toggled) = call(
            &app,
            Method::POST,
            &format!("/api/v1/questions/{qid}/toggle?code=K3F9QZ"),
            Some(&viewer),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["progress"]["percentage"], 100);

        let (status, _) = call(
            &app,
            Method::DELETE,
            &format!("/api/v1/sheets/{sheet_id}"),
            Some(&viewer),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, reaction) = call(
            &app,
            Method::POST,
            &format!("/api/v1/reactions/sheet/{sheet_id}?code=K3F9QZ"),
            Some(&viewer),
            Some(json!({ "polarity": "like" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reaction["counts"]["likes"], 1);
    }

    #[tokio::test]
    async fn bad_token_on_optional_auth_route_is_unauthorized() {
        let app = build_app(AppState::fake());
        let (status, auth) = call(
            &app,
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "owner@vitapstudent.ac.in",
                "password": "hunter2hunter2",
                "name": "Asha",
                "institution_name": "VIT-AP"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let access = auth["access_token"].as_str().unwrap().to_string();
        let refresh = auth["refresh_token"].as_str().unwrap().to_string();

        let (_, sheet) = call(
            &app,
            Method::POST,
            "/api/v1/sheets",
            Some(&access),
            Some(json!({ "title": "DSA Prep" })),
        )
        .await;
        let uri = format!("/api/v1/sheets/{}", sheet["id"].as_str().unwrap());

        let (status, _) = call(&app, Method::GET, &uri, Some(&access), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, Method::GET, &uri, Some("garbage.token.here"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (status, _) = call(&app, Method::GET, &uri, Some(&refresh), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // no header at all is an anonymous reader, who needs the code
        let (status, _) = call(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let with_code = format!("{uri}?code={}", sheet["access_code"].as_str().unwrap());
        let (status, _) = call(&app, Method::GET, &with_code, None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_item_type_is_a_validation_error() {
        let app = build_app(AppState::fake());
        let uri = format!("/api/v1/reactions/comment/{}", uuid::Uuid::new_v4());
        let (status, _) = call(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
