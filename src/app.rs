use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{auth, people};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api",
              Router::new()
                  .merge(auth::router())
                  .merge(people::router())
        )
        .route("/health", get(|| async { "ok" }))
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
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
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
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn logged_in(app: &Router) -> String {
        let (status, _) = call(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Admin",
                "birth_date": "1980-01-01",
                "document": "529.982.247-25",
                "password": "s3cret!"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "529.982.247-25", "password": "s3cret!" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_open() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn people_routes_require_bearer_token() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/api/v1/people", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].is_string());

        let (status, _) = call(&app, Method::GET, "/api/v2/people", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_failure_is_401_with_fixed_message() {
        let app = build_app(AppState::fake());
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "11144477735", "password": "nope!!" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], crate::error::INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn validate_endpoint_reports_token_validity() {
        let app = build_app(AppState::fake());
        let token = logged_in(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/validate",
            None,
            Some(json!({ "token": token })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);

        let (_, body) = call(
            &app,
            Method::POST,
            "/api/auth/validate",
            None,
            Some(json!({ "token": "garbage" })),
        )
        .await;
        assert_eq!(body["valid"], false);
    }

    #[tokio::test]
    async fn person_lifecycle_across_versions() {
        let app = build_app(AppState::fake());
        let token = logged_in(&app).await;
        let token = Some(token.as_str());

        let (status, created) = call(
            &app,
            Method::POST,
            "/api/v2/people",
            token,
            Some(json!({
                "name": "Maria Souza",
                "sex": "F",
                "birth_date": "1988-03-02",
                "document": "111.444.777-35",
                "address": "Rua das Flores, 123"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["document"], "11144477735");
        assert_eq!(created["address"], "Rua das Flores, 123");
        let id = created["id"].as_i64().unwrap();

        let (status, v1) = call(&app, Method::GET, &format!("/api/v1/people/{id}"), token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(v1.get("address").is_none());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/people",
            token,
            Some(json!({
                "name": "Outra Pessoa",
                "birth_date": "1990-01-01",
                "document": "11144477735"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], crate::people::services::DOCUMENT_IN_USE);

        let (status, body) = call(
            &app,
            Method::PUT,
            &format!("/api/v2/people/{id}"),
            token,
            Some(json!({
                "name": "Maria Souza",
                "birth_date": "1988-03-02",
                "document": "11144477735"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Address is required in version 2");

        let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/people/{id}"), token, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(&app, Method::GET, &format!("/api/v2/people/{id}"), token, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], crate::people::services::PERSON_NOT_FOUND);

        let (status, _) = call(&app, Method::DELETE, &format!("/api/v2/people/{id}"), token, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn v2_list_fills_missing_address_with_empty_string() {
        let app = build_app(AppState::fake());
        let token = logged_in(&app).await;

        let (status, list) = call(&app, Method::GET, "/api/v2/people", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["document"], "52998224725");
        assert_eq!(list[0]["address"], "");
    }
}
