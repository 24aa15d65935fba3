// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::any::Any;

use axum::{
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    models::{MessageResponse, TransactionView, UserProfile},
    state::AppState,
    storage::{EntryKind, EntryStatus},
};

pub mod auth;
pub mod extract;
pub mod health;
pub mod transactions;
pub mod wallet;

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/verify-email", post(auth::verify_email))
        .route("/resend-verification", post(auth::resend_verification))
        .route("/update", put(auth::update_account))
        .route("/change-password", post(auth::change_password))
        .route("/delete", delete(auth::delete_account));

    let wallet_routes = Router::new()
        .route("/balance", get(wallet::get_balance))
        .route("/fund", post(wallet::fund_wallet))
        .route("/deduct", post(wallet::deduct_wallet));

    let transaction_routes = Router::new()
        .route("/create", post(transactions::create_transaction))
        .route("/history", get(transactions::get_history))
        .route("/{reference}", get(transactions::get_transaction));

    let app = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/wallet", wallet_routes)
        .nest("/api/transactions", transaction_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found);

    with_middleware(app)
}

/// Request IDs, tracing, panic recovery and CORS, outermost first.
fn with_middleware(app: Router) -> Router {
    app.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(CorsLayer::permissive()),
    )
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::internal(format!("handler panicked: {detail}")).into_response()
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::root,
        health::health_check,
        auth::signup,
        auth::login,
        auth::verify_email,
        auth::resend_verification,
        auth::update_account,
        auth::change_password,
        auth::delete_account,
        wallet::get_balance,
        wallet::fund_wallet,
        wallet::deduct_wallet,
        transactions::create_transaction,
        transactions::get_history,
        transactions::get_transaction
    ),
    components(
        schemas(
            MessageResponse,
            UserProfile,
            TransactionView,
            EntryKind,
            EntryStatus,
            health::HealthResponse,
            auth::SignupRequest,
            auth::SignupResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::VerifyEmailRequest,
            auth::ResendVerificationResponse,
            auth::UpdateAccountRequest,
            auth::UpdateAccountResponse,
            auth::ChangePasswordRequest,
            wallet::BalanceResponse,
            wallet::WalletAmountRequest,
            wallet::WalletUpdateResponse,
            transactions::CreateTransactionRequest,
            transactions::CreateTransactionResponse,
            transactions::HistoryResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness probes"),
        (name = "Auth", description = "Signup, login and account management"),
        (name = "Wallet", description = "Wallet balance funding and deduction"),
        (name = "Transactions", description = "Transaction ledger")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn signup_and_login(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({"username": "ada", "email": email, "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": email, "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn root_and_health_respond() {
        let (state, _dir) = test_state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Backend is running");

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let (state, _dir) = test_state();
        let app = router(state);

        let (status, body) = send(&app, Method::GET, "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn wrong_method_on_known_path_returns_json_404() {
        let (state, _dir) = test_state();
        let app = router(state);

        for (method, uri) in [
            (Method::GET, "/api/wallet/fund"),
            (Method::POST, "/api/transactions/history"),
            (Method::DELETE, "/health"),
        ] {
            let (status, body) = send(&app, method, uri, None, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["message"], "Route not found");
        }
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let (state, _dir) = test_state();
        let app = router(state);

        let (status, body) = send(&app, Method::GET, "/api-doc/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/wallet/fund"].is_object());
        assert!(body["components"]["securitySchemes"]["bearer"].is_object());
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let (state, _dir) = test_state();
        let app = router(state);

        let (status, body) = send(&app, Method::GET, "/api/wallet/balance", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "No token provided");
        assert_eq!(body["errorCode"], "missing_auth_header");

        let (status, body) =
            send(&app, Method::GET, "/api/transactions/history", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (state, _dir) = test_state();
        let app = router(state);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn wallet_flow_end_to_end() {
        let (state, _dir) = test_state();
        let app = router(state);
        let token = signup_and_login(&app, "ada@example.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/wallet/fund",
            Some(&token),
            Some(json!({"amount": 100})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["walletBalance"], json!(100.0));
        assert_eq!(body["transaction"]["type"], "fund");
        assert_eq!(body["transaction"]["balanceBefore"], json!(0.0));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/wallet/deduct",
            Some(&token),
            Some(json!({"amount": 150})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Insufficient balance");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/wallet/deduct",
            Some(&token),
            Some(json!({"amount": 50, "description": "MTN airtime"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Purchase successful");
        assert_eq!(body["walletBalance"], json!(50.0));
        let reference = body["transaction"]["reference"].as_str().unwrap().to_string();

        let (status, body) = send(&app, Method::GET, "/api/wallet/balance", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["walletBalance"], json!(50.0));

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/transactions/history?type=purchase",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let transactions = body["transactions"].as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["reference"], reference.as_str());

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/transactions/history?status=bogus",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/transactions/{reference}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["description"], "MTN airtime");

        let other = signup_and_login(&app, "bob@example.com").await;
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/transactions/{reference}"),
            Some(&other),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Transaction not found");
    }

    #[tokio::test]
    async fn create_transaction_route_returns_201() {
        let (state, _dir) = test_state();
        let app = router(state);
        let token = signup_and_login(&app, "ada@example.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/transactions/create",
            Some(&token),
            Some(json!({"type": "electricity", "amount": 2500})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["message"], "Transaction recorded successfully");
        assert_eq!(body["transaction"]["status"], "pending");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/transactions/create",
            Some(&token),
            Some(json!({"type": "lottery", "amount": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn panics_become_generic_500() {
        async fn boom() -> &'static str {
            panic!("boom")
        }
        let app = with_middleware(Router::new().route("/boom", get(boom)));

        let (status, body) = send(&app, Method::GET, "/boom", None, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Something went wrong");
    }
}
