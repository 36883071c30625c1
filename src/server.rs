use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    api::handler::{
        chat, continue_room, create_room, generate_turn, get_room, health_check, payment_policy,
        reconcile_payment, AppState,
    },
    middleware::{create_cors_layer, rate_limit_middleware, RateLimitLayer},
};

pub fn create_app(state: AppState, cors_origins: &[String], rate_limit: RateLimitLayer) -> Router {
    info!("⚙️ Setting up HTTP routes...");

    // Endpoints that spend completion tokens or ledger calls share one limiter
    let limited = Router::new()
        .route("/api/chat", post(chat))
        .route("/api/v1/payments/reconcile", post(reconcile_payment))
        .route("/api/v1/rooms", post(create_room))
        .route("/api/v1/rooms/:id/turns", post(generate_turn))
        .route("/api/v1/rooms/:id/continue", post(continue_room))
        .route_layer(from_fn_with_state(rate_limit, rate_limit_middleware));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/payments/policy", get(payment_policy))
        .route("/api/v1/rooms/:id", get(get_room))
        .merge(limited)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(state);

    info!("✓ HTTP routes configured");
    app
}

pub async fn run_server(app: Router, bind_address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🌐 Server listening on: {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        conversation::{service::tests::StubCompletion, ConversationService, Language, RoomRepository},
        payment::{
            testing::{confirmed, paid_fee, StubLedger},
            PaymentGate, PaymentKind, PaymentPolicy,
        },
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state_with(ledger: Arc<StubLedger>) -> AppState {
        let policy = Arc::new(PaymentPolicy::default());
        AppState {
            conversation: Arc::new(ConversationService::new(
                Arc::new(StubCompletion::default()),
                RoomRepository::new(),
                3,
            )),
            gate: Arc::new(PaymentGate::new(ledger, policy.clone())),
            policy,
        }
    }

    fn router(state: AppState, limit: u32) -> Router {
        create_app(state, &["http://localhost:3000".to_string()], RateLimitLayer::per_minute(limit))
    }

    fn app_with(ledger: StubLedger, limit: u32) -> Router {
        router(state_with(Arc::new(ledger)), limit)
    }

    fn proof() -> serde_json::Value {
        serde_json::json!({
            "signature": solana_sdk::signature::Signature::new_unique().to_string(),
            "blockhash": solana_sdk::hash::Hash::new_from_array([1; 32]).to_string(),
            "last_valid_block_height": 10,
        })
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app_with(StubLedger::new(), 10)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chat_returns_content() {
        let response = app_with(StubLedger::new(), 10)
            .oneshot(post_json(
                "/api/chat",
                serde_json::json!({ "prompt": "hello", "language": "zz" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["content"], "scripted");
    }

    #[tokio::test]
    async fn test_chat_rate_limited() {
        let app = app_with(StubLedger::new(), 1);
        let body = serde_json::json!({ "prompt": "hello" });

        let first = app.clone().oneshot(post_json("/api/chat", body.clone())).await.unwrap();
        let second = app.oneshot(post_json("/api/chat", body)).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_policy_lists_base_units() {
        let response = app_with(StubLedger::new(), 10)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/payments/policy")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["room_fee_base_units"], 1_000_000_000_000u64);
        assert_eq!(body["continuation_cadence"], 3);
    }

    #[tokio::test]
    async fn test_room_creation_requires_confirmed_payment() {
        let room = serde_json::json!({
            "ai1_role": "Plato",
            "ai2_role": "Turing",
            "topic": "minds",
            "language": "en",
            "payment": proof(),
        });

        let expired = app_with(
            StubLedger::new()
                .wait(Err(crate::error::LedgerError::BlockHeightExceeded {
                    signature: "sig".to_string(),
                })),
            10,
        )
        .oneshot(post_json("/api/v1/rooms", room.clone()))
        .await
        .unwrap();

        assert_eq!(expired.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(json_body(expired).await["error_code"], "TRANSACTION_EXPIRED");

        let created = app_with(
            StubLedger::new()
                .status(Ok(confirmed()))
                .record(Ok(paid_fee(PaymentKind::RoomCreation))),
            10,
        )
        .oneshot(post_json("/api/v1/rooms", room))
        .await
        .unwrap();

        assert_eq!(created.status(), StatusCode::CREATED);
        let body = json_body(created).await;
        assert_eq!(body["ai1_role"], "Plato");
        assert_eq!(body["continuation_required"], false);
    }

    #[tokio::test]
    async fn test_unknown_room_is_404() {
        let response = app_with(StubLedger::new(), 10)
            .oneshot(post_json("/api/v1/rooms/missing/turns", serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_room_creation_rate_limited() {
        let app = app_with(StubLedger::new(), 1);
        let room = serde_json::json!({
            "ai1_role": "",
            "ai2_role": "Turing",
            "topic": "minds",
            "payment": proof(),
        });

        let first = app.clone().oneshot(post_json("/api/v1/rooms", room.clone())).await.unwrap();
        let second = app.oneshot(post_json("/api/v1/rooms", room)).await.unwrap();

        assert_eq!(first.status(), StatusCode::BAD_REQUEST);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_concurrent_continuations_redeem_one_payment() {
        let ledger = Arc::new(
            StubLedger::new()
                .yielding()
                .status(Ok(confirmed()))
                .record(Ok(paid_fee(PaymentKind::Continuation)))
                .status(Ok(confirmed()))
                .record(Ok(paid_fee(PaymentKind::Continuation))),
        );
        let state = state_with(ledger.clone());
        let room = state
            .conversation
            .rooms()
            .create(
                "Plato".to_string(),
                "Turing".to_string(),
                "minds".to_string(),
                Language::En,
            )
            .await;
        for _ in 0..4 {
            state.conversation.advance(&room.id).await.unwrap();
        }

        let app = router(state.clone(), 10);
        let uri = format!("/api/v1/rooms/{}/continue", room.id);
        let (first, second) = tokio::join!(
            app.clone().oneshot(post_json(&uri, serde_json::json!({ "payment": proof() }))),
            app.oneshot(post_json(&uri, serde_json::json!({ "payment": proof() }))),
        );

        let mut statuses = vec![first.unwrap().status(), second.unwrap().status()];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);

        let redeemed = ledger
            .calls()
            .iter()
            .filter(|call| **call == "signature_status")
            .count();
        assert_eq!(redeemed, 1);
        assert_eq!(
            state.conversation.rooms().get(&room.id).await.unwrap().messages.len(),
            6
        );
    }
}
