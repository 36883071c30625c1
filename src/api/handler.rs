use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::models::*;
use crate::{
    conversation::{ConversationService, Language},
    error::AppResult,
    payment::{PaymentGate, PaymentKind, PaymentPolicy},
};

#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<ConversationService>,
    pub gate: Arc<PaymentGate>,
    pub policy: Arc<PaymentPolicy>,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}

/// POST /api/chat - single completion
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    validate_request(&request)?;

    let language = Language::from_key(request.language.as_deref().unwrap_or("en"));
    info!("Chat request ({} chars, {})", request.prompt.len(), language.key());

    let content = state.conversation.complete(&request.prompt, language).await?;

    Ok(Json(ChatResponse { content }))
}

/// GET /api/v1/payments/policy
pub async fn payment_policy(State(state): State<AppState>) -> AppResult<Json<PolicyResponse>> {
    let policy = &state.policy;

    Ok(Json(PolicyResponse {
        token_mint: policy.token_mint.to_string(),
        recipient: policy.recipient.to_string(),
        token_decimals: policy.token_decimals,
        room_fee: policy.room_fee.to_string(),
        room_fee_base_units: policy.fee_base_units(PaymentKind::RoomCreation)?,
        continuation_fee: policy.continuation_fee.to_string(),
        continuation_fee_base_units: policy.fee_base_units(PaymentKind::Continuation)?,
        continuation_cadence: policy.continuation_cadence,
    }))
}

/// POST /api/v1/payments/reconcile - outcome only, nothing is redeemed
pub async fn reconcile_payment(
    State(state): State<AppState>,
    Json(proof): Json<PaymentProof>,
) -> AppResult<Json<ReconcileResponse>> {
    validate_request(&proof)?;
    let submitted = proof.to_submitted()?;

    let outcome = state
        .gate
        .reconcile(&submitted.signature, &submitted.checkpoint)
        .await;

    Ok(Json(ReconcileResponse::new(proof.signature, &outcome)))
}

/// POST /api/v1/rooms
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> AppResult<(StatusCode, Json<RoomResponse>)> {
    validate_request(&request)?;
    let submitted = request.payment.to_submitted()?;

    state
        .gate
        .redeem(PaymentKind::RoomCreation, &submitted)
        .await?;

    let language = Language::from_key(request.language.as_deref().unwrap_or("en"));
    let room = state
        .conversation
        .rooms()
        .create(request.ai1_role, request.ai2_role, request.topic, language)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(RoomResponse::from_room(room, state.conversation.cadence())),
    ))
}

/// GET /api/v1/rooms/:id
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> AppResult<Json<RoomResponse>> {
    let room = state.conversation.rooms().get(&room_id).await?;
    Ok(Json(RoomResponse::from_room(room, state.conversation.cadence())))
}

/// POST /api/v1/rooms/:id/turns
pub async fn generate_turn(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> AppResult<Json<TurnResponse>> {
    let added = state.conversation.advance(&room_id).await?;
    turn_response(&state, room_id, added).await
}

/// POST /api/v1/rooms/:id/continue
pub async fn continue_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<ContinueRequest>,
) -> AppResult<Json<TurnResponse>> {
    validate_request(&request)?;
    let submitted = request.payment.to_submitted()?;

    // Hold the due point before redeeming so a second payment cannot land on it
    let claim = state
        .conversation
        .rooms()
        .claim_continuation(&room_id, state.conversation.cadence())
        .await?;

    state
        .gate
        .redeem(PaymentKind::Continuation, &submitted)
        .await?;

    let added = state
        .conversation
        .continue_after_payment(claim)
        .await
        .inspect_err(|e| warn!("Paid continuation for {} failed: {}", room_id, e))?;

    turn_response(&state, room_id, added).await
}

async fn turn_response(
    state: &AppState,
    room_id: String,
    added: Vec<crate::conversation::Message>,
) -> AppResult<Json<TurnResponse>> {
    let room = state.conversation.rooms().get(&room_id).await?;

    Ok(Json(TurnResponse {
        continuation_required: room.requires_payment(state.conversation.cadence()),
        message_count: room.messages.len(),
        room_id,
        added,
    }))
}
