//! HTTP handlers
//!
//! Webhook handlers for both inbound channels, OAuth linking, and the
//! manual send endpoint.

use axum::{
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use relay_core::{ConversationEntry, IntegrationRecord};
use relay_meta::{verify_subscription, WebhookPayload};
use relay_twilio::IncomingForm;

use crate::error::{ApiError, Result};
use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Health response with per-integration feature flags
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub features: FeatureFlags,
}

#[derive(Debug, Serialize)]
pub struct FeatureFlags {
    pub meta_send: bool,
    pub twilio: bool,
    pub llm: bool,
    pub oauth: bool,
    pub store: bool,
}

/// Cloud API verification handshake query parameters
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode", default)]
    pub mode: String,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: String,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: String,
}

/// Manual send request payload
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub message: String,
}

/// Manual send response payload
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub success: bool,
    pub message_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthStartParams {
    pub uid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackParams {
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthTokenParams {
    pub uid: Option<String>,
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check, reporting which integrations are active
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "whatsapp-relay-gateway",
        features: FeatureFlags {
            meta_send: state.meta.is_some(),
            twilio: state.twilio.is_some(),
            llm: state.llm.is_enabled(),
            oauth: state.oauth.is_some(),
            store: state.store.is_some(),
        },
    })
}

/// Cloud API webhook verification handshake.
///
/// Echoes the challenge on a matching subscribe request, 403 otherwise.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    if verify_subscription(&state.config.verify_token, &params.mode, &params.verify_token) {
        info!("Webhook verification succeeded");
        (StatusCode::OK, params.challenge)
    } else {
        warn!("Webhook verification failed: mode={}", params.mode);
        (StatusCode::FORBIDDEN, String::new())
    }
}

/// Cloud API message-event webhook.
///
/// Always acknowledges with 200: a non-2xx response makes the platform
/// retry and eventually disable the subscription, so processing errors
/// are logged and swallowed here.
pub async fn meta_webhook(State(state): State<AppState>, body: String) -> StatusCode {
    let payload: WebhookPayload = match serde_json::from_str(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!("Ignoring malformed webhook payload: {}", e);
            return StatusCode::OK;
        }
    };

    let Some(inbound) = payload.first_text_message() else {
        debug!("Webhook event carried no text message");
        return StatusCode::OK;
    };

    info!("Inbound message from {}", inbound.from);
    let reply = state.llm.generate_reply(&inbound.body).await;

    match &state.meta {
        Some(meta) => {
            if let Err(e) = meta.send_message(&inbound.from, &reply).await {
                error!("Failed to send reply to {}: {}", inbound.from, e);
            } else {
                log_exchange(&state, &inbound.from, &inbound.body, &reply).await;
            }
        }
        None => {
            warn!("Reply generated but Cloud API sending is not configured");
        }
    }

    StatusCode::OK
}

/// Twilio inbound message webhook
pub async fn twilio_webhook(
    State(state): State<AppState>,
    Form(form): Form<IncomingForm>,
) -> Result<StatusCode> {
    if !form.is_complete() {
        return Err(ApiError::InvalidRequest("Missing Body or From".to_string()));
    }

    // is_complete guarantees both fields are present and non-empty
    let (from, body) = match (form.sender(), form.body.as_deref()) {
        (Some(from), Some(body)) => (from.to_string(), body.to_string()),
        _ => return Err(ApiError::InvalidRequest("Missing Body or From".to_string())),
    };

    info!("Inbound Twilio message from {}", from);
    let reply = state.llm.generate_reply(&body).await;

    let Some(twilio) = &state.twilio else {
        return Err(ApiError::NotConfigured("twilio sending"));
    };

    twilio.send_message(&from, &reply).await.map_err(|e| {
        error!("Failed to send Twilio reply to {}: {}", from, e);
        ApiError::Twilio(e)
    })?;

    log_exchange(&state, &from, &body, &reply).await;
    Ok(StatusCode::OK)
}

/// Manual outbound send, for checking Cloud API credentials
pub async fn send_test_message(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendResponse>> {
    if req.to.is_empty() || req.message.is_empty() {
        return Err(ApiError::InvalidRequest(
            "Both 'to' and 'message' are required".to_string(),
        ));
    }

    let Some(meta) = &state.meta else {
        return Err(ApiError::NotConfigured("cloud api sending"));
    };

    let message_id = meta.send_message(&req.to, &req.message).await.map_err(|e| {
        error!("Manual send to {} failed: {}", req.to, e);
        ApiError::Meta(e)
    })?;

    Ok(Json(SendResponse {
        success: true,
        message_id,
    }))
}

/// Begin the OAuth linking flow: redirect to the Meta login dialog with
/// the user id as `state`
pub async fn auth_start(
    State(state): State<AppState>,
    Query(params): Query<AuthStartParams>,
) -> Result<impl IntoResponse> {
    let uid = params
        .uid
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("Missing uid".to_string()))?;

    let Some(oauth) = &state.oauth else {
        return Err(ApiError::NotConfigured("oauth linking"));
    };

    let url = oauth.authorize_url(&uid);
    debug!("Starting OAuth flow for uid={}", uid);
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}

/// OAuth callback: exchange the code, store the integration record, and
/// bounce back to the frontend
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<AuthCallbackParams>,
) -> Result<impl IntoResponse> {
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("Missing authorization code".to_string()))?;

    let Some(oauth) = &state.oauth else {
        return Err(ApiError::NotConfigured("oauth linking"));
    };

    let linked = oauth.link(&code).await.map_err(|e| {
        error!("OAuth exchange failed: {}", e);
        ApiError::Meta(e)
    })?;

    let uid = params.state.unwrap_or_default();
    if let Some(store) = &state.store {
        if uid.is_empty() {
            warn!("OAuth callback without state, integration not persisted");
        } else {
            let record = IntegrationRecord::new(
                &uid,
                &linked.access_token,
                &linked.waba_id,
                &linked.phone_number,
            );
            store.upsert_integration(&record).map_err(|e| {
                error!("Failed to persist integration for uid={}: {}", uid, e);
                ApiError::Core(e)
            })?;
            info!("Stored integration for uid={}", uid);
        }
    }

    let frontend = state.config.server.frontend_url.clone();
    Ok((StatusCode::FOUND, [(header::LOCATION, frontend)]))
}

/// Fetch the stored integration record for a user
pub async fn auth_token(
    State(state): State<AppState>,
    Query(params): Query<AuthTokenParams>,
) -> Result<Json<IntegrationRecord>> {
    let uid = params
        .uid
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("Missing uid".to_string()))?;

    let Some(store) = &state.store else {
        return Err(ApiError::NotConfigured("persistence"));
    };

    match store.get_integration(&uid)? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("No integration for uid={}", uid))),
    }
}

/// Append both sides of an exchange to the conversation log, when
/// persistence is enabled. Log failures never fail the request.
async fn log_exchange(state: &AppState, user_id: &str, inbound: &str, reply: &str) {
    let Some(store) = &state.store else {
        return;
    };

    if let Err(e) = store.append_message(&ConversationEntry::user(user_id, inbound)) {
        warn!("Failed to log inbound message: {}", e);
    }
    if let Err(e) = store.append_message(&ConversationEntry::bot(user_id, reply)) {
        warn!("Failed to log reply: {}", e);
    }
}
