//! Webhook HTTP server (axum)

pub mod rate_limit;

use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

use crate::application::services::{ProcessMessageRequest, ProcessMessageUseCase};

pub use rate_limit::{RateLimited, RateLimiter};

const INVALID_PAYLOAD: &str = "Payload inválido";
const PROCESSED: &str = "Mensagem processada com sucesso";
const TOO_MANY_REQUESTS: &str = "Muitas requisições, tente novamente mais tarde";
const NOT_FOUND: &str = "Endpoint não encontrado";

#[derive(Clone)]
pub struct AppState {
    use_case: Arc<ProcessMessageUseCase>,
    limiter: Arc<RateLimiter>,
    started_at: Instant,
}

impl AppState {
    pub fn new(use_case: Arc<ProcessMessageUseCase>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            use_case,
            limiter,
            started_at: Instant::now(),
        }
    }
}

/// Twilio WhatsApp webhook fields we read
#[derive(Debug, Deserialize)]
pub struct TwilioPayload {
    #[serde(rename = "Body")]
    body: Option<String>,
    #[serde(rename = "WaId")]
    wa_id: Option<String>,
    #[serde(rename = "From")]
    from: Option<String>,
}

impl TwilioPayload {
    fn into_request(self) -> Option<ProcessMessageRequest> {
        let phone = self.wa_id.or_else(|| {
            self.from.map(|f| {
                f.trim()
                    .trim_start_matches("whatsapp:")
                    .trim_start_matches('+')
                    .to_string()
            })
        });
        request(phone, self.body)
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonPayload {
    phone: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookReply {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl WebhookReply {
    fn ok() -> Self {
        Self {
            success: true,
            message: Some(PROCESSED.to_string()),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReply {
    status: &'static str,
    timestamp: String,
    uptime_seconds: u64,
}

fn request(phone: Option<String>, message: Option<String>) -> Option<ProcessMessageRequest> {
    let phone = phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())?;
    let message = message.filter(|m| !m.trim().is_empty())?;
    Some(ProcessMessageRequest::new(phone, message))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(twilio_webhook))
        .route("/webhook/json", post(json_webhook))
        .fallback(not_found)
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(addr: &str, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Webhook server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health(State(state): State<AppState>) -> Json<HealthReply> {
    Json(HealthReply {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

async fn twilio_webhook(
    State(state): State<AppState>,
    payload: Result<Form<TwilioPayload>, FormRejection>,
) -> Response {
    let request = match payload {
        Ok(Form(payload)) => payload.into_request(),
        Err(e) => {
            tracing::debug!("Rejected Twilio payload: {}", e);
            None
        }
    };
    handle(&state, request).await
}

async fn json_webhook(
    State(state): State<AppState>,
    payload: Result<Json<JsonPayload>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(payload)) => request(payload.phone, payload.message),
        Err(e) => {
            tracing::debug!("Rejected JSON payload: {}", e);
            None
        }
    };
    handle(&state, request).await
}

async fn handle(state: &AppState, request: Option<ProcessMessageRequest>) -> Response {
    let Some(request) = request else {
        return (StatusCode::BAD_REQUEST, Json(WebhookReply::failed(INVALID_PAYLOAD))).into_response();
    };

    if let Err(limited) = state.limiter.check(&request.phone_number) {
        tracing::warn!(phone = %request.phone_number, "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, limited.retry_after.as_secs().max(1).to_string())],
            Json(WebhookReply::failed(TOO_MANY_REQUESTS)),
        )
            .into_response();
    }

    let response = state.use_case.execute(request).await;
    if response.success {
        (StatusCode::OK, Json(WebhookReply::ok())).into_response()
    } else {
        let error = response.error.unwrap_or_else(|| "Erro interno".to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, Json(WebhookReply::failed(error))).into_response()
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(WebhookReply::failed(NOT_FOUND))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::application::errors::MessagingError;
    use crate::domain::traits::{ChatMessenger, DeliveryReport, OutboundMessage};
    use crate::infrastructure::email::LogEmailService;
    use crate::infrastructure::storage::{InMemoryChatSessionRepository, InMemoryMenuRepository};

    struct SilentMessenger {
        fail: bool,
    }

    #[async_trait]
    impl ChatMessenger for SilentMessenger {
        async fn send_message(&self, _message: &OutboundMessage) -> Result<DeliveryReport, MessagingError> {
            if self.fail {
                return Err(MessagingError::Network("connection refused".to_string()));
            }
            Ok(DeliveryReport::success("ok"))
        }

        async fn get_message_status(&self, message_id: &str) -> Result<DeliveryReport, MessagingError> {
            Ok(DeliveryReport::success("ok").with_message_id(message_id))
        }

        fn provider(&self) -> &str {
            "test"
        }
    }

    fn app_with(fail: bool, max_requests: u32) -> Router {
        let use_case = ProcessMessageUseCase::new(
            Arc::new(InMemoryChatSessionRepository::new()),
            Arc::new(InMemoryMenuRepository::default()),
            Arc::new(SilentMessenger { fail }),
            Arc::new(LogEmailService),
        );
        router(AppState::new(Arc::new(use_case), Arc::new(RateLimiter::new(max_requests, 60))))
    }

    fn app() -> Router {
        app_with(false, 100)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook/json")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["timestamp"].is_string());
        assert!(json["uptime_seconds"].is_u64());
    }

    #[tokio::test]
    async fn test_twilio_webhook_processes_message() {
        let response = app()
            .oneshot(form_request("Body=oi&WaId=5511999999999&From=whatsapp%3A%2B5511999999999"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], PROCESSED);
    }

    #[tokio::test]
    async fn test_twilio_webhook_falls_back_to_from() {
        let response = app()
            .oneshot(form_request("Body=oi&From=whatsapp%3A%2B5511999999999"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_twilio_webhook_missing_body() {
        let response = app().oneshot(form_request("WaId=5511999999999")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], INVALID_PAYLOAD);
    }

    #[tokio::test]
    async fn test_json_webhook() {
        let response = app()
            .oneshot(json_request(r#"{"phone":"5511999999999","message":"oi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_json_webhook_blank_message() {
        let response = app()
            .oneshot(json_request(r#"{"phone":"5511999999999","message":"   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_json_webhook_malformed() {
        let response = app().oneshot(json_request("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_failed_turn_is_500() {
        let response = app_with(true, 100)
            .oneshot(json_request(r#"{"phone":"5511999999999","message":"oi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let app = app_with(false, 1);

        let first = app
            .clone()
            .oneshot(json_request(r#"{"phone":"5511999999999","message":"oi"}"#))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(json_request(r#"{"phone":"5511999999999","message":"1"}"#))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(header::RETRY_AFTER));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], NOT_FOUND);
    }
}
