use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use cupid_core::{
    Accounts, ConversationManager, Discovery, MatchRegistry, MessageStore, Moderation,
    SwipeEngine,
};
use cupid_shared::models::{
    BlockedUser, ConversationSummary, MatchSummary, MessageView, NearbyUser, Report,
    ReportReason, ReportStatus, SentMessage, Swipe, UserStats,
};
use cupid_shared::{ConversationId, SwipeDirection, UserId};
use cupid_store::Database;

use crate::auth::{verify_admin_token, AuthUser};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::realtime::Notifier;
use crate::ws::ws_handler;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub notifier: Notifier,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
    pub ws_connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            notifier: Notifier::new(),
            rate_limiter: RateLimiter::default(),
            config: Arc::new(config),
            ws_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn message_store<'a>(&self, db: &'a Database) -> MessageStore<'a, Database> {
        MessageStore::new(db).with_max_len(self.config.max_message_len)
    }
}

pub fn build_router(state: AppState) -> Router {
    let origin = match state.config.cors_origin.as_deref() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!(origin, "Invalid CORS_ORIGIN, allowing any origin");
                AllowOrigin::any()
            }
        },
        None => AllowOrigin::any(),
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let api = Router::new()
        .route("/swipe", post(swipe))
        .route("/matches", get(list_matches))
        .route("/swipes", get(swipe_history))
        .route("/location", post(update_location))
        .route("/nearby", get(nearby_users))
        .route(
            "/conversations",
            get(list_conversations).post(start_conversation),
        )
        .route("/conversations/:id/messages", get(list_messages))
        .route("/conversations/:id/read", post(mark_read))
        .route("/messages", post(send_message))
        .route("/moderation/block", post(block_user))
        .route("/moderation/block/:user_id", delete(unblock_user))
        .route("/moderation/blocked", get(list_blocked))
        .route("/moderation/blocked/:user_id", get(is_blocked))
        .route("/moderation/report", post(report_user))
        .route("/moderation/reports", get(list_reports))
        .route("/account/pause", put(pause_account))
        .route("/account/reactivate", put(reactivate_account))
        .route("/account/stats", get(account_stats));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws_handler))
        .route("/admin/reports/:id", put(admin_review_report))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwipeRequest {
    swipee_id: UserId,
    direction: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwipeResponse {
    matched: bool,
}

#[derive(Serialize)]
struct MatchesResponse {
    matches: Vec<MatchSummary>,
}

#[derive(Serialize)]
struct SwipesResponse {
    swipes: Vec<Swipe>,
}

#[derive(Deserialize)]
struct LocationRequest {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NearbyQuery {
    latitude: f64,
    longitude: f64,
    max_distance_km: Option<f64>,
}

#[derive(Serialize)]
struct NearbyResponse {
    users: Vec<NearbyUser>,
}

#[derive(Serialize)]
struct ConversationsResponse {
    conversations: Vec<ConversationSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartConversationRequest {
    other_user_id: UserId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartConversationResponse {
    conversation_id: ConversationId,
}

#[derive(Serialize)]
struct MessagesResponse {
    messages: Vec<MessageView>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    conversation_id: ConversationId,
    message_text: String,
}

#[derive(Serialize)]
struct SendMessageResponse {
    message: SentMessage,
}

#[derive(Serialize)]
struct MarkReadResponse {
    updated: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockRequest {
    blocked_user_id: UserId,
    reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockedUsersResponse {
    blocked_users: Vec<BlockedUser>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IsBlockedResponse {
    is_blocked: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRequest {
    reported_user_id: UserId,
    reason: String,
    description: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    report_id: i64,
}

#[derive(Serialize)]
struct ReportsResponse {
    reports: Vec<Report>,
}

#[derive(Deserialize)]
struct ReviewReportRequest {
    status: ReportStatus,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn swipe(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<SwipeRequest>,
) -> Result<Json<SwipeResponse>, ServerError> {
    let direction: SwipeDirection = req.direction.parse()?;
    let db = state.db.lock().await;
    let outcome = SwipeEngine::new(&*db).record_swipe(user.id, req.swipee_id, direction)?;
    Ok(Json(SwipeResponse {
        matched: outcome.matched,
    }))
}

async fn list_matches(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MatchesResponse>, ServerError> {
    let db = state.db.lock().await;
    let matches = MatchRegistry::new(&*db).list_matches(user.id)?;
    Ok(Json(MatchesResponse { matches }))
}

async fn swipe_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SwipesResponse>, ServerError> {
    let db = state.db.lock().await;
    let swipes = SwipeEngine::new(&*db).swipe_history(user.id)?;
    Ok(Json(SwipesResponse { swipes }))
}

async fn update_location(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<LocationRequest>,
) -> Result<StatusCode, ServerError> {
    let db = state.db.lock().await;
    Discovery::new(&*db).update_location(user.id, req.latitude, req.longitude)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn nearby_users(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<NearbyQuery>,
) -> Result<Json<NearbyResponse>, ServerError> {
    let max_km = query
        .max_distance_km
        .unwrap_or(state.config.default_nearby_km);
    let db = state.db.lock().await;
    let users =
        Discovery::new(&*db).nearby_users(user.id, query.latitude, query.longitude, max_km)?;
    Ok(Json(NearbyResponse { users }))
}

async fn list_conversations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ConversationsResponse>, ServerError> {
    let db = state.db.lock().await;
    let conversations = state.message_store(&db).list_conversations(user.id)?;
    Ok(Json(ConversationsResponse { conversations }))
}

async fn start_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<StartConversationRequest>,
) -> Result<Json<StartConversationResponse>, ServerError> {
    let db = state.db.lock().await;
    let conversation_id =
        ConversationManager::new(&*db).start_conversation(user.id, req.other_user_id)?;
    Ok(Json(StartConversationResponse { conversation_id }))
}

/// List the conversation, then mark what the caller just saw as read.
async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessagesResponse>, ServerError> {
    let conversation = ConversationId(id);
    let (messages, updated) = {
        let db = state.db.lock().await;
        let store = state.message_store(&db);
        let messages = store.list_messages(conversation, user.id)?;
        let updated = store.mark_read(conversation, user.id)?;
        (messages, updated)
    };

    if updated > 0 {
        state.notifier.broadcast_read(conversation, user.id).await;
    }
    Ok(Json(MessagesResponse { messages }))
}

async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MarkReadResponse>, ServerError> {
    let conversation = ConversationId(id);
    let updated = {
        let db = state.db.lock().await;
        state.message_store(&db).mark_read(conversation, user.id)?
    };

    state.notifier.broadcast_read(conversation, user.id).await;
    Ok(Json(MarkReadResponse { updated }))
}

async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), ServerError> {
    let message = {
        let db = state.db.lock().await;
        state
            .message_store(&db)
            .send_message(req.conversation_id, user.id, &req.message_text)?
    };

    state.notifier.broadcast_new_message(&message).await;
    info!(
        conversation = %message.conversation_id,
        sender = %message.sender_id,
        "Message sent via API"
    );
    Ok((StatusCode::CREATED, Json(SendMessageResponse { message })))
}

async fn block_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<BlockRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let db = state.db.lock().await;
    Moderation::new(&*db).block_user(user.id, req.blocked_user_id, req.reason.as_deref())?;
    Ok(Json(serde_json::json!({ "blocked": true })))
}

async fn unblock_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(blocked): ApiPath<i64>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let db = state.db.lock().await;
    Moderation::new(&*db).unblock_user(user.id, UserId(blocked))?;
    Ok(Json(serde_json::json!({ "unblocked": true })))
}

async fn list_blocked(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<BlockedUsersResponse>, ServerError> {
    let db = state.db.lock().await;
    let blocked_users = Moderation::new(&*db).list_blocked(user.id)?;
    Ok(Json(BlockedUsersResponse { blocked_users }))
}

async fn is_blocked(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(other): ApiPath<i64>,
) -> Result<Json<IsBlockedResponse>, ServerError> {
    let db = state.db.lock().await;
    let is_blocked = Moderation::new(&*db).is_blocked(user.id, UserId(other))?;
    Ok(Json(IsBlockedResponse { is_blocked }))
}

async fn report_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ReportRequest>,
) -> Result<(StatusCode, Json<ReportResponse>), ServerError> {
    let reason: ReportReason = req.reason.parse()?;
    let db = state.db.lock().await;
    let report_id = Moderation::new(&*db).report_user(
        user.id,
        req.reported_user_id,
        reason,
        req.description.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(ReportResponse { report_id })))
}

async fn list_reports(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ReportsResponse>, ServerError> {
    let db = state.db.lock().await;
    let reports = Moderation::new(&*db).list_reports(user.id)?;
    Ok(Json(ReportsResponse { reports }))
}

async fn pause_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, ServerError> {
    let db = state.db.lock().await;
    Accounts::new(&*db).pause(user.id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reactivate_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, ServerError> {
    let db = state.db.lock().await;
    Accounts::new(&*db).reactivate(user.id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn account_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserStats>, ServerError> {
    let db = state.db.lock().await;
    let stats = Accounts::new(&*db).stats(user.id)?;
    Ok(Json(stats))
}

async fn admin_review_report(
    headers: HeaderMap,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<ReviewReportRequest>,
) -> Result<StatusCode, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let db = state.db.lock().await;
    Moderation::new(&*db).review_report(id, req.status)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::auth::issue_token;

    struct TestApp {
        _dir: tempfile::TempDir,
        state: AppState,
        ada: UserId,
        bo: UserId,
    }

    impl TestApp {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let db = Database::open_at(&dir.path().join("cupid.db")).unwrap();
            let ada = db.create_user("Ada", None).unwrap().id;
            let bo = db.create_user("Bo", Some("uploads/bo.png")).unwrap().id;
            Self {
                _dir: dir,
                state: AppState::new(db, ServerConfig::default()),
                ada,
                bo,
            }
        }

        fn token(&self, user: UserId) -> String {
            let name = if user == self.ada { "Ada" } else { "Bo" };
            issue_token(user, name, &self.state.config.jwt_secret)
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            user: Option<UserId>,
            body: Option<serde_json::Value>,
        ) -> (StatusCode, serde_json::Value) {
            self.call_raw(method, uri, user, body.map(|json| json.to_string()))
                .await
        }

        async fn call_raw(
            &self,
            method: Method,
            uri: &str,
            user: Option<UserId>,
            body: Option<String>,
        ) -> (StatusCode, serde_json::Value) {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(user) = user {
                req = req.header("authorization", format!("Bearer {}", self.token(user)));
            }
            let req = match body {
                Some(text) => req
                    .header("content-type", "application/json")
                    .body(Body::from(text))
                    .unwrap(),
                None => req.body(Body::empty()).unwrap(),
            };

            let response = build_router(self.state.clone()).oneshot(req).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        async fn swipe_right(&self, from: UserId, to: UserId) -> serde_json::Value {
            let (status, body) = self
                .call(
                    Method::POST,
                    "/api/swipe",
                    Some(from),
                    Some(serde_json::json!({ "swipeeId": to, "direction": "right" })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body
        }
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn api_requires_bearer_token() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/api/matches", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");
    }

    #[tokio::test]
    async fn swipe_match_and_chat_over_http() {
        let app = TestApp::new();

        assert_eq!(app.swipe_right(app.ada, app.bo).await["matched"], false);
        assert_eq!(app.swipe_right(app.bo, app.ada).await["matched"], true);

        let (_, matches) = app.call(Method::GET, "/api/matches", Some(app.ada), None).await;
        assert_eq!(matches["matches"][0]["otherUser"]["avatar"], "uploads/bo.png");

        let (status, started) = app
            .call(
                Method::POST,
                "/api/conversations",
                Some(app.ada),
                Some(serde_json::json!({ "otherUserId": app.bo })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let conversation = started["conversationId"].as_i64().unwrap();

        // Bo is online but not viewing the conversation.
        let (_session, mut bo_rx) = app.state.notifier.connect(app.bo).await;

        let (status, sent) = app
            .call(
                Method::POST,
                "/api/messages",
                Some(app.ada),
                Some(serde_json::json!({ "conversationId": conversation, "messageText": " hi " })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sent["message"]["text"], "hi");
        assert!(matches!(
            bo_rx.try_recv().unwrap(),
            cupid_shared::protocol::ServerEvent::ConversationUpdate { .. }
        ));

        let (_, inbox) = app
            .call(Method::GET, "/api/conversations", Some(app.bo), None)
            .await;
        assert_eq!(inbox["conversations"][0]["unreadCount"], 1);
        assert_eq!(inbox["conversations"][0]["lastMessage"], "hi");

        let uri = format!("/api/conversations/{conversation}/messages");
        let (status, listed) = app.call(Method::GET, &uri, Some(app.bo), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["messages"][0]["isMe"], false);

        let (_, inbox) = app
            .call(Method::GET, "/api/conversations", Some(app.bo), None)
            .await;
        assert_eq!(inbox["conversations"][0]["unreadCount"], 0);
    }

    #[tokio::test]
    async fn unmatched_conversation_is_forbidden() {
        let app = TestApp::new();
        let (status, body) = app
            .call(
                Method::POST,
                "/api/conversations",
                Some(app.ada),
                Some(serde_json::json!({ "otherUserId": app.bo })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Users are not matched");
    }

    #[tokio::test]
    async fn invalid_input_is_bad_request() {
        let app = TestApp::new();
        let (status, _) = app
            .call(
                Method::POST,
                "/api/swipe",
                Some(app.ada),
                Some(serde_json::json!({ "swipeeId": app.bo, "direction": "up" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/location",
                Some(app.ada),
                Some(serde_json::json!({ "latitude": 120.0, "longitude": 0.0 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/moderation/report",
                Some(app.ada),
                Some(serde_json::json!({ "reportedUserId": app.bo, "reason": "boring" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_requests_get_json_errors() {
        let app = TestApp::new();

        let (status, body) = app
            .call_raw(
                Method::POST,
                "/api/swipe",
                Some(app.ada),
                Some("{not json".to_string()),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));

        let (status, body) = app
            .call(
                Method::POST,
                "/api/swipe",
                Some(app.ada),
                Some(serde_json::json!({ "direction": "right" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = app
            .call(
                Method::GET,
                "/api/conversations/abc/messages",
                Some(app.ada),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = app
            .call(
                Method::GET,
                "/api/nearby?latitude=north&longitude=2.3",
                Some(app.ada),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn block_then_unblock() {
        let app = TestApp::new();
        app.swipe_right(app.ada, app.bo).await;
        app.swipe_right(app.bo, app.ada).await;

        let (status, _) = app
            .call(
                Method::POST,
                "/api/moderation/block",
                Some(app.ada),
                Some(serde_json::json!({ "blockedUserId": app.bo, "reason": "spam" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, matches) = app.call(Method::GET, "/api/matches", Some(app.ada), None).await;
        assert_eq!(matches["matches"].as_array().unwrap().len(), 0);

        let uri = format!("/api/moderation/blocked/{}", app.bo.0);
        let (_, check) = app.call(Method::GET, &uri, Some(app.ada), None).await;
        assert_eq!(check["isBlocked"], true);

        let uri = format!("/api/moderation/block/{}", app.bo.0);
        let (status, _) = app.call(Method::DELETE, &uri, Some(app.ada), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.call(Method::DELETE, &uri, Some(app.ada), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn account_pause_and_stats() {
        let app = TestApp::new();
        let (status, _) = app
            .call(Method::PUT, "/api/account/pause", Some(app.bo), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, stats) = app
            .call(Method::GET, "/api/account/stats", Some(app.bo), None)
            .await;
        assert_eq!(stats["matches"], 0);
        assert_eq!(stats["messagesSent"], 0);
    }

    #[tokio::test]
    async fn admin_api_is_disabled_without_token() {
        let app = TestApp::new();
        let (status, _) = app
            .call(
                Method::PUT,
                "/admin/reports/1",
                Some(app.ada),
                Some(serde_json::json!({ "status": "resolved" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn websocket_upgrade_requires_token() {
        let app = TestApp::new();
        let (status, _) = app.call(Method::GET, "/ws", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn websocket_connection_limit_refuses_before_upgrade() {
        let mut app = TestApp::new();
        let config = ServerConfig {
            max_ws_connections: 0,
            ..ServerConfig::default()
        };
        app.state.config = Arc::new(config);

        let (status, body) = app.call(Method::GET, "/ws", Some(app.ada), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("max 0"));
    }
}
