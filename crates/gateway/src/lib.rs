//! HTTP gateway for KubeClaw.
//!
//! Serves the chat endpoint the browser page talks to, a health check, the
//! tool catalog, and the embedded frontend.
//!
//! Built on Axum.

pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

use kubeclaw_agent::AgentLoop;
use kubeclaw_cluster::KubeClusterClient;
use kubeclaw_config::{AppConfig, GatewayConfig};
use kubeclaw_core::error::{ProviderError, TurnError};
use kubeclaw_core::event::EventBus;
use kubeclaw_core::provider::ToolDefinition;
use kubeclaw_tools::LogWindow;

/// Largest accepted request body.
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub agent: Arc<AgentLoop>,
}

type SharedState = Arc<GatewayState>;

/// Build the router with every gateway route.
///
/// Layers, outermost first: HTTP tracing, CORS, body size limit.
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/v1/tools", get(tools_handler))
        .with_state(state)
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors_layer(&gateway.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Any origin when `allowed_origins` is empty, otherwise exactly the listed ones.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Wire up the cluster client, tool registry and provider described by `config`.
pub async fn build_agent(config: &AppConfig) -> Result<AgentLoop, kubeclaw_core::Error> {
    let cluster = KubeClusterClient::connect(config.cluster.context.as_deref()).await?;
    let window = LogWindow {
        tail_lines: config.cluster.log_tail_lines,
        summary_lines: config.cluster.log_summary_lines,
    };
    let tools = kubeclaw_tools::default_registry(Arc::new(cluster), window)?;

    let provider = kubeclaw_providers::build_from_config(config)
        .default_provider()
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "no provider named '{}' is available; set an API key",
                config.default_provider
            ))
        })?;

    let events = Arc::new(EventBus::default());
    events.spawn_logger();

    Ok(AgentLoop::from_config(config, provider, Arc::new(tools), events))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let agent = Arc::new(build_agent(&config).await?);
    info!(
        provider = %config.default_provider,
        model = %agent.model(),
        tools = agent.tools().len(),
        "Agent ready"
    );

    let app = build_router(Arc::new(GatewayState { agent }), &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

fn reply(status: StatusCode, response: impl Into<String>) -> (StatusCode, Json<ChatResponse>) {
    (
        status,
        Json(ChatResponse {
            response: response.into(),
        }),
    )
}

async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> (StatusCode, Json<ChatResponse>) {
    let question = match payload {
        Ok(Json(request)) => request.question.unwrap_or_default(),
        Err(rejection) => {
            warn!(error = %rejection, "Rejected chat request body");
            return reply(rejection.status(), rejection.body_text());
        }
    };

    if question.trim().is_empty() {
        return reply(StatusCode::BAD_REQUEST, TurnError::EmptyInput.to_string());
    }

    info!(question_len = question.len(), "Chat request received");
    let start = Instant::now();

    match state.agent.run_turn(&question).await {
        Ok(answer) => {
            info!(
                duration_ms = start.elapsed().as_millis() as u64,
                "Chat request answered"
            );
            reply(StatusCode::OK, answer)
        }
        Err(TurnError::EmptyInput) => {
            reply(StatusCode::BAD_REQUEST, TurnError::EmptyInput.to_string())
        }
        Err(e @ TurnError::DeadlineExceeded { .. }) => {
            error!(error = %e, "Chat request timed out");
            reply(StatusCode::GATEWAY_TIMEOUT, e.to_string())
        }
        Err(e) => {
            error!(error = %e, "Agent processing failed");
            reply(StatusCode::OK, format!("An error occurred: {e}"))
        }
    }
}

async fn tools_handler(State(state): State<SharedState>) -> Json<Vec<ToolDefinition>> {
    Json(state.agent.tools().definitions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use kubeclaw_core::error::ToolError;
    use kubeclaw_core::message::{Message, MessageToolCall};
    use kubeclaw_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use kubeclaw_core::tool::{Access, ParamSpec, Tool, ToolArgs, ToolRegistry};
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Replies with the queued messages in order, then repeats the last one.
    struct ScriptedProvider {
        replies: Mutex<Vec<Message>>,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Message>) -> Self {
            Self {
                replies: Mutex::new(replies),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let message = {
                let mut replies = self.replies.lock().unwrap();
                if replies.len() > 1 {
                    replies.remove(0)
                } else {
                    replies[0].clone()
                }
            };
            Ok(ProviderResponse {
                message,
                usage: None,
                model: "scripted-model".into(),
            })
        }
    }

    struct PodsTool;

    #[async_trait]
    impl Tool for PodsTool {
        fn name(&self) -> &str {
            "list_pods"
        }

        fn description(&self) -> &str {
            "Lists the names of pods"
        }

        fn params(&self) -> Vec<ParamSpec> {
            vec![]
        }

        fn access(&self) -> Access {
            Access::ReadOnly
        }

        async fn execute(&self, _args: ToolArgs) -> Result<String, ToolError> {
            Ok("web-1\nweb-2".into())
        }
    }

    fn agent_with(provider: ScriptedProvider) -> Arc<AgentLoop> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(PodsTool)).unwrap();
        Arc::new(AgentLoop::new(
            Arc::new(provider),
            "scripted-model",
            Arc::new(registry),
            Arc::new(EventBus::default()),
        ))
    }

    fn app_with(agent: Arc<AgentLoop>) -> Router {
        build_router(Arc::new(GatewayState { agent }), &GatewayConfig::default())
    }

    fn answering(text: &str) -> Router {
        app_with(agent_with(ScriptedProvider::new(vec![Message::assistant(
            text,
        )])))
    }

    async fn post_chat(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn health_endpoint() {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = answering("hi").oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn chat_returns_final_answer() {
        let provider = ScriptedProvider::new(vec![
            Message::assistant_with_calls(
                None,
                vec![MessageToolCall {
                    id: "c1".into(),
                    name: "list_pods".into(),
                    arguments: r#"{"namespace":"demo"}"#.into(),
                }],
            ),
            Message::assistant("web-1\nweb-2"),
        ]);

        let (status, json) = post_chat(
            app_with(agent_with(provider)),
            r#"{"question":"list pods in namespace demo"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "web-1\nweb-2");
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let (status, json) = post_chat(answering("unused"), r#"{"question":"   "}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["response"], "No question provided");
    }

    #[tokio::test]
    async fn missing_question_is_rejected() {
        let (status, json) = post_chat(answering("unused"), "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["response"], "No question provided");
    }

    #[tokio::test]
    async fn malformed_body_is_a_client_error() {
        let (status, json) = post_chat(answering("unused"), "{not json").await;
        assert!(status.is_client_error());
        assert!(json["response"].as_str().is_some_and(|s| !s.is_empty()));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let question = "a".repeat(BODY_LIMIT_BYTES + 1);
        let body = serde_json::json!({ "question": question }).to_string();
        let (status, _) = post_chat(answering("unused"), &body).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_turn_times_out() {
        let mut provider = ScriptedProvider::new(vec![Message::assistant("too late")]);
        provider.delay = Some(Duration::from_secs(30));
        let agent = {
            let mut registry = ToolRegistry::new();
            registry.register(Box::new(PodsTool)).unwrap();
            AgentLoop::new(
                Arc::new(provider),
                "scripted-model",
                Arc::new(registry),
                Arc::new(EventBus::default()),
            )
            .with_turn_timeout(Duration::from_secs(5))
        };

        let (status, json) =
            post_chat(app_with(Arc::new(agent)), r#"{"question":"list pods"}"#).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(json["response"].as_str().unwrap().contains("5s"));
    }

    #[tokio::test]
    async fn tools_endpoint_lists_catalog() {
        let req = Request::builder()
            .uri("/v1/tools")
            .body(Body::empty())
            .unwrap();
        let response = answering("hi").oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let tools = json.as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "list_pods");
    }

    #[tokio::test]
    async fn frontend_is_merged() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = answering("hi").oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cors_allows_any_origin_by_default() {
        let req = Request::builder()
            .uri("/health")
            .header("origin", "http://example.test")
            .body(Body::empty())
            .unwrap();
        let response = answering("hi").oneshot(req).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn cors_restricts_to_configured_origins() {
        let gateway = GatewayConfig {
            allowed_origins: vec!["http://localhost:3000".into()],
            ..GatewayConfig::default()
        };
        let agent = agent_with(ScriptedProvider::new(vec![Message::assistant("hi")]));
        let app = build_router(Arc::new(GatewayState { agent }), &gateway);

        let allowed = Request::builder()
            .uri("/health")
            .header("origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(allowed).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );

        let denied = Request::builder()
            .uri("/health")
            .header("origin", "http://evil.test")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(denied).await.unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }
}
