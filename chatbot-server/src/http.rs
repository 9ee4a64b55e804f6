use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::{get, post},
};
use chatbot_core::{ChatBot, ChatReply, ServerConfig};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<ChatBot>,
}

/// `POST /chat` body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn router(bot: Arc<ChatBot>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { bot })
}

pub async fn serve(config: &ServerConfig, bot: Arc<ChatBot>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        TcpListener::bind(&addr).await.with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on http://{addr}");

    axum::serve(listener, router(bot)).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Always answers 200 with a reply; failures inside the bot become reply text.
#[instrument(skip(state, request), fields(message_len = request.message.len()))]
async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Json<ChatReply> {
    Json(state.bot.reply(&request.message).await)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chatbot_core::{
        CompletionClient, CurrentConditions, ForecastSource, Geocoder, Location, WeatherFetcher,
        bot::FALLBACK_REPLY,
    };
    use serde_json::json;

    #[derive(Debug)]
    struct OnlyParis;

    #[async_trait]
    impl Geocoder for OnlyParis {
        async fn geocode(&self, place: &str) -> anyhow::Result<Option<Location>> {
            if !place.eq_ignore_ascii_case("paris") {
                return Ok(None);
            }
            Ok(Some(Location {
                name: "Paris".into(),
                country: "France".into(),
                latitude: 48.85,
                longitude: 2.35,
            }))
        }
    }

    #[derive(Debug)]
    struct Mild;

    #[async_trait]
    impl ForecastSource for Mild {
        async fn current(&self, _: f64, _: f64) -> anyhow::Result<Option<CurrentConditions>> {
            Ok(Some(CurrentConditions {
                temperature_c: 18.0,
                wind_speed_kmh: 10.0,
                weather_code: Some(1),
                observed_at: None,
            }))
        }
    }

    #[derive(Debug)]
    struct Offline;

    #[async_trait]
    impl CompletionClient for Offline {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    fn bot(completion: Option<Arc<dyn CompletionClient>>) -> Arc<ChatBot> {
        let weather = WeatherFetcher::new(Arc::new(OnlyParis), Arc::new(Mild));
        Arc::new(ChatBot::new(weather, completion))
    }

    fn server(completion: Option<Arc<dyn CompletionClient>>) -> TestServer {
        TestServer::new(router(bot(completion))).expect("Failed to create test server")
    }

    async fn ask(server: &TestServer, message: &str) -> String {
        let response = server.post("/chat").json(&json!({ "message": message })).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["reply"].as_str().expect("reply should be a string").to_string()
    }

    #[tokio::test]
    async fn index_serves_chat_page() {
        let server = server(None);
        let response = server.get("/").await;
        response.assert_status_ok();
        assert!(response.text().contains("/chat"));
    }

    #[tokio::test]
    async fn health_reports_version() {
        let server = server(None);
        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn chat_weather_reply() {
        let server = server(None);
        assert_eq!(
            ask(&server, "weather in Paris").await,
            "Weather for Paris, France: 18°C, mainly clear, wind 10 km/h."
        );
    }

    #[tokio::test]
    async fn chat_calc_greeting_and_fallback() {
        let server = server(None);
        assert!(ask(&server, "calc 2 + 2").await.contains('4'));
        assert!(ask(&server, "hello").await.starts_with("Hey!"));
        assert_eq!(ask(&server, "asdkjasd").await, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn failures_still_answer_200() {
        let server = server(Some(Arc::new(Offline)));
        let reply = ask(&server, "weather in Atlantis").await;
        assert!(!reply.is_empty());
        assert_eq!(ask(&server, "calc 1/0").await, "Sorry, I couldn't calculate that.");
        assert!(!ask(&server, "").await.is_empty());
    }

    #[tokio::test]
    async fn missing_message_field_is_rejected() {
        let server = server(None);
        let response = server.post("/chat").json(&json!({ "text": "hi" })).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn serve_reports_address_already_in_use() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let port = taken.local_addr().expect("local addr").port();
        let config = ServerConfig { host: "127.0.0.1".into(), port };

        let err = serve(&config, bot(None)).await.unwrap_err();
        assert!(err.to_string().contains(&format!("Failed to bind 127.0.0.1:{port}")));
    }
}
