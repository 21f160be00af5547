use crate::types::{GatewayResponse, InboundMessage, ZoneClickRequest};
use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use plaza_engine::{GameHandle, Publication};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Shared state for the gateway server.
#[derive(Clone)]
struct AppState {
    /// Handle to the running game coordinator.
    game: GameHandle,
    /// Number of active WebSocket connections.
    active_ws: Arc<AtomicUsize>,
}

/// The gateway HTTP + WebSocket server.
///
/// Bridges the floor tracker and display clients to the game coordinator via:
/// - `POST /game/zone_click` — manual vote
/// - `POST /game/people_in` — full observation set (alias `/game/people`)
/// - `GET /ws` — live publications out, commands in
/// - `GET /state` — full snapshot
/// - `GET /health` — health check
pub struct GatewayServer {
    game: GameHandle,
    /// Active WebSocket connection count (shared with handlers).
    active_ws: Arc<AtomicUsize>,
    host: String,
    port: u16,
}

impl GatewayServer {
    pub fn new(game: GameHandle, host: &str, port: u16) -> Self {
        Self {
            game,
            active_ws: Arc::new(AtomicUsize::new(0)),
            host: host.to_string(),
            port,
        }
    }

    /// Number of active WebSocket connections.
    pub fn active_connections(&self) -> Arc<AtomicUsize> {
        self.active_ws.clone()
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            game: self.game.clone(),
            active_ws: self.active_ws.clone(),
        };

        Router::new()
            .route("/health", get(health))
            .route("/state", get(snapshot))
            .route("/game/zone_click", post(zone_click))
            .route("/game/people_in", post(people_in))
            .route("/game/people", post(people_in))
            .route("/ws", get(ws_upgrade))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind and serve until the listener fails.
    pub async fn serve(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr = format!("{}:{}", self.host, self.port);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Gateway failed to bind {}", addr))?;
        tracing::info!("Gateway listening on {}", addr);
        axum::serve(listener, app)
            .await
            .context("Gateway server error")
    }

    /// Start the server. This spawns a background task and returns the join handle.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.serve().await {
                tracing::error!("{:#}", e);
            }
        })
    }
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

/// GET /state: every enabled sub-document, as published.
async fn snapshot(
    State(state): State<AppState>,
) -> Result<Json<Vec<Publication>>, StatusCode> {
    state
        .game
        .snapshot()
        .await
        .map(Json)
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)
}

/// POST /game/zone_click: one manual vote.
async fn zone_click(
    State(state): State<AppState>,
    Json(req): Json<ZoneClickRequest>,
) -> (StatusCode, Json<GatewayResponse>) {
    match state.game.zone_click(req.zone, req.click).await {
        Ok(Ok(zone)) => (StatusCode::OK, Json(GatewayResponse::voted(zone))),
        Ok(Err(e)) => (
            StatusCode::BAD_REQUEST,
            Json(GatewayResponse::error(e.to_string())),
        ),
        Err(_) => unavailable(),
    }
}

/// POST /game/people_in: raw JSON list of observations.
///
/// The body is taken as text so malformed lists still reach the game and
/// show up in its prompt.
async fn people_in(
    State(state): State<AppState>,
    body: String,
) -> (StatusCode, Json<GatewayResponse>) {
    match state.game.ingest_people_json(body).await {
        Ok(Ok(count)) => (StatusCode::OK, Json(GatewayResponse::accepted(count))),
        Ok(Err(e)) => (
            StatusCode::BAD_REQUEST,
            Json(GatewayResponse::error(format!("Bad people payload: {}", e))),
        ),
        Err(_) => unavailable(),
    }
}

fn unavailable() -> (StatusCode, Json<GatewayResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(GatewayResponse::error("game is not running")),
    )
}

/// GET /ws — WebSocket upgrade.
async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle a WebSocket connection.
///
/// The client first gets a full snapshot, then every publication as it
/// happens. Inbound frames are parsed as [`InboundMessage`] and forwarded;
/// anything that fails comes back as `{"error": ...}`.
async fn handle_ws(socket: WebSocket, state: AppState) {
    let client = Uuid::new_v4();
    state.active_ws.fetch_add(1, Ordering::Relaxed);
    tracing::info!("Display client {} connected", client);

    let (ws_tx, mut ws_rx) = socket.split();
    // Subscribe before the snapshot so nothing published in between is lost
    let publications = state.game.subscribe();
    let (reply_tx, reply_rx) = mpsc::channel::<String>(32);

    if let Ok(snapshot) = state.game.snapshot().await {
        for publication in &snapshot {
            if let Ok(json) = serde_json::to_string(publication) {
                let _ = reply_tx.send(json).await;
            }
        }
    }

    let writer = tokio::spawn(write_loop(ws_tx, publications, reply_rx, client));

    // Read loop: parse inbound messages
    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => {
                if let Some(error) = handle_frame(&state.game, &text).await {
                    let err = serde_json::json!({ "error": error });
                    if reply_tx.send(err.to_string()).await.is_err() {
                        break;
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    writer.abort();
    state.active_ws.fetch_sub(1, Ordering::Relaxed);
    tracing::info!("Display client {} disconnected", client);
}

/// Apply one inbound frame. Returns the error text to send back, if any.
///
/// A frame that starts with `[` but is not a command is a bare people list
/// from the tracker. It goes to the game as-is, so a truncated list still
/// shows up in the prompt.
async fn handle_frame(game: &GameHandle, text: &str) -> Option<String> {
    let inbound: InboundMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(_) if text.trim_start().starts_with('[') => {
            return people_frame(game, text.to_string()).await;
        }
        Err(e) => return Some(format!("Invalid message: {}", e)),
    };

    match inbound {
        InboundMessage::ZoneClick(req) => match game.zone_click(req.zone, req.click).await {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(e.to_string()),
        },
        InboundMessage::People { people } => people_frame(game, people.to_string()).await,
    }
}

async fn people_frame(game: &GameHandle, payload: String) -> Option<String> {
    match game.ingest_people_json(payload).await {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(format!("Bad people payload: {}", e)),
        Err(e) => Some(e.to_string()),
    }
}

/// Forward publications and direct replies to one client until it goes away.
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut publications: broadcast::Receiver<Publication>,
    mut replies: mpsc::Receiver<String>,
    client: Uuid,
) {
    loop {
        let text = tokio::select! {
            reply = replies.recv() => match reply {
                Some(text) => text,
                None => break,
            },
            publication = publications.recv() => match publication {
                Ok(publication) => match serde_json::to_string(&publication) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to encode publication: {}", e);
                        continue;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "Display client {} lagged, skipped {} publications",
                        client,
                        skipped
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        if ws_tx.send(Message::Text(text.into())).await.is_err() {
            break;
        }
    }
}
