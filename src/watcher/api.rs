use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::broadcast;

use super::store::ServerStore;
use super::{Error, Result};

struct ApiState<S> {
    store: Arc<S>,
    notifications: broadcast::Sender<String>,
}

impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifications: self.notifications.clone(),
        }
    }
}

async fn all_servers<S: ServerStore>(State(state): State<ApiState<S>>) -> Response {
    log::debug!("client requested all servers");
    match state.store.get_all_servers().await {
        Ok(servers) => (axum::http::StatusCode::OK, Json(servers)).into_response(),
        Err(err) => {
            log::error!("Failed to read servers: {}", err);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "failed to read servers",
            )
                .into_response()
        }
    }
}

async fn websocket<S: ServerStore>(
    State(state): State<ApiState<S>>,
    ws: WebSocketUpgrade,
) -> Response {
    // Subscribe before the upgrade so no change between the two is lost.
    let notifications = state.notifications.subscribe();
    ws.on_upgrade(move |socket| client_session(socket, notifications))
}

/// Forwards every change list to the client until either side goes away. Messages from the
/// client are ignored.
async fn client_session(mut socket: WebSocket, mut notifications: broadcast::Receiver<String>) {
    log::info!("ws connection open");
    loop {
        tokio::select! {
            notification = notifications.recv() => match notification {
                Ok(payload) => {
                    if let Err(err) = socket.send(Message::Text(payload.into())).await {
                        log::debug!("failed to notify ws client: {err}");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("ws client fell behind, dropped {skipped} notifications");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                None | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    log::info!("ws connection closed with exception {err}");
                    break;
                }
            },
        }
    }
    log::info!("ws connection closed");
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    /// Serves `GET /all_servers` from `store` and pushes every payload sent on
    /// `notifications` to the clients connected on `GET /ws`.
    pub fn new<S: ServerStore>(store: Arc<S>, notifications: broadcast::Sender<String>) -> Self {
        let router = axum::Router::new()
            .route("/all_servers", get(all_servers::<S>))
            .route("/ws", get(websocket::<S>))
            .with_state(ApiState {
                store,
                notifications,
            });
        Self { router }
    }

    pub fn into_router(self) -> axum::Router {
        self.router
    }

    pub async fn listen(self, addr: &str) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| Error::BindError {
                addr: addr.to_string(),
                source,
            })?;
        log::info!("listening on {addr}");
        axum::serve(listener, self.router.into_make_service())
            .await
            .map_err(Error::ServeError)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::watcher::store::MemoryStore;

    fn router(store: MemoryStore) -> axum::Router {
        let (tx, _) = broadcast::channel(4);
        APIServer::new(Arc::new(store), tx).into_router()
    }

    async fn get(router: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_all_servers() {
        let store = MemoryStore::with_servers([("alpha", 25565), ("beta", 25566)]);

        let (status, body) = get(router(store), "/all_servers").await;
        assert_eq!(status, StatusCode::OK);
        let servers: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(servers, serde_json::json!({"alpha": 25565, "beta": 25566}));
    }

    #[tokio::test]
    async fn test_all_servers_store_failure() {
        let store = MemoryStore::broken();
        let (status, _) = get(router(store), "/all_servers").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_ws_requires_upgrade() {
        let (status, _) = get(router(MemoryStore::default()), "/ws").await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_ws_client_session() {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::tungstenite::Message as ClientMessage;

        let (tx, _) = broadcast::channel(4);
        let router = APIServer::new(Arc::new(MemoryStore::default()), tx.clone()).into_router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .unwrap();
        assert_eq!(tx.receiver_count(), 1);

        // Client messages are ignored.
        client
            .send(ClientMessage::Text("hello".to_string()))
            .await
            .unwrap();

        let payload = r#"[{"type":"new","name":"alpha","port":25565}]"#;
        tx.send(payload.to_string()).unwrap();
        let received = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(received, ClientMessage::Text(payload.to_string()));

        client.send(ClientMessage::Close(None)).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while tx.receiver_count() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = get(router(MemoryStore::default()), "/servers").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
