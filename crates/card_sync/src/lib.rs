use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use shared::{
    domain::UnknownDirectivePolicy,
    error::{ApiError, ErrorCode},
    protocol::{ServerEvent, ADD_REMOVE_CARDS},
};
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

pub mod error;
pub mod handler;
pub mod markup;
pub mod page;

pub use error::{HandlerError, SyncError};
pub use handler::{
    Applied, CardListSynchronizer, CustomMessageHandler, HandlerRegistry, SharedPage,
};
pub use markup::{parse_fragment, PageNode};
pub use page::{Insertion, PageLayout, PageSnapshot, PageView};

use handler::lock_page;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub message_name: String,
    pub layout: PageLayout,
    pub unknown_directive: UnknownDirectivePolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            message_name: ADD_REMOVE_CARDS.into(),
            layout: PageLayout::default(),
            unknown_directive: UnknownDirectivePolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    PageUpdated(PageSnapshot),
    /// An error pushed by the server.
    ServerError(ApiError),
    /// A frame this client could not apply, or a failed websocket read.
    Error(ApiError),
    Disconnected,
}

/// Consumes server events and keeps a [`PageView`] in step with them.
///
/// Events are handled one at a time, in the order they are delivered. The
/// websocket reader started by [`CardSyncClient::connect`] finishes each frame
/// before reading the next one.
pub struct CardSyncClient {
    page: SharedPage,
    handlers: Mutex<HandlerRegistry>,
    reader: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<ClientEvent>,
}

impl CardSyncClient {
    pub fn new(options: SyncOptions) -> Arc<Self> {
        let page: SharedPage = Arc::new(Mutex::new(PageView::new(options.layout)));
        let mut handlers = HandlerRegistry::new();
        handlers.add_custom_message_handler(
            options.message_name,
            CardListSynchronizer::new(Arc::clone(&page), options.unknown_directive),
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Arc::new(Self {
            page,
            handlers: Mutex::new(handlers),
            reader: Mutex::new(None),
            events,
        })
    }

    pub fn page(&self) -> SharedPage {
        Arc::clone(&self.page)
    }

    pub fn add_custom_message_handler(
        &self,
        name: impl Into<String>,
        handler: impl CustomMessageHandler + 'static,
    ) -> bool {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add_custom_message_handler(name, handler)
    }

    pub fn deliver(&self, event: ServerEvent) -> Result<Applied, SyncError> {
        match event {
            ServerEvent::CustomMessage { name, message } => {
                let applied = self
                    .handlers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .dispatch(&name, message)?;
                if applied.changed() {
                    let _ = self.events.send(ClientEvent::PageUpdated(self.snapshot()));
                } else {
                    debug!(%name, "sync: custom message left page unchanged");
                }
                Ok(applied)
            }
            ServerEvent::Error(err) => {
                warn!(code = ?err.code, message = %err.message, "sync: server reported error");
                let _ = self.events.send(ClientEvent::ServerError(err));
                Ok(Applied::Unchanged)
            }
        }
    }

    pub fn deliver_text(&self, text: &str) -> Result<Applied, SyncError> {
        let event = serde_json::from_str::<ServerEvent>(text)?;
        self.deliver(event)
    }

    /// Connects to the push channel of `server_url` and applies every frame it
    /// sends until the channel closes. A previous connection is dropped.
    pub async fn connect(self: &Arc<Self>, server_url: &str) -> Result<()> {
        let ws_url = websocket_url(server_url)?;
        let (ws_stream, _) = connect_async(ws_url.as_str())
            .await
            .with_context(|| format!("failed to connect websocket: {ws_url}"))?;
        info!(%ws_url, "sync: connected to push channel");
        let (_, mut ws_reader) = ws_stream.split();

        let client = Arc::clone(self);
        let reader = tokio::spawn(async move {
            while let Some(msg) = ws_reader.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Err(err) = client.deliver_text(&text) {
                            warn!(code = ?err.code(), error = %err, "sync: failed to apply server event");
                            let _ = client.events.send(ClientEvent::Error(ApiError::from(&err)));
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "sync: websocket receive failed");
                        let _ = client.events.send(ClientEvent::Error(ApiError::new(
                            ErrorCode::Internal,
                            format!("websocket receive failed: {err}"),
                        )));
                        break;
                    }
                }
            }
            info!("sync: push channel closed");
            let _ = client.events.send(ClientEvent::Disconnected);
        });

        let previous = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(reader);
        if let Some(previous) = previous {
            previous.abort();
        }
        Ok(())
    }

    pub fn disconnect(&self) {
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reader) = reader {
            reader.abort();
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> PageSnapshot {
        lock_page(&self.page).snapshot()
    }

    pub fn card_count(&self) -> usize {
        lock_page(&self.page).card_count()
    }
}

/// Maps an `http(s)://` or `ws(s)://` server URL to its `/ws` endpoint.
pub fn websocket_url(server_url: &str) -> Result<Url> {
    let mut url =
        Url::parse(server_url).with_context(|| format!("invalid server url: {server_url}"))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(anyhow!(
                "server_url must start with http://, https://, ws:// or wss://, got {other}://"
            ))
        }
    };
    url.set_scheme(scheme)
        .map_err(|()| anyhow!("cannot switch {server_url} to {scheme}://"))?;

    let path = url.path().trim_end_matches('/');
    if !path.ends_with("/ws") {
        let path = format!("{path}/ws");
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
