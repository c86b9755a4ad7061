use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::config::DEFAULT_API_URL;
use crate::error::ClientError;
use crate::event::EventHandler;
use crate::http::Http;
use crate::model::{Message, Ready};

const GATEWAY_VERSION: &str = "10";

/// GUILDS | GUILD_MEMBERS | GUILD_MESSAGES | GUILD_MESSAGE_REACTIONS |
/// DIRECT_MESSAGES | MESSAGE_CONTENT
pub const DEFAULT_INTENTS: u64 = (1 << 0) | (1 << 1) | (1 << 9) | (1 << 10) | (1 << 12) | (1 << 15);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = Arc<Mutex<SplitSink<WsStream, WsMessage>>>;

/// Heartbeat round trip, measured from each heartbeat to its ACK.
pub struct GatewayLatency {
    base: Instant,
    sent_at_ms: AtomicU64,
    last_ms: AtomicU64,
}

impl GatewayLatency {
    const UNSET: u64 = u64::MAX;

    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            sent_at_ms: AtomicU64::new(Self::UNSET),
            last_ms: AtomicU64::new(Self::UNSET),
        }
    }

    fn heartbeat_sent(&self) {
        self.sent_at_ms.store(self.base.elapsed().as_millis() as u64, Ordering::SeqCst);
    }

    fn ack_received(&self) {
        let sent = self.sent_at_ms.swap(Self::UNSET, Ordering::SeqCst);
        if sent != Self::UNSET {
            let now = self.base.elapsed().as_millis() as u64;
            self.last_ms.store(now.saturating_sub(sent), Ordering::SeqCst);
        }
    }

    pub fn get(&self) -> Option<Duration> {
        match self.last_ms.load(Ordering::SeqCst) {
            Self::UNSET => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl Default for GatewayLatency {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct Context {
    pub http: Arc<Http>,
    pub latency: Arc<GatewayLatency>,
}

impl Context {
    pub fn latency(&self) -> Option<Duration> {
        self.latency.get()
    }
}

pub struct ClientBuilder {
    token: String,
    http: Option<Arc<Http>>,
    handler: Option<Arc<dyn EventHandler>>,
}

impl ClientBuilder {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            http: None,
            handler: None,
        }
    }

    pub fn event_handler(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Shares a REST client built elsewhere instead of making a new one.
    pub fn http(mut self, http: Arc<Http>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<Client, ClientError> {
        let handler = self.handler.ok_or(ClientError::MissingHandler)?;
        let http = match self.http {
            Some(http) => http,
            None => Arc::new(Http::new(&self.token, DEFAULT_API_URL.to_string())?),
        };
        Ok(Client {
            http,
            latency: Arc::new(GatewayLatency::new()),
            handler,
        })
    }
}

pub struct Client {
    pub(crate) http: Arc<Http>,
    latency: Arc<GatewayLatency>,
    handler: Arc<dyn EventHandler>,
}

impl Client {
    pub fn builder(token: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(token)
    }

    /// Runs one gateway session until the server closes it or asks for a
    /// reconnect. Callers decide whether to start another one.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        let gateway_url = self.http.get_gateway().await?;
        let mut ws_url = Url::parse(&gateway_url)?;
        ws_url
            .query_pairs_mut()
            .append_pair("v", GATEWAY_VERSION)
            .append_pair("encoding", "json");

        let (ws_stream, _) = connect_async(ws_url.as_str()).await?;
        let (write, read) = ws_stream.split();

        let mut session = Session {
            write: Arc::new(Mutex::new(write)),
            seq: Arc::new(AtomicI64::new(-1)),
            heartbeat: None,
            tasks: JoinSet::new(),
            ctx: Context { http: self.http.clone(), latency: self.latency.clone() },
            handler: self.handler.clone(),
            token: self.http.get_token().to_string(),
        };

        session.run(read).await
    }
}

struct Session {
    write: WsWrite,
    seq: Arc<AtomicI64>,
    heartbeat: Option<JoinHandle<()>>,
    tasks: JoinSet<()>,
    ctx: Context,
    handler: Arc<dyn EventHandler>,
    token: String,
}

impl Session {
    async fn run(&mut self, mut read: SplitStream<WsStream>) -> Result<(), ClientError> {
        loop {
            tokio::select! {
                frame = read.next() => {
                    let Some(frame) = frame else { return Ok(()) };
                    match frame? {
                        WsMessage::Text(text) => {
                            let payload: Value = serde_json::from_str(text.as_str())?;
                            self.handle_payload(payload).await?;
                        }
                        WsMessage::Close(frame) => {
                            log::info!("Gateway closed the connection: {:?}", frame);
                            return Err(ClientError::ConnectionClosed);
                        }
                        _ => {}
                    }
                }
                Some(done) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    reap(done);
                }
            }
        }
    }

    async fn handle_payload(&mut self, payload: Value) -> Result<(), ClientError> {
        let op = payload["op"].as_u64().unwrap_or(255);

        match op {
            10 => {
                let interval_ms = payload["d"]["heartbeat_interval"].as_u64().unwrap_or(41_250);
                self.start_heartbeat(interval_ms);
                self.identify().await?;
            }

            11 => self.ctx.latency.ack_received(),

            1 => {
                send_heartbeat(&self.write, &self.seq, &self.ctx.latency).await?;
            }

            0 => {
                if let Some(s) = payload["s"].as_i64() {
                    self.seq.store(s, Ordering::SeqCst);
                }
                let event_type = payload["t"].as_str().unwrap_or("").to_string();
                self.dispatch(&event_type, payload["d"].clone());
            }

            7 => {
                log::info!("Gateway requested a reconnect");
                return Err(ClientError::ConnectionClosed);
            }

            9 => return Err(ClientError::Protocol("session invalidated".into())),

            _ => {}
        }
        Ok(())
    }

    async fn identify(&self) -> Result<(), ClientError> {
        let identify = serde_json::json!({
            "op": 2,
            "d": {
                "token": self.token,
                "intents": DEFAULT_INTENTS,
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": "afgm-bot",
                    "device": "afgm-bot"
                }
            }
        });
        self.write
            .lock()
            .await
            .send(WsMessage::Text(identify.to_string().into()))
            .await?;
        Ok(())
    }

    fn start_heartbeat(&mut self, interval_ms: u64) {
        if let Some(previous) = self.heartbeat.take() {
            previous.abort();
        }

        let write = self.write.clone();
        let seq = self.seq.clone();
        let latency = self.ctx.latency.clone();
        self.heartbeat = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = send_heartbeat(&write, &seq, &latency).await {
                    log::warn!("Heartbeat failed, stopping: {}", e);
                    break;
                }
            }
        }));
    }

    /// Each event gets its own task so one slow or failing handler cannot
    /// stall or take down the others.
    fn dispatch(&mut self, event_type: &str, data: Value) {
        let ctx = self.ctx.clone();
        let handler = self.handler.clone();

        match event_type {
            "READY" => match serde_json::from_value::<Ready>(data) {
                Ok(ready) => {
                    self.tasks.spawn(async move { handler.on_ready(ctx, ready).await });
                }
                Err(e) => log::warn!("Could not decode READY: {}", e),
            },
            "MESSAGE_CREATE" => match serde_json::from_value::<Message>(data) {
                Ok(msg) => {
                    self.tasks.spawn(async move { handler.on_message(ctx, msg).await });
                }
                Err(e) => log::debug!("Skipping undecodable MESSAGE_CREATE: {}", e),
            },
            _ => {}
        }
    }
}

/// Also runs when `start` is dropped mid-session, e.g. by a shutdown `select!`.
impl Drop for Session {
    fn drop(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.abort();
        }
        // In-flight handlers finish on their own; their replies go over REST.
        self.tasks.detach_all();
    }
}

async fn send_heartbeat(
    write: &WsWrite,
    seq: &AtomicI64,
    latency: &GatewayLatency,
) -> Result<(), ClientError> {
    let last = seq.load(Ordering::SeqCst);
    let heartbeat = serde_json::json!({
        "op": 1,
        "d": if last < 0 { Value::Null } else { Value::from(last) }
    });
    write
        .lock()
        .await
        .send(WsMessage::Text(heartbeat.to_string().into()))
        .await?;
    latency.heartbeat_sent();
    Ok(())
}

fn reap(done: Result<(), JoinError>) {
    if let Err(e) = done {
        if e.is_panic() {
            log::error!("Event handler task panicked: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_is_unknown_until_an_ack_arrives() {
        let latency = GatewayLatency::new();
        assert!(latency.get().is_none());
        latency.ack_received();
        assert!(latency.get().is_none());

        latency.heartbeat_sent();
        latency.ack_received();
        assert!(latency.get().is_some());
    }

    #[test]
    fn builder_requires_a_handler() {
        let err = Client::builder("token").build().err().unwrap();
        assert!(matches!(err, ClientError::MissingHandler));
    }

    #[test]
    fn default_intents_include_message_content() {
        assert_ne!(DEFAULT_INTENTS & (1 << 15), 0);
    }
}
