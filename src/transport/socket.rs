//! Single Socket.IO link
//!
//! A [`SocketClient`] owns one background task that connects, joins the
//! default namespace, forwards push events and retries with a fixed delay
//! when the link drops. The task prefers WebSocket and falls back to
//! long-polling when allowed.

use super::polling::{endpoint, PollingSession};
use super::{EventSource, LinkMode, LinkState, ReconnectPolicy, SourcedEvent};
use crate::models::ConversationId;
use crate::protocol::{Command, Handshake, Packet, PushEvent};
use crate::{Error, Result};
use futures::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

/// Handle to one push service link
pub struct SocketClient {
    source: EventSource,
    base_url: String,
    policy: ReconnectPolicy,
    http: reqwest::Client,
    state: Arc<watch::Sender<LinkState>>,
    room: Arc<Mutex<Option<ConversationId>>>,
    events: mpsc::UnboundedSender<SourcedEvent>,
    control: Mutex<Control>,
}

#[derive(Default)]
struct Control {
    task: Option<JoinHandle<()>>,
    commands: Option<mpsc::UnboundedSender<Command>>,
}

impl SocketClient {
    /// Create a link that will deliver its events into `events`
    ///
    /// Nothing connects until [`SocketClient::connect`] is called.
    pub fn new(
        source: EventSource,
        base_url: impl Into<String>,
        policy: ReconnectPolicy,
        events: mpsc::UnboundedSender<SourcedEvent>,
    ) -> Self {
        let (state, _) = watch::channel(LinkState::Disconnected);
        Self {
            source,
            base_url: base_url.into(),
            policy,
            http: reqwest::Client::new(),
            state: Arc::new(state),
            room: Arc::new(Mutex::new(None)),
            events,
            control: Mutex::new(Control::default()),
        }
    }

    /// Service this link talks to
    pub fn source(&self) -> EventSource {
        self.source
    }

    /// Current lifecycle state
    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// Observe lifecycle changes
    pub fn watch_state(&self) -> watch::Receiver<LinkState> {
        self.state.subscribe()
    }

    /// Whether the link is up
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Room re-joined after every reconnection
    pub fn current_room(&self) -> Option<ConversationId> {
        lock(&self.room).clone()
    }

    /// Start the link task unless one is already running
    pub fn connect(&self) {
        let mut control = lock(&self.control);
        if let Some(task) = &control.task {
            if !task.is_finished() {
                debug!("{} link already running", self.source);
                return;
            }
        }

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let task = LinkTask {
            source: self.source,
            base_url: self.base_url.clone(),
            policy: self.policy.clone(),
            http: self.http.clone(),
            state: self.state.clone(),
            room: self.room.clone(),
            events: self.events.clone(),
            commands: commands_rx,
        };

        info!("Starting {} link to {}", self.source, self.base_url);
        control.commands = Some(commands_tx);
        control.task = Some(tokio::spawn(task.run()));
    }

    /// Stop the link task; the tracked room is kept for the next connect
    pub fn disconnect(&self) {
        let mut control = lock(&self.control);
        control.commands = None;
        if let Some(task) = control.task.take() {
            task.abort();
            info!("Stopped {} link", self.source);
        }
        self.state.send_replace(LinkState::Disconnected);
    }

    /// Send a room command
    ///
    /// The room is tracked even while the link is down, but the command
    /// itself is dropped: it is replayed by the re-join on reconnection.
    pub fn send(&self, command: Command) {
        {
            let mut room = lock(&self.room);
            match &command {
                Command::JoinConversation(id) => *room = Some(id.clone()),
                Command::LeaveConversation(id) => {
                    if room.as_ref() == Some(id) {
                        *room = None;
                    }
                }
            }
        }

        if !self.is_connected() {
            debug!(
                "{} link down, not sending {} {}",
                self.source,
                command.event_name(),
                command.conversation_id()
            );
            return;
        }

        if let Some(commands) = &lock(&self.control).commands {
            let _ = commands.send(command);
        }
    }
}

impl Drop for SocketClient {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.control).task.take() {
            task.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Why a connected link stopped
enum LinkEnd {
    /// Owner went away; do not reconnect
    Closed,
    /// Link failed; reconnect
    Lost(String),
}

struct LinkTask {
    source: EventSource,
    base_url: String,
    policy: ReconnectPolicy,
    http: reqwest::Client,
    state: Arc<watch::Sender<LinkState>>,
    room: Arc<Mutex<Option<ConversationId>>>,
    events: mpsc::UnboundedSender<SourcedEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl LinkTask {
    async fn run(mut self) {
        let mut attempt: u32 = 0;

        loop {
            self.state.send_replace(if attempt == 0 {
                LinkState::Connecting
            } else {
                LinkState::Reconnecting { attempt }
            });

            match self.open().await {
                Ok((mut link, leftovers)) => {
                    attempt = 0;
                    let mode = link.mode();
                    info!("{} connected via {}", self.source, mode);

                    // Commands queued while down are superseded by the re-join
                    while self.commands.try_recv().is_ok() {}
                    self.state.send_replace(LinkState::Connected(mode));

                    let end = self.drive(&mut link, leftovers).await;
                    if timeout(self.policy.connect_timeout, link.close()).await.is_err() {
                        debug!("{} close timed out", self.source);
                    }
                    match end {
                        LinkEnd::Closed => {
                            info!("{} link closed", self.source);
                            self.state.send_replace(LinkState::Disconnected);
                            return;
                        }
                        LinkEnd::Lost(reason) => {
                            warn!("{} link lost: {}", self.source, reason);
                        }
                    }
                }
                Err(e) => {
                    warn!("{} connection attempt failed: {}", self.source, e);
                }
            }

            attempt += 1;
            if attempt > self.policy.max_attempts {
                error!(
                    "{} unreachable after {} retries, giving up",
                    self.source, self.policy.max_attempts
                );
                self.state.send_replace(LinkState::Down);
                return;
            }
            sleep(self.policy.delay).await;
        }
    }

    async fn open(&self) -> Result<(Link, Vec<Packet>)> {
        let deadline = self.policy.connect_timeout;

        let mut link = match WsLink::open(&self.base_url, deadline).await {
            Ok(ws) => Link::WebSocket(ws),
            Err(e) if self.policy.allow_polling => {
                warn!(
                    "{} websocket unavailable ({}), falling back to polling",
                    self.source, e
                );
                Link::Polling(PollingLink::open(&self.http, &self.base_url, deadline).await?)
            }
            Err(e) => return Err(e),
        };

        let leftovers = timeout(deadline, join_namespace(&mut link))
            .await
            .map_err(|_| Error::Timeout(format!("{} namespace join", self.source)))??;
        Ok((link, leftovers))
    }

    async fn drive(&mut self, link: &mut Link, leftovers: Vec<Packet>) -> LinkEnd {
        let room = lock(&self.room).clone();
        if let Some(room) = room {
            debug!("{} re-joining room {}", self.source, room);
            if let Some(end) = self.send(link, Command::JoinConversation(room).to_packet()).await {
                return end;
            }
        }

        for packet in leftovers {
            if let Some(end) = self.handle_packet(link, packet).await {
                return end;
            }
        }

        let window = link.handshake().liveness_window();
        loop {
            tokio::select! {
                incoming = timeout(window, link.recv()) => {
                    let packets = match incoming {
                        Err(_) => return LinkEnd::Lost("ping timeout".to_string()),
                        Ok(Err(e)) => return LinkEnd::Lost(e.to_string()),
                        Ok(Ok(None)) => return LinkEnd::Lost("closed by server".to_string()),
                        Ok(Ok(Some(packets))) => packets,
                    };
                    for packet in packets {
                        if let Some(end) = self.handle_packet(link, packet).await {
                            return end;
                        }
                    }
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        return LinkEnd::Closed;
                    };
                    debug!(
                        "{} -> {} {}",
                        self.source,
                        command.event_name(),
                        command.conversation_id()
                    );
                    if let Some(end) = self.send(link, command.to_packet()).await {
                        return end;
                    }
                }
            }
        }
    }

    /// Send one packet; a send that outlives the connect timeout loses the link
    async fn send(&self, link: &mut Link, packet: Packet) -> Option<LinkEnd> {
        match timeout(self.policy.connect_timeout, link.send(packet)).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(LinkEnd::Lost(e.to_string())),
            Err(_) => Some(LinkEnd::Lost("send timed out".to_string())),
        }
    }

    async fn handle_packet(&self, link: &mut Link, packet: Packet) -> Option<LinkEnd> {
        match packet {
            Packet::Ping => return self.send(link, Packet::Pong).await,
            Packet::Event { name, args } => match PushEvent::decode(&name, &args) {
                Ok(event) => {
                    debug!("{} <- {}", self.source, event.name());
                    let sourced = SourcedEvent {
                        source: self.source,
                        event,
                    };
                    if self.events.send(sourced).is_err() {
                        return Some(LinkEnd::Closed);
                    }
                }
                Err(e) => warn!("{} dropped malformed event: {}", self.source, e),
            },
            Packet::Close | Packet::Disconnect => {
                return Some(LinkEnd::Lost("disconnected by server".to_string()));
            }
            Packet::ConnectError(message) => {
                return Some(LinkEnd::Lost(format!("namespace error: {}", message)));
            }
            other => debug!("{} ignoring {:?}", self.source, other),
        }
        None
    }
}

/// Send the namespace connect and wait for its acknowledgement
///
/// Returns any packets that arrived after the acknowledgement.
async fn join_namespace(link: &mut Link) -> Result<Vec<Packet>> {
    link.send(Packet::Connect).await?;

    loop {
        let Some(packets) = link.recv().await? else {
            return Err(Error::Transport("closed during namespace join".to_string()));
        };

        let mut packets = packets.into_iter();
        while let Some(packet) = packets.next() {
            match packet {
                Packet::Connect => return Ok(packets.collect()),
                Packet::ConnectError(message) => return Err(Error::Transport(message)),
                Packet::Ping => link.send(Packet::Pong).await?,
                Packet::Close => {
                    return Err(Error::Transport("closed during namespace join".to_string()));
                }
                _ => {}
            }
        }
    }
}

enum Link {
    WebSocket(WsLink),
    Polling(PollingLink),
}

impl Link {
    fn mode(&self) -> LinkMode {
        match self {
            Link::WebSocket(_) => LinkMode::WebSocket,
            Link::Polling(_) => LinkMode::Polling,
        }
    }

    fn handshake(&self) -> &Handshake {
        match self {
            Link::WebSocket(ws) => &ws.handshake,
            Link::Polling(polling) => polling.session.handshake(),
        }
    }

    async fn recv(&mut self) -> Result<Option<Vec<Packet>>> {
        match self {
            Link::WebSocket(ws) => ws.recv().await,
            Link::Polling(polling) => polling.recv().await,
        }
    }

    async fn send(&mut self, packet: Packet) -> Result<()> {
        match self {
            Link::WebSocket(ws) => ws.send(packet).await,
            Link::Polling(polling) => polling.session.post(&[packet]).await,
        }
    }

    async fn close(self) {
        match self {
            Link::WebSocket(mut ws) => {
                let _ = ws.stream.close(None).await;
            }
            Link::Polling(polling) => {
                let _ = polling.session.post(&[Packet::Close]).await;
            }
        }
    }
}

struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    handshake: Handshake,
}

impl WsLink {
    async fn open(base_url: &str, deadline: Duration) -> Result<Self> {
        let mut url = endpoint(base_url, "websocket")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| Error::Transport(format!("cannot use {} for '{}'", scheme, base_url)))?;

        let (stream, _) = timeout(deadline, connect_async(url.as_str()))
            .await
            .map_err(|_| Error::Timeout(format!("websocket connect to {}", url)))??;

        let mut link = Self {
            stream,
            handshake: Handshake {
                sid: String::new(),
                upgrades: Vec::new(),
                ping_interval: 0,
                ping_timeout: 0,
                max_payload: 0,
            },
        };

        let first = timeout(deadline, link.recv())
            .await
            .map_err(|_| Error::Timeout("waiting for open packet".to_string()))??;
        match first.as_deref() {
            Some([Packet::Open(handshake)]) => link.handshake = handshake.clone(),
            other => {
                return Err(Error::Protocol(format!(
                    "expected open packet, got {:?}",
                    other
                )));
            }
        }
        Ok(link)
    }

    async fn recv(&mut self) -> Result<Option<Vec<Packet>>> {
        loop {
            match self.stream.next().await {
                None | Some(Ok(WsMessage::Close(_))) => return Ok(None),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(WsMessage::Text(text))) => match Packet::decode(text.as_str()) {
                    Ok(packet) => return Ok(Some(vec![packet])),
                    Err(e) => warn!("Skipping undecodable frame {:?}: {}", text.as_str(), e),
                },
                Some(Ok(_)) => continue,
            }
        }
    }

    async fn send(&mut self, packet: Packet) -> Result<()> {
        self.stream.send(WsMessage::text(packet.encode())).await?;
        Ok(())
    }
}

struct PollingLink {
    session: Arc<PollingSession>,
    incoming: mpsc::Receiver<Result<Vec<Packet>>>,
    poller: JoinHandle<()>,
}

impl PollingLink {
    async fn open(http: &reqwest::Client, base_url: &str, deadline: Duration) -> Result<Self> {
        let (session, _) = PollingSession::open(http, base_url, deadline).await?;
        let session = Arc::new(session);
        let (tx, incoming) = mpsc::channel(16);

        let poll_session = session.clone();
        let poller = tokio::spawn(async move {
            loop {
                let batch = poll_session.poll().await;
                let failed = batch.is_err();
                if tx.send(batch).await.is_err() || failed {
                    break;
                }
            }
        });

        Ok(Self {
            session,
            incoming,
            poller,
        })
    }

    async fn recv(&mut self) -> Result<Option<Vec<Packet>>> {
        match self.incoming.recv().await {
            Some(batch) => batch.map(Some),
            None => Ok(None),
        }
    }
}

impl Drop for PollingLink {
    fn drop(&mut self) {
        self.poller.abort();
    }
}
