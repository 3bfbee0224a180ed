//! Native-messaging transport.
//!
//! Talks to a companion host process over its stdin/stdout. Every request
//! carries a fresh id and waits on its own channel, so responses that come
//! back out of order still reach the request that asked. Hosts that do not
//! echo ids are answered in FIFO order. The host is started by the first
//! lookup, and again by a later lookup once it has exited.

use std::collections::{HashMap, HashSet, VecDeque};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::framing::{read_frame, write_message};
use super::CredentialTransport;
use crate::services::origin::normalize_origin;
use crate::types::credential::{FillResponse, NativeRequest, NativeResponse};
use crate::types::errors::RelayError;
use crate::types::settings::{NativeHostSettings, TransportKind};

type Writer = Box<dyn AsyncWrite + Send + Unpin>;
type Reply = Result<NativeResponse, RelayError>;

/// Outstanding requests keyed by id, plus their issue order.
#[derive(Default)]
struct PendingRequests {
    /// Ids in the order they were written. An abandoned request keeps its
    /// slot until the host answers it.
    order: VecDeque<String>,
    waiters: HashMap<String, oneshot::Sender<Reply>>,
    abandoned: HashSet<String>,
}

/// Destination of one frame read from the host.
enum Route {
    Waiter(oneshot::Sender<Reply>),
    /// Late answer to a request nobody waits for any more.
    Abandoned(String),
    Unmatched,
}

impl PendingRequests {
    fn insert(&mut self, id: String, tx: oneshot::Sender<Reply>) {
        self.order.push_back(id.clone());
        self.waiters.insert(id, tx);
    }

    /// Routes a frame by its id, or to the oldest slot when the host sent none.
    fn route(&mut self, id: Option<&str>) -> Route {
        let id = match id {
            Some(id) => id.to_string(),
            None => match self.order.front() {
                Some(front) => front.clone(),
                None => return Route::Unmatched,
            },
        };
        self.order.retain(|pending| *pending != id);
        if let Some(tx) = self.waiters.remove(&id) {
            return Route::Waiter(tx);
        }
        if self.abandoned.remove(&id) {
            return Route::Abandoned(id);
        }
        Route::Unmatched
    }

    /// Stops waiting for `id` but keeps its slot, so the host's eventual
    /// answer is consumed here instead of reaching a younger request.
    fn abandon(&mut self, id: &str) {
        if self.waiters.remove(id).is_some() {
            self.abandoned.insert(id.to_string());
        }
    }

    /// Forgets a request the host never received.
    fn remove(&mut self, id: &str) {
        self.order.retain(|pending| pending != id);
        self.waiters.remove(id);
    }

    fn clear(&mut self) {
        self.order.clear();
        self.waiters.clear();
        self.abandoned.clear();
    }

    fn len(&self) -> usize {
        self.waiters.len()
    }
}

/// Abandons a request when its future is dropped before the answer arrived.
struct PendingGuard {
    pending: Arc<Mutex<PendingRequests>>,
    id: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.abandon(&self.id);
        }
    }
}

/// Splits a frame into its correlation id and the decoded response. A
/// frame that is JSON but not a known response shape still yields its id,
/// so the error reaches the request that asked.
fn decode_response(body: &[u8]) -> (Option<String>, Reply) {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return (
                None,
                Err(RelayError::Protocol(format!("malformed native message: {}", e))),
            )
        }
    };
    let id = value.get("id").and_then(Value::as_str).map(str::to_string);
    let reply = serde_json::from_value::<NativeResponse>(value)
        .map_err(|e| RelayError::Protocol(format!("unexpected native message: {}", e)));
    (id, reply)
}

fn disconnected() -> RelayError {
    RelayError::TransportUnreachable("native host disconnected".to_string())
}

/// One live channel to a host.
struct Connection {
    writer: tokio::sync::Mutex<Writer>,
    pending: Arc<Mutex<PendingRequests>>,
    closed: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
    _child: Option<Mutex<Child>>,
}

impl Connection {
    fn open<R, W>(reader: R, writer: W, child: Option<Child>) -> Arc<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let pending = Arc::new(Mutex::new(PendingRequests::default()));
        let closed = Arc::new(AtomicBool::new(false));
        let reader_task = tokio::spawn(read_loop(reader, pending.clone(), closed.clone()));

        Arc::new(Self {
            writer: tokio::sync::Mutex::new(Box::new(writer)),
            pending,
            closed,
            reader_task,
            _child: child.map(Mutex::new),
        })
    }

    fn spawn(settings: &NativeHostSettings) -> Result<Arc<Self>, RelayError> {
        info!(host = %settings.name, command = %settings.command, "starting native host");
        let mut child = Command::new(&settings.command)
            .args(&settings.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RelayError::TransportUnreachable(format!("{}: {}", settings.command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RelayError::TransportUnreachable("native host stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RelayError::TransportUnreachable("native host stdout unavailable".to_string()))?;

        Ok(Self::open(stdout, stdin, Some(child)))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn forget(&self, id: &str) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(id);
        }
    }

    async fn request(&self, origin: &str) -> Reply {
        if self.is_closed() {
            return Err(disconnected());
        }

        let id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();

        // Registering under the writer lock keeps the queue in wire order.
        let mut writer = self.writer.lock().await;
        self.pending
            .lock()
            .map_err(|_| disconnected())?
            .insert(id.clone(), tx);
        let _guard = PendingGuard {
            pending: self.pending.clone(),
            id: id.clone(),
        };
        if self.is_closed() {
            self.forget(&id);
            return Err(disconnected());
        }

        debug!(%origin, %id, "sending native request");
        let request = NativeRequest {
            origin: origin.to_string(),
            id: Some(id.clone()),
        };
        if let Err(e) = write_message(&mut *writer, &request).await {
            self.forget(&id);
            return Err(RelayError::TransportUnreachable(e.to_string()));
        }
        drop(writer);

        rx.await.map_err(|_| disconnected())?
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

async fn read_loop<R>(mut reader: R, pending: Arc<Mutex<PendingRequests>>, closed: Arc<AtomicBool>)
where
    R: AsyncRead + Unpin,
{
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(body)) => {
                let (id, reply) = decode_response(&body);
                if let Err(e) = &reply {
                    warn!(error = %e, "undecodable native response");
                }
                let route = match pending.lock() {
                    Ok(mut pending) => pending.route(id.as_deref()),
                    Err(_) => Route::Unmatched,
                };
                match route {
                    Route::Waiter(tx) => {
                        // Receiver may be gone already.
                        let _ = tx.send(reply);
                    }
                    Route::Abandoned(id) => debug!(%id, "dropping answer to abandoned request"),
                    Route::Unmatched => warn!(id = ?id, "native response with no matching request"),
                }
            }
            Ok(None) => {
                info!("native host closed the channel");
                break;
            }
            Err(e) => {
                warn!(error = %e, "native channel failed");
                break;
            }
        }
    }

    closed.store(true, Ordering::SeqCst);
    if let Ok(mut pending) = pending.lock() {
        pending.clear();
    }
}

pub struct NativeTransport {
    host: Option<NativeHostSettings>,
    connection: Mutex<Option<Arc<Connection>>>,
}

impl NativeTransport {
    /// Transport for the configured host. Nothing is started until the
    /// first lookup, and a host that fails to start is reported by that
    /// lookup.
    pub fn new(settings: &NativeHostSettings) -> Self {
        Self {
            host: Some(settings.clone()),
            connection: Mutex::new(None),
        }
    }

    /// Connects over an existing pair of streams. Must be called inside a
    /// Tokio runtime. Once the streams close, lookups fail for good.
    pub fn from_streams<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            host: None,
            connection: Mutex::new(Some(Connection::open(reader, writer, None))),
        }
    }

    /// Whether a channel to the host is currently open.
    pub fn is_connected(&self) -> bool {
        self.current().map_or(false, |conn| !conn.is_closed())
    }

    /// Number of requests still waiting for an answer.
    pub fn pending_count(&self) -> usize {
        self.current()
            .and_then(|conn| conn.pending.lock().ok().map(|p| p.len()))
            .unwrap_or(0)
    }

    fn current(&self) -> Option<Arc<Connection>> {
        self.connection.lock().ok().and_then(|slot| slot.clone())
    }

    /// The live connection, starting the host when there is none.
    fn connection(&self) -> Result<Arc<Connection>, RelayError> {
        let mut slot = self.connection.lock().map_err(|_| disconnected())?;
        if let Some(conn) = slot.as_ref() {
            if !conn.is_closed() || self.host.is_none() {
                return Ok(conn.clone());
            }
        }
        let host = self.host.as_ref().ok_or_else(disconnected)?;
        let conn = Connection::spawn(host)?;
        *slot = Some(conn.clone());
        Ok(conn)
    }
}

#[async_trait]
impl CredentialTransport for NativeTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Native
    }

    fn requires_token(&self) -> bool {
        false
    }

    async fn lookup(&self, url: &str, _token: Option<&str>) -> Result<FillResponse, RelayError> {
        let origin = normalize_origin(url)?;
        let connection = self.connection()?;
        let response = connection.request(&origin).await?;
        response.into_fill_response(&origin)
    }
}
