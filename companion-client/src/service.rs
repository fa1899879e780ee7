//! The service runtime: one `Service` owns one connection
//! and three concurrent activities — receive, send, keepalive — scheduled
//! cooperatively. Grounded on `gpippy.common.Service` (`_recv_loop`,
//! `_send_loop`, `_keepalive`, `close`/`wait`), with gevent greenlets
//! replaced by tokio tasks and the `close_on_error` decorator replaced by
//! each task reporting its outcome to a shared, once-settable `finished`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use companion_codec::{Frame, FrameCodec, RecordDecoder};
use companion_types::graph::Id;
use companion_types::message::MessageType;
use companion_types::{Graph, Value as GraphValue, VersionInfo};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde_json::Value;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use crate::config::ServiceConfig;
use crate::connection;
use crate::error::ServiceError;
use crate::rpc::RpcCorrelator;

type Subscriber = Box<dyn Fn(Id, &GraphValue) + Send + Sync>;

struct Shared {
    graph: Mutex<Graph>,
    rpc: Mutex<RpcCorrelator>,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    next_subscriber_id: AtomicU64,
    finished: Mutex<Option<Result<(), ServiceError>>>,
    notify: Notify,
    cancel: CancellationToken,
}

impl Shared {
    /// Records the first terminal outcome; later calls are no-ops — the
    /// first such call captures the cause.
    async fn close(&self, outcome: Result<(), ServiceError>) {
        let mut finished = self.finished.lock().await;
        if finished.is_none() {
            *finished = Some(outcome);
            self.cancel.cancel();
            self.notify.notify_waiters();
        }
    }
}

/// A subscription token returned by [`Service::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// The runtime owning one connection.
pub struct Service {
    shared: Arc<Shared>,
    send_tx: mpsc::Sender<(u8, Vec<u8>)>,
    version_info: VersionInfo,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Service {
    /// Client role: connects to `addr`, completes the handshake, and starts
    /// the three activities.
    pub async fn connect<A: ToSocketAddrs>(addr: A, config: ServiceConfig) -> Result<Self, ServiceError> {
        let (framed, version_info) = connection::connect(addr).await?;
        Ok(Self::spawn(framed, version_info, config))
    }

    /// Server role: immediately after accepting `stream`, sends
    /// `CONNECTION_ACCEPTED` and starts the three activities.
    pub async fn accept(stream: TcpStream, info: VersionInfo, config: ServiceConfig) -> Result<Self, ServiceError> {
        let framed = connection::accept(stream, &info).await?;
        Ok(Self::spawn(framed, info, config))
    }

    fn spawn(framed: Framed<TcpStream, FrameCodec>, version_info: VersionInfo, config: ServiceConfig) -> Self {
        let (mut sink, mut stream) = framed.split();
        let (send_tx, mut send_rx) = mpsc::channel::<(u8, Vec<u8>)>(config.send_queue_capacity);

        let shared = Arc::new(Shared {
            graph: Mutex::new(Graph::new()),
            rpc: Mutex::new(RpcCorrelator::new()),
            subscribers: Mutex::new(HashMap::new()),
            next_subscriber_id: AtomicU64::new(0),
            finished: Mutex::new(None),
            notify: Notify::new(),
            cancel: CancellationToken::new(),
        });

        let recv_shared = shared.clone();
        let recv_handle = tokio::spawn(async move {
            let result = recv_loop(&recv_shared, &mut stream, config.yield_every).await;
            recv_shared.close(result).await;
        });

        let send_shared = shared.clone();
        let send_handle = tokio::spawn(async move {
            let result = send_loop(&send_shared, &mut sink, &mut send_rx).await;
            send_shared.close(result).await;
        });

        let keepalive_shared = shared.clone();
        let keepalive_tx = send_tx.clone();
        let keepalive_handle = tokio::spawn(async move {
            keepalive_loop(&keepalive_shared, keepalive_tx, config.keepalive_interval).await;
        });

        Self {
            shared,
            send_tx,
            version_info,
            tasks: Mutex::new(vec![recv_handle, send_handle, keepalive_handle]),
        }
    }

    pub fn version_info(&self) -> &VersionInfo {
        &self.version_info
    }

    /// Enqueues a remote command and resolves with the matching
    /// `COMMAND_RESULT` payload.
    pub async fn send_command(&self, kind: u8, args: Vec<Value>) -> Result<Value, ServiceError> {
        let (request, rx) = self.shared.rpc.lock().await.create_request(kind, args);
        let payload = serde_json::to_vec(&request).expect("CommandRequest always serializes");
        self.send_tx
            .send((MessageType::Command.tag(), payload))
            .await
            .map_err(|_| ServiceError::PeerClosed)?;
        rx.await.map_err(|_| ServiceError::PeerClosed)
    }

    /// Registers `callback` to be invoked once per decoded `DATA_UPDATE`
    /// record — the documented default granularity.
    pub async fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Id, &GraphValue) + Send + Sync + 'static,
    {
        let id = self.shared.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.shared.subscribers.lock().await.insert(id, Box::new(callback));
        SubscriptionId(id)
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) {
        self.shared.subscribers.lock().await.remove(&id.0);
    }

    /// A read-only snapshot of the value graph as it stood at the moment of
    /// the call.
    pub async fn graph(&self) -> Graph {
        self.shared.graph.lock().await.clone()
    }

    /// Cancels the local completion for an outstanding RPC call without
    /// affecting in-flight network state.
    pub async fn cancel_command(&self, id: u32) {
        self.shared.rpc.lock().await.cancel(id);
    }

    /// Idempotent and terminal: cancels all three activities at their next
    /// suspension point and waits for them to stop.
    pub async fn close(&self) {
        self.shared.close(Ok(())).await;
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }
    }

    /// Blocks until the runtime has finished, returning the first captured
    /// error, if any.
    pub async fn wait(&self) -> Result<(), ServiceError> {
        loop {
            let notified = self.shared.notify.notified();
            {
                let finished = self.shared.finished.lock().await;
                if let Some(result) = finished.as_ref() {
                    return result.clone();
                }
            }
            notified.await;
        }
    }
}

async fn recv_loop(
    shared: &Arc<Shared>,
    stream: &mut (impl StreamExt<Item = Result<Frame, companion_codec::FrameError>> + Unpin),
    yield_every: usize,
) -> Result<(), ServiceError> {
    loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => return Ok(()),
            next = stream.next() => {
                match next {
                    None => {
                        info!("peer closed connection");
                        return Ok(());
                    }
                    Some(Err(err)) => return Err(err.into()),
                    Some(Ok(frame)) => dispatch(shared, frame, yield_every).await?,
                }
            }
        }
    }
}

async fn dispatch(shared: &Arc<Shared>, frame: Frame, yield_every: usize) -> Result<(), ServiceError> {
    match MessageType::from_tag(frame.msg_type) {
        Some(MessageType::KeepAlive) => Ok(()),
        Some(MessageType::DataUpdate) => apply_data_update(shared, &frame.payload, yield_every).await,
        Some(MessageType::LocalMapUpdate) => {
            debug!("ignoring LOCAL_MAP_UPDATE ({} bytes)", frame.payload.len());
            Ok(())
        }
        Some(MessageType::CommandResult) => shared.rpc.lock().await.recv(&frame.payload),
        Some(other) => {
            warn!("unexpected message type {:?} on the receive activity, ignoring", other);
            Ok(())
        }
        None => {
            warn!("unknown message type {}, ignoring", frame.msg_type);
            Ok(())
        }
    }
}

async fn apply_data_update(shared: &Arc<Shared>, payload: &[u8], yield_every: usize) -> Result<(), ServiceError> {
    let mut decoded = 0usize;
    for record in RecordDecoder::new(payload) {
        let (id, body) = record?;
        let materialized = {
            let mut graph = shared.graph.lock().await;
            graph.apply(id, body)?;
            graph.materialize(id)
        };
        notify_subscribers(shared, id, &materialized).await;

        decoded += 1;
        if yield_every != 0 && decoded % yield_every == 0 {
            tokio::task::yield_now().await;
        }
    }
    Ok(())
}

async fn notify_subscribers(shared: &Arc<Shared>, id: Id, value: &GraphValue) {
    let subscribers = shared.subscribers.lock().await;
    for callback in subscribers.values() {
        callback(id, value);
    }
}

async fn send_loop(
    shared: &Arc<Shared>,
    sink: &mut (impl SinkExt<Frame, Error = companion_codec::FrameError> + Unpin),
    queue: &mut mpsc::Receiver<(u8, Vec<u8>)>,
) -> Result<(), ServiceError> {
    loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => return Ok(()),
            next = queue.recv() => {
                match next {
                    None => return Ok(()),
                    Some((msg_type, payload)) => {
                        debug!("sending message of type {msg_type}: {} bytes", payload.len());
                        sink.send(Frame::new(msg_type, payload)).await?;
                    }
                }
            }
        }
    }
}

async fn keepalive_loop(shared: &Arc<Shared>, send_tx: mpsc::Sender<(u8, Vec<u8>)>, interval: std::time::Duration) {
    loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {
                info!("sending keepalive");
                if send_tx.send((MessageType::KeepAlive.tag(), Vec::new())).await.is_err() {
                    return;
                }
            }
        }
    }
}
