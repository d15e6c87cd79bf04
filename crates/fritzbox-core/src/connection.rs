// ── Connection facade ──
//
// Full lifecycle management for one box. Every request is queued on a
// single mpsc channel and executed by one worker task that owns the
// `SessionExecutor`, so calls never overlap and complete in submission
// order. A failed call is answered and the worker moves on.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fritzbox_api::{FritzClient, TlsMode, TransportConfig};

use crate::config::{ConnectionConfig, TlsVerification};
use crate::directory::{DeviceDirectory, DeviceSnapshot};
use crate::error::CoreError;
use crate::model::{Device, FunctionMask};
use crate::operation::{Operation, OperationOutput};
use crate::session::SessionExecutor;

const REQUEST_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// The last explicit login was refused or could not reach the box.
    Failed,
}

// ── Worker requests ──────────────────────────────────────────────

type Reply<T> = oneshot::Sender<Result<T, CoreError>>;

enum Request {
    Login {
        reply: Reply<()>,
    },
    Refresh {
        reply: Reply<DeviceSnapshot>,
    },
    Call {
        operation: Operation,
        reply: Reply<OperationOutput>,
    },
}

/// Queue depth bookkeeping. Informational only.
#[derive(Debug, Default)]
struct Backlog {
    pending: AtomicUsize,
    busy: AtomicBool,
}

impl Backlog {
    fn enqueued(&self) -> usize {
        self.pending.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn dequeued(&self) {
        let _ = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            });
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Forget requests stranded in a discarded channel.
    fn reset(&self) {
        self.pending.store(0, Ordering::SeqCst);
    }

    fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

// ── Connection ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ConnectionInner>`. The worker task starts on
/// first use; [`connect()`](Self::connect) additionally logs in, loads the
/// device list and starts the optional periodic refresh.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    config: ConnectionConfig,
    client: FritzClient,
    directory: Arc<DeviceDirectory>,
    connection_state: watch::Sender<ConnectionState>,
    backlog: Arc<Backlog>,
    /// Lock order: `request_tx` before `request_rx`, `cancel_child` and
    /// `task_handles`.
    request_tx: Mutex<mpsc::Sender<Request>>,
    request_rx: Mutex<Option<mpsc::Receiver<Request>>>,
    cancel: CancellationToken,
    /// Child token for the current worker generation; replaced on disconnect.
    cancel_child: Mutex<CancellationToken>,
    /// Token of the running refresh task, if any.
    refresh_token: Mutex<Option<CancellationToken>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Connection {
    /// Create a connection from configuration. Does not touch the network.
    pub fn new(config: ConnectionConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&config.tls),
            timeout: config.timeout,
        };
        let client = FritzClient::new(config.url.clone(), &transport)?;
        Ok(Self::with_client(config, client))
    }

    /// Create a connection around an existing API client.
    pub fn with_client(config: ConnectionConfig, client: FritzClient) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ConnectionInner {
                config,
                client,
                directory: Arc::new(DeviceDirectory::new()),
                connection_state,
                backlog: Arc::new(Backlog::default()),
                request_tx: Mutex::new(request_tx),
                request_rx: Mutex::new(Some(request_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                refresh_token: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    pub fn directory(&self) -> &Arc<DeviceDirectory> {
        &self.inner.directory
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in, load the device list and start background refresh.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        self.login().await?;
        let devices = self.refresh_devices().await?;

        let interval_secs = self.inner.config.refresh_interval_secs;
        if interval_secs > 0 {
            self.start_refresh(interval_secs).await;
        }

        info!(
            url = %self.inner.config.url,
            devices = devices.len(),
            "connected"
        );
        Ok(())
    }

    /// Spawn the periodic refresh unless one is already running for the
    /// current worker generation.
    async fn start_refresh(&self, interval_secs: u64) {
        let mut refresh = self.inner.refresh_token.lock().await;
        if refresh.as_ref().is_some_and(|t| !t.is_cancelled()) {
            debug!("periodic refresh already running");
            return;
        }

        let cancel = self.inner.cancel_child.lock().await.clone();
        *refresh = Some(cancel.clone());
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(refresh_task(weak, interval_secs, cancel)));
    }

    /// Force a fresh login. Queued behind any outstanding calls.
    pub async fn login(&self) -> Result<(), CoreError> {
        let result = self.submit(|reply| Request::Login { reply }).await;
        let state = if result.is_ok() {
            ConnectionState::Connected
        } else {
            ConnectionState::Failed
        };
        let _ = self.inner.connection_state.send(state);
        result
    }

    /// Stop the worker and background refresh.
    ///
    /// Requests still queued resolve to [`CoreError::Disconnected`]. The
    /// connection can be used again afterwards with a fresh session.
    pub async fn disconnect(&self) {
        self.inner.cancel_child.lock().await.cancel();

        // Await outside the lock: a stopping task may still be in `submit`.
        let handles = std::mem::take(&mut *self.inner.task_handles.lock().await);
        for handle in handles {
            let _ = handle.await;
        }

        // Fresh channel and token so the next use spawns a new worker.
        // Swapped under the sender lock so `submit` never pairs the new
        // sender with a stale receiver.
        {
            let mut request_tx = self.inner.request_tx.lock().await;
            let (tx, rx) = mpsc::channel(REQUEST_CHANNEL_SIZE);
            *request_tx = tx;
            *self.inner.request_rx.lock().await = Some(rx);
            *self.inner.cancel_child.lock().await = self.inner.cancel.child_token();
            self.inner.backlog.reset();
        }

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Device directory ─────────────────────────────────────────

    /// Re-fetch the device list and replace the cache.
    ///
    /// On failure the previous list and readiness are kept.
    pub async fn refresh_devices(&self) -> Result<DeviceSnapshot, CoreError> {
        self.submit(|reply| Request::Refresh { reply }).await
    }

    pub fn is_ready(&self) -> bool {
        self.inner.directory.is_ready()
    }

    /// Resolve once the first device list has been loaded.
    pub async fn wait_ready(&self) {
        self.inner.directory.wait_ready().await;
    }

    pub fn find_device(&self, identifier: &str) -> Option<Arc<Device>> {
        self.inner.directory.lookup(identifier)
    }

    /// Look up a device, failing with the devices that support `required`
    /// when it is unknown.
    pub fn resolve_device(
        &self,
        identifier: &str,
        required: FunctionMask,
    ) -> Result<Arc<Device>, CoreError> {
        self.inner.directory.resolve(identifier, required)
    }

    /// Name → identifier for every device that supports all of `required`.
    pub fn devices_by_capability(&self, required: FunctionMask) -> BTreeMap<String, String> {
        self.inner.directory.describe_by_capability(required)
    }

    pub fn devices_snapshot(&self) -> DeviceSnapshot {
        self.inner.directory.snapshot()
    }

    // ── Operations ───────────────────────────────────────────────

    /// Queue an operation and wait for its result.
    ///
    /// Any failure is reported as [`CoreError::Operation`] naming the
    /// operation.
    pub async fn call(&self, operation: Operation) -> Result<OperationOutput, CoreError> {
        let name = operation.name();
        self.submit(|reply| Request::Call { operation, reply })
            .await
            .map_err(|e| match e {
                e @ CoreError::Operation { .. } => e,
                other => CoreError::Operation {
                    operation: name.to_owned(),
                    source: Box::new(other),
                },
            })
    }

    /// Requests submitted but not yet picked up by the worker.
    pub fn pending(&self) -> usize {
        self.inner.backlog.pending()
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Periodic refresh is disabled since only one request-response cycle
    /// is needed.
    pub async fn oneshot<F, Fut, T>(config: ConnectionConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Connection) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval_secs = 0;

        let connection = Connection::new(cfg)?;
        if let Err(e) = connection.connect().await {
            connection.disconnect().await;
            return Err(e);
        }
        let result = f(connection.clone()).await;
        connection.disconnect().await;
        result
    }

    // ── Internals ────────────────────────────────────────────────

    async fn ensure_worker(&self) {
        let Some(rx) = self.inner.request_rx.lock().await.take() else {
            return;
        };

        let executor = SessionExecutor::new(
            self.inner.client.clone(),
            self.inner.config.credentials.clone(),
        );
        let cancel = self.inner.cancel_child.lock().await.clone();
        let handle = tokio::spawn(request_worker(
            executor,
            Arc::clone(&self.inner.directory),
            Arc::clone(&self.inner.backlog),
            rx,
            cancel,
        ));
        self.inner.task_handles.lock().await.push(handle);
    }

    async fn submit<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Request,
    ) -> Result<T, CoreError> {
        // The worker check and the sender clone share one critical section
        // with the channel swap in `disconnect`.
        let request_tx = {
            let request_tx = self.inner.request_tx.lock().await;
            self.ensure_worker().await;
            request_tx.clone()
        };

        let (tx, rx) = oneshot::channel();

        let depth = self.inner.backlog.enqueued();
        if self.inner.backlog.is_busy() {
            debug!(pending = depth, "request queued behind a running call");
        }

        if request_tx.send(make(tx)).await.is_err() {
            self.inner.backlog.dequeued();
            return Err(CoreError::Disconnected);
        }

        rx.await.map_err(|_| CoreError::Disconnected)?
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Execute queued requests one at a time until cancelled or every
/// `Connection` handle is gone.
async fn request_worker(
    mut executor: SessionExecutor,
    directory: Arc<DeviceDirectory>,
    backlog: Arc<Backlog>,
    mut rx: mpsc::Receiver<Request>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            request = rx.recv() => {
                let Some(request) = request else { break };
                backlog.dequeued();
                backlog.set_busy(true);
                handle_request(&mut executor, &directory, request).await;
                backlog.set_busy(false);
            }
        }
    }
    debug!("request worker stopped");
}

async fn handle_request(
    executor: &mut SessionExecutor,
    directory: &DeviceDirectory,
    request: Request,
) {
    match request {
        Request::Login { reply } => {
            let result = executor.login().await;
            if let Err(ref e) = result {
                warn!(error = %e, "login failed");
            }
            let _ = reply.send(result);
        }
        Request::Refresh { reply } => {
            let result = executor
                .invoke(&Operation::GetDeviceList)
                .await
                .and_then(|output| match output {
                    OperationOutput::Devices(devices) => Ok(directory.replace(devices)),
                    other => Err(CoreError::Internal(format!(
                        "unexpected answer to getDeviceList: {other:?}"
                    ))),
                });
            if let Err(ref e) = result {
                warn!(error = %e, "device list refresh failed");
            }
            let _ = reply.send(result);
        }
        Request::Call { operation, reply } => {
            let name = operation.name();
            debug!(operation = name, ain = operation.ain(), "executing");
            let result = executor.invoke(&operation).await;
            if let Ok(OperationOutput::Devices(devices)) = &result {
                directory.replace(devices.clone());
            }
            let result = result.map_err(|e| {
                warn!(operation = name, error = %e, "{name} failed");
                CoreError::Operation {
                    operation: name.to_owned(),
                    source: Box::new(e),
                }
            });
            let _ = reply.send(result);
        }
    }
}

/// Periodically re-fetch the device list. Stops when cancelled or when the
/// connection has been dropped.
async fn refresh_task(inner: Weak<ConnectionInner>, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                let connection = Connection { inner };
                if let Err(e) = connection.refresh_devices().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}
