// ── Device directory ──
//
// Cached device list for one box. Written only by the connection worker
// (after a successful refresh); read from anywhere through lock-free
// snapshots. Lookups are refused until the first list has been stored.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Device, FunctionMask, normalize_identifier};

/// Snapshot of the cached devices.
pub type DeviceSnapshot = Arc<Vec<Arc<Device>>>;

pub struct DeviceDirectory {
    devices: ArcSwap<Vec<Arc<Device>>>,
    ready: watch::Sender<bool>,
}

impl DeviceDirectory {
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            devices: ArcSwap::from_pointee(Vec::new()),
            ready,
        }
    }

    /// Swap in a freshly fetched list and mark the directory ready.
    pub fn replace(&self, devices: Vec<Device>) -> DeviceSnapshot {
        let snapshot: DeviceSnapshot = Arc::new(devices.into_iter().map(Arc::new).collect());
        debug!(count = snapshot.len(), "device list replaced");
        self.devices.store(Arc::clone(&snapshot));
        self.ready.send_replace(true);
        snapshot
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolve once the first device list has been stored.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Subscribe to readiness changes.
    pub fn ready_changes(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        self.devices.load_full()
    }

    pub fn len(&self) -> usize {
        self.devices.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.load().is_empty()
    }

    /// Find a device by AIN: exact match first, then ignoring whitespace on
    /// both sides. `None` before the first refresh.
    pub fn lookup(&self, identifier: &str) -> Option<Arc<Device>> {
        if !self.is_ready() {
            return None;
        }

        let devices = self.devices.load();
        if let Some(device) = devices.iter().find(|d| d.identifier == identifier) {
            return Some(Arc::clone(device));
        }

        let wanted = normalize_identifier(identifier);
        if wanted.is_empty() {
            return None;
        }
        devices
            .iter()
            .find(|d| normalize_identifier(&d.identifier) == wanted)
            .cloned()
    }

    /// Name → identifier for every device that supports all of `required`.
    ///
    /// Later duplicates of a name win.
    pub fn describe_by_capability(&self, required: FunctionMask) -> BTreeMap<String, String> {
        self.devices
            .load()
            .iter()
            .filter(|d| d.supports(required))
            .map(|d| (d.name.clone(), d.identifier.clone()))
            .collect()
    }

    /// Devices that support all of `required`, in list order.
    pub fn by_capability(&self, required: FunctionMask) -> Vec<Arc<Device>> {
        self.devices
            .load()
            .iter()
            .filter(|d| d.supports(required))
            .cloned()
            .collect()
    }

    /// Look a device up, explaining what was available when it is missing.
    pub fn resolve(
        &self,
        identifier: &str,
        required: FunctionMask,
    ) -> Result<Arc<Device>, CoreError> {
        if !self.is_ready() {
            return Err(CoreError::NotReady);
        }

        if let Some(device) = self.lookup(identifier) {
            return Ok(device);
        }

        let candidates = self.describe_by_capability(required);
        warn!(
            identifier,
            available = ?candidates,
            "unknown device"
        );
        Err(CoreError::DeviceNotFound {
            identifier: identifier.to_owned(),
            candidates,
        })
    }
}

impl Default for DeviceDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeviceDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceDirectory")
            .field("ready", &self.is_ready())
            .field("devices", &self.len())
            .finish()
    }
}
