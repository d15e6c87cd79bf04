//! Session-aware, serialized connection to a FRITZ!Box home automation API.
//!
//! This crate sits between `fritzbox-api` (raw HTTP calls) and front ends
//! such as the `fritzbox` CLI:
//!
//! - **[`Connection`]**: Per-box facade. Every request (login, device list
//!   refresh, device operation) is queued on one `mpsc` channel and executed
//!   by a single worker task, so operations never interleave against the
//!   same session and complete in submission order.
//!
//! - **[`SessionExecutor`]**: Owned by the worker. Logs in on demand,
//!   attaches the SID to each operation, and on a 403 renews the session and
//!   retries exactly once.
//!
//! - **[`DeviceDirectory`]**: Cached device list with readiness gating,
//!   whitespace-tolerant AIN lookup and capability filtering. Readers get
//!   lock-free `arc-swap` snapshots.
//!
//! - **[`Operation`]**: Closed set of supported device commands, with
//!   name-based construction for string-driven callers.

pub mod config;
pub mod connection;
pub mod convert;
pub mod directory;
pub mod error;
pub mod model;
pub mod operation;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionConfig, TlsVerification, normalize_url};
pub use connection::{Connection, ConnectionState};
pub use directory::DeviceDirectory;
pub use error::CoreError;
pub use model::{Device, FunctionMask};
pub use operation::{Operation, OperationKind, OperationOutput};
pub use session::{SessionExecutor, SessionState};

pub use fritzbox_api::{Credentials, SessionId};
