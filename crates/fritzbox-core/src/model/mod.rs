// ── Domain model ──
//
// Canonical representation of smart-home actors attached to a box.
// Consumers (CLI, directory lookups) depend on these, never on the
// raw `fritzbox_api::DeviceInfo` decode type.

pub mod device;

// ── Re-exports ──────────────────────────────────────────────────────

pub use device::{Device, FunctionMask, normalize_identifier};
