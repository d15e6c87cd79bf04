// fritzbox-api: Async Rust client for the FRITZ!Box home automation (AHA) interface

pub mod auth;
pub mod client;
pub mod devicelist;
pub mod error;
pub mod homeauto;
pub mod transport;

pub use auth::{Credentials, PLACEHOLDER_SID, SessionId, challenge_response};
pub use client::FritzClient;
pub use devicelist::{DeviceInfo, decode_device_list};
pub use error::Error;
pub use homeauto::{
    TEMP_TARGET_MAX, TEMP_TARGET_MIN, decode_temp_target, encode_temp_target,
};
pub use transport::{TlsMode, TransportConfig};
