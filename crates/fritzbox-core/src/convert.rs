// ── API-to-domain type conversions ──
//
// Bridges raw `fritzbox_api` decode types into `fritzbox_core::model`.

use fritzbox_api::DeviceInfo;

use crate::model::{Device, FunctionMask};

impl From<DeviceInfo> for Device {
    fn from(info: DeviceInfo) -> Self {
        Self {
            identifier: info.identifier,
            id: info.id,
            functions: FunctionMask::from_bits(info.function_bitmask),
            firmware_version: info.fw_version,
            manufacturer: info.manufacturer,
            product_name: info.product_name,
            name: info.name,
            present: info.present,
        }
    }
}
