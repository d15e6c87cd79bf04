// Device list decoding
//
// `getdevicelistinfos` answers with a `<devicelist>` document. Only the
// `<device>` elements are read: their attributes plus the direct `<name>`
// and `<present>` children. A device with unusable attributes is logged
// and skipped; an XML syntax error ends the scan but keeps what was
// already decoded.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One `<device>` record as reported by the box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// AIN. HAN-FUN devices report it with embedded spaces.
    pub identifier: String,
    pub id: String,
    pub function_bitmask: u64,
    pub fw_version: String,
    pub manufacturer: String,
    pub product_name: String,
    pub name: String,
    pub present: bool,
}

/// Which direct child of `<device>` the reader is positioned in.
#[derive(Debug, Clone, Copy)]
enum Field {
    Name,
    Present,
}

/// A `<device>` being assembled, or the reason it will be skipped.
type Pending = Result<DeviceInfo, String>;

/// Decode a `getdevicelistinfos` body into device records.
pub fn decode_device_list(body: &str) -> Vec<DeviceInfo> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut devices = Vec::new();
    let mut current: Option<Pending> = None;
    // Nesting depth below the open <device>.
    let mut depth = 0usize;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if current.is_some() {
                    depth += 1;
                    field = if depth == 1 {
                        match e.name().as_ref() {
                            b"name" => Some(Field::Name),
                            b"present" => Some(Field::Present),
                            _ => None,
                        }
                    } else {
                        None
                    };
                } else if e.name().as_ref() == b"device" {
                    current = Some(device_from_attributes(&e));
                    depth = 0;
                }
            }
            Ok(Event::Empty(e)) => {
                if current.is_none() && e.name().as_ref() == b"device" {
                    finish(device_from_attributes(&e), &mut devices);
                }
            }
            Ok(Event::Text(t)) => {
                let Some(field) = field else { continue };
                if let Some(Ok(device)) = current.as_mut() {
                    let text = match t.unescape() {
                        Ok(text) => text,
                        Err(e) => {
                            current = Some(Err(format!("bad text in device element: {e}")));
                            continue;
                        }
                    };
                    match field {
                        Field::Name => device.name = text.into_owned(),
                        Field::Present => device.present = text.trim() == "1",
                    }
                }
            }
            Ok(Event::End(_)) => {
                if current.is_some() {
                    if depth == 0 {
                        if let Some(pending) = current.take() {
                            finish(pending, &mut devices);
                        }
                    } else {
                        depth -= 1;
                        field = None;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(
                    position = reader.error_position(),
                    error = %e,
                    "XML parse error in device list"
                );
                break;
            }
        }
    }

    debug!("retrieved {} devices", devices.len());
    devices
}

fn finish(pending: Pending, devices: &mut Vec<DeviceInfo>) {
    match pending {
        Ok(device) => {
            debug!(identifier = %device.identifier, name = %device.name, "found device");
            devices.push(device);
        }
        Err(reason) => warn!(%reason, "skipping malformed device"),
    }
}

fn device_from_attributes(e: &BytesStart<'_>) -> Pending {
    let mut device = DeviceInfo {
        identifier: String::new(),
        id: String::new(),
        function_bitmask: 0,
        fw_version: String::new(),
        manufacturer: String::new(),
        product_name: String::new(),
        name: String::new(),
        present: false,
    };

    for attr in e.attributes() {
        let attr = attr.map_err(|err| format!("bad attribute: {err}"))?;
        let value = attr
            .unescape_value()
            .map_err(|err| format!("bad attribute value: {err}"))?
            .into_owned();

        match attr.key.as_ref() {
            b"identifier" => device.identifier = value,
            b"id" => device.id = value,
            b"functionbitmask" => {
                device.function_bitmask = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("functionbitmask {value:?} is not a number"))?;
            }
            b"fwversion" => device.fw_version = value,
            b"manufacturer" => device.manufacturer = value,
            b"productname" => device.product_name = value,
            _ => {}
        }
    }

    if device.identifier.is_empty() {
        return Err("device without identifier".into());
    }

    Ok(device)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const DEVICE_LIST: &str = r#"<devicelist version="1">
<device identifier="08761 0000434" id="17" functionbitmask="35712" fwversion="03.33" manufacturer="AVM" productname="FRITZ!DECT 200">
  <present>1</present>
  <name>Steckdose Wohnzimmer</name>
  <switch><state>1</state><mode>manuell</mode><lock>0</lock></switch>
  <temperature><celsius>225</celsius><offset>0</offset></temperature>
</device>
<device identifier="11630 0123456" id="18" functionbitmask="320" fwversion="04.90" manufacturer="AVM" productname="Comet DECT">
  <present>0</present>
  <name>Heizung &amp; Bad</name>
  <hkr><tist>40</tist><tsoll>42</tsoll><name>ignored</name></hkr>
</device>
<group identifier="grp1" id="900" functionbitmask="4160"><present>1</present><name>Gruppe</name></group>
</devicelist>"#;

    #[test]
    fn decodes_devices_and_direct_children() {
        let devices = decode_device_list(DEVICE_LIST);
        assert_eq!(devices.len(), 2);

        let outlet = &devices[0];
        assert_eq!(outlet.identifier, "08761 0000434");
        assert_eq!(outlet.id, "17");
        assert_eq!(outlet.function_bitmask, 35712);
        assert_eq!(outlet.fw_version, "03.33");
        assert_eq!(outlet.manufacturer, "AVM");
        assert_eq!(outlet.product_name, "FRITZ!DECT 200");
        assert_eq!(outlet.name, "Steckdose Wohnzimmer");
        assert!(outlet.present);

        let thermostat = &devices[1];
        assert_eq!(thermostat.name, "Heizung & Bad");
        assert_eq!(thermostat.function_bitmask, 320);
        assert!(!thermostat.present);
    }

    #[test]
    fn skips_device_with_bad_bitmask() {
        let body = r#"<devicelist>
<device identifier="1" id="1" functionbitmask="lots"><name>broken</name></device>
<device identifier="2" id="2" functionbitmask="512"><name>fine</name></device>
</devicelist>"#;
        let devices = decode_device_list(body);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "fine");
    }

    #[test]
    fn skips_device_without_identifier() {
        let body = r#"<devicelist><device id="1" functionbitmask="512"/><device identifier="x" id="2" functionbitmask="1"/></devicelist>"#;
        let devices = decode_device_list(body);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].identifier, "x");
        assert_eq!(devices[0].name, "");
    }

    #[test]
    fn keeps_devices_before_syntax_error() {
        let body = r#"<devicelist>
<device identifier="1" id="1" functionbitmask="512"><name>first</name></device>
<device identifier="2" id="2" functionbitmask="512"><name>second</oops></device>
</devicelist>"#;
        let devices = decode_device_list(body);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "first");
    }

    #[test]
    fn empty_body_yields_no_devices() {
        assert!(decode_device_list("").is_empty());
    }
}
