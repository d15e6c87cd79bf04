// ── Device domain types ──

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Capability bitmask from the device list's `functionbitmask` attribute.
///
/// A device supports a set of capabilities when every bit of the set is
/// present in its mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionMask(u64);

impl FunctionMask {
    pub const NONE: Self = Self(0);
    pub const HANFUN: Self = Self(1);
    pub const LIGHT: Self = Self(1 << 2);
    pub const ALARM: Self = Self(1 << 4);
    pub const BUTTON: Self = Self(1 << 5);
    pub const THERMOSTAT: Self = Self(1 << 6);
    pub const POWER_METER: Self = Self(1 << 7);
    pub const TEMPERATURE: Self = Self(1 << 8);
    pub const OUTLET: Self = Self(1 << 9);
    pub const DECT_REPEATER: Self = Self(1 << 10);
    pub const MICROPHONE: Self = Self(1 << 11);
    pub const HANFUN_UNIT: Self = Self(1 << 13);
    pub const SWITCHABLE: Self = Self(1 << 15);
    pub const DIMMABLE: Self = Self(1 << 16);
    pub const COLOR_CONTROL: Self = Self(1 << 17);
    pub const BLIND: Self = Self(1 << 18);
    pub const HUMIDITY: Self = Self(1 << 20);

    const NAMED: [(Self, &'static str); 16] = [
        (Self::HANFUN, "hanfun"),
        (Self::LIGHT, "light"),
        (Self::ALARM, "alarm"),
        (Self::BUTTON, "button"),
        (Self::THERMOSTAT, "thermostat"),
        (Self::POWER_METER, "power-meter"),
        (Self::TEMPERATURE, "temperature"),
        (Self::OUTLET, "outlet"),
        (Self::DECT_REPEATER, "dect-repeater"),
        (Self::MICROPHONE, "microphone"),
        (Self::HANFUN_UNIT, "hanfun-unit"),
        (Self::SWITCHABLE, "switchable"),
        (Self::DIMMABLE, "dimmable"),
        (Self::COLOR_CONTROL, "color-control"),
        (Self::BLIND, "blind"),
        (Self::HUMIDITY, "humidity"),
    ];

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` when every bit of `required` is set in `self`.
    pub const fn contains(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// Names of the known capability bits that are set.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Look up a single capability by its display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMED
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(flag, _)| *flag)
    }
}

impl BitOr for FunctionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for FunctionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        if names.is_empty() {
            write!(f, "-")
        } else {
            f.write_str(&names.join(","))
        }
    }
}

/// A smart-home actor known to the box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// AIN (actor identification number). May contain spaces.
    pub identifier: String,
    pub id: String,
    pub functions: FunctionMask,
    pub firmware_version: String,
    pub manufacturer: String,
    pub product_name: String,
    pub name: String,
    pub present: bool,
}

impl Device {
    pub fn supports(&self, required: FunctionMask) -> bool {
        self.functions.contains(required)
    }

    /// AIN with all whitespace removed, the form the box accepts in commands.
    pub fn ain(&self) -> String {
        normalize_identifier(&self.identifier)
    }
}

/// Remove all whitespace from an AIN.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.chars().filter(|c| !c.is_whitespace()).collect()
}
