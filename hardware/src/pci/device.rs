// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! PCI device IDs.
//!
//! The device ID is assigned by the vendor and identifies the model of a device.
//! Combined with the [`VendorId`](crate::pci::vendor::VendorId) it uniquely identifies the
//! device type (and its name in `pci.ids`).
//!
//! ```
//! # use nicinv_hardware::pci::device::DeviceId;
//! #
//! let device_id = DeviceId::try_from("1DB6").unwrap();
//! assert_eq!(device_id, DeviceId::new(0x1db6));
//! assert_eq!(format!("{device_id}"), "1db6");
//! ```

/// A 16-bit PCI device ID.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
#[repr(transparent)]
pub struct DeviceId(u16);

impl DeviceId {
    /// Creates a new device ID.
    #[must_use]
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw device ID value.
    #[must_use]
    pub fn value(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.to_string()
    }
}

/// Error type for device ID parsing failures.
#[derive(Debug, thiserror::Error)]
#[error("device id must be four hex digits: {0:?}")]
pub struct DeviceIdParseError(String);

impl TryFrom<&str> for DeviceId {
    type Error = DeviceIdParseError;

    /// Parses a device ID from exactly four hexadecimal digits (either case).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.len() != 4 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DeviceIdParseError(value.to_string()));
        }
        u16::from_str_radix(value, 16)
            .map(DeviceId)
            .map_err(|_| DeviceIdParseError(value.to_string()))
    }
}

impl TryFrom<String> for DeviceId {
    type Error = DeviceIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}
