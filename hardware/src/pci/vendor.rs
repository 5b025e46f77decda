// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! PCI vendor IDs.
//!
//! Vendor IDs are assigned by the PCI-SIG to uniquely identify device manufacturers.
//!
//! ```
//! # use nicinv_hardware::pci::vendor::VendorId;
//! #
//! let intel = VendorId::new(0x8086);
//! assert_eq!(format!("{intel}"), "8086");
//!
//! let vendor = VendorId::try_from("10DE").unwrap();
//! assert_eq!(vendor, VendorId::new(0x10de));  // NVIDIA
//!
//! let gone = VendorId::try_from("ffff").unwrap();
//! assert!(gone.is_unreadable());
//! ```

/// A 16-bit PCI vendor identifier.
///
/// The value `0xFFFF` is never assigned: it is what a config space read returns when no device
/// answers, and `lspci` prints it for devices which have dropped off the bus.
/// Such devices are still enumerated; see [`VendorId::is_unreadable`].
///
/// # Display
///
/// `Display` formats the vendor ID as 4 lowercase hexadecimal digits, which is also the form used
/// as a key in `pci.ids`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
#[repr(transparent)]
pub struct VendorId(u16);

impl VendorId {
    /// All ones, as read from an absent or unresponsive device.
    pub const UNREADABLE: VendorId = VendorId(u16::MAX);

    /// Creates a new vendor ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// True iff the id is [`VendorId::UNREADABLE`].
    #[must_use]
    pub fn is_unreadable(self) -> bool {
        self == Self::UNREADABLE
    }

    /// Returns the raw vendor ID value.
    #[must_use]
    pub fn value(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for VendorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

impl From<VendorId> for String {
    fn from(value: VendorId) -> String {
        value.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VendorIdParseError {
    #[error("vendor id must be four hex digits: {0:?}")]
    InvalidSyntax(String),
}

impl TryFrom<&str> for VendorId {
    type Error = VendorIdParseError;

    /// Parses a vendor ID from exactly four hexadecimal digits (either case).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.len() != 4 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(VendorIdParseError::InvalidSyntax(value.to_string()));
        }
        u16::from_str_radix(value, 16)
            .map(VendorId)
            .map_err(|_| VendorIdParseError::InvalidSyntax(value.to_string()))
    }
}

impl TryFrom<String> for VendorId {
    type Error = VendorIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}
