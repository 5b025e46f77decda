// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! PCI slot numbers.
//!
//! The slot (called "device" in the PCI specification) is the logical position of a device on
//! its bus.
//! It is unrelated to the [`DeviceId`](crate::pci::device::DeviceId), which identifies the model.
//!
//! ```
//! use nicinv_hardware::pci::slot::Slot;
//!
//! let slot = Slot::try_from(15).unwrap();
//! assert_eq!(format!("{slot}"), "0f");
//!
//! // Values above 31 are invalid
//! assert!(Slot::try_from(32).is_err());
//! ```

/// A PCI slot number on a bus (0-31).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u8", into = "u8")
)]
#[repr(transparent)]
pub struct Slot(u8);

impl Slot {
    /// Maximum valid slot number (31, or 0x1F).
    pub(crate) const MAX: u8 = 0b11111;

    /// Returns the raw slot number value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::LowerHex for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:02x}")
    }
}

/// Error type for invalid slot numbers.
#[derive(Debug, thiserror::Error)]
pub enum InvalidSlot {
    /// Slot number exceeds the 5-bit maximum.
    #[error("PCI slot maximum is 5 bits: {0} is too large")]
    TooLarge(u8),
}

/// Error type for slot parsing failures.
#[derive(Debug, thiserror::Error)]
pub enum SlotParseError {
    /// Invalid syntax in the slot string.
    #[error("Invalid PCI slot syntax: {0}")]
    Syntax(String),
    /// Invalid slot number value.
    #[error(transparent)]
    Invalid(InvalidSlot),
}

impl TryFrom<u8> for Slot {
    type Error = InvalidSlot;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            Err(InvalidSlot::TooLarge(value))
        } else {
            Ok(Self(value))
        }
    }
}

impl From<Slot> for u8 {
    fn from(value: Slot) -> Self {
        value.0
    }
}

impl TryFrom<&str> for Slot {
    type Error = SlotParseError;

    /// Parses a slot number from exactly 2 hexadecimal digits (00-1F).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.len() != 2 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SlotParseError::Syntax(value.to_string()));
        }
        let slot = u8::from_str_radix(value, 16)
            .map_err(|_| SlotParseError::Syntax(value.to_string()))?;
        Slot::try_from(slot).map_err(SlotParseError::Invalid)
    }
}

/// Test contract support for property-based testing.
#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::pci::slot::Slot;

    impl bolero::TypeGenerator for Slot {
        fn generate<D: bolero::Driver>(driver: &mut D) -> Option<Self> {
            Some(Slot(driver.produce::<u8>()? & Self::MAX))
        }
    }
}
