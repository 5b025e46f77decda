// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Bus numbers of enumerated devices.
//!
//! `lspci` and ethtool print the bus as two hex digits, while the inventory report shows it in
//! decimal through [`Bus::value`].
//!
//! # Examples
//!
//! ```
//! use nicinv_hardware::pci::bus::Bus;
//!
//! let bus = Bus::from(0x03);
//! assert_eq!(format!("{}", bus), "03");
//!
//! let parsed = Bus::try_from("0a").unwrap();
//! assert_eq!(parsed.value(), 10);
//! ```

/// The bus part of a [`PciAddress`](crate::pci::address::PciAddress), unique within a domain.
///
/// `Display` gives the two-digit form used in addresses; `value()` the number itself.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[cfg_attr(any(test, feature = "bolero"), derive(bolero::TypeGenerator))]
#[repr(transparent)]
pub struct Bus(u8);

impl Bus {
    /// Creates a new bus number.
    #[must_use]
    pub fn new(bus: u8) -> Self {
        Self(bus)
    }

    /// Returns the raw bus number value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::LowerHex for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

impl std::fmt::Display for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:02x}")
    }
}

impl From<u8> for Bus {
    /// All u8 values are valid bus numbers.
    fn from(value: u8) -> Self {
        Bus(value)
    }
}

/// The bus field of an address is not two hex digits.
#[derive(Debug, thiserror::Error)]
pub enum BusParseError {
    #[error("bus must be two hex digits: {0:?}")]
    Syntax(String),
}

impl TryFrom<&str> for Bus {
    type Error = BusParseError;

    /// Parse the bus field of an `lspci` or `bus-info` address.
    ///
    /// # Examples
    ///
    /// ```
    /// use nicinv_hardware::pci::bus::Bus;
    ///
    /// assert!(Bus::try_from("00").is_ok());
    /// assert!(Bus::try_from("FF").is_ok());
    /// assert!(Bus::try_from("0").is_err());    // Too short
    /// assert!(Bus::try_from("100").is_err());  // Too long
    /// ```
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.len() != 2 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BusParseError::Syntax(value.to_string()));
        }
        let bus = u8::from_str_radix(value, 16)
            .map_err(|_| BusParseError::Syntax(value.to_string()))?;
        Ok(Bus(bus))
    }
}
