// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! PCI domain (segment) representation.
//!
//! Most hosts only have domain `0000`, which is why `lspci` leaves it out of its output unless
//! more than one domain exists.
//!
//! # Examples
//!
//! ```
//! # use nicinv_hardware::pci::domain::Domain;
//! #
//! let domain = Domain::default();
//! assert_eq!(format!("{}", domain), "0000");
//!
//! let parsed = Domain::try_from("00ff").unwrap();
//! assert_eq!(format!("{:x}", parsed), "00ff");
//! ```

/// A PCI domain number (also known as segment).
///
/// Each domain can have its own set of 256 buses.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(any(test, feature = "bolero"), derive(bolero::TypeGenerator))]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[repr(transparent)]
pub struct Domain(u16);

impl Domain {
    /// Creates a new domain number.
    #[must_use]
    pub fn new(domain: u16) -> Self {
        Self(domain)
    }

    /// Returns the raw domain number value.
    #[must_use]
    pub fn value(self) -> u16 {
        self.0
    }
}

impl From<u16> for Domain {
    fn from(value: u16) -> Self {
        Domain(value)
    }
}

impl std::fmt::LowerHex for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:04x}")
    }
}

/// Error type for domain parsing failures.
#[derive(Debug, thiserror::Error)]
pub enum PciDomainParseError {
    /// Not exactly four characters.
    #[error("Invalid PCI domain syntax (must be four hex digits): {0}")]
    Length(String),
    /// Not hexadecimal.
    #[error("Invalid PCI domain syntax (must be four hex digits): {0}")]
    Syntax(std::num::ParseIntError),
}

impl TryFrom<&str> for Domain {
    type Error = PciDomainParseError;

    /// Parses a domain number from exactly four hexadecimal digits.
    ///
    /// # Examples
    ///
    /// ```
    /// # use nicinv_hardware::pci::domain::Domain;
    /// #
    /// assert!(Domain::try_from("0000").is_ok());
    /// assert!(Domain::try_from("ffff").is_ok());
    /// assert!(Domain::try_from("0").is_err());
    /// assert!(Domain::try_from("10000").is_err());
    /// ```
    fn try_from(value: &str) -> Result<Self, PciDomainParseError> {
        if value.len() != 4 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PciDomainParseError::Length(value.to_string()));
        }
        let domain = u16::from_str_radix(value, 16).map_err(PciDomainParseError::Syntax)?;
        Ok(Domain(domain))
    }
}
