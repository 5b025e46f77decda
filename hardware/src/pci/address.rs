// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! PCI device addressing.
//!
//! This module provides the [`PciAddress`] type in the extended BDF (Bus Device Function) format,
//! also known as EBDF format: `domain:bus:slot.function` (e.g., `0000:03:00.0`).
//!
//! # Address Components
//!
//! A PCI address consists of:
//! - **Domain**: 16-bit value (0x0000-0xFFFF)
//! - **Bus**: 8-bit value (0x00-0xFF)
//! - **Slot**: 5-bit value (0x00-0x1F), represented as 8-bit
//! - **Function**: 3-bit value (0-7), represented as 8-bit
//!
//! `lspci` omits the domain when the host only has domain `0000`; [`PciAddress::parse_bdf`]
//! accepts both forms.
//!
//! # Examples
//!
//! ```
//! use nicinv_hardware::pci::address::PciAddress;
//!
//! let addr = PciAddress::try_from("0000:03:00.0").unwrap();
//! assert_eq!(addr.bus().value(), 3);
//! assert_eq!(addr.to_string(), "0000:03:00.0");
//!
//! let short = PciAddress::parse_bdf("03:00.0").unwrap();
//! assert_eq!(addr, short);
//! ```

use crate::pci::{
    bus::{Bus, BusParseError},
    domain::{Domain, PciDomainParseError},
    function::{Function, FunctionParseError},
    slot::{Slot, SlotParseError},
};

/// A PCI device address.
///
/// Formats as the canonical `DDDD:BB:SS.F` string, which is also the name of the device's
/// directory under `/sys/bus/pci/devices`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct PciAddress {
    domain: Domain,
    bus: Bus,
    slot: Slot,
    function: Function,
}

impl PciAddress {
    /// Creates a new PCI address from its components.
    #[must_use]
    pub fn new(domain: Domain, bus: Bus, slot: Slot, function: Function) -> Self {
        Self {
            domain,
            bus,
            slot,
            function,
        }
    }

    /// PCI domain (segment) number.
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// PCI bus number.
    #[must_use]
    pub fn bus(&self) -> Bus {
        self.bus
    }

    /// Slot (device number) on the bus.
    #[must_use]
    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Function number within the slot.
    #[must_use]
    pub fn function(&self) -> Function {
        self.function
    }

    /// Parses an address with or without its domain (`BB:SS.F` or `DDDD:BB:SS.F`).
    ///
    /// A missing domain means domain `0000`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string has neither shape or any component is out of range.
    pub fn parse_bdf(value: &str) -> Result<Self, InvalidPciAddress> {
        match value.split(':').count() {
            2 => {
                let (bus, slot, function) = split_bdf(value, value)?;
                Ok(Self {
                    domain: Domain::default(),
                    bus,
                    slot,
                    function,
                })
            }
            _ => Self::try_from(value),
        }
    }
}

impl std::fmt::Display for PciAddress {
    /// Formats the PCI address in the canonical EBDF format.
    ///
    /// The format is `DDDD:BB:SS.F` where:
    /// - DDDD is the 4-digit hex domain
    /// - BB is the 2-digit hex bus
    /// - SS is the 2-digit hex slot
    /// - F is the 1-digit function
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}.{}",
            self.domain, self.bus, self.slot, self.function
        )
    }
}

/// Errors that can occur when parsing a PCI address.
#[derive(Debug, thiserror::Error)]
pub enum InvalidPciAddress {
    /// Invalid address syntax.
    #[error("Invalid syntax: {0}")]
    Syntax(String),
    /// Invalid domain component.
    #[error(transparent)]
    Domain(PciDomainParseError),
    /// Invalid bus component.
    #[error(transparent)]
    Bus(BusParseError),
    /// Invalid slot component.
    #[error(transparent)]
    Slot(SlotParseError),
    /// Invalid function component.
    #[error(transparent)]
    Function(FunctionParseError),
}

/// Splits `BB:SS.F` into its components; `whole` is only used for error messages.
fn split_bdf(bdf: &str, whole: &str) -> Result<(Bus, Slot, Function), InvalidPciAddress> {
    let Some((bus_str, rest)) = bdf.split_once(':') else {
        return Err(InvalidPciAddress::Syntax(format!(
            "(should be domain:bus:slot.function): {whole} has no bus"
        )));
    };
    let Some((slot_str, function_str)) = rest.split_once('.') else {
        return Err(InvalidPciAddress::Syntax(format!(
            "(should be domain:bus:slot.function): {whole} has no function"
        )));
    };
    let bus = Bus::try_from(bus_str).map_err(InvalidPciAddress::Bus)?;
    let slot = Slot::try_from(slot_str).map_err(InvalidPciAddress::Slot)?;
    let function = Function::try_from(function_str).map_err(InvalidPciAddress::Function)?;
    Ok((bus, slot, function))
}

impl TryFrom<&str> for PciAddress {
    type Error = InvalidPciAddress;

    /// Parses a PCI address from its canonical form.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The string contains non-ASCII characters
    /// - The string is not exactly 12 characters long
    /// - The format doesn't match `DDDD:BB:SS.F`
    /// - Any component value is out of range
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if !value.is_ascii() {
            return Err(InvalidPciAddress::Syntax(format!(
                "Invalid ASCII characters in PCI address: {value}",
            )));
        }
        if value.len() != 12 {
            return Err(InvalidPciAddress::Syntax(format!(
                "Invalid PCI address: {value}  (length should be 12, was {})",
                value.len()
            )));
        }
        let Some((domain_str, bdf)) = value.split_once(':') else {
            return Err(InvalidPciAddress::Syntax(format!(
                "Invalid PCI address format (should be domain:bus:slot.function): {value} has incorrect shape",
            )));
        };
        let domain = Domain::try_from(domain_str).map_err(InvalidPciAddress::Domain)?;
        let (bus, slot, function) = split_bdf(bdf, value)?;
        Ok(Self {
            domain,
            bus,
            slot,
            function,
        })
    }
}

impl TryFrom<String> for PciAddress {
    type Error = InvalidPciAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl std::str::FromStr for PciAddress {
    type Err = InvalidPciAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl From<PciAddress> for String {
    fn from(value: PciAddress) -> String {
        format!("{value}")
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::pci::address::PciAddress;

    impl bolero::TypeGenerator for PciAddress {
        fn generate<D: bolero::Driver>(driver: &mut D) -> Option<Self> {
            Some(PciAddress {
                domain: driver.produce()?,
                bus: driver.produce()?,
                slot: driver.produce()?,
                function: driver.produce()?,
            })
        }
    }
}
