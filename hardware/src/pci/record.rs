// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A single PCI device as reported by `lspci -n`.
//!
//! Each line of `lspci -n` output describes one device:
//!
//! ```text
//! 03:00.0 0200: 8086:1533 (rev 03)
//! ```
//!
//! The fields are the address (without domain unless the host has more than one), the class code
//! followed by a colon, and the `vendor:device` pair.
//! Anything after that is ignored.

use tracing::debug;

use crate::os::CommandRunner;
use crate::pci::{
    address::{InvalidPciAddress, PciAddress},
    bus::Bus,
    class::{ClassCode, ClassCodeParseError},
    device::{DeviceId, DeviceIdParseError},
    function::Function,
    slot::Slot,
    vendor::{VendorId, VendorIdParseError},
};

/// Reasons an `lspci -n` line may be rejected.
#[derive(Debug, thiserror::Error)]
pub enum MalformedLine {
    /// The line has fewer than three fields.
    #[error("missing {0} field")]
    MissingField(&'static str),
    /// The address field is invalid.
    #[error(transparent)]
    Address(#[from] InvalidPciAddress),
    /// The class field is invalid.
    #[error(transparent)]
    Class(#[from] ClassCodeParseError),
    /// The ids field is not `vendor:device`.
    #[error("expected vendor:device, found {0:?}")]
    Ids(String),
    /// The vendor id is invalid.
    #[error(transparent)]
    Vendor(#[from] VendorIdParseError),
    /// The device id is invalid.
    #[error(transparent)]
    Device(#[from] DeviceIdParseError),
}

/// An enumerated PCI device.
///
/// Two records describe the same device iff their addresses are equal, regardless of the other
/// fields.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PciDevice {
    address: PciAddress,
    vendor_id: VendorId,
    device_id: DeviceId,
    class_code: ClassCode,
}

impl PciDevice {
    /// Create a device record.
    #[must_use]
    pub fn new(
        address: PciAddress,
        vendor_id: VendorId,
        device_id: DeviceId,
        class_code: ClassCode,
    ) -> Self {
        Self {
            address,
            vendor_id,
            device_id,
            class_code,
        }
    }

    /// Parse one line of `lspci -n` output.
    ///
    /// # Errors
    ///
    /// [`MalformedLine`] if a field is missing or invalid.
    pub fn from_lspci_line(line: &str) -> Result<PciDevice, MalformedLine> {
        let mut fields = line.split_whitespace();
        let address = fields.next().ok_or(MalformedLine::MissingField("address"))?;
        let class = fields.next().ok_or(MalformedLine::MissingField("class"))?;
        let ids = fields.next().ok_or(MalformedLine::MissingField("ids"))?;

        let address = PciAddress::parse_bdf(address)?;
        let class = class.split(':').next().unwrap_or_default();
        let class_code = ClassCode::try_from(class)?;
        let Some((vendor, device)) = ids.split_once(':') else {
            return Err(MalformedLine::Ids(ids.to_string()));
        };
        Ok(PciDevice {
            address,
            vendor_id: VendorId::try_from(vendor)?,
            device_id: DeviceId::try_from(device)?,
            class_code,
        })
    }

    /// Look up a single device with `lspci -n -s <address>`.
    ///
    /// Returns `None` if the device does not exist, `lspci` fails, or its output can not be
    /// parsed: the caller is expected to carry on without a PCI binding.
    pub fn query(runner: &impl CommandRunner, address: PciAddress) -> Option<PciDevice> {
        let selector = address.to_string();
        let stdout = match runner.stdout_of("lspci", &["-n", "-s", selector.as_str()]) {
            Ok(stdout) => stdout,
            Err(err) => {
                debug!("unable to query {address}: {err}");
                return None;
            }
        };
        let Some(line) = stdout.lines().find(|line| !line.trim().is_empty()) else {
            debug!("no PCI device at {address}");
            return None;
        };
        match Self::from_lspci_line(line) {
            Ok(device) => Some(PciDevice { address, ..device }),
            Err(err) => {
                debug!("unexpected lspci output for {address}: {line:?}: {err}");
                None
            }
        }
    }

    /// The device's address.
    #[must_use]
    pub fn address(&self) -> PciAddress {
        self.address
    }

    /// The vendor's id.
    #[must_use]
    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    /// The device model's id.
    #[must_use]
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// The device's class.
    #[must_use]
    pub fn class_code(&self) -> ClassCode {
        self.class_code
    }

    /// Bus component of the address.
    #[must_use]
    pub fn bus(&self) -> Bus {
        self.address.bus()
    }

    /// Slot component of the address.
    #[must_use]
    pub fn slot(&self) -> Slot {
        self.address.slot()
    }

    /// Function component of the address.
    #[must_use]
    pub fn function(&self) -> Function {
        self.address.function()
    }
}

impl PartialEq for PciDevice {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for PciDevice {}

impl std::hash::Hash for PciDevice {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl std::fmt::Display for PciDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PCI Device [Vendor ID: {}, Device ID: {}, Class Code: {}, Bus: {}, Slot: {}, Function: {}]",
            self.vendor_id,
            self.device_id,
            self.class_code,
            self.bus().value(),
            self.slot().value(),
            self.function().value()
        )
    }
}
