// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Driver details reported by `ethtool -i <interface>`.
//!
//! ```text
//! driver: igb
//! version: 6.8.0-45-generic
//! firmware-version: 3.30, 0x800005cc
//! expansion-rom-version:
//! bus-info: 0000:03:00.0
//! supports-statistics: yes
//! ```

use hardware::os::{CommandError, CommandRunner};
use hardware::pci::address::{InvalidPciAddress, PciAddress};

/// `bus-info` reported by devices which are not on any bus (e.g. veth, bridges).
pub const BUS_INFO_NOT_APPLICABLE: &str = "N/A";
/// `bus-info` reported by some virtual drivers in place of a real address.
pub const BUS_INFO_ZERO_ADDRESS: &str = "0000:00:00.0";

/// Reasons a `bus-info` value does not name a PCI device.
#[derive(Debug, thiserror::Error)]
pub enum BusInfoError {
    #[error("interface is not on a bus")]
    NotApplicable,
    #[error("interface reports the zero PCI address")]
    ZeroAddress,
    #[error("bus-info {0:?} is not a PCI address")]
    NotPci(String, #[source] InvalidPciAddress),
}

/// Resolve an ethtool `bus-info` value to a PCI address.
///
/// The result is the canonical form of the value (lowercase hex), which is how ethtool prints it
/// in practice.
///
/// # Errors
///
/// [`BusInfoError`] if the value does not designate a PCI device (USB devices, for instance,
/// report a USB path here).
pub fn pci_address_of(bus_info: &str) -> Result<PciAddress, BusInfoError> {
    match bus_info.trim() {
        BUS_INFO_NOT_APPLICABLE | "" => Err(BusInfoError::NotApplicable),
        BUS_INFO_ZERO_ADDRESS => Err(BusInfoError::ZeroAddress),
        other => PciAddress::try_from(other)
            .map_err(|err| BusInfoError::NotPci(other.to_string(), err)),
    }
}

/// Parsed `ethtool -i` output.
///
/// Keys which are absent or empty are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct DriverInfo {
    pub driver: Option<String>,
    pub version: Option<String>,
    pub firmware_version: Option<String>,
    pub bus_info: Option<String>,
}

impl DriverInfo {
    /// Run `ethtool -i <interface>`.
    ///
    /// # Errors
    ///
    /// [`CommandError`] if ethtool is missing or the interface does not support the query.
    pub fn query(runner: &impl CommandRunner, interface: &str) -> Result<DriverInfo, CommandError> {
        runner
            .stdout_of("ethtool", &["-i", interface])
            .map(|stdout| DriverInfo::parse(&stdout))
    }

    /// Parse `key: value` lines; unknown keys and lines without a colon are ignored.
    #[must_use]
    pub fn parse(text: &str) -> DriverInfo {
        let mut info = DriverInfo::default();
        for (key, value) in text.lines().filter_map(|line| line.split_once(':')) {
            let value = value.trim();
            let slot = match key.trim() {
                "driver" => &mut info.driver,
                "version" => &mut info.version,
                "firmware-version" => &mut info.firmware_version,
                "bus-info" => &mut info.bus_info,
                _ => continue,
            };
            *slot = (!value.is_empty()).then(|| value.to_string());
        }
        info
    }

    /// The PCI device backing the interface, if any.
    #[must_use]
    pub fn pci_address(&self) -> Option<PciAddress> {
        pci_address_of(self.bus_info.as_deref()?).ok()
    }
}
