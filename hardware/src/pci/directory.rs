// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Bulk PCI enumeration (`lspci -n`).
//!
//! Unlike the per-device lookups used while correlating interfaces, the bulk enumeration is all or
//! nothing: a single line which can not be parsed fails the whole enumeration rather than
//! producing a partial inventory.

use ordermap::OrderMap;
use tracing::{debug, warn};

use crate::os::{CommandError, CommandRunner};
use crate::pci::address::PciAddress;
use crate::pci::record::{MalformedLine, PciDevice};

/// Errors which may occur while enumerating PCI devices.
#[derive(Debug, thiserror::Error)]
pub enum EnumerationError {
    /// `lspci` could not be run or failed.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// A line of the enumeration could not be parsed.
    #[error("line {line}: {reason} in {text:?}")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        text: String,
        #[source]
        reason: MalformedLine,
    },
}

/// Every PCI device seen by one enumeration, in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct PciDeviceDirectory {
    devices: OrderMap<PciAddress, PciDevice>,
}

impl PciDeviceDirectory {
    /// Run `lspci -n` and parse its output.
    ///
    /// # Errors
    ///
    /// - [`EnumerationError::Command`] if `lspci` is missing or fails.
    /// - [`EnumerationError::MalformedLine`] as for [`PciDeviceDirectory::parse`].
    pub fn scan(runner: &impl CommandRunner) -> Result<PciDeviceDirectory, EnumerationError> {
        let stdout = runner.stdout_of("lspci", &["-n"])?;
        let directory = Self::parse(&stdout)?;
        debug!("enumerated {} PCI devices", directory.len());
        Ok(directory)
    }

    /// Parse the output of `lspci -n`.
    ///
    /// Blank lines are skipped.
    /// Devices reading back as `ffff:ffff` are kept, with a warning.
    /// If an address is listed twice, the later line wins but keeps the position of the first.
    ///
    /// # Errors
    ///
    /// [`EnumerationError::MalformedLine`] for the first line which is not a valid device line.
    pub fn parse(text: &str) -> Result<PciDeviceDirectory, EnumerationError> {
        let mut devices = OrderMap::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let device = PciDevice::from_lspci_line(line).map_err(|reason| {
                EnumerationError::MalformedLine {
                    line: index + 1,
                    text: line.to_string(),
                    reason,
                }
            })?;
            if device.vendor_id().is_unreadable() {
                warn!("PCI device {} does not answer config reads", device.address());
            }
            if devices.insert(device.address(), device).is_some() {
                warn!("PCI address {} enumerated more than once", device.address());
            }
        }
        Ok(PciDeviceDirectory { devices })
    }

    /// The device at `address`, if it was enumerated.
    #[must_use]
    pub fn get(&self, address: &PciAddress) -> Option<&PciDevice> {
        self.devices.get(address)
    }

    /// All devices in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = &PciDevice> {
        self.devices.values()
    }

    /// Network controllers, in enumeration order.
    pub fn network_devices(&self) -> impl Iterator<Item = &PciDevice> {
        self.iter().filter(|device| device.class_code().is_network())
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// True iff no device was enumerated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl<'a> IntoIterator for &'a PciDeviceDirectory {
    type Item = &'a PciDevice;
    type IntoIter = ordermap::map::Values<'a, PciAddress, PciDevice>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.values()
    }
}

#[cfg(test)]
mod test {
    use super::{EnumerationError, PciDeviceDirectory};
    use crate::os::{CannedRunner, CommandOutput};
    use crate::pci::address::PciAddress;
    use crate::pci::record::MalformedLine;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    const LSPCI: &str = "\
00:00.0 0600: 8086:3e30 (rev 0d)
00:02.0 0300: 8086:3e98 (rev 02)
00:14.0 0c03: 8086:a36d (rev 10)
00:1f.6 0200: 8086:15bc (rev 10)
02:00.0 0108: 144d:a808
03:00.0 0200: 8086:1533 (rev 03)
3b:00.0 0200: 15b3:101d
3b:00.1 0200: 15b3:101d
";

    fn addresses(directory: &PciDeviceDirectory) -> Vec<String> {
        directory
            .iter()
            .map(|device| device.address().to_string())
            .collect()
    }

    #[test]
    fn every_line_becomes_an_entry_in_order() {
        let directory = PciDeviceDirectory::parse(LSPCI).unwrap();
        assert_eq!(directory.len(), LSPCI.lines().count());
        assert_eq!(
            addresses(&directory),
            [
                "0000:00:00.0",
                "0000:00:02.0",
                "0000:00:14.0",
                "0000:00:1f.6",
                "0000:02:00.0",
                "0000:03:00.0",
                "0000:3b:00.0",
                "0000:3b:00.1",
            ]
        );
        let nic = directory
            .get(&PciAddress::try_from("0000:03:00.0").unwrap())
            .unwrap();
        assert_eq!(nic.device_id().to_string(), "1533");
    }

    #[test]
    fn network_devices_are_class_02() {
        let directory = PciDeviceDirectory::parse(LSPCI).unwrap();
        let nics: Vec<_> = directory
            .network_devices()
            .map(|device| device.address().to_string())
            .collect();
        assert_eq!(
            nics,
            ["0000:00:1f.6", "0000:03:00.0", "0000:3b:00.0", "0000:3b:00.1"]
        );
    }

    #[test]
    fn generated_enumerations_keep_order() {
        bolero::check!()
            .with_type::<Vec<PciAddress>>()
            .for_each(|addresses: &Vec<PciAddress>| {
                let mut unique = addresses.clone();
                unique.sort();
                unique.dedup();
                let text: String = unique
                    .iter()
                    .rev()
                    .map(|address| format!("{address} 0200: 8086:1533\n"))
                    .collect();
                let directory = PciDeviceDirectory::parse(&text).unwrap();
                assert_eq!(directory.len(), unique.len());
                let order: Vec<_> = directory.iter().map(|device| device.address()).collect();
                let expected: Vec<_> = unique.iter().rev().copied().collect();
                assert_eq!(order, expected);
            });
    }

    #[test]
    fn blank_lines_are_skipped() {
        let directory = PciDeviceDirectory::parse("\n03:00.0 0200: 8086:1533\n\n").unwrap();
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn domain_prefixed_lines_are_accepted() {
        let directory =
            PciDeviceDirectory::parse("0000:03:00.0 0200: 8086:1533\n0001:00:02.0 0200: 1af4:1041\n")
                .unwrap();
        assert_eq!(addresses(&directory), ["0000:03:00.0", "0001:00:02.0"]);
    }

    #[test]
    fn one_malformed_line_fails_everything() {
        let text = format!("{LSPCI}this is not lspci output\n");
        match PciDeviceDirectory::parse(&text) {
            Err(EnumerationError::MalformedLine {
                line,
                text,
                reason: MalformedLine::Address(_),
            }) => {
                assert_eq!(line, 9);
                assert_eq!(text, "this is not lspci output");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    #[traced_test]
    fn duplicate_address_keeps_first_position() {
        let directory = PciDeviceDirectory::parse(
            "03:00.0 0200: 8086:1533\n04:00.0 0200: 8086:1533\n03:00.0 0200: 8086:15f3\n",
        )
        .unwrap();
        assert_eq!(addresses(&directory), ["0000:03:00.0", "0000:04:00.0"]);
        let first = directory.iter().next().unwrap();
        assert_eq!(first.device_id().to_string(), "15f3");
        assert!(logs_contain("PCI address 0000:03:00.0 enumerated more than once"));
    }

    #[test]
    #[traced_test]
    fn unreadable_device_does_not_fail_enumeration() {
        let directory = PciDeviceDirectory::parse(
            "00:1f.6 0200: 8086:15bc (rev 10)\n01:00.0 ffff: ffff:ffff (rev ff)\n",
        )
        .unwrap();
        assert_eq!(addresses(&directory), ["0000:00:1f.6", "0000:01:00.0"]);
        let gone = directory
            .get(&PciAddress::try_from("0000:01:00.0").unwrap())
            .unwrap();
        assert!(gone.vendor_id().is_unreadable());
        assert_eq!(gone.device_id().to_string(), "ffff");
        assert!(!gone.class_code().is_network());
        assert_eq!(directory.network_devices().count(), 1);
        assert!(logs_contain("PCI device 0000:01:00.0 does not answer config reads"));
    }

    #[test]
    fn scan_runs_lspci() {
        let runner = CannedRunner::new().with_stdout("lspci -n", LSPCI);
        let directory = PciDeviceDirectory::scan(&runner).unwrap();
        assert_eq!(directory.len(), 8);
        assert_eq!(runner.calls(), ["lspci -n"]);
    }

    #[test]
    fn scan_failure_is_fatal() {
        let missing = CannedRunner::new();
        assert!(matches!(
            PciDeviceDirectory::scan(&missing),
            Err(EnumerationError::Command(_))
        ));
        let failing = CannedRunner::new().with_output("lspci -n", CommandOutput::failure(1, ""));
        assert!(matches!(
            PciDeviceDirectory::scan(&failing),
            Err(EnumerationError::Command(_))
        ));
    }
}
