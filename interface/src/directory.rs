// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The set of network interfaces on the host, keyed by kernel index.

use hardware::os::CommandRunner;
use hardware::pci::address::PciAddress;
use ordermap::OrderMap;
use tracing::{debug, info, warn};

use crate::ethtool::DriverInfo;
use crate::interface::NetworkInterface;
use crate::listing::ListingParser;

/// Network interfaces in listing order.
#[derive(Debug, Clone, Default)]
pub struct InterfaceDirectory {
    interfaces: OrderMap<u32, NetworkInterface>,
}

impl InterfaceDirectory {
    /// Run `ip addr show` and parse the listing.
    ///
    /// If the listing can not be obtained the directory is empty.
    pub fn scan(runner: &impl CommandRunner) -> InterfaceDirectory {
        match runner.stdout_of("ip", &["addr", "show"]) {
            Ok(listing) => Self::parse_listing(&listing),
            Err(err) => {
                warn!("unable to list network interfaces: {err}");
                InterfaceDirectory::default()
            }
        }
    }

    /// Parse the output of `ip addr show`.
    #[must_use]
    pub fn parse_listing(text: &str) -> InterfaceDirectory {
        let mut parser = ListingParser::new();
        for line in text.lines() {
            parser.consume_line(line);
        }
        let interfaces = parser.finish();
        debug!("found {} network interfaces", interfaces.len());
        InterfaceDirectory { interfaces }
    }

    /// Query `ethtool -i` for every interface but loopback, one at a time.
    ///
    /// Interfaces for which the query fails are left without driver info or PCI address.
    pub fn enrich(&mut self, runner: &impl CommandRunner) {
        for interface in self.interfaces.values_mut() {
            if interface.is_loopback() {
                continue;
            }
            match DriverInfo::query(runner, interface.name()) {
                Ok(info) => {
                    interface.set_driver_info(info);
                    match interface.pci_address() {
                        Some(address) => info!("{interface} is backed by PCI device {address}"),
                        None => debug!("{interface} has no PCI device"),
                    }
                }
                Err(err) => debug!("no driver info for {interface}: {err}"),
            }
        }
    }

    /// The first interface, in listing order, backed by the PCI device at `address`.
    #[must_use]
    pub fn find_by_pci_address(&self, address: &PciAddress) -> Option<&NetworkInterface> {
        self.iter()
            .find(|interface| interface.pci_address().as_ref() == Some(address))
    }

    /// The interface with kernel index `index`.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&NetworkInterface> {
        self.interfaces.get(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkInterface> {
        self.interfaces.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

impl<'a> IntoIterator for &'a InterfaceDirectory {
    type Item = &'a NetworkInterface;
    type IntoIter = ordermap::map::Values<'a, u32, NetworkInterface>;

    fn into_iter(self) -> Self::IntoIter {
        self.interfaces.values()
    }
}
