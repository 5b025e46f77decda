// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Observed network interfaces.

use hardware::os::CommandRunner;
use hardware::pci::address::PciAddress;
use hardware::pci::record::PciDevice;

use crate::ethtool::DriverInfo;
use crate::mac::Mac;

/// Operational state as printed in the `state` field of an `ip addr` header.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    PartialEq,
    strum::Display,
    strum::EnumIs,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum OperState {
    Up,
    Down,
    /// Common for loopback and tunnels.
    Unknown,
    Dormant,
    #[strum(serialize = "LOWERLAYERDOWN")]
    LowerLayerDown,
    #[strum(serialize = "NOTPRESENT")]
    NotPresent,
    Testing,
}

/// Link layer type, from the `link/<kind>` line.
#[derive(Clone, Debug, Eq, Hash, PartialEq, strum::EnumIs)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum LinkKind {
    Ether,
    Loopback,
    /// Any other kind (`none`, `ipip`, `can`, ...), as printed.
    Other(String),
}

impl LinkKind {
    /// Interpret the `<kind>` of `link/<kind>`.
    #[must_use]
    pub fn from_kind(kind: &str) -> LinkKind {
        match kind {
            "ether" => LinkKind::Ether,
            "loopback" => LinkKind::Loopback,
            other => LinkKind::Other(other.to_string()),
        }
    }

    /// True iff `ip` reports a hardware address in this kind's `link/` line which we record.
    #[must_use]
    pub fn carries_mac(&self) -> bool {
        matches!(self, LinkKind::Ether | LinkKind::Loopback)
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkKind::Ether => write!(f, "ether"),
            LinkKind::Loopback => write!(f, "loopback"),
            LinkKind::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// An observed network interface.
///
/// Built while parsing the interface listing; only PCI enrichment touches it afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NetworkInterface {
    index: u32,
    name: String,
    link_kind: Option<LinkKind>,
    mac: Option<Mac>,
    mtu: Option<u32>,
    oper_state: Option<OperState>,
    ipv4: Vec<String>,
    ipv6: Vec<String>,
    driver_info: Option<DriverInfo>,
    pci_address: Option<PciAddress>,
}

impl NetworkInterface {
    /// A fresh interface with nothing but its kernel index and name.
    #[must_use]
    pub fn new(index: u32, name: impl Into<String>) -> NetworkInterface {
        NetworkInterface {
            index,
            name: name.into(),
            link_kind: None,
            mac: None,
            mtu: None,
            oper_state: None,
            ipv4: Vec::new(),
            ipv6: Vec::new(),
            driver_info: None,
            pci_address: None,
        }
    }

    pub(crate) fn set_mtu(&mut self, mtu: Option<u32>) {
        self.mtu = mtu;
    }

    pub(crate) fn set_oper_state(&mut self, state: Option<OperState>) {
        self.oper_state = state;
    }

    pub(crate) fn set_link(&mut self, kind: LinkKind, mac: Option<Mac>) {
        self.link_kind = Some(kind);
        self.mac = mac;
    }

    pub(crate) fn push_ipv4(&mut self, address: &str) {
        self.ipv4.push(address.to_string());
    }

    pub(crate) fn push_ipv6(&mut self, address: &str) {
        self.ipv6.push(address.to_string());
    }

    /// Record what `ethtool -i` reported; this also decides the interface's PCI address.
    pub(crate) fn set_driver_info(&mut self, info: DriverInfo) {
        self.pci_address = info.pci_address();
        self.driver_info = Some(info);
    }

    /// Kernel interface index.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Interface name, without any `@parent` suffix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn link_kind(&self) -> Option<&LinkKind> {
        self.link_kind.as_ref()
    }

    #[must_use]
    pub fn mac(&self) -> Option<Mac> {
        self.mac
    }

    #[must_use]
    pub fn mtu(&self) -> Option<u32> {
        self.mtu
    }

    #[must_use]
    pub fn oper_state(&self) -> Option<OperState> {
        self.oper_state
    }

    /// IPv4 addresses in listing order, exactly as `ip` printed them.
    #[must_use]
    pub fn ipv4(&self) -> &[String] {
        &self.ipv4
    }

    /// IPv6 addresses in listing order, exactly as `ip` printed them.
    #[must_use]
    pub fn ipv6(&self) -> &[String] {
        &self.ipv6
    }

    /// `ethtool -i` output, `None` before enrichment or if the query failed.
    #[must_use]
    pub fn driver_info(&self) -> Option<&DriverInfo> {
        self.driver_info.as_ref()
    }

    /// The PCI device backing this interface, if enrichment found one.
    #[must_use]
    pub fn pci_address(&self) -> Option<PciAddress> {
        self.pci_address
    }

    /// Firmware version reported by the driver.
    #[must_use]
    pub fn firmware_version(&self) -> Option<&str> {
        self.driver_info.as_ref()?.firmware_version.as_deref()
    }

    /// True for the loopback interface, which never has a PCI device.
    #[must_use]
    pub fn is_loopback(&self) -> bool {
        self.name == "lo" || self.link_kind.as_ref().is_some_and(LinkKind::is_loopback)
    }

    /// Look up the PCI device backing this interface.
    #[must_use]
    pub fn pci_device(&self, runner: &impl CommandRunner) -> Option<PciDevice> {
        PciDevice::query(runner, self.pci_address?)
    }
}

impl std::fmt::Display for NetworkInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.index, self.name)
    }
}

#[cfg(test)]
mod test {
    use super::{LinkKind, NetworkInterface, OperState};
    use crate::ethtool::DriverInfo;
    use hardware::os::CannedRunner;
    use std::str::FromStr;

    #[test]
    fn oper_state_names() {
        assert_eq!(OperState::from_str("UP").unwrap(), OperState::Up);
        assert_eq!(
            OperState::from_str("LOWERLAYERDOWN").unwrap(),
            OperState::LowerLayerDown
        );
        assert_eq!(OperState::NotPresent.to_string(), "NOTPRESENT");
        assert!(OperState::from_str("up").is_err());
    }

    #[test]
    fn link_kinds() {
        assert_eq!(LinkKind::from_kind("ether"), LinkKind::Ether);
        assert!(LinkKind::from_kind("loopback").carries_mac());
        let none = LinkKind::from_kind("none");
        assert!(!none.carries_mac());
        assert_eq!(none.to_string(), "none");
    }

    #[test]
    fn enrichment_decides_pci_address() {
        let mut eth0 = NetworkInterface::new(2, "eth0");
        assert_eq!(eth0.pci_address(), None);
        assert_eq!(eth0.firmware_version(), None);
        eth0.set_driver_info(DriverInfo::parse(
            "driver: igb\nfirmware-version: 3.30, 0x800005cc\nbus-info: 0000:03:00.0\n",
        ));
        assert_eq!(eth0.pci_address().unwrap().to_string(), "0000:03:00.0");
        assert_eq!(eth0.firmware_version(), Some("3.30, 0x800005cc"));

        let runner = CannedRunner::new()
            .with_stdout("lspci -n -s 0000:03:00.0", "03:00.0 0200: 8086:1533 (rev 03)\n");
        let device = eth0.pci_device(&runner).unwrap();
        assert_eq!(device.device_id().to_string(), "1533");
    }

    #[test]
    fn no_lookup_without_address() {
        let veth = NetworkInterface::new(7, "veth0");
        let runner = CannedRunner::new();
        assert_eq!(veth.pci_device(&runner), None);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn loopback_detection() {
        assert!(NetworkInterface::new(1, "lo").is_loopback());
        let mut lo2 = NetworkInterface::new(9, "lo2");
        assert!(!lo2.is_loopback());
        lo2.set_link(LinkKind::Loopback, None);
        assert!(lo2.is_loopback());
    }
}
