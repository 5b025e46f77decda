// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Correlation of interfaces, PCI devices, names and drivers into a printable report.

use std::fmt::{Display, Formatter};
use std::path::Path;

use hardware::nic::ModuleInfo;
use hardware::os::CommandRunner;
use hardware::pci::directory::PciDeviceDirectory;
use hardware::pci::ids::PciIds;
use hardware::pci::record::PciDevice;
use interface::{InterfaceDirectory, NetworkInterface};
use serde::Serialize;
use tracing::{debug, warn};

const SEPARATOR: &str =
    "-------------------------------------------------------------------------------------------------";

/// A hex id and the name the database gives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct NamedId {
    pub id: String,
    pub name: String,
}

impl Display for NamedId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) {}", self.id, self.name)
    }
}

/// Everything known about one PCI device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct DeviceReport {
    pub address: String,
    pub vendor: NamedId,
    pub device: NamedId,
    pub class_code: String,
    pub bus: u8,
    pub slot: u8,
    pub function: u8,
    pub driver: Option<String>,
    pub module: Option<ModuleInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct InterfaceReport {
    pub name: String,
    pub index: u32,
    pub mac: Option<String>,
    pub ip: Vec<String>,
    pub ipv6: Vec<String>,
    pub pci_device: Option<DeviceReport>,
    pub firmware: Option<String>,
}

/// A network-class PCI device and the interface it backs, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct NetworkDeviceReport {
    #[serde(flatten)]
    pub device: DeviceReport,
    pub interface: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub(crate) struct Report {
    pub interfaces: Vec<InterfaceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_devices: Option<Vec<NetworkDeviceReport>>,
}

/// Sources the report is assembled from.
pub(crate) struct Inventory<'a, R: CommandRunner> {
    pub ids: &'a PciIds,
    /// `None` if sysfs could not be located: drivers are then unknown.
    pub sysfs_root: Option<&'a Path>,
    pub runner: &'a R,
}

impl<R: CommandRunner> Inventory<'_, R> {
    pub fn device(&self, device: &PciDevice) -> DeviceReport {
        let vendor_id = device.vendor_id().to_string();
        let device_id = device.device_id().to_string();
        let (driver, module) = match self.sysfs_root {
            Some(root) => match device.driver(root) {
                Ok(Some(driver)) => {
                    let module = match driver.module_info(self.runner) {
                        Ok(module) => Some(module),
                        Err(err) => {
                            warn!("{err}");
                            None
                        }
                    };
                    (Some(driver.to_string()), module)
                }
                Ok(None) => (None, None),
                Err(err) => {
                    warn!("unable to find the driver of {}: {err}", device.address());
                    (None, None)
                }
            },
            None => (None, None),
        };
        DeviceReport {
            address: device.address().to_string(),
            vendor: NamedId {
                name: self.ids.vendor_name(&vendor_id).to_string(),
                id: vendor_id.clone(),
            },
            device: NamedId {
                name: self.ids.device_name(&vendor_id, &device_id).to_string(),
                id: device_id,
            },
            class_code: device.class_code().to_string(),
            bus: device.bus().value(),
            slot: device.slot().value(),
            function: device.function().value(),
            driver,
            module,
        }
    }

    pub fn interface(&self, interface: &NetworkInterface) -> InterfaceReport {
        let pci_device = interface.pci_device(self.runner);
        if interface.pci_address().is_some() && pci_device.is_none() {
            debug!("{interface}: PCI device not found");
        }
        InterfaceReport {
            name: interface.name().to_string(),
            index: interface.index(),
            mac: interface.mac().map(|mac| mac.to_string()),
            ip: interface.ipv4().to_vec(),
            ipv6: interface.ipv6().to_vec(),
            pci_device: pci_device.map(|device| self.device(&device)),
            firmware: interface.firmware_version().map(str::to_string),
        }
    }

    pub fn network_devices(
        &self,
        devices: &PciDeviceDirectory,
        interfaces: &InterfaceDirectory,
    ) -> Vec<NetworkDeviceReport> {
        devices
            .network_devices()
            .map(|device| NetworkDeviceReport {
                device: self.device(device),
                interface: interfaces
                    .find_by_pci_address(&device.address())
                    .map(|interface| interface.name().to_string()),
            })
            .collect()
    }

    /// Report every interface, plus the network devices if an enumeration is supplied.
    pub fn report(
        &self,
        interfaces: &InterfaceDirectory,
        devices: Option<&PciDeviceDirectory>,
    ) -> Report {
        Report {
            interfaces: interfaces
                .iter()
                .map(|interface| self.interface(interface))
                .collect(),
            network_devices: devices.map(|devices| self.network_devices(devices, interfaces)),
        }
    }
}

struct OrNone<'a, T: ?Sized>(Option<&'a T>);

impl<T: Display + ?Sized> Display for OrNone<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(value) => value.fmt(f),
            None => write!(f, "None"),
        }
    }
}

struct List<'a>(&'a [String]);

impl Display for List<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl Display for DeviceReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Vendor ID: {}", self.vendor)?;
        writeln!(f, "Device ID: {}", self.device)?;
        writeln!(f, "Class Code: {}", self.class_code)?;
        writeln!(
            f,
            "Bus: {}, Slot: {}, Function: {}",
            self.bus, self.slot, self.function
        )?;
        writeln!(f, "Driver Name: {}", OrNone(self.driver.as_ref()))?;
        writeln!(f, "Driver Module: {}", OrNone(self.module.as_ref()))
    }
}

impl Display for InterfaceReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{SEPARATOR}")?;
        writeln!(f, "Interface Name: {}", self.name)?;
        writeln!(
            f,
            "Index: {}, MAC: {}, IP: {}, IPv6: {}",
            self.index,
            OrNone(self.mac.as_ref()),
            List(&self.ip),
            List(&self.ipv6)
        )?;
        if let Some(device) = &self.pci_device {
            writeln!(f, "Associated PCI device: {}", device.address)?;
            write!(f, "{device}")?;
            writeln!(f, "Firmware: {}", OrNone(self.firmware.as_ref()))?;
        }
        Ok(())
    }
}

impl Display for NetworkDeviceReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{SEPARATOR}")?;
        writeln!(f, "PCI Address: {}", self.device.address)?;
        write!(f, "{}", self.device)?;
        writeln!(f, "Interface: {}", OrNone(self.interface.as_ref()))
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for interface in &self.interfaces {
            write!(f, "{interface}")?;
        }
        for device in self.network_devices.iter().flatten() {
            write!(f, "{device}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{Inventory, SEPARATOR};
    use hardware::os::CannedRunner;
    use hardware::pci::directory::PciDeviceDirectory;
    use hardware::pci::ids::PciIds;
    use interface::InterfaceDirectory;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    const PCI_IDS: &str = "\
# test database
8086  Intel Corporation
\t1533  I210 Gigabit Network Connection
\t15bc  Ethernet Connection (7) I219-V
15b3  Mellanox Technologies
\t101d  MT2892 Family [ConnectX-6 Dx]
";

    const LISTING: &str = "\
1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536 qdisc noqueue state UNKNOWN
    link/loopback 00:00:00:00:00:00 brd 00:00:00:00:00:00
    inet 127.0.0.1/8 scope host lo
2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc mq state UP
    link/ether 52:54:00:12:34:56 brd ff:ff:ff:ff:ff:ff
    inet 10.0.0.5/24 brd 10.0.0.255 scope global eth0
    inet6 fe80::1/64 scope link
";

    const MODINFO_IGB: &str = "\
filename:       /lib/modules/6.8.0/kernel/drivers/net/ethernet/intel/igb/igb.ko
version:        5.15.0-k
license:        GPL v2
";

    fn runner() -> CannedRunner {
        CannedRunner::new()
            .with_stdout(
                "ethtool -i eth0",
                "driver: igb\nfirmware-version: 3.30, 0x800005cc\nbus-info: 0000:03:00.0\n",
            )
            .with_stdout("lspci -n -s 0000:03:00.0", "03:00.0 0200: 8086:1533 (rev 03)\n")
            .with_stdout("modinfo igb", MODINFO_IGB)
    }

    fn sysfs_with_igb() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let device = root.path().join("bus/pci/devices/0000:03:00.0");
        std::fs::create_dir_all(&device).unwrap();
        let driver = root.path().join("bus/pci/drivers/igb");
        std::fs::create_dir_all(&driver).unwrap();
        std::os::unix::fs::symlink(&driver, device.join("driver")).unwrap();
        root
    }

    #[test]
    fn text_report() {
        let ids = PciIds::from_str(PCI_IDS).unwrap();
        let sysfs = sysfs_with_igb();
        let runner = runner();
        let mut interfaces = InterfaceDirectory::parse_listing(LISTING);
        interfaces.enrich(&runner);
        let inventory = Inventory {
            ids: &ids,
            sysfs_root: Some(sysfs.path()),
            runner: &runner,
        };
        let report = inventory.report(&interfaces, None);
        let expected = format!(
            "\
{SEPARATOR}
Interface Name: lo
Index: 1, MAC: 00:00:00:00:00:00, IP: [127.0.0.1/8], IPv6: []
{SEPARATOR}
Interface Name: eth0
Index: 2, MAC: 52:54:00:12:34:56, IP: [10.0.0.5/24], IPv6: [fe80::1/64]
Associated PCI device: 0000:03:00.0
Vendor ID: (8086) Intel Corporation
Device ID: (1533) I210 Gigabit Network Connection
Class Code: 0200
Bus: 3, Slot: 0, Function: 0
Driver Name: igb
Driver Module: /lib/modules/6.8.0/kernel/drivers/net/ethernet/intel/igb/igb.ko, 5.15.0-k
Firmware: 3.30, 0x800005cc
"
        );
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn unknown_names_and_missing_driver() {
        let ids = PciIds::from_str("").unwrap();
        let runner = runner();
        let mut interfaces = InterfaceDirectory::parse_listing(LISTING);
        interfaces.enrich(&runner);
        let inventory = Inventory {
            ids: &ids,
            sysfs_root: None,
            runner: &runner,
        };
        let text = inventory.report(&interfaces, None).to_string();
        assert!(text.contains("Vendor ID: (8086) Unknown vendor\n"));
        assert!(text.contains("Device ID: (1533) Unknown device\n"));
        assert!(text.contains("Driver Name: None\nDriver Module: None\n"));
    }

    #[test]
    fn network_devices_with_backing_interface() {
        let ids = PciIds::from_str(PCI_IDS).unwrap();
        let sysfs = sysfs_with_igb();
        let runner = runner();
        let mut interfaces = InterfaceDirectory::parse_listing(LISTING);
        interfaces.enrich(&runner);
        let devices = PciDeviceDirectory::parse(
            "00:1f.6 0200: 8086:15bc (rev 10)\n02:00.0 0108: 144d:a808\n03:00.0 0200: 8086:1533 (rev 03)\n",
        )
        .unwrap();
        let inventory = Inventory {
            ids: &ids,
            sysfs_root: Some(sysfs.path()),
            runner: &runner,
        };
        let listed = inventory.network_devices(&devices, &interfaces);
        let summary: Vec<_> = listed
            .iter()
            .map(|entry| {
                (
                    entry.device.address.as_str(),
                    entry.device.driver.as_deref(),
                    entry.interface.as_deref(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            [
                ("0000:00:1f.6", None, None),
                ("0000:03:00.0", Some("igb"), Some("eth0")),
            ]
        );
        let text = listed[0].to_string();
        assert!(text.contains("PCI Address: 0000:00:1f.6\n"));
        assert!(text.contains("Device ID: (15bc) Ethernet Connection (7) I219-V\n"));
        assert!(text.ends_with("Interface: None\n"));
    }

    #[test]
    fn yaml_report() {
        let ids = PciIds::from_str(PCI_IDS).unwrap();
        let sysfs = sysfs_with_igb();
        let runner = runner();
        let mut interfaces = InterfaceDirectory::parse_listing(LISTING);
        interfaces.enrich(&runner);
        let inventory = Inventory {
            ids: &ids,
            sysfs_root: Some(sysfs.path()),
            runner: &runner,
        };
        let yaml = serde_yaml_ng::to_string(&inventory.report(&interfaces, None)).unwrap();
        assert!(yaml.starts_with("interfaces:\n"));
        assert!(yaml.contains("name: eth0\n"));
        assert!(yaml.contains("- 10.0.0.5/24\n"));
        assert!(yaml.contains("driver: igb\n"));
        assert!(yaml.contains("version: 5.15.0-k\n"));
        assert!(!yaml.contains("network_devices"));
    }
}
