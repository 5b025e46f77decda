// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Kernel driver and module details of PCI devices.

use std::path::Path;

use sysfs::SysfsErr;
use tracing::{debug, info};

use crate::os::{CommandError, CommandRunner};
use crate::pci::record::PciDevice;

/// Placeholder used when `modinfo` does not report a field.
pub const UNKNOWN_MODULE_FIELD: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum DriverErr {
    #[error(transparent)]
    Sysfs(#[from] SysfsErr),
    #[error(transparent)]
    ModInfo(#[from] ModInfoError),
}

/// Errors which may occur while querying a kernel module.
#[derive(Debug, thiserror::Error)]
pub enum ModInfoError {
    #[error("modinfo query for {module} failed: {source}")]
    Command {
        module: String,
        #[source]
        source: CommandError,
    },
}

/// Name of the kernel driver bound to a device (e.g. `igb`, `mlx5_core`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct KernelDriver(String);

impl KernelDriver {
    /// Wrap a driver name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The driver's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Ask `modinfo` for the module backing this driver.
    ///
    /// # Errors
    ///
    /// [`ModInfoError`] if `modinfo` can not be run or fails (e.g. built-in or unknown module).
    pub fn module_info(&self, runner: &impl CommandRunner) -> Result<ModuleInfo, ModInfoError> {
        let stdout = runner
            .stdout_of("modinfo", &[self.name()])
            .map_err(|source| ModInfoError::Command {
                module: self.0.clone(),
                source,
            })?;
        Ok(ModuleInfo::parse(&stdout))
    }
}

impl std::fmt::Display for KernelDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File and version of a kernel module.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ModuleInfo {
    pub filename: String,
    pub version: String,
}

impl ModuleInfo {
    /// Extract the module file and version from `modinfo` output.
    ///
    /// Only the first two lines are considered and they must be labelled `filename` and `version`
    /// respectively; anything else yields [`UNKNOWN_MODULE_FIELD`] for that field.
    #[must_use]
    pub fn parse(text: &str) -> ModuleInfo {
        let mut lines = text.lines();
        let filename = labelled(lines.next(), "filename");
        let version = labelled(lines.next(), "version");
        ModuleInfo { filename, version }
    }
}

fn labelled(line: Option<&str>, label: &str) -> String {
    line.and_then(|line| line.split_once(':'))
        .filter(|(key, _)| key.trim() == label)
        .map_or_else(
            || UNKNOWN_MODULE_FIELD.to_string(),
            |(_, value)| value.trim().to_string(),
        )
}

impl std::fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.filename, self.version)
    }
}

impl PciDevice {
    /// The kernel driver currently bound to this device.
    ///
    /// Returns `Ok(None)` if the device is not bound to any driver (or unknown to sysfs).
    ///
    /// # Errors
    ///
    /// [`DriverErr::Sysfs`] if the driver link exists but can not be read.
    pub fn driver(&self, sysfs_root: impl AsRef<Path>) -> Result<Option<KernelDriver>, DriverErr> {
        let link = sysfs_root
            .as_ref()
            .join("bus/pci/devices")
            .join(self.address().to_string())
            .join("driver");
        let driver = sysfs::link_name(&link)?.map(KernelDriver);
        match &driver {
            Some(driver) => debug!("{} is bound to {driver}", self.address()),
            None => info!("no driver bound to {}", self.address()),
        }
        Ok(driver)
    }

    /// Module details of the driver bound to this device, `Ok(None)` if there is none.
    ///
    /// # Errors
    ///
    /// - [`DriverErr::Sysfs`] as for [`PciDevice::driver`].
    /// - [`DriverErr::ModInfo`] if the module can not be queried.
    pub fn module_info(
        &self,
        sysfs_root: impl AsRef<Path>,
        runner: &impl CommandRunner,
    ) -> Result<Option<ModuleInfo>, DriverErr> {
        match self.driver(sysfs_root)? {
            Some(driver) => Ok(Some(driver.module_info(runner)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{DriverErr, KernelDriver, ModInfoError, ModuleInfo};
    use crate::os::{CannedRunner, CommandOutput};
    use crate::pci::record::PciDevice;
    use pretty_assertions::assert_eq;

    const MODINFO_IGB: &str = "\
filename:       /lib/modules/6.8.0-45-generic/kernel/drivers/net/ethernet/intel/igb/igb.ko.zst
version:        5.15.0-k
license:        GPL v2
description:    Intel(R) Gigabit Ethernet Network Driver
";

    fn fake_sysfs(address: &str, driver: Option<&str>) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let device = root.path().join("bus/pci/devices").join(address);
        std::fs::create_dir_all(&device).unwrap();
        if let Some(driver) = driver {
            let target = root.path().join("bus/pci/drivers").join(driver);
            std::fs::create_dir_all(&target).unwrap();
            std::os::unix::fs::symlink(&target, device.join("driver")).unwrap();
        }
        root
    }

    #[test]
    fn modinfo_first_two_lines() {
        let info = ModuleInfo::parse(MODINFO_IGB);
        assert_eq!(
            info.filename,
            "/lib/modules/6.8.0-45-generic/kernel/drivers/net/ethernet/intel/igb/igb.ko.zst"
        );
        assert_eq!(info.version, "5.15.0-k");
    }

    #[test]
    fn modinfo_unexpected_labels_are_unknown() {
        // in-tree modules frequently have no version line
        let info = ModuleInfo::parse("filename: /lib/modules/x/e1000e.ko\nlicense: GPL v2\n");
        assert_eq!(info.filename, "/lib/modules/x/e1000e.ko");
        assert_eq!(info.version, "Unknown");

        let info = ModuleInfo::parse("name:           igb\n");
        assert_eq!(info.filename, "Unknown");
        assert_eq!(info.version, "Unknown");

        assert_eq!(
            ModuleInfo::parse(""),
            ModuleInfo {
                filename: "Unknown".to_string(),
                version: "Unknown".to_string(),
            }
        );
    }

    #[test]
    fn driver_from_sysfs_link() {
        let root = fake_sysfs("0000:03:00.0", Some("igb"));
        let device = PciDevice::from_lspci_line("03:00.0 0200: 8086:1533").unwrap();
        assert_eq!(
            device.driver(root.path()).unwrap(),
            Some(KernelDriver::new("igb"))
        );
    }

    #[test]
    fn unbound_device_has_no_driver() {
        let root = fake_sysfs("0000:03:00.0", None);
        let device = PciDevice::from_lspci_line("03:00.0 0200: 8086:1533").unwrap();
        assert_eq!(device.driver(root.path()).unwrap(), None);
        let runner = CannedRunner::new();
        assert_eq!(device.module_info(root.path(), &runner).unwrap(), None);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn module_info_of_bound_device() {
        let root = fake_sysfs("0000:03:00.0", Some("igb"));
        let device = PciDevice::from_lspci_line("03:00.0 0200: 8086:1533").unwrap();
        let runner = CannedRunner::new().with_stdout("modinfo igb", MODINFO_IGB);
        let info = device.module_info(root.path(), &runner).unwrap().unwrap();
        assert_eq!(info.version, "5.15.0-k");
        assert_eq!(runner.calls(), ["modinfo igb"]);
    }

    #[test]
    fn modinfo_failure_is_reported() {
        let runner = CannedRunner::new().with_output(
            "modinfo veth",
            CommandOutput::failure(1, "modinfo: ERROR: Module veth not found."),
        );
        match KernelDriver::new("veth").module_info(&runner) {
            Err(ModInfoError::Command { module, .. }) => assert_eq!(module, "veth"),
            other => panic!("unexpected {other:?}"),
        }

        let root = fake_sysfs("0000:03:00.0", Some("veth"));
        let device = PciDevice::from_lspci_line("03:00.0 0200: 8086:1533").unwrap();
        assert!(matches!(
            device.module_info(root.path(), &runner),
            Err(DriverErr::ModInfo(_))
        ));
    }
}
