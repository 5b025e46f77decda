// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The `pci.ids` vendor / device name database.
//!
//! The file is a flat text listing maintained at <https://pci-ids.ucw.cz>:
//!
//! ```text
//! # comment
//! 8086  Intel Corporation
//! 	1533  I210 Gigabit Network Connection
//! 		8086 0001  Ethernet Server Adapter I210-T1
//! C 02  Network controller
//! ```
//!
//! Vendors start at column 0, their devices are indented by one tab, and subsystems by two.
//! Subsystems and the class section (lines starting with `C`) are not indexed.
//!
//! Codes are stored exactly as read.
//! Lookups lowercase the code they are given, which matches the lowercase codes used by
//! `pci.ids` itself.

use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ordermap::OrderMap;
use tracing::{debug, info, warn};

/// Where distributions install the database.
pub const DEFAULT_PCI_IDS_PATH: &str = "/usr/share/hwdata/pci.ids";
/// Returned by [`PciIds::vendor_name`] for vendors missing from the database.
pub const UNKNOWN_VENDOR: &str = "Unknown vendor";
/// Returned by [`PciIds::device_name`] for devices missing from the database.
pub const UNKNOWN_DEVICE: &str = "Unknown device";

/// Errors which may occur while loading the database.
#[derive(Debug, thiserror::Error)]
pub enum PciIdsError {
    /// The database file does not exist.
    #[error("PCI IDs file not found at {0:?}")]
    NotFound(PathBuf),
    /// Any other failure to read the database.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A vendor and the devices it has registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorEntry {
    name: String,
    devices: OrderMap<String, String>,
}

impl VendorEntry {
    /// Create a vendor with no devices.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            devices: OrderMap::new(),
        }
    }

    /// The vendor's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of one of this vendor's devices.
    ///
    /// The code is lowercased before the lookup.
    #[must_use]
    pub fn device(&self, device: &str) -> Option<&str> {
        self.devices
            .get(device.to_ascii_lowercase().as_str())
            .map(String::as_str)
    }
}

/// The vendor / device name database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PciIds {
    vendors: OrderMap<String, VendorEntry>,
}

/// Split an entry on the first run of two spaces into `(code, name)`.
fn split_entry(entry: &str) -> Option<(&str, &str)> {
    let (code, name) = entry.split_once("  ")?;
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    Some((code, name.trim()))
}

impl PciIds {
    /// Load the database from a file.
    ///
    /// # Errors
    ///
    /// - [`PciIdsError::NotFound`] if there is no file at `path`.
    /// - [`PciIdsError::Io`] for any other read failure.
    pub fn load(path: impl AsRef<Path>) -> Result<PciIds, PciIdsError> {
        let path = path.as_ref();
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(PciIdsError::NotFound(path.to_path_buf()));
            }
            Err(err) => return Err(PciIdsError::Io(err)),
        };
        let ids = Self::parse(BufReader::new(file))?;
        info!(
            "loaded {} vendors from {}",
            ids.vendors.len(),
            path.display()
        );
        Ok(ids)
    }

    /// Parse the database from any line oriented source.
    ///
    /// Malformed entries are skipped.
    ///
    /// # Errors
    ///
    /// Only read errors from `reader` are reported.
    pub fn parse(reader: impl BufRead) -> Result<PciIds, std::io::Error> {
        let mut ids = PciIds::default();
        let mut current: Option<String> = None;
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            // the class section's subclass lines must not land under the last vendor
            if line.starts_with('C') {
                current = None;
                continue;
            }
            if line.starts_with("\t\t") {
                continue;
            }
            if let Some(device_line) = line.strip_prefix('\t') {
                let Some(vendor) = current.as_ref().and_then(|code| ids.vendors.get_mut(code))
                else {
                    debug!("line {}: device entry outside of any vendor", number + 1);
                    continue;
                };
                match split_entry(device_line) {
                    Some((code, name)) => {
                        vendor.devices.insert(code.to_string(), name.to_string());
                    }
                    None => debug!("line {}: malformed device entry {line:?}", number + 1),
                }
                continue;
            }
            let Some((code, name)) = split_entry(line) else {
                debug!("line {}: malformed vendor entry {line:?}", number + 1);
                current = None;
                continue;
            };
            if ids
                .vendors
                .insert(code.to_string(), VendorEntry::new(name))
                .is_some()
            {
                warn!("line {}: vendor {code} is defined more than once", number + 1);
            }
            current = Some(code.to_string());
        }
        Ok(ids)
    }

    /// Number of vendors in the database.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    /// True iff the database holds no vendors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }

    /// Look up a vendor by code (case insensitive).
    #[must_use]
    pub fn vendor(&self, vendor: &str) -> Option<&VendorEntry> {
        self.vendors.get(vendor.to_ascii_lowercase().as_str())
    }

    /// Name of the vendor, or [`UNKNOWN_VENDOR`].
    #[must_use]
    pub fn vendor_name(&self, vendor: &str) -> &str {
        self.vendor(vendor).map_or(UNKNOWN_VENDOR, VendorEntry::name)
    }

    /// Name of the vendor's device, or [`UNKNOWN_DEVICE`] if either code is unknown.
    #[must_use]
    pub fn device_name(&self, vendor: &str, device: &str) -> &str {
        self.vendor(vendor)
            .and_then(|entry| entry.device(device))
            .unwrap_or(UNKNOWN_DEVICE)
    }
}

impl FromStr for PciIds {
    type Err = std::io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

#[cfg(test)]
mod test {
    use super::{PciIds, PciIdsError, UNKNOWN_DEVICE, UNKNOWN_VENDOR};
    use bolero::{Driver, ValueGenerator};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::str::FromStr;
    use tracing_test::traced_test;

    const FIXTURE: &str = "\
#	List of PCI ID's
#
#	Version: 2025.01.01

0001  SafeNet (wrong ID)
8086  Intel Corporation
	1533  I210 Gigabit Network Connection
		8086 0001  Ethernet Server Adapter I210-T1
		8086 0002  Ethernet Server Adapter I210-T1 (OEM)
	15f3  Ethernet Controller I225-V
	10fb  82599ES 10-Gigabit SFI/SFP+ Network Connection
15b3  Mellanox Technologies
	101d  MT2892 Family [ConnectX-6 Dx]
1af4  Red Hat, Inc.
	1000  Virtio network device
	1041  Virtio 1.0 network device

# List of known device classes, subclasses and programming interfaces
C 02  Network controller
	00  Ethernet controller
";

    fn fixture() -> PciIds {
        PciIds::from_str(FIXTURE).unwrap()
    }

    #[test]
    fn vendors_and_devices_are_indexed() {
        let ids = fixture();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids.vendor_name("8086"), "Intel Corporation");
        assert_eq!(
            ids.device_name("8086", "1533"),
            "I210 Gigabit Network Connection"
        );
        assert_eq!(ids.device_name("8086", "15f3"), "Ethernet Controller I225-V");
        assert_eq!(ids.device_name("1af4", "1041"), "Virtio 1.0 network device");
        assert_eq!(ids.vendor_name("0001"), "SafeNet (wrong ID)");
    }

    #[test]
    fn devices_are_grouped_under_their_vendor() {
        let ids = fixture();
        let intel = ids.vendor("8086").unwrap();
        assert_eq!(intel.device("15F3"), Some("Ethernet Controller I225-V"));
        assert_eq!(intel.device("101d"), None);
    }

    #[test]
    fn subsystems_and_classes_are_not_indexed() {
        let ids = fixture();
        assert_eq!(ids.device_name("8086", "8086"), UNKNOWN_DEVICE);
        // the class section's indented lines are not attributed to the last vendor
        assert_eq!(ids.device_name("1af4", "00"), UNKNOWN_DEVICE);
        assert_eq!(ids.vendor_name("02"), UNKNOWN_VENDOR);
    }

    #[test]
    fn misses_return_sentinels() {
        let ids = fixture();
        assert_eq!(ids.vendor_name("dead"), UNKNOWN_VENDOR);
        assert_eq!(ids.device_name("dead", "1533"), UNKNOWN_DEVICE);
        assert_eq!(ids.device_name("8086", "beef"), UNKNOWN_DEVICE);
    }

    struct CaseShuffledCode {
        code: &'static str,
    }

    impl ValueGenerator for CaseShuffledCode {
        type Output = String;

        fn generate<D: Driver>(&self, driver: &mut D) -> Option<String> {
            self.code
                .chars()
                .map(|c| {
                    let upper: bool = driver.produce()?;
                    Some(if upper { c.to_ascii_uppercase() } else { c })
                })
                .collect()
        }
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let ids = fixture();
        bolero::check!()
            .with_generator((
                CaseShuffledCode { code: "15b3" },
                CaseShuffledCode { code: "101d" },
            ))
            .for_each(|(vendor, device): &(String, String)| {
                assert_eq!(ids.vendor_name(vendor), "Mellanox Technologies");
                assert_eq!(
                    ids.device_name(vendor, device),
                    "MT2892 Family [ConnectX-6 Dx]"
                );
            });
    }

    #[test]
    fn device_before_any_vendor_is_skipped() {
        let ids = PciIds::from_str("\t1533  orphan\n8086  Intel Corporation\n").unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.device_name("8086", "1533"), UNKNOWN_DEVICE);
    }

    #[test]
    fn devices_of_a_malformed_vendor_are_not_misattributed() {
        let ids = PciIds::from_str(
            "8086  Intel Corporation\n\t1533  I210\nbroken vendor line\n\t1234  stray\n",
        )
        .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.device_name("8086", "1234"), UNKNOWN_DEVICE);
        assert_eq!(ids.device_name("8086", "1533"), "I210");
    }

    #[test]
    #[traced_test]
    fn duplicate_vendor_replaces_earlier_entry() {
        let ids = PciIds::from_str(
            "8086  Intel Corporation\n\t1533  I210\n8086  Intel Corp.\n\t15f3  I225-V\n",
        )
        .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.vendor_name("8086"), "Intel Corp.");
        assert_eq!(ids.device_name("8086", "1533"), UNKNOWN_DEVICE);
        assert_eq!(ids.device_name("8086", "15f3"), "I225-V");
        assert!(logs_contain("vendor 8086 is defined more than once"));
    }

    #[test]
    fn stored_codes_are_not_lowercased() {
        let ids = PciIds::from_str("ABCD  Shouty Vendor\n").unwrap();
        assert_eq!(ids.vendor_name("abcd"), UNKNOWN_VENDOR);
        assert_eq!(ids.vendor_name("ABCD"), UNKNOWN_VENDOR);
    }

    #[test]
    fn load_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();
        let ids = PciIds::load(file.path()).unwrap();
        assert_eq!(ids, fixture());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("pci.ids");
        match PciIds::load(&missing) {
            Err(PciIdsError::NotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn load_propagates_other_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(PciIds::load(dir.path()), Err(PciIdsError::Io(_))));
    }
}
