// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::path::{Path, PathBuf};

pub(crate) use clap::Parser;
use hardware::pci::ids::DEFAULT_PCI_IDS_PATH;
use tracing::level_filters::LevelFilter;

/// How the report is rendered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Format {
    #[default]
    Text,
    Yaml,
}

#[derive(Parser, Debug)]
#[command(name = "nicinv")]
#[command(version)]
#[command(
    about = "Report network interfaces with their PCI devices, drivers and firmware",
    long_about = None
)]
pub(crate) struct CmdArgs {
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_PCI_IDS_PATH,
        help = "PCI vendor/device name database (pci.ids format)"
    )]
    pci_ids: PathBuf,

    #[arg(
        long,
        value_name = "PATH",
        help = "Root of the sysfs tree used to find device drivers (default: the mounted sysfs)"
    )]
    sysfs: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Text, help = "Report format")]
    format: Format,

    #[arg(
        long,
        default_value_t = false,
        help = "Also list every network-class PCI device with the interface it backs"
    )]
    pci: bool,

    #[arg(
        long,
        value_name = "LEVEL",
        default_value_t = LevelFilter::WARN,
        help = "Default log level, one of [off,error,warn,info,debug,trace]. RUST_LOG takes precedence"
    )]
    log_level: LevelFilter,
}

impl CmdArgs {
    pub fn pci_ids(&self) -> &Path {
        &self.pci_ids
    }
    pub fn sysfs(&self) -> Option<&Path> {
        self.sysfs.as_deref()
    }
    pub fn format(&self) -> Format {
        self.format
    }
    pub fn pci(&self) -> bool {
        self.pci
    }
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }
}

#[cfg(test)]
mod test {
    use super::{CmdArgs, Format, Parser};
    use std::path::Path;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn defaults() {
        let args = CmdArgs::try_parse_from(["nicinv"]).unwrap();
        assert_eq!(args.pci_ids(), Path::new("/usr/share/hwdata/pci.ids"));
        assert_eq!(args.sysfs(), None);
        assert_eq!(args.format(), Format::Text);
        assert!(!args.pci());
        assert_eq!(args.log_level(), LevelFilter::WARN);
    }

    #[test]
    fn every_flag() {
        let args = CmdArgs::try_parse_from([
            "nicinv",
            "--pci-ids",
            "/tmp/pci.ids",
            "--sysfs",
            "/tmp/sys",
            "--format",
            "yaml",
            "--pci",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.pci_ids(), Path::new("/tmp/pci.ids"));
        assert_eq!(args.sysfs(), Some(Path::new("/tmp/sys")));
        assert_eq!(args.format(), Format::Yaml);
        assert!(args.pci());
        assert_eq!(args.log_level(), LevelFilter::DEBUG);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(CmdArgs::try_parse_from(["nicinv", "--format", "json"]).is_err());
        assert!(CmdArgs::try_parse_from(["nicinv", "--log-level", "loud"]).is_err());
    }
}
