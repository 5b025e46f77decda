// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic, clippy::unwrap_used)]

mod args;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use hardware::os::SystemRunner;
use hardware::pci::directory::PciDeviceDirectory;
use hardware::pci::ids::PciIds;
use interface::InterfaceDirectory;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::{CmdArgs, Format, Parser};
use crate::report::Inventory;

fn init_logging(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

fn sysfs_root(args: &CmdArgs) -> Option<PathBuf> {
    if let Some(root) = args.sysfs() {
        return Some(root.to_path_buf());
    }
    match sysfs::sysfs_root() {
        Ok(root) => Some(root.inner().clone()),
        Err(err) => {
            warn!("driver details unavailable: {err}");
            None
        }
    }
}

fn main() -> ExitCode {
    let args = CmdArgs::parse();
    init_logging(args.log_level());

    let ids = match PciIds::load(args.pci_ids()) {
        Ok(ids) => ids,
        Err(err) => {
            error!("unable to load PCI names from {}: {err}", args.pci_ids().display());
            return ExitCode::FAILURE;
        }
    };
    info!("loaded {} PCI vendors", ids.len());

    let runner = SystemRunner;
    let mut interfaces = InterfaceDirectory::scan(&runner);
    interfaces.enrich(&runner);

    let devices = if args.pci() {
        match PciDeviceDirectory::scan(&runner) {
            Ok(devices) => Some(devices),
            Err(err) => {
                error!("PCI enumeration failed: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    let sysfs_root = sysfs_root(&args);
    let inventory = Inventory {
        ids: &ids,
        sysfs_root: sysfs_root.as_deref(),
        runner: &runner,
    };
    let report = inventory.report(&interfaces, devices.as_ref());

    match args.format() {
        Format::Text => print!("{report}"),
        Format::Yaml => match serde_yaml_ng::to_string(&report) {
            Ok(yaml) => print!("{yaml}"),
            Err(err) => {
                error!("unable to render the report: {err}");
                return ExitCode::FAILURE;
            }
        },
    }
    ExitCode::SUCCESS
}
