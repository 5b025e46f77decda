// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Network interfaces of the host and the PCI devices behind them.
//!
//! The [`InterfaceDirectory`] is built from `ip addr show` and then enriched with `ethtool -i`,
//! which tells which PCI device (if any) backs each interface.

#![deny(clippy::pedantic, clippy::unwrap_used)]

pub mod directory;
pub mod ethtool;
pub mod interface;
pub mod listing;
pub mod mac;

pub use directory::InterfaceDirectory;
pub use interface::{LinkKind, NetworkInterface, OperState};
