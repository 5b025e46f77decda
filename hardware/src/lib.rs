// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! PCI inventory library.
//!
//! - [`pci`]: typed PCI addresses and ids, the bulk enumeration parser and the vendor/device
//!   name database.
//! - [`nic`]: kernel driver and module information for PCI devices.
//! - [`os`]: the narrow interface through which the library runs host tools.

#![deny(clippy::pedantic, clippy::unwrap_used)]

pub mod nic;
pub mod os;
pub mod pci;
