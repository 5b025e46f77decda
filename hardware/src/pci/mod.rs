// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! PCI devices as reported by `lspci` and named by `pci.ids`.

/// PCI addresses (`domain:bus:slot.function`).
pub mod address;
/// PCI bus representation.
pub mod bus;
/// PCI class codes.
pub mod class;
/// PCI device IDs.
pub mod device;
/// Bulk PCI enumeration.
pub mod directory;
/// PCI domain (segment) representation.
pub mod domain;
/// PCI function numbers.
pub mod function;
/// The `pci.ids` vendor / device name database.
pub mod ids;
/// A single enumerated PCI device.
pub mod record;
/// PCI slot (device number) representation.
pub mod slot;
/// PCI vendor IDs.
pub mod vendor;
