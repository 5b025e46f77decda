// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! PCI class codes.
//!
//! `lspci -n` reports the class of each device as four hex digits: the base class in the high
//! byte and the subclass in the low byte (e.g. `0200` is an ethernet controller).
//!
//! ```
//! # use nicinv_hardware::pci::class::{BaseClass, ClassCode};
//! #
//! let class = ClassCode::try_from("0200").unwrap();
//! assert_eq!(class.base_class(), Some(BaseClass::Network));
//! assert!(class.is_network());
//! assert_eq!(class.to_string(), "0200");
//! ```

/// A PCI class code (base class and subclass).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
#[repr(transparent)]
pub struct ClassCode(u16);

impl ClassCode {
    /// Creates a class code from its raw 16-bit value.
    #[must_use]
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the raw class code value.
    #[must_use]
    pub fn value(self) -> u16 {
        self.0
    }

    /// The base class, if it is one the PCI-SIG has assigned.
    #[must_use]
    pub fn base_class(self) -> Option<BaseClass> {
        BaseClass::from_repr(self.0.to_be_bytes()[0])
    }

    /// True iff the device is a network controller of any kind.
    #[must_use]
    pub fn is_network(self) -> bool {
        self.base_class().is_some_and(|class| class.is_network())
    }
}

impl std::fmt::Display for ClassCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

impl From<ClassCode> for String {
    fn from(value: ClassCode) -> Self {
        value.to_string()
    }
}

/// Error type for class code parsing failures.
#[derive(Debug, thiserror::Error)]
#[error("class code must be four hex digits: {0:?}")]
pub struct ClassCodeParseError(String);

impl TryFrom<&str> for ClassCode {
    type Error = ClassCodeParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.len() != 4 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ClassCodeParseError(value.to_string()));
        }
        u16::from_str_radix(value, 16)
            .map(ClassCode)
            .map_err(|_| ClassCodeParseError(value.to_string()))
    }
}

impl TryFrom<String> for ClassCode {
    type Error = ClassCodeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

/// PCI base classes, named as in the class section of `pci.ids`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::IntoStaticStr,
    strum::Display,
    strum::EnumIs,
    strum::FromRepr,
)]
#[repr(u8)]
pub enum BaseClass {
    #[strum(serialize = "Unclassified device")]
    Unclassified = 0x00,
    #[strum(serialize = "Mass storage controller")]
    MassStorage = 0x01,
    #[strum(serialize = "Network controller")]
    Network = 0x02,
    #[strum(serialize = "Display controller")]
    Display = 0x03,
    #[strum(serialize = "Multimedia controller")]
    Multimedia = 0x04,
    #[strum(serialize = "Memory controller")]
    Memory = 0x05,
    #[strum(serialize = "Bridge")]
    Bridge = 0x06,
    #[strum(serialize = "Communication controller")]
    Communication = 0x07,
    #[strum(serialize = "Generic system peripheral")]
    SystemPeripheral = 0x08,
    #[strum(serialize = "Input device controller")]
    Input = 0x09,
    #[strum(serialize = "Docking station")]
    DockingStation = 0x0a,
    #[strum(serialize = "Processor")]
    Processor = 0x0b,
    #[strum(serialize = "Serial bus controller")]
    SerialBus = 0x0c,
    #[strum(serialize = "Wireless controller")]
    Wireless = 0x0d,
    #[strum(serialize = "Intelligent controller")]
    Intelligent = 0x0e,
    #[strum(serialize = "Satellite communications controller")]
    Satellite = 0x0f,
    #[strum(serialize = "Encryption controller")]
    Encryption = 0x10,
    #[strum(serialize = "Signal processing controller")]
    SignalProcessing = 0x11,
    #[strum(serialize = "Processing accelerators")]
    ProcessingAccelerator = 0x12,
    #[strum(serialize = "Non-Essential Instrumentation")]
    Instrumentation = 0x13,
    #[strum(serialize = "Coprocessor")]
    Coprocessor = 0x40,
    #[strum(serialize = "Unassigned class")]
    Unassigned = 0xff,
}
