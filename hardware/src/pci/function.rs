// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! PCI function numbers.
//!
//! Multi-port network cards commonly expose each port as a separate function of the same slot.
//!
//! ```
//! # use nicinv_hardware::pci::function::Function;
//! #
//! let func3 = Function::try_from("3").unwrap();
//! assert_eq!(format!("{func3}"), "3");
//! assert_eq!(func3.value(), 3);
//! ```

/// A PCI function number (0-7), displayed as a single digit.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u8", into = "u8")
)]
#[repr(transparent)]
pub struct Function(u8);

impl Function {
    /// Maximum valid function number (7, or 0b111).
    const MAX: u8 = 0b111;

    /// Returns the raw function number value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

/// Error type for invalid function numbers.
#[derive(Debug, thiserror::Error)]
pub enum InvalidPciFunction {
    /// Function number exceeds the 3-bit maximum.
    #[error("Function maximum is 3 bits (0-7): {0} is too large")]
    TooLarge(u8),
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Function {
    type Error = InvalidPciFunction;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            Err(InvalidPciFunction::TooLarge(value))
        } else {
            Ok(Function(value))
        }
    }
}

impl From<Function> for u8 {
    fn from(value: Function) -> Self {
        value.0
    }
}

/// Error type for function parsing failures.
#[derive(Debug, thiserror::Error)]
pub enum FunctionParseError {
    /// Invalid syntax in the function string.
    #[error("Invalid pci function syntax: {0}")]
    InvalidSyntax(String),
    /// Invalid function number value.
    #[error(transparent)]
    InvalidFunction(InvalidPciFunction),
}

impl TryFrom<&str> for Function {
    type Error = FunctionParseError;

    /// Parses a function number from a single decimal digit.
    ///
    /// # Examples
    ///
    /// ```
    /// use nicinv_hardware::pci::function::Function;
    ///
    /// assert!(Function::try_from("0").is_ok());
    /// assert!(Function::try_from("7").is_ok());
    /// assert!(Function::try_from("8").is_err());  // Too large
    /// assert!(Function::try_from("00").is_err()); // Wrong length
    /// ```
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let [digit] = value.as_bytes() else {
            return Err(FunctionParseError::InvalidSyntax(format!(
                "length for pci function: {value} is illegal; should be a single digit between 0 and 7"
            )));
        };
        if !digit.is_ascii_digit() {
            return Err(FunctionParseError::InvalidSyntax(format!(
                "{value} is illegal; should be a single digit between 0 and 7"
            )));
        }
        Function::try_from(digit - b'0').map_err(FunctionParseError::InvalidFunction)
    }
}

/// Test contract support for property-based testing.
#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::pci::function::Function;

    impl bolero::TypeGenerator for Function {
        fn generate<D: bolero::Driver>(driver: &mut D) -> Option<Self> {
            Some(Function(driver.produce::<u8>()? & Self::MAX))
        }
    }
}
