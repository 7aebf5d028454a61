//! Error types for the redesc-core library.
//!
//! Conversion itself has a deliberately small failure surface: running out of
//! arena budget (or failing the options round trip), exceeding the nesting
//! ceiling, and an enum default that names no enum value. The remaining
//! variants cover loading a definition pool from disk.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for redesc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all redesc operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An allocation requested from the arena could not be satisfied.
    ///
    /// Also reported when the serialize+parse round trip used to copy an
    /// options message fails.
    #[error("allocation failed while building descriptor")]
    AllocationFailure,

    /// Message nesting exceeded the configured ceiling
    #[error("message nesting exceeds the limit of {limit}")]
    NestingTooDeep {
        /// The configured ceiling
        limit: usize,
    },

    /// An enum-typed field declares a default number with no matching value
    #[error("default of field '{field}' names enum number {number}, which has no value")]
    UnknownEnumDefault {
        /// Full name of the field
        field: String,
        /// The default number that failed to resolve
        number: i32,
    },

    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to build a definition pool with prost-reflect
    #[error("failed to build descriptor pool: {0}")]
    DescriptorBuild(String),

    /// A file was requested that the pool does not contain
    #[error("file '{0}' not found in descriptor pool")]
    FileNotFound(String),

    /// Unsupported proto syntax version
    #[error("unsupported proto syntax: '{syntax}'")]
    UnsupportedSyntax {
        /// The unsupported syntax string
        syntax: String,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new descriptor build error
    pub fn descriptor_build(msg: impl Into<String>) -> Self {
        Self::DescriptorBuild(msg.into())
    }

    /// Creates a new unknown enum default error
    pub fn unknown_enum_default(field: impl Into<String>, number: i32) -> Self {
        Self::UnknownEnumDefault {
            field: field.into(),
            number,
        }
    }

    /// Returns true if the error came out of a conversion call rather than
    /// from loading the source pool.
    pub fn is_conversion_failure(&self) -> bool {
        matches!(
            self,
            Self::AllocationFailure | Self::NestingTooDeep { .. } | Self::UnknownEnumDefault { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_enum_default("pkg.Msg.color", 7);
        assert!(err.to_string().contains("pkg.Msg.color"));
        assert!(err.to_string().contains('7'));

        let err = Error::NestingTooDeep { limit: 4 };
        assert_eq!(err.to_string(), "message nesting exceeds the limit of 4");
    }

    #[test]
    fn test_is_conversion_failure() {
        assert!(Error::AllocationFailure.is_conversion_failure());
        assert!(Error::NestingTooDeep { limit: 1 }.is_conversion_failure());
        assert!(!Error::descriptor_build("bad pool").is_conversion_failure());
        assert!(!Error::FileNotFound("a.proto".into()).is_conversion_failure());
    }
}
