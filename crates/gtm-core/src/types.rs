//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Epoch length must be a positive number of seconds.
    #[error("epoch length must be positive, got {value}s")]
    NonPositiveEpochLength { value: i64 },

    /// A subject path escaped the project root or was absolute.
    #[error("subject path must be relative to the project root: {value}")]
    NotRelative { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// Identity of a commit, as the full hex object id.
    CommitId,
    "commit id"
);

define_string_id!(
    /// A tracked file, relative to the project root with `/` separators.
    FilePath,
    "file path"
);

impl FilePath {
    /// Builds a file path from root-relative path components.
    ///
    /// Rejects absolute paths and any `..` component.
    pub fn from_relative(path: &std::path::Path) -> Result<Self, ValidationError> {
        use std::path::Component;

        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ValidationError::NotRelative {
                        value: path.display().to_string(),
                    });
                }
            }
        }
        Self::new(parts.join("/"))
    }
}

/// Length of one epoch, in whole seconds.
///
/// Must stay fixed while unconsumed markers exist: markers only store the
/// epoch index, so a different length reinterprets every pending marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct EpochLength(i64);

impl EpochLength {
    /// One minute.
    pub const DEFAULT: Self = Self(60);

    /// Creates an epoch length, rejecting zero and negative values.
    pub const fn from_secs(secs: i64) -> Result<Self, ValidationError> {
        if secs <= 0 {
            return Err(ValidationError::NonPositiveEpochLength { value: secs });
        }
        Ok(Self(secs))
    }

    /// Returns the length in seconds.
    pub const fn as_secs(self) -> i64 {
        self.0
    }
}

impl Default for EpochLength {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for EpochLength {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_secs(value)
    }
}

impl From<EpochLength> for i64 {
    fn from(len: EpochLength) -> Self {
        len.0
    }
}

impl fmt::Display for EpochLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
