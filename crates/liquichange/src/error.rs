// crates/liquichange/src/error.rs

use core::fmt;
use std::io;

/// Errors that can occur while building or writing a changelog.
#[derive(Debug)]
pub enum ChangelogError {
    /// A required attribute was missing or empty (e.g., @id on a changeSet).
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// An attribute had an invalid format (e.g., @matches not in `major.minor.patch`).
    InvalidAttributeFormat {
        element: &'static str,
        attribute: &'static str,
        expected: &'static str,
    },

    /// A field combination is semantically invalid.
    ValidationError(&'static str),

    /// An I/O error while writing the document. `quick-xml` reports writer
    /// failures as I/O errors, so they land here too.
    Io(io::Error),
}

impl From<io::Error> for ChangelogError {
    fn from(e: io::Error) -> Self {
        ChangelogError::Io(e)
    }
}

impl fmt::Display for ChangelogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangelogError::MissingAttribute { element, attribute } => {
                write!(f, "Missing required attribute on <{}>: {}", element, attribute)
            }
            ChangelogError::InvalidAttributeFormat {
                element,
                attribute,
                expected,
            } => write!(
                f,
                "Invalid format for attribute {} on <{}>: expected {}",
                attribute, element, expected
            ),
            ChangelogError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ChangelogError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ChangelogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChangelogError::Io(e) => Some(e),
            _ => None,
        }
    }
}
