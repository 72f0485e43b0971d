use crate::encoding::TextEncoding;
use colored::Colorize;
use std::{fmt, io, sync::Arc};

/// Why a single raw string could not be turned into (or produced from) a typed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionFailure {
    /// A registered parser rejected the raw string
    Rejected { reason: String },
    /// The raw string names no variant of an enumeration-like type
    UnknownVariant { expected: Vec<&'static str> },
    /// No parser or writer is registered for the requested type
    Unsupported,
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionFailure::Rejected { reason } => write!(f, "{}", reason),
            ConversionFailure::UnknownVariant { expected } => {
                write!(f, "expected one of: {}", expected.join(", "))
            }
            ConversionFailure::Unsupported => write!(f, "type not supported"),
        }
    }
}

/// Errors that can occur while reading, converting or binding configuration
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// The tag was never declared or added
    UnknownTag { tag: String },
    /// The key does not exist under an existing tag
    UnknownKey { tag: String, key: String },
    /// A raw value could not be converted to or from the requested type
    Conversion {
        tag: String,
        key: String,
        /// `None` when the failure happened while rendering a value for storage
        value: Option<String>,
        type_name: &'static str,
        failure: ConversionFailure,
    },
    /// The same key appeared twice in one section while parsing
    DuplicateKey { tag: String, key: String, line: usize },
    /// A bound member has no default value to seed a missing entry with
    MissingDefault { member: String },
    /// The input bytes are not valid text in the given encoding
    Decode { encoding: TextEncoding },
    /// Reading or writing the underlying channel failed
    Io(Arc<io::Error>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownTag { tag } => {
                write!(f, "[{}]: Tag does not exist", tag.magenta().bold())
            }
            ConfigError::UnknownKey { tag, key } => {
                write!(
                    f,
                    "[{}] {}: Key does not exist",
                    tag.magenta().bold(),
                    key.magenta().bold()
                )
            }
            ConfigError::Conversion {
                tag,
                key,
                value,
                type_name,
                failure,
            } => {
                match value {
                    Some(value) => writeln!(
                        f,
                        "[{}] {}: Invalid value {} for type {}",
                        tag.magenta().bold(),
                        key.magenta().bold(),
                        format!("'{}'", value).red(),
                        type_name.cyan(),
                    )?,
                    None => writeln!(
                        f,
                        "[{}] {}: Cannot write value of type {}",
                        tag.magenta().bold(),
                        key.magenta().bold(),
                        type_name.cyan(),
                    )?,
                }
                write!(f, "\tReason: {}", failure)
            }
            ConfigError::DuplicateKey { tag, key, line } => {
                write!(
                    f,
                    "[{}] {}: Duplicate key on line {}",
                    tag.magenta().bold(),
                    key.magenta().bold(),
                    line.to_string().yellow()
                )
            }
            ConfigError::MissingDefault { member } => {
                write!(f, "{}: Bound member has no default value", member.magenta().bold())
            }
            ConfigError::Decode { encoding } => {
                write!(f, "Input is not valid {} text", encoding)
            }
            ConfigError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(Arc::new(err))
    }
}
