use crate::error::ConfigError;
use std::{fmt, str::FromStr};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Character encoding of a configuration channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "utf16le" | "utf-16le" | "utf-16" => Ok(Self::Utf16Le),
            "utf16be" | "utf-16be" => Ok(Self::Utf16Be),
            _ => Err(format!("unknown encoding '{}'", s)),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => write!(f, "UTF-8"),
            Self::Utf16Le => write!(f, "UTF-16LE"),
            Self::Utf16Be => write!(f, "UTF-16BE"),
        }
    }
}

impl TextEncoding {
    /// Detect a byte-order mark, returning the encoding and the BOM length
    pub fn sniff(bytes: &[u8]) -> Option<(Self, usize)> {
        if bytes.starts_with(UTF8_BOM) {
            Some((Self::Utf8, UTF8_BOM.len()))
        } else if bytes.starts_with(UTF16_LE_BOM) {
            Some((Self::Utf16Le, UTF16_LE_BOM.len()))
        } else if bytes.starts_with(UTF16_BE_BOM) {
            Some((Self::Utf16Be, UTF16_BE_BOM.len()))
        } else {
            None
        }
    }

    fn decode_exact(self, bytes: &[u8]) -> Result<String, ConfigError> {
        let invalid = || ConfigError::Decode { encoding: self };
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| invalid()),
            Self::Utf16Le | Self::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(invalid());
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| match self {
                        Self::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
                        _ => u16::from_le_bytes([pair[0], pair[1]]),
                    })
                    .collect();
                String::from_utf16(&units).map_err(|_| invalid())
            }
        }
    }
}

/// Decode raw bytes into text
///
/// A byte-order mark always takes precedence over `requested`. Without one,
/// `requested` is used, falling back to UTF-8.
pub fn decode(bytes: &[u8], requested: Option<TextEncoding>) -> Result<String, ConfigError> {
    match TextEncoding::sniff(bytes) {
        Some((detected, bom_len)) => detected.decode_exact(&bytes[bom_len..]),
        None => requested.unwrap_or_default().decode_exact(bytes),
    }
}
