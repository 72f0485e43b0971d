//! Line-oriented text format
//!
//! ```text
//! NoTag = AAA
//!
//! [Graphic]
//! Resolution = 1920 * 1080
//! ```
//!
//! Entry lines are `key = value`, header lines are `[tag]`. Anything else is
//! skipped. There are no comments and no escape sequences.

use crate::error::ConfigError;
use crate::ordered::OrderedMap;
use crate::store::{DuplicateKeys, StoreLayout, DEFAULT_TAG};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Raw values of one tag, keyed by entry name
pub type Section = OrderedMap<String>;

/// All tags of a store
pub type Sections = OrderedMap<Section>;

static ENTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<key>[^=\s](?:[^=]*[^=\s])?)\s*=\s*(?P<value>.*)$")
        .expect("entry pattern is valid")
});

static HEADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[(?P<tag>[^\]]*)\]\s*$").expect("header pattern is valid"));

/// Parse configuration text into sections laid out per `layout`
///
/// The default tag is always present in the result, even for empty input.
pub fn parse(text: &str, layout: &StoreLayout) -> Result<Sections, ConfigError> {
    let mut sections = Sections::new(layout.tags);
    sections.insert(DEFAULT_TAG, Section::new(layout.keys));
    let mut current = DEFAULT_TAG.to_string();

    for (number, line) in text.lines().enumerate() {
        if let Some(caps) = ENTRY_PATTERN.captures(line) {
            let key = &caps["key"];
            let value = &caps["value"];
            let section = sections.get_or_insert_with(&current, || Section::new(layout.keys));

            if section.contains_key(key) && layout.duplicates == DuplicateKeys::Reject {
                return Err(ConfigError::DuplicateKey {
                    tag: current,
                    key: key.to_string(),
                    line: number + 1,
                });
            }
            section.insert(key, value.to_string());
        } else if let Some(caps) = HEADER_PATTERN.captures(line) {
            current = caps["tag"].to_string();
            sections.get_or_insert_with(&current, || Section::new(layout.keys));
        } else if !line.trim().is_empty() {
            trace!(line = number + 1, "skipping unrecognized line");
        }
    }

    Ok(sections)
}

/// Serialize sections back to text
///
/// Each tag is written as a header, a blank line, its entries, then two
/// blank lines. Leading whitespace of a value is not preserved: the parser
/// consumes it after `=`.
pub fn serialize(sections: &Sections) -> String {
    let mut out = String::new();
    for (tag, section) in sections.iter() {
        out.push_str(&format!("[{}]\n\n", tag));
        for (key, value) in section.iter() {
            if value.starts_with(char::is_whitespace) {
                debug!(tag, key, "leading whitespace of value will be lost on reload");
            }
            out.push_str(&format!("{} = {}\n", key, value));
        }
        out.push_str("\n\n");
    }
    out
}
