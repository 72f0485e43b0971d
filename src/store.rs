use crate::codec::{self, Section, Sections};
use crate::encoding::{self, TextEncoding};
use crate::error::ConfigError;
use crate::ordered::KeyOrder;
use crate::registry::ConversionRegistry;
use std::{
    fmt,
    fs::File,
    io::{BufWriter, Read, Write},
    ops::Index,
    path::Path,
};
use tracing::debug;

/// Tag holding every entry declared before the first header
pub const DEFAULT_TAG: &str = "Common";

/// What the parser does when a key repeats within one tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DuplicateKeys {
    /// Fail the load with [`ConfigError::DuplicateKey`]
    #[default]
    Reject,
    /// Keep the value declared last
    LastWins,
}

/// Ordering and parsing policy of a [`ConfigStore`], fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StoreLayout {
    pub tags: KeyOrder,
    pub keys: KeyOrder,
    pub duplicates: DuplicateKeys,
}

impl StoreLayout {
    /// Tags and keys both in lexicographic order
    pub fn sorted() -> Self {
        Self {
            tags: KeyOrder::Sorted,
            keys: KeyOrder::Sorted,
            duplicates: DuplicateKeys::Reject,
        }
    }
}

/// Result of a lookup that may fall back to a default
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The key existed and its raw value converted
    Found(T),
    /// The key was missing and the default was used
    Defaulted(T),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Lookup::Found(v) | Lookup::Defaulted(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Lookup::Found(v) | Lookup::Defaulted(v) => v,
        }
    }
}

/// Tag/key organized configuration with typed access
///
/// Only raw strings are stored. Typed values are converted on every read
/// through the store's [`ConversionRegistry`].
///
/// # Example
/// ```rust
/// use tagconf::{ConfigStore, DEFAULT_TAG};
///
/// let mut store = ConfigStore::new();
/// store.load_str("Port = 8080\n\n[Server]\nHost = localhost\n").unwrap();
///
/// let port: u16 = store.get_value(DEFAULT_TAG, "Port").unwrap();
/// assert_eq!(port, 8080);
/// assert_eq!(&store[("Server", "Host")], "localhost");
/// ```
#[derive(Debug)]
pub struct ConfigStore {
    layout: StoreLayout,
    registry: ConversionRegistry,
    sections: Sections,
}

impl ConfigStore {
    /// An empty store with insertion order and strict duplicate handling
    pub fn new() -> Self {
        Self::with_layout(StoreLayout::default())
    }

    pub fn with_layout(layout: StoreLayout) -> Self {
        let mut sections = Sections::new(layout.tags);
        sections.insert(DEFAULT_TAG, Section::new(layout.keys));
        Self {
            layout,
            registry: ConversionRegistry::new(),
            sections,
        }
    }

    pub fn layout(&self) -> StoreLayout {
        self.layout
    }

    pub fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ConversionRegistry {
        &mut self.registry
    }

    /// Shorthand for [`ConversionRegistry::register_parser`]
    pub fn register_parser<T, E, F>(&mut self, parser: F)
    where
        T: 'static,
        E: fmt::Display,
        F: Fn(&str) -> Result<T, E> + 'static,
    {
        self.registry.register_parser(parser);
    }

    /// Shorthand for [`ConversionRegistry::register_writer`]
    pub fn register_writer<T, F>(&mut self, writer: F)
    where
        T: 'static,
        F: Fn(&T) -> String + 'static,
    {
        self.registry.register_writer(writer);
    }

    /// Replace all entries with the contents of `reader`
    ///
    /// The reader is consumed to the end. Passing it by value closes it
    /// when loading finishes; pass `&mut reader` to keep it open. On error
    /// the current entries are left untouched.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), ConfigError> {
        self.load_with_encoding(reader, None)
    }

    /// Like [`load`](Self::load), decoding with `encoding` unless the
    /// input starts with a byte-order mark
    pub fn load_with_encoding<R: Read>(
        &mut self,
        mut reader: R,
        encoding: Option<TextEncoding>,
    ) -> Result<(), ConfigError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let text = encoding::decode(&bytes, encoding)?;
        self.load_str(&text)
    }

    pub fn load_str(&mut self, text: &str) -> Result<(), ConfigError> {
        let sections = codec::parse(text, &self.layout)?;
        debug!(
            tags = sections.len(),
            entries = sections.iter().map(|(_, s)| s.len()).sum::<usize>(),
            "loaded configuration"
        );
        self.sections = sections;
        Ok(())
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration file");
        self.load(File::open(path)?)
    }

    /// Write all entries to `writer` and flush it
    ///
    /// The same ownership convention as [`load`](Self::load) applies.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<(), ConfigError> {
        writer.write_all(self.to_text().as_bytes())?;
        writer.flush()?;
        debug!(tags = self.sections.len(), "saved configuration");
        Ok(())
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "saving configuration file");
        self.save(BufWriter::new(File::create(path)?))
    }

    pub fn to_text(&self) -> String {
        codec::serialize(&self.sections)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.sections.contains_key(tag)
    }

    /// Add an empty tag; does nothing if it already exists
    pub fn add_tag(&mut self, tag: &str) {
        let keys = self.layout.keys;
        self.sections.get_or_insert_with(tag, || Section::new(keys));
    }

    /// `false` for unknown tags as well as unknown keys
    pub fn has_key(&self, tag: &str, key: &str) -> bool {
        self.sections
            .get(tag)
            .is_some_and(|section| section.contains_key(key))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.sections.keys()
    }

    pub fn keys(&self, tag: &str) -> Result<impl Iterator<Item = &str> + '_, ConfigError> {
        Ok(self.section(tag)?.keys())
    }

    /// The unconverted string stored at `tag`/`key`
    pub fn raw(&self, tag: &str, key: &str) -> Option<&str> {
        self.sections
            .get(tag)
            .and_then(|section| section.get(key))
            .map(String::as_str)
    }

    /// Store an unconverted string, overwriting any previous value
    ///
    /// Leading whitespace of `value` does not survive a save and reload.
    pub fn set_raw(
        &mut self,
        tag: &str,
        key: &str,
        value: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.section_mut(tag)?.insert(key, value.into());
        Ok(())
    }

    /// Render `value` through the registry and store it
    pub fn set_value<T: 'static>(
        &mut self,
        tag: &str,
        key: &str,
        value: &T,
    ) -> Result<(), ConfigError> {
        if !self.has_tag(tag) {
            return Err(ConfigError::UnknownTag {
                tag: tag.to_string(),
            });
        }
        let raw = self
            .registry
            .render(value)
            .map_err(|failure| ConfigError::Conversion {
                tag: tag.to_string(),
                key: key.to_string(),
                value: None,
                type_name: std::any::type_name::<T>(),
                failure,
            })?;
        self.set_raw(tag, key, raw)
    }

    /// Convert the value at `tag`/`key` into `T`
    pub fn get_value<T: 'static>(&self, tag: &str, key: &str) -> Result<T, ConfigError> {
        let raw = self
            .section(tag)?
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey {
                tag: tag.to_string(),
                key: key.to_string(),
            })?;
        self.convert(tag, key, raw)
    }

    /// Like [`get_value`](Self::get_value), but `Ok(None)` for a missing key
    pub fn try_get_value<T: 'static>(
        &self,
        tag: &str,
        key: &str,
    ) -> Result<Option<T>, ConfigError> {
        match self.section(tag)?.get(key) {
            Some(raw) => self.convert(tag, key, raw).map(Some),
            None => Ok(None),
        }
    }

    /// Read `tag`/`key`, seeding it with `default_raw` first if missing
    ///
    /// A seeded read returns [`Lookup::Defaulted`] holding the converted
    /// default. Later reads find the seeded entry.
    pub fn try_get_or_seed<T: 'static>(
        &mut self,
        tag: &str,
        key: &str,
        default_raw: &str,
    ) -> Result<Lookup<T>, ConfigError> {
        if self.section(tag)?.contains_key(key) {
            return self.get_value(tag, key).map(Lookup::Found);
        }
        self.set_raw(tag, key, default_raw)?;
        debug!(tag, key, default = default_raw, "seeded missing entry");
        self.get_value(tag, key).map(Lookup::Defaulted)
    }

    /// Read `tag`/`key`, falling back to `default_value` if missing
    ///
    /// When `default_raw` is given, a missing entry is also seeded with it.
    pub fn try_get_or<T: 'static>(
        &mut self,
        tag: &str,
        key: &str,
        default_raw: Option<&str>,
        default_value: T,
    ) -> Result<Lookup<T>, ConfigError> {
        if self.section(tag)?.contains_key(key) {
            return self.get_value(tag, key).map(Lookup::Found);
        }
        if let Some(raw) = default_raw {
            self.set_raw(tag, key, raw)?;
            debug!(tag, key, default = raw, "seeded missing entry");
        }
        Ok(Lookup::Defaulted(default_value))
    }

    /// [`get_value`](Self::get_value) under the default tag
    pub fn get<T: 'static>(&self, key: &str) -> Result<T, ConfigError> {
        self.get_value(DEFAULT_TAG, key)
    }

    /// [`try_get_value`](Self::try_get_value) under the default tag
    pub fn try_get<T: 'static>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.try_get_value(DEFAULT_TAG, key)
    }

    /// [`set_value`](Self::set_value) under the default tag
    pub fn set<T: 'static>(&mut self, key: &str, value: &T) -> Result<(), ConfigError> {
        self.set_value(DEFAULT_TAG, key, value)
    }

    fn convert<T: 'static>(&self, tag: &str, key: &str, raw: &str) -> Result<T, ConfigError> {
        self.registry
            .convert(raw)
            .map_err(|failure| ConfigError::Conversion {
                tag: tag.to_string(),
                key: key.to_string(),
                value: Some(raw.to_string()),
                type_name: std::any::type_name::<T>(),
                failure,
            })
    }

    fn section(&self, tag: &str) -> Result<&Section, ConfigError> {
        self.sections.get(tag).ok_or_else(|| ConfigError::UnknownTag {
            tag: tag.to_string(),
        })
    }

    fn section_mut(&mut self, tag: &str) -> Result<&mut Section, ConfigError> {
        self.sections
            .get_mut(tag)
            .ok_or_else(|| ConfigError::UnknownTag {
                tag: tag.to_string(),
            })
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Raw value of `key` under the default tag
///
/// Panics if the key does not exist, like map indexing.
impl Index<&str> for ConfigStore {
    type Output = str;

    fn index(&self, key: &str) -> &str {
        &self[(DEFAULT_TAG, key)]
    }
}

/// Raw value at `(tag, key)`
///
/// Panics if the entry does not exist, like map indexing.
impl Index<(&str, &str)> for ConfigStore {
    type Output = str;

    fn index(&self, (tag, key): (&str, &str)) -> &str {
        match self.raw(tag, key) {
            Some(raw) => raw,
            None => panic!("no configuration entry [{}] {}", tag, key),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ConfigStore {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.sections, serializer)
    }
}
