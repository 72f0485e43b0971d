use std::collections::{BTreeMap, HashMap};

/// Iteration order of tags or keys, fixed when a store is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyOrder {
    /// Entries iterate in the order they were first inserted
    #[default]
    Insertion,
    /// Entries iterate in lexicographic order of their names
    Sorted,
}

/// A string-keyed map whose iteration order is chosen once, at construction
#[derive(Debug, Clone)]
pub enum OrderedMap<V> {
    Insertion {
        index: HashMap<String, usize>,
        entries: Vec<(String, V)>,
    },
    Sorted(BTreeMap<String, V>),
}

impl<V> OrderedMap<V> {
    pub fn new(order: KeyOrder) -> Self {
        match order {
            KeyOrder::Insertion => OrderedMap::Insertion {
                index: HashMap::new(),
                entries: Vec::new(),
            },
            KeyOrder::Sorted => OrderedMap::Sorted(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OrderedMap::Insertion { entries, .. } => entries.len(),
            OrderedMap::Sorted(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        match self {
            OrderedMap::Insertion { index, entries } => index.get(key).map(|&i| &entries[i].1),
            OrderedMap::Sorted(map) => map.get(key),
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        match self {
            OrderedMap::Insertion { index, entries } => {
                index.get(key).map(|&i| &mut entries[i].1)
            }
            OrderedMap::Sorted(map) => map.get_mut(key),
        }
    }

    /// Insert or overwrite, returning the previous value
    ///
    /// Overwriting keeps the key's original position in insertion order.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self {
            OrderedMap::Insertion { index, entries } => match index.get(&key) {
                Some(&i) => Some(std::mem::replace(&mut entries[i].1, value)),
                None => {
                    index.insert(key.clone(), entries.len());
                    entries.push((key, value));
                    None
                }
            },
            OrderedMap::Sorted(map) => map.insert(key, value),
        }
    }

    /// Return the value for `key`, inserting `make()` first if it is missing
    pub fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> V) -> &mut V {
        match self {
            OrderedMap::Insertion { index, entries } => {
                let i = *index.entry(key.to_string()).or_insert_with(|| {
                    entries.push((key.to_string(), make()));
                    entries.len() - 1
                });
                &mut entries[i].1
            }
            OrderedMap::Sorted(map) => map.entry(key.to_string()).or_insert_with(make),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = (&str, &V)> + '_> {
        match self {
            OrderedMap::Insertion { entries, .. } => {
                Box::new(entries.iter().map(|(k, v)| (k.as_str(), v)))
            }
            OrderedMap::Sorted(map) => Box::new(map.iter().map(|(k, v)| (k.as_str(), v))),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(k, _)| k)
    }
}

#[cfg(feature = "serde")]
impl<V: serde::Serialize> serde::Serialize for OrderedMap<V> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
