//! Name-keyed view of a fetched collection
//!
//! The appliance's `?deep` list endpoints drop the wrapper object entirely
//! when a collection is empty, so every malformed shape here is treated as
//! an empty collection rather than an error.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use nfvis_common::{CollectionShape, ResourceKind, SINGLETON_KEY};

/// Remote instances of one kind, keyed by their key field
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    entries: BTreeMap<String, Value>,
}

impl ResourceIndex {
    /// Index a fetched document according to the kind's collection shape
    pub fn build(kind: ResourceKind, document: Option<Value>) -> Self {
        let mut index = Self::default();

        let Some(Value::Object(mut document)) = document else {
            debug!("No {} document returned, treating as empty", kind);
            return index;
        };

        match kind.shape() {
            CollectionShape::List {
                wrapper,
                list,
                key_field,
            } => {
                let items = match document.remove(wrapper) {
                    Some(Value::Object(mut container)) => container.remove(list),
                    Some(_) => {
                        debug!("{} wrapper '{}' is not an object", kind, wrapper);
                        None
                    }
                    None => {
                        debug!("{} wrapper '{}' missing, collection is empty", kind, wrapper);
                        None
                    }
                };

                let items = match items {
                    Some(Value::Array(items)) => items,
                    Some(_) => {
                        debug!("{} list '{}' is not list-shaped, treating as empty", kind, list);
                        return index;
                    }
                    None => return index,
                };

                for item in items {
                    let Some(key) = item.get(key_field).and_then(key_string) else {
                        debug!("Skipping {} entry without '{}'", kind, key_field);
                        continue;
                    };
                    if index.entries.insert(key.clone(), item).is_some() {
                        warn!("Duplicate {} key '{}', keeping the last entry", kind, key);
                    }
                }
            }
            CollectionShape::Singleton { wrapper } => match document.remove(wrapper) {
                Some(settings @ Value::Object(_)) => {
                    index.entries.insert(SINGLETON_KEY.to_string(), settings);
                }
                _ => debug!("{} document has no '{}' object", kind, wrapper),
            },
        }

        index
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Take ownership of an instance, leaving the rest of the index intact
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Render a key value as a string; numeric keys (VLAN ids) use decimal form
pub fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
