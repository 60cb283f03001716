//! Signal and device property bags.
//!
//! A small set of keys (`description`, units, min/max on signals; name,
//! host/port on devices) is reserved and has typed accessors elsewhere;
//! everything else is an arbitrary user property carried opaquely.

use std::collections::BTreeMap;

use crate::value::Scalar;

/// A property value: either a reserved scalar/string or an opaque blob of
/// scalars, mirroring the value-message grammar's own vector-of-scalars
/// shape (§6).
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Str(String),
    Scalar(Scalar),
    Vector(Vec<Scalar>),
}

/// Names that have dedicated struct fields elsewhere and may not be set
/// through the generic property API.
const RESERVED_KEYS: &[&str] = &["name", "id", "direction", "type", "length"];

#[derive(Debug, Clone, Default)]
pub struct PropertyBag {
    values: BTreeMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    /// Set a property, rejecting reserved keys (§4 property handling: a
    /// reserved key is exposed only through its own field, never rewritten
    /// generically).
    pub fn set(&mut self, key: impl Into<String>, value: PropertyValue) -> Result<(), ReservedKey> {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(ReservedKey(key));
        }
        self.values.insert(key, value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.values.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("'{0}' is a reserved property name")]
pub struct ReservedKey(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_keys_are_rejected() {
        let mut bag = PropertyBag::new();
        let err = bag.set("name", PropertyValue::Str("x".into())).unwrap_err();
        assert_eq!(err.0, "name");
    }

    #[test]
    fn arbitrary_keys_round_trip() {
        let mut bag = PropertyBag::new();
        bag.set("description", PropertyValue::Str("a sensor".into()))
            .unwrap();
        assert_eq!(
            bag.get("description"),
            Some(&PropertyValue::Str("a sensor".into()))
        );
    }
}
