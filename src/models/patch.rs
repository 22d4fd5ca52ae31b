use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tri-state field for partial updates: a key can be absent (leave the
/// stored value alone), explicitly `null` (clear it), or a concrete value.
///
/// Serde only invokes `Deserialize` when the key is present, so `null` maps
/// to `Null` and the field's `#[serde(default)]` supplies `Missing`.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Missing,
    Null,
    Value(T),
}

// Hand-written so the impl carries no `T: Default` bound.
impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Missing
    }
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    /// The stored value this patch resolves to, `None` meaning cleared.
    /// Only meaningful when the patch is not `Missing`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Missing => Patch::Missing,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(v),
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Value(value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Value(v) => serializer.serialize_some(v),
            // Missing is kept off the wire by skip_serializing_if.
            _ => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        #[serde(default)]
        due: Patch<String>,
    }

    #[test]
    fn absent_key_is_missing() {
        let payload: Payload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.due, Patch::Missing);
    }

    #[test]
    fn explicit_null_clears() {
        let payload: Payload = serde_json::from_str(r#"{"due": null}"#).unwrap();
        assert_eq!(payload.due, Patch::Null);
        assert_eq!(payload.due.into_option(), None);
    }

    #[test]
    fn concrete_value_overwrites() {
        let payload: Payload = serde_json::from_str(r#"{"due": "tomorrow"}"#).unwrap();
        assert_eq!(payload.due, Patch::Value("tomorrow".to_string()));
        assert_eq!(payload.due.into_option(), Some("tomorrow".to_string()));
    }
}
