use serde::{Deserialize, Deserializer};

/// Deserializes a value, treating empty strings as None.
/// Useful for Monzo API fields that return "" instead of omitting the value.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ValueOrString<T> {
        Value(T),
        String(String),
    }

    match Option::<ValueOrString<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(ValueOrString::Value(v)) => Ok(Some(v)),
        Some(ValueOrString::String(s)) if s.is_empty() => Ok(None),
        Some(ValueOrString::String(s)) => Err(serde::de::Error::custom(format!(
            "unexpected string value: {s}"
        ))),
    }
}
