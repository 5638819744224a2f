use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::utils::date_format::monzo_datetime_format_option;

/// The merchant's address.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MerchantAddress {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// The merchant a transaction was made at.
///
/// Transactions carry either just the merchant id or, when fetched with
/// [`Expand::Merchant`](crate::entities::transaction::Expand::Merchant), the whole merchant.
/// An id-only merchant leaves every other field as `None`; see [`Merchant::is_expanded`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<MerchantAddress>,
    #[serde(
        default,
        with = "monzo_datetime_format_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<OffsetDateTime>,
    /// Groups individual merchants that are part of a chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Logo image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Merchant {
    /// A merchant known only by its id.
    #[must_use]
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Whether the merchant was returned as a full object rather than a bare id.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.address.is_some()
            || self.created.is_some()
            || self.group_id.is_some()
            || self.logo.is_some()
            || self.emoji.is_some()
            || self.name.is_some()
            || self.category.is_some()
    }
}

/// (De)serializes the polymorphic `merchant` field of a transaction.
///
/// - an object decodes into a full [`Merchant`]
/// - a string decodes into [`Merchant::from_id`]
/// - `null`, a missing key, a number, a boolean or an array decodes into `None`
///
/// An object that is not a valid merchant is an error.
pub mod merchant_format {
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};
    use serde_json::Value;

    use super::Merchant;

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(merchant: &Option<Merchant>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match merchant {
            Some(merchant) if merchant.is_expanded() => merchant.serialize(serializer),
            Some(merchant) => serializer.serialize_str(&merchant.id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Merchant>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            object @ Value::Object(_) => serde_json::from_value(object)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid merchant: {e}"))),
            Value::String(id) => Ok(Some(Merchant::from_id(id))),
            _ => Ok(None),
        }
    }
}
