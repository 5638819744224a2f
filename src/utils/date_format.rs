use time::{
    OffsetDateTime, UtcOffset,
    format_description::{FormatItem, well_known::Rfc3339},
    macros::format_description,
};

/// The wire format for timestamps sent to the API: UTC, second precision.
const WIRE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// Formats a timestamp as `yyyy-MM-ddTHH:mm:ssZ`, converting it to UTC first.
pub fn format_rfc3339(datetime: OffsetDateTime) -> String {
    datetime
        .to_offset(UtcOffset::UTC)
        .format(WIRE_FORMAT)
        // the format only contains components every `OffsetDateTime` carries
        .unwrap_or_default()
}

/// Parses an RFC 3339 timestamp as returned by the API, with or without fractional seconds.
pub fn parse_rfc3339(datetime_str: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(datetime_str, &Rfc3339)
        .map_err(|e| format!("Failed to parse datetime '{datetime_str}': {e}"))
}

// Serialization module for required timestamps
pub mod monzo_datetime_format {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_rfc3339(*datetime))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let datetime_str = String::deserialize(deserializer)?;
        super::parse_rfc3339(&datetime_str).map_err(serde::de::Error::custom)
    }
}

// Optional timestamps; empty strings and null both read as `None`
pub mod monzo_datetime_format_option {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(datetime: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match datetime {
            Some(dt) => serializer.serialize_str(&super::format_rfc3339(*dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.is_empty() => super::parse_rfc3339(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
