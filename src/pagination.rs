use std::fmt;
use std::num::NonZeroU32;

use time::OffsetDateTime;

use crate::endpoints::encode_query_value;
use crate::utils::date_format::format_rfc3339;

/// Time-based and cursor-based pagination for endpoints that enumerate objects.
///
/// Rendered with [`Display`](fmt::Display) as the query fragment
/// `&limit={limit}&since={since}&before={before}`. Every key is always present; unset values
/// are rendered as empty strings. `since_time` takes precedence over `since_id`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PaginationOptions {
    /// Limits the number of results per page.
    pub limit: Option<NonZeroU32>,
    pub since_time: Option<OffsetDateTime>,
    /// An object id to page from, used when `since_time` is not set.
    pub since_id: Option<String>,
    pub before_time: Option<OffsetDateTime>,
}

impl PaginationOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size. `0` leaves the limit unset.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = NonZeroU32::new(limit);
        self
    }

    #[must_use]
    pub fn since_time(mut self, since: OffsetDateTime) -> Self {
        self.since_time = Some(since);
        self
    }

    #[must_use]
    pub fn since_id(mut self, since: impl Into<String>) -> Self {
        self.since_id = Some(since.into());
        self
    }

    #[must_use]
    pub fn before_time(mut self, before: OffsetDateTime) -> Self {
        self.before_time = Some(before);
        self
    }

    /// Append the options to a raw query string.
    pub fn apply_to_query(&self, query: &mut String) {
        query.push_str(&self.to_string());
    }
}

impl fmt::Display for PaginationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let limit = self.limit.map(|l| l.to_string()).unwrap_or_default();
        let since = match (&self.since_time, &self.since_id) {
            (Some(time), _) => format_rfc3339(*time),
            (None, Some(id)) => encode_query_value(id),
            (None, None) => String::new(),
        };
        let before = self.before_time.map(format_rfc3339).unwrap_or_default();

        write!(f, "&limit={limit}&since={since}&before={before}")
    }
}
