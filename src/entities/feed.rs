use std::collections::HashMap;
use std::fmt;

use crate::{
    Client,
    endpoints::MonzoEndpoint,
    error::{self, Result},
};

/// Kinds of item that can be pushed to a user's feed. Only `basic` exists today.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeedItemType {
    #[default]
    Basic,
}

impl fmt::Display for FeedItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
        }
    }
}

/// Parameters of a `basic` feed item. Colours are hex strings such as `#FCF1EE`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BasicFeedItem {
    pub title: String,
    /// URL of the icon displayed next to the item
    pub image_url: String,
    pub body: Option<String>,
    pub background_color: Option<String>,
    pub title_color: Option<String>,
    pub body_color: Option<String>,
}

impl BasicFeedItem {
    #[must_use]
    pub fn new(title: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            image_url: image_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The generic `params` map sent for this item.
    #[must_use]
    pub fn params(&self) -> HashMap<String, String> {
        let mut params = HashMap::from([
            ("title".to_string(), self.title.clone()),
            ("image_url".to_string(), self.image_url.clone()),
        ]);
        let optional = [
            ("body", &self.body),
            ("background_color", &self.background_color),
            ("title_color", &self.title_color),
            ("body_color", &self.body_color),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.insert(key.to_string(), value.clone());
            }
        }
        params
    }
}

/// Create an item on the user's feed.
///
/// `url` is opened when the item is tapped; without one the app shows a view built from the
/// title and body.
#[instrument(skip(client, params))]
pub async fn create(
    client: &Client,
    account_id: &str,
    item_type: FeedItemType,
    url: Option<&str>,
    params: &HashMap<String, String>,
) -> Result<()> {
    error::require("account_id", account_id)?;

    let form = feed_form(account_id, item_type, url, params);
    client.post_form_empty(MonzoEndpoint::Feed, &form).await
}

/// Create a `basic` item on the user's feed.
#[instrument(skip(client, item))]
pub async fn create_basic(
    client: &Client,
    account_id: &str,
    item: &BasicFeedItem,
    url: Option<&str>,
) -> Result<()> {
    error::require("title", &item.title)?;
    error::require("image_url", &item.image_url)?;

    create(client, account_id, FeedItemType::Basic, url, &item.params()).await
}

fn feed_form(
    account_id: &str,
    item_type: FeedItemType,
    url: Option<&str>,
    params: &HashMap<String, String>,
) -> Vec<(String, String)> {
    let mut form = vec![
        ("account_id".to_string(), account_id.to_string()),
        ("type".to_string(), item_type.to_string()),
    ];
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
        form.push(("url".to_string(), url.to_string()));
    }

    let mut params: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (format!("params[{key}]"), value.clone()))
        .collect();
    params.sort();
    form.extend(params);
    form
}
