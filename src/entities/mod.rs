//! Typed records mirroring the JSON returned by the API, together with the operations that
//! fetch or mutate them.

pub mod account;
pub mod attachment;
pub mod balance;
pub mod feed;
pub mod merchant;
pub mod transaction;
pub mod webhook;

pub use self::{
    account::Account,
    attachment::{Attachment, UploadUrl},
    balance::Balance,
    feed::{BasicFeedItem, FeedItemType},
    merchant::{Merchant, MerchantAddress},
    transaction::{DeclineReason, Expand, Transaction},
    webhook::Webhook,
};
