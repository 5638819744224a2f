use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Client,
    endpoints::MonzoEndpoint,
    error::{self, Result},
    utils::date_format::monzo_datetime_format,
};

/// An image (such as a receipt) registered against a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Used to deregister the attachment later
    pub id: String,
    pub user_id: String,
    /// The id of the transaction the attachment decorates
    pub external_id: String,
    pub file_url: String,
    /// MIME type of the file
    pub file_type: String,
    #[serde(with = "monzo_datetime_format")]
    pub created: OffsetDateTime,
}

/// A temporary upload destination for an attachment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadUrl {
    /// Where the file will be publicly available once uploaded
    pub file_url: String,
    /// Short-lived pre-signed URL to `PUT` the file content to
    pub upload_url: String,
}

#[derive(Deserialize)]
struct RegisterResponse {
    attachment: Attachment,
}

/// Obtain a temporary URL the file can be uploaded to.
#[instrument(skip(client))]
pub async fn request_upload_url(client: &Client, file_name: &str, file_type: &str) -> Result<UploadUrl> {
    error::require("file_name", file_name)?;
    error::require("file_type", file_type)?;

    client
        .post_form(
            MonzoEndpoint::AttachmentUpload,
            &[("file_name", file_name), ("file_type", file_type)],
        )
        .await
}

/// Register a hosted file against a transaction.
///
/// The file may have been uploaded through [`request_upload_url`] or be hosted elsewhere.
#[instrument(skip(client))]
pub async fn register(
    client: &Client,
    external_id: &str,
    file_url: &str,
    file_type: &str,
) -> Result<Attachment> {
    error::require("external_id", external_id)?;
    error::require("file_url", file_url)?;
    error::require("file_type", file_type)?;

    let response: RegisterResponse = client
        .post_form(
            MonzoEndpoint::AttachmentRegister,
            &[
                ("external_id", external_id),
                ("file_type", file_type),
                ("file_url", file_url),
            ],
        )
        .await?;
    Ok(response.attachment)
}

/// Upload `content` and register it against the transaction `external_id`.
///
/// The three steps run in order and the first failure is returned as is. If registering
/// fails after the upload succeeded, the uploaded file is left in storage.
#[instrument(skip(client, content))]
pub async fn upload(
    client: &Client,
    file_name: &str,
    file_type: &str,
    external_id: &str,
    content: impl Into<reqwest::Body>,
) -> Result<Attachment> {
    error::require("file_name", file_name)?;
    error::require("file_type", file_type)?;
    error::require("external_id", external_id)?;

    let upload_url = request_upload_url(client, file_name, file_type).await?;
    client
        .put_upload(&upload_url.upload_url, file_type, content.into())
        .await?;
    register(client, external_id, &upload_url.file_url, file_type).await
}

/// Deregister an attachment so it is no longer shown on its transaction.
#[instrument(skip(client))]
pub async fn delete(client: &Client, attachment_id: &str) -> Result<()> {
    error::require("attachment_id", attachment_id)?;

    client
        .post_form_empty(MonzoEndpoint::AttachmentDeregister, &[("id", attachment_id)])
        .await
}
